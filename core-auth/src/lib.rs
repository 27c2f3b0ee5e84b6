//! # Authentication Module
//!
//! Credential provider for app-only (client-credentials) access.
//!
//! ## Overview
//!
//! [`ClientCredentialsProvider`] exchanges the application's client id and
//! secret for a bearer token at the directory token endpoint, caches it, and
//! hands it out through the [`TokenProvider`] trait. There is no refresh or
//! expiry logic: a stale token surfaces as an auth error on the next request
//! and the caller may [`invalidate`](TokenProvider::invalidate) it.

pub mod error;
pub mod oauth;
pub mod token_cache;
pub mod types;

pub use error::{AuthError, Result};
pub use oauth::{ClientCredentialsProvider, TokenProvider};
pub use token_cache::TokenCache;
pub use types::{AccessToken, ClientCredentials, DEFAULT_SCOPE};
