//! # Desktop Bridge Implementations
//!
//! Default transport for desktop and server hosts (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `HttpClient` using `reqwest`, with connection pooling, rustls TLS and
//!   redirect following for content downloads
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::ReqwestHttpClient;
//! use std::sync::Arc;
//!
//! let http_client = Arc::new(ReqwestHttpClient::new()?);
//! // Inject into GraphConfig
//! ```

mod http;

pub use http::ReqwestHttpClient;
