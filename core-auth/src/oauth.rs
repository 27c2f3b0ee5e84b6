//! OAuth 2.0 Client-Credentials Token Provider
//!
//! Acquires app-only bearer tokens from the directory token endpoint
//! (RFC 6749 section 4.4) and caches them for the lifetime of the client.
//!
//! # Overview
//!
//! - The first call to [`TokenProvider::access_token`] performs the exchange
//! - Later calls return the cached token without touching the network
//! - [`TokenProvider::invalidate`] clears the cache; nothing expires on its own
//!
//! # Security
//!
//! - The client secret is sent only in the form-encoded request body
//! - Tokens and secrets are never logged
//!
//! # Example
//!
//! ```no_run
//! use core_auth::{ClientCredentials, ClientCredentialsProvider, TokenProvider};
//! use std::sync::Arc;
//!
//! # async fn example() -> core_auth::Result<()> {
//! # use bridge_traits::http::HttpClient;
//! # let http_client: Arc<dyn HttpClient> = todo!();
//! let credentials = ClientCredentials::new("client-id", "client-secret", "tenant-id")?;
//! let provider = ClientCredentialsProvider::new(credentials, http_client);
//!
//! let token = provider.access_token().await?;
//! # Ok(())
//! # }
//! ```

use crate::error::{AuthError, Result};
use crate::token_cache::TokenCache;
use crate::types::{AccessToken, ClientCredentials};
use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest};
use bytes::Bytes;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Source of bearer tokens for outgoing requests.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Return the cached token, performing an exchange if none is cached.
    async fn access_token(&self) -> Result<AccessToken>;

    /// Forget the cached token.
    async fn invalidate(&self);
}

/// Client-credentials grant against the configured token endpoint.
pub struct ClientCredentialsProvider {
    credentials: ClientCredentials,
    http_client: Arc<dyn HttpClient>,
    cache: TokenCache,
}

impl ClientCredentialsProvider {
    pub fn new(credentials: ClientCredentials, http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            credentials,
            http_client,
            cache: TokenCache::new(),
        }
    }

    pub fn credentials(&self) -> &ClientCredentials {
        &self.credentials
    }

    /// Perform one token exchange. Does not touch the cache.
    #[instrument(skip(self), fields(client_id = %self.credentials.client_id()))]
    async fn exchange(&self) -> Result<AccessToken> {
        let mut params = HashMap::new();
        params.insert("grant_type", "client_credentials");
        params.insert("client_id", self.credentials.client_id());
        params.insert("client_secret", self.credentials.client_secret());
        params.insert("scope", self.credentials.scope());

        let encoded_body = serde_urlencoded::to_string(&params)
            .map_err(|e| AuthError::InvalidConfig(format!("Failed to encode token request: {}", e)))?;

        let request = HttpRequest::new(HttpMethod::Post, self.credentials.token_url())
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(Bytes::from(encoded_body));

        debug!("Requesting client-credentials token");

        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|e| AuthError::NetworkError(e.to_string()))?;

        if !response.is_success() {
            let status = response.status;
            let error_body = response.text_lossy();

            warn!(
                status = status,
                error = %error_body,
                "Token exchange rejected by token endpoint"
            );

            return Err(AuthError::TokenRequestFailed {
                status,
                body: error_body,
            });
        }

        let token_response: TokenResponse = response
            .json()
            .map_err(|e| AuthError::ParseError(e.to_string()))?;

        match token_response.access_token {
            Some(token) if !token.is_empty() => {
                info!(
                    expires_in = token_response.expires_in,
                    "Obtained client-credentials token"
                );
                Ok(AccessToken::new(token))
            }
            _ => {
                warn!(
                    error = token_response.error.as_deref().unwrap_or("none"),
                    "Token response did not contain an access_token"
                );
                Err(AuthError::MissingAccessToken)
            }
        }
    }
}

#[async_trait]
impl TokenProvider for ClientCredentialsProvider {
    async fn access_token(&self) -> Result<AccessToken> {
        if let Some(token) = self.cache.get().await {
            return Ok(token);
        }

        let _guard = self.cache.write_guard().await;

        // Another caller may have finished an exchange while we waited
        if let Some(token) = self.cache.get().await {
            return Ok(token);
        }

        let token = self.exchange().await?;
        self.cache.set(token.clone()).await;
        Ok(token)
    }

    async fn invalidate(&self) {
        debug!("Invalidating cached token");
        self.cache.invalidate().await;
    }
}

/// Token endpoint response body.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    error: Option<String>,
}
