//! # Client Configuration
//!
//! Provides configuration management for the Graph toolkit.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a
//! `GraphConfig` holding the application credentials, endpoint URLs and the
//! optional transport. Validation is fail-fast: a missing client id, secret
//! or tenant is reported from `build()`, before any network activity.
//!
//! ## Required Values
//!
//! - `client_id` - Application (client) id registered in the directory
//! - `client_secret` - Client secret for the client-credentials grant
//! - `tenant_id` - Directory (tenant) id
//!
//! ## Optional Values (with defaults)
//!
//! - `base_url` - `https://graph.microsoft.com/v1.0`
//! - `token_url` - `https://login.microsoftonline.com/{tenant}/oauth2/v2.0/token`
//! - `scope` - `https://graph.microsoft.com/.default`
//! - `HttpClient` - desktop default: reqwest (injected by the facade)
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::GraphConfig;
//!
//! let config = GraphConfig::builder()
//!     .client_id("00000000-0000-0000-0000-000000000000")
//!     .client_secret("secret")
//!     .tenant_id("contoso.onmicrosoft.com")
//!     .build()?;
//!
//! // Or from CLIENT_ID / CLIENT_SECRET / TENANT_ID
//! let config = GraphConfig::from_env()?;
//! ```

use crate::error::{Error, Result};
use bridge_traits::HttpClient;
use std::sync::Arc;

/// Default Graph REST endpoint
pub const DEFAULT_BASE_URL: &str = "https://graph.microsoft.com/v1.0";

/// Default scope for the client-credentials grant
pub const DEFAULT_SCOPE: &str = "https://graph.microsoft.com/.default";

/// Environment variable names read by [`GraphConfig::from_env`]
pub const ENV_CLIENT_ID: &str = "CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "CLIENT_SECRET";
pub const ENV_TENANT_ID: &str = "TENANT_ID";
pub const ENV_BASE_URL: &str = "GRAPH_BASE_URL";

/// Configuration for a Graph client.
///
/// Use [`GraphConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct GraphConfig {
    /// Application (client) id
    pub client_id: String,

    /// Client secret
    pub client_secret: String,

    /// Directory (tenant) id
    pub tenant_id: String,

    /// Base URL of the REST API, without trailing slash
    pub base_url: String,

    /// OAuth token endpoint
    pub token_url: String,

    /// Scope requested in the client-credentials exchange
    pub scope: String,

    /// HTTP client for making API requests (optional with desktop default)
    pub http_client: Option<Arc<dyn HttpClient>>,
}

impl std::fmt::Debug for GraphConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("tenant_id", &self.tenant_id)
            .field("base_url", &self.base_url)
            .field("token_url", &self.token_url)
            .field("scope", &self.scope)
            .field(
                "http_client",
                &self.http_client.as_ref().map(|_| "HttpClient { ... }"),
            )
            .finish()
    }
}

impl GraphConfig {
    /// Creates a new builder for constructing a `GraphConfig`.
    pub fn builder() -> GraphConfigBuilder {
        GraphConfigBuilder::default()
    }

    /// Builds a configuration from `CLIENT_ID`, `CLIENT_SECRET`, `TENANT_ID`
    /// and the optional `GRAPH_BASE_URL` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary key lookup.
    ///
    /// Keys are the `ENV_*` constants of this module.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = Self::builder();

        if let Some(client_id) = lookup(ENV_CLIENT_ID) {
            builder = builder.client_id(client_id);
        }
        if let Some(client_secret) = lookup(ENV_CLIENT_SECRET) {
            builder = builder.client_secret(client_secret);
        }
        if let Some(tenant_id) = lookup(ENV_TENANT_ID) {
            builder = builder.tenant_id(tenant_id);
        }
        if let Some(base_url) = lookup(ENV_BASE_URL) {
            builder = builder.base_url(base_url);
        }

        builder.build()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - Client id, secret and tenant id are not blank
    /// - Base and token URLs are absolute http(s) URLs
    /// - Scope is not blank
    pub fn validate(&self) -> Result<()> {
        require_non_empty(&self.client_id, ENV_CLIENT_ID)?;
        require_non_empty(&self.client_secret, ENV_CLIENT_SECRET)?;
        require_non_empty(&self.tenant_id, ENV_TENANT_ID)?;

        require_http_url(&self.base_url, "Base URL")?;
        require_http_url(&self.token_url, "Token URL")?;

        if self.scope.trim().is_empty() {
            return Err(Error::Config("Scope cannot be empty".to_string()));
        }

        Ok(())
    }
}

fn require_non_empty(value: &str, name: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::Config(format!(
            "{} is required. Set it in the environment or pass it to the builder.",
            name
        )));
    }
    Ok(())
}

fn require_http_url(value: &str, name: &str) -> Result<()> {
    if !(value.starts_with("https://") || value.starts_with("http://")) {
        return Err(Error::Config(format!(
            "{} must be an absolute http(s) URL, got '{}'",
            name, value
        )));
    }
    Ok(())
}

/// Default token endpoint for a tenant
pub fn default_token_url(tenant_id: &str) -> String {
    format!(
        "https://login.microsoftonline.com/{}/oauth2/v2.0/token",
        tenant_id
    )
}

/// Builder for [`GraphConfig`].
#[derive(Default)]
pub struct GraphConfigBuilder {
    client_id: Option<String>,
    client_secret: Option<String>,
    tenant_id: Option<String>,
    base_url: Option<String>,
    token_url: Option<String>,
    scope: Option<String>,
    http_client: Option<Arc<dyn HttpClient>>,
}

impl GraphConfigBuilder {
    /// Sets the application (client) id. Required.
    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Sets the client secret. Required.
    pub fn client_secret(mut self, client_secret: impl Into<String>) -> Self {
        self.client_secret = Some(client_secret.into());
        self
    }

    /// Sets the directory (tenant) id. Required.
    pub fn tenant_id(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    /// Overrides the REST base URL (national clouds, test servers).
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Overrides the token endpoint.
    pub fn token_url(mut self, token_url: impl Into<String>) -> Self {
        self.token_url = Some(token_url.into());
        self
    }

    /// Overrides the scope requested in the token exchange.
    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Injects a custom HTTP client.
    ///
    /// Without one, the facade falls back to the desktop reqwest client when
    /// the `desktop-shims` feature is enabled.
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Builds the final `GraphConfig` instance.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` naming the first missing or blank credential,
    /// or describing an invalid URL.
    pub fn build(self) -> Result<GraphConfig> {
        let client_id = self.client_id.unwrap_or_default();
        let client_secret = self.client_secret.unwrap_or_default();
        let tenant_id = self.tenant_id.unwrap_or_default();

        let token_url = self
            .token_url
            .unwrap_or_else(|| default_token_url(tenant_id.trim()));

        let config = GraphConfig {
            client_id: client_id.trim().to_string(),
            client_secret,
            tenant_id: tenant_id.trim().to_string(),
            base_url: self
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            token_url,
            scope: self.scope.unwrap_or_else(|| DEFAULT_SCOPE.to_string()),
            http_client: self.http_client,
        };

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn valid_builder() -> GraphConfigBuilder {
        GraphConfig::builder()
            .client_id("client")
            .client_secret("secret")
            .tenant_id("tenant")
    }

    #[test]
    fn test_build_with_defaults() {
        let config = valid_builder().build().unwrap();

        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(
            config.token_url,
            "https://login.microsoftonline.com/tenant/oauth2/v2.0/token"
        );
        assert_eq!(config.scope, DEFAULT_SCOPE);
        assert!(config.http_client.is_none());
    }

    #[test]
    fn test_missing_client_id_fails() {
        let result = GraphConfig::builder()
            .client_secret("secret")
            .tenant_id("tenant")
            .build();

        match result {
            Err(Error::Config(msg)) => assert!(msg.contains("CLIENT_ID")),
            other => panic!("expected config error, got {:?}", other),
        }
    }

    #[test]
    fn test_blank_secret_fails() {
        let result = valid_builder().client_secret("   ").build();

        match result {
            Err(Error::Config(msg)) => assert!(msg.contains("CLIENT_SECRET")),
            other => panic!("expected config error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_tenant_fails() {
        let result = GraphConfig::builder()
            .client_id("client")
            .client_secret("secret")
            .build();

        assert!(matches!(result, Err(Error::Config(msg)) if msg.contains("TENANT_ID")));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let config = valid_builder()
            .base_url("http://localhost:8080/v1.0/")
            .build()
            .unwrap();

        assert_eq!(config.base_url, "http://localhost:8080/v1.0");
    }

    #[test]
    fn test_relative_base_url_rejected() {
        let result = valid_builder().base_url("graph.microsoft.com").build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> = [
            (ENV_CLIENT_ID, "env-client"),
            (ENV_CLIENT_SECRET, "env-secret"),
            (ENV_TENANT_ID, "env-tenant"),
        ]
        .into_iter()
        .collect();

        let config = GraphConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();

        assert_eq!(config.client_id, "env-client");
        assert_eq!(config.tenant_id, "env-tenant");
        assert!(config.token_url.contains("env-tenant"));
    }

    #[test]
    fn test_from_lookup_missing_secret() {
        let result = GraphConfig::from_lookup(|k| match k {
            ENV_CLIENT_ID => Some("client".to_string()),
            ENV_TENANT_ID => Some("tenant".to_string()),
            _ => None,
        });

        assert!(matches!(result, Err(Error::Config(msg)) if msg.contains("CLIENT_SECRET")));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = valid_builder().client_secret("super-secret").build().unwrap();
        let debug = format!("{:?}", config);

        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
