//! # msgraph-toolkit
//!
//! Typed Microsoft Graph client for users, drives and mail.
//!
//! [`MsGraph`] is the non-blocking entry point; [`blocking::MsGraph`] drives
//! the same implementation from synchronous code. Both take a validated
//! [`GraphConfig`] and authenticate with client credentials.
//!
//! ```ignore
//! use msgraph_toolkit::{GraphConfig, MsGraph, DriveScope, ListChildrenParams};
//!
//! let graph = MsGraph::new(GraphConfig::from_env()?)?;
//! let children = graph
//!     .drives()
//!     .list_children(&ListChildrenParams {
//!         scope: DriveScope::user("adele@contoso.com"),
//!         item_path: Some("Reports".into()),
//!         ..Default::default()
//!     })
//!     .await?;
//! ```
//!
//! The HTTP transport is injectable through [`GraphConfig`]. Without one, the
//! `desktop-shims` feature (on by default) supplies a `reqwest` client.

pub mod blocking;
pub mod error;

use std::sync::Arc;

use bridge_traits::http::HttpClient;
use tracing::info;

pub use core_runtime::{init_logging, GraphConfig, GraphConfigBuilder, LogFormat, LogLevel, LoggingConfig};
pub use error::{Error, Result};
pub use provider_msgraph::*;

/// Graph client facade.
///
/// Cheap to clone; clones share the transport and the cached token.
#[derive(Clone)]
pub struct MsGraph {
    client: GraphClient,
}

impl MsGraph {
    /// Create a client from configuration.
    ///
    /// # Errors
    ///
    /// - `Error::Config` if the configuration is invalid, or if no HTTP
    ///   client was injected and no default transport is compiled in
    /// - `Error::Graph` if the default transport cannot be created
    pub fn new(config: GraphConfig) -> Result<Self> {
        config.validate()?;
        let http_client = resolve_http_client(&config)?;
        let client = GraphClient::from_config(&config, http_client)?;

        info!(
            tenant = %config.tenant_id,
            base_url = %config.base_url,
            "Graph client ready"
        );
        Ok(Self { client })
    }

    /// Wrap an already assembled client core
    pub fn from_client(client: GraphClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &GraphClient {
        &self.client
    }

    pub fn users(&self) -> Users<'_> {
        self.client.users()
    }

    pub fn drives(&self) -> Drives<'_> {
        self.client.drives()
    }

    pub fn mail(&self) -> Mail<'_> {
        self.client.mail()
    }

    /// Drop the cached token; the next call performs a fresh exchange.
    pub async fn invalidate_token(&self) {
        self.client.token_provider().invalidate().await;
    }
}

fn resolve_http_client(config: &GraphConfig) -> Result<Arc<dyn HttpClient>> {
    if let Some(client) = &config.http_client {
        return Ok(Arc::clone(client));
    }
    default_http_client()
}

#[cfg(feature = "desktop-shims")]
fn default_http_client() -> Result<Arc<dyn HttpClient>> {
    let client = bridge_desktop::ReqwestHttpClient::new().map_err(GraphError::from)?;
    Ok(Arc::new(client))
}

#[cfg(not(feature = "desktop-shims"))]
fn default_http_client() -> Result<Arc<dyn HttpClient>> {
    Err(core_runtime::Error::CapabilityMissing {
        capability: "HttpClient".to_string(),
        message: "inject an HttpClient into GraphConfig or enable the desktop-shims feature"
            .to_string(),
    }
    .into())
}
