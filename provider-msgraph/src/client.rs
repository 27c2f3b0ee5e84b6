//! Graph API client core
//!
//! One implementation shared by every calling convention. It turns a path
//! relative to the API base into an [`HttpRequest`], attaches the bearer
//! token and a correlation id, and hands it to the injected [`HttpClient`].

use std::sync::Arc;

use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use core_auth::{ClientCredentials, ClientCredentialsProvider, TokenProvider};
use core_runtime::config::GraphConfig;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::drives::Drives;
use crate::error::Result;
use crate::mail::Mail;
use crate::users::Users;

/// Correlation header echoed in the service's own logs
pub const CLIENT_REQUEST_ID: &str = "client-request-id";

/// Graph API client.
///
/// Cheap to clone; clones share the transport and the token cache.
///
/// # Example
///
/// ```ignore
/// use provider_msgraph::GraphClient;
///
/// let client = GraphClient::from_config(&config, http_client)?;
/// let users = client.users().list_users(&Default::default()).await?;
/// ```
#[derive(Clone)]
pub struct GraphClient {
    http_client: Arc<dyn HttpClient>,
    tokens: Arc<dyn TokenProvider>,
    base_url: String,
}

impl GraphClient {
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        tokens: Arc<dyn TokenProvider>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            http_client,
            tokens,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Build a client-credentials client from validated configuration.
    pub fn from_config(config: &GraphConfig, http_client: Arc<dyn HttpClient>) -> Result<Self> {
        let credentials = ClientCredentials::with_endpoint(
            config.client_id.clone(),
            config.client_secret.clone(),
            config.tenant_id.clone(),
            config.token_url.clone(),
            config.scope.clone(),
        )?;
        let tokens = Arc::new(ClientCredentialsProvider::new(
            credentials,
            Arc::clone(&http_client),
        ));

        Ok(Self::new(http_client, tokens, config.base_url.clone()))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token_provider(&self) -> &Arc<dyn TokenProvider> {
        &self.tokens
    }

    pub fn users(&self) -> Users<'_> {
        Users::new(self)
    }

    pub fn drives(&self) -> Drives<'_> {
        Drives::new(self)
    }

    pub fn mail(&self) -> Mail<'_> {
        Mail::new(self)
    }

    /// Request for a path relative to the API base (`/users`, `/me/drive`)
    pub(crate) fn request(&self, method: HttpMethod, path: &str) -> HttpRequest {
        HttpRequest::new(method, format!("{}{}", self.base_url, path))
    }

    /// Send an authenticated request.
    ///
    /// Fetches a token first if none is cached. Any status code is returned
    /// as a response; only transport and credential failures are errors.
    pub(crate) async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let token = self.tokens.access_token().await?;
        self.execute(request.bearer_token(token.secret())).await
    }

    /// Send a request without the bearer token, for pre-authorized URLs
    /// such as upload sessions.
    pub(crate) async fn send_unauthenticated(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.execute(request).await
    }

    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let request_id = Uuid::new_v4().to_string();
        let request = request.header(CLIENT_REQUEST_ID, request_id.clone());

        debug!(
            method = request.method.as_str(),
            url = loggable_url(&request.url),
            client_request_id = %request_id,
            "Sending Graph request"
        );

        let response = self.http_client.execute(request).await.map_err(|e| {
            warn!(client_request_id = %request_id, error = %e, "Transport failure");
            e
        })?;

        debug!(
            status = response.status,
            client_request_id = %request_id,
            request_id = response.header("request-id").unwrap_or("-"),
            "Graph response received"
        );

        Ok(response)
    }
}

/// URL without its query string. Upload session URLs carry their credential
/// in the query.
fn loggable_url(url: &str) -> &str {
    url.split_once('?').map_or(url, |(base, _)| base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loggable_url_drops_query() {
        assert_eq!(
            loggable_url("https://outlook.office.com/api/v2.0/AttachmentSessions('s1')?authtoken=abc"),
            "https://outlook.office.com/api/v2.0/AttachmentSessions('s1')"
        );
        assert_eq!(
            loggable_url("https://graph.microsoft.com/v1.0/me/drive"),
            "https://graph.microsoft.com/v1.0/me/drive"
        );
    }
}
