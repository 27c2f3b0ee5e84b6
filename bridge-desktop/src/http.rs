use std::time::Duration;

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    http::{HttpClient, HttpMethod, HttpRequest, HttpResponse},
};
use reqwest::{redirect, Client, ClientBuilder};
use tracing::{debug, warn};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const IDLE_CONNECTIONS_PER_HOST: usize = 10;
/// `/content` downloads redirect once to storage; leave headroom.
const MAX_REDIRECTS: usize = 10;

/// `HttpClient` over a pooled `reqwest::Client` with rustls.
///
/// There is no overall request deadline unless one is set with
/// [`with_timeout`](Self::with_timeout); a 4 MiB chunk on a slow link may
/// legitimately take minutes.
pub struct ReqwestHttpClient {
    client: Client,
}

impl ReqwestHttpClient {
    pub fn new() -> Result<Self> {
        Self::build(base_builder())
    }

    /// Same as [`new`](Self::new) with a deadline on each whole exchange.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        Self::build(base_builder().timeout(timeout))
    }

    /// Use a caller-configured client (proxies, custom roots).
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    fn build(builder: ClientBuilder) -> Result<Self> {
        let client = builder
            .build()
            .map_err(|e| BridgeError::OperationFailed(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    fn to_reqwest(&self, request: HttpRequest) -> reqwest::RequestBuilder {
        let HttpRequest {
            method,
            url,
            query,
            headers,
            body,
        } = request;

        let mut builder = self.client.request(reqwest_method(method), url);
        if !query.is_empty() {
            builder = builder.query(&query);
        }
        builder = headers
            .into_iter()
            .fold(builder, |builder, (name, value)| builder.header(name, value));
        match body {
            Some(body) => builder.body(body),
            None => builder,
        }
    }
}

fn base_builder() -> ClientBuilder {
    Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .pool_max_idle_per_host(IDLE_CONNECTIONS_PER_HOST)
        .redirect(redirect::Policy::limited(MAX_REDIRECTS))
        .user_agent(concat!("msgraph-toolkit/", env!("CARGO_PKG_VERSION")))
}

fn reqwest_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Patch => reqwest::Method::PATCH,
    }
}

fn bridge_error(error: reqwest::Error) -> BridgeError {
    let detail = error.to_string();
    if error.is_timeout() {
        BridgeError::Timeout(detail)
    } else if error.is_connect() {
        BridgeError::Connection(detail)
    } else {
        BridgeError::OperationFailed(detail)
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let method = request.method;
        debug!(method = method.as_str(), url = %request.url, "Sending request");

        let response = self
            .to_reqwest(request)
            .send()
            .await
            .map_err(|e| {
                warn!(method = method.as_str(), error = %e, "Transport failure");
                bridge_error(e)
            })?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                let value = value.to_str().ok()?;
                Some((name.as_str().to_owned(), value.to_owned()))
            })
            .collect();
        let body = response.bytes().await.map_err(bridge_error)?;

        debug!(status, bytes = body.len(), "Response received");
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn clients_build_with_and_without_deadline() {
        assert!(ReqwestHttpClient::new().is_ok());
        assert!(ReqwestHttpClient::with_timeout(Duration::from_secs(5)).is_ok());
    }

    #[test]
    fn every_method_maps_to_reqwest() {
        let pairs = [
            (HttpMethod::Get, reqwest::Method::GET),
            (HttpMethod::Post, reqwest::Method::POST),
            (HttpMethod::Put, reqwest::Method::PUT),
            (HttpMethod::Patch, reqwest::Method::PATCH),
        ];
        for (method, expected) in pairs {
            assert_eq!(reqwest_method(method), expected);
        }
    }

    #[test]
    fn query_is_encoded_and_headers_forwarded() {
        let client = ReqwestHttpClient::new().unwrap();
        let request = HttpRequest::new(HttpMethod::Get, "https://graph.example/v1.0/users")
            .query("$top", "5")
            .header("ConsistencyLevel", "eventual");

        let built = client.to_reqwest(request).build().unwrap();

        assert_eq!(built.url().query(), Some("%24top=5"));
        assert_eq!(built.headers()["ConsistencyLevel"], "eventual");
    }

    #[test]
    fn chunk_body_is_attached() {
        let client = ReqwestHttpClient::new().unwrap();
        let request = HttpRequest::new(HttpMethod::Put, "https://upload.example/session")
            .header("Content-Range", "bytes 0-3/4")
            .body(bytes::Bytes::from_static(b"abcd"));

        let built = client.to_reqwest(request).build().unwrap();

        assert_eq!(built.method(), reqwest::Method::PUT);
        let body = built.body().and_then(|b| b.as_bytes()).unwrap();
        assert_eq!(body, b"abcd");
    }
}
