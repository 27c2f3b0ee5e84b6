//! Requests and responses as plain data, plus the one transport capability
//! the Graph core needs: send a request, get a response back.

use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{de::DeserializeOwned, Serialize};

use crate::error::{BridgeError, Result};

/// Verbs used against Graph and upload session URLs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
        }
    }
}

/// Outgoing request.
///
/// `query` keeps insertion order and is encoded by the transport, so values
/// such as OData filters are stored unescaped.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: HashMap<String, String>,
    pub body: Option<Bytes>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: Vec::new(),
            headers: HashMap::new(),
            body: None,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn query(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_pairs([(key, value)])
    }

    pub fn query_pairs<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in pairs {
            self.query.push((key.into(), value.into()));
        }
        self
    }

    pub fn bearer_token(self, token: impl AsRef<str>) -> Self {
        let value = format!("Bearer {}", token.as_ref());
        self.header("Authorization", value)
    }

    /// Serialize `payload` as the body and mark it `application/json`.
    pub fn json<T: Serialize + ?Sized>(self, payload: &T) -> Result<Self> {
        let encoded = serde_json::to_vec(payload)
            .map_err(|e| BridgeError::OperationFailed(format!("JSON serialization failed: {e}")))?;
        Ok(self
            .header("Content-Type", "application/json")
            .body(Bytes::from(encoded)))
    }

    pub fn body(mut self, body: Bytes) -> Self {
        self.body = Some(body);
        self
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        lookup(&self.headers, name)
    }
}

/// Response as received, whatever the status.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(|e| {
            BridgeError::OperationFailed(format!("JSON deserialization failed: {e}"))
        })
    }

    /// Body decoded as UTF-8, invalid sequences replaced.
    pub fn text_lossy(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        lookup(&self.headers, name)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

// Header names are case-insensitive on the wire.
fn lookup<'a>(headers: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find_map(|(key, value)| key.eq_ignore_ascii_case(name).then_some(value.as_str()))
}

/// Transport used by every Graph call.
///
/// Implementations follow redirects, since `/content` downloads answer with
/// a 302 to a storage URL. Every status, 4xx and 5xx included, comes back as
/// an [`HttpResponse`]. Only failures to exchange a request at all (DNS, TLS,
/// connect, timeout) are reported as [`BridgeError`].
///
/// ```ignore
/// let response = client
///     .execute(HttpRequest::new(HttpMethod::Get, url).bearer_token(token))
///     .await?;
/// let user: User = response.json()?;
/// ```
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_accumulates_query_in_order() {
        let request = HttpRequest::new(HttpMethod::Get, "https://graph.example/v1.0/users")
            .query("$select", "id")
            .query_pairs([("$top", "5"), ("$filter", "startswith(mail,'a')")]);

        let keys: Vec<&str> = request.query.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["$select", "$top", "$filter"]);
        assert_eq!(request.query[2].1, "startswith(mail,'a')");
    }

    #[test]
    fn bearer_token_sets_authorization() {
        let request = HttpRequest::new(HttpMethod::Get, "https://graph.example").bearer_token("t0k");

        assert_eq!(request.header_value("AUTHORIZATION"), Some("Bearer t0k"));
    }

    #[test]
    fn json_body_sets_content_type() {
        let request = HttpRequest::new(HttpMethod::Post, "https://graph.example")
            .json(&serde_json::json!({ "name": "folder" }))
            .unwrap();

        assert_eq!(request.header_value("content-type"), Some("application/json"));
        let body: serde_json::Value = serde_json::from_slice(request.body.as_ref().unwrap()).unwrap();
        assert_eq!(body["name"], "folder");
    }

    #[test]
    fn success_is_2xx_only() {
        assert!(HttpResponse::new(204, "").is_success());
        assert!(!HttpResponse::new(304, "").is_success());
        assert!(!HttpResponse::new(412, "").is_success());
    }

    #[test]
    fn response_headers_match_any_case() {
        let response = HttpResponse::new(200, "").with_header("ETag", "\"abc\"");

        assert_eq!(response.header("etag"), Some("\"abc\""));
        assert_eq!(response.header("missing"), None);
    }

    #[test]
    fn lossy_text_tolerates_bad_utf8() {
        let response = HttpResponse::new(500, vec![b'o', b'k', 0xff]);
        assert_eq!(response.text_lossy(), "ok\u{fffd}");
    }
}
