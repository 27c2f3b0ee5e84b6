//! Shared test doubles for the Graph integration tests

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
use core_auth::{AccessToken, Result as AuthResult, TokenProvider};
use provider_msgraph::GraphClient;

pub const BASE_URL: &str = "https://graph.microsoft.com/v1.0";
pub const UPLOAD_URL: &str = "https://outlook.office.com/api/v2.0/Users('u1')/Messages('m1')/AttachmentSessions('s1')?authtoken=abc";

type Responder = dyn Fn(&HttpRequest) -> HttpResponse + Send + Sync;

/// Transport stub that records every request and answers through a closure
pub struct RecordingHttpClient {
    responder: Box<Responder>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl RecordingHttpClient {
    pub fn new<F>(responder: F) -> Arc<Self>
    where
        F: Fn(&HttpRequest) -> HttpResponse + Send + Sync + 'static,
    {
        Arc::new(Self {
            responder: Box::new(responder),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Answer every request with the same status and body
    pub fn always(status: u16, body: &'static str) -> Arc<Self> {
        Self::new(move |_| HttpResponse::new(status, body))
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl HttpClient for RecordingHttpClient {
    async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse> {
        let response = (self.responder)(&request);
        self.requests.lock().unwrap().push(request);
        Ok(response)
    }
}

/// Token provider that always hands out the same token
pub struct StaticToken;

#[async_trait]
impl TokenProvider for StaticToken {
    async fn access_token(&self) -> AuthResult<AccessToken> {
        Ok(AccessToken::new("test-token"))
    }

    async fn invalidate(&self) {}
}

pub fn graph_client(http: Arc<RecordingHttpClient>) -> GraphClient {
    GraphClient::new(http, Arc::new(StaticToken), BASE_URL)
}

/// Answers `createUploadSession` with a session and chunk PUTs with 200
pub fn upload_session_server() -> Arc<RecordingHttpClient> {
    RecordingHttpClient::new(|request| {
        if request.url.ends_with("/createUploadSession") {
            HttpResponse::new(
                201,
                format!(
                    r#"{{"uploadUrl":"{}","expirationDateTime":"2026-10-19T18:00:00Z","nextExpectedRanges":["0-"]}}"#,
                    UPLOAD_URL
                ),
            )
        } else if request.url == UPLOAD_URL {
            HttpResponse::new(200, "")
        } else {
            HttpResponse::new(500, "unexpected request")
        }
    })
}

/// Formatted `tracing` output captured in memory
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    /// Install a DEBUG subscriber for the current thread
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let writer = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn output(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl std::io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
