//! Mail attachment transfer
//!
//! Payloads up to [`INLINE_ATTACHMENT_LIMIT`] are base64-encoded and posted in
//! a single request. Larger payloads, up to [`MAX_ATTACHMENT_SIZE`], go through
//! an upload session: one negotiate call, then fixed-size chunks PUT to the
//! session URL in strictly increasing offset order. The session keeps a single
//! append cursor, so chunks are never sent concurrently and a failed chunk
//! abandons the whole transfer.
//!
//! ```text
//! NotStarted ── size <= inline limit ──> Inline ─────────────────────────> Done
//!      └─────── size >  inline limit ──> SessionNegotiated ─> Uploading ─> Done
//! any error ──> Failed
//! ```

use std::fmt;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use bridge_traits::http::{HttpMethod, HttpRequest};
use bytes::Bytes;
use serde_json::{json, Value};
use tracing::{debug, info, instrument, warn};

use crate::client::GraphClient;
use crate::error::{GraphError, Result};
use crate::response::{ensure_success, parse_json, ErrorContext};
use crate::types::{Attachment, AttachmentResult, UploadSessionInfo};

/// Largest payload sent inline (3 MiB)
pub const INLINE_ATTACHMENT_LIMIT: u64 = 3 * 1024 * 1024;

/// Largest payload accepted at all (150 MiB)
pub const MAX_ATTACHMENT_SIZE: u64 = 150 * 1024 * 1024;

/// Session chunk size (4 MiB, a multiple of 320 KiB)
pub const UPLOAD_CHUNK_SIZE: u64 = 4 * 1024 * 1024;

const ATTACH: ErrorContext = ErrorContext::new("add attachments", "Mail.ReadWrite");

/// Inclusive byte range of one chunk within a payload of `total` bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
    pub total: u64,
}

impl ByteRange {
    /// Number of bytes in the range
    pub fn length(&self) -> u64 {
        self.end - self.start + 1
    }

    /// `Content-Range` header value: `bytes start-end/total`
    pub fn content_range(&self) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, self.total)
    }
}

/// Contiguous, non-overlapping chunk ranges covering `[0, total)`.
///
/// Chunk `i` covers `[i * chunk_size, min((i + 1) * chunk_size, total) - 1]`.
#[derive(Debug, Clone)]
pub struct ChunkPlan {
    total: u64,
    chunk_size: u64,
    offset: u64,
}

impl ChunkPlan {
    pub fn new(total: u64, chunk_size: u64) -> Self {
        Self {
            total,
            chunk_size: chunk_size.max(1),
            offset: 0,
        }
    }

    pub fn chunk_count(&self) -> u64 {
        self.total.div_ceil(self.chunk_size)
    }
}

impl Iterator for ChunkPlan {
    type Item = ByteRange;

    fn next(&mut self) -> Option<ByteRange> {
        if self.offset >= self.total {
            return None;
        }
        let start = self.offset;
        let end = (start + self.chunk_size).min(self.total);
        self.offset = end;
        Some(ByteRange {
            start,
            end: end - 1,
            total: self.total,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStrategy {
    Inline,
    Session,
}

/// Pick the strategy for a payload of `size` bytes.
///
/// # Errors
///
/// `GraphError::Validation` when `size` exceeds [`MAX_ATTACHMENT_SIZE`].
pub fn select_strategy(size: u64) -> Result<TransferStrategy> {
    if size > MAX_ATTACHMENT_SIZE {
        return Err(GraphError::validation(format!(
            "attachment is {} bytes, the limit is {} bytes (150 MiB)",
            size, MAX_ATTACHMENT_SIZE
        )));
    }
    if size <= INLINE_ATTACHMENT_LIMIT {
        Ok(TransferStrategy::Inline)
    } else {
        Ok(TransferStrategy::Session)
    }
}

/// Where a transfer currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferState {
    NotStarted,
    Inline,
    SessionNegotiated,
    /// Chunk `chunk` (zero-based) of `chunks` is in flight
    Uploading { chunk: u64, chunks: u64 },
    Done,
    Failed,
}

impl TransferState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransferState::Done | TransferState::Failed)
    }
}

/// Attachment content and metadata, ready to send
#[derive(Clone)]
pub struct AttachmentPayload {
    pub name: String,
    pub content_type: String,
    pub content: Bytes,
    pub is_inline: bool,
}

impl fmt::Debug for AttachmentPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttachmentPayload")
            .field("name", &self.name)
            .field("content_type", &self.content_type)
            .field("size", &self.content.len())
            .field("is_inline", &self.is_inline)
            .finish()
    }
}

impl AttachmentPayload {
    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }
}

/// One attachment transfer against one message.
///
/// Single use: once it reaches `Done` or `Failed` it cannot be run again.
pub(crate) struct AttachmentTransfer<'a> {
    client: &'a GraphClient,
    message_path: String,
    payload: AttachmentPayload,
    state: TransferState,
}

impl<'a> AttachmentTransfer<'a> {
    /// `message_path` is the message resource path, e.g. `/users/{id}/messages/{id}`
    pub(crate) fn new(
        client: &'a GraphClient,
        message_path: String,
        payload: AttachmentPayload,
    ) -> Self {
        Self {
            client,
            message_path,
            payload,
            state: TransferState::NotStarted,
        }
    }

    pub(crate) fn state(&self) -> TransferState {
        self.state
    }

    #[instrument(skip(self), fields(name = %self.payload.name, size = self.payload.size()))]
    pub(crate) async fn run(&mut self) -> Result<AttachmentResult> {
        if self.state != TransferState::NotStarted {
            return Err(GraphError::validation("attachment transfer already ran"));
        }

        let result = self.transfer().await;
        match &result {
            Ok(_) => self.transition(TransferState::Done),
            Err(error) => {
                warn!(state = ?self.state, error = %error, "Attachment transfer failed");
                self.transition(TransferState::Failed);
            }
        }
        result
    }

    fn transition(&mut self, next: TransferState) {
        debug!(from = ?self.state, to = ?next, "Transfer state change");
        self.state = next;
    }

    async fn transfer(&mut self) -> Result<AttachmentResult> {
        match select_strategy(self.payload.size())? {
            TransferStrategy::Inline => {
                self.transition(TransferState::Inline);
                let attachment = self.send_inline().await?;
                info!(name = %self.payload.name, "Attachment added inline");
                Ok(AttachmentResult::Inline(attachment))
            }
            TransferStrategy::Session => {
                let session = self
                    .negotiate()
                    .await
                    .map_err(|e| GraphError::upload("could not create upload session", Some(e)))?;
                self.transition(TransferState::SessionNegotiated);

                let acknowledgment = self.send_chunks(&session).await?;
                info!(name = %self.payload.name, "Attachment uploaded through session");
                Ok(AttachmentResult::Session {
                    session,
                    acknowledgment,
                })
            }
        }
    }

    async fn send_inline(&self) -> Result<Attachment> {
        let body = json!({
            "@odata.type": "#microsoft.graph.fileAttachment",
            "name": self.payload.name,
            "contentType": self.payload.content_type,
            "contentBytes": BASE64.encode(&self.payload.content),
            "isInline": self.payload.is_inline,
        });

        let request = self
            .client
            .request(HttpMethod::Post, &format!("{}/attachments", self.message_path))
            .json(&body)?;
        let response = ensure_success(self.client.send(request).await?, &ATTACH)?;
        parse_json(&response)
    }

    async fn negotiate(&self) -> Result<UploadSessionInfo> {
        let body = json!({
            "AttachmentItem": {
                "attachmentType": "file",
                "name": self.payload.name,
                "size": self.payload.size(),
                "isInline": self.payload.is_inline,
                "contentType": self.payload.content_type,
            }
        });

        let request = self
            .client
            .request(
                HttpMethod::Post,
                &format!("{}/attachments/createUploadSession", self.message_path),
            )
            .json(&body)?;
        let response = ensure_success(self.client.send(request).await?, &ATTACH)?;
        let session: UploadSessionInfo = parse_json(&response)?;

        if session.upload_url.is_empty() {
            return Err(GraphError::Parse(
                "upload session response has no uploadUrl".to_string(),
            ));
        }

        debug!(expires = ?session.expiration_date_time, "Upload session negotiated");
        Ok(session)
    }

    /// PUT every chunk in order; returns the last acknowledgment body, if any
    async fn send_chunks(&mut self, session: &UploadSessionInfo) -> Result<Option<Value>> {
        let plan = ChunkPlan::new(self.payload.size(), UPLOAD_CHUNK_SIZE);
        let chunks = plan.chunk_count();
        let mut acknowledgment = None;

        for (index, range) in (0u64..).zip(plan) {
            self.transition(TransferState::Uploading {
                chunk: index,
                chunks,
            });

            let chunk = self
                .payload
                .content
                .slice(range.start as usize..=range.end as usize);
            let request = HttpRequest::new(HttpMethod::Put, session.upload_url.clone())
                .header("Content-Length", range.length().to_string())
                .header("Content-Range", range.content_range())
                .body(chunk);

            let response = self.client.send_unauthenticated(request).await.map_err(|e| {
                GraphError::upload(format!("chunk {} of {} failed", index + 1, chunks), Some(e))
            })?;
            let response = ensure_success(response, &ATTACH).map_err(|e| {
                GraphError::upload(
                    format!("chunk {} of {} rejected ({})", index + 1, chunks, range.content_range()),
                    Some(e),
                )
            })?;

            debug!(
                chunk = index + 1,
                chunks,
                range = %range.content_range(),
                status = response.status,
                "Chunk accepted"
            );

            acknowledgment = match serde_json::from_slice::<Value>(&response.body) {
                Ok(value) => Some(value),
                Err(e) => {
                    if !response.body.is_empty() {
                        debug!(chunk = index + 1, bytes = response.body.len(), error = %e, "Chunk acknowledgment is not JSON");
                    }
                    None
                }
            };
        }

        Ok(acknowledgment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::http::{HttpClient, HttpResponse};
    use core_auth::{AccessToken, Result as AuthResult, TokenProvider};

    const MIB: u64 = 1024 * 1024;

    struct StaticToken;

    #[async_trait]
    impl TokenProvider for StaticToken {
        async fn access_token(&self) -> AuthResult<AccessToken> {
            Ok(AccessToken::new("token"))
        }

        async fn invalidate(&self) {}
    }

    /// Answers negotiate with a session and chunks with `chunk_status`
    struct SessionStub {
        chunk_status: u16,
        requests: Mutex<Vec<HttpRequest>>,
    }

    #[async_trait]
    impl HttpClient for SessionStub {
        async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse> {
            let is_negotiate = request.url.ends_with("createUploadSession");
            self.requests.lock().unwrap().push(request);
            if is_negotiate {
                Ok(HttpResponse::new(
                    200,
                    r#"{"uploadUrl":"https://outlook.office.com/upload/abc","expirationDateTime":"2026-10-20T00:00:00Z"}"#,
                ))
            } else {
                Ok(HttpResponse::new(self.chunk_status, ""))
            }
        }
    }

    fn client(stub: Arc<SessionStub>) -> GraphClient {
        GraphClient::new(stub, Arc::new(StaticToken), "https://graph.microsoft.com/v1.0")
    }

    fn payload(size: u64) -> AttachmentPayload {
        AttachmentPayload {
            name: "report.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            content: Bytes::from(vec![7u8; size as usize]),
            is_inline: false,
        }
    }

    #[test]
    fn test_ten_mib_plan() {
        let ranges: Vec<ByteRange> = ChunkPlan::new(10 * MIB, UPLOAD_CHUNK_SIZE).collect();

        assert_eq!(
            ranges.iter().map(|r| (r.start, r.end)).collect::<Vec<_>>(),
            vec![(0, 4194303), (4194304, 8388607), (8388608, 10485759)]
        );
        assert_eq!(ranges[2].content_range(), "bytes 8388608-10485759/10485760");
    }

    #[test]
    fn test_plan_covers_payload_exactly_once() {
        for size in [1, 319, UPLOAD_CHUNK_SIZE - 1, UPLOAD_CHUNK_SIZE, UPLOAD_CHUNK_SIZE + 1, 37 * MIB + 5] {
            let plan = ChunkPlan::new(size, UPLOAD_CHUNK_SIZE);
            let expected_chunks = plan.chunk_count();
            let ranges: Vec<ByteRange> = plan.collect();

            assert_eq!(ranges.len() as u64, expected_chunks);
            assert_eq!(ranges[0].start, 0);
            assert_eq!(ranges.last().unwrap().end, size - 1);
            for pair in ranges.windows(2) {
                assert_eq!(pair[1].start, pair[0].end + 1);
            }
            assert_eq!(ranges.iter().map(ByteRange::length).sum::<u64>(), size);
        }
    }

    #[test]
    fn test_empty_payload_has_no_chunks() {
        assert_eq!(ChunkPlan::new(0, UPLOAD_CHUNK_SIZE).count(), 0);
    }

    #[test]
    fn test_strategy_thresholds() {
        assert_eq!(select_strategy(0).unwrap(), TransferStrategy::Inline);
        assert_eq!(select_strategy(INLINE_ATTACHMENT_LIMIT).unwrap(), TransferStrategy::Inline);
        assert_eq!(select_strategy(INLINE_ATTACHMENT_LIMIT + 1).unwrap(), TransferStrategy::Session);
        assert_eq!(select_strategy(MAX_ATTACHMENT_SIZE).unwrap(), TransferStrategy::Session);
        assert!(matches!(
            select_strategy(MAX_ATTACHMENT_SIZE + 1),
            Err(GraphError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_session_transfer_reaches_done() {
        let stub = Arc::new(SessionStub {
            chunk_status: 202,
            requests: Mutex::new(Vec::new()),
        });
        let client = client(Arc::clone(&stub));
        let mut transfer =
            AttachmentTransfer::new(&client, "/users/u1/messages/m1".to_string(), payload(5 * MIB));

        let result = transfer.run().await.unwrap();

        assert_eq!(transfer.state(), TransferState::Done);
        match result {
            AttachmentResult::Session { session, acknowledgment } => {
                assert_eq!(session.upload_url, "https://outlook.office.com/upload/abc");
                assert!(acknowledgment.is_none());
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(stub.requests.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_rejected_chunk_fails_transfer() {
        let stub = Arc::new(SessionStub {
            chunk_status: 416,
            requests: Mutex::new(Vec::new()),
        });
        let client = client(Arc::clone(&stub));
        let mut transfer =
            AttachmentTransfer::new(&client, "/users/u1/messages/m1".to_string(), payload(9 * MIB));

        let error = transfer.run().await.unwrap_err();

        assert!(matches!(error, GraphError::Upload { .. }));
        assert_eq!(transfer.state(), TransferState::Failed);
        // negotiate + first chunk only
        assert_eq!(stub.requests.lock().unwrap().len(), 2);

        assert!(matches!(transfer.run().await, Err(GraphError::Validation(_))));
    }
}
