//! Mailbox messages and attachments
//!
//! Client credentials carry no signed-in user, so every operation needs the
//! mailbox owner's id or principal name.

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::str::FromStr;

use bridge_traits::http::HttpMethod;
use bytes::Bytes;
use core_runtime::logging::{redact_if_sensitive, strip_path};
use serde_json::{json, Map, Value};
use tracing::{debug, info, instrument};

use crate::client::GraphClient;
use crate::error::{GraphError, Result};
use crate::query::ODataQuery;
use crate::recipients::{normalize_all, Recipient};
use crate::response::{body_contains, ensure_success, parse_json, ErrorContext};
use crate::scope::{mailbox_path, segment};
use crate::types::{AttachmentResult, Collection, Message};
use crate::upload::{select_strategy, AttachmentPayload, AttachmentTransfer};

const LIST: ErrorContext = ErrorContext::new("list messages", "Mail.ReadBasic or Mail.Read");
const CREATE: ErrorContext = ErrorContext::new("create messages", "Mail.ReadWrite");
const SEND: ErrorContext = ErrorContext::new("send messages", "Mail.Send");

const MAX_TOP: u32 = 1000;

/// Body format of a message
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BodyType {
    #[default]
    Html,
    Text,
}

impl BodyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BodyType::Html => "html",
            BodyType::Text => "text",
        }
    }
}

impl fmt::Display for BodyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BodyType {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "html" => Ok(BodyType::Html),
            "text" => Ok(BodyType::Text),
            _ => Err(GraphError::validation(format!(
                "body type must be html or text, got '{}'",
                s
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Importance {
    Low,
    #[default]
    Normal,
    High,
}

impl Importance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Importance::Low => "low",
            Importance::Normal => "normal",
            Importance::High => "high",
        }
    }
}

impl FromStr for Importance {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Importance::Low),
            "normal" => Ok(Importance::Normal),
            "high" => Ok(Importance::High),
            _ => Err(GraphError::validation(format!(
                "importance must be low, normal or high, got '{}'",
                s
            ))),
        }
    }
}

/// Custom internet message header (`x-` prefixed by convention)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHeader {
    pub name: String,
    pub value: String,
}

impl MessageHeader {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Draft built from individual fields
#[derive(Debug, Clone, Default)]
pub struct StructuredMessage {
    pub subject: String,
    pub body: String,
    pub body_type: BodyType,
    pub importance: Importance,
    pub to: Vec<Recipient>,
    pub cc: Vec<Recipient>,
    pub bcc: Vec<Recipient>,
    pub reply_to: Vec<Recipient>,
    pub headers: Vec<MessageHeader>,
}

impl StructuredMessage {
    pub fn new(subject: impl Into<String>, body: impl Into<String>, to: Vec<Recipient>) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
            to,
            ..Default::default()
        }
    }

    fn to_json(&self) -> Result<Value> {
        if self.subject.is_empty() || self.body.is_empty() || self.to.is_empty() {
            return Err(GraphError::validation(
                "subject, body and at least one recipient are required",
            ));
        }

        let mut message = Map::new();
        message.insert("subject".into(), json!(self.subject));
        message.insert("importance".into(), json!(self.importance.as_str()));
        message.insert(
            "body".into(),
            json!({ "contentType": self.body_type.as_str(), "content": self.body }),
        );
        message.insert("toRecipients".into(), Value::Array(normalize_all(&self.to)?));

        for (key, list) in [
            ("ccRecipients", &self.cc),
            ("bccRecipients", &self.bcc),
            ("replyTo", &self.reply_to),
        ] {
            if !list.is_empty() {
                message.insert(key.into(), Value::Array(normalize_all(list)?));
            }
        }

        if !self.headers.is_empty() {
            if self.headers.iter().any(|h| h.name.trim().is_empty()) {
                return Err(GraphError::validation("message header names must not be empty"));
            }
            let headers: Vec<Value> = self
                .headers
                .iter()
                .map(|h| json!({ "name": h.name, "value": h.value }))
                .collect();
            message.insert("internetMessageHeaders".into(), Value::Array(headers));
        }

        Ok(Value::Object(message))
    }
}

/// Content of a new draft: structured fields or a full MIME message, never both
#[derive(Debug, Clone)]
pub enum MessageDraft {
    Structured(StructuredMessage),
    /// Base64-encoded MIME content
    Mime(String),
}

/// Parameters for [`Mail::list_messages`]
#[derive(Debug, Clone, Default)]
pub struct ListMessagesParams {
    pub folder_id: Option<String>,
    pub select: Option<String>,
    pub filter: Option<String>,
    pub orderby: Option<String>,
    /// 1..=1000
    pub top: Option<u32>,
    /// Sets `Prefer: outlook.body-content-type`
    pub body_type: Option<BodyType>,
}

/// Where attachment content comes from
#[derive(Debug, Clone)]
pub enum AttachmentSource {
    /// Read from disk; the attachment is named after the file
    Path(PathBuf),
    Bytes { content: Bytes, file_name: String },
}

pub struct Mail<'a> {
    client: &'a GraphClient,
}

impl<'a> Mail<'a> {
    pub(crate) fn new(client: &'a GraphClient) -> Self {
        Self { client }
    }

    fn messages_path(user_id: &str, folder_id: Option<&str>) -> Result<String> {
        let base = mailbox_path(user_id)?;
        Ok(match folder_id {
            Some(folder) if !folder.is_empty() => {
                format!("{}/mailFolders/{}/messages", base, segment(folder))
            }
            _ => format!("{}/messages", base),
        })
    }

    fn message_path(user_id: &str, message_id: &str) -> Result<String> {
        if message_id.trim().is_empty() {
            return Err(GraphError::validation("message_id must not be empty"));
        }
        Ok(format!("{}/messages/{}", mailbox_path(user_id)?, segment(message_id)))
    }

    /// List messages in the mailbox or in one folder.
    #[instrument(skip(self, user_id), fields(user = %redact_if_sensitive("user_id", user_id)))]
    pub async fn list_messages(
        &self,
        user_id: &str,
        params: &ListMessagesParams,
    ) -> Result<Collection<Message>> {
        if let Some(top) = params.top {
            if !(1..=MAX_TOP).contains(&top) {
                return Err(GraphError::validation(format!(
                    "top must be between 1 and {}, got {}",
                    MAX_TOP, top
                )));
            }
        }

        let path = Self::messages_path(user_id, params.folder_id.as_deref())?;
        let query = ODataQuery::new()
            .select(params.select.as_deref())
            .filter(params.filter.as_deref())
            .orderby(params.orderby.as_deref())
            .top(params.top);

        let mut request = self
            .client
            .request(HttpMethod::Get, &path)
            .query_pairs(query.into_pairs());
        if let Some(body_type) = params.body_type {
            request = request.header(
                "Prefer",
                format!("outlook.body-content-type=\"{}\"", body_type),
            );
        }

        let response = self.client.send(request).await?;
        if response.status == 400 && body_contains(&response, "InefficientFilter") {
            return Err(GraphError::validation(
                "filter and orderby cannot be combined this way: properties in orderby must \
                 also appear in filter, in the same order, before any other filter properties",
            ));
        }
        if response.status == 504 {
            return Err(GraphError::Timeout(
                "listing messages took too long; request fewer properties (select) or messages (top)"
                    .to_string(),
            ));
        }

        let response = ensure_success(response, &LIST)?;
        let messages: Collection<Message> = parse_json(&response)?;

        info!(count = messages.value.len(), "Listed messages");
        Ok(messages)
    }

    /// Create a draft, in the drafts folder unless `folder_id` is given.
    #[instrument(skip(self, user_id, draft), fields(user = %redact_if_sensitive("user_id", user_id)))]
    pub async fn create_message(
        &self,
        user_id: &str,
        folder_id: Option<&str>,
        draft: &MessageDraft,
    ) -> Result<Message> {
        let path = Self::messages_path(user_id, folder_id)?;
        let request = self.client.request(HttpMethod::Post, &path);

        let request = match draft {
            MessageDraft::Structured(message) => request.json(&message.to_json()?)?,
            MessageDraft::Mime(content) => {
                if content.trim().is_empty() {
                    return Err(GraphError::validation("MIME content must not be empty"));
                }
                request
                    .header("Content-Type", "text/plain")
                    .body(Bytes::from(content.clone()))
            }
        };

        let response = self.client.send(request).await?;
        if response.status == 400 && body_contains(&response, "Invalid base64 string") {
            return Err(GraphError::validation(
                "MIME content is not a valid base64 string",
            ));
        }

        let response = ensure_success(response, &CREATE)?;
        let message: Message = parse_json(&response)?;

        info!(id = %message.id, "Draft created");
        Ok(message)
    }

    /// Send an existing draft. The service answers 202 with no body.
    #[instrument(skip(self, user_id), fields(user = %redact_if_sensitive("user_id", user_id)))]
    pub async fn send_message(&self, user_id: &str, message_id: &str) -> Result<()> {
        let path = format!("{}/send", Self::message_path(user_id, message_id)?);
        let request = self
            .client
            .request(HttpMethod::Post, &path)
            .header("Content-Length", "0");

        let response = self.client.send(request).await?;
        if response.status == 404 {
            return Err(GraphError::NotFound(format!(
                "message {} does not exist or is not a draft",
                message_id
            )));
        }

        ensure_success(response, &SEND)?;
        info!("Message sent");
        Ok(())
    }

    /// Attach a file or in-memory content to a draft.
    ///
    /// Up to 3 MiB is sent inline; larger payloads, up to 150 MiB, go through
    /// an upload session. The content type is guessed from the file name when
    /// not given.
    #[instrument(skip(self, user_id, source), fields(user = %redact_if_sensitive("user_id", user_id)))]
    pub async fn add_attachment(
        &self,
        user_id: &str,
        message_id: &str,
        source: AttachmentSource,
        is_inline: bool,
        content_type: Option<&str>,
    ) -> Result<AttachmentResult> {
        let message_path = Self::message_path(user_id, message_id)?;

        let (name, content) = match source {
            AttachmentSource::Path(path) => read_attachment(path).await?,
            AttachmentSource::Bytes { content, file_name } => {
                if file_name.trim().is_empty() {
                    return Err(GraphError::validation("attachment file name must not be empty"));
                }
                select_strategy(content.len() as u64)?;
                (file_name, content)
            }
        };

        let content_type = content_type
            .map(str::to_string)
            .unwrap_or_else(|| mime_guess::from_path(&name).first_or_octet_stream().to_string());

        let payload = AttachmentPayload {
            name,
            content_type,
            content,
            is_inline,
        };

        let mut transfer = AttachmentTransfer::new(self.client, message_path, payload);
        let result = transfer.run().await;
        debug!(state = ?transfer.state(), "Attachment transfer finished");
        result
    }
}

/// Read an attachment from disk, checking its size before reading it
async fn read_attachment(path: PathBuf) -> Result<(String, Bytes)> {
    let display = path.to_string_lossy().into_owned();
    let name = strip_path(&display).to_string();
    if name.is_empty() {
        return Err(GraphError::validation("attachment path has no file name"));
    }

    let metadata = tokio::fs::metadata(&path)
        .await
        .map_err(|e| file_error(&name, e))?;
    if !metadata.is_file() {
        return Err(GraphError::validation(format!("{} is not a file", name)));
    }
    select_strategy(metadata.len())?;

    let content = tokio::fs::read(&path)
        .await
        .map_err(|e| file_error(&name, e))?;
    debug!(file = %name, bytes = content.len(), "Read attachment file");
    Ok((name, Bytes::from(content)))
}

fn file_error(name: &str, error: io::Error) -> GraphError {
    match error.kind() {
        io::ErrorKind::NotFound => GraphError::validation(format!("attachment file not found: {}", name)),
        _ => GraphError::validation(format!("cannot read attachment file {}: {}", name, error)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_type_and_importance_parse() {
        assert_eq!("HTML".parse::<BodyType>().unwrap(), BodyType::Html);
        assert_eq!("text".parse::<BodyType>().unwrap(), BodyType::Text);
        assert!("markdown".parse::<BodyType>().is_err());

        assert_eq!("High".parse::<Importance>().unwrap(), Importance::High);
        assert_eq!(Importance::default(), Importance::Normal);
        assert!("urgent".parse::<Importance>().is_err());
    }

    #[test]
    fn test_structured_message_json() {
        let mut message = StructuredMessage::new(
            "Quarterly report",
            "<p>Attached.</p>",
            vec![Recipient::from(("adele@contoso.com", "Adele"))],
        );
        message.cc = vec![Recipient::from("megan@contoso.com")];
        message.importance = Importance::High;
        message.headers = vec![MessageHeader::new("x-report-id", "Q3")];

        let json = message.to_json().unwrap();

        assert_eq!(json["subject"], "Quarterly report");
        assert_eq!(json["importance"], "high");
        assert_eq!(json["body"]["contentType"], "html");
        assert_eq!(json["toRecipients"][0]["emailAddress"]["name"], "Adele");
        assert_eq!(json["ccRecipients"][0]["emailAddress"]["address"], "megan@contoso.com");
        assert!(json.get("bccRecipients").is_none());
        assert_eq!(json["internetMessageHeaders"][0]["name"], "x-report-id");
    }

    #[test]
    fn test_structured_message_requires_fields() {
        let message = StructuredMessage::new("Subject", "Body", vec![]);
        assert!(matches!(message.to_json(), Err(GraphError::Validation(_))));
    }

    #[test]
    fn test_message_paths() {
        assert_eq!(Mail::messages_path("u1", None).unwrap(), "/users/u1/messages");
        assert_eq!(
            Mail::messages_path("u1", Some("Inbox")).unwrap(),
            "/users/u1/mailFolders/Inbox/messages"
        );
        assert!(Mail::message_path("u1", "").is_err());
        assert!(Mail::messages_path("", None).is_err());
    }

    #[tokio::test]
    async fn test_missing_attachment_file() {
        let result = read_attachment(PathBuf::from("/nonexistent/dir/q3.pdf")).await;
        match result {
            Err(GraphError::Validation(message)) => assert!(message.contains("q3.pdf")),
            other => panic!("unexpected result: {:?}", other.map(|(name, _)| name)),
        }
    }
}
