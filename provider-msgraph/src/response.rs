//! Response and error translation
//!
//! Maps an [`HttpResponse`] onto a parsed payload, a [`Conditional`] outcome,
//! or a categorized [`GraphError`]. The status code decides the category
//! first; a 400 is then refined by looking for an "insufficient privileges"
//! marker in the body text. That check matches on server-provided wording and
//! is kept as a heuristic.

use bridge_traits::http::HttpResponse;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{GraphError, Result};

/// Body marker that turns a 400 into a permission failure
const INSUFFICIENT_PRIVILEGES: &str = "insufficient privileges";

/// Outcome of a conditional request.
///
/// `NotModified` and `PreconditionFailed` are valid results, not errors.
#[derive(Debug, Clone, PartialEq)]
pub enum Conditional<T> {
    /// The request was applied or the resource changed; here is the payload
    Modified(T),
    /// `if-none-match` matched the current ETag (304)
    NotModified,
    /// `if-match` did not match the current ETag (412); nothing was applied
    PreconditionFailed,
}

impl<T> Conditional<T> {
    pub fn is_modified(&self) -> bool {
        matches!(self, Conditional::Modified(_))
    }

    /// Payload if the resource was returned
    pub fn into_option(self) -> Option<T> {
        match self {
            Conditional::Modified(value) => Some(value),
            _ => None,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Conditional<U> {
        match self {
            Conditional::Modified(value) => Conditional::Modified(f(value)),
            Conditional::NotModified => Conditional::NotModified,
            Conditional::PreconditionFailed => Conditional::PreconditionFailed,
        }
    }
}

/// What the caller was doing and which permission it needs.
///
/// Used to build remediation hints for auth and permission failures.
#[derive(Debug, Clone, Copy)]
pub struct ErrorContext {
    pub action: &'static str,
    pub permissions: &'static str,
}

impl ErrorContext {
    pub const fn new(action: &'static str, permissions: &'static str) -> Self {
        Self {
            action,
            permissions,
        }
    }
}

/// Error object returned by the service:
/// `{"error": {"code", "message", "innerError": {"request-id"}}}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceError {
    pub code: Option<String>,
    pub message: Option<String>,
    pub request_id: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorObject,
}

#[derive(Deserialize)]
struct ErrorObject {
    code: Option<String>,
    message: Option<String>,
    #[serde(rename = "innerError")]
    inner_error: Option<InnerError>,
}

#[derive(Deserialize)]
struct InnerError {
    #[serde(rename = "request-id")]
    request_id: Option<String>,
}

impl ServiceError {
    /// Parse a service error body; `None` if the body is not one
    pub fn parse(body: &[u8]) -> Option<Self> {
        let envelope: ErrorEnvelope = serde_json::from_slice(body).ok()?;
        Some(Self {
            code: envelope.error.code,
            message: envelope.error.message,
            request_id: envelope.error.inner_error.and_then(|inner| inner.request_id),
        })
    }

    fn describe(&self, status: u16) -> String {
        let mut text = self
            .message
            .clone()
            .unwrap_or_else(|| format!("HTTP {}", status));
        if let Some(code) = &self.code {
            text.push_str(&format!(" (code: {}", code));
            if let Some(request_id) = &self.request_id {
                text.push_str(&format!(", request-id: {}", request_id));
            }
            text.push(')');
        }
        text
    }
}

/// Case-insensitive search of the response body
pub fn body_contains(response: &HttpResponse, needle: &str) -> bool {
    response
        .text_lossy()
        .to_lowercase()
        .contains(&needle.to_lowercase())
}

/// Translate a non-2xx response into a categorized error.
pub fn translate_error(response: &HttpResponse, ctx: &ErrorContext) -> GraphError {
    let status = response.status;
    let body = response.text_lossy();
    let service_error = ServiceError::parse(&response.body);

    let message = match &service_error {
        Some(err) => err.describe(status),
        None if body.trim().is_empty() => format!("HTTP {}", status),
        None => body.clone(),
    };

    match status {
        401 => GraphError::Auth {
            message: format!("token rejected while trying to {}: {}", ctx.action, message),
            hint: format!(
                "Make sure the token is valid and the application has {}",
                ctx.permissions
            ),
        },
        403 => GraphError::Permission {
            message: format!("not allowed to {}: {}", ctx.action, message),
            hint: format!("Requires {}", ctx.permissions),
        },
        400 if body.to_lowercase().contains(INSUFFICIENT_PRIVILEGES) => GraphError::Permission {
            message: format!("insufficient privileges to {}: {}", ctx.action, message),
            hint: format!("Requires {}", ctx.permissions),
        },
        404 => GraphError::NotFound(message),
        412 => GraphError::Conflict(message),
        413 => GraphError::PayloadTooLarge(message),
        504 => GraphError::Timeout(message),
        _ => GraphError::Http {
            status,
            code: service_error.and_then(|err| err.code),
            body,
        },
    }
}

/// Pass 2xx responses through; translate anything else.
pub fn ensure_success(response: HttpResponse, ctx: &ErrorContext) -> Result<HttpResponse> {
    if response.is_success() {
        debug!(status = response.status, action = ctx.action, "Request succeeded");
        return Ok(response);
    }

    let error = translate_error(&response, ctx);
    warn!(status = response.status, action = ctx.action, error = %error, "Request failed");
    Err(error)
}

/// Decode a JSON success body
pub fn parse_json<T: DeserializeOwned>(response: &HttpResponse) -> Result<T> {
    serde_json::from_slice(&response.body).map_err(|e| GraphError::Parse(e.to_string()))
}

/// Resolve a conditional request: 304 and 412 short-circuit, other
/// statuses are checked and decoded with `decode`.
pub fn conditional<T, F>(response: HttpResponse, ctx: &ErrorContext, decode: F) -> Result<Conditional<T>>
where
    F: FnOnce(HttpResponse) -> Result<T>,
{
    match response.status {
        304 => {
            debug!(action = ctx.action, "Resource not modified");
            Ok(Conditional::NotModified)
        }
        412 => {
            debug!(action = ctx.action, "Precondition failed, change not applied");
            Ok(Conditional::PreconditionFailed)
        }
        _ => {
            let response = ensure_success(response, ctx)?;
            decode(response).map(Conditional::Modified)
        }
    }
}
