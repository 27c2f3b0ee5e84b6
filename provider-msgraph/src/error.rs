//! Error types for the Graph provider

use bridge_traits::error::BridgeError;
use core_auth::AuthError;
use thiserror::Error;

/// Hint attached to credential failures that happen before any Graph call
const CREDENTIAL_HINT: &str =
    "Check CLIENT_ID, CLIENT_SECRET and TENANT_ID, and that admin consent was granted";

/// Everything a caller of the Graph surface can observe as a failure.
///
/// Categories are distinct so callers can branch on them. None of them is
/// retried by the library.
#[derive(Error, Debug)]
pub enum GraphError {
    /// Caller misused the API; detected before any request was sent,
    /// or reported by the service as a malformed parameter
    #[error("Validation error: {0}")]
    Validation(String),

    /// Token missing, rejected or expired (401, or a bad token response)
    #[error("Authentication failed: {message}. {hint}")]
    Auth { message: String, hint: String },

    /// Token valid but lacking the permission the operation needs
    #[error("Permission denied: {message}. {hint}")]
    Permission { message: String, hint: String },

    #[error("Not found: {0}")]
    NotFound(String),

    /// ETag precondition did not hold (412)
    #[error("Precondition failed: {0}")]
    Conflict(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// Gateway timeout (504)
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Upload session could not be negotiated or a chunk was rejected
    #[error("Upload failed: {message}")]
    Upload {
        message: String,
        #[source]
        source: Option<Box<GraphError>>,
    },

    /// Any other non-2xx status, including throttling
    #[error("Graph API error (status {status}): {body}")]
    Http {
        status: u16,
        code: Option<String>,
        body: String,
    },

    /// Success response whose body could not be decoded
    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error(transparent)]
    Transport(#[from] BridgeError),
}

pub type Result<T> = std::result::Result<T, GraphError>;

impl GraphError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        GraphError::Validation(message.into())
    }

    pub(crate) fn upload(message: impl Into<String>, source: Option<GraphError>) -> Self {
        GraphError::Upload {
            message: message.into(),
            source: source.map(Box::new),
        }
    }

    /// HTTP status behind this error, when it came from a response
    pub fn status(&self) -> Option<u16> {
        match self {
            GraphError::Http { status, .. } => Some(*status),
            GraphError::NotFound(_) => Some(404),
            GraphError::Conflict(_) => Some(412),
            GraphError::PayloadTooLarge(_) => Some(413),
            GraphError::Timeout(_) => Some(504),
            _ => None,
        }
    }
}

impl From<AuthError> for GraphError {
    fn from(error: AuthError) -> Self {
        GraphError::Auth {
            message: error.to_string(),
            hint: CREDENTIAL_HINT.to_string(),
        }
    }
}
