use thiserror::Error;

/// Failures raised while assembling a client, before any request is sent.
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or malformed setting, or a subscriber that could not be installed
    #[error("Configuration error: {0}")]
    Config(String),

    /// No implementation available for a required host capability
    #[error("{capability} unavailable: {message}")]
    CapabilityMissing { capability: String, message: String },
}

pub type Result<T> = std::result::Result<T, Error>;
