use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Token endpoint response did not contain an access_token")]
    MissingAccessToken,

    #[error("Token endpoint returned {status}: {body}")]
    TokenRequestFailed { status: u16, body: String },

    #[error("Network error during token exchange: {0}")]
    NetworkError(String),

    #[error("Invalid credentials configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to parse token response: {0}")]
    ParseError(String),
}

pub type Result<T> = std::result::Result<T, AuthError>;
