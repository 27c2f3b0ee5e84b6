use thiserror::Error;

/// Failures while setting up a client.
///
/// Operation failures are reported as [`GraphError`] directly.
///
/// [`GraphError`]: provider_msgraph::GraphError
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] core_runtime::Error),

    #[error(transparent)]
    Graph(#[from] provider_msgraph::GraphError),

    #[error("Failed to start blocking runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
