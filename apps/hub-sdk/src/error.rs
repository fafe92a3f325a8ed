use thiserror::Error;

/// Errors surfaced to SDK consumers.
#[derive(Debug, Error)]
pub enum SdkError {
    /// The connection task has shut down and no longer accepts commands.
    #[error("gateway connection is closed")]
    ConnectionClosed,

    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("session store error: {0}")]
    SessionStore(#[from] std::io::Error),

    #[error("invalid session file: {0}")]
    SessionFormat(#[from] serde_json::Error),
}
