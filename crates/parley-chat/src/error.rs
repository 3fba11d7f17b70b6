use thiserror::Error;

/// Failures of messaging operations. Every variant but `Store` is a caller
/// error and carries a message fit for the client.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    /// Missing, bad or expired credentials.
    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

pub type ChatResult<T> = Result<T, ChatError>;
