//! Error types for session persistence

/// Errors from session store operations.
///
/// Reads never produce these — an unreadable or malformed entry degrades to
/// "no session". Only writes and clears can fail.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("session encode error: {0}")]
    Encode(String),

    #[error("incomplete session record: {0}")]
    Incomplete(String),
}

/// Result alias for session store operations.
pub type Result<T> = std::result::Result<T, Error>;
