//! Error types surfaced to feature-service callers
//!
//! Completed HTTP responses are not errors regardless of status — they pass
//! through as [`crate::ApiResponse`] values. These variants cover transport
//! failures, auth endpoint rejections, and the terminal session failure.
//!
//! `Clone` is required because a failed refresh rejects every parked
//! request with the same error.

/// Errors from client operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// Transport failure with no response. Never triggers a refresh.
    #[error("network error: {0}")]
    Network(String),

    /// An auth endpoint rejected the call (failed login, or a refresh
    /// failure on a dev-mock session where teardown is suppressed).
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Terminal refresh failure: the session has been cleared and the
    /// user sent to the application root.
    #[error("session expired: {0}")]
    SessionExpired(String),

    /// An endpoint returned a payload that could not be decoded.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("session store error: {0}")]
    Store(String),
}

impl From<curator_session::Error> for Error {
    fn from(e: curator_session::Error) -> Self {
        Error::Store(e.to_string())
    }
}

/// Result alias for client operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_context() {
        let err = Error::Network("connection refused".into());
        assert_eq!(err.to_string(), "network error: connection refused");

        let err = Error::SessionExpired("refresh credential rejected".into());
        assert!(err.to_string().contains("refresh credential rejected"));
    }

    #[test]
    fn store_errors_convert() {
        let err: Error = curator_session::Error::Io("disk full".into()).into();
        assert!(matches!(err, Error::Store(_)));
        assert!(err.to_string().contains("disk full"));
    }
}
