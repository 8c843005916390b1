/// Boxed error carried by transport-level failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum LicenseError {
    /// The attempt failed before any response status was received
    /// (connection refused, timeout, body read failure).
    #[error("transport error: {0}")]
    Transport(BoxError),
    /// The server answered with a non-success HTTP status code.
    #[error("http error {status}")]
    Http { status: u16 },
    /// The inline `data:` address could not be decoded.
    #[error("malformed data address: {0}")]
    Parse(String),
    /// Retry parameters were rejected before any attempt was made.
    #[error("invalid request parameters: {0}")]
    InvalidParameters(String),
    /// `send()` was called a second time on the same request.
    #[error("license request has already been sent")]
    AlreadySent,
    /// Error reported by a video source implementation.
    #[error("video source error: {0}")]
    Source(String),
}

impl LicenseError {
    /// Wraps any error as a transport failure.
    pub fn transport(err: impl Into<BoxError>) -> Self {
        Self::Transport(err.into())
    }

    /// Status code of the final attempt, or `None` when no response was
    /// ever received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status } => Some(*status),
            _ => None,
        }
    }

    /// Whether another attempt may change the outcome.
    ///
    /// Every non-success HTTP status is retried, client errors included.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Http { .. })
    }
}

#[cfg(test)]
mod tests {
    use crate::LicenseError;

    #[test]
    fn status_is_only_reported_for_http_errors() {
        assert_eq!(LicenseError::Http { status: 500 }.status(), Some(500));
        assert_eq!(LicenseError::transport("connection reset").status(), None);
        assert_eq!(LicenseError::Parse("no payload".to_owned()).status(), None);
    }

    #[test]
    fn client_and_server_errors_are_both_retryable() {
        assert!(LicenseError::Http { status: 403 }.is_retryable());
        assert!(LicenseError::Http { status: 503 }.is_retryable());
        assert!(LicenseError::transport("refused").is_retryable());
    }

    #[test]
    fn local_failures_are_terminal() {
        assert!(!LicenseError::Parse("x".to_owned()).is_retryable());
        assert!(!LicenseError::InvalidParameters("x".to_owned()).is_retryable());
        assert!(!LicenseError::AlreadySent.is_retryable());
        assert!(!LicenseError::Source("x".to_owned()).is_retryable());
    }

    #[test]
    fn display_includes_status() {
        let err = LicenseError::Http { status: 502 };
        assert_eq!(err.to_string(), "http error 502");
    }
}
