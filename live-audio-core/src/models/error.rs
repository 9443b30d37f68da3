use serde::Serialize;
use thiserror::Error;

/// Errors that can occur during audio capture operations.
///
/// `InvalidFormat` and `ResourceUnavailable` are only produced by `start()`,
/// before any resource is left behind. `Io` terminates an active session.
/// `Emit` is per-chunk and never terminates a session.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "camelCase")]
pub enum CaptureError {
    #[error("invalid format: {0}")]
    InvalidFormat(String),

    #[error("resource unavailable: {0}")]
    ResourceUnavailable(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("i/o error: {0}")]
    Io(String),

    #[error("chunk emission failed: {0}")]
    Emit(String),
}

impl CaptureError {
    /// Whether this error ends the session it occurred in.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_io_errors_are_fatal() {
        assert!(CaptureError::Io("disk full".into()).is_fatal());
        assert!(!CaptureError::Emit("bridge gone".into()).is_fatal());
        assert!(!CaptureError::InvalidState("idle".into()).is_fatal());
    }

    #[test]
    fn display_includes_detail() {
        let err = CaptureError::InvalidFormat("unsupported channel count: 3".into());
        assert_eq!(err.to_string(), "invalid format: unsupported channel count: 3");
    }
}
