//! Session-level error classification.

use rdp_engine::EngineError;
use thiserror::Error;

/// Broad failure classes surfaced to the user interface.
///
/// The UI keys its messaging off the kind; the full engine error text rides
/// along in the session's last-error slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SessionErrorKind {
    #[error("Could not connect to the server")]
    ConnectionFailed,
    #[error("The server rejected the supplied credentials")]
    AuthenticationFailed,
    #[error("The server certificate was not accepted")]
    CertificateRejected,
    #[error("The network connection was lost")]
    NetworkError,
    #[error("The server sent malformed protocol data")]
    ProtocolError,
    #[error("The server ended the session")]
    DisconnectedByServer,
    #[error("The connection attempt was cancelled")]
    Cancelled,
    #[error("An internal error occurred")]
    Internal,
}

impl SessionErrorKind {
    /// Map an engine error onto the class the UI should present.
    pub fn classify(err: &EngineError) -> Self {
        match err {
            EngineError::ConnectionFailed(_) => Self::ConnectionFailed,
            EngineError::AuthenticationFailed(_) => Self::AuthenticationFailed,
            EngineError::CertificateRejected => Self::CertificateRejected,
            EngineError::Network(_) => Self::NetworkError,
            EngineError::Protocol(_) => Self::ProtocolError,
            EngineError::DisconnectedByServer => Self::DisconnectedByServer,
            EngineError::Aborted => Self::Cancelled,
            EngineError::Channel { .. } | EngineError::Internal(_) => Self::Internal,
        }
    }
}

/// Classified error stored by the session and delivered with the
/// connection-error event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {detail}")]
pub struct SessionError {
    pub kind: SessionErrorKind,
    /// Full engine error text, for logs and detail views.
    pub detail: String,
}

impl From<&EngineError> for SessionError {
    fn from(err: &EngineError) -> Self {
        Self {
            kind: SessionErrorKind::classify(err),
            detail: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn classification_covers_the_engine_taxonomy() {
        assert_eq!(
            SessionErrorKind::classify(&EngineError::AuthenticationFailed("bad logon".into())),
            SessionErrorKind::AuthenticationFailed
        );
        assert_eq!(
            SessionErrorKind::classify(&EngineError::Aborted),
            SessionErrorKind::Cancelled
        );
        assert_eq!(
            SessionErrorKind::classify(&EngineError::Channel { code: 0x8000_0001 }),
            SessionErrorKind::Internal
        );
    }

    #[test]
    fn session_error_carries_engine_detail() {
        let err = SessionError::from(&EngineError::Network("reset by peer".into()));
        assert_eq!(err.kind, SessionErrorKind::NetworkError);
        assert!(err.detail.contains("reset by peer"));
    }
}
