//! Error type for the protocol-engine boundary.

use thiserror::Error;

/// Errors surfaced by a protocol engine implementation.
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    /// Transport-level connection establishment failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The server rejected the supplied credentials.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The TLS certificate was rejected by the verification policy.
    #[error("Certificate rejected")]
    CertificateRejected,

    /// Network error after the session was established.
    #[error("Network error: {0}")]
    Network(String),

    /// Malformed or unexpected protocol traffic.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// A virtual-channel operation failed with an engine result code.
    #[error("Channel error: 0x{code:08X}")]
    Channel { code: u32 },

    /// The server closed the session.
    #[error("Disconnected by server")]
    DisconnectedByServer,

    /// An in-progress connect was aborted locally.
    #[error("Connect aborted")]
    Aborted,

    /// Engine-internal failure.
    #[error("Internal engine error: {0}")]
    Internal(String),
}

/// Convenience alias used throughout the engine boundary.
pub type EngineResult<T> = Result<T, EngineError>;
