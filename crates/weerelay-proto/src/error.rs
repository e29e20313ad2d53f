//! Shared error type across weerelay crates.

use thiserror::Error;

/// Stable diagnostic codes (surface exposed to logs/metrics).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed frame header (length/flag).
    Frame,
    /// Compressed frame body failed to expand.
    Decompress,
    /// Malformed object inside an otherwise well-framed message.
    Decode,
    /// Recognized message shape but unmapped event id.
    UnknownEvent,
    /// Mutation targets a buffer pointer not present in the session.
    OrphanBuffer,
    /// Invalid configuration.
    Config,
    /// Relay rejected the credential.
    Auth,
    /// Socket-level failure; the only fatal kind.
    Transport,
}

impl ErrorKind {
    /// String representation used in logs and metric labels.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Frame => "FRAME",
            ErrorKind::Decompress => "DECOMPRESS",
            ErrorKind::Decode => "DECODE",
            ErrorKind::UnknownEvent => "UNKNOWN_EVENT",
            ErrorKind::OrphanBuffer => "ORPHAN_BUFFER",
            ErrorKind::Config => "CONFIG",
            ErrorKind::Auth => "AUTH",
            ErrorKind::Transport => "TRANSPORT",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, RelayError>;

/// Unified error type used by the wire layer and the client runtime.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("frame error: {0}")]
    Frame(String),
    #[error("decompression failed: {0}")]
    Decompress(String),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("unknown event id: {0}")]
    UnknownEvent(String),
    #[error("no buffer with pointer {0}")]
    OrphanBuffer(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("authentication failed")]
    Auth,
    #[error("transport: {0}")]
    Transport(String),
}

impl RelayError {
    /// Map an error to its stable diagnostic code.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RelayError::Frame(_) => ErrorKind::Frame,
            RelayError::Decompress(_) => ErrorKind::Decompress,
            RelayError::Decode(_) => ErrorKind::Decode,
            RelayError::UnknownEvent(_) => ErrorKind::UnknownEvent,
            RelayError::OrphanBuffer(_) => ErrorKind::OrphanBuffer,
            RelayError::Config(_) => ErrorKind::Config,
            RelayError::Auth => ErrorKind::Auth,
            RelayError::Transport(_) => ErrorKind::Transport,
        }
    }
}
