use std::io;

use thiserror::Error;

/// Convenience alias used across the workspace.
pub type Result<T> = std::result::Result<T, ErrorKind>;

/// Reasons a frame could not be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodingErrorKind {
    /// The buffer ended before the requested field.
    #[error("buffer ended before the expected field")]
    Truncated,
    /// A string length prefix was longer than five bytes or overflowed.
    #[error("invalid string length prefix")]
    StringPrefix,
    /// String bytes were not valid UTF-8.
    #[error("string is not valid UTF-8")]
    InvalidUtf8,
    /// Char bytes did not encode a single Unicode scalar value.
    #[error("invalid char encoding")]
    InvalidChar,
}

/// Enum with all possible errors that can occur.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// A datagram was too short or otherwise undecodable.
    #[error("malformed frame: {0}")]
    MalformedFrame(#[from] DecodingErrorKind),
    /// Socket-level failure.
    #[error("transport error: {0}")]
    Transport(#[from] io::Error),
    /// Application code tried to send a protocol control name.
    #[error("event name `{0}` is reserved for protocol control frames")]
    ReservedEventName(String),
    /// The operation needs a live session.
    #[error("session is not connected")]
    NotConnected,
    /// The server has not been started or was already shut down.
    #[error("server is not running")]
    NotRunning,
    /// `connect` / `start` was called on a session whose loops are still running.
    #[error("session is already running")]
    AlreadyRunning,
    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}

impl ErrorKind {
    /// Returns the decoding failure if this error is a malformed frame.
    pub fn decoding_kind(&self) -> Option<DecodingErrorKind> {
        match self {
            ErrorKind::MalformedFrame(kind) => Some(*kind),
            _ => None,
        }
    }
}
