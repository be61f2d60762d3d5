//! Frame layout: `[length-prefixed event name][payload bytes]`.

use std::sync::Arc;

use ticklink_core::error::{DecodingErrorKind, Result};

use crate::codec::{NetworkReader, NetworkWriter};

/// Encodes an event name followed by an optional payload.
pub fn encode_frame(name: &str, payload: Option<&NetworkWriter>) -> Vec<u8> {
    let payload_len = payload.map_or(0, NetworkWriter::len);
    let mut frame = NetworkWriter::with_capacity(name.len() + payload_len + 1);
    frame.write_string(name);
    if let Some(payload) = payload {
        frame.append(payload);
    }
    frame.into_bytes()
}

/// Decodes the event name and returns a reader positioned on the payload.
pub fn decode_frame(bytes: &[u8]) -> Result<(String, NetworkReader<'_>)> {
    if bytes.is_empty() {
        return Err(DecodingErrorKind::Truncated.into());
    }
    let mut reader = NetworkReader::new(bytes);
    let name = reader.read_string()?;
    Ok((name, reader))
}

/// A decoded datagram that owns its bytes.
///
/// Cloning is cheap and every call to [`Frame::reader`] starts a fresh
/// cursor at the first payload byte, so several subscribers can decode the
/// same payload independently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    bytes: Arc<[u8]>,
    name: String,
    body_offset: usize,
}

impl Frame {
    /// Parses the event name out of a received datagram.
    pub fn parse(bytes: impl Into<Arc<[u8]>>) -> Result<Self> {
        let bytes = bytes.into();
        let (name, reader) = decode_frame(&bytes)?;
        let body_offset = reader.position();
        Ok(Self { bytes, name, body_offset })
    }

    /// The event name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Payload bytes following the name.
    pub fn payload(&self) -> &[u8] {
        &self.bytes[self.body_offset..]
    }

    /// A reader over the payload.
    pub fn reader(&self) -> NetworkReader<'_> {
        NetworkReader::new(self.payload())
    }

    /// The complete datagram.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}
