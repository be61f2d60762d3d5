//! Payload encoding.

use byteorder::{ByteOrder, LittleEndian};

/// Builds a payload by appending primitives in order.
///
/// Writes into a `Vec` cannot fail, so every method returns `&mut Self`
/// for chaining.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkWriter {
    buffer: Vec<u8>,
}

impl NetworkWriter {
    /// Creates an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty writer with room for `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self { buffer: Vec::with_capacity(capacity) }
    }

    /// Wraps already encoded bytes so more fields can be appended.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { buffer: bytes }
    }

    fn put(&mut self, width: usize, encode: impl FnOnce(&mut [u8])) -> &mut Self {
        let start = self.buffer.len();
        self.buffer.resize(start + width, 0);
        encode(&mut self.buffer[start..]);
        self
    }

    /// Writes a single byte.
    pub fn write_u8(&mut self, value: u8) -> &mut Self {
        self.buffer.push(value);
        self
    }

    /// Writes a bool as one byte (1 or 0).
    pub fn write_bool(&mut self, value: bool) -> &mut Self {
        self.write_u8(u8::from(value))
    }

    /// Writes an `i16`.
    pub fn write_i16(&mut self, value: i16) -> &mut Self {
        self.put(2, |b| LittleEndian::write_i16(b, value))
    }

    /// Writes a `u16`.
    pub fn write_u16(&mut self, value: u16) -> &mut Self {
        self.put(2, |b| LittleEndian::write_u16(b, value))
    }

    /// Writes an `i32`.
    pub fn write_i32(&mut self, value: i32) -> &mut Self {
        self.put(4, |b| LittleEndian::write_i32(b, value))
    }

    /// Writes a `u32`.
    pub fn write_u32(&mut self, value: u32) -> &mut Self {
        self.put(4, |b| LittleEndian::write_u32(b, value))
    }

    /// Writes an `i64`.
    pub fn write_i64(&mut self, value: i64) -> &mut Self {
        self.put(8, |b| LittleEndian::write_i64(b, value))
    }

    /// Writes a `u64`.
    pub fn write_u64(&mut self, value: u64) -> &mut Self {
        self.put(8, |b| LittleEndian::write_u64(b, value))
    }

    /// Writes an `f32`.
    pub fn write_f32(&mut self, value: f32) -> &mut Self {
        self.put(4, |b| LittleEndian::write_f32(b, value))
    }

    /// Writes an `f64`.
    pub fn write_f64(&mut self, value: f64) -> &mut Self {
        self.put(8, |b| LittleEndian::write_f64(b, value))
    }

    /// Writes a char as its UTF-8 encoding (1 to 4 bytes).
    pub fn write_char(&mut self, value: char) -> &mut Self {
        let mut utf8 = [0u8; 4];
        let encoded = value.encode_utf8(&mut utf8);
        self.write_bytes(encoded.as_bytes())
    }

    /// Writes a string prefixed with its 7-bit encoded byte length.
    pub fn write_string(&mut self, value: &str) -> &mut Self {
        self.write_length_prefix(value.len() as u32);
        self.write_bytes(value.as_bytes())
    }

    /// Writes raw bytes with no length prefix.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.buffer.extend_from_slice(bytes);
        self
    }

    fn write_length_prefix(&mut self, mut value: u32) {
        while value >= 0x80 {
            self.buffer.push((value as u8) | 0x80);
            value >>= 7;
        }
        self.buffer.push(value as u8);
    }

    /// Appends everything `other` has written, byte for byte.
    pub fn append(&mut self, other: &NetworkWriter) -> &mut Self {
        self.write_bytes(&other.buffer)
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns true if nothing was written.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Borrows the encoded bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Copies the encoded bytes out.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.buffer.clone()
    }

    /// Consumes the writer and returns the encoded bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }
}
