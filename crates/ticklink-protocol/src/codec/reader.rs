//! Payload decoding.

use std::io::{self, Cursor, Read};

use byteorder::{LittleEndian, ReadBytesExt};
use ticklink_core::{
    constants::MAX_LENGTH_PREFIX_BYTES,
    error::{DecodingErrorKind, ErrorKind, Result},
};

/// Reads primitives sequentially from a borrowed buffer.
///
/// Every read advances the cursor. A fixed-width read past the end fails
/// with [`DecodingErrorKind::Truncated`] and leaves the cursor untouched.
#[derive(Debug, Clone)]
pub struct NetworkReader<'a> {
    cursor: Cursor<&'a [u8]>,
}

fn truncated(_: io::Error) -> DecodingErrorKind {
    DecodingErrorKind::Truncated
}

impl<'a> NetworkReader<'a> {
    /// Creates a reader positioned at the start of `bytes`.
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { cursor: Cursor::new(bytes) }
    }

    /// Reads a single byte.
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.cursor.read_u8().map_err(truncated)?)
    }

    /// Reads a bool; any non-zero byte is `true`.
    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    /// Reads an `i16`.
    pub fn read_i16(&mut self) -> Result<i16> {
        self.fixed(|c| c.read_i16::<LittleEndian>())
    }

    /// Reads a `u16`.
    pub fn read_u16(&mut self) -> Result<u16> {
        self.fixed(|c| c.read_u16::<LittleEndian>())
    }

    /// Reads an `i32`.
    pub fn read_i32(&mut self) -> Result<i32> {
        self.fixed(|c| c.read_i32::<LittleEndian>())
    }

    /// Reads a `u32`.
    pub fn read_u32(&mut self) -> Result<u32> {
        self.fixed(|c| c.read_u32::<LittleEndian>())
    }

    /// Reads an `i64`.
    pub fn read_i64(&mut self) -> Result<i64> {
        self.fixed(|c| c.read_i64::<LittleEndian>())
    }

    /// Reads a `u64`.
    pub fn read_u64(&mut self) -> Result<u64> {
        self.fixed(|c| c.read_u64::<LittleEndian>())
    }

    /// Reads an `f32`.
    pub fn read_f32(&mut self) -> Result<f32> {
        self.fixed(|c| c.read_f32::<LittleEndian>())
    }

    /// Reads an `f64`.
    pub fn read_f64(&mut self) -> Result<f64> {
        self.fixed(|c| c.read_f64::<LittleEndian>())
    }

    /// Reads a UTF-8 encoded char.
    pub fn read_char(&mut self) -> Result<char> {
        let lead = self.read_u8()?;
        let width = match lead {
            0x00..=0x7F => 1,
            0xC0..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF7 => 4,
            _ => return Err(DecodingErrorKind::InvalidChar.into()),
        };
        let mut utf8 = [lead, 0, 0, 0];
        self.cursor.read_exact(&mut utf8[1..width]).map_err(truncated)?;
        let text = std::str::from_utf8(&utf8[..width]).map_err(|_| DecodingErrorKind::InvalidChar)?;
        text.chars().next().ok_or_else(|| DecodingErrorKind::InvalidChar.into())
    }

    /// Reads a string prefixed with its 7-bit encoded byte length.
    pub fn read_string(&mut self) -> Result<String> {
        let len = self.read_length_prefix()? as usize;
        let bytes = self.read_bytes(len)?;
        let text = std::str::from_utf8(bytes).map_err(|_| DecodingErrorKind::InvalidUtf8)?;
        Ok(text.to_owned())
    }

    /// Reads `len` raw bytes, borrowing them from the underlying buffer.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        let data: &'a [u8] = *self.cursor.get_ref();
        let start = self.position();
        let end = start.checked_add(len).ok_or(DecodingErrorKind::Truncated)?;
        if end > data.len() {
            return Err(DecodingErrorKind::Truncated.into());
        }
        self.cursor.set_position(end as u64);
        Ok(&data[start..end])
    }

    fn read_length_prefix(&mut self) -> Result<u32> {
        let mut value: u32 = 0;
        for index in 0..MAX_LENGTH_PREFIX_BYTES {
            let byte = self.read_u8()?;
            // the fifth group only has room for the top four bits of a u32
            if index == MAX_LENGTH_PREFIX_BYTES - 1 && byte > 0x0F {
                return Err(DecodingErrorKind::StringPrefix.into());
            }
            value |= u32::from(byte & 0x7F) << (7 * index);
            if byte & 0x80 == 0 {
                if value > i32::MAX as u32 {
                    return Err(DecodingErrorKind::StringPrefix.into());
                }
                return Ok(value);
            }
        }
        Err(DecodingErrorKind::StringPrefix.into())
    }

    fn fixed<T>(&mut self, read: impl FnOnce(&mut Cursor<&'a [u8]>) -> io::Result<T>) -> Result<T> {
        let start = self.cursor.position();
        read(&mut self.cursor).map_err(|err| {
            self.cursor.set_position(start);
            ErrorKind::from(truncated(err))
        })
    }

    /// Bytes that have not been read yet.
    pub fn remaining(&self) -> &'a [u8] {
        let data: &'a [u8] = *self.cursor.get_ref();
        &data[self.position().min(data.len())..]
    }

    /// Returns true if unread bytes remain.
    pub fn has_remaining(&self) -> bool {
        !self.remaining().is_empty()
    }

    /// Current cursor offset.
    pub fn position(&self) -> usize {
        self.cursor.position() as usize
    }

    /// Total length of the underlying buffer.
    pub fn len(&self) -> usize {
        self.cursor.get_ref().len()
    }

    /// Returns true if the underlying buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.cursor.get_ref().is_empty()
    }
}
