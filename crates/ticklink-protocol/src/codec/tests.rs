//! Tests for primitive encoding and decoding.

use ticklink_core::error::DecodingErrorKind;

use super::{NetworkReader, NetworkWriter};

#[test]
fn test_primitives_read_back_in_order() {
    let mut writer = NetworkWriter::new();
    writer
        .write_u8(0xAB)
        .write_bool(true)
        .write_i16(-2)
        .write_u16(0xBEEF)
        .write_i32(i32::MIN)
        .write_u32(42)
        .write_i64(-1)
        .write_u64(u64::MAX)
        .write_f32(1.5)
        .write_f64(-0.25)
        .write_char('é')
        .write_string("hello");

    let bytes = writer.into_bytes();
    let mut reader = NetworkReader::new(&bytes);
    assert_eq!(reader.read_u8().unwrap(), 0xAB);
    assert!(reader.read_bool().unwrap());
    assert_eq!(reader.read_i16().unwrap(), -2);
    assert_eq!(reader.read_u16().unwrap(), 0xBEEF);
    assert_eq!(reader.read_i32().unwrap(), i32::MIN);
    assert_eq!(reader.read_u32().unwrap(), 42);
    assert_eq!(reader.read_i64().unwrap(), -1);
    assert_eq!(reader.read_u64().unwrap(), u64::MAX);
    assert_eq!(reader.read_f32().unwrap(), 1.5);
    assert_eq!(reader.read_f64().unwrap(), -0.25);
    assert_eq!(reader.read_char().unwrap(), 'é');
    assert_eq!(reader.read_string().unwrap(), "hello");
    assert!(!reader.has_remaining());
}

#[test]
fn test_integers_are_little_endian() {
    let mut writer = NetworkWriter::new();
    writer.write_u32(0x0102_0304);
    assert_eq!(writer.as_bytes(), &[0x04, 0x03, 0x02, 0x01]);
}

#[test]
fn test_long_strings_use_multi_byte_length_prefix() {
    let text = "x".repeat(300);
    let mut writer = NetworkWriter::new();
    writer.write_string(&text);

    // 300 = 0b10_0101100 -> [0xAC, 0x02]
    assert_eq!(&writer.as_bytes()[..2], &[0xAC, 0x02]);
    assert_eq!(writer.len(), 302);

    let bytes = writer.into_bytes();
    assert_eq!(NetworkReader::new(&bytes).read_string().unwrap(), text);
}

#[test]
fn test_append_concatenates_exactly() {
    let mut head = NetworkWriter::new();
    head.write_string("evt");
    let mut tail = NetworkWriter::new();
    tail.write_u16(7).write_bool(false);

    let mut expected = head.to_bytes();
    expected.extend_from_slice(tail.as_bytes());

    head.append(&tail);
    assert_eq!(head.into_bytes(), expected);
}

#[test]
fn test_short_buffer_is_truncated_and_cursor_is_kept() {
    let bytes = [1u8, 2, 3];
    let mut reader = NetworkReader::new(&bytes);
    let err = reader.read_u32().unwrap_err();
    assert_eq!(err.decoding_kind(), Some(DecodingErrorKind::Truncated));
    assert_eq!(reader.position(), 0);
    assert_eq!(reader.read_u16().unwrap(), 0x0201);
}

#[test]
fn test_string_longer_than_buffer_is_truncated() {
    let bytes = [10u8, b'a', b'b'];
    let err = NetworkReader::new(&bytes).read_string().unwrap_err();
    assert_eq!(err.decoding_kind(), Some(DecodingErrorKind::Truncated));
}

#[test]
fn test_overlong_length_prefix_is_rejected() {
    let bytes = [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x01];
    let err = NetworkReader::new(&bytes).read_string().unwrap_err();
    assert_eq!(err.decoding_kind(), Some(DecodingErrorKind::StringPrefix));
}

#[test]
fn test_invalid_utf8_string_is_rejected() {
    let bytes = [2u8, 0xC3, 0x28];
    let err = NetworkReader::new(&bytes).read_string().unwrap_err();
    assert_eq!(err.decoding_kind(), Some(DecodingErrorKind::InvalidUtf8));
}

#[test]
fn test_invalid_char_lead_byte_is_rejected() {
    let bytes = [0x80u8];
    let err = NetworkReader::new(&bytes).read_char().unwrap_err();
    assert_eq!(err.decoding_kind(), Some(DecodingErrorKind::InvalidChar));
}

#[test]
fn test_read_bytes_borrows_from_buffer() {
    let bytes = [9u8, 8, 7, 6];
    let mut reader = NetworkReader::new(&bytes);
    assert_eq!(reader.read_bytes(3).unwrap(), &[9, 8, 7]);
    assert_eq!(reader.remaining(), &[6]);
    assert!(reader.read_bytes(2).is_err());
}
