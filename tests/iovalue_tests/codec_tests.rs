//! Tests for the tagged-value codec
//!
//! These tests verify:
//! - Encode/decode round-trips for every value shape
//! - The exact-size contract behind offset precomputation
//! - Stream semantics: decode reads exactly one value
//! - Corruption detection (truncation, unknown tags, bad UTF-8)

use std::io::Cursor;

use genbase::iovalue::{self, Value, TAG_ARRAY, TAG_INT, TAG_STR};
use genbase::BaseError;

// =============================================================================
// Helper Functions
// =============================================================================

fn roundtrip(v: &Value) -> Value {
    let bytes = iovalue::encode(v);
    let mut cursor = Cursor::new(bytes);
    iovalue::decode_from(&mut cursor).unwrap()
}

fn sample_values() -> Vec<Value> {
    vec![
        Value::Int(0),
        Value::Int(-1),
        Value::Int(i32::MAX),
        Value::Int(i32::MIN),
        Value::Str(String::new()),
        Value::Str("Jean-Baptiste".to_string()),
        Value::Str("Éloïse".to_string()),
        Value::Array(vec![]),
        Value::Array(vec![Value::Int(1), Value::Int(2), Value::Int(3)]),
        Value::unit(0),
        Value::tagged(5, vec![Value::Int(7), Value::Str("x".to_string())]),
        Value::tagged(
            1,
            vec![Value::Array(vec![Value::tagged(0, vec![Value::Int(9)])])],
        ),
    ]
}

// =============================================================================
// Round-trip Tests
// =============================================================================

#[test]
fn test_roundtrip_all_shapes() {
    for v in sample_values() {
        assert_eq!(roundtrip(&v), v, "round-trip changed {:?}", v);
    }
}

#[test]
fn test_negative_int_roundtrip() {
    // The dummy sentinel travels as a plain i32.
    assert_eq!(roundtrip(&Value::Int(-1)), Value::Int(-1));
}

#[test]
fn test_unicode_string_length_is_bytes() {
    let v = Value::Str("Éloïse".to_string());
    let bytes = iovalue::encode(&v);
    assert_eq!(bytes[0], TAG_STR);
    // 8 UTF-8 bytes, not 6 chars.
    assert_eq!(u32::from_be_bytes(bytes[1..5].try_into().unwrap()), 8);
}

// =============================================================================
// Size Contract Tests
// =============================================================================

#[test]
fn test_size_matches_encoded_length() {
    for v in sample_values() {
        assert_eq!(
            iovalue::size(&v),
            iovalue::encode(&v).len() as u64,
            "size contract broken for {:?}",
            v
        );
    }
}

#[test]
fn test_known_sizes() {
    assert_eq!(iovalue::size(&Value::Int(42)), 5);
    assert_eq!(iovalue::size(&Value::Str("abc".to_string())), 8);
    assert_eq!(iovalue::size(&Value::Array(vec![Value::Int(0)])), 10);
    assert_eq!(iovalue::size(&Value::unit(3)), 2);
    assert_eq!(iovalue::array_header_size(0), 5);
    assert_eq!(iovalue::array_header_size(1000), 5);
}

#[test]
fn test_array_elements_start_after_header() {
    let v = Value::Array(vec![Value::Int(7), Value::Str("hi".to_string())]);
    let bytes = iovalue::encode(&v);
    assert_eq!(bytes[0], TAG_ARRAY);
    let header = iovalue::array_header_size(2) as usize;
    // First element decodes at the header boundary.
    let mut cursor = Cursor::new(&bytes[header..]);
    assert_eq!(iovalue::decode_from(&mut cursor).unwrap(), Value::Int(7));
    assert_eq!(
        iovalue::decode_from(&mut cursor).unwrap(),
        Value::Str("hi".to_string())
    );
}

// =============================================================================
// Stream Semantics Tests
// =============================================================================

#[test]
fn test_decode_consumes_exactly_one_value() {
    let mut bytes = iovalue::encode(&Value::Str("first".to_string()));
    bytes.extend(iovalue::encode(&Value::Int(2)));
    let mut cursor = Cursor::new(bytes);
    assert_eq!(
        iovalue::decode_from(&mut cursor).unwrap(),
        Value::Str("first".to_string())
    );
    assert_eq!(iovalue::decode_from(&mut cursor).unwrap(), Value::Int(2));
}

// =============================================================================
// Corruption Tests
// =============================================================================

#[test]
fn test_truncated_int_is_corrupt() {
    let mut cursor = Cursor::new(vec![TAG_INT, 0, 0]);
    let err = iovalue::decode_from(&mut cursor).unwrap_err();
    assert!(matches!(err, BaseError::Corrupt(_)), "got {:?}", err);
}

#[test]
fn test_truncated_string_is_corrupt() {
    // Declares 10 bytes, supplies 2.
    let mut cursor = Cursor::new(vec![TAG_STR, 0, 0, 0, 10, b'a', b'b']);
    let err = iovalue::decode_from(&mut cursor).unwrap_err();
    assert!(matches!(err, BaseError::Corrupt(_)), "got {:?}", err);
}

#[test]
fn test_unknown_tag_is_corrupt() {
    let mut cursor = Cursor::new(vec![0x03]);
    let err = iovalue::decode_from(&mut cursor).unwrap_err();
    assert!(matches!(err, BaseError::Corrupt(_)), "got {:?}", err);
}

#[test]
fn test_invalid_utf8_is_corrupt() {
    let mut cursor = Cursor::new(vec![TAG_STR, 0, 0, 0, 2, 0xff, 0xfe]);
    let err = iovalue::decode_from(&mut cursor).unwrap_err();
    assert!(matches!(err, BaseError::Corrupt(_)), "got {:?}", err);
}

#[test]
fn test_empty_input_is_corrupt() {
    let mut cursor = Cursor::new(Vec::<u8>::new());
    let err = iovalue::decode_from(&mut cursor).unwrap_err();
    assert!(matches!(err, BaseError::Corrupt(_)), "got {:?}", err);
}
