//! Encoding and decoding of tagged values
//!
//! ## Wire Format
//!
//! All integers are big-endian, fixed 4 bytes.
//!
//! ```text
//! Int      ┌──────┬───────────────┐
//!          │ 0x00 │ i32 BE        │
//!          └──────┴───────────────┘
//! Str      ┌──────┬───────────────┬───────────────┐
//!          │ 0x01 │ byte len (4)  │ UTF-8 bytes   │
//!          └──────┴───────────────┴───────────────┘
//! Array    ┌──────┬───────────────┬───────────────┐
//!          │ 0x02 │ count (4)     │ elements      │
//!          └──────┴───────────────┴───────────────┘
//! Tagged   ┌───────────┬────────────┬─────────────┐
//!          │ 0x80|tag  │ nfields(1) │ fields      │
//!          └───────────┴────────────┴─────────────┘
//! ```
//!
//! `decode_from` reads exactly one value and leaves the stream cursor at its
//! end, so callers may seek to any previously recorded offset and decode.

use std::io::{Read, Write};

use bytes::BufMut;

use crate::error::{BaseError, Result};
use super::Value;

/// Tag byte for `Value::Int`
pub const TAG_INT: u8 = 0x00;
/// Tag byte for `Value::Str`
pub const TAG_STR: u8 = 0x01;
/// Tag byte for `Value::Array`
pub const TAG_ARRAY: u8 = 0x02;
/// Tagged variants occupy `0x80..=0xFF`; the low 7 bits carry the discriminant
pub const TAG_VARIANT_BASE: u8 = 0x80;

/// Exact encoded size of a value, in bytes
///
/// Offset arithmetic in the writer depends on this being exact: the base
/// accessor file records absolute element offsets computed from `size`
/// before anything is written.
pub fn size(v: &Value) -> u64 {
    match v {
        Value::Int(_) => 5,
        Value::Str(s) => 5 + s.len() as u64,
        Value::Array(items) => {
            array_header_size(items.len()) + items.iter().map(size).sum::<u64>()
        }
        Value::Tagged { fields, .. } => 2 + fields.iter().map(size).sum::<u64>(),
    }
}

/// Size of an array's tag + count prefix
///
/// Constant in this format; kept as a function because offset computations
/// name it explicitly (first element lives at `array_start + header`).
pub fn array_header_size(_count: usize) -> u64 {
    5
}

/// Encode a value to a fresh byte vector
pub fn encode(v: &Value) -> Vec<u8> {
    let mut buf = Vec::with_capacity(size(v) as usize);
    put_value(&mut buf, v);
    buf
}

/// Encode a value to a writer
pub fn encode_to<W: Write>(writer: &mut W, v: &Value) -> Result<()> {
    let buf = encode(v);
    writer.write_all(&buf)?;
    Ok(())
}

fn put_value(buf: &mut Vec<u8>, v: &Value) {
    match v {
        Value::Int(n) => {
            buf.put_u8(TAG_INT);
            buf.put_i32(*n);
        }
        Value::Str(s) => {
            buf.put_u8(TAG_STR);
            buf.put_u32(s.len() as u32);
            buf.put_slice(s.as_bytes());
        }
        Value::Array(items) => {
            buf.put_u8(TAG_ARRAY);
            buf.put_u32(items.len() as u32);
            for item in items {
                put_value(buf, item);
            }
        }
        Value::Tagged { tag, fields } => {
            debug_assert!(*tag < TAG_VARIANT_BASE, "variant tag must fit 7 bits");
            buf.put_u8(TAG_VARIANT_BASE | tag);
            buf.put_u8(fields.len() as u8);
            for field in fields {
                put_value(buf, field);
            }
        }
    }
}

/// Decode exactly one value from a stream
///
/// The cursor is left at the end of the decoded value. Truncated input,
/// unknown tag bytes and invalid UTF-8 are corruption, not recoverable
/// conditions.
pub fn decode_from<R: Read>(reader: &mut R) -> Result<Value> {
    let tag = read_u8(reader)?;
    match tag {
        TAG_INT => Ok(Value::Int(read_i32(reader)?)),
        TAG_STR => {
            let len = read_u32(reader)? as usize;
            let mut bytes = vec![0u8; len];
            reader.read_exact(&mut bytes).map_err(truncated)?;
            let s = String::from_utf8(bytes)
                .map_err(|e| BaseError::Corrupt(format!("invalid UTF-8 in string value: {}", e)))?;
            Ok(Value::Str(s))
        }
        TAG_ARRAY => {
            let count = read_u32(reader)? as usize;
            let mut items = Vec::with_capacity(count.min(1 << 20));
            for _ in 0..count {
                items.push(decode_from(reader)?);
            }
            Ok(Value::Array(items))
        }
        t if t >= TAG_VARIANT_BASE => {
            let nfields = read_u8(reader)? as usize;
            let mut fields = Vec::with_capacity(nfields);
            for _ in 0..nfields {
                fields.push(decode_from(reader)?);
            }
            Ok(Value::Tagged {
                tag: t & !TAG_VARIANT_BASE,
                fields,
            })
        }
        t => Err(BaseError::Corrupt(format!(
            "unknown value tag byte 0x{:02x}",
            t
        ))),
    }
}

// =============================================================================
// Primitive reads
// =============================================================================

fn read_u8<R: Read>(reader: &mut R) -> Result<u8> {
    let mut b = [0u8; 1];
    reader.read_exact(&mut b).map_err(truncated)?;
    Ok(b[0])
}

fn read_u32<R: Read>(reader: &mut R) -> Result<u32> {
    let mut b = [0u8; 4];
    reader.read_exact(&mut b).map_err(truncated)?;
    Ok(u32::from_be_bytes(b))
}

fn read_i32<R: Read>(reader: &mut R) -> Result<i32> {
    let mut b = [0u8; 4];
    reader.read_exact(&mut b).map_err(truncated)?;
    Ok(i32::from_be_bytes(b))
}

fn truncated(e: std::io::Error) -> BaseError {
    if e.kind() == std::io::ErrorKind::UnexpectedEof {
        BaseError::Corrupt("truncated value".to_string())
    } else {
        BaseError::Io(e)
    }
}
