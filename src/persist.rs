//! Persisted-state encoding (§6 "Persisted state layout").
//!
//! A self-describing stream: every value starts with a one-byte type
//! tag. Strings are encoded as a decimal character count, a newline,
//! then that many raw bytes. This module implements only that
//! building-block convention, not a full snapshot format — the rest
//! of the embedder-facing persistence layer is out of this crate's
//! scope (§1, §6).

use std::io::{self, Read, Write};

use thiserror::Error;

use crate::runtime::value::Value;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("unknown type tag {0}")]
    UnknownTag(u8),
    #[error("malformed string length prefix")]
    MalformedLength,
    #[error("string byte count exceeds the encoded length")]
    TruncatedString,
}

#[repr(u8)]
enum Tag {
    Undefined = 0,
    Null = 1,
    Bool = 2,
    Number = 3,
    Str = 4,
    /// Decimal digit string, reusing the `Str` wire convention.
    BigInt = 5,
    /// Global-symbol-registry key string, reusing the `Str` wire
    /// convention (§6, grounded on `Symbol::fromGlobalSymbolRegistry`'s
    /// `String* stringKey`).
    SymbolKey = 6,
}

impl Tag {
    fn from_u8(b: u8) -> Result<Self, PersistError> {
        Ok(match b {
            0 => Tag::Undefined,
            1 => Tag::Null,
            2 => Tag::Bool,
            3 => Tag::Number,
            4 => Tag::Str,
            5 => Tag::BigInt,
            6 => Tag::SymbolKey,
            other => return Err(PersistError::UnknownTag(other)),
        })
    }
}

/// Encode a string using the `count '\n' bytes` convention (§6).
pub fn write_string(out: &mut impl Write, s: &str) -> Result<(), PersistError> {
    write!(out, "{}\n", s.len())?;
    out.write_all(s.as_bytes())?;
    Ok(())
}

/// Decode a string encoded by [`write_string`].
pub fn read_string(input: &mut impl Read) -> Result<String, PersistError> {
    let mut len_buf = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        input.read_exact(&mut byte)?;
        if byte[0] == b'\n' {
            break;
        }
        len_buf.push(byte[0]);
    }
    let len: usize = std::str::from_utf8(&len_buf)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or(PersistError::MalformedLength)?;
    let mut bytes = vec![0u8; len];
    input.read_exact(&mut bytes).map_err(|_| PersistError::TruncatedString)?;
    String::from_utf8(bytes).map_err(|_| PersistError::MalformedLength)
}

/// Encode a scalar [`Value`] using the tag+payload convention. The
/// full scalar set (`undefined`, `null`, `bool`, `number`, `string`,
/// `bigint`, a registry-keyed `symbol`) round-trips through this
/// module; object/function identity persistence belongs to the
/// embedder layer this crate doesn't own.
pub fn write_value(out: &mut impl Write, value: &Value) -> Result<(), PersistError> {
    match value {
        Value::Undefined => out.write_all(&[Tag::Undefined as u8])?,
        Value::Null => out.write_all(&[Tag::Null as u8])?,
        Value::Bool(b) => {
            out.write_all(&[Tag::Bool as u8, *b as u8])?;
        }
        Value::Number(n) => {
            out.write_all(&[Tag::Number as u8])?;
            out.write_all(&n.to_bits().to_le_bytes())?;
        }
        Value::Str(s) => {
            out.write_all(&[Tag::Str as u8])?;
            write_string(out, s)?;
        }
        Value::BigInt(digits) => {
            out.write_all(&[Tag::BigInt as u8])?;
            write_string(out, digits)?;
        }
        Value::SymbolKey(key) => {
            out.write_all(&[Tag::SymbolKey as u8])?;
            write_string(out, key)?;
        }
        Value::Object(_) | Value::Function(..) => {
            return Err(PersistError::UnknownTag(0xFF));
        }
    }
    Ok(())
}

pub fn read_value(input: &mut impl Read) -> Result<Value, PersistError> {
    let mut tag_buf = [0u8; 1];
    input.read_exact(&mut tag_buf)?;
    Ok(match Tag::from_u8(tag_buf[0])? {
        Tag::Undefined => Value::Undefined,
        Tag::Null => Value::Null,
        Tag::Bool => {
            let mut b = [0u8; 1];
            input.read_exact(&mut b)?;
            Value::Bool(b[0] != 0)
        }
        Tag::Number => {
            let mut bits = [0u8; 8];
            input.read_exact(&mut bits)?;
            Value::Number(f64::from_bits(u64::from_le_bytes(bits)))
        }
        Tag::Str => Value::Str(read_string(input)?.into()),
        Tag::BigInt => Value::BigInt(read_string(input)?.into()),
        Tag::SymbolKey => Value::SymbolKey(read_string(input)?.into()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_round_trips_through_the_count_newline_convention() {
        let mut buf = Vec::new();
        write_string(&mut buf, "hello").unwrap();
        assert_eq!(buf, b"5\nhello");
        let mut cursor = io::Cursor::new(buf);
        assert_eq!(read_string(&mut cursor).unwrap(), "hello");
    }

    #[test]
    fn scalar_values_round_trip() {
        for v in [
            Value::Undefined,
            Value::Null,
            Value::Bool(true),
            Value::Number(42.5),
            Value::Str("x".into()),
            Value::BigInt("123456789012345678901234567890".into()),
            Value::SymbolKey("Symbol.iterator".into()),
        ] {
            let mut buf = Vec::new();
            write_value(&mut buf, &v).unwrap();
            let mut cursor = io::Cursor::new(buf);
            let back = read_value(&mut cursor).unwrap();
            match (&v, &back) {
                (Value::Number(a), Value::Number(b)) => assert_eq!(a, b),
                (Value::Str(a), Value::Str(b)) => assert_eq!(a, b),
                (Value::Bool(a), Value::Bool(b)) => assert_eq!(a, b),
                (Value::BigInt(a), Value::BigInt(b)) => assert_eq!(a, b),
                (Value::SymbolKey(a), Value::SymbolKey(b)) => assert_eq!(a, b),
                (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => {}
                other => panic!("unexpected round-trip mismatch: {other:?}"),
            }
        }
    }

    #[test]
    fn bigint_zero_digit_string_is_falsy() {
        assert!(!Value::BigInt("0".into()).to_boolean());
        assert!(Value::BigInt("00".into()).to_boolean(), "only the exact digit string \"0\" is falsy");
        assert!(Value::BigInt("-1".into()).to_boolean());
    }

    #[test]
    fn symbol_key_is_always_truthy() {
        assert!(Value::SymbolKey("".into()).to_boolean());
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let mut cursor = io::Cursor::new(vec![0xAB]);
        assert!(matches!(read_value(&mut cursor), Err(PersistError::UnknownTag(0xAB))));
    }
}
