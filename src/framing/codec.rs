//! The object codec: a self-describing value type plus a tagged-length-value
//! encoding over it, in the spirit of the original `rencode` wire format
//! (`protocol.py`'s `rencode.dumps` / `rencode.loads(..., decode_utf8=True)`).
//!
//! The codec is a pluggable interface (`ObjectCodec`); `TlvCodec` is the
//! reference implementation frames are tested against. Interoperating
//! with an existing peer requires using the same codec and compression —
//! the wire format is part of the framing contract, not an implementation
//! detail (`spec.md` §9, "Codec coupling").

use thiserror::Error;

/// A language-neutral value: nested sequences, mappings, integers, byte
/// strings, text strings, booleans, and null.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Bytes(Vec<u8>),
    Str(String),
    List(Vec<Value>),
    Map(Vec<(Value, Value)>),
}

impl Value {
    pub fn str(s: impl Into<String>) -> Self {
        Value::Str(s.into())
    }
}

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("unexpected end of input decoding a value")]
    Truncated,
    #[error("unrecognized value tag {0:#x}")]
    InvalidTag(u8),
    #[error("value contained invalid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("varint too long")]
    VarintOverflow,
}

/// A codec mapping between `Value` and self-delimiting bytes.
pub trait ObjectCodec: Send + Sync {
    fn encode(&self, value: &Value) -> Vec<u8>;
    fn decode(&self, bytes: &[u8]) -> Result<Value, CodecError>;
}

const TAG_NONE: u8 = 0;
const TAG_FALSE: u8 = 1;
const TAG_TRUE: u8 = 2;
const TAG_INT: u8 = 3;
const TAG_BYTES: u8 = 4;
const TAG_STR: u8 = 5;
const TAG_LIST: u8 = 6;
const TAG_MAP: u8 = 7;

/// Tagged-length-value codec with LEB128 variable-width integers,
/// decoding text with UTF-8 validation enabled (the reference wire's
/// `decode_utf8=True` mode).
#[derive(Debug, Default, Clone, Copy)]
pub struct TlvCodec;

impl ObjectCodec for TlvCodec {
    fn encode(&self, value: &Value) -> Vec<u8> {
        let mut out = Vec::new();
        encode_value(value, &mut out);
        out
    }

    fn decode(&self, bytes: &[u8]) -> Result<Value, CodecError> {
        let mut cursor = bytes;
        let value = decode_value(&mut cursor)?;
        Ok(value)
    }
}

fn write_uvarint(mut n: u64, out: &mut Vec<u8>) {
    loop {
        let byte = (n & 0x7f) as u8;
        n >>= 7;
        if n == 0 {
            out.push(byte);
            break;
        }
        out.push(byte | 0x80);
    }
}

fn read_uvarint(input: &mut &[u8]) -> Result<u64, CodecError> {
    let mut result: u64 = 0;
    let mut shift = 0;
    loop {
        let (&byte, rest) = input.split_first().ok_or(CodecError::Truncated)?;
        *input = rest;
        result |= ((byte & 0x7f) as u64) << shift;
        if byte & 0x80 == 0 {
            return Ok(result);
        }
        shift += 7;
        if shift >= 64 {
            return Err(CodecError::VarintOverflow);
        }
    }
}

fn zigzag_encode(n: i64) -> u64 {
    ((n << 1) ^ (n >> 63)) as u64
}

fn zigzag_decode(n: u64) -> i64 {
    ((n >> 1) as i64) ^ -((n & 1) as i64)
}

fn encode_value(value: &Value, out: &mut Vec<u8>) {
    match value {
        Value::None => out.push(TAG_NONE),
        Value::Bool(false) => out.push(TAG_FALSE),
        Value::Bool(true) => out.push(TAG_TRUE),
        Value::Int(n) => {
            out.push(TAG_INT);
            write_uvarint(zigzag_encode(*n), out);
        }
        Value::Bytes(b) => {
            out.push(TAG_BYTES);
            write_uvarint(b.len() as u64, out);
            out.extend_from_slice(b);
        }
        Value::Str(s) => {
            out.push(TAG_STR);
            write_uvarint(s.len() as u64, out);
            out.extend_from_slice(s.as_bytes());
        }
        Value::List(items) => {
            out.push(TAG_LIST);
            write_uvarint(items.len() as u64, out);
            for item in items {
                encode_value(item, out);
            }
        }
        Value::Map(entries) => {
            out.push(TAG_MAP);
            write_uvarint(entries.len() as u64, out);
            for (k, v) in entries {
                encode_value(k, out);
                encode_value(v, out);
            }
        }
    }
}

fn decode_value(input: &mut &[u8]) -> Result<Value, CodecError> {
    let (&tag, rest) = input.split_first().ok_or(CodecError::Truncated)?;
    *input = rest;
    match tag {
        TAG_NONE => Ok(Value::None),
        TAG_FALSE => Ok(Value::Bool(false)),
        TAG_TRUE => Ok(Value::Bool(true)),
        TAG_INT => Ok(Value::Int(zigzag_decode(read_uvarint(input)?))),
        TAG_BYTES => {
            let len = read_uvarint(input)? as usize;
            if input.len() < len {
                return Err(CodecError::Truncated);
            }
            let (bytes, rest) = input.split_at(len);
            *input = rest;
            Ok(Value::Bytes(bytes.to_vec()))
        }
        TAG_STR => {
            let len = read_uvarint(input)? as usize;
            if input.len() < len {
                return Err(CodecError::Truncated);
            }
            let (bytes, rest) = input.split_at(len);
            *input = rest;
            Ok(Value::Str(String::from_utf8(bytes.to_vec())?))
        }
        TAG_LIST => {
            let count = read_uvarint(input)?;
            let mut items = Vec::with_capacity(count.min(4096) as usize);
            for _ in 0..count {
                items.push(decode_value(input)?);
            }
            Ok(Value::List(items))
        }
        TAG_MAP => {
            let count = read_uvarint(input)?;
            let mut entries = Vec::with_capacity(count.min(4096) as usize);
            for _ in 0..count {
                let k = decode_value(input)?;
                let v = decode_value(input)?;
                entries.push((k, v));
            }
            Ok(Value::Map(entries))
        }
        other => Err(CodecError::InvalidTag(other)),
    }
}
