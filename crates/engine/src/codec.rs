//! Binary-safe value codec
//!
//! Client values are arbitrary byte strings; the record store's text bins
//! hold UTF-8. A value that can't be stored as plain text (it contains NUL,
//! is not valid UTF-8, or already starts with the marker) is stored as
//! `__64__` followed by its base64 encoding. Everything else is stored
//! unchanged.
//!
//! Integers supplied by the client are stored natively as `Value::Int`, so
//! arithmetic keeps working on them. On read they come back as their decimal
//! string, since the reference store has no numeric reply type for plain
//! reads.
//!
//! Both directions are pure functions. `decode` is total: every `Value` the
//! store can return decodes to some byte string.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use redshim_core::Value;

/// Prefix marking a base64-escaped value
pub const MARKER: &str = "__64__";

/// A client-supplied scalar
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scalar {
    /// Integer, stored natively
    Int(i64),
    /// Byte string, stored through the codec
    Bytes(Vec<u8>),
}

impl Scalar {
    /// Byte rendering (integers as decimal text)
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Scalar::Int(i) => i.to_string().into_bytes(),
            Scalar::Bytes(b) => b.clone(),
        }
    }
}

impl From<i64> for Scalar {
    fn from(i: i64) -> Self {
        Scalar::Int(i)
    }
}

impl From<i32> for Scalar {
    fn from(i: i32) -> Self {
        Scalar::Int(i64::from(i))
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Bytes(s.as_bytes().to_vec())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::Bytes(s.into_bytes())
    }
}

impl From<&[u8]> for Scalar {
    fn from(b: &[u8]) -> Self {
        Scalar::Bytes(b.to_vec())
    }
}

impl<const N: usize> From<&[u8; N]> for Scalar {
    fn from(b: &[u8; N]) -> Self {
        Scalar::Bytes(b.to_vec())
    }
}

impl From<Vec<u8>> for Scalar {
    fn from(b: Vec<u8>) -> Self {
        Scalar::Bytes(b)
    }
}

/// Bytes as text, if they can live in a text bin unescaped
fn as_plain_text(bytes: &[u8]) -> Option<&str> {
    match std::str::from_utf8(bytes) {
        Ok(text) if !text.contains('\0') && !text.starts_with(MARKER) => Some(text),
        _ => None,
    }
}

/// Encode bytes into the text form stored in a bin or map key
pub fn encode_text(bytes: &[u8]) -> String {
    match as_plain_text(bytes) {
        Some(text) => text.to_string(),
        None => format!("{}{}", MARKER, BASE64.encode(bytes)),
    }
}

/// Decode the text form back into bytes
pub fn decode_text(text: &str) -> Vec<u8> {
    match text.strip_prefix(MARKER) {
        Some(payload) => BASE64
            .decode(payload)
            .unwrap_or_else(|_| text.as_bytes().to_vec()),
        None => text.as_bytes().to_vec(),
    }
}

/// Encode bytes into a bin value
pub fn encode(bytes: &[u8]) -> Value {
    Value::Str(encode_text(bytes))
}

/// Encode a client scalar into a bin value
pub fn encode_scalar(scalar: &Scalar) -> Value {
    match scalar {
        Scalar::Int(i) => Value::Int(*i),
        Scalar::Bytes(b) => encode(b),
    }
}

/// Decode a bin value into bytes
pub fn decode(value: &Value) -> Vec<u8> {
    match value {
        Value::Str(text) => decode_text(text),
        Value::Int(i) => i.to_string().into_bytes(),
        Value::Nil => Vec::new(),
        other => other.to_string().into_bytes(),
    }
}
