//! Carrying documents as CBOR bytes.
//!
//! Serialized tokens are documents; this lets them cross a byte boundary
//! without losing anything the parser looks at. Number representations and
//! binary subtypes survive through private tags:
//!
//! - `Int32` is a plain integer, `Int64` is an integer under [`INT64_TAG`].
//! - Generic binary is a plain byte string, other subtypes are byte strings
//!   under [`BINARY_TAG_BASE`] plus the subtype byte.

use ciborium::value::{Integer, Value as Cbor};

use crate::error::TransportError;
use crate::value::{Binary, BinarySubtype, Document, Value};

/// Tag marking a 64-bit integer.
pub const INT64_TAG: u64 = 0x7264_0001;
/// Tag base for non-generic binary subtypes.
pub const BINARY_TAG_BASE: u64 = 0x7264_0100;

impl Document {
    /// Encode this document as a CBOR map.
    ///
    /// # Errors
    ///
    /// Returns an error if the CBOR writer fails.
    pub fn to_cbor(&self) -> Result<Vec<u8>, TransportError> {
        let mut out = Vec::new();
        ciborium::ser::into_writer(&document_to_cbor(self), &mut out).map_err(|e| {
            TransportError::EncodingFailed {
                message: format!("{e:?}"),
            }
        })?;
        Ok(out)
    }

    /// Decode a document from a CBOR map.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not CBOR or hold something other
    /// than a map with text keys.
    pub fn from_cbor(bytes: &[u8]) -> Result<Self, TransportError> {
        let item: Cbor =
            ciborium::de::from_reader(bytes).map_err(|e| TransportError::DecodingFailed {
                message: format!("{e:?}"),
            })?;
        match item {
            Cbor::Map(entries) => document_from_cbor(entries),
            _ => Err(TransportError::unsupported("top-level item is not a map")),
        }
    }
}

fn document_to_cbor(doc: &Document) -> Cbor {
    Cbor::Map(
        doc.iter()
            .map(|(name, value)| (Cbor::Text(name.to_string()), value_to_cbor(value)))
            .collect(),
    )
}

fn value_to_cbor(value: &Value) -> Cbor {
    match value {
        Value::Null => Cbor::Null,
        Value::Int32(n) => Cbor::Integer(Integer::from(*n)),
        Value::Int64(n) => Cbor::Tag(INT64_TAG, Box::new(Cbor::Integer(Integer::from(*n)))),
        Value::Double(x) => Cbor::Float(*x),
        Value::String(s) => Cbor::Text(s.clone()),
        Value::Document(doc) => document_to_cbor(doc),
        Value::Array(items) => Cbor::Array(items.iter().map(value_to_cbor).collect()),
        Value::Binary(bin) if bin.is_generic() => Cbor::Bytes(bin.bytes.clone()),
        Value::Binary(bin) => Cbor::Tag(
            BINARY_TAG_BASE + u64::from(bin.subtype.to_byte()),
            Box::new(Cbor::Bytes(bin.bytes.clone())),
        ),
        Value::Bool(b) => Cbor::Bool(*b),
    }
}

fn document_from_cbor(entries: Vec<(Cbor, Cbor)>) -> Result<Document, TransportError> {
    let mut doc = Document::new();
    for (key, value) in entries {
        let Cbor::Text(name) = key else {
            return Err(TransportError::unsupported("map key is not text"));
        };
        doc.push_unchecked(name, value_from_cbor(value)?);
    }
    Ok(doc)
}

fn value_from_cbor(item: Cbor) -> Result<Value, TransportError> {
    match item {
        Cbor::Null => Ok(Value::Null),
        Cbor::Bool(b) => Ok(Value::Bool(b)),
        Cbor::Integer(n) => {
            let n = i64::try_from(n)
                .map_err(|_| TransportError::unsupported("integer outside the i64 range"))?;
            Ok(i32::try_from(n).map_or(Value::Int64(n), Value::Int32))
        }
        Cbor::Float(x) => Ok(Value::Double(x)),
        Cbor::Text(s) => Ok(Value::String(s)),
        Cbor::Bytes(bytes) => Ok(Value::Binary(Binary::generic(bytes))),
        Cbor::Array(items) => items
            .into_iter()
            .map(value_from_cbor)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Cbor::Map(entries) => document_from_cbor(entries).map(Value::Document),
        Cbor::Tag(INT64_TAG, inner) => match *inner {
            Cbor::Integer(n) => i64::try_from(n)
                .map(Value::Int64)
                .map_err(|_| TransportError::unsupported("integer outside the i64 range")),
            _ => Err(TransportError::unsupported("int64 tag on a non-integer")),
        },
        Cbor::Tag(tag, inner) if (BINARY_TAG_BASE..=BINARY_TAG_BASE + 0xff).contains(&tag) => {
            match *inner {
                Cbor::Bytes(bytes) => {
                    let subtype = u8::try_from(tag - BINARY_TAG_BASE)
                        .map_err(|_| TransportError::unsupported("binary subtype"))?;
                    Ok(Value::Binary(Binary::new(
                        BinarySubtype::from_byte(subtype),
                        bytes,
                    )))
                }
                _ => Err(TransportError::unsupported("binary tag on a non-byte-string")),
            }
        }
        Cbor::Tag(tag, _) => Err(TransportError::unsupported(format!("tag {tag}"))),
        _ => Err(TransportError::unsupported("simple value")),
    }
}
