//! Order-preserving key encoder.

use std::cmp::Reverse;

use crate::number::{self, NumberKey};
use crate::type_bits::{TypeBits, TypeBitsBuilder};
use crate::value::{Binary, Document, Value};

/// Type tag bytes. Their numeric order is the cross-kind sort order.
pub(crate) mod tag {
    /// Closes a document or array. Sorts below everything so shorter
    /// containers come first.
    pub const END: u8 = 0x04;
    /// Opens a document field.
    pub const FIELD: u8 = 0x05;
    pub const NULL: u8 = 0x0a;
    pub const NAN: u8 = 0x14;
    pub const NEGATIVE_INFINITY: u8 = 0x15;
    pub const NEGATIVE: u8 = 0x16;
    pub const ZERO: u8 = 0x17;
    pub const POSITIVE: u8 = 0x18;
    pub const POSITIVE_INFINITY: u8 = 0x19;
    pub const STRING: u8 = 0x28;
    pub const DOCUMENT: u8 = 0x32;
    pub const ARRAY: u8 = 0x3c;
    pub const BINARY: u8 = 0x46;
    pub const FALSE: u8 = 0x64;
    pub const TRUE: u8 = 0x65;

    /// Byte following 0x00 inside a string when the 0x00 is data rather
    /// than the terminator.
    pub const STRING_ESCAPE: u8 = 0xff;
}

/// Encode a single value to key bytes plus its type bits.
#[must_use]
pub fn to_key(value: &Value) -> (Vec<u8>, TypeBits) {
    let mut encoder = KeyEncoder::new();
    encoder.encode_value(value);
    encoder.into_parts()
}

/// Builds an order-preserving key.
///
/// Comparing two finished keys bytewise gives the same answer as comparing
/// the values that went into them with [`Value::cmp_canonical`], field by
/// field in the order they were written.
#[derive(Debug, Default)]
pub struct KeyEncoder {
    buffer: Vec<u8>,
    type_bits: TypeBitsBuilder,
}

impl KeyEncoder {
    /// Create a new encoder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new encoder with the specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
            type_bits: TypeBitsBuilder::new(),
        }
    }

    /// Append a raw byte. Used for fixed-width fields.
    pub fn push_byte(&mut self, byte: u8) {
        self.buffer.push(byte);
    }

    /// Append raw bytes. Used for fixed-width fields.
    pub fn push_bytes(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Encoded bytes so far.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Consume the encoder, returning the key bytes and the type bits.
    #[must_use]
    pub fn into_parts(self) -> (Vec<u8>, TypeBits) {
        (self.buffer, self.type_bits.finish())
    }

    /// Encode a value: its type tag followed by its body.
    pub fn encode_value(&mut self, value: &Value) {
        match value {
            Value::Null => self.buffer.push(tag::NULL),
            Value::Int32(_) | Value::Int64(_) | Value::Double(_) => {
                if let Some((key, ty)) = number::split(value) {
                    self.encode_number(key);
                    self.type_bits.push_number(ty);
                }
            }
            Value::String(s) => {
                self.buffer.push(tag::STRING);
                self.encode_string(s);
            }
            Value::Document(doc) => {
                self.buffer.push(tag::DOCUMENT);
                self.encode_document(doc);
            }
            Value::Array(items) => {
                self.buffer.push(tag::ARRAY);
                for item in items {
                    self.encode_value(item);
                }
                self.buffer.push(tag::END);
            }
            Value::Binary(bin) => {
                self.buffer.push(tag::BINARY);
                self.encode_binary(bin);
            }
            Value::Bool(false) => self.buffer.push(tag::FALSE),
            Value::Bool(true) => self.buffer.push(tag::TRUE),
        }
    }

    fn encode_number(&mut self, key: NumberKey) {
        match key {
            NumberKey::NaN => self.buffer.push(tag::NAN),
            NumberKey::NegativeInfinity => self.buffer.push(tag::NEGATIVE_INFINITY),
            NumberKey::Negative(Reverse(magnitude)) => {
                self.buffer.push(tag::NEGATIVE);
                // Complemented so that larger magnitudes sort lower.
                self.buffer
                    .extend(magnitude.to_bytes().iter().map(|b| !b));
            }
            NumberKey::Zero => self.buffer.push(tag::ZERO),
            NumberKey::Positive(magnitude) => {
                self.buffer.push(tag::POSITIVE);
                self.buffer.extend_from_slice(&magnitude.to_bytes());
            }
            NumberKey::PositiveInfinity => self.buffer.push(tag::POSITIVE_INFINITY),
        }
    }

    fn encode_string(&mut self, s: &str) {
        for &byte in s.as_bytes() {
            self.buffer.push(byte);
            if byte == 0 {
                self.buffer.push(tag::STRING_ESCAPE);
            }
        }
        self.buffer.push(0);
    }

    fn encode_document(&mut self, doc: &Document) {
        for (name, value) in doc.iter() {
            self.buffer.push(tag::FIELD);
            self.encode_string(name);
            self.encode_value(value);
        }
        self.buffer.push(tag::END);
    }

    /// Length first, so shorter payloads sort lower: a byte holding the
    /// number of significant length bytes, then those bytes big-endian.
    fn encode_binary(&mut self, bin: &Binary) {
        let len = bin.bytes.len() as u64;
        #[allow(clippy::cast_possible_truncation)]
        let width = 8 - (len.leading_zeros() / 8) as u8;
        self.buffer.push(width);
        self.buffer
            .extend_from_slice(&len.to_be_bytes()[8 - usize::from(width)..]);
        self.buffer.push(bin.subtype.to_byte());
        self.buffer.extend_from_slice(&bin.bytes);
    }
}
