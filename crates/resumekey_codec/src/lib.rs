//! # resumekey codec
//!
//! Order-preserving key encoding for resume tokens.
//!
//! A key is a byte string built from a sequence of values such that
//! comparing two keys bytewise gives the same answer as comparing the values
//! that built them. Numbers are compared by value, so `1`, `1i64` and `1.0`
//! all produce the same bytes. The representation they had is kept aside in
//! [`TypeBits`], which only carries data when some value is not in its
//! default representation.
//!
//! ## Ordering
//!
//! Kinds sort by the rank table on [`KindRank`]: null, numbers, strings,
//! documents, arrays, binary, booleans. See [`Value::cmp_canonical`].
//!
//! ## Usage
//!
//! ```
//! use resumekey_codec::{from_key, to_key, Document, Value};
//!
//! let key = Value::Document(Document::new().with("_id", 1.0));
//! let (bytes, type_bits) = to_key(&key);
//! assert!(!type_bits.is_default());
//!
//! let decoded = from_key(&bytes, &type_bits).unwrap();
//! assert_eq!(decoded, key);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod cbor;
mod decoder;
mod encoder;
mod error;
mod number;
mod type_bits;
mod value;

use uuid::Uuid;

pub use cbor::{BINARY_TAG_BASE, INT64_TAG};
pub use decoder::{from_key, KeyDecoder};
pub use encoder::{to_key, KeyEncoder};
pub use error::{DecodingError, DecodingResult, TransportError};
pub use type_bits::{TypeBits, TypeBitsBuilder, TypeBitsReader};
pub use value::{Binary, BinarySubtype, Document, KindRank, Value};

/// Types that can append themselves to a key.
///
/// Implementations must be order-preserving: if `a < b` then the bytes
/// written for `a` must compare below those written for `b`, and neither
/// may be a prefix of the other unless the values are equal.
pub trait KeyEncode {
    /// Append this value to the key.
    fn encode_key(&self, encoder: &mut KeyEncoder);
}

/// Types that can read themselves back from a key.
pub trait KeyDecode: Sized {
    /// Read this value from the key.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes at the cursor do not hold a valid value.
    fn decode_key(decoder: &mut KeyDecoder<'_>) -> DecodingResult<Self>;
}

impl KeyEncode for Value {
    fn encode_key(&self, encoder: &mut KeyEncoder) {
        encoder.encode_value(self);
    }
}

impl KeyDecode for Value {
    fn decode_key(decoder: &mut KeyDecoder<'_>) -> DecodingResult<Self> {
        decoder.decode_value()
    }
}

// UUIDs order by their raw bytes, so the bytes themselves are the key.
impl KeyEncode for Uuid {
    fn encode_key(&self, encoder: &mut KeyEncoder) {
        encoder.push_bytes(self.as_bytes());
    }
}

impl KeyDecode for Uuid {
    fn decode_key(decoder: &mut KeyDecoder<'_>) -> DecodingResult<Self> {
        decoder.read_array::<16>().map(Uuid::from_bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode<T: KeyEncode>(value: &T) -> (Vec<u8>, TypeBits) {
        let mut encoder = KeyEncoder::new();
        value.encode_key(&mut encoder);
        encoder.into_parts()
    }

    #[test]
    fn uuid_roundtrip() {
        let uuid = Uuid::new_v4();
        let (bytes, bits) = encode(&uuid);
        assert_eq!(bytes.len(), 16);
        assert!(bits.is_default());

        let mut decoder = KeyDecoder::new(&bytes, &bits);
        assert_eq!(Uuid::decode_key(&mut decoder).unwrap(), uuid);
        decoder.finish().unwrap();
    }

    #[test]
    fn uuid_order_matches_bytes() {
        let low = Uuid::from_bytes([0x10; 16]);
        let high = Uuid::from_bytes([0x20; 16]);
        assert!(low < high);
        assert!(encode(&low).0 < encode(&high).0);
    }

    #[test]
    fn sequence_of_values() {
        let mut encoder = KeyEncoder::new();
        Value::Int64(3).encode_key(&mut encoder);
        Value::String("x".into()).encode_key(&mut encoder);
        Value::Double(0.5).encode_key(&mut encoder);
        let (bytes, bits) = encoder.into_parts();

        let mut decoder = KeyDecoder::new(&bytes, &bits);
        assert_eq!(Value::decode_key(&mut decoder).unwrap(), Value::Int64(3));
        assert_eq!(
            Value::decode_key(&mut decoder).unwrap(),
            Value::String("x".into())
        );
        assert_eq!(Value::decode_key(&mut decoder).unwrap(), Value::Double(0.5));
        decoder.finish().unwrap();
    }

    #[test]
    fn truncated_uuid() {
        let bits = TypeBits::Default;
        let mut decoder = KeyDecoder::new(&[1, 2, 3], &bits);
        assert_eq!(
            Uuid::decode_key(&mut decoder).unwrap_err(),
            DecodingError::TruncatedBuffer {
                needed: 16,
                available: 3
            }
        );
    }
}
