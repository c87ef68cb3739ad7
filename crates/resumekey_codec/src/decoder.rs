//! Order-preserving key decoder.

use std::cmp::Reverse;

use crate::encoder::tag;
use crate::error::{DecodingError, DecodingResult};
use crate::number::{self, Magnitude, NumberKey, MAGNITUDE_LEN};
use crate::type_bits::{TypeBits, TypeBitsReader};
use crate::value::{Binary, BinarySubtype, Document, Value};

/// Decode a single value that makes up the whole key.
///
/// # Errors
///
/// Returns an error if the key is truncated, carries an unknown tag, has
/// trailing bytes, or disagrees with its type bits.
pub fn from_key(data: &[u8], type_bits: &TypeBits) -> DecodingResult<Value> {
    let mut decoder = KeyDecoder::new(data, type_bits);
    let value = decoder.decode_value()?;
    decoder.finish()?;
    Ok(value)
}

/// A document or array whose terminator has not been read yet.
enum Container {
    Array(Vec<Value>),
    /// The document so far and the name of the field being read.
    Document(Document, String),
}

impl Container {
    fn push(&mut self, value: Value) {
        match self {
            Self::Array(items) => items.push(value),
            Self::Document(doc, name) => doc.push_unchecked(std::mem::take(name), value),
        }
    }

    fn into_value(self) -> Value {
        match self {
            Self::Array(items) => Value::Array(items),
            Self::Document(doc, _) => Value::Document(doc),
        }
    }
}

/// Either a complete value or a container that still needs its contents.
enum Item {
    Value(Value),
    Open(Container),
}

/// Cursor over an encoded key and its type bits.
pub struct KeyDecoder<'a> {
    data: &'a [u8],
    pos: usize,
    type_bits: TypeBitsReader<'a>,
}

impl<'a> KeyDecoder<'a> {
    /// Create a decoder over a key and the type bits that came with it.
    #[must_use]
    pub fn new(data: &'a [u8], type_bits: &'a TypeBits) -> Self {
        Self {
            data,
            pos: 0,
            type_bits: type_bits.reader(),
        }
    }

    /// Offset of the next unread byte.
    #[must_use]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Number of unread bytes.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Check if all bytes have been consumed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Look at the next byte without consuming it.
    #[must_use]
    pub fn peek_byte(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    /// Read one byte.
    ///
    /// # Errors
    ///
    /// Returns [`DecodingError::TruncatedBuffer`] at the end of the key.
    #[inline]
    pub fn read_byte(&mut self) -> DecodingResult<u8> {
        let byte = self.peek_byte().ok_or(DecodingError::TruncatedBuffer {
            needed: 1,
            available: 0,
        })?;
        self.pos += 1;
        Ok(byte)
    }

    /// Read `len` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`DecodingError::TruncatedBuffer`] if fewer remain.
    #[inline]
    pub fn read_bytes(&mut self, len: usize) -> DecodingResult<&'a [u8]> {
        let available = self.remaining();
        if len > available {
            return Err(DecodingError::TruncatedBuffer {
                needed: len,
                available,
            });
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    /// Read a fixed-width field.
    ///
    /// # Errors
    ///
    /// Returns [`DecodingError::TruncatedBuffer`] if fewer than `N` bytes remain.
    pub fn read_array<const N: usize>(&mut self) -> DecodingResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    /// Decode the next value: a type tag and its body.
    ///
    /// Open containers are kept on a heap stack, so any value the encoder
    /// wrote decodes regardless of how deeply it nests.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is truncated, malformed or disagrees
    /// with the type bits.
    pub fn decode_value(&mut self) -> DecodingResult<Value> {
        let mut open: Vec<Container> = Vec::new();
        loop {
            let mut closed = None;
            if let Some(container) = open.last_mut() {
                if self.read_entry_start(container)? {
                    closed = open.pop();
                }
            }
            let value = match closed {
                Some(container) => container.into_value(),
                None => match self.read_item()? {
                    Item::Value(value) => value,
                    Item::Open(container) => {
                        open.push(container);
                        continue;
                    }
                },
            };
            match open.last_mut() {
                Some(parent) => parent.push(value),
                None => return Ok(value),
            }
        }
    }

    /// Check that the key and the type bits were consumed exactly.
    ///
    /// # Errors
    ///
    /// Returns [`DecodingError::TrailingBytes`] if key bytes are left over and
    /// [`DecodingError::MalformedTypeBits`] if set type bits are left over.
    pub fn finish(self) -> DecodingResult<()> {
        if !self.is_empty() {
            return Err(DecodingError::TrailingBytes {
                remaining: self.remaining(),
            });
        }
        self.type_bits.finish()
    }

    /// Read what comes before the next entry of `container`. Returns true
    /// if the terminator was read instead.
    fn read_entry_start(&mut self, container: &mut Container) -> DecodingResult<bool> {
        match container {
            Container::Array(_) => {
                if self.peek_byte() == Some(tag::END) {
                    self.pos += 1;
                    return Ok(true);
                }
                Ok(false)
            }
            Container::Document(_, name) => {
                let offset = self.pos;
                match self.read_byte()? {
                    tag::END => Ok(true),
                    tag::FIELD => {
                        *name = self.decode_string()?;
                        Ok(false)
                    }
                    other => Err(DecodingError::UnknownTypeTag { tag: other, offset }),
                }
            }
        }
    }

    fn read_item(&mut self) -> DecodingResult<Item> {
        let offset = self.pos;
        let byte = self.read_byte()?;
        let value = match byte {
            tag::NULL => Value::Null,
            tag::NAN => self.finish_number(NumberKey::NaN)?,
            tag::NEGATIVE_INFINITY => self.finish_number(NumberKey::NegativeInfinity)?,
            tag::NEGATIVE => {
                let mut bytes = self.read_array::<MAGNITUDE_LEN>()?;
                for b in &mut bytes {
                    *b = !*b;
                }
                let magnitude = Magnitude::from_bytes(bytes)?;
                self.finish_number(NumberKey::Negative(Reverse(magnitude)))?
            }
            tag::ZERO => self.finish_number(NumberKey::Zero)?,
            tag::POSITIVE => {
                let magnitude = Magnitude::from_bytes(self.read_array::<MAGNITUDE_LEN>()?)?;
                self.finish_number(NumberKey::Positive(magnitude))?
            }
            tag::POSITIVE_INFINITY => self.finish_number(NumberKey::PositiveInfinity)?,
            tag::STRING => Value::String(self.decode_string()?),
            tag::DOCUMENT => {
                return Ok(Item::Open(Container::Document(Document::new(), String::new())))
            }
            tag::ARRAY => return Ok(Item::Open(Container::Array(Vec::new()))),
            tag::BINARY => Value::Binary(self.decode_binary()?),
            tag::FALSE => Value::Bool(false),
            tag::TRUE => Value::Bool(true),
            _ => return Err(DecodingError::UnknownTypeTag { tag: byte, offset }),
        };
        Ok(Item::Value(value))
    }

    fn finish_number(&mut self, key: NumberKey) -> DecodingResult<Value> {
        let ty = self.type_bits.read_number();
        number::rebuild(key, ty)
    }

    fn decode_string(&mut self) -> DecodingResult<String> {
        let mut bytes = Vec::new();
        loop {
            match self.read_byte()? {
                0 if self.peek_byte() == Some(tag::STRING_ESCAPE) => {
                    self.pos += 1;
                    bytes.push(0);
                }
                0 => break,
                byte => bytes.push(byte),
            }
        }
        String::from_utf8(bytes)
            .map_err(|_| DecodingError::invalid_value("string is not valid UTF-8"))
    }

    fn decode_binary(&mut self) -> DecodingResult<Binary> {
        let width = usize::from(self.read_byte()?);
        if width > 8 {
            return Err(DecodingError::invalid_value(format!(
                "binary length prefix of {width} bytes"
            )));
        }
        let len_bytes = self.read_bytes(width)?;
        if len_bytes.first() == Some(&0) {
            return Err(DecodingError::invalid_value(
                "binary length prefix is not minimal",
            ));
        }
        let len = len_bytes
            .iter()
            .fold(0u64, |acc, &b| (acc << 8) | u64::from(b));
        let len = usize::try_from(len)
            .map_err(|_| DecodingError::invalid_value("binary length overflows usize"))?;
        let subtype = BinarySubtype::from_byte(self.read_byte()?);
        let bytes = self.read_bytes(len)?;
        Ok(Binary::new(subtype, bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::to_key;

    fn roundtrip(value: Value) {
        let (key, bits) = to_key(&value);
        assert_eq!(from_key(&key, &bits).unwrap(), value);
    }

    #[test]
    fn roundtrip_scalars() {
        roundtrip(Value::Null);
        roundtrip(Value::Bool(true));
        roundtrip(Value::Int32(-42));
        roundtrip(Value::Int64(1 << 40));
        roundtrip(Value::Double(1.0));
        roundtrip(Value::Double(-0.0));
        roundtrip(Value::Double(f64::NAN));
        roundtrip(Value::String("with\0nul".into()));
        roundtrip(Value::Binary(Binary::new(BinarySubtype::Md5, vec![7; 16])));
    }

    #[test]
    fn roundtrip_nested() {
        let value = Value::Document(
            Document::new()
                .with("_id", "stuff")
                .with(
                    "otherkey",
                    Document::new().with("otherstuff", 2).with("f", 2.0),
                )
                .with(
                    "list",
                    Value::Array(vec![Value::Int64(3), Value::Null, Value::Double(0.25)]),
                ),
        );
        roundtrip(value);
    }

    #[test]
    fn missing_type_bits_decode_as_int32() {
        let (key, bits) = to_key(&Value::Double(1.0));
        assert!(!bits.is_default());
        assert_eq!(
            from_key(&key, &TypeBits::Default).unwrap(),
            Value::Int32(1)
        );
    }

    #[test]
    fn unknown_tag_is_reported_with_offset() {
        let err = from_key(&[0xa5], &TypeBits::Default).unwrap_err();
        assert_eq!(err, DecodingError::UnknownTypeTag { tag: 0xa5, offset: 0 });

        let err = from_key(&[tag::DOCUMENT, 0x07], &TypeBits::Default).unwrap_err();
        assert_eq!(err, DecodingError::UnknownTypeTag { tag: 0x07, offset: 1 });
    }

    #[test]
    fn truncation_is_detected() {
        let (key, bits) = to_key(&Value::Int32(12345));
        let err = from_key(&key[..5], &bits).unwrap_err();
        assert!(matches!(err, DecodingError::TruncatedBuffer { needed: 10, available: 4 }));

        let err = from_key(&[tag::STRING, b'a'], &TypeBits::Default).unwrap_err();
        assert!(matches!(err, DecodingError::TruncatedBuffer { .. }));

        let err = from_key(&[], &TypeBits::Default).unwrap_err();
        assert!(matches!(err, DecodingError::TruncatedBuffer { .. }));
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let err = from_key(&[tag::NULL, tag::NULL], &TypeBits::Default).unwrap_err();
        assert_eq!(err, DecodingError::TrailingBytes { remaining: 1 });
    }

    #[test]
    fn excess_type_bits_are_rejected() {
        let (key, _) = to_key(&Value::Int32(1));
        let err = from_key(&key, &TypeBits::from_bytes(vec![0, 0x10])).unwrap_err();
        assert!(matches!(err, DecodingError::MalformedTypeBits { .. }));
        from_key(&key, &TypeBits::from_bytes(vec![0, 0, 0])).unwrap();
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        let err = from_key(&[tag::STRING, 0xc3, 0x28, 0], &TypeBits::Default).unwrap_err();
        assert!(matches!(err, DecodingError::InvalidValue { .. }));
    }

    #[test]
    fn deep_nesting_roundtrips() {
        let mut value = Value::Document(Document::new().with("_id", 1.5));
        for i in 0..1000 {
            value = if i % 2 == 0 {
                Value::Array(vec![Value::Null, value])
            } else {
                Value::Document(Document::new().with("k", value))
            };
        }
        roundtrip(value);
    }

    #[test]
    fn deep_unterminated_nesting_is_truncated() {
        let key = vec![tag::ARRAY; 10_000];
        let err = from_key(&key, &TypeBits::Default).unwrap_err();
        assert!(matches!(err, DecodingError::TruncatedBuffer { .. }));
    }

    #[test]
    fn non_minimal_binary_length_is_rejected() {
        let key = [tag::BINARY, 2, 0, 1, 0, 0xaa];
        let err = from_key(&key, &TypeBits::Default).unwrap_err();
        assert!(matches!(err, DecodingError::InvalidValue { .. }));
    }
}
