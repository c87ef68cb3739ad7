//! Side channel recording the exact representation of encoded values.
//!
//! The key encoding folds `Int32(1)`, `Int64(1)` and `Double(1.0)` onto the
//! same bytes. Type bits remember which one it was, two bits per numeric
//! value in the order the values appear in the key, packed least significant
//! bit first. Code zero is the default representation, so a key whose
//! numbers are all `Int32` needs no type bits at all.

use crate::error::{DecodingError, DecodingResult};
use crate::number::NumberType;

/// Type bits attached to an encoded key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum TypeBits {
    /// Every value has its default representation. Serializes to nothing.
    #[default]
    Default,
    /// Explicitly supplied bits.
    ///
    /// The encoder only produces this when some bit is set, but a parsed
    /// all-zero buffer is kept as-is so that it serializes back unchanged.
    Explicit(Vec<u8>),
}

impl TypeBits {
    /// Wraps bytes received from outside. Validation happens on decode,
    /// since it depends on the values in the companion key.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        TypeBits::Explicit(bytes.into())
    }

    /// Whether these are the implicit default bits.
    #[must_use]
    pub fn is_default(&self) -> bool {
        matches!(self, TypeBits::Default)
    }

    /// Serialized bytes, or `None` for the default.
    #[must_use]
    pub fn to_bytes(&self) -> Option<&[u8]> {
        match self {
            TypeBits::Default => None,
            TypeBits::Explicit(bytes) => Some(bytes),
        }
    }

    /// Returns a reader positioned at the first value.
    #[must_use]
    pub fn reader(&self) -> TypeBitsReader<'_> {
        TypeBitsReader::new(self.to_bytes().unwrap_or(&[]))
    }
}

/// Accumulates type bits while a key is being encoded.
#[derive(Debug, Default)]
pub struct TypeBitsBuilder {
    bytes: Vec<u8>,
    bit_len: usize,
}

impl TypeBitsBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_number(&mut self, ty: NumberType) {
        self.push_bits(ty.code(), NumberType::BITS);
    }

    fn push_bits(&mut self, value: u8, width: u32) {
        for i in 0..width {
            let bit = (value >> i) & 1;
            let offset = self.bit_len % 8;
            if offset == 0 {
                self.bytes.push(0);
            }
            if bit != 0 {
                if let Some(last) = self.bytes.last_mut() {
                    *last |= 1 << offset;
                }
            }
            self.bit_len += 1;
        }
    }

    /// Number of bits recorded so far.
    #[must_use]
    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    /// Finishes the bits. Trailing zero bytes are dropped, and bits that are
    /// all zero collapse to [`TypeBits::Default`].
    #[must_use]
    pub fn finish(mut self) -> TypeBits {
        while self.bytes.last() == Some(&0) {
            self.bytes.pop();
        }
        if self.bytes.is_empty() {
            TypeBits::Default
        } else {
            TypeBits::Explicit(self.bytes)
        }
    }
}

/// Reads type bits back while a key is being decoded.
///
/// Reading past the end yields zero bits, so short or absent type bits mean
/// "default representation" for the remaining values.
#[derive(Debug, Clone)]
pub struct TypeBitsReader<'a> {
    bytes: &'a [u8],
    bit_pos: usize,
}

impl<'a> TypeBitsReader<'a> {
    /// Creates a reader over serialized type bits.
    #[must_use]
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, bit_pos: 0 }
    }

    pub(crate) fn read_number(&mut self) -> NumberType {
        NumberType::from_code(self.read_bits(NumberType::BITS))
    }

    fn read_bits(&mut self, width: u32) -> u8 {
        let mut value = 0u8;
        for i in 0..width {
            let byte = self.bytes.get(self.bit_pos / 8).copied().unwrap_or(0);
            let bit = (byte >> (self.bit_pos % 8)) & 1;
            value |= bit << i;
            self.bit_pos += 1;
        }
        value
    }

    /// Checks that every bit not consumed by the key is zero.
    ///
    /// # Errors
    ///
    /// Returns [`DecodingError::MalformedTypeBits`] if a set bit was left
    /// unread, meaning the type bits describe more values than the key holds.
    pub fn finish(&self) -> DecodingResult<()> {
        let index = self.bit_pos / 8;
        let partial = self
            .bytes
            .get(index)
            .map_or(0, |byte| byte >> (self.bit_pos % 8));
        let rest_zero = self
            .bytes
            .get(index + 1..)
            .map_or(true, |rest| rest.iter().all(|&b| b == 0));
        if partial == 0 && rest_zero {
            Ok(())
        } else {
            Err(DecodingError::malformed_type_bits(format!(
                "set bits beyond the {} bit(s) used by the key",
                self.bit_pos
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_default_collapses_to_default() {
        let mut builder = TypeBitsBuilder::new();
        builder.push_number(NumberType::Int32);
        builder.push_number(NumberType::Int32);
        assert_eq!(builder.bit_len(), 4);
        assert!(builder.finish().is_default());
    }

    #[test]
    fn packs_lsb_first() {
        let mut builder = TypeBitsBuilder::new();
        builder.push_number(NumberType::Int32);
        builder.push_number(NumberType::Double);
        builder.push_number(NumberType::Int64);
        // 00, 01 (double = 0b10 LSB first), 10 (int64 = 0b01) -> 0b0001_1000
        assert_eq!(builder.finish(), TypeBits::Explicit(vec![0b0001_1000]));
    }

    #[test]
    fn trailing_zero_bytes_are_trimmed() {
        let mut builder = TypeBitsBuilder::new();
        builder.push_number(NumberType::Double);
        for _ in 0..8 {
            builder.push_number(NumberType::Int32);
        }
        assert_eq!(builder.finish().to_bytes(), Some(&[0b10][..]));
    }

    #[test]
    fn reader_inverts_builder() {
        let kinds = [
            NumberType::Double,
            NumberType::Int32,
            NumberType::NegativeZero,
            NumberType::Int64,
            NumberType::Double,
        ];
        let mut builder = TypeBitsBuilder::new();
        for ty in kinds {
            builder.push_number(ty);
        }
        let bits = builder.finish();
        let mut reader = bits.reader();
        for ty in kinds {
            assert_eq!(reader.read_number(), ty);
        }
        reader.finish().unwrap();
    }

    #[test]
    fn reading_past_end_yields_default() {
        let bits = TypeBits::Default;
        let mut reader = bits.reader();
        assert_eq!(reader.read_number(), NumberType::Int32);
        assert_eq!(reader.read_number(), NumberType::Int32);
        reader.finish().unwrap();
    }

    #[test]
    fn explicit_zeroes_are_accepted() {
        let bits = TypeBits::from_bytes(vec![0; 5]);
        assert!(!bits.is_default());
        let reader = bits.reader();
        reader.finish().unwrap();
    }

    #[test]
    fn leftover_set_bits_are_malformed() {
        let bits = TypeBits::from_bytes(vec![165, 85, 77, 86, 255]);
        assert!(matches!(
            bits.reader().finish(),
            Err(DecodingError::MalformedTypeBits { .. })
        ));

        let bits = TypeBits::from_bytes(vec![0b0000_0110]);
        let mut reader = bits.reader();
        assert_eq!(reader.read_number(), NumberType::Double);
        assert!(reader.finish().is_err());
    }
}
