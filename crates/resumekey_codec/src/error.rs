//! Error types for the codec crate.

use thiserror::Error;

/// Result type for key decoding operations.
pub type DecodingResult<T> = Result<T, DecodingError>;

/// Errors raised while interpreting an encoded key buffer and its type bits.
///
/// These surface lazily: a buffer can be carried around untouched and only
/// fails once somebody asks for the values inside it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodingError {
    /// Fewer bytes remain than the next field requires.
    #[error("truncated buffer: needed {needed} byte(s), {available} available")]
    TruncatedBuffer {
        /// Bytes the field needs.
        needed: usize,
        /// Bytes left in the buffer.
        available: usize,
    },

    /// A type tag byte does not name any known encoding.
    #[error("unknown type tag 0x{tag:02x} at offset {offset}")]
    UnknownTypeTag {
        /// The offending byte.
        tag: u8,
        /// Offset of the byte within the buffer.
        offset: usize,
    },

    /// The type bits do not describe the values in the data buffer.
    #[error("malformed type bits: {reason}")]
    MalformedTypeBits {
        /// What did not line up.
        reason: String,
    },

    /// A value body is structurally impossible.
    #[error("invalid value: {reason}")]
    InvalidValue {
        /// What was wrong with the value.
        reason: String,
    },

    /// The buffer continues after the last field.
    #[error("{remaining} trailing byte(s) after the last field")]
    TrailingBytes {
        /// Number of bytes left unread.
        remaining: usize,
    },
}

impl DecodingError {
    /// Create a malformed type bits error.
    pub fn malformed_type_bits(reason: impl Into<String>) -> Self {
        Self::MalformedTypeBits {
            reason: reason.into(),
        }
    }

    /// Create an invalid value error.
    pub fn invalid_value(reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            reason: reason.into(),
        }
    }
}

/// Errors from carrying documents over the CBOR transport.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The CBOR writer failed.
    #[error("CBOR encoding failed: {message}")]
    EncodingFailed {
        /// Description from the writer.
        message: String,
    },

    /// The bytes are not well-formed CBOR.
    #[error("CBOR decoding failed: {message}")]
    DecodingFailed {
        /// Description from the reader.
        message: String,
    },

    /// Well-formed CBOR that does not map onto a document.
    #[error("unsupported CBOR item: {item}")]
    Unsupported {
        /// Short description of the item.
        item: String,
    },
}

impl TransportError {
    /// Create an unsupported item error.
    pub fn unsupported(item: impl Into<String>) -> Self {
        Self::Unsupported { item: item.into() }
    }
}
