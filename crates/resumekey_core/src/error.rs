//! Error types for resume tokens.

use resumekey_codec::{DecodingError, TransportError};
use thiserror::Error;

/// Result type for operations that may fail at any stage.
pub type TokenResult<T> = Result<T, TokenError>;

/// A serialized token whose shape is wrong.
///
/// Raised by the parser before any [`Token`](crate::Token) exists.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuralError {
    /// The `_data` field is absent.
    #[error("resume token is missing the _data field")]
    MissingDataField,

    /// `_data` is neither an even-length hex string nor generic binary.
    #[error("resume token _data must be a hex string or generic binData, found {found}")]
    InvalidDataFieldType {
        /// What was found instead.
        found: String,
    },

    /// `_typeBits` is present but not generic binary.
    #[error("resume token _typeBits must be generic binData, found {found}")]
    InvalidTypeBitsFieldType {
        /// What was found instead.
        found: String,
    },

    /// `_data` is a string but not valid hex.
    #[error("resume token _data is not valid hex: {reason}")]
    InvalidHexEncoding {
        /// Description from the hex decoder.
        reason: String,
    },

    /// A field exceeds the configured size limit.
    #[error("resume token {field} is {len} bytes, limit is {max}")]
    FieldTooLarge {
        /// Field name.
        field: &'static str,
        /// Decoded size of the field.
        len: usize,
        /// Configured limit.
        max: usize,
    },
}

/// Any failure while handling a resume token.
#[derive(Debug, Error)]
pub enum TokenError {
    /// The serialized form has the wrong shape.
    #[error("invalid resume token: {0}")]
    Structural(#[from] StructuralError),

    /// The token's payload could not be decoded.
    #[error("corrupt resume token: {0}")]
    Decoding(#[from] DecodingError),

    /// The serialized form could not be carried as bytes.
    #[error("resume token transport: {0}")]
    Transport(#[from] TransportError),
}

impl TokenError {
    /// Whether the failure was detected before a token existed.
    #[must_use]
    pub fn is_structural(&self) -> bool {
        matches!(self, TokenError::Structural(_))
    }
}
