//! Resume tokens.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use resumekey_codec::{Binary, DecodingResult, Document, TypeBits, Value};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::TokenConfig;
use crate::error::{StructuralError, TokenResult};
use crate::parser::TokenParser;
use crate::position::{KeyedPosition, Position, PositionPart};

/// Name of the field holding the encoded position.
pub const DATA_FIELD: &str = "_data";
/// Name of the field holding non-default type bits.
pub const TYPE_BITS_FIELD: &str = "_typeBits";

/// How `_data` is written when a token is serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SerializationFormat {
    /// Lowercase hex string. Sorts correctly as a plain string.
    #[default]
    HexString,
    /// Generic binary.
    BinData,
}

/// An opaque, comparable resume token.
///
/// Tokens compare and hash by their encoded position only. Two positions
/// whose document keys hold the same values in different numeric
/// representations therefore produce equal tokens, even though the type
/// bits differ and the decoded positions are not identical.
#[derive(Clone)]
pub struct Token {
    data: Vec<u8>,
    type_bits: TypeBits,
}

impl Token {
    /// Encodes a position into a token.
    #[must_use]
    pub fn new<K: PositionPart, I: PositionPart>(position: &KeyedPosition<K, I>) -> Self {
        let (data, type_bits) = position.encode();
        trace!(
            data_len = data.len(),
            has_type_bits = !type_bits.is_default(),
            "encoded resume token"
        );
        Self { data, type_bits }
    }

    /// Assembles a token from buffers that have not been decoded.
    pub(crate) fn from_parts(data: Vec<u8>, type_bits: TypeBits) -> Self {
        Self { data, type_bits }
    }

    /// Parses a serialized token with the default configuration.
    ///
    /// Only the shape is checked here; the payload is decoded by
    /// [`Token::get_data`].
    ///
    /// # Errors
    ///
    /// Returns a [`StructuralError`] if the document does not have the shape
    /// of a serialized token.
    pub fn parse(doc: &Document) -> Result<Self, StructuralError> {
        TokenParser::default().parse(doc)
    }

    /// Decodes the position held by this token.
    ///
    /// # Errors
    ///
    /// Returns a decoding error if the buffers are corrupt. Tokens built
    /// with [`Token::new`] always decode.
    pub fn get_data(&self) -> DecodingResult<Position> {
        self.get_data_as()
    }

    /// Decodes the position held by this token into custom key and identity
    /// types.
    ///
    /// # Errors
    ///
    /// Returns a decoding error if the buffers do not hold a position with
    /// parts of these types.
    pub fn get_data_as<K: PositionPart, I: PositionPart>(
        &self,
    ) -> DecodingResult<KeyedPosition<K, I>> {
        KeyedPosition::decode(&self.data, &self.type_bits).inspect_err(|e| {
            debug!(error = %e, token = %self, "failed to decode resume token");
        })
    }

    /// Serializes the token. `_typeBits` is written only when the token
    /// carries explicit type bits.
    #[must_use]
    pub fn to_document(&self, format: SerializationFormat) -> Document {
        let data = match format {
            SerializationFormat::HexString => Value::String(self.to_hex()),
            SerializationFormat::BinData => Value::Binary(Binary::generic(self.data.clone())),
        };
        let mut doc = Document::new().with(DATA_FIELD, data);
        if let Some(bits) = self.type_bits.to_bytes() {
            doc.insert(TYPE_BITS_FIELD, Binary::generic(bits));
        }
        doc
    }

    /// Serializes the token in the configured format.
    #[must_use]
    pub fn to_configured_document(&self, config: &TokenConfig) -> Document {
        self.to_document(config.format)
    }

    /// Serializes the token and encodes the document as CBOR.
    ///
    /// # Errors
    ///
    /// Returns an error if the CBOR writer fails.
    pub fn to_cbor(&self, format: SerializationFormat) -> TokenResult<Vec<u8>> {
        Ok(self.to_document(format).to_cbor()?)
    }

    /// Parses a token from a CBOR-encoded serialized form.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a CBOR map or the map does not
    /// have the shape of a serialized token.
    pub fn from_cbor(bytes: &[u8]) -> TokenResult<Self> {
        let doc = Document::from_cbor(bytes)?;
        Ok(Self::parse(&doc)?)
    }

    /// The encoded position.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// The type bits travelling with the encoded position.
    #[must_use]
    pub fn type_bits(&self) -> &TypeBits {
        &self.type_bits
    }

    /// The encoded position as lowercase hex.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(&self.data)
    }
}

impl From<&Position> for Token {
    fn from(position: &Position) -> Self {
        Self::new(position)
    }
}

impl From<Position> for Token {
    fn from(position: Position) -> Self {
        Self::new(&position)
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl Eq for Token {}

impl PartialOrd for Token {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Token {
    fn cmp(&self, other: &Self) -> Ordering {
        self.data.cmp(&other.data)
    }
}

impl Hash for Token {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.data.hash(state);
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("Token");
        out.field("data", &self.to_hex());
        if let Some(bits) = self.type_bits.to_bytes() {
            out.field("type_bits", &hex::encode(bits));
        }
        out.finish()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
