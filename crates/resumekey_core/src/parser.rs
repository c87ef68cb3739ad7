//! Structural validation of serialized tokens.
//!
//! Parsing checks field presence and types and turns hex into bytes. It
//! never looks inside the payload: a token with well-formed fields and
//! garbage bytes parses fine and fails later in
//! [`Token::get_data`](crate::Token::get_data).

use resumekey_codec::{Document, TypeBits, Value};
use tracing::debug;

use crate::config::TokenConfig;
use crate::error::StructuralError;
use crate::token::{Token, DATA_FIELD, TYPE_BITS_FIELD};

/// Parses serialized tokens under a configuration.
#[derive(Debug, Clone, Default)]
pub struct TokenParser {
    config: TokenConfig,
}

/// `_data` after its type has been checked but before hex is decoded.
enum RawData<'a> {
    Hex(&'a str),
    Bytes(&'a [u8]),
}

impl TokenParser {
    /// Creates a parser with the given configuration.
    #[must_use]
    pub fn new(config: TokenConfig) -> Self {
        Self { config }
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &TokenConfig {
        &self.config
    }

    /// Validates the shape of a serialized token and builds the token.
    ///
    /// Either format is accepted; which one was used is inferred from the
    /// type of `_data`. An absent `_typeBits` means default type bits.
    ///
    /// # Errors
    ///
    /// Returns a [`StructuralError`] naming the first problem found.
    pub fn parse(&self, doc: &Document) -> Result<Token, StructuralError> {
        self.parse_fields(doc).inspect_err(|e| {
            debug!(error = %e, "rejected serialized resume token");
        })
    }

    fn parse_fields(&self, doc: &Document) -> Result<Token, StructuralError> {
        let raw = doc
            .get(DATA_FIELD)
            .ok_or(StructuralError::MissingDataField)
            .and_then(check_data)?;

        let type_bits = match doc.get(TYPE_BITS_FIELD) {
            None => TypeBits::Default,
            Some(Value::Binary(bin)) if bin.is_generic() => {
                self.check_len(TYPE_BITS_FIELD, bin.bytes.len(), self.config.max_type_bits_len)?;
                TypeBits::from_bytes(bin.bytes.as_slice())
            }
            Some(other) => {
                return Err(StructuralError::InvalidTypeBitsFieldType {
                    found: describe(other),
                })
            }
        };

        let data = match raw {
            RawData::Hex(s) => {
                self.check_len(DATA_FIELD, s.len() / 2, self.config.max_data_len)?;
                hex::decode(s).map_err(|e| StructuralError::InvalidHexEncoding {
                    reason: e.to_string(),
                })?
            }
            RawData::Bytes(bytes) => {
                self.check_len(DATA_FIELD, bytes.len(), self.config.max_data_len)?;
                bytes.to_vec()
            }
        };

        Ok(Token::from_parts(data, type_bits))
    }

    fn check_len(&self, field: &'static str, len: usize, max: usize) -> Result<(), StructuralError> {
        if len > max {
            return Err(StructuralError::FieldTooLarge { field, len, max });
        }
        Ok(())
    }
}

fn check_data(value: &Value) -> Result<RawData<'_>, StructuralError> {
    match value {
        Value::String(s) if s.len() % 2 == 0 => Ok(RawData::Hex(s)),
        Value::String(s) => Err(StructuralError::InvalidDataFieldType {
            found: format!("string of odd length {}", s.len()),
        }),
        Value::Binary(bin) if bin.is_generic() => Ok(RawData::Bytes(&bin.bytes)),
        other => Err(StructuralError::InvalidDataFieldType {
            found: describe(other),
        }),
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::Binary(bin) => format!("binData subtype {}", bin.subtype.to_byte()),
        other => other.type_name().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Position;
    use crate::timestamp::Timestamp;
    use crate::token::SerializationFormat;
    use resumekey_codec::{Binary, BinarySubtype};

    fn good_bytes() -> Vec<u8> {
        Token::new(&Position::from_cluster_time(Timestamp::new(1010, 4)))
            .as_bytes()
            .to_vec()
    }

    #[test]
    fn missing_data() {
        assert_eq!(
            Token::parse(&Document::new()).unwrap_err(),
            StructuralError::MissingDataField
        );
        assert_eq!(
            Token::parse(&Document::new().with("somefield", "stuff")).unwrap_err(),
            StructuralError::MissingDataField
        );
    }

    #[test]
    fn wrong_data_types() {
        for value in [Value::Null, Value::Int32(0), Value::Bool(true), Value::Double(1.0)] {
            let err = Token::parse(&Document::new().with(DATA_FIELD, value)).unwrap_err();
            assert!(matches!(err, StructuralError::InvalidDataFieldType { .. }));
        }

        let uuid_bin = Binary::new(BinarySubtype::Uuid, good_bytes());
        let err = Token::parse(&Document::new().with(DATA_FIELD, uuid_bin)).unwrap_err();
        assert_eq!(
            err,
            StructuralError::InvalidDataFieldType {
                found: "binData subtype 4".into()
            }
        );
    }

    #[test]
    fn odd_length_hex_is_a_type_error() {
        let err = Token::parse(&Document::new().with(DATA_FIELD, "00000")).unwrap_err();
        assert!(matches!(err, StructuralError::InvalidDataFieldType { .. }));
    }

    #[test]
    fn non_hex_characters() {
        let err = Token::parse(&Document::new().with(DATA_FIELD, "nonsense")).unwrap_err();
        assert!(matches!(err, StructuralError::InvalidHexEncoding { .. }));
    }

    #[test]
    fn wrong_type_bits_types() {
        let hex = hex::encode(good_bytes());
        let docs = [
            Document::new()
                .with(DATA_FIELD, Binary::generic(good_bytes()))
                .with(TYPE_BITS_FIELD, "string"),
            Document::new()
                .with(DATA_FIELD, hex.as_str())
                .with(TYPE_BITS_FIELD, "string"),
            Document::new()
                .with(DATA_FIELD, Binary::generic(good_bytes()))
                .with(TYPE_BITS_FIELD, Binary::new(BinarySubtype::Uuid, vec![])),
        ];
        for doc in docs {
            let err = Token::parse(&doc).unwrap_err();
            assert!(
                matches!(err, StructuralError::InvalidTypeBitsFieldType { .. }),
                "{err}"
            );
        }
    }

    #[test]
    fn type_bits_checked_before_hex_is_decoded() {
        let doc = Document::new()
            .with(DATA_FIELD, "zz")
            .with(TYPE_BITS_FIELD, Value::Int32(1));
        assert!(matches!(
            Token::parse(&doc).unwrap_err(),
            StructuralError::InvalidTypeBitsFieldType { .. }
        ));
    }

    #[test]
    fn both_formats_give_the_same_token() {
        let token = Token::new(&Position::from_cluster_time(Timestamp::new(3, 4)));
        let from_hex = Token::parse(&token.to_document(SerializationFormat::HexString)).unwrap();
        let from_bin = Token::parse(&token.to_document(SerializationFormat::BinData)).unwrap();
        assert_eq!(from_hex, token);
        assert_eq!(from_bin, token);
    }

    #[test]
    fn uppercase_hex_is_accepted() {
        let token = Token::new(&Position::from_cluster_time(Timestamp::new(0xab, 0xcd)));
        let upper = token.to_hex().to_uppercase();
        let parsed = Token::parse(&Document::new().with(DATA_FIELD, upper)).unwrap();
        assert_eq!(parsed, token);
    }

    #[test]
    fn explicit_type_bits_are_kept() {
        let doc = Document::new()
            .with(DATA_FIELD, Binary::generic(good_bytes()))
            .with(TYPE_BITS_FIELD, Binary::generic(vec![0; 5]));
        let token = Token::parse(&doc).unwrap();
        assert_eq!(token.type_bits(), &TypeBits::Explicit(vec![0; 5]));
        assert_eq!(token.to_document(SerializationFormat::BinData), doc);
    }

    #[test]
    fn size_limits() {
        let parser = TokenParser::new(TokenConfig::new().max_data_len(4).max_type_bits_len(1));
        assert_eq!(parser.config().max_data_len, 4);

        let err = parser
            .parse(&Document::new().with(DATA_FIELD, "0011223344"))
            .unwrap_err();
        assert_eq!(
            err,
            StructuralError::FieldTooLarge {
                field: DATA_FIELD,
                len: 5,
                max: 4
            }
        );

        let err = parser
            .parse(
                &Document::new()
                    .with(DATA_FIELD, Binary::generic(vec![0; 4]))
                    .with(TYPE_BITS_FIELD, Binary::generic(vec![0; 2])),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            StructuralError::FieldTooLarge { field: TYPE_BITS_FIELD, .. }
        ));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn any_bytes_parse_in_both_formats(
                data in prop::collection::vec(any::<u8>(), 0..64),
                bits in prop::collection::vec(any::<u8>(), 0..4),
            ) {
                let doc = Document::new()
                    .with(DATA_FIELD, Binary::generic(data.clone()))
                    .with(TYPE_BITS_FIELD, Binary::generic(bits.clone()));
                let token = TokenParser::default().parse(&doc).unwrap();
                prop_assert_eq!(token.as_bytes(), data.as_slice());
                prop_assert_eq!(token.type_bits().to_bytes(), Some(bits.as_slice()));
                prop_assert_eq!(token.to_document(SerializationFormat::BinData), doc);

                let hex_doc = token.to_document(SerializationFormat::HexString);
                let reparsed = TokenParser::default().parse(&hex_doc).unwrap();
                prop_assert_eq!(&reparsed, &token);
                prop_assert_eq!(reparsed.type_bits(), token.type_bits());
            }

            #[test]
            fn only_hex_strings_parse(text in "[0-9a-fA-Fxz]{0,12}") {
                let doc = Document::new().with(DATA_FIELD, text.as_str());
                match TokenParser::default().parse(&doc) {
                    Ok(token) => prop_assert_eq!(token.to_hex(), text.to_ascii_lowercase()),
                    Err(StructuralError::InvalidDataFieldType { .. }) => {
                        prop_assert!(text.len() % 2 == 1);
                    }
                    Err(StructuralError::InvalidHexEncoding { .. }) => {
                        prop_assert!(text.contains(['x', 'z']));
                    }
                    Err(other) => prop_assert!(false, "unexpected error {}", other),
                }
            }
        }
    }
}
