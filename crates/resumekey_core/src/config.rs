//! Token handling configuration.

use serde::{Deserialize, Serialize};

use crate::token::SerializationFormat;

/// Configuration for serializing and parsing resume tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
    /// Format used by [`Token::to_configured_document`](crate::Token::to_configured_document).
    pub format: SerializationFormat,

    /// Largest `_data` payload the parser accepts, in decoded bytes.
    pub max_data_len: usize,

    /// Largest `_typeBits` payload the parser accepts.
    pub max_type_bits_len: usize,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            format: SerializationFormat::HexString,
            max_data_len: 16 * 1024 * 1024,      // 16 MB
            max_type_bits_len: 16 * 1024 * 1024, // 16 MB
        }
    }
}

impl TokenConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the serialization format.
    #[must_use]
    pub const fn format(mut self, format: SerializationFormat) -> Self {
        self.format = format;
        self
    }

    /// Sets the maximum `_data` size.
    #[must_use]
    pub const fn max_data_len(mut self, len: usize) -> Self {
        self.max_data_len = len;
        self
    }

    /// Sets the maximum `_typeBits` size.
    #[must_use]
    pub const fn max_type_bits_len(mut self, len: usize) -> Self {
        self.max_type_bits_len = len;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = TokenConfig::default();
        assert_eq!(config.format, SerializationFormat::HexString);
        assert_eq!(config.max_data_len, 16 * 1024 * 1024);
    }

    #[test]
    fn builder_pattern() {
        let config = TokenConfig::new()
            .format(SerializationFormat::BinData)
            .max_data_len(64)
            .max_type_bits_len(8);

        assert_eq!(config.format, SerializationFormat::BinData);
        assert_eq!(config.max_data_len, 64);
        assert_eq!(config.max_type_bits_len, 8);
    }

    #[test]
    fn json_roundtrip() {
        let config = TokenConfig::new()
            .format(SerializationFormat::BinData)
            .max_data_len(1024);
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"BinData\""));

        let back: TokenConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn json_missing_fields_take_defaults() {
        let config: TokenConfig = serde_json::from_str(r#"{"max_data_len": 64}"#).unwrap();
        assert_eq!(config.max_data_len, 64);
        assert_eq!(config.format, SerializationFormat::HexString);
        assert_eq!(config.max_type_bits_len, TokenConfig::default().max_type_bits_len);
    }
}
