//! Fuzz targets for resume token handling.
//!
//! Each target takes arbitrary bytes and must never panic. They can be
//! driven by cargo-fuzz or by proptest with byte-vector strategies.

use resumekey_codec::{from_key, Binary, Document, TypeBits};
use resumekey_core::{Position, Token, DATA_FIELD, TYPE_BITS_FIELD};

/// Decodes arbitrary bytes as a single key value.
///
/// Whatever decodes must re-encode to the same bytes.
pub fn fuzz_key_decode(data: &[u8]) {
    let type_bits = TypeBits::Default;
    if let Ok(value) = from_key(data, &type_bits) {
        let (bytes, _) = resumekey_codec::to_key(&value);
        assert_eq!(bytes, data, "re-encoding changed the key");
    }
}

/// Decodes arbitrary bytes as a position with arbitrary type bits.
///
/// The first byte picks how many of the following bytes are type bits.
pub fn fuzz_position_decode(data: &[u8]) {
    let Some((&split, rest)) = data.split_first() else {
        return;
    };
    let split = usize::from(split).min(rest.len());
    let (bits, key) = rest.split_at(split);
    let type_bits = TypeBits::from_bytes(bits);

    if let Ok(position) = Position::decode(key, &type_bits) {
        let (bytes, _) = position.encode();
        assert_eq!(bytes, key, "re-encoding changed the position key");
    }
}

/// Runs arbitrary bytes through the whole token path: parse a serialized
/// token built from the input, then decode it.
pub fn fuzz_token_parse(data: &[u8]) {
    let half = data.len() / 2;
    let (key, bits) = data.split_at(half);

    let mut doc = Document::new().with(DATA_FIELD, Binary::generic(key));
    if !bits.is_empty() {
        doc.insert(TYPE_BITS_FIELD, Binary::generic(bits));
    }
    if let Ok(token) = Token::parse(&doc) {
        let _ = token.get_data();
    }

    if let Ok(text) = std::str::from_utf8(data) {
        if let Ok(token) = Token::parse(&Document::new().with(DATA_FIELD, text)) {
            let _ = token.get_data();
        }
    }
}

/// Parses arbitrary bytes as a CBOR-carried token.
pub fn fuzz_token_cbor(data: &[u8]) {
    if let Ok(token) = Token::from_cbor(data) {
        let _ = token.get_data();
    }
}
