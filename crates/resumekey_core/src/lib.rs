//! # resumekey core
//!
//! Resume tokens for change streams.
//!
//! A [`Token`] records a [`Position`] (cluster time, optional collection
//! UUID, optional document key) as an opaque byte string whose bytewise
//! order is the order of the positions it encodes. Tokens travel as a
//! small document with a `_data` field, either a hex string or generic
//! binary, and an optional `_typeBits` field.
//!
//! This crate provides:
//! - [`Timestamp`] and [`Position`], the decoded contents of a token
//! - [`KeyedPosition`] and [`PositionPart`] for positions over other
//!   document key and identity types
//! - [`Token`] with construction, parsing and decoding
//! - [`TokenParser`] and [`TokenConfig`] for bounded parsing
//! - Errors split by phase: [`StructuralError`] while parsing,
//!   [`DecodingError`] while decoding
//!
//! ## Usage
//!
//! ```
//! use resumekey_core::{Document, Position, SerializationFormat, Timestamp, Token};
//!
//! let position = Position::from_cluster_time(Timestamp::new(1000, 2))
//!     .with_document_key(Document::new().with("_id", 1));
//! let token = Token::new(&position);
//!
//! let serialized = token.to_document(SerializationFormat::HexString);
//! let parsed = Token::parse(&serialized).unwrap();
//! assert_eq!(parsed, token);
//! assert_eq!(parsed.get_data().unwrap(), position);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod parser;
mod position;
mod timestamp;
mod token;

pub use config::TokenConfig;
pub use error::{StructuralError, TokenError, TokenResult};
pub use parser::TokenParser;
pub use position::{KeyedPosition, Position, PositionPart};
pub use timestamp::Timestamp;
pub use token::{SerializationFormat, Token, DATA_FIELD, TYPE_BITS_FIELD};

pub use resumekey_codec::{
    Binary, BinarySubtype, DecodingError, DecodingResult, Document, KeyDecode, KeyDecoder,
    KeyEncode, KeyEncoder, TransportError, TypeBits, Value,
};
pub use uuid::Uuid;
