//! # resumekey testkit
//!
//! Test utilities for resumekey.
//!
//! This crate provides:
//! - Property-based test generators using proptest
//! - Fuzz targets for the key decoder and token parser
//! - Known-answer vectors for the token byte layout
//!
//! ## Usage
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use resumekey_testkit::prelude::*;
//!
//! proptest! {
//!     #[test]
//!     fn tokens_roundtrip(position in position_strategy()) {
//!         let token = Token::new(&position);
//!         prop_assert_eq!(token.get_data().unwrap(), position);
//!     }
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fuzz;
pub mod generators;
pub mod vectors;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fuzz::*;
    pub use crate::generators::*;
    pub use crate::vectors::*;
    pub use resumekey_core::{Position, Timestamp, Token, Value};
}

pub use fuzz::*;
pub use generators::*;
pub use vectors::*;
