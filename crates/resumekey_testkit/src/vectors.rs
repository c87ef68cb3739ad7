//! Known-answer vectors for the token byte layout.
//!
//! The hex strings here are what other implementations must produce for
//! the same positions. They double as a regression guard on the layout.

use resumekey_codec::{Binary, Document, Value};
use resumekey_core::{Position, Timestamp, Uuid};
use serde::{Deserialize, Serialize};

/// A serialized token and what it should decode to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestVector {
    /// Unique identifier for this vector.
    pub id: String,
    /// Human-readable description.
    pub description: String,
    /// `_data` as lowercase hex.
    pub data_hex: String,
    /// `_typeBits` as lowercase hex, when present.
    pub type_bits_hex: Option<String>,
    /// Kind of error expected from parsing or decoding, if any.
    pub expected_error: Option<String>,
}

impl TestVector {
    fn ok(id: &str, description: &str, data_hex: &str, type_bits_hex: Option<&str>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            data_hex: data_hex.into(),
            type_bits_hex: type_bits_hex.map(Into::into),
            expected_error: None,
        }
    }

    fn err(
        id: &str,
        description: &str,
        data_hex: &str,
        type_bits_hex: Option<&str>,
        error: &str,
    ) -> Self {
        Self {
            expected_error: Some(error.into()),
            ..Self::ok(id, description, data_hex, type_bits_hex)
        }
    }
}

const TS_1000_2: &str = "000003e800000002";

fn at_1000_2() -> Position {
    Position::from_cluster_time(Timestamp::new(1000, 2))
}

fn keyed(id: impl Into<Value>) -> Position {
    at_1000_2().with_document_key(Document::new().with("_id", id))
}

/// Positions paired with the vectors they must encode to.
pub fn position_vectors() -> Vec<(Position, TestVector)> {
    let no_uuid = format!("{TS_1000_2}00");
    let id_prefix = format!("{no_uuid}32055f696400");

    vec![
        (
            at_1000_2(),
            TestVector::ok("ts_only", "cluster time only", &no_uuid, None),
        ),
        (
            at_1000_2().with_uuid(Uuid::from_bytes([0x11; 16])),
            TestVector::ok(
                "ts_uuid",
                "cluster time and collection uuid",
                &format!("{TS_1000_2}01{}", "11".repeat(16)),
                None,
            ),
        ),
        (
            keyed(1),
            TestVector::ok(
                "id_int",
                "document key {_id: 1}, default representation",
                &format!("{id_prefix}18044c000000000000000004"),
                None,
            ),
        ),
        (
            keyed(1.0),
            TestVector::ok(
                "id_double",
                "document key {_id: 1.0} records a double",
                &format!("{id_prefix}18044c000000000000000004"),
                Some("02"),
            ),
        ),
        (
            keyed(Value::Int64(1)),
            TestVector::ok(
                "id_long",
                "document key {_id: NumberLong(1)} records a long",
                &format!("{id_prefix}18044c000000000000000004"),
                Some("01"),
            ),
        ),
        (
            keyed(-0.0),
            TestVector::ok(
                "id_negative_zero",
                "negative zero shares the zero key",
                &format!("{id_prefix}1704"),
                Some("03"),
            ),
        ),
        (
            keyed(-1),
            TestVector::ok(
                "id_negative",
                "negative magnitudes are complemented",
                &format!("{id_prefix}16fbb3ffffffffffffffff04"),
                None,
            ),
        ),
        (
            keyed(1.5),
            TestVector::ok(
                "id_fraction",
                "fraction bits follow the exponent",
                &format!("{id_prefix}18044c800000000000000004"),
                Some("02"),
            ),
        ),
        (
            keyed("a\0b"),
            TestVector::ok(
                "id_string_nul",
                "embedded NUL is escaped",
                &format!("{id_prefix}286100ff620004"),
                None,
            ),
        ),
        (
            keyed(Value::Null),
            TestVector::ok("id_null", "null key", &format!("{id_prefix}0a04"), None),
        ),
        (
            keyed(Binary::generic(vec![0xab])),
            TestVector::ok(
                "id_binary",
                "binary is length, subtype, payload",
                &format!("{id_prefix}46010100ab04"),
                None,
            ),
        ),
        (
            keyed(vec![Value::Bool(true), Value::Double(2.0)]),
            TestVector::ok(
                "id_array",
                "array of bool and double; type bits hold one double",
                &format!("{id_prefix}3c6518044d00000000000000000404"),
                Some("02"),
            ),
        ),
    ]
}

/// Serialized tokens that must be rejected, with the error kind.
pub fn corrupt_vectors() -> Vec<TestVector> {
    vec![
        TestVector::err("empty", "empty _data", "", None, "TruncatedBuffer"),
        TestVector::err("zeros", "five zero bytes", "0000000000", None, "TruncatedBuffer"),
        TestVector::err(
            "nonsense",
            "random bytes",
            "a5554d56ff",
            None,
            "TruncatedBuffer",
        ),
        TestVector::err(
            "bad_uuid_marker",
            "uuid marker other than 0 or 1",
            &format!("{TS_1000_2}07"),
            None,
            "UnknownTypeTag",
        ),
        TestVector::err(
            "trailing",
            "bytes after a complete position",
            &format!("{TS_1000_2}000a0a"),
            None,
            "TrailingBytes",
        ),
        TestVector::err(
            "leftover_type_bits",
            "type bits with no numbers to describe",
            &format!("{TS_1000_2}00"),
            Some("a5554d56ff"),
            "MalformedTypeBits",
        ),
        TestVector::err(
            "int32_overflow",
            "default representation cannot hold 2^40",
            &format!("{TS_1000_2}001804740000000000000000"),
            None,
            "MalformedTypeBits",
        ),
    ]
}

/// Generate all test vectors as JSON for cross-language use.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn all_vectors_json() -> serde_json::Result<String> {
    let vectors = AllTestVectors {
        positions: position_vectors().into_iter().map(|(_, v)| v).collect(),
        corrupt: corrupt_vectors(),
    };
    serde_json::to_string_pretty(&vectors)
}

#[derive(Debug, Serialize, Deserialize)]
struct AllTestVectors {
    positions: Vec<TestVector>,
    corrupt: Vec<TestVector>,
}
