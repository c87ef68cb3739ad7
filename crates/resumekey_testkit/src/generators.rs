//! Property-based test generators using proptest.
//!
//! Strategies here only produce values in canonical form, so exact
//! equality after a round trip is the expected outcome.

use proptest::prelude::*;
use resumekey_codec::{Binary, BinarySubtype, Document, Value};
use resumekey_core::{Position, Timestamp};
use uuid::Uuid;

/// Doubles biased towards the interesting corners of the number line.
pub fn double_strategy() -> impl Strategy<Value = f64> {
    prop_oneof![
        4 => any::<f64>(),
        1 => prop::sample::select(vec![
            0.0,
            -0.0,
            f64::NAN,
            f64::INFINITY,
            f64::NEG_INFINITY,
            f64::MIN_POSITIVE,
            -f64::MIN_POSITIVE,
            f64::from_bits(1),
            f64::MAX,
            f64::MIN,
            0.1,
        ]),
        2 => any::<i32>().prop_map(f64::from),
    ]
}

/// Numbers in every representation.
pub fn number_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i32>().prop_map(Value::Int32),
        any::<i64>().prop_map(Value::Int64),
        prop::sample::select(vec![i64::MIN, i64::MAX, -(1 << 53) - 1, 1 << 53])
            .prop_map(Value::Int64),
        double_strategy().prop_map(Value::Double),
    ]
}

/// Short strings that sometimes contain NUL bytes.
pub fn string_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![4 => prop::char::range('a', 'e'), 1 => Just('\0'), 1 => any::<char>()],
        0..6,
    )
    .prop_map(String::from_iter)
}

/// Field names for generated documents.
pub fn field_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z_]{1,3}").expect("valid regex")
}

/// Binary payloads with canonical subtypes.
pub fn binary_strategy() -> impl Strategy<Value = Binary> {
    (
        prop_oneof![3 => Just(0u8), 1 => any::<u8>()],
        prop::collection::vec(any::<u8>(), 0..12),
    )
        .prop_map(|(subtype, bytes)| Binary::new(BinarySubtype::from_byte(subtype), bytes))
}

/// Scalar values of every kind.
pub fn leaf_value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        number_strategy(),
        string_strategy().prop_map(Value::String),
        binary_strategy().prop_map(Value::Binary),
    ]
}

/// Values including nested documents and arrays.
pub fn value_strategy() -> impl Strategy<Value = Value> {
    leaf_value_strategy().prop_recursive(3, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::vec((field_name_strategy(), inner), 0..4)
                .prop_map(|fields| Value::Document(fields.into_iter().collect())),
        ]
    })
}

/// Document keys as a change stream would produce them.
pub fn document_key_strategy() -> impl Strategy<Value = Value> {
    (value_strategy(), prop::collection::vec((field_name_strategy(), value_strategy()), 0..2))
        .prop_map(|(id, rest)| {
            let mut doc = Document::new().with("_id", id);
            for (name, value) in rest {
                if name != "_id" {
                    doc.insert(name, value);
                }
            }
            Value::Document(doc)
        })
}

/// Cluster timestamps, with a bias towards collisions.
pub fn timestamp_strategy() -> impl Strategy<Value = Timestamp> {
    prop_oneof![
        (any::<u32>(), any::<u32>()),
        (0u32..4, 0u32..4),
    ]
    .prop_map(|(secs, inc)| Timestamp::new(secs, inc))
}

/// Collection UUIDs.
pub fn uuid_strategy() -> impl Strategy<Value = Uuid> {
    prop_oneof![
        prop::array::uniform16(any::<u8>()),
        prop::array::uniform16(0u8..2),
    ]
    .prop_map(Uuid::from_bytes)
}

/// Positions with every combination of optional parts.
pub fn position_strategy() -> impl Strategy<Value = Position> {
    (
        timestamp_strategy(),
        prop::option::of(uuid_strategy()),
        prop::option::of(prop_oneof![3 => document_key_strategy(), 1 => value_strategy()]),
    )
        .prop_map(|(cluster_time, uuid, document_key)| {
            Position::new(cluster_time, uuid, document_key)
        })
}

/// Configuration for property-based tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Creates a configuration for thorough tests.
    #[must_use]
    pub fn thorough() -> Self {
        Self {
            cases: 1024,
            max_shrink_iters: 10000,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}
