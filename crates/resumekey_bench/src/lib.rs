//! Benchmark fixtures.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use resumekey_core::{Document, Position, Timestamp, Uuid, Value};

/// A document key shaped like those of sharded collections.
pub fn document_key(id: i64) -> Value {
    Value::Document(
        Document::new()
            .with("region", "eu-west")
            .with("tenant", Value::Int64(id / 16))
            .with("_id", Value::Int64(id)),
    )
}

/// A document key nested `depth` levels deep, `width` fields per level.
pub fn nested_key(depth: usize, width: usize) -> Value {
    if depth == 0 {
        Value::Double(0.5)
    } else {
        Value::Document(
            (0..width)
                .map(|i| (format!("k{i}"), nested_key(depth - 1, width)))
                .collect(),
        )
    }
}

/// A position with every part present.
pub fn full_position(id: i64) -> Position {
    Position::from_cluster_time(Timestamp::new(1_700_000_000, 7))
        .with_uuid(Uuid::new_v4())
        .with_document_key(document_key(id))
}

/// Positions with increasing cluster times, as a change stream emits them.
pub fn position_batch(count: usize) -> Vec<Position> {
    let uuid = Uuid::new_v4();
    (0..count)
        .map(|i| {
            let i = u32::try_from(i).unwrap_or(u32::MAX);
            Position::from_cluster_time(Timestamp::new(1_700_000_000 + i / 8, i % 8))
                .with_uuid(uuid)
                .with_document_key(document_key(i64::from(i)))
        })
        .collect()
}
