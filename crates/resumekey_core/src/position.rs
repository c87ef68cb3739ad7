//! Change stream positions and their key encoding.
//!
//! A position is written into a key in significance order: cluster time,
//! then collection UUID, then document key. Each part is order-preserving
//! and self-delimiting, so comparing two keys bytewise compares positions
//! field by field in that order.

use std::cmp::Ordering;
use std::fmt;

use resumekey_codec::{
    DecodingError, DecodingResult, KeyDecode, KeyDecoder, KeyEncode, KeyEncoder, TypeBits, Value,
};
use uuid::Uuid;

use crate::timestamp::Timestamp;

/// Marker written when the position has no collection UUID.
const UUID_ABSENT: u8 = 0x00;
/// Marker written before a collection UUID.
const UUID_PRESENT: u8 = 0x01;

/// What a position needs from its document key and its collection
/// identity: an order-preserving key encoding plus a comparison that agrees
/// with the encoded bytes.
pub trait PositionPart: KeyEncode + KeyDecode + Clone + PartialEq {
    /// Compares two parts the way their encoded keys compare.
    fn cmp_canonical(&self, other: &Self) -> Ordering;
}

impl PositionPart for Value {
    fn cmp_canonical(&self, other: &Self) -> Ordering {
        Value::cmp_canonical(self, other)
    }
}

impl PositionPart for Uuid {
    fn cmp_canonical(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }
}

/// A change stream position over any document key type `K` and
/// collection identity type `I`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyedPosition<K, I> {
    /// Cluster time of the event.
    pub cluster_time: Timestamp,
    /// Collection the event belongs to, if any.
    pub uuid: Option<I>,
    /// Key of the document the event touched, if any.
    pub document_key: Option<K>,
}

/// Where a change stream is: the decoded contents of a resume token.
pub type Position = KeyedPosition<Value, Uuid>;

impl<K, I> Default for KeyedPosition<K, I> {
    fn default() -> Self {
        Self {
            cluster_time: Timestamp::default(),
            uuid: None,
            document_key: None,
        }
    }
}

impl<K, I> KeyedPosition<K, I> {
    /// Creates a position from all three parts.
    #[must_use]
    pub fn new(cluster_time: Timestamp, uuid: Option<I>, document_key: Option<K>) -> Self {
        Self {
            cluster_time,
            uuid,
            document_key,
        }
    }

    /// Creates a position that carries only a cluster time.
    #[must_use]
    pub fn from_cluster_time(cluster_time: Timestamp) -> Self {
        Self {
            cluster_time,
            ..Self::default()
        }
    }

    /// Sets the collection UUID.
    #[must_use]
    pub fn with_uuid(mut self, uuid: I) -> Self {
        self.uuid = Some(uuid);
        self
    }

    /// Sets the document key.
    #[must_use]
    pub fn with_document_key(mut self, document_key: impl Into<K>) -> Self {
        self.document_key = Some(document_key.into());
        self
    }
}

impl<K: PositionPart, I: PositionPart> KeyedPosition<K, I> {
    /// Compares positions in significance order. Absent parts sort first;
    /// document keys compare by value, not representation.
    #[must_use]
    pub fn cmp_canonical(&self, other: &Self) -> Ordering {
        self.cluster_time
            .cmp(&other.cluster_time)
            .then_with(|| cmp_present(self.uuid.as_ref(), other.uuid.as_ref()))
            .then_with(|| cmp_present(self.document_key.as_ref(), other.document_key.as_ref()))
    }

    /// Encodes the position into key bytes and type bits.
    #[must_use]
    pub fn encode(&self) -> (Vec<u8>, TypeBits) {
        let mut encoder = KeyEncoder::with_capacity(32);
        self.encode_key(&mut encoder);
        encoder.into_parts()
    }

    /// Decodes a position, consuming the key and the type bits exactly.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is truncated, has trailing bytes, carries
    /// an unknown tag, or disagrees with the type bits.
    pub fn decode(data: &[u8], type_bits: &TypeBits) -> DecodingResult<Self> {
        let mut decoder = KeyDecoder::new(data, type_bits);
        let position = Self::decode_key(&mut decoder)?;
        decoder.finish()?;
        Ok(position)
    }
}

fn cmp_present<T: PositionPart>(a: Option<&T>, b: Option<&T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp_canonical(b),
        (a, b) => a.is_some().cmp(&b.is_some()),
    }
}

impl<K: KeyEncode, I: KeyEncode> KeyEncode for KeyedPosition<K, I> {
    fn encode_key(&self, encoder: &mut KeyEncoder) {
        self.cluster_time.encode_key(encoder);
        match &self.uuid {
            Some(uuid) => {
                encoder.push_byte(UUID_PRESENT);
                uuid.encode_key(encoder);
            }
            None => encoder.push_byte(UUID_ABSENT),
        }
        // An absent document key writes nothing, which sorts below any value.
        if let Some(key) = &self.document_key {
            key.encode_key(encoder);
        }
    }
}

impl<K: KeyDecode, I: KeyDecode> KeyDecode for KeyedPosition<K, I> {
    fn decode_key(decoder: &mut KeyDecoder<'_>) -> DecodingResult<Self> {
        let cluster_time = Timestamp::decode_key(decoder)?;
        let offset = decoder.position();
        let uuid = match decoder.read_byte()? {
            UUID_ABSENT => None,
            UUID_PRESENT => Some(I::decode_key(decoder)?),
            tag => return Err(DecodingError::UnknownTypeTag { tag, offset }),
        };
        let document_key = if decoder.is_empty() {
            None
        } else {
            Some(K::decode_key(decoder)?)
        };
        Ok(Self {
            cluster_time,
            uuid,
            document_key,
        })
    }
}

impl<K: fmt::Display, I: fmt::Display> fmt::Display for KeyedPosition<K, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{clusterTime: {}", self.cluster_time)?;
        if let Some(uuid) = &self.uuid {
            write!(f, ", uuid: {uuid}")?;
        }
        if let Some(key) = &self.document_key {
            write!(f, ", documentKey: {key}")?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resumekey_codec::Document;

    fn full() -> Position {
        Position::from_cluster_time(Timestamp::new(1000, 2))
            .with_uuid(Uuid::from_bytes([7; 16]))
            .with_document_key(
                Document::new()
                    .with("_id", "stuff")
                    .with("otherkey", Document::new().with("otherstuff", 2)),
            )
    }

    #[test]
    fn roundtrip_full() {
        let position = full();
        let (data, bits) = position.encode();
        assert_eq!(Position::decode(&data, &bits).unwrap(), position);
    }

    #[test]
    fn roundtrip_timestamp_only() {
        let position = Position::from_cluster_time(Timestamp::new(1001, 3));
        let (data, bits) = position.encode();
        assert_eq!(data, vec![0, 0, 0x03, 0xe9, 0, 0, 0, 3, UUID_ABSENT]);
        assert!(bits.is_default());
        assert_eq!(Position::decode(&data, &bits).unwrap(), position);
    }

    #[test]
    fn roundtrip_key_without_uuid() {
        let position =
            Position::from_cluster_time(Timestamp::new(5, 5)).with_document_key(Value::Null);
        let (data, bits) = position.encode();
        assert_eq!(Position::decode(&data, &bits).unwrap(), position);
    }

    #[test]
    fn byte_order_matches_canonical_order() {
        let ts = Timestamp::new(10, 4);
        let low = Uuid::from_bytes([1; 16]);
        let high = Uuid::from_bytes([2; 16]);
        let ordered = [
            Position::from_cluster_time(ts),
            Position::from_cluster_time(ts).with_document_key(5),
            Position::from_cluster_time(ts).with_uuid(low),
            Position::from_cluster_time(ts)
                .with_uuid(low)
                .with_document_key(Document::new().with("_id", Value::Null)),
            Position::from_cluster_time(ts)
                .with_uuid(low)
                .with_document_key(Document::new().with("_id", 0)),
            Position::from_cluster_time(ts)
                .with_uuid(high)
                .with_document_key(Document::new().with("_id", -1)),
            Position::from_cluster_time(Timestamp::new(10, 5)),
        ];
        for pair in ordered.windows(2) {
            assert_eq!(pair[0].cmp_canonical(&pair[1]), Ordering::Less);
            assert!(pair[0].encode().0 < pair[1].encode().0, "{} !< {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn rejects_short_and_unknown() {
        let bits = TypeBits::Default;
        assert!(matches!(
            Position::decode(&[], &bits),
            Err(DecodingError::TruncatedBuffer { needed: 8, available: 0 })
        ));
        assert!(matches!(
            Position::decode(&[0; 5], &bits),
            Err(DecodingError::TruncatedBuffer { .. })
        ));
        assert!(matches!(
            Position::decode(&[0; 8], &bits),
            Err(DecodingError::TruncatedBuffer { .. })
        ));
        assert_eq!(
            Position::decode(&[0, 0, 0, 0, 0, 0, 0, 0, 0x07], &bits).unwrap_err(),
            DecodingError::UnknownTypeTag { tag: 0x07, offset: 8 }
        );
        assert!(matches!(
            Position::decode(&[0, 0, 0, 0, 0, 0, 0, 0, UUID_PRESENT, 1, 2], &bits),
            Err(DecodingError::TruncatedBuffer { needed: 16, available: 2 })
        ));
    }

    #[test]
    fn rejects_trailing_bytes() {
        let (mut data, bits) = full().encode();
        data.push(0x0a);
        assert!(matches!(
            Position::decode(&data, &bits),
            Err(DecodingError::TrailingBytes { remaining: 1 })
        ));
    }

    /// A sequence number that orders by its big-endian bytes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct Seq(u64);

    impl KeyEncode for Seq {
        fn encode_key(&self, encoder: &mut KeyEncoder) {
            encoder.push_bytes(&self.0.to_be_bytes());
        }
    }

    impl KeyDecode for Seq {
        fn decode_key(decoder: &mut KeyDecoder<'_>) -> DecodingResult<Self> {
            decoder.read_array::<8>().map(|b| Seq(u64::from_be_bytes(b)))
        }
    }

    impl PositionPart for Seq {
        fn cmp_canonical(&self, other: &Self) -> Ordering {
            self.0.cmp(&other.0)
        }
    }

    #[test]
    fn custom_parts_roundtrip_and_order() {
        let ts = Timestamp::new(7, 1);
        let low: KeyedPosition<Seq, Seq> = KeyedPosition::from_cluster_time(ts)
            .with_uuid(Seq(1))
            .with_document_key(Seq(300));
        let high = low.clone().with_document_key(Seq(301));

        let (data, bits) = low.encode();
        assert_eq!(data.len(), Timestamp::ENCODED_LEN + 1 + 8 + 8);
        assert!(bits.is_default());
        assert_eq!(KeyedPosition::<Seq, Seq>::decode(&data, &bits).unwrap(), low);

        assert_eq!(low.cmp_canonical(&high), Ordering::Less);
        assert!(low.encode().0 < high.encode().0);
    }

    #[test]
    fn display() {
        let position = Position::from_cluster_time(Timestamp::new(1, 2)).with_document_key(3);
        assert_eq!(
            position.to_string(),
            "{clusterTime: Timestamp(1, 2), documentKey: 3}"
        );
    }
}
