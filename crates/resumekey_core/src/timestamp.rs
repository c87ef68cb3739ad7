//! Cluster timestamps.

use std::fmt;

use resumekey_codec::{DecodingResult, KeyDecode, KeyDecoder, KeyEncode, KeyEncoder};
use serde::{Deserialize, Serialize};

/// Logical cluster time: seconds plus an increment that orders events
/// within the same second.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Timestamp {
    /// Seconds component.
    pub secs: u32,
    /// Ordinal within the second.
    pub inc: u32,
}

impl Timestamp {
    /// Encoded size in a key.
    pub const ENCODED_LEN: usize = 8;

    /// Creates a timestamp.
    #[inline]
    #[must_use]
    pub const fn new(secs: u32, inc: u32) -> Self {
        Self { secs, inc }
    }

    /// Packs the timestamp into one integer with the same ordering.
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        ((self.secs as u64) << 32) | self.inc as u64
    }

    /// Unpacks a timestamp produced by [`Timestamp::as_u64`].
    #[must_use]
    pub const fn from_u64(value: u64) -> Self {
        Self {
            secs: (value >> 32) as u32,
            inc: value as u32,
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({}, {})", self.secs, self.inc)
    }
}

impl KeyEncode for Timestamp {
    fn encode_key(&self, encoder: &mut KeyEncoder) {
        encoder.push_bytes(&self.as_u64().to_be_bytes());
    }
}

impl KeyDecode for Timestamp {
    fn decode_key(decoder: &mut KeyDecoder<'_>) -> DecodingResult<Self> {
        let bytes = decoder.read_array::<{ Timestamp::ENCODED_LEN }>()?;
        Ok(Self::from_u64(u64::from_be_bytes(bytes)))
    }
}
