//! Exact, order-preserving keys for numeric values.
//!
//! Every `i64` and every finite `f64` is a dyadic rational, so both can be
//! written as `±2^exponent * 1.fraction` without loss. Comparing
//! `(exponent, fraction)` then compares magnitudes exactly, regardless of
//! which representation the number came from.

use std::cmp::Reverse;

use crate::error::{DecodingError, DecodingResult};
use crate::value::Value;

/// Added to the binary exponent so it always encodes as a positive `u16`.
const EXPONENT_BIAS: i32 = 1100;
/// Exponent of the smallest positive subnormal double.
const MIN_EXPONENT: i32 = -1074;
/// Exponent of the largest finite double.
const MAX_EXPONENT: i32 = 1023;

const F64_MANTISSA_BITS: u32 = 52;
const F64_MANTISSA_MASK: u64 = (1 << F64_MANTISSA_BITS) - 1;
const F64_EXPONENT_BIAS: i32 = 1023;

/// Size of an encoded magnitude: 2 exponent bytes and 8 fraction bytes.
pub(crate) const MAGNITUDE_LEN: usize = 10;

/// Absolute value of a non-zero finite number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct Magnitude {
    /// Position of the leading one bit.
    exponent: i32,
    /// Bits after the leading one, left-aligned.
    fraction: u64,
}

impl Magnitude {
    /// `m` must be non-zero.
    fn from_u64(m: u64) -> Self {
        let exponent = 63 - m.leading_zeros();
        #[allow(clippy::cast_possible_truncation)]
        let fraction = (u128::from(m) << (64 - exponent)) as u64;
        Self {
            exponent: exponent as i32,
            fraction,
        }
    }

    /// `x` must be positive, finite and non-zero.
    fn from_f64(x: f64) -> Self {
        let bits = x.to_bits();
        let biased = ((bits >> F64_MANTISSA_BITS) & 0x7ff) as i32;
        let mantissa = bits & F64_MANTISSA_MASK;
        if biased == 0 {
            // Subnormal: the leading one sits somewhere inside the mantissa.
            let lead = 63 - mantissa.leading_zeros();
            #[allow(clippy::cast_possible_truncation)]
            let fraction = (u128::from(mantissa) << (64 - lead)) as u64;
            Self {
                exponent: lead as i32 + MIN_EXPONENT,
                fraction,
            }
        } else {
            Self {
                exponent: biased - F64_EXPONENT_BIAS,
                fraction: mantissa << (64 - F64_MANTISSA_BITS),
            }
        }
    }

    /// The magnitude as an integer, if it is one and fits in 64 bits.
    fn to_u64(self) -> Option<u64> {
        if !(0..=63).contains(&self.exponent) {
            return None;
        }
        let shift = self.exponent as u32;
        #[allow(clippy::cast_possible_truncation)]
        let dropped = (u128::from(self.fraction) << shift) as u64;
        if dropped != 0 {
            return None;
        }
        let full = (1u128 << 64) | u128::from(self.fraction);
        u64::try_from(full >> (64 - shift)).ok()
    }

    /// The magnitude as a double, if no bits would be lost.
    fn to_f64(self) -> Option<f64> {
        if self.exponent > MAX_EXPONENT || self.exponent < MIN_EXPONENT {
            return None;
        }
        if self.exponent >= 1 - F64_EXPONENT_BIAS {
            if self.fraction & ((1 << (64 - F64_MANTISSA_BITS)) - 1) != 0 {
                return None;
            }
            let biased = (self.exponent + F64_EXPONENT_BIAS) as u64;
            let bits = (biased << F64_MANTISSA_BITS) | (self.fraction >> (64 - F64_MANTISSA_BITS));
            return Some(f64::from_bits(bits));
        }
        let lead = (self.exponent - MIN_EXPONENT) as u32;
        #[allow(clippy::cast_possible_truncation)]
        let dropped = (u128::from(self.fraction) << lead) as u64;
        if dropped != 0 {
            return None;
        }
        let full = (1u128 << 64) | u128::from(self.fraction);
        #[allow(clippy::cast_possible_truncation)]
        let mantissa = (full >> (64 - lead)) as u64;
        Some(f64::from_bits(mantissa))
    }

    pub(crate) fn to_bytes(self) -> [u8; MAGNITUDE_LEN] {
        let mut out = [0u8; MAGNITUDE_LEN];
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let exponent = (self.exponent + EXPONENT_BIAS) as u16;
        out[..2].copy_from_slice(&exponent.to_be_bytes());
        out[2..].copy_from_slice(&self.fraction.to_be_bytes());
        out
    }

    pub(crate) fn from_bytes(bytes: [u8; MAGNITUDE_LEN]) -> DecodingResult<Self> {
        let exponent = i32::from(u16::from_be_bytes([bytes[0], bytes[1]])) - EXPONENT_BIAS;
        if !(MIN_EXPONENT..=MAX_EXPONENT).contains(&exponent) {
            return Err(DecodingError::invalid_value(format!(
                "binary exponent {exponent} out of range"
            )));
        }
        let mut fraction = [0u8; 8];
        fraction.copy_from_slice(&bytes[2..]);
        Ok(Self {
            exponent,
            fraction: u64::from_be_bytes(fraction),
        })
    }
}

/// Position of a number on the shared numeric line.
///
/// The derived ordering is the numeric ordering, with NaN below everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum NumberKey {
    NaN,
    NegativeInfinity,
    Negative(Reverse<Magnitude>),
    Zero,
    Positive(Magnitude),
    PositiveInfinity,
}

impl NumberKey {
    pub(crate) fn from_i64(n: i64) -> Self {
        match n.cmp(&0) {
            std::cmp::Ordering::Less => {
                NumberKey::Negative(Reverse(Magnitude::from_u64(n.unsigned_abs())))
            }
            std::cmp::Ordering::Equal => NumberKey::Zero,
            std::cmp::Ordering::Greater => {
                NumberKey::Positive(Magnitude::from_u64(n.unsigned_abs()))
            }
        }
    }

    pub(crate) fn from_f64(x: f64) -> Self {
        if x.is_nan() {
            NumberKey::NaN
        } else if x == 0.0 {
            NumberKey::Zero
        } else if x == f64::INFINITY {
            NumberKey::PositiveInfinity
        } else if x == f64::NEG_INFINITY {
            NumberKey::NegativeInfinity
        } else if x > 0.0 {
            NumberKey::Positive(Magnitude::from_f64(x))
        } else {
            NumberKey::Negative(Reverse(Magnitude::from_f64(-x)))
        }
    }

    fn to_i64(self) -> Option<i64> {
        match self {
            NumberKey::Zero => Some(0),
            NumberKey::Positive(m) => i64::try_from(m.to_u64()?).ok(),
            NumberKey::Negative(Reverse(m)) => i64::try_from(-i128::from(m.to_u64()?)).ok(),
            _ => None,
        }
    }

    fn to_f64(self) -> Option<f64> {
        match self {
            NumberKey::NaN => Some(f64::NAN),
            NumberKey::NegativeInfinity => Some(f64::NEG_INFINITY),
            NumberKey::Negative(Reverse(m)) => m.to_f64().map(|x| -x),
            NumberKey::Zero => Some(0.0),
            NumberKey::Positive(m) => m.to_f64(),
            NumberKey::PositiveInfinity => Some(f64::INFINITY),
        }
    }
}

/// Representation a number had before it was folded onto the numeric line.
///
/// Stored in the type bits as a two-bit code; `Int32` is code zero, so
/// ordinary 32-bit integers record nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NumberType {
    Int32 = 0,
    Int64 = 1,
    Double = 2,
    NegativeZero = 3,
}

impl NumberType {
    pub(crate) const BITS: u32 = 2;

    pub(crate) fn code(self) -> u8 {
        self as u8
    }

    pub(crate) fn from_code(code: u8) -> Self {
        match code & 0b11 {
            0 => NumberType::Int32,
            1 => NumberType::Int64,
            2 => NumberType::Double,
            _ => NumberType::NegativeZero,
        }
    }
}

/// Splits a numeric value into its ordering key and its representation.
pub(crate) fn split(value: &Value) -> Option<(NumberKey, NumberType)> {
    match value {
        Value::Int32(n) => Some((NumberKey::from_i64(i64::from(*n)), NumberType::Int32)),
        Value::Int64(n) => Some((NumberKey::from_i64(*n), NumberType::Int64)),
        Value::Double(x) if *x == 0.0 && x.is_sign_negative() => {
            Some((NumberKey::Zero, NumberType::NegativeZero))
        }
        Value::Double(x) => Some((NumberKey::from_f64(*x), NumberType::Double)),
        _ => None,
    }
}

/// Rebuilds the exact value from its ordering key and recorded representation.
pub(crate) fn rebuild(key: NumberKey, ty: NumberType) -> DecodingResult<Value> {
    let value = match ty {
        NumberType::Int32 => key
            .to_i64()
            .and_then(|n| i32::try_from(n).ok())
            .map(Value::Int32),
        NumberType::Int64 => key.to_i64().map(Value::Int64),
        NumberType::Double => key.to_f64().map(Value::Double),
        NumberType::NegativeZero => (key == NumberKey::Zero).then_some(Value::Double(-0.0)),
    };
    value.ok_or_else(|| {
        DecodingError::malformed_type_bits(format!("{key:?} cannot be represented as {ty:?}"))
    })
}
