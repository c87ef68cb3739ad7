//! Semi-structured value type used for document keys.

use std::cmp::Ordering;
use std::fmt;

use crate::number::{self, NumberKey};

/// Subtype byte carried by a binary value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinarySubtype {
    /// Generic binary data (0x00).
    Generic,
    /// Function (0x01).
    Function,
    /// UUID (0x04).
    Uuid,
    /// MD5 digest (0x05).
    Md5,
    /// Application-defined subtype (0x80..=0xff).
    UserDefined(u8),
    /// Any other subtype byte.
    Other(u8),
}

impl BinarySubtype {
    /// Returns the subtype byte.
    #[must_use]
    pub const fn to_byte(self) -> u8 {
        match self {
            BinarySubtype::Generic => 0x00,
            BinarySubtype::Function => 0x01,
            BinarySubtype::Uuid => 0x04,
            BinarySubtype::Md5 => 0x05,
            BinarySubtype::UserDefined(b) | BinarySubtype::Other(b) => b,
        }
    }

    /// Interprets a subtype byte.
    #[must_use]
    pub const fn from_byte(byte: u8) -> Self {
        match byte {
            0x00 => BinarySubtype::Generic,
            0x01 => BinarySubtype::Function,
            0x04 => BinarySubtype::Uuid,
            0x05 => BinarySubtype::Md5,
            0x80..=0xff => BinarySubtype::UserDefined(byte),
            _ => BinarySubtype::Other(byte),
        }
    }
}

/// Binary payload with its subtype.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Binary {
    /// Subtype of the payload.
    pub subtype: BinarySubtype,
    /// Raw bytes.
    pub bytes: Vec<u8>,
}

impl Binary {
    /// Creates a binary value with an explicit subtype.
    pub fn new(subtype: BinarySubtype, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            subtype,
            bytes: bytes.into(),
        }
    }

    /// Creates a binary value of the generic subtype.
    pub fn generic(bytes: impl Into<Vec<u8>>) -> Self {
        Self::new(BinarySubtype::Generic, bytes)
    }

    /// Whether this is generic binary data.
    #[must_use]
    pub fn is_generic(&self) -> bool {
        self.subtype == BinarySubtype::Generic
    }
}

/// An ordered list of named fields.
///
/// Field order is significant: it is preserved by the encoding and takes
/// part in comparisons.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    fields: Vec<(String, Value)>,
}

impl Document {
    /// Creates an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a field and returns the document, for chained construction.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Sets a field, replacing an existing field of the same name in place.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Looks up a field by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Whether a field of this name exists.
    #[must_use]
    pub fn contains_key(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Iterates over the fields in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the document has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Compares two documents field by field: name first, then value.
    #[must_use]
    pub fn cmp_canonical(&self, other: &Self) -> Ordering {
        for ((an, av), (bn, bv)) in self.fields.iter().zip(other.fields.iter()) {
            let ord = an
                .as_bytes()
                .cmp(bn.as_bytes())
                .then_with(|| av.cmp_canonical(bv));
            if ord != Ordering::Equal {
                return ord;
            }
        }
        self.fields.len().cmp(&other.fields.len())
    }

    /// Pushes a field without checking for duplicates.
    pub(crate) fn push_unchecked(&mut self, name: String, value: Value) {
        self.fields.push((name, value));
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Document {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut doc = Document::new();
        for (k, v) in iter {
            doc.insert(k, v);
        }
        doc
    }
}

impl IntoIterator for Document {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

/// A semi-structured value.
///
/// Equality is exact: `Int32(1)` and `Double(1.0)` are different values,
/// as are `0.0` and `-0.0`; NaN equals NaN. Ordering by value rather than
/// by representation is available through [`Value::cmp_canonical`].
#[derive(Debug, Clone)]
pub enum Value {
    /// Null.
    Null,
    /// 32-bit signed integer.
    Int32(i32),
    /// 64-bit signed integer.
    Int64(i64),
    /// IEEE 754 double.
    Double(f64),
    /// UTF-8 string.
    String(String),
    /// Embedded document.
    Document(Document),
    /// Array of values.
    Array(Vec<Value>),
    /// Binary data.
    Binary(Binary),
    /// Boolean.
    Bool(bool),
}

/// Sort rank of each value kind. Lower ranks sort first.
///
/// | kind     | rank |
/// |----------|------|
/// | null     | 0    |
/// | number   | 1    |
/// | string   | 2    |
/// | document | 3    |
/// | array    | 4    |
/// | binary   | 5    |
/// | bool     | 6    |
///
/// All numeric representations share one rank and compare by value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum KindRank {
    /// Null.
    Null = 0,
    /// Int32, Int64 and Double.
    Number = 1,
    /// String.
    String = 2,
    /// Document.
    Document = 3,
    /// Array.
    Array = 4,
    /// Binary.
    Binary = 5,
    /// Bool.
    Bool = 6,
}

impl Value {
    /// Returns the sort rank of this value's kind.
    #[must_use]
    pub fn kind_rank(&self) -> KindRank {
        match self {
            Value::Null => KindRank::Null,
            Value::Int32(_) | Value::Int64(_) | Value::Double(_) => KindRank::Number,
            Value::String(_) => KindRank::String,
            Value::Document(_) => KindRank::Document,
            Value::Array(_) => KindRank::Array,
            Value::Binary(_) => KindRank::Binary,
            Value::Bool(_) => KindRank::Bool,
        }
    }

    /// Compares two values by value, ignoring numeric representation.
    ///
    /// This is the order the key encoding reproduces bytewise.
    #[must_use]
    pub fn cmp_canonical(&self, other: &Self) -> Ordering {
        let rank = self.kind_rank().cmp(&other.kind_rank());
        if rank != Ordering::Equal {
            return rank;
        }
        match (self, other) {
            (Value::String(a), Value::String(b)) => a.as_bytes().cmp(b.as_bytes()),
            (Value::Document(a), Value::Document(b)) => a.cmp_canonical(b),
            (Value::Array(a), Value::Array(b)) => {
                for (av, bv) in a.iter().zip(b.iter()) {
                    let ord = av.cmp_canonical(bv);
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                a.len().cmp(&b.len())
            }
            (Value::Binary(a), Value::Binary(b)) => a
                .bytes
                .len()
                .cmp(&b.bytes.len())
                .then_with(|| a.subtype.to_byte().cmp(&b.subtype.to_byte()))
                .then_with(|| a.bytes.cmp(&b.bytes)),
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            _ => match (self.number_key(), other.number_key()) {
                (Some(a), Some(b)) => a.cmp(&b),
                // Both null.
                _ => Ordering::Equal,
            },
        }
    }

    fn number_key(&self) -> Option<NumberKey> {
        number::split(self).map(|(key, _)| key)
    }

    /// Short name of this value's type, for error messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Int32(_) => "int",
            Value::Int64(_) => "long",
            Value::Double(_) => "double",
            Value::String(_) => "string",
            Value::Document(_) => "object",
            Value::Array(_) => "array",
            Value::Binary(_) => "binData",
            Value::Bool(_) => "bool",
        }
    }

    /// Whether this value is null.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Whether this value is one of the numeric representations.
    #[must_use]
    pub fn is_number(&self) -> bool {
        self.kind_rank() == KindRank::Number
    }

    /// Get this value as a boolean, if it is one.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get this value as an `i64`, if it is an integer of either width.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int32(n) => Some(i64::from(*n)),
            Value::Int64(n) => Some(*n),
            _ => None,
        }
    }

    /// Get this value as an `f64`, if it is a double.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(x) => Some(*x),
            _ => None,
        }
    }

    /// Get this value as a string slice, if it is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get this value as a document, if it is one.
    #[must_use]
    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Value::Document(d) => Some(d),
            _ => None,
        }
    }

    /// Get this value as an array, if it is one.
    #[must_use]
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Get this value as binary data, if it is.
    #[must_use]
    pub fn as_binary(&self) -> Option<&Binary> {
        match self {
            Value::Binary(b) => Some(b),
            _ => None,
        }
    }

    /// Look up a field, if this value is a document.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.as_document().and_then(|d| d.get(name))
    }
}

fn same_double(a: f64, b: f64) -> bool {
    (a.is_nan() && b.is_nan()) || a.to_bits() == b.to_bits()
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Int32(a), Value::Int32(b)) => a == b,
            (Value::Int64(a), Value::Int64(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => same_double(*a, *b),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Document(a), Value::Document(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Binary(a), Value::Binary(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Int32(n) => write!(f, "{n}"),
            Value::Int64(n) => write!(f, "NumberLong({n})"),
            Value::Double(x) => write!(f, "{x:?}"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Document(d) => {
                write!(f, "{{")?;
                for (i, (name, value)) in d.iter().enumerate() {
                    let sep = if i == 0 { " " } else { ", " };
                    write!(f, "{sep}{name}: {value}")?;
                }
                if d.is_empty() {
                    write!(f, "}}")
                } else {
                    write!(f, " }}")
                }
            }
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Binary(b) => {
                write!(f, "BinData({}, ", b.subtype.to_byte())?;
                for byte in &b.bytes {
                    write!(f, "{byte:02x}")?;
                }
                write!(f, ")")
            }
            Value::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int32(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int64(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Double(x)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<Document> for Value {
    fn from(d: Document) -> Self {
        Value::Document(d)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<Binary> for Value {
    fn from(b: Binary) -> Self {
        Value::Binary(b)
    }
}

impl From<()> for Value {
    fn from((): ()) -> Self {
        Value::Null
    }
}
