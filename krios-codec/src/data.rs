use serde::{Deserialize, Serialize};
use std::fmt;

/// The state of the next item in a CBOR stream, as reported by
/// [`crate::Decoder::datatype`] before the item is consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Type {
    Bool,
    Null,
    Undefined,
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    /// Negative integer below `i64::MIN`, only representable as [`Int`]
    Int,
    F16,
    F32,
    F64,
    Simple,
    Bytes,
    BytesIndef,
    String,
    StringIndef,
    Array,
    ArrayIndef,
    Map,
    MapIndef,
    Tag,
    Break,
    Unknown(u8),
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// A CBOR tag (major type 6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tag(u64);

impl Tag {
    /// Tag 2, positive bignum with byte-string magnitude
    pub const POS_BIGNUM: Tag = Tag(2);

    /// Tag 3, negative bignum with byte-string magnitude
    pub const NEG_BIGNUM: Tag = Tag(3);

    /// Tag 24, byte string holding embedded CBOR
    pub const ENCODED_CBOR: Tag = Tag(24);

    /// Tag 30, rational number as a numerator/denominator pair
    pub const RATIONAL: Tag = Tag(30);

    /// Tag 258, the set tag required from Conway onwards
    pub const SET: Tag = Tag(258);

    pub const fn new(value: u64) -> Self {
        Tag(value)
    }

    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl From<u64> for Tag {
    fn from(value: u64) -> Self {
        Tag(value)
    }
}

/// A CBOR integer covering the full wire range of major types 0 and 1,
/// `-2^64 .. 2^64 - 1`. Values outside `i64`/`u64` still round-trip.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct Int(i128);

/// Minimum value representable as a CBOR major type 1 integer.
pub const INT_MIN: i128 = -(1i128 << 64);

/// Maximum value representable as a CBOR major type 0 integer.
pub const INT_MAX: i128 = (1i128 << 64) - 1;

#[derive(Debug, thiserror::Error)]
#[error("value out of range for a CBOR integer")]
pub struct TryFromIntError;

impl Int {
    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }
}

impl From<u8> for Int {
    fn from(value: u8) -> Self {
        Int(value as i128)
    }
}

impl From<u32> for Int {
    fn from(value: u32) -> Self {
        Int(value as i128)
    }
}

impl From<u64> for Int {
    fn from(value: u64) -> Self {
        Int(value as i128)
    }
}

impl From<i32> for Int {
    fn from(value: i32) -> Self {
        Int(value as i128)
    }
}

impl From<i64> for Int {
    fn from(value: i64) -> Self {
        Int(value as i128)
    }
}

impl TryFrom<i128> for Int {
    type Error = TryFromIntError;

    fn try_from(value: i128) -> Result<Self, Self::Error> {
        if (INT_MIN..=INT_MAX).contains(&value) {
            Ok(Int(value))
        } else {
            Err(TryFromIntError)
        }
    }
}

impl From<Int> for i128 {
    fn from(value: Int) -> Self {
        value.0
    }
}

impl TryFrom<Int> for u64 {
    type Error = TryFromIntError;

    fn try_from(value: Int) -> Result<Self, Self::Error> {
        u64::try_from(value.0).map_err(|_| TryFromIntError)
    }
}

impl TryFrom<Int> for i64 {
    type Error = TryFromIntError;

    fn try_from(value: Int) -> Result<Self, Self::Error> {
        i64::try_from(value.0).map_err(|_| TryFromIntError)
    }
}

impl fmt::Display for Int {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
