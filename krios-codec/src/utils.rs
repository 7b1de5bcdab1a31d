//! Round-trip friendly helper structs.
//!
//! Cardano entities frequently reach the chain in encodings that are valid
//! but not canonical (indefinite containers, unsorted map keys). The
//! containers here remember enough about the original encoding to re-emit
//! it byte-for-byte.

use serde::{Deserialize, Serialize};
use std::{fmt, ops::Deref};

use crate::data::{Tag, Type};
use crate::{decode, encode, Decode, Decoder, Encode, Encoder};

/// Ordered pairs of values decoded from a CBOR map.
///
/// The ordering of entries matters for isomorphic decoding / encoding, so a
/// `Vec` backs the storage instead of a `BTreeMap` or `HashMap`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(from = "Vec::<(K, V)>", into = "Vec::<(K, V)>")]
pub enum KeyValuePairs<K, V>
where
    K: Clone,
    V: Clone,
{
    Def(Vec<(K, V)>),
    Indef(Vec<(K, V)>),
}

impl<K, V> KeyValuePairs<K, V>
where
    K: Clone,
    V: Clone,
{
    pub fn to_vec(self) -> Vec<(K, V)> {
        self.into()
    }
}

impl<K: Clone, V: Clone> From<KeyValuePairs<K, V>> for Vec<(K, V)> {
    fn from(other: KeyValuePairs<K, V>) -> Self {
        match other {
            KeyValuePairs::Def(x) => x,
            KeyValuePairs::Indef(x) => x,
        }
    }
}

impl<K: Clone, V: Clone> From<Vec<(K, V)>> for KeyValuePairs<K, V> {
    fn from(other: Vec<(K, V)>) -> Self {
        KeyValuePairs::Def(other)
    }
}

impl<K: Clone, V: Clone> FromIterator<(K, V)> for KeyValuePairs<K, V> {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        KeyValuePairs::Def(iter.into_iter().collect())
    }
}

impl<K: Clone, V: Clone> Default for KeyValuePairs<K, V> {
    fn default() -> Self {
        KeyValuePairs::Def(vec![])
    }
}

impl<K: Clone, V: Clone> Deref for KeyValuePairs<K, V> {
    type Target = Vec<(K, V)>;

    fn deref(&self) -> &Self::Target {
        match self {
            KeyValuePairs::Def(x) => x,
            KeyValuePairs::Indef(x) => x,
        }
    }
}

impl<'b, K, V> Decode<'b> for KeyValuePairs<K, V>
where
    K: Decode<'b> + Clone,
    V: Decode<'b> + Clone,
{
    fn decode(d: &mut Decoder<'b>) -> Result<Self, decode::Error> {
        let datatype = d.datatype()?;

        let items: Result<Vec<_>, _> = d.map_iter::<K, V>()?.collect();
        let items = items?;

        match datatype {
            Type::Map => Ok(KeyValuePairs::Def(items)),
            Type::MapIndef => Ok(KeyValuePairs::Indef(items)),
            _ => Err(decode::Error::message(
                "invalid data type for keyvaluepairs",
            )),
        }
    }
}

impl<K, V> Encode for KeyValuePairs<K, V>
where
    K: Encode + Clone,
    V: Encode + Clone,
{
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>) -> Result<(), encode::Error<W::Error>> {
        match self {
            KeyValuePairs::Def(x) => {
                e.map(x.len() as u64)?;

                for (k, v) in x.iter() {
                    k.encode(e)?;
                    v.encode(e)?;
                }
            }
            KeyValuePairs::Indef(x) => {
                e.begin_map()?;

                for (k, v) in x.iter() {
                    k.encode(e)?;
                    v.encode(e)?;
                }

                e.end()?;
            }
        }

        Ok(())
    }
}

/// Ordered pairs of values guaranteed to hold at least one entry.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(try_from = "Vec::<(K, V)>", into = "Vec::<(K, V)>")]
pub enum NonEmptyKeyValuePairs<K, V>
where
    K: Clone,
    V: Clone,
{
    Def(Vec<(K, V)>),
    Indef(Vec<(K, V)>),
}

impl<K, V> NonEmptyKeyValuePairs<K, V>
where
    K: Clone,
    V: Clone,
{
    pub fn to_vec(self) -> Vec<(K, V)> {
        self.into()
    }

    pub fn from_vec(value: Vec<(K, V)>) -> Option<Self> {
        if value.is_empty() {
            None
        } else {
            Some(NonEmptyKeyValuePairs::Def(value))
        }
    }
}

impl<K: Clone, V: Clone> From<NonEmptyKeyValuePairs<K, V>> for Vec<(K, V)> {
    fn from(other: NonEmptyKeyValuePairs<K, V>) -> Self {
        match other {
            NonEmptyKeyValuePairs::Def(x) => x,
            NonEmptyKeyValuePairs::Indef(x) => x,
        }
    }
}

impl<K: Clone, V: Clone> TryFrom<Vec<(K, V)>> for NonEmptyKeyValuePairs<K, V> {
    type Error = String;

    fn try_from(value: Vec<(K, V)>) -> Result<Self, Self::Error> {
        NonEmptyKeyValuePairs::from_vec(value)
            .ok_or_else(|| "NonEmptyKeyValuePairs must contain at least one element".into())
    }
}

impl<K: Clone, V: Clone> Deref for NonEmptyKeyValuePairs<K, V> {
    type Target = Vec<(K, V)>;

    fn deref(&self) -> &Self::Target {
        match self {
            NonEmptyKeyValuePairs::Def(x) => x,
            NonEmptyKeyValuePairs::Indef(x) => x,
        }
    }
}

impl<'b, K, V> Decode<'b> for NonEmptyKeyValuePairs<K, V>
where
    K: Decode<'b> + Clone,
    V: Decode<'b> + Clone,
{
    fn decode(d: &mut Decoder<'b>) -> Result<Self, decode::Error> {
        let datatype = d.datatype()?;

        let items: Result<Vec<_>, _> = d.map_iter::<K, V>()?.collect();
        let items = items?;

        if items.is_empty() {
            return Err(decode::Error::message(
                "decoding empty map as NonEmptyKeyValuePairs",
            ));
        }

        match datatype {
            Type::Map => Ok(NonEmptyKeyValuePairs::Def(items)),
            Type::MapIndef => Ok(NonEmptyKeyValuePairs::Indef(items)),
            _ => Err(decode::Error::message(
                "invalid data type for nonemptykeyvaluepairs",
            )),
        }
    }
}

impl<K, V> Encode for NonEmptyKeyValuePairs<K, V>
where
    K: Encode + Clone,
    V: Encode + Clone,
{
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>) -> Result<(), encode::Error<W::Error>> {
        match self {
            NonEmptyKeyValuePairs::Def(x) => {
                e.map(x.len() as u64)?;

                for (k, v) in x.iter() {
                    k.encode(e)?;
                    v.encode(e)?;
                }
            }
            NonEmptyKeyValuePairs::Indef(x) => {
                e.begin_map()?;

                for (k, v) in x.iter() {
                    k.encode(e)?;
                    v.encode(e)?;
                }

                e.end()?;
            }
        }

        Ok(())
    }
}

/// An array that remembers whether it was definite or indefinite.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, PartialOrd, Ord, Clone)]
pub enum MaybeIndefArray<A> {
    Def(Vec<A>),
    Indef(Vec<A>),
}

impl<A> MaybeIndefArray<A> {
    pub fn to_vec(self) -> Vec<A> {
        self.into()
    }
}

impl<A> Deref for MaybeIndefArray<A> {
    type Target = Vec<A>;

    fn deref(&self) -> &Self::Target {
        match self {
            MaybeIndefArray::Def(x) => x,
            MaybeIndefArray::Indef(x) => x,
        }
    }
}

impl<A> From<MaybeIndefArray<A>> for Vec<A> {
    fn from(other: MaybeIndefArray<A>) -> Self {
        match other {
            MaybeIndefArray::Def(x) => x,
            MaybeIndefArray::Indef(x) => x,
        }
    }
}

impl<'b, A: Decode<'b>> Decode<'b> for MaybeIndefArray<A> {
    fn decode(d: &mut Decoder<'b>) -> Result<Self, decode::Error> {
        match d.datatype()? {
            Type::Array => Ok(Self::Def(d.decode()?)),
            Type::ArrayIndef => Ok(Self::Indef(d.decode()?)),
            _ => Err(decode::Error::message(
                "unknown data type of maybe indef array",
            )),
        }
    }
}

impl<A: Encode> Encode for MaybeIndefArray<A> {
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>) -> Result<(), encode::Error<W::Error>> {
        match self {
            MaybeIndefArray::Def(x) => {
                e.encode(x)?;
            }
            MaybeIndefArray::Indef(x) => {
                e.begin_array()?;

                for v in x.iter() {
                    e.encode(v)?;
                }

                e.end()?;
            }
        };

        Ok(())
    }
}

/// Order-preserving set of map-encoded attributes.
///
/// There's no guarantee that the entries of a Cardano entity that uses maps
/// for its representation follow the canonical order. To implement an
/// isomorphic codec we keep the entries as an ordered vec of `properties`,
/// each one a cbor-encodable variant of an attribute of the struct.
#[derive(Debug, PartialEq, Eq, Clone, PartialOrd)]
pub struct OrderPreservingProperties<P>(Vec<P>);

impl<P> Deref for OrderPreservingProperties<P> {
    type Target = Vec<P>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<P> From<Vec<P>> for OrderPreservingProperties<P> {
    fn from(value: Vec<P>) -> Self {
        OrderPreservingProperties(value)
    }
}

impl<'b, P: Decode<'b>> Decode<'b> for OrderPreservingProperties<P> {
    fn decode(d: &mut Decoder<'b>) -> Result<Self, decode::Error> {
        let len = d.map()?.unwrap_or_default();

        let components: Result<_, _> = (0..len).map(|_| d.decode()).collect();

        Ok(Self(components?))
    }
}

impl<P: Encode> Encode for OrderPreservingProperties<P> {
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>) -> Result<(), encode::Error<W::Error>> {
        e.map(self.0.len() as u64)?;
        for component in &self.0 {
            e.encode(component)?;
        }

        Ok(())
    }
}

/// Wraps a struct so that it is encoded/decoded as tag 24 embedded CBOR.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, PartialOrd, Hash)]
#[serde(transparent)]
pub struct CborWrap<T>(pub T);

impl<T> CborWrap<T> {
    pub fn unwrap(self) -> T {
        self.0
    }
}

impl<'b, T: Decode<'b>> Decode<'b> for CborWrap<T> {
    fn decode(d: &mut Decoder<'b>) -> Result<Self, decode::Error> {
        let tag = d.tag()?;

        if tag != Tag::ENCODED_CBOR {
            return Err(decode::Error::message("invalid tag for cbor-wrapped value"));
        }

        let cbor = d.bytes()?;
        let wrapped = crate::decode(cbor)?;

        Ok(CborWrap(wrapped))
    }
}

impl<T: Encode> Encode for CborWrap<T> {
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>) -> Result<(), encode::Error<W::Error>> {
        let buf = crate::to_vec(&self.0)
            .map_err(|_| encode::Error::message("error encoding cbor-wrapped structure"))?;

        e.tag(Tag::ENCODED_CBOR)?;
        e.bytes(&buf)?;

        Ok(())
    }
}

impl<T> Deref for CborWrap<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// An empty map, as some CDDL productions require.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmptyMap;

impl<'b> Decode<'b> for EmptyMap {
    fn decode(d: &mut Decoder<'b>) -> Result<Self, decode::Error> {
        d.skip()?;
        Ok(EmptyMap)
    }
}

impl Encode for EmptyMap {
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>) -> Result<(), encode::Error<W::Error>> {
        e.map(0)?;

        Ok(())
    }
}

/// Set
///
/// Optional 258 tag (required in the era after Conway) with a vec of items
/// which should contain no duplicates.
#[derive(Debug, PartialEq, Eq, Clone, PartialOrd, Serialize, Deserialize)]
pub struct Set<T>(Vec<T>);

impl<T> Set<T> {
    pub fn to_vec(self) -> Vec<T> {
        self.0
    }
}

impl<T> Deref for Set<T> {
    type Target = Vec<T>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> From<Vec<T>> for Set<T> {
    fn from(value: Vec<T>) -> Self {
        Set(value)
    }
}

impl<T> Default for Set<T> {
    fn default() -> Self {
        Set(vec![])
    }
}

impl<'a, T> IntoIterator for &'a Set<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<'b, T: Decode<'b>> Decode<'b> for Set<T> {
    fn decode(d: &mut Decoder<'b>) -> Result<Self, decode::Error> {
        // the set tag is optional until the era following Conway
        if d.datatype()? == Type::Tag {
            let found_tag = d.tag()?;

            if found_tag != Tag::SET {
                return Err(decode::Error::message(format!(
                    "unrecognised tag {} for set",
                    found_tag.as_u64()
                )));
            }
        }

        Ok(Self(d.decode()?))
    }
}

impl<T: Encode> Encode for Set<T> {
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>) -> Result<(), encode::Error<W::Error>> {
        e.tag(Tag::SET)?;
        e.encode(&self.0)?;

        Ok(())
    }
}

/// Non-empty Set
///
/// Optional 258 tag (required in the era after Conway) with a vec of items
/// which should contain no duplicates.
#[derive(Debug, PartialEq, Eq, Clone, PartialOrd, Serialize, Deserialize)]
pub struct NonEmptySet<T>(Vec<T>);

impl<T> NonEmptySet<T> {
    pub fn to_vec(self) -> Vec<T> {
        self.0
    }

    pub fn from_vec(value: Vec<T>) -> Option<Self> {
        if value.is_empty() {
            None
        } else {
            Some(NonEmptySet(value))
        }
    }
}

impl<T> Deref for NonEmptySet<T> {
    type Target = Vec<T>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> TryFrom<Vec<T>> for NonEmptySet<T> {
    type Error = Vec<T>;

    fn try_from(value: Vec<T>) -> Result<Self, Self::Error> {
        if value.is_empty() {
            Err(value)
        } else {
            Ok(NonEmptySet(value))
        }
    }
}

impl<'a, T> IntoIterator for &'a NonEmptySet<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<'b, T: Decode<'b>> Decode<'b> for NonEmptySet<T> {
    fn decode(d: &mut Decoder<'b>) -> Result<Self, decode::Error> {
        if d.datatype()? == Type::Tag {
            let found_tag = d.tag()?;

            if found_tag != Tag::SET {
                return Err(decode::Error::message(format!(
                    "unrecognised tag {} for set",
                    found_tag.as_u64()
                )));
            }
        }

        let inner: Vec<T> = d.decode()?;

        if inner.is_empty() {
            return Err(decode::Error::message("decoding empty set as NonEmptySet"));
        }

        Ok(Self(inner))
    }
}

impl<T: Encode> Encode for NonEmptySet<T> {
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>) -> Result<(), encode::Error<W::Error>> {
        e.tag(Tag::SET)?;
        e.encode(&self.0)?;

        Ok(())
    }
}

/// A value that may be CBOR null or undefined on the wire.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(from = "Option::<T>", into = "Option::<T>")]
pub enum Nullable<T>
where
    T: Clone,
{
    Some(T),
    Null,
    Undefined,
}

impl<T: Clone> Nullable<T> {
    pub fn map<F, O>(self, f: F) -> Nullable<O>
    where
        O: Clone,
        F: Fn(T) -> O,
    {
        match self {
            Nullable::Some(x) => Nullable::Some(f(x)),
            Nullable::Null => Nullable::Null,
            Nullable::Undefined => Nullable::Undefined,
        }
    }
}

impl<'b, T> Decode<'b> for Nullable<T>
where
    T: Decode<'b> + Clone,
{
    fn decode(d: &mut Decoder<'b>) -> Result<Self, decode::Error> {
        match d.datatype()? {
            Type::Null => {
                d.null()?;
                Ok(Self::Null)
            }
            Type::Undefined => {
                d.undefined()?;
                Ok(Self::Undefined)
            }
            _ => {
                let x = d.decode()?;
                Ok(Self::Some(x))
            }
        }
    }
}

impl<T> Encode for Nullable<T>
where
    T: Encode + Clone,
{
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>) -> Result<(), encode::Error<W::Error>> {
        match self {
            Nullable::Some(x) => {
                e.encode(x)?;
                Ok(())
            }
            Nullable::Null => {
                e.null()?;
                Ok(())
            }
            Nullable::Undefined => {
                e.undefined()?;
                Ok(())
            }
        }
    }
}

impl<T: Clone> From<Option<T>> for Nullable<T> {
    fn from(x: Option<T>) -> Self {
        match x {
            Some(x) => Nullable::Some(x),
            None => Nullable::Null,
        }
    }
}

impl<T: Clone> From<Nullable<T>> for Option<T> {
    fn from(other: Nullable<T>) -> Self {
        match other {
            Nullable::Some(x) => Some(x),
            _ => None,
        }
    }
}

/// Byte string with hex serde views.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[serde(into = "String")]
#[serde(try_from = "String")]
pub struct Bytes(Vec<u8>);

impl From<Vec<u8>> for Bytes {
    fn from(xs: Vec<u8>) -> Self {
        Bytes(xs)
    }
}

impl From<Bytes> for Vec<u8> {
    fn from(b: Bytes) -> Self {
        b.0
    }
}

impl Deref for Bytes {
    type Target = Vec<u8>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<[u8]> for Bytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl TryFrom<String> for Bytes {
    type Error = hex::FromHexError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let v = hex::decode(value)?;
        Ok(Bytes(v))
    }
}

impl From<Bytes> for String {
    fn from(b: Bytes) -> Self {
        hex::encode(b.deref())
    }
}

impl fmt::Display for Bytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(&self.0))
    }
}

impl Encode for Bytes {
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>) -> Result<(), encode::Error<W::Error>> {
        e.bytes(&self.0)?.ok()
    }
}

impl<'b> Decode<'b> for Bytes {
    fn decode(d: &mut Decoder<'b>) -> Result<Self, decode::Error> {
        Ok(Bytes(d.bytes()?.to_vec()))
    }
}

/// Introduced in Conway
/// positive_coin = 1 .. 18446744073709551615
#[derive(Debug, PartialEq, Copy, Clone, PartialOrd, Eq, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PositiveCoin(u64);

impl TryFrom<u64> for PositiveCoin {
    type Error = u64;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value == 0 {
            return Err(value);
        }

        Ok(Self(value))
    }
}

impl From<PositiveCoin> for u64 {
    fn from(value: PositiveCoin) -> Self {
        value.0
    }
}

impl From<&PositiveCoin> for u64 {
    fn from(value: &PositiveCoin) -> Self {
        value.0
    }
}

impl<'b> Decode<'b> for PositiveCoin {
    fn decode(d: &mut Decoder<'b>) -> Result<Self, decode::Error> {
        let n = d.u64()?;

        if n == 0 {
            return Err(decode::Error::message("decoding 0 as PositiveCoin"));
        }

        Ok(Self(n))
    }
}

impl Encode for PositiveCoin {
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>) -> Result<(), encode::Error<W::Error>> {
        e.u64(self.0)?.ok()
    }
}

/// Introduced in Conway
/// negInt64 = -9223372036854775808 .. -1
/// posInt64 = 1 .. 9223372036854775807
/// nonZeroInt64 = negInt64 / posInt64
#[derive(Debug, PartialEq, Copy, Clone, PartialOrd, Eq, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NonZeroInt(i64);

impl TryFrom<i64> for NonZeroInt {
    type Error = i64;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if value == 0 {
            return Err(value);
        }

        Ok(Self(value))
    }
}

impl From<NonZeroInt> for i64 {
    fn from(value: NonZeroInt) -> Self {
        value.0
    }
}

impl From<&NonZeroInt> for i64 {
    fn from(value: &NonZeroInt) -> Self {
        value.0
    }
}

impl<'b> Decode<'b> for NonZeroInt {
    fn decode(d: &mut Decoder<'b>) -> Result<Self, decode::Error> {
        let n = d.i64()?;

        if n == 0 {
            return Err(decode::Error::message("decoding 0 as NonZeroInt"));
        }

        Ok(Self(n))
    }
}

impl Encode for NonZeroInt {
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>) -> Result<(), encode::Error<W::Error>> {
        e.i64(self.0)?.ok()
    }
}

/// Decodes a struct while preserving the exact bytes it was parsed from.
///
/// Re-encoding emits the original bytes verbatim, which keeps hashes of
/// unusual-but-valid encodings stable.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone)]
pub struct KeepRaw<'b, T> {
    raw: &'b [u8],
    inner: T,
}

impl<'b, T> KeepRaw<'b, T> {
    pub fn raw_cbor(&self) -> &'b [u8] {
        self.raw
    }

    pub fn unwrap(self) -> T {
        self.inner
    }
}

impl<T> Deref for KeepRaw<'_, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<'b, T: Decode<'b>> Decode<'b> for KeepRaw<'b, T> {
    fn decode(d: &mut Decoder<'b>) -> Result<Self, decode::Error> {
        let all = d.input();
        let start = d.position();
        let inner: T = d.decode()?;
        let end = d.position();

        Ok(Self {
            inner,
            raw: &all[start..end],
        })
    }
}

impl<T> Encode for KeepRaw<'_, T> {
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>) -> Result<(), encode::Error<W::Error>> {
        e.preencoded(self.raw_cbor())?.ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Fragment;

    #[test]
    fn keyvaluepairs_roundtrips_both_flavors() {
        // {_ 1: 2} stays indefinite through a round-trip
        let indef = hex::decode("bf0102ff").unwrap();
        let kvs: KeyValuePairs<u64, u64> = crate::decode(&indef).unwrap();
        assert_eq!(kvs.encode_fragment().unwrap(), indef);

        let def = hex::decode("a10102").unwrap();
        let kvs: KeyValuePairs<u64, u64> = crate::decode(&def).unwrap();
        assert_eq!(kvs.encode_fragment().unwrap(), def);
    }

    #[test]
    fn set_tag_is_optional_on_read() {
        let tagged = hex::decode("d9010283010203").unwrap();
        let plain = hex::decode("83010203").unwrap();

        let a: Set<u64> = crate::decode(&tagged).unwrap();
        let b: Set<u64> = crate::decode(&plain).unwrap();
        assert_eq!(a, b);

        // the writer always emits the tag
        assert_eq!(a.encode_fragment().unwrap(), tagged);
    }

    #[test]
    fn nonempty_set_rejects_empty() {
        let empty = hex::decode("d9010280").unwrap();
        let out: Result<NonEmptySet<u64>, _> = crate::decode(&empty);
        assert!(out.is_err());
    }

    #[test]
    fn keep_raw_reemits_original_encoding() {
        // non-canonical: 24 encoded with a two-byte head would be 0x1818;
        // here we keep an indefinite array that a fresh encode would not emit
        let original = hex::decode("9f0102ff").unwrap();
        let keeper: KeepRaw<'_, Vec<u64>> = crate::decode(&original).unwrap();
        assert_eq!(*keeper, vec![1, 2]);
        assert_eq!(keeper.encode_fragment().unwrap(), original);
    }

    #[test]
    fn cbor_wrap_embeds_inner_encoding() {
        let wrapped = CborWrap(42u64);
        let bytes = wrapped.encode_fragment().unwrap();
        assert_eq!(hex::encode(&bytes), "d81842182a");

        let back: CborWrap<u64> = crate::decode(&bytes).unwrap();
        assert_eq!(back, wrapped);
    }
}
