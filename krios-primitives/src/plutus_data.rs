use crate::KeyValuePairs;
use krios_codec::data::{Int, Tag, Type};
use krios_codec::{decode, encode, Decode, Decoder, Encode, Encoder};
use serde::{Deserialize, Serialize};
use std::{fmt, ops::Deref};

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, PartialOrd, Ord, Clone)]
pub enum PlutusData {
    Constr(Constr<PlutusData>),
    Map(KeyValuePairs<PlutusData, PlutusData>),
    BigInt(BigInt),
    BoundedBytes(BoundedBytes),
    Array(Vec<PlutusData>),
}

impl<'b> Decode<'b> for PlutusData {
    fn decode(d: &mut Decoder<'b>) -> Result<Self, decode::Error> {
        let type_ = d.datatype()?;

        match type_ {
            Type::Tag => {
                let mut probe = d.probe();
                let tag = probe.tag()?;

                if tag == Tag::POS_BIGNUM || tag == Tag::NEG_BIGNUM {
                    Ok(Self::BigInt(d.decode()?))
                } else {
                    match tag.as_u64() {
                        (121..=127) | (1280..=1400) | 102 => Ok(Self::Constr(d.decode()?)),
                        _ => Err(decode::Error::message("unknown tag for plutus data tag")),
                    }
                }
            }
            Type::U8
            | Type::U16
            | Type::U32
            | Type::U64
            | Type::I8
            | Type::I16
            | Type::I32
            | Type::I64
            | Type::Int => Ok(Self::BigInt(d.decode()?)),
            Type::Map | Type::MapIndef => Ok(Self::Map(d.decode()?)),
            Type::Bytes | Type::BytesIndef => Ok(Self::BoundedBytes(d.decode()?)),
            Type::Array | Type::ArrayIndef => Ok(Self::Array(d.decode()?)),

            any => Err(decode::Error::message(format!(
                "bad cbor data type ({any:?}) for plutus data"
            ))),
        }
    }
}

impl Encode for PlutusData {
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>) -> Result<(), encode::Error<W::Error>> {
        match self {
            Self::Constr(a) => {
                e.encode(a)?;
            }
            Self::Map(a) => {
                // we use a definite map to match the approach used by haskell's plutus
                // implementation https://github.com/input-output-hk/plutus/blob/9538fc9829426b2ecb0628d352e2d7af96ec8204/plutus-core/plutus-core/src/PlutusCore/Data.hs#L152
                e.map(a.len() as u64)?;
                for (k, v) in a.iter() {
                    k.encode(e)?;
                    v.encode(e)?;
                }
            }
            Self::BigInt(a) => {
                e.encode(a)?;
            }
            Self::BoundedBytes(a) => {
                e.encode(a)?;
            }
            Self::Array(a) => {
                // we use a definite array for empty arrays and an indef array
                // otherwise to match the haskell implementation
                // https://github.com/input-output-hk/plutus/blob/9538fc9829426b2ecb0628d352e2d7af96ec8204/plutus-core/plutus-core/src/PlutusCore/Data.hs#L153
                encode_list(a, e)?;
            }
        };

        Ok(())
    }
}

/*
big_int = int / big_uint / big_nint
big_uint = #6.2(bounded_bytes)
big_nint = #6.3(bounded_bytes)
 */

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, PartialOrd, Ord, Clone)]
pub enum BigInt {
    Int(Int),
    BigUInt(BoundedBytes),
    BigNInt(BoundedBytes),
}

impl<'b> Decode<'b> for BigInt {
    fn decode(d: &mut Decoder<'b>) -> Result<Self, decode::Error> {
        let datatype = d.datatype()?;

        match datatype {
            Type::U8
            | Type::U16
            | Type::U32
            | Type::U64
            | Type::I8
            | Type::I16
            | Type::I32
            | Type::I64
            | Type::Int => Ok(Self::Int(d.decode()?)),
            Type::Tag => {
                let tag = d.tag()?;
                if tag == Tag::POS_BIGNUM {
                    Ok(Self::BigUInt(d.decode()?))
                } else if tag == Tag::NEG_BIGNUM {
                    Ok(Self::BigNInt(d.decode()?))
                } else {
                    Err(decode::Error::message("invalid cbor tag for big int"))
                }
            }
            _ => Err(decode::Error::message("invalid cbor data type for big int")),
        }
    }
}

impl Encode for BigInt {
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>) -> Result<(), encode::Error<W::Error>> {
        match self {
            BigInt::Int(x) => {
                e.encode(x)?;
            }
            BigInt::BigUInt(x) => {
                e.tag(Tag::POS_BIGNUM)?;
                e.encode(x)?;
            }
            BigInt::BigNInt(x) => {
                e.tag(Tag::NEG_BIGNUM)?;
                e.encode(x)?;
            }
        };

        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, PartialOrd, Ord, Clone)]
pub struct Constr<A> {
    pub tag: u64,
    pub any_constructor: Option<u64>,
    pub fields: Vec<A>,
}

impl<A> Constr<A> {
    /// The constructor alternative this encodes, per the tag mapping of the
    /// plutus core specification.
    pub fn alternative(&self) -> Option<u64> {
        match self.tag {
            121..=127 => Some(self.tag - 121),
            1280..=1400 => Some(self.tag - 1280 + 7),
            102 => self.any_constructor,
            _ => None,
        }
    }

    /// Builds the constr for an arbitrary alternative, picking the compact
    /// tag forms where they exist.
    pub fn from_alternative(alternative: u64, fields: Vec<A>) -> Self {
        match alternative {
            0..=6 => Constr {
                tag: 121 + alternative,
                any_constructor: None,
                fields,
            },
            7..=127 => Constr {
                tag: 1280 + alternative - 7,
                any_constructor: None,
                fields,
            },
            _ => Constr {
                tag: 102,
                any_constructor: Some(alternative),
                fields,
            },
        }
    }
}

impl<'b, A: Decode<'b>> Decode<'b> for Constr<A> {
    fn decode(d: &mut Decoder<'b>) -> Result<Self, decode::Error> {
        let tag = d.tag()?;
        let x = tag.as_u64();
        match x {
            121..=127 | 1280..=1400 => Ok(Constr {
                tag: x,
                fields: d.decode()?,
                any_constructor: None,
            }),
            102 => {
                d.array()?;

                Ok(Constr {
                    tag: x,
                    any_constructor: Some(d.decode()?),
                    fields: d.decode()?,
                })
            }
            _ => Err(decode::Error::message("bad tag code for plutus data")),
        }
    }
}

impl<A: Encode> Encode for Constr<A> {
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>) -> Result<(), encode::Error<W::Error>> {
        e.tag(Tag::new(self.tag))?;

        match self.tag {
            102 => {
                // definite two-element wrapper, general constructor id first
                e.array(2)?;
                e.u64(self.any_constructor.unwrap_or_default())?;

                encode_list(&self.fields, e)?;
                Ok(())
            }
            _ => {
                encode_list(&self.fields, e)?;
                Ok(())
            }
        }
    }
}

/// Plutus data byte strings, encoded the way the canonical plutus
/// implementation does: definite up to 64 bytes, chunked above.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[serde(into = "String")]
#[serde(try_from = "String")]
pub struct BoundedBytes(Vec<u8>);

impl From<Vec<u8>> for BoundedBytes {
    fn from(xs: Vec<u8>) -> Self {
        BoundedBytes(xs)
    }
}

impl From<BoundedBytes> for Vec<u8> {
    fn from(b: BoundedBytes) -> Self {
        b.0
    }
}

impl Deref for BoundedBytes {
    type Target = Vec<u8>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl TryFrom<String> for BoundedBytes {
    type Error = hex::FromHexError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let v = hex::decode(value)?;
        Ok(BoundedBytes(v))
    }
}

impl From<BoundedBytes> for String {
    fn from(b: BoundedBytes) -> Self {
        hex::encode(b.deref())
    }
}

impl fmt::Display for BoundedBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(&self.0))
    }
}

impl Encode for BoundedBytes {
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>) -> Result<(), encode::Error<W::Error>> {
        e.bounded_bytes(&self.0)?.ok()
    }
}

impl<'b> Decode<'b> for BoundedBytes {
    fn decode(d: &mut Decoder<'b>) -> Result<Self, decode::Error> {
        let mut res = Vec::new();
        for chunk in d.bytes_iter()? {
            res.extend_from_slice(chunk?);
        }
        Ok(BoundedBytes::from(res))
    }
}

fn encode_list<W: encode::Write, A: Encode>(
    a: &[A],
    e: &mut Encoder<W>,
) -> Result<(), encode::Error<W::Error>> {
    // Mimics the default haskell list encoding from cborg:
    // indef array for non-empty arrays, definite 0-length array when empty
    if a.is_empty() {
        e.array(0)?;
    } else {
        e.begin_array()?;
        for v in a {
            e.encode(v)?;
        }
        e.end()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use krios_codec::Fragment;

    fn constr(alternative: u64, fields: Vec<PlutusData>) -> PlutusData {
        PlutusData::Constr(Constr::from_alternative(alternative, fields))
    }

    fn int(value: i64) -> PlutusData {
        PlutusData::BigInt(BigInt::Int(value.into()))
    }

    #[test]
    fn constr_tag_mapping() {
        assert_eq!(Constr::<PlutusData>::from_alternative(0, vec![]).tag, 121);
        assert_eq!(Constr::<PlutusData>::from_alternative(6, vec![]).tag, 127);
        assert_eq!(Constr::<PlutusData>::from_alternative(7, vec![]).tag, 1280);
        assert_eq!(
            Constr::<PlutusData>::from_alternative(127, vec![]).tag,
            1400
        );

        let big = Constr::<PlutusData>::from_alternative(200, vec![]);
        assert_eq!(big.tag, 102);
        assert_eq!(big.any_constructor, Some(200));

        for alt in [0, 6, 7, 127, 200] {
            assert_eq!(
                Constr::<PlutusData>::from_alternative(alt, vec![]).alternative(),
                Some(alt)
            );
        }
    }

    #[test]
    fn empty_constr_uses_definite_list() {
        let bytes = constr(0, vec![]).encode_fragment().unwrap();
        assert_eq!(hex::encode(bytes), "d87980");
    }

    #[test]
    fn nonempty_constr_uses_indefinite_list() {
        let bytes = constr(1, vec![int(42)]).encode_fragment().unwrap();
        assert_eq!(hex::encode(bytes), "d87a9f182aff");
    }

    #[test]
    fn alternative_102_wraps_id_and_fields() {
        let bytes = constr(500, vec![int(1)]).encode_fragment().unwrap();
        assert_eq!(hex::encode(bytes), "d866821901f49f01ff");
    }

    #[test]
    fn long_bytes_chunk_and_round_trip() {
        let data = PlutusData::BoundedBytes(vec![0xaa; 100].into());
        let bytes = data.encode_fragment().unwrap();
        assert_eq!(bytes[0], 0x5f);

        let back: PlutusData = krios_codec::decode(&bytes).unwrap();
        assert_eq!(back, data);

        // and the re-encoding is byte-identical
        assert_eq!(back.encode_fragment().unwrap(), bytes);
    }

    #[test]
    fn bignum_round_trips() {
        let data = PlutusData::BigInt(BigInt::BigUInt(
            hex::decode("0102030405060708090a0b0c0d0e0f10").unwrap().into(),
        ));

        let bytes = data.encode_fragment().unwrap();
        let back: PlutusData = krios_codec::decode(&bytes).unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn map_preserves_insertion_order() {
        let data = PlutusData::Map(
            vec![(int(2), int(20)), (int(1), int(10))]
                .into(),
        );

        let bytes = data.encode_fragment().unwrap();
        assert_eq!(hex::encode(&bytes), "a20214010a");

        let back: PlutusData = krios_codec::decode(&bytes).unwrap();
        assert_eq!(back, data);
    }
}
