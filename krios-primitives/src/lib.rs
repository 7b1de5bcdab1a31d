//! Ledger primitives and cbor codec for the Conway era
//!
//! Handcrafted, idiomatic rust artifacts based on the
//! [Conway CDDL](https://github.com/IntersectMBO/cardano-ledger/blob/master/eras/conway/impl/cddl-files/conway.cddl)
//! file in the IntersectMBO repo.

mod crypto;
mod plutus_data;

pub mod conway;

pub use crypto::*;
pub use plutus_data::*;

pub use krios_codec::data::Int;
pub use krios_codec::utils::{
    Bytes, CborWrap, KeepRaw, KeyValuePairs, MaybeIndefArray, NonEmptyKeyValuePairs, NonEmptySet,
    NonZeroInt, Nullable, PositiveCoin, Set,
};
pub use krios_codec::Fragment;
pub use krios_crypto::hash::Hash;

use krios_codec::data::{Tag, Type};
use krios_codec::{decode, encode, Decode, Decoder, Encode, Encoder};
use serde::{Deserialize, Serialize};

// ----- Common type definitions

pub type AddrKeyhash = Hash<28>;

pub type AssetName = Bytes;

pub type Coin = u64;

pub type CostModel = Vec<i64>;

pub type DatumHash = Hash<32>;

pub type DnsName = String;

pub type Epoch = u64;

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy)]
pub struct ExUnits {
    pub mem: u64,
    pub steps: u64,
}

impl Encode for ExUnits {
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>) -> Result<(), encode::Error<W::Error>> {
        e.array(2)?;
        e.u64(self.mem)?;
        e.u64(self.steps)?;
        Ok(())
    }
}

impl<'b> Decode<'b> for ExUnits {
    fn decode(d: &mut Decoder<'b>) -> Result<Self, decode::Error> {
        d.array()?;
        Ok(ExUnits {
            mem: d.u64()?,
            steps: d.u64()?,
        })
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub struct ExUnitPrices {
    pub mem_price: PositiveInterval,
    pub step_price: PositiveInterval,
}

impl Encode for ExUnitPrices {
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>) -> Result<(), encode::Error<W::Error>> {
        e.array(2)?;
        e.encode(&self.mem_price)?;
        e.encode(&self.step_price)?;
        Ok(())
    }
}

impl<'b> Decode<'b> for ExUnitPrices {
    fn decode(d: &mut Decoder<'b>) -> Result<Self, decode::Error> {
        d.array()?;
        Ok(ExUnitPrices {
            mem_price: d.decode()?,
            step_price: d.decode()?,
        })
    }
}

pub type Genesishash = Bytes;

pub type IPv4 = Bytes;

pub type IPv6 = Bytes;

pub type Metadata = KeyValuePairs<MetadatumLabel, Metadatum>;

/// The value type of transaction metadata.
///
/// Unlike Plutus data, metadatum integers are bounded to 64 bits and byte /
/// text strings longer than 64 bytes are chunked into indefinite-length
/// sequences. Map keys are metadatum themselves, as the ledger requires.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, PartialOrd, Ord, Clone)]
pub enum Metadatum {
    Int(Int),
    Bytes(Bytes),
    Text(String),
    Array(Vec<Metadatum>),
    Map(KeyValuePairs<Metadatum, Metadatum>),
}

impl<'b> Decode<'b> for Metadatum {
    fn decode(d: &mut Decoder<'b>) -> Result<Self, decode::Error> {
        match d.datatype()? {
            Type::U8
            | Type::U16
            | Type::U32
            | Type::U64
            | Type::I8
            | Type::I16
            | Type::I32
            | Type::I64 => Ok(Metadatum::Int(Int::from(d.i64()?))),
            Type::Int => Err(decode::Error::IntegerOutOfRange),
            Type::Bytes | Type::BytesIndef => {
                let mut full = Vec::new();
                for chunk in d.bytes_iter()? {
                    full.extend_from_slice(chunk?);
                }
                Ok(Metadatum::Bytes(full.into()))
            }
            Type::String | Type::StringIndef => {
                let mut full = String::new();
                for chunk in d.str_iter()? {
                    full.push_str(chunk?);
                }
                Ok(Metadatum::Text(full))
            }
            Type::Array | Type::ArrayIndef => Ok(Metadatum::Array(d.decode()?)),
            Type::Map | Type::MapIndef => Ok(Metadatum::Map(d.decode()?)),
            _ => Err(decode::Error::message("bad cbor data type for metadatum")),
        }
    }
}

impl Encode for Metadatum {
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>) -> Result<(), encode::Error<W::Error>> {
        match self {
            Metadatum::Int(x) => {
                e.int(*x)?;
            }
            Metadatum::Bytes(x) => {
                e.bounded_bytes(x)?;
            }
            Metadatum::Text(x) => {
                e.bounded_str(x)?;
            }
            Metadatum::Array(x) => {
                e.encode(x)?;
            }
            Metadatum::Map(x) => {
                e.encode(x)?;
            }
        };

        Ok(())
    }
}

pub type MetadatumLabel = u64;

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
pub enum NetworkId {
    Testnet,
    Mainnet,
}

impl From<NetworkId> for u8 {
    fn from(network_id: NetworkId) -> u8 {
        match network_id {
            NetworkId::Testnet => 0,
            NetworkId::Mainnet => 1,
        }
    }
}

impl TryFrom<u8> for NetworkId {
    type Error = ();

    fn try_from(i: u8) -> Result<Self, Self::Error> {
        match i {
            0 => Ok(Self::Testnet),
            1 => Ok(Self::Mainnet),
            _ => Err(()),
        }
    }
}

impl Encode for NetworkId {
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>) -> Result<(), encode::Error<W::Error>> {
        e.u8(u8::from(*self))?.ok()
    }
}

impl<'b> Decode<'b> for NetworkId {
    fn decode(d: &mut Decoder<'b>) -> Result<Self, decode::Error> {
        let i = d.u8()?;
        NetworkId::try_from(i).map_err(|_| decode::Error::message("invalid network id"))
    }
}

/// Compiled Plutus script bytes of a concrete language version.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub struct PlutusScript<const VERSION: usize>(pub Bytes);

impl<const VERSION: usize> AsRef<[u8]> for PlutusScript<VERSION> {
    fn as_ref(&self) -> &[u8] {
        self.0.as_ref()
    }
}

impl<const VERSION: usize> Encode for PlutusScript<VERSION> {
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>) -> Result<(), encode::Error<W::Error>> {
        e.encode(&self.0)?.ok()
    }
}

impl<'b, const VERSION: usize> Decode<'b> for PlutusScript<VERSION> {
    fn decode(d: &mut Decoder<'b>) -> Result<Self, decode::Error> {
        Ok(Self(d.decode()?))
    }
}

pub type PolicyId = Hash<28>;

pub type PoolKeyhash = Hash<28>;

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub struct PoolMetadata {
    pub url: String,
    pub hash: PoolMetadataHash,
}

impl Encode for PoolMetadata {
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>) -> Result<(), encode::Error<W::Error>> {
        e.array(2)?;
        e.str(&self.url)?;
        e.encode(&self.hash)?;
        Ok(())
    }
}

impl<'b> Decode<'b> for PoolMetadata {
    fn decode(d: &mut Decoder<'b>) -> Result<Self, decode::Error> {
        d.array()?;
        Ok(PoolMetadata {
            url: d.decode()?,
            hash: d.decode()?,
        })
    }
}

pub type PoolMetadataHash = Hash<32>;

pub type Port = u32;

pub type PositiveInterval = RationalNumber;

pub type ProtocolVersion = (u64, u64);

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub struct RationalNumber {
    pub numerator: u64,
    pub denominator: u64,
}

impl<'b> Decode<'b> for RationalNumber {
    fn decode(d: &mut Decoder<'b>) -> Result<Self, decode::Error> {
        let tag = d.tag()?;
        if tag != Tag::RATIONAL {
            return Err(decode::Error::message("invalid tag for rational number"));
        }

        d.array()?;
        Ok(RationalNumber {
            numerator: d.decode()?,
            denominator: d.decode()?,
        })
    }
}

impl Encode for RationalNumber {
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>) -> Result<(), encode::Error<W::Error>> {
        e.tag(Tag::RATIONAL)?;
        e.array(2)?;
        e.u64(self.numerator)?;
        e.u64(self.denominator)?;
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub enum Relay {
    SingleHostAddr(Nullable<Port>, Nullable<IPv4>, Nullable<IPv6>),
    SingleHostName(Nullable<Port>, DnsName),
    MultiHostName(DnsName),
}

impl<'b> Decode<'b> for Relay {
    fn decode(d: &mut Decoder<'b>) -> Result<Self, decode::Error> {
        d.array()?;
        let variant = d.u16()?;

        match variant {
            0 => Ok(Relay::SingleHostAddr(d.decode()?, d.decode()?, d.decode()?)),
            1 => Ok(Relay::SingleHostName(d.decode()?, d.decode()?)),
            2 => Ok(Relay::MultiHostName(d.decode()?)),
            _ => Err(decode::Error::message("invalid variant id for Relay")),
        }
    }
}

impl Encode for Relay {
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>) -> Result<(), encode::Error<W::Error>> {
        match self {
            Relay::SingleHostAddr(a, b, c) => {
                e.array(4)?;
                e.u16(0)?;
                e.encode(a)?;
                e.encode(b)?;
                e.encode(c)?;

                Ok(())
            }
            Relay::SingleHostName(a, b) => {
                e.array(3)?;
                e.u16(1)?;
                e.encode(a)?;
                e.encode(b)?;

                Ok(())
            }
            Relay::MultiHostName(a) => {
                e.array(2)?;
                e.u16(2)?;
                e.encode(a)?;

                Ok(())
            }
        }
    }
}

pub type RewardAccount = Bytes;

pub type ScriptHash = Hash<28>;

// !! NOTE / IMPORTANT !!
// It is tempting to swap the order of the two constructors so that
// AddrKeyhash comes first, nicely mapping the binary representation which
// associates 0 to AddrKeyhash and 1 to ScriptHash.
//
// However, for historical reasons, the ScriptHash variant comes first in the
// Haskell reference codebase. From this ordering are derived the
// `PartialOrd` and `Ord` instances, which impact how maps indexed by
// StakeCredential are ordered. So, it is crucial to preserve this quirk to
// avoid hard to troubleshoot issues down the line.
#[derive(Serialize, Deserialize, Debug, PartialEq, PartialOrd, Eq, Ord, Clone, Hash)]
pub enum StakeCredential {
    ScriptHash(ScriptHash),
    AddrKeyhash(AddrKeyhash),
}

impl Encode for StakeCredential {
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>) -> Result<(), encode::Error<W::Error>> {
        match self {
            StakeCredential::ScriptHash(x) => {
                e.array(2)?;
                e.u8(1)?;
                e.encode(x)?;
            }
            StakeCredential::AddrKeyhash(x) => {
                e.array(2)?;
                e.u8(0)?;
                e.encode(x)?;
            }
        }

        Ok(())
    }
}

impl<'b> Decode<'b> for StakeCredential {
    fn decode(d: &mut Decoder<'b>) -> Result<Self, decode::Error> {
        d.array()?;

        match d.u8()? {
            0 => Ok(StakeCredential::AddrKeyhash(d.decode()?)),
            1 => Ok(StakeCredential::ScriptHash(d.decode()?)),
            _ => Err(decode::Error::message("invalid variant for credential")),
        }
    }
}

pub type TransactionIndex = u32;

#[derive(
    Serialize, Deserialize, Debug, PartialEq, Eq, PartialOrd, Ord, Clone, std::hash::Hash,
)]
pub struct TransactionInput {
    pub transaction_id: Hash<32>,

    pub index: u64,
}

impl Encode for TransactionInput {
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>) -> Result<(), encode::Error<W::Error>> {
        e.array(2)?;
        e.encode(&self.transaction_id)?;
        e.u64(self.index)?;
        Ok(())
    }
}

impl<'b> Decode<'b> for TransactionInput {
    fn decode(d: &mut Decoder<'b>) -> Result<Self, decode::Error> {
        d.array()?;
        Ok(TransactionInput {
            transaction_id: d.decode()?,
            index: d.u64()?,
        })
    }
}

pub type UnitInterval = RationalNumber;

#[cfg(test)]
mod tests {
    use super::*;
    use krios_codec::Fragment;

    #[test]
    fn metadatum_int_is_bounded_to_64_bits() {
        // -2^64 is a valid cbor int but not a valid metadatum
        let bytes = hex::decode("3bffffffffffffffff").unwrap();
        let out: Result<Metadatum, _> = krios_codec::decode(&bytes);
        assert!(out.is_err());
    }

    #[test]
    fn metadatum_long_text_uses_chunked_encoding() {
        let text = "x".repeat(100);
        let metadatum = Metadatum::Text(text.clone());
        let bytes = metadatum.encode_fragment().unwrap();

        // indefinite text string header
        assert_eq!(bytes[0], 0x7f);

        let back: Metadatum = krios_codec::decode(&bytes).unwrap();
        assert_eq!(back, Metadatum::Text(text));
    }

    #[test]
    fn credential_ordering_follows_reference_impl() {
        // script credentials sort before key credentials
        let script = StakeCredential::ScriptHash([0xff; 28].into());
        let key = StakeCredential::AddrKeyhash([0x00; 28].into());
        assert!(script < key);
    }

    #[test]
    fn rational_number_round_trips() {
        let rational = RationalNumber {
            numerator: 721,
            denominator: 10000,
        };

        let bytes = rational.encode_fragment().unwrap();
        assert_eq!(hex::encode(&bytes), "d81e821902d1192710");

        let back: RationalNumber = krios_codec::decode(&bytes).unwrap();
        assert_eq!(back, rational);
    }
}
