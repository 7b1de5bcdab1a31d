//! Legacy Byron addresses
//!
//! The on-chain form is `cbor([tag24(payload), crc32(payload)])` where the
//! payload is itself the CBOR of `[root, attributes, type]`. The root is a
//! content-addressed hash of the spending data, so the address commits to
//! the key or script that may spend from it.

use krios_codec::utils::{Bytes, OrderPreservingProperties};
use krios_codec::{data::Tag, decode, encode, Decode, Decoder, Encode, Encoder};
use krios_crypto::crc32;
use krios_crypto::hash::{Hash, Hasher};

use base58::{FromBase58, ToBase58};

use crate::Error;

pub type Blake2b224 = Hash<28>;

pub type AddressId = Blake2b224;
pub type StakeholderId = Blake2b224;

#[derive(Debug, Clone, PartialEq, PartialOrd)]
pub enum AddrDistr {
    Variant0(StakeholderId),
    Variant1,
}

impl<'b> Decode<'b> for AddrDistr {
    fn decode(d: &mut Decoder<'b>) -> Result<Self, decode::Error> {
        d.array()?;
        let variant = d.u32()?;

        match variant {
            0 => Ok(AddrDistr::Variant0(d.decode()?)),
            1 => Ok(AddrDistr::Variant1),
            _ => Err(decode::Error::message("invalid variant for addrdistr")),
        }
    }
}

impl Encode for AddrDistr {
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>) -> Result<(), encode::Error<W::Error>> {
        match self {
            AddrDistr::Variant0(x) => {
                e.array(2)?;
                e.u32(0)?;
                e.encode(x)?;

                Ok(())
            }
            AddrDistr::Variant1 => {
                e.array(1)?;
                e.u32(1)?;

                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, PartialOrd)]
pub enum AddrType {
    PubKey,
    Script,
    Redeem,
    Other(u64),
}

impl<'b> Decode<'b> for AddrType {
    fn decode(d: &mut Decoder<'b>) -> Result<Self, decode::Error> {
        let variant = d.u64()?;

        match variant {
            0 => Ok(AddrType::PubKey),
            1 => Ok(AddrType::Script),
            2 => Ok(AddrType::Redeem),
            x => Ok(AddrType::Other(x)),
        }
    }
}

impl Encode for AddrType {
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>) -> Result<(), encode::Error<W::Error>> {
        match self {
            AddrType::PubKey => e.u64(0)?,
            AddrType::Script => e.u64(1)?,
            AddrType::Redeem => e.u64(2)?,
            AddrType::Other(x) => e.u64(*x)?,
        };

        Ok(())
    }
}

/// Single entry of the address attribute map.
///
/// Key 0 holds the stake distribution, key 1 the encrypted derivation path
/// old HD wallets embedded, key 2 the network magic of testnets. Unknown
/// keys are preserved as raw bytes so old addresses round-trip.
#[derive(Debug, Clone, PartialEq, PartialOrd)]
pub enum AddrAttrProperty {
    AddrDistr(AddrDistr),
    DerivationPath(Bytes),
    NetworkMagic(Bytes),
    Unparsed(u8, Bytes),
}

impl<'b> Decode<'b> for AddrAttrProperty {
    fn decode(d: &mut Decoder<'b>) -> Result<Self, decode::Error> {
        let key = d.u8()?;

        match key {
            0 => Ok(AddrAttrProperty::AddrDistr(d.decode()?)),
            1 => Ok(AddrAttrProperty::DerivationPath(d.decode()?)),
            2 => Ok(AddrAttrProperty::NetworkMagic(d.decode()?)),
            x => Ok(AddrAttrProperty::Unparsed(x, d.decode()?)),
        }
    }
}

impl Encode for AddrAttrProperty {
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>) -> Result<(), encode::Error<W::Error>> {
        match self {
            AddrAttrProperty::AddrDistr(x) => {
                e.u32(0)?;
                e.encode(x)?;

                Ok(())
            }
            AddrAttrProperty::DerivationPath(x) => {
                e.u32(1)?;
                e.encode(x)?;

                Ok(())
            }
            AddrAttrProperty::NetworkMagic(x) => {
                e.u32(2)?;
                e.encode(x)?;

                Ok(())
            }
            AddrAttrProperty::Unparsed(a, b) => {
                e.u8(*a)?;
                e.encode(b)?;

                Ok(())
            }
        }
    }
}

pub type AddrAttr = OrderPreservingProperties<AddrAttrProperty>;

/// The decoded content of the Byron envelope payload.
#[derive(Debug, Clone, PartialEq, PartialOrd)]
pub struct AddressPayload {
    pub root: AddressId,
    pub attributes: AddrAttr,
    pub addrtype: AddrType,
}

impl<'b> Decode<'b> for AddressPayload {
    fn decode(d: &mut Decoder<'b>) -> Result<Self, decode::Error> {
        d.array()?;

        Ok(AddressPayload {
            root: d.decode()?,
            attributes: d.decode()?,
            addrtype: d.decode()?,
        })
    }
}

impl Encode for AddressPayload {
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>) -> Result<(), encode::Error<W::Error>> {
        e.array(3)?;
        e.encode(&self.root)?;
        e.encode(&self.attributes)?;
        e.encode(&self.addrtype)?;

        Ok(())
    }
}

/// The key or script material a Byron address commits to.
#[derive(Debug, Clone, PartialEq, PartialOrd)]
pub enum SpendingData {
    PubKey(Bytes),
    Script(Bytes),
    Redeem(Bytes),
}

impl Encode for SpendingData {
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>) -> Result<(), encode::Error<W::Error>> {
        let (variant, bytes) = match self {
            SpendingData::PubKey(x) => (0u64, x),
            SpendingData::Script(x) => (1, x),
            SpendingData::Redeem(x) => (2, x),
        };

        e.array(2)?;
        e.u64(variant)?;
        e.encode(bytes)?;

        Ok(())
    }
}

impl<'b> Decode<'b> for SpendingData {
    fn decode(d: &mut Decoder<'b>) -> Result<Self, decode::Error> {
        d.array()?;
        let variant = d.u64()?;
        let bytes = d.decode()?;

        match variant {
            0 => Ok(SpendingData::PubKey(bytes)),
            1 => Ok(SpendingData::Script(bytes)),
            2 => Ok(SpendingData::Redeem(bytes)),
            _ => Err(decode::Error::message("invalid variant for spending data")),
        }
    }
}

/// Computes the root hash a Byron address carries:
/// `blake2b-224(sha3-256(cbor([type, spending_data, attrs])))`.
pub fn address_id(
    addrtype: &AddrType,
    spending_data: &SpendingData,
    attributes: &AddrAttr,
) -> AddressId {
    use cryptoxide::digest::Digest as _;

    let mut inner = Vec::new();
    {
        let mut e = Encoder::new(&mut inner);
        e.array(3).expect("infallible");
        e.encode(addrtype).expect("infallible");
        e.encode(spending_data).expect("infallible");
        e.encode(attributes).expect("infallible");
    }

    let mut sha3 = cryptoxide::sha3::Sha3_256::new();
    sha3.input(&inner);
    let mut first = [0u8; 32];
    sha3.result(&mut first);

    Hasher::<224>::hash(&first)
}

/// A Byron address: the raw payload bytes plus their CRC-32.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Hash)]
pub struct ByronAddress {
    payload: Vec<u8>,
    crc: u32,
}

impl ByronAddress {
    pub fn new(payload: &[u8]) -> Self {
        ByronAddress {
            payload: payload.to_vec(),
            crc: crc32::checksum(payload),
        }
    }

    /// Builds an address from its content, computing payload and checksum.
    pub fn from_parts(
        addrtype: AddrType,
        spending_data: &SpendingData,
        attributes: AddrAttr,
    ) -> Self {
        let root = address_id(&addrtype, spending_data, &attributes);

        let payload = AddressPayload {
            root,
            attributes,
            addrtype,
        };

        let bytes = krios_codec::to_vec(&payload).expect("infallible");
        Self::new(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        let out: ByronAddress = krios_codec::decode(bytes).map_err(Error::InvalidByronCbor)?;

        let expected = crc32::checksum(&out.payload);
        if out.crc != expected {
            return Err(Error::BadByronCrc {
                declared: out.crc,
                computed: expected,
            });
        }

        Ok(out)
    }

    pub fn from_base58(value: &str) -> Result<Self, Error> {
        let bytes = value.from_base58().map_err(Error::BadBase58)?;
        Self::from_bytes(&bytes)
    }

    /// Gets a numeric id describing the type of the address
    pub fn typeid(&self) -> u8 {
        0b1000
    }

    /// The raw payload CBOR, still wrapped in the envelope on the wire.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn crc(&self) -> u32 {
        self.crc
    }

    pub fn decode_payload(&self) -> Result<AddressPayload, Error> {
        krios_codec::decode(&self.payload).map_err(Error::InvalidByronCbor)
    }

    pub fn to_vec(&self) -> Vec<u8> {
        krios_codec::to_vec(self).expect("infallible")
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_vec())
    }

    pub fn to_base58(&self) -> String {
        self.to_vec().to_base58()
    }
}

impl<'b> Decode<'b> for ByronAddress {
    fn decode(d: &mut Decoder<'b>) -> Result<Self, decode::Error> {
        d.array()?;

        let tag = d.tag()?;
        if tag != Tag::ENCODED_CBOR {
            return Err(decode::Error::message("invalid tag for byron address"));
        }

        let payload = d.bytes()?.to_vec();
        let crc = d.u32()?;

        Ok(ByronAddress { payload, crc })
    }
}

impl Encode for ByronAddress {
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>) -> Result<(), encode::Error<W::Error>> {
        e.array(2)?;
        e.tag(Tag::ENCODED_CBOR)?;
        e.bytes(&self.payload)?;
        e.u32(self.crc)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_VECTOR: &str = "37btjrVyb4KDXBNC4haBVPCrro8AQPHwvCMp3RFhhSVWwfFmZ6wwzSK6JK1hY6wHNmtrpTf1kdbva8TCneM2YsiXT7mrzT21EacHnPpz5YyUdj64na";

    #[test]
    fn base58_round_trip() {
        let addr = ByronAddress::from_base58(TEST_VECTOR).unwrap();
        assert_eq!(addr.to_base58(), TEST_VECTOR);
    }

    #[test]
    fn payload_decodes() {
        let addr = ByronAddress::from_base58(TEST_VECTOR).unwrap();
        let payload = addr.decode_payload().unwrap();
        assert_eq!(payload.addrtype, AddrType::PubKey);
    }

    #[test]
    fn corrupted_crc_is_rejected() {
        let addr = ByronAddress::from_base58(TEST_VECTOR).unwrap();
        let mut bytes = addr.to_vec();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;

        assert!(matches!(
            ByronAddress::from_bytes(&bytes),
            Err(Error::BadByronCrc { .. })
        ));
    }

    #[test]
    fn from_parts_round_trips_through_wire_form() {
        let spending = SpendingData::PubKey(vec![7u8; 64].into());
        let attrs: AddrAttr = vec![].into();
        let addr = ByronAddress::from_parts(AddrType::PubKey, &spending, attrs);

        let back = ByronAddress::from_bytes(&addr.to_vec()).unwrap();
        assert_eq!(back, addr);

        let payload = back.decode_payload().unwrap();
        assert_eq!(
            payload.root,
            address_id(
                &AddrType::PubKey,
                &spending,
                &payload.attributes
            )
        );
    }
}
