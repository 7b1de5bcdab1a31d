//! Content-addressed hashing of ledger entities.
//!
//! Hashes computed over `KeepRaw` values reuse the exact bytes the entity
//! was parsed from, so they match what exists on-chain even for
//! unusual-but-valid encodings. Owned values hash their fresh canonical
//! encoding.

use krios_codec::utils::KeepRaw;
use krios_crypto::hash::{Hash, Hasher};

use crate::conway::NativeScript;
use crate::{PlutusData, PlutusScript};

pub trait ComputeHash<const BYTES: usize> {
    fn compute_hash(&self) -> Hash<BYTES>;
}

impl ComputeHash<32> for crate::conway::TransactionBody {
    fn compute_hash(&self) -> Hash<32> {
        Hasher::<256>::hash_cbor(self)
    }
}

impl ComputeHash<32> for KeepRaw<'_, crate::conway::TransactionBody> {
    fn compute_hash(&self) -> Hash<32> {
        Hasher::<256>::hash(self.raw_cbor())
    }
}

impl ComputeHash<32> for crate::conway::AuxiliaryData {
    fn compute_hash(&self) -> Hash<32> {
        Hasher::<256>::hash_cbor(self)
    }
}

impl ComputeHash<32> for KeepRaw<'_, crate::conway::AuxiliaryData> {
    fn compute_hash(&self) -> Hash<32> {
        Hasher::<256>::hash(self.raw_cbor())
    }
}

impl ComputeHash<32> for PlutusData {
    fn compute_hash(&self) -> Hash<32> {
        Hasher::<256>::hash_cbor(self)
    }
}

impl ComputeHash<32> for KeepRaw<'_, PlutusData> {
    fn compute_hash(&self) -> Hash<32> {
        Hasher::<256>::hash(self.raw_cbor())
    }
}

// script hashes commit to the language through a prefix byte over the raw
// script bytes: 0 native, 1..3 the plutus versions
impl ComputeHash<28> for NativeScript {
    fn compute_hash(&self) -> Hash<28> {
        Hasher::<224>::hash_tagged_cbor(self, 0)
    }
}

impl ComputeHash<28> for KeepRaw<'_, NativeScript> {
    fn compute_hash(&self) -> Hash<28> {
        Hasher::<224>::hash_tagged(self.raw_cbor(), 0)
    }
}

impl<const VERSION: usize> ComputeHash<28> for PlutusScript<VERSION> {
    fn compute_hash(&self) -> Hash<28> {
        Hasher::<224>::hash_tagged(self.as_ref(), VERSION as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_script_hash_uses_zero_prefix() {
        let script = NativeScript::ScriptPubkey([0x11; 28].into());

        let manual = {
            let bytes = krios_codec::to_vec(&script).unwrap();
            Hasher::<224>::hash_tagged(&bytes, 0)
        };

        assert_eq!(script.compute_hash(), manual);
    }

    #[test]
    fn plutus_script_hash_uses_version_prefix() {
        let blob: Vec<u8> = vec![0x4d, 0x01, 0x00, 0x00, 0x33, 0x22, 0x22, 0x00, 0x11];

        let v1 = PlutusScript::<1>(blob.clone().into()).compute_hash();
        let v2 = PlutusScript::<2>(blob.clone().into()).compute_hash();
        let v3 = PlutusScript::<3>(blob.into()).compute_hash();

        assert_ne!(v1, v2);
        assert_ne!(v2, v3);
    }

    #[test]
    fn keep_raw_datum_hash_matches_owned_for_canonical_bytes() {
        let datum = PlutusData::BigInt(crate::BigInt::Int(42.into()));
        let bytes = krios_codec::to_vec(&datum).unwrap();

        let kept: KeepRaw<'_, PlutusData> = krios_codec::decode(&bytes).unwrap();
        assert_eq!(kept.compute_hash(), datum.compute_hash());
    }
}
