//! Password-protected private key wrapping.
//!
//! Keys are sealed at rest with [EMIP-003](https://github.com/Emurgo/EmIPs/blob/master/specs/emip-003.md)
//! and only exist in cleartext for the duration of a call. The wrapped blob
//! length distinguishes the key flavor: 32 bytes for a plain Ed25519 seed,
//! 64 for an extended key, 96 for a BIP-32 root.

use bip39::rand_core::{CryptoRng, RngCore};
use krios_crypto::emip3;
use krios_crypto::key::ed25519::{SecretKey, SecretKeyExtended};
use krios_crypto::memsec::Scrubbed as _;

use crate::hd::Bip32PrivateKey;
use crate::{Error, PrivateKey};

/// A private key sealed under a passphrase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrappedKey(Vec<u8>);

impl WrappedKey {
    /// Seals a standard or extended Ed25519 key.
    pub fn wrap<T: RngCore + CryptoRng>(
        key: &PrivateKey,
        passphrase: &[u8],
        rng: T,
    ) -> Self {
        let mut cleartext = key.as_bytes();
        let wrapped = emip3::encrypt(&cleartext, passphrase, rng);
        cleartext.scrub();

        WrappedKey(wrapped)
    }

    /// Seals a BIP-32 root key.
    pub fn wrap_bip32<T: RngCore + CryptoRng>(
        key: &Bip32PrivateKey,
        passphrase: &[u8],
        rng: T,
    ) -> Self {
        let mut cleartext = key.as_bytes();
        let wrapped = emip3::encrypt(&cleartext, passphrase, rng);
        cleartext.scrub();

        WrappedKey(wrapped)
    }

    /// The sealed blob, safe to persist.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        WrappedKey(bytes)
    }

    /// Unseals a standard or extended Ed25519 key.
    pub fn unwrap_key(&self, passphrase: &[u8]) -> Result<PrivateKey, Error> {
        let mut cleartext =
            emip3::decrypt(&self.0, passphrase).map_err(|_| Error::WrapperDataFailedToDecrypt)?;

        let out = match cleartext.len() {
            SecretKey::SIZE => {
                let bytes: [u8; SecretKey::SIZE] =
                    cleartext.as_slice().try_into().expect("length checked");
                Ok(PrivateKey::Normal(SecretKey::from(bytes)))
            }
            SecretKeyExtended::SIZE => {
                let bytes: [u8; SecretKeyExtended::SIZE] =
                    cleartext.as_slice().try_into().expect("length checked");
                let key = SecretKeyExtended::from_bytes(bytes)?;
                Ok(PrivateKey::Extended(key))
            }
            _ => Err(Error::WrapperDataInvalidSize),
        };

        cleartext.scrub();
        out
    }

    /// Unseals a BIP-32 root key.
    pub fn unwrap_bip32(&self, passphrase: &[u8]) -> Result<Bip32PrivateKey, Error> {
        let mut cleartext =
            emip3::decrypt(&self.0, passphrase).map_err(|_| Error::WrapperDataFailedToDecrypt)?;

        let out = match cleartext.len() {
            96 => {
                let bytes: [u8; 96] = cleartext.as_slice().try_into().expect("length checked");
                Bip32PrivateKey::from_bytes(bytes)
            }
            _ => Err(Error::WrapperDataInvalidSize),
        };

        cleartext.scrub();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;

    #[test]
    fn normal_key_roundtrip() {
        let key = SecretKey::new(OsRng);
        let public = key.public_key();

        let wrapped = WrappedKey::wrap(&PrivateKey::Normal(key), b"hunter2", OsRng);

        let unwrapped = wrapped.unwrap_key(b"hunter2").unwrap();
        assert_eq!(unwrapped.public_key(), public);
    }

    #[test]
    fn extended_key_roundtrip() {
        let key = SecretKeyExtended::new(OsRng);
        let public = key.public_key();

        let wrapped = WrappedKey::wrap(&PrivateKey::Extended(key), b"hunter2", OsRng);

        let unwrapped = wrapped.unwrap_key(b"hunter2").unwrap();
        assert_eq!(unwrapped.public_key(), public);
    }

    #[test]
    fn bip32_root_roundtrip() {
        let root = Bip32PrivateKey::generate(OsRng);

        let wrapped = WrappedKey::wrap_bip32(&root, b"hunter2", OsRng);

        let unwrapped = wrapped.unwrap_bip32(b"hunter2").unwrap();
        assert_eq!(unwrapped, root);
    }

    #[test]
    fn wrong_passphrase_does_not_unwrap() {
        let key = SecretKey::new(OsRng);
        let wrapped = WrappedKey::wrap(&PrivateKey::Normal(key), b"hunter2", OsRng);

        assert!(matches!(
            wrapped.unwrap_key(b"*******"),
            Err(Error::WrapperDataFailedToDecrypt)
        ));
    }
}
