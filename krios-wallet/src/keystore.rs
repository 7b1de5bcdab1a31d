//! Secure key custodians.
//!
//! A [`SecureKeyHandler`] owns private key material and hands out only
//! public keys and signatures. The built-in software implementation keeps
//! the material EMIP-003 encrypted at rest and decrypts it per call with
//! the supplied passphrase; hardware-backed implementations live outside
//! this crate.

use bip39::rand_core::{CryptoRng, RngCore};
use krios_crypto::key::ed25519::{PublicKey, Signature};

use crate::hd::{Bip32PrivateKey, DerivationPath};
use crate::wrapper::WrappedKey;
use crate::{Error, PrivateKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyHandlerKind {
    /// A single Ed25519 key, derivation paths are ignored
    Ed25519,
    /// A BIP-32 root from which keys are derived per path
    Bip32,
}

pub trait SecureKeyHandler {
    fn kind(&self) -> KeyHandlerKind;

    /// Public keys for the given derivation paths. Ed25519 handlers ignore
    /// the paths and return their single public key.
    fn public_keys(
        &mut self,
        passphrase: &[u8],
        paths: &[DerivationPath],
    ) -> Result<Vec<PublicKey>, Error>;

    /// Signatures over the transaction body hash, one per derivation path
    /// (or a single one for Ed25519 handlers).
    fn sign(
        &mut self,
        passphrase: &[u8],
        tx_body_hash: &[u8],
        paths: &[DerivationPath],
    ) -> Result<Vec<Signature>, Error>;
}

/// Software key store: the key material lives encrypted and is unwrapped
/// only for the duration of each call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoftwareKeyHandler {
    kind: KeyHandlerKind,
    wrapped: WrappedKey,
}

impl SoftwareKeyHandler {
    pub fn new_ed25519<T: RngCore + CryptoRng>(
        key: &PrivateKey,
        passphrase: &[u8],
        rng: T,
    ) -> Self {
        SoftwareKeyHandler {
            kind: KeyHandlerKind::Ed25519,
            wrapped: WrappedKey::wrap(key, passphrase, rng),
        }
    }

    pub fn new_bip32<T: RngCore + CryptoRng>(
        root: &Bip32PrivateKey,
        passphrase: &[u8],
        rng: T,
    ) -> Self {
        SoftwareKeyHandler {
            kind: KeyHandlerKind::Bip32,
            wrapped: WrappedKey::wrap_bip32(root, passphrase, rng),
        }
    }

    /// Builds a BIP-32 handler from a mnemonic phrase. The bip39 password
    /// stretches the seed; the passphrase protects the stored root.
    pub fn from_mnemonic<T: RngCore + CryptoRng>(
        mnemonic: String,
        bip39_password: String,
        passphrase: &[u8],
        rng: T,
    ) -> Result<Self, Error> {
        let root = Bip32PrivateKey::from_bip39_mnenomic(mnemonic, bip39_password)?;
        Ok(Self::new_bip32(&root, passphrase, rng))
    }

    /// The persistable form: a kind byte followed by the encrypted blob.
    pub fn serialize(&self) -> Vec<u8> {
        let kind = match self.kind {
            KeyHandlerKind::Ed25519 => 0u8,
            KeyHandlerKind::Bip32 => 1,
        };

        let mut out = vec![kind];
        out.extend_from_slice(self.wrapped.as_bytes());
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        let (kind, rest) = bytes.split_first().ok_or(Error::WrapperDataInvalidSize)?;

        let kind = match kind {
            0 => KeyHandlerKind::Ed25519,
            1 => KeyHandlerKind::Bip32,
            _ => return Err(Error::WrapperDataInvalidSize),
        };

        Ok(SoftwareKeyHandler {
            kind,
            wrapped: WrappedKey::from_bytes(rest.to_vec()),
        })
    }
}

impl SecureKeyHandler for SoftwareKeyHandler {
    fn kind(&self) -> KeyHandlerKind {
        self.kind
    }

    fn public_keys(
        &mut self,
        passphrase: &[u8],
        paths: &[DerivationPath],
    ) -> Result<Vec<PublicKey>, Error> {
        match self.kind {
            KeyHandlerKind::Ed25519 => {
                let key = self.wrapped.unwrap_key(passphrase)?;
                Ok(vec![key.public_key()])
            }
            KeyHandlerKind::Bip32 => {
                let root = self.wrapped.unwrap_bip32(passphrase)?;

                Ok(paths
                    .iter()
                    .map(|path| root.derive_path(path).to_public().to_ed25519_pubkey())
                    .collect())
            }
        }
    }

    fn sign(
        &mut self,
        passphrase: &[u8],
        tx_body_hash: &[u8],
        paths: &[DerivationPath],
    ) -> Result<Vec<Signature>, Error> {
        match self.kind {
            KeyHandlerKind::Ed25519 => {
                let key = self.wrapped.unwrap_key(passphrase)?;
                Ok(vec![key.sign(tx_body_hash)])
            }
            KeyHandlerKind::Bip32 => {
                let root = self.wrapped.unwrap_bip32(passphrase)?;

                Ok(paths
                    .iter()
                    .map(|path| {
                        root.derive_path(path)
                            .to_ed25519_private_key()
                            .sign(tx_body_hash)
                    })
                    .collect())
            }
        }
    }
}

/// Deterministic handler for tests: every instance built from the same seed
/// produces the same keys and signatures.
pub struct NullKeyHandler {
    key: PrivateKey,
}

impl NullKeyHandler {
    pub fn new(seed: u8) -> Self {
        NullKeyHandler {
            key: PrivateKey::Normal([seed; 32].into()),
        }
    }
}

impl SecureKeyHandler for NullKeyHandler {
    fn kind(&self) -> KeyHandlerKind {
        KeyHandlerKind::Ed25519
    }

    fn public_keys(
        &mut self,
        _passphrase: &[u8],
        _paths: &[DerivationPath],
    ) -> Result<Vec<PublicKey>, Error> {
        Ok(vec![self.key.public_key()])
    }

    fn sign(
        &mut self,
        _passphrase: &[u8],
        tx_body_hash: &[u8],
        _paths: &[DerivationPath],
    ) -> Result<Vec<Signature>, Error> {
        Ok(vec![self.key.sign(tx_body_hash)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hd::cip1852;
    use rand::rngs::OsRng;

    fn payment_path() -> DerivationPath {
        DerivationPath::standard(0, cip1852::ROLE_EXTERNAL, 0)
    }

    #[test]
    fn bip32_signatures_verify_under_derived_keys() {
        let root = Bip32PrivateKey::generate(OsRng);
        let mut handler = SoftwareKeyHandler::new_bip32(&root, b"opensesame", OsRng);

        let paths = [
            payment_path(),
            DerivationPath::standard(0, cip1852::ROLE_STAKING, 0),
        ];

        let message = [0x77u8; 32];

        let keys = handler.public_keys(b"opensesame", &paths).unwrap();
        let sigs = handler.sign(b"opensesame", &message, &paths).unwrap();

        assert_eq!(keys.len(), 2);
        assert_eq!(sigs.len(), 2);

        for (key, sig) in keys.iter().zip(sigs.iter()) {
            assert!(key.verify(message, sig));
        }
    }

    #[test]
    fn wrong_passphrase_is_rejected() {
        let root = Bip32PrivateKey::generate(OsRng);
        let mut handler = SoftwareKeyHandler::new_bip32(&root, b"opensesame", OsRng);

        assert!(handler.public_keys(b"wrong", &[payment_path()]).is_err());
    }

    #[test]
    fn serialized_handler_stays_encrypted() {
        let root = Bip32PrivateKey::generate(OsRng);
        let handler = SoftwareKeyHandler::new_bip32(&root, b"opensesame", OsRng);

        let blob = handler.serialize();
        let mut restored = SoftwareKeyHandler::from_bytes(&blob).unwrap();

        assert_eq!(restored.kind(), KeyHandlerKind::Bip32);

        let keys = restored
            .public_keys(b"opensesame", &[payment_path()])
            .unwrap();
        assert_eq!(
            keys[0],
            root.derive_path(&payment_path()).to_public().to_ed25519_pubkey()
        );
    }

    #[test]
    fn null_handler_is_deterministic() {
        let mut a = NullKeyHandler::new(7);
        let mut b = NullKeyHandler::new(7);

        let message = [0x01u8; 32];

        assert_eq!(
            a.public_keys(b"", &[]).unwrap(),
            b.public_keys(b"", &[]).unwrap()
        );
        assert_eq!(
            a.sign(b"", &message, &[]).unwrap(),
            b.sign(b"", &message, &[]).unwrap()
        );
    }
}
