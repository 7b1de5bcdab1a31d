//! Hierarchical-deterministic keys following the Cardano flavor of
//! Ed25519-BIP32 (derivation scheme V2) and BIP-39 mnemonics.

use bech32::{FromBase32, ToBase32};
use bip39::rand_core::{CryptoRng, RngCore};
use bip39::{Language, Mnemonic};
use cryptoxide::{hmac::Hmac, pbkdf2::pbkdf2, sha2::Sha512};
use ed25519_bip32::{self, XPrv, XPub, XPRV_SIZE};
use krios_crypto::key::ed25519::{self, SecretKeyExtended};

use crate::{Error, PrivateKey};

/// First index of the hardened derivation range.
pub const HARDENED_OFFSET: u32 = 0x8000_0000;

/// Marks a derivation index as hardened.
pub const fn harden(index: u32) -> u32 {
    index | HARDENED_OFFSET
}

/// Path constants fixed by CIP-1852.
pub mod cip1852 {
    /// Purpose level for HD wallets
    pub const PURPOSE: u32 = 1852;

    /// Coin type registered for ada
    pub const COIN_TYPE: u32 = 1815;

    /// Role for externally visible payment keys
    pub const ROLE_EXTERNAL: u32 = 0;

    /// Role for internal change keys
    pub const ROLE_INTERNAL: u32 = 1;

    /// Role for staking keys
    pub const ROLE_STAKING: u32 = 2;

    /// Role for DRep keys (CIP-105)
    pub const ROLE_DREP: u32 = 3;
}

/// A fully qualified CIP-1852 derivation path. The purpose, coin type and
/// account levels are hardened during derivation; role and index are not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DerivationPath {
    pub purpose: u32,
    pub coin_type: u32,
    pub account: u32,
    pub role: u32,
    pub index: u32,
}

impl DerivationPath {
    /// The standard payment path `m/1852'/1815'/account'/role/index`.
    pub fn standard(account: u32, role: u32, index: u32) -> Self {
        DerivationPath {
            purpose: cip1852::PURPOSE,
            coin_type: cip1852::COIN_TYPE,
            account,
            role,
            index,
        }
    }
}

/// Ed25519-BIP32 HD Private Key
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Bip32PrivateKey(ed25519_bip32::XPrv);

impl Bip32PrivateKey {
    const BECH32_HRP: &'static str = "xprv";

    pub fn generate<T: RngCore + CryptoRng>(mut rng: T) -> Self {
        let mut buf = [0u8; XPRV_SIZE];
        rng.fill_bytes(&mut buf);
        let xprv = XPrv::normalize_bytes_force3rd(buf);

        Self(xprv)
    }

    pub fn generate_with_mnemonic<T: RngCore + CryptoRng>(
        mut rng: T,
        password: String,
    ) -> (Self, Mnemonic) {
        let bip39 = Mnemonic::generate_in_with(&mut rng, Language::English, 24).unwrap();

        let xprv = Self::from_entropy(&bip39.clone().to_entropy(), &password);

        (xprv, bip39)
    }

    pub fn from_bytes(bytes: [u8; 96]) -> Result<Self, Error> {
        XPrv::from_bytes_verified(bytes)
            .map(Self)
            .map_err(Error::Xprv)
    }

    pub fn as_bytes(&self) -> Vec<u8> {
        self.0.as_ref().to_vec()
    }

    pub fn from_bip39_mnenomic(mnemonic: String, password: String) -> Result<Self, Error> {
        let bip39 = Mnemonic::parse(mnemonic).map_err(Error::Mnemonic)?;

        Ok(Self::from_entropy(&bip39.to_entropy(), &password))
    }

    fn from_entropy(entropy: &[u8], password: &str) -> Self {
        let mut pbkdf2_result = [0; XPRV_SIZE];

        const ITER: u32 = 4096;

        let mut mac = Hmac::new(Sha512::new(), password.as_bytes());
        pbkdf2(&mut mac, entropy, ITER, &mut pbkdf2_result);

        Self(XPrv::normalize_bytes_force3rd(pbkdf2_result))
    }

    pub fn derive(&self, index: u32) -> Self {
        Self(self.0.derive(ed25519_bip32::DerivationScheme::V2, index))
    }

    /// Walks a full CIP-1852 path, hardening the first three levels.
    pub fn derive_path(&self, path: &DerivationPath) -> Self {
        self.derive(harden(path.purpose))
            .derive(harden(path.coin_type))
            .derive(harden(path.account))
            .derive(path.role)
            .derive(path.index)
    }

    pub fn to_ed25519_private_key(&self) -> PrivateKey {
        PrivateKey::Extended(unsafe {
            // The key already is an extended secret key because it passed
            // through the ed25519_bip32 crate's checks
            SecretKeyExtended::from_bytes_unchecked(self.0.extended_secret_key())
        })
    }

    pub fn to_public(&self) -> Bip32PublicKey {
        Bip32PublicKey(self.0.public())
    }

    pub fn chain_code(&self) -> [u8; 32] {
        *self.0.chain_code()
    }

    pub fn to_bech32(&self) -> String {
        bech32::encode(
            Self::BECH32_HRP,
            self.as_bytes().to_base32(),
            bech32::Variant::Bech32,
        )
        .unwrap()
    }

    pub fn from_bech32(bech32: String) -> Result<Self, Error> {
        let (hrp, data, _) = bech32::decode(&bech32).map_err(Error::InvalidBech32)?;
        if hrp != Self::BECH32_HRP {
            Err(Error::InvalidBech32Hrp)
        } else {
            let data = Vec::<u8>::from_base32(&data).map_err(Error::InvalidBech32)?;
            Self::from_bytes(data.try_into().map_err(|_| Error::UnexpectedBech32Length)?)
        }
    }
}

/// Ed25519-BIP32 HD Public Key
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Bip32PublicKey(ed25519_bip32::XPub);

impl Bip32PublicKey {
    const BECH32_HRP: &'static str = "xpub";

    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self(XPub::from_bytes(bytes))
    }

    pub fn as_bytes(&self) -> Vec<u8> {
        self.0.as_ref().to_vec()
    }

    /// Soft derivation only; hardened indexes require the private key.
    pub fn derive(&self, index: u32) -> Result<Self, Error> {
        if index >= HARDENED_OFFSET {
            return Err(Error::HardenedDerivationFromPublic);
        }

        self.0
            .derive(ed25519_bip32::DerivationScheme::V2, index)
            .map(Self)
            .map_err(Error::DerivationError)
    }

    pub fn to_ed25519_pubkey(&self) -> ed25519::PublicKey {
        self.0.public_key().into()
    }

    pub fn chain_code(&self) -> [u8; 32] {
        *self.0.chain_code()
    }

    pub fn to_bech32(&self) -> String {
        bech32::encode(
            Self::BECH32_HRP,
            self.as_bytes().to_base32(),
            bech32::Variant::Bech32,
        )
        .unwrap()
    }

    pub fn from_bech32(bech32: String) -> Result<Self, Error> {
        let (hrp, data, _) = bech32::decode(&bech32).map_err(Error::InvalidBech32)?;
        if hrp != Self::BECH32_HRP {
            Err(Error::InvalidBech32Hrp)
        } else {
            let data = Vec::<u8>::from_base32(&data).map_err(Error::InvalidBech32)?;
            Ok(Self::from_bytes(
                data.try_into().map_err(|_| Error::UnexpectedBech32Length)?,
            ))
        }
    }
}

/// Generates a fresh English mnemonic of the given word count. Valid word
/// counts are 12, 15, 18, 21 and 24.
pub fn generate_mnemonic<T: RngCore + CryptoRng>(
    mut rng: T,
    word_count: usize,
) -> Result<Mnemonic, Error> {
    Mnemonic::generate_in_with(&mut rng, Language::English, word_count).map_err(Error::Mnemonic)
}

#[cfg(test)]
mod test {
    use rand::rngs::OsRng;

    use super::*;

    #[test]
    fn mnemonic_roundtrip() {
        let (xprv, mne) = Bip32PrivateKey::generate_with_mnemonic(OsRng, "".into());

        let xprv_from_mne =
            Bip32PrivateKey::from_bip39_mnenomic(mne.to_string(), "".into()).unwrap();

        assert_eq!(xprv, xprv_from_mne)
    }

    #[test]
    fn mnemonic_to_entropy_roundtrip() {
        for word_count in [12, 15, 18, 21, 24] {
            let mne = generate_mnemonic(OsRng, word_count).unwrap();
            let entropy = mne.to_entropy();

            let back = Mnemonic::from_entropy(&entropy).unwrap();
            assert_eq!(back, mne);
        }
    }

    #[test]
    fn corrupted_checksum_is_rejected() {
        let valid = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";
        assert!(Mnemonic::parse(valid).is_ok());

        // swapping the checksum word breaks validation
        let invalid = valid.replace("about", "abandon");
        assert!(Mnemonic::parse(invalid).is_err());
    }

    #[test]
    fn bech32_roundtrip() {
        let xprv = Bip32PrivateKey::generate(OsRng);

        let xprv_bech32 = xprv.to_bech32();

        let decoded_xprv = Bip32PrivateKey::from_bech32(xprv_bech32).unwrap();

        assert_eq!(xprv, decoded_xprv);

        let xpub = xprv.to_public();

        let xpub_bech32 = xpub.to_bech32();

        let decoded_xpub = Bip32PublicKey::from_bech32(xpub_bech32).unwrap();

        assert_eq!(xpub, decoded_xpub)
    }

    #[test]
    fn public_derivation_matches_private() {
        let xprv = Bip32PrivateKey::generate(OsRng);

        let soft_index = 42;
        let from_private = xprv.derive(soft_index).to_public();
        let from_public = xprv.to_public().derive(soft_index).unwrap();

        assert_eq!(from_private, from_public);
    }

    #[test]
    fn hardened_public_derivation_is_rejected() {
        let xpub = Bip32PrivateKey::generate(OsRng).to_public();
        assert!(matches!(
            xpub.derive(harden(0)),
            Err(Error::HardenedDerivationFromPublic)
        ));
    }
}
