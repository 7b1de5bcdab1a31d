//! EMIP-003 password-based encryption.
//!
//! The scheme derives a 32-byte key from the passphrase with
//! PBKDF2-HMAC-SHA512 (19 162 iterations, 32-byte random salt) and seals the
//! payload with ChaCha20-Poly1305 (12-byte nonce, 16-byte tag, empty AAD).
//!
//! Wire layout: `[32-byte salt][12-byte nonce][16-byte tag][ciphertext]`.

use cryptoxide::chacha20poly1305::ChaCha20Poly1305;
use cryptoxide::hmac::Hmac;
use cryptoxide::pbkdf2::pbkdf2;
use cryptoxide::sha2::Sha512;
use rand_core::{CryptoRng, RngCore};
use thiserror::Error;

use crate::memsec::Scrubbed as _;
use krios_codec::buffer::Buffer;

/// PBKDF2 iteration count fixed by EMIP-003.
const ITERATIONS: u32 = 19_162;

const SALT_SIZE: usize = 32;
const NONCE_SIZE: usize = 12;
const TAG_SIZE: usize = 16;
const KEY_SIZE: usize = 32;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The blob is too short to hold salt, nonce and tag
    #[error("encrypted data of invalid length")]
    InvalidDataSize,

    /// The payload failed Poly1305 authentication
    #[error("authentication failed, wrong passphrase or corrupted data")]
    AuthenticationFailed,
}

fn derive_key(passphrase: &[u8], salt: &[u8]) -> [u8; KEY_SIZE] {
    let mut key = [0u8; KEY_SIZE];
    let mut mac = Hmac::new(Sha512::new(), passphrase);
    pbkdf2(&mut mac, salt, ITERATIONS, &mut key);
    key
}

/// Encrypts `data` under `passphrase`, producing the EMIP-003 wire blob.
///
/// The passphrase may be empty; the caller still pays the full key
/// derivation cost.
pub fn encrypt<Rng>(data: &[u8], passphrase: &[u8], mut rng: Rng) -> Vec<u8>
where
    Rng: RngCore + CryptoRng,
{
    let mut salt = [0u8; SALT_SIZE];
    rng.fill_bytes(&mut salt);

    let mut nonce = [0u8; NONCE_SIZE];
    rng.fill_bytes(&mut nonce);

    let mut key = derive_key(passphrase, &salt);

    let mut ciphertext = vec![0u8; data.len()];
    let mut tag = [0u8; TAG_SIZE];

    let mut cipher = ChaCha20Poly1305::new(&key, &nonce, &[]);
    cipher.encrypt(data, &mut ciphertext, &mut tag);

    key.scrub();

    let mut out = Buffer::with_capacity(SALT_SIZE + NONCE_SIZE + TAG_SIZE + data.len());
    out.write(&salt);
    out.write(&nonce);
    out.write(&tag);
    out.write(&ciphertext);

    out.into_vec()
}

/// Decrypts an EMIP-003 blob. Authentication happens before any plaintext
/// is released; on failure the scratch buffer is zeroed.
pub fn decrypt(encrypted: &[u8], passphrase: &[u8]) -> Result<Vec<u8>, Error> {
    if encrypted.len() < SALT_SIZE + NONCE_SIZE + TAG_SIZE {
        return Err(Error::InvalidDataSize);
    }

    let mut blob = Buffer::from(encrypted);
    let salt = blob.read_exact(SALT_SIZE).expect("length checked").to_vec();
    let nonce = blob.read_exact(NONCE_SIZE).expect("length checked").to_vec();
    let tag = blob.read_exact(TAG_SIZE).expect("length checked").to_vec();
    let ciphertext = blob.read_exact(blob.remaining()).expect("length checked");

    let mut key = derive_key(passphrase, &salt);

    let mut plaintext = vec![0u8; ciphertext.len()];
    let mut cipher = ChaCha20Poly1305::new(&key, &nonce, &[]);
    let authenticated = cipher.decrypt(ciphertext, &mut plaintext, &tag);

    key.scrub();

    if !authenticated {
        plaintext.scrub();
        return Err(Error::AuthenticationFailed);
    }

    Ok(plaintext)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ZeroRng;

    impl RngCore for ZeroRng {
        fn next_u32(&mut self) -> u32 {
            0
        }

        fn next_u64(&mut self) -> u64 {
            0
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            dest.fill(0);
        }

        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
            self.fill_bytes(dest);
            Ok(())
        }
    }

    impl CryptoRng for ZeroRng {}

    // zero salt and nonce, then the 16-byte tag and 10-byte ciphertext
    fn vector_hex() -> String {
        format!(
            "{}{}",
            "0".repeat(88),
            "9ce1d7784a05efd109ad89c29fea0775bf085ac03988089b3a93"
        )
    }

    fn vector_bytes() -> Vec<u8> {
        hex::decode(vector_hex()).unwrap()
    }

    #[test]
    fn decrypts_reference_vector() {
        let plaintext = decrypt(&vector_bytes(), b"password").unwrap();
        assert_eq!(hex::encode(plaintext), "00010203040506070809");
    }

    #[test]
    fn encrypt_with_zero_entropy_matches_vector() {
        let data = hex::decode("00010203040506070809").unwrap();
        let blob = encrypt(&data, b"password", ZeroRng);
        assert_eq!(hex::encode(blob), vector_hex());
    }

    #[test]
    fn wrong_passphrase_fails_authentication() {
        assert_eq!(
            decrypt(&vector_bytes(), b"not the password").unwrap_err(),
            Error::AuthenticationFailed
        );
    }

    #[test]
    fn empty_passphrase_round_trips() {
        let data = b"some payload worth protecting";
        let blob = encrypt(data, b"", ZeroRng);
        assert_eq!(decrypt(&blob, b"").unwrap(), data);
    }

    #[test]
    fn truncated_blob_is_rejected() {
        assert_eq!(
            decrypt(&[0u8; 10], b"password").unwrap_err(),
            Error::InvalidDataSize
        );
    }
}
