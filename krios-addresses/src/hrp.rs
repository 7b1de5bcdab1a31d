//! Bech32 human-readable prefixes used across the Cardano ecosystem
//! (CIP-5 / CIP-19 / CIP-105).

use crate::Error;

pub const ADDR: &str = "addr";
pub const ADDR_TEST: &str = "addr_test";
pub const STAKE: &str = "stake";
pub const STAKE_TEST: &str = "stake_test";
pub const DREP: &str = "drep";
pub const CC_HOT: &str = "cc_hot";
pub const CC_COLD: &str = "cc_cold";
pub const POOL: &str = "pool";
pub const SCRIPT: &str = "script";
pub const ASSET: &str = "asset";

/// Encodes arbitrary bytes under the given prefix, validating nothing
/// beyond what bech32 itself requires.
pub fn encode(hrp: &str, bytes: &[u8]) -> Result<String, Error> {
    crate::encode_bech32(bytes, hrp)
}

/// Decodes a bech32 string, returning its prefix and payload bytes. The
/// polymod checksum is verified by the underlying codec.
pub fn decode(value: &str) -> Result<(String, Vec<u8>), Error> {
    crate::decode_bech32(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arbitrary_payloads_round_trip() {
        let payload = [7u8; 28];
        let text = encode(DREP, &payload).unwrap();
        assert!(text.starts_with("drep1"));

        let (hrp, bytes) = decode(&text).unwrap();
        assert_eq!(hrp, DREP);
        assert_eq!(bytes, payload);
    }

    #[test]
    fn corrupted_checksum_is_rejected() {
        let text = encode(POOL, &[7u8; 28]).unwrap();
        let mut corrupted = text.into_bytes();
        let last = corrupted.len() - 1;
        corrupted[last] = if corrupted[last] == b'q' { b'p' } else { b'q' };
        let corrupted = String::from_utf8(corrupted).unwrap();

        assert!(decode(&corrupted).is_err());
    }
}
