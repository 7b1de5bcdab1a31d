//! hex-string serde for the [`struct@Hash`] handle

use super::Hash;
use serde::{de::Visitor, Deserializer, Serializer};
use std::fmt;

impl<const BYTES: usize> serde::Serialize for Hash<BYTES> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

struct HashVisitor<const BYTES: usize>;

impl<const BYTES: usize> Visitor<'_> for HashVisitor<BYTES> {
    type Value = Hash<BYTES>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "a hex string of {} characters", BYTES * 2)
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        v.parse().map_err(E::custom)
    }
}

impl<'de, const BYTES: usize> serde::Deserialize<'de> for Hash<BYTES> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_str(HashVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_string_round_trip() {
        let hash: Hash<28> = "276fd18711931e2c0e21430192dbeac0e458093cd9d1fcd7210f64b3"
            .parse()
            .unwrap();

        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(
            json,
            "\"276fd18711931e2c0e21430192dbeac0e458093cd9d1fcd7210f64b3\""
        );

        let back: Hash<28> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, hash);
    }
}
