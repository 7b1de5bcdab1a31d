//! Asymmetric key material for signing Cardano transactions

pub mod ed25519;
