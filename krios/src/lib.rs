//! Rust-native building blocks for constructing, serializing and signing
//! Cardano transactions off-chain.
//!
//! Krios is a collection of modules implementing common Cardano logic in
//! native Rust. This crate doesn't provide any particular application, it
//! is meant to be used as a base layer to facilitate the development of
//! higher-level use-cases such as wallets, explorers or dapp backends.

pub mod ledger {
    //! Ledger primitives and cbor codecs for the Conway era

    #[doc(inline)]
    pub use krios_primitives as primitives;

    #[doc(inline)]
    pub use krios_addresses as addresses;
}

#[doc(inline)]
pub use krios_codec as codec;

#[doc(inline)]
pub use krios_crypto as crypto;

#[doc(inline)]
pub use krios_wallet as wallet;

#[doc(inline)]
pub use krios_txbuilder as txbuilder;
