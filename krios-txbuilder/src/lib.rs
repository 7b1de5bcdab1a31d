//! Staging, building and balancing of Conway-era transactions.

mod balance;
mod conway;
mod fee;
mod params;
mod provider;
mod selection;
mod transaction;

pub use balance::{balance_transaction, compute_implicit_coin, is_balanced, BalanceError, ImplicitCoin};
pub use conway::BuildConway;
pub use fee::{compute_ex_units_fee, compute_linear_fee, estimate_fee};
pub use params::{min_ada_for_output, ProtocolParams};
pub use provider::{Provider, ProviderError, ProviderEvaluator, TxEvaluator, UTxO};
pub use selection::{CoinSelector, LargeFirst, Selection, SelectionError};
pub use transaction::model::{
    BuiltTransaction, ExUnits, Input, Output, RedeemerPurpose, ScriptKind, StagingTransaction,
};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TxBuilderError {
    /// Provided bytes could not be decoded into a script
    #[error("Could not decode script bytes")]
    MalformedScript,
    /// Provided bytes could not be decoded into a datum
    #[error("Could not decode datum bytes")]
    MalformedDatum,
    /// Provided datum hash was not 32 bytes in length
    #[error("Invalid bytes length for datum hash")]
    MalformedDatumHash,
    /// Input, policy, etc pointed to by a redeemer was not found in the
    /// transaction
    #[error("Input/policy pointed to by redeemer not found in tx")]
    RedeemerTargetMissing,
    /// Provided network ID is invalid (must be 0 or 1)
    #[error("Invalid network ID")]
    InvalidNetworkId,
    /// Transaction bytes in built transaction object could not be decoded
    #[error("Corrupted transaction bytes in built transaction")]
    CorruptedTxBytes,
    /// Public key generated from private key was of unexpected length
    #[error("Public key for private key is malformed")]
    MalformedKey,
    /// Asset name is too long, it must be 32 bytes or less
    #[error("Asset name must be 32 bytes or less")]
    AssetNameTooLong,
    /// A transaction must spend at least one input
    #[error("Transaction has no inputs")]
    NoInputs,
}
