//! Capability traits for everything that needs a blockchain behind it.
//!
//! The core never performs I/O itself: querying UTxOs, fetching protocol
//! parameters, evaluating scripts and submitting transactions all go
//! through these traits, so the balancer can be exercised with
//! deterministic fakes.

use krios_addresses::Address;
use krios_crypto::hash::Hash;
use krios_primitives::conway::{RedeemersKey, TransactionInput, TransactionOutput, Tx};
use krios_primitives::ExUnits;
use thiserror::Error;

use crate::params::ProtocolParams;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("provider transport failed: {0}")]
    Transport(String),

    #[error("unknown transaction input {0}#{1}")]
    UnknownInput(Hash<32>, u64),

    #[error("script evaluation failed: {0}")]
    EvaluationFailed(String),

    #[error("transaction rejected: {0}")]
    SubmitFailed(String),
}

/// An unspent transaction output: the reference and the resolved output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UTxO {
    pub input: TransactionInput,
    pub output: TransactionOutput,
}

/// Blockchain query surface used by the builder and balancer.
pub trait Provider {
    fn parameters(&mut self) -> Result<ProtocolParams, ProviderError>;

    fn utxos_at(&mut self, address: &Address) -> Result<Vec<UTxO>, ProviderError>;

    fn resolve(&mut self, inputs: &[TransactionInput]) -> Result<Vec<UTxO>, ProviderError>;

    /// Runs phase-2 validation and reports the execution units each
    /// redeemer actually consumed.
    fn evaluate(
        &mut self,
        tx: &Tx,
        additional_utxos: &[UTxO],
    ) -> Result<Vec<(RedeemersKey, ExUnits)>, ProviderError>;

    fn submit(&mut self, tx: &Tx) -> Result<Hash<32>, ProviderError>;
}

/// The evaluation capability on its own, so balancing does not demand a
/// full provider.
pub trait TxEvaluator {
    fn evaluate(
        &mut self,
        tx: &Tx,
        additional_utxos: &[UTxO],
    ) -> Result<Vec<(RedeemersKey, ExUnits)>, ProviderError>;
}

/// Adapter exposing a provider's evaluation endpoint as a [`TxEvaluator`].
pub struct ProviderEvaluator<'a, P: Provider> {
    provider: &'a mut P,
}

impl<'a, P: Provider> ProviderEvaluator<'a, P> {
    pub fn new(provider: &'a mut P) -> Self {
        ProviderEvaluator { provider }
    }
}

impl<P: Provider> TxEvaluator for ProviderEvaluator<'_, P> {
    fn evaluate(
        &mut self,
        tx: &Tx,
        additional_utxos: &[UTxO],
    ) -> Result<Vec<(RedeemersKey, ExUnits)>, ProviderError> {
        self.provider.evaluate(tx, additional_utxos)
    }
}
