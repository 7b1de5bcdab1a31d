//! Transaction balancing: coin selection, change computation and the fee
//! fixed point.
//!
//! The entry point is [`balance_transaction`], which takes a structurally
//! complete but unbalanced transaction and mutates it until the ledger
//! equation holds:
//!
//! `Σ inputs + mint⁺ + withdrawals + refunds = Σ outputs + fee + deposits + mint⁻`

use std::collections::BTreeMap;

use krios_addresses::Address;
use krios_primitives::conway::{
    Certificate, LanguageViews, Language, PostAlonzoTransactionOutput, Redeemers, ScriptData,
    TransactionBody, TransactionInput, TransactionOutput, Tx, Value, WitnessSet,
};
use krios_primitives::{Bytes, Hash, PositiveCoin};
use thiserror::Error;

use crate::fee::estimate_fee;
use crate::params::{min_ada_for_output, min_ada_for_output_ceiling, ProtocolParams};
use crate::provider::{ProviderError, TxEvaluator, UTxO};
use crate::selection::{CoinSelector, SelectionError};

/// Bound on the fee/change fixed-point iteration.
const MAX_BALANCING_ROUNDS: usize = 10;

#[derive(Error, Debug)]
pub enum BalanceError {
    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error("fee and change failed to converge")]
    BalanceUnstable,

    #[error("change output cannot meet the minimum ada requirement")]
    MinAdaViolation,

    #[error("script evaluation failed")]
    ScriptEvaluationFailed(#[from] ProviderError),

    #[error("input {0}#{1} is not present in the resolved set")]
    UnresolvedInput(Hash<32>, u64),

    #[error("transaction does not balance: {0}")]
    BalancingFailed(String),
}

/// The net ada a transaction moves without explicit inputs or outputs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImplicitCoin {
    /// Reward account withdrawals
    pub withdrawals: u64,
    /// Deposits paid by certificates and proposals
    pub deposits: u64,
    /// Deposits coming back from deregistrations
    pub reclaim_deposits: u64,
}

/// Gathers withdrawals, deposits and refunds out of the transaction body.
/// Legacy registration certificates carry no explicit amount, so their
/// deposit comes from the protocol parameters.
pub fn compute_implicit_coin(body: &TransactionBody, params: &ProtocolParams) -> ImplicitCoin {
    let mut implicit = ImplicitCoin::default();

    if let Some(withdrawals) = &body.withdrawals {
        for (_, coin) in withdrawals.iter() {
            implicit.withdrawals += coin;
        }
    }

    if let Some(certificates) = &body.certificates {
        for cert in certificates.iter() {
            match cert {
                Certificate::StakeRegistration(_) => {
                    implicit.deposits += params.stake_key_deposit;
                }
                Certificate::StakeDeregistration(_) => {
                    implicit.reclaim_deposits += params.stake_key_deposit;
                }
                Certificate::PoolRegistration { .. } => {
                    implicit.deposits += params.pool_deposit;
                }
                other => {
                    implicit.deposits += other.deposit().unwrap_or_default();
                    implicit.reclaim_deposits += other.refund().unwrap_or_default();
                }
            }
        }
    }

    if let Some(proposals) = &body.proposal_procedures {
        for proposal in proposals.iter() {
            implicit.deposits += proposal.deposit;
        }
    }

    implicit
}

/// Signed multi-dimensional value arithmetic used internally: coin plus one
/// counter per (policy, asset name).
#[derive(Debug, Clone, Default)]
struct Totals {
    coin: i128,
    assets: BTreeMap<(Hash<28>, Vec<u8>), i128>,
}

impl Totals {
    fn add_value(&mut self, value: &Value, sign: i128) {
        self.coin += value.coin() as i128 * sign;

        if let Value::Multiasset(_, multiasset) = value {
            for (policy, assets) in multiasset.iter() {
                for (name, quantity) in assets.iter() {
                    *self.assets.entry((*policy, name.to_vec())).or_default() +=
                        u64::from(quantity) as i128 * sign;
                }
            }
        }
    }

    fn add_coin(&mut self, coin: u64, sign: i128) {
        self.coin += coin as i128 * sign;
    }

    /// Mint quantities are signed already: positives add, negatives burn.
    /// `sign` of -1 treats minted assets as consumed instead of produced.
    fn add_mint(&mut self, body: &TransactionBody, sign: i128) {
        if let Some(mint) = &body.mint {
            for (policy, assets) in mint.iter() {
                for (name, quantity) in assets.iter() {
                    *self.assets.entry((*policy, name.to_vec())).or_default() +=
                        i64::from(quantity) as i128 * sign;
                }
            }
        }
    }

    fn is_zero(&self) -> bool {
        self.coin == 0 && self.assets.values().all(|q| *q == 0)
    }

    /// Positive part as a wire value, for selector targets and change.
    fn to_value(&self) -> Value {
        let coin = self.coin.max(0) as u64;

        let mut by_policy: BTreeMap<Hash<28>, Vec<(Bytes, PositiveCoin)>> = BTreeMap::new();
        for ((policy, name), quantity) in &self.assets {
            if *quantity > 0 {
                by_policy.entry(*policy).or_default().push((
                    name.clone().into(),
                    PositiveCoin::try_from(*quantity as u64).expect("positive checked"),
                ));
            }
        }

        let multiasset: Vec<_> = by_policy
            .into_iter()
            .filter_map(|(policy, assets)| assets.try_into().ok().map(|a| (policy, a)))
            .collect();

        match multiasset.try_into() {
            Ok(multiasset) => Value::Multiasset(coin, multiasset),
            Err(_) => Value::Coin(coin),
        }
    }

    fn describe(&self) -> String {
        let mut parts = vec![format!("coin {:+}", self.coin)];

        for ((policy, name), quantity) in &self.assets {
            if *quantity != 0 {
                parts.push(format!("{}.{} {:+}", policy, hex::encode(name), quantity));
            }
        }

        parts.join(", ")
    }
}

fn resolve<'a>(
    input: &TransactionInput,
    resolved: &'a [UTxO],
) -> Result<&'a TransactionOutput, BalanceError> {
    resolved
        .iter()
        .find(|utxo| utxo.input == *input)
        .map(|utxo| &utxo.output)
        .ok_or(BalanceError::UnresolvedInput(
            input.transaction_id,
            input.index,
        ))
}

/// Consumed minus produced across every dimension. Zero means balanced.
fn balance_delta(
    tx: &Tx,
    resolved_inputs: &[UTxO],
    params: &ProtocolParams,
) -> Result<Totals, BalanceError> {
    let body = &tx.transaction_body;
    let implicit = compute_implicit_coin(body, params);

    let mut delta = Totals::default();

    for input in body.inputs.iter() {
        delta.add_value(resolve(input, resolved_inputs)?.value(), 1);
    }

    delta.add_mint(body, 1);
    delta.add_coin(implicit.withdrawals, 1);
    delta.add_coin(implicit.reclaim_deposits, 1);

    for output in &body.outputs {
        delta.add_value(output.value(), -1);
    }

    delta.add_coin(body.fee, -1);
    delta.add_coin(implicit.deposits, -1);

    if let Some(donation) = body.donation {
        delta.add_coin(u64::from(donation), -1);
    }

    Ok(delta)
}

/// Applies only the final validation of the balancing algorithm: does the
/// ledger equation hold for this transaction?
pub fn is_balanced(
    tx: &Tx,
    resolved_inputs: &[UTxO],
    params: &ProtocolParams,
) -> Result<bool, BalanceError> {
    Ok(balance_delta(tx, resolved_inputs, params)?.is_zero())
}

/// The language views for the scripts a witness set carries.
fn used_language_views(witness: &WitnessSet, params: &ProtocolParams) -> Option<LanguageViews> {
    let mut languages = vec![];

    if witness.plutus_v1_script.is_some() {
        languages.push(Language::PlutusV1);
    }
    if witness.plutus_v2_script.is_some() {
        languages.push(Language::PlutusV2);
    }
    if witness.plutus_v3_script.is_some() {
        languages.push(Language::PlutusV3);
    }

    if languages.is_empty() {
        // reference scripts leave no trace in the witness set; fall back to
        // every model the parameters carry
        languages = vec![Language::PlutusV1, Language::PlutusV2, Language::PlutusV3];
    }

    let views = LanguageViews::select(&params.cost_models, &languages);

    if views.is_empty() {
        None
    } else {
        Some(views)
    }
}

fn apply_ex_units(
    witness: &mut WitnessSet,
    evaluated: &[(krios_primitives::conway::RedeemersKey, krios_primitives::ExUnits)],
) {
    let Some(redeemers) = &mut witness.redeemer else {
        return;
    };

    match redeemers {
        Redeemers::List(items) => {
            for item in items.iter_mut() {
                if let Some((_, units)) = evaluated
                    .iter()
                    .find(|(key, _)| key.tag == item.tag && key.index == item.index)
                {
                    item.ex_units = *units;
                }
            }
        }
        Redeemers::Map(items) => {
            let updated = items
                .iter()
                .map(|(key, value)| {
                    let mut value = value.clone();
                    if let Some((_, units)) = evaluated.iter().find(|(k, _)| k == key) {
                        value.ex_units = *units;
                    }
                    (key.clone(), value)
                })
                .collect::<Vec<_>>();

            *items = updated.into();
        }
    }
}

/// Balances `tx` in place: selects inputs out of `available`, appends a
/// change output at `change_address`, evaluates scripts when an evaluator
/// is supplied and iterates fee and change to a fixed point.
///
/// The body input set is rebuilt from the selection, so inputs the caller
/// already committed to must arrive through `pre_selected` (resolved).
#[allow(clippy::too_many_arguments)]
pub fn balance_transaction(
    tx: &mut Tx,
    signature_count: u8,
    params: &ProtocolParams,
    pre_selected: &[UTxO],
    available: &[UTxO],
    selector: &mut dyn CoinSelector,
    change_address: &Address,
    mut evaluator: Option<&mut dyn TxEvaluator>,
) -> Result<(), BalanceError> {
    let implicit = compute_implicit_coin(&tx.transaction_body, params);

    // net requirement the inputs must cover; the selector accounts the
    // pre-selected inputs towards it by itself
    let mut target = Totals::default();
    for output in &tx.transaction_body.outputs {
        target.add_value(output.value(), 1);
    }
    target.add_coin(implicit.deposits, 1);
    if let Some(donation) = tx.transaction_body.donation {
        target.add_coin(u64::from(donation), 1);
    }
    target.add_mint(&tx.transaction_body, -1);
    target.add_coin(implicit.withdrawals, -1);
    target.add_coin(implicit.reclaim_deposits, -1);

    // preferred margin: a hard fee upper bound plus enough ada to float the
    // change output; falls back to a tight fee estimate when the funds
    // cannot carry a full change output (step 9 then burns the dust)
    let change_floor = {
        let probe = TransactionOutput::PostAlonzo(PostAlonzoTransactionOutput {
            address: Bytes::from(change_address.to_vec()),
            value: target.to_value(),
            datum_option: None,
            script_ref: None,
        });

        min_ada_for_output_ceiling(&probe, params.coins_per_utxo_byte)
    };

    let fee_ceiling = params.min_fee_constant + params.min_fee_coefficient * params.max_tx_size;
    let tight_margin = estimate_fee(tx, signature_count, params);

    let selection = [change_floor + fee_ceiling, tight_margin]
        .into_iter()
        .map(|margin| {
            let mut coin_target = target.clone();
            coin_target.add_coin(margin, 1);

            selector.select(
                pre_selected.to_vec(),
                available.to_vec(),
                &coin_target.to_value(),
            )
        })
        .find_map(|outcome| outcome.ok())
        .ok_or(SelectionError::BalanceInsufficient)?;

    // deterministic input ordering
    let mut inputs: Vec<TransactionInput> =
        selection.selected.iter().map(|x| x.input.clone()).collect();
    inputs.sort_unstable_by_key(|x| (x.transaction_id, x.index));
    inputs.dedup();
    tx.transaction_body.inputs = inputs.into();

    // everything the inputs bring beyond the target becomes change
    let mut leftover = Totals::default();
    for utxo in &selection.selected {
        leftover.add_value(utxo.output.value(), 1);
    }
    leftover.coin -= target.coin;
    for (key, quantity) in &target.assets {
        *leftover.assets.entry(key.clone()).or_default() -= quantity;
    }

    if leftover.coin < 0 || leftover.assets.values().any(|q| *q < 0) {
        return Err(BalanceError::BalancingFailed(format!(
            "selection left a negative balance: {}",
            leftover.describe()
        )));
    }

    let change_index = tx.transaction_body.outputs.len();
    tx.transaction_body.outputs.push(TransactionOutput::PostAlonzo(
        PostAlonzoTransactionOutput {
            address: Bytes::from(change_address.to_vec()),
            value: leftover.to_value(),
            datum_option: None,
            script_ref: None,
        },
    ));

    tx.transaction_body.fee = fee_ceiling;

    // with placeholder fee and change in place, pin down execution units
    // and the script integrity hash before sizing the final fee
    if tx.transaction_witness_set.redeemer.is_some() {
        if let Some(evaluator) = evaluator.as_mut() {
            let evaluated = evaluator.evaluate(tx, available)?;
            apply_ex_units(&mut tx.transaction_witness_set, &evaluated);
        }
    }

    let language_views = used_language_views(&tx.transaction_witness_set, params);
    tx.transaction_body.script_data_hash =
        ScriptData::build_for(&tx.transaction_witness_set, &language_views)
            .map(|script_data| script_data.hash());

    // fee and change feed back into each other through the serialized
    // size; iterate to a fixed point
    let leftover_coin = leftover.coin as u64;
    let mut fee = estimate_fee(tx, signature_count, params);
    let mut converged = false;

    for _ in 0..MAX_BALANCING_ROUNDS {
        if fee > leftover_coin {
            return Err(BalanceError::Selection(SelectionError::BalanceInsufficient));
        }

        let change_coin = leftover_coin - fee;

        tx.transaction_body.fee = fee;
        set_output_coin(
            &mut tx.transaction_body.outputs[change_index],
            change_coin,
            &leftover,
        );

        let next = estimate_fee(tx, signature_count, params);
        if next == fee {
            converged = true;
            break;
        }

        fee = next;
    }

    if !converged {
        return Err(BalanceError::BalanceUnstable);
    }

    // change below the minimum ada threshold cannot stand on its own; pure
    // ada dust is burned into the fee, assets make the failure hard
    let change_coin = leftover_coin - fee;
    let change_min = min_ada_for_output(
        &tx.transaction_body.outputs[change_index],
        params.coins_per_utxo_byte,
    );

    if change_coin < change_min {
        if leftover.assets.values().any(|q| *q > 0) {
            return Err(BalanceError::MinAdaViolation);
        }

        tx.transaction_body.outputs.remove(change_index);
        tx.transaction_body.fee = leftover_coin;
    }

    let delta = balance_delta(tx, &selection.selected, params)?;
    if !delta.is_zero() {
        return Err(BalanceError::BalancingFailed(delta.describe()));
    }

    Ok(())
}

fn set_output_coin(output: &mut TransactionOutput, coin: u64, leftover: &Totals) {
    let mut with_coin = leftover.clone();
    with_coin.coin = coin as i128;

    match output {
        TransactionOutput::Legacy(x) => x.amount = with_coin.to_value(),
        TransactionOutput::PostAlonzo(x) => x.value = with_coin.to_value(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use krios_primitives::conway::Certificate;
    use krios_primitives::{KeyValuePairs, StakeCredential};

    #[test]
    fn implicit_coin_reads_certificates_and_withdrawals() {
        let params = ProtocolParams::default();
        let cred = StakeCredential::AddrKeyhash([1u8; 28].into());

        let body = TransactionBody {
            withdrawals: Some(KeyValuePairs::Def(vec![(
                Bytes::from(vec![0xe1; 29]),
                5_000_000u64,
            )])),
            certificates: vec![
                Certificate::StakeRegistration(cred.clone()),
                Certificate::Reg(cred.clone(), 2_000_000),
                Certificate::UnReg(cred, 2_000_000),
            ]
            .try_into()
            .ok(),
            ..Default::default()
        };

        let implicit = compute_implicit_coin(&body, &params);

        assert_eq!(implicit.withdrawals, 5_000_000);
        assert_eq!(implicit.deposits, params.stake_key_deposit + 2_000_000);
        assert_eq!(implicit.reclaim_deposits, 2_000_000);
    }
}
