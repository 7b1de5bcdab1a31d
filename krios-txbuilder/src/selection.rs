//! Coin selection.
//!
//! A [`CoinSelector`] picks UTxOs out of an available set until the
//! selection covers a target value; the balancer then turns the surplus
//! into change. Selection is deterministic: ties break on the (tx id,
//! index) ordering of the candidates.

use std::collections::BTreeMap;

use krios_primitives::conway::Value;
use krios_primitives::{AssetName, PolicyId};
use thiserror::Error;

use crate::provider::UTxO;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("available utxo set cannot cover the target value")]
    BalanceInsufficient,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// Everything spent, pre-selected inputs included
    pub selected: Vec<UTxO>,
    /// The available UTxOs left untouched
    pub remaining: Vec<UTxO>,
}

pub trait CoinSelector {
    fn select(
        &mut self,
        pre_selected: Vec<UTxO>,
        available: Vec<UTxO>,
        target: &Value,
    ) -> Result<Selection, SelectionError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Dimension {
    Coin,
    Asset(PolicyId, [u8; 32], usize),
}

fn asset_key(policy: &PolicyId, name: &AssetName) -> Dimension {
    let mut fixed = [0u8; 32];
    fixed[..name.len().min(32)].copy_from_slice(&name[..name.len().min(32)]);
    Dimension::Asset(*policy, fixed, name.len().min(32))
}

fn quantities(value: &Value) -> BTreeMap<Dimension, u64> {
    let mut out = BTreeMap::new();
    out.insert(Dimension::Coin, value.coin());

    if let Value::Multiasset(_, multiasset) = value {
        for (policy, assets) in multiasset.iter() {
            for (name, quantity) in assets.iter() {
                let entry: &mut u64 = out.entry(asset_key(policy, name)).or_default();
                *entry = entry.saturating_add(u64::from(quantity));
            }
        }
    }

    out
}

fn quantity_of(utxo: &UTxO, dimension: &Dimension) -> u64 {
    quantities(utxo.output.value())
        .get(dimension)
        .copied()
        .unwrap_or(0)
}

/// The default strategy: for every asset dimension, in descending order of
/// target amount, take the largest holders first until the dimension is
/// covered.
#[derive(Debug, Clone, Copy, Default)]
pub struct LargeFirst;

impl CoinSelector for LargeFirst {
    fn select(
        &mut self,
        pre_selected: Vec<UTxO>,
        available: Vec<UTxO>,
        target: &Value,
    ) -> Result<Selection, SelectionError> {
        let mut accumulated: BTreeMap<Dimension, u64> = BTreeMap::new();

        for utxo in &pre_selected {
            for (dimension, quantity) in quantities(utxo.output.value()) {
                *accumulated.entry(dimension).or_default() += quantity;
            }
        }

        let mut needed: Vec<(Dimension, u64)> = quantities(target)
            .into_iter()
            .filter(|(_, quantity)| *quantity > 0)
            .collect();

        // cover the scarcest-looking dimension first: descending target
        needed.sort_by(|a, b| b.1.cmp(&a.1));

        let mut selected = pre_selected;
        let mut pool = available;
        pool.sort_by(|a, b| {
            (a.input.transaction_id, a.input.index).cmp(&(b.input.transaction_id, b.input.index))
        });

        for (dimension, amount) in needed {
            while accumulated.get(&dimension).copied().unwrap_or(0) < amount {
                let best = pool
                    .iter()
                    .enumerate()
                    .filter(|(_, utxo)| quantity_of(utxo, &dimension) > 0)
                    .max_by(|(ai, a), (bi, b)| {
                        quantity_of(a, &dimension)
                            .cmp(&quantity_of(b, &dimension))
                            // stable tie-break on the lower (tx, index)
                            .then(bi.cmp(ai))
                    })
                    .map(|(i, _)| i);

                match best {
                    Some(i) => {
                        let utxo = pool.remove(i);
                        for (dimension, quantity) in quantities(utxo.output.value()) {
                            *accumulated.entry(dimension).or_default() += quantity;
                        }
                        selected.push(utxo);
                    }
                    None => return Err(SelectionError::BalanceInsufficient),
                }
            }
        }

        Ok(Selection {
            selected,
            remaining: pool,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use krios_primitives::conway::{PostAlonzoTransactionOutput, TransactionOutput};
    use krios_primitives::{Bytes, Hash, NonEmptyKeyValuePairs, PositiveCoin, TransactionInput};

    fn input(seed: u8, index: u64) -> TransactionInput {
        TransactionInput {
            transaction_id: Hash::<32>::from([seed; 32]),
            index,
        }
    }

    fn lovelace_utxo(seed: u8, index: u64, coin: u64) -> UTxO {
        UTxO {
            input: input(seed, index),
            output: TransactionOutput::PostAlonzo(PostAlonzoTransactionOutput {
                address: Bytes::from(vec![0x61; 29]),
                value: Value::Coin(coin),
                datum_option: None,
                script_ref: None,
            }),
        }
    }

    fn asset_utxo(seed: u8, index: u64, coin: u64, policy: u8, quantity: u64) -> UTxO {
        let assets = NonEmptyKeyValuePairs::Def(vec![(
            Hash::<28>::from([policy; 28]),
            NonEmptyKeyValuePairs::Def(vec![(
                Bytes::from(b"token".to_vec()),
                PositiveCoin::try_from(quantity).unwrap(),
            )]),
        )]);

        UTxO {
            input: input(seed, index),
            output: TransactionOutput::PostAlonzo(PostAlonzoTransactionOutput {
                address: Bytes::from(vec![0x61; 29]),
                value: Value::Multiasset(coin, assets),
                datum_option: None,
                script_ref: None,
            }),
        }
    }

    #[test]
    fn picks_largest_lovelace_first() {
        let available = vec![
            lovelace_utxo(1, 0, 2_000_000),
            lovelace_utxo(2, 0, 10_000_000),
            lovelace_utxo(3, 0, 4_000_000),
        ];

        let selection = LargeFirst
            .select(vec![], available, &Value::Coin(9_000_000))
            .unwrap();

        assert_eq!(selection.selected.len(), 1);
        assert_eq!(selection.selected[0].output.value().coin(), 10_000_000);
        assert_eq!(selection.remaining.len(), 2);
    }

    #[test]
    fn accumulates_until_target_met() {
        let available = vec![
            lovelace_utxo(1, 0, 2_000_000),
            lovelace_utxo(2, 0, 3_000_000),
            lovelace_utxo(3, 0, 4_000_000),
        ];

        let selection = LargeFirst
            .select(vec![], available, &Value::Coin(6_000_000))
            .unwrap();

        // 4M then 3M
        assert_eq!(selection.selected.len(), 2);
        assert_eq!(selection.remaining.len(), 1);
        assert_eq!(selection.remaining[0].output.value().coin(), 2_000_000);
    }

    #[test]
    fn pre_selected_inputs_always_survive() {
        let forced = lovelace_utxo(9, 0, 1_000_000);
        let available = vec![lovelace_utxo(1, 0, 10_000_000)];

        let selection = LargeFirst
            .select(vec![forced.clone()], available, &Value::Coin(5_000_000))
            .unwrap();

        assert!(selection.selected.contains(&forced));
    }

    #[test]
    fn covers_asset_dimensions() {
        let available = vec![
            lovelace_utxo(1, 0, 50_000_000),
            asset_utxo(2, 0, 2_000_000, 7, 30),
            asset_utxo(3, 0, 2_000_000, 7, 80),
        ];

        let target = asset_utxo(0, 0, 10_000_000, 7, 100).output.value().clone();

        let selection = LargeFirst.select(vec![], available, &target).unwrap();

        // both asset carriers plus the lovelace whale
        assert_eq!(selection.selected.len(), 3);
    }

    #[test]
    fn insufficient_funds_error() {
        let available = vec![lovelace_utxo(1, 0, 1_000_000)];

        assert_eq!(
            LargeFirst.select(vec![], available, &Value::Coin(5_000_000)),
            Err(SelectionError::BalanceInsufficient)
        );
    }

    #[test]
    fn equal_quantities_break_ties_deterministically() {
        let a = lovelace_utxo(5, 1, 2_000_000);
        let b = lovelace_utxo(5, 0, 2_000_000);
        let c = lovelace_utxo(1, 7, 2_000_000);

        let selection = LargeFirst
            .select(vec![], vec![a, b, c.clone()], &Value::Coin(1_000_000))
            .unwrap();

        // the lowest (tx, index) wins the tie
        assert_eq!(selection.selected[0], c);
    }
}
