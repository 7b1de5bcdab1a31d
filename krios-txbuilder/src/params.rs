//! The protocol parameter subset the builder and balancer consume.

use krios_primitives::conway::{CostModels, TransactionOutput, Value};
use krios_primitives::{ExUnitPrices, Fragment, RationalNumber};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProtocolParams {
    pub min_fee_coefficient: u64,
    pub min_fee_constant: u64,
    pub coins_per_utxo_byte: u64,
    pub stake_key_deposit: u64,
    pub pool_deposit: u64,
    pub drep_deposit: u64,
    pub governance_action_deposit: u64,
    pub max_tx_size: u64,
    pub collateral_percentage: u64,
    pub execution_costs: ExUnitPrices,
    pub cost_models: CostModels,
}

impl Default for ProtocolParams {
    fn default() -> Self {
        // current mainnet values
        ProtocolParams {
            min_fee_coefficient: 44,
            min_fee_constant: 155_381,
            coins_per_utxo_byte: 4_310,
            stake_key_deposit: 2_000_000,
            pool_deposit: 500_000_000,
            drep_deposit: 500_000_000,
            governance_action_deposit: 100_000_000_000,
            max_tx_size: 16_384,
            collateral_percentage: 150,
            execution_costs: ExUnitPrices {
                mem_price: RationalNumber {
                    numerator: 577,
                    denominator: 10_000,
                },
                step_price: RationalNumber {
                    numerator: 721,
                    denominator: 10_000_000,
                },
            },
            cost_models: CostModels::default(),
        }
    }
}

/// Constant the ledger adds to the serialized output size before pricing
/// it, covering the entry overhead in the UTxO set.
const OUTPUT_SIZE_OVERHEAD: u64 = 160;

/// The minimum ada an output must carry, proportional to its serialized
/// size per the Babbage ledger rule.
pub fn min_ada_for_output(output: &TransactionOutput, coins_per_utxo_byte: u64) -> u64 {
    let size = output
        .encode_fragment()
        .map(|bytes| bytes.len() as u64)
        .unwrap_or_default();

    (OUTPUT_SIZE_OVERHEAD + size) * coins_per_utxo_byte
}

/// Minimum ada for an output once its coin field holds a full-width value.
/// Used when sizing change outputs whose final coin is not yet known.
pub fn min_ada_for_output_ceiling(output: &TransactionOutput, coins_per_utxo_byte: u64) -> u64 {
    let mut padded = output.clone();

    match &mut padded {
        TransactionOutput::Legacy(x) => {
            x.amount = pad_coin(&x.amount);
        }
        TransactionOutput::PostAlonzo(x) => {
            x.value = pad_coin(&x.value);
        }
    }

    min_ada_for_output(&padded, coins_per_utxo_byte)
}

fn pad_coin(value: &Value) -> Value {
    match value {
        Value::Coin(_) => Value::Coin(u64::MAX),
        Value::Multiasset(_, assets) => Value::Multiasset(u64::MAX, assets.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use krios_primitives::conway::PostAlonzoTransactionOutput;
    use krios_primitives::Bytes;

    fn plain_output(coin: u64) -> TransactionOutput {
        TransactionOutput::PostAlonzo(PostAlonzoTransactionOutput {
            address: Bytes::from(vec![0x61; 29]),
            value: Value::Coin(coin),
            datum_option: None,
            script_ref: None,
        })
    }

    #[test]
    fn min_ada_tracks_serialized_size() {
        let params = ProtocolParams::default();

        let small = min_ada_for_output(&plain_output(1), params.coins_per_utxo_byte);
        let wide = min_ada_for_output(&plain_output(u64::MAX), params.coins_per_utxo_byte);

        assert!(small < wide);

        // a plain ada-only output on mainnet needs a bit under 1 ada
        assert!(small > 800_000);
        assert!(wide < 1_200_000);
    }

    #[test]
    fn ceiling_covers_any_final_coin() {
        let params = ProtocolParams::default();

        let ceiling = min_ada_for_output_ceiling(&plain_output(1), params.coins_per_utxo_byte);
        let widest = min_ada_for_output(&plain_output(u64::MAX), params.coins_per_utxo_byte);

        assert_eq!(ceiling, widest);
    }
}
