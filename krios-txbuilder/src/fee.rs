//! Fee computation per the ledger formula: a linear component over the
//! serialized transaction size plus the priced execution units of every
//! redeemer, both rounded up.

use krios_primitives::conway::{Redeemers, Tx, VKeyWitness};
use krios_primitives::{ExUnitPrices, ExUnits, Fragment, RationalNumber};

use crate::params::ProtocolParams;

pub fn compute_linear_fee(tx_size: u64, params: &ProtocolParams) -> u64 {
    params.min_fee_coefficient * tx_size + params.min_fee_constant
}

fn price(units: u64, rational: &RationalNumber) -> u64 {
    let numerator = units as u128 * rational.numerator as u128;
    let denominator = rational.denominator.max(1) as u128;

    numerator.div_ceil(denominator) as u64
}

/// Total execution units across both redeemer wire shapes.
pub fn total_ex_units(redeemers: &Redeemers) -> ExUnits {
    let mut total = ExUnits { mem: 0, steps: 0 };

    match redeemers {
        Redeemers::List(items) => {
            for r in items {
                total.mem += r.ex_units.mem;
                total.steps += r.ex_units.steps;
            }
        }
        Redeemers::Map(items) => {
            for (_, v) in items.iter() {
                total.mem += v.ex_units.mem;
                total.steps += v.ex_units.steps;
            }
        }
    }

    total
}

pub fn compute_ex_units_fee(units: ExUnits, prices: &ExUnitPrices) -> u64 {
    price(units.mem, &prices.mem_price) + price(units.steps, &prices.step_price)
}

/// Fee for the transaction as it would go on the wire, with placeholder
/// vkey witnesses standing in for the declared signer count so the size is
/// accurate before signing.
pub fn estimate_fee(tx: &Tx, signature_count: u8, params: &ProtocolParams) -> u64 {
    let mut sized = tx.clone();

    if signature_count > 0 {
        let placeholders: Vec<_> = (0..signature_count)
            .map(|_| VKeyWitness {
                vkey: vec![0u8; 32].into(),
                signature: vec![0u8; 64].into(),
            })
            .collect();

        sized.transaction_witness_set.vkeywitness = placeholders.try_into().ok();
    }

    let size = sized
        .encode_fragment()
        .map(|bytes| bytes.len() as u64)
        .unwrap_or(params.max_tx_size);

    let script_fee = sized
        .transaction_witness_set
        .redeemer
        .as_ref()
        .map(|redeemers| compute_ex_units_fee(total_ex_units(redeemers), &params.execution_costs))
        .unwrap_or_default();

    compute_linear_fee(size, params) + script_fee
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_fee_matches_mainnet_parameters() {
        let params = ProtocolParams::default();
        assert_eq!(compute_linear_fee(200, &params), 44 * 200 + 155_381);
    }

    #[test]
    fn ex_units_fee_rounds_up() {
        let prices = ExUnitPrices {
            mem_price: RationalNumber {
                numerator: 1,
                denominator: 3,
            },
            step_price: RationalNumber {
                numerator: 0,
                denominator: 1,
            },
        };

        // 10 / 3 rounds up to 4
        assert_eq!(
            compute_ex_units_fee(ExUnits { mem: 10, steps: 0 }, &prices),
            4
        );
    }

    #[test]
    fn placeholder_witnesses_grow_the_estimate() {
        let params = ProtocolParams::default();

        let tx = Tx {
            transaction_body: Default::default(),
            transaction_witness_set: Default::default(),
            success: true,
            auxiliary_data: krios_primitives::Nullable::Null,
        };

        let unsigned = estimate_fee(&tx, 0, &params);
        let one_signer = estimate_fee(&tx, 1, &params);
        let two_signers = estimate_fee(&tx, 2, &params);

        assert!(unsigned < one_signer);
        // each extra witness is ~100 bytes of fee-relevant size
        assert!(one_signer + 44 * 90 < two_signers);
    }
}
