use krios_addresses::{Address, Network, ShelleyAddress, ShelleyDelegationPart, ShelleyPaymentPart};
use krios_primitives::conway::{
    BigInt, ExUnits as WireExUnits, PlutusData, PostAlonzoTransactionOutput, Redeemer,
    RedeemerTag, Redeemers, RedeemersKey, TransactionBody, TransactionInput, TransactionOutput,
    Tx, Value, WitnessSet,
};
use krios_primitives::{Bytes, Hash, NonEmptyKeyValuePairs, Nullable, PositiveCoin};
use krios_txbuilder::{
    balance_transaction, is_balanced, BalanceError, LargeFirst, ProtocolParams, ProviderError,
    SelectionError, TxEvaluator, UTxO,
};

fn address(seed: u8) -> Address {
    ShelleyAddress::new(
        Network::Mainnet,
        ShelleyPaymentPart::key_hash([seed; 28].into()),
        ShelleyDelegationPart::Null,
    )
    .into()
}

fn input(seed: u8, index: u64) -> TransactionInput {
    TransactionInput {
        transaction_id: Hash::<32>::from([seed; 32]),
        index,
    }
}

fn utxo_at(seed: u8, index: u64, addr: &Address, value: Value) -> UTxO {
    UTxO {
        input: input(seed, index),
        output: TransactionOutput::PostAlonzo(PostAlonzoTransactionOutput {
            address: Bytes::from(addr.to_vec()),
            value,
            datum_option: None,
            script_ref: None,
        }),
    }
}

fn payment_output(addr: &Address, coin: u64) -> TransactionOutput {
    TransactionOutput::PostAlonzo(PostAlonzoTransactionOutput {
        address: Bytes::from(addr.to_vec()),
        value: Value::Coin(coin),
        datum_option: None,
        script_ref: None,
    })
}

fn unbalanced_payment(to: &Address, coin: u64) -> Tx {
    Tx {
        transaction_body: TransactionBody {
            outputs: vec![payment_output(to, coin)],
            ..Default::default()
        },
        transaction_witness_set: WitnessSet::default(),
        success: true,
        auxiliary_data: Nullable::Null,
    }
}

#[test]
fn simple_payment_balances_end_to_end() {
    let params = ProtocolParams::default();
    assert_eq!(params.min_fee_coefficient, 44);
    assert_eq!(params.min_fee_constant, 155_381);
    assert_eq!(params.coins_per_utxo_byte, 4_310);

    let wallet = address(0xa1);
    let receiver = address(0xb2);

    let available = vec![utxo_at(1, 0, &wallet, Value::Coin(10_000_000))];

    let mut tx = unbalanced_payment(&receiver, 3_000_000);

    balance_transaction(
        &mut tx,
        2,
        &params,
        &[],
        &available,
        &mut LargeFirst,
        &wallet,
        None,
    )
    .unwrap();

    let body = &tx.transaction_body;

    // exactly the payment and the change, nothing else
    assert_eq!(body.outputs.len(), 2);
    assert!(body.mint.is_none());
    assert!(body.certificates.is_none());

    let fee = body.fee;
    assert!(
        (168_000..=180_000).contains(&fee),
        "fee {fee} outside the expected window"
    );

    assert_eq!(body.outputs[0].value().coin(), 3_000_000);
    assert_eq!(
        body.outputs[1].value().coin(),
        10_000_000 - 3_000_000 - fee
    );
    assert_eq!(body.outputs[1].address().as_ref(), wallet.to_vec().as_slice());

    assert!(is_balanced(&tx, &available, &params).unwrap());
}

#[test]
fn insufficient_funds_surface_as_balance_insufficient() {
    let params = ProtocolParams::default();
    let wallet = address(0xa1);
    let receiver = address(0xb2);

    let available = vec![utxo_at(1, 0, &wallet, Value::Coin(2_000_000))];

    let mut tx = unbalanced_payment(&receiver, 3_000_000);

    let err = balance_transaction(
        &mut tx,
        1,
        &params,
        &[],
        &available,
        &mut LargeFirst,
        &wallet,
        None,
    )
    .unwrap_err();

    assert!(matches!(
        err,
        BalanceError::Selection(SelectionError::BalanceInsufficient)
    ));
}

#[test]
fn dust_change_is_burned_into_the_fee() {
    let params = ProtocolParams::default();
    let wallet = address(0xa1);
    let receiver = address(0xb2);

    // forced input leaves ~200k lovelace after the payment, well below the
    // minimum ada a change output needs
    let forced = vec![utxo_at(1, 0, &wallet, Value::Coin(3_200_000))];

    let mut tx = unbalanced_payment(&receiver, 3_000_000);

    balance_transaction(
        &mut tx,
        1,
        &params,
        &forced,
        &[],
        &mut LargeFirst,
        &wallet,
        None,
    )
    .unwrap();

    let body = &tx.transaction_body;

    // no change output; the dust went into the fee
    assert_eq!(body.outputs.len(), 1);
    assert_eq!(body.fee, 200_000);

    assert!(is_balanced(&tx, &forced, &params).unwrap());
}

#[test]
fn assets_flow_into_change() {
    let params = ProtocolParams::default();
    let wallet = address(0xa1);
    let receiver = address(0xb2);

    let assets = NonEmptyKeyValuePairs::Def(vec![(
        Hash::<28>::from([7u8; 28]),
        NonEmptyKeyValuePairs::Def(vec![(
            Bytes::from(b"token".to_vec()),
            PositiveCoin::try_from(500u64).unwrap(),
        )]),
    )]);

    let available = vec![utxo_at(
        1,
        0,
        &wallet,
        Value::Multiasset(10_000_000, assets.clone()),
    )];

    let mut tx = unbalanced_payment(&receiver, 3_000_000);

    balance_transaction(
        &mut tx,
        1,
        &params,
        &[],
        &available,
        &mut LargeFirst,
        &wallet,
        None,
    )
    .unwrap();

    let change = tx.transaction_body.outputs[1].value();

    match change {
        Value::Multiasset(_, change_assets) => assert_eq!(change_assets, &assets),
        Value::Coin(_) => panic!("change lost the multiasset part"),
    }

    assert!(is_balanced(&tx, &available, &params).unwrap());
}

struct FixedEvaluator(WireExUnits);

impl TxEvaluator for FixedEvaluator {
    fn evaluate(
        &mut self,
        tx: &Tx,
        _additional_utxos: &[UTxO],
    ) -> Result<Vec<(RedeemersKey, WireExUnits)>, ProviderError> {
        let Some(redeemers) = &tx.transaction_witness_set.redeemer else {
            return Ok(vec![]);
        };

        let keys: Vec<RedeemersKey> = match redeemers {
            Redeemers::List(items) => items
                .iter()
                .map(|r| RedeemersKey {
                    tag: r.tag,
                    index: r.index,
                })
                .collect(),
            Redeemers::Map(items) => items.iter().map(|(k, _)| k.clone()).collect(),
        };

        Ok(keys.into_iter().map(|k| (k, self.0)).collect())
    }
}

#[test]
fn evaluator_updates_budgets_and_integrity_hash() {
    let params = ProtocolParams::default();
    let wallet = address(0xa1);
    let receiver = address(0xb2);

    let available = vec![utxo_at(1, 0, &wallet, Value::Coin(10_000_000))];

    let mut tx = unbalanced_payment(&receiver, 3_000_000);
    tx.transaction_witness_set.redeemer = Some(Redeemers::List(vec![Redeemer {
        tag: RedeemerTag::Spend,
        index: 0,
        data: PlutusData::BigInt(BigInt::Int(42.into())),
        ex_units: WireExUnits { mem: 0, steps: 0 },
    }]));

    let budget = WireExUnits {
        mem: 1_000_000,
        steps: 500_000_000,
    };
    let mut evaluator = FixedEvaluator(budget);

    balance_transaction(
        &mut tx,
        1,
        &params,
        &[],
        &available,
        &mut LargeFirst,
        &wallet,
        Some(&mut evaluator),
    )
    .unwrap();

    match tx.transaction_witness_set.redeemer.as_ref().unwrap() {
        Redeemers::List(items) => assert_eq!(items[0].ex_units, budget),
        _ => panic!("redeemer shape changed"),
    }

    // redeemers present means the body commits to the script data
    assert!(tx.transaction_body.script_data_hash.is_some());

    // and the execution budget is priced into the fee
    assert!(tx.transaction_body.fee > 168_000);

    assert!(is_balanced(&tx, &available, &params).unwrap());
}

#[test]
fn balance_check_spots_imbalance() {
    let params = ProtocolParams::default();
    let wallet = address(0xa1);

    let available = vec![utxo_at(1, 0, &wallet, Value::Coin(10_000_000))];

    let tx = Tx {
        transaction_body: TransactionBody {
            inputs: vec![input(1, 0)].into(),
            outputs: vec![payment_output(&wallet, 5_000_000)],
            fee: 200_000,
            ..Default::default()
        },
        transaction_witness_set: WitnessSet::default(),
        success: true,
        auxiliary_data: Nullable::Null,
    };

    // 10 ada in, 5.2 ada out: not balanced
    assert!(!is_balanced(&tx, &available, &params).unwrap());
}
