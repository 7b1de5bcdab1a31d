use krios_addresses::{Address, Network, ShelleyAddress, ShelleyDelegationPart, ShelleyPaymentPart};
use krios_codec::Fragment;
use krios_crypto::hash::{Hash, Hasher};
use krios_crypto::key::ed25519::SecretKey;
use krios_primitives::conway::{Redeemers, TransactionOutput, Tx};
use krios_primitives::{ComputeHash, Metadatum};
use krios_txbuilder::{BuildConway, Input, Output, ScriptKind, StagingTransaction, TxBuilderError};
use krios_wallet::keystore::{NullKeyHandler, SecureKeyHandler};
use krios_wallet::PrivateKey;

fn address(seed: u8) -> Address {
    ShelleyAddress::new(
        Network::Mainnet,
        ShelleyPaymentPart::key_hash([seed; 28].into()),
        ShelleyDelegationPart::Null,
    )
    .into()
}

fn decode_tx(built: &krios_txbuilder::BuiltTransaction) -> Tx {
    Tx::decode_fragment(&built.tx_bytes).expect("built bytes decode")
}

#[test]
fn build_simplest_transaction() {
    let built = StagingTransaction::new()
        .input(Input::new([1u8; 32].into(), 0))
        .output(Output::new(address(2), 1_000_000))
        .fee(170_000)
        .build_conway_raw()
        .unwrap();

    let tx = decode_tx(&built);

    assert_eq!(tx.transaction_body.inputs.len(), 1);
    assert_eq!(tx.transaction_body.outputs.len(), 1);
    assert_eq!(tx.transaction_body.fee, 170_000);
    assert!(tx.success);
}

#[test]
fn inputs_are_sorted_deterministically() {
    let built = StagingTransaction::new()
        .input(Input::new([9u8; 32].into(), 1))
        .input(Input::new([1u8; 32].into(), 7))
        .input(Input::new([1u8; 32].into(), 2))
        .output(Output::new(address(2), 1_000_000))
        .build_conway_raw()
        .unwrap();

    let tx = decode_tx(&built);
    let inputs = &tx.transaction_body.inputs;

    assert_eq!(inputs[0].transaction_id, Hash::<32>::from([1u8; 32]));
    assert_eq!(inputs[0].index, 2);
    assert_eq!(inputs[1].index, 7);
    assert_eq!(inputs[2].transaction_id, Hash::<32>::from([9u8; 32]));
}

#[test]
fn no_inputs_is_an_error() {
    let result = StagingTransaction::new()
        .output(Output::new(address(2), 1_000_000))
        .build_conway_raw();

    assert!(matches!(result, Err(TxBuilderError::NoInputs)));
}

#[test]
fn transaction_hash_commits_to_the_body() {
    let built = StagingTransaction::new()
        .input(Input::new([1u8; 32].into(), 0))
        .output(Output::new(address(2), 1_000_000))
        .build_conway_raw()
        .unwrap();

    let tx = decode_tx(&built);

    assert_eq!(built.tx_hash, tx.transaction_body.compute_hash());
}

#[test]
fn mint_redeemer_points_at_the_policy() {
    let policy = Hash::<28>::from([3u8; 28]);
    let datum = krios_codec::to_vec(&42u64).unwrap();

    let built = StagingTransaction::new()
        .input(Input::new([1u8; 32].into(), 0))
        .output(Output::new(address(2), 1_000_000))
        .mint_asset(policy, b"token".to_vec(), 100)
        .unwrap()
        .add_mint_redeemer(policy, datum, None)
        .build_conway_raw()
        .unwrap();

    let tx = decode_tx(&built);

    assert!(tx.transaction_body.mint.is_some());

    match tx.transaction_witness_set.redeemer.unwrap() {
        Redeemers::List(items) => {
            assert_eq!(items.len(), 1);
            assert_eq!(items[0].index, 0);
        }
        _ => panic!("expected list redeemers"),
    }

    // a transaction with redeemers commits to its script data
    assert!(tx.transaction_body.script_data_hash.is_some());
}

#[test]
fn missing_redeemer_target_is_an_error() {
    let policy = Hash::<28>::from([3u8; 28]);
    let datum = krios_codec::to_vec(&42u64).unwrap();

    let result = StagingTransaction::new()
        .input(Input::new([1u8; 32].into(), 0))
        .output(Output::new(address(2), 1_000_000))
        .add_mint_redeemer(policy, datum, None)
        .build_conway_raw();

    assert!(matches!(result, Err(TxBuilderError::RedeemerTargetMissing)));
}

#[test]
fn datums_produce_the_legacy_integrity_hash() {
    let datum = krios_codec::to_vec(&42u64).unwrap();

    let built = StagingTransaction::new()
        .input(Input::new([1u8; 32].into(), 0))
        .output(Output::new(address(2), 1_000_000))
        .datum(datum)
        .build_conway_raw()
        .unwrap();

    let tx = decode_tx(&built);

    assert!(tx.transaction_witness_set.plutus_data.is_some());
    assert!(tx.transaction_body.script_data_hash.is_some());
}

#[test]
fn scripts_land_in_their_version_slot() {
    let blob = vec![0x4d, 0x01, 0x00, 0x00, 0x33, 0x22, 0x22, 0x00, 0x11];

    let built = StagingTransaction::new()
        .input(Input::new([1u8; 32].into(), 0))
        .output(Output::new(address(2), 1_000_000))
        .script(ScriptKind::PlutusV2, blob.clone())
        .build_conway_raw()
        .unwrap();

    let tx = decode_tx(&built);
    let witness = &tx.transaction_witness_set;

    assert!(witness.plutus_v1_script.is_none());
    assert_eq!(witness.plutus_v2_script.as_ref().unwrap().len(), 1);
    assert!(witness.plutus_v3_script.is_none());
}

#[test]
fn metadata_hash_lands_in_the_body() {
    let built = StagingTransaction::new()
        .input(Input::new([1u8; 32].into(), 0))
        .output(Output::new(address(2), 1_000_000))
        .metadata(674, Metadatum::Text("krios test".into()))
        .build_conway_raw()
        .unwrap();

    let tx = decode_tx(&built);

    let aux: Option<krios_primitives::conway::AuxiliaryData> = tx.auxiliary_data.clone().into();
    let aux = aux.expect("auxiliary data present");

    assert_eq!(
        tx.transaction_body.auxiliary_data_hash,
        Some(aux.compute_hash())
    );
}

#[test]
fn inline_datum_and_script_ref_survive_the_round_trip() {
    let datum = krios_codec::to_vec(&42u64).unwrap();
    let blob = vec![0x4d, 0x01, 0x00, 0x00, 0x33, 0x22, 0x22, 0x00, 0x11];

    let output = Output::new(address(2), 2_000_000)
        .set_inline_datum(datum)
        .set_inline_script(ScriptKind::PlutusV2, blob);

    let built = StagingTransaction::new()
        .input(Input::new([1u8; 32].into(), 0))
        .output(output)
        .build_conway_raw()
        .unwrap();

    let tx = decode_tx(&built);

    match &tx.transaction_body.outputs[0] {
        TransactionOutput::PostAlonzo(out) => {
            assert!(out.datum_option.is_some());
            assert!(out.script_ref.is_some());
        }
        _ => panic!("builder must emit the map output form"),
    }
}

#[test]
fn signing_adds_a_verifiable_witness() {
    let key = SecretKey::from([0x42u8; 32]);
    let public = key.public_key();

    let built = StagingTransaction::new()
        .input(Input::new([1u8; 32].into(), 0))
        .output(Output::new(address(2), 1_000_000))
        .build_conway_raw()
        .unwrap();

    let tx_hash = built.tx_hash;
    let signed = built.sign(&PrivateKey::Normal(key)).unwrap();

    let tx = decode_tx(&signed);
    let witnesses = tx.transaction_witness_set.vkeywitness.unwrap();

    assert_eq!(witnesses.len(), 1);
    assert_eq!(witnesses[0].vkey.as_ref(), public.as_ref());

    let signature = witnesses[0]
        .signature
        .as_ref()
        .try_into()
        .expect("signature size");
    assert!(public.verify(*tx_hash, &signature));
}

#[test]
fn handler_signatures_match_direct_signing() {
    let built = StagingTransaction::new()
        .input(Input::new([1u8; 32].into(), 0))
        .output(Output::new(address(2), 1_000_000))
        .build_conway_raw()
        .unwrap();

    let mut handler = NullKeyHandler::new(7);
    let expected_key = handler.public_keys(b"", &[]).unwrap()[0];

    let signed = built.sign_with_handler(&mut handler, b"", &[]).unwrap();

    let tx = decode_tx(&signed);
    let witnesses = tx.transaction_witness_set.vkeywitness.unwrap();

    assert_eq!(witnesses[0].vkey.as_ref(), expected_key.as_ref());
}

#[test]
fn staging_transaction_survives_json_persistence() {
    let staged = StagingTransaction::new()
        .input(Input::new([1u8; 32].into(), 0))
        .output(Output::new(address(2), 1_000_000))
        .fee(170_000)
        .change_address(address(3));

    let json = serde_json::to_string(&staged).unwrap();
    let restored: StagingTransaction = serde_json::from_str(&json).unwrap();

    assert_eq!(restored, staged);

    // both copies build to identical bytes
    let a = staged.build_conway_raw().unwrap();
    let b = restored.build_conway_raw().unwrap();
    assert_eq!(a.tx_bytes, b.tx_bytes);
}

#[test]
fn script_hash_prefixes_differ_by_kind() {
    let blob = vec![0x4d, 0x01, 0x00, 0x00, 0x33, 0x22, 0x22, 0x00, 0x11];

    let v1 = Hasher::<224>::hash_tagged(&blob, ScriptKind::PlutusV1.tag());
    let v2 = Hasher::<224>::hash_tagged(&blob, ScriptKind::PlutusV2.tag());

    assert_ne!(v1, v2);
}
