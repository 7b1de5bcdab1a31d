use krios_addresses::Address as KriosAddress;
use krios_crypto::{
    hash::{Hash, Hasher},
    key::ed25519,
};
use krios_primitives::conway::{
    Anchor, Certificate, GovActionId, LanguageViews, ProposalProcedure, Voter,
};
use krios_primitives::{Bytes, Metadatum};
use krios_wallet::hd::DerivationPath;
use krios_wallet::keystore::SecureKeyHandler;
use krios_wallet::PrivateKey;

use std::{collections::BTreeMap, fmt, ops::Deref, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::TxBuilderError;

use super::TransactionStatus;

/// A transaction under construction: a bag of everything declared so far,
/// free of ordering or validity concerns until it is built.
#[derive(Default, Serialize, Deserialize, PartialEq, Debug)]
pub struct StagingTransaction {
    pub version: String,
    pub status: TransactionStatus,
    pub inputs: Option<Vec<Input>>,
    pub reference_inputs: Option<Vec<Input>>,
    pub outputs: Option<Vec<Output>>,
    pub fee: Option<u64>,
    pub mint: Option<MintAssets>,
    pub valid_from_slot: Option<u64>,
    pub invalid_from_slot: Option<u64>,
    pub network_id: Option<u8>,
    pub collateral_inputs: Option<Vec<Input>>,
    pub collateral_output: Option<Output>,
    pub total_collateral: Option<u64>,
    pub disclosed_signers: Option<Vec<Hash<28>>>,
    pub scripts: Option<BTreeMap<Hash<28>, Script>>,
    pub datums: Option<BTreeMap<Hash<32>, Bytes>>,
    pub redeemers: Option<Redeemers>,
    pub certificates: Option<Vec<Certificate>>,
    pub withdrawals: Option<BTreeMap<Bytes, u64>>,
    pub votes: Option<Vec<VoteCast>>,
    pub proposals: Option<Vec<ProposalProcedure>>,
    pub metadata: Option<BTreeMap<u64, Metadatum>>,
    pub donation: Option<u64>,
    pub treasury_value: Option<u64>,
    pub language_views: Option<LanguageViews>,
    pub script_data_hash: Option<Hash<32>>,
    pub signature_amount_override: Option<u8>,
    pub change_address: Option<Address>,
}

impl StagingTransaction {
    pub fn new() -> Self {
        Self {
            version: String::from("v1"),
            status: TransactionStatus::Staging,
            ..Default::default()
        }
    }

    pub fn input(mut self, input: Input) -> Self {
        let mut txins = self.inputs.unwrap_or_default();
        txins.push(input);
        self.inputs = Some(txins);
        self
    }

    pub fn remove_input(mut self, input: Input) -> Self {
        let mut txins = self.inputs.unwrap_or_default();
        txins.retain(|x| *x != input);
        self.inputs = Some(txins);
        self
    }

    pub fn reference_input(mut self, input: Input) -> Self {
        let mut ref_txins = self.reference_inputs.unwrap_or_default();
        ref_txins.push(input);
        self.reference_inputs = Some(ref_txins);
        self
    }

    pub fn remove_reference_input(mut self, input: Input) -> Self {
        let mut ref_txins = self.reference_inputs.unwrap_or_default();
        ref_txins.retain(|x| *x != input);
        self.reference_inputs = Some(ref_txins);
        self
    }

    pub fn output(mut self, output: Output) -> Self {
        let mut txouts = self.outputs.unwrap_or_default();
        txouts.push(output);
        self.outputs = Some(txouts);
        self
    }

    pub fn remove_output(mut self, index: usize) -> Self {
        let mut txouts = self.outputs.unwrap_or_default();
        txouts.remove(index);
        self.outputs = Some(txouts);
        self
    }

    pub fn fee(mut self, fee: u64) -> Self {
        self.fee = Some(fee);
        self
    }

    pub fn clear_fee(mut self) -> Self {
        self.fee = None;
        self
    }

    pub fn mint_asset(
        mut self,
        policy: Hash<28>,
        name: Vec<u8>,
        amount: i64,
    ) -> Result<Self, TxBuilderError> {
        if name.len() > 32 {
            return Err(TxBuilderError::AssetNameTooLong);
        }

        let mut mint = self.mint.map(|x| x.0).unwrap_or_default();

        *mint
            .entry(policy)
            .or_default()
            .entry(name.into())
            .or_insert(0) += amount;

        self.mint = Some(MintAssets(mint));

        Ok(self)
    }

    pub fn remove_mint_asset(mut self, policy: Hash<28>, name: Vec<u8>) -> Self {
        let mut mint = if let Some(mint) = self.mint {
            mint.0
        } else {
            return self;
        };

        if let Some(assets) = mint.get_mut(&policy) {
            assets.remove(&Bytes::from(name));
            if assets.is_empty() {
                mint.remove(&policy);
            }
        }

        self.mint = Some(MintAssets(mint));

        self
    }

    pub fn valid_from_slot(mut self, slot: u64) -> Self {
        self.valid_from_slot = Some(slot);
        self
    }

    pub fn invalid_from_slot(mut self, slot: u64) -> Self {
        self.invalid_from_slot = Some(slot);
        self
    }

    pub fn network_id(mut self, id: u8) -> Self {
        self.network_id = Some(id);
        self
    }

    pub fn collateral_input(mut self, input: Input) -> Self {
        let mut coll_ins = self.collateral_inputs.unwrap_or_default();
        coll_ins.push(input);
        self.collateral_inputs = Some(coll_ins);
        self
    }

    pub fn collateral_output(mut self, output: Output) -> Self {
        self.collateral_output = Some(output);
        self
    }

    pub fn total_collateral(mut self, lovelace: u64) -> Self {
        self.total_collateral = Some(lovelace);
        self
    }

    pub fn disclosed_signer(mut self, pub_key_hash: Hash<28>) -> Self {
        let mut disclosed_signers = self.disclosed_signers.unwrap_or_default();
        disclosed_signers.push(pub_key_hash);
        self.disclosed_signers = Some(disclosed_signers);
        self
    }

    pub fn script(mut self, language: ScriptKind, bytes: Vec<u8>) -> Self {
        let mut scripts = self.scripts.unwrap_or_default();

        let hash = Hasher::<224>::hash_tagged(bytes.as_ref(), language.tag());

        scripts.insert(
            hash,
            Script {
                kind: language,
                bytes: bytes.into(),
            },
        );

        self.scripts = Some(scripts);
        self
    }

    pub fn remove_script_by_hash(mut self, script_hash: Hash<28>) -> Self {
        let mut scripts = self.scripts.unwrap_or_default();

        scripts.remove(&script_hash);

        self.scripts = Some(scripts);
        self
    }

    pub fn datum(mut self, datum: Vec<u8>) -> Self {
        let mut datums = self.datums.unwrap_or_default();

        let hash = Hasher::<256>::hash(&datum);

        datums.insert(hash, datum.into());
        self.datums = Some(datums);
        self
    }

    pub fn remove_datum_by_hash(mut self, datum_hash: Hash<32>) -> Self {
        let mut datums = self.datums.unwrap_or_default();

        datums.remove(&datum_hash);
        self.datums = Some(datums);
        self
    }

    pub fn add_spend_redeemer(
        mut self,
        input: Input,
        plutus_data: Vec<u8>,
        ex_units: Option<ExUnits>,
    ) -> Self {
        let mut rdmrs = self.redeemers.map(|x| x.0).unwrap_or_default();

        rdmrs.insert(RedeemerPurpose::Spend(input), (plutus_data.into(), ex_units));

        self.redeemers = Some(Redeemers(rdmrs));

        self
    }

    pub fn remove_spend_redeemer(mut self, input: Input) -> Self {
        let mut rdmrs = self.redeemers.map(|x| x.0).unwrap_or_default();

        rdmrs.remove(&RedeemerPurpose::Spend(input));

        self.redeemers = Some(Redeemers(rdmrs));

        self
    }

    pub fn add_mint_redeemer(
        mut self,
        policy: Hash<28>,
        plutus_data: Vec<u8>,
        ex_units: Option<ExUnits>,
    ) -> Self {
        let mut rdmrs = self.redeemers.map(|x| x.0).unwrap_or_default();

        rdmrs.insert(RedeemerPurpose::Mint(policy), (plutus_data.into(), ex_units));

        self.redeemers = Some(Redeemers(rdmrs));

        self
    }

    pub fn remove_mint_redeemer(mut self, policy: Hash<28>) -> Self {
        let mut rdmrs = self.redeemers.map(|x| x.0).unwrap_or_default();

        rdmrs.remove(&RedeemerPurpose::Mint(policy));

        self.redeemers = Some(Redeemers(rdmrs));

        self
    }

    /// Redeemer for the certificate at the given position in the staged
    /// certificate list.
    pub fn add_cert_redeemer(
        mut self,
        certificate_index: u32,
        plutus_data: Vec<u8>,
        ex_units: Option<ExUnits>,
    ) -> Self {
        let mut rdmrs = self.redeemers.map(|x| x.0).unwrap_or_default();

        rdmrs.insert(
            RedeemerPurpose::Cert(certificate_index),
            (plutus_data.into(), ex_units),
        );

        self.redeemers = Some(Redeemers(rdmrs));

        self
    }

    /// Redeemer for the withdrawal against the given reward account.
    pub fn add_reward_redeemer(
        mut self,
        reward_account: Vec<u8>,
        plutus_data: Vec<u8>,
        ex_units: Option<ExUnits>,
    ) -> Self {
        let mut rdmrs = self.redeemers.map(|x| x.0).unwrap_or_default();

        rdmrs.insert(
            RedeemerPurpose::Reward(reward_account.into()),
            (plutus_data.into(), ex_units),
        );

        self.redeemers = Some(Redeemers(rdmrs));

        self
    }

    /// Redeemer for the vote cast by the given voter.
    pub fn add_vote_redeemer(
        mut self,
        voter: Voter,
        plutus_data: Vec<u8>,
        ex_units: Option<ExUnits>,
    ) -> Self {
        let mut rdmrs = self.redeemers.map(|x| x.0).unwrap_or_default();

        rdmrs.insert(
            RedeemerPurpose::Vote(voter),
            (plutus_data.into(), ex_units),
        );

        self.redeemers = Some(Redeemers(rdmrs));

        self
    }

    /// Redeemer for the proposal at the given position in the staged
    /// proposal list.
    pub fn add_proposal_redeemer(
        mut self,
        proposal_index: u32,
        plutus_data: Vec<u8>,
        ex_units: Option<ExUnits>,
    ) -> Self {
        let mut rdmrs = self.redeemers.map(|x| x.0).unwrap_or_default();

        rdmrs.insert(
            RedeemerPurpose::Propose(proposal_index),
            (plutus_data.into(), ex_units),
        );

        self.redeemers = Some(Redeemers(rdmrs));

        self
    }

    pub fn certificate(mut self, cert: Certificate) -> Self {
        let mut certs = self.certificates.unwrap_or_default();
        certs.push(cert);
        self.certificates = Some(certs);
        self
    }

    pub fn withdrawal(mut self, reward_account: Vec<u8>, amount: u64) -> Self {
        let mut withdrawals = self.withdrawals.unwrap_or_default();
        withdrawals.insert(reward_account.into(), amount);
        self.withdrawals = Some(withdrawals);
        self
    }

    pub fn vote(mut self, vote: VoteCast) -> Self {
        let mut votes = self.votes.unwrap_or_default();
        votes.push(vote);
        self.votes = Some(votes);
        self
    }

    pub fn proposal(mut self, proposal: ProposalProcedure) -> Self {
        let mut proposals = self.proposals.unwrap_or_default();
        proposals.push(proposal);
        self.proposals = Some(proposals);
        self
    }

    pub fn metadata(mut self, label: u64, content: Metadatum) -> Self {
        let mut metadata = self.metadata.unwrap_or_default();
        metadata.insert(label, content);
        self.metadata = Some(metadata);
        self
    }

    pub fn donation(mut self, lovelace: u64) -> Self {
        self.donation = Some(lovelace);
        self
    }

    pub fn treasury_value(mut self, lovelace: u64) -> Self {
        self.treasury_value = Some(lovelace);
        self
    }

    /// Cost model views for the script integrity hash. Without them the
    /// built transaction carries no script data hash unless one is set
    /// explicitly.
    pub fn language_views(mut self, views: LanguageViews) -> Self {
        self.language_views = Some(views);
        self
    }

    pub fn script_data_hash(mut self, hash: Hash<32>) -> Self {
        self.script_data_hash = Some(hash);
        self
    }

    pub fn clear_script_data_hash(mut self) -> Self {
        self.script_data_hash = None;
        self
    }

    pub fn signature_amount_override(mut self, amount: u8) -> Self {
        self.signature_amount_override = Some(amount);
        self
    }

    pub fn change_address(mut self, address: KriosAddress) -> Self {
        self.change_address = Some(Address(address));
        self
    }
}

#[derive(Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Debug, Clone, Hash)]
pub struct Input {
    pub tx_hash: Hash<32>,
    pub txo_index: u64,
}

impl Input {
    pub fn new(tx_hash: Hash<32>, txo_index: u64) -> Self {
        Self { tx_hash, txo_index }
    }
}

#[derive(Serialize, Deserialize, PartialEq, Eq, Debug, Clone)]
pub struct Output {
    pub address: Address,
    pub lovelace: u64,
    pub assets: Option<OutputAssets>,
    pub datum: Option<Datum>,
    pub script: Option<Script>,
}

impl Output {
    pub fn new(address: KriosAddress, lovelace: u64) -> Self {
        Self {
            address: Address(address),
            lovelace,
            assets: None,
            datum: None,
            script: None,
        }
    }

    pub fn add_asset(
        mut self,
        policy: Hash<28>,
        name: Vec<u8>,
        amount: u64,
    ) -> Result<Self, TxBuilderError> {
        if name.len() > 32 {
            return Err(TxBuilderError::AssetNameTooLong);
        }

        let mut assets = self.assets.map(|x| x.0).unwrap_or_default();

        *assets
            .entry(policy)
            .or_default()
            .entry(name.into())
            .or_insert(0) += amount;

        self.assets = Some(OutputAssets(assets));

        Ok(self)
    }

    pub fn set_inline_datum(mut self, plutus_data: Vec<u8>) -> Self {
        self.datum = Some(Datum {
            kind: DatumKind::Inline,
            bytes: plutus_data.into(),
        });

        self
    }

    pub fn set_datum_hash(mut self, datum_hash: Hash<32>) -> Self {
        self.datum = Some(Datum {
            kind: DatumKind::Hash,
            bytes: datum_hash.to_vec().into(),
        });

        self
    }

    pub fn set_inline_script(mut self, language: ScriptKind, bytes: Vec<u8>) -> Self {
        self.script = Some(Script {
            kind: language,
            bytes: bytes.into(),
        });

        self
    }
}

#[derive(Serialize, Deserialize, PartialEq, Eq, Debug, Clone, Default)]
pub struct OutputAssets(pub BTreeMap<Hash<28>, BTreeMap<Bytes, u64>>);

impl Deref for OutputAssets {
    type Target = BTreeMap<Hash<28>, BTreeMap<Bytes, u64>>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[derive(Serialize, Deserialize, PartialEq, Eq, Debug, Clone, Default)]
pub struct MintAssets(pub BTreeMap<Hash<28>, BTreeMap<Bytes, i64>>);

impl Deref for MintAssets {
    type Target = BTreeMap<Hash<28>, BTreeMap<Bytes, i64>>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[derive(Serialize, Deserialize, PartialEq, Eq, Debug, Clone, Copy, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ScriptKind {
    Native,
    PlutusV1,
    PlutusV2,
    PlutusV3,
}

impl ScriptKind {
    /// The prefix byte the script hash commits to.
    pub fn tag(&self) -> u8 {
        match self {
            ScriptKind::Native => 0,
            ScriptKind::PlutusV1 => 1,
            ScriptKind::PlutusV2 => 2,
            ScriptKind::PlutusV3 => 3,
        }
    }
}

#[derive(Serialize, Deserialize, PartialEq, Eq, Debug, Clone)]
pub struct Script {
    pub kind: ScriptKind,
    pub bytes: Bytes,
}

impl Script {
    pub fn new(kind: ScriptKind, bytes: Vec<u8>) -> Self {
        Self {
            kind,
            bytes: bytes.into(),
        }
    }
}

#[derive(Serialize, Deserialize, PartialEq, Eq, Debug, Clone)]
#[serde(rename_all = "snake_case")]
pub enum DatumKind {
    Hash,
    Inline,
}

#[derive(Serialize, Deserialize, PartialEq, Eq, Debug, Clone)]
pub struct Datum {
    pub kind: DatumKind,
    pub bytes: Bytes,
}

/// A governance vote staged for inclusion.
#[derive(Serialize, Deserialize, PartialEq, Eq, Debug, Clone)]
pub struct VoteCast {
    pub voter: Voter,
    pub action: GovActionId,
    pub vote: krios_primitives::conway::Vote,
    pub anchor: Option<Anchor>,
}

/// What a redeemer witnesses, before indices into the body exist.
#[derive(Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Debug, Clone)]
pub enum RedeemerPurpose {
    Spend(Input),
    Mint(Hash<28>),
    Cert(u32),
    Reward(Bytes),
    Vote(Voter),
    Propose(u32),
}

#[derive(Serialize, Deserialize, PartialEq, Eq, Debug, Clone, Copy)]
pub struct ExUnits {
    pub mem: u64,
    pub steps: u64,
}

#[derive(Serialize, Deserialize, PartialEq, Eq, Debug, Default)]
pub struct Redeemers(pub BTreeMap<RedeemerPurpose, (Bytes, Option<ExUnits>)>);

impl Deref for Redeemers {
    type Target = BTreeMap<RedeemerPurpose, (Bytes, Option<ExUnits>)>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Address wrapper with text-form serde.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Address(pub KriosAddress);

impl Deref for Address {
    type Target = KriosAddress;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<KriosAddress> for Address {
    fn from(value: KriosAddress) -> Self {
        Self(value)
    }
}

impl Serialize for Address {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct AddressVisitor;

        impl serde::de::Visitor<'_> for AddressVisitor {
            type Value = Address;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a bech32, base58 or hex encoded address")
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Self::Value, E> {
                KriosAddress::from_str(v).map(Address).map_err(E::custom)
            }
        }

        deserializer.deserialize_str(AddressVisitor)
    }
}

#[derive(Serialize, Deserialize, PartialEq, Eq, Debug, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum BuilderEra {
    Conway,
}

/// The wire-ready result of building a staging transaction.
#[derive(Serialize, Deserialize, PartialEq, Debug)]
pub struct BuiltTransaction {
    pub version: String,
    pub era: BuilderEra,
    pub status: TransactionStatus,
    pub tx_hash: Hash<32>,
    pub tx_bytes: Bytes,
    pub signatures: Option<BTreeMap<Bytes, Bytes>>,
}

impl BuiltTransaction {
    pub fn sign(self, private_key: &PrivateKey) -> Result<Self, TxBuilderError> {
        let pubkey = private_key.public_key();
        let signature = private_key.sign(*self.tx_hash);

        self.add_signature(pubkey, signature)
    }

    /// Collects one signature per derivation path from a secure key
    /// handler; the handler never exposes its private material.
    pub fn sign_with_handler(
        mut self,
        handler: &mut dyn SecureKeyHandler,
        passphrase: &[u8],
        paths: &[DerivationPath],
    ) -> Result<Self, TxBuilderError> {
        let keys = handler
            .public_keys(passphrase, paths)
            .map_err(|_| TxBuilderError::MalformedKey)?;

        let signatures = handler
            .sign(passphrase, self.tx_hash.as_ref(), paths)
            .map_err(|_| TxBuilderError::MalformedKey)?;

        for (key, signature) in keys.into_iter().zip(signatures) {
            self = self.add_signature(key, signature)?;
        }

        Ok(self)
    }

    pub fn add_signature(
        mut self,
        pub_key: ed25519::PublicKey,
        signature: ed25519::Signature,
    ) -> Result<Self, TxBuilderError> {
        use krios_codec::Fragment;
        use krios_primitives::conway::{Tx, VKeyWitness};

        let mut new_sigs = self.signatures.unwrap_or_default();

        new_sigs.insert(
            Bytes::from(pub_key.as_ref().to_vec()),
            Bytes::from(signature.as_ref().to_vec()),
        );

        let mut tx =
            Tx::decode_fragment(&self.tx_bytes).map_err(|_| TxBuilderError::CorruptedTxBytes)?;

        let mut vkey_witnesses: Vec<VKeyWitness> = tx
            .transaction_witness_set
            .vkeywitness
            .map(|x| x.to_vec())
            .unwrap_or_default();

        vkey_witnesses.retain(|w| w.vkey.as_ref() != pub_key.as_ref());
        vkey_witnesses.push(VKeyWitness {
            vkey: pub_key.as_ref().to_vec().into(),
            signature: signature.as_ref().to_vec().into(),
        });

        tx.transaction_witness_set.vkeywitness = vkey_witnesses.try_into().ok();

        self.tx_bytes = tx
            .encode_fragment()
            .map_err(|_| TxBuilderError::CorruptedTxBytes)?
            .into();

        self.signatures = Some(new_sigs);
        self.status = TransactionStatus::Signed;

        Ok(self)
    }

    pub fn remove_signature(mut self, pub_key: ed25519::PublicKey) -> Result<Self, TxBuilderError> {
        use krios_codec::Fragment;
        use krios_primitives::conway::{Tx, VKeyWitness};

        let mut new_sigs = self.signatures.unwrap_or_default();

        new_sigs.remove(&Bytes::from(pub_key.as_ref().to_vec()));

        let mut tx =
            Tx::decode_fragment(&self.tx_bytes).map_err(|_| TxBuilderError::CorruptedTxBytes)?;

        let mut vkey_witnesses: Vec<VKeyWitness> = tx
            .transaction_witness_set
            .vkeywitness
            .map(|x| x.to_vec())
            .unwrap_or_default();

        vkey_witnesses.retain(|w| w.vkey.as_ref() != pub_key.as_ref());

        tx.transaction_witness_set.vkeywitness = vkey_witnesses.try_into().ok();

        self.tx_bytes = tx
            .encode_fragment()
            .map_err(|_| TxBuilderError::CorruptedTxBytes)?
            .into();

        self.signatures = Some(new_sigs);

        Ok(self)
    }
}
