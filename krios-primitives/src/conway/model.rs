//! Ledger primitives and cbor codec for the Conway era
//!
//! Handcrafted, idiomatic rust artifacts based on the [Conway CDDL](https://github.com/IntersectMBO/cardano-ledger/blob/master/eras/conway/impl/cddl-files/conway.cddl) file in IntersectMBO repo.

use serde::{Deserialize, Serialize};

use krios_codec::data::{Tag, Type};
use krios_codec::{decode, encode, Decode, Decoder, Encode, Encoder};

pub use crate::{
    plutus_data::*, AddrKeyhash, AssetName, Bytes, CborWrap, Coin, CostModel, DnsName, Epoch,
    ExUnitPrices, ExUnits, Genesishash, Hash, IPv4, IPv6, KeyValuePairs, Metadata, Metadatum,
    MetadatumLabel, NetworkId, NonEmptyKeyValuePairs, NonEmptySet, NonZeroInt, Nullable,
    PlutusScript, PolicyId, PoolKeyhash, PoolMetadata, PoolMetadataHash, Port, PositiveCoin,
    PositiveInterval, ProtocolVersion, RationalNumber, Relay, RewardAccount, ScriptHash, Set,
    StakeCredential, TransactionIndex, TransactionInput, UnitInterval,
};

pub type VrfKeyhash = Hash<32>;

pub type Multiasset<A> = NonEmptyKeyValuePairs<PolicyId, NonEmptyKeyValuePairs<AssetName, A>>;

pub type Mint = Multiasset<NonZeroInt>;

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub enum Value {
    Coin(Coin),
    Multiasset(Coin, Multiasset<PositiveCoin>),
}

impl<'b> Decode<'b> for Value {
    fn decode(d: &mut Decoder<'b>) -> Result<Self, decode::Error> {
        match d.datatype()? {
            Type::U8 | Type::U16 | Type::U32 | Type::U64 => Ok(Value::Coin(d.u64()?)),
            Type::Array | Type::ArrayIndef => {
                d.array()?;
                let coin = d.u64()?;
                let multiasset = d.decode()?;
                Ok(Value::Multiasset(coin, multiasset))
            }
            _ => Err(decode::Error::message("unknown cbor data type for value")),
        }
    }
}

impl Encode for Value {
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>) -> Result<(), encode::Error<W::Error>> {
        match self {
            Value::Coin(coin) => {
                e.u64(*coin)?;
            }
            Value::Multiasset(coin, multiasset) => {
                e.array(2)?;
                e.u64(*coin)?;
                e.encode(multiasset)?;
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValueError {
    #[error("coin amount overflowed")]
    CoinOverflow,

    #[error("subtraction would drive a quantity negative")]
    Underflow,
}

impl Value {
    pub fn coin(&self) -> Coin {
        match self {
            Value::Coin(coin) => *coin,
            Value::Multiasset(coin, _) => *coin,
        }
    }

    fn asset_map(&self) -> std::collections::BTreeMap<(PolicyId, Vec<u8>), u64> {
        let mut out = std::collections::BTreeMap::new();

        if let Value::Multiasset(_, multiasset) = self {
            for (policy, assets) in multiasset.iter() {
                for (name, quantity) in assets.iter() {
                    let entry: &mut u64 = out.entry((*policy, name.to_vec())).or_default();
                    *entry = entry.saturating_add(u64::from(quantity));
                }
            }
        }

        out
    }

    fn from_parts(
        coin: Coin,
        assets: std::collections::BTreeMap<(PolicyId, Vec<u8>), u64>,
    ) -> Value {
        let mut by_policy: std::collections::BTreeMap<PolicyId, Vec<(AssetName, PositiveCoin)>> =
            std::collections::BTreeMap::new();

        for ((policy, name), quantity) in assets {
            // zero quantities are pruned during normalization
            if let Ok(quantity) = PositiveCoin::try_from(quantity) {
                by_policy
                    .entry(policy)
                    .or_default()
                    .push((name.into(), quantity));
            }
        }

        let multiasset: Vec<_> = by_policy
            .into_iter()
            .filter_map(|(policy, assets)| {
                NonEmptyKeyValuePairs::from_vec(assets).map(|assets| (policy, assets))
            })
            .collect();

        match NonEmptyKeyValuePairs::from_vec(multiasset) {
            Some(multiasset) => Value::Multiasset(coin, multiasset),
            None => Value::Coin(coin),
        }
    }

    /// Canonical form: zero quantities pruned, empty policies removed, the
    /// plain coin shape when no assets remain. Idempotent.
    pub fn normalize(&self) -> Value {
        Value::from_parts(self.coin(), self.asset_map())
    }

    pub fn add(&self, other: &Value) -> Result<Value, ValueError> {
        let coin = self
            .coin()
            .checked_add(other.coin())
            .ok_or(ValueError::CoinOverflow)?;

        let mut assets = self.asset_map();
        for (key, quantity) in other.asset_map() {
            let entry = assets.entry(key).or_default();
            *entry = entry.checked_add(quantity).ok_or(ValueError::CoinOverflow)?;
        }

        Ok(Value::from_parts(coin, assets))
    }

    /// Fails if any resulting quantity would go negative; minting contexts
    /// should work over signed quantities instead.
    pub fn sub(&self, other: &Value) -> Result<Value, ValueError> {
        let coin = self
            .coin()
            .checked_sub(other.coin())
            .ok_or(ValueError::Underflow)?;

        let mut assets = self.asset_map();
        for (key, quantity) in other.asset_map() {
            let entry = assets.entry(key).or_default();
            *entry = entry.checked_sub(quantity).ok_or(ValueError::Underflow)?;
        }

        Ok(Value::from_parts(coin, assets))
    }

    /// True when every dimension of `self` holds at least as much as
    /// `other`.
    pub fn geq(&self, other: &Value) -> bool {
        if self.coin() < other.coin() {
            return false;
        }

        let assets = self.asset_map();
        other
            .asset_map()
            .into_iter()
            .all(|(key, quantity)| assets.get(&key).copied().unwrap_or(0) >= quantity)
    }

    pub fn is_zero(&self) -> bool {
        self.coin() == 0 && self.asset_map().values().all(|q| *q == 0)
    }
}

pub type Withdrawals = KeyValuePairs<RewardAccount, Coin>;

pub type RequiredSigners = NonEmptySet<AddrKeyhash>;

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub enum Certificate {
    StakeRegistration(StakeCredential),
    StakeDeregistration(StakeCredential),
    StakeDelegation(StakeCredential, PoolKeyhash),
    PoolRegistration {
        operator: PoolKeyhash,
        vrf_keyhash: VrfKeyhash,
        pledge: Coin,
        cost: Coin,
        margin: UnitInterval,
        reward_account: RewardAccount,
        pool_owners: Set<AddrKeyhash>,
        relays: Vec<Relay>,
        pool_metadata: Option<PoolMetadata>,
    },
    PoolRetirement(PoolKeyhash, Epoch),

    Reg(StakeCredential, Coin),
    UnReg(StakeCredential, Coin),
    VoteDeleg(StakeCredential, DRep),
    StakeVoteDeleg(StakeCredential, PoolKeyhash, DRep),
    StakeRegDeleg(StakeCredential, PoolKeyhash, Coin),
    VoteRegDeleg(StakeCredential, DRep, Coin),
    StakeVoteRegDeleg(StakeCredential, PoolKeyhash, DRep, Coin),

    AuthCommitteeHot(CommitteeColdCredential, CommitteeHotCredential),
    ResignCommitteeCold(CommitteeColdCredential, Option<Anchor>),
    RegDRepCert(DRepCredential, Coin, Option<Anchor>),
    UnRegDRepCert(DRepCredential, Coin),
    UpdateDRepCert(DRepCredential, Option<Anchor>),
}

impl<'b> Decode<'b> for Certificate {
    fn decode(d: &mut Decoder<'b>) -> Result<Self, decode::Error> {
        d.array()?;

        match d.u16()? {
            0 => Ok(Certificate::StakeRegistration(d.decode()?)),
            1 => Ok(Certificate::StakeDeregistration(d.decode()?)),
            2 => Ok(Certificate::StakeDelegation(d.decode()?, d.decode()?)),
            3 => Ok(Certificate::PoolRegistration {
                operator: d.decode()?,
                vrf_keyhash: d.decode()?,
                pledge: d.u64()?,
                cost: d.u64()?,
                margin: d.decode()?,
                reward_account: d.decode()?,
                pool_owners: d.decode()?,
                relays: d.decode()?,
                pool_metadata: d.decode()?,
            }),
            4 => Ok(Certificate::PoolRetirement(d.decode()?, d.u64()?)),
            7 => Ok(Certificate::Reg(d.decode()?, d.u64()?)),
            8 => Ok(Certificate::UnReg(d.decode()?, d.u64()?)),
            9 => Ok(Certificate::VoteDeleg(d.decode()?, d.decode()?)),
            10 => Ok(Certificate::StakeVoteDeleg(
                d.decode()?,
                d.decode()?,
                d.decode()?,
            )),
            11 => Ok(Certificate::StakeRegDeleg(
                d.decode()?,
                d.decode()?,
                d.u64()?,
            )),
            12 => Ok(Certificate::VoteRegDeleg(d.decode()?, d.decode()?, d.u64()?)),
            13 => Ok(Certificate::StakeVoteRegDeleg(
                d.decode()?,
                d.decode()?,
                d.decode()?,
                d.u64()?,
            )),
            14 => Ok(Certificate::AuthCommitteeHot(d.decode()?, d.decode()?)),
            15 => Ok(Certificate::ResignCommitteeCold(d.decode()?, d.decode()?)),
            16 => Ok(Certificate::RegDRepCert(d.decode()?, d.u64()?, d.decode()?)),
            17 => Ok(Certificate::UnRegDRepCert(d.decode()?, d.u64()?)),
            18 => Ok(Certificate::UpdateDRepCert(d.decode()?, d.decode()?)),
            _ => Err(decode::Error::message("unknown certificate type")),
        }
    }
}

impl Encode for Certificate {
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>) -> Result<(), encode::Error<W::Error>> {
        match self {
            Certificate::StakeRegistration(a) => {
                e.array(2)?;
                e.u16(0)?;
                e.encode(a)?;
            }
            Certificate::StakeDeregistration(a) => {
                e.array(2)?;
                e.u16(1)?;
                e.encode(a)?;
            }
            Certificate::StakeDelegation(a, b) => {
                e.array(3)?;
                e.u16(2)?;
                e.encode(a)?;
                e.encode(b)?;
            }
            Certificate::PoolRegistration {
                operator,
                vrf_keyhash,
                pledge,
                cost,
                margin,
                reward_account,
                pool_owners,
                relays,
                pool_metadata,
            } => {
                e.array(10)?;
                e.u16(3)?;
                e.encode(operator)?;
                e.encode(vrf_keyhash)?;
                e.u64(*pledge)?;
                e.u64(*cost)?;
                e.encode(margin)?;
                e.encode(reward_account)?;
                e.encode(pool_owners)?;
                e.encode(relays)?;
                e.encode(pool_metadata)?;
            }
            Certificate::PoolRetirement(a, b) => {
                e.array(3)?;
                e.u16(4)?;
                e.encode(a)?;
                e.u64(*b)?;
            }
            Certificate::Reg(a, b) => {
                e.array(3)?;
                e.u16(7)?;
                e.encode(a)?;
                e.u64(*b)?;
            }
            Certificate::UnReg(a, b) => {
                e.array(3)?;
                e.u16(8)?;
                e.encode(a)?;
                e.u64(*b)?;
            }
            Certificate::VoteDeleg(a, b) => {
                e.array(3)?;
                e.u16(9)?;
                e.encode(a)?;
                e.encode(b)?;
            }
            Certificate::StakeVoteDeleg(a, b, c) => {
                e.array(4)?;
                e.u16(10)?;
                e.encode(a)?;
                e.encode(b)?;
                e.encode(c)?;
            }
            Certificate::StakeRegDeleg(a, b, c) => {
                e.array(4)?;
                e.u16(11)?;
                e.encode(a)?;
                e.encode(b)?;
                e.u64(*c)?;
            }
            Certificate::VoteRegDeleg(a, b, c) => {
                e.array(4)?;
                e.u16(12)?;
                e.encode(a)?;
                e.encode(b)?;
                e.u64(*c)?;
            }
            Certificate::StakeVoteRegDeleg(a, b, c, x) => {
                e.array(5)?;
                e.u16(13)?;
                e.encode(a)?;
                e.encode(b)?;
                e.encode(c)?;
                e.u64(*x)?;
            }
            Certificate::AuthCommitteeHot(a, b) => {
                e.array(3)?;
                e.u16(14)?;
                e.encode(a)?;
                e.encode(b)?;
            }
            Certificate::ResignCommitteeCold(a, b) => {
                e.array(3)?;
                e.u16(15)?;
                e.encode(a)?;
                e.encode(b)?;
            }
            Certificate::RegDRepCert(a, b, c) => {
                e.array(4)?;
                e.u16(16)?;
                e.encode(a)?;
                e.u64(*b)?;
                e.encode(c)?;
            }
            Certificate::UnRegDRepCert(a, b) => {
                e.array(3)?;
                e.u16(17)?;
                e.encode(a)?;
                e.u64(*b)?;
            }
            Certificate::UpdateDRepCert(a, b) => {
                e.array(3)?;
                e.u16(18)?;
                e.encode(a)?;
                e.encode(b)?;
            }
        }

        Ok(())
    }
}

impl Certificate {
    /// The deposit this certificate pays into the ledger, if any.
    pub fn deposit(&self) -> Option<Coin> {
        match self {
            Certificate::Reg(_, coin)
            | Certificate::StakeRegDeleg(_, _, coin)
            | Certificate::VoteRegDeleg(_, _, coin)
            | Certificate::StakeVoteRegDeleg(_, _, _, coin)
            | Certificate::RegDRepCert(_, coin, _) => Some(*coin),
            _ => None,
        }
    }

    /// The deposit this certificate reclaims from the ledger, if any.
    pub fn refund(&self) -> Option<Coin> {
        match self {
            Certificate::UnReg(_, coin) | Certificate::UnRegDRepCert(_, coin) => Some(*coin),
            _ => None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, PartialOrd, Eq, Ord, Clone)]
pub enum DRep {
    Key(AddrKeyhash),
    Script(ScriptHash),
    Abstain,
    NoConfidence,
}

impl<'b> Decode<'b> for DRep {
    fn decode(d: &mut Decoder<'b>) -> Result<Self, decode::Error> {
        d.array()?;

        match d.u16()? {
            0 => Ok(DRep::Key(d.decode()?)),
            1 => Ok(DRep::Script(d.decode()?)),
            2 => Ok(DRep::Abstain),
            3 => Ok(DRep::NoConfidence),
            _ => Err(decode::Error::message("invalid variant for drep")),
        }
    }
}

impl Encode for DRep {
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>) -> Result<(), encode::Error<W::Error>> {
        match self {
            DRep::Key(x) => {
                e.array(2)?;
                e.u16(0)?;
                e.encode(x)?;
            }
            DRep::Script(x) => {
                e.array(2)?;
                e.u16(1)?;
                e.encode(x)?;
            }
            DRep::Abstain => {
                e.array(1)?;
                e.u16(2)?;
            }
            DRep::NoConfidence => {
                e.array(1)?;
                e.u16(3)?;
            }
        }

        Ok(())
    }
}

pub type DRepCredential = StakeCredential;

pub type CommitteeColdCredential = StakeCredential;

pub type CommitteeHotCredential = StakeCredential;

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy, PartialOrd, Ord, Hash)]
pub enum Language {
    PlutusV1,
    PlutusV2,
    PlutusV3,
}

impl From<Language> for u8 {
    fn from(value: Language) -> Self {
        match value {
            Language::PlutusV1 => 0,
            Language::PlutusV2 => 1,
            Language::PlutusV3 => 2,
        }
    }
}

impl TryFrom<u8> for Language {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Language::PlutusV1),
            1 => Ok(Language::PlutusV2),
            2 => Ok(Language::PlutusV3),
            _ => Err(()),
        }
    }
}

impl Encode for Language {
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>) -> Result<(), encode::Error<W::Error>> {
        e.u8(u8::from(*self))?.ok()
    }
}

impl<'b> Decode<'b> for Language {
    fn decode(d: &mut Decoder<'b>) -> Result<Self, decode::Error> {
        Language::try_from(d.u8()?)
            .map_err(|_| decode::Error::message("invalid plutus language version"))
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Default)]
pub struct CostModels {
    pub plutus_v1: Option<CostModel>,
    pub plutus_v2: Option<CostModel>,
    pub plutus_v3: Option<CostModel>,

    pub unknown: KeyValuePairs<u64, CostModel>,
}

impl CostModels {
    pub fn for_language(&self, language: Language) -> Option<&CostModel> {
        match language {
            Language::PlutusV1 => self.plutus_v1.as_ref(),
            Language::PlutusV2 => self.plutus_v2.as_ref(),
            Language::PlutusV3 => self.plutus_v3.as_ref(),
        }
    }
}

impl<'b> Decode<'b> for CostModels {
    fn decode(d: &mut Decoder<'b>) -> Result<Self, decode::Error> {
        let models: KeyValuePairs<u64, CostModel> = d.decode()?;

        let mut out = CostModels::default();

        for (k, v) in models.iter() {
            match k {
                0 => out.plutus_v1 = Some(v.clone()),
                1 => out.plutus_v2 = Some(v.clone()),
                2 => out.plutus_v3 = Some(v.clone()),
                _ => match &mut out.unknown {
                    KeyValuePairs::Def(xs) | KeyValuePairs::Indef(xs) => xs.push((*k, v.clone())),
                },
            }
        }

        Ok(out)
    }
}

impl Encode for CostModels {
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>) -> Result<(), encode::Error<W::Error>> {
        let len = self.plutus_v1.is_some() as u64
            + self.plutus_v2.is_some() as u64
            + self.plutus_v3.is_some() as u64
            + self.unknown.len() as u64;

        e.map(len)?;

        if let Some(model) = &self.plutus_v1 {
            e.u8(0)?;
            e.encode(model)?;
        }

        if let Some(model) = &self.plutus_v2 {
            e.u8(1)?;
            e.encode(model)?;
        }

        if let Some(model) = &self.plutus_v3 {
            e.u8(2)?;
            e.encode(model)?;
        }

        for (k, v) in self.unknown.iter() {
            e.u64(*k)?;
            e.encode(v)?;
        }

        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Default)]
pub struct ProtocolParamUpdate {
    pub minfee_a: Option<u64>,
    pub minfee_b: Option<u64>,
    pub max_block_body_size: Option<u64>,
    pub max_transaction_size: Option<u64>,
    pub max_block_header_size: Option<u64>,
    pub key_deposit: Option<Coin>,
    pub pool_deposit: Option<Coin>,
    pub maximum_epoch: Option<Epoch>,
    pub desired_number_of_stake_pools: Option<u64>,
    pub pool_pledge_influence: Option<RationalNumber>,
    pub expansion_rate: Option<UnitInterval>,
    pub treasury_growth_rate: Option<UnitInterval>,

    pub min_pool_cost: Option<Coin>,
    pub ada_per_utxo_byte: Option<Coin>,
    pub cost_models_for_script_languages: Option<CostModels>,
    pub execution_costs: Option<ExUnitPrices>,
    pub max_tx_ex_units: Option<ExUnits>,
    pub max_block_ex_units: Option<ExUnits>,
    pub max_value_size: Option<u64>,
    pub collateral_percentage: Option<u64>,
    pub max_collateral_inputs: Option<u64>,

    pub pool_voting_thresholds: Option<PoolVotingThresholds>,
    pub drep_voting_thresholds: Option<DRepVotingThresholds>,
    pub min_committee_size: Option<u64>,
    pub committee_term_limit: Option<Epoch>,
    pub governance_action_validity_period: Option<Epoch>,
    pub governance_action_deposit: Option<Coin>,
    pub drep_deposit: Option<Coin>,
    pub drep_inactivity_period: Option<Epoch>,
    pub minfee_refscript_cost_per_byte: Option<UnitInterval>,
}

impl<'b> Decode<'b> for ProtocolParamUpdate {
    fn decode(d: &mut Decoder<'b>) -> Result<Self, decode::Error> {
        let mut out = ProtocolParamUpdate::default();

        map_entries(d, |d, key| {
            match key {
                0 => out.minfee_a = Some(d.u64()?),
                1 => out.minfee_b = Some(d.u64()?),
                2 => out.max_block_body_size = Some(d.u64()?),
                3 => out.max_transaction_size = Some(d.u64()?),
                4 => out.max_block_header_size = Some(d.u64()?),
                5 => out.key_deposit = Some(d.u64()?),
                6 => out.pool_deposit = Some(d.u64()?),
                7 => out.maximum_epoch = Some(d.u64()?),
                8 => out.desired_number_of_stake_pools = Some(d.u64()?),
                9 => out.pool_pledge_influence = Some(d.decode()?),
                10 => out.expansion_rate = Some(d.decode()?),
                11 => out.treasury_growth_rate = Some(d.decode()?),
                16 => out.min_pool_cost = Some(d.u64()?),
                17 => out.ada_per_utxo_byte = Some(d.u64()?),
                18 => out.cost_models_for_script_languages = Some(d.decode()?),
                19 => out.execution_costs = Some(d.decode()?),
                20 => out.max_tx_ex_units = Some(d.decode()?),
                21 => out.max_block_ex_units = Some(d.decode()?),
                22 => out.max_value_size = Some(d.u64()?),
                23 => out.collateral_percentage = Some(d.u64()?),
                24 => out.max_collateral_inputs = Some(d.u64()?),
                25 => out.pool_voting_thresholds = Some(d.decode()?),
                26 => out.drep_voting_thresholds = Some(d.decode()?),
                27 => out.min_committee_size = Some(d.u64()?),
                28 => out.committee_term_limit = Some(d.u64()?),
                29 => out.governance_action_validity_period = Some(d.u64()?),
                30 => out.governance_action_deposit = Some(d.u64()?),
                31 => out.drep_deposit = Some(d.u64()?),
                32 => out.drep_inactivity_period = Some(d.u64()?),
                33 => out.minfee_refscript_cost_per_byte = Some(d.decode()?),
                _ => {
                    return Err(decode::Error::message(
                        "unknown key for protocol param update",
                    ))
                }
            }

            Ok(())
        })?;

        Ok(out)
    }
}

impl Encode for ProtocolParamUpdate {
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>) -> Result<(), encode::Error<W::Error>> {
        let mut len = 0u64;

        macro_rules! count {
            ($($field:ident),+) => {
                $( len += self.$field.is_some() as u64; )+
            };
        }

        count!(
            minfee_a,
            minfee_b,
            max_block_body_size,
            max_transaction_size,
            max_block_header_size,
            key_deposit,
            pool_deposit,
            maximum_epoch,
            desired_number_of_stake_pools,
            pool_pledge_influence,
            expansion_rate,
            treasury_growth_rate,
            min_pool_cost,
            ada_per_utxo_byte,
            cost_models_for_script_languages,
            execution_costs,
            max_tx_ex_units,
            max_block_ex_units,
            max_value_size,
            collateral_percentage,
            max_collateral_inputs,
            pool_voting_thresholds,
            drep_voting_thresholds,
            min_committee_size,
            committee_term_limit,
            governance_action_validity_period,
            governance_action_deposit,
            drep_deposit,
            drep_inactivity_period,
            minfee_refscript_cost_per_byte
        );

        e.map(len)?;

        macro_rules! entry {
            ($key:literal, $field:ident) => {
                if let Some(x) = &self.$field {
                    e.u8($key)?;
                    e.encode(x)?;
                }
            };
        }

        entry!(0, minfee_a);
        entry!(1, minfee_b);
        entry!(2, max_block_body_size);
        entry!(3, max_transaction_size);
        entry!(4, max_block_header_size);
        entry!(5, key_deposit);
        entry!(6, pool_deposit);
        entry!(7, maximum_epoch);
        entry!(8, desired_number_of_stake_pools);
        entry!(9, pool_pledge_influence);
        entry!(10, expansion_rate);
        entry!(11, treasury_growth_rate);
        entry!(16, min_pool_cost);
        entry!(17, ada_per_utxo_byte);
        entry!(18, cost_models_for_script_languages);
        entry!(19, execution_costs);
        entry!(20, max_tx_ex_units);
        entry!(21, max_block_ex_units);
        entry!(22, max_value_size);
        entry!(23, collateral_percentage);
        entry!(24, max_collateral_inputs);
        entry!(25, pool_voting_thresholds);
        entry!(26, drep_voting_thresholds);
        entry!(27, min_committee_size);
        entry!(28, committee_term_limit);
        entry!(29, governance_action_validity_period);
        entry!(30, governance_action_deposit);
        entry!(31, drep_deposit);
        entry!(32, drep_inactivity_period);
        entry!(33, minfee_refscript_cost_per_byte);

        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub struct Update {
    pub proposed_protocol_parameter_updates: KeyValuePairs<Genesishash, ProtocolParamUpdate>,
    pub epoch: Epoch,
}

impl<'b> Decode<'b> for Update {
    fn decode(d: &mut Decoder<'b>) -> Result<Self, decode::Error> {
        d.array()?;
        Ok(Update {
            proposed_protocol_parameter_updates: d.decode()?,
            epoch: d.u64()?,
        })
    }
}

impl Encode for Update {
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>) -> Result<(), encode::Error<W::Error>> {
        e.array(2)?;
        e.encode(&self.proposed_protocol_parameter_updates)?;
        e.u64(self.epoch)?;
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub struct PoolVotingThresholds {
    pub motion_no_confidence: UnitInterval,
    pub committee_normal: UnitInterval,
    pub committee_no_confidence: UnitInterval,
    pub hard_fork_initiation: UnitInterval,
    pub security_voting_threshold: UnitInterval,
}

impl<'b> Decode<'b> for PoolVotingThresholds {
    fn decode(d: &mut Decoder<'b>) -> Result<Self, decode::Error> {
        d.array()?;
        Ok(PoolVotingThresholds {
            motion_no_confidence: d.decode()?,
            committee_normal: d.decode()?,
            committee_no_confidence: d.decode()?,
            hard_fork_initiation: d.decode()?,
            security_voting_threshold: d.decode()?,
        })
    }
}

impl Encode for PoolVotingThresholds {
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>) -> Result<(), encode::Error<W::Error>> {
        e.array(5)?;
        e.encode(&self.motion_no_confidence)?;
        e.encode(&self.committee_normal)?;
        e.encode(&self.committee_no_confidence)?;
        e.encode(&self.hard_fork_initiation)?;
        e.encode(&self.security_voting_threshold)?;
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub struct DRepVotingThresholds {
    pub motion_no_confidence: UnitInterval,
    pub committee_normal: UnitInterval,
    pub committee_no_confidence: UnitInterval,
    pub update_constitution: UnitInterval,
    pub hard_fork_initiation: UnitInterval,
    pub pp_network_group: UnitInterval,
    pub pp_economic_group: UnitInterval,
    pub pp_technical_group: UnitInterval,
    pub pp_governance_group: UnitInterval,
    pub treasury_withdrawal: UnitInterval,
}

impl<'b> Decode<'b> for DRepVotingThresholds {
    fn decode(d: &mut Decoder<'b>) -> Result<Self, decode::Error> {
        d.array()?;
        Ok(DRepVotingThresholds {
            motion_no_confidence: d.decode()?,
            committee_normal: d.decode()?,
            committee_no_confidence: d.decode()?,
            update_constitution: d.decode()?,
            hard_fork_initiation: d.decode()?,
            pp_network_group: d.decode()?,
            pp_economic_group: d.decode()?,
            pp_technical_group: d.decode()?,
            pp_governance_group: d.decode()?,
            treasury_withdrawal: d.decode()?,
        })
    }
}

impl Encode for DRepVotingThresholds {
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>) -> Result<(), encode::Error<W::Error>> {
        e.array(10)?;
        e.encode(&self.motion_no_confidence)?;
        e.encode(&self.committee_normal)?;
        e.encode(&self.committee_no_confidence)?;
        e.encode(&self.update_constitution)?;
        e.encode(&self.hard_fork_initiation)?;
        e.encode(&self.pp_network_group)?;
        e.encode(&self.pp_economic_group)?;
        e.encode(&self.pp_technical_group)?;
        e.encode(&self.pp_governance_group)?;
        e.encode(&self.treasury_withdrawal)?;
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
pub struct TransactionBody {
    pub inputs: Set<TransactionInput>,

    pub outputs: Vec<TransactionOutput>,

    pub fee: Coin,

    pub ttl: Option<u64>,

    pub certificates: Option<NonEmptySet<Certificate>>,

    pub withdrawals: Option<Withdrawals>,

    pub update: Option<Update>,

    pub auxiliary_data_hash: Option<Hash<32>>,

    pub validity_interval_start: Option<u64>,

    pub mint: Option<Mint>,

    pub script_data_hash: Option<Hash<32>>,

    pub collateral: Option<NonEmptySet<TransactionInput>>,

    pub required_signers: Option<RequiredSigners>,

    pub network_id: Option<NetworkId>,

    pub collateral_return: Option<TransactionOutput>,

    pub total_collateral: Option<Coin>,

    pub reference_inputs: Option<NonEmptySet<TransactionInput>>,

    // -- NEW IN CONWAY
    pub voting_procedures: Option<VotingProcedures>,

    pub proposal_procedures: Option<NonEmptySet<ProposalProcedure>>,

    pub treasury_value: Option<Coin>,

    pub donation: Option<PositiveCoin>,
}

impl<'b> Decode<'b> for TransactionBody {
    fn decode(d: &mut Decoder<'b>) -> Result<Self, decode::Error> {
        let mut out = TransactionBody::default();

        map_entries(d, |d, key| {
            match key {
                0 => out.inputs = d.decode()?,
                1 => out.outputs = d.decode()?,
                2 => out.fee = d.u64()?,
                3 => out.ttl = Some(d.u64()?),
                4 => out.certificates = Some(d.decode()?),
                5 => out.withdrawals = Some(d.decode()?),
                6 => out.update = Some(d.decode()?),
                7 => out.auxiliary_data_hash = Some(d.decode()?),
                8 => out.validity_interval_start = Some(d.u64()?),
                9 => out.mint = Some(d.decode()?),
                11 => out.script_data_hash = Some(d.decode()?),
                13 => out.collateral = Some(d.decode()?),
                14 => out.required_signers = Some(d.decode()?),
                15 => out.network_id = Some(d.decode()?),
                16 => out.collateral_return = Some(d.decode()?),
                17 => out.total_collateral = Some(d.u64()?),
                18 => out.reference_inputs = Some(d.decode()?),
                19 => out.voting_procedures = Some(d.decode()?),
                20 => out.proposal_procedures = Some(d.decode()?),
                21 => out.treasury_value = Some(d.u64()?),
                22 => out.donation = Some(d.decode()?),
                _ => return Err(decode::Error::message("unknown key for transaction body")),
            }

            Ok(())
        })?;

        Ok(out)
    }
}

impl Encode for TransactionBody {
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>) -> Result<(), encode::Error<W::Error>> {
        let len = 3
            + self.ttl.is_some() as u64
            + self.certificates.is_some() as u64
            + self.withdrawals.is_some() as u64
            + self.update.is_some() as u64
            + self.auxiliary_data_hash.is_some() as u64
            + self.validity_interval_start.is_some() as u64
            + self.mint.is_some() as u64
            + self.script_data_hash.is_some() as u64
            + self.collateral.is_some() as u64
            + self.required_signers.is_some() as u64
            + self.network_id.is_some() as u64
            + self.collateral_return.is_some() as u64
            + self.total_collateral.is_some() as u64
            + self.reference_inputs.is_some() as u64
            + self.voting_procedures.is_some() as u64
            + self.proposal_procedures.is_some() as u64
            + self.treasury_value.is_some() as u64
            + self.donation.is_some() as u64;

        e.map(len)?;

        e.u8(0)?;
        e.encode(&self.inputs)?;

        e.u8(1)?;
        e.encode(&self.outputs)?;

        e.u8(2)?;
        e.u64(self.fee)?;

        macro_rules! entry {
            ($key:literal, $field:ident) => {
                if let Some(x) = &self.$field {
                    e.u8($key)?;
                    e.encode(x)?;
                }
            };
        }

        entry!(3, ttl);
        entry!(4, certificates);
        entry!(5, withdrawals);
        entry!(6, update);
        entry!(7, auxiliary_data_hash);
        entry!(8, validity_interval_start);
        entry!(9, mint);
        entry!(11, script_data_hash);
        entry!(13, collateral);
        entry!(14, required_signers);
        entry!(15, network_id);
        entry!(16, collateral_return);
        entry!(17, total_collateral);
        entry!(18, reference_inputs);
        entry!(19, voting_procedures);
        entry!(20, proposal_procedures);
        entry!(21, treasury_value);
        entry!(22, donation);

        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub enum Vote {
    No,
    Yes,
    Abstain,
}

impl Encode for Vote {
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>) -> Result<(), encode::Error<W::Error>> {
        match self {
            Vote::No => e.u8(0)?,
            Vote::Yes => e.u8(1)?,
            Vote::Abstain => e.u8(2)?,
        };

        Ok(())
    }
}

impl<'b> Decode<'b> for Vote {
    fn decode(d: &mut Decoder<'b>) -> Result<Self, decode::Error> {
        match d.u8()? {
            0 => Ok(Vote::No),
            1 => Ok(Vote::Yes),
            2 => Ok(Vote::Abstain),
            _ => Err(decode::Error::message("invalid vote value")),
        }
    }
}

pub type VotingProcedures = KeyValuePairs<Voter, KeyValuePairs<GovActionId, VotingProcedure>>;

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub struct VotingProcedure {
    pub vote: Vote,
    pub anchor: Option<Anchor>,
}

impl<'b> Decode<'b> for VotingProcedure {
    fn decode(d: &mut Decoder<'b>) -> Result<Self, decode::Error> {
        d.array()?;
        Ok(VotingProcedure {
            vote: d.decode()?,
            anchor: d.decode()?,
        })
    }
}

impl Encode for VotingProcedure {
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>) -> Result<(), encode::Error<W::Error>> {
        e.array(2)?;
        e.encode(&self.vote)?;
        e.encode(&self.anchor)?;
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub struct ProposalProcedure {
    pub deposit: Coin,
    pub reward_account: RewardAccount,
    pub gov_action: GovAction,
    pub anchor: Anchor,
}

impl<'b> Decode<'b> for ProposalProcedure {
    fn decode(d: &mut Decoder<'b>) -> Result<Self, decode::Error> {
        d.array()?;
        Ok(ProposalProcedure {
            deposit: d.u64()?,
            reward_account: d.decode()?,
            gov_action: d.decode()?,
            anchor: d.decode()?,
        })
    }
}

impl Encode for ProposalProcedure {
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>) -> Result<(), encode::Error<W::Error>> {
        e.array(4)?;
        e.u64(self.deposit)?;
        e.encode(&self.reward_account)?;
        e.encode(&self.gov_action)?;
        e.encode(&self.anchor)?;
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub enum GovAction {
    ParameterChange(
        Option<GovActionId>,
        Box<ProtocolParamUpdate>,
        Option<ScriptHash>,
    ),
    HardForkInitiation(Option<GovActionId>, ProtocolVersion),
    TreasuryWithdrawals(KeyValuePairs<RewardAccount, Coin>, Option<ScriptHash>),
    NoConfidence(Option<GovActionId>),
    UpdateCommittee(
        Option<GovActionId>,
        Set<CommitteeColdCredential>,
        KeyValuePairs<CommitteeColdCredential, Epoch>,
        UnitInterval,
    ),
    NewConstitution(Option<GovActionId>, Constitution),
    Information,
}

impl<'b> Decode<'b> for GovAction {
    fn decode(d: &mut Decoder<'b>) -> Result<Self, decode::Error> {
        d.array()?;

        match d.u16()? {
            0 => Ok(GovAction::ParameterChange(
                d.decode()?,
                d.decode()?,
                d.decode()?,
            )),
            1 => Ok(GovAction::HardForkInitiation(d.decode()?, d.decode()?)),
            2 => Ok(GovAction::TreasuryWithdrawals(d.decode()?, d.decode()?)),
            3 => Ok(GovAction::NoConfidence(d.decode()?)),
            4 => Ok(GovAction::UpdateCommittee(
                d.decode()?,
                d.decode()?,
                d.decode()?,
                d.decode()?,
            )),
            5 => Ok(GovAction::NewConstitution(d.decode()?, d.decode()?)),
            6 => Ok(GovAction::Information),
            _ => Err(decode::Error::message("unknown governance action type")),
        }
    }
}

impl Encode for GovAction {
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>) -> Result<(), encode::Error<W::Error>> {
        match self {
            GovAction::ParameterChange(a, b, c) => {
                e.array(4)?;
                e.u16(0)?;
                e.encode(a)?;
                e.encode(b)?;
                e.encode(c)?;
            }
            GovAction::HardForkInitiation(a, b) => {
                e.array(3)?;
                e.u16(1)?;
                e.encode(a)?;
                e.encode(b)?;
            }
            GovAction::TreasuryWithdrawals(a, b) => {
                e.array(3)?;
                e.u16(2)?;
                e.encode(a)?;
                e.encode(b)?;
            }
            GovAction::NoConfidence(a) => {
                e.array(2)?;
                e.u16(3)?;
                e.encode(a)?;
            }
            GovAction::UpdateCommittee(a, b, c, x) => {
                e.array(5)?;
                e.u16(4)?;
                e.encode(a)?;
                e.encode(b)?;
                e.encode(c)?;
                e.encode(x)?;
            }
            GovAction::NewConstitution(a, b) => {
                e.array(3)?;
                e.u16(5)?;
                e.encode(a)?;
                e.encode(b)?;
            }
            GovAction::Information => {
                e.array(1)?;
                e.u16(6)?;
            }
        }

        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub struct Constitution {
    pub anchor: Anchor,
    pub guardrail_script: Option<ScriptHash>,
}

impl<'b> Decode<'b> for Constitution {
    fn decode(d: &mut Decoder<'b>) -> Result<Self, decode::Error> {
        d.array()?;
        Ok(Constitution {
            anchor: d.decode()?,
            guardrail_script: d.decode()?,
        })
    }
}

impl Encode for Constitution {
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>) -> Result<(), encode::Error<W::Error>> {
        e.array(2)?;
        e.encode(&self.anchor)?;
        e.encode(&self.guardrail_script)?;
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, PartialOrd, Eq, Ord, Clone)]
pub enum Voter {
    ConstitutionalCommitteeScript(ScriptHash),
    ConstitutionalCommitteeKey(AddrKeyhash),
    DRepScript(ScriptHash),
    DRepKey(AddrKeyhash),
    StakePoolKey(AddrKeyhash),
}

impl<'b> Decode<'b> for Voter {
    fn decode(d: &mut Decoder<'b>) -> Result<Self, decode::Error> {
        d.array()?;

        match d.u16()? {
            0 => Ok(Voter::ConstitutionalCommitteeKey(d.decode()?)),
            1 => Ok(Voter::ConstitutionalCommitteeScript(d.decode()?)),
            2 => Ok(Voter::DRepKey(d.decode()?)),
            3 => Ok(Voter::DRepScript(d.decode()?)),
            4 => Ok(Voter::StakePoolKey(d.decode()?)),
            _ => Err(decode::Error::message("invalid variant for voter")),
        }
    }
}

impl Encode for Voter {
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>) -> Result<(), encode::Error<W::Error>> {
        let (variant, hash) = match self {
            Voter::ConstitutionalCommitteeKey(x) => (0u16, x),
            Voter::ConstitutionalCommitteeScript(x) => (1, x),
            Voter::DRepKey(x) => (2, x),
            Voter::DRepScript(x) => (3, x),
            Voter::StakePoolKey(x) => (4, x),
        };

        e.array(2)?;
        e.u16(variant)?;
        e.encode(hash)?;

        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, PartialOrd, Eq, Ord, Clone)]
pub struct Anchor {
    pub url: String,
    pub content_hash: Hash<32>,
}

impl<'b> Decode<'b> for Anchor {
    fn decode(d: &mut Decoder<'b>) -> Result<Self, decode::Error> {
        d.array()?;
        Ok(Anchor {
            url: d.decode()?,
            content_hash: d.decode()?,
        })
    }
}

impl Encode for Anchor {
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>) -> Result<(), encode::Error<W::Error>> {
        e.array(2)?;
        e.str(&self.url)?;
        e.encode(&self.content_hash)?;
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, PartialOrd, Ord)]
pub struct GovActionId {
    pub transaction_id: Hash<32>,
    pub action_index: u32,
}

impl<'b> Decode<'b> for GovActionId {
    fn decode(d: &mut Decoder<'b>) -> Result<Self, decode::Error> {
        d.array()?;
        Ok(GovActionId {
            transaction_id: d.decode()?,
            action_index: d.u32()?,
        })
    }
}

impl Encode for GovActionId {
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>) -> Result<(), encode::Error<W::Error>> {
        e.array(2)?;
        e.encode(&self.transaction_id)?;
        e.u32(self.action_index)?;
        Ok(())
    }
}

/// Pre-Alonzo output shape, positional fields.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub struct LegacyTransactionOutput {
    pub address: Bytes,
    pub amount: Value,
    pub datum_hash: Option<Hash<32>>,
}

impl<'b> Decode<'b> for LegacyTransactionOutput {
    fn decode(d: &mut Decoder<'b>) -> Result<Self, decode::Error> {
        let len = d.array()?;

        let address = d.decode()?;
        let amount = d.decode()?;

        let datum_hash = match len {
            Some(2) => None,
            Some(3) => Some(d.decode()?),
            Some(_) => {
                return Err(decode::Error::message(
                    "invalid array size for legacy output",
                ))
            }
            None => {
                if d.datatype()? == Type::Break {
                    d.consume_break()?;
                    None
                } else {
                    let hash = d.decode()?;
                    d.consume_break()?;
                    Some(hash)
                }
            }
        };

        Ok(LegacyTransactionOutput {
            address,
            amount,
            datum_hash,
        })
    }
}

impl Encode for LegacyTransactionOutput {
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>) -> Result<(), encode::Error<W::Error>> {
        match &self.datum_hash {
            Some(hash) => {
                e.array(3)?;
                e.encode(&self.address)?;
                e.encode(&self.amount)?;
                e.encode(hash)?;
            }
            None => {
                e.array(2)?;
                e.encode(&self.address)?;
                e.encode(&self.amount)?;
            }
        }

        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub enum DatumOption {
    Hash(Hash<32>),
    Data(CborWrap<PlutusData>),
}

impl<'b> Decode<'b> for DatumOption {
    fn decode(d: &mut Decoder<'b>) -> Result<Self, decode::Error> {
        d.array()?;

        match d.u8()? {
            0 => Ok(DatumOption::Hash(d.decode()?)),
            1 => Ok(DatumOption::Data(d.decode()?)),
            _ => Err(decode::Error::message("invalid variant for datum option")),
        }
    }
}

impl Encode for DatumOption {
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>) -> Result<(), encode::Error<W::Error>> {
        match self {
            DatumOption::Hash(x) => {
                e.array(2)?;
                e.u8(0)?;
                e.encode(x)?;
            }
            DatumOption::Data(x) => {
                e.array(2)?;
                e.u8(1)?;
                e.encode(x)?;
            }
        }

        Ok(())
    }
}

// script = [0, native_script // 1, plutus_v1_script // 2, plutus_v2_script //
// 3, plutus_v3_script]
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub enum ScriptRef {
    NativeScript(NativeScript),
    PlutusV1Script(PlutusScript<1>),
    PlutusV2Script(PlutusScript<2>),
    PlutusV3Script(PlutusScript<3>),
}

impl<'b> Decode<'b> for ScriptRef {
    fn decode(d: &mut Decoder<'b>) -> Result<Self, decode::Error> {
        d.array()?;

        match d.u8()? {
            0 => Ok(ScriptRef::NativeScript(d.decode()?)),
            1 => Ok(ScriptRef::PlutusV1Script(d.decode()?)),
            2 => Ok(ScriptRef::PlutusV2Script(d.decode()?)),
            3 => Ok(ScriptRef::PlutusV3Script(d.decode()?)),
            _ => Err(decode::Error::message("invalid variant for script")),
        }
    }
}

impl Encode for ScriptRef {
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>) -> Result<(), encode::Error<W::Error>> {
        e.array(2)?;

        match self {
            ScriptRef::NativeScript(x) => {
                e.u8(0)?;
                e.encode(x)?;
            }
            ScriptRef::PlutusV1Script(x) => {
                e.u8(1)?;
                e.encode(x)?;
            }
            ScriptRef::PlutusV2Script(x) => {
                e.u8(2)?;
                e.encode(x)?;
            }
            ScriptRef::PlutusV3Script(x) => {
                e.u8(3)?;
                e.encode(x)?;
            }
        }

        Ok(())
    }
}

/// Post-Alonzo output shape, map with numeric keys.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub struct PostAlonzoTransactionOutput {
    pub address: Bytes,
    pub value: Value,
    pub datum_option: Option<DatumOption>,
    pub script_ref: Option<CborWrap<ScriptRef>>,
}

impl<'b> Decode<'b> for PostAlonzoTransactionOutput {
    fn decode(d: &mut Decoder<'b>) -> Result<Self, decode::Error> {
        let mut address = None;
        let mut value = None;
        let mut datum_option = None;
        let mut script_ref = None;

        map_entries(d, |d, key| {
            match key {
                0 => address = Some(d.decode()?),
                1 => value = Some(d.decode()?),
                2 => datum_option = Some(d.decode()?),
                3 => script_ref = Some(d.decode()?),
                _ => {
                    return Err(decode::Error::message(
                        "unknown key for transaction output",
                    ))
                }
            }

            Ok(())
        })?;

        Ok(PostAlonzoTransactionOutput {
            address: address
                .ok_or_else(|| decode::Error::message("transaction output without address"))?,
            value: value
                .ok_or_else(|| decode::Error::message("transaction output without value"))?,
            datum_option,
            script_ref,
        })
    }
}

impl Encode for PostAlonzoTransactionOutput {
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>) -> Result<(), encode::Error<W::Error>> {
        let len =
            2 + self.datum_option.is_some() as u64 + self.script_ref.is_some() as u64;

        e.map(len)?;

        e.u8(0)?;
        e.encode(&self.address)?;

        e.u8(1)?;
        e.encode(&self.value)?;

        if let Some(datum) = &self.datum_option {
            e.u8(2)?;
            e.encode(datum)?;
        }

        if let Some(script) = &self.script_ref {
            e.u8(3)?;
            e.encode(script)?;
        }

        Ok(())
    }
}

/// The codec accepts both the legacy positional form and the post-Alonzo
/// map form. Fresh outputs should use [`PostAlonzoTransactionOutput`], the
/// form the writer emits in Conway.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub enum TransactionOutput {
    Legacy(LegacyTransactionOutput),
    PostAlonzo(PostAlonzoTransactionOutput),
}

impl TransactionOutput {
    pub fn address(&self) -> &Bytes {
        match self {
            TransactionOutput::Legacy(x) => &x.address,
            TransactionOutput::PostAlonzo(x) => &x.address,
        }
    }

    pub fn value(&self) -> &Value {
        match self {
            TransactionOutput::Legacy(x) => &x.amount,
            TransactionOutput::PostAlonzo(x) => &x.value,
        }
    }
}

impl<'b> Decode<'b> for TransactionOutput {
    fn decode(d: &mut Decoder<'b>) -> Result<Self, decode::Error> {
        match d.datatype()? {
            Type::Array | Type::ArrayIndef => Ok(TransactionOutput::Legacy(d.decode()?)),
            Type::Map | Type::MapIndef => Ok(TransactionOutput::PostAlonzo(d.decode()?)),
            _ => Err(decode::Error::message(
                "unknown cbor data type for transaction output",
            )),
        }
    }
}

impl Encode for TransactionOutput {
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>) -> Result<(), encode::Error<W::Error>> {
        match self {
            TransactionOutput::Legacy(x) => e.encode(x)?.ok(),
            TransactionOutput::PostAlonzo(x) => e.encode(x)?.ok(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub struct VKeyWitness {
    pub vkey: Bytes,
    pub signature: Bytes,
}

impl<'b> Decode<'b> for VKeyWitness {
    fn decode(d: &mut Decoder<'b>) -> Result<Self, decode::Error> {
        d.array()?;
        Ok(VKeyWitness {
            vkey: d.decode()?,
            signature: d.decode()?,
        })
    }
}

impl Encode for VKeyWitness {
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>) -> Result<(), encode::Error<W::Error>> {
        e.array(2)?;
        e.encode(&self.vkey)?;
        e.encode(&self.signature)?;
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub struct BootstrapWitness {
    pub public_key: Bytes,
    pub signature: Bytes,
    pub chain_code: Bytes,
    pub attributes: Bytes,
}

impl<'b> Decode<'b> for BootstrapWitness {
    fn decode(d: &mut Decoder<'b>) -> Result<Self, decode::Error> {
        d.array()?;
        Ok(BootstrapWitness {
            public_key: d.decode()?,
            signature: d.decode()?,
            chain_code: d.decode()?,
            attributes: d.decode()?,
        })
    }
}

impl Encode for BootstrapWitness {
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>) -> Result<(), encode::Error<W::Error>> {
        e.array(4)?;
        e.encode(&self.public_key)?;
        e.encode(&self.signature)?;
        e.encode(&self.chain_code)?;
        e.encode(&self.attributes)?;
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub enum NativeScript {
    ScriptPubkey(AddrKeyhash),
    ScriptAll(Vec<NativeScript>),
    ScriptAny(Vec<NativeScript>),
    ScriptNOfK(u32, Vec<NativeScript>),
    InvalidBefore(u64),
    InvalidHereafter(u64),
}

impl<'b> Decode<'b> for NativeScript {
    fn decode(d: &mut Decoder<'b>) -> Result<Self, decode::Error> {
        d.array()?;

        match d.u16()? {
            0 => Ok(NativeScript::ScriptPubkey(d.decode()?)),
            1 => Ok(NativeScript::ScriptAll(d.decode()?)),
            2 => Ok(NativeScript::ScriptAny(d.decode()?)),
            3 => Ok(NativeScript::ScriptNOfK(d.u32()?, d.decode()?)),
            4 => Ok(NativeScript::InvalidBefore(d.u64()?)),
            5 => Ok(NativeScript::InvalidHereafter(d.u64()?)),
            _ => Err(decode::Error::message("unknown native script type")),
        }
    }
}

impl Encode for NativeScript {
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>) -> Result<(), encode::Error<W::Error>> {
        match self {
            NativeScript::ScriptPubkey(x) => {
                e.array(2)?;
                e.u16(0)?;
                e.encode(x)?;
            }
            NativeScript::ScriptAll(x) => {
                e.array(2)?;
                e.u16(1)?;
                e.encode(x)?;
            }
            NativeScript::ScriptAny(x) => {
                e.array(2)?;
                e.u16(2)?;
                e.encode(x)?;
            }
            NativeScript::ScriptNOfK(n, x) => {
                e.array(3)?;
                e.u16(3)?;
                e.u32(*n)?;
                e.encode(x)?;
            }
            NativeScript::InvalidBefore(x) => {
                e.array(2)?;
                e.u16(4)?;
                e.u64(*x)?;
            }
            NativeScript::InvalidHereafter(x) => {
                e.array(2)?;
                e.u16(5)?;
                e.u64(*x)?;
            }
        }

        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy, PartialOrd, Ord)]
pub enum RedeemerTag {
    Spend,
    Mint,
    Cert,
    Reward,
    Vote,
    Propose,
}

impl From<RedeemerTag> for u8 {
    fn from(value: RedeemerTag) -> Self {
        match value {
            RedeemerTag::Spend => 0,
            RedeemerTag::Mint => 1,
            RedeemerTag::Cert => 2,
            RedeemerTag::Reward => 3,
            RedeemerTag::Vote => 4,
            RedeemerTag::Propose => 5,
        }
    }
}

impl Encode for RedeemerTag {
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>) -> Result<(), encode::Error<W::Error>> {
        e.u8(u8::from(*self))?.ok()
    }
}

impl<'b> Decode<'b> for RedeemerTag {
    fn decode(d: &mut Decoder<'b>) -> Result<Self, decode::Error> {
        match d.u8()? {
            0 => Ok(RedeemerTag::Spend),
            1 => Ok(RedeemerTag::Mint),
            2 => Ok(RedeemerTag::Cert),
            3 => Ok(RedeemerTag::Reward),
            4 => Ok(RedeemerTag::Vote),
            5 => Ok(RedeemerTag::Propose),
            _ => Err(decode::Error::message("invalid redeemer tag")),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub struct Redeemer {
    pub tag: RedeemerTag,

    pub index: u32,

    pub data: PlutusData,

    pub ex_units: ExUnits,
}

impl<'b> Decode<'b> for Redeemer {
    fn decode(d: &mut Decoder<'b>) -> Result<Self, decode::Error> {
        d.array()?;
        Ok(Redeemer {
            tag: d.decode()?,
            index: d.u32()?,
            data: d.decode()?,
            ex_units: d.decode()?,
        })
    }
}

impl Encode for Redeemer {
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>) -> Result<(), encode::Error<W::Error>> {
        e.array(4)?;
        e.encode(&self.tag)?;
        e.u32(self.index)?;
        e.encode(&self.data)?;
        e.encode(&self.ex_units)?;
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, PartialOrd, Ord)]
pub struct RedeemersKey {
    pub tag: RedeemerTag,
    pub index: u32,
}

impl<'b> Decode<'b> for RedeemersKey {
    fn decode(d: &mut Decoder<'b>) -> Result<Self, decode::Error> {
        d.array()?;
        Ok(RedeemersKey {
            tag: d.decode()?,
            index: d.u32()?,
        })
    }
}

impl Encode for RedeemersKey {
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>) -> Result<(), encode::Error<W::Error>> {
        e.array(2)?;
        e.encode(&self.tag)?;
        e.u32(self.index)?;
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub struct RedeemersValue {
    pub data: PlutusData,
    pub ex_units: ExUnits,
}

impl<'b> Decode<'b> for RedeemersValue {
    fn decode(d: &mut Decoder<'b>) -> Result<Self, decode::Error> {
        d.array()?;
        Ok(RedeemersValue {
            data: d.decode()?,
            ex_units: d.decode()?,
        })
    }
}

impl Encode for RedeemersValue {
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>) -> Result<(), encode::Error<W::Error>> {
        e.array(2)?;
        e.encode(&self.data)?;
        e.encode(&self.ex_units)?;
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub enum Redeemers {
    List(Vec<Redeemer>),
    Map(KeyValuePairs<RedeemersKey, RedeemersValue>),
}

impl Redeemers {
    pub fn len(&self) -> usize {
        match self {
            Redeemers::List(xs) => xs.len(),
            Redeemers::Map(xs) => xs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<'b> Decode<'b> for Redeemers {
    fn decode(d: &mut Decoder<'b>) -> Result<Self, decode::Error> {
        match d.datatype()? {
            Type::Array | Type::ArrayIndef => Ok(Redeemers::List(d.decode()?)),
            Type::Map | Type::MapIndef => Ok(Redeemers::Map(d.decode()?)),
            _ => Err(decode::Error::message(
                "unknown cbor data type for redeemers",
            )),
        }
    }
}

impl Encode for Redeemers {
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>) -> Result<(), encode::Error<W::Error>> {
        match self {
            Redeemers::List(x) => e.encode(x)?.ok(),
            Redeemers::Map(x) => e.encode(x)?.ok(),
        }
    }
}

impl From<KeyValuePairs<RedeemersKey, RedeemersValue>> for Redeemers {
    fn from(value: KeyValuePairs<RedeemersKey, RedeemersValue>) -> Self {
        Redeemers::Map(value)
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
pub struct WitnessSet {
    pub vkeywitness: Option<NonEmptySet<VKeyWitness>>,

    pub native_script: Option<NonEmptySet<NativeScript>>,

    pub bootstrap_witness: Option<NonEmptySet<BootstrapWitness>>,

    pub plutus_v1_script: Option<NonEmptySet<PlutusScript<1>>>,

    pub plutus_data: Option<NonEmptySet<PlutusData>>,

    pub redeemer: Option<Redeemers>,

    pub plutus_v2_script: Option<NonEmptySet<PlutusScript<2>>>,

    pub plutus_v3_script: Option<NonEmptySet<PlutusScript<3>>>,
}

impl<'b> Decode<'b> for WitnessSet {
    fn decode(d: &mut Decoder<'b>) -> Result<Self, decode::Error> {
        let mut out = WitnessSet::default();

        map_entries(d, |d, key| {
            match key {
                0 => out.vkeywitness = Some(d.decode()?),
                1 => out.native_script = Some(d.decode()?),
                2 => out.bootstrap_witness = Some(d.decode()?),
                3 => out.plutus_v1_script = Some(d.decode()?),
                4 => out.plutus_data = Some(d.decode()?),
                5 => out.redeemer = Some(d.decode()?),
                6 => out.plutus_v2_script = Some(d.decode()?),
                7 => out.plutus_v3_script = Some(d.decode()?),
                _ => return Err(decode::Error::message("unknown key for witness set")),
            }

            Ok(())
        })?;

        Ok(out)
    }
}

impl Encode for WitnessSet {
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>) -> Result<(), encode::Error<W::Error>> {
        let len = self.vkeywitness.is_some() as u64
            + self.native_script.is_some() as u64
            + self.bootstrap_witness.is_some() as u64
            + self.plutus_v1_script.is_some() as u64
            + self.plutus_data.is_some() as u64
            + self.redeemer.is_some() as u64
            + self.plutus_v2_script.is_some() as u64
            + self.plutus_v3_script.is_some() as u64;

        e.map(len)?;

        macro_rules! entry {
            ($key:literal, $field:ident) => {
                if let Some(x) = &self.$field {
                    e.u8($key)?;
                    e.encode(x)?;
                }
            };
        }

        entry!(0, vkeywitness);
        entry!(1, native_script);
        entry!(2, bootstrap_witness);
        entry!(3, plutus_v1_script);
        entry!(4, plutus_data);
        entry!(5, redeemer);
        entry!(6, plutus_v2_script);
        entry!(7, plutus_v3_script);

        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
pub struct PostAlonzoAuxiliaryData {
    pub metadata: Option<Metadata>,

    pub native_scripts: Option<Vec<NativeScript>>,

    pub plutus_v1_scripts: Option<Vec<PlutusScript<1>>>,

    pub plutus_v2_scripts: Option<Vec<PlutusScript<2>>>,

    pub plutus_v3_scripts: Option<Vec<PlutusScript<3>>>,
}

impl<'b> Decode<'b> for PostAlonzoAuxiliaryData {
    fn decode(d: &mut Decoder<'b>) -> Result<Self, decode::Error> {
        let mut out = PostAlonzoAuxiliaryData::default();

        map_entries(d, |d, key| {
            match key {
                0 => out.metadata = Some(d.decode()?),
                1 => out.native_scripts = Some(d.decode()?),
                2 => out.plutus_v1_scripts = Some(d.decode()?),
                3 => out.plutus_v2_scripts = Some(d.decode()?),
                4 => out.plutus_v3_scripts = Some(d.decode()?),
                _ => return Err(decode::Error::message("unknown key for auxiliary data")),
            }

            Ok(())
        })?;

        Ok(out)
    }
}

impl Encode for PostAlonzoAuxiliaryData {
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>) -> Result<(), encode::Error<W::Error>> {
        let len = self.metadata.is_some() as u64
            + self.native_scripts.is_some() as u64
            + self.plutus_v1_scripts.is_some() as u64
            + self.plutus_v2_scripts.is_some() as u64
            + self.plutus_v3_scripts.is_some() as u64;

        e.map(len)?;

        macro_rules! entry {
            ($key:literal, $field:ident) => {
                if let Some(x) = &self.$field {
                    e.u8($key)?;
                    e.encode(x)?;
                }
            };
        }

        entry!(0, metadata);
        entry!(1, native_scripts);
        entry!(2, plutus_v1_scripts);
        entry!(3, plutus_v2_scripts);
        entry!(4, plutus_v3_scripts);

        Ok(())
    }
}

/// Auxiliary data across its three historical wire shapes. The Conway
/// writer emits the tag 259 map; the other forms are accepted on read.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub enum AuxiliaryData {
    Shelley(Metadata),
    ShelleyMa {
        transaction_metadata: Metadata,
        auxiliary_scripts: Vec<NativeScript>,
    },
    PostAlonzo(PostAlonzoAuxiliaryData),
}

const AUX_DATA_TAG: u64 = 259;

impl<'b> Decode<'b> for AuxiliaryData {
    fn decode(d: &mut Decoder<'b>) -> Result<Self, decode::Error> {
        match d.datatype()? {
            Type::Map | Type::MapIndef => Ok(AuxiliaryData::Shelley(d.decode()?)),
            Type::Array | Type::ArrayIndef => {
                d.array()?;
                Ok(AuxiliaryData::ShelleyMa {
                    transaction_metadata: d.decode()?,
                    auxiliary_scripts: d.decode()?,
                })
            }
            Type::Tag => {
                let tag = d.tag()?;
                if tag.as_u64() != AUX_DATA_TAG {
                    return Err(decode::Error::message("invalid tag for auxiliary data"));
                }
                Ok(AuxiliaryData::PostAlonzo(d.decode()?))
            }
            _ => Err(decode::Error::message(
                "unknown cbor data type for auxiliary data",
            )),
        }
    }
}

impl Encode for AuxiliaryData {
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>) -> Result<(), encode::Error<W::Error>> {
        match self {
            AuxiliaryData::Shelley(metadata) => {
                e.encode(metadata)?;
            }
            AuxiliaryData::ShelleyMa {
                transaction_metadata,
                auxiliary_scripts,
            } => {
                e.array(2)?;
                e.encode(transaction_metadata)?;
                e.encode(auxiliary_scripts)?;
            }
            AuxiliaryData::PostAlonzo(aux) => {
                e.tag(Tag::new(AUX_DATA_TAG))?;
                e.encode(aux)?;
            }
        }

        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct Tx {
    pub transaction_body: TransactionBody,

    pub transaction_witness_set: WitnessSet,

    pub success: bool,

    pub auxiliary_data: Nullable<AuxiliaryData>,
}

impl<'b> Decode<'b> for Tx {
    fn decode(d: &mut Decoder<'b>) -> Result<Self, decode::Error> {
        d.array()?;
        Ok(Tx {
            transaction_body: d.decode()?,
            transaction_witness_set: d.decode()?,
            success: d.bool()?,
            auxiliary_data: d.decode()?,
        })
    }
}

impl Encode for Tx {
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>) -> Result<(), encode::Error<W::Error>> {
        e.array(4)?;
        e.encode(&self.transaction_body)?;
        e.encode(&self.transaction_witness_set)?;
        e.bool(self.success)?;
        e.encode(&self.auxiliary_data)?;
        Ok(())
    }
}

/// Walks the entries of a numeric-keyed map, definite or indefinite.
fn map_entries<'b>(
    d: &mut Decoder<'b>,
    mut f: impl FnMut(&mut Decoder<'b>, u64) -> Result<(), decode::Error>,
) -> Result<(), decode::Error> {
    match d.map()? {
        Some(n) => {
            for _ in 0..n {
                let key = d.u64()?;
                f(d, key)?;
            }
        }
        None => loop {
            if d.datatype()? == Type::Break {
                d.consume_break()?;
                break;
            }

            let key = d.u64()?;
            f(d, key)?;
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use krios_codec::Fragment;

    fn fake_hash28(seed: u8) -> Hash<28> {
        [seed; 28].into()
    }

    fn fake_hash32(seed: u8) -> Hash<32> {
        [seed; 32].into()
    }

    fn roundtrip<T>(value: &T) -> T
    where
        T: krios_codec::Encode + for<'b> krios_codec::Decode<'b> + std::fmt::Debug,
    {
        let bytes = value.encode_fragment().unwrap();
        let back: T = krios_codec::decode(&bytes).unwrap();
        let again = back.encode_fragment().unwrap();
        assert_eq!(bytes, again, "re-encoded bytes didn't match original");
        back
    }

    #[test]
    fn value_forms_roundtrip() {
        let coin = Value::Coin(3_000_000);
        assert_eq!(roundtrip(&coin), coin);

        let assets: Multiasset<PositiveCoin> = NonEmptyKeyValuePairs::Def(vec![(
            fake_hash28(9),
            NonEmptyKeyValuePairs::Def(vec![(
                Bytes::from(b"skywalker".to_vec()),
                PositiveCoin::try_from(14).unwrap(),
            )]),
        )]);

        let multi = Value::Multiasset(2_000_000, assets);
        assert_eq!(roundtrip(&multi), multi);
    }

    #[test]
    fn certificates_roundtrip() {
        let cred = StakeCredential::AddrKeyhash(fake_hash28(1));
        let pool = fake_hash28(2);

        let certs = vec![
            Certificate::StakeRegistration(cred.clone()),
            Certificate::StakeDeregistration(cred.clone()),
            Certificate::StakeDelegation(cred.clone(), pool),
            Certificate::PoolRetirement(pool, 410),
            Certificate::Reg(cred.clone(), 2_000_000),
            Certificate::UnReg(cred.clone(), 2_000_000),
            Certificate::VoteDeleg(cred.clone(), DRep::Abstain),
            Certificate::StakeVoteDeleg(cred.clone(), pool, DRep::Key(fake_hash28(3))),
            Certificate::StakeRegDeleg(cred.clone(), pool, 2_000_000),
            Certificate::VoteRegDeleg(cred.clone(), DRep::NoConfidence, 2_000_000),
            Certificate::StakeVoteRegDeleg(cred.clone(), pool, DRep::Abstain, 2_000_000),
            Certificate::AuthCommitteeHot(cred.clone(), cred.clone()),
            Certificate::ResignCommitteeCold(cred.clone(), None),
            Certificate::RegDRepCert(
                cred.clone(),
                500_000_000,
                Some(Anchor {
                    url: "https://example.com/drep.json".into(),
                    content_hash: fake_hash32(7),
                }),
            ),
            Certificate::UnRegDRepCert(cred.clone(), 500_000_000),
            Certificate::UpdateDRepCert(cred, None),
        ];

        for cert in certs {
            assert_eq!(roundtrip(&cert), cert);
        }
    }

    #[test]
    fn conway_registration_carries_deposit() {
        let cred = StakeCredential::AddrKeyhash(fake_hash28(1));

        assert_eq!(Certificate::Reg(cred.clone(), 2_000_000).deposit(), Some(2_000_000));
        assert_eq!(Certificate::StakeRegistration(cred.clone()).deposit(), None);
        assert_eq!(Certificate::UnReg(cred, 2_000_000).refund(), Some(2_000_000));
    }

    #[test]
    fn transaction_body_roundtrips() {
        let body = TransactionBody {
            inputs: Set::from(vec![TransactionInput {
                transaction_id: fake_hash32(1),
                index: 0,
            }]),
            outputs: vec![TransactionOutput::PostAlonzo(PostAlonzoTransactionOutput {
                address: Bytes::from(vec![0x61; 29]),
                value: Value::Coin(5_000_000),
                datum_option: None,
                script_ref: None,
            })],
            fee: 172_233,
            ttl: Some(90_000_000),
            ..Default::default()
        };

        let back = roundtrip(&body);
        assert_eq!(back, body);
    }

    #[test]
    fn body_inputs_carry_set_tag() {
        let body = TransactionBody {
            inputs: Set::from(vec![TransactionInput {
                transaction_id: fake_hash32(1),
                index: 0,
            }]),
            fee: 0,
            ..Default::default()
        };

        let bytes = body.encode_fragment().unwrap();
        // a3 00 d9 0102 ...
        assert_eq!(&bytes[..5], &[0xa3, 0x00, 0xd9, 0x01, 0x02]);
    }

    #[test]
    fn outputs_decode_both_forms() {
        // legacy positional output
        let legacy = TransactionOutput::Legacy(LegacyTransactionOutput {
            address: Bytes::from(vec![0x61; 29]),
            amount: Value::Coin(42),
            datum_hash: None,
        });

        let bytes = legacy.encode_fragment().unwrap();
        assert_eq!(bytes[0], 0x82);
        assert_eq!(roundtrip(&legacy), legacy);

        // post-alonzo map output
        let map_form = TransactionOutput::PostAlonzo(PostAlonzoTransactionOutput {
            address: Bytes::from(vec![0x61; 29]),
            value: Value::Coin(42),
            datum_option: Some(DatumOption::Hash(fake_hash32(5))),
            script_ref: None,
        });

        let bytes = map_form.encode_fragment().unwrap();
        assert_eq!(bytes[0], 0xa3);
        assert_eq!(roundtrip(&map_form), map_form);
    }

    #[test]
    fn witness_set_roundtrips() {
        let witness_set = WitnessSet {
            vkeywitness: NonEmptySet::from_vec(vec![VKeyWitness {
                vkey: Bytes::from(vec![0x01; 32]),
                signature: Bytes::from(vec![0x02; 64]),
            }]),
            redeemer: Some(Redeemers::List(vec![Redeemer {
                tag: RedeemerTag::Spend,
                index: 0,
                data: PlutusData::BigInt(BigInt::Int(42.into())),
                ex_units: ExUnits {
                    mem: 1000,
                    steps: 20000,
                },
            }])),
            ..Default::default()
        };

        assert_eq!(roundtrip(&witness_set), witness_set);
    }

    #[test]
    fn voting_procedures_roundtrip() {
        let procedures: VotingProcedures = KeyValuePairs::Def(vec![(
            Voter::DRepKey(fake_hash28(1)),
            KeyValuePairs::Def(vec![(
                GovActionId {
                    transaction_id: fake_hash32(2),
                    action_index: 0,
                },
                VotingProcedure {
                    vote: Vote::Yes,
                    anchor: None,
                },
            )]),
        )]);

        assert_eq!(roundtrip(&procedures), procedures);
    }

    mod voter_ordering {
        use super::*;
        use std::cmp::Ordering;
        use test_case::test_case;

        fn prefixed_hash(prefix: &str) -> Hash<28> {
            let null_hash = [0u8; 28];
            Hash::from(&[prefix.as_bytes(), &null_hash].concat()[0..28])
        }

        fn cc_script(prefix: &str) -> Voter {
            Voter::ConstitutionalCommitteeScript(prefixed_hash(prefix))
        }

        fn cc_key(prefix: &str) -> Voter {
            Voter::ConstitutionalCommitteeKey(prefixed_hash(prefix))
        }

        fn drep_script(prefix: &str) -> Voter {
            Voter::DRepScript(prefixed_hash(prefix))
        }

        fn drep_key(prefix: &str) -> Voter {
            Voter::DRepKey(prefixed_hash(prefix))
        }

        fn spo(prefix: &str) -> Voter {
            Voter::StakePoolKey(prefixed_hash(prefix))
        }

        #[test_case(cc_script("alice"), cc_script("alice") => Ordering::Equal)]
        #[test_case(cc_script("alice"), cc_key("alice") => Ordering::Less)]
        #[test_case(cc_script("alice"), drep_script("alice") => Ordering::Less)]
        #[test_case(cc_script("bob"), cc_script("alice") => Ordering::Greater)]
        #[test_case(drep_script("alice"), cc_key("alice") => Ordering::Greater)]
        #[test_case(drep_script("alice"), drep_key("alice") => Ordering::Less)]
        #[test_case(drep_key("alice"), spo("alice") => Ordering::Less)]
        #[test_case(spo("alice"), drep_script("alice") => Ordering::Greater)]
        fn voter_ordering(left: Voter, right: Voter) -> Ordering {
            left.cmp(&right)
        }
    }

    #[test]
    fn full_tx_roundtrips() {
        let tx = Tx {
            transaction_body: TransactionBody {
                inputs: Set::from(vec![TransactionInput {
                    transaction_id: fake_hash32(1),
                    index: 3,
                }]),
                outputs: vec![TransactionOutput::PostAlonzo(PostAlonzoTransactionOutput {
                    address: Bytes::from(vec![0x61; 29]),
                    value: Value::Coin(1_500_000),
                    datum_option: None,
                    script_ref: None,
                })],
                fee: 168_000,
                ..Default::default()
            },
            transaction_witness_set: WitnessSet::default(),
            success: true,
            auxiliary_data: Nullable::Null,
        };

        assert_eq!(roundtrip(&tx), tx);
    }

    mod value_arithmetic {
        use super::*;
        use proptest::prelude::*;

        prop_compose! {
            fn arb_value()(
                coin in 0u64..=u64::MAX / 4,
                quantities in proptest::collection::vec((0u8..4, 0u64..=u64::MAX / 4), 0..4),
            ) -> Value {
                let assets = quantities
                    .into_iter()
                    .map(|(seed, quantity)| ((fake_hash28(seed), vec![seed]), quantity))
                    .collect();

                Value::from_parts(coin, assets)
            }
        }

        proptest! {
            #[test]
            fn addition_commutes(a in arb_value(), b in arb_value()) {
                prop_assert_eq!(a.add(&b).unwrap(), b.add(&a).unwrap());
            }

            #[test]
            fn subtraction_undoes_addition(a in arb_value(), b in arb_value()) {
                let sum = a.add(&b).unwrap();
                prop_assert_eq!(sum.sub(&b).unwrap(), a.normalize());
            }

            #[test]
            fn self_subtraction_is_zero(a in arb_value()) {
                prop_assert!(a.sub(&a).unwrap().is_zero());
            }

            #[test]
            fn normalization_is_idempotent(a in arb_value()) {
                let once = a.normalize();
                prop_assert_eq!(once.normalize(), once);
            }
        }

        #[test]
        fn subtraction_underflow_fails() {
            let a = Value::Coin(5);
            let b = Value::Coin(7);
            assert_eq!(a.sub(&b).unwrap_err(), ValueError::Underflow);
        }

        #[test]
        fn zero_quantities_are_pruned() {
            let noisy = Value::from_parts(
                7,
                [((fake_hash28(1), vec![1]), 0u64)].into_iter().collect(),
            );

            assert_eq!(noisy, Value::Coin(7));
        }
    }
}
