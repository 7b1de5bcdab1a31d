//! Turns a [`StagingTransaction`] into a wire-ready Conway transaction.

use krios_codec::Fragment;
use krios_primitives::conway::{
    Certificate, DatumOption, KeyValuePairs, Mint, NativeScript, NetworkId, NonEmptyKeyValuePairs,
    NonEmptySet, NonZeroInt, PlutusData, PlutusScript, PositiveCoin, PostAlonzoTransactionOutput,
    ProposalProcedure, ScriptData, ScriptRef, Set, TransactionBody, TransactionInput,
    TransactionOutput, Tx, Value, VotingProcedure, VotingProcedures, WitnessSet,
};
use krios_primitives::{CborWrap, ComputeHash, ExUnits as WireExUnits, Metadata};

use std::collections::BTreeMap;

use crate::transaction::{
    model::{
        BuilderEra, BuiltTransaction, DatumKind, ExUnits, Output, RedeemerPurpose, ScriptKind,
        StagingTransaction,
    },
    TransactionStatus,
};
use crate::TxBuilderError;

pub trait BuildConway {
    /// Assembles the body and witness set exactly as staged, without
    /// balancing or fee computation.
    fn build_conway_raw(self) -> Result<BuiltTransaction, TxBuilderError>;
}

impl BuildConway for StagingTransaction {
    fn build_conway_raw(self) -> Result<BuiltTransaction, TxBuilderError> {
        let mut inputs = self
            .inputs
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|x| TransactionInput {
                transaction_id: x.tx_hash,
                index: x.txo_index,
            })
            .collect::<Vec<_>>();

        if inputs.is_empty() {
            return Err(TxBuilderError::NoInputs);
        }

        inputs.sort_unstable_by_key(|x| (x.transaction_id, x.index));

        let outputs = self
            .outputs
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(Output::build_conway_raw)
            .collect::<Result<Vec<_>, _>>()?;

        let mint: Option<Mint> = self.mint.as_ref().and_then(|mint| {
            let entries = mint
                .iter()
                .filter_map(|(policy, assets)| {
                    let assets = assets
                        .iter()
                        .filter_map(|(name, amount)| {
                            NonZeroInt::try_from(*amount)
                                .ok()
                                .map(|amount| (name.clone(), amount))
                        })
                        .collect::<Vec<_>>();

                    NonEmptyKeyValuePairs::from_vec(assets).map(|assets| (*policy, assets))
                })
                .collect::<Vec<_>>();

            NonEmptyKeyValuePairs::from_vec(entries)
        });

        let collateral = NonEmptySet::from_vec(
            self.collateral_inputs
                .as_deref()
                .unwrap_or_default()
                .iter()
                .map(|x| TransactionInput {
                    transaction_id: x.tx_hash,
                    index: x.txo_index,
                })
                .collect(),
        );

        let required_signers =
            NonEmptySet::from_vec(self.disclosed_signers.clone().unwrap_or_default());

        let network_id = if let Some(nid) = self.network_id {
            match NetworkId::try_from(nid) {
                Err(()) => return Err(TxBuilderError::InvalidNetworkId),
                Ok(network_id) => Some(network_id),
            }
        } else {
            None
        };

        let collateral_return = self
            .collateral_output
            .as_ref()
            .map(Output::build_conway_raw)
            .transpose()?;

        let reference_inputs = NonEmptySet::from_vec(
            self.reference_inputs
                .as_deref()
                .unwrap_or_default()
                .iter()
                .map(|x| TransactionInput {
                    transaction_id: x.tx_hash,
                    index: x.txo_index,
                })
                .collect(),
        );

        let certificates: Vec<Certificate> = self.certificates.clone().unwrap_or_default();

        let withdrawals: Option<KeyValuePairs<_, _>> = self.withdrawals.as_ref().map(|w| {
            w.iter()
                .map(|(account, amount)| (account.clone(), *amount))
                .collect()
        });

        let voting_procedures: Option<VotingProcedures> = self.votes.as_ref().map(|votes| {
            let mut by_voter = BTreeMap::new();

            for cast in votes {
                by_voter
                    .entry(cast.voter.clone())
                    .or_insert_with(Vec::new)
                    .push((
                        cast.action.clone(),
                        VotingProcedure {
                            vote: cast.vote.clone(),
                            anchor: cast.anchor.clone(),
                        },
                    ));
            }

            by_voter
                .into_iter()
                .map(|(voter, actions)| (voter, actions.into_iter().collect()))
                .collect()
        });

        let proposal_procedures: Vec<ProposalProcedure> = self.proposals.clone().unwrap_or_default();

        let (mut native_script, mut plutus_v1_script, mut plutus_v2_script, mut plutus_v3_script) =
            (vec![], vec![], vec![], vec![]);

        for script in self.scripts.iter().flat_map(|x| x.values()) {
            match script.kind {
                ScriptKind::Native => {
                    let script = NativeScript::decode_fragment(&script.bytes)
                        .map_err(|_| TxBuilderError::MalformedScript)?;

                    native_script.push(script)
                }
                ScriptKind::PlutusV1 => {
                    plutus_v1_script.push(PlutusScript::<1>(script.bytes.clone()))
                }
                ScriptKind::PlutusV2 => {
                    plutus_v2_script.push(PlutusScript::<2>(script.bytes.clone()))
                }
                ScriptKind::PlutusV3 => {
                    plutus_v3_script.push(PlutusScript::<3>(script.bytes.clone()))
                }
            }
        }

        let plutus_data = self
            .datums
            .iter()
            .flat_map(|x| x.values())
            .map(|x| {
                PlutusData::decode_fragment(x.as_ref()).map_err(|_| TxBuilderError::MalformedDatum)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mint_policies = mint
            .iter()
            .flat_map(|x| x.iter())
            .map(|(p, _)| *p)
            .collect::<Vec<_>>();

        let withdrawal_accounts: Vec<_> = withdrawals
            .iter()
            .flat_map(|w| w.iter())
            .map(|(account, _)| account.clone())
            .collect();

        let voters: Vec<_> = voting_procedures
            .iter()
            .flat_map(|v| v.iter())
            .map(|(voter, _)| voter.clone())
            .collect();

        let mut redeemers = vec![];

        if let Some(rdmrs) = &self.redeemers {
            for (purpose, (pd, ex_units)) in rdmrs.iter() {
                let ex_units = match ex_units {
                    Some(ExUnits { mem, steps }) => WireExUnits {
                        mem: *mem,
                        steps: *steps,
                    },
                    // the evaluator fills real budgets in during balancing
                    None => WireExUnits { mem: 0, steps: 0 },
                };

                let data = PlutusData::decode_fragment(pd.as_ref())
                    .map_err(|_| TxBuilderError::MalformedDatum)?;

                use krios_primitives::conway::{Redeemer, RedeemerTag};

                let (tag, index) = match purpose {
                    RedeemerPurpose::Spend(txin) => {
                        let index = inputs
                            .iter()
                            .position(|x| {
                                (x.transaction_id, x.index) == (txin.tx_hash, txin.txo_index)
                            })
                            .ok_or(TxBuilderError::RedeemerTargetMissing)?
                            as u32;

                        (RedeemerTag::Spend, index)
                    }
                    RedeemerPurpose::Mint(pid) => {
                        let index = mint_policies
                            .iter()
                            .position(|x| x == pid)
                            .ok_or(TxBuilderError::RedeemerTargetMissing)?
                            as u32;

                        (RedeemerTag::Mint, index)
                    }
                    RedeemerPurpose::Cert(index) => {
                        if *index as usize >= certificates.len() {
                            return Err(TxBuilderError::RedeemerTargetMissing);
                        }

                        (RedeemerTag::Cert, *index)
                    }
                    RedeemerPurpose::Reward(account) => {
                        let index = withdrawal_accounts
                            .iter()
                            .position(|x| x == account)
                            .ok_or(TxBuilderError::RedeemerTargetMissing)?
                            as u32;

                        (RedeemerTag::Reward, index)
                    }
                    RedeemerPurpose::Vote(voter) => {
                        let index = voters
                            .iter()
                            .position(|x| x == voter)
                            .ok_or(TxBuilderError::RedeemerTargetMissing)?
                            as u32;

                        (RedeemerTag::Vote, index)
                    }
                    RedeemerPurpose::Propose(index) => {
                        if *index as usize >= proposal_procedures.len() {
                            return Err(TxBuilderError::RedeemerTargetMissing);
                        }

                        (RedeemerTag::Propose, *index)
                    }
                };

                redeemers.push(Redeemer {
                    tag,
                    index,
                    data,
                    ex_units,
                });
            }
        }

        let witness_set = WitnessSet {
            vkeywitness: None,
            native_script: NonEmptySet::from_vec(native_script),
            bootstrap_witness: None,
            plutus_v1_script: NonEmptySet::from_vec(plutus_v1_script),
            plutus_v2_script: NonEmptySet::from_vec(plutus_v2_script),
            plutus_v3_script: NonEmptySet::from_vec(plutus_v3_script),
            plutus_data: NonEmptySet::from_vec(plutus_data),
            redeemer: if redeemers.is_empty() {
                None
            } else {
                Some(krios_primitives::conway::Redeemers::List(redeemers))
            },
        };

        let script_data_hash = match self.script_data_hash {
            Some(explicit) => Some(explicit),
            None => ScriptData::build_for(&witness_set, &self.language_views)
                .map(|script_data| script_data.hash()),
        };

        let auxiliary_data = self.metadata.as_ref().map(|metadata| {
            let metadata: Metadata = metadata
                .iter()
                .map(|(label, content)| (*label, content.clone()))
                .collect();

            krios_primitives::conway::AuxiliaryData::PostAlonzo(
                krios_primitives::conway::PostAlonzoAuxiliaryData {
                    metadata: Some(metadata),
                    ..Default::default()
                },
            )
        });

        let auxiliary_data_hash = auxiliary_data.as_ref().map(|aux| aux.compute_hash());

        let tx = Tx {
            transaction_body: TransactionBody {
                inputs: Set::from(inputs),
                outputs,
                fee: self.fee.unwrap_or_default(),
                ttl: self.invalid_from_slot,
                validity_interval_start: self.valid_from_slot,
                certificates: NonEmptySet::from_vec(certificates),
                withdrawals,
                update: None,
                auxiliary_data_hash,
                mint,
                script_data_hash,
                collateral,
                required_signers,
                network_id,
                collateral_return,
                total_collateral: self.total_collateral,
                reference_inputs,
                voting_procedures,
                proposal_procedures: NonEmptySet::from_vec(proposal_procedures),
                treasury_value: self.treasury_value,
                donation: self.donation.and_then(|x| PositiveCoin::try_from(x).ok()),
            },
            transaction_witness_set: witness_set,
            success: true,
            auxiliary_data: auxiliary_data.into(),
        };

        Ok(BuiltTransaction {
            version: self.version,
            era: BuilderEra::Conway,
            status: TransactionStatus::Built,
            tx_hash: tx.transaction_body.compute_hash(),
            tx_bytes: tx
                .encode_fragment()
                .map_err(|_| TxBuilderError::CorruptedTxBytes)?
                .into(),
            signatures: None,
        })
    }
}

impl Output {
    pub fn build_conway_raw(&self) -> Result<TransactionOutput, TxBuilderError> {
        let assets = self.assets.as_ref().and_then(|assets| {
            let entries = assets
                .iter()
                .filter_map(|(policy, assets)| {
                    let assets = assets
                        .iter()
                        .filter_map(|(name, amount)| {
                            PositiveCoin::try_from(*amount)
                                .ok()
                                .map(|amount| (name.clone(), amount))
                        })
                        .collect::<Vec<_>>();

                    NonEmptyKeyValuePairs::from_vec(assets).map(|assets| (*policy, assets))
                })
                .collect::<Vec<_>>();

            NonEmptyKeyValuePairs::from_vec(entries)
        });

        let value = match assets {
            Some(assets) => Value::Multiasset(self.lovelace, assets),
            None => Value::Coin(self.lovelace),
        };

        let datum_option = if let Some(d) = &self.datum {
            match d.kind {
                DatumKind::Hash => {
                    let dh: [u8; 32] = d
                        .bytes
                        .as_ref()
                        .try_into()
                        .map_err(|_| TxBuilderError::MalformedDatumHash)?;
                    Some(DatumOption::Hash(dh.into()))
                }
                DatumKind::Inline => {
                    let pd = PlutusData::decode_fragment(d.bytes.as_ref())
                        .map_err(|_| TxBuilderError::MalformedDatum)?;
                    Some(DatumOption::Data(CborWrap(pd)))
                }
            }
        } else {
            None
        };

        let script_ref = if let Some(s) = &self.script {
            let script = match s.kind {
                ScriptKind::Native => ScriptRef::NativeScript(
                    NativeScript::decode_fragment(s.bytes.as_ref())
                        .map_err(|_| TxBuilderError::MalformedScript)?,
                ),
                ScriptKind::PlutusV1 => {
                    ScriptRef::PlutusV1Script(PlutusScript::<1>(s.bytes.clone()))
                }
                ScriptKind::PlutusV2 => {
                    ScriptRef::PlutusV2Script(PlutusScript::<2>(s.bytes.clone()))
                }
                ScriptKind::PlutusV3 => {
                    ScriptRef::PlutusV3Script(PlutusScript::<3>(s.bytes.clone()))
                }
            };

            Some(CborWrap(script))
        } else {
            None
        };

        Ok(TransactionOutput::PostAlonzo(PostAlonzoTransactionOutput {
            address: self.address.to_vec().into(),
            value,
            datum_option,
            script_ref,
        }))
    }
}
