use std::collections::BTreeMap;

use super::{CostModel, CostModels, Language, NonEmptySet, PlutusData, Redeemers, WitnessSet};
use krios_codec::{encode, Encode, Encoder};
use krios_crypto::hash::{Hash, Hasher};
use serde::{Deserialize, Serialize};

/// The language views of the cost models a transaction depends on, in the
/// Cardano-specific encoding used only inside the script integrity hash.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LanguageViews(pub BTreeMap<Language, CostModel>);

impl FromIterator<(Language, CostModel)> for LanguageViews {
    fn from_iter<I: IntoIterator<Item = (Language, CostModel)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl LanguageViews {
    /// Picks the views for the given languages out of a protocol parameter
    /// cost model table. Languages without a model are skipped.
    pub fn select(models: &CostModels, languages: &[Language]) -> Self {
        languages
            .iter()
            .filter_map(|lang| models.for_language(*lang).map(|m| (*lang, m.clone())))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Encode for LanguageViews {
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>) -> Result<(), encode::Error<W::Error>> {
        let mut canonical_order: Vec<Language> = self
            .0
            .keys()
            .copied()
            .filter(|k| *k != Language::PlutusV1)
            .collect();
        canonical_order.sort();
        // PlutusV1 is keyed by the bytes 0x4100 which sort after the plain
        // uint keys of the other languages, so it goes last
        if self.0.contains_key(&Language::PlutusV1) {
            canonical_order.push(Language::PlutusV1);
        }

        e.map(self.0.len() as u64)?;
        for lang in canonical_order {
            let cost_model = &self.0[&lang];
            match lang {
                Language::PlutusV1 => {
                    // the historical quirk: the key is the CBOR of 0 wrapped
                    // in a byte string, the value is the cost model list
                    // encoded indefinitely and wrapped in a byte string
                    let mut inner = vec![];
                    let mut sub = Encoder::new(&mut inner);
                    sub.begin_array().expect("infallible");
                    for v in cost_model.iter() {
                        sub.i64(*v).expect("infallible");
                    }
                    sub.end().expect("infallible");

                    e.bytes(&krios_codec::to_vec(&0u8).expect("infallible"))?;
                    e.bytes(&inner)?;
                }
                _ => {
                    e.encode(&lang)?;
                    e.encode(cost_model)?;
                }
            }
        }
        Ok(())
    }
}

/// The witness material committed to by the script integrity hash.
#[derive(Debug, Clone)]
pub struct ScriptData {
    pub redeemers: Option<Redeemers>,
    pub datums: Option<NonEmptySet<PlutusData>>,
    pub language_views: Option<LanguageViews>,
}

impl ScriptData {
    /// Computes the script integrity hash: blake2b-256 over the
    /// concatenation of the redeemers, the datum set when non-empty and the
    /// language views.
    ///
    /// When the transaction has datums but no redeemers, the preimage is
    /// `A0 || datums || A0`, a legacy shape certain scripts depend on.
    pub fn hash(&self) -> Hash<32> {
        let mut buf = vec![];

        if let Some(redeemers) = &self.redeemers {
            krios_codec::encode(redeemers, &mut buf).expect("infallible");
        } else {
            buf.push(0xa0);
        }

        if let Some(datums) = &self.datums {
            krios_codec::encode(datums, &mut buf).expect("infallible");
        }

        if let Some(language_views) = &self.language_views {
            krios_codec::encode(language_views, &mut buf).expect("infallible");
        } else {
            buf.push(0xa0);
        }

        Hasher::<256>::hash(&buf)
    }

    /// Assembles the script data for a witness set, or `None` when the
    /// transaction commits to no script material and the body field must be
    /// absent.
    pub fn build_for(witness: &WitnessSet, language_views: &Option<LanguageViews>) -> Option<Self> {
        let redeemers = witness.redeemer.clone();
        let datums = witness.plutus_data.clone();

        if redeemers.is_none() && datums.is_none() {
            return None;
        }

        let language_views = if redeemers.is_some() {
            language_views.clone()
        } else {
            None
        };

        Some(ScriptData {
            redeemers,
            datums,
            language_views,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conway::{BigInt, ExUnits, Redeemer, RedeemerTag};
    use krios_codec::Fragment;

    fn datum_42() -> PlutusData {
        PlutusData::BigInt(BigInt::Int(42.into()))
    }

    fn v1_model() -> CostModel {
        // shortened model, the encoding quirk does not depend on its length
        vec![197209, 0, 1, 1, 396231, 621]
    }

    #[test]
    fn v1_language_view_uses_double_encoding() {
        let views: LanguageViews = [(Language::PlutusV1, v1_model())].into_iter().collect();

        let bytes = krios_codec::to_vec(&views).unwrap();

        let mut d = krios_codec::Decoder::new(&bytes);
        assert_eq!(d.map().unwrap(), Some(1));

        // the key is the byte string h'00', not the plain uint 0
        assert_eq!(d.bytes().unwrap(), &[0x00]);

        // the value is a byte string wrapping an indefinite array
        let wrapped = d.bytes().unwrap();
        assert_eq!(wrapped[0], 0x9f);
        assert_eq!(*wrapped.last().unwrap(), 0xff);
    }

    #[test]
    fn v2_language_view_is_straightforward() {
        let views: LanguageViews = [(Language::PlutusV2, vec![1i64, 2, 3])].into_iter().collect();

        let bytes = krios_codec::to_vec(&views).unwrap();
        assert_eq!(hex::encode(bytes), "a10183010203");
    }

    #[test]
    fn v1_sorts_after_other_languages() {
        let views: LanguageViews = [
            (Language::PlutusV1, v1_model()),
            (Language::PlutusV2, vec![1i64]),
        ]
        .into_iter()
        .collect();

        let bytes = krios_codec::to_vec(&views).unwrap();

        // two entries; the first key is the plain uint 1 (v2), the
        // byte-string-keyed v1 entry goes last
        assert_eq!(bytes[0], 0xa2);
        assert_eq!(bytes[1], 0x01);
    }

    #[test]
    fn datums_without_redeemers_use_legacy_preimage() {
        let datums = NonEmptySet::from_vec(vec![datum_42()]).unwrap();

        let data = ScriptData {
            redeemers: None,
            datums: Some(datums.clone()),
            language_views: None,
        };

        let mut preimage = vec![0xa0];
        krios_codec::encode(&datums, &mut preimage).unwrap();
        preimage.push(0xa0);

        assert_eq!(data.hash(), Hasher::<256>::hash(&preimage));
    }

    #[test]
    fn redeemers_change_the_preimage_shape() {
        let redeemers = Redeemers::List(vec![Redeemer {
            tag: RedeemerTag::Spend,
            index: 0,
            data: datum_42(),
            ex_units: ExUnits { mem: 10, steps: 20 },
        }]);

        let views: LanguageViews = [(Language::PlutusV1, v1_model())].into_iter().collect();

        let data = ScriptData {
            redeemers: Some(redeemers.clone()),
            datums: None,
            language_views: Some(views.clone()),
        };

        let mut preimage = vec![];
        krios_codec::encode(&redeemers, &mut preimage).unwrap();
        krios_codec::encode(&views, &mut preimage).unwrap();

        assert_eq!(data.hash(), Hasher::<256>::hash(&preimage));
    }

    #[test]
    fn no_script_material_means_no_hash() {
        let witness = WitnessSet::default();
        assert!(ScriptData::build_for(&witness, &None).is_none());
    }

    #[test]
    fn hash_is_stable_across_reparse() {
        let datums = NonEmptySet::from_vec(vec![datum_42()]).unwrap();

        let data = ScriptData {
            redeemers: None,
            datums: Some(datums.clone()),
            language_views: None,
        };

        let first = data.hash();

        let bytes = datums.encode_fragment().unwrap();
        let reparsed: NonEmptySet<PlutusData> = krios_codec::decode(&bytes).unwrap();

        let again = ScriptData {
            redeemers: None,
            datums: Some(reparsed),
            language_views: None,
        }
        .hash();

        assert_eq!(first, again);
    }
}
