use krios_codec::utils::{Bytes, KeyValuePairs, MaybeIndefArray, Set};
use krios_codec::{data::Int, Fragment};
use proptest::prelude::*;

fn roundtrip<T>(value: &T) -> T
where
    T: krios_codec::Encode + for<'b> krios_codec::Decode<'b>,
{
    let bytes = value.encode_fragment().expect("encode");
    let back: T = krios_codec::decode(&bytes).expect("decode");

    // and the canonical re-encoding is byte-identical
    assert_eq!(back.encode_fragment().expect("re-encode"), bytes);

    back
}

proptest! {
    #[test]
    fn unsigned_ints(value: u64) {
        prop_assert_eq!(roundtrip(&value), value);
    }

    #[test]
    fn signed_ints(value: i64) {
        prop_assert_eq!(roundtrip(&value), value);
    }

    #[test]
    fn full_range_ints(value in (-(1i128 << 64))..(1i128 << 64)) {
        let int = Int::try_from(value).unwrap();
        prop_assert_eq!(roundtrip(&int), int);
    }

    #[test]
    fn byte_strings(value in proptest::collection::vec(any::<u8>(), 0..256)) {
        let bytes = Bytes::from(value);
        prop_assert_eq!(roundtrip(&bytes), bytes);
    }

    #[test]
    fn text_strings(value in "[a-zA-Z0-9 ]{0,64}") {
        prop_assert_eq!(roundtrip(&value.to_string()), value);
    }

    #[test]
    fn nested_arrays(value in proptest::collection::vec(proptest::collection::vec(any::<u64>(), 0..8), 0..8)) {
        prop_assert_eq!(roundtrip(&value), value);
    }

    #[test]
    fn maps(entries in proptest::collection::vec((any::<u64>(), any::<u64>()), 0..16)) {
        let kvs = KeyValuePairs::Def(entries);
        prop_assert_eq!(roundtrip(&kvs), kvs);
    }

    #[test]
    fn tagged_sets(value in proptest::collection::vec(any::<u32>(), 0..16)) {
        let set = Set::from(value);
        prop_assert_eq!(roundtrip(&set), set);
    }

    #[test]
    fn indefinite_arrays_stay_indefinite(value in proptest::collection::vec(any::<u64>(), 0..8)) {
        let array = MaybeIndefArray::Indef(value);
        prop_assert_eq!(roundtrip(&array), array);
    }
}
