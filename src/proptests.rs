use proptest::prelude::*;
use std::collections::BTreeMap;
use std::fs;
use std::ops::Bound::{self, Excluded, Included, Unbounded};
use std::path::Path;

use crate::container::{ByteMap, Container, HexMap, LinkMap};
use crate::disk::DiskTrie;
use crate::trie::Trie;

const KEY_SIZE: usize = 3;

#[derive(Clone, Debug)]
enum Op {
    Insert(Vec<u8>, u32),
    Remove(Vec<u8>),
    Get(Vec<u8>),
    Above(Vec<u8>),
    Below(Vec<u8>),
    Scan(Vec<u8>, Vec<u8>),
}

fn key_strategy(symbols: &'static [u8]) -> impl Strategy<Value = Vec<u8>> + Clone {
    // A handful of symbols per level makes shared prefixes and exact hits common.
    prop::collection::vec(prop::sample::select(symbols), KEY_SIZE)
}

fn ops_strategy(symbols: &'static [u8]) -> impl Strategy<Value = Vec<Op>> {
    let key = key_strategy(symbols);
    let op = prop_oneof![
        40 => (key.clone(), any::<u32>()).prop_map(|(k, v)| Op::Insert(k, v)),
        20 => key.clone().prop_map(Op::Remove),
        10 => key.clone().prop_map(Op::Get),
        10 => key.clone().prop_map(Op::Above),
        10 => key.clone().prop_map(Op::Below),
        10 => (key.clone(), key.clone()).prop_map(|(a, b)| Op::Scan(a, b)),
    ];
    prop::collection::vec(op, 0..=400)
}

fn above(m: &BTreeMap<Vec<u8>, u32>, key: &[u8]) -> Option<u32> {
    m.range::<[u8], _>((Excluded(key), Unbounded))
        .next()
        .map(|(_, v)| *v)
}

fn below(m: &BTreeMap<Vec<u8>, u32>, key: &[u8]) -> Option<u32> {
    m.range::<[u8], _>((Unbounded, Excluded(key)))
        .next_back()
        .map(|(_, v)| *v)
}

fn scan(m: &BTreeMap<Vec<u8>, u32>, lo: &[u8], hi: &[u8]) -> Vec<u32> {
    if lo > hi {
        return vec![];
    }
    let bounds: (Bound<&[u8]>, Bound<&[u8]>) = (Included(lo), Excluded(hi));
    m.range::<[u8], _>(bounds).map(|(_, v)| *v).collect()
}

fn run_memory<C: Container>(factory: fn() -> C, ops: Vec<Op>) -> Result<(), TestCaseError> {
    let mut t: Trie<u32, C> = Trie::new(KEY_SIZE, factory);
    let mut m: BTreeMap<Vec<u8>, u32> = BTreeMap::new();

    for op in ops {
        match op {
            Op::Insert(key, value) => {
                let old_t = t.set(&key, value).unwrap();
                let old_m = m.insert(key, value);
                prop_assert_eq!(old_t, old_m);
            }
            Op::Remove(key) => {
                let removed = t.delete(&key).unwrap();
                prop_assert_eq!(removed, m.remove(&key).is_some());
            }
            Op::Get(key) => {
                prop_assert_eq!(t.get(&key).unwrap().copied(), m.get(&key).copied());
            }
            Op::Above(key) => {
                prop_assert_eq!(t.gt(&key).unwrap().copied(), above(&m, &key));
            }
            Op::Below(key) => {
                prop_assert_eq!(t.lt(&key).unwrap().copied(), below(&m, &key));
            }
            Op::Scan(lo, hi) => {
                let got = t
                    .scan(Included(&lo), Excluded(&hi))
                    .unwrap()
                    .into_iter()
                    .copied()
                    .collect::<Vec<_>>();
                prop_assert_eq!(got, scan(&m, &lo, &hi));
            }
        }
        prop_assert_eq!(t.len(), m.len());
    }

    let got: Vec<(Vec<u8>, u32)> = t.iter().map(|(k, v)| (k.to_vec(), *v)).collect();
    let expected: Vec<(Vec<u8>, u32)> = m.iter().map(|(k, v)| (k.clone(), *v)).collect();
    prop_assert_eq!(&got, &expected);

    let mut back: Vec<(Vec<u8>, u32)> = t.iter().rev().map(|(k, v)| (k.to_vec(), *v)).collect();
    back.reverse();
    prop_assert_eq!(back, expected);
    Ok(())
}

fn encode(value: u32) -> Vec<u8> {
    value.to_be_bytes().to_vec()
}

fn decode(bytes: Vec<u8>) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes);
    u32::from_be_bytes(buf)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence_bytemap(ops in ops_strategy(&[0, 1, 127, 128, 254, 255])) {
        run_memory(ByteMap::new, ops)?;
    }

    #[test]
    fn prop_equivalence_linkmap(ops in ops_strategy(&[0, 1, 127, 128, 254, 255])) {
        run_memory(LinkMap::new, ops)?;
    }

    #[test]
    fn prop_equivalence_hexmap(ops in ops_strategy(b"09af")) {
        run_memory(HexMap::new, ops)?;
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 24,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence_disk(ops in ops_strategy(&[0, 1, 128, 255])) {
        let path = Path::new("target/prop_equivalence_disk.tmp");
        if path.exists() {
            fs::remove_file(path).unwrap();
        }
        let mut t = DiskTrie::open(path, KEY_SIZE).unwrap();
        let mut m: BTreeMap<Vec<u8>, u32> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(key, value) => {
                    t.set(&key, &encode(value)).unwrap();
                    m.insert(key, value);
                }
                Op::Remove(key) => {
                    prop_assert_eq!(t.delete(&key).unwrap(), m.remove(&key).is_some());
                }
                Op::Get(key) => {
                    prop_assert_eq!(t.lookup(&key).unwrap().map(decode), m.get(&key).copied());
                }
                Op::Above(key) => {
                    prop_assert_eq!(t.gt(&key).unwrap().map(decode), above(&m, &key));
                }
                Op::Below(key) => {
                    prop_assert_eq!(t.lt(&key).unwrap().map(decode), below(&m, &key));
                }
                Op::Scan(lo, hi) => {
                    let got = t
                        .scan(Included(&lo), Excluded(&hi))
                        .unwrap()
                        .into_iter()
                        .map(decode)
                        .collect::<Vec<_>>();
                    prop_assert_eq!(got, scan(&m, &lo, &hi));
                }
            }
            prop_assert_eq!(t.len(), m.len());
        }

        drop(t);
        let t = DiskTrie::open(path, KEY_SIZE).unwrap();
        prop_assert_eq!(t.len(), m.len());
        let got = t
            .iter()
            .map(|entry| entry.map(|(k, v)| (k, decode(v))))
            .collect::<crate::Result<Vec<_>>>()
            .unwrap();
        let expected: Vec<(Vec<u8>, u32)> = m.iter().map(|(k, v)| (k.clone(), *v)).collect();
        prop_assert_eq!(got, expected);
    }
}
