//! Randomised checks of layout, bit-set, vector and number encodings.

use ntest::timeout;
use rand::seq::SliceRandom;
use rand::Rng;
use std::sync::Arc;

use abi_layout_core::bitset::BitSet;
use abi_layout_core::c_enum;
use abi_layout_core::enum_field::{CEnum, EnumField};
use abi_layout_core::fixed_point::FixedPoint;
use abi_layout_core::record::{FieldDef, FieldKind, RecordSchema};
use abi_layout_core::storable::{big_to_host, host_endianness, host_to_big, Endianness};
use abi_layout_core::vector::Vector;

c_enum! {
    enum Flag { F0, F1, F2, F3, F4, F5 }
}

fn random_kind(rng: &mut impl Rng, depth: usize) -> FieldKind {
    match rng.gen_range(0..if depth < 2 { 8 } else { 6 }) {
        0 => FieldKind::of::<u8>(),
        1 => FieldKind::of::<u16>(),
        2 => FieldKind::of::<u32>(),
        3 => FieldKind::of::<u64>(),
        4 => FieldKind::of::<f64>(),
        5 => FieldKind::array(FieldKind::of::<u8>(), rng.gen_range(1..9)),
        6 => FieldKind::array(random_kind(rng, depth + 1), rng.gen_range(1..4)),
        _ => FieldKind::Record(Arc::new(random_schema(rng, depth + 1))),
    }
}

fn random_schema(rng: &mut impl Rng, depth: usize) -> RecordSchema {
    let count = rng.gen_range(0..6);
    let defs = (0..count)
        .map(|i| FieldDef::new(format!("f{i}"), random_kind(rng, depth)))
        .collect();
    RecordSchema::new(format!("r{depth}"), defs).unwrap()
}

#[timeout(10000)]
#[test]
fn test_random_layouts_are_c_compatible() {
    let mut rng = rand::thread_rng();
    for _ in 0..300 {
        let schema = random_schema(&mut rng, 0);
        let mut cursor = 0;
        for field in schema.fields() {
            assert!(field.offset >= cursor, "fields overlap");
            assert_eq!(field.offset % field.align, 0);
            assert!(field.offset - cursor < field.align, "padding wider than alignment");
            cursor = field.end_offset();
        }
        assert_eq!(schema.record_size(), cursor);
        assert_eq!(schema.full_size() % schema.alignment(), 0);
        assert!(schema.full_size() - schema.record_size() < schema.alignment());
        let sizes: usize = schema.fields().iter().map(|f| f.size).sum();
        assert_eq!(sizes + schema.padding().total(), schema.full_size());
    }
}

#[timeout(5000)]
#[test]
fn test_bitset_laws() {
    let mut rng = rand::thread_rng();
    for _ in 0..500 {
        let xs: Vec<Flag> = (0..rng.gen_range(0..10))
            .map(|_| *Flag::VARIANTS.choose(&mut rng).unwrap())
            .collect();
        let set: BitSet<u8, Flag> = xs.iter().copied().collect();

        let mut dedup = xs.clone();
        dedup.sort();
        dedup.dedup();
        assert_eq!(set.to_list(), dedup);
        assert_eq!(set.to_list().into_iter().collect::<BitSet<u8, Flag>>(), set);

        let e = *Flag::VARIANTS.choose(&mut rng).unwrap();
        assert!(set.insert(e).member(e));
        assert!(!set.delete(e).member(e));
        assert_eq!(set.union(set), set);
        assert_eq!(set.intersection(BitSet::empty()), BitSet::empty());
    }
}

#[timeout(1000)]
#[test]
fn test_enum_round_trip() {
    for &flag in Flag::VARIANTS {
        let field = EnumField::<u16, Flag>::new(flag).unwrap();
        assert_eq!(field.get().unwrap(), flag);
        assert_eq!(Flag::from_code(flag.to_code()), Some(flag));
    }
}

#[timeout(5000)]
#[test]
fn test_vector_lengths_and_concat() {
    let mut rng = rand::thread_rng();
    for _ in 0..200 {
        let xs: Vec<u32> = (0..rng.gen_range(0..12)).map(|_| rng.gen()).collect();
        let filled = Vector::<6, u32>::from_filled_list(7, xs.iter().copied());
        assert_eq!(filled.to_list().len(), 6);

        let a = Vector::<2, u32>::from_filled_list(0, xs.iter().copied());
        let b = Vector::<4, u32>::from_filled_list(0, xs.iter().rev().copied());
        let joined = Vector::<6, u32>::concat(&[a.view(), b.view()]).unwrap();
        let mut expected = a.to_list();
        expected.extend(b.to_list());
        assert_eq!(joined.to_list(), expected);
    }
}

#[timeout(5000)]
#[test]
fn test_fixed_point_precision() {
    type Q = FixedPoint<i32, 20, 12>;
    let mut rng = rand::thread_rng();
    for _ in 0..1000 {
        let x: f64 = rng.gen_range(-500_000.0..500_000.0);
        let fixed = Q::to_fixed_point(x).unwrap();
        assert!((fixed.from_fixed_point() - x).abs() <= Q::EPSILON);

        let exact = f64::from(rng.gen_range(-1_000_000i32..1_000_000)) * Q::EPSILON;
        assert_eq!(Q::to_fixed_point(exact).unwrap().from_fixed_point(), exact);
    }
}

#[timeout(5000)]
#[test]
fn test_endianness_involution() {
    let mut rng = rand::thread_rng();
    for _ in 0..1000 {
        let w: u64 = rng.gen();
        assert_eq!(host_to_big(big_to_host(w)), w);
        if host_endianness() == Endianness::Little {
            assert_eq!(host_to_big(w), w.swap_bytes());
        } else {
            assert_eq!(host_to_big(w), w);
        }
    }
}
