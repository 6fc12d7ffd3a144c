//! Reference-model equivalence checking.
//!
//! A sorted `Vec<u32>` plays the multiset against which every [`AvlTree`]
//! operation is compared; after each operation the tree's structural
//! invariants, length, full in-order sequence, and height bound are asserted.
//! The [`Op`] type derives [`arbitrary::Arbitrary`] so the fuzz targets can
//! feed this module directly.

extern crate std;

use std::prelude::v1::*;

use arbitrary::Arbitrary;
use proptest::strategy::{Just, Strategy};

use crate::AvlTree;

#[derive(Copy, Clone, Debug, Arbitrary)]
pub enum ItemValue {
    Index(usize),
    Random(u32),
}

proptest::prop_compose! {
    fn index_strategy()(
        index in 0usize..1000,
    ) -> ItemValue {
        ItemValue::Index(index)
    }
}

proptest::prop_compose! {
    fn random_strategy()(
        random in 0u32..1000,
    ) -> ItemValue {
        ItemValue::Random(random)
    }
}

fn value_strategy() -> impl Strategy<Value = ItemValue> {
    proptest::prop_oneof![index_strategy(), random_strategy()]
}

#[derive(Copy, Clone, Debug, Arbitrary)]
pub enum Op {
    Insert(ItemValue),
    Get(ItemValue),
    Remove(ItemValue),
    Contains(ItemValue),
    First,
    Last,
}

impl Op {
    fn finalize(self, sorted: &[u32]) -> FinalOp {
        // `Index` picks an element already present so that removals and
        // lookups hit often; `Random` explores misses.
        fn get_value(v: &[u32], i: ItemValue) -> u32 {
            match i {
                ItemValue::Index(idx) => {
                    if v.is_empty() {
                        idx as u32
                    } else {
                        v[idx % v.len().max(1)]
                    }
                }
                ItemValue::Random(v) => v,
            }
        }

        match self {
            Op::Insert(item) => FinalOp::Insert(get_value(sorted, item)),
            Op::Get(item) => FinalOp::Get(get_value(sorted, item)),
            Op::Remove(item) => FinalOp::Remove(get_value(sorted, item)),
            Op::Contains(item) => FinalOp::Contains(get_value(sorted, item)),
            Op::First => FinalOp::First,
            Op::Last => FinalOp::Last,
        }
    }
}

#[derive(Copy, Clone, Debug)]
enum FinalOp {
    Insert(u32),
    Get(u32),
    Remove(u32),
    Contains(u32),
    First,
    Last,
}

pub fn op_strategy() -> impl Strategy<Value = Op> {
    proptest::prop_oneof![
        value_strategy().prop_map(Op::Insert),
        value_strategy().prop_map(Op::Get),
        value_strategy().prop_map(Op::Remove),
        value_strategy().prop_map(Op::Contains),
        Just(Op::First),
        Just(Op::Last),
    ]
}

pub fn run_model_equivalence(ops: Vec<Op>) {
    let mut sorted_values: Vec<u32> = Vec::with_capacity(ops.len());
    let mut tree: AvlTree<u32> = AvlTree::new();

    // Unlike a set model, equal values are kept: one slot per insertion.
    fn insert_sorted(v: &mut Vec<u32>, value: u32) {
        let (Ok(idx) | Err(idx)) = v.binary_search(&value);
        v.insert(idx, value);
    }

    fn remove_sorted(v: &mut Vec<u32>, value: u32) -> Option<u32> {
        match v.binary_search(&value) {
            Ok(idx) => Some(v.remove(idx)),
            Err(_) => None,
        }
    }

    let mut final_ops = Vec::with_capacity(ops.len());
    for (op_id, op) in ops.into_iter().enumerate() {
        let final_op = op.finalize(&sorted_values);
        final_ops.push(final_op);

        match final_op {
            FinalOp::Insert(value) => {
                insert_sorted(&mut sorted_values, value);
                tree.insert(value);
            }

            FinalOp::Get(value) => {
                let from_model = sorted_values.binary_search(&value).is_ok().then_some(value);
                let from_tree = tree.get(&value).copied();

                assert_eq!(from_model, from_tree, "FinalOp #{op_id}: {op:?}");
            }

            FinalOp::Remove(value) => {
                let from_model = remove_sorted(&mut sorted_values, value);
                let from_tree = tree.remove(&value);

                assert_eq!(from_model, from_tree, "FinalOp #{op_id}: {op:?}");
            }

            FinalOp::Contains(value) => {
                let from_model = sorted_values.binary_search(&value).is_ok();
                let from_tree = tree.contains(&value);

                assert_eq!(from_model, from_tree, "FinalOp #{op_id}: {op:?}");
            }

            FinalOp::First => {
                let from_model = sorted_values.first();
                let from_tree = tree.first();

                assert_eq!(from_model, from_tree, "FinalOp #{op_id}: {op:?}");
            }

            FinalOp::Last => {
                let from_model = sorted_values.last();
                let from_tree = tree.last();

                assert_eq!(from_model, from_tree, "FinalOp #{op_id}: {op:?}");
            }
        }

        tree.assert_invariants();
        assert_eq!(sorted_values.len(), tree.len());
        assert!(sorted_values.iter().zip(tree.iter()).all(|(&a, &b)| a == b));

        let height_bound = 1.44 * ((tree.len() + 2) as f64).log2() - 0.328;
        assert!(
            f64::from(tree.height()) <= height_bound,
            "height {} exceeds AVL bound {height_bound} at {} elements",
            tree.height(),
            tree.len(),
        );
    }
}
