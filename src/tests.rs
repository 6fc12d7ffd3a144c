extern crate std;

use std::{ops::Range, prelude::v1::*};

use proptest::prelude::*;

use crate::model;

use super::*;

fn traversal(tree: &AvlTree<u32>) -> Vec<u32> {
    tree.iter().copied().collect()
}

fn root_key(tree: &AvlTree<u32>) -> Option<u32> {
    tree.root.map(|root| unsafe { (*root.as_ptr()).key })
}

fn insert_find_all(keys: &[u32]) {
    let mut tree: AvlTree<u32> = AvlTree::new();

    for &key in keys {
        tree.insert(key);
        tree.assert_invariants();
    }

    for key in keys {
        assert_eq!(tree.get(key), Some(key));
    }
}

#[test]
fn zero_elems_find() {
    insert_find_all(&[]);
}

#[test]
fn single_elem_find() {
    insert_find_all(&[0]);
}

#[test]
fn two_elems_find() {
    insert_find_all(&[0, 1]);
    insert_find_all(&[1, 0]);
}

#[test]
fn three_elems_find() {
    insert_find_all(&[0, 1, 2]);
    insert_find_all(&[0, 2, 1]);
    insert_find_all(&[1, 0, 2]);
    insert_find_all(&[1, 2, 0]);
    insert_find_all(&[2, 0, 1]);
    insert_find_all(&[2, 1, 0]);
}

#[test]
fn four_elems_find() {
    insert_find_all(&[0, 1, 2, 3]);
    insert_find_all(&[0, 1, 3, 2]);
    insert_find_all(&[0, 2, 1, 3]);
    insert_find_all(&[0, 2, 3, 1]);
    insert_find_all(&[0, 3, 1, 2]);
    insert_find_all(&[0, 3, 2, 1]);

    insert_find_all(&[1, 0, 2, 3]);
    insert_find_all(&[1, 0, 3, 2]);
    insert_find_all(&[1, 2, 0, 3]);
    insert_find_all(&[1, 2, 3, 0]);
    insert_find_all(&[1, 3, 0, 2]);
    insert_find_all(&[1, 3, 2, 0]);

    insert_find_all(&[2, 0, 1, 3]);
    insert_find_all(&[2, 0, 3, 1]);
    insert_find_all(&[2, 1, 0, 3]);
    insert_find_all(&[2, 1, 3, 0]);
    insert_find_all(&[2, 3, 0, 1]);
    insert_find_all(&[2, 3, 1, 0]);

    insert_find_all(&[3, 0, 1, 2]);
    insert_find_all(&[3, 0, 2, 1]);
    insert_find_all(&[3, 1, 0, 2]);
    insert_find_all(&[3, 1, 2, 0]);
    insert_find_all(&[3, 2, 0, 1]);
    insert_find_all(&[3, 2, 1, 0]);
}

fn insert_remove_all(keys: &[u32]) {
    let mut tree: AvlTree<u32> = AvlTree::new();

    for &key in keys {
        tree.insert(key);
        tree.assert_invariants();
    }

    for key in keys {
        assert_eq!(tree.remove(key), Some(*key));
        tree.assert_invariants();
    }

    assert!(tree.is_empty());

    for &key in keys {
        tree.insert(key);
        tree.assert_invariants();
    }

    for key in keys.iter().rev() {
        assert_eq!(tree.remove(key), Some(*key));
        tree.assert_invariants();
    }

    assert!(tree.is_empty());
}

#[test]
fn remove_one() {
    insert_remove_all(&[0]);
}

#[test]
fn remove_two() {
    insert_remove_all(&[0, 1]);
    insert_remove_all(&[1, 0]);
}

#[test]
fn remove_three() {
    insert_remove_all(&[0, 1, 2]);
    insert_remove_all(&[0, 2, 1]);
    insert_remove_all(&[1, 0, 2]);
    insert_remove_all(&[1, 2, 0]);
    insert_remove_all(&[2, 0, 1]);
    insert_remove_all(&[2, 1, 0]);
}

#[test]
fn remove_four() {
    insert_remove_all(&[0, 1, 2, 3]);
    insert_remove_all(&[0, 1, 3, 2]);
    insert_remove_all(&[0, 2, 1, 3]);
    insert_remove_all(&[0, 2, 3, 1]);
    insert_remove_all(&[0, 3, 1, 2]);
    insert_remove_all(&[0, 3, 2, 1]);

    insert_remove_all(&[1, 0, 2, 3]);
    insert_remove_all(&[1, 0, 3, 2]);
    insert_remove_all(&[1, 2, 0, 3]);
    insert_remove_all(&[1, 2, 3, 0]);
    insert_remove_all(&[1, 3, 0, 2]);
    insert_remove_all(&[1, 3, 2, 0]);

    insert_remove_all(&[2, 0, 1, 3]);
    insert_remove_all(&[2, 0, 3, 1]);
    insert_remove_all(&[2, 1, 0, 3]);
    insert_remove_all(&[2, 1, 3, 0]);
    insert_remove_all(&[2, 3, 0, 1]);
    insert_remove_all(&[2, 3, 1, 0]);

    insert_remove_all(&[3, 0, 1, 2]);
    insert_remove_all(&[3, 0, 2, 1]);
    insert_remove_all(&[3, 1, 0, 2]);
    insert_remove_all(&[3, 1, 2, 0]);
    insert_remove_all(&[3, 2, 0, 1]);
    insert_remove_all(&[3, 2, 1, 0]);
}

#[test]
fn insert_rebalances_left_right_case() {
    let mut tree: AvlTree<u32> = AvlTree::new();

    for key in [20, 15, 16, 30] {
        tree.insert(key);
        tree.assert_invariants();
    }

    // Inserting 16 unbalances 20 with a right-leaning left child; the fixup
    // is a left rotation at 15 followed by a right rotation at 20, leaving 16
    // at the root.
    assert_eq!(root_key(&tree), Some(16));
    assert_eq!(tree.height(), 2);
    assert_eq!(traversal(&tree), [15, 16, 20, 30]);
}

#[test]
fn leaf_removal_may_skip_rotation() {
    let mut tree: AvlTree<u32> = AvlTree::new();

    for key in [20, 15, 16, 30] {
        tree.insert(key);
    }

    assert_eq!(tree.remove(&30), Some(30));
    tree.assert_invariants();

    assert_eq!(traversal(&tree), [15, 16, 20]);
    assert_eq!(tree.height(), 1);
}

#[test]
fn ascending_inserts_stay_balanced() {
    let mut tree: AvlTree<u32> = AvlTree::new();

    for key in 1..=7 {
        tree.insert(key);
        tree.assert_invariants();
    }

    // Repeated right-heavy fixups leave a perfectly balanced tree, not a
    // seven-deep chain.
    assert_eq!(root_key(&tree), Some(4));
    assert_eq!(tree.height(), 2);
    assert_eq!(traversal(&tree), [1, 2, 3, 4, 5, 6, 7]);
}

#[test]
fn removing_inner_node_swaps_in_predecessor() {
    let mut tree: AvlTree<u32> = AvlTree::new();

    for key in [20, 10, 30, 5, 15, 25, 35] {
        tree.insert(key);
    }

    assert_eq!(root_key(&tree), Some(20));
    assert_eq!(tree.remove(&20), Some(20));
    tree.assert_invariants();

    // The in-order predecessor (15) takes the removed root's place.
    assert_eq!(root_key(&tree), Some(15));
    assert_eq!(tree.height(), 2);
    assert_eq!(traversal(&tree), [5, 10, 15, 25, 30, 35]);
}

#[test]
fn duplicates_are_kept_and_removed_one_at_a_time() {
    let mut tree: AvlTree<u32> = AvlTree::new();

    for key in [5, 3, 5, 1, 5] {
        tree.insert(key);
        tree.assert_invariants();
    }

    assert_eq!(tree.len(), 5);
    assert_eq!(traversal(&tree), [1, 3, 5, 5, 5]);

    for remaining in [2usize, 1, 0] {
        assert_eq!(tree.remove(&5), Some(5));
        tree.assert_invariants();
        assert_eq!(tree.iter().filter(|&&key| key == 5).count(), remaining);
    }

    assert_eq!(tree.remove(&5), None);
    assert_eq!(traversal(&tree), [1, 3]);
}

#[test]
fn insert_then_remove_restores_traversal() {
    let mut tree: AvlTree<u32> = AvlTree::new();

    for key in [8, 4, 12, 2, 6, 10, 14] {
        tree.insert(key);
    }

    let before = traversal(&tree);

    // A fresh key and a duplicate of an existing one both round-trip.
    for key in [7, 10] {
        tree.insert(key);
        tree.assert_invariants();
        assert_eq!(tree.remove(&key), Some(key));
        tree.assert_invariants();
        assert_eq!(traversal(&tree), before);
    }
}

#[test]
fn removing_absent_key_is_a_noop() {
    let mut tree: AvlTree<u32> = AvlTree::new();

    for key in [2, 1, 3] {
        tree.insert(key);
    }

    assert_eq!(tree.remove(&9), None);
    assert_eq!(tree.remove(&9), None);
    tree.assert_invariants();
    assert_eq!(tree.len(), 3);
    assert_eq!(traversal(&tree), [1, 2, 3]);

    let mut empty: AvlTree<u32> = AvlTree::new();
    assert_eq!(empty.remove(&0), None);
    assert!(empty.is_empty());
}

#[test]
fn removing_last_element_empties_the_tree() {
    let mut tree: AvlTree<u32> = AvlTree::new();

    tree.insert(7);
    assert_eq!(tree.remove(&7), Some(7));

    assert!(tree.is_empty());
    assert_eq!(tree.len(), 0);
    assert_eq!(tree.height(), -1);
    assert_eq!(tree.first(), None);
    assert!(traversal(&tree).is_empty());
}

#[test]
fn removing_root_with_one_child_promotes_the_child() {
    let mut tree: AvlTree<u32> = AvlTree::new();

    tree.insert(2);
    tree.insert(1);

    assert_eq!(tree.remove(&2), Some(2));
    tree.assert_invariants();

    assert_eq!(root_key(&tree), Some(1));
    assert_eq!(tree.len(), 1);
    assert_eq!(tree.first(), Some(&1));
    assert_eq!(tree.last(), Some(&1));
}

#[test]
fn first_and_last_track_the_extremes() {
    let mut tree: AvlTree<u32> = AvlTree::new();

    assert_eq!(tree.first(), None);
    assert_eq!(tree.last(), None);

    for key in [5, 9, 1, 7, 3] {
        tree.insert(key);
    }

    assert_eq!(tree.first(), Some(&1));
    assert_eq!(tree.last(), Some(&9));

    tree.remove(&1);
    tree.remove(&9);

    assert_eq!(tree.first(), Some(&3));
    assert_eq!(tree.last(), Some(&7));
}

#[test]
fn len_tracks_inserts_and_removes() {
    let mut tree: AvlTree<u32> = AvlTree::new();

    assert!(tree.is_empty());

    for (count, key) in (1usize..).zip([4u32, 2, 4, 8]) {
        tree.insert(key);
        assert_eq!(tree.len(), count);
    }

    assert_eq!(tree.remove(&3), None);
    assert_eq!(tree.len(), 4);

    assert_eq!(tree.remove(&4), Some(4));
    assert_eq!(tree.len(), 3);

    tree.clear();
    assert!(tree.is_empty());
    assert_eq!(tree.len(), 0);
}

#[test]
fn cleared_tree_is_reusable() {
    let mut tree: AvlTree<u32> = AvlTree::new();

    for key in 0..100 {
        tree.insert(key);
    }

    tree.clear();
    assert!(tree.is_empty());
    tree.assert_invariants();

    for key in [3, 1, 2] {
        tree.insert(key);
        tree.assert_invariants();
    }

    assert_eq!(traversal(&tree), [1, 2, 3]);
}

#[test]
fn height_stays_within_avl_bound() {
    let mut tree: AvlTree<u32> = AvlTree::new();

    for key in 1..=1000 {
        tree.insert(key);

        let bound = 1.44 * ((tree.len() + 2) as f64).log2() - 0.328;
        assert!(f64::from(tree.height()) <= bound);
    }

    tree.assert_invariants();
    assert_eq!(tree.len(), 1000);
}

#[test]
fn lookups_accept_borrowed_keys() {
    let mut tree: AvlTree<String> = AvlTree::new();

    for key in ["pear", "apple", "quince"] {
        tree.insert(key.to_owned());
    }

    assert!(tree.contains("apple"));
    assert_eq!(tree.get("pear"), Some(&"pear".to_owned()));
    assert_eq!(tree.remove("quince"), Some("quince".to_owned()));
    assert_eq!(tree.remove("quince"), None);
    tree.assert_invariants();
}

#[test]
fn iterator_reports_exact_len_and_fuses() {
    let mut tree: AvlTree<u32> = AvlTree::new();

    for key in [2, 1, 3] {
        tree.insert(key);
    }

    let mut iter = tree.iter();
    assert_eq!(iter.len(), 3);
    assert_eq!(iter.size_hint(), (3, Some(3)));

    assert_eq!(iter.next(), Some(&1));
    assert_eq!(iter.len(), 2);

    assert_eq!(iter.next(), Some(&2));
    assert_eq!(iter.next(), Some(&3));
    assert_eq!(iter.len(), 0);

    assert_eq!(iter.next(), None);
    assert_eq!(iter.next(), None);
}

#[test]
fn iteration_climbs_to_distant_successors() {
    let mut tree: AvlTree<u32> = AvlTree::new();

    for key in [8, 4, 12, 2, 6, 10, 14, 5, 7] {
        tree.insert(key);
    }

    // After 7, the next element (8) is two parent hops past 7's own parent.
    assert_eq!(traversal(&tree), [2, 4, 5, 6, 7, 8, 10, 12, 14]);
}

#[test]
fn debug_formats_as_a_set() {
    let mut tree: AvlTree<u32> = AvlTree::new();

    for key in [2, 1, 3] {
        tree.insert(key);
    }

    assert_eq!(format!("{tree:?}"), "{1, 2, 3}");
}

#[test]
fn dotgraph_renders_every_level() {
    let mut tree: AvlTree<u32> = AvlTree::new();

    let mut out = String::new();
    tree.dotgraph("empty", &mut out).unwrap();
    assert_eq!(out, "digraph \"graph-empty\" {}");

    for key in [2, 1, 3, 1] {
        tree.insert(key);
    }

    let mut out = String::new();
    tree.dotgraph("t", &mut out).unwrap();

    assert!(out.starts_with("digraph \"graph-t\" {"));
    assert_eq!(out.matches("{rank=same; ").count(), 4);
    assert_eq!(out.matches("label=").count(), 4);
    assert_eq!(out.matches("shape=point").count(), 5);
}

#[test]
fn tree_and_iter_are_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}

    assert_send_sync::<AvlTree<u32>>();
    assert_send_sync::<Iter<'static, u32>>();
}

#[cfg(miri)]
const FUZZ_RANGE: Range<usize> = 0..10;

#[cfg(not(miri))]
const FUZZ_RANGE: Range<usize> = 0..1000;

proptest::proptest! {
    #![proptest_config(ProptestConfig {
        max_shrink_iters: 65536,
        .. ProptestConfig::default()
    })]

    #[test]
    fn model_equivalence(ops in proptest::collection::vec(model::op_strategy(), FUZZ_RANGE)) {
        model::run_model_equivalence(ops);
    }
}
