#![no_main]

use avltree::AvlTree;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: (Vec<u32>, Vec<u32>)| {
    let (inserts, removes) = input;

    let mut tree = AvlTree::new();

    for &value in &inserts {
        tree.insert(value);
        tree.assert_invariants();
    }

    assert_eq!(tree.len(), inserts.len());

    for value in &removes {
        tree.remove(value);
        tree.assert_invariants();
    }

    // Every value available to remove has now been removed at least once, so
    // a second pass over the inserts must drain the tree completely.
    for value in &inserts {
        tree.remove(value);
        tree.assert_invariants();
    }

    assert!(tree.is_empty());
});
