#![no_main]

use avltree::model::Op;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|ops: Vec<Op>| {
    avltree::model::run_model_equivalence(ops);
});
