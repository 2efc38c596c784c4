#![no_main]
use libfuzzer_sys::fuzz_target;

use cordyceps_rbtree::model::{run_forest_ops, ForestOp};

fuzz_target!(|ops: Vec<ForestOp>| { run_forest_ops(ops) });
