#![no_main]

use cordyceps_rbtree::model::CursorEquivalenceInput;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: CursorEquivalenceInput| {
    cordyceps_rbtree::model::run_cursor_equivalence(input.values, input.ops);
});
