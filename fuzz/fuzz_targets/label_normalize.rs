//! Fuzz target for class label normalization.
//!
//! Arbitrary UTF-8 labels must always split into a class base and a type,
//! in both strict and relaxed mode.

#![no_main]

use libfuzzer_sys::fuzz_target;
use annocompare::ir::label::normalize_label;

fuzz_target!(|data: &[u8]| {
    let Ok(raw) = std::str::from_utf8(data) else {
        return;
    };

    let (base, _) = normalize_label("<fuzz>", raw, false);
    assert!(!base.contains('-'));

    let _ = normalize_label("<fuzz>", raw, true);
});
