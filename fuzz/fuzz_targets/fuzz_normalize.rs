//! Fuzz target for contact normalization.
//!
//! Normalizing an already-normalized contact must not change it.
//!
//! Run with:
//! cargo +nightly fuzz run fuzz_normalize -- -max_total_time=600

#![no_main]

use deskbridge_reconcile::normalize;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };
    let mut parts = s.splitn(3, '|');
    let first = parts.next().unwrap_or_default();
    let last = parts.next().unwrap_or_default();
    let phone = parts.next().unwrap_or_default();

    let once = normalize(first, last, phone);
    let twice = normalize(&once.full_name, "", &once.phone);
    assert_eq!(once, twice);
    assert!(!once.phone.chars().any(char::is_whitespace));
});
