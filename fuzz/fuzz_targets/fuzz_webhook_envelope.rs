//! Fuzz target for billing webhook envelope parsing.
//!
//! Arbitrary bodies must be rejected with an error, never a panic.
//!
//! Run with:
//! cargo +nightly fuzz run fuzz_webhook_envelope -- -max_total_time=600

#![no_main]

use deskbridge_billing::BillingEvent;
use deskbridge_reconcile::CanonicalCustomer;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(event) = BillingEvent::from_slice(data) else {
        return;
    };
    let Ok(customer) = event.customer() else {
        return;
    };

    let canonical = CanonicalCustomer::from_record(customer);
    assert_eq!(canonical.external_id, canonical.external_id.trim());
    assert_eq!(canonical.email, canonical.email.trim());
    assert!(!canonical.phone.chars().any(char::is_whitespace));
});
