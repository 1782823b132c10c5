//! Fuzz target for event container schema parsing.
//!
//! Feeds arbitrary byte sequences to the schema parser; anything that
//! parses is compared with and merged into a copy of itself.

#![no_main]

use eventlabel::EventContainerSchema;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 1024 * 1024 {
        return;
    }

    let Ok(schema) = serde_json::from_slice::<EventContainerSchema>(data) else {
        return;
    };

    let _ = schema.validate_subset_of_schema(&schema);
    let mut merged = schema.clone();
    let _ = merged.merge_schema(&schema);
});
