//! Fuzz target: safety journal decoder
//!
//! Feeds arbitrary bytes to `SafetyLog::decode`.  Verifies:
//! - No panics on malformed postcard input
//! - Anything that decodes re-encodes through a fresh journal
//!
//! cargo fuzz run fuzz_safety_log

#![no_main]

use libfuzzer_sys::fuzz_target;
use smartshower::diagnostics::SafetyLog;

fuzz_target!(|data: &[u8]| {
    let Ok(entries) = SafetyLog::decode(data) else {
        return;
    };

    let mut log = SafetyLog::new();
    for e in &entries {
        log.record(e.tick, e.kind, e.severity, &e.message);
    }
    assert!(log.len() <= entries.len());
    let blob = log.encode().expect("encode of a live journal");
    assert!(SafetyLog::decode(&blob).is_ok());
});
