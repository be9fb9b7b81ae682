//! Fuzz target: config document decoding + validation.
//!
//! cargo fuzz run fuzz_config

#![no_main]

use control_io::config::SystemConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(cfg) = serde_json::from_slice::<SystemConfig>(data) {
        let _ = cfg.validate();
    }
});
