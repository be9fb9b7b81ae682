//! Fuzz target: `Payload::parse` and its interpretations.
//!
//! cargo fuzz run fuzz_payload

#![no_main]

use control_io::app::commands::Payload;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };
    let payload = Payload::parse(text);

    let _ = payload.is_truthy();
    let _ = payload.to_string();

    let _ = payload.as_brightness();

    // Non-JSON text is kept verbatim.
    if let Payload::Raw(raw) = &payload {
        assert_eq!(raw, text);
    }
});
