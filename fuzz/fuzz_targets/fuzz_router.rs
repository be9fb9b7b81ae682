//! Fuzz target: `CommandRouter::handle_message`
//!
//! Splits the input into a topic and a payload and routes it against the
//! default pin map. Stored brightness must stay inside the configured range
//! and every publish must stay inside the prefix namespace.
//!
//! cargo fuzz run fuzz_router

#![no_main]

use control_io::app::commands::Topics;
use control_io::app::ports::{Output, OutputPort, PublishError, StatusPort};
use control_io::app::router::CommandRouter;
use control_io::config::{OutputPins, SystemConfig};
use libfuzzer_sys::fuzz_target;

struct NullPins;

impl OutputPort for NullPins {
    fn write_digital(&mut self, _output: Output, _high: bool) {}
    fn write_pwm(&mut self, _duty: u8) {}
}

struct PrefixCheck;

impl StatusPort for PrefixCheck {
    fn publish(&mut self, topic: &str, _payload: &str, retained: bool) -> Result<(), PublishError> {
        assert!(topic.starts_with("fz/"), "publish outside namespace: {topic}");
        assert!(retained);
        Ok(())
    }
    fn close(&mut self) {}
}

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };
    let (topic, payload) = text.split_once('\n').unwrap_or((text, ""));

    let cfg = SystemConfig::default();
    let max = cfg.brightness.max;
    let mut router = CommandRouter::new(Topics::new("fz"), OutputPins::default(), cfg.brightness, &cfg.timing);

    let _ = router.handle_message(topic, payload, 0, &mut NullPins, &mut PrefixCheck);
    router.tick(1_000, &mut NullPins);
    assert!(router.display().brightness() <= max);
});
