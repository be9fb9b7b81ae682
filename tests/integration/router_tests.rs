//! Integration tests for message routing: topic → payload → controller →
//! pin write + retained status.

use control_io::app::commands::{CommandName, Topics};
use control_io::app::ports::Output;
use control_io::app::router::{CommandRouter, RouteOutcome};
use control_io::config::{OutputPins, SystemConfig};

use crate::mock_hw::{MockBroker, MockHardware, PinCall};

fn router(prefix: &str) -> CommandRouter {
    let cfg = SystemConfig::default();
    CommandRouter::new(Topics::new(prefix), OutputPins::default(), cfg.brightness, &cfg.timing)
}

#[test]
fn every_dispatch_republishes_once() {
    let mut r = router("control-io");
    let (mut hw, mut broker) = (MockHardware::new(), MockBroker::new());

    let cases = [
        ("display", "1", "control-io/display/STATE", "1"),
        ("display", "1", "control-io/display/STATE", "1"),
        ("brightness", "300", "control-io/brightness/STATE", "190"),
        ("brightness", "\"-\"", "control-io/brightness/STATE", "180"),
        ("ledRed", "\"yes\"", "control-io/ledRed/STATE", "1"),
        ("ledWhite", "null", "control-io/ledWhite/STATE", "0"),
        ("beep", "{}", "control-io/beep/STATE", "1"),
    ];
    for (name, payload, topic, expected) in cases {
        broker.clear();
        let out = r
            .handle_message(&format!("control-io/cmnd/{name}"), payload, 0, &mut hw, &mut broker)
            .unwrap();
        assert!(matches!(out, RouteOutcome::Applied(_)), "{name}={payload}");
        assert_eq!(broker.published.len(), 1, "{name}={payload}");
        assert_eq!(broker.published[0].topic, topic);
        assert_eq!(broker.published[0].payload, expected);
        assert!(broker.published[0].retained);
    }
}

#[test]
fn display_truthiness() {
    let mut r = router("control-io");
    let (mut hw, mut broker) = (MockHardware::new(), MockBroker::new());

    for (payload, on) in [
        ("1", true),
        ("true", true),
        ("on", true),
        ("{\"x\":0}", true),
        ("0", false),
        ("false", false),
        ("null", false),
        ("\"\"", false),
        ("", false),
    ] {
        r.handle_message("control-io/cmnd/display", payload, 0, &mut hw, &mut broker)
            .unwrap();
        assert_eq!(r.display().is_on(), on, "payload {payload:?}");
        assert_eq!(hw.level(Output::Display), Some(on));
    }
}

#[test]
fn custom_prefix_namespace() {
    let mut r = router("hall");
    let (mut hw, mut broker) = (MockHardware::new(), MockBroker::new());

    let out = r
        .handle_message("control-io/cmnd/display", "1", 0, &mut hw, &mut broker)
        .unwrap();
    assert_eq!(out, RouteOutcome::Ignored);

    let out = r
        .handle_message("hall/cmnd/brightness", "77", 0, &mut hw, &mut broker)
        .unwrap();
    assert_eq!(out, RouteOutcome::Applied(CommandName::Brightness));
    assert_eq!(broker.on("hall/brightness/STATE"), vec!["77"]);
    assert_eq!(hw.calls, vec![PinCall::Pwm(77)]);
}

#[test]
fn beep_restarts_pulse() {
    let mut r = router("control-io");
    let (mut hw, mut broker) = (MockHardware::new(), MockBroker::new());

    r.handle_message("control-io/cmnd/beep", "1", 0, &mut hw, &mut broker)
        .unwrap();
    r.handle_message("control-io/cmnd/beep", "1", 80, &mut hw, &mut broker)
        .unwrap();
    r.tick(100, &mut hw);
    assert_eq!(hw.level(Output::Beeper), Some(true));
    r.tick(180, &mut hw);
    assert_eq!(hw.level(Output::Beeper), Some(false));
    assert_eq!(broker.on("control-io/beep/STATE"), vec!["1", "1"]);
}
