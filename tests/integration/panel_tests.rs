//! Integration tests for the ControlPanel → ButtonMachine → Router pipeline.
//!
//! Drive the panel with queue events and loop ticks exactly as the main
//! loop does, and assert on pin writes and published messages.

use core::ops::ControlFlow;

use embedded_hal::digital::PinState;
use serde_json::json;

use control_io::app::button::{ButtonId, ButtonPhase};
use control_io::app::commands::CommandEvent;
use control_io::app::panel::ControlPanel;
use control_io::app::ports::Output;
use control_io::app::router::RouteError;
use control_io::config::{OutputPins, SystemConfig};
use control_io::events::{Event, TransportStatus};

use crate::mock_hw::{MockBroker, MockHardware, Published};

const UPPER: &str = "control-io/buttonUpper/STATE";
const DISPLAY: &str = "control-io/display/STATE";
const BRIGHTNESS: &str = "control-io/brightness/STATE";
const HEALTH: &str = "control-io/health/STATE";
const NAVIGATE: &str = "control-io/navigate";

struct Rig {
    panel: ControlPanel,
    hw: MockHardware,
    broker: MockBroker,
}

impl Rig {
    fn with_config(cfg: &SystemConfig) -> Self {
        let mut rig = Self {
            panel: ControlPanel::new(cfg),
            hw: MockHardware::new(),
            broker: MockBroker::new(),
        };
        rig.panel.start(0, &mut rig.hw, &mut rig.broker).unwrap();
        rig
    }

    fn started() -> Self {
        let mut rig = Self::with_config(&SystemConfig::default());
        rig.broker.clear();
        rig
    }

    fn send(&mut self, event: Event, now: u64) -> Result<ControlFlow<()>, RouteError> {
        self.panel.handle_event(event, now, &mut self.hw, &mut self.broker)
    }

    /// Send an event the panel must handle and keep running after.
    fn deliver(&mut self, event: Event, now: u64) {
        assert_eq!(self.send(event, now), Ok(ControlFlow::Continue(())));
    }

    fn edge(&mut self, button: ButtonId, level: PinState, now: u64) {
        self.deliver(Event::Edge { button, level }, now);
    }

    fn message(&mut self, name: &str, payload: &str, now: u64) {
        let event = Event::Message {
            topic: format!("control-io/cmnd/{name}"),
            payload: payload.to_string(),
        };
        self.deliver(event, now);
    }

    /// Tick every 10 ms from `from` to `to` inclusive.
    fn run(&mut self, from: u64, to: u64) {
        for now in (from..=to).step_by(10) {
            self.panel.tick(now, &mut self.hw, &mut self.broker).unwrap();
        }
    }
}

#[test]
fn startup_publishes_initial_state_and_blinks() {
    let mut rig = Rig::with_config(&SystemConfig::default());

    assert_eq!(rig.broker.on(DISPLAY), vec!["1"]);
    assert_eq!(rig.broker.on(BRIGHTNESS), vec!["190"]);
    assert_eq!(rig.broker.on(HEALTH), vec!["online"]);
    assert!(rig.broker.published.iter().all(|p| p.retained));
    assert_eq!(rig.hw.level(Output::Display), Some(true));
    assert_eq!(rig.hw.last_pwm(), Some(190));

    rig.run(0, 3_000);
    assert_eq!(rig.hw.writes_to(Output::LedRed), 6);
    assert_eq!(rig.hw.writes_to(Output::LedWhite), 6);
    assert_eq!(rig.hw.level(Output::LedRed), Some(false));
    assert!(!rig.panel.router().display().is_blinking());
}

#[test]
fn short_press_reports_press_and_release_only() {
    let mut rig = Rig::started();

    rig.edge(ButtonId::Upper, PinState::Low, 100);
    rig.run(100, 500);
    rig.edge(ButtonId::Upper, PinState::High, 510);
    rig.run(510, 3_000);

    assert_eq!(rig.broker.on(UPPER), vec!["1", "0"]);
    assert!(rig.broker.on(DISPLAY).is_empty());
    assert!(rig.panel.router().display().is_on());
}

#[test]
fn long_press_turns_off_and_swallows_release() {
    let mut rig = Rig::started();

    rig.edge(ButtonId::Upper, PinState::Low, 0);
    rig.run(0, 990);
    assert!(rig.panel.router().display().is_on());
    rig.run(1_000, 1_000);
    assert!(!rig.panel.router().display().is_on());
    assert_eq!(rig.broker.on(DISPLAY), vec!["0"]);
    assert_eq!(rig.hw.level(Output::Display), Some(false));
    assert_eq!(rig.panel.button(ButtonId::Upper).phase(), ButtonPhase::Suppressed);

    // Release inside the suppression window is swallowed.
    rig.edge(ButtonId::Upper, PinState::High, 1_200);
    assert_eq!(rig.broker.on(UPPER), vec!["1"]);

    // After the window the next press wakes the display.
    rig.run(1_210, 1_500);
    rig.edge(ButtonId::Upper, PinState::Low, 1_600);
    assert!(rig.panel.router().display().is_on());
    assert_eq!(rig.broker.on(DISPLAY), vec!["0", "1"]);
    assert_eq!(rig.broker.on(NAVIGATE), vec!["home"]);
}

#[test]
fn press_with_display_off_wakes_and_navigates() {
    let mut rig = Rig::started();
    rig.message("display", "0", 0);
    rig.broker.clear();

    rig.edge(ButtonId::Lower, PinState::Low, 50);
    assert_eq!(
        rig.broker.published,
        vec![
            Published {
                topic: DISPLAY.into(),
                payload: "1".into(),
                retained: true,
            },
            Published {
                topic: NAVIGATE.into(),
                payload: "home".into(),
                retained: false,
            },
            Published {
                topic: "control-io/buttonLower/STATE".into(),
                payload: "1".into(),
                retained: true,
            },
        ]
    );

    // No hold timer: holding on does not turn the display back off.
    rig.run(50, 5_000);
    assert!(rig.panel.router().display().is_on());
    assert_eq!(rig.broker.on(DISPLAY), vec!["1"]);
}

#[test]
fn buttons_are_independent() {
    let mut rig = Rig::started();

    rig.edge(ButtonId::Upper, PinState::Low, 0);
    rig.edge(ButtonId::Lower, PinState::Low, 400);
    rig.edge(ButtonId::Lower, PinState::High, 600);
    rig.run(0, 1_000);

    // Upper still held to 1 s: display off; lower was a short press.
    assert!(!rig.panel.router().display().is_on());
    assert_eq!(rig.panel.button(ButtonId::Lower).phase(), ButtonPhase::Idle);
    assert_eq!(rig.broker.on("control-io/buttonLower/STATE"), vec!["1", "0"]);
}

#[test]
fn heartbeat_every_period() {
    let mut rig = Rig::started();

    rig.run(0, 59_990);
    assert!(rig.broker.on(HEALTH).is_empty());
    rig.run(60_000, 119_990);
    assert_eq!(rig.broker.on(HEALTH), vec!["online"]);
    rig.run(120_000, 120_000);
    assert_eq!(rig.broker.on(HEALTH), vec!["online", "online"]);
}

#[test]
fn scheduled_command_goes_through_router() {
    let mut rig = Rig::started();

    rig.deliver(Event::Scheduled(CommandEvent::new("brightness", json!("-"))), 0);
    assert_eq!(rig.panel.router().display().brightness(), 180);
    assert_eq!(rig.broker.on(BRIGHTNESS), vec!["180"]);
}

#[test]
fn reconnect_republishes_state() {
    let mut rig = Rig::started();
    rig.message("brightness", "42", 0);
    rig.broker.clear();

    rig.message("ledRed", "1", 0);
    rig.edge(ButtonId::Lower, PinState::Low, 0);
    rig.broker.clear();

    rig.deliver(Event::Transport(TransportStatus::Disconnected), 10);
    assert!(rig.broker.published.is_empty());

    rig.deliver(Event::Transport(TransportStatus::Connected), 20);
    assert_eq!(rig.broker.on(DISPLAY), vec!["1"]);
    assert_eq!(rig.broker.on(BRIGHTNESS), vec!["42"]);
    assert_eq!(rig.broker.on("control-io/ledRed/STATE"), vec!["1"]);
    assert!(rig.broker.on("control-io/ledWhite/STATE").is_empty());
    assert_eq!(rig.broker.on(UPPER), vec!["0"]);
    assert_eq!(rig.broker.on("control-io/buttonLower/STATE"), vec!["1"]);
    assert_eq!(rig.broker.on(HEALTH), vec!["online"]);
    assert!(rig.broker.published.iter().all(|p| p.retained));
}

#[test]
fn publish_failure_does_not_affect_state() {
    let mut rig = Rig::started();
    rig.broker.offline = true;

    rig.message("display", "false", 0);
    rig.message("brightness", "+", 0);
    assert!(!rig.panel.router().display().is_on());
    assert_eq!(rig.panel.router().display().brightness(), 190);
    assert_eq!(rig.hw.level(Output::Display), Some(false));
}

#[test]
fn shutdown_blanks_and_closes() {
    let mut rig = Rig::started();

    assert_eq!(rig.send(Event::Shutdown, 500), Ok(ControlFlow::Break(())));
    assert_eq!(rig.hw.last_pwm(), Some(0));
    assert!(rig.broker.closed);
    // Stored brightness is untouched by the blanking.
    assert_eq!(rig.panel.router().display().brightness(), 190);

    rig.run(510, 60_000);
    assert!(rig.broker.on(HEALTH).is_empty());
}

#[test]
fn unresolved_target_is_fatal() {
    let cfg = SystemConfig {
        outputs: OutputPins {
            led_white: None,
            ..OutputPins::default()
        },
        ..SystemConfig::default()
    };
    let mut rig = Rig::with_config(&cfg);

    let result = rig.send(
        Event::Message {
            topic: "control-io/cmnd/ledWhite".into(),
            payload: "1".into(),
        },
        0,
    );
    assert!(matches!(result, Err(RouteError::UnresolvedTarget(_))));
}

#[test]
fn unresolved_display_fails_start() {
    let cfg = SystemConfig {
        outputs: OutputPins {
            display: None,
            ..OutputPins::default()
        },
        ..SystemConfig::default()
    };
    let mut panel = ControlPanel::new(&cfg);
    let (mut hw, mut broker) = (MockHardware::new(), MockBroker::new());
    assert!(panel.start(0, &mut hw, &mut broker).is_err());
}
