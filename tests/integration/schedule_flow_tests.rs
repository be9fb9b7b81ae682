//! End-to-end schedule flow: Scheduler → delegate → event queue → panel.
//!
//! This is the only test in the binary that touches the process-wide
//! event queue.

use core::ops::ControlFlow;

use chrono::{TimeZone, Utc};
use serde_json::json;

use control_io::app::commands::CommandEvent;
use control_io::app::panel::ControlPanel;
use control_io::app::ports::SchedulerDelegate;
use control_io::config::{ScheduleConfig, SystemConfig};
use control_io::events::{self, push_event, Event};
use control_io::scheduler::{Scheduler, WeekdayFilter};

use crate::mock_hw::{MockBroker, MockHardware};

struct QueueDelegate;

impl SchedulerDelegate for QueueDelegate {
    fn on_schedule_fired(&mut self, _label: &str, command: &CommandEvent) {
        assert!(push_event(Event::Scheduled(command.clone())));
    }
}

/// Feed every queued event to the panel; returns how many were handled.
fn drain(panel: &mut ControlPanel, hw: &mut MockHardware, broker: &mut MockBroker) -> usize {
    let mut handled = 0;
    while let Some(event) = events::pop_event() {
        assert_eq!(panel.handle_event(event, 0, hw, broker), Ok(ControlFlow::Continue(())));
        handled += 1;
    }
    handled
}

#[test]
fn weekday_wake_and_evening_dim() {
    let cfg = SystemConfig {
        timezone: "Europe/Berlin".into(),
        schedule: vec![
            ScheduleConfig {
                label: "wake".into(),
                hour: 6,
                minute: 15,
                days: WeekdayFilter::WeekdaysOnly,
                command: "display".into(),
                payload: json!(1),
            },
            ScheduleConfig {
                label: "dim".into(),
                hour: 21,
                minute: 0,
                days: WeekdayFilter::Every,
                command: "brightness".into(),
                payload: json!(40),
            },
        ],
        ..SystemConfig::default()
    };
    cfg.validate().unwrap();

    let mut scheduler = Scheduler::from_config(&cfg.schedule, &cfg.timezone).unwrap();
    let mut panel = ControlPanel::new(&cfg);
    let (mut hw, mut broker) = (MockHardware::new(), MockBroker::new());
    panel.start(0, &mut hw, &mut broker).unwrap();

    while events::pop_event().is_some() {}

    // Turn the display off by remote command first.
    let off = Event::Message {
        topic: "control-io/cmnd/display".into(),
        payload: "0".into(),
    };
    assert_eq!(
        panel.handle_event(off, 0, &mut hw, &mut broker),
        Ok(ControlFlow::Continue(()))
    );

    // Saturday 2024-03-09 05:15 UTC = 06:15 CET: weekday-only rule stays quiet.
    scheduler.tick(Utc.with_ymd_and_hms(2024, 3, 9, 5, 15, 0).unwrap(), &mut QueueDelegate);
    assert_eq!(drain(&mut panel, &mut hw, &mut broker), 0);
    assert!(!panel.router().display().is_on());

    // Monday 2024-03-11 06:15 CET.
    let monday = Utc.with_ymd_and_hms(2024, 3, 11, 5, 15, 10).unwrap();
    scheduler.tick(monday, &mut QueueDelegate);
    scheduler.tick(monday, &mut QueueDelegate);
    assert_eq!(drain(&mut panel, &mut hw, &mut broker), 1);
    assert!(panel.router().display().is_on());

    // 21:00 CET = 20:00 UTC.
    scheduler.tick(Utc.with_ymd_and_hms(2024, 3, 11, 20, 0, 0).unwrap(), &mut QueueDelegate);
    assert_eq!(drain(&mut panel, &mut hw, &mut broker), 1);
    assert_eq!(panel.router().display().brightness(), 40);
    assert_eq!(broker.on("control-io/brightness/STATE").last(), Some(&"40"));
}
