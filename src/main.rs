//! control-io firmware — main entry point.
//!
//! Hexagonal architecture with a single serialized event loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter   MqttTransport   JsonConfigFile  SystemClock │
//! │  (OutputPort)      (StatusPort)    (ConfigPort)    (time)      │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              ControlPanel (pure logic)                 │    │
//! │  │  ButtonMachine ×2 · CommandRouter · DisplayController  │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Scheduler (delegate-driven) · Event queue (ISR / MQTT / hook) │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use core::ops::ControlFlow;
use std::time::Duration;

use anyhow::Result;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_hal::prelude::Peripherals;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::sntp::EspSntp;
use log::{error, info, warn};

use control_io::adapters::config_file::{self, JsonConfigFile, DEFAULT_CONFIG_PATH};
use control_io::adapters::hardware::HardwareAdapter;
use control_io::adapters::lockfile::remove_stale_lock;
use control_io::adapters::mqtt::MqttTransport;
use control_io::adapters::time::SystemClock;
use control_io::adapters::wifi;
use control_io::app::commands::{CommandEvent, Topics};
use control_io::app::panel::ControlPanel;
use control_io::app::ports::SchedulerDelegate;
use control_io::app::router::RouteError;
use control_io::config::SystemConfig;
use control_io::drivers::hw_init;
use control_io::events::{self, push_event, Event, TransportStatus};
use control_io::scheduler::Scheduler;
use control_io::timer::Interval;

/// How often the wall-clock schedule is evaluated.
const SCHEDULE_CHECK_MS: u64 = 1_000;

// ── Scheduler delegate ────────────────────────────────────────
//
// Bridges the scheduler (which knows nothing about the event system)
// to the event queue, so scheduled commands reach the router through
// the same serialized path as remote ones.

struct EventQueueDelegate;

impl SchedulerDelegate for EventQueueDelegate {
    fn on_schedule_fired(&mut self, label: &str, command: &CommandEvent) {
        if !push_event(Event::Scheduled(command.clone())) {
            warn!("Schedule '{}' dropped: event queue full", label);
        }
    }
}

// ── Bring-up ──────────────────────────────────────────────────

/// Configure pins, interrupts and the restart hook, then build the
/// scheduler from the loaded configuration.
fn bring_up(config: &SystemConfig) -> control_io::Result<Scheduler> {
    hw_init::init_peripherals(&config.outputs, &config.buttons)?;
    hw_init::init_isr_service(&config.buttons)?;
    hw_init::register_shutdown_hook()?;
    Ok(Scheduler::from_config(&config.schedule, &config.timezone)?)
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  control-io v{}                      ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Config + stale lock ────────────────────────────────
    if let Err(e) = config_file::mount_storage() {
        warn!("Storage unavailable ({}), running with defaults", e);
    }
    let config_store = JsonConfigFile::new(DEFAULT_CONFIG_PATH);
    info!("Config: {}", config_store.path().display());
    let config = config_file::load_or_default(&config_store);
    remove_stale_lock(&config.lock_file);

    // ── 3. Peripherals + schedule ─────────────────────────────
    let mut scheduler = bring_up(&config)?;

    // ── 4. Network + wall clock ───────────────────────────────
    let peripherals = Peripherals::take()?;
    let sys_loop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;
    let _wifi = match wifi::connect_station(peripherals.modem, sys_loop, nvs, &config.wifi) {
        Ok(w) => Some(w),
        Err(e) => {
            warn!("WiFi unavailable ({:#}), continuing offline", e);
            None
        }
    };
    let _sntp = EspSntp::new_default()?;

    // ── 5. Adapters + domain ──────────────────────────────────
    let clock = SystemClock::new();
    let topics = Topics::new(config.topic_prefix.as_str());
    let mut transport = MqttTransport::connect(&config.mqtt, topics.command_filter())?;
    let mut hw = HardwareAdapter::new(config.outputs);

    let mut sched_delegate = EventQueueDelegate;
    let mut sched_check = Interval::new(SCHEDULE_CHECK_MS);

    let mut panel = ControlPanel::new(&config);
    let now = clock.uptime_ms();
    panel.start(now, &mut hw, &mut transport)?;
    sched_check.start(now);

    info!(
        "System ready ({} schedule entries, tz {}). Entering event loop.",
        scheduler.len(),
        scheduler.timezone()
    );

    // ── 6. Event loop ─────────────────────────────────────────
    let loop_interval = Duration::from_millis(config.timing.loop_interval_ms);

    let exit: Result<(), RouteError> = loop {
        let now = clock.uptime_ms();

        if sched_check.poll(now) {
            if let Some(utc) = clock.utc_now() {
                scheduler.tick(utc, &mut sched_delegate);
            }
        }

        let mut flow: Result<ControlFlow<()>, RouteError> = Ok(ControlFlow::Continue(()));
        events::drain_events(|event| {
            if event == Event::Transport(TransportStatus::Connected) {
                transport.subscribe_commands();
            }
            flow = panel.handle_event(event, now, &mut hw, &mut transport);
            flow == Ok(ControlFlow::Continue(()))
        });
        match flow {
            Ok(ControlFlow::Continue(())) => {}
            Ok(ControlFlow::Break(())) => break Ok(()),
            Err(e) => break Err(e),
        }

        if let Err(e) = panel.tick(now, &mut hw, &mut transport) {
            break Err(e);
        }
        std::thread::sleep(loop_interval);
    };

    match exit {
        Ok(()) => {
            info!("Event loop stopped ({} events discarded)", events::pending_events());
            events::acknowledge_shutdown();
            Ok(())
        }
        Err(e) => {
            error!("Fatal: {}", e);
            panel.shutdown(&mut hw, &mut transport);
            Err(control_io::Error::from(e).into())
        }
    }
}
