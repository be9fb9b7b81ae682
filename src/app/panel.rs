//! Control panel — the serialized event path.
//!
//! [`ControlPanel`] owns the command router (and through it the display
//! controller), both button machines and the health heartbeat.  The main
//! loop drains the event queue into [`ControlPanel::handle_event`] one
//! event at a time and calls [`ControlPanel::tick`] every loop cycle, so
//! no two handlers ever run concurrently.
//!
//! ```text
//!  Event::Edge ──▶ ButtonMachine ──▶ ButtonAction ─┐
//!  Event::Message ─────────────────────────────────┼──▶ CommandRouter
//!  Event::Scheduled ───────────────────────────────┘
//! ```

use core::ops::ControlFlow;

use log::{info, warn};
use serde_json::Value;

use super::button::{ButtonAction, ButtonId, ButtonMachine};
use super::commands::{CommandEvent, CommandName, Topics};
use super::ports::{Output, OutputPort, StatusPort};
use super::router::{CommandRouter, RouteError};
use crate::config::{NavigateConfig, SystemConfig};
use crate::events::{Event, TransportStatus};
use crate::timer::Interval;

/// Status name of the liveness topic.
const HEALTH_NAME: &str = "health";
const HEALTH_PAYLOAD: &str = "online";

pub struct ControlPanel {
    router: CommandRouter,
    upper: ButtonMachine,
    lower: ButtonMachine,
    heartbeat: Interval,
    navigate: NavigateConfig,
    topics: Topics,
    blink_half_cycles: u8,
    initial_display_on: bool,
    initial_brightness: u8,
}

impl ControlPanel {
    pub fn new(config: &SystemConfig) -> Self {
        let topics = Topics::new(config.topic_prefix.as_str());
        Self {
            router: CommandRouter::new(
                topics.clone(),
                config.outputs,
                config.brightness,
                &config.timing,
            ),
            upper: ButtonMachine::new(ButtonId::Upper, &config.timing),
            lower: ButtonMachine::new(ButtonId::Lower, &config.timing),
            heartbeat: Interval::new(config.timing.heartbeat_secs.saturating_mul(1_000)),
            navigate: config.navigate.clone(),
            topics,
            blink_half_cycles: config.timing.blink_half_cycles,
            initial_display_on: config.initial_display_on,
            initial_brightness: config.brightness.initial,
        }
    }

    pub fn router(&self) -> &CommandRouter {
        &self.router
    }

    pub fn button(&self, id: ButtonId) -> &ButtonMachine {
        match id {
            ButtonId::Upper => &self.upper,
            ButtonId::Lower => &self.lower,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Blink both button LEDs, apply and publish the initial display
    /// state and send the first health beat.
    pub fn start(
        &mut self,
        now_ms: u64,
        hw: &mut impl OutputPort,
        status: &mut impl StatusPort,
    ) -> Result<(), RouteError> {
        let display = self.router.display_mut();
        display.startup_blink(Output::LedRed, self.blink_half_cycles, now_ms, hw);
        display.startup_blink(Output::LedWhite, self.blink_half_cycles, now_ms, hw);

        self.router.dispatch(
            &CommandEvent::display(self.initial_display_on),
            now_ms,
            hw,
            status,
        )?;
        self.router.dispatch(
            &CommandEvent::new(CommandName::Brightness.as_str(), Value::from(self.initial_brightness)),
            now_ms,
            hw,
            status,
        )?;

        self.publish_health(status);
        self.heartbeat.start(now_ms);
        info!("Panel: started ({:?})", self.router.display().state());
        Ok(())
    }

    /// Blank the backlight, stop the heartbeat and close the transport.
    pub fn shutdown(&mut self, hw: &mut impl OutputPort, status: &mut impl StatusPort) {
        info!("Panel: shutting down");
        self.router.display_mut().blank(hw);
        self.heartbeat.cancel();
        status.close();
    }

    // ── Event path ────────────────────────────────────────────

    /// Process one queued event.  Returns `Break` once the panel has shut
    /// down and the loop should exit.
    pub fn handle_event(
        &mut self,
        event: Event,
        now_ms: u64,
        hw: &mut impl OutputPort,
        status: &mut impl StatusPort,
    ) -> Result<ControlFlow<()>, RouteError> {
        match event {
            Event::Edge { button, level } => {
                let display_on = self.router.display().is_on();
                let actions = self.machine_mut(button).on_edge(level, display_on, now_ms);
                for action in actions {
                    self.apply(button, action, now_ms, hw, status)?;
                }
            }
            Event::Message { topic, payload } => {
                self.router
                    .handle_message(&topic, &payload, now_ms, hw, status)?;
            }
            Event::Scheduled(command) => {
                self.router.dispatch(&command, now_ms, hw, status)?;
            }
            Event::Transport(TransportStatus::Connected) => {
                info!("Panel: transport connected, republishing state");
                self.router.display().republish(status);
                for id in [ButtonId::Upper, ButtonId::Lower] {
                    let pressed = self.button(id).is_pressed();
                    self.notify(id, pressed, status);
                }
                self.publish_health(status);
            }
            Event::Transport(TransportStatus::Disconnected) => {
                warn!("Panel: transport disconnected");
            }
            Event::Shutdown => {
                self.shutdown(hw, status);
                return Ok(ControlFlow::Break(()));
            }
        }
        Ok(ControlFlow::Continue(()))
    }

    /// Advance every timer: beeper, blinks, hold/suppression, heartbeat.
    pub fn tick(
        &mut self,
        now_ms: u64,
        hw: &mut impl OutputPort,
        status: &mut impl StatusPort,
    ) -> Result<(), RouteError> {
        self.router.tick(now_ms, hw);

        for id in [ButtonId::Upper, ButtonId::Lower] {
            if let Some(action) = self.machine_mut(id).tick(now_ms) {
                self.apply(id, action, now_ms, hw, status)?;
            }
        }

        if self.heartbeat.poll(now_ms) {
            self.publish_health(status);
        }
        Ok(())
    }

    // ── Internal ──────────────────────────────────────────────

    fn machine_mut(&mut self, id: ButtonId) -> &mut ButtonMachine {
        match id {
            ButtonId::Upper => &mut self.upper,
            ButtonId::Lower => &mut self.lower,
        }
    }

    fn apply(
        &mut self,
        id: ButtonId,
        action: ButtonAction,
        now_ms: u64,
        hw: &mut impl OutputPort,
        status: &mut impl StatusPort,
    ) -> Result<(), RouteError> {
        match action {
            ButtonAction::Command(command) => {
                self.router.dispatch(&command, now_ms, hw, status)?;
            }
            ButtonAction::Navigate => {
                if let Err(e) = status.publish(&self.navigate.topic, &self.navigate.payload, false) {
                    warn!("Panel: navigate publish failed: {}", e);
                }
            }
            ButtonAction::Notify { pressed } => self.notify(id, pressed, status),
        }
        Ok(())
    }

    /// Publish a button's logical level, retained.
    fn notify(&self, id: ButtonId, pressed: bool, status: &mut impl StatusPort) {
        let topic = self.topics.state(id.status_name());
        if let Err(e) = status.publish(&topic, if pressed { "1" } else { "0" }, true) {
            warn!("Panel: {} publish failed: {}", topic, e);
        }
    }

    fn publish_health(&self, status: &mut impl StatusPort) {
        let topic = self.topics.state(HEALTH_NAME);
        if let Err(e) = status.publish(&topic, HEALTH_PAYLOAD, true) {
            warn!("Panel: heartbeat publish failed: {}", e);
        }
    }
}
