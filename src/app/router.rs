//! Command router — the single entry point for remote and scheduled commands.
//!
//! ```text
//!  <prefix>/cmnd/<name> ──▶ Payload::parse ──┐
//!  Scheduler fire ───────────────────────────┼──▶ dispatch ──▶ DisplayController
//!  Button gesture ───────────────────────────┘                 (hw write + STATE)
//! ```
//!
//! Unknown topics and command names are logged and dropped.  A recognised
//! command whose hardware target is missing from the pin map is a
//! configuration defect and comes back as [`RouteError::UnresolvedTarget`].

use core::fmt;

use log::{debug, info, warn};

use super::commands::{CommandEvent, CommandName, Payload, Topics};
use super::display::DisplayController;
use super::ports::{Output, OutputPort, StatusPort};
use crate::config::{BrightnessConfig, OutputPins, TimingConfig};

/// What happened to a routed command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Dispatched to its handler.
    Applied(CommandName),
    /// Outside the namespace, unknown name, or unusable payload.
    Ignored,
}

/// Fatal routing failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteError {
    /// The command is known but no output pin is configured for it.
    UnresolvedTarget(CommandName),
}

impl fmt::Display for RouteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnresolvedTarget(name) => {
                write!(f, "no output configured for command '{}'", name)
            }
        }
    }
}

impl std::error::Error for RouteError {}

pub struct CommandRouter {
    display: DisplayController,
    topics: Topics,
    outputs: OutputPins,
}

impl CommandRouter {
    pub fn new(
        topics: Topics,
        outputs: OutputPins,
        brightness: BrightnessConfig,
        timing: &TimingConfig,
    ) -> Self {
        Self {
            display: DisplayController::new(topics.clone(), brightness, timing),
            topics,
            outputs,
        }
    }

    pub fn display(&self) -> &DisplayController {
        &self.display
    }

    pub fn display_mut(&mut self) -> &mut DisplayController {
        &mut self.display
    }

    pub fn topics(&self) -> &Topics {
        &self.topics
    }

    /// Route one inbound message.
    pub fn handle_message(
        &mut self,
        topic: &str,
        text: &str,
        now_ms: u64,
        hw: &mut impl OutputPort,
        status: &mut impl StatusPort,
    ) -> Result<RouteOutcome, RouteError> {
        let Some(name) = self.topics.command_name(topic) else {
            warn!("Router: topic '{}' outside command namespace, dropped", topic);
            return Ok(RouteOutcome::Ignored);
        };
        let command = CommandEvent::new(name, Payload::parse(text));
        self.dispatch(&command, now_ms, hw, status)
    }

    /// Dispatch a command regardless of where it came from.
    pub fn dispatch(
        &mut self,
        command: &CommandEvent,
        now_ms: u64,
        hw: &mut impl OutputPort,
        status: &mut impl StatusPort,
    ) -> Result<RouteOutcome, RouteError> {
        let Some(name) = CommandName::from_name(&command.name) else {
            warn!("Router: unknown command '{}', dropped", command.name);
            return Ok(RouteOutcome::Ignored);
        };
        let target = self.resolve(name)?;
        debug!("Router: {} <- {}", name, command.payload);

        match name {
            CommandName::Beep => self.display.beep(now_ms, hw, status),
            CommandName::Display => {
                self.display.set_display(command.payload.is_truthy(), hw, status);
            }
            CommandName::Brightness => {
                let Some(value) = command.payload.as_brightness() else {
                    warn!("Router: bad brightness payload {}, dropped", command.payload);
                    return Ok(RouteOutcome::Ignored);
                };
                let stored = self.display.set_brightness(value, hw, status);
                info!("Router: brightness -> {}", stored);
            }
            CommandName::LedRed | CommandName::LedWhite => {
                self.display
                    .set_aux_output(target, command.payload.is_truthy(), hw, status);
            }
        }
        Ok(RouteOutcome::Applied(name))
    }

    /// Advance the controller's deferred writes.
    pub fn tick(&mut self, now_ms: u64, hw: &mut impl OutputPort) {
        self.display.tick(now_ms, hw);
    }

    /// Map a command to its output, failing if the pin map leaves it unset.
    fn resolve(&self, name: CommandName) -> Result<Output, RouteError> {
        let (output, pin) = match name {
            CommandName::Beep => (Output::Beeper, self.outputs.beeper),
            CommandName::Brightness => (Output::Brightness, self.outputs.brightness),
            CommandName::Display => (Output::Display, self.outputs.display),
            CommandName::LedRed => (Output::LedRed, self.outputs.led_red),
            CommandName::LedWhite => (Output::LedWhite, self.outputs.led_white),
        };
        match pin {
            Some(_) => Ok(output),
            None => Err(RouteError::UnresolvedTarget(name)),
        }
    }
}
