//! Button interaction state machine with long-press and post-off suppression.
//!
//! ## Hardware
//!
//! Active-low momentary switch with pull-up.  The pin driver reports every
//! edge (glitch-filtered) as a raw [`PinState`]; logical "pressed" is the
//! inverse of the raw level.
//!
//! ## Gestures
//!
//! | Display | Gesture                 | Result                                     |
//! |---------|-------------------------|--------------------------------------------|
//! | off     | press                   | display on + navigate + press notification |
//! | on      | press, release < hold   | press + release notifications              |
//! | on      | hold >= hold            | press notification, display off, then      |
//! |         |                         | every edge suppressed for a short window   |
//!
//! ```text
//!          press (display on)            hold expiry
//!  Idle ───────────────────────▶ PressPending ─────────▶ Suppressed
//!   ▲  ◀───────────────────────────┘ release                 │
//!   └────────────────────────────────────────────────────────┘
//!                         suppression deadline passed
//! ```

use embedded_hal::digital::PinState;
use heapless::Vec;
use log::{debug, info};

use super::commands::CommandEvent;
use crate::config::TimingConfig;
use crate::timer::Timer;

/// The two panel buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ButtonId {
    Upper,
    Lower,
}

impl ButtonId {
    /// Name used in the `<prefix>/<name>/STATE` status topic.
    pub fn status_name(self) -> &'static str {
        match self {
            Self::Upper => "buttonUpper",
            Self::Lower => "buttonLower",
        }
    }
}

/// Externally visible machine state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonPhase {
    Idle,
    /// Hold timer running; a release now is a short press.
    PressPending,
    /// Every edge is discarded until the deadline.
    Suppressed,
}

/// Effects the machine asks its owner to carry out.
#[derive(Debug, Clone, PartialEq)]
pub enum ButtonAction {
    /// Route a command through the command router.
    Command(CommandEvent),
    /// Publish the one-shot "navigate to default view" side-effect.
    Navigate,
    /// Publish the logical level on the button's status topic.
    Notify { pressed: bool },
}

/// Up to three effects per edge (display-on wake).
pub type ButtonActions = Vec<ButtonAction, 3>;

pub struct ButtonMachine {
    id: ButtonId,
    /// Debounced logical level.
    pressed: bool,
    hold: Timer,
    suppression: Timer,
    hold_ms: u64,
    suppress_ms: u64,
}

impl ButtonMachine {
    pub fn new(id: ButtonId, timing: &TimingConfig) -> Self {
        Self {
            id,
            pressed: false,
            hold: Timer::new(),
            suppression: Timer::new(),
            hold_ms: timing.hold_ms,
            suppress_ms: timing.suppress_ms,
        }
    }

    pub fn phase(&self) -> ButtonPhase {
        if self.suppression.is_armed() {
            ButtonPhase::Suppressed
        } else if self.hold.is_armed() {
            ButtonPhase::PressPending
        } else {
            ButtonPhase::Idle
        }
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    /// Feed one raw edge.  `display_on` is the controller's current flag.
    pub fn on_edge(&mut self, level: PinState, display_on: bool, now_ms: u64) -> ButtonActions {
        let mut actions = ButtonActions::new();

        if self.expire_suppression(now_ms) {
            debug!("Button[{:?}]: edge suppressed", self.id);
            return actions;
        }

        let pressed = level == PinState::Low;

        if pressed {
            // A new press edge supersedes any hold timer still running.
            if self.hold.cancel() {
                debug!("Button[{:?}]: hold restarted", self.id);
            }
            self.pressed = true;

            if display_on {
                self.hold.start(now_ms, self.hold_ms);
                let _ = actions.push(ButtonAction::Notify { pressed: true });
            } else {
                info!("Button[{:?}]: wake display", self.id);
                let _ = actions.push(ButtonAction::Command(CommandEvent::display(true)));
                let _ = actions.push(ButtonAction::Navigate);
                let _ = actions.push(ButtonAction::Notify { pressed: true });
            }
        } else {
            if self.hold.cancel() {
                debug!("Button[{:?}]: short press", self.id);
            }
            self.pressed = false;
            let _ = actions.push(ButtonAction::Notify { pressed: false });
        }

        actions
    }

    /// Advance the hold and suppression timers.
    pub fn tick(&mut self, now_ms: u64) -> Option<ButtonAction> {
        self.expire_suppression(now_ms);

        let deadline = self.hold.deadline().unwrap_or(now_ms);
        if self.hold.poll(now_ms) {
            info!("Button[{:?}]: long press, display off", self.id);
            self.pressed = false;
            // The window is measured from the hold deadline, not from a late tick.
            self.suppression.start(deadline, self.suppress_ms);
            return Some(ButtonAction::Command(CommandEvent::display(false)));
        }
        None
    }

    /// Returns `true` while suppression is still active; clears it once the
    /// deadline has passed.
    fn expire_suppression(&mut self, now_ms: u64) -> bool {
        if self.suppression.is_running(now_ms) {
            return true;
        }
        self.suppression.cancel();
        false
    }
}
