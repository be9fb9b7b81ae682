//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ControlPanel / CommandRouter (domain)
//! ```
//!
//! Driven adapters (pin driver, MQTT transport, config file) implement these
//! traits.  The domain consumes them via generics, so the core never touches
//! hardware or the network directly.

use super::commands::CommandEvent;
use crate::config::SystemConfig;

// ───────────────────────────────────────────────────────────────
// Output port (driven adapter: domain → pins)
// ───────────────────────────────────────────────────────────────

/// Hardware targets a command can resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Output {
    /// Display panel power.
    Display,
    /// Backlight PWM.
    Brightness,
    /// Red illumination of the upper button.
    LedRed,
    /// White illumination of the lower button.
    LedWhite,
    /// Active buzzer.
    Beeper,
}

impl Output {
    /// Name used in the `<prefix>/<name>/STATE` status topic.
    pub fn status_name(self) -> &'static str {
        match self {
            Self::Display => "display",
            Self::Brightness => "brightness",
            Self::LedRed => "ledRed",
            Self::LedWhite => "ledWhite",
            Self::Beeper => "beep",
        }
    }
}

/// Write-side port: the domain calls this to drive outputs.
///
/// Writes are fire-and-forget; adapters log failures themselves.  Domain
/// state never depends on a write succeeding.
pub trait OutputPort {
    /// Drive a digital output high (`true`) or low.
    fn write_digital(&mut self, output: Output, high: bool);

    /// Set the backlight PWM duty (raw 8-bit value).
    fn write_pwm(&mut self, duty: u8);
}

// ───────────────────────────────────────────────────────────────
// Status port (driven adapter: domain → publish/subscribe transport)
// ───────────────────────────────────────────────────────────────

/// Publishes state and side-effect messages.
pub trait StatusPort {
    /// Publish `payload` on `topic`.  `retained` marks last-known state.
    fn publish(&mut self, topic: &str, payload: &str, retained: bool) -> Result<(), PublishError>;

    /// Close the transport gracefully.  Called once during shutdown.
    fn close(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Configuration port
// ───────────────────────────────────────────────────────────────

/// Loads system configuration.
///
/// Implementations MUST run [`SystemConfig::validate`] before handing a
/// config to the caller.
pub trait ConfigPort {
    /// Returns [`ConfigError::NotFound`] if no stored config exists.
    fn load(&self) -> Result<SystemConfig, ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Scheduler delegate (decouples scheduler from event system)
// ───────────────────────────────────────────────────────────────

/// Callback trait that the scheduler invokes when an entry fires.
///
/// The main loop implements this by pushing the command into the event
/// queue, so scheduled commands take the same path as remote ones.
pub trait SchedulerDelegate {
    fn on_schedule_fired(&mut self, label: &str, command: &CommandEvent);
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug)]
pub enum ConfigError {
    /// No config found in storage (first boot).
    NotFound,
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

/// Errors from [`StatusPort::publish`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishError {
    /// Transport is not connected (or already closed).
    NotConnected,
    /// The client rejected the message (queue full, oversized, ...).
    Rejected,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for PublishError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotConnected => write!(f, "transport not connected"),
            Self::Rejected => write!(f, "publish rejected by client"),
        }
    }
}

impl std::error::Error for ConfigError {}
impl std::error::Error for PublishError {}
