//! Unified error type for the control-io firmware.
//!
//! Startup and event-loop failures convert into [`Error`], so `main` can
//! propagate any of them with `?` and report them uniformly.

use core::fmt;

use crate::app::ports::ConfigError;
use crate::app::router::RouteError;
use crate::drivers::hw_init::HwInitError;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum Error {
    /// Configuration is invalid or could not be loaded.
    Config(ConfigError),
    /// A command could not be routed to hardware.
    Route(RouteError),
    /// Peripheral initialisation failed.
    Init(HwInitError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Route(e) => write!(f, "route: {e}"),
            Self::Init(e) => write!(f, "init: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Route(e) => Some(e),
            Self::Init(e) => Some(e),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<RouteError> for Error {
    fn from(e: RouteError) -> Self {
        Self::Route(e)
    }
}

impl From<HwInitError> for Error {
    fn from(e: HwInitError) -> Self {
        Self::Init(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
