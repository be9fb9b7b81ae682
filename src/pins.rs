//! GPIO / peripheral pin assignments for the control panel board.
//!
//! Defaults for [`OutputPins`](crate::config::OutputPins) and
//! [`ButtonPins`](crate::config::ButtonPins); the configuration file can
//! override every entry.

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

/// Digital output: HIGH = display panel powered.
pub const DISPLAY_POWER_GPIO: i32 = 4;
/// LEDC PWM channel for the backlight.
pub const BACKLIGHT_PWM_GPIO: i32 = 5;

// ---------------------------------------------------------------------------
// Button illumination
// ---------------------------------------------------------------------------

pub const LED_RED_GPIO: i32 = 12;
pub const LED_WHITE_GPIO: i32 = 13;

// ---------------------------------------------------------------------------
// Beeper (active buzzer, HIGH = sounding)
// ---------------------------------------------------------------------------

pub const BEEPER_GPIO: i32 = 14;

// ---------------------------------------------------------------------------
// Push-buttons (active-low with pull-up)
// ---------------------------------------------------------------------------

pub const BUTTON_UPPER_GPIO: i32 = 16;
pub const BUTTON_LOWER_GPIO: i32 = 17;

// ---------------------------------------------------------------------------
// PWM configuration
// ---------------------------------------------------------------------------

/// LEDC timer resolution (bits).  8-bit covers the 0 – 190 backlight range.
pub const PWM_RESOLUTION_BITS: u32 = 8;
/// LEDC base frequency for the backlight (1 kHz, flicker-free).
pub const BACKLIGHT_PWM_FREQ_HZ: u32 = 1_000;
