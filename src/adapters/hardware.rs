//! Hardware adapter — bridges the panel outputs to the [`OutputPort`] trait.
//!
//! Maps each logical [`Output`] to its configured GPIO and forwards writes
//! to the raw `hw_init` helpers.  This is the only module in the system
//! that drives actual pins.  On non-espidf targets the helpers are no-op
//! simulations.

use log::{debug, warn};

use crate::app::ports::{Output, OutputPort};
use crate::config::OutputPins;
use crate::drivers::hw_init::{self, LEDC_CH_BACKLIGHT};

/// Concrete adapter for the panel's outputs.
pub struct HardwareAdapter {
    pins: OutputPins,
}

impl HardwareAdapter {
    pub fn new(pins: OutputPins) -> Self {
        Self { pins }
    }

    fn pin_for(&self, output: Output) -> Option<i32> {
        match output {
            Output::Display => self.pins.display,
            Output::Brightness => self.pins.brightness,
            Output::LedRed => self.pins.led_red,
            Output::LedWhite => self.pins.led_white,
            Output::Beeper => self.pins.beeper,
        }
    }
}

// ── OutputPort implementation ─────────────────────────────────

impl OutputPort for HardwareAdapter {
    fn write_digital(&mut self, output: Output, high: bool) {
        match self.pin_for(output) {
            Some(pin) => {
                debug!("hw: {:?} (GPIO{}) <- {}", output, pin, high);
                hw_init::gpio_write(pin, high);
            }
            None => warn!("hw: {:?} has no pin, write dropped", output),
        }
    }

    fn write_pwm(&mut self, duty: u8) {
        if self.pins.brightness.is_none() {
            warn!("hw: backlight has no pin, duty {} dropped", duty);
            return;
        }
        hw_init::ledc_set(LEDC_CH_BACKLIGHT, duty);
    }
}
