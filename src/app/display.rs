//! Display & brightness controller.
//!
//! Sole owner of [`DisplayState`].  Every mutation writes the hardware and
//! republishes the retained `STATE` topic, even when the value did not
//! change.  The beeper pulse and the startup blink are driven by deadline
//! timers polled from [`DisplayController::tick`].

use heapless::Vec;
use log::{debug, warn};

use super::commands::{BrightnessValue, Topics};
use super::ports::{Output, OutputPort, StatusPort};
use crate::config::{BrightnessConfig, TimingConfig, BRIGHTNESS_CEILING};
use crate::timer::{Interval, Timer};

/// At most one blink per button LED.
const MAX_BLINKS: usize = 2;

/// Logical display state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayState {
    pub on: bool,
    /// Always within `[0, max]`, and `max` never exceeds 190.
    pub brightness: u8,
}

/// A running startup blink on one output.
#[derive(Debug, Clone, Copy)]
struct Blink {
    target: Output,
    level: bool,
    remaining: u8,
    interval: Interval,
}

pub struct DisplayController {
    state: DisplayState,
    limits: BrightnessConfig,
    beep_ms: u64,
    blink_interval_ms: u64,
    beep_off: Timer,
    blinks: Vec<Blink, MAX_BLINKS>,
    /// Last commanded level of each button LED, `None` until first set.
    led_red: Option<bool>,
    led_white: Option<bool>,
    topics: Topics,
}

impl DisplayController {
    pub fn new(topics: Topics, mut limits: BrightnessConfig, timing: &TimingConfig) -> Self {
        limits.max = limits.max.min(BRIGHTNESS_CEILING);
        Self {
            state: DisplayState {
                on: false,
                brightness: limits.initial.min(limits.max),
            },
            limits,
            beep_ms: timing.beep_ms,
            blink_interval_ms: timing.blink_interval_ms,
            beep_off: Timer::new(),
            blinks: Vec::new(),
            led_red: None,
            led_white: None,
            topics,
        }
    }

    pub fn state(&self) -> DisplayState {
        self.state
    }

    pub fn is_on(&self) -> bool {
        self.state.on
    }

    pub fn brightness(&self) -> u8 {
        self.state.brightness
    }

    /// Whether the beeper pulse is still running.
    pub fn is_beeping(&self) -> bool {
        self.beep_off.is_armed()
    }

    // ── Commands ──────────────────────────────────────────────

    /// Store the flag, write the power pin and republish `0`/`1`.
    pub fn set_display(
        &mut self,
        on: bool,
        hw: &mut impl OutputPort,
        status: &mut impl StatusPort,
    ) {
        self.state.on = on;
        hw.write_digital(Output::Display, on);
        self.publish(status, Output::Display, if on { "1" } else { "0" });
    }

    /// Apply an absolute or relative brightness, clamp, write PWM, republish.
    /// Returns the stored value.
    pub fn set_brightness(
        &mut self,
        value: BrightnessValue,
        hw: &mut impl OutputPort,
        status: &mut impl StatusPort,
    ) -> u8 {
        let current = i64::from(self.state.brightness);
        let step = i64::from(self.limits.step);
        let requested = match value {
            BrightnessValue::Absolute(v) => v,
            BrightnessValue::Up => current + step,
            BrightnessValue::Down => current - step,
        };
        let clamped = requested.clamp(0, i64::from(self.limits.max)) as u8;
        if i64::from(clamped) != requested {
            debug!("Display: brightness {} clamped to {}", requested, clamped);
        }

        self.state.brightness = clamped;
        hw.write_pwm(clamped);
        self.publish(status, Output::Brightness, &clamped.to_string());
        clamped
    }

    /// Start a beeper pulse and report it on `beep/STATE`.  A beep during a
    /// running pulse restarts it.
    pub fn beep(&mut self, now_ms: u64, hw: &mut impl OutputPort, status: &mut impl StatusPort) {
        hw.write_digital(Output::Beeper, true);
        self.beep_off.start(now_ms, self.beep_ms);
        self.publish(status, Output::Beeper, "1");
    }

    /// Pass-through write for the button LEDs, plus retained republish.
    pub fn set_aux_output(
        &mut self,
        target: Output,
        on: bool,
        hw: &mut impl OutputPort,
        status: &mut impl StatusPort,
    ) {
        match target {
            Output::LedRed => self.led_red = Some(on),
            Output::LedWhite => self.led_white = Some(on),
            _ => {}
        }
        hw.write_digital(target, on);
        self.publish(status, target, if on { "1" } else { "0" });
    }

    /// Toggle `target` every blink interval for `half_cycles` toggles.
    /// The first toggle happens immediately.
    pub fn startup_blink(
        &mut self,
        target: Output,
        half_cycles: u8,
        now_ms: u64,
        hw: &mut impl OutputPort,
    ) {
        if half_cycles == 0 {
            return;
        }
        self.blinks.retain(|b| b.target != target);

        hw.write_digital(target, true);
        let mut interval = Interval::new(self.blink_interval_ms);
        interval.start(now_ms);
        let blink = Blink {
            target,
            level: true,
            remaining: half_cycles - 1,
            interval,
        };
        if blink.remaining > 0 && self.blinks.push(blink).is_err() {
            warn!("Display: blink table full, {:?} left on", target);
        }
    }

    /// Whether any startup blink is still toggling.
    pub fn is_blinking(&self) -> bool {
        !self.blinks.is_empty()
    }

    /// Publish the current display flag, brightness and any commanded LED
    /// levels again, e.g. after the transport reconnects.  No hardware writes.
    pub fn republish(&self, status: &mut impl StatusPort) {
        self.publish(status, Output::Display, if self.state.on { "1" } else { "0" });
        self.publish(status, Output::Brightness, &self.state.brightness.to_string());
        for (target, level) in [(Output::LedRed, self.led_red), (Output::LedWhite, self.led_white)] {
            if let Some(on) = level {
                self.publish(status, target, if on { "1" } else { "0" });
            }
        }
    }

    /// Drive the backlight to zero without touching stored state.
    pub fn blank(&mut self, hw: &mut impl OutputPort) {
        hw.write_pwm(0);
    }

    /// Advance the beeper and blink timers.
    pub fn tick(&mut self, now_ms: u64, hw: &mut impl OutputPort) {
        if self.beep_off.poll(now_ms) {
            hw.write_digital(Output::Beeper, false);
        }

        for blink in &mut self.blinks {
            if blink.interval.poll(now_ms) {
                blink.level = !blink.level;
                blink.remaining -= 1;
                hw.write_digital(blink.target, blink.level);
            }
        }
        self.blinks.retain(|b| b.remaining > 0);
    }

    // ── Internal ──────────────────────────────────────────────

    fn publish(&self, status: &mut impl StatusPort, output: Output, payload: &str) {
        let topic = self.topics.state(output.status_name());
        if let Err(e) = status.publish(&topic, payload, true) {
            warn!("Display: publish {} <- {} failed: {}", topic, payload, e);
        }
    }
}
