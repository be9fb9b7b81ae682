//! ESP32 clock adapter.
//!
//! Provides the two time bases the panel needs:
//!
//! - a monotonic millisecond counter for every deadline timer, and
//! - the SNTP-synchronised UTC wall clock for the scheduler.
//!
//! On `target_os = "espidf"` the monotonic clock wraps
//! `esp_timer_get_time()`; host builds use `std::time::Instant`.  The wall
//! clock comes from `chrono::Utc::now()` on both, which reads the libc
//! clock that SNTP sets on the device.

use chrono::{DateTime, Datelike, Utc};

use crate::scheduler::MIN_VALID_YEAR;

/// Clock adapter for the ESP32 platform.
pub struct SystemClock {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }

    /// Milliseconds since boot (monotonic).
    #[cfg(target_os = "espidf")]
    pub fn uptime_ms(&self) -> u64 {
        // SAFETY: esp_timer_get_time is a read of the high-resolution timer.
        (unsafe { esp_idf_sys::esp_timer_get_time() }) as u64 / 1_000
    }

    /// Milliseconds since boot (monotonic).
    #[cfg(not(target_os = "espidf"))]
    pub fn uptime_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    /// Current UTC wall-clock time, or `None` while it has not been
    /// synchronised (still counting from the epoch).
    pub fn utc_now(&self) -> Option<DateTime<Utc>> {
        let now = Utc::now();
        (now.year() >= MIN_VALID_YEAR).then_some(now)
    }
}
