//! System configuration parameters
//!
//! All tunable parameters for the control panel.  Values are loaded from a
//! JSON file through [`ConfigPort`](crate::app::ports::ConfigPort); any field
//! missing from the file keeps its default.

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;
use crate::pins;
use crate::scheduler::WeekdayFilter;

/// Hard upper bound for the backlight value; `brightness.max` may only
/// lower it.
pub const BRIGHTNESS_CEILING: u8 = 190;

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    // --- Topics ---
    /// Namespace for every command and status topic (`<prefix>/cmnd/<name>`).
    pub topic_prefix: String,

    // --- Connectivity ---
    pub mqtt: MqttConfig,
    pub wifi: WifiConfig,

    // --- Time ---
    /// IANA timezone the schedule is evaluated in, e.g. `Europe/Berlin`.
    pub timezone: String,

    // --- Behaviour ---
    pub timing: TimingConfig,
    pub brightness: BrightnessConfig,
    /// Display flag applied and published at startup.
    pub initial_display_on: bool,

    // --- Hardware ---
    pub outputs: OutputPins,
    pub buttons: ButtonPins,

    // --- Side effects ---
    pub navigate: NavigateConfig,
    /// Lock artifact left behind by a previous run; removed at startup.
    pub lock_file: String,

    // --- Schedule ---
    pub schedule: Vec<ScheduleConfig>,
}

/// MQTT broker connection parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    /// Broker URL, e.g. `mqtt://192.168.1.10:1883`.
    pub url: String,
    pub client_id: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// WiFi station credentials.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WifiConfig {
    pub ssid: String,
    pub password: String,
}

/// Timer lengths for the button machines, beeper, blink and heartbeat.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Hold duration that turns a press into a long press.
    pub hold_ms: u64,
    /// Input suppression window after a long-press display-off.
    pub suppress_ms: u64,
    /// Beeper pulse length.
    pub beep_ms: u64,
    /// Interval between startup blink toggles.
    pub blink_interval_ms: u64,
    /// Number of toggles in the startup blink.
    pub blink_half_cycles: u8,
    /// Health heartbeat period.
    pub heartbeat_secs: u64,
    /// Main loop cadence.
    pub loop_interval_ms: u64,
}

/// Backlight limits.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct BrightnessConfig {
    /// Upper clamp for the backlight PWM value (lower clamp is always 0).
    /// At most [`BRIGHTNESS_CEILING`].
    pub max: u8,
    /// Amount one `+` / `-` token moves the brightness.
    pub step: u8,
    /// Brightness applied and published at startup.
    pub initial: u8,
}

/// Output pin map.  A `None` entry leaves the corresponding command target
/// unresolved; dispatching to it is a fatal configuration defect.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputPins {
    pub display: Option<i32>,
    pub brightness: Option<i32>,
    pub led_red: Option<i32>,
    pub led_white: Option<i32>,
    pub beeper: Option<i32>,
}

/// Button input pins (active-low with pull-up).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ButtonPins {
    pub upper: i32,
    pub lower: i32,
}

/// One-shot "navigate to default view" message published on button wake.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigateConfig {
    pub topic: String,
    pub payload: String,
}

/// A schedule rule as it appears in the configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Human-readable label (e.g. "morning wake").
    pub label: String,
    pub hour: u8,
    pub minute: u8,
    #[serde(default)]
    pub days: WeekdayFilter,
    /// Command name dispatched through the router, e.g. `display`.
    pub command: String,
    /// Command payload; strings such as `"+"` are passed through as-is.
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            topic_prefix: "control-io".into(),
            mqtt: MqttConfig::default(),
            wifi: WifiConfig::default(),
            timezone: "Europe/Berlin".into(),
            timing: TimingConfig::default(),
            brightness: BrightnessConfig::default(),
            initial_display_on: true,
            outputs: OutputPins::default(),
            buttons: ButtonPins::default(),
            navigate: NavigateConfig::default(),
            lock_file: "/spiffs/control-io.lock".into(),
            schedule: Vec::new(),
        }
    }
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            url: "mqtt://127.0.0.1:1883".into(),
            client_id: "control-io".into(),
            username: None,
            password: None,
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            hold_ms: 1000,
            suppress_ms: 500,
            beep_ms: 100,
            blink_interval_ms: 300,
            blink_half_cycles: 6,
            heartbeat_secs: 60,
            loop_interval_ms: 10,
        }
    }
}

impl Default for BrightnessConfig {
    fn default() -> Self {
        Self {
            max: BRIGHTNESS_CEILING,
            step: 10,
            initial: BRIGHTNESS_CEILING,
        }
    }
}

impl Default for OutputPins {
    fn default() -> Self {
        Self {
            display: Some(pins::DISPLAY_POWER_GPIO),
            brightness: Some(pins::BACKLIGHT_PWM_GPIO),
            led_red: Some(pins::LED_RED_GPIO),
            led_white: Some(pins::LED_WHITE_GPIO),
            beeper: Some(pins::BEEPER_GPIO),
        }
    }
}

impl Default for ButtonPins {
    fn default() -> Self {
        Self {
            upper: pins::BUTTON_UPPER_GPIO,
            lower: pins::BUTTON_LOWER_GPIO,
        }
    }
}

impl Default for NavigateConfig {
    fn default() -> Self {
        Self {
            topic: "control-io/navigate".into(),
            payload: "home".into(),
        }
    }
}

impl SystemConfig {
    /// Range-check every field.  Invalid values are rejected, never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.topic_prefix.is_empty() || self.topic_prefix.contains(['#', '+']) {
            return Err(ConfigError::ValidationFailed("topic_prefix must be a plain topic"));
        }
        if self.timezone.parse::<chrono_tz::Tz>().is_err() {
            return Err(ConfigError::ValidationFailed("timezone is not a known IANA name"));
        }
        if self.brightness.max > BRIGHTNESS_CEILING {
            return Err(ConfigError::ValidationFailed("brightness.max must be <= 190"));
        }
        if self.brightness.step == 0 {
            return Err(ConfigError::ValidationFailed("brightness.step must be > 0"));
        }
        if self.brightness.initial > self.brightness.max {
            return Err(ConfigError::ValidationFailed("brightness.initial exceeds brightness.max"));
        }
        let t = &self.timing;
        if t.hold_ms == 0 || t.beep_ms == 0 || t.blink_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed("timer lengths must be > 0"));
        }
        if t.heartbeat_secs == 0 || t.loop_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed("heartbeat and loop interval must be > 0"));
        }
        if self.buttons.upper == self.buttons.lower {
            return Err(ConfigError::ValidationFailed("buttons must use distinct pins"));
        }
        for entry in &self.schedule {
            if entry.hour > 23 {
                return Err(ConfigError::ValidationFailed("schedule hour must be 0-23"));
            }
            if entry.minute > 59 {
                return Err(ConfigError::ValidationFailed("schedule minute must be 0-59"));
            }
            if entry.command.is_empty() {
                return Err(ConfigError::ValidationFailed("schedule command must not be empty"));
            }
        }
        Ok(())
    }
}
