//! Inbound commands to the control core.
//!
//! A [`CommandEvent`] is the same value whether it came from an MQTT
//! message, a schedule fire or a button gesture; the
//! [`CommandRouter`](super::router::CommandRouter) interprets all of them.

use core::fmt;

use serde_json::Value;

/// Command payload: either parsed JSON or the raw text it failed to parse as.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    Raw(String),
}

impl Payload {
    /// Parse message text as JSON, keeping the raw text on failure.
    pub fn parse(text: &str) -> Self {
        match serde_json::from_str::<Value>(text) {
            Ok(value) => Self::Json(value),
            Err(_) => Self::Raw(text.to_string()),
        }
    }

    /// Loose truthiness: `false`, `null`, `0`, `""` (and empty raw text) are
    /// falsy, everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Json(Value::Null) => false,
            Self::Json(Value::Bool(b)) => *b,
            Self::Json(Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
            Self::Json(Value::String(s)) | Self::Raw(s) => !s.is_empty(),
            Self::Json(Value::Array(_) | Value::Object(_)) => true,
        }
    }

    /// Interpret the payload as a brightness request.
    pub fn as_brightness(&self) -> Option<BrightnessValue> {
        let token = match self {
            Self::Json(Value::Number(n)) => {
                return n
                    .as_i64()
                    .or_else(|| n.as_f64().map(|v| v.round() as i64))
                    .map(BrightnessValue::Absolute);
            }
            Self::Json(Value::String(s)) | Self::Raw(s) => s.trim(),
            _ => return None,
        };
        match token {
            "+" => Some(BrightnessValue::Up),
            "-" => Some(BrightnessValue::Down),
            other => other.parse::<i64>().ok().map(BrightnessValue::Absolute),
        }
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(v) => write!(f, "{}", v),
            Self::Raw(s) => write!(f, "{:?}", s),
        }
    }
}

/// Brightness request after payload interpretation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrightnessValue {
    /// Absolute value, clamped by the controller.
    Absolute(i64),
    /// One step up (`+`).
    Up,
    /// One step down (`-`).
    Down,
}

/// The recognised command names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandName {
    Beep,
    Brightness,
    Display,
    LedRed,
    LedWhite,
}

impl CommandName {
    /// Exact, case-sensitive lookup.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "beep" => Some(Self::Beep),
            "brightness" => Some(Self::Brightness),
            "display" => Some(Self::Display),
            "ledRed" => Some(Self::LedRed),
            "ledWhite" => Some(Self::LedWhite),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Beep => "beep",
            Self::Brightness => "brightness",
            Self::Display => "display",
            Self::LedRed => "ledRed",
            Self::LedWhite => "ledWhite",
        }
    }
}

impl fmt::Display for CommandName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A (target, payload) pair flowing into the router.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandEvent {
    /// Command name, i.e. the topic remainder after `<prefix>/cmnd/`.
    pub name: String,
    pub payload: Payload,
}

impl CommandEvent {
    pub fn new(name: impl Into<String>, payload: impl Into<Payload>) -> Self {
        Self {
            name: name.into(),
            payload: payload.into(),
        }
    }

    pub fn display(on: bool) -> Self {
        Self::new(CommandName::Display.as_str(), Value::Bool(on))
    }
}

// ───────────────────────────────────────────────────────────────
// Topic layout
// ───────────────────────────────────────────────────────────────

/// Topic builder for one namespace prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topics {
    prefix: String,
}

impl Topics {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Subscription filter for every command.
    pub fn command_filter(&self) -> String {
        format!("{}/cmnd/#", self.prefix)
    }

    /// `<prefix>/<name>/STATE`.
    pub fn state(&self, name: &str) -> String {
        format!("{}/{}/STATE", self.prefix, name)
    }

    /// Command name carried by `topic`, or `None` when the topic lies
    /// outside the command namespace.
    pub fn command_name<'t>(&self, topic: &'t str) -> Option<&'t str> {
        topic
            .strip_prefix(self.prefix.as_str())?
            .strip_prefix("/cmnd/")
            .filter(|name| !name.is_empty())
    }
}
