//! Mock adapters for integration tests.
//!
//! Record every pin write and every publish so tests can assert on the
//! full history without touching real GPIO or a broker.

use control_io::app::ports::{Output, OutputPort, PublishError, StatusPort};

// ── Output call record ────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinCall {
    Digital { output: Output, high: bool },
    Pwm(u8),
}

// ── MockHardware ──────────────────────────────────────────────

#[derive(Default)]
pub struct MockHardware {
    pub calls: Vec<PinCall>,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last level written to `output`, if any.
    pub fn level(&self, output: Output) -> Option<bool> {
        self.calls.iter().rev().find_map(|c| match c {
            PinCall::Digital { output: o, high } if *o == output => Some(*high),
            _ => None,
        })
    }

    pub fn last_pwm(&self) -> Option<u8> {
        self.calls.iter().rev().find_map(|c| match c {
            PinCall::Pwm(d) => Some(*d),
            _ => None,
        })
    }

    pub fn writes_to(&self, output: Output) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, PinCall::Digital { output: o, .. } if *o == output))
            .count()
    }
}

impl OutputPort for MockHardware {
    fn write_digital(&mut self, output: Output, high: bool) {
        self.calls.push(PinCall::Digital { output, high });
    }

    fn write_pwm(&mut self, duty: u8) {
        self.calls.push(PinCall::Pwm(duty));
    }
}

// ── MockBroker ────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    pub topic: String,
    pub payload: String,
    pub retained: bool,
}

#[derive(Default)]
pub struct MockBroker {
    pub published: Vec<Published>,
    pub closed: bool,
    /// When set, every publish fails with `NotConnected`.
    pub offline: bool,
}

#[allow(dead_code)]
impl MockBroker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&self, topic: &str) -> Vec<&str> {
        self.published
            .iter()
            .filter(|p| p.topic == topic)
            .map(|p| p.payload.as_str())
            .collect()
    }

    pub fn clear(&mut self) {
        self.published.clear();
    }
}

impl StatusPort for MockBroker {
    fn publish(&mut self, topic: &str, payload: &str, retained: bool) -> Result<(), PublishError> {
        if self.offline || self.closed {
            return Err(PublishError::NotConnected);
        }
        self.published.push(Published {
            topic: topic.to_string(),
            payload: payload.to_string(),
            retained,
        });
        Ok(())
    }

    fn close(&mut self) {
        self.closed = true;
    }
}
