//! Owned, cancellable deadline timers.
//!
//! Nothing here sleeps or spawns.  The owner stores the handle next to the
//! state it guards and polls it from its `tick(now_ms)`; cancelling is just
//! disarming the handle, so a stale timer can never fire later.
//!
//! All times are monotonic milliseconds since boot.

/// A one-shot deadline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timer {
    deadline_ms: Option<u64>,
}

impl Timer {
    pub const fn new() -> Self {
        Self { deadline_ms: None }
    }

    /// Arm (or re-arm) the timer to expire `duration_ms` after `now_ms`.
    /// Any previous deadline is replaced.
    pub fn start(&mut self, now_ms: u64, duration_ms: u64) {
        self.deadline_ms = Some(now_ms.saturating_add(duration_ms));
    }

    /// Disarm.  Returns `true` if a deadline was pending.
    pub fn cancel(&mut self) -> bool {
        self.deadline_ms.take().is_some()
    }

    pub fn is_armed(&self) -> bool {
        self.deadline_ms.is_some()
    }

    /// `true` while armed and the deadline has not passed yet.
    pub fn is_running(&self, now_ms: u64) -> bool {
        self.deadline_ms.is_some_and(|d| now_ms < d)
    }

    pub fn deadline(&self) -> Option<u64> {
        self.deadline_ms
    }

    /// Returns `true` exactly once when the deadline has been reached,
    /// disarming the timer.
    pub fn poll(&mut self, now_ms: u64) -> bool {
        match self.deadline_ms {
            Some(d) if now_ms >= d => {
                self.deadline_ms = None;
                true
            }
            _ => false,
        }
    }
}

/// A recurring timer (heartbeat, blink).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    period_ms: u64,
    next: Timer,
}

impl Interval {
    pub const fn new(period_ms: u64) -> Self {
        Self {
            period_ms,
            next: Timer::new(),
        }
    }

    /// Start with the first expiry one period after `now_ms`.
    pub fn start(&mut self, now_ms: u64) {
        self.next.start(now_ms, self.period_ms);
    }

    pub fn cancel(&mut self) -> bool {
        self.next.cancel()
    }

    pub fn is_armed(&self) -> bool {
        self.next.is_armed()
    }

    /// Returns `true` once per elapsed period.  After a long stall it fires
    /// once and re-arms relative to `now_ms` instead of bursting.
    pub fn poll(&mut self, now_ms: u64) -> bool {
        let Some(deadline) = self.next.deadline() else {
            return false;
        };
        if now_ms < deadline {
            return false;
        }
        let next = deadline.saturating_add(self.period_ms);
        if next > now_ms {
            self.next.start(deadline, self.period_ms);
        } else {
            self.next.start(now_ms, self.period_ms);
        }
        true
    }
}
