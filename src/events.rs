//! Serialized event queue.
//!
//! Events are produced by:
//! - GPIO ISRs (button edges)
//! - The MQTT receiver thread (inbound messages, connection changes)
//! - The scheduler delegate (schedule fires)
//! - The shutdown hook
//!
//! and consumed one at a time by the main loop, which is the only place
//! that touches controller state.
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ GPIO ISR    │────▶│              │     │              │
//! │ MQTT thread │────▶│  Event Queue │────▶│  Main Loop   │
//! │ Scheduler   │────▶│  (bounded)   │     │  (consumer)  │
//! │ Shutdown    │────▶│              │     │              │
//! └─────────────┘     └──────────────┘     └──────────────┘
//! ```

use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embedded_hal::digital::PinState;

use crate::app::button::ButtonId;
use crate::app::commands::CommandEvent;

/// Maximum number of pending events.
pub const EVENT_QUEUE_CAP: usize = 32;

/// Broker connection changes reported by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportStatus {
    Connected,
    Disconnected,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Raw level change on a button input.
    Edge { button: ButtonId, level: PinState },
    /// Inbound message on the command namespace.
    Message { topic: String, payload: String },
    /// A schedule entry fired.
    Scheduled(CommandEvent),
    Transport(TransportStatus),
    /// Process is going down; blank the display and stop.
    Shutdown,
}

static EVENT_QUEUE: Channel<CriticalSectionRawMutex, Event, EVENT_QUEUE_CAP> = Channel::new();

/// Push an event into the queue.
/// Safe to call from ISR context (never blocks, never allocates).
/// Returns `false` if the queue is full (event dropped).
pub fn push_event(event: Event) -> bool {
    EVENT_QUEUE.try_send(event).is_ok()
}

/// Pop the next event, or `None` if the queue is empty.
pub fn pop_event() -> Option<Event> {
    EVENT_QUEUE.try_receive().ok()
}

/// Drain all pending events, calling `handler` for each in FIFO order.
/// The handler may stop the drain early by returning `false`; events not
/// yet taken stay queued.
pub fn drain_events(mut handler: impl FnMut(Event) -> bool) {
    while let Some(event) = pop_event() {
        if !handler(event) {
            break;
        }
    }
}

/// Number of events currently queued.
pub fn pending_events() -> usize {
    EVENT_QUEUE.len()
}

// ── Shutdown handshake ────────────────────────────────────────
//
// A restart request arrives outside the main loop.  The requester queues
// `Event::Shutdown` and waits, bounded, until the loop has processed it.

static SHUTDOWN_ACK: AtomicBool = AtomicBool::new(false);

/// Called by the main loop once the panel has shut down.
pub fn acknowledge_shutdown() {
    SHUTDOWN_ACK.store(true, Ordering::Release);
}

pub fn shutdown_acknowledged() -> bool {
    SHUTDOWN_ACK.load(Ordering::Acquire)
}

/// Queue `Event::Shutdown` and wait up to `grace_ms` for the main loop to
/// acknowledge it, sleeping `step_ms` at a time through `sleep_ms`.
/// Returns `true` if the loop acknowledged in time.
pub fn request_shutdown(grace_ms: u64, step_ms: u64, mut sleep_ms: impl FnMut(u64)) -> bool {
    if !push_event(Event::Shutdown) {
        return false;
    }
    let mut waited = 0;
    while !shutdown_acknowledged() {
        if waited >= grace_ms {
            return false;
        }
        sleep_ms(step_ms);
        waited += step_ms.max(1);
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // The queue is a process-wide static; keep everything that touches it
    // in one test so parallel test threads cannot interleave.
    #[test]
    fn fifo_order_and_overflow() {
        while pop_event().is_some() {}

        assert!(push_event(Event::Edge {
            button: ButtonId::Upper,
            level: PinState::Low,
        }));
        assert!(push_event(Event::Scheduled(CommandEvent::new("beep", json!(1)))));
        assert!(push_event(Event::Shutdown));
        assert_eq!(pending_events(), 3);

        let mut seen = Vec::new();
        drain_events(|e| {
            seen.push(e);
            true
        });
        assert!(matches!(seen[0], Event::Edge { button: ButtonId::Upper, .. }));
        assert!(matches!(seen[1], Event::Scheduled(_)));
        assert_eq!(seen[2], Event::Shutdown);

        for _ in 0..EVENT_QUEUE_CAP {
            assert!(push_event(Event::Transport(TransportStatus::Connected)));
        }
        assert!(!push_event(Event::Shutdown));

        // Early stop leaves the rest queued.
        let mut taken = 0;
        drain_events(|_| {
            taken += 1;
            taken < 2
        });
        assert_eq!(pending_events(), EVENT_QUEUE_CAP - 2);
        while pop_event().is_some() {}

        // Shutdown request: times out while nobody drains, then completes
        // once the "loop" handles the event and acknowledges.
        let mut naps = 0;
        assert!(!request_shutdown(50, 10, |_| naps += 1));
        assert_eq!(naps, 5);
        assert_eq!(pop_event(), Some(Event::Shutdown));

        let acked = request_shutdown(500, 10, |_| {
            if pop_event() == Some(Event::Shutdown) {
                acknowledge_shutdown();
            }
        });
        assert!(acked);
        assert!(shutdown_acknowledged());
        assert_eq!(pending_events(), 0);
    }
}
