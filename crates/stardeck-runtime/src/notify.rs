//! Cross-task notification channel: the pending inbox and the event-log
//! ring, guarded together by one short-hold lock.
//!
//! Any producer thread may [`NotificationBus::post`]; the UI task drains
//! with [`NotificationBus::take_pending`] on its tick and turns entries into
//! toast state outside the lock. Lock holds are bounded to a few bounded
//! string copies. When the inbox is full the oldest pending slot (slot 0) is
//! overwritten rather than blocking the producer; the ring likewise
//! overwrites its oldest row.

use std::sync::Mutex;

use stardeck_style::Severity;
use tracing::warn;

/// Pending-slot count. Drains run every UI tick, so a handful is plenty.
pub const INBOX_CAPACITY: usize = 8;

/// Event-log ring size.
pub const EVENT_LOG_CAPACITY: usize = 128;

/// Longest message kept; longer text is truncated at a char boundary.
const MAX_TEXT: usize = 120;

/// One severity-tagged message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub severity: Severity,
    /// Originating instance, when the message is instance-scoped.
    pub instance: Option<usize>,
    pub at_ms: u64,
    pub text: String,
}

#[derive(Debug, Default)]
struct Channel {
    inbox: Vec<Notification>,
    ring: Vec<Notification>,
    ring_head: usize,
    dropped: u64,
}

/// Thread-safe producer→UI channel.
#[derive(Debug, Default)]
pub struct NotificationBus {
    channel: Mutex<Channel>,
}

impl NotificationBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a message from any thread. Never blocks on a full inbox: the
    /// oldest pending entry is dropped instead.
    pub fn post(&self, severity: Severity, instance: Option<usize>, text: &str, now_ms: u64) {
        let entry = Notification {
            severity,
            instance,
            at_ms: now_ms,
            text: truncate(text),
        };
        let dropped;
        {
            let mut ch = self.channel.lock().unwrap_or_else(|e| e.into_inner());
            if ch.inbox.len() >= INBOX_CAPACITY {
                ch.inbox.remove(0);
                ch.dropped += 1;
            }
            ch.inbox.push(entry.clone());
            push_ring(&mut ch, entry);
            dropped = ch.dropped;
        }
        if dropped > 0 && dropped.is_power_of_two() {
            warn!(dropped, "notification inbox overflowed");
        }
    }

    /// Drain pending entries in arrival order. UI task only.
    #[must_use]
    pub fn take_pending(&self) -> Vec<Notification> {
        let mut ch = self.channel.lock().unwrap_or_else(|e| e.into_inner());
        std::mem::take(&mut ch.inbox)
    }

    /// Copy of the event log, oldest first.
    #[must_use]
    pub fn log_snapshot(&self) -> Vec<Notification> {
        let ch = self.channel.lock().unwrap_or_else(|e| e.into_inner());
        let mut out = Vec::with_capacity(ch.ring.len());
        if ch.ring.len() < EVENT_LOG_CAPACITY {
            out.extend(ch.ring.iter().cloned());
        } else {
            out.extend(ch.ring[ch.ring_head..].iter().cloned());
            out.extend(ch.ring[..ch.ring_head].iter().cloned());
        }
        out
    }

    /// Messages dropped to inbox overflow since startup.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.channel
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .dropped
    }
}

fn push_ring(ch: &mut Channel, entry: Notification) {
    if ch.ring.len() < EVENT_LOG_CAPACITY {
        ch.ring.push(entry);
    } else {
        let head = ch.ring_head;
        ch.ring[head] = entry;
        ch.ring_head = (head + 1) % EVENT_LOG_CAPACITY;
    }
}

fn truncate(text: &str) -> String {
    if text.len() <= MAX_TEXT {
        return text.to_owned();
    }
    let mut end = MAX_TEXT;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text[..end].to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn post_then_drain_preserves_order() {
        let bus = NotificationBus::new();
        bus.post(Severity::Info, None, "one", 10);
        bus.post(Severity::Warning, Some(1), "two", 20);
        let drained = bus.take_pending();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].text, "one");
        assert_eq!(drained[1].instance, Some(1));
        assert!(bus.take_pending().is_empty());
    }

    #[test]
    fn overflow_drops_oldest_pending() {
        let bus = NotificationBus::new();
        for i in 0..(INBOX_CAPACITY + 2) {
            bus.post(Severity::Info, None, &format!("m{i}"), i as u64);
        }
        let drained = bus.take_pending();
        assert_eq!(drained.len(), INBOX_CAPACITY);
        assert_eq!(drained[0].text, "m2");
        assert_eq!(bus.dropped(), 2);
    }

    #[test]
    fn ring_keeps_newest_entries_in_order() {
        let bus = NotificationBus::new();
        for i in 0..(EVENT_LOG_CAPACITY + 5) {
            bus.post(Severity::Info, None, &format!("e{i}"), i as u64);
        }
        let log = bus.log_snapshot();
        assert_eq!(log.len(), EVENT_LOG_CAPACITY);
        assert_eq!(log[0].text, "e5");
        assert_eq!(log.last().unwrap().text, format!("e{}", EVENT_LOG_CAPACITY + 4));
    }

    #[test]
    fn long_messages_truncate() {
        let bus = NotificationBus::new();
        let long = "x".repeat(500);
        bus.post(Severity::Error, None, &long, 0);
        assert_eq!(bus.take_pending()[0].text.len(), 120);
    }

    #[test]
    fn concurrent_posts_are_not_lost_below_capacity() {
        let bus = Arc::new(NotificationBus::new());
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let bus = Arc::clone(&bus);
                thread::spawn(move || bus.post(Severity::Info, Some(t), "hello", t as u64))
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(bus.take_pending().len(), 4);
        assert_eq!(bus.log_snapshot().len(), 4);
    }
}
