//! Tick bookkeeping: periodic timers and the input-dispatch queue.
//!
//! There is no hidden event loop. The binary owns the outer loop; each pass
//! it asks [`Timers::due`] which periodic jobs fire at the current time and
//! drains [`InputQueue`]. Timers never fire concurrently with anything;
//! the whole UI shares one cooperative thread.

use std::collections::VecDeque;
use std::sync::Mutex;

use stardeck_core::event::InputEvent;
use tracing::debug;

/// Identifies a registered periodic timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(usize);

#[derive(Debug)]
struct Timer {
    period_ms: u64,
    next_due_ms: u64,
    enabled: bool,
}

/// Periodic timer table.
#[derive(Debug, Default)]
pub struct Timers {
    timers: Vec<Timer>,
}

impl Timers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a periodic timer first due one period from `now_ms`.
    pub fn register(&mut self, period_ms: u64, now_ms: u64) -> TimerId {
        let id = TimerId(self.timers.len());
        debug!(period_ms, "timer registered");
        self.timers.push(Timer {
            period_ms,
            next_due_ms: now_ms + period_ms,
            enabled: true,
        });
        id
    }

    pub fn set_enabled(&mut self, id: TimerId, enabled: bool, now_ms: u64) {
        if let Some(t) = self.timers.get_mut(id.0) {
            t.enabled = enabled;
            if enabled {
                t.next_due_ms = now_ms + t.period_ms;
            }
        }
    }

    /// Change a timer's period, rescheduling from `now_ms`.
    pub fn set_period(&mut self, id: TimerId, period_ms: u64, now_ms: u64) {
        if let Some(t) = self.timers.get_mut(id.0) {
            t.period_ms = period_ms;
            t.next_due_ms = now_ms + period_ms;
        }
    }

    /// Push a timer's next due time out a full period (a user interaction
    /// resetting the auto-rotate clock).
    pub fn reset(&mut self, id: TimerId, now_ms: u64) {
        if let Some(t) = self.timers.get_mut(id.0) {
            t.next_due_ms = now_ms + t.period_ms;
        }
    }

    /// Timers due at `now_ms`, each advanced by its period. A timer fires at
    /// most once per call even after a long stall; missed periods collapse.
    pub fn due(&mut self, now_ms: u64) -> Vec<TimerId> {
        let mut fired = Vec::new();
        for (i, t) in self.timers.iter_mut().enumerate() {
            if t.enabled && now_ms >= t.next_due_ms {
                fired.push(TimerId(i));
                let mut next = t.next_due_ms + t.period_ms;
                if next <= now_ms {
                    next = now_ms + t.period_ms;
                }
                t.next_due_ms = next;
            }
        }
        fired
    }
}

/// Queued touch input, producer-safe.
///
/// The digitizer interrupt path pushes; the UI tick drains. Bounded so a
/// stalled UI never accumulates stale gestures.
#[derive(Debug, Default)]
pub struct InputQueue {
    queue: Mutex<VecDeque<InputEvent>>,
}

const INPUT_QUEUE_CAPACITY: usize = 32;

impl InputQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an event; the oldest is dropped when full.
    pub fn push(&self, event: InputEvent) {
        let mut q = self.queue.lock().unwrap_or_else(|e| e.into_inner());
        if q.len() >= INPUT_QUEUE_CAPACITY {
            q.pop_front();
        }
        q.push_back(event);
    }

    /// Drain everything queued, in arrival order. UI task only.
    #[must_use]
    pub fn drain(&self) -> Vec<InputEvent> {
        let mut q = self.queue.lock().unwrap_or_else(|e| e.into_inner());
        q.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stardeck_core::event::SwipeDirection;
    use stardeck_core::geometry::Point;

    #[test]
    fn timer_fires_on_schedule() {
        let mut timers = Timers::new();
        let id = timers.register(200, 1_000);
        assert!(timers.due(1_100).is_empty());
        assert_eq!(timers.due(1_200), vec![id]);
        assert!(timers.due(1_250).is_empty());
        assert_eq!(timers.due(1_400), vec![id]);
    }

    #[test]
    fn stalled_timer_fires_once_and_recovers() {
        let mut timers = Timers::new();
        let id = timers.register(200, 0);
        // Long stall: five periods missed, one fire.
        assert_eq!(timers.due(1_100), vec![id]);
        assert!(timers.due(1_150).is_empty());
        assert_eq!(timers.due(1_300), vec![id]);
    }

    #[test]
    fn reset_defers_next_fire() {
        let mut timers = Timers::new();
        let id = timers.register(1_000, 0);
        timers.reset(id, 900);
        assert!(timers.due(1_000).is_empty());
        assert_eq!(timers.due(1_900), vec![id]);
    }

    #[test]
    fn disabled_timer_stays_quiet() {
        let mut timers = Timers::new();
        let id = timers.register(100, 0);
        timers.set_enabled(id, false, 0);
        assert!(timers.due(10_000).is_empty());
        timers.set_enabled(id, true, 10_000);
        assert_eq!(timers.due(10_100), vec![id]);
    }

    #[test]
    fn input_queue_bounds_and_orders() {
        let q = InputQueue::new();
        for _ in 0..40 {
            q.push(InputEvent::Swipe {
                dir: SwipeDirection::Left,
                start: Point::default(),
            });
        }
        let drained = q.drain();
        assert_eq!(drained.len(), 32);
        assert!(q.drain().is_empty());
    }
}
