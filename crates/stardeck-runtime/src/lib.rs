#![forbid(unsafe_code)]

//! Cooperative runtime plumbing for the stardeck UI task.
//!
//! The UI runs single-threaded: the outer loop calls the application's tick
//! with the current monotonic time, and everything here is bookkeeping for
//! that tick: periodic timers, the queued touch input, and the two
//! producer-facing channels (telemetry snapshots and the notification bus).
//!
//! Producer tasks never touch scene state. They publish snapshots under a
//! mutex and post notifications into the bus; the UI task drains both at
//! tick boundaries and only then mutates widgets.

pub mod notify;
pub mod scheduler;
pub mod snapshot;

pub use notify::{EVENT_LOG_CAPACITY, INBOX_CAPACITY, Notification, NotificationBus};
pub use scheduler::{InputQueue, TimerId, Timers};
pub use snapshot::SharedSnapshot;
