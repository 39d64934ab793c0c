#![forbid(unsafe_code)]

//! Core primitives for the stardeck dashboard: pixel geometry, easing and
//! tween math, the touch input model, and monotonic-time helpers.
//!
//! Everything here is deterministic and clock-free: animation math takes
//! elapsed milliseconds as an argument so callers (and tests) control time.

pub mod animation;
pub mod event;
pub mod geometry;
pub mod time;

pub use animation::{EasingFn, Tween, ease_in, ease_in_out, ease_out, ease_out_cubic, linear};
pub use event::{InputEvent, SwipeDirection};
pub use geometry::{Point, Rect, Sides};
pub use time::monotonic_ms;
