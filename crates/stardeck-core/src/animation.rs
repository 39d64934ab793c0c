//! Easing functions and the millisecond-driven tween.
//!
//! Easing functions map linear progress `t ∈ [0, 1]` to eased progress.
//! Inputs outside the unit interval are clamped, so callers can feed raw
//! `elapsed / duration` ratios without pre-clamping.
//!
//! [`Tween`] is the single animation primitive the scene timeline is built
//! from: an integer endpoint pair plus a duration and easing. It is sampled
//! with *elapsed* milliseconds rather than wall-clock reads, which keeps
//! every animation test deterministic.

/// An easing function mapping linear progress to eased progress.
pub type EasingFn = fn(f32) -> f32;

/// Linear interpolation (no easing).
#[must_use]
pub fn linear(t: f32) -> f32 {
    t.clamp(0.0, 1.0)
}

/// Quadratic ease-in: slow start, fast finish.
#[must_use]
pub fn ease_in(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t
}

/// Quadratic ease-out: fast start, slow finish.
#[must_use]
pub fn ease_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * (2.0 - t)
}

/// Quadratic ease-in-out: slow start and finish.
#[must_use]
pub fn ease_in_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        2.0 * t * t
    } else {
        -1.0 + (4.0 - 2.0 * t) * t
    }
}

/// Cubic ease-out: sharper settle than quadratic.
#[must_use]
pub fn ease_out_cubic(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    let u = 1.0 - t;
    1.0 - u * u * u
}

/// An integer tween between two endpoints over a fixed duration.
#[derive(Debug, Clone, Copy)]
pub struct Tween {
    from: i32,
    to: i32,
    duration_ms: u32,
    easing: EasingFn,
}

impl Tween {
    /// Create a tween. A zero duration completes immediately at `to`.
    #[must_use]
    pub fn new(from: i32, to: i32, duration_ms: u32, easing: EasingFn) -> Self {
        Self {
            from,
            to,
            duration_ms,
            easing,
        }
    }

    #[must_use]
    pub const fn from(&self) -> i32 {
        self.from
    }

    #[must_use]
    pub const fn to(&self) -> i32 {
        self.to
    }

    /// Sample the tween at `elapsed_ms` since its start.
    #[must_use]
    pub fn value_at(&self, elapsed_ms: u64) -> i32 {
        if self.duration_ms == 0 || elapsed_ms >= u64::from(self.duration_ms) {
            return self.to;
        }
        let t = elapsed_ms as f32 / self.duration_ms as f32;
        let eased = (self.easing)(t);
        let span = (self.to - self.from) as f32;
        self.from + (span * eased).round() as i32
    }

    /// Whether the tween has reached its endpoint at `elapsed_ms`.
    #[must_use]
    pub fn is_complete(&self, elapsed_ms: u64) -> bool {
        elapsed_ms >= u64::from(self.duration_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn easing_endpoints() {
        for f in [
            linear as EasingFn,
            ease_in,
            ease_out,
            ease_in_out,
            ease_out_cubic,
        ] {
            assert!((f(0.0) - 0.0).abs() < f32::EPSILON);
            assert!((f(1.0) - 1.0).abs() < f32::EPSILON);
        }
    }

    #[test]
    fn easing_clamps_input() {
        assert!((linear(-1.0) - 0.0).abs() < f32::EPSILON);
        assert!((ease_out(1.5) - 1.0).abs() < f32::EPSILON);
        assert!((ease_in(-0.5) - 0.0).abs() < f32::EPSILON);
    }

    #[test]
    fn ease_out_front_loads_motion() {
        assert!(ease_out(0.5) > linear(0.5));
        assert!(ease_in(0.5) < linear(0.5));
    }

    #[test]
    fn tween_endpoints_and_midpoint() {
        let tw = Tween::new(0, 100, 500, linear);
        assert_eq!(tw.value_at(0), 0);
        assert_eq!(tw.value_at(250), 50);
        assert_eq!(tw.value_at(500), 100);
        assert_eq!(tw.value_at(10_000), 100);
    }

    #[test]
    fn tween_zero_duration_is_instant() {
        let tw = Tween::new(40, 0, 0, ease_out);
        assert_eq!(tw.value_at(0), 0);
        assert!(tw.is_complete(0));
    }

    #[test]
    fn tween_descending_span() {
        let tw = Tween::new(100, 0, 200, linear);
        assert_eq!(tw.value_at(100), 50);
        assert_eq!(tw.value_at(200), 0);
    }
}
