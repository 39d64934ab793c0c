//! Monotonic-time helpers.
//!
//! All UI state carries explicit millisecond timestamps; only the binary's
//! outer loop reads the real clock through [`monotonic_ms`]. Tests fabricate
//! timestamps directly.

use std::sync::OnceLock;
use std::time::Instant;

static EPOCH: OnceLock<Instant> = OnceLock::new();

/// Milliseconds since process start, monotonic.
#[must_use]
pub fn monotonic_ms() -> u64 {
    let epoch = EPOCH.get_or_init(Instant::now);
    epoch.elapsed().as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monotonic_ms_never_decreases() {
        let a = monotonic_ms();
        let b = monotonic_ms();
        assert!(b >= a);
    }
}
