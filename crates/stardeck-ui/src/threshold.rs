//! Metric banding and filter-colour lookup.

use stardeck_style::{Rgba, StyleCache};

use crate::config::{InstanceConfig, Thresholds};

/// Quality band of a metric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    Good,
    Ok,
    Bad,
}

/// Deterministic band for a non-negative magnitude.
#[must_use]
pub fn band(value: f32, thresholds: Thresholds) -> Band {
    if value <= thresholds.good_max {
        Band::Good
    } else if value <= thresholds.ok_max {
        Band::Ok
    } else {
        Band::Bad
    }
}

/// Band colour from the active style cache.
#[must_use]
pub fn band_color(value: f32, thresholds: Thresholds, styles: &StyleCache) -> Rgba {
    match band(value, thresholds) {
        Band::Good => styles.accent_good,
        Band::Ok => styles.accent_ok,
        Band::Bad => styles.accent_bad,
    }
}

/// RMS banding works on magnitudes; thresholds are symmetric.
#[must_use]
pub fn rms_band_color(value: f32, thresholds: Thresholds, styles: &StyleCache) -> Rgba {
    band_color(value.abs(), thresholds, styles)
}

/// Per-instance filter colour, if one is configured and the palette is not
/// forcing its own colours. Callers fall back to palette slots on `None`.
#[must_use]
pub fn filter_color(
    instance: &InstanceConfig,
    filter: &str,
    forced_palette: bool,
) -> Option<Rgba> {
    if forced_palette || filter.is_empty() {
        return None;
    }
    instance
        .filter_colors
        .get(filter)
        .map(|hex| Rgba::from_hex(*hex))
}
