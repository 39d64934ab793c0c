//! Text formatting shared by pages and overlays.
//!
//! Every formatter returns the `"--"` placeholder for missing input; the
//! pages never special-case empties themselves.

/// The missing-data placeholder.
pub const PLACEHOLDER: &str = "--";

/// Arcseconds with two decimals and the unit mark, e.g. `0.57"`.
#[must_use]
pub fn arcsec(v: f32) -> String {
    format!("{v:.2}\"")
}

/// Arcseconds from a ×100 fixed-point value.
#[must_use]
pub fn arcsec_centi(c: i32) -> String {
    arcsec(c as f32 / 100.0)
}

/// HFR with two decimals.
#[must_use]
pub fn hfr(v: f32) -> String {
    format!("{v:.2}")
}

/// HFR from a ×100 fixed-point value.
#[must_use]
pub fn hfr_centi(c: i32) -> String {
    hfr(c as f32 / 100.0)
}

/// Exposure seconds, whole numbers below a minute keep one style: `42s`,
/// `120s`.
#[must_use]
pub fn seconds(v: f32) -> String {
    format!("{}s", v.max(0.0).round() as i64)
}

/// Reformat an `"HH:MM"` countdown as `"Hh MMm"`. `"--"`, empty, and
/// non-numeric strings (e.g. `"FLIPPING"`) pass through unchanged.
#[must_use]
pub fn flip_countdown(raw: &str) -> String {
    let Some((h, m)) = raw.split_once(':') else {
        return if raw.is_empty() {
            PLACEHOLDER.to_owned()
        } else {
            raw.to_owned()
        };
    };
    match (h.parse::<u32>(), m.parse::<u32>()) {
        (Ok(h), Ok(m)) => format!("{h}h {m:02}m"),
        _ => raw.to_owned(),
    }
}

/// `"Last update: Xs ago"` staleness caption.
#[must_use]
pub fn staleness_caption(age_ms: u64) -> String {
    format!("Last update: {}s ago", age_ms / 1000)
}

/// Upper-cased power channel name, truncated to keep row labels bounded.
#[must_use]
pub fn power_name(name: &str) -> String {
    let mut s = name.to_uppercase();
    s.truncate(12);
    s
}

/// `text` or the placeholder when empty.
#[must_use]
pub fn or_placeholder(text: &str) -> &str {
    if text.is_empty() { PLACEHOLDER } else { text }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flip_countdown_reformats_clock_strings() {
        assert_eq!(flip_countdown("02:35"), "2h 35m");
        assert_eq!(flip_countdown("0:05"), "0h 05m");
    }

    #[test]
    fn flip_countdown_passes_non_clock_strings() {
        assert_eq!(flip_countdown("FLIPPING"), "FLIPPING");
        assert_eq!(flip_countdown("--"), "--");
        assert_eq!(flip_countdown(""), "--");
    }

    #[test]
    fn arcsec_fixed_point_matches_float() {
        assert_eq!(arcsec_centi(57), "0.57\"");
        assert_eq!(arcsec_centi(-123), "-1.23\"");
    }

    #[test]
    fn staleness_caption_counts_whole_seconds() {
        assert_eq!(staleness_caption(45_700), "Last update: 45s ago");
    }

    #[test]
    fn power_name_uppercases_and_bounds() {
        assert_eq!(power_name("dew heater a"), "DEW HEATER A");
        assert_eq!(power_name("a very long channel name").len(), 12);
    }
}
