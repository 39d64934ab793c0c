//! Y-range policy and axis-label formatting for the history chart.
//!
//! All ranges are ×100 fixed-point. RMS ranges are symmetric around zero;
//! HFR ranges are non-negative.

/// Fixed RMS scales, arcsec ×100. Each is applied symmetrically.
pub const RMS_SCALES: &[i32] = &[100, 200, 400, 800, 1600];

/// Fixed HFR scales, ×100. Each sets the positive bound.
pub const HFR_SCALES: &[i32] = &[200, 400, 800, 1600];

/// Selectable history lengths.
pub const POINT_COUNTS: &[usize] = &[25, 50, 100, 200, 400];

/// Auto range for RMS samples: the larger axis magnitude with a 0.5″
/// floor, scaled by 120 % plus 0.5″ headroom, never under 1.00″.
#[must_use]
pub fn auto_rms_range(ra: &[f32], dec: &[f32]) -> i32 {
    let max_val = ra
        .iter()
        .chain(dec)
        .map(|v| v.abs())
        .fold(0.5f32, f32::max);
    let scaled = f64::from(max_val) * 1.2 + 0.5;
    ((scaled * 100.0).ceil() as i32).max(100)
}

/// Auto range for HFR samples: 120 % of the maximum with a 1.0 floor,
/// never under 2.00.
#[must_use]
pub fn auto_hfr_range(hfr: &[f32]) -> i32 {
    let max_val = hfr.iter().copied().fold(1.0f32, f32::max);
    ((f64::from(max_val) * 1.2 * 100.0).ceil() as i32).max(200)
}

/// Five RMS axis labels, top to bottom: `+R`, `+R/2`, `0"`, `−R/2`, `−R`.
#[must_use]
pub fn rms_y_labels(range: i32) -> [String; 5] {
    let arcsec = |c: i32| format!("{:+.1}\"", f64::from(c) / 100.0);
    [
        arcsec(range),
        arcsec(range / 2),
        "0\"".to_owned(),
        arcsec(-(range / 2)),
        arcsec(-range),
    ]
}

/// Five HFR axis labels, top to bottom: `R`, `0.75R`, `0.5R`, `0.25R`, `0`.
#[must_use]
pub fn hfr_y_labels(range: i32) -> [String; 5] {
    let hfr = |c: i32| format!("{:.1}", f64::from(c) / 100.0);
    [
        hfr(range),
        hfr(range * 3 / 4),
        hfr(range / 2),
        hfr(range / 4),
        "0".to_owned(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn rms_auto_range_floors_at_one_arcsec() {
        // Tiny deviations: floor 0.5″ → 1.2·0.5 + 0.5 = 1.1″.
        assert_eq!(auto_rms_range(&[0.1, -0.05], &[0.02]), 110);
        assert_eq!(auto_rms_range(&[], &[]), 110);
    }

    #[test]
    fn rms_auto_range_tracks_worst_axis() {
        // max |v| = 2.0 → 1.2·2.0 + 0.5 = 2.9″.
        assert_eq!(auto_rms_range(&[0.2], &[-2.0]), 290);
    }

    #[test]
    fn hfr_auto_range_floors_at_two() {
        assert_eq!(auto_hfr_range(&[0.4]), 200);
        assert_eq!(auto_hfr_range(&[]), 200);
        // 1.2 · 3.0 = 3.6.
        assert_eq!(auto_hfr_range(&[3.0, 1.0]), 360);
    }

    #[test]
    fn rms_labels_match_fixed_four_arcsec() {
        assert_eq!(
            rms_y_labels(400),
            [
                "+4.0\"".to_owned(),
                "+2.0\"".to_owned(),
                "0\"".to_owned(),
                "-2.0\"".to_owned(),
                "-4.0\"".to_owned(),
            ]
        );
    }

    #[test]
    fn hfr_labels_quarter_the_range() {
        assert_eq!(
            hfr_y_labels(400),
            [
                "4.0".to_owned(),
                "3.0".to_owned(),
                "2.0".to_owned(),
                "1.0".to_owned(),
                "0".to_owned(),
            ]
        );
    }

    proptest! {
        #[test]
        fn rms_range_law(samples in prop::collection::vec(-20.0f32..20.0, 0..64)) {
            let r = auto_rms_range(&samples, &[]);
            prop_assert!(r >= 100);
            let max_abs = samples.iter().map(|v| v.abs()).fold(0.0f32, f32::max);
            let needed = ((f64::from(max_abs) * 1.2 + 0.5) * 100.0).ceil() as i32;
            prop_assert!(r >= needed);
        }

        #[test]
        fn hfr_range_law(samples in prop::collection::vec(0.0f32..30.0, 0..64)) {
            let r = auto_hfr_range(&samples);
            prop_assert!(r >= 200);
            let max = samples.iter().copied().fold(0.0f32, f32::max);
            prop_assert!(f64::from(r) >= f64::from(max) * 1.2 * 100.0 - 1.0);
        }
    }
}
