//! Line-chart payload carried by chart nodes.
//!
//! Values are stored as ×100 fixed-point integers (arcseconds or HFR) so
//! animation and range maths stay integral. X coordinates are implicit point
//! indices; the renderer spaces `x_count` points across the data region.

use stardeck_style::Rgba;

/// One plotted series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartSeries {
    pub name: &'static str,
    pub color: Rgba,
    pub hidden: bool,
    /// ×100 fixed-point samples, oldest first.
    pub points: Vec<i32>,
}

impl ChartSeries {
    #[must_use]
    pub fn new(name: &'static str, color: Rgba) -> Self {
        Self {
            name,
            color,
            hidden: false,
            points: Vec::new(),
        }
    }
}

/// A dashed horizontal threshold segment spanning the data region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdLine {
    /// ×100 fixed-point Y position.
    pub y: i32,
    pub color: Rgba,
    /// Out-of-range lines are kept but hidden.
    pub hidden: bool,
}

/// Payload of a chart node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChartData {
    pub series: Vec<ChartSeries>,
    /// Rendered Y range, ×100.
    pub y_min: i32,
    pub y_max: i32,
    /// Points spaced across the X axis.
    pub x_count: usize,
    pub thresholds: Vec<ThresholdLine>,
}

impl ChartData {
    /// Replace one series' samples, leaving colour/visibility alone.
    pub fn set_points(&mut self, series: usize, points: &[i32]) {
        if let Some(s) = self.series.get_mut(series) {
            s.points.clear();
            s.points.extend_from_slice(points);
        }
    }

    /// Drop every sample from every series.
    pub fn clear_points(&mut self) {
        for s in &mut self.series {
            s.points.clear();
        }
    }

    pub fn set_series_hidden(&mut self, series: usize, hidden: bool) {
        if let Some(s) = self.series.get_mut(series) {
            s.hidden = hidden;
        }
    }

    #[must_use]
    pub fn series_hidden(&self, series: usize) -> bool {
        self.series.get(series).is_none_or(|s| s.hidden)
    }

    /// Set the rendered Y range and re-evaluate threshold visibility.
    pub fn set_range(&mut self, y_min: i32, y_max: i32) {
        self.y_min = y_min;
        self.y_max = y_max;
        for t in &mut self.thresholds {
            t.hidden = t.y < y_min || t.y > y_max;
        }
    }

    /// Replace the threshold set, hiding lines outside the current range.
    pub fn set_thresholds(&mut self, lines: &[(i32, Rgba)]) {
        self.thresholds = lines
            .iter()
            .map(|&(y, color)| ThresholdLine {
                y,
                color,
                hidden: y < self.y_min || y > self.y_max,
            })
            .collect();
    }

    #[must_use]
    pub fn has_samples(&self) -> bool {
        self.series.iter().any(|s| !s.points.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chart() -> ChartData {
        let mut c = ChartData::default();
        c.series.push(ChartSeries::new("RA", Rgba::rgb(80, 160, 255)));
        c.series.push(ChartSeries::new("Dec", Rgba::rgb(255, 120, 80)));
        c
    }

    #[test]
    fn set_points_keeps_visibility() {
        let mut c = chart();
        c.set_series_hidden(1, true);
        c.set_points(1, &[10, -20, 30]);
        assert!(c.series[1].hidden);
        assert_eq!(c.series[1].points, vec![10, -20, 30]);
    }

    #[test]
    fn out_of_range_thresholds_hide_and_rehide_on_range_change() {
        let mut c = chart();
        c.set_range(-200, 200);
        c.set_thresholds(&[(50, Rgba::WHITE), (-50, Rgba::WHITE), (400, Rgba::WHITE)]);
        assert!(!c.thresholds[0].hidden);
        assert!(!c.thresholds[1].hidden);
        assert!(c.thresholds[2].hidden);
        c.set_range(-800, 800);
        assert!(!c.thresholds[2].hidden);
    }

    #[test]
    fn clear_points_empties_all_series() {
        let mut c = chart();
        c.set_points(0, &[1, 2]);
        assert!(c.has_samples());
        c.clear_points();
        assert!(!c.has_samples());
    }

    #[test]
    fn missing_series_index_is_silent() {
        let mut c = chart();
        c.set_points(9, &[1]);
        c.set_series_hidden(9, true);
        assert!(c.series_hidden(9));
    }
}
