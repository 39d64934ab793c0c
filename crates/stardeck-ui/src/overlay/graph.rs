//! The full-screen history chart overlay.
//!
//! Shows guider RMS (RA/Dec/Total, symmetric) or HFR (single series,
//! non-negative) with interactive point-count and Y-scale pill rows and a
//! legend. The overlay never fetches anything itself: a point-count or
//! auto-scale change raises a refresh request the data task answers with
//! [`GraphOverlay::set_rms_data`] / [`GraphOverlay::set_hfr_data`]. A fixed
//! Y-scale change recomputes range, labels, and threshold lines locally.

use stardeck_core::geometry::{Rect, Sides};
use stardeck_scene::{
    Axis, ChartSeries, LayoutSpec, NodeFlags, NodeId, NodeKind, SceneTree, SizePolicy,
};
use stardeck_style::{FontTier, Rgba, Style};
use tracing::debug;

use crate::config::Thresholds;
use crate::format;
use crate::overlay::graph_range::{
    HFR_SCALES, POINT_COUNTS, RMS_SCALES, auto_hfr_range, auto_rms_range, hfr_y_labels,
    rms_y_labels,
};
use crate::pages::{make_card, make_label};
use crate::telemetry::{HfrHistory, RmsHistory};
use crate::theme::ThemeState;

/// Which metric the overlay charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphKind {
    Rms,
    Hfr,
}

/// Outstanding fetch the data task should answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphRequest {
    pub kind: GraphKind,
    pub instance: usize,
    pub point_count: usize,
}

/// What a tap inside the overlay resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphTap {
    /// Close and route back to `return_page`.
    Back,
    /// State changed and a refetch is wanted.
    Refresh,
    /// State changed locally, nothing to fetch.
    Handled,
    /// Not ours.
    None,
}

/// Series slots. RMS uses 0–2, HFR uses 3.
const SERIES_RA: usize = 0;
const SERIES_DEC: usize = 1;
const SERIES_TOTAL: usize = 2;
const SERIES_HFR: usize = 3;

const HIDDEN_PILL_OPACITY: u8 = 30;

/// The graph overlay.
pub struct GraphOverlay {
    root: NodeId,
    title: NodeId,
    back: NodeId,
    chart: NodeId,
    y_labels: [NodeId; 5],
    caption: NodeId,
    loading: NodeId,
    point_pills: Vec<(NodeId, usize)>,
    scale_row: NodeId,
    scale_pills: Vec<(NodeId, Option<i32>)>,
    legend_row: NodeId,
    legend_pills: Vec<(NodeId, usize)>,

    kind: GraphKind,
    instance: usize,
    return_page: usize,
    point_count: usize,
    /// `None` is auto.
    y_scale: Option<i32>,
    range: i32,
    refresh_requested: bool,
    visible: bool,
}

impl GraphOverlay {
    pub fn build(tree: &mut SceneTree, theme: &ThemeState) -> Self {
        let viewport = tree.viewport();
        let root = tree.create(NodeKind::Container, tree.root());
        tree.set_flag(root, NodeFlags::FLOATING, true);
        tree.set_rect(root, viewport);
        tree.set_hidden(root, true);
        tree.set_style(
            root,
            Style {
                bg: Some(theme.styles.background),
                ..Style::default()
            },
        );
        tree.set_layout(
            root,
            LayoutSpec::Flex {
                axis: Axis::Vertical,
                gap: 8,
                padding: Sides::all(12),
            },
        );

        let header = tree.create(NodeKind::Container, root);
        tree.set_size(header, SizePolicy::fixed_height(48));
        tree.set_layout(
            header,
            LayoutSpec::Flex {
                axis: Axis::Horizontal,
                gap: 8,
                padding: Sides::all(4),
            },
        );
        let back = tree.create(NodeKind::Button, header);
        tree.set_size(back, SizePolicy::fixed(72, 40));
        tree.set_flag(back, NodeFlags::CLICKABLE, true);
        tree.set_text(back, "\u{2039} Back");
        let title = make_label(tree, header, Style::text(theme.styles.text, FontTier::Large));

        let chart_card = make_card(tree, root, theme);
        tree.set_layout(chart_card, LayoutSpec::Manual);
        let chart = tree.create(NodeKind::Chart, chart_card);
        tree.set_flag(chart, NodeFlags::FLOATING, true);
        tree.set_rect(chart, Rect::new(80, 80, 620, 380));
        if let Some(data) = tree.chart_mut(chart) {
            data.series = vec![
                ChartSeries::new("RA", Rgba::WHITE),
                ChartSeries::new("Dec", Rgba::WHITE),
                ChartSeries::new("Tot", Rgba::WHITE),
                ChartSeries::new("HFR", Rgba::WHITE),
            ];
        }

        // Axis labels float in the chart's left gutter, equally spaced.
        let y_labels: [NodeId; 5] = std::array::from_fn(|i| {
            let label = make_label(tree, chart_card, theme.styles.small_label);
            tree.set_flag(label, NodeFlags::FLOATING, true);
            tree.set_rect(label, Rect::new(16, 72 + (i as i32) * 92, 60, 22));
            label
        });

        let loading = make_label(tree, chart_card, Style::text(theme.styles.label, FontTier::Medium));
        tree.set_flag(loading, NodeFlags::FLOATING, true);
        tree.set_rect(loading, Rect::new(240, 240, 300, 30));
        tree.set_text(loading, "Loading graph data\u{2026}");

        let caption = make_label(tree, root, theme.styles.small_label);
        tree.set_size(caption, SizePolicy::fixed_height(26));

        let point_row = tree.create(NodeKind::Container, root);
        tree.set_size(point_row, SizePolicy::fixed_height(44));
        tree.set_layout(
            point_row,
            LayoutSpec::Flex {
                axis: Axis::Horizontal,
                gap: 8,
                padding: Sides::all(2),
            },
        );
        let mut point_pills = Vec::new();
        for count in POINT_COUNTS {
            let pill = pill(tree, point_row, theme, &count.to_string());
            point_pills.push((pill, *count));
        }

        let scale_row = tree.create(NodeKind::Container, root);
        tree.set_size(scale_row, SizePolicy::fixed_height(44));
        tree.set_layout(
            scale_row,
            LayoutSpec::Flex {
                axis: Axis::Horizontal,
                gap: 8,
                padding: Sides::all(2),
            },
        );

        let legend_row = tree.create(NodeKind::Container, root);
        tree.set_size(legend_row, SizePolicy::fixed_height(44));
        tree.set_layout(
            legend_row,
            LayoutSpec::Flex {
                axis: Axis::Horizontal,
                gap: 8,
                padding: Sides::all(2),
            },
        );

        Self {
            root,
            title,
            back,
            chart,
            y_labels,
            caption,
            loading,
            point_pills,
            scale_row,
            scale_pills: Vec::new(),
            legend_row,
            legend_pills: Vec::new(),
            kind: GraphKind::Rms,
            instance: 0,
            return_page: 0,
            point_count: 100,
            y_scale: None,
            range: 100,
            refresh_requested: false,
            visible: false,
        }
    }

    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.visible
    }

    #[must_use]
    pub const fn return_page(&self) -> usize {
        self.return_page
    }

    #[must_use]
    pub const fn range(&self) -> i32 {
        self.range
    }

    /// Open for one instance and metric. Series are cleared, Total starts
    /// hidden, and a refresh request is raised.
    pub fn open(
        &mut self,
        tree: &mut SceneTree,
        theme: &ThemeState,
        kind: GraphKind,
        instance: usize,
        return_page: usize,
    ) {
        debug!(?kind, instance, "graph overlay open");
        self.kind = kind;
        self.instance = instance;
        self.return_page = return_page;
        self.y_scale = None;
        self.visible = true;
        self.refresh_requested = true;

        tree.set_hidden(self.root, false);
        tree.set_hidden(self.loading, false);
        tree.set_text(
            self.title,
            match kind {
                GraphKind::Rms => "Guiding history",
                GraphKind::Hfr => "Focus history",
            },
        );
        tree.set_text(self.caption, "");

        let colors = series_colors(theme);
        if let Some(data) = tree.chart_mut(self.chart) {
            data.clear_points();
            data.x_count = self.point_count;
            for (i, color) in colors.iter().enumerate() {
                if let Some(s) = data.series.get_mut(i) {
                    s.color = *color;
                }
            }
            match kind {
                GraphKind::Rms => {
                    data.set_series_hidden(SERIES_RA, false);
                    data.set_series_hidden(SERIES_DEC, false);
                    // Default-hidden policy: Total starts off every open.
                    data.set_series_hidden(SERIES_TOTAL, true);
                    data.set_series_hidden(SERIES_HFR, true);
                }
                GraphKind::Hfr => {
                    data.set_series_hidden(SERIES_RA, true);
                    data.set_series_hidden(SERIES_DEC, true);
                    data.set_series_hidden(SERIES_TOTAL, true);
                    data.set_series_hidden(SERIES_HFR, false);
                }
            }
        }

        self.rebuild_controls(tree, theme);
    }

    /// Hide and drop any outstanding refresh request.
    pub fn close(&mut self, tree: &mut SceneTree) {
        self.visible = false;
        self.refresh_requested = false;
        tree.set_hidden(self.root, true);
    }

    /// Outstanding request, if any, cleared on take.
    pub fn take_refresh_request(&mut self) -> Option<GraphRequest> {
        if self.visible && self.refresh_requested {
            self.refresh_requested = false;
            Some(GraphRequest {
                kind: self.kind,
                instance: self.instance,
                point_count: self.point_count,
            })
        } else {
            None
        }
    }

    /// Route a tap on one of the overlay's nodes.
    pub fn on_tap(&mut self, tree: &mut SceneTree, theme: &ThemeState, node: NodeId) -> GraphTap {
        if !self.visible {
            return GraphTap::None;
        }
        if node == self.back {
            self.close(tree);
            return GraphTap::Back;
        }
        if let Some((_, count)) = self.point_pills.iter().find(|(p, _)| *p == node).copied() {
            if count != self.point_count {
                self.point_count = count;
                if let Some(data) = tree.chart_mut(self.chart) {
                    data.clear_points();
                    data.x_count = count;
                }
                tree.set_hidden(self.loading, false);
                self.refresh_requested = true;
                self.style_pill_rows(tree, theme);
            }
            return GraphTap::Refresh;
        }
        if let Some((_, scale)) = self.scale_pills.iter().find(|(p, _)| *p == node).copied() {
            self.y_scale = scale;
            self.style_pill_rows(tree, theme);
            return match scale {
                // Auto depends on the sample set; refetch.
                None => {
                    self.refresh_requested = true;
                    GraphTap::Refresh
                }
                Some(fixed) => {
                    self.apply_range(tree, theme, fixed);
                    GraphTap::Handled
                }
            };
        }
        if let Some((_, series)) = self.legend_pills.iter().find(|(p, _)| *p == node).copied() {
            let hidden = if let Some(data) = tree.chart_mut(self.chart) {
                let hidden = !data.series_hidden(series);
                data.set_series_hidden(series, hidden);
                hidden
            } else {
                false
            };
            tree.set_opacity(node, if hidden { HIDDEN_PILL_OPACITY } else { 100 });
            return GraphTap::Handled;
        }
        GraphTap::None
    }

    /// Populate from an RMS history fetch.
    pub fn set_rms_data(
        &mut self,
        tree: &mut SceneTree,
        theme: &ThemeState,
        thresholds: Thresholds,
        history: &RmsHistory,
    ) {
        if self.kind != GraphKind::Rms {
            return;
        }
        let centi = |v: &f32| (*v * 100.0).round() as i32;
        let ra: Vec<i32> = history.ra.iter().map(centi).collect();
        let dec: Vec<i32> = history.dec.iter().map(centi).collect();
        let total: Vec<i32> = history
            .ra
            .iter()
            .zip(&history.dec)
            .map(|(r, d)| ((r * r + d * d).sqrt() * 100.0).round() as i32)
            .collect();
        if let Some(data) = tree.chart_mut(self.chart) {
            data.set_points(SERIES_RA, &ra);
            data.set_points(SERIES_DEC, &dec);
            data.set_points(SERIES_TOTAL, &total);
        }
        let range = self
            .y_scale
            .unwrap_or_else(|| auto_rms_range(&history.ra, &history.dec));
        self.set_symmetric_range(tree, theme, range, thresholds);
        tree.set_hidden(self.loading, true);
        tree.set_text(
            self.caption,
            &format!(
                "RA {}  DEC {}  TOT {}",
                format::arcsec(history.rms_ra),
                format::arcsec(history.rms_dec),
                format::arcsec(history.rms_total),
            ),
        );
    }

    /// Populate from an HFR history fetch.
    pub fn set_hfr_data(
        &mut self,
        tree: &mut SceneTree,
        theme: &ThemeState,
        thresholds: Thresholds,
        history: &HfrHistory,
    ) {
        if self.kind != GraphKind::Hfr {
            return;
        }
        let points: Vec<i32> = history.hfr.iter().map(|v| (v * 100.0).round() as i32).collect();
        if let Some(data) = tree.chart_mut(self.chart) {
            data.set_points(SERIES_HFR, &points);
        }
        let range = self.y_scale.unwrap_or_else(|| auto_hfr_range(&history.hfr));
        self.set_positive_range(tree, theme, range, thresholds);
        tree.set_hidden(self.loading, true);
        let latest = history.hfr.last().copied().unwrap_or(0.0);
        tree.set_text(self.caption, &format!("HFR {} (latest)", format::hfr(latest)));
    }

    /// Recompute range, labels, and thresholds for a fixed scale without a
    /// refetch. Threshold colours come from the active styles.
    fn apply_range(&mut self, tree: &mut SceneTree, theme: &ThemeState, range: i32) {
        // Threshold values were installed with the last data set; reuse
        // them by re-applying the stored pair.
        let thresholds = self.last_thresholds(tree);
        match self.kind {
            GraphKind::Rms => self.set_symmetric_range(tree, theme, range, thresholds),
            GraphKind::Hfr => self.set_positive_range(tree, theme, range, thresholds),
        }
    }

    /// Best-effort recovery of the threshold pair from the chart's lines.
    fn last_thresholds(&self, tree: &SceneTree) -> Thresholds {
        let lines = tree
            .chart(self.chart)
            .map(|d| d.thresholds.clone())
            .unwrap_or_default();
        let mut values: Vec<i32> = lines.iter().map(|l| l.y.abs()).filter(|y| *y > 0).collect();
        values.sort_unstable();
        values.dedup();
        match values.as_slice() {
            [good, ok, ..] => Thresholds {
                good_max: *good as f32 / 100.0,
                ok_max: *ok as f32 / 100.0,
            },
            [one] => Thresholds {
                good_max: *one as f32 / 100.0,
                ok_max: *one as f32 / 100.0,
            },
            [] => match self.kind {
                GraphKind::Rms => Thresholds::rms_default(),
                GraphKind::Hfr => Thresholds::hfr_default(),
            },
        }
    }

    fn set_symmetric_range(
        &mut self,
        tree: &mut SceneTree,
        theme: &ThemeState,
        range: i32,
        thresholds: Thresholds,
    ) {
        self.range = range;
        let good = (thresholds.good_max * 100.0).round() as i32;
        let ok = (thresholds.ok_max * 100.0).round() as i32;
        if let Some(data) = tree.chart_mut(self.chart) {
            data.set_range(-range, range);
            data.set_thresholds(&[
                (good, theme.styles.accent_good),
                (-good, theme.styles.accent_good),
                (ok, theme.styles.accent_ok),
                (-ok, theme.styles.accent_ok),
            ]);
        }
        for (label, text) in self.y_labels.iter().zip(rms_y_labels(range)) {
            tree.set_text(*label, &text);
        }
    }

    fn set_positive_range(
        &mut self,
        tree: &mut SceneTree,
        theme: &ThemeState,
        range: i32,
        thresholds: Thresholds,
    ) {
        self.range = range;
        let good = (thresholds.good_max * 100.0).round() as i32;
        let ok = (thresholds.ok_max * 100.0).round() as i32;
        if let Some(data) = tree.chart_mut(self.chart) {
            data.set_range(0, range);
            data.set_thresholds(&[
                (good, theme.styles.accent_good),
                (ok, theme.styles.accent_ok),
            ]);
        }
        for (label, text) in self.y_labels.iter().zip(hfr_y_labels(range)) {
            tree.set_text(*label, &text);
        }
    }

    /// Rebuild the kind-specific pill rows (scales, legend).
    fn rebuild_controls(&mut self, tree: &mut SceneTree, theme: &ThemeState) {
        tree.clear_children(self.scale_row);
        self.scale_pills.clear();
        let auto = pill(tree, self.scale_row, theme, "Auto");
        self.scale_pills.push((auto, None));
        let scales: &[i32] = match self.kind {
            GraphKind::Rms => RMS_SCALES,
            GraphKind::Hfr => HFR_SCALES,
        };
        for scale in scales {
            let text = match self.kind {
                GraphKind::Rms => format!("{}\"", scale / 100),
                GraphKind::Hfr => format!("{}", scale / 100),
            };
            let p = pill(tree, self.scale_row, theme, &text);
            self.scale_pills.push((p, Some(*scale)));
        }

        tree.clear_children(self.legend_row);
        self.legend_pills.clear();
        let entries: &[(&str, usize)] = match self.kind {
            GraphKind::Rms => &[("RA", SERIES_RA), ("Dec", SERIES_DEC), ("Total", SERIES_TOTAL)],
            GraphKind::Hfr => &[("HFR", SERIES_HFR)],
        };
        for (name, series) in entries {
            let p = pill(tree, self.legend_row, theme, name);
            if tree.chart(self.chart).is_some_and(|d| d.series_hidden(*series)) {
                tree.set_opacity(p, HIDDEN_PILL_OPACITY);
            }
            self.legend_pills.push((p, *series));
        }

        self.style_pill_rows(tree, theme);
    }

    /// Highlight the selected point-count and scale pills.
    fn style_pill_rows(&self, tree: &mut SceneTree, theme: &ThemeState) {
        for (node, count) in &self.point_pills {
            let selected = *count == self.point_count;
            style_pill(tree, theme, *node, selected);
        }
        for (node, scale) in &self.scale_pills {
            let selected = *scale == self.y_scale;
            style_pill(tree, theme, *node, selected);
        }
    }

    pub fn retheme(&mut self, tree: &mut SceneTree, theme: &ThemeState) {
        tree.set_style(
            self.root,
            Style {
                bg: Some(theme.styles.background),
                ..Style::default()
            },
        );
        tree.set_style(self.title, Style::text(theme.styles.text, FontTier::Large));
        tree.set_style(self.caption, theme.styles.small_label);
        for label in self.y_labels {
            tree.set_style(label, theme.styles.small_label);
        }
        let colors = series_colors(theme);
        if let Some(data) = tree.chart_mut(self.chart) {
            for (i, color) in colors.iter().enumerate() {
                if let Some(s) = data.series.get_mut(i) {
                    s.color = *color;
                }
            }
        }
        if self.visible {
            self.style_pill_rows(tree, theme);
        }
    }
}

/// Per-series colours; the night-red palette remaps everything to
/// distinguishable red shades.
fn series_colors(theme: &ThemeState) -> [Rgba; 4] {
    if theme.forces_palette_colors() {
        [
            Rgba::rgb(255, 84, 84),
            Rgba::rgb(140, 16, 32),
            Rgba::rgb(120, 40, 40),
            Rgba::rgb(200, 36, 36),
        ]
    } else {
        [
            Rgba::rgb(86, 156, 255),
            Rgba::rgb(255, 140, 80),
            Rgba::rgb(160, 168, 184),
            Rgba::rgb(96, 192, 128),
        ]
    }
}

fn pill(tree: &mut SceneTree, parent: NodeId, theme: &ThemeState, text: &str) -> NodeId {
    let p = tree.create(NodeKind::Button, parent);
    tree.set_flag(p, NodeFlags::CLICKABLE, true);
    tree.set_text(p, text);
    style_pill(tree, theme, p, false);
    p
}

fn style_pill(tree: &mut SceneTree, theme: &ThemeState, node: NodeId, selected: bool) {
    let (bg, fg) = if selected {
        (theme.styles.progress, theme.styles.background)
    } else {
        (theme.styles.border, theme.styles.text)
    };
    tree.set_style(
        node,
        Style {
            bg: Some(bg),
            text_color: Some(fg),
            radius: 16,
            ..Style::default()
        },
    );
}
