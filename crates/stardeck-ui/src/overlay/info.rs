//! Detail overlays: one frame, a dispatch table of content builders.
//!
//! Every kind shares the chrome (title, loading indicator, floating back
//! button, content slot). Content is built on first show of a kind and
//! reused while the same kind reopens; showing a different kind tears the
//! previous content down, and a theme change invalidates the cache via the
//! theme epoch.

use stardeck_core::geometry::{Rect, Sides};
use stardeck_scene::{
    Axis, ChartSeries, LayoutSpec, NodeFlags, NodeId, NodeKind, SceneTree, SizePolicy,
};
use stardeck_style::{FontTier, Rgba, Style};
use tracing::debug;

use crate::format;
use crate::pages::make_label;
use crate::theme::ThemeState;

/// Overlay content kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InfoKind {
    Camera,
    Mount,
    ImageStats,
    Sequence,
    FilterWheel,
    Autofocus,
    SessionStats,
}

impl InfoKind {
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            InfoKind::Camera => "Camera",
            InfoKind::Mount => "Mount",
            InfoKind::ImageStats => "Image statistics",
            InfoKind::Sequence => "Sequence",
            InfoKind::FilterWheel => "Filter wheel",
            InfoKind::Autofocus => "Autofocus",
            InfoKind::SessionStats => "Session",
        }
    }
}

/// An autofocus run: (focuser position, HFR) samples in measurement order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AutofocusData {
    pub points: Vec<(i32, f32)>,
    pub best: Option<(i32, f32)>,
}

/// What `populate` receives.
#[derive(Debug, Clone, PartialEq)]
pub enum InfoData {
    /// Caption/value detail rows, in display order.
    Pairs(Vec<(String, String)>),
    Autofocus(AutofocusData),
}

impl InfoData {
    fn is_empty(&self) -> bool {
        match self {
            InfoData::Pairs(rows) => rows.is_empty(),
            InfoData::Autofocus(af) => af.points.is_empty(),
        }
    }
}

struct AutofocusNodes {
    chart: NodeId,
    x_labels: [NodeId; 3],
    best_caption: NodeId,
}

/// The shared overlay frame.
pub struct InfoOverlay {
    root: NodeId,
    title: NodeId,
    loading: NodeId,
    back: NodeId,
    content: NodeId,
    no_data: NodeId,

    built: Option<(InfoKind, u32)>,
    rows: Vec<(NodeId, NodeId)>,
    autofocus: Option<AutofocusNodes>,

    return_page: usize,
    visible: bool,
}

impl InfoOverlay {
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
                gap: 10,
                padding: Sides::all(16),
            },
        );

        let title = make_label(tree, root, Style::text(theme.styles.text, FontTier::Large));
        tree.set_size(title, SizePolicy::fixed_height(44));

        let content = tree.create(NodeKind::Container, root);
        tree.set_layout(
            content,
            LayoutSpec::Flex {
                axis: Axis::Vertical,
                gap: 6,
                padding: Sides::all(8),
            },
        );

        let loading = make_label(tree, root, Style::text(theme.styles.label, FontTier::Medium));
        tree.set_flag(loading, NodeFlags::FLOATING, true);
        tree.set_rect(loading, Rect::new(260, 340, 220, 32));
        tree.set_text(loading, "Loading\u{2026}");

        let no_data = make_label(tree, root, Style::text(theme.styles.label, FontTier::Medium));
        tree.set_flag(no_data, NodeFlags::FLOATING, true);
        tree.set_rect(no_data, Rect::new(280, 340, 180, 32));
        tree.set_text(no_data, "No data");
        tree.set_hidden(no_data, true);

        let back = tree.create(NodeKind::Button, root);
        tree.set_flag(back, NodeFlags::FLOATING | NodeFlags::CLICKABLE, true);
        tree.set_rect(back, Rect::new(16, viewport.height - 72, 96, 48));
        tree.set_text(back, "\u{2039} Back");

        Self {
            root,
            title,
            loading,
            back,
            content,
            no_data,
            built: None,
            rows: Vec::new(),
            autofocus: None,
            return_page: 0,
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
    pub const fn back_node(&self) -> NodeId {
        self.back
    }

    #[must_use]
    pub fn built_kind(&self) -> Option<InfoKind> {
        self.built.map(|(k, _)| k)
    }

    /// Show the frame for a kind. The loading indicator stays up until the
    /// first `populate` lands.
    pub fn show(
        &mut self,
        tree: &mut SceneTree,
        theme: &ThemeState,
        kind: InfoKind,
        return_page: usize,
    ) {
        self.return_page = return_page;
        self.visible = true;
        tree.set_hidden(self.root, false);
        tree.set_text(self.title, kind.title());

        let needs_build = self.built != Some((kind, theme.epoch()));
        if needs_build {
            debug!(?kind, "info overlay content build");
            tree.clear_children(self.content);
            self.rows.clear();
            self.autofocus = None;
            if kind == InfoKind::Autofocus {
                self.build_autofocus(tree, theme);
            }
            self.built = Some((kind, theme.epoch()));
            tree.set_hidden(self.loading, false);
        }
        tree.set_hidden(self.no_data, true);
    }

    /// Hide the frame; cached content survives for the next open.
    pub fn hide(&mut self, tree: &mut SceneTree) {
        self.visible = false;
        tree.set_hidden(self.root, true);
    }

    /// Refresh values. An empty record hides everything except "No data".
    pub fn populate(&mut self, tree: &mut SceneTree, theme: &ThemeState, data: &InfoData) {
        tree.set_hidden(self.loading, true);
        if data.is_empty() {
            tree.set_hidden(self.no_data, false);
            tree.set_hidden(self.content, true);
            return;
        }
        tree.set_hidden(self.no_data, true);
        tree.set_hidden(self.content, false);

        match data {
            InfoData::Pairs(pairs) => self.populate_pairs(tree, theme, pairs),
            InfoData::Autofocus(af) => self.populate_autofocus(tree, theme, af),
        }
    }

    fn populate_pairs(
        &mut self,
        tree: &mut SceneTree,
        theme: &ThemeState,
        pairs: &[(String, String)],
    ) {
        // Grow or shrink the row set to match, then write through the
        // change guard.
        while self.rows.len() < pairs.len() {
            let row = tree.create(NodeKind::Container, self.content);
            tree.set_size(row, SizePolicy::fixed_height(34));
            tree.set_layout(
                row,
                LayoutSpec::Flex {
                    axis: Axis::Horizontal,
                    gap: 12,
                    padding: Sides::all(2),
                },
            );
            let caption = make_label(tree, row, theme.styles.small_label);
            let value = make_label(tree, row, Style::text(theme.styles.text, FontTier::Medium));
            self.rows.push((caption, value));
        }
        for (i, (caption, value)) in self.rows.iter().enumerate() {
            match pairs.get(i) {
                Some((c, v)) => {
                    if let Some(parent) = tree.parent(*caption) {
                        tree.set_hidden(parent, false);
                    }
                    tree.set_text(*caption, c);
                    tree.set_text(*value, format::or_placeholder(v));
                }
                None => {
                    if let Some(parent) = tree.parent(*caption) {
                        tree.set_hidden(parent, true);
                    }
                }
            }
        }
    }

    fn build_autofocus(&mut self, tree: &mut SceneTree, theme: &ThemeState) {
        let chart = tree.create(NodeKind::Chart, self.content);
        tree.set_size(chart, SizePolicy::fixed_height(420));
        if let Some(data) = tree.chart_mut(chart) {
            data.series = vec![ChartSeries::new("HFR", Rgba::rgb(96, 192, 128))];
        }
        let x_labels: [NodeId; 3] = std::array::from_fn(|i| {
            let label = make_label(tree, self.content, theme.styles.small_label);
            tree.set_flag(label, NodeFlags::FLOATING, true);
            tree.set_rect(label, Rect::new(40 + (i as i32) * 280, 520, 140, 22));
            label
        });
        let best_caption = make_label(tree, self.content, Style::text(theme.styles.text, FontTier::Medium));
        tree.set_size(best_caption, SizePolicy::fixed_height(30));
        self.autofocus = Some(AutofocusNodes {
            chart,
            x_labels,
            best_caption,
        });
    }

    fn populate_autofocus(&mut self, tree: &mut SceneTree, theme: &ThemeState, af: &AutofocusData) {
        let Some(nodes) = &self.autofocus else { return };

        // Measurements arrive in run order; the curve wants position order.
        let mut points = af.points.clone();
        points.sort_unstable_by_key(|(pos, _)| *pos);

        let max_hfr = points.iter().map(|(_, h)| *h).fold(1.0f32, f32::max);
        let y_max = ((f64::from(max_hfr) * 1.2) * 100.0).ceil() as i32;
        let samples: Vec<i32> = points
            .iter()
            .map(|(_, h)| (*h * 100.0).round() as i32)
            .collect();
        if let Some(data) = tree.chart_mut(nodes.chart) {
            data.set_points(0, &samples);
            data.x_count = samples.len();
            data.set_range(0, y_max);
            data.series[0].color = if theme.forces_palette_colors() {
                theme.styles.progress
            } else {
                Rgba::rgb(96, 192, 128)
            };
        }

        let min_pos = points.first().map_or(0, |(p, _)| *p);
        let max_pos = points.last().map_or(0, |(p, _)| *p);
        let mid_pos = (min_pos + max_pos) / 2;
        for (label, pos) in nodes.x_labels.iter().zip([min_pos, mid_pos, max_pos]) {
            tree.set_text(*label, &pos.to_string());
        }

        match af.best {
            Some((pos, hfr)) => {
                tree.set_hidden(nodes.best_caption, false);
                tree.set_text(
                    nodes.best_caption,
                    &format!("Best: {pos}  HFR: {}", format::hfr(hfr)),
                );
            }
            None => tree.set_hidden(nodes.best_caption, true),
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
        // Cached content belongs to the previous epoch; the next show
        // rebuilds it.
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn setup() -> (SceneTree, ThemeState, InfoOverlay) {
        let mut tree = SceneTree::new(Rect::from_size(720, 720));
        let theme = ThemeState::from_config(&Config::default());
        let overlay = InfoOverlay::build(&mut tree, &theme);
        (tree, theme, overlay)
    }

    fn pairs(n: usize) -> InfoData {
        InfoData::Pairs(
            (0..n)
                .map(|i| (format!("Field {i}"), format!("value {i}")))
                .collect(),
        )
    }

    #[test]
    fn shows_loading_until_populated() {
        let (mut tree, theme, mut overlay) = setup();
        overlay.show(&mut tree, &theme, InfoKind::Camera, 1);
        assert!(!tree.is_hidden(overlay.loading));
        overlay.populate(&mut tree, &theme, &pairs(3));
        assert!(tree.is_hidden(overlay.loading));
        assert_eq!(overlay.rows.len(), 3);
        assert_eq!(tree.text(overlay.rows[1].1), "value 1");
    }

    #[test]
    fn same_kind_reopen_reuses_content() {
        let (mut tree, theme, mut overlay) = setup();
        overlay.show(&mut tree, &theme, InfoKind::Mount, 1);
        overlay.populate(&mut tree, &theme, &pairs(2));
        let row0 = overlay.rows[0].0;
        overlay.hide(&mut tree);
        overlay.show(&mut tree, &theme, InfoKind::Mount, 1);
        assert_eq!(overlay.rows[0].0, row0);
        assert!(tree.exists(row0));
    }

    #[test]
    fn different_kind_destroys_previous_content() {
        let (mut tree, theme, mut overlay) = setup();
        overlay.show(&mut tree, &theme, InfoKind::Mount, 1);
        overlay.populate(&mut tree, &theme, &pairs(2));
        let row0 = overlay.rows[0].0;
        overlay.show(&mut tree, &theme, InfoKind::Camera, 1);
        assert!(!tree.exists(row0));
        assert!(overlay.rows.is_empty());
    }

    #[test]
    fn theme_change_forces_rebuild() {
        let (mut tree, mut theme, mut overlay) = setup();
        overlay.show(&mut tree, &theme, InfoKind::Sequence, 1);
        overlay.populate(&mut tree, &theme, &pairs(1));
        let row0 = overlay.rows[0].0;
        theme.step_palette(1);
        overlay.show(&mut tree, &theme, InfoKind::Sequence, 1);
        assert!(!tree.exists(row0));
    }

    #[test]
    fn empty_data_shows_only_no_data_label() {
        let (mut tree, theme, mut overlay) = setup();
        overlay.show(&mut tree, &theme, InfoKind::ImageStats, 1);
        overlay.populate(&mut tree, &theme, &InfoData::Pairs(vec![]));
        assert!(!tree.is_hidden(overlay.no_data));
        assert!(tree.is_hidden(overlay.content));
    }

    #[test]
    fn autofocus_sorts_and_ranges() {
        let (mut tree, theme, mut overlay) = setup();
        overlay.show(&mut tree, &theme, InfoKind::Autofocus, 1);
        let af = AutofocusData {
            points: vec![(5200, 3.1), (4800, 2.2), (5000, 1.8)],
            best: Some((5000, 1.8)),
        };
        overlay.populate(&mut tree, &theme, &InfoData::Autofocus(af));
        let nodes = overlay.autofocus.as_ref().unwrap();
        let data = tree.chart(nodes.chart).unwrap();
        // Sorted by position: 4800, 5000, 5200 → HFR 2.2, 1.8, 3.1.
        assert_eq!(data.series[0].points, vec![220, 180, 310]);
        // 1.2 · 3.1 = 3.72.
        assert_eq!(data.y_max, 372);
        assert_eq!(tree.text(nodes.x_labels[0]), "4800");
        assert_eq!(tree.text(nodes.x_labels[2]), "5200");
        assert_eq!(tree.text(nodes.best_caption), "Best: 5000  HFR: 1.80");
    }

    #[test]
    fn autofocus_floor_keeps_minimum_range() {
        let (mut tree, theme, mut overlay) = setup();
        overlay.show(&mut tree, &theme, InfoKind::Autofocus, 1);
        let af = AutofocusData {
            points: vec![(100, 0.3)],
            best: None,
        };
        overlay.populate(&mut tree, &theme, &InfoData::Autofocus(af));
        let nodes = overlay.autofocus.as_ref().unwrap();
        assert_eq!(tree.chart(nodes.chart).unwrap().y_max, 120);
        assert!(tree.is_hidden(nodes.best_caption));
    }

    #[test]
    fn shrinking_pair_set_hides_extra_rows() {
        let (mut tree, theme, mut overlay) = setup();
        overlay.show(&mut tree, &theme, InfoKind::Camera, 1);
        overlay.populate(&mut tree, &theme, &pairs(4));
        overlay.populate(&mut tree, &theme, &pairs(2));
        assert_eq!(overlay.rows.len(), 4);
        let row3_parent = tree.parent(overlay.rows[3].0).unwrap();
        assert!(tree.is_hidden(row3_parent));
    }
}
