//! The per-instance dashboard page.
//!
//! The exposure arc is a polled state machine, not a free-running
//! animation: every poll caches the absolute exposure end epoch, and a
//! 200 ms interpolation timer recomputes instantaneous progress from it.
//! That survives missed polls, page switches, and arbitrary stalls. The
//! only transient the poll path drives directly is the sweep-to-100 that
//! plays when a new exposure starts mid-arc.

use stardeck_core::animation::{ease_in_out, ease_out};
use stardeck_core::geometry::{Rect, Sides};
use stardeck_scene::{
    AnimDone, AnimProp, Axis, GridPlacement, LayoutSpec, NodeFlags, NodeId, NodeKind, SceneTree,
    Timeline, Track,
};
use stardeck_style::{FontTier, Rgba, Style};
use tracing::debug;

use crate::config::InstanceConfig;
use crate::format;
use crate::pages::{make_card, make_label};
use crate::tags;
use crate::telemetry::InstanceTelemetry;
use crate::theme::ThemeState;
use crate::threshold;

/// Staleness thresholds, ms.
const STALE_WARN_MS: u64 = 30_000;
const STALE_DIM_MS: u64 = 120_000;

/// Sweep-to-100 duration when a new exposure is detected mid-arc.
const SWEEP_MS: u32 = 300;
/// Smoothing animation between interpolation ticks.
const INTERP_MS: u32 = 400;
/// Metric label animation.
const METRIC_MS: u32 = 500;

/// Power row slots: amps + watts + PWM channels.
const POWER_SLOTS: usize = 8;

/// How fresh the last poll is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StalenessLevel {
    Fresh,
    Warn,
    Dim,
}

/// Staleness classification against the last successful poll.
#[must_use]
pub fn staleness(now_ms: u64, last_poll_ms: u64) -> StalenessLevel {
    let age = now_ms.saturating_sub(last_poll_ms);
    if age <= STALE_WARN_MS {
        StalenessLevel::Fresh
    } else if age <= STALE_DIM_MS {
        StalenessLevel::Warn
    } else {
        StalenessLevel::Dim
    }
}

/// Integer progress percentage from the cached end epoch.
///
/// Computed in `f64` seconds; exact below 2^53 s, far beyond any exposure.
#[must_use]
pub fn compute_progress(end_epoch_s: i64, total_s: f32, now_ms: u64) -> i32 {
    if end_epoch_s <= 0 || total_s <= 0.0 {
        return 0;
    }
    let total = f64::from(total_s);
    let remaining = (end_epoch_s as f64 - now_ms as f64 / 1000.0).max(0.0);
    let elapsed = (total - remaining).clamp(0.0, total);
    ((100.0 * elapsed / total).floor() as i32).clamp(0, 100)
}

/// Exposure-arc animation bookkeeping.
#[derive(Debug, Default)]
struct ArcAnimState {
    /// Last discrete percentage observed by the poll path.
    prev_progress: i32,
    /// Progress captured while a sweep is in flight.
    pending_progress: i32,
    /// True while the sweep-to-100 plays before the reset.
    arc_completing: bool,
    prev_filter: String,
    interp_end_epoch: i64,
    interp_total: f32,
    interp_filter_color: Rgba,
}

/// Last committed metric value, ×100. Zero means "no previous value".
#[derive(Debug, Default, Clone, Copy)]
struct ValueAnimState {
    last: i32,
}

struct PowerSlot {
    root: NodeId,
    name: NodeId,
    value: NodeId,
}

/// One instance's dashboard page.
pub struct InstancePage {
    pub instance: usize,
    root: NodeId,

    header: NodeId,
    title: NodeId,
    subtitle: NodeId,

    seq_card: NodeId,
    seq_container: NodeId,
    seq_step: NodeId,
    seq_iter: NodeId,

    arc_card: NodeId,
    arc: NodeId,
    arc_pct: NodeId,
    arc_filter: NodeId,
    arc_time: NodeId,

    metrics_card: NodeId,
    rms_region: NodeId,
    rms_total: NodeId,
    rms_ra: NodeId,
    rms_dec: NodeId,
    hfr_region: NodeId,
    hfr: NodeId,

    flip_card: NodeId,
    flip_value: NodeId,

    target_card: NodeId,
    target_reason: NodeId,
    target_value: NodeId,
    stars: NodeId,

    power_row: NodeId,
    power_slots: Vec<PowerSlot>,

    stale_label: NodeId,
    dim_overlay: NodeId,

    arc_state: ArcAnimState,
    rms_total_state: ValueAnimState,
    rms_ra_state: ValueAnimState,
    rms_dec_state: ValueAnimState,
    hfr_state: ValueAnimState,

    connected: bool,
    last_poll_ms: u64,
}

impl InstancePage {
    /// Build the page tree under the scene root. Hidden/shown by the router.
    pub fn build(tree: &mut SceneTree, theme: &ThemeState, instance: usize) -> Self {
        let viewport = tree.viewport();
        let root = tree.create(NodeKind::Container, tree.root());
        tree.set_rect(root, viewport);
        tree.set_layout(
            root,
            LayoutSpec::Grid {
                cols: vec![Track::Fr(1), Track::Fr(1)],
                rows: vec![
                    Track::Px(92),
                    Track::Px(56),
                    Track::Fr(1),
                    Track::Fr(1),
                    Track::Fr(1),
                    Track::Px(84),
                ],
                gap: 10,
                padding: Sides::all(12),
            },
        );

        let styles = &theme.styles;

        // Header spans both columns; tapping it opens the thumbnail overlay.
        let header = make_card(tree, root, theme);
        tree.set_grid_placement(header, GridPlacement::span(0, 0, 2, 1));
        tree.set_flag(header, NodeFlags::CLICKABLE, true);
        tree.set_layout(
            header,
            LayoutSpec::Flex {
                axis: Axis::Vertical,
                gap: 2,
                padding: Sides::new(10, 16, 10, 16),
            },
        );
        let title = make_label(tree, header, Style::text(styles.text, FontTier::Large));
        let subtitle = make_label(tree, header, styles.small_label);

        let seq_card = make_card(tree, root, theme);
        tree.set_grid_placement(seq_card, GridPlacement::span(0, 1, 2, 1));
        tree.set_flag(seq_card, NodeFlags::CLICKABLE, true);
        tree.set_layout(
            seq_card,
            LayoutSpec::Flex {
                axis: Axis::Horizontal,
                gap: 12,
                padding: Sides::new(8, 16, 8, 16),
            },
        );
        let seq_container = make_label(tree, seq_card, styles.small_label);
        let seq_step = make_label(tree, seq_card, styles.small_label);
        let seq_iter = make_label(tree, seq_card, styles.small_label);

        // Exposure arc block, left column, three rows tall.
        let arc_card = make_card(tree, root, theme);
        tree.set_grid_placement(arc_card, GridPlacement::span(0, 2, 1, 3));
        tree.set_flag(arc_card, NodeFlags::CLICKABLE, true);
        let arc = tree.create(NodeKind::Arc, arc_card);
        tree.set_flag(arc, NodeFlags::FLOATING, true);
        tree.set_rect(arc, Rect::new(46, 210, 260, 260));
        let arc_pct = make_label(tree, arc_card, Style::text(styles.text, FontTier::Huge));
        tree.set_flag(arc_pct, NodeFlags::FLOATING, true);
        tree.set_rect(arc_pct, Rect::new(120, 310, 120, 48));
        let arc_filter = make_label(tree, arc_card, styles.small_label);
        tree.set_flag(arc_filter, NodeFlags::FLOATING, true);
        tree.set_rect(arc_filter, Rect::new(120, 360, 120, 24));
        let arc_time = make_label(tree, arc_card, styles.small_label);
        tree.set_flag(arc_time, NodeFlags::FLOATING, true);
        tree.set_rect(arc_time, Rect::new(100, 476, 160, 24));

        // Right column: RMS+HFR, meridian, target.
        let metrics_card = make_card(tree, root, theme);
        tree.set_grid_placement(metrics_card, GridPlacement::cell(1, 2));
        tree.set_flag(metrics_card, NodeFlags::CLICKABLE, true);
        tree.set_layout(
            metrics_card,
            LayoutSpec::Flex {
                axis: Axis::Horizontal,
                gap: 8,
                padding: Sides::all(10),
            },
        );
        let rms_region = tree.create(NodeKind::Container, metrics_card);
        tree.set_flag(rms_region, NodeFlags::CLICKABLE, true);
        tree.set_layout(
            rms_region,
            LayoutSpec::Flex {
                axis: Axis::Vertical,
                gap: 2,
                padding: Sides::all(2),
            },
        );
        let rms_caption = make_label(tree, rms_region, styles.small_label);
        tree.set_text(rms_caption, "RMS");
        let rms_total = make_label(tree, rms_region, styles.large_value);
        let rms_ra = make_label(tree, rms_region, styles.small_label);
        let rms_dec = make_label(tree, rms_region, styles.small_label);

        let hfr_region = tree.create(NodeKind::Container, metrics_card);
        tree.set_flag(hfr_region, NodeFlags::CLICKABLE, true);
        tree.set_layout(
            hfr_region,
            LayoutSpec::Flex {
                axis: Axis::Vertical,
                gap: 2,
                padding: Sides::all(2),
            },
        );
        let hfr_caption = make_label(tree, hfr_region, styles.small_label);
        tree.set_text(hfr_caption, "HFR");
        let hfr = make_label(tree, hfr_region, styles.large_value);

        let flip_card = make_card(tree, root, theme);
        tree.set_grid_placement(flip_card, GridPlacement::cell(1, 3));
        tree.set_flag(flip_card, NodeFlags::CLICKABLE, true);
        tree.set_layout(
            flip_card,
            LayoutSpec::Flex {
                axis: Axis::Vertical,
                gap: 2,
                padding: Sides::all(10),
            },
        );
        let flip_caption = make_label(tree, flip_card, styles.small_label);
        tree.set_text(flip_caption, "MERIDIAN FLIP");
        let flip_value = make_label(tree, flip_card, styles.large_value);

        let target_card = make_card(tree, root, theme);
        tree.set_grid_placement(target_card, GridPlacement::cell(1, 4));
        tree.set_flag(target_card, NodeFlags::CLICKABLE, true);
        tree.set_layout(
            target_card,
            LayoutSpec::Flex {
                axis: Axis::Vertical,
                gap: 2,
                padding: Sides::all(10),
            },
        );
        let target_reason = make_label(tree, target_card, styles.small_label);
        let target_value = make_label(tree, target_card, styles.large_value);
        let stars = make_label(tree, target_card, styles.small_label);

        // Power row spans both columns; tapping it routes home.
        let power_row = make_card(tree, root, theme);
        tree.set_grid_placement(power_row, GridPlacement::span(0, 5, 2, 1));
        tree.set_flag(power_row, NodeFlags::CLICKABLE, true);
        tree.set_layout(
            power_row,
            LayoutSpec::Flex {
                axis: Axis::Horizontal,
                gap: 8,
                padding: Sides::all(8),
            },
        );
        let mut power_slots = Vec::with_capacity(POWER_SLOTS);
        for _ in 0..POWER_SLOTS {
            let slot = tree.create(NodeKind::Container, power_row);
            tree.set_layout(
                slot,
                LayoutSpec::Flex {
                    axis: Axis::Vertical,
                    gap: 0,
                    padding: Sides::all(2),
                },
            );
            let name = make_label(tree, slot, styles.small_label);
            let value = make_label(tree, slot, Style::text(styles.text, FontTier::Medium));
            tree.set_hidden(slot, true);
            power_slots.push(PowerSlot { root: slot, name, value });
        }

        // Floating staleness chrome, above everything on the page.
        let stale_label = make_label(tree, root, Style::text(styles.accent_ok, FontTier::Small));
        tree.set_flag(stale_label, NodeFlags::FLOATING, true);
        tree.set_rect(stale_label, Rect::new(viewport.width - 250, 16, 234, 24));
        tree.set_hidden(stale_label, true);

        let dim_overlay = tree.create(NodeKind::Container, root);
        tree.set_flag(dim_overlay, NodeFlags::FLOATING, true);
        tree.set_rect(dim_overlay, viewport);
        tree.set_style(
            dim_overlay,
            Style {
                bg: Some(Rgba::BLACK.with_alpha(102)),
                ..Style::default()
            },
        );
        tree.set_hidden(dim_overlay, true);

        let mut page = Self {
            instance,
            root,
            header,
            title,
            subtitle,
            seq_card,
            seq_container,
            seq_step,
            seq_iter,
            arc_card,
            arc,
            arc_pct,
            arc_filter,
            arc_time,
            metrics_card,
            rms_region,
            rms_total,
            rms_ra,
            rms_dec,
            hfr_region,
            hfr,
            flip_card,
            flip_value,
            target_card,
            target_reason,
            target_value,
            stars,
            power_row,
            power_slots,
            stale_label,
            dim_overlay,
            arc_state: ArcAnimState::default(),
            rms_total_state: ValueAnimState::default(),
            rms_ra_state: ValueAnimState::default(),
            rms_dec_state: ValueAnimState::default(),
            hfr_state: ValueAnimState::default(),
            connected: false,
            last_poll_ms: 0,
        };
        page.arc_state.interp_filter_color = theme.styles.progress;
        page.show_placeholders(tree);
        page
    }

    #[must_use]
    pub const fn root(&self) -> NodeId {
        self.root
    }

    #[must_use]
    pub const fn header_node(&self) -> NodeId {
        self.header
    }

    #[must_use]
    pub const fn rms_node(&self) -> NodeId {
        self.rms_region
    }

    #[must_use]
    pub const fn hfr_node(&self) -> NodeId {
        self.hfr_region
    }

    #[must_use]
    pub const fn arc_node(&self) -> NodeId {
        self.arc
    }

    #[must_use]
    pub const fn stale_label_node(&self) -> NodeId {
        self.stale_label
    }

    #[must_use]
    pub const fn seq_card_node(&self) -> NodeId {
        self.seq_card
    }

    #[must_use]
    pub const fn arc_card_node(&self) -> NodeId {
        self.arc_card
    }

    #[must_use]
    pub const fn metrics_card_node(&self) -> NodeId {
        self.metrics_card
    }

    #[must_use]
    pub const fn flip_card_node(&self) -> NodeId {
        self.flip_card
    }

    #[must_use]
    pub const fn target_card_node(&self) -> NodeId {
        self.target_card
    }

    #[must_use]
    pub const fn power_row_node(&self) -> NodeId {
        self.power_row
    }

    #[must_use]
    pub const fn dim_overlay_node(&self) -> NodeId {
        self.dim_overlay
    }

    /// Apply one telemetry snapshot. Never fails; bad input clamps or
    /// renders as placeholders.
    pub fn apply_telemetry(
        &mut self,
        tree: &mut SceneTree,
        timeline: &mut Timeline,
        theme: &ThemeState,
        cfg: &InstanceConfig,
        t: &InstanceTelemetry,
        now_ms: u64,
    ) {
        self.last_poll_ms = t.last_poll_ms;
        self.connected = t.connected;

        if !t.connected {
            timeline.cancel(self.arc);
            self.arc_state = ArcAnimState {
                interp_filter_color: theme.styles.progress,
                ..ArcAnimState::default()
            };
            self.rms_total_state = ValueAnimState::default();
            self.rms_ra_state = ValueAnimState::default();
            self.rms_dec_state = ValueAnimState::default();
            self.hfr_state = ValueAnimState::default();
            self.show_placeholders(tree);
            return;
        }

        // Header and sequence row.
        let name = if t.profile_name.is_empty() {
            cfg.host().to_owned()
        } else {
            t.profile_name.clone()
        };
        tree.set_text(self.title, &name);
        let rig = match (t.telescope_name.is_empty(), t.camera_name.is_empty()) {
            (false, false) => format!("{} \u{b7} {}", t.telescope_name, t.camera_name),
            (false, true) => t.telescope_name.clone(),
            (true, false) => t.camera_name.clone(),
            (true, true) => format::PLACEHOLDER.to_owned(),
        };
        tree.set_text(self.subtitle, &rig);
        tree.set_text(self.seq_container, format::or_placeholder(&t.container_name));
        tree.set_text(self.seq_step, format::or_placeholder(&t.container_step));
        let count = t.exposure_count.max(0);
        let iterations = t.exposure_iterations.max(0);
        tree.set_text(self.seq_iter, &format!("#{count}/{iterations}"));

        self.update_arc(tree, timeline, theme, cfg, t, now_ms);

        // Metric boxes.
        let styles = &theme.styles;
        let rms_color = threshold::rms_band_color(t.guider_rms_total, cfg.rms_thresholds, styles);
        self.animate_metric(tree, timeline, MetricSlot::RmsTotal, t.guider_rms_total, rms_color, now_ms);
        let ra_color = threshold::rms_band_color(t.guider_rms_ra, cfg.rms_thresholds, styles);
        self.animate_metric(tree, timeline, MetricSlot::RmsRa, t.guider_rms_ra, ra_color, now_ms);
        let dec_color = threshold::rms_band_color(t.guider_rms_dec, cfg.rms_thresholds, styles);
        self.animate_metric(tree, timeline, MetricSlot::RmsDec, t.guider_rms_dec, dec_color, now_ms);
        let hfr_color = threshold::band_color(t.hfr, cfg.hfr_thresholds, styles);
        self.animate_metric(tree, timeline, MetricSlot::Hfr, t.hfr, hfr_color, now_ms);

        tree.set_text(self.flip_value, &format::flip_countdown(&t.meridian_flip));
        tree.set_text(
            self.target_reason,
            format::or_placeholder(&t.target_time_reason),
        );
        tree.set_text(
            self.target_value,
            format::or_placeholder(&t.target_time_remaining),
        );
        tree.set_text(self.stars, &format!("{} stars", t.stars.max(0)));

        self.update_power_row(tree, t);
    }

    fn update_arc(
        &mut self,
        tree: &mut SceneTree,
        timeline: &mut Timeline,
        theme: &ThemeState,
        cfg: &InstanceConfig,
        t: &InstanceTelemetry,
        now_ms: u64,
    ) {
        // A filter change invalidates every in-flight arc animation so a
        // completed sweep can't leak the old filter's colour or progress
        // into the new exposure.
        if t.current_filter != self.arc_state.prev_filter {
            timeline.cancel(self.arc);
            tree.set_value(self.arc, 0);
            self.arc_state.prev_progress = 0;
            self.arc_state.pending_progress = 0;
            self.arc_state.arc_completing = false;
            self.arc_state.prev_filter = t.current_filter.clone();
        }

        let arc_color =
            threshold::filter_color(cfg, &t.current_filter, theme.forces_palette_colors())
                .unwrap_or(theme.styles.progress);
        self.arc_state.interp_filter_color = arc_color;
        self.apply_arc_color(tree, arc_color);
        tree.set_text(self.arc_filter, format::or_placeholder(&t.current_filter));

        self.arc_state.interp_end_epoch = t.exposure_end_epoch;
        self.arc_state.interp_total = t.exposure_total_s;

        let progress = compute_progress(t.exposure_end_epoch, t.exposure_total_s, now_ms);

        if self.arc_state.arc_completing {
            // Sweep in flight: only remember where the new exposure is. If
            // it has already run well past the start, stop waiting and jump.
            self.arc_state.pending_progress = progress;
            if progress > 30 {
                timeline.cancel_prop(self.arc, AnimProp::Value);
                self.arc_state.arc_completing = false;
                tree.set_value(self.arc, self.arc_state.pending_progress);
                self.arc_state.prev_progress = self.arc_state.pending_progress;
            }
            return;
        }

        let new_exposure = self.arc_state.prev_progress > 70 && progress < 30;
        if new_exposure && tree.value(self.arc) > 0 {
            debug!(instance = self.instance, "new exposure, sweeping arc");
            self.arc_state.arc_completing = true;
            self.arc_state.pending_progress = progress;
            timeline.start(
                self.arc,
                AnimProp::Value,
                tree.value(self.arc),
                100,
                SWEEP_MS,
                ease_out,
                now_ms,
                tags::ARC_SWEEP,
            );
        }
        self.arc_state.prev_progress = progress;

        let total = t.exposure_total_s.max(0.0);
        let elapsed = if t.exposure_end_epoch > 0 {
            (total as f64 - (t.exposure_end_epoch as f64 - now_ms as f64 / 1000.0).max(0.0))
                .clamp(0.0, total as f64) as f32
        } else {
            t.exposure_current_s.clamp(0.0, total)
        };
        tree.set_text(
            self.arc_time,
            &format!("{} / {}", format::seconds(elapsed), format::seconds(total)),
        );
    }

    /// 200 ms interpolation tick: keeps the arc moving between polls.
    pub fn interp_tick(&mut self, tree: &mut SceneTree, timeline: &mut Timeline, now_ms: u64) {
        if !self.connected || self.arc_state.arc_completing {
            return;
        }
        let progress = compute_progress(
            self.arc_state.interp_end_epoch,
            self.arc_state.interp_total,
            now_ms,
        );
        if progress != tree.value(self.arc) {
            timeline.start(
                self.arc,
                AnimProp::Value,
                tree.value(self.arc),
                progress,
                INTERP_MS,
                ease_in_out,
                now_ms,
                tags::ARC_INTERP,
            );
        }
    }

    /// Second tick: staleness caption and dim overlay.
    pub fn staleness_tick(&mut self, tree: &mut SceneTree, theme: &ThemeState, now_ms: u64) {
        match staleness(now_ms, self.last_poll_ms) {
            StalenessLevel::Fresh => {
                tree.set_hidden(self.stale_label, true);
                tree.set_hidden(self.dim_overlay, true);
            }
            StalenessLevel::Warn => {
                let age = now_ms.saturating_sub(self.last_poll_ms);
                tree.set_hidden(self.stale_label, false);
                tree.set_hidden(self.dim_overlay, true);
                tree.set_text(self.stale_label, &format::staleness_caption(age));
                tree.set_style(
                    self.stale_label,
                    Style::text(theme.styles.accent_ok, FontTier::Small),
                );
            }
            StalenessLevel::Dim => {
                let age = now_ms.saturating_sub(self.last_poll_ms);
                tree.set_hidden(self.stale_label, false);
                tree.set_hidden(self.dim_overlay, false);
                tree.set_text(self.stale_label, &format::staleness_caption(age));
                tree.set_style(
                    self.stale_label,
                    Style::text(theme.styles.accent_bad, FontTier::Small),
                );
            }
        }
    }

    /// Claim arc completions out of the shared stream.
    pub fn on_anim_done(&mut self, tree: &mut SceneTree, done: &AnimDone) {
        if done.node == self.arc && done.tag == tags::ARC_SWEEP {
            // Sweep finished: snap to zero and let the interpolation timer
            // ramp the new exposure up.
            tree.set_value(self.arc, 0);
            self.arc_state.arc_completing = false;
            self.arc_state.prev_progress = 0;
        }
    }

    /// Re-derive animated label texts from their node values. Runs after
    /// every timeline advance; the set-only-if-changed guard keeps resting
    /// labels cheap.
    pub fn refresh_animated_labels(&self, tree: &mut SceneTree) {
        if !self.connected {
            return;
        }
        let pct = tree.value(self.arc).clamp(0, 100);
        tree.set_text(self.arc_pct, &format!("{pct}%"));
        let rms_total = tree.value(self.rms_total);
        tree.set_text(self.rms_total, &format::arcsec_centi(rms_total));
        let ra = tree.value(self.rms_ra);
        tree.set_text(self.rms_ra, &format!("RA {}", format::arcsec_centi(ra)));
        let dec = tree.value(self.rms_dec);
        tree.set_text(self.rms_dec, &format!("DE {}", format::arcsec_centi(dec)));
        let hfr = tree.value(self.hfr);
        tree.set_text(self.hfr, &format::hfr_centi(hfr));
    }

    /// Re-apply card/label styles after a theme change.
    pub fn retheme(&mut self, tree: &mut SceneTree, theme: &ThemeState) {
        let styles = &theme.styles;
        for card in [
            self.header,
            self.seq_card,
            self.arc_card,
            self.metrics_card,
            self.flip_card,
            self.target_card,
            self.power_row,
        ] {
            tree.set_style(card, styles.card);
        }
        tree.set_style(self.title, Style::text(styles.text, FontTier::Large));
        tree.set_style(self.subtitle, styles.small_label);
        for label in [self.seq_container, self.seq_step, self.seq_iter] {
            tree.set_style(label, styles.small_label);
        }
        tree.set_style(self.arc_pct, Style::text(styles.text, FontTier::Huge));
        tree.set_style(self.arc_filter, styles.small_label);
        tree.set_style(self.arc_time, styles.small_label);
        tree.set_style(self.flip_value, styles.large_value);
        tree.set_style(self.target_reason, styles.small_label);
        tree.set_style(self.target_value, styles.large_value);
        tree.set_style(self.stars, styles.small_label);
        for slot in &self.power_slots {
            tree.set_style(slot.name, styles.small_label);
            tree.set_style(slot.value, Style::text(styles.text, FontTier::Medium));
        }
        if theme.forces_palette_colors() || self.arc_state.prev_filter.is_empty() {
            self.arc_state.interp_filter_color = styles.progress;
        }
        self.apply_arc_color(tree, self.arc_state.interp_filter_color);
    }

    fn apply_arc_color(&self, tree: &mut SceneTree, color: Rgba) {
        // The indicator and its shadow follow the filter colour together.
        tree.set_style(
            self.arc,
            Style {
                bg: Some(color),
                border_color: Some(color.with_alpha(90)),
                border_width: 10,
                radius: 130,
                ..Style::default()
            },
        );
    }

    fn animate_metric(
        &mut self,
        tree: &mut SceneTree,
        timeline: &mut Timeline,
        slot: MetricSlot,
        value: f32,
        color: Rgba,
        now_ms: u64,
    ) {
        let (node, font) = match slot {
            MetricSlot::RmsTotal => (self.rms_total, FontTier::Large),
            MetricSlot::RmsRa => (self.rms_ra, FontTier::Small),
            MetricSlot::RmsDec => (self.rms_dec, FontTier::Small),
            MetricSlot::Hfr => (self.hfr, FontTier::Large),
        };
        let state = match slot {
            MetricSlot::RmsTotal => &mut self.rms_total_state,
            MetricSlot::RmsRa => &mut self.rms_ra_state,
            MetricSlot::RmsDec => &mut self.rms_dec_state,
            MetricSlot::Hfr => &mut self.hfr_state,
        };
        // Band colour lands with the same update that changes the number.
        tree.set_style(node, Style::text(color, font));
        let new = (value * 100.0).round() as i32;
        if state.last == 0 {
            // First observation: no animation, write through.
            tree.set_value(node, new);
        } else if new != state.last {
            timeline.start(
                node,
                AnimProp::Value,
                state.last,
                new,
                METRIC_MS,
                ease_out,
                now_ms,
                tags::METRIC_VALUE,
            );
        }
        state.last = new;
    }

    fn update_power_row(&mut self, tree: &mut SceneTree, t: &InstanceTelemetry) {
        if !t.power.connected {
            tree.set_hidden(self.power_row, true);
            return;
        }
        tree.set_hidden(self.power_row, false);
        let mut used = 0;
        {
            let slot = &self.power_slots[used];
            tree.set_hidden(slot.root, false);
            tree.set_text(slot.name, "AMPS");
            tree.set_text(slot.value, &format!("{:.1}A", t.power.amps.max(0.0)));
            used += 1;
        }
        {
            let slot = &self.power_slots[used];
            tree.set_hidden(slot.root, false);
            tree.set_text(slot.name, "WATTS");
            tree.set_text(slot.value, &format!("{:.0}W", t.power.watts.max(0.0)));
            used += 1;
        }
        for channel in &t.power.channels {
            if used >= self.power_slots.len() {
                break;
            }
            let slot = &self.power_slots[used];
            tree.set_hidden(slot.root, false);
            tree.set_text(slot.name, &format::power_name(&channel.name));
            tree.set_text(
                slot.value,
                &format!("{:.0}%", channel.value.clamp(0.0, 100.0)),
            );
            used += 1;
        }
        for slot in &self.power_slots[used..] {
            tree.set_hidden(slot.root, true);
        }
    }

    fn show_placeholders(&mut self, tree: &mut SceneTree) {
        tree.set_value(self.arc, 0);
        for label in [
            self.title,
            self.subtitle,
            self.seq_container,
            self.seq_step,
            self.seq_iter,
            self.arc_filter,
            self.arc_time,
            self.flip_value,
            self.target_reason,
            self.target_value,
            self.stars,
        ] {
            tree.set_text(label, format::PLACEHOLDER);
        }
        tree.set_text(self.arc_pct, "0%");
        for node in [self.rms_total, self.rms_ra, self.rms_dec, self.hfr] {
            tree.set_value(node, 0);
            tree.set_text(node, format::PLACEHOLDER);
        }
        tree.set_hidden(self.power_row, true);
    }
}

#[derive(Clone, Copy)]
enum MetricSlot {
    RmsTotal,
    RmsRa,
    RmsDec,
    Hfr,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use proptest::prelude::*;

    fn setup() -> (SceneTree, Timeline, ThemeState, InstanceConfig, InstancePage) {
        let mut tree = SceneTree::new(Rect::from_size(720, 720));
        let theme = ThemeState::from_config(&Config::default());
        let page = InstancePage::build(&mut tree, &theme, 0);
        (
            tree,
            Timeline::new(),
            theme,
            InstanceConfig::new("http://rig.local:1888"),
            page,
        )
    }

    fn exposing(filter: &str, total: f32, end_epoch: i64, now_ms: u64) -> InstanceTelemetry {
        InstanceTelemetry {
            connected: true,
            current_filter: filter.into(),
            exposure_total_s: total,
            exposure_end_epoch: end_epoch,
            last_poll_ms: now_ms,
            ..InstanceTelemetry::default()
        }
    }

    #[test]
    fn staleness_thresholds_are_exact() {
        assert_eq!(staleness(30_000, 0), StalenessLevel::Fresh);
        assert_eq!(staleness(30_001, 0), StalenessLevel::Warn);
        assert_eq!(staleness(120_000, 0), StalenessLevel::Warn);
        assert_eq!(staleness(120_001, 0), StalenessLevel::Dim);
    }

    #[test]
    fn progress_clamps_and_floors() {
        // 120 s exposure ending at t=200 s, asked at t=100 s → 20/120.
        assert_eq!(compute_progress(200, 120.0, 100_000), 16);
        // Past the end: pegged at 100.
        assert_eq!(compute_progress(200, 120.0, 300_000), 100);
        // Not exposing.
        assert_eq!(compute_progress(0, 120.0, 100_000), 0);
        assert_eq!(compute_progress(200, 0.0, 100_000), 0);
    }

    proptest! {
        #[test]
        fn progress_always_in_unit_range(end in -1000i64..10_000, total in -10.0f32..10_000.0, now in 0u64..10_000_000) {
            let p = compute_progress(end, total, now);
            prop_assert!((0..=100).contains(&p));
        }

        #[test]
        fn progress_is_monotonic_in_time(end in 1i64..5_000, total in 1.0f32..5_000.0, a in 0u64..5_000_000, b in 0u64..5_000_000) {
            let (t0, t1) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(compute_progress(end, total, t0) <= compute_progress(end, total, t1));
        }
    }

    #[test]
    fn disconnect_reverts_to_placeholders_and_hides_power() {
        let (mut tree, mut tl, theme, cfg, mut page) = setup();
        let mut t = exposing("R", 120.0, 200, 0);
        t.power.connected = true;
        t.power.channels.push(crate::telemetry::PowerChannel {
            name: "dew".into(),
            value: 40.0,
        });
        page.apply_telemetry(&mut tree, &mut tl, &theme, &cfg, &t, 0);
        assert!(!tree.is_hidden(page.power_row));

        let off = InstanceTelemetry::default();
        page.apply_telemetry(&mut tree, &mut tl, &theme, &cfg, &off, 1_000);
        assert!(tree.is_hidden(page.power_row));
        assert_eq!(tree.text(page.title), format::PLACEHOLDER);
        assert_eq!(tree.value(page.arc), 0);
    }

    #[test]
    fn scenario_new_exposure_sweeps_then_resets() {
        let (mut tree, mut tl, theme, cfg, mut page) = setup();
        // elapsed 100 of 120, ends in 20 s.
        let now = 1_000_000;
        page.apply_telemetry(&mut tree, &mut tl, &theme, &cfg, &exposing("L", 120.0, 1_020, now), now);
        page.interp_tick(&mut tree, &mut tl, now);
        tl.advance(&mut tree, now + INTERP_MS as u64);
        assert_eq!(tree.value(page.arc), 83);

        // New exposure: elapsed 5 of 120, same filter.
        let now2 = now + 1_000;
        page.apply_telemetry(
            &mut tree,
            &mut tl,
            &theme,
            &cfg,
            &exposing("L", 120.0, (now2 / 1000) as i64 + 115, now2),
            now2,
        );
        assert!(page.arc_state.arc_completing);
        // Sweep runs to 100 over 300 ms, completion resets to 0.
        let mid = tl.advance(&mut tree, now2 + 150);
        assert!(mid.is_empty());
        assert!(tree.value(page.arc) > 83);
        for done in tl.advance(&mut tree, now2 + 300) {
            page.on_anim_done(&mut tree, &done);
        }
        assert_eq!(tree.value(page.arc), 0);
        assert!(!page.arc_state.arc_completing);

        // Next interpolation tick ramps towards the new exposure.
        let now3 = now2 + 500;
        page.interp_tick(&mut tree, &mut tl, now3);
        tl.advance(&mut tree, now3 + INTERP_MS as u64);
        assert!((1..=10).contains(&tree.value(page.arc)));
    }

    #[test]
    fn scenario_filter_change_cancels_and_recolours() {
        let (mut tree, mut tl, theme, mut cfg, mut page) = setup();
        cfg.filter_colors.insert("G".into(), 0x22CC55);
        let now = 500_000;
        page.apply_telemetry(&mut tree, &mut tl, &theme, &cfg, &exposing("R", 60.0, 520, now), now);
        page.interp_tick(&mut tree, &mut tl, now);
        tl.advance(&mut tree, now + 400);
        assert!(tree.value(page.arc) > 0);

        let t2 = exposing("G", 60.0, (now / 1000) as i64 + 60, now + 100);
        page.apply_telemetry(&mut tree, &mut tl, &theme, &cfg, &t2, now + 100);
        assert_eq!(page.arc_state.prev_filter, "G");
        assert_eq!(tree.value(page.arc), 0);
        assert!(!tl.is_animating(page.arc, AnimProp::Value));
        assert_eq!(tree.style(page.arc).bg, Some(Rgba::from_hex(0x22CC55)));
    }

    #[test]
    fn same_filter_keeps_arc_state() {
        let (mut tree, mut tl, theme, cfg, mut page) = setup();
        let now = 500_000;
        page.apply_telemetry(&mut tree, &mut tl, &theme, &cfg, &exposing("R", 60.0, 530, now), now);
        let prev = page.arc_state.prev_progress;
        page.apply_telemetry(
            &mut tree,
            &mut tl,
            &theme,
            &cfg,
            &exposing("R", 60.0, 530, now + 2_000),
            now + 2_000,
        );
        assert!(page.arc_state.prev_progress >= prev);
    }

    #[test]
    fn scenario_staleness_progression() {
        let (mut tree, mut tl, theme, cfg, mut page) = setup();
        let mut t = exposing("R", 60.0, 600, 0);
        t.last_poll_ms = 0;
        page.apply_telemetry(&mut tree, &mut tl, &theme, &cfg, &t, 0);

        page.staleness_tick(&mut tree, &theme, 45_000);
        assert!(!tree.is_hidden(page.stale_label));
        assert!(tree.is_hidden(page.dim_overlay));
        assert_eq!(tree.text(page.stale_label), "Last update: 45s ago");
        assert_eq!(
            tree.style(page.stale_label).text_color,
            Some(theme.styles.accent_ok)
        );

        page.staleness_tick(&mut tree, &theme, 135_000);
        assert!(!tree.is_hidden(page.dim_overlay));
        assert_eq!(
            tree.style(page.stale_label).text_color,
            Some(theme.styles.accent_bad)
        );

        // A fresh poll clears both.
        let mut t2 = exposing("R", 60.0, 600, 140_000);
        t2.last_poll_ms = 140_000;
        page.apply_telemetry(&mut tree, &mut tl, &theme, &cfg, &t2, 140_000);
        page.staleness_tick(&mut tree, &theme, 141_000);
        assert!(tree.is_hidden(page.stale_label));
        assert!(tree.is_hidden(page.dim_overlay));
    }

    #[test]
    fn first_metric_observation_writes_directly_then_animates() {
        let (mut tree, mut tl, theme, cfg, mut page) = setup();
        let mut t = exposing("R", 60.0, 600, 0);
        t.guider_rms_total = 0.57;
        page.apply_telemetry(&mut tree, &mut tl, &theme, &cfg, &t, 0);
        page.refresh_animated_labels(&mut tree);
        assert_eq!(tree.text(page.rms_total), "0.57\"");
        assert!(!tl.is_animating(page.rms_total, AnimProp::Value));

        t.guider_rms_total = 0.80;
        page.apply_telemetry(&mut tree, &mut tl, &theme, &cfg, &t, 1_000);
        assert!(tl.is_animating(page.rms_total, AnimProp::Value));
        tl.advance(&mut tree, 1_250);
        page.refresh_animated_labels(&mut tree);
        let mid: f32 = tree.text(page.rms_total)
            .trim_end_matches('"')
            .parse()
            .unwrap();
        assert!(mid > 0.57 && mid < 0.80);
        tl.advance(&mut tree, 1_500);
        page.refresh_animated_labels(&mut tree);
        assert_eq!(tree.text(page.rms_total), "0.80\"");
    }

    #[test]
    fn metric_colour_tracks_band() {
        let (mut tree, mut tl, theme, cfg, mut page) = setup();
        let mut t = exposing("R", 60.0, 600, 0);
        t.hfr = 9.0;
        page.apply_telemetry(&mut tree, &mut tl, &theme, &cfg, &t, 0);
        assert_eq!(
            tree.style(page.hfr).text_color,
            Some(theme.styles.accent_bad)
        );
        t.hfr = 1.2;
        page.apply_telemetry(&mut tree, &mut tl, &theme, &cfg, &t, 1_000);
        assert_eq!(
            tree.style(page.hfr).text_color,
            Some(theme.styles.accent_good)
        );
    }

    #[test]
    fn power_row_orders_and_bounds_slots() {
        let (mut tree, mut tl, theme, cfg, mut page) = setup();
        let mut t = exposing("R", 60.0, 600, 0);
        t.power.connected = true;
        t.power.amps = 3.14;
        t.power.watts = 42.0;
        for i in 0..10 {
            t.power.channels.push(crate::telemetry::PowerChannel {
                name: format!("ch{i}"),
                value: 50.0,
            });
        }
        page.apply_telemetry(&mut tree, &mut tl, &theme, &cfg, &t, 0);
        let visible: Vec<_> = page
            .power_slots
            .iter()
            .filter(|s| !tree.is_hidden(s.root))
            .collect();
        assert_eq!(visible.len(), POWER_SLOTS);
        assert_eq!(tree.text(visible[0].name), "AMPS");
        assert_eq!(tree.text(visible[0].value), "3.1A");
        assert_eq!(tree.text(visible[1].name), "WATTS");
        assert_eq!(tree.text(visible[2].name), "CH0");
    }

    #[test]
    fn night_red_palette_overrides_filter_colour() {
        let (mut tree, mut tl, _, mut cfg, mut page) = setup();
        cfg.filter_colors.insert("R".into(), 0x00FF00);
        let mut config = Config::default();
        config.theme_index = (0..stardeck_style::Palette::count())
            .find(|&i| stardeck_style::Palette::by_index(i).forces_palette_colors())
            .unwrap();
        let red_theme = ThemeState::from_config(&config);
        page.retheme(&mut tree, &red_theme);
        page.apply_telemetry(
            &mut tree,
            &mut tl,
            &red_theme,
            &cfg,
            &exposing("R", 60.0, 600, 0),
            0,
        );
        assert_eq!(tree.style(page.arc).bg, Some(red_theme.styles.progress));
    }
}
