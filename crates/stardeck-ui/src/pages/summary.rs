//! The multi-card summary page.
//!
//! One card per *connected* instance. Visibility changes run a FLIP pass:
//! geometry is snapshotted before the mutation, the new layout is resolved
//! synchronously, and surviving cards animate the inverted delta back to
//! zero while newcomers rise in. Cards never teleport.

use stardeck_core::animation::ease_out;
use stardeck_core::geometry::{Rect, Sides};
use stardeck_scene::{
    AnimDone, AnimProp, Axis, LayoutSpec, NodeFlags, NodeId, NodeKind, SceneTree, Timeline,
};
use stardeck_style::{FontTier, Style};
use tracing::debug;

use crate::config::InstanceConfig;
use crate::format;
use crate::pages::instance::compute_progress;
use crate::pages::{make_card, make_label};
use crate::tags;
use crate::telemetry::InstanceTelemetry;
use crate::theme::ThemeState;
use crate::threshold;

const FLIP_MS: u32 = 400;
const ENTER_RISE_PX: i32 = 40;

/// Font/padding preset keyed by visible-card count (1, 2, 3+).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CardPreset {
    name_font: FontTier,
    value_font: FontTier,
    pad: i32,
}

const PRESETS: [CardPreset; 3] = [
    CardPreset {
        name_font: FontTier::Huge,
        value_font: FontTier::Large,
        pad: 24,
    },
    CardPreset {
        name_font: FontTier::Large,
        value_font: FontTier::Medium,
        pad: 16,
    },
    CardPreset {
        name_font: FontTier::Medium,
        value_font: FontTier::Small,
        pad: 10,
    },
];

struct SummaryCard {
    instance: usize,
    root: NodeId,
    name: NodeId,
    target: NodeId,
    filter_badge: NodeId,
    progress: NodeId,
    rms: NodeId,
    hfr: NodeId,
    flip: NodeId,
    detail: NodeId,
    safety: NodeId,
}

/// The summary page. First in the router sequence.
pub struct SummaryPage {
    root: NodeId,
    empty_label: NodeId,
    cards: Vec<SummaryCard>,
    visible: Vec<bool>,
    preset: usize,
}

impl SummaryPage {
    pub fn build(tree: &mut SceneTree, theme: &ThemeState, instance_count: usize) -> Self {
        let viewport = tree.viewport();
        let root = tree.create(NodeKind::Container, tree.root());
        tree.set_rect(root, viewport);
        tree.set_layout(
            root,
            LayoutSpec::Flex {
                axis: Axis::Vertical,
                gap: 12,
                padding: Sides::all(16),
            },
        );

        let empty_label = make_label(tree, root, Style::text(theme.styles.label, FontTier::Large));
        tree.set_flag(empty_label, NodeFlags::FLOATING, true);
        tree.set_rect(empty_label, Rect::new(140, 330, 440, 60));
        tree.set_text(empty_label, "No instances connected");

        let mut cards = Vec::with_capacity(instance_count);
        for instance in 0..instance_count {
            let card = make_card(tree, root, theme);
            tree.set_flag(card, NodeFlags::CLICKABLE, true);
            tree.set_hidden(card, true);
            tree.set_layout(
                card,
                LayoutSpec::Flex {
                    axis: Axis::Vertical,
                    gap: 4,
                    padding: Sides::all(PRESETS[2].pad),
                },
            );
            let name = make_label(tree, card, Style::text(theme.styles.text, FontTier::Large));
            let target = make_label(tree, card, theme.styles.small_label);
            let badge_row = tree.create(NodeKind::Container, card);
            tree.set_layout(
                badge_row,
                LayoutSpec::Flex {
                    axis: Axis::Horizontal,
                    gap: 8,
                    padding: Sides::all(0),
                },
            );
            let filter_badge = make_label(tree, badge_row, theme.styles.small_label);
            let safety = make_label(tree, badge_row, theme.styles.small_label);
            let progress = tree.create(NodeKind::Bar, card);
            let stat_row = tree.create(NodeKind::Container, card);
            tree.set_layout(
                stat_row,
                LayoutSpec::Flex {
                    axis: Axis::Horizontal,
                    gap: 10,
                    padding: Sides::all(0),
                },
            );
            let rms = make_label(tree, stat_row, theme.styles.large_value);
            let hfr = make_label(tree, stat_row, theme.styles.large_value);
            let flip = make_label(tree, stat_row, theme.styles.large_value);
            let detail = make_label(tree, card, theme.styles.small_label);
            tree.set_hidden(detail, true);
            cards.push(SummaryCard {
                instance,
                root: card,
                name,
                target,
                filter_badge,
                progress,
                rms,
                hfr,
                flip,
                detail,
                safety,
            });
        }

        Self {
            root,
            empty_label,
            cards,
            visible: vec![false; instance_count],
            preset: 0,
        }
    }

    #[must_use]
    pub const fn root(&self) -> NodeId {
        self.root
    }

    /// Instance index of a tapped card, if the node is one.
    #[must_use]
    pub fn card_instance(&self, node: NodeId) -> Option<usize> {
        self.cards
            .iter()
            .find(|c| c.root == node)
            .map(|c| c.instance)
    }

    /// Count of currently visible cards.
    #[must_use]
    pub fn visible_count(&self) -> usize {
        self.visible.iter().filter(|v| **v).count()
    }

    /// Active preset index (0-based).
    #[must_use]
    pub const fn preset(&self) -> usize {
        self.preset
    }

    /// Apply a telemetry frame to every card, running the FLIP pass when
    /// the connected set changed.
    pub fn update(
        &mut self,
        tree: &mut SceneTree,
        timeline: &mut Timeline,
        theme: &ThemeState,
        cfgs: &[InstanceConfig],
        telems: &[InstanceTelemetry],
        now_ms: u64,
    ) {
        let new_visible: Vec<bool> = self
            .cards
            .iter()
            .map(|c| telems.get(c.instance).is_some_and(|t| t.connected))
            .collect();

        if new_visible != self.visible {
            self.run_flip(tree, timeline, theme, &new_visible, now_ms);
        }

        let count = self.visible_count();
        tree.set_hidden(self.empty_label, count != 0);

        for card in &self.cards {
            let Some(t) = telems.get(card.instance) else {
                continue;
            };
            if !t.connected {
                continue;
            }
            let cfg = cfgs.get(card.instance);
            self.update_card(tree, theme, card, cfg, t, count == 1, now_ms);
        }
    }

    fn run_flip(
        &mut self,
        tree: &mut SceneTree,
        timeline: &mut Timeline,
        theme: &ThemeState,
        new_visible: &[bool],
        now_ms: u64,
    ) {
        debug!(
            from = self.visible_count(),
            to = new_visible.iter().filter(|v| **v).count(),
            "summary layout change"
        );
        // First: snapshot geometry before the mutation.
        let old_y: Vec<i32> = self.cards.iter().map(|c| tree.abs_y(c.root)).collect();
        let was_visible = self.visible.clone();

        // Last: apply the new set and preset, then resolve layout now.
        let count = new_visible.iter().filter(|v| **v).count();
        self.preset = count.clamp(1, PRESETS.len()) - 1;
        let preset = PRESETS[self.preset];
        for (card, show) in self.cards.iter().zip(new_visible) {
            tree.set_hidden(card.root, !show);
            timeline.cancel(card.root);
            tree.clear_transform(card.root);
            tree.set_layout(
                card.root,
                LayoutSpec::Flex {
                    axis: Axis::Vertical,
                    gap: 4,
                    padding: Sides::all(preset.pad),
                },
            );
            tree.set_style(card.name, Style::text(theme.styles.text, preset.name_font));
            for value in [card.rms, card.hfr, card.flip] {
                tree.set_style(value, Style::text(theme.styles.text, preset.value_font));
            }
        }
        tree.layout();

        // Invert + play.
        for (i, card) in self.cards.iter().enumerate() {
            if !new_visible[i] {
                continue;
            }
            if !was_visible[i] {
                // Entrance: rise and fade in.
                tree.set_opacity(card.root, 0);
                tree.set_translate(card.root, 0, ENTER_RISE_PX);
                timeline.start(
                    card.root,
                    AnimProp::Opacity,
                    0,
                    100,
                    FLIP_MS,
                    ease_out,
                    now_ms,
                    tags::NONE,
                );
                timeline.start(
                    card.root,
                    AnimProp::TranslateY,
                    ENTER_RISE_PX,
                    0,
                    FLIP_MS,
                    ease_out,
                    now_ms,
                    tags::FLIP_ENTER,
                );
            } else {
                let delta = old_y[i] - tree.abs_y(card.root);
                if delta != 0 {
                    tree.set_translate(card.root, 0, delta);
                    timeline.start(
                        card.root,
                        AnimProp::TranslateY,
                        delta,
                        0,
                        FLIP_MS,
                        ease_out,
                        now_ms,
                        tags::FLIP_MOVE,
                    );
                }
            }
        }
        self.visible = new_visible.to_vec();
    }

    #[allow(clippy::too_many_arguments)]
    fn update_card(
        &self,
        tree: &mut SceneTree,
        theme: &ThemeState,
        card: &SummaryCard,
        cfg: Option<&InstanceConfig>,
        t: &InstanceTelemetry,
        single: bool,
        now_ms: u64,
    ) {
        tree.set_text(card.name, &card_name(cfg, t));
        tree.set_text(card.target, format::or_placeholder(&t.target_name));

        let filter_color = cfg
            .and_then(|c| threshold::filter_color(c, &t.current_filter, theme.forces_palette_colors()))
            .unwrap_or(theme.styles.filter);
        tree.set_text(card.filter_badge, format::or_placeholder(&t.current_filter));
        tree.set_style(
            card.filter_badge,
            Style {
                bg: Some(filter_color.with_alpha(70)),
                text_color: Some(filter_color),
                radius: 8,
                ..Style::default()
            },
        );

        tree.set_value(
            card.progress,
            compute_progress(t.exposure_end_epoch, t.exposure_total_s, now_ms),
        );
        tree.set_style(
            card.progress,
            Style {
                bg: Some(filter_color),
                border_color: Some(theme.styles.border),
                border_width: 1,
                radius: 4,
                ..Style::default()
            },
        );

        tree.set_text(card.rms, &format::arcsec(t.guider_rms_total));
        tree.set_text(card.hfr, &format::hfr(t.hfr));
        tree.set_text(card.flip, &format::flip_countdown(&t.meridian_flip));

        tree.set_hidden(card.detail, !single);
        if single {
            let line = format!(
                "{} \u{b7} {} \u{b7} #{}/{} \u{b7} {} stars \u{b7} {}",
                format::seconds(t.exposure_total_s),
                format::or_placeholder(&t.current_filter),
                t.exposure_count.max(0),
                t.exposure_iterations.max(0),
                t.stars.max(0),
                format::or_placeholder(&t.target_time_remaining),
            );
            tree.set_text(card.detail, &line);
        }

        let (glyph, color) = if !t.safety_connected {
            ("\u{25cf} SAFETY --", theme.styles.label)
        } else if t.safety_is_safe {
            ("\u{25cf} SAFE", theme.styles.accent_good)
        } else {
            ("\u{25cf} UNSAFE", theme.styles.accent_bad)
        };
        tree.set_text(card.safety, glyph);
        tree.set_style(card.safety, Style::text(color, FontTier::Small));
    }

    /// Claim FLIP completions: a finished glide clears the transform.
    pub fn on_anim_done(&mut self, tree: &mut SceneTree, done: &AnimDone) {
        if done.tag == tags::FLIP_MOVE && self.cards.iter().any(|c| c.root == done.node) {
            tree.clear_transform(done.node);
        }
    }

    pub fn retheme(&self, tree: &mut SceneTree, theme: &ThemeState) {
        let preset = PRESETS[self.preset];
        tree.set_style(
            self.empty_label,
            Style::text(theme.styles.label, FontTier::Large),
        );
        for card in &self.cards {
            tree.set_style(card.root, theme.styles.card);
            tree.set_style(card.name, Style::text(theme.styles.text, preset.name_font));
            tree.set_style(card.target, theme.styles.small_label);
            tree.set_style(card.detail, theme.styles.small_label);
            for value in [card.rms, card.hfr, card.flip] {
                tree.set_style(value, Style::text(theme.styles.text, preset.value_font));
            }
        }
    }
}

/// Card title fallback chain: telescope+camera, then profile, then host.
fn card_name(cfg: Option<&InstanceConfig>, t: &InstanceTelemetry) -> String {
    match (t.telescope_name.is_empty(), t.camera_name.is_empty()) {
        (false, false) => return format!("{} \u{b7} {}", t.telescope_name, t.camera_name),
        (false, true) => return t.telescope_name.clone(),
        (true, false) => return t.camera_name.clone(),
        (true, true) => {}
    }
    if !t.profile_name.is_empty() {
        return t.profile_name.clone();
    }
    cfg.map_or_else(|| format::PLACEHOLDER.to_owned(), |c| c.host().to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn connected(name: &str) -> InstanceTelemetry {
        InstanceTelemetry {
            connected: true,
            profile_name: name.into(),
            ..InstanceTelemetry::default()
        }
    }

    fn setup(n: usize) -> (
        SceneTree,
        Timeline,
        ThemeState,
        Vec<InstanceConfig>,
        SummaryPage,
    ) {
        let mut tree = SceneTree::new(Rect::from_size(720, 720));
        let theme = ThemeState::from_config(&Config::default());
        let page = SummaryPage::build(&mut tree, &theme, n);
        let cfgs = (0..n)
            .map(|i| InstanceConfig::new(format!("http://rig{i}.local")))
            .collect();
        (tree, Timeline::new(), theme, cfgs, page)
    }

    #[test]
    fn card_count_follows_connectivity() {
        let (mut tree, mut tl, theme, cfgs, mut page) = setup(3);
        let telems = vec![connected("a"), connected("b"), InstanceTelemetry::default()];
        page.update(&mut tree, &mut tl, &theme, &cfgs, &telems, 0);
        assert_eq!(page.visible_count(), 2);
        assert_eq!(page.preset(), 1);
        assert!(tree.is_hidden(page.empty_label));
    }

    #[test]
    fn zero_connected_shows_empty_state() {
        let (mut tree, mut tl, theme, cfgs, mut page) = setup(2);
        let telems = vec![InstanceTelemetry::default(), InstanceTelemetry::default()];
        page.update(&mut tree, &mut tl, &theme, &cfgs, &telems, 0);
        assert_eq!(page.visible_count(), 0);
        assert!(!tree.is_hidden(page.empty_label));
        for card in &page.cards {
            assert!(tree.is_hidden(card.root));
        }
    }

    #[test]
    fn scenario_disconnect_glides_survivor() {
        let (mut tree, mut tl, theme, cfgs, mut page) = setup(3);
        let telems = vec![connected("a"), connected("b"), InstanceTelemetry::default()];
        page.update(&mut tree, &mut tl, &theme, &cfgs, &telems, 0);
        tl.advance(&mut tree, 1_000);
        tree.layout();
        assert_eq!(page.preset(), 1);
        let card1 = page.cards[1].root;
        let y_before = tree.abs_y(card1);
        assert!(y_before > tree.abs_y(page.cards[0].root));

        // Instance 0 drops; card 1 becomes the only card and glides up.
        let telems2 = vec![
            InstanceTelemetry::default(),
            connected("b"),
            InstanceTelemetry::default(),
        ];
        page.update(&mut tree, &mut tl, &theme, &cfgs, &telems2, 2_000);
        assert_eq!(page.preset(), 0);
        // Invert: the survivor starts visually at its old Y.
        let (_, ty) = tree.translate(card1);
        assert_eq!(tree.abs_y(card1) + ty, y_before);
        // Play: transform animates to zero and is cleared on completion.
        for done in tl.advance(&mut tree, 2_400) {
            page.on_anim_done(&mut tree, &done);
        }
        assert_eq!(tree.translate(card1), (0, 0));
        assert!(tree.is_hidden(page.cards[0].root));
    }

    #[test]
    fn newly_connected_card_enters_rising() {
        let (mut tree, mut tl, theme, cfgs, mut page) = setup(2);
        let telems = vec![connected("a"), InstanceTelemetry::default()];
        page.update(&mut tree, &mut tl, &theme, &cfgs, &telems, 0);
        tl.advance(&mut tree, 500);

        let telems2 = vec![connected("a"), connected("b")];
        page.update(&mut tree, &mut tl, &theme, &cfgs, &telems2, 1_000);
        let card1 = page.cards[1].root;
        assert!(!tree.is_hidden(card1));
        assert_eq!(tree.opacity(card1), 0);
        assert_eq!(tree.translate(card1), (0, ENTER_RISE_PX));
        tl.advance(&mut tree, 1_400);
        assert_eq!(tree.opacity(card1), 100);
        assert_eq!(tree.translate(card1), (0, 0));
    }

    #[test]
    fn name_fallback_chain() {
        let cfg = InstanceConfig::new("http://rig0.local:1888");
        let mut t = InstanceTelemetry {
            connected: true,
            telescope_name: "Esprit 100".into(),
            camera_name: "ASI2600".into(),
            profile_name: "Main".into(),
            ..InstanceTelemetry::default()
        };
        assert_eq!(card_name(Some(&cfg), &t), "Esprit 100 \u{b7} ASI2600");
        t.telescope_name.clear();
        t.camera_name.clear();
        assert_eq!(card_name(Some(&cfg), &t), "Main");
        t.profile_name.clear();
        assert_eq!(card_name(Some(&cfg), &t), "rig0.local");
    }

    #[test]
    fn single_card_mode_shows_detail_line() {
        let (mut tree, mut tl, theme, cfgs, mut page) = setup(2);
        let mut t = connected("a");
        t.current_filter = "Ha".into();
        t.exposure_total_s = 300.0;
        t.exposure_count = 5;
        t.exposure_iterations = 20;
        t.stars = 812;
        t.target_time_remaining = "02:14".into();
        let telems = vec![t, InstanceTelemetry::default()];
        page.update(&mut tree, &mut tl, &theme, &cfgs, &telems, 0);
        let detail = page.cards[0].detail;
        assert!(!tree.is_hidden(detail));
        assert_eq!(
            tree.text(detail),
            "300s \u{b7} Ha \u{b7} #5/20 \u{b7} 812 stars \u{b7} 02:14"
        );
    }

    #[test]
    fn safety_glyph_tracks_state() {
        let (mut tree, mut tl, theme, cfgs, mut page) = setup(1);
        let mut t = connected("a");
        t.safety_connected = true;
        t.safety_is_safe = false;
        page.update(&mut tree, &mut tl, &theme, &cfgs, &[t.clone()], 0);
        assert_eq!(tree.text(page.cards[0].safety), "\u{25cf} UNSAFE");
        t.safety_connected = false;
        page.update(&mut tree, &mut tl, &theme, &cfgs, &[t], 0);
        assert_eq!(tree.text(page.cards[0].safety), "\u{25cf} SAFETY --");
    }
}
