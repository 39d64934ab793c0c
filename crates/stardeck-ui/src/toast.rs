//! The persistent toast bar.
//!
//! Single slot, newest wins. A repeat of the visible message inside the
//! 5-second dedup window bumps a "(×N)" counter and resets the age instead
//! of re-animating. The bar owns three nodes: the chrome container, the
//! severity dot, and the message label, plus a countdown label updated every
//! second tick.

use stardeck_core::animation::{ease_out, linear};
use stardeck_core::geometry::Rect;
use stardeck_scene::{AnimDone, AnimProp, NodeFlags, NodeId, NodeKind, SceneTree, Timeline};
use stardeck_style::{FontTier, Severity, Style};

use crate::tags;
use crate::theme::ThemeState;

/// Repeat messages inside this window deduplicate.
const DEDUP_WINDOW_MS: u64 = 5_000;
const ENTER_MS: u32 = 300;
const EXIT_MS: u32 = 200;
const ENTER_RISE_PX: i32 = 20;

#[derive(Debug)]
struct ActiveToast {
    severity: Severity,
    text: String,
    shown_ms: u64,
    lifetime_ms: u64,
    count: u32,
    exiting: bool,
}

/// The toast presenter. UI task only.
#[derive(Debug)]
pub struct ToastHost {
    bar: NodeId,
    dot: NodeId,
    message: NodeId,
    countdown: NodeId,
    active: Option<ActiveToast>,
}

impl ToastHost {
    /// Build the (hidden) bar across the bottom of the screen.
    pub fn build(tree: &mut SceneTree, theme: &ThemeState) -> Self {
        let viewport = tree.viewport();
        let bar = tree.create(NodeKind::Container, tree.root());
        tree.set_flag(bar, NodeFlags::FLOATING, true);
        tree.set_rect(
            bar,
            Rect::new(16, viewport.height - 72, viewport.width - 32, 56),
        );
        tree.set_hidden(bar, true);

        let dot = tree.create(NodeKind::Container, bar);
        tree.set_flag(dot, NodeFlags::FLOATING, true);
        tree.set_rect(dot, Rect::new(36, viewport.height - 56, 12, 12));

        let message = tree.create(NodeKind::Label, bar);
        tree.set_flag(message, NodeFlags::FLOATING, true);
        tree.set_rect(
            message,
            Rect::new(64, viewport.height - 62, viewport.width - 180, 36),
        );

        let countdown = tree.create(NodeKind::Label, bar);
        tree.set_flag(countdown, NodeFlags::FLOATING, true);
        tree.set_rect(
            countdown,
            Rect::new(viewport.width - 96, viewport.height - 62, 64, 36),
        );

        let host = Self {
            bar,
            dot,
            message,
            countdown,
            active: None,
        };
        host.retheme(tree, theme);
        host
    }

    /// Present a message. `duration_s` is the configured lifetime; errors
    /// stay twice as long.
    pub fn show(
        &mut self,
        tree: &mut SceneTree,
        timeline: &mut Timeline,
        theme: &ThemeState,
        severity: Severity,
        text: &str,
        duration_s: u32,
        now_ms: u64,
    ) {
        if let Some(active) = &mut self.active
            && !active.exiting
            && active.severity == severity
            && active.text == text
            && now_ms.saturating_sub(active.shown_ms) < DEDUP_WINDOW_MS
        {
            active.count += 1;
            active.shown_ms = now_ms;
            let label = format!("{text} (\u{d7}{})", active.count);
            tree.set_text(self.message, &label);
            return;
        }

        let mut lifetime_ms = u64::from(duration_s) * 1000;
        if severity == Severity::Error {
            lifetime_ms *= 2;
        }

        timeline.cancel(self.bar);
        self.apply_severity(tree, theme, severity);
        tree.set_text(self.message, text);
        tree.set_hidden(self.bar, false);
        tree.set_translate(self.bar, 0, ENTER_RISE_PX);
        tree.set_opacity(self.bar, 0);
        timeline.start(
            self.bar,
            AnimProp::TranslateY,
            ENTER_RISE_PX,
            0,
            ENTER_MS,
            ease_out,
            now_ms,
            tags::NONE,
        );
        timeline.start(
            self.bar,
            AnimProp::Opacity,
            0,
            100,
            ENTER_MS,
            ease_out,
            now_ms,
            tags::TOAST_ENTER,
        );

        self.active = Some(ActiveToast {
            severity,
            text: text.to_owned(),
            shown_ms: now_ms,
            lifetime_ms,
            count: 1,
            exiting: false,
        });
        self.update_countdown(tree, now_ms);
    }

    /// Second-tick upkeep: countdown text and auto-dismiss.
    pub fn tick(&mut self, tree: &mut SceneTree, timeline: &mut Timeline, now_ms: u64) {
        let Some(active) = &mut self.active else {
            return;
        };
        if active.exiting {
            return;
        }
        if now_ms.saturating_sub(active.shown_ms) >= active.lifetime_ms {
            active.exiting = true;
            timeline.cancel_prop(self.bar, AnimProp::TranslateY);
            timeline.start(
                self.bar,
                AnimProp::Opacity,
                i32::from(tree.opacity(self.bar)),
                0,
                EXIT_MS,
                linear,
                now_ms,
                tags::TOAST_EXIT,
            );
            return;
        }
        self.update_countdown(tree, now_ms);
    }

    /// Claim toast completions out of the shared stream.
    pub fn on_anim_done(&mut self, tree: &mut SceneTree, done: &AnimDone) {
        if done.node != self.bar || done.tag != tags::TOAST_EXIT {
            return;
        }
        tree.set_hidden(self.bar, true);
        tree.clear_transform(self.bar);
        self.active = None;
    }

    /// Whether a bar is on screen (entering, resting, or exiting).
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.active.is_some()
    }

    /// Message label text, including any dedup suffix.
    #[must_use]
    pub fn message_text<'t>(&self, tree: &'t SceneTree) -> &'t str {
        tree.text(self.message)
    }

    /// Dedup count of the visible toast.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.active.as_ref().map_or(0, |a| a.count)
    }

    pub fn retheme(&self, tree: &mut SceneTree, theme: &ThemeState) {
        let styles = &theme.styles;
        tree.set_style(
            self.bar,
            Style {
                bg: Some(styles.card.bg.unwrap_or(styles.background)),
                border_color: styles.card.border_color,
                border_width: 1,
                radius: 12,
                text_color: Some(styles.text),
                font: FontTier::Medium,
            },
        );
        tree.set_style(self.message, Style::text(styles.text, FontTier::Medium));
        tree.set_style(self.countdown, Style::text(styles.label, FontTier::Small));
        if let Some(active) = &self.active {
            let severity = active.severity;
            self.apply_severity(tree, theme, severity);
        }
    }

    fn apply_severity(&self, tree: &mut SceneTree, theme: &ThemeState, severity: Severity) {
        let color = theme
            .palette()
            .severity(severity)
            .scale(theme.color_brightness());
        tree.set_style(
            self.dot,
            Style {
                bg: Some(color),
                radius: 6,
                ..Style::default()
            },
        );
        let mut bar_style = tree.style(self.bar);
        bar_style.border_color = Some(color);
        tree.set_style(self.bar, bar_style);
    }

    fn update_countdown(&self, tree: &mut SceneTree, now_ms: u64) {
        if let Some(active) = &self.active {
            let remaining = active
                .lifetime_ms
                .saturating_sub(now_ms.saturating_sub(active.shown_ms));
            tree.set_text(self.countdown, &format!("{}s", remaining.div_ceil(1000)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn setup() -> (SceneTree, Timeline, ThemeState, ToastHost) {
        let mut tree = SceneTree::new(Rect::from_size(720, 720));
        let theme = ThemeState::from_config(&Config::default());
        let host = ToastHost::build(&mut tree, &theme);
        (tree, Timeline::new(), theme, host)
    }

    #[test]
    fn dedup_inside_window_counts_instead_of_replacing() {
        let (mut tree, mut tl, theme, mut host) = setup();
        host.show(&mut tree, &mut tl, &theme, Severity::Warning, "link down", 8, 0);
        host.show(&mut tree, &mut tl, &theme, Severity::Warning, "link down", 8, 2_000);
        host.show(&mut tree, &mut tl, &theme, Severity::Warning, "link down", 8, 4_000);
        assert_eq!(host.count(), 3);
        assert!(host.message_text(&tree).ends_with("(\u{d7}3)"));
    }

    #[test]
    fn dedup_window_expires() {
        let (mut tree, mut tl, theme, mut host) = setup();
        host.show(&mut tree, &mut tl, &theme, Severity::Info, "m", 8, 0);
        host.show(&mut tree, &mut tl, &theme, Severity::Info, "m", 8, 5_500);
        assert_eq!(host.count(), 1);
        assert_eq!(host.message_text(&tree), "m");
    }

    #[test]
    fn different_severity_never_dedups() {
        let (mut tree, mut tl, theme, mut host) = setup();
        host.show(&mut tree, &mut tl, &theme, Severity::Info, "m", 8, 0);
        host.show(&mut tree, &mut tl, &theme, Severity::Error, "m", 8, 1_000);
        assert_eq!(host.count(), 1);
    }

    #[test]
    fn error_doubles_lifetime_and_expiry_hides() {
        let (mut tree, mut tl, theme, mut host) = setup();
        host.show(&mut tree, &mut tl, &theme, Severity::Error, "bad", 8, 0);
        // Still alive at 15 s (8 s doubled).
        host.tick(&mut tree, &mut tl, 15_000);
        assert!(host.is_visible());
        host.tick(&mut tree, &mut tl, 16_100);
        // Exit animation runs, completion hides the bar.
        for done in tl.advance(&mut tree, 16_400) {
            host.on_anim_done(&mut tree, &done);
        }
        assert!(!host.is_visible());
        assert!(tree.is_hidden(host.bar));
        assert_eq!(tree.opacity(host.bar), 100);
    }

    #[test]
    fn countdown_shows_whole_seconds_remaining() {
        let (mut tree, mut tl, theme, mut host) = setup();
        host.show(&mut tree, &mut tl, &theme, Severity::Info, "m", 8, 0);
        host.tick(&mut tree, &mut tl, 3_200);
        assert_eq!(tree.text(host.countdown), "5s");
    }
}
