//! Page routing and animated transitions.
//!
//! Exactly one page is visible at rest. During a transition two pages are
//! on screen; the router owns the hand-off and always leaves the retired
//! page hidden with its opacity and translation cleared, so a later instant
//! switch can never reveal a half-faded ghost.
//!
//! A `show_page` issued mid-transition replaces the pending target; the
//! in-flight effect always runs to completion before the router
//! re-evaluates.

use stardeck_core::animation::{ease_in_out, linear};
use stardeck_core::geometry::{Point, Rect};
use stardeck_scene::{AnimDone, AnimProp, NodeFlags, NodeId, SceneTree, Timeline};
use stardeck_scene::NodeKind;
use stardeck_style::Style;
use tracing::debug;

use crate::config::TransitionEffect;
use crate::tags;
use crate::theme::ThemeState;

/// Transition duration for fade and slide.
const EFFECT_MS: u32 = 500;

/// Height of the settings header strip that re-enables swipes.
pub const SETTINGS_HEADER_PX: i32 = 80;

/// What a routed page is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Summary,
    Instance(usize),
    Settings,
    SysInfo,
}

/// One entry in the page sequence.
#[derive(Debug, Clone, Copy)]
pub struct PageDescriptor {
    pub kind: PageKind,
    pub root: NodeId,
}

#[derive(Debug, Clone, Copy)]
struct InFlight {
    from: usize,
    to: usize,
}

/// The router. UI task only.
#[derive(Debug)]
pub struct PageRouter {
    pages: Vec<PageDescriptor>,
    active: usize,
    in_flight: Option<InFlight>,
    pending: Option<(usize, TransitionEffect)>,
    dots: Vec<NodeId>,
}

impl PageRouter {
    /// Take ownership of the ordered page sequence. All pages except the
    /// first are hidden; indicator dots are created for instance pages.
    pub fn new(tree: &mut SceneTree, theme: &ThemeState, pages: Vec<PageDescriptor>) -> Self {
        let instance_count = pages
            .iter()
            .filter(|p| matches!(p.kind, PageKind::Instance(_)))
            .count();
        for (i, page) in pages.iter().enumerate() {
            tree.set_hidden(page.root, i != 0);
        }

        let viewport = tree.viewport();
        let mut dots = Vec::with_capacity(instance_count);
        let dot_size = 10;
        let gap = 14;
        let total = instance_count as i32 * dot_size + (instance_count as i32 - 1).max(0) * gap;
        let mut x = (viewport.width - total) / 2;
        for _ in 0..instance_count {
            let dot = tree.create(NodeKind::Container, tree.root());
            tree.set_flag(dot, NodeFlags::FLOATING, true);
            tree.set_rect(dot, Rect::new(x, viewport.height - 18, dot_size, dot_size));
            dots.push(dot);
            x += dot_size + gap;
        }

        let router = Self {
            pages,
            active: 0,
            in_flight: None,
            pending: None,
            dots,
        };
        router.update_dots(tree, theme);
        router
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    #[must_use]
    pub const fn active(&self) -> usize {
        self.active
    }

    #[must_use]
    pub fn active_kind(&self) -> PageKind {
        self.pages[self.active].kind
    }

    #[must_use]
    pub fn kind_at(&self, index: usize) -> Option<PageKind> {
        self.pages.get(index).map(|p| p.kind)
    }

    /// Router index of an instance page.
    #[must_use]
    pub fn index_of_instance(&self, instance: usize) -> Option<usize> {
        self.pages
            .iter()
            .position(|p| p.kind == PageKind::Instance(instance))
    }

    #[must_use]
    pub fn index_of_kind(&self, kind: PageKind) -> Option<usize> {
        self.pages.iter().position(|p| p.kind == kind)
    }

    #[must_use]
    pub fn is_transitioning(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Switch to `index` with `effect`. Out-of-range indices are ignored;
    /// switching to the active page is a no-op.
    pub fn show_page(
        &mut self,
        tree: &mut SceneTree,
        timeline: &mut Timeline,
        theme: &ThemeState,
        index: usize,
        effect: TransitionEffect,
        now_ms: u64,
    ) {
        if index >= self.pages.len() || index == self.active {
            return;
        }
        if self.in_flight.is_some() {
            self.pending = Some((index, effect));
            return;
        }

        let from = self.active;
        let old = self.pages[from].root;
        let new = self.pages[index].root;
        debug!(from, to = index, ?effect, "page switch");
        self.active = index;

        match effect {
            TransitionEffect::Instant => {
                tree.set_hidden(old, true);
                tree.clear_transform(old);
                tree.set_hidden(new, false);
                tree.clear_transform(new);
                self.update_dots(tree, theme);
            }
            TransitionEffect::Fade => {
                self.in_flight = Some(InFlight { from, to: index });
                timeline.start(
                    old,
                    AnimProp::Opacity,
                    100,
                    0,
                    EFFECT_MS,
                    linear,
                    now_ms,
                    tags::PAGE_FADE_OUT,
                );
            }
            TransitionEffect::SlideLeft | TransitionEffect::SlideRight => {
                let width = tree.viewport().width;
                let sign = if effect == TransitionEffect::SlideLeft {
                    1
                } else {
                    -1
                };
                self.in_flight = Some(InFlight { from, to: index });
                // Park the incoming page off-screen before unhiding it so it
                // never flashes at the origin for a frame.
                tree.set_translate(new, sign * width, 0);
                tree.set_opacity(new, 100);
                tree.set_hidden(new, false);
                timeline.start(
                    old,
                    AnimProp::TranslateX,
                    0,
                    -sign * width,
                    EFFECT_MS,
                    ease_in_out,
                    now_ms,
                    tags::NONE,
                );
                timeline.start(
                    new,
                    AnimProp::TranslateX,
                    sign * width,
                    0,
                    EFFECT_MS,
                    ease_in_out,
                    now_ms,
                    tags::PAGE_SLIDE_NEW,
                );
            }
        }
    }

    /// Horizontal swipe. Returns whether the gesture was consumed.
    ///
    /// Swipes are suppressed while a modal overlay is up and on the settings
    /// page outside its header strip (the sliders own horizontal drags
    /// there).
    pub fn gesture(
        &mut self,
        tree: &mut SceneTree,
        timeline: &mut Timeline,
        theme: &ThemeState,
        dir: stardeck_core::event::SwipeDirection,
        start: Point,
        overlay_visible: bool,
        now_ms: u64,
    ) -> bool {
        use stardeck_core::event::SwipeDirection;

        if overlay_visible {
            return false;
        }
        if self.active_kind() == PageKind::Settings && start.y > SETTINGS_HEADER_PX {
            return false;
        }
        let n = self.pages.len();
        let (target, effect) = match dir {
            SwipeDirection::Left => ((self.active + 1) % n, TransitionEffect::SlideLeft),
            SwipeDirection::Right => ((self.active + n - 1) % n, TransitionEffect::SlideRight),
        };
        self.show_page(tree, timeline, theme, target, effect, now_ms);
        true
    }

    /// Claim routing completions out of the shared stream.
    pub fn on_anim_done(
        &mut self,
        tree: &mut SceneTree,
        timeline: &mut Timeline,
        theme: &ThemeState,
        done: &AnimDone,
        now_ms: u64,
    ) {
        let Some(flight) = self.in_flight else { return };
        match done.tag {
            tags::PAGE_FADE_OUT if done.node == self.pages[flight.from].root => {
                let old = self.pages[flight.from].root;
                let new = self.pages[flight.to].root;
                tree.set_hidden(old, true);
                tree.clear_transform(old);
                // Crossover: the indicator flips here, not at effect start.
                self.update_dots(tree, theme);
                tree.set_opacity(new, 0);
                tree.set_hidden(new, false);
                timeline.start(
                    new,
                    AnimProp::Opacity,
                    0,
                    100,
                    EFFECT_MS,
                    linear,
                    now_ms,
                    tags::PAGE_FADE_IN,
                );
            }
            tags::PAGE_FADE_IN if done.node == self.pages[flight.to].root => {
                self.finish(tree, timeline, theme, now_ms);
            }
            tags::PAGE_SLIDE_NEW if done.node == self.pages[flight.to].root => {
                let old = self.pages[flight.from].root;
                let new = self.pages[flight.to].root;
                tree.set_hidden(old, true);
                tree.clear_transform(old);
                tree.clear_transform(new);
                self.update_dots(tree, theme);
                self.finish(tree, timeline, theme, now_ms);
            }
            _ => {}
        }
    }

    fn finish(
        &mut self,
        tree: &mut SceneTree,
        timeline: &mut Timeline,
        theme: &ThemeState,
        now_ms: u64,
    ) {
        self.in_flight = None;
        if let Some((index, effect)) = self.pending.take() {
            self.show_page(tree, timeline, theme, index, effect, now_ms);
        }
    }

    /// Indicator dots: visible only while an instance page is active.
    pub fn update_dots(&self, tree: &mut SceneTree, theme: &ThemeState) {
        let active_instance = match self.pages[self.active].kind {
            PageKind::Instance(i) => Some(i),
            _ => None,
        };
        for (i, dot) in self.dots.iter().enumerate() {
            tree.set_hidden(*dot, active_instance.is_none());
            let color = if active_instance == Some(i) {
                theme.styles.text
            } else {
                theme.styles.border
            };
            tree.set_style(
                *dot,
                Style {
                    bg: Some(color),
                    radius: 5,
                    ..Style::default()
                },
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use stardeck_core::event::SwipeDirection;

    fn setup(n_instances: usize) -> (SceneTree, Timeline, ThemeState, PageRouter) {
        let mut tree = SceneTree::new(Rect::from_size(720, 720));
        let theme = ThemeState::from_config(&Config::default());
        let root = tree.root();
        let mut pages = vec![PageDescriptor {
            kind: PageKind::Summary,
            root: tree.create(NodeKind::Container, root),
        }];
        for i in 0..n_instances {
            pages.push(PageDescriptor {
                kind: PageKind::Instance(i),
                root: tree.create(NodeKind::Container, root),
            });
        }
        pages.push(PageDescriptor {
            kind: PageKind::Settings,
            root: tree.create(NodeKind::Container, root),
        });
        pages.push(PageDescriptor {
            kind: PageKind::SysInfo,
            root: tree.create(NodeKind::Container, root),
        });
        let router = PageRouter::new(&mut tree, &theme, pages);
        (tree, Timeline::new(), theme, router)
    }

    fn run_until_idle(
        tree: &mut SceneTree,
        tl: &mut Timeline,
        theme: &ThemeState,
        router: &mut PageRouter,
        start_ms: u64,
    ) -> u64 {
        let mut now = start_ms;
        for _ in 0..200 {
            now += 50;
            let done = tl.advance(tree, now);
            for d in &done {
                router.on_anim_done(tree, tl, theme, d, now);
            }
            if !router.is_transitioning() && tl.is_empty() {
                break;
            }
        }
        now
    }

    fn visible_pages(tree: &SceneTree, router: &PageRouter) -> Vec<usize> {
        (0..router.len())
            .filter(|i| !tree.is_hidden(router.pages[*i].root))
            .collect()
    }

    #[test]
    fn exactly_one_visible_page_after_every_effect() {
        for effect in TransitionEffect::ALL {
            let (mut tree, mut tl, theme, mut router) = setup(2);
            for target in [1, 3, 0, 4, 2] {
                router.show_page(&mut tree, &mut tl, &theme, target, *effect, 0);
                run_until_idle(&mut tree, &mut tl, &theme, &mut router, 0);
                assert_eq!(router.active(), target, "effect {effect:?}");
                assert_eq!(
                    visible_pages(&tree, &router),
                    vec![target],
                    "effect {effect:?}"
                );
            }
        }
    }

    #[test]
    fn out_of_range_and_same_index_are_ignored() {
        let (mut tree, mut tl, theme, mut router) = setup(1);
        router.show_page(&mut tree, &mut tl, &theme, 99, TransitionEffect::Fade, 0);
        router.show_page(&mut tree, &mut tl, &theme, 0, TransitionEffect::Fade, 0);
        assert!(!router.is_transitioning());
        assert_eq!(router.active(), 0);
    }

    #[test]
    fn retired_page_has_clean_transform() {
        let (mut tree, mut tl, theme, mut router) = setup(1);
        let old_root = router.pages[0].root;
        router.show_page(&mut tree, &mut tl, &theme, 1, TransitionEffect::SlideLeft, 0);
        run_until_idle(&mut tree, &mut tl, &theme, &mut router, 0);
        assert!(tree.is_hidden(old_root));
        assert_eq!(tree.translate(old_root), (0, 0));
        assert_eq!(tree.opacity(old_root), 100);
    }

    #[test]
    fn overlapping_show_page_replaces_pending_target() {
        let (mut tree, mut tl, theme, mut router) = setup(2);
        router.show_page(&mut tree, &mut tl, &theme, 1, TransitionEffect::Fade, 0);
        router.show_page(&mut tree, &mut tl, &theme, 2, TransitionEffect::Instant, 10);
        router.show_page(&mut tree, &mut tl, &theme, 3, TransitionEffect::Instant, 20);
        run_until_idle(&mut tree, &mut tl, &theme, &mut router, 20);
        assert_eq!(router.active(), 3);
        assert_eq!(visible_pages(&tree, &router), vec![3]);
    }

    #[test]
    fn gesture_wraps_around_sequence() {
        let (mut tree, mut tl, theme, mut router) = setup(1);
        let origin = Point::new(360, 360);
        assert!(router.gesture(
            &mut tree,
            &mut tl,
            &theme,
            SwipeDirection::Right,
            origin,
            false,
            0
        ));
        run_until_idle(&mut tree, &mut tl, &theme, &mut router, 0);
        assert_eq!(router.active(), router.len() - 1);
    }

    #[test]
    fn gesture_blocked_by_overlay_and_settings_body() {
        let (mut tree, mut tl, theme, mut router) = setup(1);
        let origin = Point::new(360, 360);
        assert!(!router.gesture(
            &mut tree,
            &mut tl,
            &theme,
            SwipeDirection::Left,
            origin,
            true,
            0
        ));

        let settings = router.index_of_kind(PageKind::Settings).unwrap();
        router.show_page(&mut tree, &mut tl, &theme, settings, TransitionEffect::Instant, 0);
        assert!(!router.gesture(
            &mut tree,
            &mut tl,
            &theme,
            SwipeDirection::Left,
            Point::new(360, 400),
            false,
            0
        ));
        // Header strip keeps swipe alive.
        assert!(router.gesture(
            &mut tree,
            &mut tl,
            &theme,
            SwipeDirection::Left,
            Point::new(360, 40),
            false,
            0
        ));
    }

    #[test]
    fn dots_only_on_instance_pages() {
        let (mut tree, mut tl, theme, mut router) = setup(2);
        assert!(tree.is_hidden(router.dots[0]));
        router.show_page(&mut tree, &mut tl, &theme, 1, TransitionEffect::Instant, 0);
        assert!(!tree.is_hidden(router.dots[0]));
        router.show_page(&mut tree, &mut tl, &theme, 3, TransitionEffect::Instant, 0);
        assert!(tree.is_hidden(router.dots[0]));
    }

    #[test]
    fn fade_indicator_updates_at_crossover() {
        let (mut tree, mut tl, theme, mut router) = setup(1);
        router.show_page(&mut tree, &mut tl, &theme, 1, TransitionEffect::Fade, 0);
        // Mid fade-out: dots still hidden (old page was summary).
        tl.advance(&mut tree, 250);
        assert!(tree.is_hidden(router.dots[0]));
        // Crossover at 500 ms flips the indicator before fade-in finishes.
        for d in tl.advance(&mut tree, 500) {
            router.on_anim_done(&mut tree, &mut tl, &theme, &d, 500);
        }
        assert!(!tree.is_hidden(router.dots[0]));
    }
}
