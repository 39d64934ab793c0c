//! Property-animation timeline.
//!
//! One timeline serves the whole scene. Each entry tweens a single property
//! of a single node; starting a new animation on the same (node, property)
//! pair replaces the in-flight one; animations are cancelled, never queued.
//! [`Timeline::advance`] writes interpolated values into the tree and
//! returns the entries that just finished so callers can run completion
//! steps (hide the old page, clear a transform, reset an arc).

use stardeck_core::animation::{EasingFn, Tween};

use crate::node::{NodeId, SceneTree};

/// Which node property an animation drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnimProp {
    /// Node opacity, 0–100.
    Opacity,
    TranslateX,
    TranslateY,
    /// Node integer value (arc/bar progress, animated label payloads).
    Value,
}

/// A finished animation, reported once by [`Timeline::advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimDone {
    pub node: NodeId,
    pub prop: AnimProp,
    /// Caller-supplied tag carried through to completion handling.
    pub tag: u32,
}

#[derive(Debug)]
struct Entry {
    node: NodeId,
    prop: AnimProp,
    tween: Tween,
    start_ms: u64,
    tag: u32,
}

/// The scene's animation driver.
#[derive(Debug, Default)]
pub struct Timeline {
    entries: Vec<Entry>,
}

impl Timeline {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or replace) an animation. `tag` is reported on completion.
    pub fn start(
        &mut self,
        node: NodeId,
        prop: AnimProp,
        from: i32,
        to: i32,
        duration_ms: u32,
        easing: EasingFn,
        now_ms: u64,
        tag: u32,
    ) {
        self.entries.retain(|e| !(e.node == node && e.prop == prop));
        self.entries.push(Entry {
            node,
            prop,
            tween: Tween::new(from, to, duration_ms, easing),
            start_ms: now_ms,
            tag,
        });
    }

    /// Drop every animation for a node without applying end values.
    pub fn cancel(&mut self, node: NodeId) {
        self.entries.retain(|e| e.node != node);
    }

    /// Drop one property's animation without applying its end value.
    pub fn cancel_prop(&mut self, node: NodeId, prop: AnimProp) {
        self.entries.retain(|e| !(e.node == node && e.prop == prop));
    }

    #[must_use]
    pub fn is_animating(&self, node: NodeId, prop: AnimProp) -> bool {
        self.entries
            .iter()
            .any(|e| e.node == node && e.prop == prop)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Apply every animation's value at `now_ms` and return the entries that
    /// completed on this tick.
    pub fn advance(&mut self, tree: &mut SceneTree, now_ms: u64) -> Vec<AnimDone> {
        let mut done = Vec::new();
        for e in &self.entries {
            let elapsed = now_ms.saturating_sub(e.start_ms);
            apply(tree, e.node, e.prop, e.tween.value_at(elapsed));
            if e.tween.is_complete(elapsed) {
                done.push(AnimDone {
                    node: e.node,
                    prop: e.prop,
                    tag: e.tag,
                });
            }
        }
        self.entries.retain(|e| {
            let elapsed = now_ms.saturating_sub(e.start_ms);
            !e.tween.is_complete(elapsed)
        });
        done
    }
}

fn apply(tree: &mut SceneTree, node: NodeId, prop: AnimProp, value: i32) {
    match prop {
        AnimProp::Opacity => tree.set_opacity(node, value.clamp(0, 100) as u8),
        AnimProp::TranslateX => {
            let (_, y) = tree.translate(node);
            tree.set_translate(node, value, y);
        }
        AnimProp::TranslateY => {
            let (x, _) = tree.translate(node);
            tree.set_translate(node, x, value);
        }
        AnimProp::Value => tree.set_value(node, value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeKind;
    use stardeck_core::animation::{ease_out, linear};
    use stardeck_core::geometry::Rect;

    fn setup() -> (SceneTree, Timeline, NodeId) {
        let mut tree = SceneTree::new(Rect::from_size(720, 720));
        let node = tree.create(NodeKind::Arc, tree.root());
        (tree, Timeline::new(), node)
    }

    #[test]
    fn advance_applies_and_reports_completion_once() {
        let (mut tree, mut tl, node) = setup();
        tl.start(node, AnimProp::Value, 0, 100, 400, linear, 1_000, 7);
        assert!(tl.advance(&mut tree, 1_200).is_empty());
        assert_eq!(tree.value(node), 50);
        let done = tl.advance(&mut tree, 1_400);
        assert_eq!(
            done,
            vec![AnimDone {
                node,
                prop: AnimProp::Value,
                tag: 7
            }]
        );
        assert_eq!(tree.value(node), 100);
        assert!(tl.advance(&mut tree, 1_500).is_empty());
    }

    #[test]
    fn restart_replaces_in_flight_animation() {
        let (mut tree, mut tl, node) = setup();
        tl.start(node, AnimProp::Value, 0, 100, 400, linear, 0, 0);
        tl.advance(&mut tree, 200);
        tl.start(node, AnimProp::Value, 50, 0, 400, linear, 200, 1);
        assert_eq!(tl.len(), 1);
        tl.advance(&mut tree, 400);
        assert_eq!(tree.value(node), 25);
    }

    #[test]
    fn cancel_leaves_current_value() {
        let (mut tree, mut tl, node) = setup();
        tl.start(node, AnimProp::Value, 0, 100, 400, ease_out, 0, 0);
        tl.advance(&mut tree, 100);
        let mid = tree.value(node);
        tl.cancel(node);
        assert!(tl.advance(&mut tree, 400).is_empty());
        assert_eq!(tree.value(node), mid);
    }

    #[test]
    fn translate_axes_are_independent() {
        let (mut tree, mut tl, node) = setup();
        tree.set_translate(node, 0, 40);
        tl.start(node, AnimProp::TranslateX, -720, 0, 500, linear, 0, 0);
        tl.advance(&mut tree, 250);
        assert_eq!(tree.translate(node), (-360, 40));
    }

    #[test]
    fn zero_duration_completes_immediately() {
        let (mut tree, mut tl, node) = setup();
        tl.start(node, AnimProp::Opacity, 100, 0, 0, linear, 10, 3);
        let done = tl.advance(&mut tree, 10);
        assert_eq!(done.len(), 1);
        assert_eq!(tree.opacity(node), 0);
    }
}
