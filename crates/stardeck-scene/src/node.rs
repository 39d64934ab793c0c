//! The node arena.
//!
//! Nodes are addressed by generational ids so a stale handle held across a
//! subtree teardown resolves to `None` instead of a recycled widget. Every
//! mutator is a silent no-op on a dead id; the UI core never branches on
//! widget liveness.

use bitflags::bitflags;
use stardeck_core::geometry::Rect;
use stardeck_style::Style;

use crate::chart::ChartData;
use crate::layout::{GridPlacement, LayoutSpec, SizePolicy};

/// Generational node handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl NodeId {
    /// Pack into a transportable integer (input queue payloads).
    #[must_use]
    pub const fn to_raw(self) -> u64 {
        ((self.generation as u64) << 32) | self.index as u64
    }

    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self {
            index: raw as u32,
            generation: (raw >> 32) as u32,
        }
    }
}

/// What a node renders as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeKind {
    #[default]
    Container,
    Label,
    /// Circular progress arc, value 0–100.
    Arc,
    /// Horizontal progress bar, value 0–100.
    Bar,
    /// Multi-series line chart; payload in [`ChartData`].
    Chart,
    Slider,
    Button,
}

bitflags! {
    /// Node state flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct NodeFlags: u8 {
        /// Not rendered and excluded from layout flow.
        const HIDDEN = 1 << 0;
        /// Positioned by explicit rect, outside the parent's flow.
        const FLOATING = 1 << 1;
        /// Participates in tap hit-testing.
        const CLICKABLE = 1 << 2;
    }
}

#[derive(Debug, Default)]
pub(crate) struct Node {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub layout: LayoutSpec,
    pub size: SizePolicy,
    pub grid: Option<GridPlacement>,
    /// Resolved by the layout pass (absolute screen coordinates). Floating
    /// nodes keep whatever rect was set explicitly.
    pub rect: Rect,
    pub flags: NodeFlags,
    /// 0–100.
    pub opacity: u8,
    pub translate: (i32, i32),
    pub style: Style,
    pub text: String,
    pub value: i32,
    pub chart: Option<Box<ChartData>>,
}

struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// The retained tree. The UI task is its only owner.
pub struct SceneTree {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: NodeId,
    viewport: Rect,
}

impl SceneTree {
    /// Create a tree with a root container covering the viewport.
    #[must_use]
    pub fn new(viewport: Rect) -> Self {
        let mut tree = Self {
            slots: Vec::with_capacity(256),
            free: Vec::new(),
            root: NodeId {
                index: 0,
                generation: 0,
            },
            viewport,
        };
        let root = tree.alloc(Node {
            opacity: 100,
            rect: viewport,
            ..Node::default()
        });
        tree.root = root;
        tree
    }

    #[must_use]
    pub const fn root(&self) -> NodeId {
        self.root
    }

    #[must_use]
    pub const fn viewport(&self) -> Rect {
        self.viewport
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            NodeId {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                node: Some(node),
            });
            NodeId {
                index,
                generation: 0,
            }
        }
    }

    pub(crate) fn get(&self, id: NodeId) -> Option<&Node> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_ref()
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_mut()
    }

    /// Create a node attached to `parent`.
    pub fn create(&mut self, kind: NodeKind, parent: NodeId) -> NodeId {
        let id = self.alloc(Node {
            kind,
            parent: Some(parent),
            opacity: 100,
            chart: matches!(kind, NodeKind::Chart).then(|| Box::new(ChartData::default())),
            ..Node::default()
        });
        if let Some(p) = self.get_mut(parent) {
            p.children.push(id);
        }
        id
    }

    /// Remove a node and its whole subtree. Stale handles go dead.
    pub fn remove(&mut self, id: NodeId) {
        let Some(node) = self.get(id) else { return };
        let parent = node.parent;
        let children = node.children.clone();
        for child in children {
            self.remove(child);
        }
        if let Some(parent) = parent
            && let Some(p) = self.get_mut(parent)
        {
            p.children.retain(|c| *c != id);
        }
        let slot = &mut self.slots[id.index as usize];
        slot.node = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
    }

    /// Detach and remove every child of `parent`, keeping the parent.
    pub fn clear_children(&mut self, parent: NodeId) {
        let children = self
            .get(parent)
            .map(|n| n.children.clone())
            .unwrap_or_default();
        for child in children {
            self.remove(child);
        }
    }

    #[must_use]
    pub fn exists(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.parent
    }

    #[must_use]
    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.get(id).map(|n| n.kind)
    }

    // -- flags ------------------------------------------------------------

    pub fn set_hidden(&mut self, id: NodeId, hidden: bool) {
        if let Some(n) = self.get_mut(id) {
            n.flags.set(NodeFlags::HIDDEN, hidden);
        }
    }

    #[must_use]
    pub fn is_hidden(&self, id: NodeId) -> bool {
        self.get(id)
            .is_none_or(|n| n.flags.contains(NodeFlags::HIDDEN))
    }

    /// Hidden, or inside a hidden ancestor.
    #[must_use]
    pub fn is_effectively_hidden(&self, id: NodeId) -> bool {
        let mut cursor = Some(id);
        while let Some(cur) = cursor {
            let Some(node) = self.get(cur) else {
                return true;
            };
            if node.flags.contains(NodeFlags::HIDDEN) {
                return true;
            }
            cursor = node.parent;
        }
        false
    }

    pub fn set_flag(&mut self, id: NodeId, flag: NodeFlags, on: bool) {
        if let Some(n) = self.get_mut(id) {
            n.flags.set(flag, on);
        }
    }

    #[must_use]
    pub fn has_flag(&self, id: NodeId, flag: NodeFlags) -> bool {
        self.get(id).is_some_and(|n| n.flags.contains(flag))
    }

    // -- transform --------------------------------------------------------

    pub fn set_opacity(&mut self, id: NodeId, opacity: u8) {
        if let Some(n) = self.get_mut(id) {
            n.opacity = opacity.min(100);
        }
    }

    #[must_use]
    pub fn opacity(&self, id: NodeId) -> u8 {
        self.get(id).map_or(0, |n| n.opacity)
    }

    pub fn set_translate(&mut self, id: NodeId, x: i32, y: i32) {
        if let Some(n) = self.get_mut(id) {
            n.translate = (x, y);
        }
    }

    #[must_use]
    pub fn translate(&self, id: NodeId) -> (i32, i32) {
        self.get(id).map_or((0, 0), |n| n.translate)
    }

    /// Reset opacity to fully visible and clear any translation.
    pub fn clear_transform(&mut self, id: NodeId) {
        if let Some(n) = self.get_mut(id) {
            n.opacity = 100;
            n.translate = (0, 0);
        }
    }

    // -- content ----------------------------------------------------------

    /// Set label text only if it changed; returns whether a write happened.
    /// The guard keeps unchanged labels out of the dirty set.
    pub fn set_text(&mut self, id: NodeId, text: &str) -> bool {
        match self.get_mut(id) {
            Some(n) if n.text != text => {
                n.text.clear();
                n.text.push_str(text);
                true
            }
            _ => false,
        }
    }

    #[must_use]
    pub fn text(&self, id: NodeId) -> &str {
        self.get(id).map_or("", |n| n.text.as_str())
    }

    pub fn set_value(&mut self, id: NodeId, value: i32) {
        if let Some(n) = self.get_mut(id) {
            n.value = value;
        }
    }

    #[must_use]
    pub fn value(&self, id: NodeId) -> i32 {
        self.get(id).map_or(0, |n| n.value)
    }

    pub fn set_style(&mut self, id: NodeId, style: Style) {
        if let Some(n) = self.get_mut(id) {
            n.style = style;
        }
    }

    #[must_use]
    pub fn style(&self, id: NodeId) -> Style {
        self.get(id).map(|n| n.style).unwrap_or_default()
    }

    #[must_use]
    pub fn chart(&self, id: NodeId) -> Option<&ChartData> {
        self.get(id)?.chart.as_deref()
    }

    pub fn chart_mut(&mut self, id: NodeId) -> Option<&mut ChartData> {
        self.get_mut(id)?.chart.as_deref_mut()
    }

    // -- geometry ---------------------------------------------------------

    /// Explicit placement for floating nodes.
    pub fn set_rect(&mut self, id: NodeId, rect: Rect) {
        if let Some(n) = self.get_mut(id) {
            n.rect = rect;
        }
    }

    /// Layout-resolved rect, before translation.
    #[must_use]
    pub fn rect(&self, id: NodeId) -> Rect {
        self.get(id).map(|n| n.rect).unwrap_or_default()
    }

    /// Layout-resolved Y, before translation. FLIP snapshots read this.
    #[must_use]
    pub fn abs_y(&self, id: NodeId) -> i32 {
        self.rect(id).y
    }

    /// Topmost clickable node containing the point, searching depth-first
    /// from the end so later siblings (drawn on top) win.
    #[must_use]
    pub fn hit_test(&self, x: i32, y: i32) -> Option<NodeId> {
        self.hit_test_in(self.root, x, y)
    }

    fn hit_test_in(&self, id: NodeId, x: i32, y: i32) -> Option<NodeId> {
        let node = self.get(id)?;
        if node.flags.contains(NodeFlags::HIDDEN) {
            return None;
        }
        let (tx, ty) = node.translate;
        for child in node.children.iter().rev() {
            if let Some(hit) = self.hit_test_in(*child, x - tx, y - ty) {
                return Some(hit);
            }
        }
        (node.flags.contains(NodeFlags::CLICKABLE) && node.rect.contains(x - tx, y - ty))
            .then_some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> SceneTree {
        SceneTree::new(Rect::from_size(720, 720))
    }

    #[test]
    fn stale_handle_is_silent() {
        let mut t = tree();
        let root = t.root();
        let label = t.create(NodeKind::Label, root);
        t.remove(label);
        assert!(!t.exists(label));
        t.set_opacity(label, 50);
        assert_eq!(t.opacity(label), 0);
        assert!(!t.set_text(label, "gone"));
    }

    #[test]
    fn generation_prevents_recycled_access() {
        let mut t = tree();
        let root = t.root();
        let a = t.create(NodeKind::Label, root);
        t.remove(a);
        let b = t.create(NodeKind::Label, root);
        assert_eq!(a.index, b.index);
        assert!(!t.exists(a));
        assert!(t.exists(b));
    }

    #[test]
    fn set_text_guards_unchanged_writes() {
        let mut t = tree();
        let root = t.root();
        let label = t.create(NodeKind::Label, root);
        assert!(t.set_text(label, "1.25\""));
        assert!(!t.set_text(label, "1.25\""));
        assert!(t.set_text(label, "1.26\""));
    }

    #[test]
    fn remove_tears_down_subtree() {
        let mut t = tree();
        let root = t.root();
        let card = t.create(NodeKind::Container, root);
        let inner = t.create(NodeKind::Label, card);
        t.remove(card);
        assert!(!t.exists(inner));
        assert!(t.children(root).is_empty());
    }

    #[test]
    fn effective_hidden_inherits_from_ancestors() {
        let mut t = tree();
        let root = t.root();
        let page = t.create(NodeKind::Container, root);
        let label = t.create(NodeKind::Label, page);
        assert!(!t.is_effectively_hidden(label));
        t.set_hidden(page, true);
        assert!(t.is_effectively_hidden(label));
        assert!(!t.is_hidden(label));
    }

    #[test]
    fn hit_test_prefers_topmost_and_skips_hidden() {
        let mut t = tree();
        let root = t.root();
        let below = t.create(NodeKind::Button, root);
        t.set_rect(below, Rect::new(0, 0, 100, 100));
        t.set_flag(below, NodeFlags::CLICKABLE, true);
        let above = t.create(NodeKind::Button, root);
        t.set_rect(above, Rect::new(0, 0, 100, 100));
        t.set_flag(above, NodeFlags::CLICKABLE, true);
        assert_eq!(t.hit_test(10, 10), Some(above));
        t.set_hidden(above, true);
        assert_eq!(t.hit_test(10, 10), Some(below));
    }

    #[test]
    fn raw_roundtrip() {
        let mut t = tree();
        let id = t.create(NodeKind::Slider, t.root());
        assert_eq!(NodeId::from_raw(id.to_raw()), id);
    }
}
