//! Synchronous layout pass.
//!
//! Containers lay their children out with either a flex flow (one axis,
//! fixed/grow sizing) or a fixed track grid. The pass resolves absolute
//! rects top-down in one walk; callers that need fresh geometry mid-update
//! (the summary FLIP reads positions between "last" and "invert") just call
//! [`SceneTree::layout`] again.
//!
//! Hidden nodes are excluded from flow, so hiding a card reflows its
//! siblings. Floating nodes keep their explicit rects. Translation is a
//! render-time transform and never feeds back into layout.

use stardeck_core::geometry::{Rect, Sides};

use crate::node::{NodeFlags, NodeId, SceneTree};

/// Flex main axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Axis {
    Horizontal,
    #[default]
    Vertical,
}

/// One dimension of a node's size request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dim {
    /// Exactly this many pixels.
    Fixed(i32),
    /// Share of the leftover space, weighted.
    Grow(u16),
}

impl Default for Dim {
    fn default() -> Self {
        Dim::Grow(1)
    }
}

/// Size request for both axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SizePolicy {
    pub width: Dim,
    pub height: Dim,
}

impl SizePolicy {
    #[must_use]
    pub const fn fixed(width: i32, height: i32) -> Self {
        Self {
            width: Dim::Fixed(width),
            height: Dim::Fixed(height),
        }
    }

    #[must_use]
    pub const fn fixed_height(height: i32) -> Self {
        Self {
            width: Dim::Grow(1),
            height: Dim::Fixed(height),
        }
    }
}

/// A grid track size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Track {
    Px(i32),
    Fr(u16),
}

/// Grid cell assignment for a child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridPlacement {
    pub col: usize,
    pub row: usize,
    pub col_span: usize,
    pub row_span: usize,
}

impl GridPlacement {
    #[must_use]
    pub const fn cell(col: usize, row: usize) -> Self {
        Self {
            col,
            row,
            col_span: 1,
            row_span: 1,
        }
    }

    #[must_use]
    pub const fn span(col: usize, row: usize, col_span: usize, row_span: usize) -> Self {
        Self {
            col,
            row,
            col_span,
            row_span,
        }
    }
}

/// How a container arranges its children.
#[derive(Debug, Clone, Default)]
pub enum LayoutSpec {
    /// Children keep explicit rects.
    #[default]
    Manual,
    Flex {
        axis: Axis,
        gap: i32,
        padding: Sides,
    },
    Grid {
        cols: Vec<Track>,
        rows: Vec<Track>,
        gap: i32,
        padding: Sides,
    },
}

impl SceneTree {
    pub fn set_layout(&mut self, id: NodeId, layout: LayoutSpec) {
        if let Some(n) = self.get_mut(id) {
            n.layout = layout;
        }
    }

    pub fn set_size(&mut self, id: NodeId, size: SizePolicy) {
        if let Some(n) = self.get_mut(id) {
            n.size = size;
        }
    }

    pub fn set_grid_placement(&mut self, id: NodeId, placement: GridPlacement) {
        if let Some(n) = self.get_mut(id) {
            n.grid = Some(placement);
        }
    }

    /// Resolve every non-floating node's rect, top-down from the root.
    pub fn layout(&mut self) {
        let root = self.root();
        let viewport = self.viewport();
        if let Some(n) = self.get_mut(root) {
            n.rect = viewport;
        }
        self.layout_children(root);
    }

    fn layout_children(&mut self, id: NodeId) {
        let Some(node) = self.get(id) else { return };
        let content = node.rect;
        let spec = node.layout.clone();
        let children = node.children.clone();

        let flowing: Vec<NodeId> = children
            .iter()
            .copied()
            .filter(|c| {
                self.get(*c).is_some_and(|n| {
                    !n.flags.contains(NodeFlags::HIDDEN) && !n.flags.contains(NodeFlags::FLOATING)
                })
            })
            .collect();

        match spec {
            LayoutSpec::Manual => {}
            LayoutSpec::Flex { axis, gap, padding } => {
                self.flex_pass(&flowing, content.inner(padding), axis, gap);
            }
            LayoutSpec::Grid {
                cols,
                rows,
                gap,
                padding,
            } => {
                self.grid_pass(&flowing, content.inner(padding), &cols, &rows, gap);
            }
        }

        for child in children {
            self.layout_children(child);
        }
    }

    fn flex_pass(&mut self, children: &[NodeId], area: Rect, axis: Axis, gap: i32) {
        if children.is_empty() {
            return;
        }
        let gaps = gap * (children.len() as i32 - 1);
        let main_total = match axis {
            Axis::Horizontal => area.width,
            Axis::Vertical => area.height,
        } - gaps;

        let mut fixed_sum = 0i32;
        let mut grow_sum = 0u32;
        for c in children {
            let dim = self.main_dim(*c, axis);
            match dim {
                Dim::Fixed(px) => fixed_sum += px,
                Dim::Grow(w) => grow_sum += u32::from(w),
            }
        }
        let leftover = (main_total - fixed_sum).max(0);

        let mut cursor = match axis {
            Axis::Horizontal => area.x,
            Axis::Vertical => area.y,
        };
        let mut grow_used = 0i32;
        let mut grow_seen = 0u32;
        for c in children {
            let main = match self.main_dim(*c, axis) {
                Dim::Fixed(px) => px.max(0),
                Dim::Grow(w) => {
                    // Distribute remainder pixels to the last grower.
                    grow_seen += u32::from(w);
                    let target = if grow_sum == 0 {
                        0
                    } else {
                        (i64::from(leftover) * i64::from(grow_seen) / i64::from(grow_sum)) as i32
                    };
                    let px = target - grow_used;
                    grow_used = target;
                    px
                }
            };
            let cross = self.cross_dim(*c, axis);
            let rect = match axis {
                Axis::Horizontal => {
                    let h = match cross {
                        Dim::Fixed(px) => px.min(area.height),
                        Dim::Grow(_) => area.height,
                    };
                    Rect::new(cursor, area.y, main, h)
                }
                Axis::Vertical => {
                    let w = match cross {
                        Dim::Fixed(px) => px.min(area.width),
                        Dim::Grow(_) => area.width,
                    };
                    Rect::new(area.x, cursor, w, main)
                }
            };
            if let Some(n) = self.get_mut(*c) {
                n.rect = rect;
            }
            cursor += main + gap;
        }
    }

    fn main_dim(&self, id: NodeId, axis: Axis) -> Dim {
        let size = self.get(id).map(|n| n.size).unwrap_or_default();
        match axis {
            Axis::Horizontal => size.width,
            Axis::Vertical => size.height,
        }
    }

    fn cross_dim(&self, id: NodeId, axis: Axis) -> Dim {
        let size = self.get(id).map(|n| n.size).unwrap_or_default();
        match axis {
            Axis::Horizontal => size.height,
            Axis::Vertical => size.width,
        }
    }

    fn grid_pass(
        &mut self,
        children: &[NodeId],
        area: Rect,
        cols: &[Track],
        rows: &[Track],
        gap: i32,
    ) {
        let col_edges = resolve_tracks(cols, area.width, gap);
        let row_edges = resolve_tracks(rows, area.height, gap);

        for c in children {
            let Some(place) = self.get(*c).and_then(|n| n.grid) else {
                continue;
            };
            let (x0, x1) = span_bounds(&col_edges, place.col, place.col_span);
            let (y0, y1) = span_bounds(&row_edges, place.row, place.row_span);
            if let Some(n) = self.get_mut(*c) {
                n.rect = Rect::new(area.x + x0, area.y + y0, x1 - x0, y1 - y0);
            }
        }
    }
}

/// Track offsets and sizes as `(start, size)` pairs.
fn resolve_tracks(tracks: &[Track], total: i32, gap: i32) -> Vec<(i32, i32)> {
    if tracks.is_empty() {
        return Vec::new();
    }
    let gaps = gap * (tracks.len() as i32 - 1);
    let fixed_sum: i32 = tracks
        .iter()
        .map(|t| match t {
            Track::Px(px) => *px,
            Track::Fr(_) => 0,
        })
        .sum();
    let fr_sum: u32 = tracks
        .iter()
        .map(|t| match t {
            Track::Px(_) => 0,
            Track::Fr(w) => u32::from(*w),
        })
        .sum();
    let leftover = (total - gaps - fixed_sum).max(0);

    let mut out = Vec::with_capacity(tracks.len());
    let mut cursor = 0i32;
    let mut fr_used = 0i32;
    let mut fr_seen = 0u32;
    for t in tracks {
        let size = match t {
            Track::Px(px) => (*px).max(0),
            Track::Fr(w) => {
                fr_seen += u32::from(*w);
                let target = if fr_sum == 0 {
                    0
                } else {
                    (i64::from(leftover) * i64::from(fr_seen) / i64::from(fr_sum)) as i32
                };
                let px = target - fr_used;
                fr_used = target;
                px
            }
        };
        out.push((cursor, size));
        cursor += size + gap;
    }
    out
}

/// Pixel bounds of a `span`-track run starting at `start`.
fn span_bounds(edges: &[(i32, i32)], start: usize, span: usize) -> (i32, i32) {
    if edges.is_empty() {
        return (0, 0);
    }
    let start = start.min(edges.len() - 1);
    let end = (start + span.max(1) - 1).min(edges.len() - 1);
    let (x0, _) = edges[start];
    let (xs, w) = edges[end];
    (x0, xs + w)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeKind;

    fn tree() -> SceneTree {
        SceneTree::new(Rect::from_size(720, 720))
    }

    #[test]
    fn vertical_flex_stacks_and_grows() {
        let mut t = tree();
        let root = t.root();
        t.set_layout(
            root,
            LayoutSpec::Flex {
                axis: Axis::Vertical,
                gap: 10,
                padding: Sides::all(0),
            },
        );
        let a = t.create(NodeKind::Container, root);
        t.set_size(a, SizePolicy::fixed_height(100));
        let b = t.create(NodeKind::Container, root);
        let c = t.create(NodeKind::Container, root);
        t.layout();
        assert_eq!(t.rect(a), Rect::new(0, 0, 720, 100));
        assert_eq!(t.rect(b).y, 110);
        // 720 - 100 - 2 gaps = 600 split across two growers
        assert_eq!(t.rect(b).height + t.rect(c).height, 600);
        assert_eq!(t.rect(c).bottom(), 720);
    }

    #[test]
    fn hidden_children_reflow_siblings() {
        let mut t = tree();
        let root = t.root();
        t.set_layout(
            root,
            LayoutSpec::Flex {
                axis: Axis::Vertical,
                gap: 0,
                padding: Sides::all(0),
            },
        );
        let a = t.create(NodeKind::Container, root);
        t.set_size(a, SizePolicy::fixed_height(200));
        let b = t.create(NodeKind::Container, root);
        t.set_size(b, SizePolicy::fixed_height(200));
        t.layout();
        assert_eq!(t.abs_y(b), 200);
        t.set_hidden(a, true);
        t.layout();
        assert_eq!(t.abs_y(b), 0);
    }

    #[test]
    fn floating_nodes_keep_explicit_rect() {
        let mut t = tree();
        let root = t.root();
        t.set_layout(
            root,
            LayoutSpec::Flex {
                axis: Axis::Vertical,
                gap: 0,
                padding: Sides::all(0),
            },
        );
        let float = t.create(NodeKind::Label, root);
        t.set_flag(float, NodeFlags::FLOATING, true);
        t.set_rect(float, Rect::new(600, 8, 100, 24));
        t.layout();
        assert_eq!(t.rect(float), Rect::new(600, 8, 100, 24));
    }

    #[test]
    fn grid_places_spans() {
        let mut t = tree();
        let root = t.root();
        t.set_layout(
            root,
            LayoutSpec::Grid {
                cols: vec![Track::Fr(1), Track::Fr(1)],
                rows: vec![Track::Px(100), Track::Fr(1), Track::Fr(1)],
                gap: 0,
                padding: Sides::all(0),
            },
        );
        let header = t.create(NodeKind::Container, root);
        t.set_grid_placement(header, GridPlacement::span(0, 0, 2, 1));
        let left = t.create(NodeKind::Container, root);
        t.set_grid_placement(left, GridPlacement::span(0, 1, 1, 2));
        let right = t.create(NodeKind::Container, root);
        t.set_grid_placement(right, GridPlacement::cell(1, 1));
        t.layout();
        assert_eq!(t.rect(header), Rect::new(0, 0, 720, 100));
        assert_eq!(t.rect(left), Rect::new(0, 100, 360, 620));
        assert_eq!(t.rect(right), Rect::new(360, 100, 360, 310));
    }

    #[test]
    fn grid_track_remainders_cover_total() {
        let edges = resolve_tracks(&[Track::Fr(1), Track::Fr(1), Track::Fr(1)], 100, 0);
        let total: i32 = edges.iter().map(|(_, w)| w).sum();
        assert_eq!(total, 100);
    }
}
