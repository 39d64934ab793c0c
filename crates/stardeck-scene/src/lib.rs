#![forbid(unsafe_code)]

//! The retained scene model the dashboard composes.
//!
//! This is the surface the opaque widget toolkit exposes to the UI core: a
//! tree of styled nodes (containers, labels, arcs, bars, charts, sliders)
//! with visibility, opacity and translation, a synchronous flex/grid layout
//! pass, and a property-animation timeline advanced by the cooperative tick.
//! Rasterising the tree is the display backend's job and out of scope here;
//! tests assert on the tree directly.

pub mod chart;
pub mod layout;
pub mod node;
pub mod timeline;

pub use chart::{ChartData, ChartSeries, ThresholdLine};
pub use layout::{Axis, Dim, GridPlacement, LayoutSpec, SizePolicy, Track};
pub use node::{NodeFlags, NodeId, NodeKind, SceneTree};
pub use timeline::{AnimDone, AnimProp, Timeline};
