#![forbid(unsafe_code)]

//! Styling for the stardeck dashboard: the colour type, the ordered palette
//! registry (including the monochrome red low-light scheme), and the cache of
//! derived widget styles rebuilt on palette or brightness changes.

pub mod color;
pub mod palette;
pub mod stylesheet;

pub use color::Rgba;
pub use palette::{Palette, PaletteId, Severity};
pub use stylesheet::{FontTier, Style, StyleCache, WidgetStyle};
