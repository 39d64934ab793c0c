#![forbid(unsafe_code)]

//! The stardeck application: pages, overlays, routing, toast presentation,
//! and the telemetry/config data model, composed on top of the retained
//! scene, style, and runtime crates.

pub mod app;
pub mod config;
pub mod format;
pub mod overlay;
pub mod pages;
pub mod router;
pub mod tags;
pub mod telemetry;
pub mod theme;
pub mod threshold;
pub mod toast;

pub use app::App;
pub use config::{Config, InstanceConfig, Thresholds, TransitionEffect};
pub use telemetry::{HfrHistory, InstanceTelemetry, PowerBlock, RmsHistory, TelemetryFrame};
pub use theme::ThemeState;
