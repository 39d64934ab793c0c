//! On-device configuration: consumed live, persisted only on explicit save.
//!
//! The file is JSON (serde). A missing or corrupt file falls back to
//! defaults; every numeric field is clamped into its documented range on
//! load so a hand-edited file cannot wedge the UI.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use stardeck_style::WidgetStyle;
use tracing::warn;

/// Page-switch animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TransitionEffect {
    Instant,
    #[default]
    Fade,
    SlideLeft,
    SlideRight,
}

impl TransitionEffect {
    pub const ALL: &'static [TransitionEffect] = &[
        TransitionEffect::Instant,
        TransitionEffect::Fade,
        TransitionEffect::SlideLeft,
        TransitionEffect::SlideRight,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            TransitionEffect::Instant => "Instant",
            TransitionEffect::Fade => "Fade",
            TransitionEffect::SlideLeft => "Slide Left",
            TransitionEffect::SlideRight => "Slide Right",
        }
    }

    #[must_use]
    pub fn step(self, delta: i32) -> TransitionEffect {
        let len = Self::ALL.len() as i32;
        let idx = Self::ALL.iter().position(|e| *e == self).unwrap_or(0) as i32;
        Self::ALL[(idx + delta).rem_euclid(len) as usize]
    }
}

/// Metric band thresholds, in the metric's native unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub good_max: f32,
    pub ok_max: f32,
}

impl Thresholds {
    /// Typical guiding: ≤0.7″ good, ≤1.2″ acceptable.
    #[must_use]
    pub const fn rms_default() -> Self {
        Self {
            good_max: 0.7,
            ok_max: 1.2,
        }
    }

    /// Typical focus: ≤2.5 good, ≤3.5 acceptable.
    #[must_use]
    pub const fn hfr_default() -> Self {
        Self {
            good_max: 2.5,
            ok_max: 3.5,
        }
    }
}

/// Per-instance connection and presentation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceConfig {
    pub url: String,
    /// Filter name → `0xRRGGBB`.
    #[serde(default)]
    pub filter_colors: BTreeMap<String, u32>,
    #[serde(default = "Thresholds::rms_default")]
    pub rms_thresholds: Thresholds,
    #[serde(default = "Thresholds::hfr_default")]
    pub hfr_thresholds: Thresholds,
}

impl InstanceConfig {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            filter_colors: BTreeMap::new(),
            rms_thresholds: Thresholds::rms_default(),
            hfr_thresholds: Thresholds::hfr_default(),
        }
    }

    /// Hostname portion of the URL, the last resort of the card-name
    /// fallback chain.
    #[must_use]
    pub fn host(&self) -> &str {
        let rest = self
            .url
            .split_once("://")
            .map_or(self.url.as_str(), |(_, r)| r);
        let rest = rest.split(['/', '?']).next().unwrap_or(rest);
        rest.split(':').next().unwrap_or(rest)
    }
}

/// The whole device configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub theme_index: usize,
    pub widget_style: WidgetStyle,
    /// Backlight, 0–100.
    pub brightness: u8,
    /// Global colour dimmer, 0–100.
    pub color_brightness: u8,
    /// Telemetry poll interval, 1–10 s.
    pub update_rate_s: u32,
    /// Graph refetch interval, 2–30 s.
    pub graph_update_interval_s: u32,
    pub auto_rotate_enabled: bool,
    /// 4–3600 s.
    pub auto_rotate_interval_s: u32,
    pub auto_rotate_effect: TransitionEffect,
    pub auto_rotate_skip_disconnected: bool,
    /// Toast lifetime, 3–30 s.
    pub toast_duration_s: u32,
    pub instances: Vec<InstanceConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme_index: 0,
            widget_style: WidgetStyle::Default,
            brightness: 80,
            color_brightness: 100,
            update_rate_s: 2,
            graph_update_interval_s: 5,
            auto_rotate_enabled: false,
            auto_rotate_interval_s: 30,
            auto_rotate_effect: TransitionEffect::Fade,
            auto_rotate_skip_disconnected: true,
            toast_duration_s: 8,
            instances: vec![InstanceConfig::new("http://localhost:1888")],
        }
    }
}

impl Config {
    /// Force every numeric field into its documented range.
    pub fn clamp_ranges(&mut self) {
        self.brightness = self.brightness.min(100);
        self.color_brightness = self.color_brightness.min(100);
        self.update_rate_s = self.update_rate_s.clamp(1, 10);
        self.graph_update_interval_s = self.graph_update_interval_s.clamp(2, 30);
        self.auto_rotate_interval_s = self.auto_rotate_interval_s.clamp(4, 3600);
        self.toast_duration_s = self.toast_duration_s.clamp(3, 30);
    }

    /// Auto-rotate interval stepper: 5 s steps below a minute, 10 s above.
    #[must_use]
    pub fn rotate_interval_step(interval_s: u32) -> u32 {
        if interval_s < 60 { 5 } else { 10 }
    }

    /// Load from disk; any failure yields defaults.
    #[must_use]
    pub fn load(path: &Path) -> Self {
        let mut cfg = match fs::read_to_string(path) {
            Ok(text) => match serde_json::from_str::<Config>(&text) {
                Ok(cfg) => cfg,
                Err(err) => {
                    warn!(%err, "config file corrupt, using defaults");
                    Config::default()
                }
            },
            Err(_) => Config::default(),
        };
        cfg.clamp_ranges();
        cfg
    }

    /// Persist to disk. Called only from the Save button.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let text = serde_json::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        fs::write(path, text).map_err(ConfigError::Io)
    }
}

/// Failure saving the configuration.
#[derive(Debug)]
pub enum ConfigError {
    Io(io::Error),
    Serialize(serde_json::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "config write failed: {err}"),
            ConfigError::Serialize(err) => write!(f, "config encode failed: {err}"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_pulls_fields_into_range() {
        let mut cfg = Config {
            update_rate_s: 0,
            graph_update_interval_s: 300,
            auto_rotate_interval_s: 1,
            toast_duration_s: 99,
            ..Config::default()
        };
        cfg.clamp_ranges();
        assert_eq!(cfg.update_rate_s, 1);
        assert_eq!(cfg.graph_update_interval_s, 30);
        assert_eq!(cfg.auto_rotate_interval_s, 4);
        assert_eq!(cfg.toast_duration_s, 30);
    }

    #[test]
    fn rotate_step_changes_at_one_minute() {
        assert_eq!(Config::rotate_interval_step(4), 5);
        assert_eq!(Config::rotate_interval_step(59), 5);
        assert_eq!(Config::rotate_interval_step(60), 10);
    }

    #[test]
    fn host_strips_scheme_port_and_path() {
        let i = InstanceConfig::new("http://astro-rig.local:1888/api");
        assert_eq!(i.host(), "astro-rig.local");
        let bare = InstanceConfig::new("10.0.0.7:1888");
        assert_eq!(bare.host(), "10.0.0.7");
    }

    #[test]
    fn save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stardeck.json");
        let mut cfg = Config::default();
        cfg.theme_index = 2;
        cfg.instances[0]
            .filter_colors
            .insert("Ha".into(), 0xCC_3344);
        cfg.save(&path).unwrap();
        let loaded = Config::load(&path);
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn corrupt_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stardeck.json");
        fs::write(&path, "{not json").unwrap();
        assert_eq!(Config::load(&path), Config::default());
    }
}
