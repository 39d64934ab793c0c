//! Derived widget styles.
//!
//! The cache holds the handful of concrete styles every page applies to its
//! nodes (card chrome, small label, large value, header gradient, toast
//! chrome). It is rebuilt whenever the active palette, the widget-style
//! variant, or the global colour brightness changes; pages then re-apply by
//! walking their nodes.

use crate::color::Rgba;
use crate::palette::{Palette, Severity};

/// Card chrome variant selected in settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WidgetStyle {
    #[default]
    Default,
    SubtleBorder,
    Wireframe,
    SoftInset,
    FrostedGlass,
    AccentBar,
    Chamfered,
}

impl WidgetStyle {
    pub const ALL: &'static [WidgetStyle] = &[
        WidgetStyle::Default,
        WidgetStyle::SubtleBorder,
        WidgetStyle::Wireframe,
        WidgetStyle::SoftInset,
        WidgetStyle::FrostedGlass,
        WidgetStyle::AccentBar,
        WidgetStyle::Chamfered,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            WidgetStyle::Default => "Default",
            WidgetStyle::SubtleBorder => "Subtle Border",
            WidgetStyle::Wireframe => "Wireframe",
            WidgetStyle::SoftInset => "Soft Inset",
            WidgetStyle::FrostedGlass => "Frosted Glass",
            WidgetStyle::AccentBar => "Accent Bar",
            WidgetStyle::Chamfered => "Chamfered",
        }
    }

    /// Step to the neighbouring variant, wrapping at the ends.
    #[must_use]
    pub fn step(self, delta: i32) -> WidgetStyle {
        let len = Self::ALL.len() as i32;
        let idx = Self::ALL.iter().position(|s| *s == self).unwrap_or(0) as i32;
        Self::ALL[(idx + delta).rem_euclid(len) as usize]
    }
}

/// Font size tier, resolved to a face by the render backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum FontTier {
    Small,
    #[default]
    Medium,
    Large,
    Huge,
}

/// A concrete node style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Style {
    pub bg: Option<Rgba>,
    pub border_color: Option<Rgba>,
    pub border_width: i32,
    pub radius: i32,
    pub text_color: Option<Rgba>,
    pub font: FontTier,
}

impl Style {
    #[must_use]
    pub const fn text(color: Rgba, font: FontTier) -> Self {
        Self {
            bg: None,
            border_color: None,
            border_width: 0,
            radius: 0,
            text_color: Some(color),
            font,
        }
    }
}

/// The derived-style cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleCache {
    /// Bento card chrome.
    pub card: Style,
    /// Muted caption text.
    pub small_label: Style,
    /// Large metric value text.
    pub large_value: Style,
    /// Header band gradient endpoints.
    pub header_grad: (Rgba, Rgba),
    /// Page background.
    pub background: Rgba,
    /// Brightness-scaled copy of every palette slot the pages read directly.
    pub text: Rgba,
    pub label: Rgba,
    pub border: Rgba,
    pub progress: Rgba,
    pub filter: Rgba,
    pub accent_good: Rgba,
    pub accent_ok: Rgba,
    pub accent_bad: Rgba,
    pub accent_neutral: Rgba,
}

impl StyleCache {
    /// Rebuild every derived style from the palette, chrome variant, and the
    /// 0–100 colour-brightness dimmer.
    #[must_use]
    pub fn rebuild(palette: &Palette, widget_style: WidgetStyle, color_brightness: u8) -> Self {
        let dim = |c: Rgba| c.scale(color_brightness);

        let surface = dim(palette.surface);
        let border = dim(palette.border);
        let card = match widget_style {
            WidgetStyle::Default => Style {
                bg: Some(surface),
                border_color: Some(border),
                border_width: 1,
                radius: 16,
                text_color: Some(dim(palette.text)),
                font: FontTier::Medium,
            },
            WidgetStyle::SubtleBorder => Style {
                bg: Some(surface),
                border_color: Some(border.with_alpha(110)),
                border_width: 1,
                radius: 16,
                text_color: Some(dim(palette.text)),
                font: FontTier::Medium,
            },
            WidgetStyle::Wireframe => Style {
                bg: None,
                border_color: Some(border),
                border_width: 2,
                radius: 8,
                text_color: Some(dim(palette.text)),
                font: FontTier::Medium,
            },
            WidgetStyle::SoftInset => Style {
                bg: Some(surface.mix(dim(palette.background), 0.35)),
                border_color: None,
                border_width: 0,
                radius: 20,
                text_color: Some(dim(palette.text)),
                font: FontTier::Medium,
            },
            WidgetStyle::FrostedGlass => Style {
                bg: Some(surface.with_alpha(200)),
                border_color: Some(border.with_alpha(90)),
                border_width: 1,
                radius: 18,
                text_color: Some(dim(palette.text)),
                font: FontTier::Medium,
            },
            WidgetStyle::AccentBar => Style {
                bg: Some(surface),
                border_color: Some(dim(palette.progress)),
                border_width: 3,
                radius: 10,
                text_color: Some(dim(palette.text)),
                font: FontTier::Medium,
            },
            WidgetStyle::Chamfered => Style {
                bg: Some(surface),
                border_color: Some(border),
                border_width: 1,
                radius: 0,
                text_color: Some(dim(palette.text)),
                font: FontTier::Medium,
            },
        };

        let header_base = dim(palette.header);
        Self {
            card,
            small_label: Style::text(dim(palette.label), FontTier::Small),
            large_value: Style::text(dim(palette.text), FontTier::Large),
            header_grad: (header_base, header_base.mix(dim(palette.background), 0.6)),
            background: dim(palette.background),
            text: dim(palette.text),
            label: dim(palette.label),
            border,
            progress: dim(palette.progress),
            filter: dim(palette.filter),
            accent_good: dim(palette.accent_good),
            accent_ok: dim(palette.accent_ok),
            accent_bad: dim(palette.accent_bad),
            accent_neutral: dim(palette.accent_neutral),
        }
    }

    /// Brightness-scaled severity colour for toast chrome.
    #[must_use]
    pub fn severity(&self, palette: &Palette, severity: Severity, color_brightness: u8) -> Rgba {
        palette.severity(severity).scale(color_brightness)
    }
}
