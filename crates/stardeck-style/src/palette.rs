//! The ordered registry of named colour schemes.
//!
//! A palette is a fixed record of semantic slots; the dashboard never asks
//! for "red", it asks for `accent_bad` or `severity(Error)`. The `night-red`
//! palette is the monochrome low-light scheme used at the telescope: every
//! accent is a shade of red and [`Palette::forces_palette_colors`] reports
//! true so filter/series colour shortcuts fall back to palette slots.

use crate::color::Rgba;

/// Index of a palette in the registry.
pub type PaletteId = usize;

/// Notification severity, used to pick toast and event-log colours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

/// A named colour scheme: one fixed record of semantic slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    pub name: &'static str,
    /// Page background.
    pub background: Rgba,
    /// Bento card surface.
    pub surface: Rgba,
    /// Card border.
    pub border: Rgba,
    /// Muted caption/label text.
    pub label: Rgba,
    /// Primary text.
    pub text: Rgba,
    /// Header band base colour (gradient is derived from it).
    pub header: Rgba,
    /// Exposure-progress arc/bar fallback colour.
    pub progress: Rgba,
    /// Generic filter badge colour when no per-filter mapping exists.
    pub filter: Rgba,
    /// Metric band colours.
    pub accent_good: Rgba,
    pub accent_ok: Rgba,
    pub accent_bad: Rgba,
    /// Neutral metric accent (stars, counters).
    pub accent_neutral: Rgba,
    /// Toast severity colours.
    pub info: Rgba,
    pub success: Rgba,
    pub warning: Rgba,
    pub error: Rgba,
    /// All accents are shades of red; colour shortcuts must fall back to
    /// palette slots.
    monochrome_red: bool,
}

impl Palette {
    /// Number of registered palettes.
    #[must_use]
    pub fn count() -> usize {
        REGISTRY.len()
    }

    /// Palette by registry index, wrapping out-of-range indices.
    #[must_use]
    pub fn by_index(index: PaletteId) -> &'static Palette {
        &REGISTRY[index % REGISTRY.len()]
    }

    /// Registry index of this palette, by name identity.
    #[must_use]
    pub fn index_of(&self) -> PaletteId {
        REGISTRY
            .iter()
            .position(|p| p.name == self.name)
            .unwrap_or(0)
    }

    /// Whether accent shortcuts must yield to palette colours.
    #[must_use]
    pub const fn forces_palette_colors(&self) -> bool {
        self.monochrome_red
    }

    /// Toast/event colour for a severity.
    #[must_use]
    pub const fn severity(&self, severity: Severity) -> Rgba {
        match severity {
            Severity::Info => self.info,
            Severity::Success => self.success,
            Severity::Warning => self.warning,
            Severity::Error => self.error,
        }
    }

    const fn deep_space() -> Palette {
        Palette {
            name: "Deep Space",
            background: Rgba::rgb(11, 13, 20),
            surface: Rgba::rgb(24, 28, 40),
            border: Rgba::rgb(46, 52, 70),
            label: Rgba::rgb(130, 138, 160),
            text: Rgba::rgb(226, 230, 240),
            header: Rgba::rgb(32, 40, 66),
            progress: Rgba::rgb(86, 156, 255),
            filter: Rgba::rgb(110, 126, 160),
            accent_good: Rgba::rgb(74, 196, 124),
            accent_ok: Rgba::rgb(235, 186, 76),
            accent_bad: Rgba::rgb(236, 86, 86),
            accent_neutral: Rgba::rgb(150, 160, 190),
            info: Rgba::rgb(70, 130, 220),
            success: Rgba::rgb(60, 160, 100),
            warning: Rgba::rgb(200, 150, 40),
            error: Rgba::rgb(190, 60, 60),
            monochrome_red: false,
        }
    }

    const fn graphite() -> Palette {
        Palette {
            name: "Graphite",
            background: Rgba::rgb(16, 16, 18),
            surface: Rgba::rgb(30, 30, 34),
            border: Rgba::rgb(54, 54, 60),
            label: Rgba::rgb(140, 140, 148),
            text: Rgba::rgb(232, 232, 236),
            header: Rgba::rgb(40, 40, 46),
            progress: Rgba::rgb(120, 190, 255),
            filter: Rgba::rgb(120, 128, 140),
            accent_good: Rgba::rgb(108, 200, 130),
            accent_ok: Rgba::rgb(226, 192, 92),
            accent_bad: Rgba::rgb(230, 100, 100),
            accent_neutral: Rgba::rgb(160, 164, 176),
            info: Rgba::rgb(92, 144, 220),
            success: Rgba::rgb(84, 170, 110),
            warning: Rgba::rgb(208, 160, 60),
            error: Rgba::rgb(198, 72, 72),
            monochrome_red: false,
        }
    }

    const fn nebula() -> Palette {
        Palette {
            name: "Nebula",
            background: Rgba::rgb(16, 10, 26),
            surface: Rgba::rgb(34, 24, 52),
            border: Rgba::rgb(62, 46, 92),
            label: Rgba::rgb(150, 134, 180),
            text: Rgba::rgb(236, 228, 250),
            header: Rgba::rgb(48, 32, 78),
            progress: Rgba::rgb(176, 120, 255),
            filter: Rgba::rgb(140, 120, 180),
            accent_good: Rgba::rgb(96, 208, 160),
            accent_ok: Rgba::rgb(240, 180, 100),
            accent_bad: Rgba::rgb(244, 96, 120),
            accent_neutral: Rgba::rgb(170, 156, 200),
            info: Rgba::rgb(130, 110, 230),
            success: Rgba::rgb(80, 176, 140),
            warning: Rgba::rgb(214, 156, 70),
            error: Rgba::rgb(206, 70, 96),
            monochrome_red: false,
        }
    }

    const fn horizon() -> Palette {
        Palette {
            name: "Horizon",
            background: Rgba::rgb(20, 16, 12),
            surface: Rgba::rgb(38, 30, 24),
            border: Rgba::rgb(70, 56, 44),
            label: Rgba::rgb(168, 148, 128),
            text: Rgba::rgb(244, 234, 222),
            header: Rgba::rgb(56, 42, 30),
            progress: Rgba::rgb(240, 160, 70),
            filter: Rgba::rgb(170, 140, 110),
            accent_good: Rgba::rgb(140, 196, 100),
            accent_ok: Rgba::rgb(238, 180, 80),
            accent_bad: Rgba::rgb(228, 92, 70),
            accent_neutral: Rgba::rgb(190, 170, 150),
            info: Rgba::rgb(150, 130, 220),
            success: Rgba::rgb(110, 170, 90),
            warning: Rgba::rgb(212, 158, 56),
            error: Rgba::rgb(200, 78, 58),
            monochrome_red: false,
        }
    }

    /// Monochrome red low-light scheme: preserves dark adaptation at the
    /// eyepiece. Every accent is a shade of red.
    const fn night_red() -> Palette {
        Palette {
            name: "Night Red",
            background: Rgba::rgb(10, 0, 0),
            surface: Rgba::rgb(26, 2, 2),
            border: Rgba::rgb(64, 8, 8),
            label: Rgba::rgb(140, 24, 24),
            text: Rgba::rgb(220, 40, 40),
            header: Rgba::rgb(40, 4, 4),
            progress: Rgba::rgb(200, 36, 36),
            filter: Rgba::rgb(150, 28, 28),
            accent_good: Rgba::rgb(180, 32, 32),
            accent_ok: Rgba::rgb(210, 48, 48),
            accent_bad: Rgba::rgb(255, 64, 64),
            accent_neutral: Rgba::rgb(120, 20, 20),
            info: Rgba::rgb(120, 20, 20),
            success: Rgba::rgb(150, 28, 28),
            warning: Rgba::rgb(200, 44, 44),
            error: Rgba::rgb(255, 64, 64),
            monochrome_red: true,
        }
    }
}

/// Ordered registry; the settings chooser steps through this sequence.
static REGISTRY: &[Palette] = &[
    Palette::deep_space(),
    Palette::graphite(),
    Palette::nebula(),
    Palette::horizon(),
    Palette::night_red(),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_is_ordered_and_stable() {
        assert!(Palette::count() >= 2);
        for i in 0..Palette::count() {
            assert_eq!(Palette::by_index(i).index_of(), i);
        }
    }

    #[test]
    fn by_index_wraps() {
        let n = Palette::count();
        assert_eq!(Palette::by_index(n).name, Palette::by_index(0).name);
    }

    #[test]
    fn exactly_one_monochrome_red_palette() {
        let reds = (0..Palette::count())
            .filter(|&i| Palette::by_index(i).forces_palette_colors())
            .count();
        assert_eq!(reds, 1);
    }

    #[test]
    fn night_red_accents_are_red_shades() {
        let p = Palette::by_index(
            (0..Palette::count())
                .find(|&i| Palette::by_index(i).forces_palette_colors())
                .unwrap(),
        );
        for c in [
            p.progress,
            p.filter,
            p.accent_good,
            p.accent_ok,
            p.accent_bad,
            p.info,
            p.error,
        ] {
            assert!(c.r > c.g && c.r > c.b, "{c:?} is not a red shade");
        }
    }
}
