//! Active-theme state: one palette + widget style + colour brightness, and
//! the derived style cache every page reads.
//!
//! The epoch counter bumps on every rebuild; lazily-built overlay content
//! compares epochs to know when a cached tree must be reconstructed.

use stardeck_style::{Palette, StyleCache, WidgetStyle};

use crate::config::Config;

#[derive(Debug)]
pub struct ThemeState {
    palette_index: usize,
    widget_style: WidgetStyle,
    color_brightness: u8,
    epoch: u32,
    pub styles: StyleCache,
}

impl ThemeState {
    #[must_use]
    pub fn from_config(cfg: &Config) -> Self {
        let palette_index = cfg.theme_index % Palette::count();
        Self {
            palette_index,
            widget_style: cfg.widget_style,
            color_brightness: cfg.color_brightness,
            epoch: 0,
            styles: StyleCache::rebuild(
                Palette::by_index(palette_index),
                cfg.widget_style,
                cfg.color_brightness,
            ),
        }
    }

    #[must_use]
    pub fn palette(&self) -> &'static Palette {
        Palette::by_index(self.palette_index)
    }

    #[must_use]
    pub const fn palette_index(&self) -> usize {
        self.palette_index
    }

    #[must_use]
    pub const fn widget_style(&self) -> WidgetStyle {
        self.widget_style
    }

    #[must_use]
    pub const fn color_brightness(&self) -> u8 {
        self.color_brightness
    }

    /// Whether accent shortcuts must fall back to palette colours.
    #[must_use]
    pub fn forces_palette_colors(&self) -> bool {
        self.palette().forces_palette_colors()
    }

    /// Bumped on every style rebuild.
    #[must_use]
    pub const fn epoch(&self) -> u32 {
        self.epoch
    }

    pub fn set_palette_index(&mut self, index: usize) {
        self.palette_index = index % Palette::count();
        self.rebuild();
    }

    pub fn step_palette(&mut self, delta: i32) {
        let n = Palette::count() as i32;
        let next = (self.palette_index as i32 + delta).rem_euclid(n);
        self.set_palette_index(next as usize);
    }

    pub fn set_widget_style(&mut self, style: WidgetStyle) {
        self.widget_style = style;
        self.rebuild();
    }

    pub fn set_color_brightness(&mut self, brightness: u8) {
        self.color_brightness = brightness.min(100);
        self.rebuild();
    }

    fn rebuild(&mut self) {
        self.styles = StyleCache::rebuild(self.palette(), self.widget_style, self.color_brightness);
        self.epoch = self.epoch.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_bumps_on_every_rebuild() {
        let mut theme = ThemeState::from_config(&Config::default());
        let e0 = theme.epoch();
        theme.step_palette(1);
        theme.set_color_brightness(60);
        assert_eq!(theme.epoch(), e0 + 2);
    }

    #[test]
    fn palette_step_wraps() {
        let mut theme = ThemeState::from_config(&Config::default());
        theme.set_palette_index(Palette::count() - 1);
        theme.step_palette(1);
        assert_eq!(theme.palette_index(), 0);
        theme.step_palette(-1);
        assert_eq!(theme.palette_index(), Palette::count() - 1);
    }
}
