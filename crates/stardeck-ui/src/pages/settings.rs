//! The settings page: live-applied controls, persisted only on Save.
//!
//! Taps resolve to [`SettingsAction`]s here; the app owns executing them
//! against the config, theme, and timers, then calls [`SettingsPage::sync`]
//! to refresh every readout. The page's sliders consume horizontal drags,
//! so the router only honours swipes that start on the header strip.

use stardeck_core::geometry::Sides;
use stardeck_scene::{
    Axis, Dim, LayoutSpec, NodeFlags, NodeId, NodeKind, SceneTree, SizePolicy,
};
use stardeck_style::{FontTier, Style};

use crate::config::Config;
use crate::format;
use crate::pages::{make_card, make_label};
use crate::theme::ThemeState;

/// How long the Save button reads "Saved".
const SAVED_FLASH_MS: u64 = 2_000;

/// What a tapped settings control asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsAction {
    ThemeStep(i32),
    StyleStep(i32),
    DataRateStep(i32),
    GraphRateStep(i32),
    RotateToggle,
    RotateIntervalStep(i32),
    RotateEffectStep(i32),
    RotateSkipToggle,
    Save,
}

struct StepperRow {
    minus: NodeId,
    plus: NodeId,
    value: NodeId,
}

/// The settings page.
pub struct SettingsPage {
    root: NodeId,
    header: NodeId,
    theme_row: StepperRow,
    style_row: StepperRow,
    backlight_slider: NodeId,
    text_bright_slider: NodeId,
    data_rate_row: StepperRow,
    graph_rate_row: StepperRow,
    rotate_toggle: NodeId,
    rotate_interval_row: StepperRow,
    rotate_effect_row: StepperRow,
    rotate_skip_toggle: NodeId,
    save_button: NodeId,
    saved_until_ms: Option<u64>,
}

impl SettingsPage {
    pub fn build(tree: &mut SceneTree, theme: &ThemeState) -> Self {
        let viewport = tree.viewport();
        let root = tree.create(NodeKind::Container, tree.root());
        tree.set_rect(root, viewport);
        tree.set_layout(
            root,
            LayoutSpec::Flex {
                axis: Axis::Vertical,
                gap: 8,
                padding: Sides::all(12),
            },
        );

        // Swipe-friendly header strip; everything below owns its drags.
        let header = make_card(tree, root, theme);
        tree.set_size(header, SizePolicy::fixed_height(56));
        let title = make_label(tree, header, Style::text(theme.styles.text, FontTier::Large));
        tree.set_text(title, "Settings");

        let theme_row = stepper_row(tree, root, theme, "Theme");
        let style_row = stepper_row(tree, root, theme, "Widget style");

        let backlight_slider = slider_row(tree, root, theme, "Backlight");
        let text_bright_slider = slider_row(tree, root, theme, "Text brightness");

        let data_rate_row = stepper_row(tree, root, theme, "Update rate");
        let graph_rate_row = stepper_row(tree, root, theme, "Graph rate");

        let rotate_toggle = toggle_row(tree, root, theme, "Auto-rotate");
        let rotate_interval_row = stepper_row(tree, root, theme, "Rotate every");
        let rotate_effect_row = stepper_row(tree, root, theme, "Rotate effect");
        let rotate_skip_toggle = toggle_row(tree, root, theme, "Skip disconnected");

        let save_button = tree.create(NodeKind::Button, root);
        tree.set_size(save_button, SizePolicy::fixed_height(52));
        tree.set_flag(save_button, NodeFlags::CLICKABLE, true);
        tree.set_style(
            save_button,
            Style {
                bg: Some(theme.styles.progress),
                text_color: Some(theme.styles.text),
                radius: 12,
                ..Style::default()
            },
        );
        tree.set_text(save_button, "Save");

        Self {
            root,
            header,
            theme_row,
            style_row,
            backlight_slider,
            text_bright_slider,
            data_rate_row,
            graph_rate_row,
            rotate_toggle,
            rotate_interval_row,
            rotate_effect_row,
            rotate_skip_toggle,
            save_button,
            saved_until_ms: None,
        }
    }

    #[must_use]
    pub const fn root(&self) -> NodeId {
        self.root
    }

    #[must_use]
    pub const fn header_node(&self) -> NodeId {
        self.header
    }

    #[must_use]
    pub const fn backlight_slider(&self) -> NodeId {
        self.backlight_slider
    }

    #[must_use]
    pub const fn text_brightness_slider(&self) -> NodeId {
        self.text_bright_slider
    }

    /// Resolve a tapped node to its action.
    #[must_use]
    pub fn action_for(&self, node: NodeId) -> Option<SettingsAction> {
        let rows: [(&StepperRow, fn(i32) -> SettingsAction); 6] = [
            (&self.theme_row, SettingsAction::ThemeStep),
            (&self.style_row, SettingsAction::StyleStep),
            (&self.data_rate_row, SettingsAction::DataRateStep),
            (&self.graph_rate_row, SettingsAction::GraphRateStep),
            (&self.rotate_interval_row, SettingsAction::RotateIntervalStep),
            (&self.rotate_effect_row, SettingsAction::RotateEffectStep),
        ];
        for (row, make) in rows {
            if node == row.minus {
                return Some(make(-1));
            }
            if node == row.plus {
                return Some(make(1));
            }
        }
        if node == self.rotate_toggle {
            Some(SettingsAction::RotateToggle)
        } else if node == self.rotate_skip_toggle {
            Some(SettingsAction::RotateSkipToggle)
        } else if node == self.save_button {
            Some(SettingsAction::Save)
        } else {
            None
        }
    }

    /// Refresh every readout from the live config.
    pub fn sync(&self, tree: &mut SceneTree, cfg: &Config, theme: &ThemeState) {
        tree.set_text(self.theme_row.value, theme.palette().name);
        tree.set_text(self.style_row.value, theme.widget_style().label());
        tree.set_value(self.backlight_slider, i32::from(cfg.brightness));
        tree.set_value(self.text_bright_slider, i32::from(cfg.color_brightness));
        tree.set_text(self.data_rate_row.value, &format!("{} s", cfg.update_rate_s));
        tree.set_text(
            self.graph_rate_row.value,
            &format!("{} s", cfg.graph_update_interval_s),
        );
        tree.set_text(
            self.rotate_toggle,
            if cfg.auto_rotate_enabled {
                "Auto-rotate: ON"
            } else {
                "Auto-rotate: OFF"
            },
        );
        tree.set_text(
            self.rotate_interval_row.value,
            &format::seconds(cfg.auto_rotate_interval_s as f32),
        );
        tree.set_text(self.rotate_effect_row.value, cfg.auto_rotate_effect.label());
        tree.set_text(
            self.rotate_skip_toggle,
            if cfg.auto_rotate_skip_disconnected {
                "Skip disconnected: ON"
            } else {
                "Skip disconnected: OFF"
            },
        );
    }

    /// Mark the save flash; reverted by the second tick.
    pub fn flash_saved(&mut self, tree: &mut SceneTree, now_ms: u64) {
        tree.set_text(self.save_button, "Saved");
        self.saved_until_ms = Some(now_ms + SAVED_FLASH_MS);
    }

    /// Second tick: revert the Save label when the flash expires.
    pub fn second_tick(&mut self, tree: &mut SceneTree, now_ms: u64) {
        if let Some(until) = self.saved_until_ms
            && now_ms >= until
        {
            tree.set_text(self.save_button, "Save");
            self.saved_until_ms = None;
        }
    }

    pub fn retheme(&self, tree: &mut SceneTree, theme: &ThemeState) {
        tree.set_style(self.header, theme.styles.card);
        for row in [
            &self.theme_row,
            &self.style_row,
            &self.data_rate_row,
            &self.graph_rate_row,
            &self.rotate_interval_row,
            &self.rotate_effect_row,
        ] {
            tree.set_style(row.value, Style::text(theme.styles.text, FontTier::Medium));
            for btn in [row.minus, row.plus] {
                tree.set_style(
                    btn,
                    Style {
                        bg: Some(theme.styles.border),
                        text_color: Some(theme.styles.text),
                        radius: 10,
                        ..Style::default()
                    },
                );
            }
        }
        tree.set_style(
            self.save_button,
            Style {
                bg: Some(theme.styles.progress),
                text_color: Some(theme.styles.text),
                radius: 12,
                ..Style::default()
            },
        );
    }
}

fn stepper_row(
    tree: &mut SceneTree,
    parent: NodeId,
    theme: &ThemeState,
    caption: &str,
) -> StepperRow {
    let row = tree.create(NodeKind::Container, parent);
    tree.set_size(row, SizePolicy::fixed_height(46));
    tree.set_layout(
        row,
        LayoutSpec::Flex {
            axis: Axis::Horizontal,
            gap: 10,
            padding: Sides::new(4, 8, 4, 8),
        },
    );
    let label = make_label(tree, row, theme.styles.small_label);
    tree.set_text(label, caption);

    let minus = tree.create(NodeKind::Button, row);
    tree.set_size(minus, SizePolicy::fixed(44, 38));
    tree.set_flag(minus, NodeFlags::CLICKABLE, true);
    tree.set_text(minus, "\u{2212}");

    let value = make_label(tree, row, Style::text(theme.styles.text, FontTier::Medium));
    tree.set_size(value, SizePolicy { width: Dim::Fixed(170), height: Dim::Grow(1) });

    let plus = tree.create(NodeKind::Button, row);
    tree.set_size(plus, SizePolicy::fixed(44, 38));
    tree.set_flag(plus, NodeFlags::CLICKABLE, true);
    tree.set_text(plus, "+");

    StepperRow { minus, plus, value }
}

fn slider_row(tree: &mut SceneTree, parent: NodeId, theme: &ThemeState, caption: &str) -> NodeId {
    let row = tree.create(NodeKind::Container, parent);
    tree.set_size(row, SizePolicy::fixed_height(46));
    tree.set_layout(
        row,
        LayoutSpec::Flex {
            axis: Axis::Horizontal,
            gap: 10,
            padding: Sides::new(4, 8, 4, 8),
        },
    );
    let label = make_label(tree, row, theme.styles.small_label);
    tree.set_text(label, caption);
    let slider = tree.create(NodeKind::Slider, row);
    tree.set_size(slider, SizePolicy { width: Dim::Fixed(280), height: Dim::Grow(1) });
    tree.set_flag(slider, NodeFlags::CLICKABLE, true);
    slider
}

fn toggle_row(tree: &mut SceneTree, parent: NodeId, theme: &ThemeState, caption: &str) -> NodeId {
    let toggle = tree.create(NodeKind::Button, parent);
    tree.set_size(toggle, SizePolicy::fixed_height(46));
    tree.set_flag(toggle, NodeFlags::CLICKABLE, true);
    tree.set_style(toggle, Style::text(theme.styles.text, FontTier::Medium));
    tree.set_text(toggle, caption);
    toggle
}
