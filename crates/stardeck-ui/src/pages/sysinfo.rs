//! The system-info page: diagnostics plus the tail of the event log,
//! last in the page sequence.

use stardeck_core::geometry::Sides;
use stardeck_runtime::Notification;
use stardeck_scene::{Axis, LayoutSpec, NodeId, NodeKind, SceneTree, SizePolicy};
use stardeck_style::{FontTier, Style};

use crate::config::Config;
use crate::pages::{make_card, make_label};
use crate::theme::ThemeState;

/// Event-log rows rendered on the page.
const EVENT_ROWS: usize = 6;

/// The diagnostics page.
pub struct SysInfoPage {
    root: NodeId,
    version: NodeId,
    uptime: NodeId,
    rates: NodeId,
    instance_rows: Vec<NodeId>,
    event_rows: Vec<NodeId>,
}

impl SysInfoPage {
    pub fn build(tree: &mut SceneTree, theme: &ThemeState, instance_count: usize) -> Self {
        let viewport = tree.viewport();
        let root = tree.create(NodeKind::Container, tree.root());
        tree.set_rect(root, viewport);
        tree.set_layout(
            root,
            LayoutSpec::Flex {
                axis: Axis::Vertical,
                gap: 8,
                padding: Sides::all(16),
            },
        );

        let card = make_card(tree, root, theme);
        tree.set_layout(
            card,
            LayoutSpec::Flex {
                axis: Axis::Vertical,
                gap: 6,
                padding: Sides::all(16),
            },
        );
        let title = make_label(tree, card, Style::text(theme.styles.text, FontTier::Large));
        tree.set_text(title, "System");
        let version = make_label(tree, card, theme.styles.small_label);
        tree.set_text(
            version,
            concat!("stardeck ", env!("CARGO_PKG_VERSION")),
        );
        let uptime = make_label(tree, card, theme.styles.small_label);
        let rates = make_label(tree, card, theme.styles.small_label);

        let mut instance_rows = Vec::with_capacity(instance_count);
        for _ in 0..instance_count {
            let row = make_label(tree, card, theme.styles.small_label);
            tree.set_size(row, SizePolicy::fixed_height(24));
            instance_rows.push(row);
        }

        let log_card = make_card(tree, root, theme);
        tree.set_layout(
            log_card,
            LayoutSpec::Flex {
                axis: Axis::Vertical,
                gap: 4,
                padding: Sides::all(16),
            },
        );
        let log_title = make_label(tree, log_card, Style::text(theme.styles.text, FontTier::Large));
        tree.set_text(log_title, "Events");
        let mut event_rows = Vec::with_capacity(EVENT_ROWS);
        for _ in 0..EVENT_ROWS {
            let row = make_label(tree, log_card, theme.styles.small_label);
            tree.set_size(row, SizePolicy::fixed_height(24));
            tree.set_hidden(row, true);
            event_rows.push(row);
        }

        Self {
            root,
            version,
            uptime,
            rates,
            instance_rows,
            event_rows,
        }
    }

    #[must_use]
    pub const fn root(&self) -> NodeId {
        self.root
    }

    /// Second tick: uptime, rates, link state, and the event-log tail
    /// (newest last).
    pub fn second_tick(
        &self,
        tree: &mut SceneTree,
        cfg: &Config,
        connected: &[bool],
        events: &[Notification],
        now_ms: u64,
    ) {
        let secs = now_ms / 1000;
        tree.set_text(
            self.uptime,
            &format!("Uptime {}h {:02}m {:02}s", secs / 3600, (secs / 60) % 60, secs % 60),
        );
        tree.set_text(
            self.rates,
            &format!(
                "Poll {} s \u{b7} graph {} s",
                cfg.update_rate_s, cfg.graph_update_interval_s
            ),
        );
        for (i, row) in self.instance_rows.iter().enumerate() {
            let url = cfg.instances.get(i).map_or("?", |c| c.url.as_str());
            let state = if connected.get(i).copied().unwrap_or(false) {
                "online"
            } else {
                "offline"
            };
            tree.set_text(*row, &format!("{url} \u{b7} {state}"));
        }
        let tail = events.len().saturating_sub(self.event_rows.len());
        for (row, note) in self.event_rows.iter().zip(&events[tail..]) {
            tree.set_hidden(*row, false);
            tree.set_text(
                *row,
                &format!("[{:>4}s] {}", note.at_ms / 1000, note.text),
            );
        }
    }

    pub fn retheme(&self, tree: &mut SceneTree, theme: &ThemeState) {
        for label in self
            .instance_rows
            .iter()
            .chain(&self.event_rows)
            .copied()
            .chain([self.version, self.uptime, self.rates])
        {
            tree.set_style(label, theme.styles.small_label);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stardeck_core::geometry::Rect;

    #[test]
    fn second_tick_renders_uptime_links_and_events() {
        let mut tree = SceneTree::new(Rect::from_size(720, 720));
        let theme = ThemeState::from_config(&Config::default());
        let page = SysInfoPage::build(&mut tree, &theme, 1);
        let cfg = Config::default();
        let events = vec![Notification {
            severity: stardeck_style::Severity::Info,
            instance: None,
            at_ms: 12_000,
            text: "data source online".into(),
        }];
        page.second_tick(&mut tree, &cfg, &[true], &events, 3_725_000);
        assert_eq!(tree.text(page.uptime), "Uptime 1h 02m 05s");
        assert!(tree.text(page.instance_rows[0]).ends_with("online"));
        assert!(!tree.is_hidden(page.event_rows[0]));
        assert!(tree.text(page.event_rows[0]).contains("data source online"));
    }
}
