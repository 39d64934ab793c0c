//! The routed pages.

pub mod instance;
pub mod settings;
pub mod summary;
pub mod sysinfo;

use stardeck_scene::{NodeId, NodeKind, SceneTree};
use stardeck_style::Style;

use crate::theme::ThemeState;

/// A bento card container styled from the cache.
pub(crate) fn make_card(tree: &mut SceneTree, parent: NodeId, theme: &ThemeState) -> NodeId {
    let card = tree.create(NodeKind::Container, parent);
    tree.set_style(card, theme.styles.card);
    card
}

/// A label with an explicit style.
pub(crate) fn make_label(tree: &mut SceneTree, parent: NodeId, style: Style) -> NodeId {
    let label = tree.create(NodeKind::Label, parent);
    tree.set_style(label, style);
    label
}
