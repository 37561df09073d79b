//! # autocard-adapter-lovelace
//!
//! Rendering adapter that maps assembled [`LayoutNode`] trees onto the
//! host dashboard's declarative card schema. The host owns all actual
//! presentation; this crate only produces configuration it consumes.
//!
//! | Layout node | Card config |
//! |-------------|-------------|
//! | whole tree  | `vertical-stack` |
//! | `Grid`      | `grid` of `button` cards with a toggle tap action |
//! | `Section`   | `entities` card without a header toggle |
//!
//! ## Dependency rule
//!
//! Depends on `autocard-domain` only.

use serde::{Deserialize, Serialize};

use autocard_domain::entity::EntityId;
use autocard_domain::layout::LayoutNode;

/// One card in the host configuration schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CardConfig {
    /// Vertical stack of child cards.
    #[serde(rename = "vertical-stack")]
    VerticalStack { cards: Vec<CardConfig> },

    /// Fixed-column grid of child cards.
    #[serde(rename = "grid")]
    Grid {
        columns: usize,
        square: bool,
        cards: Vec<CardConfig>,
    },

    /// Single tappable button bound to one entity.
    #[serde(rename = "button")]
    Button {
        entity: EntityId,
        show_name: bool,
        show_state: bool,
        tap_action: TapAction,
    },

    /// Titled list of entities.
    #[serde(rename = "entities")]
    Entities {
        title: String,
        show_header_toggle: bool,
        entities: Vec<EntityId>,
    },
}

/// Tap behavior of a button card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TapAction {
    pub action: String,
}

impl TapAction {
    /// The toggle action every quick-action button uses.
    #[must_use]
    pub fn toggle() -> Self {
        Self {
            action: "toggle".to_string(),
        }
    }
}

/// Render a layout tree into one `vertical-stack` card config.
///
/// An empty tree renders as a stack with no children; the host shows
/// nothing for it. Output order follows the node order exactly.
#[must_use]
pub fn render(nodes: &[LayoutNode]) -> CardConfig {
    let cards = nodes.iter().map(render_node).collect();
    CardConfig::VerticalStack { cards }
}

fn render_node(node: &LayoutNode) -> CardConfig {
    match node {
        LayoutNode::Grid { columns, entities } => CardConfig::Grid {
            columns: *columns,
            square: false,
            cards: entities.iter().map(render_button).collect(),
        },
        LayoutNode::Section { title, entities } => CardConfig::Entities {
            title: title.clone(),
            show_header_toggle: false,
            entities: entities.clone(),
        },
    }
}

fn render_button(entity: &EntityId) -> CardConfig {
    CardConfig::Button {
        entity: entity.clone(),
        show_name: true,
        show_state: false,
        tap_action: TapAction::toggle(),
    }
}
