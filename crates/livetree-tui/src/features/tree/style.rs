//! Semantic styles for the tree view.

use livetree_core::snapshot::{LeafKind, leaf_kind, leaf_text};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Span;
use serde_json::Value;

use crate::common::text::{sanitize_for_display, truncate_with_ellipsis};

/// What a piece of tree text is. Translated to a terminal style at the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Key,
    /// Key of the focused node.
    FocusedKey,
    /// Collapse marker, width percent.
    Marker,
    /// `{n}` / `[n]` size hints and `: ` separators.
    Summary,
    /// Compact JSON shown next to a collapsed key.
    Preview,
    /// Raw marker and pretty-printed raw lines.
    Raw,
    /// Nesting guide.
    Guide,
    Favorite,
    Absent,
    String,
    Number,
    True,
    False,
    Null,
}

const ORANGE: Color = Color::Rgb(255, 165, 0);

impl Role {
    pub fn style(self) -> Style {
        let base = Style::default();
        match self {
            Role::Key => base.add_modifier(Modifier::BOLD),
            Role::FocusedKey => base.add_modifier(Modifier::BOLD | Modifier::REVERSED),
            Role::Marker => base.fg(Color::Cyan),
            Role::Summary | Role::Guide | Role::Preview => base.fg(Color::DarkGray),
            Role::Raw => base.fg(Color::Gray),
            Role::Favorite => base.fg(Color::Yellow),
            Role::Absent => base.fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            Role::String => base.fg(ORANGE),
            Role::Number => base.fg(Color::LightBlue),
            Role::True => base.fg(Color::Green),
            Role::False => base.fg(Color::Red),
            Role::Null => base.add_modifier(Modifier::DIM),
        }
    }

    pub fn key(focused: bool) -> Self {
        if focused { Role::FocusedKey } else { Role::Key }
    }

    pub fn span(self, text: impl Into<String>) -> Span<'static> {
        Span::styled(text.into(), self.style())
    }
}

/// Role of a scalar by its runtime type.
pub fn leaf_role(value: &Value) -> Role {
    match leaf_kind(value) {
        Some(LeafKind::String) => Role::String,
        Some(LeafKind::Number) => Role::Number,
        Some(LeafKind::Bool(true)) => Role::True,
        Some(LeafKind::Bool(false)) => Role::False,
        Some(LeafKind::Null) | None => Role::Null,
    }
}

/// Styled text of a scalar, cut to `room` columns.
pub fn leaf_span(value: &Value, room: usize) -> Span<'static> {
    let text = leaf_text(value);
    let text = truncate_with_ellipsis(&sanitize_for_display(&text), room);
    leaf_role(value).span(text)
}
