//! Tree view feature slice.
//!
//! - `layout.rs`: turns a `TreeView` plus the current snapshot into styled
//!   lines and focus targets
//! - `style.rs`: semantic styles for keys, markers and leaf values

mod layout;
mod style;

pub use layout::{
    FocusTarget, INDENT, LayoutContext, Placed, TreeLayout, ViewKind, layout_favorites,
    layout_view,
};
pub use style::{Role, leaf_span};
