//! Tree layout engine.
//!
//! Walks a `TreeView` and the value it resolves to, and produces styled
//! lines plus the position of every focusable key. The same pass serves the
//! renderer (lines) and the reducer (targets), so focus movement always
//! matches what is drawn.
//!
//! Objects lay out as stacked rows when the view is stacked and as side by
//! side columns otherwise. Arrays are always stacked. Each nested container
//! decides again for its own contents.

use livetree_core::favorites::FavoritesRegistry;
use livetree_core::node_state::{DEFAULT_WIDTH_PERCENT, StateField};
use livetree_core::path::{NodePath, Resolved, Segment};
use livetree_core::snapshot::{
    CopyFormat, compact, format_copy, is_container, own_entries, summary,
};
use livetree_core::tree::{TreeLevel, TreeView};
use ratatui::text::{Line, Span};
use serde_json::Value;
use unicode_width::UnicodeWidthStr;

use super::style::{Role, leaf_span};
use crate::common::text::{fit_spans, sanitize_for_display, spans_width, truncate_with_ellipsis};

/// Columns a nested level is shifted right by.
pub const INDENT: usize = 2;

const MIN_COLUMN_WIDTH: usize = 12;
const MIN_LEAF_WIDTH: usize = 8;
const COLUMN_GAP: usize = 1;

/// A focusable key, identified structurally.
///
/// `key: None` is the header row of the view itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FocusTarget {
    pub view: NodePath,
    pub level: NodePath,
    pub key: Option<Segment>,
}

impl FocusTarget {
    pub fn header(view: &NodePath) -> Self {
        Self {
            view: view.clone(),
            level: view.clone(),
            key: None,
        }
    }

    pub fn key(view: &NodePath, level: &NodePath, key: &Segment) -> Self {
        Self {
            view: view.clone(),
            level: level.clone(),
            key: Some(key.clone()),
        }
    }

    pub fn is_header(&self) -> bool {
        self.key.is_none()
    }

    /// Path of the focused value.
    pub fn path(&self) -> NodePath {
        match &self.key {
            Some(key) => self.level.append(key.clone()),
            None => self.level.clone(),
        }
    }
}

/// Where a target ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placed {
    pub target: FocusTarget,
    pub line: usize,
    pub col: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    Main,
    Favorite,
}

pub struct LayoutContext<'a> {
    pub snapshot: &'a Value,
    pub favorites: &'a FavoritesRegistry,
    pub focused: Option<&'a FocusTarget>,
}

impl LayoutContext<'_> {
    fn is_focused(&self, target: &FocusTarget) -> bool {
        self.focused == Some(target)
    }
}

#[derive(Debug, Default)]
pub struct TreeLayout {
    pub lines: Vec<Line<'static>>,
    pub targets: Vec<Placed>,
}

impl TreeLayout {
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn width(&self) -> usize {
        self.lines.iter().map(Line::width).max().unwrap_or(0)
    }

    /// Index of `target` in focus order.
    pub fn position(&self, target: &FocusTarget) -> Option<usize> {
        self.targets.iter().position(|placed| placed.target == *target)
    }
}

#[derive(Default)]
struct Canvas {
    rows: Vec<Vec<Span<'static>>>,
    targets: Vec<Placed>,
}

impl Canvas {
    fn width(&self) -> usize {
        self.rows
            .iter()
            .map(|row| spans_width(row))
            .max()
            .unwrap_or(0)
    }

    /// Places `target` at the start of the next row.
    fn mark(&mut self, target: FocusTarget) {
        self.targets.push(Placed {
            target,
            line: self.rows.len(),
            col: 0,
        });
    }

    fn push_row(&mut self, row: Vec<Span<'static>>) {
        self.rows.push(row);
    }

    /// Appends `other` below, with `prefix` in front of each of its rows.
    fn append(&mut self, other: Canvas, prefix: &[Span<'static>]) {
        let offset = self.rows.len();
        let indent = spans_width(prefix);
        self.targets
            .extend(other.targets.into_iter().map(|placed| Placed {
                line: placed.line + offset,
                col: placed.col + indent,
                target: placed.target,
            }));
        for row in other.rows {
            let mut prefixed = prefix.to_vec();
            prefixed.extend(row);
            self.rows.push(prefixed);
        }
    }

    /// Places `columns` side by side, each at least `min_width` wide.
    fn beside(columns: Vec<Canvas>, min_width: usize) -> Canvas {
        let widths: Vec<usize> = columns
            .iter()
            .map(|column| column.width().max(min_width))
            .collect();
        let height = columns
            .iter()
            .map(|column| column.rows.len())
            .max()
            .unwrap_or(0);
        let last = columns.len().saturating_sub(1);

        let mut out = Canvas::default();
        let mut offset = 0;
        for (column, width) in columns.iter().zip(&widths) {
            out.targets
                .extend(column.targets.iter().map(|placed| Placed {
                    target: placed.target.clone(),
                    line: placed.line,
                    col: placed.col + offset,
                }));
            offset += width + COLUMN_GAP;
        }

        for line in 0..height {
            let mut row = Vec::new();
            for (index, (column, width)) in columns.iter().zip(&widths).enumerate() {
                let cell = column.rows.get(line).map_or(&[][..], Vec::as_slice);
                if index == last {
                    row.extend(cell.iter().cloned());
                } else {
                    row.extend(fit_spans(cell, *width));
                    row.push(Span::raw(" ".repeat(COLUMN_GAP)));
                }
            }
            out.rows.push(row);
        }
        out
    }

    fn into_layout(self) -> TreeLayout {
        TreeLayout {
            lines: self.rows.into_iter().map(Line::from).collect(),
            targets: self.targets,
        }
    }
}

fn guide() -> [Span<'static>; 1] {
    [Role::Guide.span("│ ")]
}

/// Lays out one view for a pane `pane_width` columns wide.
pub fn layout_view(
    view: &TreeView,
    kind: ViewKind,
    ctx: &LayoutContext<'_>,
    pane_width: usize,
) -> TreeLayout {
    view_canvas(view, kind, ctx, pane_width).into_layout()
}

/// Lays out every favorite panel, one after another.
pub fn layout_favorites(
    panels: &[TreeView],
    ctx: &LayoutContext<'_>,
    pane_width: usize,
) -> TreeLayout {
    let mut canvas = Canvas::default();
    for (index, panel) in panels.iter().enumerate() {
        if index > 0 {
            canvas.push_row(Vec::new());
        }
        canvas.append(view_canvas(panel, ViewKind::Favorite, ctx, pane_width), &[]);
    }
    canvas.into_layout()
}

fn view_canvas(
    view: &TreeView,
    kind: ViewKind,
    ctx: &LayoutContext<'_>,
    pane_width: usize,
) -> Canvas {
    let base = view.base();
    let target = FocusTarget::header(base);
    let key_role = Role::key(ctx.is_focused(&target));
    let resolved = view.resolve(ctx.snapshot);

    let mut canvas = Canvas::default();
    canvas.mark(target);

    let mut header = match kind {
        ViewKind::Main => vec![key_role.span("$")],
        ViewKind::Favorite => vec![Role::Favorite.span("★ "), key_role.span(base.to_string())],
    };
    let body = match resolved {
        Resolved::Absent => {
            header.push(Role::Absent.span(" absent"));
            None
        }
        Resolved::Found(value) if is_container(value) => {
            header.push(Role::Summary.span(format!(" {}", summary(value))));
            Some(value)
        }
        Resolved::Found(value) => {
            header.push(Role::Summary.span(": "));
            header.push(leaf_span(value, pane_width.max(MIN_LEAF_WIDTH)));
            None
        }
    };

    let defaults = view.defaults();
    if defaults.collapsed {
        header.push(Role::Marker.span(" ▸all"));
    }
    if defaults.raw {
        header.push(Role::Raw.span(" {}all"));
    }
    if view.width_percent() != DEFAULT_WIDTH_PERCENT {
        header.push(Role::Marker.span(format!(" {}%", view.width_percent())));
    }
    canvas.push_row(header);

    if let Some(value) = body {
        let width = pane_width * usize::from(view.width_percent()) / 100;
        let level = level_canvas(ctx, view.root(), base, value, width);
        match kind {
            ViewKind::Main => canvas.append(level, &[]),
            ViewKind::Favorite => canvas.append(level, &guide()),
        }
    }
    canvas
}

fn level_canvas(
    ctx: &LayoutContext<'_>,
    level: &TreeLevel,
    view: &NodePath,
    value: &Value,
    width: usize,
) -> Canvas {
    let entries = own_entries(value);
    let mut canvas = Canvas::default();

    if entries.is_empty() {
        let empty = if value.is_array() { "[]" } else { "{}" };
        canvas.push_row(vec![Role::Summary.span(empty)]);
        return canvas;
    }

    if level.stacked() || value.is_array() {
        for (key, child) in &entries {
            canvas.append(entry_canvas(ctx, level, view, key, child, width), &[]);
        }
        return canvas;
    }

    let count = entries.len();
    let column_width =
        (width.saturating_sub(COLUMN_GAP * (count - 1)) / count).max(MIN_COLUMN_WIDTH);
    let columns = entries
        .iter()
        .map(|(key, child)| entry_canvas(ctx, level, view, key, child, column_width))
        .collect();
    Canvas::beside(columns, column_width)
}

fn entry_canvas(
    ctx: &LayoutContext<'_>,
    level: &TreeLevel,
    view: &NodePath,
    key: &Segment,
    value: &Value,
    width: usize,
) -> Canvas {
    let target = FocusTarget::key(view, level.path(), key);
    let key_role = Role::key(ctx.is_focused(&target));
    let label = sanitize_for_display(&key.label()).into_owned();
    let label_width = label.width();

    let mut canvas = Canvas::default();
    canvas.mark(target);

    if !is_container(value) {
        let room = width.saturating_sub(label_width + 2).max(MIN_LEAF_WIDTH);
        canvas.push_row(vec![
            key_role.span(label),
            Role::Summary.span(": "),
            leaf_span(value, room),
        ]);
        return canvas;
    }

    let collapsed = level.effective(key, StateField::Collapsed);
    let raw = level.effective(key, StateField::Raw);
    let percent = level.width(key);

    let mut row = vec![
        Role::Marker.span(if collapsed { "▸ " } else { "▾ " }),
        key_role.span(label),
        Role::Summary.span(format!(" {}", summary(value))),
    ];
    if raw {
        row.push(Role::Raw.span(" {}"));
    }
    if percent != DEFAULT_WIDTH_PERCENT {
        row.push(Role::Marker.span(format!(" {percent}%")));
    }
    if ctx.favorites.contains(&level.path().append(key.clone())) {
        row.push(Role::Favorite.span(" ★"));
    }

    if collapsed {
        let room = width
            .saturating_sub(spans_width(&row) + 1)
            .max(MIN_LEAF_WIDTH);
        let preview = sanitize_for_display(&compact(value)).into_owned();
        row.push(Span::raw(" "));
        row.push(Role::Preview.span(truncate_with_ellipsis(&preview, room)));
        canvas.push_row(row);
        return canvas;
    }
    canvas.push_row(row);

    if raw {
        let mut block = Canvas::default();
        for line in format_copy(value, CopyFormat::Json).lines() {
            block.push_row(vec![Role::Raw.span(sanitize_for_display(line).into_owned())]);
        }
        canvas.append(block, &guide());
        return canvas;
    }

    if let Some(child) = level.child(key) {
        let inner = width.saturating_sub(INDENT) * usize::from(percent) / 100;
        canvas.append(level_canvas(ctx, child, view, value, inner), &guide());
    }
    canvas
}

#[cfg(test)]
mod tests {
    use livetree_core::tree::{GlobalBus, Inherited};
    use ratatui::style::Modifier;
    use serde_json::json;

    use super::*;

    fn text(line: &Line<'_>) -> String {
        line.spans.iter().map(|span| span.content.as_ref()).collect()
    }

    fn lines(layout: &TreeLayout) -> Vec<String> {
        layout.lines.iter().map(text).collect()
    }

    fn main_view(data: &Value, stacked: bool) -> TreeView {
        let mut view = TreeView::new(
            NodePath::root(),
            Inherited::default(),
            stacked,
            GlobalBus::new(),
        );
        view.sync(data);
        view
    }

    #[test]
    fn test_stacked_layout_rows_and_targets() {
        let data = json!({"a": 1, "b": {"c": true}});
        let view = main_view(&data, true);
        let favorites = FavoritesRegistry::new();
        let ctx = LayoutContext {
            snapshot: &data,
            favorites: &favorites,
            focused: None,
        };

        let layout = layout_view(&view, ViewKind::Main, &ctx, 40);
        assert_eq!(lines(&layout), vec!["$ {2}", "a: 1", "▾ b {1}", "│ c: true"]);

        let b = NodePath::root().append("b");
        let placed: Vec<(usize, usize)> = layout.targets.iter().map(|p| (p.line, p.col)).collect();
        assert_eq!(placed, vec![(0, 0), (1, 0), (2, 0), (3, 2)]);
        assert_eq!(layout.targets[3].target.level, b);
        assert_eq!(layout.targets[3].target.path().to_string(), "['b']['c']");
    }

    #[test]
    fn test_column_layout_splits_width() {
        let data = json!({"x": 1, "y": 2});
        let view = main_view(&data, false);
        let favorites = FavoritesRegistry::new();
        let ctx = LayoutContext {
            snapshot: &data,
            favorites: &favorites,
            focused: None,
        };

        let layout = layout_view(&view, ViewKind::Main, &ctx, 41);
        // (41 - 1 gap) / 2 = 20 columns each.
        assert_eq!(lines(&layout)[1], format!("{:<20} y: 2", "x: 1"));
        assert_eq!(layout.targets[2].col, 21);
        assert_eq!(layout.targets[2].line, 1);
    }

    #[test]
    fn test_arrays_stack_even_in_column_mode() {
        let data = json!([1, 2]);
        let view = main_view(&data, false);
        let favorites = FavoritesRegistry::new();
        let ctx = LayoutContext {
            snapshot: &data,
            favorites: &favorites,
            focused: None,
        };

        let layout = layout_view(&view, ViewKind::Main, &ctx, 40);
        assert_eq!(lines(&layout), vec!["$ [2]", "0: 1", "1: 2"]);
    }

    #[test]
    fn test_collapsed_and_raw_markers() {
        let data = json!({"a": {"b": 1}, "c": {"d": [1]}});
        let mut view = main_view(&data, true);
        let root = NodePath::root();
        view.toggle(&root, &Segment::from("a"), StateField::Collapsed, &data);
        view.toggle(&root, &Segment::from("c"), StateField::Raw, &data);
        let favorites = FavoritesRegistry::new();
        let ctx = LayoutContext {
            snapshot: &data,
            favorites: &favorites,
            focused: None,
        };

        let layout = layout_view(&view, ViewKind::Main, &ctx, 60);
        assert_eq!(
            lines(&layout),
            vec![
                "$ {2}",
                "▸ a {1} {\"b\":1}",
                "▾ c {1} {}",
                "│ {",
                "│   \"d\": [",
                "│     1",
                "│   ]",
                "│ }",
            ]
        );
    }

    #[test]
    fn test_width_marker_and_favorite_star() {
        let data = json!({"a": {"b": 1}});
        let mut view = main_view(&data, true);
        view.adjust_key_width(&NodePath::root(), &Segment::from("a"), 50);
        let mut favorites = FavoritesRegistry::new();
        favorites.add(NodePath::root().append("a"));
        let ctx = LayoutContext {
            snapshot: &data,
            favorites: &favorites,
            focused: None,
        };

        let layout = layout_view(&view, ViewKind::Main, &ctx, 40);
        assert_eq!(lines(&layout)[1], "▾ a {1} 150% ★");
    }

    #[test]
    fn test_focused_key_is_reversed() {
        let data = json!({"a": 1});
        let view = main_view(&data, true);
        let favorites = FavoritesRegistry::new();
        let focus = FocusTarget::key(&NodePath::root(), &NodePath::root(), &Segment::from("a"));
        let ctx = LayoutContext {
            snapshot: &data,
            favorites: &favorites,
            focused: Some(&focus),
        };

        let layout = layout_view(&view, ViewKind::Main, &ctx, 40);
        let key_span = &layout.lines[1].spans[0];
        assert_eq!(key_span.content, "a");
        assert!(key_span.style.add_modifier.contains(Modifier::REVERSED));
        assert!(
            !layout.lines[0].spans[0]
                .style
                .add_modifier
                .contains(Modifier::REVERSED)
        );
    }

    #[test]
    fn test_favorite_panels_show_absent_entries() {
        let data = json!({"a": {"b": 1, "c": [2, 3]}});
        let global = GlobalBus::new();
        let present = NodePath::root().append("a").append("c");
        let gone = NodePath::root().append("zz");
        let mut panels = vec![
            TreeView::new(present.clone(), Inherited::default(), true, global.clone()),
            TreeView::new(gone.clone(), Inherited::default(), true, global),
        ];
        for panel in &mut panels {
            panel.sync(&data);
        }
        let mut favorites = FavoritesRegistry::new();
        favorites.add(gone);
        favorites.add(present);
        let ctx = LayoutContext {
            snapshot: &data,
            favorites: &favorites,
            focused: None,
        };

        let layout = layout_favorites(&panels, &ctx, 40);
        assert_eq!(
            lines(&layout),
            vec![
                "★ ['a']['c'] [2]",
                "│ 0: 2",
                "│ 1: 3",
                "",
                "★ ['zz'] absent",
            ]
        );
        assert!(layout.targets.last().unwrap().target.is_header());
        assert_eq!(layout.targets.last().unwrap().line, 4);
    }

    #[test]
    fn test_scalar_root_is_single_line() {
        let data = json!("ready");
        let view = main_view(&data, true);
        let favorites = FavoritesRegistry::new();
        let ctx = LayoutContext {
            snapshot: &data,
            favorites: &favorites,
            focused: None,
        };

        let layout = layout_view(&view, ViewKind::Main, &ctx, 40);
        assert_eq!(lines(&layout), vec!["$: ready"]);
        assert_eq!(layout.targets.len(), 1);
    }
}
