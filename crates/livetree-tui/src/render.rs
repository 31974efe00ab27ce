//! Pure view/render functions for the viewer.
//!
//! Functions here take `&AppState`, draw to a ratatui `Frame`, and never
//! mutate state or return effects. Pane geometry is shared with the reducer
//! through `pane_areas`, so scrolling decisions match what is drawn.

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::common::text::{slice_spans, truncate_with_ellipsis};
use crate::features::statusline::render_status_line;
use crate::state::{AppState, Pane, PaneCursor};

/// Height of the header line.
const HEADER_HEIGHT: u16 = 1;

/// Height of the status line.
const STATUS_HEIGHT: u16 = 1;

/// Share of the body given to the main pane when favorites are docked.
const MAIN_PERCENT: u16 = 60;

/// Screen regions of one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaneAreas {
    pub header: Rect,
    pub main_block: Rect,
    /// Drawable area inside the main pane border.
    pub main: Rect,
    pub favorites_block: Option<Rect>,
    pub favorites: Option<Rect>,
    pub status: Rect,
}

impl PaneAreas {
    pub fn inner(&self, pane: Pane) -> Rect {
        match pane {
            Pane::Main => self.main,
            Pane::Favorites => self.favorites.unwrap_or_default(),
        }
    }
}

/// Splits a `width` x `height` screen into header, panes and status line.
pub fn pane_areas(width: u16, height: u16, favorites_visible: bool) -> PaneAreas {
    let area = Rect::new(0, 0, width, height);
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(HEADER_HEIGHT),
            Constraint::Min(0),
            Constraint::Length(STATUS_HEIGHT),
        ])
        .split(area);
    let (header, body, status) = (rows[0], rows[1], rows[2]);

    let (main_block, favorites_block) = if favorites_visible {
        let panes = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Percentage(MAIN_PERCENT),
                Constraint::Percentage(100 - MAIN_PERCENT),
            ])
            .split(body);
        (panes[0], Some(panes[1]))
    } else {
        (body, None)
    };

    let inner = |rect: Rect| Block::default().borders(Borders::ALL).inner(rect);
    PaneAreas {
        header,
        main_block,
        main: inner(main_block),
        favorites_block,
        favorites: favorites_block.map(inner),
        status,
    }
}

/// Renders the entire viewer to the frame.
pub fn render(app: &AppState, frame: &mut Frame) {
    let size = frame.area();
    let areas = pane_areas(size.width, size.height, app.favorites_visible());

    render_header(app, frame, areas.header);
    render_pane(app, Pane::Main, frame, areas.main_block);
    if let Some(block) = areas.favorites_block {
        render_pane(app, Pane::Favorites, frame, block);
    }

    let status = app.poll.snapshot();
    let toast = app.toast.as_ref().map(|toast| toast.text.as_str());
    render_status_line(&status, toast, frame, areas.status);
}

fn render_header(app: &AppState, frame: &mut Frame, area: Rect) {
    let connectivity = app.poll.connectivity();
    let (dot, color) = if connectivity.is_online() {
        ("●", Color::Green)
    } else {
        ("○", Color::Red)
    };

    let room = usize::from(area.width).saturating_sub(24) / 2;
    let line = Line::from(vec![
        Span::styled(
            "livetree ",
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::styled(dot, Style::default().fg(color)),
        Span::raw(" "),
        Span::styled(
            truncate_with_ellipsis(&app.config.feed_url, room),
            Style::default().fg(Color::Gray),
        ),
        Span::styled("  @ ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            truncate_with_ellipsis(&app.address, room),
            Style::default().fg(Color::Cyan),
        ),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn render_pane(app: &AppState, pane: Pane, frame: &mut Frame, area: Rect) {
    let focused = app.pane == pane;
    let border = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let title = match pane {
        Pane::Main => " tree ".to_string(),
        Pane::Favorites => {
            let pin = if app.pinned { " (pinned)" } else { "" };
            format!(" ★ favorites {}{pin} ", app.panels.len())
        }
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border)
        .title(title);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let layout = app.layout(pane);
    let lines = visible_lines(&layout.lines, app.cursor(pane), inner);
    frame.render_widget(Paragraph::new(lines), inner);
}

/// Cuts the scrolled window out of a laid out pane.
fn visible_lines(
    lines: &[Line<'static>],
    cursor: &PaneCursor,
    area: Rect,
) -> Vec<Line<'static>> {
    lines
        .iter()
        .skip(cursor.scroll_y)
        .take(usize::from(area.height))
        .map(|line| {
            Line::from(slice_spans(
                &line.spans,
                cursor.scroll_x,
                usize::from(area.width),
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pane_areas_without_favorites() {
        let areas = pane_areas(80, 24, false);
        assert_eq!(areas.header, Rect::new(0, 0, 80, 1));
        assert_eq!(areas.status, Rect::new(0, 23, 80, 1));
        assert_eq!(areas.main, Rect::new(1, 2, 78, 20));
        assert!(areas.favorites.is_none());
    }

    #[test]
    fn test_pane_areas_docks_favorites_below() {
        let areas = pane_areas(80, 24, true);
        let favorites = areas.favorites.unwrap();
        assert!(favorites.y > areas.main.y + areas.main.height);
        assert_eq!(favorites.width, 78);
    }

    #[test]
    fn test_visible_lines_window() {
        let lines: Vec<Line<'static>> = (0..10).map(|i| Line::from(format!("row {i}"))).collect();
        let cursor = PaneCursor {
            scroll_y: 3,
            scroll_x: 4,
            ..PaneCursor::default()
        };

        let window = visible_lines(&lines, &cursor, Rect::new(0, 0, 2, 2));
        assert_eq!(window.len(), 2);
        assert_eq!(window[0].to_string(), "3");
        assert_eq!(window[1].to_string(), "4");
    }
}
