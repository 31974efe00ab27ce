//! Status line rendering.

use livetree_core::feed::Connectivity;
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use super::state::StatusLine;
use crate::common::text::truncate_with_ellipsis;

const KEY_HINTS: &str = "q quit · tab pane · space fold · r raw · f fav · c copy";

/// Renders poll health on the left and either the toast or key hints after it.
pub fn render_status_line(status: &StatusLine, toast: Option<&str>, frame: &mut Frame, area: Rect) {
    let mut spans = health_spans(status);

    let used: usize = spans.iter().map(Span::width).sum();
    let room = usize::from(area.width).saturating_sub(used + 2);
    let tail = match (toast, &status.last_error) {
        (Some(toast), _) => Span::styled(
            truncate_with_ellipsis(toast, room),
            Style::default().fg(Color::Yellow),
        ),
        (None, Some(error)) => Span::styled(
            truncate_with_ellipsis(error, room),
            Style::default().fg(Color::Red),
        ),
        (None, None) => Span::styled(
            truncate_with_ellipsis(KEY_HINTS, room),
            Style::default().fg(Color::DarkGray),
        ),
    };
    spans.push(Span::raw("  "));
    spans.push(tail);

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Connectivity, failure streak, update count and snapshot age.
fn health_spans(status: &StatusLine) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    let label = status.connectivity.label();
    match status.connectivity {
        Connectivity::Online => {
            spans.push(Span::styled(format!("● {label}"), Style::default().fg(Color::Green)));
        }
        Connectivity::Offline => {
            spans.push(Span::styled(format!("○ {label}"), Style::default().fg(Color::Red)));
            if status.consecutive_failures > 0 {
                spans.push(Span::styled(
                    format!(" ×{}", status.consecutive_failures),
                    Style::default().fg(Color::Red),
                ));
            }
        }
    }

    match status.since_success {
        Some(age) => spans.push(Span::styled(
            format!("  #{} updated {:.1}s ago", status.successes, age.as_secs_f32()),
            Style::default().fg(Color::DarkGray),
        )),
        None => spans.push(Span::styled(
            "  waiting for first snapshot",
            Style::default().fg(Color::DarkGray),
        )),
    }
    spans
}
