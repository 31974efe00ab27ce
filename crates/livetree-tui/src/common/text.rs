//! Text utilities for TUI rendering.
//!
//! Shared text processing functions used across rendering paths.

use std::borrow::Cow;

use ratatui::text::Span;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Truncates a string with ellipsis if it exceeds max_width (unicode-aware).
///
/// Uses unicode width for accurate terminal column calculation, handling
/// wide characters (CJK, emoji) correctly.
pub fn truncate_with_ellipsis(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }
    if max_width <= 1 {
        return "…".to_string();
    }
    let mut truncated = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let ch_width = ch.width().unwrap_or(0);
        if used + ch_width + 1 > max_width {
            break;
        }
        truncated.push(ch);
        used += ch_width;
    }
    truncated.push('…');
    truncated
}

/// Makes snapshot text safe to draw on one terminal row.
///
/// Escapes are stripped, tabs expand to four spaces and line breaks become
/// a visible `⏎`.
pub fn sanitize_for_display(s: &str) -> Cow<'_, str> {
    if s.contains(['\x1b', '\t', '\n', '\r']) {
        Cow::Owned(
            s.replace('\x1b', "")
                .replace('\t', "    ")
                .replace("\r\n", "⏎")
                .replace(['\n', '\r'], "⏎"),
        )
    } else {
        Cow::Borrowed(s)
    }
}

/// Total display width of a row of spans.
pub fn spans_width(spans: &[Span<'_>]) -> usize {
    spans.iter().map(|span| span.content.width()).sum()
}

/// Returns the columns `start..start + width` of a row.
///
/// A wide character cut by either edge is replaced by spaces so the result
/// never exceeds `width` columns.
pub fn slice_spans(spans: &[Span<'static>], start: usize, width: usize) -> Vec<Span<'static>> {
    let end = start + width;
    let mut out = Vec::new();
    let mut col = 0;

    for span in spans {
        if col >= end {
            break;
        }
        let span_width = span.content.width();
        if col + span_width <= start {
            col += span_width;
            continue;
        }
        if col >= start && col + span_width <= end {
            out.push(span.clone());
            col += span_width;
            continue;
        }

        let mut text = String::new();
        for ch in span.content.chars() {
            let ch_width = ch.width().unwrap_or(0);
            let ch_end = col + ch_width;
            if ch_end <= start {
                // before the window
            } else if col >= start && ch_end <= end {
                text.push(ch);
            } else {
                let visible = ch_end.min(end).saturating_sub(col.max(start));
                text.extend(std::iter::repeat_n(' ', visible));
            }
            col = ch_end;
            if col >= end {
                break;
            }
        }
        if !text.is_empty() {
            out.push(Span::styled(text, span.style));
        }
    }
    out
}

/// Cuts a row to `width` columns and pads it with spaces to exactly `width`.
pub fn fit_spans(spans: &[Span<'static>], width: usize) -> Vec<Span<'static>> {
    let mut out = slice_spans(spans, 0, width);
    let used = spans_width(&out);
    if used < width {
        out.push(Span::raw(" ".repeat(width - used)));
    }
    out
}
