use ratatui::{
    buffer::Buffer as TuiBuffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use crate::buffer::{floor_char_boundary, next_char_boundary, Buffer};
use crate::line_numbers::LineLabel;

const GUTTER_STYLE: Style = Style::new().fg(Color::Rgb(100, 100, 120));
const CURSOR_LINE_GUTTER_STYLE: Style = Style::new().fg(Color::Yellow);
const SELECTION_STYLE: Style = Style::new().bg(Color::DarkGray).fg(Color::White);

/// Text area with a relative line number gutter
pub struct Editor<'a> {
    pub buffer: &'a Buffer,
    pub scroll_offset: (usize, usize), // (row, col) offset for viewport scrolling
    /// Gutter labels for the visible rows, first entry is the top row
    pub labels: &'a [LineLabel],
}

impl<'a> Editor<'a> {
    pub fn new(buffer: &'a Buffer, labels: &'a [LineLabel]) -> Self {
        Self {
            buffer,
            scroll_offset: (0, 0),
            labels,
        }
    }

    pub fn with_scroll(mut self, scroll_offset: (usize, usize)) -> Self {
        self.scroll_offset = scroll_offset;
        self
    }

    /// Byte range of `line` covered by the selection, if any
    fn selected_range(&self, row: usize, line: &str) -> Option<(usize, usize)> {
        let (start, end) = self.buffer.get_selection_range()?;
        if row < start.row || row > end.row {
            return None;
        }
        if self.buffer.linewise {
            return Some((0, line.len()));
        }

        let from = if row == start.row {
            floor_char_boundary(line, start.col)
        } else {
            0
        };
        // Characterwise selections include the character under the cursor
        let to = if row == end.row {
            next_char_boundary(line, floor_char_boundary(line, end.col))
        } else {
            line.len()
        };
        Some((from, to.max(from)))
    }

    fn content_spans(&self, row: usize, line: &'a str) -> Vec<Span<'a>> {
        let h_offset = floor_char_boundary(line, self.scroll_offset.1);
        let visible = &line[h_offset..];

        let Some((from, to)) = self.selected_range(row, line) else {
            return vec![Span::raw(visible)];
        };

        let from = from.saturating_sub(h_offset).min(visible.len());
        let to = to.saturating_sub(h_offset).min(visible.len());

        let mut spans = Vec::with_capacity(3);
        if from > 0 {
            spans.push(Span::raw(&visible[..from]));
        }
        if to > from {
            spans.push(Span::styled(&visible[from..to], SELECTION_STYLE));
        }
        if to < visible.len() {
            spans.push(Span::raw(&visible[to..]));
        }
        spans
    }
}

impl Widget for Editor<'_> {
    fn render(self, area: Rect, buf: &mut TuiBuffer) {
        let start_row = self.scroll_offset.0;
        let end_row = (start_row + area.height as usize).min(self.buffer.content.len());
        let gutter_width = self.buffer.line_number_width();
        let cursor_row = self.buffer.cursor_pos.0;

        let mut lines = Vec::with_capacity(end_row.saturating_sub(start_row));
        for (i, row) in (start_row..end_row).enumerate() {
            let label = self
                .labels
                .get(i)
                .filter(|label| label.line == row + 1)
                .map_or("", |label| label.label.as_str());
            let gutter_style = if row == cursor_row {
                CURSOR_LINE_GUTTER_STYLE
            } else {
                GUTTER_STYLE
            };

            let mut spans = vec![
                Span::styled(
                    format!("{:>width$}", label, width = gutter_width - 1),
                    gutter_style,
                ),
                Span::raw(" "),
            ];
            spans.extend(self.content_spans(row, &self.buffer.content[row]));
            lines.push(Line::from(spans));
        }

        Paragraph::new(lines)
            .style(Style::default().fg(Color::White).bg(Color::Black))
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line_numbers::RelativeLineNumbers;

    fn render(buffer: &Buffer, width: u16, height: u16) -> TuiBuffer {
        let labels = RelativeLineNumbers::default().labels(
            1..=height as usize,
            buffer.cursor_pos.0 + 1,
            buffer.line_count(),
        );
        let area = Rect::new(0, 0, width, height);
        let mut tui = TuiBuffer::empty(area);
        Editor::new(buffer, &labels).render(area, &mut tui);
        tui
    }

    fn row_text(tui: &TuiBuffer, y: u16) -> String {
        (0..tui.area.width)
            .map(|x| tui[(x, y)].symbol().to_string())
            .collect::<String>()
    }

    #[test]
    fn test_gutter_shows_relative_labels() {
        let mut buffer = Buffer::from_text("a\nb\nc");
        buffer.cursor_pos = (1, 0);

        let tui = render(&buffer, 10, 3);
        assert!(row_text(&tui, 0).starts_with("  1 a"));
        assert!(row_text(&tui, 1).starts_with("  0 b"));
        assert!(row_text(&tui, 2).starts_with("  1 c"));
    }

    #[test]
    fn test_selection_is_highlighted_inclusively() {
        let mut buffer = Buffer::from_text("hello");
        buffer.start_selection(false);
        buffer.cursor_pos = (0, 1);

        let tui = render(&buffer, 10, 1);
        // Gutter is 4 columns wide
        assert_eq!(tui[(4, 0)].bg, Color::DarkGray);
        assert_eq!(tui[(5, 0)].bg, Color::DarkGray);
        assert_eq!(tui[(6, 0)].bg, Color::Black);
    }
}
