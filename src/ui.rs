use ratatui::prelude::*;

use crate::app::{App, CommandMode};
use crate::widgets::{Editor, StatusLine};

impl App {
    /// Main render function for the application UI
    pub fn render(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(1),    // Editor area
                Constraint::Length(1), // Status line
            ])
            .split(f.area());

        self.render_editor(f, chunks[0]);
        self.render_status_line(f, chunks[1]);
    }

    fn render_editor(&mut self, f: &mut Frame, area: Rect) {
        let gutter_width = self.engine().with_buffer(|b| b.line_number_width());
        let text_width = (area.width as usize).saturating_sub(gutter_width);
        self.ensure_cursor_visible(area.height as usize, text_width);

        let scroll_offset = self.scroll_offset;
        let labels = self.gutter_labels(area.height as usize).to_vec();
        let engine = self.engine().clone();

        engine.with_buffer(|buffer| {
            f.render_widget(Editor::new(buffer, &labels).with_scroll(scroll_offset), area);

            if self.command_mode == CommandMode::Editor {
                let (row, col) = buffer.cursor_pos;
                let line = &buffer.content[row];
                let from = scroll_offset.1.min(col).min(line.len());
                let column = line
                    .get(from..col.min(line.len()))
                    .map_or(0, |visible| visible.chars().count());
                let x = area.x + (gutter_width + column) as u16;
                let y = area.y + row.saturating_sub(scroll_offset.0) as u16;
                if x < area.right() && y < area.bottom() {
                    f.set_cursor_position(Position::new(x, y));
                }
            }
        });
    }

    fn render_status_line(&mut self, f: &mut Frame, area: Rect) {
        let page = self.session.page();
        let command_line = match self.command_mode {
            CommandMode::CommandLine => Some(self.command_input.as_str()),
            CommandMode::Editor => None,
        };

        let status_line = StatusLine::new(page.status.snapshot(), page.mode.snapshot())
            .with_command_line(command_line);
        f.render_widget(status_line, area);

        if command_line.is_some() {
            let x = area.x + 1 + self.command_input.chars().count() as u16;
            if x < area.right() {
                f.set_cursor_position(Position::new(x, area.y));
            }
        }
    }
}
