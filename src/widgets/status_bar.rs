use ratatui::{
    buffer::Buffer as TuiBuffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use crate::status::{ERROR_CLASS, NO_CHANGES_CLASS};
use crate::widgets::element::ElementState;

const BACKGROUND: Style = Style::new().bg(Color::Black).fg(Color::White);

/// Bottom line: status message (or the command line) on the left, mode on the right
#[derive(Debug, Clone)]
pub struct StatusLine<'a> {
    status: ElementState,
    mode: ElementState,
    command_line: Option<&'a str>,
}

impl<'a> StatusLine<'a> {
    pub fn new(status: ElementState, mode: ElementState) -> Self {
        Self {
            status,
            mode,
            command_line: None,
        }
    }

    /// Show `:input` in place of the status message
    pub fn with_command_line(mut self, input: Option<&'a str>) -> Self {
        self.command_line = input;
        self
    }

    pub fn status_style(status: &ElementState) -> Style {
        if status.classes.contains(ERROR_CLASS) {
            BACKGROUND.fg(Color::Red)
        } else if status.classes.contains(NO_CHANGES_CLASS) {
            BACKGROUND.fg(Color::Yellow)
        } else {
            BACKGROUND
        }
    }

    pub fn mode_style(mode: &ElementState) -> Style {
        let bg = mode.classes.iter().find_map(|class| match class.as_str() {
            "normal" => Some(Color::Blue),
            "insert" => Some(Color::Green),
            "visual" | "visual-line" => Some(Color::Magenta),
            "unknown" => Some(Color::DarkGray),
            _ => None,
        });

        Style::default()
            .fg(Color::Black)
            .bg(bg.unwrap_or(Color::DarkGray))
            .add_modifier(Modifier::BOLD)
    }
}

impl Widget for StatusLine<'_> {
    fn render(self, area: Rect, buf: &mut TuiBuffer) {
        if area.width == 0 {
            return;
        }

        let left = match self.command_line {
            Some(input) => Span::styled(format!(":{}", input), BACKGROUND),
            None => Span::styled(self.status.text.clone(), Self::status_style(&self.status)),
        };
        let right = Span::styled(format!(" {} ", self.mode.text), Self::mode_style(&self.mode));

        let available = area.width as usize;
        let right_width = right.width();
        let left_width = left.width();

        // The mode label wins when both do not fit
        let spans = if left_width + right_width <= available {
            let padding = available - left_width - right_width;
            vec![left, Span::styled(" ".repeat(padding), BACKGROUND), right]
        } else if right_width <= available {
            vec![Span::styled(" ".repeat(available - right_width), BACKGROUND), right]
        } else {
            vec![right]
        };

        Paragraph::new(Line::from(spans))
            .style(BACKGROUND)
            .render(area, buf);
    }
}
