//! # Document Buffer
//!
//! The live document behind the in-process editing engine.
//!
//! ## What it does
//!
//! - Stores text as lines in memory
//! - Tracks the primary cursor and the selection (characterwise or linewise)
//! - Converts between (row, column) positions and flat byte offsets
//! - Inserts text at an offset (used by paste) without touching the selection
//!
//! ## Structure
//!
//! Columns are byte indices into the line and always sit on a character
//! boundary. Offsets count bytes over the whole document with `\n` between
//! lines, which is exactly how [`Buffer::content_as_string`] joins them.

#[derive(Clone, Debug)]
pub struct Buffer {
    pub content: Vec<String>,
    pub modified: bool,
    pub cursor_pos: (usize, usize),              // (row, column)
    pub selection_start: Option<(usize, usize)>, // Anchor of the selection, if any
    pub visual_mode: bool,                       // Whether a selection is being extended
    pub linewise: bool,                          // Whether the selection covers whole lines
}

impl Default for Buffer {
    fn default() -> Self {
        Self::new()
    }
}

impl Buffer {
    pub fn new() -> Self {
        Self {
            content: vec![String::new()],
            modified: false,
            cursor_pos: (0, 0),
            selection_start: None,
            visual_mode: false,
            linewise: false,
        }
    }

    /// Build a buffer holding exactly `text`
    pub fn from_text(text: &str) -> Self {
        Self {
            content: text.split('\n').map(str::to_owned).collect(),
            ..Self::new()
        }
    }

    /// Get buffer content as a string without allocating intermediate strings
    pub fn content_as_string(&self) -> String {
        let total_chars: usize = self.content.iter().map(|line| line.len() + 1).sum(); // +1 for newlines
        let mut result = String::with_capacity(total_chars.saturating_sub(1));

        for (i, line) in self.content.iter().enumerate() {
            result.push_str(line);
            if i < self.content.len() - 1 {
                result.push('\n');
            }
        }

        result
    }

    pub fn line_count(&self) -> usize {
        self.content.len().max(1)
    }

    /// Byte offset of a (row, column) position
    pub fn offset_of(&self, (row, col): (usize, usize)) -> usize {
        let row = row.min(self.content.len().saturating_sub(1));
        let before: usize = self.content[..row].iter().map(|line| line.len() + 1).sum();
        before + col.min(self.content.get(row).map_or(0, String::len))
    }

    /// (row, column) of a byte offset, clamped to the document end
    pub fn position_at(&self, offset: usize) -> (usize, usize) {
        let mut remaining = offset;
        for (row, line) in self.content.iter().enumerate() {
            if remaining <= line.len() {
                return (row, floor_char_boundary(line, remaining));
            }
            remaining -= line.len() + 1;
        }

        let last = self.content.len().saturating_sub(1);
        (last, self.content.get(last).map_or(0, String::len))
    }

    pub fn cursor_offset(&self) -> usize {
        self.offset_of(self.cursor_pos)
    }

    /// Insert `text` at `offset`. The cursor keeps its place in the text
    /// that follows; the selection is left as it is.
    pub fn insert_str_at(&mut self, offset: usize, text: &str) {
        if text.is_empty() {
            return;
        }

        let cursor = self.cursor_offset();
        let (row, col) = self.position_at(offset);
        let insert_offset = self.offset_of((row, col));

        let tail = self.content[row].split_off(col);
        let mut pieces = text.split('\n');
        if let Some(first) = pieces.next() {
            self.content[row].push_str(first);
        }

        let mut last_row = row;
        for piece in pieces {
            last_row += 1;
            self.content.insert(last_row, piece.to_owned());
        }
        self.content[last_row].push_str(&tail);

        if cursor >= insert_offset {
            self.cursor_pos = self.position_at(cursor + text.len());
        }
        self.modified = true;
    }

    pub fn insert_char(&mut self, c: char) {
        let (row, col) = self.cursor_pos;
        if row >= self.content.len() {
            self.content.push(String::new());
        }

        let line = &mut self.content[row];
        if col > line.len() {
            line.push_str(&" ".repeat(col - line.len()));
        }

        line.insert(col, c);
        self.cursor_pos.1 += c.len_utf8();
        self.modified = true;
    }

    pub fn insert_newline(&mut self) {
        let (row, col) = self.cursor_pos;
        if row >= self.content.len() {
            self.content.push(String::new());
            self.cursor_pos = (row + 1, 0);
            return;
        }

        if col < self.content[row].len() {
            let new_line = self.content[row].split_off(col);
            self.content.insert(row + 1, new_line);
        } else {
            self.content.insert(row + 1, String::new());
        }

        self.cursor_pos = (row + 1, 0);
        self.modified = true;
    }

    pub fn backspace(&mut self) {
        let (row, col) = self.cursor_pos;
        if col > 0 {
            // Delete character before cursor
            let line = &mut self.content[row];
            let prev = prev_char_boundary(line, col);
            line.replace_range(prev..col, "");
            self.cursor_pos.1 = prev;
        } else if row > 0 {
            // Join with previous line
            let current_line = self.content.remove(row);
            let prev_line = &mut self.content[row - 1];
            let new_cursor_col = prev_line.len();
            prev_line.push_str(&current_line);
            self.cursor_pos = (row - 1, new_cursor_col);
        }
        self.modified = true;
    }

    /// Start a selection at the cursor
    pub fn start_selection(&mut self, linewise: bool) {
        self.visual_mode = true;
        self.linewise = linewise;
        self.selection_start = Some(self.cursor_pos);
    }

    /// Clear the current selection
    pub fn clear_selection(&mut self) {
        self.selection_start = None;
        self.visual_mode = false;
        self.linewise = false;
    }

    /// Check if the buffer has unsaved changes
    pub fn is_dirty(&self) -> bool {
        self.modified
    }

    /// Get the current selection range as (start_pos, end_pos), ordered
    pub fn get_selection_range(&self) -> Option<(Position, Position)> {
        self.selection_start.map(|start| {
            let start_pos = Position::from_tuple(start);
            let end_pos = Position::from_tuple(self.cursor_pos);

            if start_pos <= end_pos {
                (start_pos, end_pos)
            } else {
                (end_pos, start_pos)
            }
        })
    }

    /// Get the text content of the current selection.
    ///
    /// Characterwise selections are inclusive of the character under the
    /// cursor, as in visual mode; linewise selections cover whole lines and
    /// end with a newline.
    pub fn get_selected_text(&self) -> Option<String> {
        let (start, end) = self.get_selection_range()?;

        if self.linewise {
            let last = end.row.min(self.content.len().saturating_sub(1));
            let mut text = self.content[start.row..=last].join("\n");
            text.push('\n');
            return Some(text);
        }

        let from = self.offset_of(start.to_tuple());
        let end_line = &self.content[end.row.min(self.content.len() - 1)];
        let end_col = next_char_boundary(end_line, end.col);
        let to = self.offset_of((end.row, end_col));

        let text = self.content_as_string();
        Some(text[from..to.min(text.len())].to_string())
    }

    pub fn move_cursor(&mut self, direction: CursorMovement) {
        let (mut row, mut col) = self.cursor_pos;

        match direction {
            CursorMovement::Up => {
                if row > 0 {
                    row -= 1;
                    col = floor_char_boundary(&self.content[row], col);
                }
            }
            CursorMovement::Down => {
                if row + 1 < self.content.len() {
                    row += 1;
                    col = floor_char_boundary(&self.content[row], col);
                }
            }
            CursorMovement::Left => {
                if col > 0 {
                    col = prev_char_boundary(&self.content[row], col);
                } else if row > 0 {
                    row -= 1;
                    col = self.content[row].len();
                }
            }
            CursorMovement::Right => {
                let line = &self.content[row];
                if col < line.len() {
                    col = next_char_boundary(line, col);
                } else if row + 1 < self.content.len() {
                    row += 1;
                    col = 0;
                }
            }
            CursorMovement::LineStart => {
                col = 0;
            }
            CursorMovement::LineEnd => {
                if row < self.content.len() {
                    col = self.content[row].len();
                }
            }
            CursorMovement::BufferStart => {
                row = 0;
                col = 0;
            }
            CursorMovement::BufferEnd => {
                row = self.content.len().saturating_sub(1);
                col = self.content.get(row).map_or(0, String::len);
            }
        }

        self.cursor_pos = (row, col);
    }

    /// Count the number of digits in a number
    pub fn count_digits(mut n: usize) -> usize {
        if n == 0 {
            return 1;
        }
        let mut digits = 0;
        while n > 0 {
            digits += 1;
            n /= 10;
        }
        digits
    }

    /// Width of the line number gutter, at least 3 digits to prevent UI shifts
    pub fn line_number_width(&self) -> usize {
        Self::count_digits(self.line_count()).max(3) + 1 // +1 for spacing
    }
}

pub(crate) fn floor_char_boundary(line: &str, mut col: usize) -> usize {
    col = col.min(line.len());
    while !line.is_char_boundary(col) {
        col -= 1;
    }
    col
}

fn prev_char_boundary(line: &str, col: usize) -> usize {
    line[..col.min(line.len())]
        .char_indices()
        .next_back()
        .map_or(0, |(i, _)| i)
}

pub(crate) fn next_char_boundary(line: &str, col: usize) -> usize {
    line[col.min(line.len())..]
        .chars()
        .next()
        .map_or(line.len(), |c| col + c.len_utf8())
}

pub enum CursorMovement {
    Up,
    Down,
    Left,
    Right,
    LineStart,
    LineEnd,
    BufferStart,
    BufferEnd,
}

/// Represents a text position (row, column)
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    /// Convert from tuple
    pub fn from_tuple(pos: (usize, usize)) -> Self {
        Self {
            row: pos.0,
            col: pos.1,
        }
    }

    /// Convert to tuple
    pub fn to_tuple(&self) -> (usize, usize) {
        (self.row, self.col)
    }
}
