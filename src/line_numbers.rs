//! Relative line numbers for the editor gutter.
//!
//! Lines are 1-based, matching what the gutter displays. Labels are computed
//! only for the rows being rendered, so a recomputation costs
//! O(visible rows) regardless of document size.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

/// What the cursor's own line shows in the gutter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CursorLinePolicy {
    /// A fixed `0` marker
    #[default]
    Marker,
    /// The absolute line number
    Absolute,
}

/// A gutter label for one rendered line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineLabel {
    pub line: usize,
    pub label: String,
}

/// Label for `line` given the cursor line, using the `0` marker policy
pub fn compute_label(line: usize, cursor_line: usize, total_lines: usize) -> String {
    RelativeLineNumbers::default().label(line, cursor_line, total_lines)
}

/// Gutter label renderer
#[derive(Debug, Clone, Copy, Default)]
pub struct RelativeLineNumbers {
    policy: CursorLinePolicy,
}

impl RelativeLineNumbers {
    pub fn new(policy: CursorLinePolicy) -> Self {
        Self { policy }
    }

    pub fn label(&self, line: usize, cursor_line: usize, total_lines: usize) -> String {
        // Rows past the end of the document
        if line > total_lines {
            return "0".to_string();
        }

        if line == cursor_line {
            return match self.policy {
                CursorLinePolicy::Marker => "0".to_string(),
                CursorLinePolicy::Absolute => line.to_string(),
            };
        }

        line.abs_diff(cursor_line).to_string()
    }

    /// Labels for the rendered rows only
    pub fn labels(
        &self,
        rows: RangeInclusive<usize>,
        cursor_line: usize,
        total_lines: usize,
    ) -> Vec<LineLabel> {
        rows.map(|line| LineLabel {
            line,
            label: self.label(line, cursor_line, total_lines),
        })
        .collect()
    }
}

/// Remembers the cursor line the gutter was last computed for
#[derive(Debug, Clone, Copy, Default)]
pub struct GutterState {
    last_cursor_line: Option<usize>,
}

impl GutterState {
    /// True when the cursor moved to another line since the last call
    pub fn needs_refresh(&mut self, cursor_line: usize) -> bool {
        if self.last_cursor_line == Some(cursor_line) {
            return false;
        }
        self.last_cursor_line = Some(cursor_line);
        true
    }

    /// Force the next check to refresh, e.g. after an edit changed line count
    pub fn invalidate(&mut self) {
        self.last_cursor_line = None;
    }
}
