use std::io::Stdout;
use std::time::{Duration, Instant};

use anyhow::Result;
use ratatui::{
    backend::CrosstermBackend,
    crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    Terminal,
};
use tracing::{debug, info, warn};

use crate::buffer::CursorMovement;
use crate::config::KeyTarget;
use crate::engine::{BufferEngine, KeyResolution, ModeChange};
use crate::line_numbers::{GutterState, LineLabel};
use crate::session::Session;

/// What keystrokes currently go to
#[derive(Debug, PartialEq, Clone)]
pub enum CommandMode {
    /// Keys drive the editing engine
    Editor,

    /// Keys edit the `:` command line
    CommandLine,
}

/// Terminal host for one editing session
pub struct App {
    /// Whether the application is running
    pub running: bool,

    pub session: Session<BufferEngine>,

    /// Scroll position for the editor viewport
    pub scroll_offset: (usize, usize),

    pub command_mode: CommandMode,

    /// Command line input, without the leading `:`
    pub command_input: String,

    /// Keys typed so far that prefix a mapping
    pub pending_keys: Vec<String>,

    gutter: GutterState,
    gutter_labels: Vec<LineLabel>,
    gutter_key: (usize, usize, usize),
}

impl App {
    pub fn new(session: Session<BufferEngine>) -> Self {
        Self {
            running: true,
            session,
            scroll_offset: (0, 0),
            command_mode: CommandMode::Editor,
            command_input: String::new(),
            pending_keys: Vec::new(),
            gutter: GutterState::default(),
            gutter_labels: Vec::new(),
            gutter_key: (0, 0, 0),
        }
    }

    pub fn engine(&self) -> &BufferEngine {
        self.session.engine()
    }

    /// Run the draw/input loop until the user quits
    pub async fn run(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        let frame_duration = Duration::from_millis(16);
        let mut last_frame: Option<Instant> = None;

        while self.running {
            let frame_start = Instant::now();
            if last_frame.map_or(true, |last| frame_start.duration_since(last) >= frame_duration) {
                terminal.draw(|f| self.render(f))?;
                last_frame = Some(frame_start);
            }

            if event::poll(Duration::from_millis(1))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key);
                    }
                }
            } else {
                // Yield so spawned saves and status timers make progress
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        }

        info!("Quitting; waiting for {} pending command(s)", self.session.pending());
        self.session.settle().await;
        Ok(())
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.running = false;
            return;
        }

        match self.command_mode {
            CommandMode::CommandLine => self.handle_command_line_key(key),
            CommandMode::Editor => match self.engine().mode().mode.as_str() {
                "insert" => self.handle_insert_key(key),
                _ => self.handle_normal_key(key),
            },
        }
    }

    fn handle_command_line_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.leave_command_line(),
            KeyCode::Enter => {
                let input = std::mem::take(&mut self.command_input);
                self.leave_command_line();
                self.execute_ex(&input);
            }
            KeyCode::Backspace => {
                if self.command_input.pop().is_none() {
                    self.leave_command_line();
                }
            }
            KeyCode::Char(c) => self.command_input.push(c),
            _ => {}
        }
    }

    fn leave_command_line(&mut self) {
        self.command_mode = CommandMode::Editor;
        self.command_input.clear();
    }

    fn handle_insert_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.engine().set_mode(ModeChange::new("normal")),
            KeyCode::Enter => self.engine().with_buffer_mut(|b| b.insert_newline()),
            KeyCode::Backspace => self.engine().with_buffer_mut(|b| b.backspace()),
            KeyCode::Tab => self.engine().with_buffer_mut(|b| b.insert_char('\t')),
            KeyCode::Char(c) => self.engine().with_buffer_mut(|b| b.insert_char(c)),
            code => {
                if let Some(movement) = arrow_movement(code) {
                    self.engine().with_buffer_mut(|b| b.move_cursor(movement));
                }
            }
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent) {
        let token = match key.code {
            KeyCode::Esc => {
                self.pending_keys.clear();
                self.leave_visual();
                return;
            }
            KeyCode::Char(' ') => "<Space>".to_string(),
            KeyCode::Char(c) => c.to_string(),
            KeyCode::Enter => "<CR>".to_string(),
            code => {
                if let Some(movement) = arrow_movement(code) {
                    self.pending_keys.clear();
                    self.engine().with_buffer_mut(|b| b.move_cursor(movement));
                }
                return;
            }
        };

        self.pending_keys.push(token);
        let sequence = self.pending_keys.concat();
        match self.engine().resolve_keys(&sequence) {
            KeyResolution::Matched(target) => {
                self.pending_keys.clear();
                self.run_target(target);
            }
            KeyResolution::Pending => {}
            KeyResolution::Unmapped => {
                for token in std::mem::take(&mut self.pending_keys) {
                    self.run_builtin(&token);
                }
            }
        }
    }

    fn run_target(&mut self, target: KeyTarget) {
        debug!("Key mapping resolved to {:?}", target);
        match target {
            KeyTarget::Action(name) => {
                if let Err(e) = self.engine().run_action(&name) {
                    self.session.notifier().error(format!("ERROR: {}", e));
                }
            }
            // Mapped keys are not remapped again
            KeyTarget::Keys(keys) => {
                for token in split_keys(&keys) {
                    self.run_builtin(&token);
                }
            }
            KeyTarget::Ex(command) => self.execute_ex(&command),
        }
    }

    fn run_builtin(&mut self, token: &str) {
        let movement = match token {
            "h" => Some(CursorMovement::Left),
            "j" => Some(CursorMovement::Down),
            "k" => Some(CursorMovement::Up),
            "l" => Some(CursorMovement::Right),
            "0" => Some(CursorMovement::LineStart),
            "$" => Some(CursorMovement::LineEnd),
            "G" => Some(CursorMovement::BufferEnd),
            _ => None,
        };
        if let Some(movement) = movement {
            self.engine().with_buffer_mut(|b| b.move_cursor(movement));
            return;
        }

        let in_visual = self.engine().mode().mode == "visual";
        match token {
            "i" => {
                self.leave_visual();
                self.engine().set_mode(ModeChange::new("insert"));
            }
            "v" if in_visual && !self.engine().with_buffer(|b| b.linewise) => self.leave_visual(),
            "V" if in_visual && self.engine().with_buffer(|b| b.linewise) => self.leave_visual(),
            "v" => self.enter_visual(false),
            "V" => self.enter_visual(true),
            ":" => {
                self.command_mode = CommandMode::CommandLine;
                self.command_input.clear();
            }
            other => debug!("Unhandled key {}", other),
        }
    }

    fn enter_visual(&mut self, linewise: bool) {
        self.engine().with_buffer_mut(|b| b.start_selection(linewise));
        let change = ModeChange::new("visual");
        self.engine().set_mode(if linewise {
            change.with_sub_mode("linewise")
        } else {
            change
        });
    }

    fn leave_visual(&mut self) {
        self.engine().with_buffer_mut(|b| b.clear_selection());
        self.engine().set_mode(ModeChange::new("normal"));
    }

    fn execute_ex(&mut self, command: &str) {
        if command.trim().is_empty() {
            return;
        }
        if let Err(e) = self.engine().execute_ex(command) {
            warn!("{}", e);
            self.session.notifier().error(format!("ERROR: {}", e));
        }
    }

    /// Keep the cursor inside a viewport of `height` rows and `width` text columns
    pub fn ensure_cursor_visible(&mut self, height: usize, width: usize) {
        let (row, col) = self.engine().with_buffer(|b| b.cursor_pos);
        let (scroll_row, scroll_col) = self.scroll_offset;

        if row < scroll_row {
            self.scroll_offset.0 = row;
        } else if height > 0 && row >= scroll_row + height {
            self.scroll_offset.0 = row + 1 - height;
        }

        if col < scroll_col {
            self.scroll_offset.1 = col;
        } else if width > 0 && col >= scroll_col + width {
            self.scroll_offset.1 = col + 1 - width;
        }
    }

    /// Gutter labels for the visible rows, recomputed only when the cursor
    /// line, the viewport or the line count changed
    pub fn gutter_labels(&mut self, height: usize) -> &[LineLabel] {
        let (cursor_line, total) =
            self.engine().with_buffer(|b| (b.cursor_pos.0 + 1, b.line_count()));
        let key = (self.scroll_offset.0, height, total);
        if key != self.gutter_key {
            self.gutter_key = key;
            self.gutter.invalidate();
        }

        if self.gutter.needs_refresh(cursor_line) {
            let first = self.scroll_offset.0 + 1;
            let last = (self.scroll_offset.0 + height).min(total);
            self.gutter_labels = if first <= last {
                self.session
                    .line_numbers()
                    .labels(first..=last, cursor_line, total)
            } else {
                Vec::new()
            };
        }
        &self.gutter_labels
    }
}

fn arrow_movement(code: KeyCode) -> Option<CursorMovement> {
    match code {
        KeyCode::Up => Some(CursorMovement::Up),
        KeyCode::Down => Some(CursorMovement::Down),
        KeyCode::Left => Some(CursorMovement::Left),
        KeyCode::Right => Some(CursorMovement::Right),
        KeyCode::Home => Some(CursorMovement::LineStart),
        KeyCode::End => Some(CursorMovement::LineEnd),
        _ => None,
    }
}

/// Split `<Space>l` style key notation into single keys
pub fn split_keys(keys: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut rest = keys;
    while let Some(c) = rest.chars().next() {
        if c == '<' {
            if let Some(end) = rest.find('>') {
                tokens.push(rest[..=end].to_string());
                rest = &rest[end + 1..];
                continue;
            }
        }
        tokens.push(c.to_string());
        rest = &rest[c.len_utf8()..];
    }
    tokens
}
