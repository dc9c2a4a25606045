use std::path::Path;
use std::time::Duration;
use tracing::{error, info, trace};

use arboard::Clipboard;
use ratatui::crossterm::event::{self, Event, KeyCode, KeyEvent};

use crate::domain::{CMDMode, Message, TVConfig, TVError};
use crate::inputter::{InputResult, Inputter};
use crate::model::Model;
use crate::pager::PageSize;
use crate::table::{file_name, load_file, resolve_path};

/// Turns terminal events into messages and runs the side effects
/// (file loading, clipboard) the model itself never performs.
pub struct Controller {
    event_poll_time: u64,
    input: Inputter,
    cmd_mode: Option<CMDMode>,
    last_input: InputResult,
    filter_before_edit: String,
    clipboard: Option<Clipboard>,
}

impl Controller {
    pub fn new(cfg: &TVConfig) -> Self {
        Self {
            event_poll_time: cfg.event_poll_time,
            input: Inputter::default(),
            cmd_mode: None,
            last_input: InputResult::default(),
            filter_before_edit: String::new(),
            clipboard: None,
        }
    }

    /// The prompt being edited, if any.
    pub fn prompt(&self) -> Option<(CMDMode, &InputResult)> {
        self.cmd_mode.map(|mode| (mode, &self.last_input))
    }

    pub fn handle_event(&mut self, model: &Model) -> Result<Option<Message>, TVError> {
        if event::poll(Duration::from_millis(self.event_poll_time))?
            && let Event::Key(key) = event::read()?
            && key.kind == event::KeyEventKind::Press
        {
            let message = self.handle_key(model, key);
            return Ok(message.map(|m| self.resolve(model, m)));
        }
        Ok(None)
    }

    /// Run the side effect behind `Open` and `CopyRows` and report the outcome
    /// as a message the model understands.
    pub fn resolve(&mut self, model: &Model, message: Message) -> Message {
        match message {
            Message::Open(path) => open(&path),
            Message::CopyRows => self.copy_rows(model),
            m => m,
        }
    }

    fn handle_key(&mut self, model: &Model, key: KeyEvent) -> Option<Message> {
        if let Some(mode) = self.cmd_mode {
            return self.handle_prompt_key(mode, key);
        }

        let message = match key.code {
            KeyCode::Char('q') => Some(Message::Quit),
            KeyCode::Char('?') => Some(Message::Help),
            KeyCode::Esc => Some(Message::Exit),
            _ if model.show_help() => None,
            KeyCode::Left | KeyCode::Char('h') => Some(Message::MoveLeft),
            KeyCode::Right | KeyCode::Char('l') => Some(Message::MoveRight),
            KeyCode::Char('s') | KeyCode::Enter => Some(Message::SortSelected),
            KeyCode::Char('n') | KeyCode::PageDown => Some(Message::NextPage),
            KeyCode::Char('p') | KeyCode::PageUp => Some(Message::PreviousPage),
            KeyCode::Char('g') | KeyCode::Home => Some(Message::FirstPage),
            KeyCode::Char('G') | KeyCode::End => Some(Message::LastPage),
            KeyCode::Char('+') => Some(Message::CyclePageSize(true)),
            KeyCode::Char('-') => Some(Message::CyclePageSize(false)),
            KeyCode::Char('a') => Some(Message::SetPageSize(PageSize::Unbounded)),
            KeyCode::Char('c') => Some(Message::ClearFilters),
            KeyCode::Char('y') => Some(Message::CopyRows),
            KeyCode::Char('f') | KeyCode::Char('/') => {
                if model.header().is_empty() {
                    None
                } else {
                    let column = model.selected_column();
                    self.filter_before_edit = model.filter(column).to_string();
                    self.enter_cmd_mode(CMDMode::Filter(column), model.filter(column));
                    None
                }
            }
            KeyCode::Char('o') => {
                self.enter_cmd_mode(CMDMode::Open, "");
                None
            }
            _ => None,
        };
        trace!("Mapped: {key:?} => {message:?}");
        message
    }

    fn enter_cmd_mode(&mut self, mode: CMDMode, text: &str) {
        trace!("Entering command mode {:?} ...", mode);
        self.cmd_mode = Some(mode);
        self.input.start(text);
        self.last_input = self.input.get();
    }

    fn handle_prompt_key(&mut self, mode: CMDMode, key: KeyEvent) -> Option<Message> {
        self.last_input = self.input.read(key);
        if self.last_input.finished {
            self.cmd_mode = None;
        }
        let result = &self.last_input;

        match mode {
            // Filters apply while typing, Esc brings back the text from before the edit.
            CMDMode::Filter(column) => {
                if result.canceled {
                    Some(Message::SetFilter(column, self.filter_before_edit.clone()))
                } else if result.changed {
                    Some(Message::SetFilter(column, result.input.clone()))
                } else {
                    None
                }
            }
            CMDMode::Open => {
                if !result.finished || result.canceled || result.input.trim().is_empty() {
                    return None;
                }
                match resolve_path(&result.input) {
                    Ok(path) => Some(Message::Open(path)),
                    Err(e) => Some(Message::LoadFailed(e.to_string())),
                }
            }
        }
    }

    fn copy_rows(&mut self, model: &Model) -> Message {
        if model.header().is_empty() {
            return Message::Status("Nothing to copy".to_string());
        }
        let content = model.export_csv();
        let clipboard = match self.clipboard.take() {
            Some(clipboard) => Ok(clipboard),
            None => Clipboard::new(),
        };
        let result = clipboard.and_then(|mut clipboard| {
            let result = clipboard.set_text(content);
            self.clipboard = Some(clipboard);
            result
        });
        match result {
            Ok(_) => {
                trace!("Copied rows to clipboard.");
                Message::Status(format!(
                    "Copied {} rows to the clipboard",
                    model.visible_row_count()
                ))
            }
            Err(e) => {
                error!("Error copying to clipboard: {:?}", e);
                Message::Status(format!("Copy failed: {e}"))
            }
        }
    }
}

/// Load `path` and wrap the result in a message. Failures never touch the model's table.
pub fn open(path: &Path) -> Message {
    info!("Opening {}", path.display());
    match load_file(path) {
        Ok(table) => Message::Loaded {
            name: file_name(path),
            table,
        },
        Err(e) => {
            error!("Failed to load {}: {:?}", path.display(), e);
            Message::LoadFailed(format!("{}: {}", path.display(), e))
        }
    }
}
