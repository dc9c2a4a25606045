use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::trace;

/// Single line text input used by the command line prompts.
///
/// The cursor counts characters, not bytes.
#[derive(Default)]
pub struct Inputter {
    current_input: String,
    curser_pos: usize,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct InputResult {
    pub input: String,
    pub curser_pos: usize,
    pub changed: bool,
    pub finished: bool,
    pub canceled: bool,
}

impl Inputter {
    /// Start editing `s` with the cursor at its end.
    pub fn start(&mut self, s: &str) {
        self.current_input = s.to_string();
        self.curser_pos = s.chars().count();
    }

    pub fn read(&mut self, key: KeyEvent) -> InputResult {
        let before = self.current_input.clone();
        let mut result = InputResult::default();
        match (key.code, key.modifiers) {
            (KeyCode::Enter, _) => result.finished = true,
            (KeyCode::Esc, _) => {
                result.finished = true;
                result.canceled = true;
            }
            (KeyCode::Backspace, _) => self.backspace(),
            (KeyCode::Delete, _) => self.delete(),
            (KeyCode::Left, _) => self.curser_pos = self.curser_pos.saturating_sub(1),
            (KeyCode::Right, _) => {
                self.curser_pos = (self.curser_pos + 1).min(self.current_input.chars().count())
            }
            (KeyCode::Home, _) => self.curser_pos = 0,
            (KeyCode::End, _) => self.curser_pos = self.current_input.chars().count(),
            (KeyCode::Char('u'), KeyModifiers::CONTROL) => self.start(""),
            (KeyCode::Char(chr), m) if !m.contains(KeyModifiers::CONTROL) => self.insert(chr),
            _ => trace!("Ignoring key {:?} in input", key),
        }
        result.input = self.current_input.clone();
        result.curser_pos = self.curser_pos;
        result.changed = before != self.current_input;
        result
    }

    pub fn get(&self) -> InputResult {
        InputResult {
            input: self.current_input.clone(),
            curser_pos: self.curser_pos,
            ..InputResult::default()
        }
    }

    fn insert(&mut self, chr: char) {
        let idx = self.getbytepos(self.curser_pos);
        self.current_input.insert(idx, chr);
        self.curser_pos += 1;
    }

    fn backspace(&mut self) {
        if self.curser_pos > 0 {
            self.curser_pos -= 1;
            self.delete();
        }
    }

    fn delete(&mut self) {
        if self.curser_pos < self.current_input.chars().count() {
            let idx = self.getbytepos(self.curser_pos);
            self.current_input.remove(idx);
        }
    }

    fn getbytepos(&self, pos: usize) -> usize {
        self.current_input
            .char_indices()
            .nth(pos)
            .map(|(byte_idx, _)| byte_idx)
            .unwrap_or(self.current_input.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(input: &mut Inputter, text: &str) -> InputResult {
        let mut last = input.get();
        for c in text.chars() {
            last = input.read(key(KeyCode::Char(c)));
        }
        last
    }

    #[test]
    fn typing_appends() {
        let mut input = Inputter::default();
        let result = type_text(&mut input, ">=5");
        assert_eq!(result.input, ">=5");
        assert_eq!(result.curser_pos, 3);
        assert!(result.changed);
        assert!(!result.finished);
    }

    #[test]
    fn edits_at_cursor_with_multibyte_chars() {
        let mut input = Inputter::default();
        input.start("zürich");
        input.read(key(KeyCode::Home));
        input.read(key(KeyCode::Right));
        input.read(key(KeyCode::Right));
        let result = input.read(key(KeyCode::Backspace));
        assert_eq!(result.input, "zrich");
        let result = input.read(key(KeyCode::Char('ü')));
        assert_eq!(result.input, "zürich");
        let result = input.read(key(KeyCode::Delete));
        assert_eq!(result.input, "züich");
        assert_eq!(result.curser_pos, 2);
    }

    #[test]
    fn cursor_movement_does_not_change_input() {
        let mut input = Inputter::default();
        input.start("abc");
        let result = input.read(key(KeyCode::Left));
        assert!(!result.changed);
        assert_eq!(result.curser_pos, 2);
        let result = input.read(key(KeyCode::Right));
        let result2 = input.read(key(KeyCode::Right));
        assert_eq!(result.curser_pos, 3);
        assert_eq!(result2.curser_pos, 3);
    }

    #[test]
    fn enter_and_escape_finish() {
        let mut input = Inputter::default();
        input.start("bob");
        let result = input.read(key(KeyCode::Enter));
        assert!(result.finished && !result.canceled);
        assert_eq!(result.input, "bob");

        let result = input.read(key(KeyCode::Esc));
        assert!(result.finished && result.canceled);
    }

    #[test]
    fn ctrl_u_clears() {
        let mut input = Inputter::default();
        input.start("bob");
        let result = input.read(KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL));
        assert_eq!(result.input, "");
        assert!(result.changed);
    }
}
