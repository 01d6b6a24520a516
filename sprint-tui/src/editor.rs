//! Code editor pane
//!
//! Wraps a `tui_textarea::TextArea`. Every edit is written through to the code
//! buffer before the next frame. Keys that open a bracket or quote pair are
//! intercepted: the buffer computes the paired text and caret, and the text
//! area is rebuilt from the committed result.
//!
//! The text area addresses the caret as (row, column) in chars; the buffer
//! uses flat char offsets. The helpers below convert between the two.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use libsprint::pairing::{closing_for, CursorPosition};
use libsprint::SubmissionController;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders};
use tui_textarea::{CursorMove, TextArea};

use crate::app::{AppState, EditorStats};

/// Flat char offset of (row, col) in `lines`
pub fn offset_of(lines: &[String], row: usize, col: usize) -> usize {
    let before: usize = lines.iter().take(row).map(|line| line.chars().count() + 1).sum();
    let line_len = lines.get(row).map_or(0, |line| line.chars().count());
    before + col.min(line_len)
}

/// (row, col) of a flat char offset in `text`
pub fn position_of(text: &str, offset: usize) -> (usize, usize) {
    let mut row = 0;
    let mut col = 0;
    for ch in text.chars().take(offset) {
        if ch == '\n' {
            row += 1;
            col = 0;
        } else {
            col += 1;
        }
    }
    (row, col)
}

fn split_lines(text: &str) -> Vec<String> {
    text.split('\n').map(str::to_string).collect()
}

pub struct EditorPane {
    textarea: TextArea<'static>,
    template: String,
}

impl EditorPane {
    pub fn new(code: &str, template: &str) -> Self {
        let mut pane = Self {
            textarea: TextArea::default(),
            template: template.to_string(),
        };
        pane.load(code, 0);
        pane
    }

    /// Replace the whole text and put the caret at `offset`
    pub fn load(&mut self, text: &str, offset: usize) {
        let mut textarea = TextArea::new(split_lines(text));
        textarea.set_tab_length(4);
        textarea.set_hard_tab_indent(false);
        textarea.set_cursor_line_style(Style::default());
        let (row, col) = position_of(text, offset);
        textarea.move_cursor(CursorMove::Jump(
            u16::try_from(row).unwrap_or(u16::MAX),
            u16::try_from(col).unwrap_or(u16::MAX),
        ));
        self.textarea = textarea;
    }

    pub fn text(&self) -> String {
        self.textarea.lines().join("\n")
    }

    /// Current selection (or caret) as char offsets
    pub fn cursor(&self) -> CursorPosition {
        let lines = self.textarea.lines();
        match self.textarea.selection_range() {
            Some(((start_row, start_col), (end_row, end_col))) => CursorPosition::new(
                offset_of(lines, start_row, start_col),
                offset_of(lines, end_row, end_col),
            ),
            None => {
                let (row, col) = self.textarea.cursor();
                CursorPosition::collapsed(offset_of(lines, row, col))
            }
        }
    }

    pub fn stats(&self) -> EditorStats {
        EditorStats::of(&self.text(), &self.template)
    }

    /// Feed one key press to the editor
    ///
    /// Returns `Ok(true)` when the text changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the code buffer could not persist the edit. The
    /// edit itself is kept.
    pub fn handle_key(&mut self, key: KeyEvent, controller: &SubmissionController) -> libsprint::Result<bool> {
        if let Some(open) = pairing_key(key) {
            let cursor = self.cursor();
            let result = controller.apply_keystroke(open, cursor);
            // The buffer holds the new text even when the write failed
            let code = controller.code();
            let caret = match &result {
                Ok(Some(new_cursor)) => new_cursor.start,
                _ => cursor.start + 1,
            };
            self.load(&code, caret);
            return result.map(|_| true);
        }

        if !self.textarea.input(key) {
            return Ok(false);
        }
        controller.set_code(self.text())?;
        Ok(true)
    }

    /// Border and title for the current state
    pub fn restyle(&mut self, state: &AppState) {
        let color = if state.is_submitting() {
            Color::Yellow
        } else if state.results.error.is_some() {
            Color::Red
        } else {
            Color::Cyan
        };
        let border = if state.config.colors_enabled {
            Style::default().fg(color)
        } else {
            Style::default()
        };

        let stats = self.stats();
        let mut title = format!(" calculate_path | {} lines, {} chars ", stats.lines, stats.chars);
        if stats.is_template {
            title.push_str("(template) ");
        }

        self.textarea
            .set_block(Block::default().title(title).borders(Borders::ALL).border_style(border));
        self.textarea
            .set_cursor_style(Style::default().add_modifier(Modifier::REVERSED));
    }

    pub fn widget(&self) -> &TextArea<'static> {
        &self.textarea
    }
}

/// Opening character typed without Ctrl/Alt
fn pairing_key(key: KeyEvent) -> Option<char> {
    if key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) {
        return None;
    }
    match key.code {
        KeyCode::Char(c) if closing_for(c).is_some() => Some(c),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_roundtrip_across_lines() {
        let text = "def f():\n    return []\n";
        let lines = split_lines(text);

        assert_eq!(offset_of(&lines, 0, 0), 0);
        assert_eq!(offset_of(&lines, 1, 4), 13);
        assert_eq!(position_of(text, 13), (1, 4));
        assert_eq!(offset_of(&lines, 2, 0), text.chars().count());
        assert_eq!(position_of(text, text.chars().count()), (2, 0));
    }

    #[test]
    fn test_offset_clamps_column() {
        let lines = split_lines("ab\ncd");
        assert_eq!(offset_of(&lines, 0, 10), 2);
    }

    #[test]
    fn test_pairing_key_ignores_control_chords() {
        assert_eq!(pairing_key(KeyEvent::new(KeyCode::Char('('), KeyModifiers::NONE)), Some('('));
        assert_eq!(pairing_key(KeyEvent::new(KeyCode::Char('"'), KeyModifiers::SHIFT)), Some('"'));
        assert_eq!(pairing_key(KeyEvent::new(KeyCode::Char('['), KeyModifiers::CONTROL)), None);
        assert_eq!(pairing_key(KeyEvent::new(KeyCode::Char('a'), KeyModifiers::NONE)), None);
    }
}
