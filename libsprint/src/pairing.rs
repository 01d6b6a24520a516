//! Bracket and quote auto-pairing for the code editor
//!
//! A keystroke that opens a pair is replaced by the opening character, its
//! closing counterpart, and a caret placed between them. Any active selection
//! is replaced, not wrapped. Nothing around the caret is inspected: there is no
//! skip-over of an existing closing character and no duplicate suppression.
//!
//! Offsets are counted in `char`s, not bytes.
//!
//! ```
//! use libsprint::pairing::{insert_pair, CursorPosition};
//!
//! let edit = insert_pair('(', "print", CursorPosition::collapsed(5)).unwrap();
//! assert_eq!(edit.text, "print()");
//! assert_eq!(edit.cursor, CursorPosition::collapsed(6));
//!
//! assert!(insert_pair('x', "print", CursorPosition::collapsed(5)).is_none());
//! ```

/// Opening character to closing character
pub const PAIRS: [(char, char); 6] = [
    ('{', '}'),
    ('[', ']'),
    ('"', '"'),
    ('\'', '\''),
    ('(', ')'),
    ('`', '`'),
];

/// Selection bounds into the editor text, in chars
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CursorPosition {
    pub start: usize,
    pub end: usize,
}

impl CursorPosition {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Caret with no selection
    pub fn collapsed(at: usize) -> Self {
        Self { start: at, end: at }
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    /// Clamp both ends to `len` and order them so that `start <= end`
    pub fn clamped(self, len: usize) -> Self {
        let a = self.start.min(len);
        let b = self.end.min(len);
        Self {
            start: a.min(b),
            end: a.max(b),
        }
    }
}

/// Text and caret produced by a pairing keystroke
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairEdit {
    pub text: String,
    pub cursor: CursorPosition,
}

/// Closing counterpart of `key`, if it opens a pair
pub fn closing_for(key: char) -> Option<char> {
    PAIRS
        .iter()
        .find(|(open, _)| *open == key)
        .map(|(_, close)| *close)
}

/// Apply a keystroke to `text` with the given selection
///
/// Returns `None` when `key` does not open a pair; the caller should let the
/// text field handle the keystroke normally. Otherwise the default keystroke is
/// suppressed and the returned edit must be committed as a whole.
pub fn insert_pair(key: char, text: &str, cursor: CursorPosition) -> Option<PairEdit> {
    let close = closing_for(key)?;
    let len = text.chars().count();
    let cursor = cursor.clamped(len);

    let start_byte = byte_offset(text, cursor.start);
    let end_byte = byte_offset(text, cursor.end);

    let mut new_text = String::with_capacity(text.len() - (end_byte - start_byte) + key.len_utf8() + close.len_utf8());
    new_text.push_str(&text[..start_byte]);
    new_text.push(key);
    new_text.push(close);
    new_text.push_str(&text[end_byte..]);

    Some(PairEdit {
        text: new_text,
        cursor: CursorPosition::collapsed(cursor.start + 1),
    })
}

/// Byte index of the `chars`-th char, or the end of the string
fn byte_offset(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map_or(text.len(), |(index, _)| index)
}
