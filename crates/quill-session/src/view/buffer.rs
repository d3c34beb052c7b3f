//! Text buffer with a single selection and undo history.

use crate::error::TransactionError;

/// A replacement of `from..to` (byte offsets) with `insert`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChange {
    pub from: usize,
    pub to: usize,
    pub insert: String,
}

impl TextChange {
    /// Replaces `from..to` with `insert`.
    pub fn replace(from: usize, to: usize, insert: impl Into<String>) -> Self {
        Self {
            from,
            to,
            insert: insert.into(),
        }
    }

    pub fn insert(at: usize, text: impl Into<String>) -> Self {
        Self::replace(at, at, text)
    }

    pub fn delete(from: usize, to: usize) -> Self {
        Self::replace(from, to, String::new())
    }

    /// Maps a position in the old text to the new text.
    ///
    /// Positions before the range stay put, positions after it shift by the
    /// length delta, and positions strictly inside collapse to the end of the
    /// inserted text. A pure insertion pushes a position sitting on it forward.
    pub fn map_position(&self, pos: usize) -> usize {
        let inserted_end = self.from + self.insert.len();
        if self.from == self.to {
            return if pos < self.from {
                pos
            } else {
                pos + self.insert.len()
            };
        }
        if pos <= self.from {
            pos
        } else if pos >= self.to {
            pos - (self.to - self.from) + self.insert.len()
        } else {
            inserted_end
        }
    }
}

/// Cursor (`anchor == head`) or range selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection {
    pub anchor: usize,
    pub head: usize,
}

impl Selection {
    pub fn cursor(pos: usize) -> Self {
        Self {
            anchor: pos,
            head: pos,
        }
    }

    pub fn range(anchor: usize, head: usize) -> Self {
        Self { anchor, head }
    }

    fn map(self, change: &TextChange) -> Self {
        Self {
            anchor: change.map_position(self.anchor),
            head: change.map_position(self.head),
        }
    }

    fn clamp(self, len: usize) -> Self {
        Self {
            anchor: self.anchor.min(len),
            head: self.head.min(len),
        }
    }
}

#[derive(Debug, Clone)]
struct HistoryEntry {
    /// Change that reverts the recorded transaction.
    inverse: TextChange,
    selection_before: Selection,
}

/// The mutable document behind an editable view.
#[derive(Debug, Clone, Default)]
pub struct TextBuffer {
    text: String,
    selection: Selection,
    scroll_anchor: usize,
    undo: Vec<HistoryEntry>,
    redo: Vec<HistoryEntry>,
}

impl TextBuffer {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn set_selection(&mut self, selection: Selection) {
        self.selection = selection.clamp(self.text.len());
    }

    /// Offset of the first visible character.
    pub fn scroll_anchor(&self) -> usize {
        self.scroll_anchor
    }

    pub fn set_scroll_anchor(&mut self, offset: usize) {
        self.scroll_anchor = offset.min(self.text.len());
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo.len()
    }

    /// Applies `change` as one undoable transaction.
    pub fn apply(&mut self, change: &TextChange) -> Result<(), TransactionError> {
        let selection_before = self.selection;
        let inverse = self.splice(change)?;
        self.undo.push(HistoryEntry {
            inverse,
            selection_before,
        });
        self.redo.clear();
        Ok(())
    }

    /// Reverts the latest transaction, returning the change that was applied.
    pub fn undo(&mut self) -> Option<TextChange> {
        let entry = self.undo.pop()?;
        self.step_history(entry, true)
    }

    /// Re-applies the latest undone transaction.
    pub fn redo(&mut self) -> Option<TextChange> {
        let entry = self.redo.pop()?;
        self.step_history(entry, false)
    }

    fn step_history(&mut self, entry: HistoryEntry, undoing: bool) -> Option<TextChange> {
        let selection_now = self.selection;
        let applied = entry.inverse.clone();
        let inverse = self.splice(&applied).ok()?;
        self.selection = entry.selection_before.clamp(self.text.len());
        let reverse = HistoryEntry {
            inverse,
            selection_before: selection_now,
        };
        if undoing {
            self.redo.push(reverse);
        } else {
            self.undo.push(reverse);
        }
        Some(applied)
    }

    /// Replaces the range and maps selection and scroll through it. Returns
    /// the inverse change.
    fn splice(&mut self, change: &TextChange) -> Result<TextChange, TransactionError> {
        let len = self.text.len();
        if change.from > change.to || change.to > len {
            return Err(TransactionError::OutOfBounds {
                from: change.from,
                to: change.to,
                len,
            });
        }
        for offset in [change.from, change.to] {
            if !self.text.is_char_boundary(offset) {
                return Err(TransactionError::NotCharBoundary(offset));
            }
        }

        let removed = self.text[change.from..change.to].to_string();
        self.text
            .replace_range(change.from..change.to, &change.insert);
        self.selection = self.selection.map(change);
        self.scroll_anchor = change.map_position(self.scroll_anchor);
        Ok(TextChange {
            from: change.from,
            to: change.from + change.insert.len(),
            insert: removed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursors_outside_replaced_range_keep_their_text_position() {
        let mut buffer = TextBuffer::new("let a = 'OLD'; let b = 1;");
        let after = buffer.text().find("let b").expect("anchor");
        buffer.set_selection(Selection::cursor(after));
        buffer.set_scroll_anchor(2);

        buffer
            .apply(&TextChange::replace(9, 12, "NEWER"))
            .expect("apply");

        assert_eq!(buffer.text(), "let a = 'NEWER'; let b = 1;");
        let cursor = buffer.selection().head;
        assert_eq!(&buffer.text()[cursor..cursor + 5], "let b");
        assert_eq!(buffer.scroll_anchor(), 2);
    }

    #[test]
    fn cursor_inside_replaced_range_collapses_to_insert_end() {
        let mut buffer = TextBuffer::new("x = 'abcdef'");
        buffer.set_selection(Selection::range(6, 8));
        buffer
            .apply(&TextChange::replace(5, 11, "Z"))
            .expect("apply");
        assert_eq!(buffer.selection(), Selection::cursor(6));
    }

    #[test]
    fn insertion_at_cursor_moves_cursor_forward() {
        let mut buffer = TextBuffer::new("ab");
        buffer.set_selection(Selection::cursor(1));
        buffer.apply(&TextChange::insert(1, "xyz")).expect("apply");
        assert_eq!(buffer.text(), "axyzb");
        assert_eq!(buffer.selection(), Selection::cursor(4));
    }

    #[test]
    fn undo_and_redo_restore_text_and_selection() {
        let mut buffer = TextBuffer::new("hello");
        buffer.set_selection(Selection::cursor(5));
        buffer.apply(&TextChange::insert(5, " world")).expect("insert");
        buffer.apply(&TextChange::delete(0, 1)).expect("delete");
        assert_eq!(buffer.text(), "ello world");
        assert_eq!(buffer.undo_depth(), 2);

        buffer.undo().expect("undo delete");
        assert_eq!(buffer.text(), "hello world");
        buffer.undo().expect("undo insert");
        assert_eq!(buffer.text(), "hello");
        assert_eq!(buffer.selection(), Selection::cursor(5));
        assert!(buffer.undo().is_none());

        buffer.redo().expect("redo insert");
        assert_eq!(buffer.text(), "hello world");
        assert_eq!(buffer.redo_depth(), 1);

        buffer.apply(&TextChange::insert(0, ">")).expect("new edit");
        assert_eq!(buffer.redo_depth(), 0);
    }

    #[test]
    fn rejects_out_of_bounds_and_split_characters() {
        let mut buffer = TextBuffer::new("é");
        assert_eq!(
            buffer.apply(&TextChange::delete(0, 5)),
            Err(TransactionError::OutOfBounds {
                from: 0,
                to: 5,
                len: 2
            })
        );
        assert_eq!(
            buffer.apply(&TextChange::insert(1, "x")),
            Err(TransactionError::NotCharBoundary(1))
        );
        assert_eq!(buffer.text(), "é");
        assert_eq!(buffer.undo_depth(), 0);
    }
}
