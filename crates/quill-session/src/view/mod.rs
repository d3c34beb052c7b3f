//! The live editable view.
//!
//! A view is bound to exactly one document for its whole life. Switching
//! documents creates a new view; keystrokes and identity patches mutate the
//! existing one through range transactions.

use std::fmt;

use tracing::debug;

use crate::error::TransactionError;

mod buffer;
mod extension;
mod host;

pub use buffer::{Selection, TextBuffer, TextChange};
pub use extension::{ChangeOrigin, ExtensionSet, NamedExtension, ViewExtension, ViewUpdate};
pub use host::{HeadlessHost, ViewHost};

/// Identity of one view instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewId(pub u64);

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "view#{}", self.0)
    }
}

/// A transaction that was committed to the buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedChange {
    pub change: TextChange,
    pub origin: ChangeOrigin,
}

/// The single live text buffer shown to the user.
#[derive(Debug)]
pub struct EditableView {
    id: ViewId,
    path: String,
    epoch: u64,
    buffer: TextBuffer,
    extensions: ExtensionSet,
    focused: bool,
    last_change: Option<AppliedChange>,
}

impl EditableView {
    pub fn new(
        id: ViewId,
        path: impl Into<String>,
        epoch: u64,
        content: impl Into<String>,
        extensions: ExtensionSet,
    ) -> Self {
        Self {
            id,
            path: path.into(),
            epoch,
            buffer: TextBuffer::new(content),
            extensions,
            focused: false,
            last_change: None,
        }
    }

    pub fn id(&self) -> ViewId {
        self.id
    }

    /// Path of the bound document.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn text(&self) -> &str {
        self.buffer.text()
    }

    pub fn buffer(&self) -> &TextBuffer {
        &self.buffer
    }

    pub fn selection(&self) -> Selection {
        self.buffer.selection()
    }

    pub fn set_selection(&mut self, selection: Selection) {
        self.buffer.set_selection(selection);
    }

    pub fn extensions(&self) -> &ExtensionSet {
        &self.extensions
    }

    pub fn has_focus(&self) -> bool {
        self.focused
    }

    pub(crate) fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    /// The most recent committed transaction.
    pub fn last_change(&self) -> Option<&AppliedChange> {
        self.last_change.as_ref()
    }

    /// Applies one range change and notifies extensions.
    pub fn dispatch(
        &mut self,
        change: TextChange,
        origin: ChangeOrigin,
    ) -> Result<&AppliedChange, TransactionError> {
        self.buffer.apply(&change)?;
        Ok(self.commit(change, origin))
    }

    /// Reverts the last transaction. Extensions see it like any other change.
    pub fn undo(&mut self) -> Option<&AppliedChange> {
        let change = self.buffer.undo()?;
        Some(self.commit(change, ChangeOrigin::Undo))
    }

    pub fn redo(&mut self) -> Option<&AppliedChange> {
        let change = self.buffer.redo()?;
        Some(self.commit(change, ChangeOrigin::Redo))
    }

    fn commit(&mut self, change: TextChange, origin: ChangeOrigin) -> &AppliedChange {
        debug!(
            "{} {} {}..{} (+{} bytes)",
            self.id,
            origin.as_str(),
            change.from,
            change.to,
            change.insert.len()
        );
        self.extensions.notify(&ViewUpdate {
            path: &self.path,
            epoch: self.epoch,
            change: &change,
            origin,
            text: self.buffer.text(),
        });
        self.last_change.insert(AppliedChange { change, origin })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<(String, ChangeOrigin)>>,
    }

    impl ViewExtension for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        fn on_change(&self, update: &ViewUpdate<'_>) {
            self.seen
                .lock()
                .push((update.text.to_string(), update.origin));
        }
    }

    #[test]
    fn every_transaction_reaches_extensions() {
        let recorder = Arc::new(Recorder::default());
        let extensions = ExtensionSet::new()
            .with(Arc::new(NamedExtension::new("theme")))
            .with(recorder.clone());
        let mut view = EditableView::new(ViewId(1), "/src/lib.rs", 1, "ab", extensions);

        view.dispatch(TextChange::insert(2, "c"), ChangeOrigin::Input)
            .expect("insert");
        view.undo().expect("undo");
        view.redo().expect("redo");

        let seen = recorder.seen.lock().clone();
        assert_eq!(
            seen,
            vec![
                ("abc".to_string(), ChangeOrigin::Input),
                ("ab".to_string(), ChangeOrigin::Undo),
                ("abc".to_string(), ChangeOrigin::Redo),
            ]
        );
        assert_eq!(view.extensions().names(), vec!["theme", "recorder"]);
    }

    #[test]
    fn rejected_transaction_does_not_notify() {
        let recorder = Arc::new(Recorder::default());
        let mut view = EditableView::new(
            ViewId(2),
            "/src/lib.rs",
            1,
            "ab",
            ExtensionSet::new().with(recorder.clone()),
        );
        assert!(view
            .dispatch(TextChange::delete(1, 9), ChangeOrigin::Input)
            .is_err());
        assert!(recorder.seen.lock().is_empty());
        assert!(view.last_change().is_none());
    }
}
