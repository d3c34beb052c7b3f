//! Opaque view plugins.

use std::fmt;
use std::sync::Arc;

use super::buffer::TextChange;

/// What triggered a buffer transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOrigin {
    /// Keystrokes and other user edits.
    Input,
    /// Identity literal rewrite after a build.
    Patch,
    Undo,
    Redo,
}

impl ChangeOrigin {
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeOrigin::Input => "input",
            ChangeOrigin::Patch => "patch",
            ChangeOrigin::Undo => "undo",
            ChangeOrigin::Redo => "redo",
        }
    }
}

/// A committed transaction as seen by extensions.
#[derive(Debug)]
pub struct ViewUpdate<'a> {
    pub path: &'a str,
    pub epoch: u64,
    pub change: &'a TextChange,
    pub origin: ChangeOrigin,
    /// Full buffer text after the change.
    pub text: &'a str,
}

/// A plugin installed into an editable view when it is created.
pub trait ViewExtension: Send + Sync {
    fn name(&self) -> &str;

    /// Called after every committed transaction.
    fn on_change(&self, _update: &ViewUpdate<'_>) {}
}

/// Extension that only carries a name (themes, highlighting, keymaps).
#[derive(Debug, Clone)]
pub struct NamedExtension {
    name: String,
}

impl NamedExtension {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl ViewExtension for NamedExtension {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Ordered set of extensions a view is created with.
#[derive(Clone, Default)]
pub struct ExtensionSet {
    extensions: Vec<Arc<dyn ViewExtension>>,
}

impl ExtensionSet {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, extension: Arc<dyn ViewExtension>) -> Self {
        self.extensions.push(extension);
        self
    }

    pub fn push(&mut self, extension: Arc<dyn ViewExtension>) {
        self.extensions.push(extension);
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.extensions.iter().map(|ext| ext.name()).collect()
    }

    pub(crate) fn notify(&self, update: &ViewUpdate<'_>) {
        for extension in &self.extensions {
            extension.on_change(update);
        }
    }
}

impl fmt::Debug for ExtensionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
