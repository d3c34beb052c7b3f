//! In-memory document store and open-tab model.
//!
//! The store owns the canonical at-rest text for every project file. The
//! editable view never writes here directly; only the autosave scheduler and
//! the identity patch engine do.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

use crate::config::normalize_store_path;
use crate::error::{AutosaveDropped, StoreError};

mod tabs;

pub use tabs::OpenTabs;

/// A project file held by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Absolute store path (e.g. `/src/lib.rs`).
    pub path: String,
    /// Canonical text content.
    pub content: String,
    /// Whether the latest user edits have been saved.
    pub is_saved: bool,
    /// Incremented on every content write.
    pub version: u64,
}

impl Document {
    pub fn new(path: impl AsRef<str>, content: impl Into<String>) -> Self {
        Self {
            path: normalize_store_path(path),
            content: content.into(),
            is_saved: true,
            version: 1,
        }
    }
}

/// Path-keyed document storage plus the ordered list of open tabs.
#[derive(Debug, Default)]
pub struct DocumentStore {
    documents: RwLock<FxHashMap<String, Document>>,
    tabs: RwLock<OpenTabs>,
    /// Bumped on every tab or current-path change.
    tabs_revision: AtomicU64,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from `(path, content)` pairs.
    pub fn with_files<I, P, C>(files: I) -> Self
    where
        I: IntoIterator<Item = (P, C)>,
        P: AsRef<str>,
        C: Into<String>,
    {
        let store = Self::new();
        {
            let mut documents = store.documents.write();
            for (path, content) in files {
                let document = Document::new(path, content);
                documents.insert(document.path.clone(), document);
            }
        }
        store
    }

    /// Adds a new document.
    pub fn insert(
        &self,
        path: impl AsRef<str>,
        content: impl Into<String>,
    ) -> Result<(), StoreError> {
        let document = Document::new(path, content);
        let mut documents = self.documents.write();
        if documents.contains_key(&document.path) {
            return Err(StoreError::AlreadyExists(document.path));
        }
        documents.insert(document.path.clone(), document);
        Ok(())
    }

    /// A copy of the document at `path`.
    pub fn get(&self, path: &str) -> Option<Document> {
        self.documents.read().get(path).cloned()
    }

    pub fn content(&self, path: &str) -> Option<String> {
        self.documents.read().get(path).map(|doc| doc.content.clone())
    }

    pub fn contains(&self, path: &str) -> bool {
        self.documents.read().contains_key(path)
    }

    /// All document paths, sorted.
    pub fn paths(&self) -> Vec<String> {
        let mut paths = self.documents.read().keys().cloned().collect::<Vec<_>>();
        paths.sort();
        paths
    }

    /// Ordered `(path, content)` pairs for every document.
    pub fn snapshot_files(&self) -> Vec<(String, String)> {
        let documents = self.documents.read();
        let mut files = documents
            .values()
            .map(|doc| (doc.path.clone(), doc.content.clone()))
            .collect::<Vec<_>>();
        files.sort_by(|a, b| a.0.cmp(&b.0));
        files
    }

    /// Removes a document and closes its tab.
    pub fn remove(&self, path: &str) -> Result<Document, StoreError> {
        let removed = self
            .documents
            .write()
            .remove(path)
            .ok_or_else(|| StoreError::NotFound(path.to_string()))?;
        if self.tabs.write().close(path) {
            self.bump_tabs();
        }
        Ok(removed)
    }

    /// Renames a document, keeping its tab position and current marker.
    pub fn rename(&self, old_path: &str, new_path: &str) -> Result<(), StoreError> {
        let new_path = normalize_store_path(new_path);
        {
            let mut documents = self.documents.write();
            if documents.contains_key(&new_path) {
                return Err(StoreError::AlreadyExists(new_path));
            }
            let mut document = documents
                .remove(old_path)
                .ok_or_else(|| StoreError::NotFound(old_path.to_string()))?;
            document.path = new_path.clone();
            documents.insert(new_path.clone(), document);
        }
        if self.tabs.write().rename(old_path, &new_path) {
            self.bump_tabs();
        }
        Ok(())
    }

    /// Opens a tab for `path` (appending it if needed) and makes it current.
    pub fn open_tab(&self, path: &str) -> Result<(), StoreError> {
        if !self.contains(path) {
            return Err(StoreError::NotFound(path.to_string()));
        }
        if self.tabs.write().open(path) {
            self.bump_tabs();
        }
        Ok(())
    }

    /// Closes the tab for `path`; returns whether a tab was closed.
    pub fn close_tab(&self, path: &str) -> bool {
        let closed = self.tabs.write().close(path);
        if closed {
            self.bump_tabs();
        }
        closed
    }

    /// Marks an already open tab as current.
    pub fn set_current(&self, path: &str) -> Result<(), StoreError> {
        let changed = self
            .tabs
            .write()
            .set_current(path)
            .ok_or_else(|| StoreError::NotFound(path.to_string()))?;
        if changed {
            self.bump_tabs();
        }
        Ok(())
    }

    /// Snapshot of the open tabs.
    pub fn tabs(&self) -> OpenTabs {
        self.tabs.read().clone()
    }

    /// Path of the selected tab.
    pub fn current_path(&self) -> Option<String> {
        self.tabs.read().current().map(str::to_string)
    }

    /// The document behind the selected tab.
    pub fn current_document(&self) -> Option<Document> {
        let path = self.current_path()?;
        self.get(&path)
    }

    /// Changes whenever tabs open, close or the selection moves.
    pub fn tabs_revision(&self) -> u64 {
        self.tabs_revision.load(Ordering::Relaxed)
    }

    /// Stores autosaved buffer text. A vanished document is not resurrected.
    pub fn write_autosave(&self, path: &str, content: String) -> Result<u64, AutosaveDropped> {
        let mut documents = self.documents.write();
        let Some(document) = documents.get_mut(path) else {
            return Err(AutosaveDropped::DocumentRemoved(path.to_string()));
        };
        document.content = content;
        document.is_saved = true;
        document.version = document.version.saturating_add(1);
        debug!("Autosaved {} (version {})", path, document.version);
        Ok(document.version)
    }

    /// Stores patched text without touching the saved flag.
    pub fn write_patch(&self, path: &str, content: String) -> Result<u64, StoreError> {
        let mut documents = self.documents.write();
        let document = documents
            .get_mut(path)
            .ok_or_else(|| StoreError::NotFound(path.to_string()))?;
        document.content = content;
        document.version = document.version.saturating_add(1);
        Ok(document.version)
    }

    /// Flags a document as carrying unsaved edits.
    pub fn mark_unsaved(&self, path: &str) {
        if let Some(document) = self.documents.write().get_mut(path) {
            document.is_saved = false;
        }
    }

    fn bump_tabs(&self) {
        self.tabs_revision.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> DocumentStore {
        DocumentStore::with_files([
            ("/src/lib.rs", "declare_id!('A');"),
            ("/src/state.rs", "pub struct State;"),
            ("/Cargo.toml", "[package]"),
        ])
    }

    #[test]
    fn insert_rejects_duplicates_and_normalizes_paths() {
        let store = DocumentStore::new();
        store.insert("src/main.rs", "fn main() {}").expect("insert");
        assert!(store.contains("/src/main.rs"));
        assert_eq!(
            store.insert("/src/main.rs", ""),
            Err(StoreError::AlreadyExists("/src/main.rs".to_string()))
        );
    }

    #[test]
    fn snapshot_is_ordered_by_path() {
        let files = store().snapshot_files();
        let paths = files.iter().map(|(path, _)| path.as_str()).collect::<Vec<_>>();
        assert_eq!(paths, vec!["/Cargo.toml", "/src/lib.rs", "/src/state.rs"]);
    }

    #[test]
    fn tab_changes_bump_revision_only_when_something_changed() {
        let store = store();
        let start = store.tabs_revision();
        store.open_tab("/src/lib.rs").expect("open");
        assert_eq!(store.tabs_revision(), start + 1);
        store.open_tab("/src/lib.rs").expect("reopen current");
        assert_eq!(store.tabs_revision(), start + 1);
        store.open_tab("/src/state.rs").expect("open second");
        assert_eq!(store.current_path().as_deref(), Some("/src/state.rs"));
        assert_eq!(store.tabs().len(), 2);
        assert!(store.open_tab("/missing.rs").is_err());
    }

    #[test]
    fn remove_closes_tab() {
        let store = store();
        store.open_tab("/src/lib.rs").expect("open");
        store.remove("/src/lib.rs").expect("remove");
        assert!(store.tabs().is_empty());
        assert_eq!(store.current_path(), None);
    }

    #[test]
    fn rename_keeps_tab_position() {
        let store = store();
        store.open_tab("/src/lib.rs").expect("open");
        store.open_tab("/src/state.rs").expect("open");
        store.set_current("/src/lib.rs").expect("select");
        store.rename("/src/lib.rs", "/src/program.rs").expect("rename");
        assert_eq!(
            store.tabs().paths().collect::<Vec<_>>(),
            vec!["/src/program.rs", "/src/state.rs"]
        );
        assert_eq!(store.current_path().as_deref(), Some("/src/program.rs"));
        assert_eq!(
            store.rename("/src/state.rs", "/Cargo.toml"),
            Err(StoreError::AlreadyExists("/Cargo.toml".to_string()))
        );
    }

    #[test]
    fn autosave_sets_saved_flag_and_patch_does_not() {
        let store = store();
        store.mark_unsaved("/src/lib.rs");
        store
            .write_patch("/src/lib.rs", "declare_id!('B');".to_string())
            .expect("patch");
        let patched = store.get("/src/lib.rs").expect("doc");
        assert!(!patched.is_saved);
        assert_eq!(patched.version, 2);

        store
            .write_autosave("/src/lib.rs", String::new())
            .expect("autosave empty buffer");
        let saved = store.get("/src/lib.rs").expect("doc");
        assert!(saved.is_saved);
        assert_eq!(saved.content, "");
        assert_eq!(saved.version, 3);
    }

    #[test]
    fn autosave_does_not_resurrect_removed_documents() {
        let store = store();
        store.remove("/src/state.rs").expect("remove");
        assert_eq!(
            store.write_autosave("/src/state.rs", "pub struct State;".to_string()),
            Err(AutosaveDropped::DocumentRemoved("/src/state.rs".to_string()))
        );
        assert!(!store.contains("/src/state.rs"));
    }
}
