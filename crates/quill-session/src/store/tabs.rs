//! Ordered open tabs with a single current selection.

use indexmap::IndexSet;

/// Open tabs in display order. At most one path is current, and the current
/// path is always one of the open tabs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpenTabs {
    paths: IndexSet<String>,
    current: Option<String>,
}

impl OpenTabs {
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.contains(path)
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> + '_ {
        self.paths.iter().map(String::as_str)
    }

    /// Appends `path` if absent and makes it current.
    pub(crate) fn open(&mut self, path: &str) -> bool {
        let inserted = self.paths.insert(path.to_string());
        let selected = self.current.as_deref() != Some(path);
        if selected {
            self.current = Some(path.to_string());
        }
        inserted || selected
    }

    /// Closes `path`. When it was current, the tab that slides into its slot
    /// (or the one before it) becomes current.
    pub(crate) fn close(&mut self, path: &str) -> bool {
        let Some((index, _)) = self.paths.shift_remove_full(path) else {
            return false;
        };
        if self.current.as_deref() == Some(path) {
            self.current = self
                .paths
                .get_index(index)
                .or_else(|| index.checked_sub(1).and_then(|prev| self.paths.get_index(prev)))
                .cloned();
        }
        true
    }

    /// Returns `None` when `path` is not open, otherwise whether the
    /// selection moved.
    pub(crate) fn set_current(&mut self, path: &str) -> Option<bool> {
        if !self.paths.contains(path) {
            return None;
        }
        if self.current.as_deref() == Some(path) {
            return Some(false);
        }
        self.current = Some(path.to_string());
        Some(true)
    }

    pub(crate) fn rename(&mut self, old_path: &str, new_path: &str) -> bool {
        let Some((index, _)) = self.paths.shift_remove_full(old_path) else {
            return false;
        };
        self.paths.shift_insert(index, new_path.to_string());
        if self.current.as_deref() == Some(old_path) {
            self.current = Some(new_path.to_string());
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tabs(paths: &[&str]) -> OpenTabs {
        let mut tabs = OpenTabs::default();
        for path in paths {
            tabs.open(path);
        }
        tabs
    }

    #[test]
    fn closing_current_selects_right_neighbour_then_left() {
        let mut tabs = tabs(&["/a", "/b", "/c"]);
        tabs.set_current("/b");
        assert!(tabs.close("/b"));
        assert_eq!(tabs.current(), Some("/c"));
        assert!(tabs.close("/c"));
        assert_eq!(tabs.current(), Some("/a"));
        assert!(tabs.close("/a"));
        assert_eq!(tabs.current(), None);
        assert!(tabs.is_empty());
        assert!(!tabs.close("/a"));
    }

    #[test]
    fn closing_other_tab_keeps_current() {
        let mut tabs = tabs(&["/a", "/b"]);
        assert_eq!(tabs.current(), Some("/b"));
        tabs.close("/a");
        assert_eq!(tabs.current(), Some("/b"));
    }

    #[test]
    fn set_current_requires_open_tab() {
        let mut tabs = tabs(&["/a"]);
        assert_eq!(tabs.set_current("/z"), None);
        assert_eq!(tabs.set_current("/a"), Some(false));
    }
}
