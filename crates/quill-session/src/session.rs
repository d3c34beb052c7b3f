//! Session lifecycle: mounting and unmounting the single editable view as
//! the current tab changes.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::autosave::{AutosaveBinding, AutosaveScheduler};
use crate::error::{AutosaveDropped, TransactionError};
use crate::store::DocumentStore;
use crate::view::{ChangeOrigin, EditableView, ExtensionSet, TextChange, ViewHost, ViewId};

/// Lifecycle state of the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// `initialize` has not run yet.
    Uninitialized,
    /// No tabs are open; the placeholder is shown.
    Empty,
    /// `path` should be shown but the host is unavailable. No view exists
    /// and no autosave is pending.
    Pending { path: String },
    /// The view is bound to `path`.
    Active { path: String },
}

/// External state changes the controller reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionSignal {
    /// Tabs were opened, closed or reselected.
    TabsChanged,
    /// Throw away the live buffer and reload the current document.
    ReloadDocument,
    /// The host element was recreated.
    HostChanged,
    /// Anything else that re-runs the binding path (build counters, theme
    /// switches). Never rebinds.
    Unrelated,
}

/// What a lifecycle step did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Nothing relevant changed; the current view, if any, is kept.
    Unchanged,
    /// A fresh view was created for `path` in `epoch`.
    Bound { path: String, epoch: u64 },
    /// The view was torn down and the placeholder shown.
    Emptied,
    /// The host is unavailable; any stale view was torn down and the next
    /// signal retries the bind.
    Deferred,
}

#[derive(Debug)]
struct ActiveBinding {
    view: EditableView,
    autosave: AutosaveBinding,
}

/// Owner of the single editable view.
#[derive(Debug)]
pub struct SessionController<H: ViewHost> {
    store: Arc<DocumentStore>,
    host: H,
    autosave: AutosaveScheduler,
    extensions: ExtensionSet,
    state: SessionState,
    epoch: u64,
    active: Option<ActiveBinding>,
    next_view: u64,
    seen_tabs_revision: Option<u64>,
}

impl<H: ViewHost> SessionController<H> {
    /// Creates an uninitialized controller. `extensions` are installed in
    /// every view alongside the autosave hook.
    pub fn new(
        store: Arc<DocumentStore>,
        host: H,
        autosave: AutosaveScheduler,
        extensions: ExtensionSet,
    ) -> Self {
        Self {
            store,
            host,
            autosave,
            extensions,
            state: SessionState::Uninitialized,
            epoch: 0,
            active: None,
            next_view: 1,
            seen_tabs_revision: None,
        }
    }

    /// First mount. Later calls do nothing.
    pub fn initialize(&mut self) -> SyncOutcome {
        if self.state != SessionState::Uninitialized {
            return SyncOutcome::Unchanged;
        }
        self.epoch = 1;
        self.state = SessionState::Empty;
        info!("Editor session initialized (epoch {})", self.epoch);
        self.reconcile(true)
    }

    /// Reacts to an external change. Runs `initialize` first if needed.
    pub fn sync(&mut self, signal: SessionSignal) -> SyncOutcome {
        if self.state == SessionState::Uninitialized {
            return self.initialize();
        }
        match signal {
            SessionSignal::TabsChanged => {
                let revision = self.store.tabs_revision();
                if !self.is_pending() && self.seen_tabs_revision == Some(revision) {
                    return SyncOutcome::Unchanged;
                }
                self.reconcile(false)
            }
            SessionSignal::ReloadDocument => self.reconcile(true),
            SessionSignal::HostChanged => {
                self.epoch += 1;
                info!("View host changed; remounting (epoch {})", self.epoch);
                self.teardown();
                self.reconcile(true)
            }
            SessionSignal::Unrelated if self.is_pending() => self.reconcile(false),
            SessionSignal::Unrelated => SyncOutcome::Unchanged,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Current mount epoch. Zero before `initialize`.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Path the live view is bound to.
    pub fn active_path(&self) -> Option<&str> {
        self.active.as_ref().map(|active| active.view.path())
    }

    /// The live view, if one is attached.
    pub fn view(&self) -> Option<&EditableView> {
        self.active.as_ref().map(|active| &active.view)
    }

    /// Mutable access to the live view, for transactions and selection.
    pub fn view_mut(&mut self) -> Option<&mut EditableView> {
        self.active.as_mut().map(|active| &mut active.view)
    }

    /// The live view, only if it is bound to `path`.
    pub fn live_view_for(&mut self, path: &str) -> Option<&mut EditableView> {
        self.view_mut().filter(|view| view.path() == path)
    }

    /// The host the view is mounted into.
    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Moves input focus to the view. Returns whether a focus request was
    /// issued.
    pub fn focus(&mut self) -> bool {
        let Some(active) = self.active.as_mut() else {
            return false;
        };
        if active.view.has_focus() {
            return false;
        }
        self.host.focus(active.view.id());
        active.view.set_focused(true);
        true
    }

    /// Records that the view lost input focus.
    pub fn blur(&mut self) {
        if let Some(active) = self.active.as_mut() {
            active.view.set_focused(false);
        }
    }

    /// Applies a user edit to the active view.
    pub fn edit(&mut self, change: TextChange) -> Result<(), TransactionError> {
        let view = self.view_mut().ok_or(TransactionError::NoActiveView)?;
        view.dispatch(change, ChangeOrigin::Input)?;
        Ok(())
    }

    /// Saves the active buffer now instead of waiting for the quiet
    /// interval. Returns the new document version.
    pub fn flush(&mut self) -> Result<Option<u64>, AutosaveDropped> {
        let Some(active) = self.active.as_mut() else {
            return Ok(None);
        };
        let version = active.autosave.flush(active.view.text())?;
        debug!("Flushed {} (version {version})", active.view.path());
        Ok(Some(version))
    }

    fn reconcile(&mut self, force: bool) -> SyncOutcome {
        let tabs = self.store.tabs();
        self.seen_tabs_revision = Some(self.store.tabs_revision());
        let target = tabs
            .current()
            .or_else(|| tabs.paths().next())
            .map(str::to_string);

        let Some(path) = target else {
            if !force && self.state == SessionState::Empty {
                return SyncOutcome::Unchanged;
            }
            return self.empty();
        };

        if !force && !self.is_pending() && self.active_path() == Some(path.as_str()) {
            return SyncOutcome::Unchanged;
        }
        if !self.host.is_available() {
            debug!("View host unavailable; deferring bind of {path}");
            self.teardown();
            self.state = SessionState::Pending { path };
            return SyncOutcome::Deferred;
        }
        self.bind(path)
    }

    fn is_pending(&self) -> bool {
        matches!(self.state, SessionState::Pending { .. })
    }

    fn bind(&mut self, path: String) -> SyncOutcome {
        let Some(content) = self.store.content(&path) else {
            warn!("Current tab {path} has no document; showing placeholder");
            return self.empty();
        };
        self.teardown();

        let autosave = self.autosave.schedule(&path, self.epoch);
        let extensions = self.extensions.clone().with(autosave.hook());
        let id = ViewId(self.next_view);
        self.next_view += 1;
        let view = EditableView::new(id, path.clone(), self.epoch, content, extensions);

        self.host.hide_placeholder();
        self.host.attach(id);
        self.active = Some(ActiveBinding { view, autosave });
        self.state = SessionState::Active { path: path.clone() };
        info!("Bound {path} to {id} (epoch {})", self.epoch);
        SyncOutcome::Bound {
            path,
            epoch: self.epoch,
        }
    }

    fn empty(&mut self) -> SyncOutcome {
        self.teardown();
        self.host.show_placeholder();
        self.state = SessionState::Empty;
        info!("No open tabs; editor emptied");
        SyncOutcome::Emptied
    }

    /// Cancels the pending autosave and detaches the view.
    fn teardown(&mut self) {
        if let Some(mut active) = self.active.take() {
            active.autosave.cancel();
            self.host.detach(active.view.id());
            debug!("Detached {} from {}", active.view.id(), active.view.path());
        }
    }
}
