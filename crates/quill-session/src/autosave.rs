//! Debounced persistence of buffer text into the document store.
//!
//! Every binding of the editable view gets its own [`AutosaveBinding`]. The
//! binding's hook is installed as a view extension; each committed
//! transaction pushes the full buffer text into a watch channel, and a task
//! on the tokio runtime writes the latest value once the quiet interval
//! passes without further changes.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::AutosaveDropped;
use crate::store::DocumentStore;
use crate::view::{ChangeOrigin, ViewExtension, ViewUpdate};

type Pending = Option<Arc<str>>;

/// Creates one autosave binding per (document, epoch).
#[derive(Debug, Clone)]
pub struct AutosaveScheduler {
    store: Arc<DocumentStore>,
    quiet: Duration,
}

impl AutosaveScheduler {
    /// `quiet` is how long the buffer must stay unchanged before a write.
    pub fn new(store: Arc<DocumentStore>, quiet: Duration) -> Self {
        Self { store, quiet }
    }

    /// Starts a binding for `path`. Without a tokio runtime the binding still
    /// supports [`AutosaveBinding::flush`] but never fires on its own.
    pub fn schedule(&self, path: &str, epoch: u64) -> AutosaveBinding {
        let (sender, _) = watch::channel::<Pending>(None);
        let runtime = Handle::try_current().ok();
        if runtime.is_none() {
            warn!("No async runtime; autosave disabled for {path}");
        }
        let mut binding = AutosaveBinding {
            store: Arc::clone(&self.store),
            path: path.to_string(),
            epoch,
            quiet: self.quiet,
            hook: Arc::new(AutosaveHook {
                path: path.to_string(),
                store: Arc::clone(&self.store),
                sender,
            }),
            gate: Arc::new(Mutex::new(0)),
            task: None,
            runtime,
            cancelled: false,
        };
        binding.arm();
        debug!("Autosave bound to {path} (epoch {epoch})");
        binding
    }
}

/// View extension feeding buffer text to the autosave task.
#[derive(Debug)]
pub struct AutosaveHook {
    path: String,
    store: Arc<DocumentStore>,
    sender: watch::Sender<Pending>,
}

impl ViewExtension for AutosaveHook {
    fn name(&self) -> &str {
        "autosave"
    }

    fn on_change(&self, update: &ViewUpdate<'_>) {
        if update.path != self.path {
            return;
        }
        if update.origin != ChangeOrigin::Patch {
            self.store.mark_unsaved(&self.path);
        }
        self.sender.send_replace(Some(Arc::from(update.text)));
    }
}

/// Per-binding autosave token. Cancelling it (or dropping it) guarantees the
/// pending timer never writes.
#[derive(Debug)]
pub struct AutosaveBinding {
    store: Arc<DocumentStore>,
    path: String,
    epoch: u64,
    quiet: Duration,
    hook: Arc<AutosaveHook>,
    /// Generation of the live timer task; writes happen while holding it.
    gate: Arc<Mutex<u64>>,
    task: Option<JoinHandle<()>>,
    runtime: Option<Handle>,
    cancelled: bool,
}

impl AutosaveBinding {
    /// Document this binding writes to.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Mount epoch the binding was created in.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// The extension to install into the bound view.
    pub fn hook(&self) -> Arc<dyn ViewExtension> {
        self.hook.clone()
    }

    /// Whether `cancel` has run. A cancelled binding never writes again.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Writes `text` now and discards the pending timer. Later edits keep
    /// autosaving.
    pub fn flush(&mut self, text: &str) -> Result<u64, AutosaveDropped> {
        if self.cancelled {
            return Err(AutosaveDropped::Superseded);
        }
        self.arm();
        self.store.write_autosave(&self.path, text.to_string())
    }

    /// Drops the pending write, if any, and stops the debounce task.
    ///
    /// Safe to call more than once; dropping the binding calls it too.
    pub fn cancel(&mut self) {
        if self.cancelled {
            return;
        }
        self.cancelled = true;
        *self.gate.lock() += 1;
        if let Some(task) = self.task.take() {
            task.abort();
        }
        debug!("Autosave for {} (epoch {}) cancelled", self.path, self.epoch);
    }

    /// Replaces the timer task with a fresh one that has seen every change
    /// sent so far.
    fn arm(&mut self) {
        let generation = {
            let mut gate = self.gate.lock();
            *gate += 1;
            *gate
        };
        if let Some(task) = self.task.take() {
            task.abort();
        }
        let Some(runtime) = &self.runtime else {
            return;
        };
        let timer = DebounceTimer {
            store: Arc::clone(&self.store),
            path: self.path.clone(),
            quiet: self.quiet,
            gate: Arc::clone(&self.gate),
            generation,
        };
        self.task = Some(runtime.spawn(timer.run(self.hook.sender.subscribe())));
    }
}

impl Drop for AutosaveBinding {
    fn drop(&mut self) {
        self.cancel();
    }
}

struct DebounceTimer {
    store: Arc<DocumentStore>,
    path: String,
    quiet: Duration,
    gate: Arc<Mutex<u64>>,
    generation: u64,
}

impl DebounceTimer {
    async fn run(self, mut changes: watch::Receiver<Pending>) {
        // Sender gone means the binding was dropped.
        while changes.changed().await.is_ok() {
            loop {
                tokio::select! {
                    changed = changes.changed() => {
                        if changed.is_err() {
                            return;
                        }
                    }
                    () = tokio::time::sleep(self.quiet) => break,
                }
            }
            let pending = changes.borrow_and_update().clone();
            let Some(text) = pending else {
                continue;
            };
            if let Err(dropped) = self.write(&text) {
                debug!("Autosave for {} dropped: {dropped}", self.path);
                if matches!(dropped, AutosaveDropped::Superseded) {
                    return;
                }
            }
        }
    }

    fn write(&self, text: &str) -> Result<u64, AutosaveDropped> {
        let gate = self.gate.lock();
        if *gate != self.generation {
            return Err(AutosaveDropped::Superseded);
        }
        let version = self.store.write_autosave(&self.path, text.to_string())?;
        drop(gate);
        Ok(version)
    }
}
