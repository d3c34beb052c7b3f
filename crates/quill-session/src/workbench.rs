//! Wiring of the editing flow and the build flow.
//!
//! Keystrokes flow view → autosave → store. Builds flow orchestrator →
//! identity store → patcher → {store, live view}. The two meet only at the
//! store and the live buffer.

use std::future::Future;
use std::sync::Arc;

use tracing::warn;

use crate::autosave::AutosaveScheduler;
use crate::build::{BuildOrchestrator, BuildOutcome, BuildTransport};
use crate::config::QuillConfig;
use crate::error::BuildError;
use crate::identity::{IdentityPatcher, IdentityStore, PropagationReport};
use crate::session::SessionController;
use crate::store::DocumentStore;
use crate::view::{ExtensionSet, ViewHost};

/// A finished build together with what propagation did.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildReport {
    /// What the compile service returned.
    pub outcome: BuildOutcome,
    /// Key written into the identity literal.
    pub program_id: String,
    /// Where the program id was written.
    pub propagation: PropagationReport,
}

/// Session, store and build pipeline for one project.
pub struct Workbench<H: ViewHost, T> {
    store: Arc<DocumentStore>,
    session: SessionController<H>,
    orchestrator: Arc<BuildOrchestrator<T>>,
    patcher: IdentityPatcher,
    identity_path: String,
}

impl<H, T> Workbench<H, T>
where
    H: ViewHost,
    T: BuildTransport + 'static,
{
    /// Assembles a workbench from parts. `identity_path` is the store path
    /// whose declaration is rewritten after each build.
    pub fn new(
        store: Arc<DocumentStore>,
        session: SessionController<H>,
        orchestrator: BuildOrchestrator<T>,
        patcher: IdentityPatcher,
        identity_path: impl Into<String>,
    ) -> Self {
        Self {
            store,
            session,
            orchestrator: Arc::new(orchestrator),
            patcher,
            identity_path: identity_path.into(),
        }
    }

    /// Builds every component from `config`.
    pub fn from_config(
        config: &QuillConfig,
        store: Arc<DocumentStore>,
        host: H,
        transport: T,
        identities: Arc<IdentityStore>,
        extensions: ExtensionSet,
    ) -> Self {
        let autosave = AutosaveScheduler::new(Arc::clone(&store), config.editor.quiet_interval());
        let session = SessionController::new(Arc::clone(&store), host, autosave, extensions);
        Self::new(
            store,
            session,
            BuildOrchestrator::new(transport, identities),
            IdentityPatcher::from_config(&config.identity),
            config.identity.path.clone(),
        )
    }

    pub fn store(&self) -> &Arc<DocumentStore> {
        &self.store
    }

    /// The lifecycle controller owning the live view.
    pub fn session(&self) -> &SessionController<H> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut SessionController<H> {
        &mut self.session
    }

    pub fn identities(&self) -> &Arc<IdentityStore> {
        self.orchestrator.identities()
    }

    /// Store path of the file carrying the program id declaration.
    pub fn identity_path(&self) -> &str {
        &self.identity_path
    }

    /// Store contents, with the live buffer standing in for its own file so
    /// unsaved keystrokes are built.
    pub fn snapshot_files(&self) -> Vec<(String, String)> {
        let mut files = self.store.snapshot_files();
        if let Some(view) = self.session.view() {
            if let Some(entry) = files.iter_mut().find(|(path, _)| path == view.path()) {
                entry.1 = view.text().to_string();
            }
        }
        files
    }

    /// Starts a build of the current snapshot. The future owns everything it
    /// needs, so the session stays usable while the build is in flight.
    pub fn start_build(
        &self,
    ) -> impl Future<Output = Result<BuildOutcome, BuildError>> + Send + 'static {
        let files = self.snapshot_files();
        let orchestrator = Arc::clone(&self.orchestrator);
        async move { orchestrator.build(files).await }
    }

    /// Propagates a finished build. The live buffer is patched only if the
    /// identity file is the one open right now; the store copy always is.
    pub fn finish_build(
        &mut self,
        result: Result<BuildOutcome, BuildError>,
    ) -> Result<BuildReport, BuildError> {
        let outcome = result?;
        let program_id = self
            .orchestrator
            .identities()
            .effective_public_key()
            .unwrap_or_else(|err| {
                warn!("Falling back to built program id: {err}");
                outcome.identity.public_key_text.clone()
            });
        let propagation = self.patcher.propagate(
            &self.store,
            self.session.live_view_for(&self.identity_path),
            &self.identity_path,
            &program_id,
        );
        Ok(BuildReport {
            outcome,
            program_id,
            propagation,
        })
    }

    pub async fn build(&mut self) -> Result<BuildReport, BuildError> {
        let result = self.start_build().await;
        self.finish_build(result)
    }
}
