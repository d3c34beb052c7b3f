#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use ed25519_dalek::SigningKey;
use parking_lot::Mutex;
use quill_session::{
    AutosaveScheduler, BuildError, BuildRequest, BuildResponse, BuildTransport, DocumentStore,
    ExtensionSet, HeadlessHost, IdentityStore, QuillConfig, SessionController, Workbench,
};

pub const LIB_RS: &str = "use anchor_lang::prelude::*;\n\ndeclare_id!('A');\n\n#[program]\npub mod counter {\n    use super::*;\n}\n";

pub const STATE_RS: &str = "pub struct Counter {\n    pub count: u64,\n}\n";

pub const QUIET: Duration = Duration::from_millis(5_000);

pub fn keypair(seed: u8) -> Vec<u8> {
    SigningKey::from_bytes(&[seed; 32]).to_keypair_bytes().to_vec()
}

pub fn public_key(seed: u8) -> String {
    bs58::encode(SigningKey::from_bytes(&[seed; 32]).verifying_key().to_bytes()).into_string()
}

pub fn project_store() -> Arc<DocumentStore> {
    Arc::new(DocumentStore::with_files([
        ("/src/lib.rs", LIB_RS),
        ("/src/state.rs", STATE_RS),
    ]))
}

pub fn session(store: &Arc<DocumentStore>) -> SessionController<HeadlessHost> {
    let scheduler = AutosaveScheduler::new(Arc::clone(store), QUIET);
    SessionController::new(
        Arc::clone(store),
        HeadlessHost::new(),
        scheduler,
        ExtensionSet::new(),
    )
}

pub fn response(uuid: &str, kp: Option<Vec<u8>>) -> BuildResponse {
    BuildResponse {
        uuid: uuid.to_string(),
        stderr: String::new(),
        kp,
        idl: None,
    }
}

/// Compile service stand-in with a fixed round-trip latency.
#[derive(Debug, Default)]
pub struct FakeCompiler {
    responses: Mutex<VecDeque<Result<BuildResponse, BuildError>>>,
    requests: Mutex<Vec<BuildRequest>>,
    latency: Duration,
}

impl FakeCompiler {
    pub fn new(responses: impl IntoIterator<Item = Result<BuildResponse, BuildError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into_iter().collect()),
            ..Self::default()
        })
    }

    pub fn with_latency(
        latency: Duration,
        responses: impl IntoIterator<Item = Result<BuildResponse, BuildError>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into_iter().collect()),
            requests: Mutex::default(),
            latency,
        })
    }

    pub fn requests(&self) -> Vec<BuildRequest> {
        self.requests.lock().clone()
    }
}

impl BuildTransport for FakeCompiler {
    async fn send(&self, request: BuildRequest) -> Result<BuildResponse, BuildError> {
        self.requests.lock().push(request);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let next = self.responses.lock().pop_front();
        next.unwrap_or_else(|| Err(BuildError::Transport("compile service went away".into())))
    }
}

pub fn workbench(
    store: Arc<DocumentStore>,
    compiler: Arc<FakeCompiler>,
) -> Workbench<HeadlessHost, Arc<FakeCompiler>> {
    let mut config = QuillConfig::default();
    config.editor.autosave_ms = 5_000;
    Workbench::from_config(
        &config,
        store,
        HeadlessHost::new(),
        compiler,
        Arc::new(IdentityStore::new()),
        ExtensionSet::new(),
    )
}
