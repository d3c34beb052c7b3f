//! `quill-session` - editor session state for the Quill program playground.
//!
//! This crate keeps three copies of the source text consistent:
//!
//! - **Live view**: the single editable buffer, owned by [`SessionController`]
//! - **Document store**: the canonical at-rest text of every project file
//! - **Program id literal**: the `declare_id` value inside the designated
//!   file, rewritten by [`IdentityPatcher`] after every build
//!
//! # Architecture
//!
//! User edits reach the store through the [`AutosaveScheduler`], which
//! debounces buffer changes per (document, epoch) binding. Builds go through
//! the [`BuildOrchestrator`], which commits the returned identity to the
//! [`IdentityStore`]; propagation into the store and the live buffer is a
//! separate step. [`Workbench`] wires both flows together.

#![forbid(unsafe_code)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![allow(clippy::module_name_repetitions)]

pub mod autosave;
pub mod build;
pub mod config;
pub mod error;
pub mod identity;
pub mod session;
pub mod store;
pub mod view;
pub mod workbench;

pub use autosave::{AutosaveBinding, AutosaveHook, AutosaveScheduler};
pub use build::{
    BuildOrchestrator, BuildOutcome, BuildRequest, BuildResponse, BuildTransport,
    HttpBuildTransport,
};
pub use config::QuillConfig;
pub use error::{
    AutosaveDropped, BuildError, IdentityError, PatchSkipped, StoreError, TransactionError,
};
pub use identity::{
    IdentityPatcher, IdentityRecord, IdentityStore, LiteralSpan, PatchOutcome, PatchedText,
    PropagationReport,
};
pub use session::{SessionController, SessionSignal, SessionState, SyncOutcome};
pub use store::{Document, DocumentStore, OpenTabs};
pub use view::{
    ChangeOrigin, EditableView, ExtensionSet, HeadlessHost, Selection, TextChange, ViewExtension,
    ViewHost, ViewId,
};
pub use workbench::{BuildReport, Workbench};
