//! Session, build and identity errors.

#![allow(missing_docs)]

use thiserror::Error;

/// Failures surfaced by the build orchestrator. Each one is reported once and
/// never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// The compile service answered with a failure.
    #[error("build failed: {0}")]
    Remote(String),

    /// The response did not carry a usable program keypair.
    #[error("malformed program identity: {0}")]
    MalformedIdentity(String),

    /// The transport could not complete the round trip.
    #[error("build transport error: {0}")]
    Transport(String),
}

/// Reasons the identity patch left a text copy untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatchSkipped {
    /// The marker token does not occur in the text.
    #[error("identity marker '{marker}' not found")]
    MarkerNotFound { marker: String },

    /// The literal would start past the end of the text, or too close to it.
    #[error("identity literal start {start} is out of bounds (text length {len})")]
    LiteralOutOfBounds { start: usize, len: usize },

    /// No closing quote follows the literal start.
    #[error("identity literal starting at {start} has no closing quote")]
    UnterminatedLiteral { start: usize },

    /// The computed offset splits a multi-byte character.
    #[error("identity literal offset {offset} is not on a character boundary")]
    NotCharBoundary { offset: usize },
}

/// Reasons an autosave timer fired without writing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AutosaveDropped {
    /// The document vanished from the store between scheduling and firing.
    #[error("document '{0}' was removed before autosave fired")]
    DocumentRemoved(String),

    /// The binding was replaced while the timer was pending.
    #[error("autosave binding was superseded")]
    Superseded,
}

/// Identity store failures.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// No build has produced a program identity yet and no custom key is set.
    #[error("Program ID not found")]
    Missing,

    /// A persisted or received keypair could not be decoded.
    #[error("invalid program keypair: {0}")]
    Decode(String),

    /// The persisted identity file could not be read or written.
    #[error("identity store i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The persisted identity file is not valid JSON.
    #[error("identity store format error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Document store CRUD failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("document '{0}' not found")]
    NotFound(String),

    #[error("document '{0}' already exists")]
    AlreadyExists(String),
}

/// A text transaction that could not be applied to a buffer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransactionError {
    #[error("change range {from}..{to} is out of bounds (length {len})")]
    OutOfBounds { from: usize, to: usize, len: usize },

    #[error("change offset {0} is not on a character boundary")]
    NotCharBoundary(usize),

    #[error("no document is open")]
    NoActiveView,
}
