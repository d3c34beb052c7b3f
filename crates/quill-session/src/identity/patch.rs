//! Rewriting the program id literal after a build.
//!
//! The literal is found by plain scanning: first marker occurrence, a fixed
//! offset past it, then the next quote. Anything that does not have that
//! shape is skipped and the text left untouched.

use tracing::{debug, info, warn};

use crate::config::{IdentityConfig, DEFAULT_LITERAL_OFFSET, DEFAULT_MARKER, DEFAULT_QUOTE};
use crate::error::{PatchSkipped, TransactionError};
use crate::store::DocumentStore;
use crate::view::{ChangeOrigin, EditableView, TextChange};

/// Bytes that must remain after the literal start for a declaration to fit.
const MIN_LITERAL_TAIL: usize = 3;

/// Byte range of the quoted value, quotes excluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiteralSpan {
    /// Byte offset of the first literal character.
    pub start: usize,
    /// Offset of the closing quote.
    pub end: usize,
}

impl LiteralSpan {
    /// The literal as it appears in `text`.
    pub fn value<'a>(&self, text: &'a str) -> &'a str {
        &text[self.start..self.end]
    }
}

/// Result of patching one text copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchedText {
    /// Resulting text; equal to the input when nothing changed.
    pub text: String,
    /// Span of the literal before the rewrite.
    pub span: LiteralSpan,
    /// False when the literal already held the key.
    pub changed: bool,
}

/// What happened to one copy during propagation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchOutcome {
    /// `from..to` of the old text was replaced by the new key.
    Applied { from: usize, to: usize },
    /// The literal already holds the key.
    Unchanged,
    Skipped(PatchSkipped),
    /// The live view is not bound to the identity file.
    NotOpen,
    /// The store has no such document.
    Missing,
    /// The buffer refused the transaction.
    Rejected(TransactionError),
}

impl PatchOutcome {
    /// Whether text was actually rewritten.
    pub fn is_applied(&self) -> bool {
        matches!(self, PatchOutcome::Applied { .. })
    }
}

/// Outcome for both copies of the identity file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropagationReport {
    /// What happened to the at-rest copy.
    pub store: PatchOutcome,
    /// What happened to the open buffer.
    pub live: PatchOutcome,
}

/// Finds and rewrites the quoted literal following a marker token such as
/// `declare_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityPatcher {
    marker: String,
    quote: char,
    literal_offset: usize,
}

impl Default for IdentityPatcher {
    fn default() -> Self {
        Self::new(DEFAULT_MARKER, DEFAULT_QUOTE, DEFAULT_LITERAL_OFFSET)
    }
}

impl IdentityPatcher {
    /// `literal_offset` is the distance from the end of the marker to the
    /// first byte of the quoted value (`!('` is 3).
    pub fn new(marker: impl Into<String>, quote: char, literal_offset: usize) -> Self {
        Self {
            marker: marker.into(),
            quote,
            literal_offset,
        }
    }

    /// Uses the `[identity]` marker, quote and literal offset.
    pub fn from_config(config: &IdentityConfig) -> Self {
        Self::new(config.marker.clone(), config.quote, config.literal_offset)
    }

    /// Span of the literal after the first marker occurrence.
    pub fn locate(&self, text: &str) -> Result<LiteralSpan, PatchSkipped> {
        let marker_at = text
            .find(&self.marker)
            .ok_or_else(|| PatchSkipped::MarkerNotFound {
                marker: self.marker.clone(),
            })?;
        let start = marker_at + self.marker.len() + self.literal_offset;
        if text.len() < start + MIN_LITERAL_TAIL {
            return Err(PatchSkipped::LiteralOutOfBounds {
                start,
                len: text.len(),
            });
        }
        if !text.is_char_boundary(start) {
            return Err(PatchSkipped::NotCharBoundary { offset: start });
        }
        let end = text[start..]
            .find(self.quote)
            .map(|offset| start + offset)
            .ok_or(PatchSkipped::UnterminatedLiteral { start })?;
        Ok(LiteralSpan { start, end })
    }

    /// Replaces the literal value in `text` with `key`.
    pub fn patch_text(&self, text: &str, key: &str) -> Result<PatchedText, PatchSkipped> {
        let span = self.locate(text)?;
        if span.value(text) == key {
            return Ok(PatchedText {
                text: text.to_string(),
                span,
                changed: false,
            });
        }
        let mut patched = String::with_capacity(text.len() - (span.end - span.start) + key.len());
        patched.push_str(&text[..span.start]);
        patched.push_str(key);
        patched.push_str(&text[span.end..]);
        Ok(PatchedText {
            text: patched,
            span,
            changed: true,
        })
    }

    /// Patches the store copy of `path` and, when `live` is bound to the same
    /// path, the live buffer. Each copy is checked on its own.
    pub fn propagate(
        &self,
        store: &DocumentStore,
        live: Option<&mut EditableView>,
        path: &str,
        key: &str,
    ) -> PropagationReport {
        let report = PropagationReport {
            store: self.patch_store(store, path, key),
            live: match live.filter(|view| view.path() == path) {
                Some(view) => self.patch_live(view, key),
                None => PatchOutcome::NotOpen,
            },
        };
        info!(
            "Program id {key} propagated to {path}: store {:?}, live {:?}",
            report.store, report.live
        );
        report
    }

    fn patch_store(&self, store: &DocumentStore, path: &str, key: &str) -> PatchOutcome {
        let Some(content) = store.content(path) else {
            warn!("Identity file {path} is not in the document store");
            return PatchOutcome::Missing;
        };
        match self.patch_text(&content, key) {
            Ok(patched) if !patched.changed => PatchOutcome::Unchanged,
            Ok(patched) => match store.write_patch(path, patched.text) {
                Ok(version) => {
                    debug!("Patched stored {path} (version {version})");
                    PatchOutcome::Applied {
                        from: patched.span.start,
                        to: patched.span.end,
                    }
                }
                Err(err) => {
                    warn!("Patched {path} could not be stored: {err}");
                    PatchOutcome::Missing
                }
            },
            Err(skipped) => {
                warn!("Skipped stored {path}: {skipped}");
                PatchOutcome::Skipped(skipped)
            }
        }
    }

    fn patch_live(&self, view: &mut EditableView, key: &str) -> PatchOutcome {
        let span = match self.locate(view.text()) {
            Ok(span) => span,
            Err(skipped) => {
                warn!("Skipped live {}: {skipped}", view.path());
                return PatchOutcome::Skipped(skipped);
            }
        };
        if span.value(view.text()) == key {
            return PatchOutcome::Unchanged;
        }
        let change = TextChange::replace(span.start, span.end, key);
        match view.dispatch(change, ChangeOrigin::Patch).map(|_| ()) {
            Ok(()) => PatchOutcome::Applied {
                from: span.start,
                to: span.end,
            },
            Err(err) => {
                warn!("Live patch of {} rejected: {err}", view.path());
                PatchOutcome::Rejected(err)
            }
        }
    }
}
