//! Holds preview markup back until its attachments are persisted.
//!
//! Two inputs update independently: the attachments the document references
//! and the attachments storage reports as written. The gate is open while the
//! two fingerprints are equal. Every input change re-evaluates the gate, and
//! every evaluation that finds it open with markup available releases the
//! latest markup. Markup arriving while closed replaces any held markup.

use loom_editor_core::AttachmentFingerprint;

use crate::render::Markup;

/// Combine-latest of referenced and persisted fingerprints, filtered on equality.
#[derive(Debug, Clone)]
pub struct AttachmentGate<M = Markup> {
    referenced: AttachmentFingerprint,
    persisted: AttachmentFingerprint,
    latest: Option<M>,
}

impl<M> Default for AttachmentGate<M> {
    fn default() -> Self {
        Self {
            referenced: AttachmentFingerprint::default(),
            persisted: AttachmentFingerprint::default(),
            latest: None,
        }
    }
}

impl<M: Clone> AttachmentGate<M> {
    /// Both inputs start empty, so a new gate is open.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether referenced and persisted attachments match.
    pub fn is_open(&self) -> bool {
        self.referenced == self.persisted
    }

    pub fn referenced(&self) -> &AttachmentFingerprint {
        &self.referenced
    }

    pub fn persisted(&self) -> &AttachmentFingerprint {
        &self.persisted
    }

    /// Most recent markup, released or not.
    pub fn latest(&self) -> Option<&M> {
        self.latest.as_ref()
    }

    /// The document now references `fingerprint`.
    pub fn set_referenced(&mut self, fingerprint: AttachmentFingerprint) -> Option<M> {
        self.referenced = fingerprint;
        self.evaluate("referenced")
    }

    /// Storage finished writing `fingerprint`.
    pub fn set_persisted(&mut self, fingerprint: AttachmentFingerprint) -> Option<M> {
        self.persisted = fingerprint;
        self.evaluate("persisted")
    }

    /// New markup for the current document.
    pub fn offer_markup(&mut self, markup: M) -> Option<M> {
        self.latest = Some(markup);
        self.evaluate("markup")
    }

    fn evaluate(&self, input: &'static str) -> Option<M> {
        let open = self.is_open();
        tracing::debug!(
            target: "loom::gate",
            input,
            open,
            referenced = self.referenced.len(),
            persisted = self.persisted.len(),
            "gate evaluated"
        );
        if open { self.latest.clone() } else { None }
    }
}
