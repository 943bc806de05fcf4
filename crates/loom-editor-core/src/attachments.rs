//! Attachment fingerprints and the note model that carries attachments.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Mapping from attachment name to content hash.
///
/// Two fingerprints are equal iff they have the same names and the same hash
/// for every name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttachmentFingerprint(BTreeMap<SmolStr, SmolStr>);

impl AttachmentFingerprint {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a fingerprint by hashing attachment contents.
    pub fn from_contents<'a>(contents: impl IntoIterator<Item = (&'a str, &'a [u8])>) -> Self {
        Self(
            contents
                .into_iter()
                .map(|(name, bytes)| (SmolStr::new(name), hash_content(bytes)))
                .collect(),
        )
    }

    /// Record `hash` for `name`, returning the previous hash.
    pub fn insert(&mut self, name: impl Into<SmolStr>, hash: impl Into<SmolStr>) -> Option<SmolStr> {
        self.0.insert(name.into(), hash.into())
    }

    pub fn remove(&mut self, name: &str) -> Option<SmolStr> {
        self.0.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&SmolStr> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Attachment names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &SmolStr> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SmolStr, &SmolStr)> {
        self.0.iter()
    }
}

impl<K: Into<SmolStr>, V: Into<SmolStr>> FromIterator<(K, V)> for AttachmentFingerprint {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Lowercase hex blake3 digest of attachment bytes.
pub fn hash_content(bytes: &[u8]) -> SmolStr {
    SmolStr::new(blake3::hash(bytes).to_hex().as_str())
}

/// A note as loaded from the note store.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Note {
    pub id: SmolStr,
    pub title: SmolStr,
    /// LF-normalized or raw text, exactly as stored.
    pub content: String,
    attachments: BTreeMap<SmolStr, Arc<[u8]>>,
    hashes: AttachmentFingerprint,
}

impl Note {
    pub fn new(id: impl Into<SmolStr>, title: impl Into<SmolStr>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            content: content.into(),
            ..Default::default()
        }
    }

    /// Add or replace an attachment.
    pub fn with_attachment(mut self, name: impl Into<SmolStr>, bytes: impl Into<Arc<[u8]>>) -> Self {
        self.set_attachment(name, bytes);
        self
    }

    pub fn set_attachment(&mut self, name: impl Into<SmolStr>, bytes: impl Into<Arc<[u8]>>) {
        let name = name.into();
        let bytes = bytes.into();
        self.hashes.insert(name.clone(), hash_content(&bytes));
        self.attachments.insert(name, bytes);
    }

    pub fn remove_attachment(&mut self, name: &str) {
        self.attachments.remove(name);
        self.hashes.remove(name);
    }

    /// Same note with different content.
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn attachments(&self) -> impl Iterator<Item = (&SmolStr, &Arc<[u8]>)> {
        self.attachments.iter()
    }

    /// Hashes of everything this note references.
    pub fn attachment_hashes(&self) -> &AttachmentFingerprint {
        &self.hashes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_equality() {
        let a: AttachmentFingerprint = [("a.png", "1"), ("b.png", "2")].into_iter().collect();
        let b: AttachmentFingerprint = [("b.png", "2"), ("a.png", "1")].into_iter().collect();
        assert_eq!(a, b);

        let mut changed = b.clone();
        changed.insert("a.png", "9");
        assert_ne!(a, changed);

        let mut extra = b.clone();
        extra.insert("c.png", "3");
        assert_ne!(a, extra);

        assert_eq!(AttachmentFingerprint::new(), AttachmentFingerprint::default());
    }

    #[test]
    fn test_hash_content_stable() {
        assert_eq!(hash_content(b"data"), hash_content(b"data"));
        assert_ne!(hash_content(b"data"), hash_content(b"date"));
        assert_eq!(hash_content(b"").len(), 64);
    }

    #[test]
    fn test_note_hashes_follow_attachments() {
        let mut note = Note::new("n1", "Title", "text").with_attachment("att", b"data".to_vec());
        assert_eq!(
            note.attachment_hashes(),
            &AttachmentFingerprint::from_contents([("att", b"data".as_slice())])
        );

        note.remove_attachment("att");
        assert!(note.attachment_hashes().is_empty());
        assert_eq!(note.attachments().count(), 0);
    }
}
