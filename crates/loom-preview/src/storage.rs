//! Writes note attachments where the preview can load them.
//!
//! The preview resolves `attachment:` links against [`AttachmentStorage::base_path`],
//! so a note's attachments have to be on disk before markup referencing them is
//! shown. Each call to [`AttachmentStorage::note_changed`] writes what is
//! missing or stale and reports the fingerprint that is now persisted.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use loom_editor_core::{AttachmentFingerprint, Note};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::error::StorageError;

/// What has been written so far, by attachment name.
///
/// Hosts can persist this between runs to avoid rewriting unchanged files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageState {
    pub stored: BTreeMap<SmolStr, SmolStr>,
}

impl StorageState {
    pub fn stored_hash(&self, name: &str) -> Option<&SmolStr> {
        self.stored.get(name)
    }
}

/// Attachment storage collaborator backed by a directory.
#[derive(Debug)]
pub struct AttachmentStorage {
    root: PathBuf,
    state: StorageState,
    /// Fingerprint of the last note seen. `None` until the first call.
    previous: Option<AttachmentFingerprint>,
}

impl AttachmentStorage {
    pub fn new(root: impl Into<PathBuf>, state: StorageState) -> Self {
        Self {
            root: root.into(),
            state,
            previous: None,
        }
    }

    /// Directory that relative resource references resolve against.
    pub fn base_path(&self) -> &Path {
        &self.root
    }

    pub fn state(&self) -> &StorageState {
        &self.state
    }

    /// Store the attachments of `note`, or of an empty note for `None`.
    ///
    /// Returns the persisted fingerprint when it differs from the previous
    /// note's. The first call always reports.
    pub fn note_changed(
        &mut self,
        note: Option<&Note>,
    ) -> Result<Option<AttachmentFingerprint>, StorageError> {
        let hashes = note
            .map(|n| n.attachment_hashes().clone())
            .unwrap_or_default();

        if let Some(note) = note {
            self.write_attachments(note)?;
        }

        if self.previous.as_ref() == Some(&hashes) {
            return Ok(None);
        }
        tracing::debug!(target: "loom::storage", count = hashes.len(), "attachments persisted");
        self.previous = Some(hashes.clone());
        Ok(Some(hashes))
    }

    fn write_attachments(&mut self, note: &Note) -> Result<(), StorageError> {
        let mut created = false;
        for (name, bytes) in note.attachments() {
            let Some(hash) = note.attachment_hashes().get(name) else {
                continue;
            };
            if self.state.stored_hash(name) == Some(hash) {
                continue;
            }
            validate_name(name)?;

            if !created {
                std::fs::create_dir_all(&self.root).map_err(|source| StorageError::Io {
                    path: self.root.clone(),
                    source,
                })?;
                created = true;
            }

            let path = self.root.join(name.as_str());
            std::fs::write(&path, bytes).map_err(|source| StorageError::Io {
                path: path.clone(),
                source,
            })?;
            tracing::trace!(target: "loom::storage", %name, path = %path.display(), "wrote attachment");
            self.state.stored.insert(name.clone(), hash.clone());
        }
        Ok(())
    }
}

fn validate_name(name: &SmolStr) -> Result<(), StorageError> {
    let mut components = Path::new(name.as_str()).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(part)), None) if part == name.as_str() => Ok(()),
        _ => Err(StorageError::InvalidName { name: name.clone() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note_with(attachments: &[(&str, &[u8])]) -> Note {
        let mut note = Note::new("n1", "title", "text");
        for (name, bytes) in attachments {
            note.set_attachment(*name, bytes.to_vec());
        }
        note
    }

    #[test]
    fn test_first_call_always_reports() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = AttachmentStorage::new(dir.path().join("att"), StorageState::default());

        let persisted = storage.note_changed(None).unwrap();
        assert_eq!(persisted, Some(AttachmentFingerprint::new()));
        // No attachments, no directory.
        assert!(!dir.path().join("att").exists());

        assert_eq!(storage.note_changed(None).unwrap(), None);
    }

    #[test]
    fn test_writes_and_reports_changes() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = AttachmentStorage::new(dir.path(), StorageState::default());

        let note = note_with(&[("a.png", b"one")]);
        let persisted = storage.note_changed(Some(&note)).unwrap();
        assert_eq!(persisted.as_ref(), Some(note.attachment_hashes()));
        assert_eq!(std::fs::read(dir.path().join("a.png")).unwrap(), b"one");

        // Same attachments, new content: nothing to report.
        let same = note.clone().with_content("edited");
        assert_eq!(storage.note_changed(Some(&same)).unwrap(), None);

        let changed = note_with(&[("a.png", b"two")]);
        assert!(storage.note_changed(Some(&changed)).unwrap().is_some());
        assert_eq!(std::fs::read(dir.path().join("a.png")).unwrap(), b"two");
    }

    #[test]
    fn test_skips_files_already_stored() {
        let dir = tempfile::tempdir().unwrap();
        let note = note_with(&[("a.png", b"one")]);
        let state = StorageState {
            stored: note
                .attachment_hashes()
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        };
        let mut storage = AttachmentStorage::new(dir.path(), state);

        storage.note_changed(Some(&note)).unwrap();
        assert!(!dir.path().join("a.png").exists());
    }

    #[test]
    fn test_rejects_path_names() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = AttachmentStorage::new(dir.path(), StorageState::default());

        let note = note_with(&[("../escape.png", b"x")]);
        let err = storage.note_changed(Some(&note)).unwrap_err();
        assert!(matches!(err, StorageError::InvalidName { .. }));
        assert!(storage.state().stored.is_empty());
    }

    #[test]
    fn test_state_serializes() {
        let mut state = StorageState::default();
        state.stored.insert("a.png".into(), "abc".into());
        let json = serde_json::to_string(&state).unwrap();
        assert_eq!(json, r#"{"stored":{"a.png":"abc"}}"#);
        assert_eq!(serde_json::from_str::<StorageState>(&json).unwrap(), state);
    }
}
