//! Errors for the preview side.

use std::path::PathBuf;

use miette::Diagnostic;
use smol_str::SmolStr;

/// Attachment storage failures.
///
/// These are absorbed by the live editor: a failed write just means the gate
/// stays closed until a later write succeeds.
#[derive(thiserror::Error, Debug, Diagnostic)]
pub enum StorageError {
    /// Writing to the preview attachment directory failed.
    #[error("failed to write attachment to {}", path.display())]
    #[diagnostic(code(loom::storage::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An attachment name that would resolve outside the storage root.
    #[error("invalid attachment name `{name}`")]
    #[diagnostic(
        code(loom::storage::invalid_name),
        help("attachment names must be plain file names without path separators")
    )]
    InvalidName { name: SmolStr },
}
