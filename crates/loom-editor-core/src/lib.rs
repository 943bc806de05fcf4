//! loom-editor-core: markdown editing logic without UI framework dependencies.
//!
//! This crate provides:
//! - `ParseAndHighlightPipeline` - text to AST to style spans, published as `DocumentState`
//! - `UpdateCoalescer` - one flush per scheduler tick however many triggers arrive
//! - `ScrollSynchronizer` - viewport geometry to a coalesced scroll fraction
//! - Line-separator detection and LF round trip
//! - Find overlays, smart edits, the editing session and user options

pub mod ast;
pub mod attachments;
pub mod coalesce;
pub mod document;
pub mod error;
pub mod find;
pub mod highlight;
pub mod options;
pub mod pipeline;
pub mod scheduler;
pub mod scroll;
pub mod separator;
pub mod session;
pub mod smart_edit;
pub mod syntax;
pub mod text;
pub mod types;

pub use ast::{Ast, AstNode, CmarkParser, MAX_NESTING, MarkdownParser, NodeKind};
pub use attachments::{AttachmentFingerprint, Note, hash_content};
pub use coalesce::{UpdateCoalescer, WeakCoalescer};
pub use document::{DocumentPublisher, DocumentReader, DocumentState};
pub use error::{FindError, SchedulerError, SessionError};
pub use find::{FindQuery, FindState};
pub use highlight::{Highlighter, Markers};
pub use options::EditorOptions;
pub use pipeline::ParseAndHighlightPipeline;
pub use scheduler::{LocalScheduler, Scheduler, Task};
pub use scroll::{ScrollSynchronizer, scroll_fraction};
pub use separator::{detect_and_normalize, detect_separator, materialize, normalize};
pub use session::{EditingSession, NoteChange};
pub use smart_edit::{ATTACHMENT_PREFIX, SmartEdit};
pub use smol_str::SmolStr;
pub use syntax::{OVERLAY_PRECEDENCE, Span, SpanKind, StyleRun, StyleSpans};
pub use text::EditorRope;
pub use types::{LineSeparator, Selection};
