//! loom-preview: the preview side of the live markdown editor.
//!
//! Markup only reaches a [`PreviewSink`] once the attachments it references
//! have been written by [`AttachmentStorage`]; [`AttachmentGate`] enforces that
//! ordering. [`PreviewPane`] coalesces render and scroll updates per scheduler
//! tick, and [`LiveEditor`] wires the whole thing to an editing surface.

pub mod error;
pub mod gate;
pub mod live;
pub mod pane;
pub mod render;
pub mod sink;
pub mod storage;

pub use error::StorageError;
pub use gate::AttachmentGate;
pub use live::LiveEditor;
pub use pane::PreviewPane;
pub use render::{HtmlRenderer, Markup, MarkupRenderer, resolve_attachment_links};
pub use sink::{PreviewContext, PreviewEvent, PreviewSink, RecordingSink};
pub use storage::{AttachmentStorage, StorageState};
