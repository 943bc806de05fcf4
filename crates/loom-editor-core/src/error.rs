//! Error types for the editor core.
//!
//! Parse anomalies and attachment mismatches are steady states, not errors,
//! so nothing here describes them.

use miette::Diagnostic;

/// The host scheduler refused to accept a task.
///
/// The whole coalescing contract depends on the scheduler, so a coalescer that
/// hits this stops for good.
#[derive(thiserror::Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    /// The event loop has shut down.
    #[error("scheduler is closed")]
    #[diagnostic(code(loom::scheduler::closed))]
    Closed,

    /// A queued task was discarded without running.
    #[error("scheduler dropped a queued task")]
    #[diagnostic(code(loom::scheduler::dropped))]
    Dropped,
}

/// A find query that could not be turned into a matcher.
#[derive(thiserror::Error, Debug, Diagnostic)]
pub enum FindError {
    #[error("invalid find pattern `{pattern}`")]
    #[diagnostic(
        code(loom::find::invalid_pattern),
        help("disable regex matching to search for the literal text")
    )]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Errors raised by the editing session.
#[derive(thiserror::Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Text differing from the loaded note was set while editing is disabled.
    #[error("cannot set text while editing is disabled")]
    #[diagnostic(code(loom::session::editing_disabled))]
    EditingDisabled,
}
