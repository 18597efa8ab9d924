//! The capability surface decoded notifications are dispatched into.

use crate::protocol::OrderedMap;

/// Types of output we can expect from the supervised worker.
///
/// One method per [`NotifierKind`], plus the catch-all pair for frames with
/// an unrecognized identifier. Dispatch is a single synchronous call per
/// decoded frame, in frame order; the implementation decides whether to
/// buffer, forward, or act. Implementations must tolerate being invoked from
/// the stdout reader task rather than the thread that created them, hence
/// the `Send + Sync` bound.
///
/// [`NotifierKind`]: crate::protocol::NotifierKind
pub trait NotificationSink: Send + Sync {
    /// Redirected standard-output text.
    fn sysout(&self, text: &str);

    /// A scan progress update.
    fn progress(&self, map: &OrderedMap);

    /// A user-facing message.
    fn message(&self, map: &OrderedMap);

    /// Diagnostic output, including forwarded stderr from the worker.
    fn output(&self, text: &str);

    /// A per-file scan log entry.
    fn scan_log(&self, map: &OrderedMap);

    /// A frame with an unrecognized identifier carrying text.
    fn unknown_text(&self, text: &str);

    /// A frame with an unrecognized identifier carrying a map.
    fn unknown_map(&self, map: &OrderedMap);
}
