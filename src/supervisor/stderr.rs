//! Drainable accumulator for the worker's stderr text.

use std::sync::{Mutex, PoisonError};

/// Shared buffer between the stderr reader task (sole writer) and the poll
/// loop (sole reader).
///
/// Draining takes the accumulated text and resets the buffer, so repeated
/// drains never re-report the same lines.
#[derive(Debug, Default)]
pub struct StderrBuffer {
    inner: Mutex<String>,
}

impl StderrBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one line, restoring the line terminator.
    pub fn append_line(&self, line: &str) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.push_str(line);
        inner.push('\n');
    }

    /// Takes everything accumulated since the last drain, or `None` when
    /// nothing arrived.
    #[must_use]
    pub fn drain(&self) -> Option<String> {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if inner.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut *inner))
        }
    }
}
