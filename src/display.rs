//! Console rendering of worker notifications.
//!
//! Maintains a status line: the last line on the console is overwritten in
//! place with ANSI control sequences as progress arrives, falling back to
//! prefixed plain lines where ANSI is unsafe.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};

use owo_colors::OwoColorize;

use crate::dispatch::NotificationSink;
use crate::protocol::OrderedMap;

/// Progress map keys the worker populates.
const OPERATION: &str = "operation";
const OPERATION_NUMBER: &str = "operation_number";
const OPERATION_NUMBER_MAX: &str = "operation_number_max";
const FILE: &str = "file";

/// Placeholder file value the worker sends before it has sized the work.
const ASSESSING_WORK: &str = "... assessing work ...";

/// Cursor-up plus clear-to-end, which rewrites the current status line.
const ANSI_REWIND: &str = "\u{1B}[F\u{1B}[J";

/// A direct in-process sink that renders notifications on the console.
pub struct ConsoleSink {
    use_ansi: bool,
    has_status: AtomicBool,
    seen_max_operation: AtomicBool,
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleSink {
    #[must_use]
    pub fn new() -> Self {
        Self {
            use_ansi: !cfg!(windows),
            has_status: AtomicBool::new(false),
            seen_max_operation: AtomicBool::new(false),
        }
    }

    /// Replaces the status line with `message`.
    fn status(&self, message: &str) {
        let mut out = io::stdout().lock();
        if self.use_ansi {
            // The first status message claims a fresh line; later ones
            // rewind and overwrite it.
            if self.has_status.swap(true, Ordering::Relaxed) {
                let _ = write!(out, "{ANSI_REWIND}");
            }
            let _ = writeln!(out, "{message}");
        } else {
            self.has_status.store(true, Ordering::Relaxed);
            let _ = writeln!(out, "{} {message}", "[STATUS]".dimmed());
        }
        let _ = out.flush();
    }

    /// Prints raw passthrough text, abandoning any active status line so the
    /// next status does not overwrite it.
    fn raw(&self, text: &str) {
        let mut out = io::stdout().lock();
        let _ = write!(out, "{text}");
        let _ = out.flush();
        self.has_status.store(false, Ordering::Relaxed);
    }
}

impl NotificationSink for ConsoleSink {
    fn sysout(&self, text: &str) {
        self.raw(text);
    }

    fn progress(&self, map: &OrderedMap) {
        let Some(operation) = map.get(OPERATION) else {
            // Sometimes the worker sends progress with no fields at all;
            // better a generic heartbeat than "? (?/?)".
            self.status("working...");
            return;
        };

        let number = map.get(OPERATION_NUMBER).unwrap_or("?");
        let max = map.get(OPERATION_NUMBER_MAX).unwrap_or("?");
        match map.get(FILE) {
            Some(file) if file != ASSESSING_WORK => {
                self.status(&format!("{operation} ({number}/{max}) {file}"));
            }
            _ => self.status(&format!("{operation} ({number}/{max})")),
        }

        // The last operation precedes a long server-side pause while the
        // results are assembled; say so once instead of looking hung.
        if map.get(OPERATION_NUMBER).is_some()
            && map.get(OPERATION_NUMBER) == map.get(OPERATION_NUMBER_MAX)
            && !self.seen_max_operation.swap(true, Ordering::Relaxed)
        {
            self.status(&format!(
                "{}",
                "waiting for the server to assemble the results...".dimmed()
            ));
        }
    }

    fn message(&self, map: &OrderedMap) {
        tracing::info!(message = %map, "worker message");
    }

    fn output(&self, text: &str) {
        // Forwarded worker stderr; keep it on stderr.
        eprint!("{text}");
        self.has_status.store(false, Ordering::Relaxed);
    }

    fn scan_log(&self, map: &OrderedMap) {
        tracing::debug!(entry = %map, "scan log");
    }

    fn unknown_text(&self, text: &str) {
        tracing::debug!(text = %text, "unrecognized notification");
    }

    fn unknown_map(&self, map: &OrderedMap) {
        tracing::debug!(map = %map, "unrecognized notification");
    }
}
