//! Frame encoder: the worker-side half of the transmission protocol.

use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

use crate::dispatch::NotificationSink;
use crate::protocol::{NotifierKind, OrderedMap, EOT, ETX, RS, SOH, STX, US};

/// The body of one outgoing frame.
enum Body<'a> {
    Raw(&'a [u8]),
    Text(&'a str),
    Map(&'a OrderedMap),
}

struct Inner<W> {
    out: W,
    closed: bool,
}

/// A sink that transmits every notification as a frame on an output stream,
/// typically the worker process's own standard output.
///
/// Frames are written atomically: one exclusive section spans all the bytes
/// of a frame, so multiple logical writers can funnel into the same stream
/// without interleaving. Plain [`Write`] calls are wrapped as [`Sysout`]
/// frames, which lets the stream stand in for stdout wholesale.
///
/// [`Sysout`]: NotifierKind::Sysout
pub struct TransmissionStream<W> {
    inner: Mutex<Inner<W>>,
}

impl<W: Write> TransmissionStream<W> {
    pub fn new(out: W) -> Self {
        Self {
            inner: Mutex::new(Inner { out, closed: false }),
        }
    }

    /// Writes one complete frame.
    ///
    /// Write errors on this path are reported to the log and otherwise
    /// dropped; the notification channel is best-effort by design and the
    /// worker must not fail because its observer went away.
    ///
    /// # Panics
    ///
    /// Panics if the stream has been closed. Writing after close is a
    /// programming error, not a recoverable condition.
    fn frame(&self, kind: NotifierKind, body: &Body<'_>) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        assert!(!inner.closed, "frame written after close");
        if let Err(err) = write_frame(&mut inner.out, kind, body) {
            tracing::warn!(kind = ?kind, error = %err, "dropped notification frame");
        }
    }

    /// Terminates the transmission with a single EOT byte and flushes.
    ///
    /// Subsequent frame writes panic; repeated closes are no-ops.
    pub fn close(&self) -> io::Result<()> {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if inner.closed {
            return Ok(());
        }
        inner.closed = true;
        inner.out.write_all(&[EOT])?;
        inner.out.flush()
    }

    /// Consumes the stream and returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.inner
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .out
    }
}

fn write_frame<W: Write>(out: &mut W, kind: NotifierKind, body: &Body<'_>) -> io::Result<()> {
    out.write_all(&[SOH, kind.wire_byte(), STX])?;
    match body {
        Body::Raw(bytes) => out.write_all(bytes)?,
        Body::Text(text) => out.write_all(text.as_bytes())?,
        Body::Map(map) => {
            for (key, value) in map.iter() {
                out.write_all(key.as_bytes())?;
                out.write_all(&[US])?;
                out.write_all(value.as_bytes())?;
                out.write_all(&[RS])?;
            }
        }
    }
    out.write_all(&[ETX])
}

impl<W: Write + Send> NotificationSink for TransmissionStream<W> {
    fn sysout(&self, text: &str) {
        self.frame(NotifierKind::Sysout, &Body::Text(text));
    }

    fn progress(&self, map: &OrderedMap) {
        self.frame(NotifierKind::Progress, &Body::Map(map));
    }

    fn message(&self, map: &OrderedMap) {
        self.frame(NotifierKind::Message, &Body::Map(map));
    }

    fn output(&self, text: &str) {
        self.frame(NotifierKind::Output, &Body::Text(text));
    }

    fn scan_log(&self, map: &OrderedMap) {
        self.frame(NotifierKind::ScanLog, &Body::Map(map));
    }

    fn unknown_text(&self, text: &str) {
        self.frame(NotifierKind::Unknown, &Body::Text(text));
    }

    fn unknown_map(&self, map: &OrderedMap) {
        self.frame(NotifierKind::Unknown, &Body::Map(map));
    }
}

impl<W: Write> Write for TransmissionStream<W> {
    /// Arbitrary byte writes become `Sysout` frames carrying exactly those
    /// bytes, so redirected output still arrives framed.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.frame(NotifierKind::Sysout, &Body::Raw(buf));
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.out.flush()
    }
}
