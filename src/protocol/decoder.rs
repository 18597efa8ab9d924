//! Streaming decoder: reconstructs frames from the worker's stdout bytes.

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::dispatch::NotificationSink;
use crate::protocol::{
    Notification, NotifierKind, OrderedMap, Payload, EOT, ETX, RS, SOH, STX, US,
};

/// Capacity of the fixed working buffer. Tokens longer than this spill into
/// the overflow accumulator, so the value bounds memory per in-flight token,
/// not token length.
const BUFFER_CAPACITY: usize = 512;

/// What a suspended JVM prints to stdout when the debug agent is waiting for
/// a remote debugger to attach.
const DEBUG_PREAMBLE_PREFIX: &[u8] = b"Listening for transport dt_socket at address: ";

/// Error raised while decoding the worker's stdout.
#[derive(thiserror::Error, Debug)]
pub enum DecodeError {
    /// The stream ended before the terminating EOT byte.
    #[error("transmission stream ended before EOT")]
    UnexpectedEof,
    /// Reading the underlying stream failed.
    #[error("failed to read transmission stream: {0}")]
    Io(#[from] std::io::Error),
}

/// An event produced by feeding one byte to the decoder.
#[derive(Debug, PartialEq, Eq)]
pub enum Decoded {
    /// A complete frame.
    Notification(Notification),
    /// The first line of the stream matched the debug-agent preamble and
    /// must be echoed to the side channel instead of being parsed.
    DebugPreamble(String),
    /// EOT: the transmission ended cleanly.
    End,
}

/// Byte-at-a-time frame parser.
///
/// A decoder instance lives exactly as long as one supervised invocation.
/// Content bytes accumulate in a fixed working buffer; `mark` tracks the
/// key/value boundary committed by the last separator, and bytes that would
/// overrun the buffer spill into the overflow accumulator so tokens of any
/// length survive intact.
pub struct Decoder {
    kind: NotifierKind,
    awaiting_kind: bool,
    buffer: Vec<u8>,
    mark: usize,
    overflow: Vec<u8>,
    map: OrderedMap,
    first_line: bool,
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            kind: NotifierKind::Unknown,
            awaiting_kind: false,
            buffer: Vec::with_capacity(BUFFER_CAPACITY),
            mark: 0,
            overflow: Vec::new(),
            map: OrderedMap::new(),
            first_line: true,
        }
    }

    /// Consumes one byte, possibly completing a frame.
    pub fn feed(&mut self, byte: u8) -> Option<Decoded> {
        // The byte after SOH is always the notifier identifier, even if its
        // value collides with a control byte.
        if self.awaiting_kind {
            self.awaiting_kind = false;
            self.kind = NotifierKind::from_wire(byte);
            return None;
        }

        match byte {
            SOH => {
                self.awaiting_kind = true;
                None
            }
            STX => {
                self.reset_frame();
                None
            }
            US => {
                self.mark = self.buffer.len();
                None
            }
            RS => {
                let mut value_bytes = std::mem::take(&mut self.overflow);
                value_bytes.extend_from_slice(&self.buffer[self.mark..]);
                let key = String::from_utf8_lossy(&self.buffer[..self.mark]).into_owned();
                let value = String::from_utf8_lossy(&value_bytes).into_owned();
                self.map.insert(key, value);
                self.buffer.clear();
                self.mark = 0;
                None
            }
            ETX => {
                let payload = if self.map.is_empty() {
                    let mut bytes = std::mem::take(&mut self.overflow);
                    bytes.extend_from_slice(&self.buffer);
                    Payload::Text(String::from_utf8_lossy(&bytes).into_owned())
                } else {
                    // Residual bytes after the last RS do not belong to any
                    // pair and are dropped with the frame.
                    Payload::Map(std::mem::take(&mut self.map))
                };
                let kind = self.kind;
                self.reset_frame();
                Some(Decoded::Notification(Notification::new(kind, payload)))
            }
            EOT => Some(Decoded::End),
            _ => self.content_byte(byte),
        }
    }

    fn content_byte(&mut self, byte: u8) -> Option<Decoded> {
        if self.buffer.len() >= BUFFER_CAPACITY {
            // Spill everything since the mark so the committed key prefix
            // stays addressable in the buffer.
            self.overflow.extend_from_slice(&self.buffer[self.mark..]);
            self.buffer.truncate(self.mark);
        }
        self.buffer.push(byte);

        // The very first line of the stream may be the debug-agent preamble
        // rather than protocol content; the check runs at most once.
        if self.first_line && byte == b'\n' {
            self.first_line = false;
            let mut line = std::mem::take(&mut self.overflow);
            line.extend_from_slice(&self.buffer[self.mark..]);
            self.buffer.truncate(self.mark);
            if line.starts_with(DEBUG_PREAMBLE_PREFIX) {
                return Some(Decoded::DebugPreamble(
                    String::from_utf8_lossy(&line).into_owned(),
                ));
            }
            // Not the preamble: the bytes are ordinary content, put them back.
            self.overflow = line;
        }
        None
    }

    fn reset_frame(&mut self) {
        self.map.clear();
        self.buffer.clear();
        self.mark = 0;
        self.overflow.clear();
    }
}

/// Drains a byte stream through a [`Decoder`], dispatching every completed
/// frame into the sink.
///
/// Returns when the stream terminates with EOT. A stream that ends without
/// EOT is a protocol error, never silent success. The debug-agent preamble,
/// when present, is echoed verbatim to standard error.
///
/// # Errors
///
/// [`DecodeError::UnexpectedEof`] if the stream ends before EOT;
/// [`DecodeError::Io`] if reading fails.
pub async fn pump<R, S>(mut reader: R, sink: &S) -> Result<(), DecodeError>
where
    R: AsyncRead + Unpin,
    S: NotificationSink + ?Sized,
{
    let mut decoder = Decoder::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            return Err(DecodeError::UnexpectedEof);
        }
        for &byte in &chunk[..n] {
            match decoder.feed(byte) {
                Some(Decoded::Notification(notification)) => {
                    notification.kind.funnel(&notification.payload, sink);
                }
                Some(Decoded::DebugPreamble(line)) => {
                    tracing::debug!("debug agent preamble detected");
                    eprint!("{line}");
                }
                Some(Decoded::End) => return Ok(()),
                None => {}
            }
        }
    }
}
