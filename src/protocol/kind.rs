//! Notification categories multiplexed over the transmission stream.

use crate::dispatch::NotificationSink;
use crate::protocol::Payload;

/// The kinds of output the worker can report.
///
/// Each kind has a stable one-byte wire identifier. The set is a closed,
/// versioned wire contract: new kinds get new identifiers, existing ones are
/// never renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotifierKind {
    /// Anything with an unrecognized identifier.
    Unknown,
    /// Raw standard-output text redirected through the channel.
    Sysout,
    /// Scan progress (ordered map payload).
    Progress,
    /// User-facing messages (ordered map payload).
    Message,
    /// Diagnostic output, including forwarded stderr text.
    Output,
    /// Per-file scan log entries (ordered map payload).
    ScanLog,
}

/// All kinds, in wire-identifier order. `Unknown` first so iteration covers
/// the catch-all.
pub const ALL_KINDS: [NotifierKind; 6] = [
    NotifierKind::Unknown,
    NotifierKind::Sysout,
    NotifierKind::Progress,
    NotifierKind::Message,
    NotifierKind::Output,
    NotifierKind::ScanLog,
];

impl NotifierKind {
    /// The signed protocol identifier.
    #[must_use]
    pub fn identifier(self) -> i32 {
        match self {
            Self::Unknown => -1,
            Self::Sysout => 0,
            Self::Progress => 1,
            Self::Message => 2,
            Self::Output => 3,
            Self::ScanLog => 4,
        }
    }

    /// The identifier as transmitted, masked to a single byte.
    #[must_use]
    pub fn wire_byte(self) -> u8 {
        (self.identifier() & 0xFF) as u8
    }

    /// Maps a received identifier byte back to a kind.
    ///
    /// Any byte that does not match a defined kind decodes to `Unknown`.
    #[must_use]
    pub fn from_wire(byte: u8) -> Self {
        for kind in ALL_KINDS {
            if kind.wire_byte() == byte {
                return kind;
            }
        }
        Self::Unknown
    }

    /// Index into per-kind tables (e.g. the broadcaster's channel array).
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Self::Unknown => 0,
            Self::Sysout => 1,
            Self::Progress => 2,
            Self::Message => 3,
            Self::Output => 4,
            Self::ScanLog => 5,
        }
    }

    /// Routes a decoded payload into the matching sink method.
    ///
    /// Map kinds receiving a bare-text payload see an empty map (a map frame
    /// with zero pairs decodes as text on the wire); text kinds receiving a
    /// map payload see the map's rendered form. `Unknown` preserves the
    /// payload variant.
    pub fn funnel<S: NotificationSink + ?Sized>(self, payload: &Payload, sink: &S) {
        match self {
            Self::Unknown => match payload {
                Payload::Text(text) => sink.unknown_text(text),
                Payload::Map(map) => sink.unknown_map(map),
            },
            Self::Sysout => sink.sysout(&payload.to_text()),
            Self::Progress => sink.progress(&payload.to_map()),
            Self::Message => sink.message(&payload.to_map()),
            Self::Output => sink.output(&payload.to_text()),
            Self::ScanLog => sink.scan_log(&payload.to_map()),
        }
    }
}
