//! The transmission protocol used to relay worker notifications over a pipe.
//!
//! The wire format is:
//!
//! ```text
//! STREAM := ( SOH <NOTIFIER_ID> STX <CONTENT> ETX )* EOT
//! NOTIFIER_ID := BYTE
//! CONTENT := <STRING> | <MAP>
//! MAP := ( <STRING> US <STRING> RS )*
//! STRING := UTF-8
//! ```

mod decoder;
mod encoder;
mod kind;
mod payload;

pub use decoder::{pump, DecodeError, Decoded, Decoder};
pub use encoder::TransmissionStream;
pub use kind::{NotifierKind, ALL_KINDS};
pub use payload::{Notification, OrderedMap, Payload};

/// Start of heading: opens a frame, followed by the notifier identifier.
pub const SOH: u8 = 1;

/// Start of text: separates the identifier from the frame body.
pub const STX: u8 = 2;

/// End of text: closes a frame.
pub const ETX: u8 = 3;

/// End of transmission: closes the stream.
pub const EOT: u8 = 4;

/// Record separator: terminates one key/value pair in a map body.
pub const RS: u8 = 30;

/// Unit separator: separates a key from its value.
pub const US: u8 = 31;
