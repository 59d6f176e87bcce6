//! Protocol module - wire encoding, status classification, and framing.
//!
//! The wire format is a hybrid of newline-delimited ASCII and raw binary:
//! every command and response starts with a `\r\n`-terminated line, and
//! some carry a raw body of a length declared in that line, followed by a
//! second `\r\n`.

mod frame;
mod frame_buffer;
pub mod status;
pub mod wire;

pub use frame::Frame;
pub use frame_buffer::FrameBuffer;
pub use status::{classify, UNIVERSAL_ERRORS};
pub use wire::{DEFAULT_DELAY, DEFAULT_PRIORITY, DEFAULT_TTR, DELIMITER, DELIMITER_LEN};
