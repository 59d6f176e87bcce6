//! Frame type produced by the assembler.
//!
//! A frame is one discrete unit of response data with its delimiter already
//! stripped: either a status line or a raw job/stats body of a predeclared
//! byte length. Frames are transient; each is consumed by exactly one
//! handler step.

use bytes::Bytes;

/// A decoded, delimiter-stripped unit of response data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A status line, without its trailing `\r\n`.
    Line(Bytes),
    /// A raw payload block of the length a prior status line declared.
    Payload(Bytes),
}

impl Frame {
    /// Byte length of the frame's content.
    #[inline]
    pub fn len(&self) -> usize {
        match self {
            Frame::Line(b) | Frame::Payload(b) => b.len(),
        }
    }

    /// Whether the frame carries no bytes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether this is a status-line frame.
    #[inline]
    pub fn is_line(&self) -> bool {
        matches!(self, Frame::Line(_))
    }

    /// Whether this is a payload frame.
    #[inline]
    pub fn is_payload(&self) -> bool {
        matches!(self, Frame::Payload(_))
    }
}
