//! Frame buffer for accumulating partial reads.
//!
//! Uses `bytes::BytesMut` for zero-copy buffer management and implements a
//! two-state machine over the byte stream:
//! - awaiting a line: scan the buffer for the `\r\n` delimiter
//! - awaiting a payload tail: a prior status line declared N body bytes;
//!   the next N bytes are content and are only counted, never scanned, so a
//!   body may legally contain `\r\n`. The payload is complete only once its
//!   trailing delimiter is also buffered (N + 2 bytes).
//!
//! The transition into payload mode is external: the buffer cannot know
//! which status lines announce a body, so the dispatcher calls
//! [`FrameBuffer::expect_payload`] after interpreting such a line. That is
//! also why frames are pulled one at a time with [`FrameBuffer::next_frame`]
//! rather than drained in a batch - the mode switch must take effect between
//! two frames of the same read chunk.

use bytes::BytesMut;

use super::frame::Frame;
use super::wire::{DELIMITER, DELIMITER_LEN};

/// Buffer for accumulating incoming bytes and extracting complete frames.
#[derive(Debug)]
pub struct FrameBuffer {
    /// Accumulated bytes from socket reads.
    buffer: BytesMut,
    /// Outstanding payload bytes still owed before the next delimiter is a
    /// true frame boundary. Zero means a status line is expected.
    awaiting: usize,
}

impl FrameBuffer {
    /// Create an empty frame buffer.
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(8 * 1024),
            awaiting: 0,
        }
    }

    /// Append a chunk as delivered by the transport.
    ///
    /// Chunk boundaries carry no meaning; call [`FrameBuffer::next_frame`]
    /// in a loop afterwards to drain every frame the buffer now holds.
    pub fn extend(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Declare that the next `len` buffered bytes are one raw payload block.
    ///
    /// Called by the dispatcher after a status line announced a body of
    /// `len` bytes.
    pub fn expect_payload(&mut self, len: usize) {
        debug_assert_eq!(self.awaiting, 0, "payload already outstanding");
        self.awaiting = len;
    }

    /// Extract the next complete frame, if the buffer holds one.
    ///
    /// Returns `None` when more bytes are needed.
    pub fn next_frame(&mut self) -> Option<Frame> {
        if self.awaiting > 0 {
            // Body plus its trailing delimiter must both be present: the
            // body's own bytes may look like delimiters, so arrival of
            // exactly `awaiting` bytes proves nothing yet.
            if self.buffer.len() < self.awaiting + DELIMITER_LEN {
                return None;
            }
            let payload = self.buffer.split_to(self.awaiting).freeze();
            let _ = self.buffer.split_to(DELIMITER_LEN);
            self.awaiting = 0;
            return Some(Frame::Payload(payload));
        }

        let at = find_delimiter(&self.buffer)?;
        let line = self.buffer.split_to(at).freeze();
        let _ = self.buffer.split_to(DELIMITER_LEN);
        Some(Frame::Line(line))
    }

    /// Number of buffered, not-yet-consumed bytes.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Whether the buffer holds no unconsumed bytes.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Drop all buffered bytes and return to line mode.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.awaiting = 0;
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Position of the first `\r\n` in `buf`, if any.
fn find_delimiter(buf: &[u8]) -> Option<usize> {
    buf.windows(DELIMITER_LEN).position(|w| w == DELIMITER)
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;

    fn payload(frame: Frame) -> Bytes {
        match frame {
            Frame::Payload(b) => b,
            other => panic!("expected payload frame, got {other:?}"),
        }
    }

    fn line(frame: Frame) -> Bytes {
        match frame {
            Frame::Line(b) => b,
            other => panic!("expected line frame, got {other:?}"),
        }
    }

    #[test]
    fn test_single_line() {
        let mut buf = FrameBuffer::new();
        buf.extend(b"DELETED\r\n");
        assert_eq!(&line(buf.next_frame().unwrap())[..], b"DELETED");
        assert!(buf.next_frame().is_none());
        assert!(buf.is_empty());
    }

    #[test]
    fn test_partial_line_waits() {
        let mut buf = FrameBuffer::new();
        buf.extend(b"DELET");
        assert!(buf.next_frame().is_none());
        buf.extend(b"ED\r");
        assert!(buf.next_frame().is_none());
        buf.extend(b"\n");
        assert_eq!(&line(buf.next_frame().unwrap())[..], b"DELETED");
    }

    #[test]
    fn test_multiple_lines_in_one_chunk() {
        let mut buf = FrameBuffer::new();
        buf.extend(b"INSERTED 1\r\nINSERTED 2\r\nINSERTED 3\r\n");
        assert_eq!(&line(buf.next_frame().unwrap())[..], b"INSERTED 1");
        assert_eq!(&line(buf.next_frame().unwrap())[..], b"INSERTED 2");
        assert_eq!(&line(buf.next_frame().unwrap())[..], b"INSERTED 3");
        assert!(buf.next_frame().is_none());
    }

    #[test]
    fn test_payload_mode_counts_instead_of_scanning() {
        let body = b"this job should not fail!\r\n";
        let mut buf = FrameBuffer::new();
        buf.extend(format!("RESERVED 1 {}\r\n", body.len()).as_bytes());
        buf.extend(body);
        buf.extend(b"\r\n");

        assert_eq!(
            &line(buf.next_frame().unwrap())[..],
            format!("RESERVED 1 {}", body.len()).as_bytes()
        );
        buf.expect_payload(body.len());
        assert_eq!(&payload(buf.next_frame().unwrap())[..], &body[..]);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_exact_payload_without_delimiter_is_incomplete() {
        let mut buf = FrameBuffer::new();
        buf.expect_payload(5);
        // Exactly 5 bytes buffered; the trailing delimiter is missing, and
        // the embedded \r\n must not be mistaken for it.
        buf.extend(b"ab\r\nc");
        assert!(buf.next_frame().is_none());
        buf.extend(b"\r");
        assert!(buf.next_frame().is_none());
        buf.extend(b"\n");
        assert_eq!(&payload(buf.next_frame().unwrap())[..], b"ab\r\nc");
    }

    #[test]
    fn test_zero_length_payload() {
        let mut buf = FrameBuffer::new();
        buf.expect_payload(0);
        assert!(buf.next_frame().is_none());
        buf.extend(b"\r\n");
        let frame = buf.next_frame().unwrap();
        assert!(frame.is_payload());
        assert!(frame.is_empty());
    }

    #[test]
    fn test_payload_followed_by_line_in_same_chunk() {
        let mut buf = FrameBuffer::new();
        buf.extend(b"RESERVED 7 5\r\nhello\r\nDELETED\r\n");
        assert_eq!(&line(buf.next_frame().unwrap())[..], b"RESERVED 7 5");
        buf.expect_payload(5);
        assert_eq!(&payload(buf.next_frame().unwrap())[..], b"hello");
        assert_eq!(&line(buf.next_frame().unwrap())[..], b"DELETED");
        assert!(buf.next_frame().is_none());
    }

    #[test]
    fn test_byte_at_a_time_delivery() {
        let body = b"bin\r\n\x00ary";
        let mut stream = Vec::new();
        stream.extend_from_slice(format!("RESERVED 3 {}\r\n", body.len()).as_bytes());
        stream.extend_from_slice(body);
        stream.extend_from_slice(b"\r\n");

        let mut buf = FrameBuffer::new();
        let mut frames = Vec::new();
        for byte in &stream {
            buf.extend(&[*byte]);
            while let Some(frame) = buf.next_frame() {
                if frame.is_line() {
                    buf.expect_payload(body.len());
                }
                frames.push(frame);
            }
        }

        assert_eq!(frames.len(), 2);
        assert_eq!(&line(frames.remove(0))[..], b"RESERVED 3 9");
        assert_eq!(&payload(frames.remove(0))[..], &body[..]);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_fragmentation_invariance() {
        // The same wire bytes split at every offset must yield the same
        // frame sequence as a single delivery.
        let body = b"split\r\nme";
        let mut stream = Vec::new();
        stream.extend_from_slice(b"INSERTED 9\r\n");
        stream.extend_from_slice(format!("RESERVED 9 {}\r\n", body.len()).as_bytes());
        stream.extend_from_slice(body);
        stream.extend_from_slice(b"\r\nDELETED\r\n");

        let collect = |splits: &[usize]| {
            let mut buf = FrameBuffer::new();
            let mut frames = Vec::new();
            let mut start = 0;
            let mut bounds = splits.to_vec();
            bounds.push(stream.len());
            for end in bounds {
                buf.extend(&stream[start..end]);
                start = end;
                while let Some(frame) = buf.next_frame() {
                    if let Frame::Line(l) = &frame {
                        if l.starts_with(b"RESERVED") {
                            buf.expect_payload(body.len());
                        }
                    }
                    frames.push(frame);
                }
            }
            frames
        };

        let whole = collect(&[]);
        assert_eq!(whole.len(), 3);
        for split in 1..stream.len() {
            assert_eq!(collect(&[split]), whole, "diverged at split {split}");
        }
    }

    #[test]
    fn test_clear_resets_mode_and_bytes() {
        let mut buf = FrameBuffer::new();
        buf.extend(b"RESERVED 1 5\r\nhel");
        let _ = buf.next_frame();
        buf.expect_payload(5);
        buf.clear();
        assert!(buf.is_empty());
        // Back in line mode: plain lines parse again.
        buf.extend(b"DELETED\r\n");
        assert!(buf.next_frame().unwrap().is_line());
    }
}
