use byteorder::{ByteOrder, LittleEndian};

/// Accumulates bytes from the socket and yields complete length-prefixed
/// frames: 4 bytes of little-endian payload length, then the payload.
///
/// The consumed prefix is compacted away once all complete frames have
/// been drained: a fully consumed buffer resets, otherwise the remainder
/// moves to the front.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buf: Vec<u8>,
    offset: usize,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Next complete frame payload, or `None` if more bytes are needed.
    pub fn next_frame(&mut self) -> Option<Vec<u8>> {
        if self.offset + 4 > self.buf.len() {
            self.compact();
            return None;
        }
        let len = LittleEndian::read_u32(&self.buf[self.offset..self.offset + 4]) as usize;
        if self.offset + 4 + len > self.buf.len() {
            // not enough payload yet, more data is expected on the next read
            self.compact();
            return None;
        }
        let payload = self.buf[self.offset + 4..self.offset + 4 + len].to_vec();
        self.offset += 4 + len;
        Some(payload)
    }

    fn compact(&mut self) {
        if self.offset == 0 {
            return;
        }
        if self.offset >= self.buf.len() {
            self.buf.clear();
        } else {
            self.buf.drain(..self.offset);
        }
        self.offset = 0;
    }

    /// Bytes currently buffered but not yet consumed.
    pub fn pending(&self) -> usize {
        self.buf.len() - self.offset
    }
}

/// Frame a payload for the write direction.
pub fn encode_frame(payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 4);
    let mut len = [0u8; 4];
    LittleEndian::write_u32(&mut len, payload.len() as u32);
    out.extend_from_slice(&len);
    out.extend_from_slice(payload);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_frame() {
        let mut dec = FrameDecoder::new();
        dec.push(&encode_frame(b"hello"));
        assert_eq!(dec.next_frame().unwrap(), b"hello");
        assert!(dec.next_frame().is_none());
        assert_eq!(dec.pending(), 0);
    }

    #[test]
    fn partial_length_then_payload() {
        let frame = encode_frame(b"abcdef");
        let mut dec = FrameDecoder::new();
        dec.push(&frame[..2]);
        assert!(dec.next_frame().is_none());
        dec.push(&frame[2..5]);
        assert!(dec.next_frame().is_none());
        dec.push(&frame[5..]);
        assert_eq!(dec.next_frame().unwrap(), b"abcdef");
    }

    #[test]
    fn multiple_frames_in_one_read() {
        let mut bytes = encode_frame(b"one");
        bytes.extend_from_slice(&encode_frame(b"two"));
        bytes.extend_from_slice(&encode_frame(b"three"));
        let mut dec = FrameDecoder::new();
        dec.push(&bytes);
        assert_eq!(dec.next_frame().unwrap(), b"one");
        assert_eq!(dec.next_frame().unwrap(), b"two");
        assert_eq!(dec.next_frame().unwrap(), b"three");
        assert!(dec.next_frame().is_none());
    }

    #[test]
    fn remainder_is_compacted_to_front() {
        let mut bytes = encode_frame(b"full");
        let tail = encode_frame(b"partial");
        bytes.extend_from_slice(&tail[..6]);
        let mut dec = FrameDecoder::new();
        dec.push(&bytes);
        assert_eq!(dec.next_frame().unwrap(), b"full");
        assert!(dec.next_frame().is_none());
        // the consumed first frame is gone, the partial tail remains
        assert_eq!(dec.pending(), 6);
        dec.push(&tail[6..]);
        assert_eq!(dec.next_frame().unwrap(), b"partial");
    }

    #[test]
    fn empty_frame_is_valid() {
        let mut dec = FrameDecoder::new();
        dec.push(&encode_frame(b""));
        assert_eq!(dec.next_frame().unwrap(), b"");
    }
}
