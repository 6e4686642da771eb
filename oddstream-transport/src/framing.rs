//! CRLF message framing codec.
//!
//! The feed delivers one JSON object per `\r\n`-delimited frame. TCP gives no
//! frame alignment: a read may carry a fraction of a frame, several frames,
//! or a delimiter split across two reads. The codec accumulates bytes in the
//! decode buffer and only yields complete frames; any trailing partial frame
//! (including a lone `\r`) stays buffered for the next call.

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

const DELIMITER: &[u8] = b"\r\n";

/// CRLF-delimited frame codec.
#[derive(Debug)]
pub struct CrlfCodec {
    max_frame_size: usize,
    // Where to resume the delimiter scan; everything before this offset has
    // already been searched on a previous call.
    next_index: usize,
}

impl CrlfCodec {
    /// Creates a new codec with the specified maximum frame size.
    #[must_use]
    pub fn new(max_frame_size: usize) -> Self {
        Self {
            max_frame_size,
            next_index: 0,
        }
    }

    /// Returns the maximum frame size.
    #[must_use]
    pub fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }
}

impl Default for CrlfCodec {
    fn default() -> Self {
        Self::new(1024 * 1024) // order images can run large
    }
}

impl Decoder for CrlfCodec {
    type Item = BytesMut;
    type Error = std::io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        // Resume one byte early so a `\r` left at the end of the previous
        // chunk pairs up with a `\n` arriving in this one.
        let start = self.next_index.saturating_sub(1);

        if let Some(offset) = src[start..].windows(2).position(|w| w == DELIMITER) {
            let frame_len = start + offset;

            if frame_len > self.max_frame_size {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!(
                        "frame too large: {} bytes exceeds maximum {} bytes",
                        frame_len, self.max_frame_size
                    ),
                ));
            }

            let frame = src.split_to(frame_len);
            src.advance(DELIMITER.len());
            self.next_index = 0;

            return Ok(Some(frame));
        }

        if src.len() > self.max_frame_size {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!(
                    "frame too large: more than {} bytes without a delimiter",
                    self.max_frame_size
                ),
            ));
        }

        self.next_index = src.len();
        Ok(None)
    }
}

impl<T: AsRef<[u8]>> Encoder<T> for CrlfCodec {
    type Error = std::io::Error;

    fn encode(&mut self, item: T, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let data = item.as_ref();

        if data.len() > self.max_frame_size {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!(
                    "frame too large: {} bytes exceeds maximum {} bytes",
                    data.len(),
                    self.max_frame_size
                ),
            ));
        }

        // A payload carrying the delimiter would desynchronise the peer.
        if data.windows(2).any(|w| w == DELIMITER) {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "payload contains the frame delimiter",
            ));
        }

        dst.reserve(data.len() + DELIMITER.len());
        dst.put_slice(data);
        dst.put_slice(DELIMITER);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn decode_all(codec: &mut CrlfCodec, buf: &mut BytesMut) -> Vec<Vec<u8>> {
        let mut frames = Vec::new();
        while let Some(frame) = codec.decode(buf).unwrap() {
            frames.push(frame.to_vec());
        }
        frames
    }

    #[test]
    fn test_encode_decode() {
        let mut codec = CrlfCodec::new(1024);
        let mut buf = BytesMut::new();

        codec.encode(b"{\"op\":\"mcm\"}".as_slice(), &mut buf).unwrap();
        assert_eq!(&buf[..], b"{\"op\":\"mcm\"}\r\n");

        let decoded = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(&decoded[..], b"{\"op\":\"mcm\"}");
        assert!(buf.is_empty());
    }

    #[test]
    fn test_multiple_frames_in_one_chunk() {
        let mut codec = CrlfCodec::default();
        let mut buf = BytesMut::from(&b"one\r\ntwo\r\nthree\r\n"[..]);

        let frames = decode_all(&mut codec, &mut buf);
        assert_eq!(frames, vec![b"one".to_vec(), b"two".to_vec(), b"three".to_vec()]);
    }

    #[test]
    fn test_partial_frame_is_retained() {
        let mut codec = CrlfCodec::default();
        let mut buf = BytesMut::from(&b"par"[..]);

        assert!(codec.decode(&mut buf).unwrap().is_none());

        buf.extend_from_slice(b"tial\r\n");
        let frame = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(&frame[..], b"partial");
    }

    #[test]
    fn test_delimiter_split_across_chunks() {
        let mut codec = CrlfCodec::default();
        let mut buf = BytesMut::from(&b"frame\r"[..]);

        assert!(codec.decode(&mut buf).unwrap().is_none());

        buf.extend_from_slice(b"\nnext\r\n");
        let frames = decode_all(&mut codec, &mut buf);
        assert_eq!(frames, vec![b"frame".to_vec(), b"next".to_vec()]);
    }

    #[test]
    fn test_chunk_without_delimiter_yields_nothing() {
        let mut codec = CrlfCodec::default();
        let mut buf = BytesMut::from(&b"no delimiter here"[..]);
        assert!(codec.decode(&mut buf).unwrap().is_none());
        assert_eq!(buf.len(), 17);
    }

    #[test]
    fn test_empty_frame() {
        let mut codec = CrlfCodec::default();
        let mut buf = BytesMut::from(&b"\r\nafter\r\n"[..]);

        let frames = decode_all(&mut codec, &mut buf);
        assert_eq!(frames, vec![b"".to_vec(), b"after".to_vec()]);
    }

    #[test]
    fn test_oversized_frame_is_an_error() {
        let mut codec = CrlfCodec::new(8);
        let mut buf = BytesMut::from(&b"0123456789abcdef"[..]);
        assert!(codec.decode(&mut buf).is_err());
    }

    #[test]
    fn test_encode_rejects_embedded_delimiter() {
        let mut codec = CrlfCodec::default();
        let mut buf = BytesMut::new();
        assert!(codec.encode(b"a\r\nb".as_slice(), &mut buf).is_err());
    }

    proptest! {
        // Joining any frames with the delimiter and re-chunking at any fixed
        // size must reproduce the frames exactly, in order.
        #[test]
        fn prop_round_trip_any_chunking(
            frames in prop::collection::vec("[a-z0-9{}:,\"]{0,40}", 1..20),
            chunk_size in 1usize..64,
        ) {
            let mut wire = Vec::new();
            for frame in &frames {
                wire.extend_from_slice(frame.as_bytes());
                wire.extend_from_slice(b"\r\n");
            }

            let mut codec = CrlfCodec::default();
            let mut buf = BytesMut::new();
            let mut out = Vec::new();

            for chunk in wire.chunks(chunk_size) {
                buf.extend_from_slice(chunk);
                while let Some(frame) = codec.decode(&mut buf).unwrap() {
                    out.push(String::from_utf8(frame.to_vec()).unwrap());
                }
            }

            prop_assert_eq!(out, frames);
        }
    }
}
