//! Decoder for the HTTP chunked transfer coding.
//!
//! Works on a complete, already buffered body as described by
//! [RFC 7230 Section 4.1](https://tools.ietf.org/html/rfc7230#section-4.1): each chunk
//! starts with its size in hexadecimal, optionally followed by extensions, then the
//! chunk data and a CRLF. A zero-sized chunk ends the data; whatever follows it is
//! the trailer section, parsed with the regular [`HeaderDecoder`].
//!
//! # Malformed size lines
//!
//! A line that does not match the chunk size grammar is not an error. The decoder
//! takes the bytes up to the next CRLF as one literal chunk of exactly that length
//! ([`ChunkSizeLine::Fallback`]) and carries on. This is a best-effort recovery for
//! broken servers, not RFC behavior. Without any further CRLF decoding stops.

use std::cmp;

use bytes::{Buf, Bytes, BytesMut};
use tracing::{debug, trace};

use crate::codec::header::HeaderDecoder;
use crate::protocol::Headers;

/// The result of decoding a body: the payload and the trailer headers, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedBody {
    pub body: Bytes,
    pub trailers: Option<Headers>,
}

impl DecodedBody {
    /// A body that needed no decoding.
    pub fn identity(body: Bytes) -> Self {
        Self { body, trailers: None }
    }
}

/// Decoder for chunked bodies.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChunkedDecoder {
    header_decoder: HeaderDecoder,
}

/// How a chunk size line was read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ChunkSizeLine {
    /// A well formed size line: the chunk size and the length of the line including
    /// its terminator.
    Size { size: u64, line_len: usize },
    /// The line did not match the grammar: `length` bytes up to the next CRLF form a
    /// literal chunk, and nothing of the line is consumed as a size line.
    Fallback { length: usize },
}

impl ChunkedDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes a complete chunked body.
    pub fn decode(&self, mut src: Bytes) -> DecodedBody {
        let mut decoded = BytesMut::with_capacity(src.len());

        loop {
            let size = match ChunkSizeLine::read(&src) {
                ChunkSizeLine::Size { size, line_len } => {
                    src.advance(line_len);
                    size
                }
                ChunkSizeLine::Fallback { length } => {
                    debug!(length, "invalid chunk size line, reading the line as a literal chunk");
                    length as u64
                }
            };

            let available = cmp::min(size, src.len() as u64) as usize;
            trace!(size, available, "read chunk");
            decoded.extend_from_slice(&src[..available]);

            if size == 0 {
                break;
            }

            // the chunk data is followed by a CRLF
            src.advance(cmp::min(available + 2, src.len()));
        }

        let trailers = if src.is_empty() {
            None
        } else {
            let trailers = self.header_decoder.decode(&String::from_utf8_lossy(&src));
            (!trailers.is_empty()).then_some(trailers)
        };

        trace!(len = decoded.len(), has_trailers = trailers.is_some(), "finished reading chunked data");
        DecodedBody { body: decoded.freeze(), trailers }
    }
}

impl ChunkSizeLine {
    /// Reads `1*HEXDIG *SP [";" extension] (CRLF | LF)` from the start of `src`.
    pub(crate) fn read(src: &[u8]) -> Self {
        let mut size: u64 = 0;
        let mut pos = 0;

        while let Some(digit) = src.get(pos).and_then(|b| hex_value(*b)) {
            size = match size.checked_mul(16).and_then(|size| size.checked_add(digit)) {
                Some(size) => size,
                None => return Self::fallback(src),
            };
            pos += 1;
        }

        if pos == 0 {
            return Self::fallback(src);
        }

        while src.get(pos) == Some(&b' ') {
            pos += 1;
        }

        // extensions are ignored, they end at the line feed
        if src.get(pos) == Some(&b';') {
            while src.get(pos).is_some_and(|b| *b != b'\n') {
                pos += 1;
            }
        }

        match (src.get(pos), src.get(pos + 1)) {
            (Some(&b'\r'), Some(&b'\n')) => Self::Size { size, line_len: pos + 2 },
            (Some(&b'\n'), _) => Self::Size { size, line_len: pos + 1 },
            _ => Self::fallback(src),
        }
    }

    fn fallback(src: &[u8]) -> Self {
        let length = src
            .windows(2)
            .position(|window| window == b"\r\n")
            .filter(|end| !src[..*end].contains(&b'\n'))
            .unwrap_or(0);
        Self::Fallback { length }
    }
}

fn hex_value(b: u8) -> Option<u64> {
    match b {
        b'0'..=b'9' => Some(u64::from(b - b'0')),
        b'a'..=b'f' => Some(u64::from(b + 10 - b'a')),
        b'A'..=b'F' => Some(u64::from(b + 10 - b'A')),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(src: &'static [u8]) -> DecodedBody {
        ChunkedDecoder::new().decode(Bytes::from_static(src))
    }

    #[test]
    fn test_basic() {
        let decoded = decode(b"4\r\nWiki\r\n5\r\npedia\r\n0\r\n\r\n");
        assert_eq!(decoded.body, Bytes::from_static(b"Wikipedia"));
        assert_eq!(decoded.trailers, None);
    }

    #[test]
    fn test_multiple_chunks() {
        let decoded = decode(b"10\r\n1234567890abcdef\r\n5\r\nhello\r\n7\r\n, world\r\n0\r\n\r\n");
        assert_eq!(decoded.body, Bytes::from_static(b"1234567890abcdefhello, world"));
    }

    #[test]
    fn test_uppercase_hex_and_padding() {
        let decoded = decode(b"1A  \r\nabcdefghijklmnopqrstuvwxyz\r\n0\r\n\r\n");
        assert_eq!(decoded.body.len(), 26);
    }

    #[test]
    fn test_chunks_with_extensions() {
        let decoded = decode(b"5;chunk-ext=value\r\nhello\r\n3;flag\r\n!!!\r\n0\r\n\r\n");
        assert_eq!(decoded.body, Bytes::from_static(b"hello!!!"));
    }

    #[test]
    fn test_bare_line_feed_terminators() {
        let decoded = decode(b"5\nhello\r\n0\n");
        assert_eq!(decoded.body, Bytes::from_static(b"hello"));
        assert_eq!(decoded.trailers, None);
    }

    #[test]
    fn test_chunks_with_trailers() {
        let decoded = decode(b"5\r\nhello\r\n0\r\nfoo-header: bar\r\ncake: PHP\r\n\r\n");
        assert_eq!(decoded.body, Bytes::from_static(b"hello"));

        let trailers = decoded.trailers.unwrap();
        assert_eq!(trailers.len(), 2);
        assert_eq!(trailers.get_str("foo-header"), Some("bar"));
        assert_eq!(trailers.get_str("cake"), Some("PHP"));
    }

    #[test]
    fn test_zero_size_chunk() {
        let decoded = decode(b"0\r\n\r\n");
        assert!(decoded.body.is_empty());
        assert_eq!(decoded.trailers, None);
    }

    #[test]
    fn test_invalid_size_line_falls_back_to_literal_chunk() {
        let decoded = decode(b"This is a chunk\r\n0\r\n\r\n");
        assert_eq!(decoded.body, Bytes::from_static(b"This is a chunk"));
    }

    #[test]
    fn test_fallback_between_valid_chunks() {
        let decoded = decode(b"3\r\nabc\r\nxyz!\r\n2\r\nde\r\n0\r\n\r\n");
        assert_eq!(decoded.body, Bytes::from_static(b"abcxyz!de"));
    }

    #[test]
    fn test_fallback_without_line_end_stops() {
        let decoded = decode(b"garbage without an end");
        assert!(decoded.body.is_empty());
        assert_eq!(decoded.trailers, None);
    }

    #[test]
    fn test_truncated_chunk_keeps_available_bytes() {
        let decoded = decode(b"a\r\nhello");
        assert_eq!(decoded.body, Bytes::from_static(b"hello"));
    }

    #[test]
    fn test_overflowing_size_falls_back() {
        assert_eq!(
            ChunkSizeLine::read(b"fffffffffffffffffffff\r\n"),
            ChunkSizeLine::Fallback { length: 21 }
        );
    }

    #[test]
    fn test_size_line_grammar() {
        assert_eq!(ChunkSizeLine::read(b"4\r\nWiki"), ChunkSizeLine::Size { size: 4, line_len: 3 });
        assert_eq!(ChunkSizeLine::read(b"ff \r\n"), ChunkSizeLine::Size { size: 255, line_len: 5 });
        assert_eq!(ChunkSizeLine::read(b"4;a=b\r\n"), ChunkSizeLine::Size { size: 4, line_len: 7 });
        assert_eq!(ChunkSizeLine::read(b"4\rx\r\n"), ChunkSizeLine::Fallback { length: 3 });
        assert_eq!(ChunkSizeLine::read(b"zz\r\n"), ChunkSizeLine::Fallback { length: 2 });
        assert_eq!(ChunkSizeLine::read(b"\r\n"), ChunkSizeLine::Fallback { length: 0 });
    }

    #[test]
    fn test_large_chunk() {
        let size = 1024 * 1024;
        let mut data = Vec::with_capacity(size + 16);
        data.extend(format!("{size:x}\r\n").into_bytes());
        data.extend(vec![b'A'; size]);
        data.extend(b"\r\n0\r\n\r\n");

        let decoded = ChunkedDecoder::new().decode(Bytes::from(data));
        assert_eq!(decoded.body.len(), size);
        assert!(decoded.body.iter().all(|&b| b == b'A'));
    }
}
