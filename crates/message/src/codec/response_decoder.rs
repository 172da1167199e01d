//! Decoder turning a complete raw HTTP response into a [`CanonicalResponse`].
//!
//! # Message shape
//!
//! The status line ends at the first CRLF (it holds at least one character). The
//! header block runs up to the first empty line, which may directly follow the
//! status line when there are no headers. Everything after the empty line is the
//! body. A message without an empty line is rejected with
//! [`ParseError::InvalidMessage`], a head that is not UTF-8 with
//! [`ParseError::NotTextual`].
//!
//! # Status line
//!
//! The status line is matched against `<version> <3 digits>[ <reason>]`. When it does
//! not match, the response keeps its defaults (`HTTP/1.1`, code `0`, empty reason)
//! and parsing continues.
//!
//! # Body and cookies
//!
//! A `Transfer-Encoding: chunked` body is decoded and its trailers are merged into
//! the headers. Cookies are read from the final headers.

use bytes::Bytes;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, trace};

use crate::codec::CookieDecoder;
use crate::codec::body::PayloadDecoder;
use crate::codec::header::HeaderDecoder;
use crate::ensure;
use crate::protocol::{CanonicalResponse, ParseError};

const CRLF: &[u8] = b"\r\n";
const EMPTY_LINE: &[u8] = b"\r\n\r\n";

static STATUS_LINE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^(.+?) ([0-9]{3})(?:\s+(\w.+?))?\s*\r\n").ok());

/// Decoder for complete, fully buffered response messages.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseDecoder {
    header_decoder: HeaderDecoder,
    cookie_decoder: CookieDecoder,
}

/// Byte offsets of the message sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Sections {
    /// End of the status line, including its CRLF.
    pub(crate) status_end: usize,
    /// End of the header block, including the CRLF of its last line.
    pub(crate) header_end: usize,
    /// Start of the body.
    pub(crate) body_start: usize,
}

impl ResponseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a complete response message.
    pub fn decode(&self, raw: Bytes) -> Result<CanonicalResponse, ParseError> {
        let sections = Sections::locate(&raw)?;

        let head = std::str::from_utf8(&raw[..sections.header_end]).map_err(|_| ParseError::NotTextual)?;
        let (status_line, header_block) = head.split_at(sections.status_end);

        let mut response = CanonicalResponse::default();
        match STATUS_LINE.as_ref().and_then(|pattern| pattern.captures(status_line)) {
            Some(captures) => {
                response.http_version = captures[1].to_owned();
                response.status_code = captures[2].parse().unwrap_or_default();
                if let Some(reason) = captures.get(3) {
                    response.reason_phrase = reason.as_str().to_owned();
                }
            }
            None => debug!(status_line, "status line does not match, keeping the defaults"),
        }

        let mut headers = self.header_decoder.decode(header_block);

        let payload_decoder = PayloadDecoder::for_transfer_encoding(headers.get_str("Transfer-Encoding"));
        let decoded = payload_decoder.decode(raw.slice(sections.body_start..));
        if let Some(trailers) = decoded.trailers {
            trace!(trailer_count = trailers.len(), "merge trailers into the headers");
            headers.merge(trailers);
        }

        if !headers.is_empty() {
            response.cookies = self.cookie_decoder.decode(&headers);
        }

        trace!(
            status_code = response.status_code,
            header_count = headers.len(),
            body_len = decoded.body.len(),
            chunked = payload_decoder.is_chunked(),
            "decoded response"
        );

        response.headers = headers;
        response.body = decoded.body;
        response.raw = raw;
        Ok(response)
    }
}

impl Sections {
    pub(crate) fn locate(raw: &[u8]) -> Result<Self, ParseError> {
        ensure!(!raw.is_empty(), ParseError::invalid_message("empty message"));

        let line_end = find(raw, CRLF, 1).ok_or_else(|| ParseError::invalid_message("missing status line"))?;
        let empty_line = find(raw, EMPTY_LINE, line_end)
            .ok_or_else(|| ParseError::invalid_message("missing empty line after the header block"))?;

        let status_end = line_end + CRLF.len();
        let header_end = if empty_line == line_end { status_end } else { empty_line + CRLF.len() };

        Ok(Self { status_end, header_end, body_start: empty_line + EMPTY_LINE.len() })
    }
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    haystack.get(from..)?.windows(needle.len()).position(|window| window == needle).map(|pos| pos + from)
}
