//! The canonical, parsed representation of an HTTP response.
//!
//! A [`CanonicalResponse`] is built once from a complete raw message by the
//! [`ResponseDecoder`] and is immutable afterwards; everything it exposes beyond its
//! fields is a derived view over them.
//!
//! [`ResponseDecoder`]: crate::codec::ResponseDecoder

use std::fmt;

use bytes::Bytes;
use http::StatusCode;

use crate::codec::{ResponseDecoder, Sections};
use crate::protocol::{Cookies, HeaderField, Headers, ParseError};

const DEFAULT_HTTP_VERSION: &str = "HTTP/1.1";

/// Parsed response: status line, headers, decoded body, cookies and the raw message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalResponse {
    pub(crate) http_version: String,
    pub(crate) status_code: u16,
    pub(crate) reason_phrase: String,
    pub(crate) headers: Headers,
    pub(crate) body: Bytes,
    pub(crate) cookies: Cookies,
    pub(crate) raw: Bytes,
}

impl Default for CanonicalResponse {
    fn default() -> Self {
        Self {
            http_version: DEFAULT_HTTP_VERSION.to_owned(),
            status_code: 0,
            reason_phrase: String::new(),
            headers: Headers::new(),
            body: Bytes::new(),
            cookies: Cookies::new(),
            raw: Bytes::new(),
        }
    }
}

/// The status line split into its three parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusLine<'a> {
    pub http_version: &'a str,
    pub code: u16,
    pub reason_phrase: &'a str,
}

/// The raw message split back into its sections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawParts<'a> {
    /// Status line rebuilt from the parsed fields, CRLF terminated.
    pub status_line: String,
    /// Raw header block including its final CRLF, `None` when the message had no headers.
    pub header: Option<&'a str>,
    /// Decoded body.
    pub body: &'a Bytes,
    /// The complete original message.
    pub response: &'a Bytes,
}

impl CanonicalResponse {
    /// Parses a complete raw response message.
    pub fn parse(raw: impl Into<Bytes>) -> Result<Self, ParseError> {
        ResponseDecoder::new().decode(raw.into())
    }

    pub fn http_version(&self) -> &str {
        &self.http_version
    }

    /// The numeric status code, `0` when the status line could not be read.
    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    /// The status code as a typed [`StatusCode`], if it is a valid one.
    pub fn status(&self) -> Option<StatusCode> {
        StatusCode::from_u16(self.status_code).ok()
    }

    pub fn reason_phrase(&self) -> &str {
        &self.reason_phrase
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&HeaderField> {
        self.headers.get(name)
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn cookies(&self) -> &Cookies {
        &self.cookies
    }

    pub fn raw(&self) -> &Bytes {
        &self.raw
    }

    /// True for the 2xx codes 200 to 206.
    pub fn is_ok(&self) -> bool {
        matches!(self.status_code, 200..=206)
    }

    /// True for 301, 302, 303 and 307 responses carrying a `Location` header.
    pub fn is_redirect(&self) -> bool {
        matches!(self.status_code, 301 | 302 | 303 | 307) && self.headers.contains("Location")
    }

    pub fn status_line(&self) -> StatusLine<'_> {
        StatusLine { http_version: &self.http_version, code: self.status_code, reason_phrase: &self.reason_phrase }
    }

    /// Splits the raw message back into status line, header block, body and message.
    pub fn raw_parts(&self) -> RawParts<'_> {
        let status_line = format!("{} {} {}\r\n", self.http_version, self.status_code, self.reason_phrase);

        let header = Sections::locate(&self.raw)
            .ok()
            .filter(|sections| sections.header_end > sections.status_end)
            .and_then(|sections| std::str::from_utf8(&self.raw[sections.status_end..sections.header_end]).ok());

        RawParts { status_line, header, body: &self.body, response: &self.raw }
    }
}

impl TryFrom<Bytes> for CanonicalResponse {
    type Error = ParseError;

    fn try_from(raw: Bytes) -> Result<Self, Self::Error> {
        Self::parse(raw)
    }
}

impl TryFrom<&str> for CanonicalResponse {
    type Error = ParseError;

    fn try_from(raw: &str) -> Result<Self, Self::Error> {
        Self::parse(Bytes::copy_from_slice(raw.as_bytes()))
    }
}

/// Renders the decoded body.
impl fmt::Display for CanonicalResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.body))
    }
}
