//! Header block decoder.
//!
//! Turns the text between the status line and the blank line of a message (or the
//! trailer section of a chunked body) into [`Headers`].
//!
//! # Rules
//!
//! - Lines are separated by CRLF; empty lines are skipped.
//! - A line starting with a space or a tab continues the previous field (obsolete
//!   line folding): its whitespace runs collapse to a single space and the text is
//!   appended to the previous value.
//! - Any other line is split on its first `:`. A field name may carry single
//!   separator or control characters escaped as a quoted string (`X"-"Foo`); those
//!   are unescaped. The value is trimmed.
//! - Repeating a field name keeps every value: the field turns into a list.

use std::borrow::Cow;

use tracing::trace;

use crate::protocol::{Headers, trim_value};

/// Decoder for CRLF separated header blocks.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderDecoder;

impl HeaderDecoder {
    /// Parses a header block. Never fails: lines that are neither a field nor a
    /// continuation of one are skipped.
    pub fn decode(&self, block: &str) -> Headers {
        let mut headers = Headers::new();
        let mut current: Option<String> = None;

        for line in block.split("\r\n") {
            if line.is_empty() {
                continue;
            }

            if line.starts_with([' ', '\t']) {
                let folded = collapse_whitespace(line);
                match current.as_deref() {
                    Some(name) if headers.fold_into(name, &folded) => {}
                    _ => trace!(line, "skip continuation line without a preceding field"),
                }
                continue;
            }

            match line.split_once(':') {
                Some((field, value)) => {
                    let field = unescape_token(field).into_owned();
                    headers.append(field.clone(), trim_value(value));
                    current = Some(field);
                }
                None => trace!(line, "skip header line without a colon"),
            }
        }

        trace!(header_count = headers.len(), "decoded header block");
        headers
    }
}

/// Replaces every run of whitespace with a single space.
fn collapse_whitespace(line: &str) -> String {
    let mut collapsed = String::with_capacity(line.len());
    let mut in_whitespace = false;
    for c in line.chars() {
        if c.is_ascii_whitespace() || c == '\x0B' {
            if !in_whitespace {
                collapsed.push(' ');
            }
            in_whitespace = true;
        } else {
            collapsed.push(c);
            in_whitespace = false;
        }
    }
    collapsed
}

/// Separators and control characters that can not appear bare in a token.
fn is_token_escape_char(b: u8) -> bool {
    matches!(
        b,
        b'"' | b'(' | b')' | b'<' | b'>' | b'@' | b',' | b';' | b':' | b'\\' | b'/' | b'[' | b']' | b'?' | b'=' | b'{'
            | b'}' | b' ' | 0..=31 | 127
    )
}

/// Unescapes `"c"` sequences where `c` is a single token escape character.
fn unescape_token(token: &str) -> Cow<'_, str> {
    let bytes = token.as_bytes();
    if !bytes.contains(&b'"') {
        return Cow::Borrowed(token);
    }

    let mut unescaped = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'"' && i + 2 < bytes.len() && bytes[i + 2] == b'"' && is_token_escape_char(bytes[i + 1]) {
            unescaped.push(bytes[i + 1]);
            i += 3;
        } else {
            unescaped.push(bytes[i]);
            i += 1;
        }
    }

    // only ASCII bytes were dropped, the rest is still valid UTF-8
    Cow::Owned(String::from_utf8_lossy(&unescaped).into_owned())
}
