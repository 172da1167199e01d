//! `Set-Cookie` decoder.
//!
//! Every `Set-Cookie` value yields one [`CookieRecord`]. The value is split on `;`
//! outside of closed double quotes, so `a="x;y"; Path=/` is the cookie `a` with the value
//! `"x;y"` and a `path` attribute. Whitespace after a separator is dropped.
//!
//! The first segment is `name=value`; a segment without `=` is a cookie without a
//! name, stored under the empty name. The remaining segments are `key=value`
//! attributes or bare flags. Attribute keys are lower-cased and the first occurrence
//! of a key wins.

use tracing::trace;

use crate::protocol::{CookieAttribute, CookieRecord, Cookies, Headers};

const SET_COOKIE: &str = "Set-Cookie";

#[derive(Debug, Clone, Copy, Default)]
pub struct CookieDecoder;

impl CookieDecoder {
    /// Extracts all cookies from the `Set-Cookie` fields of `headers`.
    pub fn decode(&self, headers: &Headers) -> Cookies {
        let mut cookies = Cookies::new();
        let Some(field) = headers.get(SET_COOKIE) else {
            return cookies;
        };

        for value in field.values() {
            let (name, record) = decode_cookie(value);
            trace!(name = %name, attributes = record.attributes().count(), "decoded cookie");
            cookies.insert(name, record);
        }
        cookies
    }
}

fn decode_cookie(value: &str) -> (String, CookieRecord) {
    let mut segments = split_segments(value).into_iter();

    let (name, cookie_value) = match segments.next() {
        Some(first) => match first.split_once('=') {
            Some((name, cookie_value)) => (name, cookie_value),
            None => ("", first),
        },
        None => ("", ""),
    };

    let mut record = CookieRecord::new(cookie_value);
    for segment in segments {
        let (key, attribute) = match segment.split_once('=') {
            Some((key, text)) => (key, CookieAttribute::Text(text.to_owned())),
            None => (segment, CookieAttribute::Flag),
        };
        if !record.insert_attribute(key, attribute) {
            trace!(key, "ignore duplicated cookie attribute");
        }
    }

    (name.to_owned(), record)
}

/// Splits on `;` outside of closed double quoted strings, dropping the spaces and tabs
/// that follow each separator. An unbalanced quote protects nothing.
fn split_segments(value: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;

    for (i, c) in value.char_indices() {
        match c {
            '"' if in_quotes => in_quotes = false,
            '"' => in_quotes = value[i + 1..].contains('"'),
            ';' if !in_quotes => {
                segments.push(&value[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    segments.push(&value[start..]);

    segments
        .into_iter()
        .enumerate()
        .map(|(i, segment)| if i == 0 { segment } else { segment.trim_start_matches([' ', '\t']) })
        .collect()
}
