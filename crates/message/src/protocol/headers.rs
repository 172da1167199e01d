//! Ordered header map used by parsed responses and chunked trailers.
//!
//! Field names are stored exactly as they appeared on the wire. Lookups try the exact
//! name first and fall back to an ASCII case-insensitive match, so `Set-Cookie` and
//! `set-cookie` lines stay separate entries but both answer `header("SET-COOKIE")`.

use std::fmt;
use std::slice;

/// The value of one header field.
///
/// A field only becomes a [`HeaderField::List`] when the same name is repeated in
/// the header block; duplicates are never overwritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderField {
    Single(String),
    List(Vec<String>),
}

impl HeaderField {
    /// Returns all values of this field in wire order.
    pub fn values(&self) -> &[String] {
        match self {
            HeaderField::Single(value) => slice::from_ref(value),
            HeaderField::List(values) => values.as_slice(),
        }
    }

    /// Returns the first value of this field.
    pub fn first(&self) -> &str {
        self.values().first().map_or("", String::as_str)
    }

    /// Returns the most recent value of this field.
    pub fn last(&self) -> &str {
        self.values().last().map_or("", String::as_str)
    }

    #[inline]
    pub fn is_list(&self) -> bool {
        matches!(self, HeaderField::List(_))
    }

    fn push(&mut self, value: String) {
        match self {
            HeaderField::Single(first) => {
                let first = std::mem::take(first);
                *self = HeaderField::List(vec![first, value]);
            }
            HeaderField::List(values) => values.push(value),
        }
    }

    fn last_mut(&mut self) -> Option<&mut String> {
        match self {
            HeaderField::Single(value) => Some(value),
            HeaderField::List(values) => values.last_mut(),
        }
    }
}

impl From<String> for HeaderField {
    fn from(value: String) -> Self {
        HeaderField::Single(value)
    }
}

impl From<&str> for HeaderField {
    fn from(value: &str) -> Self {
        HeaderField::Single(value.to_owned())
    }
}

/// Insertion ordered header map with case-insensitive lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, HeaderField)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(name, field)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &HeaderField)> {
        self.entries.iter().map(|(name, field)| (name.as_str(), field))
    }

    /// Looks a field up by name, exact match first, then ignoring ASCII case.
    pub fn get(&self, name: &str) -> Option<&HeaderField> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .or_else(|| self.entries.iter().find(|(key, _)| key.eq_ignore_ascii_case(name)))
            .map(|(_, field)| field)
    }

    /// Returns the first value of the named field.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).map(HeaderField::first)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Appends a value. A name that is already present (exact match) turns into a
    /// list holding both values.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(key, _)| *key == name) {
            Some((_, field)) => field.push(value),
            None => self.entries.push((name, HeaderField::Single(value))),
        }
    }

    /// Appends folded text to the latest value of `name`, trimming the result.
    ///
    /// Returns `false` when no such field exists yet.
    pub(crate) fn fold_into(&mut self, name: &str, text: &str) -> bool {
        let Some(last) = self
            .entries
            .iter_mut()
            .find(|(key, _)| key == name)
            .and_then(|(_, field)| field.last_mut())
        else {
            return false;
        };

        last.push_str(text);
        let trimmed = trim_value(last).to_owned();
        *last = trimmed;
        true
    }

    /// Merges every field of `other` into this map, keeping duplicates as lists.
    pub fn merge(&mut self, other: Headers) {
        for (name, field) in other.entries {
            let values = match field {
                HeaderField::Single(value) => vec![value],
                HeaderField::List(values) => values,
            };
            for value in values {
                self.append(name.clone(), value);
            }
        }
    }
}

impl<'a> IntoIterator for &'a Headers {
    type Item = (&'a str, &'a HeaderField);
    type IntoIter = Box<dyn Iterator<Item = (&'a str, &'a HeaderField)> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

/// Renders the map back to header lines, one line per value.
impl fmt::Display for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, field) in self.iter() {
            for value in field.values() {
                write!(f, "{name}: {value}\r\n")?;
            }
        }
        Ok(())
    }
}

/// Trims the characters HTTP header values are padded with.
pub(crate) fn trim_value(value: &str) -> &str {
    value.trim_matches(|c: char| matches!(c, ' ' | '\t' | '\n' | '\r' | '\0' | '\x0B'))
}
