//! Structured `Set-Cookie` records.

/// Value of a cookie attribute: `key=value` pairs keep their text, bare flags such as
/// `secure` or `httponly` are stored as [`CookieAttribute::Flag`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieAttribute {
    Text(String),
    Flag,
}

impl CookieAttribute {
    /// Returns the attribute text, `None` for a bare flag.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            CookieAttribute::Text(text) => Some(text),
            CookieAttribute::Flag => None,
        }
    }

    #[inline]
    pub fn is_flag(&self) -> bool {
        matches!(self, CookieAttribute::Flag)
    }
}

/// One cookie extracted from a `Set-Cookie` header value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieRecord {
    value: String,
    attributes: Vec<(String, CookieAttribute)>,
}

impl CookieRecord {
    pub fn new(value: impl Into<String>) -> Self {
        Self { value: value.into(), attributes: Vec::new() }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Looks up an attribute by its lower-cased key.
    pub fn attribute(&self, key: &str) -> Option<&CookieAttribute> {
        self.attributes.iter().find(|(name, _)| name == key).map(|(_, attribute)| attribute)
    }

    /// Attributes in the order they were first seen.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &CookieAttribute)> {
        self.attributes.iter().map(|(name, attribute)| (name.as_str(), attribute))
    }

    pub fn path(&self) -> Option<&str> {
        self.attribute("path").and_then(CookieAttribute::as_str)
    }

    pub fn domain(&self) -> Option<&str> {
        self.attribute("domain").and_then(CookieAttribute::as_str)
    }

    pub fn expires(&self) -> Option<&str> {
        self.attribute("expires").and_then(CookieAttribute::as_str)
    }

    pub fn secure(&self) -> bool {
        self.attribute("secure").is_some()
    }

    pub fn http_only(&self) -> bool {
        self.attribute("httponly").is_some()
    }

    /// Records an attribute unless the key was already seen; the first occurrence wins.
    ///
    /// Returns `false` when the attribute was ignored as a duplicate.
    pub fn insert_attribute(&mut self, key: impl Into<String>, attribute: CookieAttribute) -> bool {
        let key = key.into().to_ascii_lowercase();
        if self.attribute(&key).is_some() {
            return false;
        }
        self.attributes.push((key, attribute));
        true
    }
}

/// Cookies of a response keyed by name. Unnamed cookies use the empty name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cookies {
    entries: Vec<(String, CookieRecord)>,
}

impl Cookies {
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

    pub fn get(&self, name: &str) -> Option<&CookieRecord> {
        self.entries.iter().find(|(key, _)| key == name).map(|(_, record)| record)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CookieRecord)> {
        self.entries.iter().map(|(name, record)| (name.as_str(), record))
    }

    /// Stores a cookie; a later cookie with the same name replaces the earlier one.
    pub fn insert(&mut self, name: impl Into<String>, record: CookieRecord) {
        let name = name.into();
        match self.entries.iter_mut().find(|(key, _)| *key == name) {
            Some((_, existing)) => *existing = record,
            None => self.entries.push((name, record)),
        }
    }
}
