//! Request body sources and body parsing.
//!
//! # Raw input
//!
//! The raw request body is exposed through [`InputSource`], a one-shot byte source.
//! [`RequestInput`] reads it at most once and caches the bytes, so every later read
//! returns the same data without touching the source again.
//!
//! # Parsing rules
//!
//! [`RequestBodyParser`] builds the request data, applying in order:
//!
//! 1. Structured form fields are used when present. Otherwise a `PUT` or `DELETE`
//!    request with a `application/x-www-form-urlencoded` body has its raw input
//!    decoded.
//! 2. An `X-HTTP-Method-Override` header is injected as a `_method` field.
//! 3. A `_method` field becomes the effective request method and is removed from the
//!    data. A list or map there is still an override, but never a method.
//! 4. An overridden method other than `POST`, `PUT`, `PATCH` or `DELETE` discards
//!    the whole data.
//! 5. A `data` entry is unwrapped: when it is the only key it becomes the data,
//!    otherwise it is deep-merged over its siblings.

use std::cell::RefCell;
use std::fmt;
use std::io::{self, Read};

use bytes::Bytes;
use http::Method;
use mime::Mime;
use once_cell::unsync::OnceCell;
use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::RequestError;
use crate::value;

const METHOD_FIELD: &str = "_method";
const DATA_FIELD: &str = "data";

/// Methods a request may be overridden to while keeping its data.
const DATA_METHODS: [Method; 4] = [Method::POST, Method::PUT, Method::PATCH, Method::DELETE];

/// A one-shot source of the raw request body.
#[cfg_attr(test, mockall::automock)]
pub trait InputSource {
    fn read_input(&mut self) -> io::Result<Bytes>;
}

impl InputSource for Bytes {
    fn read_input(&mut self) -> io::Result<Bytes> {
        Ok(std::mem::take(self))
    }
}

/// Reads the body from any [`Read`] implementation until its end.
#[derive(Debug)]
pub struct ReaderInput<R> {
    reader: R,
}

impl<R: Read> ReaderInput<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: Read> InputSource for ReaderInput<R> {
    fn read_input(&mut self) -> io::Result<Bytes> {
        let mut buf = Vec::new();
        self.reader.read_to_end(&mut buf)?;
        Ok(Bytes::from(buf))
    }
}

/// The raw request body, read on first use and cached afterwards.
pub struct RequestInput {
    source: RefCell<Option<Box<dyn InputSource>>>,
    cached: OnceCell<Bytes>,
}

impl RequestInput {
    pub fn new(source: impl InputSource + 'static) -> Self {
        Self { source: RefCell::new(Some(Box::new(source))), cached: OnceCell::new() }
    }

    /// An input without any body.
    pub fn empty() -> Self {
        Self::from_bytes(Bytes::new())
    }

    pub fn from_bytes(input: Bytes) -> Self {
        Self { source: RefCell::new(None), cached: OnceCell::with_value(input) }
    }

    /// Reads the input, hitting the source only on the first call.
    ///
    /// The source is consumed by that first call even when it fails.
    pub fn read(&self) -> Result<&Bytes, RequestError> {
        let input = self.cached.get_or_try_init(|| match self.source.borrow_mut().take() {
            Some(mut source) => source.read_input(),
            None => Ok(Bytes::new()),
        })?;
        Ok(input)
    }

    /// Replaces the input, the source is not read anymore.
    pub fn set(&mut self, input: Bytes) {
        *self = Self::from_bytes(input);
    }
}

impl Default for RequestInput {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for RequestInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestInput")
            .field("pending_source", &self.source.borrow().is_some())
            .field("cached", &self.cached.get())
            .finish()
    }
}

/// Everything the body parser reads besides the raw input.
#[derive(Debug, Clone, Copy, Default)]
pub struct BodySources<'a> {
    /// Structured form fields decoded by the front-end.
    pub form: Option<&'a Map<String, Value>>,
    /// Request method as reported by the transport.
    pub method: Option<&'a str>,
    pub content_type: Option<&'a str>,
    /// Value of the `X-HTTP-Method-Override` header.
    pub method_override: Option<&'a str>,
}

/// Result of body parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedBody {
    pub data: Value,
    /// The method taken from a `_method` field, to replace the transport method.
    pub method: Option<String>,
    /// The last override seen, from the header or the `_method` field.
    pub method_override: Option<String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RequestBodyParser;

impl RequestBodyParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, sources: BodySources<'_>, input: &RequestInput) -> Result<ParsedBody, RequestError> {
        let mut data = match sources.form.filter(|form| !form.is_empty()) {
            Some(form) => Value::Object(form.clone()),
            None if Self::reads_form_input(&sources) => {
                let input = input.read()?;
                trace!(len = input.len(), "decode url encoded request input");
                Value::Object(value::parse_query(&String::from_utf8_lossy(input)))
            }
            None => Value::Object(Map::new()),
        };

        let mut method_override = None;
        if let Some(header) = sources.method_override.filter(|header| !header.is_empty()) {
            value::insert_value(&mut data, METHOD_FIELD, Value::String(header.to_owned()));
            method_override = Some(header.to_owned());
        }

        let mut method = None;
        if let Some(field) = data.as_object_mut().and_then(|data| data.shift_remove(METHOD_FIELD)) {
            match value::scalar_string(&field) {
                Some(field) => {
                    debug!(method = %field, "request method overridden");
                    method = Some(field.clone());
                    method_override = Some(field);
                }
                None if !field.is_null() => {
                    debug!(method = %field, "reject a structured method override");
                    method_override = Some(field.to_string());
                }
                None => {}
            }
        }

        if let Some(method_override) = &method_override {
            if !DATA_METHODS.iter().any(|method| method.as_str() == method_override.as_str()) {
                debug!(method = %method_override, "discard the data of an overridden request method");
                data = Value::Object(Map::new());
            }
        }

        let data = Self::unwrap_data_field(data);
        Ok(ParsedBody { data, method, method_override })
    }

    fn reads_form_input(sources: &BodySources<'_>) -> bool {
        let put_or_delete = sources.method.is_some_and(|method| method == Method::PUT || method == Method::DELETE);
        let form_encoded = sources
            .content_type
            .and_then(|content_type| content_type.parse::<Mime>().ok())
            .is_some_and(|mime| mime.essence_str() == mime::APPLICATION_WWW_FORM_URLENCODED.essence_str());
        put_or_delete && form_encoded
    }

    fn unwrap_data_field(mut data: Value) -> Value {
        let Some(fields) = data.as_object_mut() else {
            return data;
        };
        let Some(nested) = fields.get(DATA_FIELD).filter(|nested| !nested.is_null()) else {
            return data;
        };

        if fields.len() == 1 {
            return nested.clone();
        }

        let nested = fields.shift_remove(DATA_FIELD).unwrap_or_default();
        value::merge(&mut data, nested);
        data
    }
}
