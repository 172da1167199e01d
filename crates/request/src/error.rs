use std::io;

use http::StatusCode;
use http::header::{ALLOW, HeaderName};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RequestError {
    #[error("failed to read request input: {source}")]
    Input {
        #[from]
        source: io::Error,
    },

    #[error("invalid json: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },

    #[error("invalid detector pattern: {source}")]
    Pattern {
        #[from]
        source: regex::Error,
    },
}

/// The request method is not one of the allowed methods.
///
/// Carries the value of the `Allow` header a `405 Method Not Allowed` response has to
/// include: the allowed methods upper-cased and joined with `", "`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("method not allowed, allowed methods: {allow}")]
pub struct MethodNotAllowed {
    allow: String,
}

impl MethodNotAllowed {
    pub fn new<S: AsRef<str>>(methods: &[S]) -> Self {
        let allow = methods.iter().map(|method| method.as_ref().to_ascii_uppercase()).collect::<Vec<_>>().join(", ");
        Self { allow }
    }

    pub fn allow(&self) -> &str {
        &self.allow
    }

    #[inline]
    pub fn status(&self) -> StatusCode {
        StatusCode::METHOD_NOT_ALLOWED
    }

    /// The header to set on the response.
    pub fn allow_header(&self) -> (HeaderName, &str) {
        (ALLOW, &self.allow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allow_header_value() {
        let error = MethodNotAllowed::new(&["post", "delete"]);
        assert_eq!(error.allow(), "POST, DELETE");
        assert_eq!(error.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(error.allow_header(), (ALLOW, "POST, DELETE"));
        assert_eq!(error.to_string(), "method not allowed, allowed methods: POST, DELETE");
    }
}
