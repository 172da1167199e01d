//! Snapshot of the server environment a request is built from.
//!
//! Holds CGI style variables (`REQUEST_METHOD`, `REQUEST_URI`, `HTTP_*` headers, ...)
//! and the process arguments, which serve as the last URI source for command line
//! invocations.

use std::collections::HashMap;

const HTTPS: &str = "HTTPS";
const SCRIPT_URI: &str = "SCRIPT_URI";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    vars: HashMap<String, String>,
    argv: Vec<String>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Captures the variables and arguments of the current process.
    pub fn from_process() -> Self {
        Self { vars: std::env::vars().collect(), argv: std::env::args().skip(1).collect() }
    }

    #[must_use]
    pub fn with_argv<I, S>(mut self, argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.argv = argv.into_iter().map(Into::into).collect();
        self
    }

    /// Reads a variable.
    ///
    /// `HTTPS` is normalized: it reads `"1"` when the variable is set to anything but an
    /// empty string or `off`, or when `SCRIPT_URI` starts with `https://`, and is absent
    /// otherwise.
    pub fn var(&self, key: &str) -> Option<&str> {
        if key == HTTPS {
            return self.is_https().then_some("1");
        }
        self.raw(key)
    }

    /// Reads a variable as it was set, without normalization.
    pub fn raw(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Reads a variable, treating an empty value as absent.
    pub fn non_empty(&self, key: &str) -> Option<&str> {
        self.var(key).filter(|value| !value.is_empty())
    }

    /// Reads a request header through its `HTTP_*` variable; `X-Requested-With` is
    /// looked up as `HTTP_X_REQUESTED_WITH`.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.var(&header_key(name))
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.vars.remove(key)
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    fn is_https(&self) -> bool {
        match self.raw(HTTPS) {
            Some(https) => !https.is_empty() && !https.eq_ignore_ascii_case("off"),
            None => self.raw(SCRIPT_URI).is_some_and(|uri| uri.starts_with("https://")),
        }
    }
}

fn header_key(name: &str) -> String {
    format!("HTTP_{}", name.to_ascii_uppercase().replace('-', "_"))
}

impl<K, V> FromIterator<(K, V)> for Environment
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self { vars: iter.into_iter().map(|(key, value)| (key.into(), value.into())).collect(), argv: Vec::new() }
    }
}
