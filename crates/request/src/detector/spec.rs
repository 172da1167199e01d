use std::fmt;
use std::sync::Arc;

use regex::Regex;
use serde_json::Value;

use crate::{CanonicalRequest, RequestError};
use crate::value;

const HTTP_ACCEPT: &str = "HTTP_ACCEPT";

/// A shareable boolean test.
pub struct Predicate<T: ?Sized>(Arc<dyn Fn(&T) -> bool + Send + Sync>);

impl<T: ?Sized> Predicate<T> {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn test(&self, input: &T) -> bool {
        (self.0)(input)
    }
}

impl<T: ?Sized> Clone for Predicate<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T: ?Sized> fmt::Debug for Predicate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Predicate(..)")
    }
}

/// How a header value is checked.
#[derive(Debug, Clone)]
pub enum HeaderMatcher {
    Value(String),
    Predicate(Predicate<str>),
}

impl HeaderMatcher {
    fn matches(&self, header: &str) -> bool {
        match self {
            HeaderMatcher::Value(value) => header == value,
            HeaderMatcher::Predicate(predicate) => predicate.test(header),
        }
    }
}

/// How a routing parameter is checked. Comparison is loose, so the parameter `"1"`
/// matches the value `1`.
#[derive(Debug, Clone)]
pub enum ParamMatcher {
    Value(Value),
    Options(Vec<Value>),
}

impl ParamMatcher {
    fn matches(&self, param: &Value) -> bool {
        match self {
            ParamMatcher::Value(value) => value::loose_eq(param, value),
            ParamMatcher::Options(options) => options.iter().any(|option| value::loose_eq(param, option)),
        }
    }
}

/// A rule classifying a request, evaluated by [`CanonicalRequest::is`].
#[derive(Debug, Clone)]
pub enum DetectorSpec {
    /// An environment variable equals a value.
    EnvMatch { key: String, value: String },
    /// An environment variable matches a pattern; an unset variable reads as empty.
    EnvPattern { key: String, pattern: Regex },
    /// An environment variable contains one of the options, ignoring case. Options
    /// are pattern fragments.
    EnvOptions { key: String, options: Vec<String>, pattern: Regex },
    /// A request header equals a value or satisfies a predicate.
    HeaderMatch { name: String, matcher: HeaderMatcher },
    /// The `Accept` header lists one of the media types, or the optional routing
    /// parameter holds the given value.
    AcceptMatch { media_types: Vec<String>, param: Option<(String, Value)> },
    /// A routing parameter holds a value or one of the options.
    ParamMatch { key: String, matcher: ParamMatcher },
    Callback(Predicate<CanonicalRequest>),
}

impl DetectorSpec {
    pub fn env_match(key: impl Into<String>, value: impl Into<String>) -> Self {
        DetectorSpec::EnvMatch { key: key.into(), value: value.into() }
    }

    pub fn env_pattern(key: impl Into<String>, pattern: &str) -> Result<Self, RequestError> {
        Ok(DetectorSpec::EnvPattern { key: key.into(), pattern: Regex::new(pattern)? })
    }

    pub fn env_options<I, S>(key: impl Into<String>, options: I) -> Result<Self, RequestError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let options: Vec<String> = options.into_iter().map(Into::into).collect();
        let pattern = options_pattern(&options)?;
        Ok(DetectorSpec::EnvOptions { key: key.into(), options, pattern })
    }

    pub fn header(name: impl Into<String>, value: impl Into<String>) -> Self {
        DetectorSpec::HeaderMatch { name: name.into(), matcher: HeaderMatcher::Value(value.into()) }
    }

    pub fn header_with<F>(name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        DetectorSpec::HeaderMatch { name: name.into(), matcher: HeaderMatcher::Predicate(Predicate::new(predicate)) }
    }

    pub fn accept<I, S>(media_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        DetectorSpec::AcceptMatch { media_types: media_types.into_iter().map(Into::into).collect(), param: None }
    }

    /// Adds a routing parameter fallback to an accept detector; other specs are
    /// returned unchanged.
    #[must_use]
    pub fn or_param(self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        match self {
            DetectorSpec::AcceptMatch { media_types, .. } => {
                DetectorSpec::AcceptMatch { media_types, param: Some((key.into(), value.into())) }
            }
            other => other,
        }
    }

    pub fn param(key: impl Into<String>, value: impl Into<Value>) -> Self {
        DetectorSpec::ParamMatch { key: key.into(), matcher: ParamMatcher::Value(value.into()) }
    }

    pub fn param_options<I, V>(key: impl Into<String>, options: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        DetectorSpec::ParamMatch {
            key: key.into(),
            matcher: ParamMatcher::Options(options.into_iter().map(Into::into).collect()),
        }
    }

    pub fn callback<F>(callback: F) -> Self
    where
        F: Fn(&CanonicalRequest) -> bool + Send + Sync + 'static,
    {
        DetectorSpec::Callback(Predicate::new(callback))
    }

    /// Whether the spec carries an option list that a redefinition extends.
    pub fn has_options(&self) -> bool {
        matches!(
            self,
            DetectorSpec::EnvOptions { .. } | DetectorSpec::ParamMatch { matcher: ParamMatcher::Options(_), .. }
        )
    }

    pub fn matches(&self, request: &CanonicalRequest) -> bool {
        let env = request.environment();
        match self {
            DetectorSpec::EnvMatch { key, value } => env.var(key) == Some(value.as_str()),
            DetectorSpec::EnvPattern { key, pattern } | DetectorSpec::EnvOptions { key, pattern, .. } => {
                pattern.is_match(env.var(key).unwrap_or_default())
            }
            DetectorSpec::HeaderMatch { name, matcher } => env.header(name).is_some_and(|header| matcher.matches(header)),
            DetectorSpec::AcceptMatch { media_types, param } => {
                let accepted = env.var(HTTP_ACCEPT).is_some_and(|accept| {
                    accept.split(',').map(str::trim).any(|media_type| media_types.iter().any(|m| m == media_type))
                });
                accepted
                    || param.as_ref().is_some_and(|(key, expected)| {
                        request.param(key).is_some_and(|actual| value::loose_eq(actual, expected))
                    })
            }
            DetectorSpec::ParamMatch { key, matcher } => request.param(key).is_some_and(|param| matcher.matches(param)),
            DetectorSpec::Callback(callback) => callback.test(request),
        }
    }

    /// Combines a redefinition with this spec.
    ///
    /// When both carry an option list of the same kind the lists are joined, keeping
    /// the existing order and skipping duplicates. Otherwise `incoming` replaces this
    /// spec.
    pub(crate) fn merge(self, incoming: DetectorSpec) -> Result<DetectorSpec, RequestError> {
        match (self, incoming) {
            (
                DetectorSpec::EnvOptions { options, .. },
                DetectorSpec::EnvOptions { key, options: extra, .. },
            ) => DetectorSpec::env_options(key, union(options, extra)),
            (
                DetectorSpec::ParamMatch { matcher: ParamMatcher::Options(options), .. },
                DetectorSpec::ParamMatch { key, matcher: ParamMatcher::Options(extra) },
            ) => Ok(DetectorSpec::ParamMatch { key, matcher: ParamMatcher::Options(union(options, extra)) }),
            (_, incoming) => Ok(incoming),
        }
    }
}

fn options_pattern(options: &[String]) -> Result<Regex, regex::Error> {
    Regex::new(&format!("(?i){}", options.join("|")))
}

fn union<T: PartialEq>(mut options: Vec<T>, extra: Vec<T>) -> Vec<T> {
    for option in extra {
        if !options.contains(&option) {
            options.push(option);
        }
    }
    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn options_are_case_insensitive_fragments() {
        let spec = DetectorSpec::env_options("HTTP_USER_AGENT", ["iPhone", r"UP\.Browser"]).unwrap();
        let DetectorSpec::EnvOptions { pattern, .. } = &spec else {
            panic!("not an options spec");
        };

        assert!(pattern.is_match("Mozilla/5.0 (IPHONE; CPU OS 10)"));
        assert!(pattern.is_match("UP.Browser/6.2"));
        assert!(!pattern.is_match("UPxBrowser/6.2"));
        assert!(spec.has_options());
    }

    #[test]
    fn invalid_patterns_are_errors() {
        assert!(matches!(DetectorSpec::env_pattern("HTTP_USER_AGENT", "(unclosed"), Err(RequestError::Pattern { .. })));
        assert!(matches!(DetectorSpec::env_options("HTTP_USER_AGENT", ["[a-"]), Err(RequestError::Pattern { .. })));
    }

    #[test]
    fn merging_options_keeps_order_without_duplicates() {
        let existing = DetectorSpec::env_options("HTTP_USER_AGENT", ["Android", "iPhone"]).unwrap();
        let incoming = DetectorSpec::env_options("HTTP_USER_AGENT", ["iPhone", "Fennec"]).unwrap();

        let DetectorSpec::EnvOptions { options, pattern, .. } = existing.merge(incoming).unwrap() else {
            panic!("not an options spec");
        };
        assert_eq!(options, ["Android", "iPhone", "Fennec"]);
        assert!(pattern.is_match("fennec"));
    }

    #[test]
    fn merging_param_options() {
        let existing = DetectorSpec::param_options("ext", ["json"]);
        let incoming = DetectorSpec::param_options("ext", ["xml", "json"]);

        let DetectorSpec::ParamMatch { matcher: ParamMatcher::Options(options), .. } = existing.merge(incoming).unwrap()
        else {
            panic!("not a param options spec");
        };
        assert_eq!(options, [json!("json"), json!("xml")]);
    }

    #[test]
    fn merging_different_kinds_replaces() {
        let existing = DetectorSpec::env_options("HTTP_USER_AGENT", ["Android"]).unwrap();
        let merged = existing.merge(DetectorSpec::env_match("HTTP_USER_AGENT", "bot")).unwrap();
        assert!(matches!(merged, DetectorSpec::EnvMatch { ref value, .. } if value == "bot"));
    }

    #[test]
    fn param_matchers_compare_loosely() {
        assert!(ParamMatcher::Value(json!(1)).matches(&json!("1")));
        assert!(ParamMatcher::Options(vec![json!("json"), json!("xml")]).matches(&json!("xml")));
        assert!(!ParamMatcher::Value(json!("json")).matches(&json!("rss")));
    }

    #[test]
    fn header_matchers() {
        assert!(HeaderMatcher::Value("XMLHttpRequest".into()).matches("XMLHttpRequest"));
        assert!(!HeaderMatcher::Value("XMLHttpRequest".into()).matches("xmlhttprequest"));
        let predicate = HeaderMatcher::Predicate(Predicate::new(|header: &str| header.starts_with("Bearer ")));
        assert!(predicate.matches("Bearer token"));
    }
}
