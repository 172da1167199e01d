//! Request classification.
//!
//! A [`DetectorRegistry`] maps case-insensitive names to [`DetectorSpec`] rules that
//! [`CanonicalRequest::is`](crate::CanonicalRequest::is) evaluates. Every request owns
//! its registry, so detectors added while handling one request never leak into
//! another.
//!
//! # Built-in detectors
//!
//! | name                                                       | rule                                             |
//! |------------------------------------------------------------|--------------------------------------------------|
//! | `get` `post` `put` `patch` `delete` `head` `options`       | `REQUEST_METHOD` equals the method               |
//! | `ssl`                                                      | the request came over HTTPS                      |
//! | `ajax`                                                     | `X-Requested-With: XMLHttpRequest`               |
//! | `flash`                                                    | user agent starts with `Shockwave Flash` or `Adobe Flash` |
//! | `mobile`                                                   | user agent names a known mobile browser          |
//! | `requested`                                                | routing parameter `requested` is `1`             |
//! | `json` / `xml`                                             | `Accept` lists the media type, or `ext` matches  |
//!
//! # Examples
//!
//! ```
//! use micro_request::detector::{DetectorRegistry, DetectorSpec};
//!
//! let mut detectors = DetectorRegistry::default();
//! detectors.add("Mobile", DetectorSpec::env_options("HTTP_USER_AGENT", ["Kindle"]).unwrap());
//! assert!(detectors.contains("mobile"));
//! ```

mod spec;

pub use spec::DetectorSpec;
pub use spec::HeaderMatcher;
pub use spec::ParamMatcher;
pub use spec::Predicate;

use std::collections::HashMap;

use http::Method;
use tracing::{trace, warn};

use crate::CanonicalRequest;

const REQUEST_METHOD: &str = "REQUEST_METHOD";
const USER_AGENT: &str = "HTTP_USER_AGENT";

const FLASH_PATTERN: &str = "^(Shockwave|Adobe) Flash";

const MOBILE_AGENTS: [&str; 27] = [
    "Android",
    "AvantGo",
    "BB10",
    "BlackBerry",
    "DoCoMo",
    "Fennec",
    "iPod",
    "iPhone",
    "iPad",
    "J2ME",
    "MIDP",
    "NetFront",
    "Nokia",
    "Opera Mini",
    "Opera Mobi",
    "PalmOS",
    "PalmSource",
    "portalmmm",
    "Plucker",
    "ReqwirelessWeb",
    "SonyEricsson",
    "Symbian",
    r"UP\.Browser",
    "webOS",
    "Windows CE",
    "Windows Phone OS",
    "Xiino",
];

macro_rules! method_detector {
    ($name:literal, $method:ident) => {
        ($name, DetectorSpec::env_match(REQUEST_METHOD, Method::$method.as_str()))
    };
}

#[derive(Debug, Clone)]
pub struct DetectorRegistry {
    detectors: HashMap<String, DetectorSpec>,
}

impl DetectorRegistry {
    /// A registry without any detector.
    pub fn empty() -> Self {
        Self { detectors: HashMap::new() }
    }

    pub fn get(&self, name: &str) -> Option<&DetectorSpec> {
        self.detectors.get(&name.to_lowercase())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }

    /// Defines or redefines a detector.
    ///
    /// Redefining a detector whose old and new rule both carry an option list extends
    /// the list instead of replacing the rule.
    pub fn add(&mut self, name: &str, spec: DetectorSpec) {
        let name = name.to_lowercase();
        let spec = match self.detectors.remove(&name) {
            Some(existing) if existing.has_options() && spec.has_options() => {
                let fallback = spec.clone();
                existing.merge(spec).unwrap_or_else(|e| {
                    warn!(detector = %name, cause = %e, "could not merge detector options, replacing them");
                    fallback
                })
            }
            _ => spec,
        };
        self.detectors.insert(name, spec);
    }

    /// Evaluates a detector; unknown names never match.
    pub fn detect(&self, name: &str, request: &CanonicalRequest) -> bool {
        let Some(spec) = self.get(name) else {
            trace!(detector = name, "unknown detector");
            return false;
        };
        let matched = spec.matches(request);
        trace!(detector = name, matched, "detector evaluated");
        matched
    }
}

impl Default for DetectorRegistry {
    /// The built-in detectors.
    fn default() -> Self {
        let mut registry = Self::empty();

        let methods = [
            method_detector!("get", GET),
            method_detector!("patch", PATCH),
            method_detector!("post", POST),
            method_detector!("put", PUT),
            method_detector!("delete", DELETE),
            method_detector!("head", HEAD),
            method_detector!("options", OPTIONS),
        ];
        for (name, spec) in methods {
            registry.add(name, spec);
        }

        registry.add("ssl", DetectorSpec::env_match("HTTPS", "1"));
        registry.add("ajax", DetectorSpec::env_match("HTTP_X_REQUESTED_WITH", "XMLHttpRequest"));
        registry.add("requested", DetectorSpec::param("requested", 1));
        registry.add("json", DetectorSpec::accept(["application/json"]).or_param("ext", "json"));
        registry.add("xml", DetectorSpec::accept(["application/xml", "text/xml"]).or_param("ext", "xml"));

        let patterns = [
            ("flash", DetectorSpec::env_pattern(USER_AGENT, FLASH_PATTERN)),
            ("mobile", DetectorSpec::env_options(USER_AGENT, MOBILE_AGENTS)),
        ];
        for (name, spec) in patterns {
            match spec {
                Ok(spec) => registry.add(name, spec),
                Err(e) => warn!(detector = name, cause = %e, "invalid built-in detector pattern"),
            }
        }

        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_ins() {
        let registry = DetectorRegistry::default();
        for name in ["get", "post", "put", "patch", "delete", "head", "options"] {
            assert!(matches!(registry.get(name), Some(DetectorSpec::EnvMatch { .. })), "{name}");
        }
        for name in ["ssl", "ajax", "flash", "mobile", "requested", "json", "xml"] {
            assert!(registry.contains(name), "{name}");
        }
        assert_eq!(registry.len(), 14);
    }

    #[test]
    fn names_are_case_insensitive() {
        let mut registry = DetectorRegistry::empty();
        registry.add("IsBot", DetectorSpec::header("User-Agent", "bot"));
        assert!(registry.contains("isbot"));
        assert!(registry.contains("ISBOT"));
        assert!(!registry.contains("bot"));
    }

    #[test]
    fn redefining_options_merges() {
        let mut registry = DetectorRegistry::default();
        registry.add("mobile", DetectorSpec::env_options(USER_AGENT, ["Kindle", "iPhone"]).unwrap());

        let Some(DetectorSpec::EnvOptions { options, .. }) = registry.get("mobile") else {
            panic!("mobile is not an options detector");
        };
        assert_eq!(options.len(), MOBILE_AGENTS.len() + 1);
        assert_eq!(options.first().map(String::as_str), Some("Android"));
        assert_eq!(options.last().map(String::as_str), Some("Kindle"));
    }

    #[test]
    fn redefining_without_options_replaces() {
        let mut registry = DetectorRegistry::default();
        registry.add("mobile", DetectorSpec::header("X-Mobile", "1"));
        assert!(matches!(registry.get("mobile"), Some(DetectorSpec::HeaderMatch { .. })));

        registry.add("post", DetectorSpec::env_match(REQUEST_METHOD, "PUT"));
        assert!(matches!(registry.get("post"), Some(DetectorSpec::EnvMatch { value, .. }) if value == "PUT"));
    }
}
