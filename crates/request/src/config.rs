//! Application settings that shape base path and webroot computation.
//!
//! ```
//! use micro_request::AppConfig;
//!
//! let config = AppConfig::from_json(r#"{ "baseUrl": "/index.php", "fullBaseUrl": "http://localhost" }"#).unwrap();
//! assert_eq!(config.base_url.as_deref(), Some("/index.php"));
//! assert_eq!(config.dir, "app");
//! ```

use serde::Deserialize;

use crate::RequestError;

const DEFAULT_APP_DIR: &str = "app";
const DEFAULT_WEBROOT_DIR: &str = "webroot";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
    /// Explicit base path; skips the base computation when set.
    pub base: Option<String>,
    /// Base URL of the front controller, used when URL rewriting is not available.
    pub base_url: Option<String>,
    /// Name of the application directory.
    pub dir: String,
    /// Name of the webroot directory.
    pub webroot: String,
    /// Scheme and host the application is served from, e.g. `http://example.com`.
    pub full_base_url: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base: None,
            base_url: None,
            dir: DEFAULT_APP_DIR.to_owned(),
            webroot: DEFAULT_WEBROOT_DIR.to_owned(),
            full_base_url: None,
        }
    }
}

impl AppConfig {
    pub fn from_json(json: &str) -> Result<Self, RequestError> {
        Ok(serde_json::from_str(json)?)
    }

    #[must_use]
    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    #[must_use]
    pub fn with_dir(mut self, dir: impl Into<String>) -> Self {
        self.dir = dir.into();
        self
    }

    #[must_use]
    pub fn with_webroot(mut self, webroot: impl Into<String>) -> Self {
        self.webroot = webroot.into();
        self
    }

    #[must_use]
    pub fn with_full_base_url(mut self, full_base_url: impl Into<String>) -> Self {
        self.full_base_url = Some(full_base_url.into());
        self
    }
}
