//! Normalization of the request path, base path and webroot.
//!
//! Front-ends report the requested URI in different variables: `PATH_INFO` under
//! CGI, `REQUEST_URI` under most servers (sometimes as an absolute URI behind
//! proxies), `PHP_SELF` minus `SCRIPT_NAME` without rewriting, `HTTP_X_REWRITE_URL`
//! under IIS and the first process argument on the command line.
//! [`EnvironmentNormalizer`] picks the first available source in that order and
//! turns it into a [`RequestPaths`] triple.
//!
//! # Path
//!
//! The base path is stripped from the front of the selected URI, the query string is
//! cut off, and `""`, `/`, `//`, `/index.php` as well as anything ending in
//! `/webroot/index.php` collapse to `/`.
//!
//! # Base and webroot
//!
//! - An explicit `base` is used as is, the webroot is `base + "/"`.
//! - Without a `base_url` the base is the directory of `PHP_SELF`, with a trailing
//!   webroot and application directory removed and every segment raw-url-encoded.
//! - With a `base_url` the base is that URL itself, and the webroot gets the
//!   application and webroot directories appended unless the document root already
//!   points into them.
//!
//! Normalization is a pure function of the environment and the configuration.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use tracing::trace;

use crate::{AppConfig, Environment};

/// Characters `rawurlencode` leaves untouched besides ASCII alphanumerics.
const RAW_URL_ENCODE: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.').remove(b'~');

const ROOT: &str = "/";
const INDEX_SUFFIX: &str = "/webroot/index.php";

/// The normalized location of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestPaths {
    /// Requested path without base and query string.
    pub path: String,
    /// Path prefix the application is mounted at, empty at the document root.
    pub base: String,
    /// Public URL path of the webroot, always ending with `/`.
    pub webroot: String,
}

#[derive(Debug, Clone, Copy)]
pub struct EnvironmentNormalizer<'a> {
    config: &'a AppConfig,
}

impl<'a> EnvironmentNormalizer<'a> {
    pub fn new(config: &'a AppConfig) -> Self {
        Self { config }
    }

    pub fn normalize(&self, env: &Environment) -> RequestPaths {
        let (base, webroot) = self.base(env);
        let path = self.path(env, &base);
        trace!(path = %path, base = %base, webroot = %webroot, "normalized request paths");
        RequestPaths { path, base, webroot }
    }

    fn path(&self, env: &Environment, base: &str) -> String {
        let mut uri = self.uri_signal(env);

        if !base.is_empty() && uri.starts_with(base) {
            uri.drain(..base.len());
        }
        if let Some(query_start) = uri.find('?') {
            uri.truncate(query_start);
        }
        if matches!(uri.as_str(), "" | "/" | "//" | "/index.php") || uri.ends_with(INDEX_SUFFIX) {
            return ROOT.to_owned();
        }
        uri
    }

    /// The raw URI from the first available source.
    fn uri_signal(&self, env: &Environment) -> String {
        if let Some(path_info) = env.non_empty("PATH_INFO") {
            return path_info.to_owned();
        }

        if let Some(request_uri) = env.var("REQUEST_URI") {
            let Some(scheme_pos) = request_uri.find("://") else {
                return request_uri.to_owned();
            };
            // a `://` behind the query marker belongs to the query string
            if request_uri.find('?').is_some_and(|query_pos| scheme_pos > query_pos) {
                return request_uri.to_owned();
            }
            return self
                .config
                .full_base_url
                .as_deref()
                .and_then(|full_base_url| request_uri.strip_prefix(full_base_url))
                .unwrap_or_default()
                .to_owned();
        }

        if let (Some(php_self), Some(script_name)) = (env.var("PHP_SELF"), env.var("SCRIPT_NAME")) {
            if script_name.is_empty() {
                return php_self.to_owned();
            }
            return php_self.replace(script_name, "");
        }

        if let Some(rewrite_url) = env.var("HTTP_X_REWRITE_URL") {
            return rewrite_url.to_owned();
        }

        env.argv().first().cloned().unwrap_or_default()
    }

    fn base(&self, env: &Environment) -> (String, String) {
        if let Some(base) = &self.config.base {
            return (base.clone(), format!("{base}/"));
        }

        match self.config.base_url.as_deref().filter(|base_url| !base_url.is_empty()) {
            None => self.base_from_script(env),
            Some(base_url) => self.base_from_base_url(env, base_url),
        }
    }

    fn base_from_script(&self, env: &Environment) -> (String, String) {
        let mut base = collapse_slashes(dirname(env.var("PHP_SELF").unwrap_or_default()));

        if let Some(index_pos) = base.find(INDEX_SUFFIX) {
            base.truncate(index_pos);
            base.push_str("/webroot");
        }
        if self.config.webroot == "webroot" && basename(&base) == "webroot" {
            base = dirname(&base).to_owned();
        }
        if self.config.dir == "app" && basename(&base) == "app" {
            base = dirname(&base).to_owned();
        }
        if base == "/" || base == "." {
            base.clear();
        }

        let base = base
            .split('/')
            .map(|segment| utf8_percent_encode(segment, RAW_URL_ENCODE).to_string())
            .collect::<Vec<_>>()
            .join("/");
        let webroot = format!("{base}/");
        (base, webroot)
    }

    fn base_from_base_url(&self, env: &Environment, base_url: &str) -> (String, String) {
        let file = format!("/{}", basename(base_url));
        let mut base = dirname(base_url);
        if base == "/" || base == "." {
            base = "";
        }

        let mut webroot = format!("{base}/");
        let app_dir = &self.config.dir;
        let webroot_dir = &self.config.webroot;

        let doc_root_has_webroot =
            env.var("DOCUMENT_ROOT").is_some_and(|doc_root| doc_root.contains(&format!("{app_dir}/{webroot_dir}")));
        if !base.is_empty() || !doc_root_has_webroot {
            if !webroot.contains(&format!("/{app_dir}/")) {
                webroot.push_str(app_dir);
                webroot.push('/');
            }
            if !webroot.contains(&format!("/{webroot_dir}/")) {
                webroot.push_str(webroot_dir);
                webroot.push('/');
            }
        }

        (format!("{base}{file}"), webroot)
    }
}

/// Parent directory of a path: `/a/b` → `/a`, `/a` → `/`, `a` → `.`, `""` → `""`.
fn dirname(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return if path.is_empty() { "" } else { ROOT };
    }
    match trimmed.rfind('/') {
        None => ".",
        Some(slash) => match trimmed[..slash].trim_end_matches('/') {
            "" => ROOT,
            dir => dir,
        },
    }
}

/// Last segment of a path, ignoring trailing slashes.
fn basename(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    trimmed.rfind('/').map_or(trimmed, |slash| &trimmed[slash + 1..])
}

fn collapse_slashes(path: &str) -> String {
    let mut collapsed = String::with_capacity(path.len());
    for c in path.chars() {
        if c == '/' && collapsed.ends_with('/') {
            continue;
        }
        collapsed.push(c);
    }
    collapsed
}
