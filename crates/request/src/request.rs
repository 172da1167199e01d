//! The canonical request built from a server environment.
//!
//! [`CanonicalRequest`] is assembled once per inbound request by [`RequestBuilder`]:
//!
//! 1. the path, base and webroot are computed by
//!    [`EnvironmentNormalizer`](crate::paths::EnvironmentNormalizer);
//! 2. the request data is parsed by [`RequestBodyParser`](crate::body::RequestBodyParser),
//!    and a method override is written back to `REQUEST_METHOD`;
//! 3. query arguments are taken from `QUERY_STRING` (or an explicit map), without the
//!    pseudo key some rewrite setups add for the path, and merged with the query part
//!    of an explicit URL;
//! 4. uploaded files are moved into the parameters and the data.
//!
//! Afterwards the request answers classification questions through its own
//! [`DetectorRegistry`], content negotiation through
//! [`AcceptList`](micro_message::protocol::AcceptList), and exposes query, data and
//! routing parameters by dot-path.

use std::borrow::Cow;

use bytes::Bytes;
use http::Method;
use micro_message::protocol::AcceptList;
use serde_json::{Map, Value, json};
use tracing::{debug, trace};

use crate::body::{BodySources, RequestBodyParser, RequestInput};
use crate::detector::{DetectorRegistry, DetectorSpec};
use crate::paths::EnvironmentNormalizer;
use crate::{AppConfig, Environment, MethodNotAllowed, RequestError, upload, value};

const REQUEST_METHOD: &str = "REQUEST_METHOD";
const QUERY_STRING: &str = "QUERY_STRING";

const URL_KEY: &str = "url";
const DATA_KEY: &str = "data";

/// Builds a [`CanonicalRequest`] from an environment snapshot and the values a
/// front-end decoded for it.
#[derive(Debug, Default)]
pub struct RequestBuilder {
    env: Environment,
    config: AppConfig,
    url: Option<String>,
    query: Option<Map<String, Value>>,
    form: Option<Map<String, Value>>,
    files: Option<Map<String, Value>>,
    input: RequestInput,
}

impl RequestBuilder {
    fn new(env: Environment) -> Self {
        Self { env, ..Default::default() }
    }

    pub fn config(mut self, config: AppConfig) -> Self {
        self.config = config;
        self
    }

    /// Uses this URL instead of the one found in the environment. A `?query` part is
    /// merged into the query arguments, keeping arguments already present.
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Uses these query arguments instead of decoding `QUERY_STRING`.
    pub fn query(mut self, query: Map<String, Value>) -> Self {
        self.query = Some(query);
        self
    }

    /// Structured form fields decoded by the front-end.
    pub fn form(mut self, form: Map<String, Value>) -> Self {
        self.form = Some(form);
        self
    }

    pub fn files(mut self, files: Map<String, Value>) -> Self {
        self.files = Some(files);
        self
    }

    pub fn input(mut self, input: RequestInput) -> Self {
        self.input = input;
        self
    }

    pub fn build(self) -> Result<CanonicalRequest, RequestError> {
        let RequestBuilder { mut env, config, url, query, form, files, input } = self;

        let paths = EnvironmentNormalizer::new(&config).normalize(&env);
        let url = url.filter(|url| !url.is_empty()).unwrap_or(paths.path);
        let url = match url.strip_prefix('/') {
            Some(stripped) => stripped.to_owned(),
            None => url,
        };

        let parsed = RequestBodyParser::new().parse(
            BodySources {
                form: form.as_ref(),
                method: env.var(REQUEST_METHOD),
                content_type: content_type(&env),
                method_override: env.header("X-HTTP-Method-Override"),
            },
            &input,
        )?;
        if let Some(method) = &parsed.method {
            env.set(REQUEST_METHOD, method.as_str());
        }
        let mut data = parsed.data;

        let mut query = query.unwrap_or_else(|| value::parse_query(env.var(QUERY_STRING).unwrap_or_default()));
        let path_key = format!("/{}", value::url_decode(&url).replace(['.', ' '], "_"));
        query.shift_remove(&path_key);
        query.shift_remove(&format!("{}{path_key}", paths.base));

        let url = match url.split_once('?') {
            Some((path, query_string)) => {
                let query_string = query_string.split('?').next().unwrap_or_default();
                for (key, arg) in value::parse_query(query_string) {
                    query.entry(key).or_insert(arg);
                }
                path.to_owned()
            }
            None => url,
        };

        let mut params = default_params();
        if let Some(files) = &files {
            upload::process_files(files, &mut params, &mut data);
        }

        let here = format!("{}/{url}", paths.base);
        debug!(url = %url, base = %paths.base, here = %here, "request built");

        Ok(CanonicalRequest {
            env,
            config,
            path: format!("/{url}"),
            base: paths.base,
            webroot: paths.webroot,
            here,
            query,
            data,
            params,
            detectors: DetectorRegistry::default(),
            input,
        })
    }
}

fn default_params() -> Map<String, Value> {
    let mut params = Map::new();
    params.insert("plugin".to_owned(), Value::Null);
    params.insert("controller".to_owned(), Value::Null);
    params.insert("action".to_owned(), Value::Null);
    params.insert("named".to_owned(), json!([]));
    params.insert("pass".to_owned(), json!([]));
    params
}

fn content_type(env: &Environment) -> Option<&str> {
    env.non_empty("CONTENT_TYPE").or_else(|| env.var("HTTP_CONTENT_TYPE"))
}

/// Replacement paths for [`CanonicalRequest::add_paths`]; `None` keeps the current
/// value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathUpdate {
    pub base: Option<String>,
    pub webroot: Option<String>,
    pub here: Option<String>,
}

/// A normalized, queryable view of one inbound request.
#[derive(Debug)]
pub struct CanonicalRequest {
    env: Environment,
    config: AppConfig,
    path: String,
    base: String,
    webroot: String,
    here: String,
    query: Map<String, Value>,
    data: Value,
    params: Map<String, Value>,
    detectors: DetectorRegistry,
    input: RequestInput,
}

impl CanonicalRequest {
    pub fn builder(env: Environment) -> RequestBuilder {
        RequestBuilder::new(env)
    }

    /// Builds a request from the environment alone.
    pub fn from_env(env: Environment) -> Result<Self, RequestError> {
        Self::builder(env).build()
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    /// The request path with a leading `/`, without base path and query string.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The request path without the leading `/`.
    pub fn url(&self) -> &str {
        &self.path[1..]
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn webroot(&self) -> &str {
        &self.webroot
    }

    /// The current URL including the encoded query arguments, optionally without the
    /// base path.
    pub fn here(&self, with_base: bool) -> String {
        let mut url = self.here.clone();
        if !self.query.is_empty() {
            url.push('?');
            url.push_str(&value::build_query(&self.query));
        }
        if !with_base && let Some(stripped) = url.strip_prefix(self.base.as_str()) {
            return stripped.to_owned();
        }
        url
    }

    pub fn add_paths(&mut self, update: PathUpdate) -> &mut Self {
        if let Some(base) = update.base {
            self.base = base;
        }
        if let Some(webroot) = update.webroot {
            self.webroot = webroot;
        }
        if let Some(here) = update.here {
            self.here = here;
        }
        self
    }

    pub fn query(&self, path: &str) -> Option<&Value> {
        value::get(&self.query, path)
    }

    pub fn queries(&self) -> &Map<String, Value> {
        &self.query
    }

    pub fn data(&self, path: &str) -> Option<&Value> {
        value::get_value(&self.data, path)
    }

    pub fn data_all(&self) -> &Value {
        &self.data
    }

    pub fn set_data(&mut self, path: &str, data: impl Into<Value>) -> &mut Self {
        value::insert_value(&mut self.data, path, data.into());
        self
    }

    /// Reads a routing parameter. A key containing `.` is looked up as is before being
    /// treated as a path.
    pub fn param(&self, path: &str) -> Option<&Value> {
        self.params.get(path).or_else(|| value::get(&self.params, path))
    }

    pub fn set_param(&mut self, path: &str, param: impl Into<Value>) -> &mut Self {
        value::insert(&mut self.params, path, param.into());
        self
    }

    pub fn params(&self) -> &Map<String, Value> {
        &self.params
    }

    /// Merges parameters in, replacing existing keys.
    pub fn add_params(&mut self, params: Map<String, Value>) -> &mut Self {
        self.params.extend(params);
        self
    }

    pub fn plugin(&self) -> Option<&str> {
        self.params.get("plugin").and_then(Value::as_str)
    }

    pub fn controller(&self) -> Option<&str> {
        self.params.get("controller").and_then(Value::as_str)
    }

    pub fn action(&self) -> Option<&str> {
        self.params.get("action").and_then(Value::as_str)
    }

    /// Reads a parameter by name. Without such a parameter `url` reads the query
    /// arguments and `data` the request data.
    pub fn get(&self, name: &str) -> Option<Cow<'_, Value>> {
        if let Some(param) = self.params.get(name).filter(|param| !param.is_null()) {
            return Some(Cow::Borrowed(param));
        }
        match name {
            URL_KEY => Some(Cow::Owned(Value::Object(self.query.clone()))),
            DATA_KEY => Some(Cow::Borrowed(&self.data)),
            _ => None,
        }
    }

    pub fn set(&mut self, name: impl Into<String>, param: impl Into<Value>) -> &mut Self {
        self.params.insert(name.into(), param.into());
        self
    }

    pub fn has(&self, name: &str) -> bool {
        name == URL_KEY || name == DATA_KEY || self.params.get(name).is_some_and(|param| !param.is_null())
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.params.shift_remove(name)
    }

    /// Evaluates a detector by name; unknown detectors never match.
    pub fn is(&self, name: &str) -> bool {
        self.detectors.detect(name, self)
    }

    pub fn is_any<I, S>(&self, names: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names.into_iter().any(|name| self.is(name.as_ref()))
    }

    pub fn is_all<I, S>(&self, names: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names.into_iter().all(|name| self.is(name.as_ref()))
    }

    pub fn add_detector(&mut self, name: &str, spec: DetectorSpec) -> &mut Self {
        self.detectors.add(name, spec);
        self
    }

    pub fn detectors(&self) -> &DetectorRegistry {
        &self.detectors
    }

    /// Succeeds when the request matches one of the method detectors.
    ///
    /// ```
    /// use micro_request::{CanonicalRequest, Environment};
    ///
    /// let env: Environment = [("REQUEST_METHOD", "GET")].into_iter().collect();
    /// let request = CanonicalRequest::from_env(env).unwrap();
    ///
    /// let error = request.allow_method(&["post", "delete"]).unwrap_err();
    /// assert_eq!(error.allow(), "POST, DELETE");
    /// ```
    pub fn allow_method<S: AsRef<str>>(&self, methods: &[S]) -> Result<(), MethodNotAllowed> {
        if self.is_any(methods) {
            return Ok(());
        }
        let error = MethodNotAllowed::new(methods);
        debug!(method = ?self.method(), allow = error.allow(), "method not allowed");
        Err(error)
    }

    pub fn only_allow<S: AsRef<str>>(&self, methods: &[S]) -> Result<(), MethodNotAllowed> {
        self.allow_method(methods)
    }

    /// The request method, after any override.
    pub fn method(&self) -> Option<&str> {
        self.env.var(REQUEST_METHOD)
    }

    pub fn http_method(&self) -> Option<Method> {
        self.method().and_then(|method| method.parse().ok())
    }

    pub fn content_type(&self) -> Option<&str> {
        content_type(&self.env)
    }

    /// Reads a request header from its `HTTP_*` variable, falling back to a variable
    /// named exactly like the header.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.env.header(name).or_else(|| self.env.raw(name))
    }

    /// The host the request was sent to; `X-Forwarded-Host` when proxies are trusted.
    pub fn host(&self, trust_proxy: bool) -> Option<&str> {
        if trust_proxy {
            return self.env.var("HTTP_X_FORWARDED_HOST");
        }
        self.env.var("HTTP_HOST")
    }

    /// The registrable domain, keeping `tld_length` labels after the domain name.
    pub fn domain(&self, tld_length: usize) -> String {
        let segments = self.host_segments();
        let start = segments.len().saturating_sub(tld_length + 1);
        segments[start..].join(".")
    }

    pub fn subdomains(&self, tld_length: usize) -> Vec<&str> {
        let mut segments = self.host_segments();
        segments.truncate(segments.len().saturating_sub(tld_length + 1));
        segments
    }

    fn host_segments(&self) -> Vec<&str> {
        self.host(false).unwrap_or_default().split('.').collect()
    }

    /// The referring URL; `/` when there is none.
    ///
    /// With `local` only referers inside the application are returned, as a path
    /// relative to the application's full base URL. Any other referer gives `/`.
    pub fn referer(&self, local: bool) -> String {
        let Some(referer) = self.env.non_empty("HTTP_REFERER") else {
            return "/".to_owned();
        };
        if !local {
            return referer.to_owned();
        }

        let base = format!("{}{}", self.config.full_base_url.as_deref().unwrap_or_default(), self.webroot);
        match referer.strip_prefix(base.as_str()) {
            Some(rest) if rest.is_empty() || rest.starts_with("//") => "/".to_owned(),
            Some(rest) if rest.starts_with('/') => rest.to_owned(),
            Some(rest) => format!("/{rest}"),
            None => "/".to_owned(),
        }
    }

    /// The client address. Proxy headers are only consulted when `trust_proxy` is set,
    /// as clients can send them freely.
    pub fn client_ip(&self, trust_proxy: bool) -> &str {
        let forwarded = trust_proxy
            .then(|| {
                self.env
                    .non_empty("HTTP_X_FORWARDED_FOR")
                    .map(|forwarded| forwarded.split(',').next().unwrap_or_default())
                    .or_else(|| self.env.non_empty("HTTP_CLIENT_IP"))
            })
            .flatten();
        forwarded.or_else(|| self.env.var("REMOTE_ADDR")).unwrap_or_default().trim()
    }

    pub fn parse_accept(&self) -> AcceptList {
        AcceptList::parse(self.header("accept").unwrap_or_default())
    }

    /// Accepted media types, most preferred first.
    pub fn accepts(&self) -> Vec<String> {
        self.parse_accept().preferred().into_iter().map(str::to_owned).collect()
    }

    pub fn accepts_type(&self, media_type: &str) -> bool {
        self.parse_accept().contains(media_type)
    }

    fn parse_accept_language(&self) -> AcceptList {
        AcceptList::parse_language(self.header("Accept-Language").unwrap_or_default())
    }

    /// Accepted languages, lower-cased with `-` separators, most preferred first.
    pub fn accept_language(&self) -> Vec<String> {
        self.parse_accept_language().preferred().into_iter().map(str::to_owned).collect()
    }

    pub fn accepts_language(&self, language: &str) -> bool {
        self.parse_accept_language().contains(&language.to_lowercase())
    }

    /// The raw request body, read from the input source on first use.
    pub fn input(&self) -> Result<&Bytes, RequestError> {
        self.input.read()
    }

    /// Passes the raw request body to a decoder.
    ///
    /// ```
    /// use bytes::Bytes;
    /// use micro_request::body::RequestInput;
    /// use micro_request::{CanonicalRequest, Environment, RequestError};
    ///
    /// let request = CanonicalRequest::builder(Environment::new())
    ///     .input(RequestInput::from_bytes(Bytes::from_static(br#"{"name":"cake"}"#)))
    ///     .build()
    ///     .unwrap();
    ///
    /// let body: serde_json::Value = request
    ///     .input_with(|raw| serde_json::from_slice(raw).map_err(RequestError::from))
    ///     .unwrap();
    /// assert_eq!(body["name"], "cake");
    /// ```
    pub fn input_with<T, E, F>(&self, decode: F) -> Result<T, E>
    where
        F: FnOnce(&[u8]) -> Result<T, E>,
        E: From<RequestError>,
    {
        let input = self.input.read()?;
        trace!(len = input.len(), "decode request input");
        decode(input)
    }

    pub fn set_input(&mut self, input: Bytes) -> &mut Self {
        self.input.set(input);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::MockInputSource;
    use serde_json::json;

    fn env(vars: &[(&str, &str)]) -> Environment {
        vars.iter().copied().collect()
    }

    fn request(vars: &[(&str, &str)]) -> CanonicalRequest {
        CanonicalRequest::from_env(env(vars)).unwrap()
    }

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn paths_from_environment() {
        let request = request(&[
            ("REQUEST_URI", "/1.2.x.x/posts/view/1?page=2"),
            ("PHP_SELF", "/1.2.x.x/app/webroot/index.php"),
            ("QUERY_STRING", "page=2"),
        ]);

        assert_eq!(request.path(), "/posts/view/1");
        assert_eq!(request.url(), "posts/view/1");
        assert_eq!(request.base(), "/1.2.x.x");
        assert_eq!(request.webroot(), "/1.2.x.x/");
        assert_eq!(request.query("page"), Some(&json!("2")));
        assert_eq!(request.here(true), "/1.2.x.x/posts/view/1?page=2");
        assert_eq!(request.here(false), "/posts/view/1?page=2");
    }

    #[test]
    fn default_params() {
        let request = request(&[]);
        assert_eq!(request.path(), "/");
        assert_eq!(request.param("controller"), Some(&Value::Null));
        assert_eq!(request.param("pass"), Some(&json!([])));
        assert_eq!(request.param("named"), Some(&json!([])));
        assert_eq!(request.controller(), None);
    }

    #[test]
    fn path_pseudo_key_is_removed_from_the_query() {
        let request = request(&[
            ("REQUEST_URI", "/posts/add"),
            ("PHP_SELF", "/index.php"),
            ("QUERY_STRING", "/posts/add&sort=title"),
        ]);
        assert_eq!(request.queries().keys().collect::<Vec<_>>(), ["sort"]);
    }

    #[test]
    fn explicit_url_merges_its_query() {
        let mut query = Map::new();
        query.insert("page".to_owned(), json!("1"));
        let request = CanonicalRequest::builder(env(&[("PHP_SELF", "/index.php")]))
            .url("/posts/index?page=3&sort=title")
            .query(query)
            .build()
            .unwrap();

        assert_eq!(request.path(), "/posts/index");
        assert_eq!(request.query("page"), Some(&json!("1")));
        assert_eq!(request.query("sort"), Some(&json!("title")));
    }

    #[test]
    fn method_override_rewrites_the_method() {
        let form = object(json!({ "_method": "PUT", "title": "hello" }));
        let request = CanonicalRequest::builder(env(&[("REQUEST_METHOD", "POST")])).form(form).build().unwrap();

        assert_eq!(request.method(), Some("PUT"));
        assert_eq!(request.http_method(), Some(Method::PUT));
        assert!(request.is("put"));
        assert!(!request.is("post"));
        assert_eq!(request.data_all(), &json!({ "title": "hello" }));
    }

    #[test]
    fn override_header_rewrites_the_method() {
        let request = request(&[("REQUEST_METHOD", "POST"), ("HTTP_X_HTTP_METHOD_OVERRIDE", "DELETE")]);
        assert!(request.is("delete"));
    }

    #[test]
    fn trace_override_discards_the_data() {
        let form = object(json!({ "_method": "TRACE", "title": "hello" }));
        let request = CanonicalRequest::builder(env(&[("REQUEST_METHOD", "POST")])).form(form).build().unwrap();

        assert_eq!(request.method(), Some("TRACE"));
        assert_eq!(request.data_all(), &json!({}));
    }

    #[test]
    fn put_body_is_read_once() {
        let mut source = MockInputSource::new();
        source.expect_read_input().times(1).returning(|| Ok(Bytes::from_static(b"data[Post][title]=hi&extra=1")));

        let request = CanonicalRequest::builder(env(&[
            ("REQUEST_METHOD", "PUT"),
            ("CONTENT_TYPE", "application/x-www-form-urlencoded; charset=UTF-8"),
        ]))
        .input(RequestInput::new(source))
        .build()
        .unwrap();

        assert_eq!(request.data("Post.title"), Some(&json!("hi")));
        assert_eq!(request.data("extra"), Some(&json!("1")));
        assert_eq!(request.input().unwrap().as_ref(), b"data[Post][title]=hi&extra=1");
        assert_eq!(request.input().unwrap().len(), 28);
    }

    #[test]
    fn input_with_decodes() {
        let request = CanonicalRequest::builder(env(&[("REQUEST_METHOD", "POST")]))
            .input(RequestInput::from_bytes(Bytes::from_static(br#"{"id": 7}"#)))
            .build()
            .unwrap();

        let decoded: Value = request.input_with(|raw| serde_json::from_slice(raw).map_err(RequestError::from)).unwrap();
        assert_eq!(decoded, json!({ "id": 7 }));

        let failed: Result<Value, RequestError> =
            request.input_with(|raw| serde_json::from_slice(&raw[1..]).map_err(RequestError::from));
        assert!(matches!(failed, Err(RequestError::Json { .. })));
    }

    #[test]
    fn set_input_replaces_the_body() {
        let mut request = request(&[]);
        request.set_input(Bytes::from_static(b"replaced"));
        assert_eq!(request.input().unwrap().as_ref(), b"replaced");
    }

    #[test]
    fn uploaded_files() {
        let files = object(json!({
            "upload": { "name": "a.txt", "size": 3 },
            "data": { "name": { "Doc": { "file": "b.txt" } }, "size": { "Doc": { "file": 4 } } },
        }));
        let request = CanonicalRequest::builder(env(&[("REQUEST_METHOD", "POST")])).files(files).build().unwrap();

        assert_eq!(request.param("form.upload.name"), Some(&json!("a.txt")));
        assert_eq!(request.data("Doc.file"), Some(&json!({ "name": "b.txt", "size": 4 })));
    }

    #[test]
    fn built_in_detectors() {
        let request = request(&[
            ("REQUEST_METHOD", "GET"),
            ("HTTPS", "on"),
            ("HTTP_X_REQUESTED_WITH", "XMLHttpRequest"),
            ("HTTP_USER_AGENT", "Mozilla/5.0 (iPhone; CPU iPhone OS 10_3 like Mac OS X)"),
            ("HTTP_ACCEPT", "text/html, application/json"),
        ]);

        for name in ["get", "GET", "ssl", "ajax", "mobile", "json"] {
            assert!(request.is(name), "{name}");
        }
        for name in ["post", "flash", "xml", "requested", "unknown"] {
            assert!(!request.is(name), "{name}");
        }
        assert!(request.is_any(["post", "ajax"]));
        assert!(!request.is_any(["post", "put"]));
        assert!(request.is_all(["get", "ssl"]));
        assert!(!request.is_all(["get", "xml"]));
    }

    #[test]
    fn flash_detector() {
        assert!(request(&[("HTTP_USER_AGENT", "Shockwave Flash")]).is("flash"));
        assert!(request(&[("HTTP_USER_AGENT", "Adobe Flash Player 9")]).is("flash"));
        assert!(!request(&[("HTTP_USER_AGENT", "Player Adobe Flash")]).is("flash"));
    }

    #[test]
    fn param_detectors() {
        let mut request = request(&[]);
        assert!(!request.is("json"));
        assert!(!request.is("requested"));

        request.set_param("ext", "json").set_param("requested", "1");
        assert!(request.is("json"));
        assert!(request.is("requested"));
        assert!(!request.is("xml"));
    }

    #[test]
    fn custom_detectors() {
        let mut request = request(&[
            ("HTTP_AUTHORIZATION", "Bearer token"),
            ("HTTP_USER_AGENT", "Mozilla/5.0 (Linux; Kindle)"),
        ]);
        request
            .add_detector("bearer", DetectorSpec::header_with("Authorization", |value| value.starts_with("Bearer ")))
            .add_detector("api", DetectorSpec::callback(|request| request.path().starts_with("/api")))
            .add_detector("admin", DetectorSpec::param_options("prefix", ["admin", "manager"]));

        assert!(request.is("Bearer"));
        assert!(!request.is("api"));
        assert!(!request.is("admin"));
        assert!(!request.is("mobile"));

        request.set_param("prefix", "manager");
        request.add_detector("mobile", DetectorSpec::env_options("HTTP_USER_AGENT", ["Kindle"]).unwrap());
        assert!(request.is("admin"));
        assert!(request.is("mobile"));
    }

    #[test]
    fn merged_options_keep_the_built_ins() {
        let mut request = request(&[("HTTP_USER_AGENT", "Mozilla/5.0 (Linux; Android 9)")]);
        request.add_detector("mobile", DetectorSpec::env_options("HTTP_USER_AGENT", ["Kindle"]).unwrap());
        assert!(request.is("mobile"));
    }

    #[test]
    fn allow_method() {
        let request = request(&[("REQUEST_METHOD", "GET")]);
        assert_eq!(request.allow_method(&["get", "post"]), Ok(()));
        assert_eq!(request.only_allow(&["GET"]), Ok(()));

        let error = request.allow_method(&["post", "delete"]).unwrap_err();
        assert_eq!(error.allow_header(), (http::header::ALLOW, "POST, DELETE"));
        assert_eq!(error.status(), http::StatusCode::METHOD_NOT_ALLOWED);
    }

    #[test]
    fn host_and_domains() {
        let request = request(&[("HTTP_HOST", "something.else.example.co.uk"), ("HTTP_X_FORWARDED_HOST", "proxy.com")]);

        assert_eq!(request.host(false), Some("something.else.example.co.uk"));
        assert_eq!(request.host(true), Some("proxy.com"));
        assert_eq!(request.domain(1), "co.uk");
        assert_eq!(request.domain(2), "example.co.uk");
        assert_eq!(request.subdomains(2), ["something", "else"]);
        assert_eq!(request.subdomains(10), Vec::<&str>::new());
    }

    #[test]
    fn client_ip() {
        let request = request(&[
            ("HTTP_X_FORWARDED_FOR", "192.168.1.5, 10.0.1.1, proxy.com"),
            ("HTTP_CLIENT_IP", "192.168.1.2"),
            ("REMOTE_ADDR", " 192.168.1.3 "),
        ]);
        assert_eq!(request.client_ip(true), "192.168.1.5");
        assert_eq!(request.client_ip(false), "192.168.1.3");

        let request = request_without_forwarding();
        assert_eq!(request.client_ip(true), "192.168.1.2");
    }

    fn request_without_forwarding() -> CanonicalRequest {
        request(&[("HTTP_X_FORWARDED_FOR", ""), ("HTTP_CLIENT_IP", "192.168.1.2"), ("REMOTE_ADDR", "192.168.1.3")])
    }

    #[test]
    fn referer() {
        let build = |referer: &str| {
            CanonicalRequest::builder(env(&[("HTTP_REFERER", referer), ("PHP_SELF", "/index.php")]))
                .config(AppConfig::default().with_full_base_url("http://cakephp.org"))
                .build()
                .unwrap()
        };

        assert_eq!(build("http://cakephp.org/some/path").referer(true), "/some/path");
        assert_eq!(build("http://cakephp.org/some/path").referer(false), "http://cakephp.org/some/path");
        assert_eq!(build("http://cakephp.org/").referer(true), "/");
        assert_eq!(build("http://cakephp.org///evil.com").referer(true), "/");
        assert_eq!(build("http://other.org/some/path").referer(true), "/");
        assert_eq!(request(&[]).referer(false), "/");
    }

    #[test]
    fn content_negotiation() {
        let request = request(&[
            ("HTTP_ACCEPT", "text/xml,application/xml;q=0.9,application/xhtml+xml,text/html,text/plain,image/png"),
            ("HTTP_ACCEPT_LANGUAGE", "en_US,en;q=0.8,inherit,es_MX;q=0.3"),
            ("CONTENT_TYPE", ""),
            ("HTTP_CONTENT_TYPE", "application/json"),
        ]);

        assert_eq!(
            request.accepts(),
            ["text/xml", "application/xhtml+xml", "text/html", "text/plain", "image/png", "application/xml"]
        );
        assert!(request.accepts_type("text/html"));
        assert!(!request.accepts_type("image/gif"));
        assert_eq!(request.accept_language(), ["en-us", "inherit", "en", "es-mx"]);
        assert!(request.accepts_language("EN-US"));
        assert!(!request.accepts_language("fr"));
        assert_eq!(request.content_type(), Some("application/json"));
    }

    #[test]
    fn array_style_access() {
        let mut request = CanonicalRequest::builder(env(&[("QUERY_STRING", "page=2")]))
            .form(object(json!({ "title": "hello" })))
            .build()
            .unwrap();

        assert_eq!(request.get("url").as_deref(), Some(&json!({ "page": "2" })));
        assert_eq!(request.get("data").as_deref(), Some(&json!({ "title": "hello" })));
        assert!(request.has("url"));
        assert!(request.has("data"));
        assert!(!request.has("controller"));

        request.set("controller", "posts").set("url", json!({ "custom": true }));
        assert_eq!(request.controller(), Some("posts"));
        assert!(request.has("controller"));
        assert_eq!(request.get("url").as_deref(), Some(&json!({ "custom": true })));

        assert_eq!(request.remove("url"), Some(json!({ "custom": true })));
        assert_eq!(request.get("url").as_deref(), Some(&json!({ "page": "2" })));
        assert_eq!(request.get("missing"), None);
    }

    #[test]
    fn params_and_data_by_path() {
        let mut request = request(&[]);
        request
            .add_params(object(json!({ "controller": "posts", "action": "view", "pass": ["1"] })))
            .set_param("named.page", 2)
            .set_data("Post.title", "hello");

        assert_eq!(request.action(), Some("view"));
        assert_eq!(request.param("pass.0"), Some(&json!("1")));
        assert_eq!(request.param("named.page"), Some(&json!(2)));
        assert_eq!(request.data("Post.title"), Some(&json!("hello")));
        assert_eq!(request.data("Post.missing"), None);
    }

    #[test]
    fn add_paths() {
        let mut request = request(&[("REQUEST_URI", "/posts/index"), ("PHP_SELF", "/index.php")]);
        assert_eq!(request.here(true), "/posts/index");

        request.add_paths(PathUpdate {
            base: Some("/shop".to_owned()),
            here: Some("/shop/posts/index".to_owned()),
            ..Default::default()
        });
        assert_eq!(request.base(), "/shop");
        assert_eq!(request.webroot(), "/");
        assert_eq!(request.here(true), "/shop/posts/index");
        assert_eq!(request.here(false), "/posts/index");
    }
}
