//! Builds a canonical request from the process environment, the way a CGI front-end
//! would, and logs what it found. The request body is read from stdin.
//!
//! ```sh
//! REQUEST_METHOD=PUT CONTENT_TYPE=application/x-www-form-urlencoded \
//!   REQUEST_URI='/posts/edit/3?draft=1' PHP_SELF=/app/webroot/index.php QUERY_STRING=draft=1 \
//!   cargo run --example normalize_request <<< 'data[Post][title]=hello'
//! ```

use std::io;

use micro_request::body::{ReaderInput, RequestInput};
use micro_request::{AppConfig, CanonicalRequest, Environment};
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::DEBUG).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let config = match std::env::var("APP_CONFIG") {
        Ok(json) => match AppConfig::from_json(&json) {
            Ok(config) => config,
            Err(e) => {
                error!(cause = %e, "invalid APP_CONFIG");
                return;
            }
        },
        Err(_) => AppConfig::default(),
    };

    let request = match CanonicalRequest::builder(Environment::from_process())
        .config(config)
        .input(RequestInput::new(ReaderInput::new(io::stdin())))
        .build()
    {
        Ok(request) => request,
        Err(e) => {
            error!(cause = %e, "failed to build request");
            return;
        }
    };

    info!(
        method = ?request.method(),
        path = request.path(),
        base = request.base(),
        webroot = request.webroot(),
        here = %request.here(true),
        "request normalized"
    );
    info!(query = %serde_json::Value::Object(request.queries().clone()), data = %request.data_all(), "request values");

    let detected: Vec<&str> = ["get", "post", "put", "delete", "ssl", "ajax", "mobile", "json", "xml"]
        .into_iter()
        .filter(|name| request.is(name))
        .collect();
    info!(?detected, accepts = ?request.accepts(), languages = ?request.accept_language(), "request classified");

    if let Err(e) = request.allow_method(&["get", "post", "put"]) {
        let (name, value) = e.allow_header();
        info!(status = %e.status(), %name, value, "would reject the request");
    }
}
