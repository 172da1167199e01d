//! Canonical request model built from a CGI style server environment.
//!
//! Front-ends describe an inbound request through server variables (`REQUEST_URI`,
//! `PHP_SELF`, `HTTP_*` headers, ...), decoded form fields, uploaded files and a raw
//! body stream. This crate turns them into a [`CanonicalRequest`]: normalized path,
//! base path and webroot, query arguments, request data, routing parameters, and
//! queries over them such as request detectors and content negotiation.
//!
//! # Example
//!
//! ```
//! use micro_request::{AppConfig, CanonicalRequest, Environment};
//!
//! let env: Environment = [
//!     ("REQUEST_METHOD", "GET"),
//!     ("REQUEST_URI", "/shop/posts/view/3?page=2"),
//!     ("PHP_SELF", "/shop/app/webroot/index.php"),
//!     ("QUERY_STRING", "page=2"),
//!     ("HTTP_X_REQUESTED_WITH", "XMLHttpRequest"),
//! ]
//! .into_iter()
//! .collect();
//!
//! let request = CanonicalRequest::builder(env).config(AppConfig::default()).build().unwrap();
//!
//! assert_eq!(request.path(), "/posts/view/3");
//! assert_eq!(request.base(), "/shop");
//! assert_eq!(request.here(true), "/shop/posts/view/3?page=2");
//! assert!(request.is_all(["get", "ajax"]));
//! ```
//!
//! # Modules
//!
//! - [`paths`]: request path, base path and webroot normalization
//! - [`body`]: the one-shot raw input and request data parsing
//! - [`detector`]: named request classifiers
//! - [`value`]: dot-path access and URL-encoded form handling over value trees

mod config;
mod environment;
mod error;
mod request;
mod upload;

pub mod body;
pub mod detector;
pub mod paths;
pub mod value;

pub use config::AppConfig;
pub use environment::Environment;
pub use error::MethodNotAllowed;
pub use error::RequestError;
pub use request::CanonicalRequest;
pub use request::PathUpdate;
pub use request::RequestBuilder;
