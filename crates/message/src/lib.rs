//! HTTP message model: parsing raw responses into structured values.
//!
//! This crate turns a complete raw HTTP/1.x response, as read from a socket, into a
//! [`CanonicalResponse`](protocol::CanonicalResponse): status line, headers, decoded
//! body and cookies, with the raw message kept alongside. It also holds the
//! quality-value list parser used for content negotiation on the request side.
//!
//! # Features
//!
//! - Lenient status line and header parsing
//! - Obsolete header line folding and quoted token unescaping in field names
//! - Repeated header fields kept as lists
//! - Chunked transfer coding with trailers merged back into the headers
//! - `Set-Cookie` parsing aware of quoted strings
//! - `Accept` / `Accept-Language` lists grouped and ordered by quality
//!
//! # Example
//!
//! ```
//! use micro_message::protocol::CanonicalResponse;
//!
//! let raw = "HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n4\r\nWiki\r\n5\r\npedia\r\n0\r\n\r\n";
//! let response = CanonicalResponse::try_from(raw).unwrap();
//!
//! assert!(response.is_ok());
//! assert_eq!(response.to_string(), "Wikipedia");
//! ```
//!
//! # Architecture
//!
//! - [`protocol`]: the message types ([`Headers`](protocol::Headers),
//!   [`Cookies`](protocol::Cookies), [`AcceptList`](protocol::AcceptList), ...) and
//!   [`ParseError`](protocol::ParseError)
//! - [`codec`]: the decoders producing them
//!
//! # Error Handling
//!
//! Only two conditions fail a parse: a message without the empty line ending its
//! head, and a head that is not valid UTF-8. Everything else is recovered from and
//! logged with `tracing` at `debug` or `trace` level.
//!
//! # Limitations
//!
//! - Complete messages only, there is no incremental parsing
//! - No content codings (`gzip`, `br`, ...), only the chunked transfer coding

pub mod codec;
pub mod protocol;

mod utils;
pub(crate) use utils::ensure;
