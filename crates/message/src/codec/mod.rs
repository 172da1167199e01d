//! Decoders for complete HTTP response messages.
//!
//! The decoders work on a fully buffered message; reading it from a socket is left to
//! the caller.
//!
//! # Architecture
//!
//! - [`ResponseDecoder`]: splits the message, reads the status line and drives the
//!   other decoders
//! - [`HeaderDecoder`] ([`header`] module): header blocks and chunked trailers,
//!   including obsolete line folding
//! - [`PayloadDecoder`] / [`ChunkedDecoder`] ([`body`] module): transfer codings
//! - [`CookieDecoder`]: `Set-Cookie` values into cookie records
//!
//! # Example
//!
//! ```
//! use bytes::Bytes;
//! use micro_message::codec::ResponseDecoder;
//!
//! let raw = Bytes::from_static(b"HTTP/1.1 200 OK\r\nSet-Cookie: id=42; Path=/\r\n\r\nhello");
//! let response = ResponseDecoder::new().decode(raw).unwrap();
//!
//! assert_eq!(response.status_code(), 200);
//! assert_eq!(response.cookies().get("id").unwrap().path(), Some("/"));
//! assert_eq!(response.body().as_ref(), b"hello");
//! ```

mod body;
mod cookie_decoder;
mod header;
mod response_decoder;

pub use body::{ChunkedDecoder, DecodedBody, PayloadDecoder};
pub use cookie_decoder::CookieDecoder;
pub use header::HeaderDecoder;
pub use response_decoder::ResponseDecoder;
pub(crate) use response_decoder::Sections;
