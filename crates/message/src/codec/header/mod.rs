//! Header block processing.
//!
//! - [`HeaderDecoder`]: decodes a CRLF separated header block into
//!   [`Headers`](crate::protocol::Headers)
//!   - Handles obsolete line folding
//!   - Unescapes quoted token characters in field names
//!   - Keeps repeated fields as lists
//!
//! The same decoder parses the header section of a response and the trailer
//! section of a chunked body.

mod header_decoder;

pub use header_decoder::HeaderDecoder;
