//! Response body decoding.
//!
//! # Components
//!
//! - [`ChunkedDecoder`]: decodes chunked transfer coded bodies and their trailers
//! - [`PayloadDecoder`]: picks the decoder named by `Transfer-Encoding`
//! - [`DecodedBody`]: the decoded payload plus trailer headers, if any
//!
//! # Features
//!
//! - Chunked transfer coding (RFC 7230) with chunk extensions ignored
//! - Trailer headers parsed with the regular header block decoder
//! - Best-effort recovery for malformed chunk size lines

mod chunked_decoder;
mod payload_decoder;

pub use chunked_decoder::ChunkedDecoder;
pub use chunked_decoder::DecodedBody;
pub use payload_decoder::PayloadDecoder;
