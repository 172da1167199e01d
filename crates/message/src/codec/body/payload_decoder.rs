//! Transfer-coding dispatch for response bodies.
//!
//! The `Transfer-Encoding` header selects the decoder: `chunked` (any letter case)
//! runs the [`ChunkedDecoder`], every other value leaves the body untouched.

use bytes::Bytes;
use tracing::trace;

use crate::codec::body::chunked_decoder::{ChunkedDecoder, DecodedBody};

/// A decoder selected from the `Transfer-Encoding` header.
#[derive(Debug, Clone, Copy)]
pub struct PayloadDecoder {
    kind: Kind,
}

#[derive(Debug, Clone, Copy)]
enum Kind {
    /// Decode the body using chunked transfer coding
    Chunked(ChunkedDecoder),

    /// Pass the body through as is
    Identity,
}

impl PayloadDecoder {
    /// Creates a PayloadDecoder that leaves the body as it is.
    pub fn identity() -> Self {
        Self { kind: Kind::Identity }
    }

    /// Creates a PayloadDecoder for chunked transfer coding.
    pub fn chunked() -> Self {
        Self { kind: Kind::Chunked(ChunkedDecoder::new()) }
    }

    /// Selects the decoder for a `Transfer-Encoding` value, if any.
    pub fn for_transfer_encoding(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(coding) if coding.eq_ignore_ascii_case("chunked") => Self::chunked(),
            Some(coding) => {
                trace!(coding, "no decoder for transfer coding, keeping the body as is");
                Self::identity()
            }
            None => Self::identity(),
        }
    }

    pub fn is_chunked(&self) -> bool {
        matches!(self.kind, Kind::Chunked(_))
    }

    pub fn decode(&self, body: Bytes) -> DecodedBody {
        match &self.kind {
            Kind::Chunked(chunked_decoder) => chunked_decoder.decode(body),
            Kind::Identity => DecodedBody::identity(body),
        }
    }
}
