use thiserror::Error;

/// Errors raised while turning a raw response byte stream into a [`CanonicalResponse`].
///
/// A parse error is fatal to the call that produced it: the caller has to treat the
/// response as unusable.
///
/// [`CanonicalResponse`]: crate::protocol::CanonicalResponse
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("invalid response: message head is not textual")]
    NotTextual,

    #[error("invalid http response: {reason}")]
    InvalidMessage { reason: String },
}

impl ParseError {
    pub fn invalid_message<S: ToString>(str: S) -> Self {
        Self::InvalidMessage { reason: str.to_string() }
    }
}
