//! Core HTTP message abstractions.
//!
//! This module holds the structured values the parsers in [`codec`](crate::codec)
//! produce, and the errors they raise.
//!
//! # Components
//!
//! - **Headers** ([`headers`]): ordered, case-insensitive header map
//!   - [`Headers`]: the map itself
//!   - [`HeaderField`]: a single value, or a list when the name was repeated
//!
//! - **Response** ([`response`]): the parsed response aggregate
//!   - [`CanonicalResponse`]: status line, headers, decoded body, cookies, raw bytes
//!   - [`RawParts`] / [`StatusLine`]: views over the raw message
//!
//! - **Cookies** ([`cookie`]): records extracted from `Set-Cookie`
//!   - [`Cookies`], [`CookieRecord`], [`CookieAttribute`]
//!
//! - **Content negotiation** ([`accept`]): quality-valued header lists
//!   - [`AcceptList`], [`QualityGroup`]
//!
//! - **Errors** ([`error`]): [`ParseError`]

mod headers;
pub use headers::HeaderField;
pub use headers::Headers;
pub(crate) use headers::trim_value;

mod cookie;
pub use cookie::CookieAttribute;
pub use cookie::CookieRecord;
pub use cookie::Cookies;

mod accept;
pub use accept::AcceptList;
pub use accept::QualityGroup;

mod response;
pub use response::CanonicalResponse;
pub use response::RawParts;
pub use response::StatusLine;

mod error;
pub use error::ParseError;
