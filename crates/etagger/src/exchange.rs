//! Narrow views of the request and response the filter works on.
//!
//! Host frameworks plug in by implementing these traits for their own types.
//! An implementation for the `http` crate ships behind the `http` feature.

use crate::error::Result;
use std::future::Future;

/// `Content-Type` header name
pub const CONTENT_TYPE: &str = "Content-Type";
/// `If-None-Match` header name
pub const IF_NONE_MATCH: &str = "If-None-Match";
/// `ETag` header name
pub const ETAG: &str = "ETag";

/// Read-only view of an inbound request.
pub trait ConditionalRequest {
    /// Request method, as sent (e.g. `"GET"`).
    fn method(&self) -> &str;

    /// Case-insensitive header lookup. Returns `None` for missing or
    /// non-textual values.
    fn header(&self, name: &str) -> Option<&str>;
}

/// Mutable view of an outgoing response.
pub trait CacheableResponse: Sized {
    /// Buffered body bytes.
    type Bytes: AsRef<[u8]> + Send;

    /// Status code.
    fn status(&self) -> u16;

    /// Case-insensitive header lookup.
    fn header(&self, name: &str) -> Option<&str>;

    /// Set a header, replacing any existing value.
    fn set_header(&mut self, name: &str, value: &str) -> Result<()>;

    /// Whether the response carries body content at all.
    fn has_body(&self) -> bool;

    /// Read the whole body.
    ///
    /// Implementations must leave the same bytes in place so the response can
    /// still be transmitted afterwards; reading for fingerprinting must never
    /// exhaust a single-use stream.
    fn buffered_body(&mut self) -> impl Future<Output = Result<Self::Bytes>> + Send;

    /// Build a `304 Not Modified` response with an empty body and a copy of
    /// this response's headers.
    fn not_modified(&self) -> Self;
}
