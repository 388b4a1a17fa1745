//! Content-fingerprint ETags and conditional GET handling.
//!
//! This crate provides:
//! - SHA-256 content fingerprints rendered as lowercase hex
//! - [`EtagFilter`], which tags eligible GET responses with an `ETag` and
//!   answers matching `If-None-Match` requests with `304 Not Modified`
//! - Narrow request/response traits, with an implementation for the `http`
//!   crate behind the `http` feature
//!
//! # Example
//!
//! ```rust,no_run
//! use bytes::Bytes;
//! use etagger::{EtagFilter, EtagOptions, SupportedMimeType};
//! use http_body_util::Full;
//!
//! # async fn run() -> Result<(), etagger::BoxError> {
//! let filter = EtagFilter::new(EtagOptions::new([SupportedMimeType::TextPlain]));
//!
//! let request = http::Request::get("/greeting").body(())?;
//! let outcome = filter
//!     .apply(&request, || async {
//!         http::Response::builder()
//!             .header("content-type", "text/plain; charset=utf-8")
//!             .body(Full::new(Bytes::from_static(b"Hello world!")))
//!     })
//!     .await?;
//!
//! if let Some(response) = outcome.into_response() {
//!     println!("status {}", response.status());
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod exchange;
mod filter;
mod fingerprint;
mod options;

#[cfg(feature = "http")]
mod http_adapter;

pub use error::{BoxError, EtagError, Result};
pub use exchange::{CacheableResponse, ConditionalRequest, CONTENT_TYPE, ETAG, IF_NONE_MATCH};
pub use filter::{EtagFilter, Outcome};
pub use fingerprint::{fingerprint, Fingerprint, Fingerprinter, FINGERPRINT_LEN};
pub use options::{parse_mime_list, EtagOptions, SupportedMimeType, MIME_TYPES_ENV};
