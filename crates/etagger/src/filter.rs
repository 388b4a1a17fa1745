//! Conditional GET handling.
//!
//! [`EtagFilter`] sits between a request and the handler producing its
//! response. Eligible GET responses are fingerprinted; when the client's
//! `If-None-Match` already names that fingerprint the response is swapped for
//! an empty `304 Not Modified`, otherwise it is tagged with an `ETag`.
//!
//! Everything that makes a response ineligible (method, media type, missing
//! body) resolves to pass-through. Only body read failures and upstream
//! failures are errors.

use crate::error::{BoxError, EtagError, Result};
use crate::exchange::{CacheableResponse, ConditionalRequest, CONTENT_TYPE, ETAG, IF_NONE_MATCH};
use crate::fingerprint::fingerprint;
use crate::options::EtagOptions;
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, trace};

/// What the caller must do after [`EtagFilter::apply`].
#[derive(Debug)]
pub enum Outcome<R> {
    /// Not a GET request. The continuation was never invoked; the caller
    /// runs its own downstream.
    Skipped,
    /// Ineligible response, returned untouched.
    PassThrough(R),
    /// Response now carries an `ETag` header; send it.
    Tagged(R),
    /// Replacement `304 Not Modified`; send it instead of the original.
    NotModified(R),
}

impl<R> Outcome<R> {
    /// Short label, used for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Skipped => "skipped",
            Self::PassThrough(_) => "pass_through",
            Self::Tagged(_) => "tagged",
            Self::NotModified(_) => "not_modified",
        }
    }

    /// The replacement response, if the filter produced one.
    pub fn replacement(&self) -> Option<&R> {
        match self {
            Self::NotModified(response) => Some(response),
            _ => None,
        }
    }

    /// The response to send, if the continuation ran.
    pub fn response(&self) -> Option<&R> {
        match self {
            Self::Skipped => None,
            Self::PassThrough(response) | Self::Tagged(response) | Self::NotModified(response) => {
                Some(response)
            }
        }
    }

    /// Consume the outcome, returning the response to send.
    pub fn into_response(self) -> Option<R> {
        match self {
            Self::Skipped => None,
            Self::PassThrough(response) | Self::Tagged(response) | Self::NotModified(response) => {
                Some(response)
            }
        }
    }

    /// Whether the client's cached copy is still valid.
    pub fn is_not_modified(&self) -> bool {
        matches!(self, Self::NotModified(_))
    }
}

/// Fingerprints eligible GET responses and answers conditional requests.
///
/// Cheap to clone and safe to share across concurrent requests; the allow-list
/// is immutable after construction.
#[derive(Debug, Clone)]
pub struct EtagFilter {
    mime_types: Arc<HashSet<&'static str>>,
}

impl Default for EtagFilter {
    fn default() -> Self {
        Self::new(EtagOptions::default())
    }
}

impl EtagFilter {
    /// Build a filter from options.
    pub fn new(options: EtagOptions) -> Self {
        let mime_types: HashSet<&'static str> =
            options.mime_types.iter().map(|mime| mime.as_str()).collect();
        Self {
            mime_types: Arc::new(mime_types),
        }
    }

    /// Whether a `Content-Type` value names an allowed media type.
    ///
    /// Parameters after the first `;` are ignored. Matching is exact and
    /// case-sensitive.
    pub fn is_cacheable_content_type(&self, content_type: &str) -> bool {
        let media_type = content_type.split(';').next().unwrap_or_default().trim();
        self.mime_types.contains(media_type)
    }

    /// Run the filter around `next`.
    ///
    /// `next` is invoked at most once, and never for non-GET requests.
    ///
    /// # Errors
    /// * [`EtagError::Upstream`] if `next` fails
    /// * [`EtagError::Body`] if the response body cannot be read
    /// * [`EtagError::InvalidHeader`] if the response rejects the `ETag` header
    pub async fn apply<Q, R, F, Fut, E>(&self, request: &Q, next: F) -> Result<Outcome<R>>
    where
        Q: ConditionalRequest + ?Sized,
        R: CacheableResponse,
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<R, E>>,
        E: Into<BoxError>,
    {
        if request.method() != "GET" {
            debug!(method = request.method(), "Skipping non-GET request");
            return Ok(Outcome::Skipped);
        }

        let mut response = next().await.map_err(EtagError::upstream)?;

        if !response.has_body() {
            debug!(status = response.status(), "Response has no body");
            return Ok(Outcome::PassThrough(response));
        }

        let cacheable = response
            .header(CONTENT_TYPE)
            .is_some_and(|content_type| self.is_cacheable_content_type(content_type));
        if !cacheable {
            debug!(
                content_type = response.header(CONTENT_TYPE).unwrap_or("<none>"),
                "Content type not eligible for fingerprinting"
            );
            return Ok(Outcome::PassThrough(response));
        }

        let body = response.buffered_body().await?;
        if body.as_ref().is_empty() {
            debug!(status = response.status(), "Response body is empty");
            return Ok(Outcome::PassThrough(response));
        }

        let fingerprint = fingerprint(body.as_ref());
        trace!(%fingerprint, len = body.as_ref().len(), "Fingerprinted response body");

        let validator = request.header(IF_NONE_MATCH);
        if validator.is_some_and(|validator| fingerprint.matches(validator)) {
            debug!(%fingerprint, "Client copy is current");
            let mut replacement = response.not_modified();
            replacement.set_header(ETAG, fingerprint.as_str())?;
            return Ok(Outcome::NotModified(replacement));
        }

        debug!(%fingerprint, has_validator = validator.is_some(), "Tagging response");
        response.set_header(ETAG, fingerprint.as_str())?;
        Ok(Outcome::Tagged(response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::SupportedMimeType;
    use std::convert::Infallible;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct TestRequest {
        method: &'static str,
        if_none_match: Option<String>,
    }

    impl TestRequest {
        fn get() -> Self {
            Self {
                method: "GET",
                if_none_match: None,
            }
        }

        fn with_validator(mut self, value: impl Into<String>) -> Self {
            self.if_none_match = Some(value.into());
            self
        }
    }

    impl ConditionalRequest for TestRequest {
        fn method(&self) -> &str {
            self.method
        }

        fn header(&self, name: &str) -> Option<&str> {
            if name.eq_ignore_ascii_case(IF_NONE_MATCH) {
                self.if_none_match.as_deref()
            } else {
                None
            }
        }
    }

    #[derive(Debug, Clone)]
    struct TestResponse {
        status: u16,
        headers: Vec<(String, String)>,
        body: Option<Vec<u8>>,
        fail_read: bool,
    }

    impl TestResponse {
        fn ok(content_type: &str, body: &str) -> Self {
            Self {
                status: 200,
                headers: vec![(CONTENT_TYPE.to_string(), content_type.to_string())],
                body: Some(body.as_bytes().to_vec()),
                fail_read: false,
            }
        }
    }

    impl CacheableResponse for TestResponse {
        type Bytes = Vec<u8>;

        fn status(&self) -> u16 {
            self.status
        }

        fn header(&self, name: &str) -> Option<&str> {
            self.headers
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, value)| value.as_str())
        }

        fn set_header(&mut self, name: &str, value: &str) -> Result<()> {
            self.headers.retain(|(key, _)| !key.eq_ignore_ascii_case(name));
            self.headers.push((name.to_string(), value.to_string()));
            Ok(())
        }

        fn has_body(&self) -> bool {
            self.body.as_ref().is_some_and(|body| !body.is_empty())
        }

        fn buffered_body(&mut self) -> impl Future<Output = Result<Vec<u8>>> + Send {
            let result = if self.fail_read {
                Err(EtagError::body(std::io::Error::other("connection reset")))
            } else {
                Ok(self.body.clone().unwrap_or_default())
            };
            std::future::ready(result)
        }

        fn not_modified(&self) -> Self {
            Self {
                status: 304,
                headers: self.headers.clone(),
                body: None,
                fail_read: false,
            }
        }
    }

    fn plain_text_filter() -> EtagFilter {
        EtagFilter::new(EtagOptions::new([SupportedMimeType::TextPlain]))
    }

    async fn respond(
        filter: &EtagFilter,
        request: &TestRequest,
        response: TestResponse,
    ) -> Outcome<TestResponse> {
        filter
            .apply(request, move || async move { Ok::<_, Infallible>(response) })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_non_get_never_invokes_next() {
        let filter = plain_text_filter();
        let calls = AtomicUsize::new(0);
        let counter = &calls;

        for method in ["POST", "PUT", "DELETE", "HEAD", "get"] {
            let request = TestRequest {
                method,
                if_none_match: None,
            };
            let outcome = filter
                .apply(&request, move || async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, Infallible>(TestResponse::ok("text/plain", "Hello world!"))
                })
                .await
                .unwrap();
            assert!(matches!(outcome, Outcome::Skipped));
            assert!(outcome.into_response().is_none());
        }

        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_get_invokes_next_once() {
        let filter = plain_text_filter();
        let calls = AtomicUsize::new(0);
        let counter = &calls;

        filter
            .apply(&TestRequest::get(), move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, Infallible>(TestResponse::ok("text/plain", "Hello world!"))
            })
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unsupported_content_type_untouched() {
        let filter = plain_text_filter();
        let outcome = respond(
            &filter,
            &TestRequest::get(),
            TestResponse::ok("text/css", ".red{color: red;}"),
        )
        .await;

        assert_eq!(outcome.kind(), "pass_through");
        let response = outcome.into_response().unwrap();
        assert!(response.header(ETAG).is_none());
    }

    #[tokio::test]
    async fn test_missing_content_type_untouched() {
        let filter = plain_text_filter();
        let mut response = TestResponse::ok("text/plain", "Hello world!");
        response.headers.clear();

        let outcome = respond(&filter, &TestRequest::get(), response).await;
        assert!(matches!(outcome, Outcome::PassThrough(ref r) if r.header(ETAG).is_none()));
    }

    #[tokio::test]
    async fn test_missing_body_untouched() {
        let filter = plain_text_filter();
        let mut response = TestResponse::ok("text/plain", "");
        response.body = None;

        let outcome = respond(&filter, &TestRequest::get(), response).await;
        assert!(matches!(outcome, Outcome::PassThrough(_)));
    }

    #[tokio::test]
    async fn test_first_hit_tags_response() {
        let filter = plain_text_filter();
        let outcome = respond(
            &filter,
            &TestRequest::get(),
            TestResponse::ok("text/plain", "Hello world!"),
        )
        .await;

        assert!(outcome.replacement().is_none());
        let response = outcome.into_response().unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(
            response.header(ETAG),
            Some(fingerprint(b"Hello world!").as_str())
        );
        assert_eq!(response.body.as_deref(), Some(&b"Hello world!"[..]));
    }

    #[tokio::test]
    async fn test_matching_validator_returns_not_modified() {
        let filter = plain_text_filter();
        let validator = fingerprint(b"Hello world!").into_string();
        let request = TestRequest::get().with_validator(validator.clone());

        let outcome = respond(
            &filter,
            &request,
            TestResponse::ok("text/plain", "Hello world!"),
        )
        .await;

        let replacement = outcome.replacement().unwrap();
        assert_eq!(replacement.status(), 304);
        assert!(replacement.body.is_none());
        assert_eq!(replacement.header(CONTENT_TYPE), Some("text/plain"));
        assert_eq!(replacement.header(ETAG), Some(validator.as_str()));
    }

    #[tokio::test]
    async fn test_unrelated_validator_retags() {
        let filter = plain_text_filter();
        let request = TestRequest::get().with_validator("not-a-fingerprint");

        let outcome = respond(
            &filter,
            &request,
            TestResponse::ok("text/plain", "Hello world!"),
        )
        .await;

        assert!(matches!(outcome, Outcome::Tagged(_)));
        assert_eq!(
            outcome.response().and_then(|r| r.header(ETAG)),
            Some(fingerprint(b"Hello world!").as_str())
        );
    }

    #[tokio::test]
    async fn test_round_trip_is_stable() {
        let filter = plain_text_filter();
        let first = respond(
            &filter,
            &TestRequest::get(),
            TestResponse::ok("application/json", "{}"),
        )
        .await;
        // application/json is not enabled on this filter
        assert!(matches!(first, Outcome::PassThrough(_)));

        let first = respond(
            &filter,
            &TestRequest::get(),
            TestResponse::ok("text/plain; charset=utf-8", "payload"),
        )
        .await;
        let etag = first
            .response()
            .and_then(|r| r.header(ETAG))
            .unwrap()
            .to_string();

        for _ in 0..3 {
            let request = TestRequest::get().with_validator(etag.clone());
            let outcome = respond(
                &filter,
                &request,
                TestResponse::ok("text/plain; charset=utf-8", "payload"),
            )
            .await;
            assert!(outcome.is_not_modified());
        }
    }

    #[tokio::test]
    async fn test_empty_stream_untouched() {
        // Reports a body up front but yields no bytes when read
        struct EmptyStream(TestResponse);

        impl CacheableResponse for EmptyStream {
            type Bytes = Vec<u8>;

            fn status(&self) -> u16 {
                self.0.status
            }

            fn header(&self, name: &str) -> Option<&str> {
                self.0.header(name)
            }

            fn set_header(&mut self, name: &str, value: &str) -> Result<()> {
                self.0.set_header(name, value)
            }

            fn has_body(&self) -> bool {
                true
            }

            fn buffered_body(&mut self) -> impl Future<Output = Result<Vec<u8>>> + Send {
                std::future::ready(Ok(Vec::new()))
            }

            fn not_modified(&self) -> Self {
                Self(self.0.not_modified())
            }
        }

        let filter = plain_text_filter();
        let response = EmptyStream(TestResponse::ok("text/plain", ""));
        let outcome = filter
            .apply(&TestRequest::get(), move || async move {
                Ok::<_, Infallible>(response)
            })
            .await
            .unwrap();

        let response = match outcome {
            Outcome::PassThrough(response) => response,
            other => panic!("expected pass-through, got {}", other.kind()),
        };
        assert!(response.header(ETAG).is_none());
    }

    #[tokio::test]
    async fn test_body_read_failure_propagates() {
        let filter = plain_text_filter();
        let mut response = TestResponse::ok("text/plain", "Hello world!");
        response.fail_read = true;

        let result = filter
            .apply(&TestRequest::get(), move || async move {
                Ok::<_, Infallible>(response)
            })
            .await;
        assert!(matches!(result, Err(EtagError::Body(_))));
    }

    #[tokio::test]
    async fn test_upstream_failure_propagates() {
        let filter = plain_text_filter();
        let result = filter
            .apply(&TestRequest::get(), || async {
                Err::<TestResponse, _>(std::io::Error::other("handler crashed"))
            })
            .await;
        assert!(matches!(result, Err(EtagError::Upstream(_))));
    }

    #[test]
    fn test_content_type_matching() {
        let filter = EtagFilter::new(EtagOptions::new([
            SupportedMimeType::ApplicationJson,
            SupportedMimeType::TextHtml,
        ]));

        assert!(filter.is_cacheable_content_type("application/json"));
        assert!(filter.is_cacheable_content_type("application/json; charset=utf-8"));
        assert!(filter.is_cacheable_content_type("text/html;charset=utf-8"));
        assert!(filter.is_cacheable_content_type(" text/html "));
        assert!(!filter.is_cacheable_content_type("Application/JSON"));
        assert!(!filter.is_cacheable_content_type("text/plain"));
        assert!(!filter.is_cacheable_content_type(""));
    }

    #[test]
    fn test_filter_is_shareable() {
        fn assert_send_sync<T: Send + Sync + Clone>() {}
        assert_send_sync::<EtagFilter>();
    }

    #[test]
    fn test_blocking_caller() {
        let filter = EtagFilter::default();
        let outcome = tokio_test::block_on(respond(
            &filter,
            &TestRequest::get(),
            TestResponse::ok("text/csv", "a,b\n1,2\n"),
        ));
        assert!(matches!(outcome, Outcome::Tagged(_)));
    }
}
