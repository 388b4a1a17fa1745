//! [`ConditionalRequest`] and [`CacheableResponse`] for the `http` crate.
//!
//! Response bodies must be rebuildable from [`Bytes`]; `http_body_util::Full`
//! is the usual choice. Buffering collects the body and puts an equivalent
//! one back, so the response stays transmittable after fingerprinting.

use crate::error::{BoxError, EtagError, Result};
use crate::exchange::{CacheableResponse, ConditionalRequest};
use bytes::Bytes;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::{Request, Response, StatusCode};
use http_body::Body;
use http_body_util::BodyExt;
use std::future::Future;

fn lookup<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

impl<B> ConditionalRequest for Request<B> {
    fn method(&self) -> &str {
        Request::method(self).as_str()
    }

    fn header(&self, name: &str) -> Option<&str> {
        lookup(self.headers(), name)
    }
}

impl ConditionalRequest for http::request::Parts {
    fn method(&self) -> &str {
        self.method.as_str()
    }

    fn header(&self, name: &str) -> Option<&str> {
        lookup(&self.headers, name)
    }
}

impl<B> CacheableResponse for Response<B>
where
    B: Body<Data = Bytes> + From<Bytes> + Send,
    B::Error: Into<BoxError>,
{
    type Bytes = Bytes;

    fn status(&self) -> u16 {
        Response::status(self).as_u16()
    }

    fn header(&self, name: &str) -> Option<&str> {
        lookup(self.headers(), name)
    }

    fn set_header(&mut self, name: &str, value: &str) -> Result<()> {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| EtagError::invalid_header(name, e))?;
        let header_value =
            HeaderValue::from_str(value).map_err(|e| EtagError::invalid_header(name, e))?;
        self.headers_mut().insert(header_name, header_value);
        Ok(())
    }

    fn has_body(&self) -> bool {
        !self.body().is_end_stream()
    }

    fn buffered_body(&mut self) -> impl Future<Output = Result<Bytes>> + Send {
        let body = std::mem::replace(self.body_mut(), B::from(Bytes::new()));
        async move {
            let bytes = body
                .collect()
                .await
                .map_err(EtagError::body)?
                .to_bytes();
            *self.body_mut() = B::from(bytes.clone());
            Ok(bytes)
        }
    }

    fn not_modified(&self) -> Self {
        let mut response = Response::new(B::from(Bytes::new()));
        *response.status_mut() = StatusCode::NOT_MODIFIED;
        *response.version_mut() = self.version();
        *response.headers_mut() = self.headers().clone();
        response
    }
}
