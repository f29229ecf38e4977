//! Per-request context.
//!
//! Every request gets an id, taken from the `X-Request-Id` header when the
//! caller sends one and generated otherwise. The id is echoed back on the
//! response and available to handlers through the [`RequestContext`]
//! extractor.

use axum::async_trait;
use axum::extract::{FromRequestParts, Request};
use axum::http::request::Parts;
use axum::http::{HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use std::convert::Infallible;
use uuid::Uuid;

pub static REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

const MAX_REQUEST_ID_LEN: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub request_id: String,
}

impl RequestContext {
    fn generate() -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
        }
    }

    fn from_header(value: Option<&HeaderValue>) -> Self {
        value
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|id| !id.is_empty() && id.len() <= MAX_REQUEST_ID_LEN)
            .map(|id| Self {
                request_id: id.to_string(),
            })
            .unwrap_or_else(Self::generate)
    }
}

/// Middleware attaching a [`RequestContext`] and echoing its id.
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let ctx = RequestContext::from_header(req.headers().get(&REQUEST_ID_HEADER));
    let header = HeaderValue::from_str(&ctx.request_id).ok();
    tracing::debug!(request_id = %ctx.request_id, "{} {}", req.method(), req.uri());
    req.extensions_mut().insert(ctx);

    let mut response = next.run(req).await;
    if let Some(header) = header {
        response
            .headers_mut()
            .insert(REQUEST_ID_HEADER.clone(), header);
    }
    response
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .unwrap_or_else(RequestContext::generate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_value_used() {
        let value = HeaderValue::from_static("abc-123");
        let ctx = RequestContext::from_header(Some(&value));
        assert_eq!(ctx.request_id, "abc-123");
    }

    #[test]
    fn test_missing_header_generates_uuid() {
        let ctx = RequestContext::from_header(None);
        assert!(Uuid::parse_str(&ctx.request_id).is_ok());
    }

    #[test]
    fn test_blank_or_oversized_header_replaced() {
        let blank = HeaderValue::from_static("  ");
        assert!(Uuid::parse_str(&RequestContext::from_header(Some(&blank)).request_id).is_ok());

        let long = HeaderValue::from_str(&"x".repeat(MAX_REQUEST_ID_LEN + 1)).unwrap();
        assert!(Uuid::parse_str(&RequestContext::from_header(Some(&long)).request_id).is_ok());
    }
}
