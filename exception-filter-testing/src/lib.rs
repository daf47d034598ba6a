//! Helpers for exercising middleware without a running server.
//!
//! Build a request, hand the middleware a downstream continuation that
//! resolves or rejects after a delay, and read the response back.

use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
};
use std::error::Error;
use std::fmt;
use std::time::Duration;

pub type BoxError = Box<dyn Error + Send + Sync>;

/// A downstream failure carrying nothing but a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection(pub String);

impl Rejection {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Error for Rejection {}

pub fn request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("valid test request")
}

/// A response with `status` and no body.
pub fn empty_response(status: StatusCode) -> Response {
    status.into_response()
}

/// A response with `status` and a plain-text body.
pub fn text_response(status: StatusCode, body: &str) -> Response {
    (status, body.to_string()).into_response()
}

/// Resolve with `response` once `delay` has passed.
pub async fn resolve_after(delay: Duration, response: Response) -> Result<Response, BoxError> {
    tokio::time::sleep(delay).await;
    Ok(response)
}

/// Reject with `error` once `delay` has passed.
pub async fn reject_after<E>(delay: Duration, error: E) -> Result<Response, BoxError>
where
    E: Error + Send + Sync + 'static,
{
    tokio::time::sleep(delay).await;
    Err(Box::new(error))
}

/// Collect the body as UTF-8 text.
pub async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("readable body");
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

/// Leading integer of a header value such as `50ms`.
pub fn header_millis(response: &Response, name: &str) -> Option<u128> {
    let value = response.headers().get(name)?.to_str().ok()?;
    let digits: String = value.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().ok()
}
