use axum::{
    Json,
    body::HttpBody,
    http::header,
    response::{IntoResponse, Response},
};
use serde_json::Value;

/// Body written when a 404 reaches the filter without one
pub const NOT_FOUND_MESSAGE: &str = "Not Found";

/// Body written when an error carries no message of its own
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal Server Error";

/// The default body for an empty 404 response.
pub fn not_found_message() -> &'static str {
    NOT_FOUND_MESSAGE
}

/// A body produced by the filter or one of its callbacks.
#[derive(Clone, Debug, PartialEq)]
pub enum ExceptionBody {
    /// Sent as `text/plain; charset=utf-8`
    Text(String),
    /// Sent as `application/json`
    Json(Value),
}

impl ExceptionBody {
    pub fn text(message: impl Into<String>) -> Self {
        Self::Text(message.into())
    }
}

impl From<&str> for ExceptionBody {
    fn from(message: &str) -> Self {
        Self::Text(message.to_string())
    }
}

impl From<String> for ExceptionBody {
    fn from(message: String) -> Self {
        Self::Text(message)
    }
}

impl From<Value> for ExceptionBody {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

impl IntoResponse for ExceptionBody {
    fn into_response(self) -> Response {
        match self {
            ExceptionBody::Text(text) => text.into_response(),
            ExceptionBody::Json(value) => Json(value).into_response(),
        }
    }
}

/// True when the response body is known to hold no bytes.
///
/// Streaming bodies without an exact size hint count as non-empty.
pub(crate) fn is_body_empty(response: &Response) -> bool {
    response.body().size_hint().exact() == Some(0)
}

/// Swap the body of `response`, keeping its status and unrelated headers.
pub(crate) fn replace_body(response: Response, body: ExceptionBody) -> Response {
    let (mut parts, _) = response.into_parts();
    let (fresh, new_body) = body.into_response().into_parts();

    parts.headers.remove(header::CONTENT_LENGTH);
    if let Some(content_type) = fresh.headers.get(header::CONTENT_TYPE) {
        parts
            .headers
            .insert(header::CONTENT_TYPE, content_type.clone());
    }

    Response::from_parts(parts, new_body)
}
