use crate::exception::{ExceptionBody, ExceptionContext, ExceptionFilter};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::error::Error;
use thiserror::Error;

/// An error that carries the HTTP status it should be answered with.
///
/// Return it (or wrap it as the source of your own error) from anywhere
/// downstream of the filter and the response status will match.
///
/// Inside an axum handler, returning `Err(HttpException)` produces a response
/// that still carries the exception in its extensions, so an outer
/// [`AnyExceptionFilter`](crate::exception::AnyExceptionFilter) treats it as
/// an error rather than as a finished response.
#[derive(Clone, Debug, Error)]
#[error("{message}")]
pub struct HttpException {
    status: StatusCode,
    message: String,
}

impl HttpException {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl IntoResponse for HttpException {
    fn into_response(self) -> Response {
        let mut response = (self.status, self.message.clone()).into_response();
        response.extensions_mut().insert(self);
        response
    }
}

/// Find the status carried by `error` or by anything in its source chain.
pub fn status_of(error: &(dyn Error + 'static)) -> Option<StatusCode> {
    let mut current = Some(error);
    while let Some(err) = current {
        if let Some(exception) = err.downcast_ref::<HttpException>() {
            return Some(exception.status());
        }
        current = err.source();
    }
    None
}

/// An exception filter that renders errors as a JSON envelope
#[derive(Clone, Copy, Debug, Default)]
pub struct HttpExceptionFilter;

impl ExceptionFilter for HttpExceptionFilter {
    fn catch(&self, exception: &ExceptionContext<'_>) -> ExceptionBody {
        let message = exception.error.to_string();
        let message = if message.is_empty() {
            exception
                .status
                .canonical_reason()
                .unwrap_or("Unknown Error")
                .to_string()
        } else {
            message
        };

        ExceptionBody::Json(json!({
            "statusCode": exception.status.as_u16(),
            "message": message,
            "path": exception.request.uri.path(),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        }))
    }
}
