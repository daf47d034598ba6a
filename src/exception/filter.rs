//! The catch-all exception filter.
//!
//! Wraps the rest of the chain and guarantees a response comes back:
//!
//! ```text
//! request ──► filter predicate? ── yes ──► next (untouched)
//!                   │ no
//!                   ▼
//!             next (panics caught)
//!        ┌──────────┴───────────┐
//!     Ok(response)          Err(error) / panic
//!   empty 404 → body      status + body from error
//!   HttpException response ──────────►
//!        └──────────┬───────────┘
//!                   ▼
//!        x-response-time (optional)
//! ```

use crate::error::{BoxError, ExceptionError};
use crate::exception::body::{self, INTERNAL_ERROR_MESSAGE};
use crate::exception::options::ExceptionOptions;
use crate::exception::{
    ExceptionBody, ExceptionContext, ExceptionFilterLayer, HttpException, RequestHead,
    not_found_message, status_of,
};
use crate::interceptor::{Interceptor, InterceptorResult, Next};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{HeaderValue, Request, StatusCode},
    response::{IntoResponse, Response},
};
use futures_util::FutureExt;
use std::error::Error;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

/// Header carrying the time spent downstream, e.g. `x-response-time: 12ms`
pub const RESPONSE_TIME_HEADER: &str = "x-response-time";

/// Middleware that turns every downstream error into an HTTP response.
///
/// Cheap to clone; the options are shared behind an `Arc`.
#[derive(Clone, Debug)]
pub struct AnyExceptionFilter {
    options: Arc<ExceptionOptions>,
}

/// Build an [`AnyExceptionFilter`] from `options`.
pub fn any_exception_filter(options: ExceptionOptions) -> AnyExceptionFilter {
    AnyExceptionFilter::new(options)
}

impl Default for AnyExceptionFilter {
    fn default() -> Self {
        Self::new(ExceptionOptions::default())
    }
}

impl AnyExceptionFilter {
    pub fn new(options: ExceptionOptions) -> Self {
        Self {
            options: Arc::new(options),
        }
    }

    pub fn options(&self) -> &ExceptionOptions {
        &self.options
    }

    /// Tower layer applying this filter to an inner service.
    pub fn layer(&self) -> ExceptionFilterLayer {
        ExceptionFilterLayer::from_filter(self.clone())
    }

    /// Run `next` and convert its outcome.
    ///
    /// Only returns `Err` for requests excluded by the filter predicate, whose
    /// outcome is passed through as-is.
    pub async fn process(&self, request: Request<Body>, next: Next) -> InterceptorResult {
        let head = RequestHead::from_request(&request);
        if let Some(filter) = &self.options.filter {
            if filter(&head) {
                return next.run(request).await;
            }
        }

        let start = Instant::now();
        let outcome = if self.options.catch_panic {
            match AssertUnwindSafe(next.run(request)).catch_unwind().await {
                Ok(outcome) => outcome,
                Err(payload) => Err(Box::new(ExceptionError::from_panic(payload)) as BoxError),
            }
        } else {
            next.run(request).await
        };

        let mut response = match outcome {
            // A handler that returned `Err(HttpException)` already became a response.
            Ok(mut response) => match response.extensions_mut().remove::<HttpException>() {
                Some(exception) => self.handle_error(Box::new(exception), &head),
                None => self.format_response(response, &head),
            },
            Err(error) => self.handle_error(error, &head),
        };

        if self.options.header_response_time {
            let elapsed = start.elapsed().as_millis();
            if let Ok(value) = HeaderValue::from_str(&format!("{elapsed}ms")) {
                response.headers_mut().insert(RESPONSE_TIME_HEADER, value);
            }
            self.options.logger.debug(&format!(
                "{} {} {} - {}ms",
                head.method,
                head.uri,
                response.status().as_u16(),
                elapsed
            ));
        }

        Ok(response)
    }

    fn format_response(&self, response: Response, head: &RequestHead) -> Response {
        if response.status() != StatusCode::NOT_FOUND
            || self.options.disable_format_404
            || !body::is_body_empty(&response)
        {
            return response;
        }

        self.options
            .logger
            .warn(&format!("{} {} 404 not found", head.method, head.uri));

        let not_found = if let Some(make_body) = &self.options.not_found_body {
            make_body(head)
        } else if let Some(message) = &self.options.message_of_404 {
            ExceptionBody::Text(message.clone())
        } else {
            ExceptionBody::text(not_found_message())
        };

        body::replace_body(response, not_found)
    }

    fn handle_error(&self, error: BoxError, head: &RequestHead) -> Response {
        let status = status_of(error.as_ref())
            .or(self.options.default_error_status)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let detail = if self.options.log_complete_error {
            complete_error(error.as_ref())
        } else {
            error.to_string()
        };
        self.options.logger.error(&format!(
            "{} {} {} - {}",
            head.method,
            head.uri,
            status.as_u16(),
            detail
        ));

        let body = match &self.options.error_filter {
            Some(filter) => filter.catch(&ExceptionContext {
                error: error.as_ref(),
                status,
                request: head,
            }),
            None => {
                let message = error.to_string();
                if message.is_empty() {
                    ExceptionBody::text(INTERNAL_ERROR_MESSAGE)
                } else {
                    ExceptionBody::Text(message)
                }
            }
        };

        (status, body).into_response()
    }
}

#[async_trait]
impl Interceptor for AnyExceptionFilter {
    async fn intercept(&self, request: Request<Body>, next: Next) -> InterceptorResult {
        self.process(request, next).await
    }
}

/// Debug form of `error` followed by every message in its source chain.
fn complete_error(error: &(dyn Error + 'static)) -> String {
    let mut out = format!("{error:?}");
    let mut source = error.source();
    while let Some(cause) = source {
        out.push_str("\n  caused by: ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::Logger;
    use axum::body::to_bytes;
    use std::sync::Mutex;
    use std::time::Duration;
    use thiserror::Error;

    #[derive(Default)]
    struct RecordingLogger {
        lines: Mutex<Vec<(&'static str, String)>>,
    }

    impl Logger for Arc<RecordingLogger> {
        fn error(&self, message: &str) {
            self.lines.lock().unwrap().push(("error", message.to_string()));
        }
        fn warn(&self, message: &str) {
            self.lines.lock().unwrap().push(("warn", message.to_string()));
        }
        fn info(&self, message: &str) {
            self.lines.lock().unwrap().push(("info", message.to_string()));
        }
        fn debug(&self, message: &str) {
            self.lines.lock().unwrap().push(("debug", message.to_string()));
        }
    }

    #[derive(Debug, Error)]
    #[error("")]
    struct Silent;

    #[derive(Debug, Error)]
    #[error("query failed")]
    struct QueryError {
        #[source]
        source: std::io::Error,
    }

    fn request(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    fn respond(status: StatusCode, body: &'static str) -> Next {
        Next::new(move |_| Box::pin(async move { Ok::<_, BoxError>((status, body).into_response()) }))
    }

    fn reject<E>(error: E) -> Next
    where
        E: Error + Send + Sync + 'static,
    {
        Next::new(move |_| Box::pin(async move { Err::<Response, BoxError>(Box::new(error)) }))
    }

    async fn text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_empty_error_message_falls_back() {
        let response = AnyExceptionFilter::default()
            .process(request("GET", "/"), reject(Silent))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(text(response).await, "Internal Server Error");
    }

    #[tokio::test]
    async fn test_error_is_logged_with_request_line() {
        let logger = Arc::new(RecordingLogger::default());
        let filter = AnyExceptionFilter::new(ExceptionOptions::new().logger(logger.clone()));

        filter
            .process(
                request("POST", "/users"),
                reject(HttpException::bad_request("name is required")),
            )
            .await
            .unwrap();

        let lines = logger.lines.lock().unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].0, "error");
        assert_eq!(lines[0].1, "POST /users 400 - name is required");
    }

    #[tokio::test]
    async fn test_complete_error_includes_source_chain() {
        let logger = Arc::new(RecordingLogger::default());
        let filter = AnyExceptionFilter::new(
            ExceptionOptions::new()
                .logger(logger.clone())
                .log_complete_error(true),
        );

        let error = QueryError {
            source: std::io::Error::other("connection reset"),
        };
        filter
            .process(request("GET", "/orders"), reject(error))
            .await
            .unwrap();

        let lines = logger.lines.lock().unwrap();
        assert!(lines[0].1.contains("QueryError"));
        assert!(lines[0].1.contains("caused by: connection reset"));
    }

    #[tokio::test]
    async fn test_formatted_404_is_logged_as_warning() {
        let logger = Arc::new(RecordingLogger::default());
        let filter = AnyExceptionFilter::new(ExceptionOptions::new().logger(logger.clone()));

        filter
            .process(request("GET", "/missing"), respond(StatusCode::NOT_FOUND, ""))
            .await
            .unwrap();

        let lines = logger.lines.lock().unwrap();
        assert_eq!(lines[0], ("warn", "GET /missing 404 not found".to_string()));
    }

    fn panicking(message: &'static str) -> Next {
        Next::new(move |_| {
            Box::pin(async move {
                if !message.is_empty() {
                    panic!("{message}");
                }
                Ok::<_, BoxError>(StatusCode::OK.into_response())
            })
        })
    }

    #[tokio::test]
    async fn test_panic_becomes_500() {
        let response = AnyExceptionFilter::default()
            .process(request("GET", "/"), panicking("handler exploded"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(text(response).await, "Handler panicked: handler exploded");
    }

    #[tokio::test]
    #[should_panic(expected = "handler exploded")]
    async fn test_panic_propagates_when_not_caught() {
        let filter = AnyExceptionFilter::new(ExceptionOptions::new().catch_panic(false));
        let _ = filter
            .process(request("GET", "/"), panicking("handler exploded"))
            .await;
    }

    #[tokio::test]
    async fn test_error_handled_when_panics_not_caught() {
        let filter = AnyExceptionFilter::new(ExceptionOptions::new().catch_panic(false));

        let response = filter
            .process(request("GET", "/"), reject(HttpException::forbidden("no access")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(text(response).await, "no access");
    }

    #[tokio::test]
    async fn test_http_exception_response_takes_error_path() {
        let logger = Arc::new(RecordingLogger::default());
        let filter = AnyExceptionFilter::new(
            ExceptionOptions::new()
                .logger(logger.clone())
                .error_body(|exception| {
                    format!("[{}] {}", exception.status.as_u16(), exception.error)
                }),
        );
        let next = Next::new(|_| {
            Box::pin(async {
                let exception = HttpException::new(StatusCode::IM_A_TEAPOT, "short and stout");
                Ok::<_, BoxError>(exception.into_response())
            })
        });

        let response = filter.process(request("GET", "/teapot"), next).await.unwrap();
        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
        assert!(response.extensions().get::<HttpException>().is_none());
        assert_eq!(text(response).await, "[418] short and stout");

        let lines = logger.lines.lock().unwrap();
        assert_eq!(lines[0], ("error", "GET /teapot 418 - short and stout".to_string()));
    }

    #[tokio::test]
    async fn test_panic_uses_default_status() {
        let next = panicking("boom");
        let filter = AnyExceptionFilter::new(
            ExceptionOptions::new().default_error_status(StatusCode::SERVICE_UNAVAILABLE),
        );

        let response = filter.process(request("GET", "/"), next).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_filtered_request_passes_error_through() {
        let filter =
            AnyExceptionFilter::new(ExceptionOptions::new().filter(|req| req.uri.path() == "/raw"));

        let outcome = filter
            .process(request("GET", "/raw"), reject(HttpException::internal("raw")))
            .await;
        assert_eq!(outcome.unwrap_err().to_string(), "raw");
    }

    #[tokio::test]
    async fn test_response_time_on_error_path() {
        let next = Next::new(|_| {
            Box::pin(async {
                tokio::time::sleep(Duration::from_millis(20)).await;
                Err::<Response, BoxError>(Box::new(HttpException::bad_request("late")))
            })
        });
        let filter = AnyExceptionFilter::new(ExceptionOptions::new().header_response_time(true));

        let response = filter.process(request("GET", "/"), next).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let value = response.headers()[RESPONSE_TIME_HEADER].to_str().unwrap();
        let millis: u128 = value.trim_end_matches("ms").parse().unwrap();
        assert!(millis >= 20);
    }

    #[tokio::test]
    async fn test_not_found_body_beats_message() {
        let filter = AnyExceptionFilter::new(
            ExceptionOptions::new()
                .message_of_404("message")
                .not_found_body(|req: &RequestHead| format!("no route for {}", req.uri.path())),
        );

        let response = filter
            .process(request("GET", "/a/b"), respond(StatusCode::NOT_FOUND, ""))
            .await
            .unwrap();
        assert_eq!(text(response).await, "no route for /a/b");
    }
}
