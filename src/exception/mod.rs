use axum::http::{HeaderMap, Method, Request, StatusCode, Uri};
use std::error::Error;

pub mod body;
pub mod filter;
pub mod http;
pub mod layer;
pub mod options;

pub use body::{ExceptionBody, not_found_message};
pub use filter::{AnyExceptionFilter, RESPONSE_TIME_HEADER, any_exception_filter};
pub use http::{HttpException, HttpExceptionFilter, status_of};
pub use layer::{ExceptionFilterLayer, ExceptionFilterService};
pub use options::ExceptionOptions;

/// Snapshot of the incoming request, taken before the request moves downstream.
#[derive(Clone, Debug)]
pub struct RequestHead {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
}

impl RequestHead {
    pub fn from_request<B>(request: &Request<B>) -> Self {
        Self {
            method: request.method().clone(),
            uri: request.uri().clone(),
            headers: request.headers().clone(),
        }
    }
}

/// Everything an exception filter gets to look at when rendering an error.
pub struct ExceptionContext<'a> {
    /// The rejection raised downstream
    pub error: &'a (dyn Error + Send + Sync + 'static),
    /// The status the response will be sent with
    pub status: StatusCode,
    pub request: &'a RequestHead,
}

/// The ExceptionFilter trait
///
/// Filters render errors thrown during request processing into a body.
/// The status is already decided by the time a filter runs.
pub trait ExceptionFilter: Send + Sync + 'static {
    /// Catch an exception and return the response body
    fn catch(&self, exception: &ExceptionContext<'_>) -> ExceptionBody;
}

impl<F> ExceptionFilter for F
where
    F: Fn(&ExceptionContext<'_>) -> ExceptionBody + Send + Sync + 'static,
{
    fn catch(&self, exception: &ExceptionContext<'_>) -> ExceptionBody {
        self(exception)
    }
}
