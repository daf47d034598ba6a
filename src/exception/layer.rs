use crate::error::BoxError;
use crate::exception::{AnyExceptionFilter, ExceptionOptions};
use crate::interceptor::Next;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
};
use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tower::{Layer, Service};

/// Tower Layer applying an [`AnyExceptionFilter`] to every request
///
/// ```rust,no_run
/// use exception_filter::prelude::*;
///
/// let app: Router = Router::new()
///     .route("/", axum::routing::get(|| async { "hello" }))
///     .layer(ExceptionFilterLayer::new(
///         ExceptionOptions::new().header_response_time(true),
///     ));
/// ```
#[derive(Clone, Debug, Default)]
pub struct ExceptionFilterLayer {
    filter: AnyExceptionFilter,
}

impl ExceptionFilterLayer {
    pub fn new(options: ExceptionOptions) -> Self {
        Self::from_filter(AnyExceptionFilter::new(options))
    }

    pub fn from_filter(filter: AnyExceptionFilter) -> Self {
        Self { filter }
    }
}

impl<S> Layer<S> for ExceptionFilterLayer {
    type Service = ExceptionFilterService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ExceptionFilterService {
            inner,
            filter: self.filter.clone(),
            not_ready: None,
        }
    }
}

#[derive(Debug)]
pub struct ExceptionFilterService<S> {
    inner: S,
    filter: AnyExceptionFilter,
    /// Readiness error of `inner`, answered on the next `call`.
    not_ready: Option<BoxError>,
}

impl<S: Clone> Clone for ExceptionFilterService<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            filter: self.filter.clone(),
            not_ready: None,
        }
    }
}

impl<S> Service<Request<Body>> for ExceptionFilterService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Into<BoxError> + Send,
{
    type Response = Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        if self.not_ready.is_some() {
            return Poll::Ready(Ok(()));
        }
        match self.inner.poll_ready(cx) {
            Poll::Ready(Ok(())) => Poll::Ready(Ok(())),
            // `inner` must not be called; the error is answered by the filter instead.
            Poll::Ready(Err(error)) => {
                self.not_ready = Some(error.into());
                Poll::Ready(Ok(()))
            }
            Poll::Pending => Poll::Pending,
        }
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        let filter = self.filter.clone();

        let next = match self.not_ready.take() {
            Some(error) => {
                Next::new(move |_| Box::pin(async move { Err::<Response, BoxError>(error) }))
            }
            None => {
                // Take the service that was driven to readiness, leave a clone behind.
                let clone = self.inner.clone();
                let mut inner = std::mem::replace(&mut self.inner, clone);
                Next::new(move |req| {
                    Box::pin(async move { inner.call(req).await.map_err(Into::<BoxError>::into) })
                })
            }
        };

        Box::pin(async move {
            match filter.process(request, next).await {
                Ok(response) => Ok(response),
                Err(error) => {
                    // Only requests skipped by the filter predicate end up here.
                    tracing::debug!(error = %error, "unfiltered request failed downstream");
                    Ok(StatusCode::INTERNAL_SERVER_ERROR.into_response())
                }
            }
        })
    }
}
