use crate::error::BoxError;
use async_trait::async_trait;
use axum::{body::Body, http::Request, response::Response};
use std::future::Future;
use std::pin::Pin;

/// standard return type for Interceptors
pub type InterceptorResult = Result<Response, InterceptorError>;

/// A type-erased error for interceptors
pub type InterceptorError = BoxError;

/// Boxed future produced by the rest of the chain
pub type NextFuture = Pin<Box<dyn Future<Output = InterceptorResult> + Send>>;

/// Represents the next handler in the chain
pub struct Next {
    pub(crate) run: Box<dyn FnOnce(Request<Body>) -> NextFuture + Send>,
}

impl Next {
    /// Create a new Next handler
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce(Request<Body>) -> NextFuture + Send + 'static,
    {
        Self { run: Box::new(f) }
    }

    /// Execute the next handler
    pub async fn run(self, request: Request<Body>) -> InterceptorResult {
        (self.run)(request).await
    }
}

/// The Interceptor trait
///
/// Interceptors can inspect the request before it reaches the handler,
/// and inspect/modify the response (or the error) after the handler returns.
///
/// # Example
/// ```
/// use exception_filter::interceptor::{Interceptor, InterceptorResult, Next};
/// use exception_filter::async_trait;
/// use axum::{body::Body, http::Request};
///
/// struct Passthrough;
///
/// #[async_trait]
/// impl Interceptor for Passthrough {
///     async fn intercept(&self, req: Request<Body>, next: Next) -> InterceptorResult {
///         next.run(req).await
///     }
/// }
/// ```
#[async_trait]
pub trait Interceptor: Send + Sync + 'static {
    async fn intercept(&self, request: Request<Body>, next: Next) -> InterceptorResult;
}
