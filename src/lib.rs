//! # exception-filter
//!
//! A catch-all exception filter for axum and tower services.
//!
//! Whatever goes wrong downstream (an `Err` from an inner service, an
//! [`HttpException`](exception::HttpException) carrying its own status, or a
//! panic in a handler), the client gets a well-formed response back.
//!
//! ## Features
//!
//! - **Status mapping**: errors carrying a status keep it; the rest fall back
//!   to a configurable default, then 500
//! - **Error bodies**: the error message, a closure, or a ready-made JSON
//!   envelope ([`HttpExceptionFilter`](exception::HttpExceptionFilter))
//! - **404 formatting**: empty 404 responses receive a body
//! - **Response time**: optional `x-response-time` header
//! - **Request filter**: a predicate to skip processing for some requests
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use exception_filter::prelude::*;
//!
//! async fn boom() -> &'static str {
//!     panic!("500");
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let app: Router = Router::new()
//!         .route("/", axum::routing::get(boom))
//!         .layer(ExceptionFilterLayer::new(
//!             ExceptionOptions::new()
//!                 .header_response_time(true)
//!                 .message_of_404("nothing here"),
//!         ));
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
//!     axum::serve(listener, app).await.unwrap();
//! }
//! ```

pub mod config;
pub mod error;
pub mod exception;
pub mod interceptor;
pub mod logger;

// Re-export core types
pub use error::{BoxError, ExceptionError, Result};
pub use exception::{
    AnyExceptionFilter, ExceptionBody, ExceptionFilterLayer, ExceptionOptions, HttpException,
    any_exception_filter, not_found_message,
};

// Re-export commonly used types from dependencies
pub use async_trait::async_trait;
pub use axum;

/// Prelude module for convenient imports
///
/// ```
/// use exception_filter::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{ConfigService, ExceptionConfig};
    pub use crate::error::{BoxError, ExceptionError, Result};
    pub use crate::exception::{
        AnyExceptionFilter, ExceptionBody, ExceptionContext, ExceptionFilter,
        ExceptionFilterLayer, ExceptionFilterService, ExceptionOptions, HttpException,
        HttpExceptionFilter, RESPONSE_TIME_HEADER, RequestHead, any_exception_filter,
        not_found_message, status_of,
    };
    pub use crate::interceptor::{Interceptor, InterceptorResult, Next};
    pub use crate::logger::{Logger, TracingLogger};
    pub use async_trait::async_trait;
    pub use axum::{
        Json, Router,
        http::StatusCode,
        response::{IntoResponse, Response},
    };
    pub use std::sync::Arc;
}
