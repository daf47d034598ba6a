//! Demo server: every route below fails in a different way.
//!
//! Run with:
//!   RUST_LOG=debug EXCEPTION_HEADER_RESPONSE_TIME=true cargo run --example server
//!
//! Try:
//!   curl -i http://localhost:3000/          # panic        -> 500
//!   curl -i http://localhost:3000/teapot    # HttpException -> 418
//!   curl -i http://localhost:3000/missing   # empty 404    -> formatted body

use axum::{Router, http::StatusCode, routing::get};
use exception_filter::prelude::*;
use tower_http::trace::TraceLayer;

async fn index() -> &'static str {
    panic!("500");
}

async fn teapot() -> std::result::Result<&'static str, HttpException> {
    Err(HttpException::new(StatusCode::IM_A_TEAPOT, "short and stout"))
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = ExceptionConfig::from_env().expect("Invalid EXCEPTION_* configuration");
    let options = ExceptionOptions::from_config(config)
        .expect("Invalid exception options")
        .error_filter(HttpExceptionFilter)
        .filter(|req| req.uri.path() == "/healthz");

    let router = Router::new()
        .route("/", get(index))
        .route("/teapot", get(teapot))
        .route("/healthz", get(|| async { "ok" }))
        .fallback(|| async { StatusCode::NOT_FOUND })
        .layer(ExceptionFilterLayer::new(options))
        .layer(TraceLayer::new_for_http());

    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("{}:{}", host, port);

    tracing::info!("app started with: http://127.0.0.1:{}", port);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, router).await.unwrap();
}
