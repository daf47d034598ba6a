//! Logging seam for the exception filter.
//!
//! The filter never writes to stdout directly; every line goes through a
//! [`Logger`]. The default, [`TracingLogger`], forwards to `tracing` so the
//! host application's subscriber decides where lines end up.

/// Sink for the lines the exception filter emits.
pub trait Logger: Send + Sync + 'static {
    fn error(&self, message: &str);
    fn warn(&self, message: &str);
    fn info(&self, message: &str);
    fn debug(&self, message: &str);
}

/// Forwards every line to the matching `tracing` macro.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn error(&self, message: &str) {
        tracing::error!(target: "exception_filter", "{}", message);
    }

    fn warn(&self, message: &str) {
        tracing::warn!(target: "exception_filter", "{}", message);
    }

    fn info(&self, message: &str) {
        tracing::info!(target: "exception_filter", "{}", message);
    }

    fn debug(&self, message: &str) {
        tracing::debug!(target: "exception_filter", "{}", message);
    }
}
