use crate::config::ExceptionConfig;
use crate::error::{ExceptionError, Result};
use crate::exception::{ExceptionBody, ExceptionContext, ExceptionFilter, RequestHead};
use crate::logger::{Logger, TracingLogger};
use axum::http::StatusCode;
use std::fmt;
use std::sync::Arc;

pub(crate) type RequestPredicate = Arc<dyn Fn(&RequestHead) -> bool + Send + Sync>;
pub(crate) type NotFoundBody = Arc<dyn Fn(&RequestHead) -> ExceptionBody + Send + Sync>;

/// Configuration for [`AnyExceptionFilter`](crate::exception::AnyExceptionFilter).
///
/// Every field is optional; `ExceptionOptions::default()` catches errors,
/// formats empty 404s, and logs through `tracing`.
///
/// ```
/// use exception_filter::prelude::*;
///
/// let options = ExceptionOptions::new()
///     .header_response_time(true)
///     .message_of_404("nothing here")
///     .default_error_status(StatusCode::BAD_REQUEST)
///     .filter(|req| req.uri.path() == "/healthz");
/// ```
#[derive(Clone)]
pub struct ExceptionOptions {
    pub(crate) logger: Arc<dyn Logger>,
    pub(crate) header_response_time: bool,
    pub(crate) disable_format_404: bool,
    pub(crate) log_complete_error: bool,
    pub(crate) catch_panic: bool,
    pub(crate) filter: Option<RequestPredicate>,
    pub(crate) not_found_body: Option<NotFoundBody>,
    pub(crate) message_of_404: Option<String>,
    pub(crate) error_filter: Option<Arc<dyn ExceptionFilter>>,
    pub(crate) default_error_status: Option<StatusCode>,
}

impl Default for ExceptionOptions {
    fn default() -> Self {
        Self {
            logger: Arc::new(TracingLogger),
            header_response_time: false,
            disable_format_404: false,
            log_complete_error: false,
            catch_panic: true,
            filter: None,
            not_found_body: None,
            message_of_404: None,
            error_filter: None,
            default_error_status: None,
        }
    }
}

impl ExceptionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build options from plain settings, validating the default status.
    pub fn from_config(config: ExceptionConfig) -> Result<Self> {
        let default_error_status = match config.default_error_status {
            Some(code) => Some(error_status(code)?),
            None => None,
        };

        Ok(Self {
            header_response_time: config.header_response_time,
            disable_format_404: config.disable_format_404,
            log_complete_error: config.log_complete_error,
            catch_panic: config.catch_panic,
            message_of_404: config.message_of_404,
            default_error_status,
            ..Self::default()
        })
    }

    pub fn logger(mut self, logger: impl Logger) -> Self {
        self.logger = Arc::new(logger);
        self
    }

    /// Set `x-response-time` on every processed response
    pub fn header_response_time(mut self, enabled: bool) -> Self {
        self.header_response_time = enabled;
        self
    }

    /// Leave empty 404 responses untouched
    pub fn disable_format_404(mut self, disabled: bool) -> Self {
        self.disable_format_404 = disabled;
        self
    }

    /// Log the full error (debug form and source chain) instead of its message
    pub fn log_complete_error(mut self, enabled: bool) -> Self {
        self.log_complete_error = enabled;
        self
    }

    /// Turn downstream panics into error responses
    pub fn catch_panic(mut self, enabled: bool) -> Self {
        self.catch_panic = enabled;
        self
    }

    /// Skip all processing for requests the predicate returns `true` for.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&RequestHead) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Arc::new(predicate));
        self
    }

    /// Compute the body of empty 404 responses. Takes precedence over
    /// [`message_of_404`](Self::message_of_404).
    pub fn not_found_body<F, B>(mut self, make_body: F) -> Self
    where
        F: Fn(&RequestHead) -> B + Send + Sync + 'static,
        B: Into<ExceptionBody>,
    {
        let body: NotFoundBody = Arc::new(move |request: &RequestHead| make_body(request).into());
        self.not_found_body = Some(body);
        self
    }

    pub fn message_of_404(mut self, message: impl Into<String>) -> Self {
        self.message_of_404 = Some(message.into());
        self
    }

    /// Compute the body of error responses from a closure.
    pub fn error_body<F, B>(mut self, make_body: F) -> Self
    where
        F: Fn(&ExceptionContext<'_>) -> B + Send + Sync + 'static,
        B: Into<ExceptionBody>,
    {
        let filter: Arc<dyn ExceptionFilter> =
            Arc::new(filter_fn(move |exception| make_body(exception).into()));
        self.error_filter = Some(filter);
        self
    }

    /// Render error responses with an [`ExceptionFilter`].
    pub fn error_filter(mut self, filter: impl ExceptionFilter) -> Self {
        self.error_filter = Some(Arc::new(filter));
        self
    }

    /// Status used for errors that carry none; 500 when unset.
    pub fn default_error_status(mut self, status: StatusCode) -> Self {
        self.default_error_status = Some(status);
        self
    }
}

impl fmt::Debug for ExceptionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExceptionOptions")
            .field("header_response_time", &self.header_response_time)
            .field("disable_format_404", &self.disable_format_404)
            .field("log_complete_error", &self.log_complete_error)
            .field("catch_panic", &self.catch_panic)
            .field("filter", &self.filter.is_some())
            .field("not_found_body", &self.not_found_body.is_some())
            .field("message_of_404", &self.message_of_404)
            .field("error_filter", &self.error_filter.is_some())
            .field("default_error_status", &self.default_error_status)
            .finish()
    }
}

// Pins the closure to the higher-ranked signature the blanket impl expects.
fn filter_fn<F>(f: F) -> F
where
    F: Fn(&ExceptionContext<'_>) -> ExceptionBody + Send + Sync + 'static,
{
    f
}

fn error_status(code: u16) -> Result<StatusCode> {
    let status = StatusCode::from_u16(code).map_err(|e| {
        ExceptionError::invalid_config("default_error_status", format!("{code}: {e}"))
    })?;
    if !(status.is_client_error() || status.is_server_error()) {
        return Err(ExceptionError::invalid_config(
            "default_error_status",
            format!("{code} is not an error status"),
        ));
    }
    Ok(status)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ExceptionOptions::default();
        assert!(!options.header_response_time);
        assert!(!options.disable_format_404);
        assert!(!options.log_complete_error);
        assert!(options.catch_panic);
        assert!(options.filter.is_none());
        assert!(options.default_error_status.is_none());
    }

    #[test]
    fn test_from_config() {
        let config = ExceptionConfig {
            header_response_time: true,
            message_of_404: Some("gone".to_string()),
            default_error_status: Some(400),
            ..ExceptionConfig::default()
        };
        let options = ExceptionOptions::from_config(config).unwrap();
        assert!(options.header_response_time);
        assert_eq!(options.message_of_404.as_deref(), Some("gone"));
        assert_eq!(options.default_error_status, Some(StatusCode::BAD_REQUEST));
    }

    #[test]
    fn test_from_config_rejects_non_error_status() {
        for code in [200, 302, 42, 1000] {
            let config = ExceptionConfig {
                default_error_status: Some(code),
                ..ExceptionConfig::default()
            };
            let err = ExceptionOptions::from_config(config).unwrap_err();
            assert!(matches!(err, ExceptionError::InvalidConfig { .. }), "{code}");
        }
    }
}
