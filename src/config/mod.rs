use crate::error::{ExceptionError, Result};
use dashmap::DashMap;
use serde::Deserialize;
use std::env;
use std::sync::Arc;

/// Prefix of every environment key the exception filter reads
pub const ENV_PREFIX: &str = "EXCEPTION_";

/// Configuration service
#[derive(Clone, Default)]
pub struct ConfigService {
    config: Arc<DashMap<String, String>>,
}

impl ConfigService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeded with every variable of the process environment
    pub fn from_env() -> Self {
        let service = Self::default();
        for (key, value) in env::vars() {
            service.set(&key, &value);
        }
        service
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.config.get(key).map(|v| v.clone())
    }

    pub fn set(&self, key: &str, value: &str) {
        self.config.insert(key.to_string(), value.to_string());
    }
}

/// Plain exception filter settings, loadable from env or JSON.
///
/// Callback options (logger, filter, body renderers) are not representable
/// here and are set on [`ExceptionOptions`](crate::exception::ExceptionOptions)
/// directly.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct ExceptionConfig {
    #[serde(alias = "isHeaderResponseTime")]
    pub header_response_time: bool,
    #[serde(alias = "isDisableFormat404")]
    pub disable_format_404: bool,
    #[serde(alias = "isLogCompleteError")]
    pub log_complete_error: bool,
    pub catch_panic: bool,
    pub message_of_404: Option<String>,
    pub default_error_status: Option<u16>,
}

impl Default for ExceptionConfig {
    fn default() -> Self {
        Self {
            header_response_time: false,
            disable_format_404: false,
            log_complete_error: false,
            catch_panic: true,
            message_of_404: None,
            default_error_status: None,
        }
    }
}

impl ExceptionConfig {
    /// Read the `EXCEPTION_*` keys; missing keys keep their defaults.
    pub fn from_service(service: &ConfigService) -> Result<Self> {
        let mut config = Self::default();
        let key = |name: &str| format!("{ENV_PREFIX}{name}");

        if let Some(value) = service.get(&key("HEADER_RESPONSE_TIME")) {
            config.header_response_time = parse_bool(&key("HEADER_RESPONSE_TIME"), &value)?;
        }
        if let Some(value) = service.get(&key("DISABLE_FORMAT_404")) {
            config.disable_format_404 = parse_bool(&key("DISABLE_FORMAT_404"), &value)?;
        }
        if let Some(value) = service.get(&key("LOG_COMPLETE_ERROR")) {
            config.log_complete_error = parse_bool(&key("LOG_COMPLETE_ERROR"), &value)?;
        }
        if let Some(value) = service.get(&key("CATCH_PANIC")) {
            config.catch_panic = parse_bool(&key("CATCH_PANIC"), &value)?;
        }
        if let Some(value) = service.get(&key("MESSAGE_OF_404")) {
            config.message_of_404 = Some(value);
        }
        if let Some(value) = service.get(&key("DEFAULT_ERROR_STATUS")) {
            let status = value.trim().parse::<u16>().map_err(|e| {
                ExceptionError::invalid_config(key("DEFAULT_ERROR_STATUS"), e.to_string())
            })?;
            config.default_error_status = Some(status);
        }

        Ok(config)
    }

    pub fn from_env() -> Result<Self> {
        Self::from_service(&ConfigService::from_env())
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| ExceptionError::invalid_config("json", e.to_string()))
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ExceptionError::invalid_config(
            key,
            format!("expected a boolean, got `{other}`"),
        )),
    }
}
