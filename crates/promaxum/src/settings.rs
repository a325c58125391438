//! Server settings loaded through the `config` crate.

use std::net::{AddrParseError, SocketAddr};
use std::time::Duration;

use config::{Config, ConfigError, Environment, Source};
use serde::Deserialize;

use crate::options::{ErrorHandling, HandlerOpts, TracingErrorLog};

/// Settings of the `promaxum` binary.
///
/// Read from `PROMAXUM_*` environment variables, e.g. `PROMAXUM_PORT=9100`
/// or `PROMAXUM_ERROR_HANDLING=http_error_on_error`.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Zero or less disables the limit.
    pub max_requests_in_flight: i64,
    /// Zero disables the timeout.
    pub timeout_ms: u64,
    pub enable_open_metrics: bool,
    pub error_handling: ErrorHandling,
}

impl ServerSettings {
    /// Loads settings from the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_source(
            Environment::with_prefix("PROMAXUM")
                .prefix_separator("_")
                .try_parsing(true),
        )
    }

    /// Loads settings from `source` layered over the defaults.
    pub fn from_source<S>(source: S) -> Result<Self, ConfigError>
    where
        S: Source + Send + Sync + 'static,
    {
        Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", 9090)?
            .set_default("max_requests_in_flight", 0)?
            .set_default("timeout_ms", 0)?
            .set_default("enable_open_metrics", false)?
            .set_default("error_handling", ErrorHandling::default().as_str())?
            .add_source(source)
            .build()?
            .try_deserialize()
    }

    pub fn addr(&self) -> Result<SocketAddr, AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }

    /// Handler options matching these settings, logging through `tracing`.
    pub fn handler_opts(&self) -> HandlerOpts {
        HandlerOpts::new()
            .error_log(TracingErrorLog)
            .error_handling(self.error_handling)
            .max_requests_in_flight(self.max_requests_in_flight)
            .timeout(Duration::from_millis(self.timeout_ms))
            .enable_open_metrics(self.enable_open_metrics)
    }
}
