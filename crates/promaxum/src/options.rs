//! Handler options.

use std::error::Error as StdError;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use promaxum_core::Registry;
use serde::Deserialize;
use tokio::sync::Semaphore;

use crate::error::ParseErrorHandlingError;

/// What the handler does when gathering or encoding fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorHandling {
    /// Answer with a 500 and the error message.
    HttpErrorOnError,
    /// Serve whatever could be gathered and encoded. A gather that produced
    /// nothing at all still answers with a 500.
    #[default]
    ContinueOnError,
    /// Panic, failing the request's task.
    PanicOnError,
}

impl ErrorHandling {
    /// Returns the snake_case name of the policy.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HttpErrorOnError => "http_error_on_error",
            Self::ContinueOnError => "continue_on_error",
            Self::PanicOnError => "panic_on_error",
        }
    }
}

impl fmt::Display for ErrorHandling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErrorHandling {
    type Err = ParseErrorHandlingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "http_error_on_error" | "http_error" => Ok(Self::HttpErrorOnError),
            "continue_on_error" | "continue" => Ok(Self::ContinueOnError),
            "panic_on_error" | "panic" => Ok(Self::PanicOnError),
            _ => Err(ParseErrorHandlingError(s.to_string())),
        }
    }
}

/// Sink for errors met while serving a scrape.
///
/// `context` says where the error happened, for example
/// `"error gathering metrics:"`.
pub trait ErrorLog: Send + Sync {
    fn log(&self, context: &str, error: &dyn StdError);
}

impl<F> ErrorLog for F
where
    F: Fn(&str, &dyn StdError) + Send + Sync,
{
    fn log(&self, context: &str, error: &dyn StdError) {
        self(context, error)
    }
}

/// [`ErrorLog`] that emits `tracing` error events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingErrorLog;

impl ErrorLog for TracingErrorLog {
    fn log(&self, context: &str, error: &dyn StdError) {
        tracing::error!(error = %error, "{}", context);
    }
}

/// Options for [`handler_for`](crate::handler_for).
///
/// The defaults serve every scrape without a concurrency limit or timeout,
/// never offer OpenMetrics, continue on errors, log nothing and register
/// nothing.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use promaxum::{ErrorHandling, HandlerOpts, TracingErrorLog};
///
/// let opts = HandlerOpts::new()
///     .error_log(TracingErrorLog)
///     .error_handling(ErrorHandling::HttpErrorOnError)
///     .max_requests_in_flight(4)
///     .timeout(Duration::from_secs(10))
///     .enable_open_metrics(true);
///
/// assert_eq!(opts.max_requests_in_flight, 4);
/// ```
#[derive(Clone, Default)]
pub struct HandlerOpts {
    /// Receives gather and encode errors.
    pub error_log: Option<Arc<dyn ErrorLog>>,
    /// Policy applied to gather and encode errors.
    pub error_handling: ErrorHandling,
    /// Registry the handler registers its error counter with.
    pub registry: Option<Registry>,
    /// Maximum concurrent scrapes; zero or less means unlimited.
    pub max_requests_in_flight: i64,
    /// Maximum time to serve a scrape; `None` or zero means unlimited.
    pub timeout: Option<Duration>,
    /// Offer OpenMetrics when the scraper asks for it.
    pub enable_open_metrics: bool,
}

impl HandlerOpts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error_log(mut self, log: impl ErrorLog + 'static) -> Self {
        self.error_log = Some(Arc::new(log));
        self
    }

    pub fn error_handling(mut self, policy: ErrorHandling) -> Self {
        self.error_handling = policy;
        self
    }

    pub fn registry(mut self, registry: Registry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn max_requests_in_flight(mut self, limit: i64) -> Self {
        self.max_requests_in_flight = limit;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn enable_open_metrics(mut self, enable: bool) -> Self {
        self.enable_open_metrics = enable;
        self
    }

    /// Returns the concurrency limit, if one applies.
    ///
    /// Limits above `Semaphore::MAX_PERMITS` are capped to it.
    pub fn in_flight_limit(&self) -> Option<usize> {
        usize::try_from(self.max_requests_in_flight)
            .ok()
            .filter(|limit| *limit > 0)
            .map(|limit| limit.min(Semaphore::MAX_PERMITS))
    }

    /// Returns the timeout, if one applies.
    pub fn effective_timeout(&self) -> Option<Duration> {
        self.timeout.filter(|timeout| !timeout.is_zero())
    }
}

impl fmt::Debug for HandlerOpts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerOpts")
            .field("error_log", &self.error_log.is_some())
            .field("error_handling", &self.error_handling)
            .field("registry", &self.registry)
            .field("max_requests_in_flight", &self.max_requests_in_flight)
            .field("timeout", &self.timeout)
            .field("enable_open_metrics", &self.enable_open_metrics)
            .finish()
    }
}
