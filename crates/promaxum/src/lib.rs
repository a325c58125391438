//! Promaxum - Prometheus metrics handler for axum
//!
//! Serves the metric families of a [`Gatherer`](promaxum_core::Gatherer)
//! over HTTP with `Accept` negotiation, a bound on concurrent scrapes, an
//! optional timeout and a configurable reaction to gather and encode
//! errors.
//!
//! ```no_run
//! use promaxum::{HandlerOpts, create_router, handler_for};
//! use promaxum_core::Registry;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = Registry::new();
//! let metrics = handler_for(
//!     registry.clone(),
//!     HandlerOpts::new().registry(registry).max_requests_in_flight(4),
//! )?;
//!
//! let app = create_router(metrics);
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:9090").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

pub mod buffer;
pub mod error;
pub mod handler;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod options;
pub mod response;
pub mod server;
pub mod settings;

pub use error::{BuildError, ParseErrorHandlingError};
pub use handler::{ErrorCounter, MetricsHandler, ScrapeService, handler, handler_for};
pub use metrics::{InstrumentedHandler, instrument_metric_handler};
pub use options::{ErrorHandling, ErrorLog, HandlerOpts, TracingErrorLog};
pub use response::{ScrapeResponse, http_error, plain_error};
pub use server::{create_router, run_server};
pub use settings::ServerSettings;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
