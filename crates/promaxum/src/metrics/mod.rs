//! Self-instrumentation of the metrics endpoint.

pub mod http;

pub use http::{IN_FLIGHT, InstrumentedHandler, REQUESTS_TOTAL, instrument_metric_handler};
