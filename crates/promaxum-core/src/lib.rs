//! Promaxum Core - gathering, registration and exposition formats
//!
//! This crate provides the pieces the HTTP handler in `promaxum` is built
//! from:
//!
//! - [`Gatherer`]: produces metric families, possibly alongside an error
//! - [`Registry`]: a `prometheus::Registry` that can hand back collectors
//!   registered earlier
//! - [`Format`] and [`MetricEncoder`]: `Accept` negotiation and the text,
//!   protobuf and OpenMetrics encoders

pub mod error;
pub mod format;
pub mod gather;
pub mod registry;

pub use error::{EncodeError, EncodeResult, GatherError, RegistryError};
pub use format::{
    Format, MetricEncoder, negotiate, negotiate_including_open_metrics, parse_accept,
};
pub use gather::{GatherFn, Gathered, Gatherer, Gatherers, gather_fn};
pub use registry::{Registration, Registry};

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
