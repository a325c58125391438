//! The handler's own error counter.

use promaxum_core::{Registration, Registry};
use prometheus::{IntCounterVec, Opts};
use tracing::info;

use crate::error::BuildError;

pub const ERRORS_TOTAL: &str = "promaxum_metric_handler_errors_total";
const ERRORS_HELP: &str =
    "Total number of internal errors encountered by the promaxum metric handler.";

pub const CAUSE_GATHERING: &str = "gathering";
pub const CAUSE_ENCODING: &str = "encoding";

/// Counts gather and encode failures, labeled by `cause`.
#[derive(Debug, Clone)]
pub struct ErrorCounter {
    counter: IntCounterVec,
}

impl ErrorCounter {
    /// Creates an unregistered counter.
    pub fn new() -> Result<Self, BuildError> {
        let counter = IntCounterVec::new(Opts::new(ERRORS_TOTAL, ERRORS_HELP), &["cause"])?;
        Ok(Self { counter })
    }

    /// Registers the counter, or switches to the one already registered.
    ///
    /// Both causes are created up front so they are exported as zero before
    /// the first failure.
    pub fn register(self, registry: &Registry) -> Result<Self, BuildError> {
        self.counter.with_label_values(&[CAUSE_GATHERING]);
        self.counter.with_label_values(&[CAUSE_ENCODING]);

        let counter = match registry.register(self.counter)? {
            Registration::Registered(counter) => {
                info!(metric = ERRORS_TOTAL, "Registered metric handler error counter");
                counter
            },
            Registration::AlreadyRegistered(existing) => existing,
        };
        Ok(Self { counter })
    }

    pub fn gathering(&self) {
        self.counter.with_label_values(&[CAUSE_GATHERING]).inc();
    }

    pub fn encoding(&self) {
        self.counter.with_label_values(&[CAUSE_ENCODING]).inc();
    }

    /// Current value for `cause`.
    pub fn get(&self, cause: &str) -> u64 {
        self.counter.with_label_values(&[cause]).get()
    }
}
