//! Error types for promaxum.
//!
//! This module defines the errors that can surface while gathering,
//! registering and encoding metrics. All errors implement the standard
//! `std::error::Error` trait via `thiserror`.
//!
//! # Error Handling Philosophy
//!
//! - Gathering may fail partially: a [`GatherError`] travels next to the
//!   metric families that were collected, it does not replace them.
//! - Encoding fails per metric family: an [`EncodeError`] says which
//!   family could not be written.
//! - Registration fails at startup: a [`RegistryError`] is a programming or
//!   configuration mistake and is meant to abort the process.
//!
//! # Example
//!
//! ```
//! use promaxum_core::GatherError;
//!
//! let error = GatherError::multiple(vec![
//!     GatherError::collector("disk", "device not ready"),
//!     GatherError::collector("net", "interface vanished"),
//! ]);
//! assert!(error.to_string().starts_with("2 error(s) occurred:"));
//! ```

use std::fmt;

use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Error produced while gathering metric families.
#[derive(Debug, Error)]
pub enum GatherError {
    /// A collector failed to produce its metrics.
    #[error("collector '{collector}' failed: {message}")]
    Collector {
        /// Name of the collector that failed
        collector: String,
        /// Description of the failure
        message: String,
        /// Underlying error, if any
        #[source]
        cause: Option<BoxError>,
    },

    /// Two sources reported the same metric family in incompatible ways.
    #[error("collected metric family '{name}' is inconsistent: {message}")]
    Inconsistent {
        /// Fully-qualified name of the metric family
        name: String,
        /// What did not match
        message: String,
    },

    /// Several independent failures.
    #[error("{}", MultiDisplay(.0))]
    Multiple(Vec<GatherError>),
}

struct MultiDisplay<'a>(&'a [GatherError]);

impl fmt::Display for MultiDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} error(s) occurred:", self.0.len())?;
        for err in self.0 {
            write!(f, "\n* {}", err)?;
        }
        Ok(())
    }
}

impl GatherError {
    /// Creates a Collector error without a cause.
    pub fn collector(collector: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Collector {
            collector: collector.into(),
            message: message.into(),
            cause: None,
        }
    }

    /// Creates a Collector error with a cause.
    pub fn collector_with_cause<E>(
        collector: impl Into<String>,
        message: impl Into<String>,
        cause: E,
    ) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Collector {
            collector: collector.into(),
            message: message.into(),
            cause: Some(Box::new(cause)),
        }
    }

    /// Creates an Inconsistent error.
    pub fn inconsistent(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Inconsistent {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Folds a list of errors into one.
    ///
    /// Nested `Multiple` errors are flattened and a single error is returned
    /// as is, so callers never see `1 error(s) occurred`.
    pub fn multiple(errors: Vec<GatherError>) -> Self {
        let mut flat = Vec::with_capacity(errors.len());
        for err in errors {
            match err {
                Self::Multiple(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        if flat.len() == 1 {
            if let Some(only) = flat.pop() {
                return only;
            }
        }
        Self::Multiple(flat)
    }

    /// Returns how many individual failures this error carries.
    pub fn count(&self) -> usize {
        match self {
            Self::Multiple(errors) => errors.iter().map(Self::count).sum(),
            _ => 1,
        }
    }

    /// Returns true if this error reports an inconsistent metric family.
    pub fn is_inconsistent(&self) -> bool {
        matches!(self, Self::Inconsistent { .. })
    }
}

/// Error produced while encoding a metric family.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// The metric family cannot be expressed in any exposition format.
    #[error("invalid metric family '{name}': {message}")]
    InvalidFamily {
        /// Name of the metric family ("" when the name itself is missing)
        name: String,
        /// Why it is invalid
        message: String,
    },

    /// The underlying `prometheus` encoder failed.
    #[error("{0}")]
    Prometheus(#[from] prometheus::Error),

    /// Writing into the output buffer failed.
    #[error("write error: {0}")]
    Write(#[from] std::io::Error),

    /// `close` was already called on this encoder.
    #[error("encoder is already closed")]
    Closed,
}

impl EncodeError {
    /// Creates an InvalidFamily error.
    pub fn invalid_family(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidFamily {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Returns true if the metric family itself was rejected.
    pub fn is_invalid_family(&self) -> bool {
        matches!(self, Self::InvalidFamily { .. })
    }
}

impl From<fmt::Error> for EncodeError {
    fn from(_: fmt::Error) -> Self {
        Self::Write(std::io::Error::other("formatter error"))
    }
}

/// Error produced while registering a collector.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A collector with the same descriptors exists, but it was not
    /// registered through this registry handle or has a different type,
    /// so it cannot be handed back.
    #[error("collector '{name}' is already registered but cannot be reused as the requested type")]
    IncompatibleExisting {
        /// Fully-qualified name of the first descriptor
        name: String,
    },

    /// The collector exposes no descriptors.
    #[error("collector has no descriptors")]
    NoDescriptors,

    /// Any other failure reported by the `prometheus` registry.
    #[error("registration failed: {0}")]
    Prometheus(#[from] prometheus::Error),
}

impl RegistryError {
    /// Creates an IncompatibleExisting error.
    pub fn incompatible_existing(name: impl Into<String>) -> Self {
        Self::IncompatibleExisting { name: name.into() }
    }
}

/// Type alias for Results with EncodeError.
pub type EncodeResult<T> = std::result::Result<T, EncodeError>;
