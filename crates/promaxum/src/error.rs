//! Errors surfaced while wiring the metrics handler.

use promaxum_core::RegistryError;
use thiserror::Error;

/// Error returned when a handler cannot be built.
///
/// These happen before any scrape is served and are meant to abort startup.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Registering one of the handler's own collectors failed for a reason
    /// other than an equivalent collector already being registered.
    #[error("failed to register handler metrics: {0}")]
    Registration(#[from] RegistryError),

    /// A collector definition was rejected by `prometheus`.
    #[error("invalid handler metric: {0}")]
    Metric(#[from] prometheus::Error),
}

impl BuildError {
    /// Returns true for registration conflicts.
    pub fn is_registration(&self) -> bool {
        matches!(self, Self::Registration(_))
    }
}

/// Error returned when parsing an unknown error handling policy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "unknown error handling policy '{0}', expected one of: continue_on_error, http_error_on_error, panic_on_error"
)]
pub struct ParseErrorHandlingError(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_display() {
        let error = BuildError::from(RegistryError::incompatible_existing("errors_total"));

        assert!(error.is_registration());
        assert!(error.to_string().contains("errors_total"));
    }

    #[test]
    fn test_parse_error_lists_choices() {
        let error = ParseErrorHandlingError("explode".to_string());

        assert!(error.to_string().contains("'explode'"));
        assert!(error.to_string().contains("panic_on_error"));
    }
}
