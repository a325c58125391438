//! Exposition formats.
//!
//! A [`Format`] is picked per scrape by [`negotiate`] (or
//! [`negotiate_including_open_metrics`]) from the request's `Accept` header,
//! and then builds the [`MetricEncoder`] that writes metric families into
//! the response buffer one at a time.

use bytes::BytesMut;
use prometheus::proto::MetricFamily;

use crate::error::{EncodeError, EncodeResult};

pub mod negotiate;
pub mod openmetrics;
pub mod protobuf;
pub mod text;

pub use negotiate::{MediaRange, negotiate, negotiate_including_open_metrics, parse_accept};
pub use openmetrics::OpenMetricsFormat;
pub use protobuf::ProtobufFormat;
pub use text::TextFormat;

/// Content type of the Prometheus text format.
pub const TEXT_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";
/// Content type of the length-delimited protobuf format.
pub const PROTO_DELIMITED_CONTENT_TYPE: &str =
    "application/vnd.google.protobuf; proto=io.prometheus.client.MetricFamily; encoding=delimited";
/// Content type of OpenMetrics 1.0.0.
pub const OPENMETRICS_1_0_0_CONTENT_TYPE: &str =
    "application/openmetrics-text; version=1.0.0; charset=utf-8";
/// Content type of OpenMetrics 0.0.1.
pub const OPENMETRICS_0_0_1_CONTENT_TYPE: &str =
    "application/openmetrics-text; version=0.0.1; charset=utf-8";

/// Supported exposition formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Format {
    /// Prometheus text format 0.0.4.
    #[default]
    Text,
    /// Length-delimited `io.prometheus.client.MetricFamily` messages.
    ProtoDelimited,
    /// OpenMetrics text, version 1.0.0.
    OpenMetricsV1,
    /// OpenMetrics text, version 0.0.1.
    OpenMetricsV0,
}

impl Format {
    /// Returns the `Content-Type` header value for this format.
    pub fn content_type(&self) -> &'static str {
        match self {
            Format::Text => TEXT_CONTENT_TYPE,
            Format::ProtoDelimited => PROTO_DELIMITED_CONTENT_TYPE,
            Format::OpenMetricsV1 => OPENMETRICS_1_0_0_CONTENT_TYPE,
            Format::OpenMetricsV0 => OPENMETRICS_0_0_1_CONTENT_TYPE,
        }
    }

    /// Returns true for both OpenMetrics versions.
    pub fn is_open_metrics(&self) -> bool {
        matches!(self, Format::OpenMetricsV1 | Format::OpenMetricsV0)
    }

    /// Builds an encoder for this format that appends to `out`.
    pub fn encoder<'a>(&self, out: &'a mut BytesMut) -> Box<dyn MetricEncoder + 'a> {
        match self {
            Format::Text => Box::new(TextFormat::new(out)),
            Format::ProtoDelimited => Box::new(ProtobufFormat::new(out)),
            Format::OpenMetricsV1 | Format::OpenMetricsV0 => Box::new(OpenMetricsFormat::new(out)),
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.content_type())
    }
}

/// Writes metric families in one exposition format.
pub trait MetricEncoder: Send {
    /// Appends one metric family.
    fn encode(&mut self, family: &MetricFamily) -> EncodeResult<()>;

    /// Finishes the exposition.
    ///
    /// Formats without a trailer keep the default no-op.
    fn close(&mut self) -> EncodeResult<()> {
        Ok(())
    }
}

/// Rejects families no exposition format can represent.
pub(crate) fn check_family(family: &MetricFamily) -> EncodeResult<()> {
    if family.get_name().is_empty() {
        return Err(EncodeError::invalid_family("", "metric family has no name"));
    }
    if family.get_metric().is_empty() {
        return Err(EncodeError::invalid_family(
            family.get_name(),
            "metric family has no metrics",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_types() {
        assert!(Format::Text.content_type().starts_with("text/plain"));
        assert!(Format::ProtoDelimited.content_type().contains("encoding=delimited"));
        assert!(Format::OpenMetricsV1.content_type().contains("version=1.0.0"));
        assert!(Format::OpenMetricsV0.content_type().contains("version=0.0.1"));
    }

    #[test]
    fn test_default_is_text() {
        assert_eq!(Format::default(), Format::Text);
    }

    #[test]
    fn test_display_is_content_type() {
        assert_eq!(Format::OpenMetricsV1.to_string(), OPENMETRICS_1_0_0_CONTENT_TYPE);
    }

    #[test]
    fn test_check_family_rejects_empty_family() {
        let mut family = MetricFamily::default();
        assert!(check_family(&family).is_err());

        family.set_name("up".to_string());
        let error = check_family(&family).unwrap_err();
        assert!(error.to_string().contains("no metrics"));
    }
}
