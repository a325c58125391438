//! OpenMetrics text exposition.
//!
//! The `prometheus` crate only speaks the classic text and protobuf formats,
//! so this encoder renders `MetricFamily` records following the OpenMetrics
//! 1.0 rules:
//!
//! - counter families drop a trailing `_total` from the family name and
//!   expose their sample as `<name>_total`;
//! - untyped metrics are exposed as `unknown`;
//! - `le` and `quantile` label values always carry a decimal point;
//! - timestamps are in seconds;
//! - the exposition ends with `# EOF`.

use std::fmt::Write;

use bytes::BytesMut;
use prometheus::proto::{LabelPair, Metric, MetricFamily, MetricType};

use crate::error::{EncodeError, EncodeResult};
use crate::format::{MetricEncoder, check_family};

pub struct OpenMetricsFormat<'a> {
    out: &'a mut BytesMut,
    closed: bool,
}

impl<'a> OpenMetricsFormat<'a> {
    pub fn new(out: &'a mut BytesMut) -> Self {
        Self { out, closed: false }
    }
}

impl MetricEncoder for OpenMetricsFormat<'_> {
    fn encode(&mut self, family: &MetricFamily) -> EncodeResult<()> {
        if self.closed {
            return Err(EncodeError::Closed);
        }
        check_family(family)?;

        let kind = family.get_field_type();
        let name = match kind {
            MetricType::COUNTER => family
                .get_name()
                .strip_suffix("_total")
                .unwrap_or(family.get_name()),
            _ => family.get_name(),
        };

        // Render into a scratch string first so a failing family leaves no
        // half-written lines behind.
        let mut block = String::new();
        writeln!(block, "# TYPE {} {}", name, type_name(kind))?;
        if !family.get_help().is_empty() {
            writeln!(block, "# HELP {} {}", name, escape_help(family.get_help()))?;
        }

        for metric in family.get_metric() {
            match kind {
                MetricType::COUNTER => {
                    let value = metric.get_counter().get_value();
                    write_sample(&mut block, name, "_total", metric, None, value)?;
                },
                MetricType::GAUGE => {
                    let value = metric.get_gauge().get_value();
                    write_sample(&mut block, name, "", metric, None, value)?;
                },
                MetricType::UNTYPED => {
                    let value = metric.get_untyped().get_value();
                    write_sample(&mut block, name, "", metric, None, value)?;
                },
                MetricType::SUMMARY => write_summary(&mut block, name, metric)?,
                MetricType::HISTOGRAM => write_histogram(&mut block, name, metric)?,
            }
        }

        self.out.extend_from_slice(block.as_bytes());
        Ok(())
    }

    fn close(&mut self) -> EncodeResult<()> {
        if self.closed {
            return Err(EncodeError::Closed);
        }
        self.closed = true;
        self.out.extend_from_slice(b"# EOF\n");
        Ok(())
    }
}

fn type_name(kind: MetricType) -> &'static str {
    match kind {
        MetricType::COUNTER => "counter",
        MetricType::GAUGE => "gauge",
        MetricType::SUMMARY => "summary",
        MetricType::HISTOGRAM => "histogram",
        MetricType::UNTYPED => "unknown",
    }
}

fn write_summary(out: &mut String, name: &str, metric: &Metric) -> std::fmt::Result {
    let summary = metric.get_summary();
    for quantile in summary.get_quantile() {
        let q = float_label(quantile.get_quantile());
        write_sample(
            out,
            name,
            "",
            metric,
            Some(("quantile", q.as_str())),
            quantile.get_value(),
        )?;
    }
    write_sample(out, name, "_sum", metric, None, summary.get_sample_sum())?;
    write_count(out, name, "_count", metric, None, summary.get_sample_count())
}

fn write_histogram(out: &mut String, name: &str, metric: &Metric) -> std::fmt::Result {
    let histogram = metric.get_histogram();
    let mut saw_inf = false;
    for bucket in histogram.get_bucket() {
        let bound = bucket.get_upper_bound();
        saw_inf |= bound == f64::INFINITY;
        let le = float_label(bound);
        write_count(
            out,
            name,
            "_bucket",
            metric,
            Some(("le", le.as_str())),
            bucket.get_cumulative_count(),
        )?;
    }
    if !saw_inf {
        write_count(
            out,
            name,
            "_bucket",
            metric,
            Some(("le", "+Inf")),
            histogram.get_sample_count(),
        )?;
    }
    write_sample(out, name, "_sum", metric, None, histogram.get_sample_sum())?;
    write_count(out, name, "_count", metric, None, histogram.get_sample_count())
}

fn write_sample(
    out: &mut String,
    name: &str,
    suffix: &str,
    metric: &Metric,
    extra: Option<(&str, &str)>,
    value: f64,
) -> std::fmt::Result {
    write_series(out, name, suffix, metric.get_label(), extra)?;
    write!(out, " {}", format_float(value))?;
    write_timestamp(out, metric)
}

fn write_count(
    out: &mut String,
    name: &str,
    suffix: &str,
    metric: &Metric,
    extra: Option<(&str, &str)>,
    value: u64,
) -> std::fmt::Result {
    write_series(out, name, suffix, metric.get_label(), extra)?;
    write!(out, " {}", value)?;
    write_timestamp(out, metric)
}

fn write_series(
    out: &mut String,
    name: &str,
    suffix: &str,
    labels: &[LabelPair],
    extra: Option<(&str, &str)>,
) -> std::fmt::Result {
    write!(out, "{}{}", name, suffix)?;
    if labels.is_empty() && extra.is_none() {
        return Ok(());
    }

    out.push('{');
    let pairs = labels
        .iter()
        .map(|pair| (pair.get_name(), pair.get_value()))
        .chain(extra);
    for (i, (label, value)) in pairs.enumerate() {
        if i > 0 {
            out.push(',');
        }
        write!(out, "{}=\"{}\"", label, escape_label_value(value))?;
    }
    out.push('}');
    Ok(())
}

fn write_timestamp(out: &mut String, metric: &Metric) -> std::fmt::Result {
    let ts = metric.get_timestamp_ms();
    if ts != 0 {
        write!(out, " {}.{:03}", ts.div_euclid(1000), ts.rem_euclid(1000))?;
    }
    out.push('\n');
    Ok(())
}

fn format_float(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value == f64::INFINITY {
        "+Inf".to_string()
    } else if value == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else {
        value.to_string()
    }
}

// `le="1"` and `le="1.0"` are different series for OpenMetrics consumers.
fn float_label(value: f64) -> String {
    let formatted = format_float(value);
    if value.is_finite() && !formatted.contains('.') && !formatted.contains('e') {
        format!("{}.0", formatted)
    } else {
        formatted
    }
}

fn escape_label_value(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('\n', "\\n")
        .replace('"', "\\\"")
}

fn escape_help(help: &str) -> String {
    help.replace('\\', "\\\\")
        .replace('\n', "\\n")
        .replace('"', "\\\"")
}
