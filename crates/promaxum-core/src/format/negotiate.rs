//! `Accept` header negotiation.
//!
//! Media ranges are ranked by their `q` weight (highest first), more
//! specific ranges before wildcards on ties, and then walked in order until
//! one names a supported format. Anything unmatched falls back to the
//! Prometheus text format, so a scrape always gets an answer.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::format::Format;

const PROTO_TYPE: &str = "application/vnd.google.protobuf";
const PROTO_PROTOCOL: &str = "io.prometheus.client.MetricFamily";
const OPENMETRICS_TYPE: &str = "application/openmetrics-text";

/// One entry of an `Accept` header.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaRange {
    /// Main type, lowercased (`text`, `application`, `*`).
    pub kind: String,
    /// Subtype, lowercased (`plain`, `*`).
    pub subtype: String,
    /// Weight from the `q` parameter; 1.0 when absent.
    pub q: f32,
    /// Remaining parameters, names lowercased, values verbatim.
    pub params: HashMap<String, String>,
}

impl MediaRange {
    /// Returns `type/subtype`.
    pub fn essence(&self) -> String {
        format!("{}/{}", self.kind, self.subtype)
    }

    /// Returns a parameter value, or `""` when absent.
    pub fn param(&self, name: &str) -> &str {
        self.params.get(name).map(String::as_str).unwrap_or("")
    }

    fn is_wildcard_type(&self) -> bool {
        self.kind == "*"
    }

    fn is_wildcard_subtype(&self) -> bool {
        self.subtype == "*"
    }
}

/// Parses an `Accept` header into media ranges, best match first.
///
/// Ranges with `q=0` (or below) are refused by the client and are dropped.
/// An unparsable weight counts as zero.
pub fn parse_accept(header: &str) -> Vec<MediaRange> {
    let mut ranges: Vec<MediaRange> = header
        .split(',')
        .filter_map(parse_media_range)
        .filter(|range| range.q > 0.0)
        .collect();

    ranges.sort_by(|a, b| {
        b.q.partial_cmp(&a.q)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.is_wildcard_type().cmp(&b.is_wildcard_type()))
            .then_with(|| a.is_wildcard_subtype().cmp(&b.is_wildcard_subtype()))
    });
    ranges
}

fn parse_media_range(part: &str) -> Option<MediaRange> {
    let mut pieces = part.split(';');
    let essence = pieces.next()?.trim();
    if essence.is_empty() {
        return None;
    }

    let (kind, subtype) = match essence.split_once('/') {
        Some((kind, subtype)) => (kind.trim(), subtype.trim()),
        None if essence == "*" => ("*", "*"),
        None => return None,
    };

    let mut q = 1.0;
    let mut params = HashMap::new();
    for param in pieces {
        let Some((name, value)) = param.split_once('=') else {
            continue;
        };
        let name = name.trim().to_ascii_lowercase();
        let value = value.trim().trim_matches('"');
        if name == "q" {
            q = value.parse().unwrap_or(0.0);
        } else {
            params.insert(name, value.to_string());
        }
    }

    Some(MediaRange {
        kind: kind.to_ascii_lowercase(),
        subtype: subtype.to_ascii_lowercase(),
        q,
        params,
    })
}

/// Picks the exposition format for an `Accept` header.
///
/// Only Prometheus text 0.0.4 and length-delimited protobuf are candidates;
/// use [`negotiate_including_open_metrics`] to also offer OpenMetrics.
pub fn negotiate(accept: Option<&str>) -> Format {
    select(accept, false)
}

/// Like [`negotiate`], but also honours `application/openmetrics-text`
/// with version 1.0.0, 0.0.1 or no version at all.
pub fn negotiate_including_open_metrics(accept: Option<&str>) -> Format {
    select(accept, true)
}

fn select(accept: Option<&str>, open_metrics: bool) -> Format {
    let Some(accept) = accept else {
        return Format::Text;
    };

    for range in parse_accept(accept) {
        let essence = range.essence();
        let version = range.param("version");

        if essence == PROTO_TYPE
            && range.param("proto") == PROTO_PROTOCOL
            && range.param("encoding") == "delimited"
        {
            return Format::ProtoDelimited;
        }
        if essence == "text/plain" && (version == "0.0.4" || version.is_empty()) {
            return Format::Text;
        }
        if open_metrics && essence == OPENMETRICS_TYPE {
            match version {
                "1.0.0" => return Format::OpenMetricsV1,
                "0.0.1" | "" => return Format::OpenMetricsV0,
                _ => {},
            }
        }
    }
    Format::Text
}
