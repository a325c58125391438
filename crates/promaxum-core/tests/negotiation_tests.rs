use promaxum_core::{Format, negotiate, negotiate_including_open_metrics};

mod common;

#[test]
fn test_prometheus_scraper_defaults() {
    // Accept header sent by Prometheus 2.x when OpenMetrics scraping is on.
    let accept = "application/openmetrics-text;version=1.0.0,application/openmetrics-text;version=0.0.1;q=0.75,text/plain;version=0.0.4;q=0.5,*/*;q=0.1";

    assert_eq!(negotiate(Some(accept)), Format::Text);
    assert_eq!(
        negotiate_including_open_metrics(Some(accept)),
        Format::OpenMetricsV1
    );
}

#[test]
fn test_browser_accept_gets_text() {
    let accept = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

    assert_eq!(negotiate_including_open_metrics(Some(accept)), Format::Text);
}

#[test]
fn test_weights_decide_between_candidates() {
    let accept = "text/plain;q=0.9,application/vnd.google.protobuf;proto=io.prometheus.client.MetricFamily;encoding=delimited;q=0.1";

    assert_eq!(negotiate(Some(accept)), Format::Text);
}

#[test]
fn test_negotiated_format_drives_encoder() {
    let registry = common::populated_registry();
    let format = negotiate_including_open_metrics(Some("application/openmetrics-text; version=1.0.0"));

    let body = String::from_utf8(common::encode_all(format, &registry)).unwrap();

    assert!(format.content_type().starts_with("application/openmetrics-text"));
    assert!(body.ends_with("# EOF\n"));
}
