use promaxum_core::{EncodeError, Format};

mod common;

#[test]
fn test_text_exposition() {
    let registry = common::populated_registry();

    let body = String::from_utf8(common::encode_all(Format::Text, &registry)).unwrap();

    assert!(body.contains("# TYPE http_requests_total counter"));
    assert!(body.contains("http_requests_total{code=\"200\"} 5"));
    assert!(body.contains("workers 3"));
    assert!(body.contains("latency_seconds_bucket{le=\"+Inf\"} 2"));
    assert!(!body.contains("# EOF"));
}

#[test]
fn test_open_metrics_exposition() {
    let registry = common::populated_registry();

    let body = String::from_utf8(common::encode_all(Format::OpenMetricsV1, &registry)).unwrap();

    assert!(body.contains("# TYPE http_requests counter"));
    assert!(body.contains("http_requests_total{code=\"500\"} 1"));
    assert!(body.contains("latency_seconds_bucket{le=\"0.1\"} 1"));
    assert!(body.contains("latency_seconds_bucket{le=\"1.0\"} 2"));
    assert!(body.contains("latency_seconds_sum 0.5625"));
    assert!(body.contains("latency_seconds_count 2"));
    assert_eq!(body.matches("# EOF").count(), 1);
    assert!(body.ends_with("# EOF\n"));
}

#[test]
fn test_open_metrics_families_keep_gather_order() {
    let registry = common::populated_registry();

    let body = String::from_utf8(common::encode_all(Format::OpenMetricsV0, &registry)).unwrap();

    let requests = body.find("# TYPE http_requests ").unwrap();
    let latency = body.find("# TYPE latency_seconds ").unwrap();
    let workers = body.find("# TYPE workers ").unwrap();
    assert!(requests < latency && latency < workers);
}

#[test]
fn test_protobuf_exposition_is_not_text() {
    let registry = common::populated_registry();

    let body = common::encode_all(Format::ProtoDelimited, &registry);

    assert!(!body.is_empty());
    assert!(!body.starts_with(b"#"));
}

#[test]
fn test_every_encoder_rejects_unnamed_family() {
    let family = prometheus::proto::MetricFamily::default();

    for format in [
        Format::Text,
        Format::ProtoDelimited,
        Format::OpenMetricsV1,
        Format::OpenMetricsV0,
    ] {
        let mut out = bytes::BytesMut::new();
        let mut encoder = format.encoder(&mut out);
        let error = encoder.encode(&family).unwrap_err();
        assert!(matches!(error, EncodeError::InvalidFamily { .. }), "{format}");
    }
}
