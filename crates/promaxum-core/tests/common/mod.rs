#![allow(dead_code)]
use prometheus::{
    Histogram, HistogramOpts, IntCounterVec, IntGauge, Opts, Registry,
};

/// Registry with one counter, one gauge and one histogram, all populated.
pub fn populated_registry() -> Registry {
    let registry = Registry::new();

    let requests = IntCounterVec::new(
        Opts::new("http_requests_total", "Requests served"),
        &["code"],
    )
    .expect("valid counter");
    requests.with_label_values(&["200"]).inc_by(5);
    requests.with_label_values(&["500"]).inc();
    registry
        .register(Box::new(requests))
        .expect("register counter");

    let workers = IntGauge::new("workers", "Busy workers").expect("valid gauge");
    workers.set(3);
    registry.register(Box::new(workers)).expect("register gauge");

    let latency = Histogram::with_opts(
        HistogramOpts::new("latency_seconds", "Request latency").buckets(vec![0.1, 1.0]),
    )
    .expect("valid histogram");
    latency.observe(0.0625);
    latency.observe(0.5);
    registry
        .register(Box::new(latency))
        .expect("register histogram");

    registry
}

/// Encodes every family of `registry` in `format` and returns the body.
pub fn encode_all(format: promaxum_core::Format, registry: &Registry) -> Vec<u8> {
    let mut out = bytes::BytesMut::new();
    {
        let mut encoder = format.encoder(&mut out);
        for family in registry.gather() {
            encoder.encode(&family).expect("encode family");
        }
        encoder.close().expect("close encoder");
    }
    out.to_vec()
}
