//! Request metrics for the metrics handler itself.

use std::task::{Context, Poll};

use axum::{
    body::Body,
    http::{Request, Response},
};
use promaxum_core::Registry;
use prometheus::{IntCounterVec, IntGauge, Opts};
use tower::Service;

use crate::error::BuildError;

pub const REQUESTS_TOTAL: &str = "promaxum_metric_handler_requests_total";
pub const IN_FLIGHT: &str = "promaxum_metric_handler_requests_in_flight";

/// Wraps `handler` so every scrape is counted by status code and tracked
/// while in flight.
///
/// Both collectors are registered with `registry`; collectors left there by
/// an earlier call are reused, so several instrumented handlers can share
/// one registry. Codes 200, 500 and 503 are exported from the start.
pub fn instrument_metric_handler<S>(
    registry: &Registry,
    handler: S,
) -> Result<InstrumentedHandler<S>, BuildError> {
    let requests = IntCounterVec::new(
        Opts::new(REQUESTS_TOTAL, "Total number of scrapes by HTTP status code."),
        &["code"],
    )?;
    for code in ["200", "500", "503"] {
        requests.with_label_values(&[code]);
    }
    let requests = registry.register(requests)?.into_inner();

    let in_flight = IntGauge::new(IN_FLIGHT, "Current number of scrapes being served.")?;
    let in_flight = registry.register(in_flight)?.into_inner();

    Ok(InstrumentedHandler {
        inner: handler,
        requests,
        in_flight,
    })
}

/// Service returned by [`instrument_metric_handler`].
#[derive(Clone)]
pub struct InstrumentedHandler<S> {
    inner: S,
    requests: IntCounterVec,
    in_flight: IntGauge,
}

impl<S> Service<Request<Body>> for InstrumentedHandler<S>
where
    S: Service<Request<Body>, Response = Response<Body>> + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        self.in_flight.inc();
        let guard = InFlightGuard(self.in_flight.clone());
        let requests = self.requests.clone();
        let response = self.inner.call(request);

        Box::pin(async move {
            let _guard = guard;
            let response = response.await?;
            requests
                .with_label_values(&[response.status().as_str()])
                .inc();
            Ok(response)
        })
    }
}

// Decrements on every exit, unwinding and cancellation included.
struct InFlightGuard(IntGauge);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.dec();
    }
}
