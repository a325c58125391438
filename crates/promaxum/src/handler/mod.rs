//! The `/metrics` request handler.
//!
//! [`handler_for`] builds a [`MetricsHandler`], a `tower::Service` that can
//! be mounted on an axum router with `Router::route_service`. Each request:
//!
//! 1. takes a slot from the in-flight limiter, or answers 503 at once;
//! 2. gathers on the blocking pool and applies the error policy;
//! 3. negotiates the exposition format from the `Accept` header;
//! 4. encodes every metric family into a pooled buffer;
//! 5. answers 200 with the buffer contents.
//!
//! With a timeout configured, the whole call is raced against a timer by
//! [`ScrapeTimeout`](crate::middleware::ScrapeTimeout).

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    body::Body,
    http::{Request, Response, StatusCode, header},
    response::IntoResponse,
};
use promaxum_core::{Gatherer, Registry};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tower::{Layer, Service};
use tracing::debug;

use crate::buffer::BufferPool;
use crate::error::BuildError;
use crate::metrics::{InstrumentedHandler, instrument_metric_handler};
use crate::middleware::{ScrapeTimeout, ScrapeTimeoutLayer};
use crate::options::HandlerOpts;
use crate::response::{ScrapeResponse, http_error, plain_error};

mod errors;
mod pipeline;

pub use errors::{CAUSE_ENCODING, CAUSE_GATHERING, ERRORS_TOTAL, ErrorCounter};

use pipeline::Pipeline;

/// Boxed future returned by the handler services.
pub type ScrapeFuture = Pin<Box<dyn Future<Output = Result<Response<Body>, Infallible>> + Send>>;

/// Builds a handler serving the metrics of `gatherer`.
///
/// # Errors
///
/// Returns `BuildError::Registration` when `opts.registry` is set and the
/// handler's error counter conflicts with a different collector of the same
/// name. An equivalent counter registered by an earlier handler is reused.
pub fn handler_for<G>(gatherer: G, opts: HandlerOpts) -> Result<MetricsHandler, BuildError>
where
    G: Gatherer + 'static,
{
    let mut errors = ErrorCounter::new()?;
    if let Some(registry) = &opts.registry {
        errors = errors.register(registry)?;
    }

    let limit = opts.in_flight_limit();
    let timeout = opts.effective_timeout();

    let service = ScrapeService {
        pipeline: Arc::new(Pipeline {
            gatherer: Arc::new(gatherer),
            opts,
            errors: errors.clone(),
            buffers: Arc::new(BufferPool::new()),
        }),
        in_flight: limit.map(|limit| (Arc::new(Semaphore::new(limit)), limit)),
    };

    let inner = match timeout {
        Some(timeout) => Inner::Limited(ScrapeTimeoutLayer::new(timeout).layer(service)),
        None => Inner::Direct(service),
    };
    Ok(MetricsHandler { inner, errors })
}

/// Builds an instrumented handler for `registry` with default options.
///
/// The handler's error counter and request metrics are registered with
/// `registry` itself.
pub fn handler(registry: Registry) -> Result<InstrumentedHandler<MetricsHandler>, BuildError> {
    let metrics = handler_for(
        registry.clone(),
        HandlerOpts::new().registry(registry.clone()),
    )?;
    instrument_metric_handler(&registry, metrics)
}

/// Service serving scrapes, optionally bounded by a timeout.
#[derive(Clone)]
pub struct MetricsHandler {
    inner: Inner,
    errors: ErrorCounter,
}

#[derive(Clone)]
enum Inner {
    Direct(ScrapeService),
    Limited(ScrapeTimeout<ScrapeService>),
}

impl MetricsHandler {
    /// Returns the counter of gather and encode failures.
    pub fn error_counter(&self) -> &ErrorCounter {
        &self.errors
    }
}

impl Service<Request<Body>> for MetricsHandler {
    type Response = Response<Body>;
    type Error = Infallible;
    type Future = ScrapeFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        match &mut self.inner {
            Inner::Direct(service) => service.call(request),
            Inner::Limited(service) => service.call(request),
        }
    }
}

/// Serves one scrape per call, without a timeout.
#[derive(Clone)]
pub struct ScrapeService {
    pipeline: Arc<Pipeline>,
    in_flight: Option<(Arc<Semaphore>, usize)>,
}

impl Service<Request<Body>> for ScrapeService {
    type Response = Response<Body>;
    type Error = Infallible;
    type Future = ScrapeFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        let accept = request
            .headers()
            .get(header::ACCEPT)
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        let permit = match &self.in_flight {
            Some((semaphore, limit)) => match Arc::clone(semaphore).try_acquire_owned() {
                Ok(permit) => Some(permit),
                Err(_) => {
                    debug!(limit = *limit, "Rejecting scrape, in-flight limit reached");
                    let mut resp = ScrapeResponse::new();
                    plain_error(
                        &mut resp,
                        &format!(
                            "Limit of concurrent requests reached ({}), try again later.",
                            limit
                        ),
                        StatusCode::SERVICE_UNAVAILABLE,
                    );
                    return Box::pin(async move { Ok(resp.into_response()) });
                },
            },
            None => None,
        };

        let pipeline = Arc::clone(&self.pipeline);
        Box::pin(async move {
            let cancel = CancellationToken::new();
            // Fires when this future is dropped, e.g. by an expired timeout.
            let _abandon = cancel.clone().drop_guard();

            let task = tokio::task::spawn_blocking(move || {
                let _permit = permit;
                pipeline.run(accept.as_deref(), &cancel)
            });

            let resp = match task.await {
                Ok(resp) => resp,
                Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
                Err(err) => {
                    let mut resp = ScrapeResponse::new();
                    http_error(&mut resp, err);
                    resp
                },
            };
            Ok(resp.into_response())
        })
    }
}
