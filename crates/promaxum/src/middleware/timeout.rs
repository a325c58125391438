//! Middleware que limita la duracion de un scrape.

use axum::{
    body::Body,
    http::{Request, Response, StatusCode},
    response::IntoResponse,
};
use std::{
    convert::Infallible,
    task::{Context, Poll},
    time::Duration,
};
use tower::{Layer, Service};
use tracing::debug;

use crate::response::{ScrapeResponse, plain_error};

/// Layer that answers 503 when the inner service takes longer than the
/// configured timeout.
#[derive(Debug, Clone, Copy)]
pub struct ScrapeTimeoutLayer {
    timeout: Duration,
}

impl ScrapeTimeoutLayer {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl<S> Layer<S> for ScrapeTimeoutLayer {
    type Service = ScrapeTimeout<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ScrapeTimeout {
            inner,
            timeout: self.timeout,
        }
    }
}

/// Middleware racing the inner service against a timer.
///
/// Whichever finishes first produces the response. On expiry the inner
/// future is dropped; work it already handed to other tasks keeps running
/// until it notices.
#[derive(Debug, Clone)]
pub struct ScrapeTimeout<S> {
    inner: S,
    timeout: Duration,
}

impl<S> Service<Request<Body>> for ScrapeTimeout<S>
where
    S: Service<Request<Body>, Response = Response<Body>, Error = Infallible>
        + Clone
        + Send
        + 'static,
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
        let timeout = self.timeout;
        let response = self.inner.call(request);

        Box::pin(async move {
            match tokio::time::timeout(timeout, response).await {
                Ok(result) => result,
                Err(_) => {
                    debug!(timeout = ?timeout, "Scrape timed out");
                    let mut resp = ScrapeResponse::new();
                    plain_error(
                        &mut resp,
                        &format!("Exceeded configured timeout of {:?}.", timeout),
                        StatusCode::SERVICE_UNAVAILABLE,
                    );
                    Ok(resp.into_response())
                },
            }
        })
    }
}
