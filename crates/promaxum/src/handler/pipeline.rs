//! Gather, negotiate and encode one scrape.

use std::error::Error as StdError;
use std::sync::Arc;

use bytes::{BufMut, BytesMut};
use promaxum_core::{
    EncodeError, Format, Gathered, Gatherer, negotiate, negotiate_including_open_metrics,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::buffer::BufferPool;
use crate::handler::errors::ErrorCounter;
use crate::options::{ErrorHandling, HandlerOpts};
use crate::response::{ScrapeResponse, http_error};

/// State shared by every scrape served by one handler.
pub(crate) struct Pipeline {
    pub(crate) gatherer: Arc<dyn Gatherer>,
    pub(crate) opts: HandlerOpts,
    pub(crate) errors: ErrorCounter,
    pub(crate) buffers: Arc<BufferPool>,
}

impl Pipeline {
    /// Runs the blocking part of a scrape.
    ///
    /// `cancel` is checked between metric families; once it fires the
    /// remaining families are skipped and the partial response discarded.
    pub(crate) fn run(&self, accept: Option<&str>, cancel: &CancellationToken) -> ScrapeResponse {
        let mut resp = ScrapeResponse::new();

        let Gathered { families, error } = self.gatherer.gather();
        if let Some(err) = error {
            self.log("error gathering metrics:", &err);
            self.errors.gathering();
            match self.opts.error_handling {
                ErrorHandling::PanicOnError => panic!("error gathering metrics: {}", err),
                ErrorHandling::ContinueOnError if !families.is_empty() => {},
                ErrorHandling::ContinueOnError | ErrorHandling::HttpErrorOnError => {
                    http_error(&mut resp, &err);
                    return resp;
                },
            }
        }

        let format = self.negotiate(accept);
        resp.set_content_type(format.content_type());

        let mut buf = self.buffers.checkout();
        {
            let mut encoder = format.encoder(&mut *buf);
            for family in &families {
                if cancel.is_cancelled() {
                    debug!(format = %format, "Scrape abandoned, stopping encode");
                    return resp;
                }
                if let Err(err) = encoder.encode(family) {
                    if self.encode_failed(&mut resp, err) {
                        return resp;
                    }
                }
            }
            if let Err(err) = encoder.close() {
                if self.encode_failed(&mut resp, err) {
                    return resp;
                }
            }
        }

        // The pooled buffer stays with the pool; the response gets an
        // exact-size copy.
        resp.body = BytesMut::with_capacity(buf.len());
        resp.body.put_slice(&buf);
        resp
    }

    fn negotiate(&self, accept: Option<&str>) -> Format {
        if self.opts.enable_open_metrics {
            negotiate_including_open_metrics(accept)
        } else {
            negotiate(accept)
        }
    }

    /// Applies the error policy to an encode failure. Returns true when the
    /// scrape must stop.
    fn encode_failed(&self, resp: &mut ScrapeResponse, err: EncodeError) -> bool {
        self.log("error encoding and sending metric family:", &err);
        self.errors.encoding();
        match self.opts.error_handling {
            ErrorHandling::PanicOnError => {
                panic!("error encoding and sending metric family: {}", err)
            },
            ErrorHandling::HttpErrorOnError => {
                http_error(resp, format_args!("failed on {}", err));
                true
            },
            ErrorHandling::ContinueOnError => {
                if self.opts.error_log.is_none() {
                    warn!(error = %err, "Skipping metric family that failed to encode");
                }
                false
            },
        }
    }

    fn log(&self, context: &str, error: &dyn StdError) {
        if let Some(log) = &self.opts.error_log {
            log.log(context, error);
        }
    }
}
