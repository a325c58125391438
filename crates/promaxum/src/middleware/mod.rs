//! Middleware stack para el servidor HTTP.
//!
//! - `RequestIdLayer`: genera o propaga X-Request-Id
//! - `LoggingLayer`: logging estructurado de cada scrape
//! - `ScrapeTimeoutLayer`: corta los scrapes que exceden el timeout

mod logging;
mod request_id;
mod timeout;

pub use logging::{LoggingLayer, LoggingMiddleware};
pub use request_id::{REQUEST_ID_HEADER, RequestIdLayer, RequestIdMiddleware};
pub use timeout::{ScrapeTimeout, ScrapeTimeoutLayer};
