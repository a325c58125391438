//! Scrape responses and the plain-text error responders.

use std::fmt;

use axum::{
    body::Body,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use bytes::{BufMut, BytesMut};

const ERROR_PREFIX: &str = "An error has occurred while serving metrics:\n\n";

/// Response under construction while a scrape is served.
///
/// Status and headers can be changed freely until it is turned into an
/// axum `Response`; the body is only ever appended to.
#[derive(Debug)]
pub struct ScrapeResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: BytesMut,
}

impl ScrapeResponse {
    /// Creates an empty 200 response.
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: BytesMut::new(),
        }
    }

    pub fn set_content_type(&mut self, content_type: &'static str) {
        self.headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(content_type),
        );
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }
}

impl Default for ScrapeResponse {
    fn default() -> Self {
        Self::new()
    }
}

impl IntoResponse for ScrapeResponse {
    fn into_response(self) -> Response {
        (self.status, self.headers, Body::from(self.body.freeze())).into_response()
    }
}

/// Writes a plain-text error.
///
/// Status and headers are replaced, the message is appended to the body as
/// one line.
pub fn plain_error(resp: &mut ScrapeResponse, message: &str, status: StatusCode) {
    resp.status = status;
    resp.headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    resp.headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    resp.body.put_slice(message.as_bytes());
    resp.body.put_u8(b'\n');
}

/// Writes a 500 describing a failed scrape.
pub fn http_error(resp: &mut ScrapeResponse, err: impl fmt::Display) {
    // The body below is never compressed.
    resp.headers.remove(header::CONTENT_ENCODING);
    plain_error(
        resp,
        &format!("{}{}", ERROR_PREFIX, err),
        StatusCode::INTERNAL_SERVER_ERROR,
    );
}
