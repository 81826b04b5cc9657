//! HTTP response building module
//!
//! Builders for every response the service emits. Builders never fail: a
//! builder error is logged and an empty response is returned instead.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{
    HeaderValue, ACCEPT_RANGES, ALLOW, CACHE_CONTROL, CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE,
    ETAG, LAST_MODIFIED, SERVER,
};
use hyper::{Response, StatusCode};
use serde::Serialize;

use super::cache::IMAGE_CACHE_CONTROL;
use super::range::ByteRange;

pub type HttpResponse = Response<Full<Bytes>>;

/// Validators attached to a served image
#[derive(Debug, Clone)]
pub struct Validators {
    pub etag: String,
    pub last_modified: Option<String>,
}

/// Plain-text response with a short human-readable message
pub fn build_text_response(status: StatusCode, message: impl Into<String>) -> HttpResponse {
    let body = Bytes::from(message.into());
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "text/plain; charset=utf-8")
        .header(CONTENT_LENGTH, body.len())
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// JSON response; serialization failures degrade to a 500
pub fn build_json_response<T: Serialize>(status: StatusCode, value: &T) -> HttpResponse {
    let body = match serde_json::to_vec(value) {
        Ok(body) => body,
        Err(e) => {
            crate::logger::log_error(&format!("Failed to serialize response body: {e}"));
            return build_text_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error");
        }
    };

    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "application/json")
        .header(CONTENT_LENGTH, body.len())
        .body(Full::new(Bytes::from(body)))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 404 Not Found response for unknown routes
pub fn build_404_response() -> HttpResponse {
    build_text_response(StatusCode::NOT_FOUND, "404 Not Found")
}

/// Build 405 Method Not Allowed response
pub fn build_405_response(allow: &'static str) -> HttpResponse {
    let mut response =
        build_text_response(StatusCode::METHOD_NOT_ALLOWED, "Invalid request method");
    response
        .headers_mut()
        .insert(ALLOW, HeaderValue::from_static(allow));
    response
}

/// Build 413 Payload Too Large response
pub fn build_413_response() -> HttpResponse {
    build_text_response(StatusCode::PAYLOAD_TOO_LARGE, "Payload Too Large")
}

/// Bare 200 answering a CORS preflight
pub fn build_preflight_response() -> HttpResponse {
    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_LENGTH, 0)
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error("OPTIONS", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 304 Not Modified response
pub fn build_304_response(validators: &Validators) -> HttpResponse {
    let mut builder = Response::builder()
        .status(StatusCode::NOT_MODIFIED)
        .header(ETAG, &validators.etag)
        .header(CACHE_CONTROL, IMAGE_CACHE_CONTROL);
    if let Some(last_modified) = &validators.last_modified {
        builder = builder.header(LAST_MODIFIED, last_modified);
    }

    builder.body(Full::new(Bytes::new())).unwrap_or_else(|e| {
        log_build_error("304", &e);
        Response::new(Full::new(Bytes::new()))
    })
}

/// Build 416 Range Not Satisfiable response
pub fn build_416_response(total_size: usize) -> HttpResponse {
    let mut response =
        build_text_response(StatusCode::RANGE_NOT_SATISFIABLE, "Range Not Satisfiable");
    if let Ok(value) = HeaderValue::from_str(&format!("bytes */{total_size}")) {
        response.headers_mut().insert(CONTENT_RANGE, value);
    }
    response
}

/// Build 200 (whole file) or 206 (one range) response for a stored image.
///
/// `data` is the full file; for a range only the selected span is sent.
/// HEAD requests get every header and an empty body.
pub fn build_image_response(
    data: Bytes,
    content_type: &str,
    validators: &Validators,
    range: Option<ByteRange>,
    is_head: bool,
) -> HttpResponse {
    let total_size = data.len();
    let (status, body) = match range {
        Some(r) => (StatusCode::PARTIAL_CONTENT, data.slice(r.start..=r.end)),
        None => (StatusCode::OK, data),
    };
    let content_length = body.len();

    let mut builder = Response::builder()
        .status(status)
        .header(CONTENT_TYPE, content_type)
        .header(CONTENT_LENGTH, content_length)
        .header(ACCEPT_RANGES, "bytes")
        .header(ETAG, &validators.etag)
        .header(CACHE_CONTROL, IMAGE_CACHE_CONTROL);
    if let Some(last_modified) = &validators.last_modified {
        builder = builder.header(LAST_MODIFIED, last_modified);
    }
    if let Some(r) = range {
        builder = builder.header(CONTENT_RANGE, r.content_range(total_size));
    }

    let body = if is_head { Bytes::new() } else { body };
    builder.body(Full::new(body)).unwrap_or_else(|e| {
        log_build_error(status.as_str(), &e);
        Response::new(Full::new(Bytes::new()))
    })
}

/// Stamp the `Server` header on an outgoing response
pub fn set_server_header(response: &mut HttpResponse, server_name: &str) {
    if let Ok(value) = HeaderValue::from_str(server_name) {
        response.headers_mut().insert(SERVER, value);
    }
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}
