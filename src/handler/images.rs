//! `GET /images/<name>`: serve a stored image

use hyper::body::Bytes;
use hyper::header::{HeaderMap, HeaderName, IF_MODIFIED_SINCE, IF_NONE_MATCH, RANGE};
use hyper::StatusCode;
use percent_encoding::percent_decode_str;

use crate::config::AppState;
use crate::http::{self, cache, mime, HttpResponse, RangeRequest, Validators};
use crate::logger;
use crate::storage::StoredImage;

pub const NOT_FOUND_MESSAGE: &str = "Image not found";

/// Serve the image named by the raw (still percent-encoded) path segment
pub async fn serve_image(
    raw_name: &str,
    headers: &HeaderMap,
    is_head: bool,
    state: &AppState,
) -> HttpResponse {
    let Ok(name) = percent_decode_str(raw_name).decode_utf8() else {
        return image_not_found();
    };

    match state.store.open(&name).await {
        Ok(Some(image)) => build_response(image, headers, is_head),
        Ok(None) => image_not_found(),
        Err(e) => {
            logger::log_error(&format!("Failed to load image '{name}': {e}"));
            http::build_text_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load image")
        }
    }
}

fn image_not_found() -> HttpResponse {
    http::build_text_response(StatusCode::NOT_FOUND, NOT_FOUND_MESSAGE)
}

fn header<'a>(headers: &'a HeaderMap, name: &HeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn build_response(image: StoredImage, headers: &HeaderMap, is_head: bool) -> HttpResponse {
    let content_type = mime::content_type_for(image.extension());
    let validators = Validators {
        etag: cache::generate_etag(&image.content),
        last_modified: image.modified.map(cache::format_http_date),
    };

    // If-None-Match wins; If-Modified-Since only counts without it
    let if_none_match = header(headers, &IF_NONE_MATCH);
    let unchanged = if if_none_match.is_some() {
        cache::check_etag_match(if_none_match, &validators.etag)
    } else {
        cache::not_modified_since(header(headers, &IF_MODIFIED_SINCE), image.modified)
    };
    if unchanged {
        return http::build_304_response(&validators);
    }

    let data = Bytes::from(image.content);
    let range = match http::parse_range_header(header(headers, &RANGE), data.len()) {
        RangeRequest::Full => None,
        RangeRequest::Partial(r) => Some(r),
        RangeRequest::Unsatisfiable => return http::build_416_response(data.len()),
    };

    http::build_image_response(data, content_type, &validators, range, is_head)
}
