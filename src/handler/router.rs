//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: route matching, method
//! validation, CORS decoration and access logging.

use crate::config::{AppState, HealthConfig};
use crate::handler::{health, images, upload};
use crate::http::{self, HttpResponse};
use crate::logger::{self, AccessLogEntry};
use hyper::body::{Body, Bytes};
use hyper::header::{REFERER, USER_AGENT};
use hyper::{Method, Request, Version};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

pub const UPLOAD_PATH: &str = "/upload";
pub const IMAGES_PREFIX: &str = "/images/";

/// Where a request path leads
#[derive(Debug, PartialEq, Eq)]
enum Route {
    Upload,
    /// Raw path segment after `/images/`
    Image(String),
    Liveness,
    Readiness,
    Unknown,
}

fn match_route(path: &str, health: &HealthConfig) -> Route {
    if path == UPLOAD_PATH {
        return Route::Upload;
    }
    if let Some(name) = path.strip_prefix(IMAGES_PREFIX) {
        return Route::Image(name.to_string());
    }
    if health.enabled {
        if path == health.liveness_path {
            return Route::Liveness;
        }
        if path == health.readiness_path {
            return Route::Readiness;
        }
    }
    Route::Unknown
}

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    remote_addr: SocketAddr,
) -> Result<HttpResponse, Infallible>
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>> + 'static,
{
    let started = Instant::now();
    let entry = state
        .config
        .logging
        .access_log
        .then(|| access_entry(&req, remote_addr));

    let mut response = route_request(req, &state).await;

    if state.config.http.enable_cors {
        http::cors::apply_cors_headers(response.headers_mut());
    }
    http::response::set_server_header(&mut response, &state.config.http.server_name);

    if let Some(mut entry) = entry {
        entry.status = response.status().as_u16();
        entry.body_bytes = usize::try_from(response.body().size_hint().exact().unwrap_or(0))
            .unwrap_or(usize::MAX);
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Route request based on path and method
async fn route_request<B>(req: Request<B>, state: &AppState) -> HttpResponse
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>> + 'static,
{
    let cors = state.config.http.enable_cors;
    let method = req.method().clone();

    match match_route(req.uri().path(), &state.config.health) {
        Route::Upload => match method {
            Method::POST => upload::handle_upload(req, state).await,
            Method::OPTIONS if cors => http::build_preflight_response(),
            _ => method_not_allowed(&method, if cors { "POST, OPTIONS" } else { "POST" }),
        },
        Route::Image(name) => match method {
            Method::GET | Method::HEAD => {
                images::serve_image(&name, req.headers(), method == Method::HEAD, state).await
            }
            Method::OPTIONS if cors => http::build_preflight_response(),
            _ => method_not_allowed(
                &method,
                if cors { "GET, HEAD, OPTIONS" } else { "GET, HEAD" },
            ),
        },
        Route::Liveness => match method {
            Method::GET | Method::HEAD => health::liveness(),
            _ => method_not_allowed(&method, "GET, HEAD"),
        },
        Route::Readiness => match method {
            Method::GET | Method::HEAD => health::readiness(state).await,
            _ => method_not_allowed(&method, "GET, HEAD"),
        },
        Route::Unknown => http::build_404_response(),
    }
}

fn method_not_allowed(method: &Method, allow: &'static str) -> HttpResponse {
    logger::log_warning(&format!("Method not allowed: {method}"));
    http::build_405_response(allow)
}

fn access_entry<B>(req: &Request<B>, remote_addr: SocketAddr) -> AccessLogEntry {
    let mut entry = AccessLogEntry::new(
        remote_addr.ip().to_string(),
        req.method().to_string(),
        req.uri().path().to_string(),
    );
    entry.query = req.uri().query().map(ToString::to_string);
    entry.http_version = match req.version() {
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "1.1",
    }
    .to_string();
    entry.referer = req
        .headers()
        .get(REFERER)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string);
    entry.user_agent = req
        .headers()
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string);
    entry
}
