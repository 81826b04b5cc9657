//! Liveness and readiness probes

use hyper::StatusCode;

use crate::config::AppState;
use crate::http::{self, HttpResponse};

pub fn liveness() -> HttpResponse {
    http::build_text_response(StatusCode::OK, "ok")
}

/// Ready while the storage directory is reachable
pub async fn readiness(state: &AppState) -> HttpResponse {
    if state.store.is_available().await {
        http::build_text_response(StatusCode::OK, "ok")
    } else {
        http::build_text_response(StatusCode::SERVICE_UNAVAILABLE, "storage unavailable")
    }
}
