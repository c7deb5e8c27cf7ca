use crate::error::RELAY_ERROR_HEADER;
use axum::{body::Body, http::Request, middleware::Next, response::Response};
use std::time::Instant;
use tracing::{debug, error, warn};

/// Logs every relay response, escalating the level for failed ones
pub async fn log_relay_outcome(req: Request<Body>, next: Next) -> Response {
    let started = Instant::now();
    let uri = req.uri().clone();
    let method = req.method().clone();

    let response = next.run(req).await;
    let status = response.status();
    let elapsed_ms = started.elapsed().as_millis() as u64;
    let kind = response
        .headers()
        .get(RELAY_ERROR_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("none");

    if status.is_client_error() {
        warn!(%method, %uri, %status, kind, elapsed_ms, "Rejected request");
    } else if status.is_server_error() {
        error!(%method, %uri, %status, kind, elapsed_ms, "Relay failed");
    } else {
        debug!(%method, %uri, %status, elapsed_ms, "Relayed");
    }

    response
}
