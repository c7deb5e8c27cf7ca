use axum::body::Body;
use axum::http::{Response, StatusCode};
use axum::response::IntoResponse;
use std::error::Error as _;
use thiserror::Error;

/// Response header naming the failure kind on error responses
pub const RELAY_ERROR_HEADER: &str = "x-relay-error";

/// Relay errors, each mapped to the status code returned to the caller
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error("Failed to reach upstream: {0}")]
    NetworkFailure(#[from] reqwest::Error),

    #[error("Upstream returned {status}: {body}")]
    UpstreamError { status: StatusCode, body: String },
}

impl RelayError {
    pub fn kind(&self) -> &'static str {
        match self {
            RelayError::MalformedRequest(_) => "malformed_request",
            RelayError::NetworkFailure(_) => "network_failure",
            RelayError::UpstreamError { .. } => "upstream_error",
        }
    }

    /// Convert error to the HTTP status code returned by the relay
    pub fn to_err_code(&self) -> StatusCode {
        match self {
            RelayError::MalformedRequest(_) => StatusCode::BAD_REQUEST,
            RelayError::NetworkFailure(err) if err.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
            RelayError::NetworkFailure(_) | RelayError::UpstreamError { .. } => {
                StatusCode::BAD_GATEWAY
            }
        }
    }

    /// Upstream status, if the upstream answered at all
    pub fn upstream_status(&self) -> Option<StatusCode> {
        match self {
            RelayError::UpstreamError { status, .. } => Some(*status),
            RelayError::NetworkFailure(err) => err.status(),
            RelayError::MalformedRequest(_) => None,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> axum::response::Response {
        let status = self.to_err_code();
        let mut message = self.to_string();
        if let RelayError::NetworkFailure(err) = &self {
            // reqwest's Display stops at the outermost layer
            let mut source = err.source();
            while let Some(cause) = source {
                message.push_str(": ");
                message.push_str(&cause.to_string());
                source = cause.source();
            }
        }

        Response::builder()
            .status(status)
            .header(RELAY_ERROR_HEADER, self.kind())
            .body(Body::from(message))
            .unwrap_or_else(|_| status.into_response())
    }
}
