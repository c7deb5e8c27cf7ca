use crate::AppState;
use crate::error::RelayError;
use crate::payload::{GenerateThumbnailBody, GenerationRequest};
use axum::extract::Extension;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use tracing::warn;

/// `POST /api/thumbnail/generate`: relay the upstream body verbatim with a 200
pub async fn generate_thumbnail(
    Extension(state): Extension<AppState>,
    body: Result<Json<GenerateThumbnailBody>, JsonRejection>,
) -> Result<(StatusCode, String), RelayError> {
    let Json(body) = body.map_err(|rejection| {
        warn!(%rejection, "Unreadable generation request");
        RelayError::MalformedRequest(rejection.body_text())
    })?;
    let request = GenerationRequest::try_from(body)?;

    let upstream_body = state.receiver.handle_generate(request).await?;
    Ok((StatusCode::OK, upstream_body))
}

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}
