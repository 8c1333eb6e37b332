//! Transcode API handlers.

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use mediactl_core::dispatch::{decode_path, PONG};
use mediactl_core::{probe, DispatchOutcome, DispatchRequest, TranscodeError, TranscodeJob};

use crate::metrics::{collect_dynamic_metrics, encode_metrics};
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for starting a transcode
#[derive(Debug, Deserialize)]
pub struct TranscodeParams {
    /// User the job belongs to; a user has at most one running job
    pub user: String,
    /// Base64-encoded absolute source path
    pub file: String,
}

/// Query parameters for stopping a transcode
#[derive(Debug, Deserialize)]
pub struct StopParams {
    pub user: String,
}

#[derive(Debug, Serialize)]
pub struct TranscodeResponse {
    pub pid: u32,
    pub output_file: String,
}

#[derive(Debug, Serialize)]
pub struct StopResponse {
    pub stopped: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

fn transcode_error(err: TranscodeError) -> ApiError {
    let status = match &err {
        e if e.is_client_error() => StatusCode::BAD_REQUEST,
        TranscodeError::Probe { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        TranscodeError::RemoteUnavailable { .. } | TranscodeError::RemoteRejected { .. } => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    api_error(status, err.to_string())
}

// ============================================================================
// Handlers
// ============================================================================

/// Liveness probe answered to dispatchers.
pub async fn ping() -> &'static str {
    PONG
}

/// Start a transcode with default options, replacing the user's previous one.
pub async fn transcode(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TranscodeParams>,
) -> Result<Json<TranscodeResponse>, ApiError> {
    let path = decode_path(&params.file).map_err(transcode_error)?;
    let config = &state.config().transcode;

    let source = probe(&config.ffprobe_path, &path)
        .await
        .map_err(transcode_error)?;

    let mut job = TranscodeJob::new(source, config);
    let handle = job.start(state.manager()).await.map_err(|e| {
        warn!(user = %params.user, path = %path.display(), error = %e, "Transcode request failed");
        transcode_error(e)
    })?;

    state
        .registry()
        .replace(&params.user, handle.clone(), state.manager())
        .await;
    info!(user = %params.user, pid = handle.pid, path = %path.display(), "Transcode started");

    Ok(Json(TranscodeResponse {
        pid: handle.pid,
        output_file: handle.output_file.display().to_string(),
    }))
}

/// Stop the user's transcode, if any.
pub async fn stop(
    State(state): State<Arc<AppState>>,
    Query(params): Query<StopParams>,
) -> Json<StopResponse> {
    let stopped = state.registry().stop(&params.user, state.manager()).await;
    Json(StopResponse { stopped })
}

/// Route a playback request: play as-is or hand it to the remote transcode host.
pub async fn play(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TranscodeParams>,
) -> Result<Json<DispatchOutcome>, ApiError> {
    let Some(dispatcher) = state.dispatcher() else {
        return Err(api_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "No remote transcode host configured",
        ));
    };
    let path = decode_path(&params.file).map_err(transcode_error)?;

    let outcome = dispatcher
        .dispatch(&DispatchRequest::new(params.user, path))
        .await
        .require_accepted()
        .map_err(transcode_error)?;
    Ok(Json(outcome))
}

/// Prometheus scrape endpoint.
pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    collect_dynamic_metrics(&state).await;
    match encode_metrics() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}
