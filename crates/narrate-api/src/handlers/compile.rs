//! Compile endpoint.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::{Extension, Json};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;
use std::time::Instant;
use tracing::{info, warn};

use narrate_compiler::RunOptions;
use narrate_models::{CompileRequest, JobId};

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::middleware::RequestId;
use crate::state::AppState;

/// Successful compile response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileResponse {
    pub job_id: JobId,
    /// The final MP4 as a `data:video/mp4;base64,` URL
    pub video_url: String,
    pub total_duration_seconds: f64,
    pub scene_durations: Vec<f64>,
}

/// `POST /api/video/compile`
///
/// Compiles the scenes and answers with the finished video inline. Requests
/// beyond the concurrency limit wait for a free slot. Dropping the
/// connection drops the run, which kills its FFmpeg children and removes
/// its workspace.
pub async fn compile_video(
    State(state): State<AppState>,
    request_id: Option<Extension<RequestId>>,
    payload: Result<Json<CompileRequest>, JsonRejection>,
) -> ApiResult<Json<CompileResponse>> {
    let Json(request) = payload?;

    // Reject bad input before taking a slot
    let request = request.into_validated()?;

    let _permit = state
        .compile_slots
        .clone()
        .acquire_owned()
        .await
        .map_err(|_| ApiError::internal("Compilation slots closed"))?;

    let job_id = JobId::new();
    let request_id = request_id.map(|Extension(id)| id.0).unwrap_or_default();
    info!(
        job_id = %job_id,
        request_id = %request_id,
        scenes = request.scenes.len(),
        "Accepted compile request"
    );
    metrics::record_compile_started(request.scenes.len(), request.burn_subtitles);

    let start = Instant::now();
    let options = RunOptions::new().with_job_id(job_id.clone());
    let timeout = state.config.request_timeout;

    let video = match tokio::time::timeout(timeout, state.compiler.compile_validated(&request, options)).await {
        Ok(Ok(video)) => video,
        Ok(Err(err)) => {
            metrics::record_compile_failed(err.stage.as_str(), err.kind.code(), start.elapsed().as_secs_f64());
            return Err(err.into());
        }
        Err(_) => {
            warn!(job_id = %job_id, timeout_secs = timeout.as_secs(), "Compile request timed out");
            metrics::record_compile_failed("request", "timeout", start.elapsed().as_secs_f64());
            return Err(ApiError::Timeout(timeout));
        }
    };

    let bytes = video
        .read()
        .await
        .map_err(|e| ApiError::internal(format!("Failed to read compiled video: {}", e)))?;
    let summary = video.summary().clone();
    drop(video);

    let video_url = tokio::task::spawn_blocking(move || {
        format!("data:video/mp4;base64,{}", STANDARD.encode(&bytes))
    })
    .await
    .map_err(|e| ApiError::internal(format!("Failed to encode video: {}", e)))?;

    metrics::record_compile_completed(start.elapsed().as_secs_f64(), summary.total_duration_seconds);

    Ok(Json(CompileResponse {
        job_id: summary.job_id,
        video_url,
        total_duration_seconds: summary.total_duration_seconds,
        scene_durations: summary.scene_durations,
    }))
}
