//! Structured job logging.
//!
//! Every compilation gets a [`JobLogger`] so lifecycle events carry the same
//! `job_id` and `operation` fields whether the run came from the HTTP API or
//! the CLI.

use tracing::{debug, error, info, warn, Span};

use narrate_models::JobId;

use crate::error::CompileError;
use crate::pipeline::{CompileSummary, PipelineState};

#[derive(Debug, Clone)]
pub struct JobLogger {
    job_id: String,
    operation: &'static str,
}

impl JobLogger {
    pub fn new(job_id: &JobId, operation: &'static str) -> Self {
        Self {
            job_id: job_id.to_string(),
            operation,
        }
    }

    pub fn log_start(&self, scenes: usize, burn_subtitles: bool) {
        info!(
            job_id = %self.job_id,
            operation = self.operation,
            scenes,
            burn_subtitles,
            "Compilation started"
        );
    }

    /// Record a state transition.
    pub fn log_state(&self, state: &PipelineState) {
        match state.scene() {
            Some((index, scene_id)) => debug!(
                job_id = %self.job_id,
                operation = self.operation,
                state = state.name(),
                scene_index = index,
                scene_id,
                "Pipeline state"
            ),
            None => debug!(
                job_id = %self.job_id,
                operation = self.operation,
                state = state.name(),
                "Pipeline state"
            ),
        }
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            job_id = %self.job_id,
            operation = self.operation,
            "{}", message
        );
    }

    pub fn log_failure(&self, err: &CompileError) {
        error!(
            job_id = %self.job_id,
            operation = self.operation,
            kind = err.kind.code(),
            stage = err.stage.as_str(),
            scene_id = err.scene_id.as_deref().unwrap_or(""),
            "Compilation failed: {}", err
        );
    }

    pub fn log_completion(&self, summary: &CompileSummary) {
        info!(
            job_id = %self.job_id,
            operation = self.operation,
            total_duration = summary.total_duration_seconds,
            scenes = summary.scene_durations.len(),
            captions = summary.caption_count,
            "Compilation completed"
        );
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Span wrapping the whole run.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "compile",
            job_id = %self.job_id,
            operation = self.operation
        )
    }
}
