//! Compilation error types.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use narrate_media::MediaError;
use narrate_models::ValidationError;

/// Result type for compilation.
pub type CompileResult<T> = Result<T, CompileError>;

/// Pipeline stage an error is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Validate,
    Workspace,
    Resolve,
    Normalize,
    Mux,
    Concat,
    Caption,
    Burn,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Validate => "validate",
            Stage::Workspace => "workspace",
            Stage::Resolve => "resolve",
            Stage::Normalize => "normalize",
            Stage::Mux => "mux",
            Stage::Concat => "concat",
            Stage::Caption => "caption",
            Stage::Burn => "burn",
        }
    }

    /// Kind reported for an ordinary failure in this stage.
    fn failure_kind(&self) -> ErrorKind {
        match self {
            Stage::Validate => ErrorKind::Validation,
            Stage::Workspace => ErrorKind::Workspace,
            Stage::Resolve => ErrorKind::Resolution,
            Stage::Normalize => ErrorKind::Normalize,
            Stage::Mux => ErrorKind::Mux,
            Stage::Concat => ErrorKind::Concat,
            Stage::Caption => ErrorKind::Caption,
            Stage::Burn => ErrorKind::Burn,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error taxonomy surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Resolution,
    Probe,
    Normalize,
    Mux,
    Concat,
    Caption,
    Burn,
    Timeout,
    Cancelled,
    Workspace,
}

impl ErrorKind {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation_error",
            ErrorKind::Resolution => "resolution_error",
            ErrorKind::Probe => "probe_error",
            ErrorKind::Normalize => "normalize_error",
            ErrorKind::Mux => "mux_error",
            ErrorKind::Concat => "concat_error",
            ErrorKind::Caption => "caption_error",
            ErrorKind::Burn => "burn_error",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Workspace => "workspace_error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A failed compilation, attributed to a stage and, when scene-scoped, a
/// scene id.
#[derive(Debug, Error)]
#[error(
    "{stage} failed{}: {message}",
    .scene_id.as_ref().map(|id| format!(" for scene '{}'", id)).unwrap_or_default()
)]
pub struct CompileError {
    pub kind: ErrorKind,
    pub stage: Stage,
    pub scene_id: Option<String>,
    pub message: String,
    #[source]
    source: Option<BoxError>,
}

impl CompileError {
    /// Create an error without an underlying cause.
    pub fn new(kind: ErrorKind, stage: Stage, scene_id: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            kind,
            stage,
            scene_id: scene_id.map(str::to_string),
            message: message.into(),
            source: None,
        }
    }

    /// A request rejected at the boundary.
    pub fn validation(err: ValidationError) -> Self {
        Self {
            kind: ErrorKind::Validation,
            stage: Stage::Validate,
            scene_id: err.scene_id().map(str::to_string),
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }

    /// The workspace could not be created or written.
    pub fn workspace(err: std::io::Error) -> Self {
        Self {
            kind: ErrorKind::Workspace,
            stage: Stage::Workspace,
            scene_id: None,
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }

    /// The run was aborted while `stage` was in flight.
    pub fn cancelled(stage: Stage, scene_id: Option<&str>) -> Self {
        Self::new(ErrorKind::Cancelled, stage, scene_id, "compilation cancelled")
    }

    /// Attribute a media failure to `stage`.
    pub fn from_media(stage: Stage, scene_id: Option<&str>, err: MediaError) -> Self {
        let kind = match &err {
            MediaError::Timeout(_) => ErrorKind::Timeout,
            MediaError::Cancelled => ErrorKind::Cancelled,
            MediaError::UnknownDuration(_) => ErrorKind::Probe,
            _ => stage.failure_kind(),
        };

        Self {
            kind,
            stage,
            scene_id: scene_id.map(str::to_string),
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }

    pub fn is_validation(&self) -> bool {
        self.kind == ErrorKind::Validation
    }

    pub fn is_timeout(&self) -> bool {
        self.kind == ErrorKind::Timeout
    }

    pub fn is_cancelled(&self) -> bool {
        self.kind == ErrorKind::Cancelled
    }
}

impl From<ValidationError> for CompileError {
    fn from(err: ValidationError) -> Self {
        Self::validation(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    fn test_media_error_attribution() {
        let err = CompileError::from_media(
            Stage::Normalize,
            Some("s2"),
            MediaError::UnknownDuration(PathBuf::from("clip.mp4")),
        );
        assert_eq!(err.kind, ErrorKind::Probe);
        assert_eq!(err.stage, Stage::Normalize);
        assert_eq!(err.scene_id.as_deref(), Some("s2"));
        assert!(err.to_string().starts_with("normalize failed for scene 's2': "));

        let err = CompileError::from_media(Stage::Burn, None, MediaError::Timeout(Duration::from_secs(900)));
        assert!(err.is_timeout());
        assert_eq!(err.stage, Stage::Burn);

        let err = CompileError::from_media(
            Stage::Mux,
            Some("s1"),
            MediaError::ffmpeg_failed("exit 1", None, Some(1)),
        );
        assert_eq!(err.kind, ErrorKind::Mux);
    }

    #[test]
    fn test_validation_carries_scene_id() {
        let err = CompileError::from(ValidationError::MissingAudio {
            scene_id: "intro".to_string(),
        });
        assert!(err.is_validation());
        assert_eq!(err.scene_id.as_deref(), Some("intro"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_kind_codes() {
        assert_eq!(ErrorKind::Resolution.code(), "resolution_error");
        assert_eq!(
            serde_json::to_string(&ErrorKind::Timeout).unwrap(),
            "\"timeout\""
        );
        assert_eq!(serde_json::to_string(&Stage::Concat).unwrap(), "\"concat\"");
    }
}
