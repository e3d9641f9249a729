//! Request validation errors.

use thiserror::Error;

use crate::scene::LocatorError;

/// A compile request that cannot be turned into typed scenes.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("At least one scene is required")]
    EmptySceneList,

    #[error("Scene #{index} has no id")]
    MissingSceneId { index: usize },

    #[error("Scene {scene_id} is missing a target duration")]
    MissingDuration { scene_id: String },

    #[error("Scene {scene_id} has a non-positive duration: {duration}")]
    NonPositiveDuration { scene_id: String, duration: f64 },

    #[error("Scene {scene_id} is missing media data")]
    MissingVisual { scene_id: String },

    #[error("Scene {scene_id} is missing audio data")]
    MissingAudio { scene_id: String },

    #[error("Scene {scene_id} has an invalid {field} source: {source}")]
    InvalidSource {
        scene_id: String,
        field: &'static str,
        #[source]
        source: LocatorError,
    },

    #[error("Malformed request body: {0}")]
    MalformedBody(String),
}

impl ValidationError {
    /// Create a malformed body error.
    pub fn malformed_body(message: impl Into<String>) -> Self {
        Self::MalformedBody(message.into())
    }

    /// Scene the error refers to, when it is scene-scoped.
    pub fn scene_id(&self) -> Option<&str> {
        match self {
            ValidationError::MissingDuration { scene_id }
            | ValidationError::NonPositiveDuration { scene_id, .. }
            | ValidationError::MissingVisual { scene_id }
            | ValidationError::MissingAudio { scene_id }
            | ValidationError::InvalidSource { scene_id, .. } => Some(scene_id),
            ValidationError::EmptySceneList
            | ValidationError::MissingSceneId { .. }
            | ValidationError::MalformedBody(_) => None,
        }
    }
}
