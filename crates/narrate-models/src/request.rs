//! Wire-level compile request and boundary validation.
//!
//! The payload types accept the field names used by the web client
//! (`narration`, `duration`, `media`, `url`, `subtitles`) as aliases, and a
//! source may be either a locator string or a tagged [`MediaReference`].

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::scene::{MediaReference, Scene, VisualAsset, VisualKind};

/// One compilation request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompileRequest {
    /// Scenes in narrative order
    #[serde(default)]
    pub scenes: Vec<ScenePayload>,

    /// Burn word-level captions into the final video
    #[serde(default, alias = "subtitles")]
    pub burn_subtitles: bool,
}

/// A scene as submitted by the caller. Every field may be missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScenePayload {
    #[serde(default)]
    pub id: String,

    #[serde(default, alias = "narration")]
    pub narration_text: String,

    #[serde(default, alias = "duration")]
    pub target_duration_seconds: Option<f64>,

    #[serde(default, alias = "media")]
    pub visual: Option<VisualPayload>,

    #[serde(default)]
    pub audio: Option<AudioPayload>,
}

/// Visual half of a scene payload.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct VisualPayload {
    #[serde(alias = "type")]
    pub kind: VisualKind,
    #[serde(alias = "url")]
    pub source: SourcePayload,
}

/// Audio half of a scene payload.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AudioPayload {
    #[serde(alias = "url")]
    pub source: SourcePayload,
}

/// Either a locator string or an explicit reference object.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum SourcePayload {
    Locator(String),
    Reference(MediaReference),
}

impl SourcePayload {
    fn into_reference(
        self,
        scene_id: &str,
        field: &'static str,
    ) -> Result<MediaReference, ValidationError> {
        match self {
            SourcePayload::Reference(reference) => Ok(reference),
            SourcePayload::Locator(locator) => MediaReference::parse_locator(&locator).map_err(
                |source| ValidationError::InvalidSource {
                    scene_id: scene_id.to_string(),
                    field,
                    source,
                },
            ),
        }
    }
}

/// A request that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRequest {
    pub scenes: Vec<Scene>,
    pub burn_subtitles: bool,
}

impl ValidatedRequest {
    /// Sum of the requested scene durations.
    pub fn target_duration_seconds(&self) -> f64 {
        self.scenes.iter().map(|s| s.target_duration_seconds).sum()
    }
}

impl CompileRequest {
    /// Validate into typed scenes.
    ///
    /// Scenes are checked in order and the first problem is reported.
    pub fn validate(&self) -> Result<ValidatedRequest, ValidationError> {
        self.clone().into_validated()
    }

    /// Validate into typed scenes, moving the payloads instead of copying
    /// them.
    pub fn into_validated(self) -> Result<ValidatedRequest, ValidationError> {
        if self.scenes.is_empty() {
            return Err(ValidationError::EmptySceneList);
        }

        let scenes = self
            .scenes
            .into_iter()
            .enumerate()
            .map(|(index, payload)| payload.into_scene(index))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ValidatedRequest {
            scenes,
            burn_subtitles: self.burn_subtitles,
        })
    }
}

impl ScenePayload {
    fn into_scene(self, index: usize) -> Result<Scene, ValidationError> {
        let id = self.id.trim().to_string();
        if id.is_empty() {
            return Err(ValidationError::MissingSceneId { index });
        }

        let duration = self
            .target_duration_seconds
            .ok_or_else(|| ValidationError::MissingDuration {
                scene_id: id.clone(),
            })?;
        if !duration.is_finite() || duration <= 0.0 {
            return Err(ValidationError::NonPositiveDuration {
                scene_id: id,
                duration,
            });
        }

        let visual = self.visual.ok_or_else(|| ValidationError::MissingVisual {
            scene_id: id.clone(),
        })?;
        let audio = self.audio.ok_or_else(|| ValidationError::MissingAudio {
            scene_id: id.clone(),
        })?;

        let visual = VisualAsset {
            kind: visual.kind,
            source: visual.source.into_reference(&id, "visual")?,
        };
        let audio = audio.source.into_reference(&id, "audio")?;

        Ok(Scene {
            id,
            narration_text: self.narration_text,
            target_duration_seconds: duration,
            visual,
            audio,
        })
    }
}

impl CompileRequest {
    /// JSON Schema describing the accepted request body.
    pub fn json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(CompileRequest)
    }
}
