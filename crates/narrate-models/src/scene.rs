//! Strongly typed scene model.
//!
//! A [`Scene`] is what the pipeline consumes after boundary validation. It
//! never carries optional media: the wire-level [`crate::ScenePayload`] is
//! checked and converted before any transcoding starts.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use url::Url;

/// Kind of visual asset attached to a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum VisualKind {
    /// Still image, held for the whole scene
    Photo,
    /// Video clip, trimmed or looped to the scene duration
    Video,
}

impl VisualKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            VisualKind::Photo => "photo",
            VisualKind::Video => "video",
        }
    }
}

impl fmt::Display for VisualKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Content kind of a resolved asset. Decides the local file suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Photo,
    Video,
    Audio,
}

impl AssetKind {
    /// File suffix used when the MIME type is unknown.
    pub fn default_suffix(&self) -> &'static str {
        match self {
            AssetKind::Photo => ".jpg",
            AssetKind::Video => ".mp4",
            AssetKind::Audio => ".mp3",
        }
    }

    /// File suffix for an asset of this kind with an optional MIME type.
    ///
    /// MIME parameters (`;codecs=...`) are ignored.
    pub fn suffix_for(&self, mime_type: Option<&str>) -> &'static str {
        let essence = mime_type
            .and_then(|m| m.split(';').next())
            .map(|m| m.trim().to_ascii_lowercase());

        let suffix = match (self, essence.as_deref()) {
            (AssetKind::Photo, Some("image/png")) => Some(".png"),
            (AssetKind::Photo, Some("image/webp")) => Some(".webp"),
            (AssetKind::Photo, Some("image/gif")) => Some(".gif"),
            (AssetKind::Video, Some("video/webm")) => Some(".webm"),
            (AssetKind::Video, Some("video/quicktime")) => Some(".mov"),
            (AssetKind::Audio, Some("audio/wav" | "audio/x-wav" | "audio/wave")) => Some(".wav"),
            (AssetKind::Audio, Some("audio/ogg")) => Some(".ogg"),
            (AssetKind::Audio, Some("audio/aac")) => Some(".aac"),
            (AssetKind::Audio, Some("audio/mp4")) => Some(".m4a"),
            _ => None,
        };

        suffix.unwrap_or_else(|| self.default_suffix())
    }
}

impl From<VisualKind> for AssetKind {
    fn from(kind: VisualKind) -> Self {
        match kind {
            VisualKind::Photo => AssetKind::Photo,
            VisualKind::Video => AssetKind::Video,
        }
    }
}

/// Errors parsing a single-string source locator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocatorError {
    #[error("Unsupported source scheme: {0}")]
    UnsupportedScheme(String),

    #[error("Malformed data URL: {0}")]
    MalformedDataUrl(&'static str),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Where the bytes of an asset come from.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MediaReference {
    /// Content carried in the request as a base64 payload
    #[serde(rename_all = "camelCase")]
    Inline { mime_type: String, data: String },
    /// Content that must be fetched over HTTP(S)
    Remote { url: Url },
}

impl MediaReference {
    /// Parse a locator string: a base64 `data:` URL or an `http(s)` URL.
    pub fn parse_locator(locator: &str) -> Result<Self, LocatorError> {
        let locator = locator.trim();

        if let Some(rest) = locator.strip_prefix("data:") {
            let (meta, payload) = rest
                .split_once(',')
                .ok_or(LocatorError::MalformedDataUrl("missing ',' separator"))?;

            let mut parts = meta.split(';');
            let mime_type = parts.next().unwrap_or_default().trim();
            if !parts.any(|p| p.eq_ignore_ascii_case("base64")) {
                return Err(LocatorError::MalformedDataUrl("payload must be base64-encoded"));
            }
            if payload.is_empty() {
                return Err(LocatorError::MalformedDataUrl("empty payload"));
            }

            return Ok(MediaReference::Inline {
                mime_type: if mime_type.is_empty() {
                    "application/octet-stream".to_string()
                } else {
                    mime_type.to_string()
                },
                data: payload.to_string(),
            });
        }

        let url = Url::parse(locator)?;
        match url.scheme() {
            "http" | "https" => Ok(MediaReference::Remote { url }),
            other => Err(LocatorError::UnsupportedScheme(other.to_string())),
        }
    }

    /// Declared MIME type, known up front only for inline payloads.
    pub fn mime_type(&self) -> Option<&str> {
        match self {
            MediaReference::Inline { mime_type, .. } => Some(mime_type),
            MediaReference::Remote { .. } => None,
        }
    }

    /// Short description safe for logs (never includes the payload).
    pub fn describe(&self) -> String {
        match self {
            MediaReference::Inline { mime_type, data } => {
                format!("inline {} ({} base64 chars)", mime_type, data.len())
            }
            MediaReference::Remote { url } => format!("remote {}", url),
        }
    }
}

impl fmt::Debug for MediaReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

/// The visual half of a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VisualAsset {
    pub kind: VisualKind,
    pub source: MediaReference,
}

/// One narrative unit: narration text, a visual and an audio track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    pub id: String,
    pub narration_text: String,
    pub target_duration_seconds: f64,
    pub visual: VisualAsset,
    pub audio: MediaReference,
}

impl Scene {
    /// Whitespace-delimited, non-empty narration words.
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.narration_text.split_whitespace()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_data_url() {
        let reference = MediaReference::parse_locator("data:audio/mpeg;base64,SUQzBAA=").unwrap();
        assert_eq!(
            reference,
            MediaReference::Inline {
                mime_type: "audio/mpeg".to_string(),
                data: "SUQzBAA=".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_data_url_requires_base64() {
        let err = MediaReference::parse_locator("data:text/plain,hello").unwrap_err();
        assert!(matches!(err, LocatorError::MalformedDataUrl(_)));
    }

    #[test]
    fn test_parse_remote_url() {
        let reference = MediaReference::parse_locator("https://cdn.example.com/a.mp4").unwrap();
        assert!(matches!(reference, MediaReference::Remote { .. }));
        assert_eq!(reference.mime_type(), None);
    }

    #[test]
    fn test_rejects_other_schemes() {
        let err = MediaReference::parse_locator("file:///etc/passwd").unwrap_err();
        assert_eq!(err, LocatorError::UnsupportedScheme("file".to_string()));
        assert!(MediaReference::parse_locator("not a url").is_err());
    }

    #[test]
    fn test_debug_hides_payload() {
        let reference = MediaReference::Inline {
            mime_type: "image/png".to_string(),
            data: "A".repeat(4096),
        };
        let debug = format!("{:?}", reference);
        assert!(debug.contains("4096 base64 chars"));
        assert!(debug.len() < 100);
    }

    #[test]
    fn test_suffix_for_mime() {
        assert_eq!(AssetKind::Photo.suffix_for(Some("image/png")), ".png");
        assert_eq!(AssetKind::Photo.suffix_for(Some("image/jpeg")), ".jpg");
        assert_eq!(AssetKind::Video.suffix_for(None), ".mp4");
        assert_eq!(AssetKind::Audio.suffix_for(Some("audio/wav; codecs=1")), ".wav");
        assert_eq!(AssetKind::Audio.suffix_for(Some("audio/mpeg")), ".mp3");
    }

    #[test]
    fn test_tagged_reference_json() {
        let json = r#"{"type":"inline","mimeType":"image/png","data":"iVBORw0KGgo="}"#;
        let reference: MediaReference = serde_json::from_str(json).unwrap();
        assert_eq!(reference.mime_type(), Some("image/png"));

        let json = r#"{"type":"remote","url":"https://example.com/x.mp3"}"#;
        let reference: MediaReference = serde_json::from_str(json).unwrap();
        assert!(matches!(reference, MediaReference::Remote { .. }));
    }

    #[test]
    fn test_scene_words_skip_blank_runs() {
        let scene = Scene {
            id: "s1".to_string(),
            narration_text: "  one\ttwo \n three  ".to_string(),
            target_duration_seconds: 3.0,
            visual: VisualAsset {
                kind: VisualKind::Photo,
                source: MediaReference::parse_locator("https://example.com/a.jpg").unwrap(),
            },
            audio: MediaReference::parse_locator("https://example.com/a.mp3").unwrap(),
        };
        assert_eq!(scene.words().collect::<Vec<_>>(), vec!["one", "two", "three"]);
    }
}
