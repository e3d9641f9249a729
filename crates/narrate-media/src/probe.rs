//! FFprobe media information.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::command::check_ffprobe;
use crate::error::{MediaError, MediaResult};

/// Media file information.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MediaInfo {
    /// Duration in seconds, 0 when unknown
    pub duration: f64,
    /// Width of the first video stream
    pub width: u32,
    /// Height of the first video stream
    pub height: u32,
    /// Codec of the first video stream
    pub video_codec: Option<String>,
    /// Whether the container carries at least one audio stream
    pub has_audio: bool,
}

impl MediaInfo {
    pub fn has_video(&self) -> bool {
        self.video_codec.is_some()
    }
}

/// FFprobe JSON output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    format: Option<FfprobeFormat>,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    duration: Option<String>,
}

impl FfprobeOutput {
    fn into_info(self) -> MediaInfo {
        let video = self
            .streams
            .iter()
            .find(|s| s.codec_type.as_deref() == Some("video"));

        // Container duration first, stream duration as fallback
        let duration = self
            .format
            .as_ref()
            .and_then(|f| parse_seconds(f.duration.as_deref()))
            .or_else(|| self.streams.iter().find_map(|s| parse_seconds(s.duration.as_deref())))
            .unwrap_or(0.0);

        MediaInfo {
            duration,
            width: video.and_then(|v| v.width).unwrap_or(0),
            height: video.and_then(|v| v.height).unwrap_or(0),
            video_codec: video.and_then(|v| v.codec_name.clone()),
            has_audio: self
                .streams
                .iter()
                .any(|s| s.codec_type.as_deref() == Some("audio")),
        }
    }
}

fn parse_seconds(value: Option<&str>) -> Option<f64> {
    value
        .and_then(|d| d.trim().parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d > 0.0)
}

/// Probe a media file.
///
/// A file FFprobe cannot read yields `MediaInfo::default()` (duration 0).
/// Fails only when FFprobe is missing, cannot be spawned, or exceeds
/// `timeout`.
pub async fn probe_media(path: impl AsRef<Path>, timeout: Duration) -> MediaResult<MediaInfo> {
    let path = path.as_ref();

    check_ffprobe()?;

    if !path.exists() {
        warn!(path = %path.display(), "Probe target does not exist");
        return Ok(MediaInfo::default());
    }

    let child = Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()?;

    let output = tokio::time::timeout(timeout, child.wait_with_output())
        .await
        .map_err(|_| MediaError::Timeout(timeout))??;

    if !output.status.success() {
        debug!(path = %path.display(), status = ?output.status.code(), "FFprobe could not read file");
        return Ok(MediaInfo::default());
    }

    match serde_json::from_slice::<FfprobeOutput>(&output.stdout) {
        Ok(probe) => Ok(probe.into_info()),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Unparseable FFprobe output");
            Ok(MediaInfo::default())
        }
    }
}

/// Get media duration in seconds, 0 when unknown.
pub async fn probe_duration(path: impl AsRef<Path>, timeout: Duration) -> MediaResult<f64> {
    let info = probe_media(path, timeout).await?;
    Ok(info.duration)
}
