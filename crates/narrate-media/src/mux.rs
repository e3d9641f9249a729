//! Scene muxing: a normalized segment plus its narration audio.

use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use narrate_models::EncodingConfig;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::normalize::NormalizedSegment;
use crate::probe::probe_duration;

/// A finished scene: video and audio, with the probed duration.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneClip {
    pub path: PathBuf,
    /// Authoritative for all later timing
    pub duration: f64,
}

fn mux_command(segment: &Path, audio: &Path, output: &Path, encoding: &EncodingConfig) -> FfmpegCommand {
    FfmpegCommand::new(segment, output)
        .add_input(audio)
        .map("0:v:0")
        .map("1:a:0")
        .video_codec("copy")
        .audio_encoding(encoding)
        .shortest()
        .faststart()
}

/// Combine `segment` with `audio`. The shorter stream decides the length.
///
/// The result is re-probed; when the probe cannot read a duration the
/// segment's target duration is used instead.
pub async fn mux_scene(
    segment: &NormalizedSegment,
    audio: &Path,
    output: &Path,
    encoding: &EncodingConfig,
    runner: &FfmpegRunner,
    probe_timeout: Duration,
) -> MediaResult<SceneClip> {
    if !audio.exists() {
        return Err(MediaError::FileNotFound(audio.to_path_buf()));
    }

    let cmd = mux_command(&segment.path, audio, output, encoding);
    runner.run(&cmd).await?;

    let mut duration = probe_duration(output, probe_timeout).await?;
    if duration <= 0.0 {
        warn!(
            path = %output.display(),
            fallback = segment.duration,
            "Could not probe muxed clip, using target duration"
        );
        duration = segment.duration;
    }

    info!(
        path = %output.display(),
        target = segment.duration,
        duration,
        "Muxed scene clip"
    );

    Ok(SceneClip {
        path: output.to_path_buf(),
        duration,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::check_ffmpeg;
    use crate::normalize::normalize_photo;
    use crate::probe::probe_media;
    use crate::testutil::lavfi;

    #[test]
    fn test_mux_command_maps_streams() {
        let args = mux_command(
            Path::new("seg.mp4"),
            Path::new("voice.mp3"),
            Path::new("clip.mp4"),
            &EncodingConfig::default(),
        )
        .build_args();

        assert!(args.windows(2).any(|w| w[0] == "-map" && w[1] == "0:v:0"));
        assert!(args.windows(2).any(|w| w[0] == "-map" && w[1] == "1:a:0"));
        assert!(args.windows(2).any(|w| w[0] == "-c:v" && w[1] == "copy"));
        assert!(args.windows(2).any(|w| w[0] == "-c:a" && w[1] == "aac"));
        // Narration recorded at any rate or layout ends up identical per clip
        assert!(args.windows(2).any(|w| w[0] == "-ar" && w[1] == "48000"));
        assert!(args.windows(2).any(|w| w[0] == "-ac" && w[1] == "2"));
        assert!(args.contains(&"-shortest".to_string()));
    }

    #[tokio::test]
    async fn test_missing_audio_is_rejected() {
        let segment = NormalizedSegment {
            path: PathBuf::from("seg.mp4"),
            duration: 2.0,
        };
        let err = mux_scene(
            &segment,
            Path::new("/nonexistent/voice.mp3"),
            Path::new("clip.mp4"),
            &EncodingConfig::default(),
            &FfmpegRunner::new(),
            Duration::from_secs(1),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, MediaError::FileNotFound(_)));
    }

    #[tokio::test]
    #[ignore = "requires ffmpeg"]
    async fn test_shorter_audio_decides_length() {
        check_ffmpeg().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let timeout = Duration::from_secs(30);
        let runner = FfmpegRunner::new().with_timeout(timeout);
        let encoding = EncodingConfig::default();

        let image = lavfi::still_image(dir.path(), "still.png", 640, 360).await;
        let voice = lavfi::tone(dir.path(), "voice.wav", 2.8).await;
        let segment = normalize_photo(&image, &dir.path().join("seg.mp4"), 3.0, &encoding, &runner)
            .await
            .unwrap();

        let clip = mux_scene(&segment, &voice, &dir.path().join("clip.mp4"), &encoding, &runner, timeout)
            .await
            .unwrap();

        assert!((clip.duration - 2.8).abs() < 0.15, "got {}", clip.duration);
        assert!(probe_media(&clip.path, timeout).await.unwrap().has_audio);
    }
}
