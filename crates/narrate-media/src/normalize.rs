//! Scene normalization: any visual becomes a silent, fixed-geometry segment
//! of exactly the target duration.

use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use narrate_models::{EncodingConfig, VisualKind};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::filters::normalize_filter;
use crate::probe::probe_duration;

/// A silent segment in the output encoding profile.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedSegment {
    pub path: PathBuf,
    pub duration: f64,
}

/// Number of extra playthroughs needed for a `source`-second clip to cover
/// `target` seconds.
pub fn loop_count(target: f64, source: f64) -> u32 {
    if source <= 0.0 || source >= target {
        return 0;
    }
    ((target / source).ceil() as u32).saturating_sub(1)
}

fn check_target(target: f64) -> MediaResult<()> {
    if !target.is_finite() || target <= 0.0 {
        return Err(MediaError::invalid_input(format!(
            "target duration must be positive, got {}",
            target
        )));
    }
    Ok(())
}

fn base_command(input: &Path, output: &Path) -> FfmpegCommand {
    FfmpegCommand::new(input, output)
}

fn finish_command(cmd: FfmpegCommand, target: f64, encoding: &EncodingConfig) -> FfmpegCommand {
    cmd.duration(target)
        .video_filter(normalize_filter(encoding))
        .video_encoding(encoding)
        .no_audio()
        .faststart()
}

async fn run_tracked(runner: &FfmpegRunner, cmd: &FfmpegCommand, target: f64) -> MediaResult<()> {
    runner
        .run_with_progress(cmd, move |p| {
            debug!(percent = p.percentage(target), speed = p.speed, "Normalize progress");
        })
        .await
}

/// Hold a still image for `target` seconds.
pub async fn normalize_photo(
    image: &Path,
    output: &Path,
    target: f64,
    encoding: &EncodingConfig,
    runner: &FfmpegRunner,
) -> MediaResult<NormalizedSegment> {
    check_target(target)?;

    let cmd = finish_command(base_command(image, output).loop_image(), target, encoding);

    info!(
        input = %image.display(),
        duration = target,
        "Normalizing photo"
    );
    run_tracked(runner, &cmd, target).await?;

    Ok(NormalizedSegment {
        path: output.to_path_buf(),
        duration: target,
    })
}

/// Trim or loop a clip to exactly `target` seconds.
pub async fn normalize_video(
    video: &Path,
    output: &Path,
    target: f64,
    encoding: &EncodingConfig,
    runner: &FfmpegRunner,
    probe_timeout: Duration,
) -> MediaResult<NormalizedSegment> {
    check_target(target)?;

    let source = probe_duration(video, probe_timeout).await?;
    if source <= 0.0 {
        return Err(MediaError::UnknownDuration(video.to_path_buf()));
    }

    let loops = loop_count(target, source);
    let mut cmd = base_command(video, output);
    if loops > 0 {
        cmd = cmd.stream_loop(loops);
    }
    let cmd = finish_command(cmd, target, encoding);

    info!(
        input = %video.display(),
        source_duration = source,
        duration = target,
        loops,
        "Normalizing video"
    );
    run_tracked(runner, &cmd, target).await?;

    Ok(NormalizedSegment {
        path: output.to_path_buf(),
        duration: target,
    })
}

/// Dispatch on the visual kind.
pub async fn normalize_visual(
    kind: VisualKind,
    input: &Path,
    output: &Path,
    target: f64,
    encoding: &EncodingConfig,
    runner: &FfmpegRunner,
    probe_timeout: Duration,
) -> MediaResult<NormalizedSegment> {
    match kind {
        VisualKind::Photo => normalize_photo(input, output, target, encoding, runner).await,
        VisualKind::Video => {
            normalize_video(input, output, target, encoding, runner, probe_timeout).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::check_ffmpeg;
    use crate::probe::probe_media;
    use crate::testutil::lavfi;

    #[test]
    fn test_loop_count() {
        assert_eq!(loop_count(5.0, 2.0), 2);
        assert_eq!(loop_count(6.0, 2.0), 2);
        assert_eq!(loop_count(6.1, 2.0), 3);
        assert_eq!(loop_count(3.0, 10.0), 0);
        assert_eq!(loop_count(3.0, 3.0), 0);
        assert_eq!(loop_count(3.0, 0.0), 0);
    }

    #[test]
    fn test_video_command_loops_before_input() {
        let cmd = finish_command(
            base_command(Path::new("in.mp4"), Path::new("out.mp4")).stream_loop(loop_count(5.0, 2.0)),
            5.0,
            &EncodingConfig::default(),
        );
        let args = cmd.build_args();
        let i = args.iter().position(|a| a == "-i").unwrap();
        assert_eq!(&args[i - 2..i], ["-stream_loop", "2"]);
        assert!(args.windows(2).any(|w| w[0] == "-t" && w[1] == "5.000"));
        assert!(args.contains(&"-an".to_string()));
    }

    #[tokio::test]
    async fn test_rejects_non_positive_target() {
        let runner = FfmpegRunner::new();
        let err = normalize_photo(
            Path::new("a.png"),
            Path::new("b.mp4"),
            0.0,
            &EncodingConfig::default(),
            &runner,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, MediaError::InvalidInput(_)));
    }

    #[tokio::test]
    #[ignore = "requires ffmpeg"]
    async fn test_short_video_is_looped_to_target() {
        check_ffmpeg().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let source = lavfi::video_clip(dir.path(), "src.mp4", 2.0, 640, 480).await;
        let output = dir.path().join("seg.mp4");
        let timeout = Duration::from_secs(30);

        let segment = normalize_video(
            &source,
            &output,
            5.0,
            &EncodingConfig::default(),
            &FfmpegRunner::new().with_timeout(timeout),
            timeout,
        )
        .await
        .unwrap();

        let info = probe_media(&segment.path, timeout).await.unwrap();
        assert!((info.duration - 5.0).abs() < 0.1, "got {}", info.duration);
        assert_eq!((info.width, info.height), (1280, 720));
        assert!(!info.has_audio);
    }

    #[tokio::test]
    #[ignore = "requires ffmpeg"]
    async fn test_photo_held_for_target() {
        check_ffmpeg().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let image = lavfi::still_image(dir.path(), "still.png", 800, 800).await;
        let output = dir.path().join("seg.mp4");
        let timeout = Duration::from_secs(30);

        normalize_photo(
            &image,
            &output,
            3.0,
            &EncodingConfig::default(),
            &FfmpegRunner::new().with_timeout(timeout),
        )
        .await
        .unwrap();

        let info = probe_media(&output, timeout).await.unwrap();
        assert!((info.duration - 3.0).abs() < 0.1, "got {}", info.duration);
        assert_eq!((info.width, info.height), (1280, 720));
        assert!(!info.has_audio);
    }

    #[tokio::test]
    #[ignore = "requires ffmpeg"]
    async fn test_unprobeable_video_fails() {
        check_ffmpeg().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let bogus = dir.path().join("bogus.mp4");
        tokio::fs::write(&bogus, b"nope").await.unwrap();
        let timeout = Duration::from_secs(10);

        let err = normalize_video(
            &bogus,
            &dir.path().join("out.mp4"),
            2.0,
            &EncodingConfig::default(),
            &FfmpegRunner::new(),
            timeout,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, MediaError::UnknownDuration(_)));
    }
}
