//! Subtitle burn-in.

use std::path::{Path, PathBuf};
use tracing::info;

use narrate_models::EncodingConfig;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::filters::subtitles_filter;

fn burn_command(video: &Path, srt: &Path, output: &Path, encoding: &EncodingConfig) -> FfmpegCommand {
    FfmpegCommand::new(video, output)
        .video_filter(subtitles_filter(srt, &encoding.subtitle_style))
        .video_encoding(encoding)
        .audio_codec("copy")
        .faststart()
}

/// Re-encode `video` with the captions in `srt` rendered into the frames.
pub async fn burn_subtitles(
    video: &Path,
    srt: &Path,
    output: &Path,
    encoding: &EncodingConfig,
    runner: &FfmpegRunner,
) -> MediaResult<PathBuf> {
    for input in [video, srt] {
        if !input.exists() {
            return Err(MediaError::FileNotFound(input.to_path_buf()));
        }
    }

    info!(video = %video.display(), captions = %srt.display(), "Burning subtitles");
    runner.run(&burn_command(video, srt, output, encoding)).await?;

    Ok(output.to_path_buf())
}
