//! Timeline concatenation with the concat demuxer and stream copy.

use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// Quote a path for a concat list `file` directive.
fn quote_list_path(path: &Path) -> String {
    format!("'{}'", path.to_string_lossy().replace('\'', r"'\''"))
}

/// Render the concat list for `clips`, in order.
pub fn concat_list(clips: &[PathBuf]) -> String {
    clips
        .iter()
        .map(|p| format!("file {}\n", quote_list_path(p)))
        .collect()
}

/// Join `clips` into `output` without re-encoding.
///
/// All clips must share the same encoding profile. The list file is written
/// to `work_dir` and removed before returning.
pub async fn concat_clips(
    clips: &[PathBuf],
    work_dir: &Path,
    output: &Path,
    runner: &FfmpegRunner,
) -> MediaResult<PathBuf> {
    if clips.is_empty() {
        return Err(MediaError::invalid_input("nothing to concatenate"));
    }

    let mut absolute = Vec::with_capacity(clips.len());
    for clip in clips {
        if !clip.exists() {
            return Err(MediaError::FileNotFound(clip.clone()));
        }
        absolute.push(tokio::fs::canonicalize(clip).await?);
    }

    let list = concat_list(&absolute);
    debug!("Concat list:\n{}", list);

    let mut list_file = tempfile::Builder::new()
        .prefix("concat-")
        .suffix(".txt")
        .tempfile_in(work_dir)?;
    list_file.write_all(list.as_bytes())?;
    list_file.flush()?;
    let list_path = list_file.into_temp_path();

    let cmd = FfmpegCommand::new(&list_path, output)
        .input_format("concat")
        .input_arg("-safe")
        .input_arg("0")
        .codec_copy()
        .faststart();

    info!(clips = clips.len(), output = %output.display(), "Concatenating scene clips");
    let result = runner.run(&cmd).await;

    list_path.close()?;
    result?;

    Ok(output.to_path_buf())
}
