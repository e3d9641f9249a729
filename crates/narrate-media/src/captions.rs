//! Word-level caption cues and SubRip output.
//!
//! Each scene's narration is spread evenly over that scene's rendered
//! duration, one cue per word. After every scene the cursor is snapped to
//! the cumulative sum of rendered durations so rounding never drifts across
//! scene boundaries.

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::Path;
use tracing::debug;

use narrate_models::Scene;

use crate::error::{MediaError, MediaResult};

/// One timed caption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionCue {
    /// 1-based, contiguous over the whole video
    pub index: usize,
    pub start: f64,
    pub end: f64,
    pub text: String,
}

/// Build cues for `scenes` given each scene's rendered duration.
pub fn build_cues(scenes: &[Scene], durations: &[f64]) -> MediaResult<Vec<CaptionCue>> {
    if scenes.len() != durations.len() {
        return Err(MediaError::invalid_input(format!(
            "{} scenes but {} durations",
            scenes.len(),
            durations.len()
        )));
    }

    let mut cues = Vec::new();
    let mut cursor = 0.0_f64;
    let mut elapsed = 0.0_f64;

    for (scene, &duration) in scenes.iter().zip(durations) {
        let duration = if duration.is_finite() { duration.max(0.0) } else { 0.0 };
        let words: Vec<&str> = scene.words().collect();

        if !words.is_empty() {
            let per_word = duration / words.len() as f64;
            for word in words {
                let end = cursor + per_word;
                cues.push(CaptionCue {
                    index: cues.len() + 1,
                    start: cursor,
                    end,
                    text: word.to_string(),
                });
                cursor = end;
            }
        }

        elapsed += duration;
        cursor = elapsed;
    }

    debug!(cues = cues.len(), total = elapsed, "Built caption cues");
    Ok(cues)
}

/// Format seconds as `HH:MM:SS,mmm`, rounded to the nearest millisecond.
///
/// Negative and non-finite inputs clamp to zero. Hours do not wrap.
pub fn format_timestamp(seconds: f64) -> String {
    let seconds = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
    let total_ms = (seconds * 1000.0).round() as u64;

    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let secs = (total_ms % 60_000) / 1000;
    let millis = total_ms % 1000;

    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, millis)
}

/// Render cues as a SubRip document.
pub fn render_srt(cues: &[CaptionCue]) -> String {
    let mut out = String::new();
    for cue in cues {
        let _ = write!(
            out,
            "{}\n{} --> {}\n{}\n\n",
            cue.index,
            format_timestamp(cue.start),
            format_timestamp(cue.end),
            cue.text
        );
    }
    out
}

/// Write cues to `path` as SubRip.
pub async fn write_srt(cues: &[CaptionCue], path: &Path) -> MediaResult<()> {
    tokio::fs::write(path, render_srt(cues)).await?;
    Ok(())
}
