//! FFmpeg CLI wrapper for narrated scene compilation.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building with multiple inputs
//! - Progress parsing from `-progress pipe:2`
//! - Timeouts and cancellation via tokio
//! - Asset resolution for inline and remote media
//! - The per-scene stages (normalize, mux) and the timeline stages
//!   (concat, captions, subtitle burn-in)

pub mod burn;
pub mod captions;
pub mod command;
pub mod concat;
pub mod error;
pub mod filters;
pub mod fs_utils;
pub mod mux;
pub mod normalize;
pub mod probe;
pub mod progress;
pub mod resolve;

#[cfg(test)]
mod testutil;

pub use burn::burn_subtitles;
pub use captions::{build_cues, format_timestamp, render_srt, write_srt, CaptionCue};
pub use command::{cancelled, check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use concat::concat_clips;
pub use error::{MediaError, MediaResult};
pub use fs_utils::move_file;
pub use mux::{mux_scene, SceneClip};
pub use normalize::{loop_count, normalize_photo, normalize_video, normalize_visual, NormalizedSegment};
pub use probe::{probe_duration, probe_media, MediaInfo};
pub use progress::FfmpegProgress;
pub use resolve::{AssetResolver, ResolvedAsset, DEFAULT_MAX_ASSET_BYTES};
