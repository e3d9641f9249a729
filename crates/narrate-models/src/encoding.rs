//! Output encoding profile shared by every compilation stage.
//!
//! All scene segments go through the same profile so the concat demuxer can
//! stream-copy them: identical resolution, pixel format, frame rate and codec,
//! and identical audio sample rate and channel layout whatever the narration
//! source was recorded at.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Output width in pixels
pub const DEFAULT_WIDTH: u32 = 1280;
/// Output height in pixels
pub const DEFAULT_HEIGHT: u32 = 720;
/// Fixed output frame rate
pub const DEFAULT_FPS: u32 = 30;
/// Default video codec (H.264)
pub const DEFAULT_VIDEO_CODEC: &str = "libx264";
/// Default pixel format
pub const DEFAULT_PIXEL_FORMAT: &str = "yuv420p";
/// Default encoding preset
pub const DEFAULT_PRESET: &str = "veryfast";
/// Default CRF (Constant Rate Factor)
pub const DEFAULT_CRF: u8 = 20;
/// Default audio codec
pub const DEFAULT_AUDIO_CODEC: &str = "aac";
/// Default audio bitrate
pub const DEFAULT_AUDIO_BITRATE: &str = "192k";
/// Audio sample rate forced on every scene clip
pub const DEFAULT_AUDIO_SAMPLE_RATE: u32 = 48_000;
/// Audio channel count forced on every scene clip
pub const DEFAULT_AUDIO_CHANNELS: u8 = 2;
/// Default ASS style override for burned-in captions
pub const DEFAULT_SUBTITLE_STYLE: &str = "FontName=Inter,FontSize=28,PrimaryColour=&H00FFFFFF&";

/// Video encoding configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EncodingConfig {
    /// Output width in pixels
    #[serde(default = "default_width")]
    pub width: u32,

    /// Output height in pixels
    #[serde(default = "default_height")]
    pub height: u32,

    /// Output frame rate
    #[serde(default = "default_fps")]
    pub fps: u32,

    /// Video codec (e.g., "libx264")
    #[serde(default = "default_video_codec")]
    pub codec: String,

    /// Pixel format forced on every segment
    #[serde(default = "default_pixel_format")]
    pub pixel_format: String,

    /// Encoding preset (e.g., "veryfast", "medium")
    #[serde(default = "default_preset")]
    pub preset: String,

    /// Constant Rate Factor (quality, 0-51, lower is better)
    #[serde(default = "default_crf")]
    pub crf: u8,

    /// Audio codec
    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,

    /// Audio bitrate
    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate: String,

    /// Audio sample rate in Hz
    #[serde(default = "default_audio_sample_rate")]
    pub audio_sample_rate: u32,

    /// Audio channel count
    #[serde(default = "default_audio_channels")]
    pub audio_channels: u8,

    /// `force_style` value handed to the subtitles filter
    #[serde(default = "default_subtitle_style")]
    pub subtitle_style: String,
}

fn default_width() -> u32 {
    DEFAULT_WIDTH
}
fn default_height() -> u32 {
    DEFAULT_HEIGHT
}
fn default_fps() -> u32 {
    DEFAULT_FPS
}
fn default_video_codec() -> String {
    DEFAULT_VIDEO_CODEC.to_string()
}
fn default_pixel_format() -> String {
    DEFAULT_PIXEL_FORMAT.to_string()
}
fn default_preset() -> String {
    DEFAULT_PRESET.to_string()
}
fn default_crf() -> u8 {
    DEFAULT_CRF
}
fn default_audio_codec() -> String {
    DEFAULT_AUDIO_CODEC.to_string()
}
fn default_audio_bitrate() -> String {
    DEFAULT_AUDIO_BITRATE.to_string()
}
fn default_audio_sample_rate() -> u32 {
    DEFAULT_AUDIO_SAMPLE_RATE
}
fn default_audio_channels() -> u8 {
    DEFAULT_AUDIO_CHANNELS
}
fn default_subtitle_style() -> String {
    DEFAULT_SUBTITLE_STYLE.to_string()
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            fps: DEFAULT_FPS,
            codec: DEFAULT_VIDEO_CODEC.to_string(),
            pixel_format: DEFAULT_PIXEL_FORMAT.to_string(),
            preset: DEFAULT_PRESET.to_string(),
            crf: DEFAULT_CRF,
            audio_codec: DEFAULT_AUDIO_CODEC.to_string(),
            audio_bitrate: DEFAULT_AUDIO_BITRATE.to_string(),
            audio_sample_rate: DEFAULT_AUDIO_SAMPLE_RATE,
            audio_channels: DEFAULT_AUDIO_CHANNELS,
            subtitle_style: DEFAULT_SUBTITLE_STYLE.to_string(),
        }
    }
}

impl EncodingConfig {
    /// Create a new encoding configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a new config with updated CRF.
    pub fn with_crf(mut self, crf: u8) -> Self {
        self.crf = crf;
        self
    }

    /// Returns a new config with a different output geometry.
    pub fn with_geometry(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Video encoder arguments (codec, preset, CRF, pixel format, frame rate).
    pub fn video_args(&self) -> Vec<String> {
        vec![
            "-c:v".to_string(),
            self.codec.clone(),
            "-preset".to_string(),
            self.preset.clone(),
            "-crf".to_string(),
            self.crf.to_string(),
            "-pix_fmt".to_string(),
            self.pixel_format.clone(),
            "-r".to_string(),
            self.fps.to_string(),
        ]
    }

    /// Audio encoder arguments (codec, bitrate, sample rate, channels).
    pub fn audio_args(&self) -> Vec<String> {
        vec![
            "-c:a".to_string(),
            self.audio_codec.clone(),
            "-b:a".to_string(),
            self.audio_bitrate.clone(),
            "-ar".to_string(),
            self.audio_sample_rate.to_string(),
            "-ac".to_string(),
            self.audio_channels.to_string(),
        ]
    }
}
