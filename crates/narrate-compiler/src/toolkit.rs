//! Media operations used by the pipeline.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;

use narrate_media::{
    burn_subtitles, check_ffmpeg, check_ffprobe, concat_clips, mux_scene, normalize_visual,
    AssetResolver, FfmpegRunner, MediaResult, NormalizedSegment, ResolvedAsset, SceneClip,
};
use narrate_models::{AssetKind, EncodingConfig, MediaReference, VisualKind};

use crate::config::CompilerConfig;

/// The media stages the orchestrator drives, one call per step.
///
/// Implementations must not retain files outside the paths they are given.
#[async_trait]
pub trait MediaToolkit: Send + Sync {
    /// Materialize `reference` in `dir`.
    async fn resolve(
        &self,
        reference: &MediaReference,
        kind: AssetKind,
        dir: &Path,
        stem: &str,
    ) -> MediaResult<ResolvedAsset>;

    /// Produce a silent segment of exactly `target` seconds.
    async fn normalize(
        &self,
        kind: VisualKind,
        input: &Path,
        output: &Path,
        target: f64,
    ) -> MediaResult<NormalizedSegment>;

    /// Add narration audio to a segment.
    async fn mux(&self, segment: &NormalizedSegment, audio: &Path, output: &Path) -> MediaResult<SceneClip>;

    /// Join clips in order.
    async fn concat(&self, clips: &[PathBuf], work_dir: &Path, output: &Path) -> MediaResult<PathBuf>;

    /// Render a SubRip track into the video.
    async fn burn(&self, video: &Path, captions: &Path, output: &Path) -> MediaResult<PathBuf>;
}

/// [`MediaToolkit`] backed by the `ffmpeg` and `ffprobe` binaries.
#[derive(Debug, Clone)]
pub struct FfmpegToolkit {
    resolver: AssetResolver,
    encoding: EncodingConfig,
    probe_timeout: Duration,
    normalize_timeout: Duration,
    mux_timeout: Duration,
    concat_timeout: Duration,
    burn_timeout: Duration,
}

impl FfmpegToolkit {
    pub fn new(config: &CompilerConfig) -> MediaResult<Self> {
        Ok(Self {
            resolver: AssetResolver::new(config.fetch_timeout, config.max_asset_bytes)?,
            encoding: config.encoding.clone(),
            probe_timeout: config.probe_timeout,
            normalize_timeout: config.normalize_timeout,
            mux_timeout: config.mux_timeout,
            concat_timeout: config.concat_timeout,
            burn_timeout: config.burn_timeout,
        })
    }

    /// Fail fast when either binary is missing from `PATH`.
    pub fn check_tools() -> MediaResult<()> {
        check_ffmpeg()?;
        check_ffprobe()?;
        Ok(())
    }

    fn runner(timeout: Duration) -> FfmpegRunner {
        FfmpegRunner::new().with_timeout(timeout)
    }
}

#[async_trait]
impl MediaToolkit for FfmpegToolkit {
    async fn resolve(
        &self,
        reference: &MediaReference,
        kind: AssetKind,
        dir: &Path,
        stem: &str,
    ) -> MediaResult<ResolvedAsset> {
        self.resolver.resolve(reference, kind, dir, stem).await
    }

    async fn normalize(
        &self,
        kind: VisualKind,
        input: &Path,
        output: &Path,
        target: f64,
    ) -> MediaResult<NormalizedSegment> {
        normalize_visual(
            kind,
            input,
            output,
            target,
            &self.encoding,
            &Self::runner(self.normalize_timeout),
            self.probe_timeout,
        )
        .await
    }

    async fn mux(&self, segment: &NormalizedSegment, audio: &Path, output: &Path) -> MediaResult<SceneClip> {
        mux_scene(
            segment,
            audio,
            output,
            &self.encoding,
            &Self::runner(self.mux_timeout),
            self.probe_timeout,
        )
        .await
    }

    async fn concat(&self, clips: &[PathBuf], work_dir: &Path, output: &Path) -> MediaResult<PathBuf> {
        concat_clips(clips, work_dir, output, &Self::runner(self.concat_timeout)).await
    }

    async fn burn(&self, video: &Path, captions: &Path, output: &Path) -> MediaResult<PathBuf> {
        burn_subtitles(video, captions, output, &self.encoding, &Self::runner(self.burn_timeout)).await
    }
}
