//! Scene compilation pipeline.
//!
//! Scenes are processed strictly in order: resolve both assets, normalize
//! the visual, mux in the narration. The clips are then joined and, when
//! requested, captioned and burned. The first failure aborts the run and no
//! partial video is returned.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, Instrument};

use narrate_media::{build_cues, cancelled, move_file, write_srt, MediaResult, ResolvedAsset, SceneClip};
use narrate_models::{AssetKind, CompileRequest, JobId, Scene, ValidatedRequest};

use crate::config::CompilerConfig;
use crate::error::{CompileError, CompileResult, Stage};
use crate::logging::JobLogger;
use crate::toolkit::{FfmpegToolkit, MediaToolkit};
use crate::workspace::Workspace;

/// Where a run currently is.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineState {
    Idle,
    ResolvingAssets { index: usize, scene_id: String },
    Normalizing { index: usize, scene_id: String },
    Muxing { index: usize, scene_id: String },
    AllMuxed,
    Concatenating,
    Captioning,
    Burning,
    Done,
    Failed { stage: Stage, scene_id: Option<String> },
}

impl PipelineState {
    pub fn name(&self) -> &'static str {
        match self {
            PipelineState::Idle => "idle",
            PipelineState::ResolvingAssets { .. } => "resolving_assets",
            PipelineState::Normalizing { .. } => "normalizing",
            PipelineState::Muxing { .. } => "muxing",
            PipelineState::AllMuxed => "all_muxed",
            PipelineState::Concatenating => "concatenating",
            PipelineState::Captioning => "captioning",
            PipelineState::Burning => "burning",
            PipelineState::Done => "done",
            PipelineState::Failed { .. } => "failed",
        }
    }

    /// Scene position and id for per-scene states.
    pub fn scene(&self) -> Option<(usize, &str)> {
        match self {
            PipelineState::ResolvingAssets { index, scene_id }
            | PipelineState::Normalizing { index, scene_id }
            | PipelineState::Muxing { index, scene_id } => Some((*index, scene_id)),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Failed { .. })
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.scene() {
            Some((index, scene_id)) => write!(f, "{}({}: {})", self.name(), index, scene_id),
            None => f.write_str(self.name()),
        }
    }
}

/// Callback receiving every state transition of a run.
pub type StateObserver = Arc<dyn Fn(&PipelineState) + Send + Sync>;

/// Per-run options.
#[derive(Clone, Default)]
pub struct RunOptions {
    job_id: Option<JobId>,
    cancel: Option<watch::Receiver<bool>>,
    observer: Option<StateObserver>,
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_job_id(mut self, job_id: JobId) -> Self {
        self.job_id = Some(job_id);
        self
    }

    /// Abort the run once the signal flips to `true`.
    pub fn with_cancel(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn with_observer(mut self, observer: impl Fn(&PipelineState) + Send + Sync + 'static) -> Self {
        self.observer = Some(Arc::new(observer));
        self
    }
}

impl fmt::Debug for RunOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunOptions")
            .field("job_id", &self.job_id)
            .field("cancel", &self.cancel.is_some())
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

/// Timing facts about a finished video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileSummary {
    pub job_id: JobId,
    pub total_duration_seconds: f64,
    /// Probed duration of each scene clip, in input order
    pub scene_durations: Vec<f64>,
    pub caption_count: usize,
}

/// The final video of a successful run.
///
/// Owns the run's workspace: the file stays readable until this handle is
/// dropped or persisted elsewhere.
#[derive(Debug)]
pub struct CompiledVideo {
    summary: CompileSummary,
    path: PathBuf,
    workspace: Workspace,
}

impl CompiledVideo {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn summary(&self) -> &CompileSummary {
        &self.summary
    }

    pub fn total_duration_seconds(&self) -> f64 {
        self.summary.total_duration_seconds
    }

    pub fn workspace_path(&self) -> &Path {
        self.workspace.path()
    }

    /// Read the whole video into memory.
    pub async fn read(&self) -> std::io::Result<Vec<u8>> {
        tokio::fs::read(&self.path).await
    }

    /// Move the video to `destination` and remove the workspace.
    pub async fn persist_to(self, destination: impl AsRef<Path>) -> MediaResult<CompileSummary> {
        move_file(&self.path, destination).await?;
        self.workspace.close()?;
        Ok(self.summary)
    }
}

/// Compiles scene lists into one video.
#[derive(Clone)]
pub struct SceneCompiler {
    config: CompilerConfig,
    toolkit: Arc<dyn MediaToolkit>,
}

impl SceneCompiler {
    pub fn new(config: CompilerConfig, toolkit: Arc<dyn MediaToolkit>) -> Self {
        Self { config, toolkit }
    }

    /// Compiler driving the real FFmpeg binaries.
    pub fn with_ffmpeg(config: CompilerConfig) -> MediaResult<Self> {
        let toolkit = FfmpegToolkit::new(&config)?;
        Ok(Self::new(config, Arc::new(toolkit)))
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Validate and compile with default options.
    pub async fn compile(&self, request: &CompileRequest) -> CompileResult<CompiledVideo> {
        self.compile_with(request, RunOptions::default()).await
    }

    /// Validate and compile.
    ///
    /// Validation happens before any workspace is created, so a rejected
    /// request never touches the filesystem.
    pub async fn compile_with(&self, request: &CompileRequest, options: RunOptions) -> CompileResult<CompiledVideo> {
        let run = self.begin(options);
        let span = run.logger.create_span();

        let result = async {
            run.notify(PipelineState::Idle);
            let request = request.validate()?;
            run.execute(&request).await
        }
        .instrument(span)
        .await;

        run.finish(result)
    }

    /// Compile a request the caller has already validated.
    pub async fn compile_validated(
        &self,
        request: &ValidatedRequest,
        options: RunOptions,
    ) -> CompileResult<CompiledVideo> {
        let run = self.begin(options);
        let span = run.logger.create_span();

        let result = async {
            run.notify(PipelineState::Idle);
            run.execute(request).await
        }
        .instrument(span)
        .await;

        run.finish(result)
    }

    fn begin(&self, options: RunOptions) -> Run<'_> {
        let job_id = options.job_id.clone().unwrap_or_default();
        Run {
            config: &self.config,
            toolkit: self.toolkit.as_ref(),
            logger: JobLogger::new(&job_id, "compile"),
            job_id,
            options,
        }
    }
}

impl fmt::Debug for SceneCompiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneCompiler")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// State of one run.
struct Run<'a> {
    config: &'a CompilerConfig,
    toolkit: &'a dyn MediaToolkit,
    logger: JobLogger,
    job_id: JobId,
    options: RunOptions,
}

impl Run<'_> {
    fn notify(&self, state: PipelineState) {
        self.logger.log_state(&state);
        if let Some(observer) = &self.options.observer {
            observer(&state);
        }
    }

    fn finish(&self, result: CompileResult<CompiledVideo>) -> CompileResult<CompiledVideo> {
        match result {
            Ok(video) => {
                self.logger.log_completion(video.summary());
                Ok(video)
            }
            Err(err) => {
                self.notify(PipelineState::Failed {
                    stage: err.stage,
                    scene_id: err.scene_id.clone(),
                });
                self.logger.log_failure(&err);
                Err(err)
            }
        }
    }

    /// Await one media step, racing it against the cancellation signal.
    ///
    /// Losing the race drops the step, which kills any child process.
    async fn stage<T, F>(&self, stage: Stage, scene_id: Option<&str>, step: F) -> CompileResult<T>
    where
        F: Future<Output = MediaResult<T>>,
    {
        tokio::select! {
            biased;
            _ = cancelled(self.options.cancel.clone()) => Err(CompileError::cancelled(stage, scene_id)),
            result = step => result.map_err(|e| CompileError::from_media(stage, scene_id, e)),
        }
    }

    async fn execute(&self, request: &ValidatedRequest) -> CompileResult<CompiledVideo> {
        let scenes = &request.scenes;
        self.logger.log_start(scenes.len(), request.burn_subtitles);

        if self.options.cancel.as_ref().is_some_and(|rx| *rx.borrow()) {
            return Err(CompileError::cancelled(Stage::Workspace, None));
        }

        let workspace = Workspace::create(&self.config.work_dir, &self.job_id)
            .await
            .map_err(CompileError::workspace)?;
        debug!(workspace = %workspace.path().display(), "Workspace created");

        let mut clips = Vec::with_capacity(scenes.len());
        for (index, scene) in scenes.iter().enumerate() {
            clips.push(self.compile_scene(&workspace, index, scene).await?);
        }
        self.notify(PipelineState::AllMuxed);

        self.notify(PipelineState::Concatenating);
        let clip_paths: Vec<PathBuf> = clips.iter().map(|c| c.path.clone()).collect();
        let joined = self
            .stage(
                Stage::Concat,
                None,
                self.toolkit
                    .concat(&clip_paths, workspace.path(), &workspace.file("joined.mp4")),
            )
            .await?;

        let scene_durations: Vec<f64> = clips.iter().map(|c| c.duration).collect();
        let total_duration_seconds = scene_durations.iter().sum();

        let (path, caption_count) = if request.burn_subtitles {
            self.notify(PipelineState::Captioning);
            let captions = workspace.file("captions.srt");
            let cues = build_cues(scenes, &scene_durations)
                .map_err(|e| CompileError::from_media(Stage::Caption, None, e))?;
            write_srt(&cues, &captions)
                .await
                .map_err(|e| CompileError::from_media(Stage::Caption, None, e))?;

            if cues.is_empty() {
                self.logger.log_warning("Narration has no words, skipping subtitle burn-in");
                (joined, 0)
            } else {
                self.notify(PipelineState::Burning);
                let burned = self
                    .stage(
                        Stage::Burn,
                        None,
                        self.toolkit.burn(&joined, &captions, &workspace.file("final.mp4")),
                    )
                    .await?;
                (burned, cues.len())
            }
        } else {
            (joined, 0)
        };

        self.notify(PipelineState::Done);

        Ok(CompiledVideo {
            summary: CompileSummary {
                job_id: self.job_id.clone(),
                total_duration_seconds,
                scene_durations,
                caption_count,
            },
            path,
            workspace,
        })
    }

    async fn compile_scene(&self, workspace: &Workspace, index: usize, scene: &Scene) -> CompileResult<SceneClip> {
        let scene_id = Some(scene.id.as_str());

        self.notify(PipelineState::ResolvingAssets {
            index,
            scene_id: scene.id.clone(),
        });
        let visual = self
            .stage(
                Stage::Resolve,
                scene_id,
                self.toolkit.resolve(
                    &scene.visual.source,
                    AssetKind::from(scene.visual.kind),
                    workspace.path(),
                    &workspace.scene_stem(index, "visual"),
                ),
            )
            .await?;
        let audio = self
            .stage(
                Stage::Resolve,
                scene_id,
                self.toolkit.resolve(
                    &scene.audio,
                    AssetKind::Audio,
                    workspace.path(),
                    &workspace.scene_stem(index, "audio"),
                ),
            )
            .await?;

        self.notify(PipelineState::Normalizing {
            index,
            scene_id: scene.id.clone(),
        });
        let segment = self
            .stage(
                Stage::Normalize,
                scene_id,
                self.toolkit.normalize(
                    scene.visual.kind,
                    visual.path(),
                    &workspace.scene_file(index, "segment.mp4"),
                    scene.target_duration_seconds,
                ),
            )
            .await?;

        self.notify(PipelineState::Muxing {
            index,
            scene_id: scene.id.clone(),
        });
        let clip = self
            .stage(
                Stage::Mux,
                scene_id,
                self.toolkit
                    .mux(&segment, audio.path(), &workspace.scene_file(index, "clip.mp4")),
            )
            .await?;

        self.release(visual);
        self.release(audio);
        if let Err(e) = tokio::fs::remove_file(&segment.path).await {
            debug!(path = %segment.path.display(), error = %e, "Segment already gone");
        }

        debug!(
            scene_id = %scene.id,
            target = scene.target_duration_seconds,
            duration = clip.duration,
            "Scene compiled"
        );
        Ok(clip)
    }

    fn release(&self, asset: ResolvedAsset) {
        let path = asset.path().to_path_buf();
        if let Err(e) = asset.release() {
            self.logger
                .log_warning(&format!("Failed to remove {}: {}", path.display(), e));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_names() {
        let state = PipelineState::Muxing {
            index: 1,
            scene_id: "s2".to_string(),
        };
        assert_eq!(state.to_string(), "muxing(1: s2)");
        assert_eq!(state.scene(), Some((1, "s2")));
        assert!(!state.is_terminal());
        assert!(PipelineState::Done.is_terminal());
        assert_eq!(PipelineState::AllMuxed.to_string(), "all_muxed");
    }

    #[test]
    fn test_summary_json() {
        let summary = CompileSummary {
            job_id: JobId::from_string("video-1"),
            total_duration_seconds: 7.8,
            scene_durations: vec![5.0, 2.8],
            caption_count: 6,
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["jobId"], "video-1");
        assert_eq!(json["totalDurationSeconds"], 7.8);
        assert_eq!(json["sceneDurations"][1], 2.8);
    }

    #[test]
    fn test_run_options_debug_hides_closures() {
        let options = RunOptions::new().with_observer(|_| {});
        assert!(format!("{:?}", options).contains("observer: true"));
    }
}
