//! Narrated scene compiler.
//!
//! Turns a validated list of scenes into one video file:
//! - [`SceneCompiler`] sequences the media stages per scene
//! - [`Workspace`] scopes every intermediate file to one run
//! - [`MediaToolkit`] is the seam between orchestration and FFmpeg

pub mod config;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod telemetry;
pub mod toolkit;
pub mod workspace;

pub use config::CompilerConfig;
pub use error::{CompileError, CompileResult, ErrorKind, Stage};
pub use logging::JobLogger;
pub use pipeline::{
    CompileSummary, CompiledVideo, PipelineState, RunOptions, SceneCompiler, StateObserver,
};
pub use toolkit::{FfmpegToolkit, MediaToolkit};
pub use workspace::Workspace;
