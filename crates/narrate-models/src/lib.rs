//! Shared data models for the narrated scene compiler.
//!
//! This crate provides Serde-serializable types for:
//! - Compile requests as sent over the wire, and their validation
//! - Typed scenes and media references
//! - The output encoding profile
//! - Job identifiers

pub mod encoding;
pub mod error;
pub mod job;
pub mod request;
pub mod scene;

// Re-export common types
pub use encoding::EncodingConfig;
pub use error::ValidationError;
pub use job::JobId;
pub use request::{
    AudioPayload, CompileRequest, ScenePayload, SourcePayload, ValidatedRequest, VisualPayload,
};
pub use scene::{AssetKind, LocatorError, MediaReference, Scene, VisualAsset, VisualKind};
