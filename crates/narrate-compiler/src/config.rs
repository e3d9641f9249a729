//! Compiler configuration.

use std::path::PathBuf;
use std::time::Duration;

use narrate_media::DEFAULT_MAX_ASSET_BYTES;
use narrate_models::EncodingConfig;

/// Configuration for one [`crate::SceneCompiler`].
#[derive(Debug, Clone)]
pub struct CompilerConfig {
    /// Root under which per-run workspaces are created
    pub work_dir: PathBuf,
    /// Budget for fetching one remote asset
    pub fetch_timeout: Duration,
    /// Budget for one ffprobe call
    pub probe_timeout: Duration,
    /// Budget for normalizing one scene
    pub normalize_timeout: Duration,
    /// Budget for muxing one scene
    pub mux_timeout: Duration,
    /// Budget for joining all scenes
    pub concat_timeout: Duration,
    /// Budget for the subtitle burn-in pass
    pub burn_timeout: Duration,
    /// Largest accepted asset, in bytes
    pub max_asset_bytes: u64,
    /// Output encoding profile
    pub encoding: EncodingConfig,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            work_dir: std::env::temp_dir().join("narrate"),
            fetch_timeout: Duration::from_secs(60),
            probe_timeout: Duration::from_secs(30),
            normalize_timeout: Duration::from_secs(300),
            mux_timeout: Duration::from_secs(120),
            concat_timeout: Duration::from_secs(300),
            burn_timeout: Duration::from_secs(900),
            max_asset_bytes: DEFAULT_MAX_ASSET_BYTES,
            encoding: EncodingConfig::default(),
        }
    }
}

fn env_secs(key: &str, default: u64) -> Duration {
    Duration::from_secs(
        std::env::var(key)
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(default),
    )
}

impl CompilerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            work_dir: std::env::var("NARRATE_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            fetch_timeout: env_secs("NARRATE_FETCH_TIMEOUT_SECS", 60),
            probe_timeout: env_secs("NARRATE_PROBE_TIMEOUT_SECS", 30),
            normalize_timeout: env_secs("NARRATE_NORMALIZE_TIMEOUT_SECS", 300),
            mux_timeout: env_secs("NARRATE_MUX_TIMEOUT_SECS", 120),
            concat_timeout: env_secs("NARRATE_CONCAT_TIMEOUT_SECS", 300),
            burn_timeout: env_secs("NARRATE_BURN_TIMEOUT_SECS", 900),
            max_asset_bytes: std::env::var("NARRATE_MAX_ASSET_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_MAX_ASSET_BYTES),
            encoding: defaults.encoding,
        }
    }

    /// Use a different workspace root.
    pub fn with_work_dir(mut self, work_dir: impl Into<PathBuf>) -> Self {
        self.work_dir = work_dir.into();
        self
    }
}
