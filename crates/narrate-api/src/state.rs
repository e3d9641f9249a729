//! Application state.

use std::sync::Arc;
use tokio::sync::Semaphore;

use narrate_compiler::SceneCompiler;

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub compiler: Arc<SceneCompiler>,
    /// Bounds the number of compilations in flight
    pub compile_slots: Arc<Semaphore>,
}

impl AppState {
    /// Create new application state around a ready compiler.
    pub fn new(config: ApiConfig, compiler: SceneCompiler) -> Self {
        let compile_slots = Arc::new(Semaphore::new(config.max_concurrent_compilations.max(1)));

        Self {
            config,
            compiler: Arc::new(compiler),
            compile_slots,
        }
    }
}
