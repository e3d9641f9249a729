//! HTTP handlers.

pub mod compile;
pub mod health;

pub use compile::compile_video;
pub use health::{health, ready};
