//! Moving finished artifacts out of a workspace.

use std::path::Path;
use tokio::fs;
use tracing::debug;

use crate::error::{MediaError, MediaResult};

/// Move `src` to `dst`, falling back to copy+delete across filesystems.
///
/// The copy lands in a temporary file next to `dst` and is renamed into
/// place, so `dst` is never observed half written.
pub async fn move_file(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> MediaResult<()> {
    let src = src.as_ref();
    let dst = dst.as_ref();

    if !src.exists() {
        return Err(MediaError::FileNotFound(src.to_path_buf()));
    }

    let parent = match dst.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => std::env::current_dir()?,
    };
    fs::create_dir_all(&parent).await?;

    match fs::rename(src, dst).await {
        Ok(()) => Ok(()),
        Err(e) if is_cross_device_error(&e) => {
            debug!(
                src = %src.display(),
                dst = %dst.display(),
                "Cross-device move, copying"
            );
            let staging = tempfile::Builder::new()
                .prefix(".narrate-")
                .tempfile_in(&parent)?;
            fs::copy(src, staging.path()).await?;
            staging.persist(dst).map_err(|e| MediaError::Io(e.error))?;
            fs::remove_file(src).await?;
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// EXDEV on Linux and macOS.
fn is_cross_device_error(e: &std::io::Error) -> bool {
    e.raw_os_error() == Some(18)
}
