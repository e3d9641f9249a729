//! Per-run workspace directory.

use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use narrate_models::JobId;

/// Uniquely named directory holding every intermediate file of one run.
///
/// The directory and everything in it is removed when the workspace is
/// dropped.
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Create a fresh workspace under `root`, creating `root` if needed.
    pub async fn create(root: &Path, job_id: &JobId) -> io::Result<Self> {
        tokio::fs::create_dir_all(root).await?;

        let dir = tempfile::Builder::new()
            .prefix(&format!("{}-", job_id))
            .tempdir_in(root)?;

        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path for a file owned by scene `index`.
    ///
    /// Names use the position rather than the caller's scene id, so ids never
    /// reach the filesystem.
    pub fn scene_file(&self, index: usize, name: &str) -> PathBuf {
        self.dir.path().join(format!("scene-{:03}-{}", index, name))
    }

    /// File name prefix for assets of scene `index`.
    pub fn scene_stem(&self, index: usize, role: &str) -> String {
        format!("scene-{:03}-{}", index, role)
    }

    /// Path for a file shared by the whole run.
    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Remove the workspace now, reporting failures.
    pub fn close(self) -> io::Result<()> {
        self.dir.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_created_under_root_and_removed_on_drop() {
        let root = tempfile::tempdir().unwrap();
        let nested = root.path().join("work");
        let job_id = JobId::from_string("video-abc");

        let workspace = Workspace::create(&nested, &job_id).await.unwrap();
        let path = workspace.path().to_path_buf();
        assert!(path.starts_with(&nested));
        assert!(path.file_name().unwrap().to_string_lossy().starts_with("video-abc-"));

        std::fs::write(workspace.scene_file(0, "segment.mp4"), b"x").unwrap();
        drop(workspace);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_workspaces_are_unique() {
        let root = tempfile::tempdir().unwrap();
        let job_id = JobId::new();

        let a = Workspace::create(root.path(), &job_id).await.unwrap();
        let b = Workspace::create(root.path(), &job_id).await.unwrap();
        assert_ne!(a.path(), b.path());
    }

    #[test]
    fn test_scene_file_names() {
        let dir = tempfile::tempdir().unwrap();
        let workspace = Workspace {
            dir: tempfile::tempdir_in(dir.path()).unwrap(),
        };
        assert!(workspace.scene_file(7, "clip.mp4").ends_with("scene-007-clip.mp4"));
        assert_eq!(workspace.scene_stem(12, "audio"), "scene-012-audio");
    }
}
