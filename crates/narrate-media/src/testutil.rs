//! Fixture generation for tests that drive the real FFmpeg binary.

pub(crate) mod lavfi {
    use std::path::{Path, PathBuf};
    use tokio::process::Command;

    async fn generate(args: &[String], output: PathBuf) -> PathBuf {
        let status = Command::new("ffmpeg")
            .args(["-y", "-hide_banner", "-v", "error"])
            .args(args)
            .arg(&output)
            .status()
            .await
            .expect("spawn ffmpeg");
        assert!(status.success(), "fixture generation failed for {}", output.display());
        output
    }

    /// Test-pattern clip without audio.
    pub(crate) async fn video_clip(dir: &Path, name: &str, seconds: f64, width: u32, height: u32) -> PathBuf {
        let args = vec![
            "-f".to_string(),
            "lavfi".to_string(),
            "-i".to_string(),
            format!("testsrc=duration={}:size={}x{}:rate=25", seconds, width, height),
            "-pix_fmt".to_string(),
            "yuv420p".to_string(),
        ];
        generate(&args, dir.join(name)).await
    }

    /// Single-frame image.
    pub(crate) async fn still_image(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
        let args = vec![
            "-f".to_string(),
            "lavfi".to_string(),
            "-i".to_string(),
            format!("color=c=steelblue:size={}x{}", width, height),
            "-frames:v".to_string(),
            "1".to_string(),
        ];
        generate(&args, dir.join(name)).await
    }

    /// Sine tone in a WAV container.
    pub(crate) async fn tone(dir: &Path, name: &str, seconds: f64) -> PathBuf {
        let args = vec![
            "-f".to_string(),
            "lavfi".to_string(),
            "-i".to_string(),
            format!("sine=frequency=440:duration={}", seconds),
            "-c:a".to_string(),
            "pcm_s16le".to_string(),
        ];
        generate(&args, dir.join(name)).await
    }
}
