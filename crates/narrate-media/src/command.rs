//! FFmpeg command builder and runner.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use narrate_models::EncodingConfig;

use crate::error::{MediaError, MediaResult};
use crate::progress::{is_progress_line, parse_progress_line, FfmpegProgress};

/// Number of non-progress stderr lines kept for error reports.
const STDERR_TAIL_LINES: usize = 20;

/// One `-i` input together with the options that precede it.
#[derive(Debug, Clone)]
struct FfmpegInput {
    path: PathBuf,
    args: Vec<String>,
}

/// Builder for FFmpeg commands.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    /// Inputs in `-i` order
    inputs: Vec<FfmpegInput>,
    /// Output file path
    output: PathBuf,
    /// Output arguments (after the last -i)
    output_args: Vec<String>,
    /// Whether to overwrite output
    overwrite: bool,
    /// Log level
    log_level: String,
}

impl FfmpegCommand {
    /// Create a new FFmpeg command with a single input.
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self {
            inputs: vec![FfmpegInput {
                path: input.as_ref().to_path_buf(),
                args: Vec::new(),
            }],
            output: output.as_ref().to_path_buf(),
            output_args: Vec::new(),
            overwrite: true,
            log_level: "error".to_string(),
        }
    }

    /// Append another input. Subsequent input arguments apply to it.
    pub fn add_input(mut self, input: impl AsRef<Path>) -> Self {
        self.inputs.push(FfmpegInput {
            path: input.as_ref().to_path_buf(),
            args: Vec::new(),
        });
        self
    }

    /// Add an input argument to the most recently added input.
    pub fn input_arg(mut self, arg: impl Into<String>) -> Self {
        if let Some(input) = self.inputs.last_mut() {
            input.args.push(arg.into());
        }
        self
    }

    /// Add multiple input arguments to the most recently added input.
    pub fn input_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let Some(input) = self.inputs.last_mut() {
            input.args.extend(args.into_iter().map(Into::into));
        }
        self
    }

    /// Add output arguments (after -i).
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Add multiple output arguments.
    pub fn output_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Treat a still image input as an endless stream.
    pub fn loop_image(self) -> Self {
        self.input_arg("-loop").input_arg("1")
    }

    /// Replay the current input `count` additional times.
    pub fn stream_loop(self, count: u32) -> Self {
        self.input_arg("-stream_loop").input_arg(count.to_string())
    }

    /// Force the demuxer of the current input.
    pub fn input_format(self, format: impl Into<String>) -> Self {
        self.input_arg("-f").input_arg(format)
    }

    /// Limit output duration. Applied on the output side so looped inputs
    /// are hard-trimmed.
    pub fn duration(self, seconds: f64) -> Self {
        self.output_arg("-t").output_arg(format!("{:.3}", seconds))
    }

    /// Set video filter.
    pub fn video_filter(self, filter: impl Into<String>) -> Self {
        self.output_arg("-vf").output_arg(filter)
    }

    /// Select a stream for the output.
    pub fn map(self, spec: impl Into<String>) -> Self {
        self.output_arg("-map").output_arg(spec)
    }

    /// Set video codec.
    pub fn video_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:v").output_arg(codec)
    }

    /// Set audio codec.
    pub fn audio_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:a").output_arg(codec)
    }

    /// Copy every stream without re-encoding.
    pub fn codec_copy(self) -> Self {
        self.output_arg("-c").output_arg("copy")
    }

    /// Set audio bitrate.
    pub fn audio_bitrate(self, bitrate: impl Into<String>) -> Self {
        self.output_arg("-b:a").output_arg(bitrate)
    }

    /// Drop all audio streams.
    pub fn no_audio(self) -> Self {
        self.output_arg("-an")
    }

    /// End the output with the shortest stream.
    pub fn shortest(self) -> Self {
        self.output_arg("-shortest")
    }

    /// Move the moov atom to the front of the file.
    pub fn faststart(self) -> Self {
        self.output_arg("-movflags").output_arg("+faststart")
    }

    /// Apply the video encoder settings of an encoding profile.
    pub fn video_encoding(self, encoding: &EncodingConfig) -> Self {
        self.output_args(encoding.video_args())
    }

    /// Apply the audio encoder settings of an encoding profile.
    pub fn audio_encoding(self, encoding: &EncodingConfig) -> Self {
        self.output_args(encoding.audio_args())
    }

    /// Set log level.
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Output path of this command.
    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if self.overwrite {
            args.push("-y".to_string());
        }

        args.push("-nostdin".to_string());
        args.push("-hide_banner".to_string());

        args.push("-v".to_string());
        args.push(self.log_level.clone());

        // Progress output to stderr
        args.push("-progress".to_string());
        args.push("pipe:2".to_string());

        for input in &self.inputs {
            args.extend(input.args.iter().cloned());
            args.push("-i".to_string());
            args.push(input.path.to_string_lossy().to_string());
        }

        args.extend(self.output_args.iter().cloned());
        args.push(self.output.to_string_lossy().to_string());

        args
    }
}

/// Runner for FFmpeg commands with timeout and cancellation.
///
/// The child process is killed when the timeout expires, when the
/// cancellation signal flips to `true`, or when the running future is
/// dropped.
#[derive(Debug, Clone, Default)]
pub struct FfmpegRunner {
    /// Cancellation signal receiver
    cancel_rx: Option<watch::Receiver<bool>>,
    /// Wall-clock budget
    timeout: Option<Duration>,
}

impl FfmpegRunner {
    /// Create a new runner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set cancellation signal.
    pub fn with_cancel(mut self, cancel_rx: watch::Receiver<bool>) -> Self {
        self.cancel_rx = Some(cancel_rx);
        self
    }

    /// Set timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Run an FFmpeg command.
    pub async fn run(&self, cmd: &FfmpegCommand) -> MediaResult<()> {
        self.run_with_progress(cmd, |_| {}).await
    }

    /// Run an FFmpeg command with progress callback.
    pub async fn run_with_progress<F>(&self, cmd: &FfmpegCommand, progress_callback: F) -> MediaResult<()>
    where
        F: Fn(FfmpegProgress) + Send + 'static,
    {
        check_ffmpeg()?;

        if cancel_requested(self.cancel_rx.as_ref()) {
            return Err(MediaError::Cancelled);
        }

        let args = cmd.build_args();
        debug!("Running FFmpeg: ffmpeg {}", args.join(" "));

        let mut child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| MediaError::ffmpeg_failed("FFmpeg stderr was not captured", None, None))?;
        let mut reader = BufReader::new(stderr).lines();

        // Progress lines go to the callback, everything else is kept for errors
        let stderr_handle = tokio::spawn(async move {
            let mut current_progress = FfmpegProgress::default();
            let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);

            while let Ok(Some(line)) = reader.next_line().await {
                if is_progress_line(&line) {
                    if let Some(progress) = parse_progress_line(&line, &mut current_progress) {
                        progress_callback(progress);
                    }
                } else if !line.trim().is_empty() {
                    if tail.len() == STDERR_TAIL_LINES {
                        tail.pop_front();
                    }
                    tail.push_back(line);
                }
            }

            tail.into_iter().collect::<Vec<_>>().join("\n")
        });

        let started = Instant::now();
        let result = self.wait_for_completion(&mut child).await;
        metrics::histogram!("narrate_ffmpeg_duration_seconds").record(started.elapsed().as_secs_f64());

        let stderr_tail = stderr_handle.await.unwrap_or_default();

        match result {
            Ok(status) if status.success() => Ok(()),
            Ok(status) => {
                metrics::counter!("narrate_ffmpeg_failures_total").increment(1);
                Err(MediaError::ffmpeg_failed(
                format!(
                    "FFmpeg exited with status {}{}",
                    status.code().map_or_else(|| "signal".to_string(), |c| c.to_string()),
                    stderr_tail
                        .lines()
                        .last()
                        .map(|l| format!(": {}", l.trim()))
                        .unwrap_or_default()
                ),
                (!stderr_tail.is_empty()).then_some(stderr_tail),
                status.code(),
                ))
            }
            Err(e) => Err(e),
        }
    }

    /// Wait for child process with cancellation and timeout.
    async fn wait_for_completion(&self, child: &mut Child) -> MediaResult<std::process::ExitStatus> {
        let timeout = self.timeout;

        tokio::select! {
            status = child.wait() => Ok(status?),
            _ = deadline(timeout) => {
                let timeout = timeout.unwrap_or_default();
                warn!("FFmpeg timed out after {:?}, killing process", timeout);
                let _ = child.kill().await;
                Err(MediaError::Timeout(timeout))
            }
            _ = cancelled(self.cancel_rx.clone()) => {
                info!("FFmpeg cancelled, killing process");
                let _ = child.kill().await;
                Err(MediaError::Cancelled)
            }
        }
    }
}

/// Whether a cancellation signal has already fired.
pub(crate) fn cancel_requested(cancel_rx: Option<&watch::Receiver<bool>>) -> bool {
    cancel_rx.is_some_and(|rx| *rx.borrow())
}

/// Resolves once the timeout elapses; never resolves without one.
pub(crate) async fn deadline(timeout: Option<Duration>) {
    match timeout {
        Some(timeout) => tokio::time::sleep(timeout).await,
        None => std::future::pending().await,
    }
}

/// Resolves once the signal flips to `true`; never resolves without one or
/// after the sender is dropped.
pub async fn cancelled(cancel_rx: Option<watch::Receiver<bool>>) {
    let Some(mut rx) = cancel_rx else {
        return std::future::pending().await;
    };

    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            return std::future::pending().await;
        }
    }
}

/// Check if FFmpeg is available.
pub fn check_ffmpeg() -> MediaResult<PathBuf> {
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)
}

/// Check if FFprobe is available.
pub fn check_ffprobe() -> MediaResult<PathBuf> {
    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_builder() {
        let cmd = FfmpegCommand::new("input.mp4", "output.mp4")
            .stream_loop(2)
            .duration(7.5)
            .video_codec("libx264")
            .no_audio();

        let args = cmd.build_args();
        let loop_pos = args.iter().position(|a| a == "-stream_loop").unwrap();
        let input_pos = args.iter().position(|a| a == "-i").unwrap();
        let t_pos = args.iter().position(|a| a == "-t").unwrap();

        assert!(loop_pos < input_pos, "input options precede -i");
        assert!(t_pos > input_pos, "duration is an output option");
        assert_eq!(args[t_pos + 1], "7.500");
        assert_eq!(args.last().unwrap(), "output.mp4");
        assert!(args.contains(&"-an".to_string()));
    }

    #[test]
    fn test_input_args_attach_to_latest_input() {
        let args = FfmpegCommand::new("video.mp4", "out.mp4")
            .add_input("list.txt")
            .input_format("concat")
            .build_args();

        let inputs: Vec<usize> = args
            .iter()
            .enumerate()
            .filter(|(_, a)| *a == "-i")
            .map(|(i, _)| i)
            .collect();
        assert_eq!(inputs.len(), 2);
        assert_eq!(args[inputs[0] + 1], "video.mp4");
        assert_eq!(args[inputs[1] + 1], "list.txt");

        let f_pos = args.iter().position(|a| a == "-f").unwrap();
        assert!(f_pos > inputs[0] && f_pos < inputs[1]);
    }

    #[test]
    fn test_encoding_profile_args() {
        let encoding = EncodingConfig::default();
        let args = FfmpegCommand::new("a.png", "b.mp4")
            .video_encoding(&encoding)
            .audio_encoding(&encoding)
            .build_args();

        assert!(args.windows(2).any(|w| w[0] == "-pix_fmt" && w[1] == "yuv420p"));
        assert!(args.windows(2).any(|w| w[0] == "-b:a" && w[1] == "192k"));
        assert!(args.windows(2).any(|w| w[0] == "-ar" && w[1] == "48000"));
        assert!(args.windows(2).any(|w| w[0] == "-ac" && w[1] == "2"));
    }

    #[tokio::test]
    async fn test_cancelled_resolves_on_signal() {
        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(cancelled(Some(rx)));
        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("cancellation future should resolve")
            .unwrap();
    }

    #[tokio::test]
    async fn test_cancelled_pending_without_signal() {
        let result = tokio::time::timeout(Duration::from_millis(50), cancelled(None)).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_run_refuses_when_already_cancelled() {
        if check_ffmpeg().is_err() {
            return;
        }
        let (_tx, rx) = watch::channel(true);
        let runner = FfmpegRunner::new().with_cancel(rx);
        let cmd = FfmpegCommand::new("missing.mp4", "out.mp4");
        assert!(runner.run(&cmd).await.unwrap_err().is_cancelled());
    }
}
