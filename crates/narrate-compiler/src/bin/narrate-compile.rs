//! Compile a scene list from a JSON file into one video.

use std::io::Read as _;
use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use tokio::sync::watch;
use tracing::{info, warn};

use narrate_compiler::{telemetry, CompilerConfig, FfmpegToolkit, RunOptions, SceneCompiler};
use narrate_models::CompileRequest;

#[derive(Parser, Debug)]
#[command(name = "narrate-compile", version)]
struct Cli {
    /// Request JSON file, or `-` for stdin.
    #[arg(required_unless_present = "schema")]
    input: Option<String>,

    /// Output MP4 path.
    #[arg(short, long, required_unless_present = "schema")]
    output: Option<PathBuf>,

    /// Print the JSON Schema of the request format and exit.
    #[arg(long, conflicts_with_all = ["input", "output"])]
    schema: bool,

    /// Burn word-level subtitles into the video.
    #[arg(long, overrides_with = "no_subtitles")]
    subtitles: bool,

    /// Do not burn subtitles, whatever the request says.
    #[arg(long, overrides_with = "subtitles")]
    no_subtitles: bool,

    /// Workspace root (defaults to NARRATE_WORK_DIR).
    #[arg(long)]
    work_dir: Option<PathBuf>,
}

impl Cli {
    fn subtitle_override(&self) -> Option<bool> {
        match (self.subtitles, self.no_subtitles) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

fn read_request(input: &str) -> anyhow::Result<CompileRequest> {
    let raw = if input == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("read request from stdin")?;
        buf
    } else {
        std::fs::read_to_string(input).with_context(|| format!("open request '{}'", input))?
    };

    serde_json::from_str(&raw).context("parse request JSON")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init_tracing();

    let cli = Cli::parse();

    if cli.schema {
        println!("{}", serde_json::to_string_pretty(&CompileRequest::json_schema())?);
        return Ok(());
    }
    let (Some(input), Some(output)) = (cli.input.as_deref(), cli.output.as_deref()) else {
        anyhow::bail!("an input request and --output are required");
    };

    let mut request = read_request(input)?;
    if let Some(burn) = cli.subtitle_override() {
        request.burn_subtitles = burn;
    }

    FfmpegToolkit::check_tools().context("ffmpeg and ffprobe must be on PATH")?;

    let mut config = CompilerConfig::from_env();
    if let Some(work_dir) = cli.work_dir.clone() {
        config = config.with_work_dir(work_dir);
    }
    let compiler = SceneCompiler::with_ffmpeg(config).context("initialize compiler")?;

    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling");
            let _ = cancel_tx.send(true);
        }
    });

    let video = compiler
        .compile_with(&request, RunOptions::new().with_cancel(cancel_rx))
        .await?;

    let summary = video
        .persist_to(output)
        .await
        .with_context(|| format!("write '{}'", output.display()))?;
    info!(output = %output.display(), "Video written");

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
