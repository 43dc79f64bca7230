mod config;
mod files;
mod lyrics;
mod matcher;
mod metadata;
mod normalize;
mod pipeline;
mod prompt;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::lyrics::LrclibClient;
use crate::pipeline::Pipeline;
use crate::prompt::ConsolePrompter;

/// Audio formats accepted from the track pool.
const TRACK_EXTENSIONS: &[&str] = &["mp3", "flac", "m4a", "ogg"];

#[derive(Debug, Parser)]
#[command(
    name = "lrcpush",
    version,
    about = "Match local LRC files to audio tracks and publish lyrics to LRCLIB"
)]
struct Cli {
    /// Override config file path.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Confirm every upload without prompting.
    #[arg(long)]
    yes: bool,

    /// Preview what would happen without uploading or moving files.
    #[arg(long)]
    dry_run: bool,

    /// Process a single named track inside the track pool instead of
    /// scanning it.
    #[arg(long)]
    single: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let cfg = config::load(cli.config.as_deref()).context("load config")?;

    tokio::select! {
        result = run(&cfg, &cli) => result,
        _ = tokio::signal::ctrl_c() => {
            println!();
            info!("interrupted, exiting");
            Ok(())
        }
    }
}

async fn run(cfg: &config::Config, cli: &Cli) -> anyhow::Result<()> {
    let client = LrclibClient::new(&cfg.api.base_url, cfg.api.timeout_secs)?;
    let prompter = ConsolePrompter;
    let pipeline = Pipeline::new(cfg, &client, &prompter, cli.yes, cli.dry_run);

    let track_paths = match &cli.single {
        Some(name) => {
            let path = cfg.paths.tracks_dir.join(name);
            if !path.is_file() {
                anyhow::bail!("no such track: {}", path.display());
            }
            vec![path]
        }
        None => discover_tracks(&cfg.paths.tracks_dir),
    };

    if track_paths.is_empty() {
        info!("no tracks in {}", cfg.paths.tracks_dir.display());
        return Ok(());
    }

    for path in &track_paths {
        let track = match metadata::read_track(path) {
            Ok(track) => track,
            Err(err) => {
                warn!("{err:#}, skipping");
                continue;
            }
        };
        pipeline.process_track(&track).await;
        println!();
    }

    info!("all tracks processed");
    Ok(())
}

fn discover_tracks(pool: &Path) -> Vec<PathBuf> {
    WalkDir::new(pool)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path().extension().map_or(false, |ext| {
                TRACK_EXTENSIONS
                    .iter()
                    .any(|known| ext.eq_ignore_ascii_case(known))
            })
        })
        .map(|e| e.into_path())
        .collect()
}
