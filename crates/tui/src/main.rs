mod app;
mod config;
mod renderer;

use std::fs::File;
use std::io::stdout;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use lanewise_core::ZoomLevel;
use lanewise_core::loaders::load_paths;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::app::App;
use crate::config::TuiConfig;

#[derive(Parser)]
#[command(name = "lanewise", about = "Compare agent sessions side by side in the terminal")]
struct Cli {
    /// Session files: Claude Code transcripts (.jsonl) or native lane JSON
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Initial zoom level
    #[arg(long, value_enum)]
    zoom: Option<ZoomArg>,

    /// Start with scroll sync off
    #[arg(long)]
    no_sync: bool,

    /// Write logs here (filter with LANEWISE_LOG)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum ZoomArg {
    Pixel,
    Skim,
    Detail,
}

impl From<ZoomArg> for ZoomLevel {
    fn from(arg: ZoomArg) -> Self {
        match arg {
            ZoomArg::Pixel => Self::Pixel,
            ZoomArg::Skim => Self::Skim,
            ZoomArg::Detail => Self::Detail,
        }
    }
}

fn init_logging(path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_env("LANEWISE_LOG").unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    // The terminal owns stdout/stderr while running, so logs only go to a file.
    if let Some(path) = &cli.log_file {
        init_logging(path)?;
    }

    let mut config = TuiConfig::load(cli.config.as_deref())?;
    if let Some(zoom) = cli.zoom {
        config.board.initial_zoom = zoom.into();
    }
    if cli.no_sync {
        config.board.sync_scroll = false;
    }

    let (lanes, failures) = load_paths(&cli.paths);
    for (path, err) in &failures {
        eprintln!("skipping {}: {err}", path.display());
    }
    if lanes.is_empty() {
        bail!("no sessions could be loaded");
    }
    info!(lanes = lanes.len(), "starting viewer");

    let mut terminal = ratatui::init();
    let result = execute!(stdout(), EnableMouseCapture)
        .context("enabling mouse capture")
        .and_then(|()| App::new(config, cli.paths, lanes).run(&mut terminal));
    let released = execute!(stdout(), DisableMouseCapture);
    ratatui::restore();
    finish(result, released)
}

/// The viewer's own error wins; a failed mouse release is reported only
/// when the run itself succeeded.
fn finish(run: Result<()>, released: std::io::Result<()>) -> Result<()> {
    run?;
    released.context("releasing mouse capture")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn teardown_error_is_reported() {
        let err = finish(Ok(()), Err(io::Error::other("tty gone"))).unwrap_err();
        assert_eq!(err.to_string(), "releasing mouse capture");
        assert!(finish(Ok(()), Ok(())).is_ok());
    }

    #[test]
    fn run_error_takes_precedence() {
        let err = finish(Err(anyhow::anyhow!("draw failed")), Err(io::Error::other("tty gone")))
            .unwrap_err();
        assert_eq!(err.to_string(), "draw failed");
    }
}
