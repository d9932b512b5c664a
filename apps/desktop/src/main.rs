use std::{
    fs::File,
    io::{self, BufReader},
    path::PathBuf,
};

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{compare::Catalog, load_settings_from};
use crossbeam_channel::{bounded, unbounded};
use tracing_subscriber::EnvFilter;

mod backend_bridge;
mod controller;
mod ui;

use backend_bridge::commands::BackendCommand;
use controller::events::UiEvent;
use ui::ConsoleApp;

/// Virtual H&E staining client.
#[derive(Parser, Debug)]
struct Args {
    /// Read commands from this file instead of stdin.
    #[arg(long)]
    script: Option<PathBuf>,
    /// Settings file to use instead of ./stainviz.toml.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();
    let args = Args::parse();

    let settings = load_settings_from(args.config.as_deref());
    tracing::info!(api_url = %settings.api_url, "loaded client settings");
    let catalog = Catalog::new(settings.compare_sources.clone());

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(256);
    let (ui_tx, ui_rx) = unbounded::<UiEvent>();
    let _worker = backend_bridge::runtime::launch(settings, cmd_rx, ui_tx);

    let mut app = ConsoleApp::new(catalog, cmd_tx, ui_rx);
    match args.script {
        Some(path) => {
            let file = File::open(&path)
                .with_context(|| format!("failed to open script '{}'", path.display()))?;
            app.run(BufReader::new(file), io::stdout())
        }
        None => app.run(io::stdin().lock(), io::stdout()),
    }
}
