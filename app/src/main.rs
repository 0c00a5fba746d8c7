mod app;
mod plots;
mod ui;

use std::path::PathBuf;

use anyhow::Context;
use app::DashboardApp;
use clap::Parser;
use listings::DashboardConfig;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Airbnb listings dashboard.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// TOML configuration file (defaults to ./dashboard.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Listings CSV, overrides `data_path`
    #[arg(long)]
    data: Option<PathBuf>,

    /// Pipeline artifact, overrides `model_path`
    #[arg(long)]
    model: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let mut config = DashboardConfig::load(args.config.as_deref()).context("loading dashboard configuration")?;
    if let Some(data) = args.data {
        config.data_path = data;
    }
    if let Some(model) = args.model {
        config.model_path = model;
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter)))
        .init();
    info!(data = %config.data_path.display(), model = %config.model_path.display(), "starting dashboard");

    let native_options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size(config.window_size),
        ..Default::default()
    };
    eframe::run_native(
        "Airbnb Demo",
        native_options,
        Box::new(|_cc| Ok(Box::new(DashboardApp::new(config)))),
    )
    .map_err(|e| anyhow::anyhow!("dashboard window failed: {e}"))
}
