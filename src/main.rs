mod app;
mod ui;

use std::path::PathBuf;

use anyhow::{Context, Result};
use app::TipsDashboardApp;
use clap::Parser;
use eframe::egui;
use tips_dashboard::data::loader::TIPS_URL;
use tips_dashboard::state::AppState;

#[derive(Parser, Debug)]
#[command(name = "tips-dashboard")]
#[command(about = "Interactive dashboard over the restaurant tips dataset", long_about = None)]
struct Args {
    /// Tips dataset to open at startup (.csv, .json or .parquet); fetched from --url when omitted
    data: Option<PathBuf>,

    /// URL of a tips CSV, fetched when no DATA path is given
    #[arg(long, default_value = TIPS_URL)]
    url: String,

    /// Initial window width in points
    #[arg(long, default_value_t = 1200.0)]
    width: f32,

    /// Initial window height in points
    #[arg(long, default_value_t = 900.0)]
    height: f32,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut state = AppState::default();
    match &args.data {
        Some(path) => state
            .load_path(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => state
            .load_url(&args.url)
            .with_context(|| format!("Failed to fetch {}", args.url))?,
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([args.width, args.height])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Tips Dataset Dashboard",
        options,
        Box::new(|_cc| Ok(Box::new(TipsDashboardApp::new(state)))),
    )
    .map_err(|e| anyhow::anyhow!("{e}"))
}
