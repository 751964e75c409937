#![forbid(unsafe_code)]

mod color;
mod config;
mod constants;
mod error;
mod geometry;
mod gui;
mod interaction;
mod logos;
mod persistence;
mod remote;
mod render;
mod seed;
mod store;
mod types;
mod workspace;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn, Level as TraceLevel};
use tracing_subscriber::FmtSubscriber;

use config::AppConfig;
use constants::config::{DEFAULT_LOG_LEVEL, ENV_LOG_LEVEL};
use constants::export::{DEFAULT_HEIGHT, DEFAULT_WIDTH};
use geometry::compute_layout;
use logos::{HttpImageSource, LogoLoader};
use persistence::LocalStore;
use remote::{HttpDocumentStore, RemoteMirror};
use render::{export_png, LogoCache, Painter, Scene, TextRenderer};

/// Drag-and-drop business card canvas
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Config file (default: platform config dir)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Canvas document to load and save
    #[arg(long, value_name = "PATH")]
    data: Option<PathBuf>,

    /// Render the canvas to a PNG (file or directory) and exit without opening a window
    #[arg(long, value_name = "PATH")]
    export: Option<PathBuf>,

    /// Viewport width used for --export and --populate
    #[arg(long, default_value_t = DEFAULT_WIDTH)]
    width: u32,

    /// Viewport height used for --export and --populate
    #[arg(long, default_value_t = DEFAULT_HEIGHT)]
    height: u32,

    /// Bulk-add the built-in companies before starting
    #[arg(long)]
    populate: bool,

    /// Remove every card before starting
    #[arg(long)]
    reset: bool,
}

fn parse_level(level: &str) -> TraceLevel {
    match level.trim().to_lowercase().as_str() {
        "trace" => TraceLevel::TRACE,
        "debug" => TraceLevel::DEBUG,
        "warn" => TraceLevel::WARN,
        "error" => TraceLevel::ERROR,
        _ => TraceLevel::INFO,
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // LOG_LEVEL wins over the config file; the config has to be read before logging starts
    let config_path = args.config.clone().unwrap_or_else(AppConfig::default_path);
    let config = AppConfig::load(Some(config_path.as_path()));
    let level = std::env::var(ENV_LOG_LEVEL)
        .ok()
        .or_else(|| config.as_ref().ok().map(|c| c.log_level.clone()))
        .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

    let subscriber = FmtSubscriber::builder()
        .with_max_level(parse_level(&level))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = config?;
    info!(path = %config_path.display(), "Loaded config");

    let local = LocalStore::new(args.data.clone().unwrap_or_else(|| config.data_path()));
    let mut workspace = local.load_or_seed();

    let (width, height) = (args.width.max(1) as f32, args.height.max(1) as f32);
    if args.reset {
        workspace.clear_all();
        info!("Cleared all cards");
    }
    if args.populate {
        let layout = compute_layout(width, height, workspace.settings.circle_radius, workspace.settings.circle_spacing);
        let added = workspace.populate(&layout);
        info!(added = added, "Populated canvas");
    }
    if args.reset || args.populate {
        // Logged inside save; keep going with the in-memory canvas
        let _ = local.save(&workspace);
    }

    let text = TextRenderer::load(config.font_name.as_deref())
        .inspect_err(|e| warn!(error = %e, "No usable font found, card text will be skipped"))
        .ok();

    if let Some(target) = &args.export {
        let logos = LogoCache::new();
        let scene = Scene {
            workspace: &workspace,
            hovered: None,
            logos: &logos,
            circle_labels: &config.circle_labels,
        };
        let path = export_png(&Painter::new(text.as_ref()), &scene, width, height, target)?;
        println!("{}", path.display());
        return Ok(());
    }

    let logos = HttpImageSource::new()
        .and_then(LogoLoader::spawn)
        .inspect_err(|e| warn!(error = ?e, "Logo loader unavailable, cards will show initials"))
        .ok();

    let mirror = match config.remote_url() {
        Some(url) => HttpDocumentStore::new(url)
            .and_then(|store| RemoteMirror::spawn(store, config.mirror_options()))
            .inspect_err(|e| warn!(error = ?e, "Remote mirror unavailable, continuing local-only"))
            .ok(),
        None => None,
    };

    gui::run_gui(gui::Services {
        config,
        config_path,
        local,
        workspace,
        text,
        logos,
        mirror,
    })
}
