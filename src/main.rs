mod app;
mod autocomplete;
mod config;
mod controller;
mod filter_record;
mod opensearch_provider;
mod presentation;
mod provider;
mod refine;
mod toast;
mod ui;

use anyhow::{bail, Context, Result};
use app::App;
use clap::Parser;
use config::AppConfig;
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use filter_record::FilterRecord;
use opensearch_provider::OpenSearchProvider;
use provider::{FileProvider, SearchProvider};
use ratatui::prelude::*;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "property_explorer")]
#[command(version)]
#[command(about = "Search property listings by location and refine them live", long_about = None)]
struct Args {
    /// Config file (defaults to ~/.config/property_explorer/config.json)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Read listings from a local JSON file instead of OpenSearch
    #[arg(long, value_name = "FILE")]
    listings: Option<PathBuf>,

    /// Initial location
    #[arg(long)]
    location: Option<String>,

    /// Initial filters as JSON, e.g. '{"bedsMin":3,"hasPool":true}'
    #[arg(long, value_name = "JSON")]
    filters: Option<String>,

    /// Write tracing output to this file
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,

    /// Save the effective config and exit
    #[arg(long)]
    write_config: bool,
}

/// Log to a file, since the terminal belongs to the UI. `RUST_LOG` overrides
/// the default level.
fn init_logging(path: &PathBuf) -> Result<()> {
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn initial_record(args: &Args) -> Result<Option<FilterRecord>> {
    let mut record = match &args.filters {
        Some(json) => Some(
            serde_json::from_str::<FilterRecord>(json).context("parsing --filters")?,
        ),
        None => None,
    };
    if let Some(location) = &args.location {
        record.get_or_insert_with(FilterRecord::default).location = location.clone();
    }
    Ok(record)
}

async fn build_provider(config: &AppConfig) -> Result<Arc<dyn SearchProvider>> {
    if let Some(path) = &config.listings_file {
        return Ok(Arc::new(FileProvider::new(path.clone())));
    }
    let Some(endpoint) = &config.endpoint_url else {
        bail!(
            "no search backend configured: set endpoint_url or listings_file in {}, or pass --listings",
            config::config_path().display()
        );
    };
    Ok(Arc::new(OpenSearchProvider::connect(endpoint, config).await?))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config_path = args.config.clone().unwrap_or_else(config::config_path);
    let mut config = config::load_config(&config_path)?.unwrap_or_default();
    if let Some(path) = &args.listings {
        config.listings_file = Some(path.clone());
    }
    if let Some(path) = &args.log_file {
        config.log_file = Some(path.clone());
    }

    if args.write_config {
        config::save_config(&config_path, &config)?;
        println!("Wrote {}", config_path.display());
        return Ok(());
    }

    if let Some(path) = &config.log_file {
        init_logging(path)?;
    }
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "property_explorer starting");

    let initial = initial_record(&args)?;
    let provider = build_provider(&config).await?;
    let mut app = App::new(&config, provider, initial);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    app.resize(terminal.size()?.width);

    // Show loading state, then fetch facets
    terminal.draw(|f| ui::render(f, &app))?;
    app.load_facets().await;

    // Main loop
    let result = run(&mut terminal, &mut app).await;

    // Cleanup terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = &result {
        tracing::error!(error = %e, "exiting with error");
    }
    result
}

async fn run(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    loop {
        app.on_tick(Instant::now());
        terminal.draw(|f| ui::render(f, app))?;

        // Yield so spawned searches make progress between polls.
        tokio::task::yield_now().await;

        if event::poll(Duration::from_millis(100))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if app.handle_key(key) {
                        tracing::info!("quit");
                        return Ok(());
                    }
                }
                Event::Resize(width, _) => app.resize(width),
                _ => {}
            }
        }
    }
}
