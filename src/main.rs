//! Livescore - Live football scores in the terminal
//!
//! A terminal UI application that shows fixtures currently in play from
//! API-Football, refreshing automatically while keeping a reserve of API
//! calls and falling back to the last cached list when a fetch fails.

use std::fs::{self, OpenOptions};
use std::io;
use std::panic;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use livescore::app::{App, FetchTrigger};
use livescore::cache::{FileStore, MatchCache, MemoryStore};
use livescore::cli::{CacheLocation, Cli, RunMode, StartupConfig};
use livescore::config::Config;
use livescore::data::FixturesClient;
use livescore::refresh::{self, RefreshConfig, RefreshHandle, RefreshMessage};
use livescore::ui;

const LOG_FILE_NAME: &str = "livescore.log";
const DEFAULT_LOG_FILTER: &str = "livescore=info,warn";

/// Where log output goes
enum LogTarget {
    Stderr,
    File(PathBuf),
}

/// Sets up a panic hook that restores the terminal before printing the panic message.
/// This ensures the terminal is usable even if the application panics.
fn setup_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        // Attempt to restore the terminal
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        // Call the original panic hook
        original_hook(panic_info);
    }));
}

/// Installs the tracing subscriber. The interactive UI owns the terminal, so
/// it logs to a file without ANSI colours.
fn init_logging(target: LogTarget) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let registry = tracing_subscriber::registry().with(filter);

    match target {
        LogTarget::Stderr => registry
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
            .init(),
        LogTarget::File(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                )
                .init();
        }
    }
    Ok(())
}

fn log_target(startup: &StartupConfig, cache_dir: Option<&Path>) -> LogTarget {
    if let RunMode::Once { .. } = startup.mode {
        return LogTarget::Stderr;
    }
    let path = match (&startup.log_file, cache_dir) {
        (Some(path), _) => path.clone(),
        (None, Some(dir)) => dir.join(LOG_FILE_NAME),
        (None, None) => std::env::temp_dir().join(LOG_FILE_NAME),
    };
    LogTarget::File(path)
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Renders the match list, with the help overlay on top when toggled
fn render_ui(frame: &mut ratatui::Frame, app: &App) {
    ui::render_match_list(frame, app, now_ms());
    if app.show_help {
        ui::render_help_overlay(frame);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let startup = StartupConfig::from_cli(&cli)?;

    let mut config = Config::from_env()?;
    config.apply(&startup);

    let file_store = match &startup.cache {
        CacheLocation::Default => FileStore::new(),
        CacheLocation::Dir(dir) => Some(FileStore::with_dir(dir.clone())),
        CacheLocation::Memory => None,
    };

    init_logging(log_target(&startup, file_store.as_ref().map(FileStore::dir)))?;
    info!(
        base_url = %config.base_url,
        interval_secs = config.poll_interval.as_secs(),
        "Starting livescore"
    );
    if config.api_key.is_none() {
        warn!("No API key configured; set API_FOOTBALL_KEY");
    }

    let cache = match file_store {
        Some(store) => {
            info!(dir = %store.dir().display(), "Using file cache");
            MatchCache::new(store)
        }
        None => {
            if startup.cache == CacheLocation::Default {
                warn!("No cache directory available, caching in memory");
            }
            MatchCache::new(MemoryStore::new())
        }
    };
    if startup.clear_cache {
        cache.clear();
        info!("Cleared cached matches");
    }

    let client = FixturesClient::with_options(
        config.api_key.clone(),
        config.base_url.clone(),
        config.request_timeout,
    )
    .context("Failed to build HTTP client")?;

    let app = App::new(client, cache);

    match startup.mode {
        RunMode::Once { json } => run_once(app, json).await,
        RunMode::Interactive => run_tui(app, config.poll_interval).await,
    }
}

/// Fetches once and prints the result. A failed fetch still prints whatever
/// the cache fallback produced.
async fn run_once(mut app: App, json: bool) -> Result<()> {
    app.run_cycle(FetchTrigger::Mount).await;

    if let Some(banner) = &app.view.error {
        eprintln!("{}", banner.message);
    }

    if json {
        let out = serde_json::to_string_pretty(&app.view.matches)
            .context("Failed to serialize matches")?;
        println!("{out}");
    } else if app.view.matches.is_empty() {
        println!("No live matches currently");
    } else {
        for m in &app.view.matches {
            println!("{}", ui::match_list::summary_line(m));
        }
    }

    app.unmount();
    Ok(())
}

async fn run_tui(mut app: App, interval: Duration) -> Result<()> {
    // Set up panic hook to restore terminal on crash
    setup_panic_hook();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut refresh_handle = RefreshHandle::spawn(
        RefreshConfig {
            interval,
            enabled: true,
        },
        app.shared_rate_limit(),
    );
    let tx = refresh_handle.sender();

    if let Some(trigger) = app.mount(now_ms()) {
        app.spawn_fetch(trigger, tx.clone());
    }

    let result = event_loop(&mut terminal, &mut app, &mut refresh_handle, &tx);

    app.unmount();
    refresh_handle.shutdown().await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    info!("Exiting");
    result
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    refresh_handle: &mut RefreshHandle,
    tx: &mpsc::Sender<RefreshMessage>,
) -> Result<()> {
    loop {
        while let Some(message) = refresh::try_recv(refresh_handle) {
            app.handle_refresh_message(message, tx);
        }

        // Render UI
        terminal.draw(|f| render_ui(f, app))?;

        // Poll for keyboard events with 100ms timeout
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key);
                }
            }
        }

        if let Some(trigger) = app.take_pending_fetch() {
            app.spawn_fetch(trigger, tx.clone());
        }

        // Check if we should quit
        if app.should_quit {
            return Ok(());
        }
    }
}
