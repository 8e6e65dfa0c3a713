mod app;
mod event;
mod theme;

use std::io::stdout;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen};
use tracing::info;

use portfolio_dashboard::config::{Config, Overrides};
use portfolio_dashboard::model::Table;
use portfolio_dashboard::nav::Location;
use portfolio_dashboard::store::FileStore;

/// Portfolio Dashboard: browse projects, works and work history in the terminal.
#[derive(Parser, Debug)]
#[command(name = "portfolio-dashboard", version, about)]
struct Cli {
    /// Directory holding portfolio_projects / portfolio_works table files
    #[arg(long, default_value = "./data")]
    data_dir: PathBuf,

    /// YAML settings file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Start location, e.g. "/works?page=2" or "/history#year-2022"
    #[arg(long, default_value = "/")]
    at: String,

    /// Delay every store call (milliseconds)
    #[arg(long)]
    latency_ms: Option<u64>,

    /// Disable file watching (static mode)
    #[arg(long)]
    no_watch: bool,

    /// Rows per page on the full lists
    #[arg(long)]
    page_size: Option<u32>,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    // Validate data directory
    let store = FileStore::new(&cli.data_dir);
    if store.table_path(Table::Works).is_none() && store.table_path(Table::Projects).is_none() {
        eprintln!(
            "Error: no portfolio tables found in {}",
            cli.data_dir.display()
        );
        std::process::exit(1);
    }

    let config = Config::load(cli.config.as_deref())?.apply(&Overrides {
        page_size: cli.page_size,
        latency_ms: cli.latency_ms,
        no_watch: cli.no_watch,
    })?;

    // Set up logging to file (we own the terminal)
    let log_dir = std::env::var("PORTFOLIO_DASHBOARD_LOG_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| std::env::temp_dir().join("portfolio-dashboard"));
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, "dashboard.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("portfolio_dashboard=info".parse()?),
        )
        .init();

    info!(data_dir = %cli.data_dir.display(), ?config, "starting");

    let store = store.with_latency(Duration::from_millis(config.latency_ms));
    let start = Location::parse(&cli.at);

    // Install panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = execute!(stdout(), LeaveAlternateScreen, DisableMouseCapture);
        ratatui::restore();
        original_hook(panic_info);
    }));

    // Set up terminal with mouse capture enabled
    execute!(stdout(), EnterAlternateScreen, EnableMouseCapture)?;
    let mut terminal = ratatui::init();

    // Run the app
    let mut app = app::App::new(Arc::new(store), cli.data_dir, config, start);
    let result = app.run(&mut terminal).await;

    // Restore terminal (mouse capture off first)
    execute!(stdout(), LeaveAlternateScreen, DisableMouseCapture)?;
    ratatui::restore();

    result
}
