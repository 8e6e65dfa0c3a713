use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use portfolio_dashboard::list::{self, ApplyOutcome, ListController, ListState};
use portfolio_dashboard::model::{Record, SortMode, StackCatalog, Table};
use portfolio_dashboard::query::{self, postgrest, ListMode, QueryDescription};
use portfolio_dashboard::scrollspy;
use portfolio_dashboard::store::FileStore;

/// Portfolio Query: run one list query against a data directory and print JSON.
#[derive(Parser, Debug)]
#[command(name = "portfolio-query", version, about)]
struct Cli {
    /// Directory holding the table files
    #[arg(long, default_value = "./data")]
    data_dir: PathBuf,

    /// Print the PostgREST request instead of running it
    #[arg(long, global = true)]
    explain: bool,

    /// Delay every store call (milliseconds)
    #[arg(long, default_value_t = 0)]
    latency_ms: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Filtered list of projects or works
    List {
        #[arg(value_enum, default_value_t = TableArg::Works)]
        table: TableArg,
        /// Matches title or description
        #[arg(long, default_value = "")]
        search: String,
        /// Repeat for several categories
        #[arg(long = "category")]
        categories: Vec<String>,
        /// Exact stack token
        #[arg(long)]
        stack: Option<String>,
        /// "recent" or "title"
        #[arg(long, default_value = "recent")]
        sort: String,
        /// 1-based page; paged mode only
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 12)]
        page_size: u32,
        /// Cap instead of paging
        #[arg(long, conflicts_with = "page")]
        limit: Option<usize>,
    },
    /// Visible works grouped by year
    Timeline,
    /// Stack tokens used by works
    Stacks,
}

#[derive(Debug, Clone, Copy)]
enum Kind {
    List,
    Timeline,
    Stacks,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TableArg {
    Projects,
    Works,
}

impl From<TableArg> for Table {
    fn from(t: TableArg) -> Self {
        match t {
            TableArg::Projects => Table::Projects,
            TableArg::Works => Table::Works,
        }
    }
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct RecordSummary {
    id: i64,
    title: String,
    category: String,
    style_key: &'static str,
    year: String,
    impact: String,
    stack: Vec<String>,
}

impl From<&Record> for RecordSummary {
    fn from(r: &Record) -> Self {
        let category = r.category_kind();
        Self {
            id: r.id.get(),
            title: r.title.clone(),
            category: category.as_str().to_string(),
            style_key: category.style_key(),
            year: r.card_year(),
            impact: r.impact_label(),
            stack: r.stack_tokens(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ListResponse {
    request: String,
    page: u32,
    total_pages: u32,
    total_count: u64,
    records: Vec<RecordSummary>,
}

#[derive(Debug, Serialize)]
struct YearResponse {
    id: String,
    year: i32,
    records: Vec<RecordSummary>,
}

#[derive(Debug, Serialize)]
struct Explain {
    table: &'static str,
    params: Vec<(String, String)>,
    prefer: Option<&'static str>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Log to stderr (stdout carries the JSON)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("portfolio_dashboard=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let cli = Cli::parse();

    if !cli.data_dir.is_dir() {
        anyhow::bail!("data directory {} not found", cli.data_dir.display());
    }
    let store =
        FileStore::new(&cli.data_dir).with_latency(Duration::from_millis(cli.latency_ms));

    let kind = match &cli.command {
        Command::List { .. } => Kind::List,
        Command::Timeline => Kind::Timeline,
        Command::Stacks => Kind::Stacks,
    };

    let mut controller = match cli.command {
        Command::List {
            table,
            search,
            categories,
            stack,
            sort,
            page,
            page_size,
            limit,
        } => {
            if page_size == 0 {
                anyhow::bail!("--page-size must be at least 1");
            }
            let mode = match limit {
                Some(limit) => ListMode::Preview { limit },
                None => ListMode::Paged { page_size },
            };
            let mut controller = ListController::new(table.into(), mode);
            controller.set_search(search);
            controller.set_categories(categories.into_iter().collect());
            controller.set_stack_token(stack.as_deref());
            controller.set_sort(SortMode::from_str_loose(&sort));
            // filter edits reset the page, so the requested one goes last
            controller.with_initial_page(page)
        }
        Command::Timeline => ListController::fixed(query::timeline_query(None)),
        Command::Stacks => ListController::fixed(query::stack_catalog_query()),
    };

    let ticket = controller.request();
    if cli.explain {
        print_json(&explain(&ticket.query))?;
        if let Some(count) = &ticket.count_query {
            print_json(&explain(count))?;
        }
        return Ok(());
    }

    let mut ticket = ticket;
    loop {
        let result = list::execute(&store, &ticket).await;
        if let Err(e) = &result {
            anyhow::bail!("query failed: {e}");
        }
        match controller.complete(ticket.seq, result) {
            // page past the end: fetch the last page instead
            ApplyOutcome::Reclamped { .. } => ticket = controller.request(),
            _ => break,
        }
    }
    if controller.state() != ListState::Ready {
        anyhow::bail!("query did not complete");
    }

    match kind {
        Kind::Stacks => {
            let catalog = StackCatalog::from_records(controller.records());
            let labels: Vec<String> = catalog.tokens().map(StackCatalog::label).collect();
            print_json(&labels)?;
        }
        Kind::Timeline => {
            let years: Vec<YearResponse> = scrollspy::group_by_year(controller.records())
                .into_iter()
                .map(|g| YearResponse {
                    id: g.id(),
                    year: g.year,
                    records: g.records.iter().map(RecordSummary::from).collect(),
                })
                .collect();
            print_json(&years)?;
        }
        Kind::List => {
            let pagination = controller.pagination();
            print_json(&ListResponse {
                request: postgrest::describe(&ticket.query),
                page: pagination.page,
                total_pages: pagination.total_pages(),
                total_count: controller.total_count(),
                records: controller.records().iter().map(RecordSummary::from).collect(),
            })?;
        }
    }

    Ok(())
}

fn explain(query: &QueryDescription) -> Explain {
    Explain {
        table: query.table.name(),
        params: postgrest::to_postgrest(query),
        prefer: postgrest::prefer_header(query),
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
