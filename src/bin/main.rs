use anyhow::Context;
use chrono::NaiveDate;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use sales_dashboard::{ChartBoard, Chart, ChartTarget, Dashboard, DashboardState, RecordStore, RowPolicy, Selection, SpecBackend, DEFAULT_SOURCE};

#[derive(Clone, Copy, Debug, clap::ArgEnum)]
enum Output {
    /// The full dashboard together with its charts
    Json,
    /// The rows of the sales table
    Csv,
}

/// A cli dashboard for real-estate sales
#[derive(Debug, Parser)]
#[clap(version)]
struct Args {
    /// The URL or path of the JSON dataset
    #[clap(env = "SALES_DASHBOARD_SOURCE", default_value = DEFAULT_SOURCE)]
    source: String,
    /// The first day of the date range (YYYY-MM-DD)
    #[clap(long, default_value = "2016-09-01")]
    start: NaiveDate,
    /// The last day of the date range (YYYY-MM-DD)
    #[clap(long, default_value = "2017-08-31")]
    end: NaiveDate,
    /// Only show sales in this borough, can be repeated
    #[clap(long = "borough")]
    boroughs: Vec<String>,
    /// Only show sales in this zip code, can be repeated
    #[clap(long = "zip")]
    zip_codes: Vec<String>,
    #[clap(long, arg_enum, default_value = "json")]
    output: Output,
    /// Abort if a row has a malformed sale date instead of skipping it
    #[clap(long)]
    strict: bool,
    /// Log more, can be repeated
    #[clap(short, long, parse(from_occurrences))]
    verbose: u8,
}

#[derive(serde::Serialize)]
struct Report<'a> {
    dashboard: &'a Dashboard,
    charts: Vec<(ChartTarget, &'a Chart)>,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(level.into()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let policy = match args.strict {
        true => RowPolicy::Strict,
        false => RowPolicy::Skip,
    };
    let store = RecordStore::load(&args.source, policy)
        .with_context(|| format!("failed to load the dataset from {}", args.source))?;

    let mut selection = Selection::default();
    selection.set_date_range(args.start, args.end);
    selection.set_boroughs(args.boroughs);
    selection.set_zip_codes(args.zip_codes);

    let state = DashboardState::with_selection(store, selection);
    let dashboard = state.dashboard();

    match args.output {
        Output::Json => {
            let mut board = ChartBoard::new(SpecBackend);
            board.render(&dashboard);

            let report = Report {
                dashboard: &dashboard,
                charts: board.handles().collect(),
            };
            serde_json::to_writer_pretty(std::io::stdout().lock(), &report)?;
            println!();
        }
        Output::Csv => {
            let mut writer = csv::WriterBuilder::new()
                .has_headers(true)
                .from_writer(std::io::stdout());

            for row in &dashboard.table {
                writer.serialize(row)?;
            }
            writer.flush()?;
        }
    }

    Ok(())
}
