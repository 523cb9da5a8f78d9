use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use shoeboard::cache::DatasetLoader;
use shoeboard::colors::DefaultTheme;
use shoeboard::config::{Config, QueryOverrides, QueryParams};
use shoeboard::output::{self, OutputFormat};
use shoeboard::pipeline::Engine;

const DEFAULT_DATA_FILE: &str = "marathon_shoe_data.json";

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(
    name = "shoeboard",
    about = "Marathon shoe brand market-share analysis",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    query: QueryArgs,

    /// Dataset JSON file. Defaults to `[data] path` from the config, then
    /// `marathon_shoe_data.json`.
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// Config file (default: ./shoeboard.toml when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format: pretty, text, or json.
    #[arg(long, default_value = "pretty", global = true)]
    format: String,

    /// Log debug output to stderr.
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Clone, Copy)]
enum Command {
    /// Every view at once (the default).
    Report,
    /// Top brands in the last year of the range.
    Leaderboard,
    /// Share series and first-vs-last summary for selected brands.
    Trends,
    /// Rank history of the focus brand.
    Rank,
    /// Domestic vs international totals per year.
    Composition,
    /// List the events, years and brands in the dataset.
    Events,
}

#[derive(Args)]
struct QueryArgs {
    /// Comma-separated events to include (default: all).
    #[arg(long, value_delimiter = ',', global = true)]
    events: Option<Vec<String>>,

    /// First year of the range (clamped to 2021).
    #[arg(long, global = true)]
    from: Option<i32>,

    /// Last year of the range (clamped to 2025).
    #[arg(long, global = true)]
    to: Option<i32>,

    /// Runner cohort: general or elite.
    #[arg(long, global = true)]
    cohort: Option<String>,

    /// Keep events separate instead of averaging across them.
    #[arg(long, global = true, conflicts_with = "aggregate")]
    per_event: bool,

    /// Average across events, even when the config file sets
    /// `aggregate_events = false`.
    #[arg(long, global = true)]
    aggregate: bool,

    /// Comma-separated brands to chart in `trends`.
    #[arg(long, value_delimiter = ',', global = true)]
    brands: Option<Vec<String>>,

    /// Brand shown by `rank`.
    #[arg(long, global = true)]
    focus: Option<String>,

    /// Leaderboard length.
    #[arg(long, global = true)]
    top: Option<usize>,
}

impl QueryArgs {
    fn aggregate_events(&self) -> Option<bool> {
        match (self.aggregate, self.per_event) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }

    fn overrides(&self) -> QueryOverrides {
        let non_empty = |list: &Vec<String>| -> Vec<String> {
            list.iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        };
        QueryOverrides {
            events: self.events.as_ref().map(non_empty),
            min_year: self.from,
            max_year: self.to,
            cohort: self.cohort.clone(),
            aggregate_events: self.aggregate_events(),
            selected_brands: self.brands.as_ref().map(non_empty),
            focus_brand: self.focus.clone(),
            top_n: self.top,
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn parse_format(s: &str) -> Result<OutputFormat> {
    match s {
        "pretty" => Ok(OutputFormat::Pretty),
        "text" => Ok(OutputFormat::Text),
        "json" => Ok(OutputFormat::Json),
        other => anyhow::bail!("unknown format: {other} (expected pretty, text, or json)"),
    }
}

fn load_config(explicit: Option<&Path>) -> Result<Option<Config>> {
    match explicit {
        Some(path) => Config::load(path)
            .map(Some)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => {
            let cwd = std::env::current_dir()?;
            Ok(Config::discover(&cwd)?)
        }
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let fmt = parse_format(&cli.format)?;
    let config = load_config(cli.config.as_deref())?;

    let data_path = cli
        .data
        .clone()
        .or_else(|| config.as_ref().and_then(|c| c.data.path.clone()))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_FILE));

    let base = match &config {
        Some(c) => c.query_params().context("invalid [query] table in config")?,
        None => QueryParams::default(),
    };
    let params = cli.query.overrides().apply(base)?;
    debug!(?params, data = %data_path.display(), "resolved query");

    let snapshot = DatasetLoader::from_path(&data_path)
        .load()
        .with_context(|| format!("failed to load dataset {}", data_path.display()))?;
    let engine = Engine::from_snapshot(&snapshot);
    let theme = DefaultTheme;

    let rendered = match cli.command.unwrap_or(Command::Report) {
        Command::Report => {
            let dashboard = engine.run(&params);
            match fmt {
                OutputFormat::Json => output::format_json(&dashboard),
                OutputFormat::Text => output::format_text(&dashboard),
                OutputFormat::Pretty => output::format_pretty(&dashboard, &theme),
            }
        }
        Command::Leaderboard => {
            let lb = engine.leaderboard(&params);
            match fmt {
                OutputFormat::Json => output::format_json(&lb),
                OutputFormat::Text => output::leaderboard_text(&lb),
                OutputFormat::Pretty => output::leaderboard_pretty(&lb, &theme),
            }
        }
        Command::Trends => {
            let trends = engine.trends(&params);
            match fmt {
                OutputFormat::Json => output::format_json(&trends),
                OutputFormat::Text => output::trends_text(&trends),
                OutputFormat::Pretty => output::trends_pretty(&trends),
            }
        }
        Command::Rank => {
            let focus = engine.focus(&params);
            match fmt {
                OutputFormat::Json => output::format_json(&focus),
                OutputFormat::Text => output::focus_text(&focus),
                OutputFormat::Pretty => output::focus_pretty(&focus),
            }
        }
        Command::Composition => {
            let comp = engine.composition(&params);
            match fmt {
                OutputFormat::Json => output::format_json(&comp),
                OutputFormat::Text => output::composition_text(&comp),
                OutputFormat::Pretty => output::composition_pretty(&comp, &theme),
            }
        }
        Command::Events => {
            let catalog = engine.catalog(snapshot.fingerprint_hex());
            match fmt {
                OutputFormat::Json => output::format_json(&catalog),
                OutputFormat::Text | OutputFormat::Pretty => output::catalog_text(&catalog),
            }
        }
    };

    println!("{rendered}");
    Ok(())
}
