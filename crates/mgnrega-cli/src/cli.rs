use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// MGNREGA - district employment statistics from data.gov.in
#[derive(Parser, Debug)]
#[command(name = "mgnrega")]
#[command(about = "Ingest and aggregate MGNREGA district statistics", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Storage backend to use (memory or postgres)
    #[arg(long, global = true, default_value = "memory")]
    pub storage: StorageBackend,

    /// TOML configuration file (defaults to ./mgnrega.toml when present)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Storage backend selection
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum StorageBackend {
    /// In-memory storage (nothing survives the process)
    Memory,
    /// PostgreSQL persistent storage, configured by DATABASE_URL
    Postgres,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch upstream records and upsert them into storage
    Etl(EtlArgs),

    /// Summarize what is stored
    Check,

    /// Show the figures of one district
    District(DistrictArgs),

    /// Show state totals and the top districts of the latest period
    State(StateArgs),

    /// Find the district nearest to a point
    Nearest(NearestArgs),

    /// Attach coordinates to districts
    Coordinates(CoordinatesArgs),

    /// Ask the upstream how many records it holds
    Probe(ProbeArgs),

    /// Show resolved configuration values and their sources
    Config,

    /// Manage database operations
    Db(DbArgs),
}

#[derive(Parser, Debug)]
pub struct EtlArgs {
    /// State code such as MP (defaults to the configured state)
    #[arg(long)]
    pub state_code: Option<String>,

    /// Financial year such as 2023-24
    #[arg(long)]
    pub financial_year: Option<String>,

    /// Month number
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=12))]
    pub month: Option<u8>,

    /// Skip the run if another holder has the ingestion lease
    #[arg(long)]
    pub exclusive: bool,

    /// Records per upstream page
    #[arg(long)]
    pub page_limit: Option<usize>,

    /// Upstream request timeout in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Delay between pages in milliseconds
    #[arg(long)]
    pub page_backoff_ms: Option<u64>,
}

#[derive(Parser, Debug)]
pub struct DistrictArgs {
    /// District code
    pub code: String,

    /// Restrict to one financial year
    #[arg(long)]
    pub financial_year: Option<String>,

    /// Number of recent periods to list
    #[arg(long, default_value = "12")]
    pub months: usize,
}

#[derive(Parser, Debug)]
pub struct StateArgs {
    /// State code (defaults to the configured state)
    #[arg(long)]
    pub state_code: Option<String>,

    /// Restrict to one financial year
    #[arg(long)]
    pub financial_year: Option<String>,

    /// Number of districts to rank
    #[arg(long, default_value = "10")]
    pub top: usize,
}

#[derive(Parser, Debug)]
pub struct NearestArgs {
    #[arg(long, allow_hyphen_values = true)]
    pub lat: f64,

    #[arg(long, allow_hyphen_values = true)]
    pub lng: f64,
}

#[derive(Parser, Debug)]
pub struct CoordinatesArgs {
    /// JSON file mapping district names to {"lat": .., "lng": ..}
    #[arg(long, conflicts_with = "code")]
    pub file: Option<PathBuf>,

    /// Single district code to update
    #[arg(long, requires_all = ["lat", "lng"])]
    pub code: Option<String>,

    #[arg(long, allow_hyphen_values = true)]
    pub lat: Option<f64>,

    #[arg(long, allow_hyphen_values = true)]
    pub lng: Option<f64>,
}

#[derive(Parser, Debug)]
pub struct ProbeArgs {
    /// State code to probe (omit for every state)
    #[arg(long)]
    pub state_code: Option<String>,
}

#[derive(Parser, Debug)]
pub struct DbArgs {
    /// Database management command
    #[command(subcommand)]
    pub command: DbCommand,
}

#[derive(Subcommand, Debug)]
pub enum DbCommand {
    /// Show applied and pending migrations
    Status,

    /// Apply pending migrations
    Migrate,
}
