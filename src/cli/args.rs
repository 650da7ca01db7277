use crate::core::entities::EntityKind;
use crate::core::gate::Precondition;
use crate::strategy::BatchConfig;
use crate::types::{PaymentMethod, SortSpec, Trigger};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Query, summarize and simulate deposit dashboard data
#[derive(Parser, Debug)]
#[command(name = "deposit-dashboard")]
#[command(about = "Query, summarize and simulate deposit dashboard data", long_about = None)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Filter and sort one entity export
    Query(QueryArgs),
    /// Count records per value of a field
    Summarize(SummarizeArgs),
    /// Compute the dashboard KPIs over a directory of exports
    Kpi(KpiArgs),
    /// Project compound interest on a deposit
    Project(ProjectArgs),
    /// Drive a deposit/withdrawal simulation with a list of triggers
    Simulate(SimulateArgs),
}

/// Where to read an export from and how
#[derive(Args, Debug)]
pub struct LoadArgs {
    /// Input file: a `.json` list envelope or a CSV export
    #[arg(value_name = "INPUT")]
    pub input_file: PathBuf,

    /// Entity stored in the input file
    #[arg(long, value_name = "ENTITY", help = "users, kyc, products, contracts or clients")]
    pub entity: EntityKind,

    /// Loading strategy
    #[arg(
        long = "strategy",
        value_name = "STRATEGY",
        default_value = "async",
        help = "Loading strategy: 'sync' for synchronous or 'async' for asynchronous"
    )]
    pub strategy: StrategyType,

    /// Number of CSV rows per batch (async mode only)
    #[arg(
        long = "batch-size",
        value_name = "SIZE",
        help = "Number of rows per batch (default: 1000)"
    )]
    pub batch_size: Option<usize>,

    /// Number of runtime worker threads (async mode only)
    #[arg(
        long = "workers",
        value_name = "COUNT",
        help = "Number of worker threads (default: CPU cores)"
    )]
    pub worker_threads: Option<usize>,
}

/// Search and filter options shared by `query` and `summarize`
#[derive(Args, Debug, Default)]
pub struct FilterArgs {
    /// Free-text search over the entity's searchable fields
    #[arg(long, value_name = "TEXT")]
    pub search: Option<String>,

    /// Field filter, repeatable
    #[arg(
        long = "filter",
        value_name = "EXPR",
        help = "field=value, field~text, field>=min, field<=max or field=min..max"
    )]
    pub filters: Vec<String>,
}

#[derive(Args, Debug)]
pub struct QueryArgs {
    #[command(flatten)]
    pub load: LoadArgs,

    #[command(flatten)]
    pub filter: FilterArgs,

    /// Sort key
    #[arg(long, value_name = "FIELD[:asc|desc]")]
    pub sort: Option<SortSpec>,

    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "csv")]
    pub format: OutputFormat,
}

#[derive(Args, Debug)]
pub struct SummarizeArgs {
    #[command(flatten)]
    pub load: LoadArgs,

    #[command(flatten)]
    pub filter: FilterArgs,

    /// Field to group by
    #[arg(long = "by", value_name = "FIELD")]
    pub group_by: String,

    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "csv")]
    pub format: OutputFormat,
}

#[derive(Args, Debug)]
pub struct KpiArgs {
    /// Directory holding `users`, `kyc`, `products`, `contracts`, `clients` exports
    #[arg(value_name = "DIR")]
    pub dir: PathBuf,

    /// Reference day for monthly KPIs (default: today)
    #[arg(long = "as-of", value_name = "YYYY-MM-DD")]
    pub as_of: Option<NaiveDate>,

    /// Maximum number of entity fetches running at once
    #[arg(long = "max-concurrent", value_name = "COUNT")]
    pub max_concurrent: Option<usize>,

    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "csv")]
    pub format: OutputFormat,
}

#[derive(Args, Debug)]
pub struct ProjectArgs {
    /// Amount deposited, e.g. `50000` or `€50.000,00`
    #[arg(long, value_name = "AMOUNT")]
    pub principal: String,

    /// Annual rate, e.g. `9` or `9,00%`
    #[arg(long, value_name = "PERCENT")]
    pub rate: String,

    /// Number of months to project
    #[arg(long, value_name = "MONTHS")]
    pub months: u32,

    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "csv")]
    pub format: OutputFormat,
}

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Payment method
    #[arg(long, value_name = "METHOD", default_value = "bank", help = "bank or crypto")]
    pub method: PaymentMethod,

    /// Precondition that holds, repeatable
    #[arg(long = "grant", value_name = "PRECONDITION", help = "contract, kyc, profile or docs")]
    pub grants: Vec<Precondition>,

    /// KYC status as returned by the status query; only `approved` grants kyc
    #[arg(long = "kyc-status", value_name = "STATUS")]
    pub kyc_status: Option<String>,

    /// Trigger to fire, repeatable, applied in order
    #[arg(long = "trigger", value_name = "TRIGGER")]
    pub triggers: Vec<Trigger>,
}

/// Available loading strategies
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyType {
    Sync,
    Async,
}

/// Available output formats
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Csv,
    Json,
}

impl LoadArgs {
    /// Create a BatchConfig from CLI arguments
    ///
    /// Missing values take the defaults; zero values fall back to the defaults
    /// with a warning.
    pub fn to_batch_config(&self) -> BatchConfig {
        if self.batch_size.is_some() || self.worker_threads.is_some() {
            let default = BatchConfig::default();
            BatchConfig::new(
                self.batch_size.unwrap_or(default.batch_size),
                self.worker_threads.unwrap_or(default.worker_threads),
            )
        } else {
            BatchConfig::default()
        }
    }
}
