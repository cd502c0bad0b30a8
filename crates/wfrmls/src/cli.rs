//! Clap derive structures for the `wfrmls` CLI.
//!
//! Defines the command tree, global flags, and shared value parsers.

use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

use wfrmls_api::DateBound;
use wfrmls_api::resources::ResourceName;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// wfrmls -- query the Wasatch Front MLS RESO API and run the sync agent
#[derive(Debug, Parser)]
#[command(
    name = "wfrmls",
    version,
    about = "Query WFRMLS real-estate data from the command line",
    long_about = "A client for the Wasatch Front Regional MLS RESO OData API.\n\n\
        Lists and fetches records, tracks deletions, computes market\n\
        analytics, and runs a background sync and monitoring agent.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Bearer token (overrides WFRMLS_BEARER_TOKEN and the config file)
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// API root URL
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Output format
    #[arg(long, short = 'o', default_value = "json", global = true)]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List records from a resource
    #[command(alias = "ls")]
    List(ListArgs),

    /// Fetch one record by key
    Get(GetArgs),

    /// Deleted-record feed: sync, summary, monitoring
    #[command(alias = "del")]
    Deleted(DeletedArgs),

    /// Market analytics computed from current listings
    Analytics(AnalyticsArgs),

    /// Print the service metadata document (XML)
    Metadata,

    /// Inspect configuration
    Config(ConfigArgs),

    /// Run the background sync and monitoring agent until interrupted
    Agent,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Resources ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ResourceKind {
    Property,
    Member,
    Office,
    #[value(name = "openhouse", alias = "open-house")]
    OpenHouse,
    Media,
    History,
    GreenVerification,
    DataSystem,
    Resource,
    UnitTypes,
    Lookup,
    Adu,
    Deleted,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    pub resource: ResourceKind,

    /// Maximum records (capped at 200 by the server)
    #[arg(long, default_value_t = 10)]
    pub top: u32,

    #[arg(long)]
    pub skip: Option<u32>,

    /// OData $filter expression
    #[arg(long)]
    pub filter: Option<String>,

    /// Comma-separated fields to return
    #[arg(long)]
    pub select: Option<String>,

    #[arg(long)]
    pub orderby: Option<String>,

    /// Comma-separated navigation properties to expand
    #[arg(long)]
    pub expand: Option<String>,

    /// Include @odata.count
    #[arg(long)]
    pub count: bool,

    /// Follow pages with $skip until a short page
    #[arg(long)]
    pub all: bool,

    /// Stop after this many pages (with --all)
    #[arg(long, requires = "all")]
    pub max_pages: Option<u32>,
}

#[derive(Debug, Args)]
pub struct GetArgs {
    pub resource: ResourceKind,

    /// Entity key, e.g. a ListingKey or MemberKey
    pub key: String,
}

// ── Deleted ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DeletedArgs {
    #[command(subcommand)]
    pub command: DeletedCommand,
}

#[derive(Debug, Subcommand)]
pub enum DeletedCommand {
    /// Deleted records per resource type since a timestamp
    Sync {
        /// RFC 3339 timestamp or YYYY-MM-DD
        #[arg(long, value_parser = parse_since)]
        since: DateBound,

        /// Resource types to check (repeatable); defaults to the common five
        #[arg(long = "resource")]
        resources: Vec<ResourceName>,

        /// Page size per resource type
        #[arg(long, default_value_t = 200)]
        top: u32,
    },

    /// Per-resource deletion counts
    Summary {
        /// RFC 3339 timestamp or YYYY-MM-DD (default: 24 hours ago)
        #[arg(long, value_parser = parse_since)]
        since: Option<DateBound>,
    },

    /// Flag unusual deletion volume
    Monitor {
        #[arg(long, default_value_t = 24)]
        hours: u32,

        #[arg(long, default_value_t = 100)]
        threshold: usize,
    },
}

// ── Analytics ────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct AnalyticsArgs {
    #[command(subcommand)]
    pub command: AnalyticsCommand,
}

#[derive(Debug, Subcommand)]
pub enum AnalyticsCommand {
    /// Inventory, pricing and activity summary
    Market {
        #[arg(long)]
        city: Option<String>,

        #[arg(long, default_value_t = 30)]
        days: u32,

        #[arg(long)]
        property_type: Option<String>,
    },

    /// Price distribution and segments
    Trends {
        #[arg(long)]
        city: Option<String>,

        #[arg(long, default_value_t = 90)]
        days: u32,

        #[arg(long)]
        property_type: Option<String>,

        #[arg(long, default_value_t = 5)]
        segments: usize,
    },

    /// Top agents by listings and value
    Agents {
        #[arg(long, default_value_t = 90)]
        days: u32,

        #[arg(long, default_value_t = 5)]
        min_listings: usize,
    },

    /// Completeness of sampled property and member records
    Quality,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration (token redacted)
    Show,

    /// Print the config file path
    Path,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    pub shell: Shell,
}

// ── Value parsers ────────────────────────────────────────────────────

/// Accept an RFC 3339 timestamp or a plain `YYYY-MM-DD` date.
pub fn parse_since(raw: &str) -> Result<DateBound, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(DateBound::DateTime(dt.with_timezone(&Utc)));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(DateBound::Date)
        .map_err(|_| format!("expected RFC 3339 timestamp or YYYY-MM-DD, got '{raw}'"))
}
