//! Clap derive structures for the `dxwatch` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// dxwatch -- monitor a camera appliance from the command line
#[derive(Debug, Parser)]
#[command(
    name = "dxwatch",
    version,
    about = "Monitor camera appliances from the command line",
    long_about = "Inspect device identity, status, and licensing, follow live\n\
        host telemetry, and query or export the recorded event log.",
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
    /// Backend profile to use
    #[arg(long, short = 'p', env = "DXWATCH_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Backend URL (overrides profile)
    #[arg(long, short = 's', env = "DXWATCH_SERVER", global = true)]
    pub server: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "DXWATCH_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "DXWATCH_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in milliseconds (overrides profile)
    #[arg(long, env = "DXWATCH_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Device identity, status, and lifecycle
    #[command(alias = "dx", alias = "d")]
    Device(DeviceArgs),

    /// Inspect and manage the license
    #[command(alias = "lic")]
    License(LicenseArgs),

    /// Host telemetry (CPU, memory, disk)
    #[command(alias = "m")]
    Metrics(MetricsArgs),

    /// Query, summarize, and export events
    #[command(alias = "ev")]
    Events(EventsArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Device ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DeviceArgs {
    #[command(subcommand)]
    pub command: DeviceCommand,
}

#[derive(Debug, Subcommand)]
pub enum DeviceCommand {
    /// Show device identity and configuration
    Show,

    /// Show runtime status
    Status,

    /// Update device settings
    Update {
        /// New display name
        #[arg(long)]
        name: Option<String>,

        /// Physical location label
        #[arg(long)]
        location: Option<String>,

        /// IANA timezone (e.g. Europe/Berlin)
        #[arg(long)]
        timezone: Option<String>,
    },

    /// Restart the device
    Restart,
}

// ── License ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct LicenseArgs {
    #[command(subcommand)]
    pub command: LicenseCommand,
}

#[derive(Debug, Subcommand)]
pub enum LicenseCommand {
    /// Show the current license
    Show,

    /// Activate a license key
    Activate {
        /// License key
        key: String,
    },

    /// Deactivate the current license
    Deactivate,
}

// ── Metrics ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct MetricsArgs {
    #[command(subcommand)]
    pub command: MetricsCommand,
}

#[derive(Debug, Subcommand)]
pub enum MetricsCommand {
    /// Show the latest sample
    Show,

    /// Poll continuously, printing each sample
    Watch {
        /// Polling interval in milliseconds (overrides profile)
        #[arg(long, short = 'i')]
        interval: Option<u64>,

        /// Stop after this many samples
        #[arg(long, short = 'n')]
        count: Option<usize>,
    },

    /// Show stored samples for a time range
    History {
        #[command(flatten)]
        range: TimeArgs,
    },
}

// ── Events ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct EventsArgs {
    #[command(subcommand)]
    pub command: EventsCommand,
}

#[derive(Debug, Subcommand)]
pub enum EventsCommand {
    /// List one page of events
    List {
        #[command(flatten)]
        filter: EventFilterArgs,

        /// Page number (1-based)
        #[arg(long, default_value = "1")]
        page: u32,

        /// Events per page
        #[arg(long, default_value = "25")]
        page_size: u32,
    },

    /// Aggregate counts over the filtered events
    Stats {
        #[command(flatten)]
        filter: EventFilterArgs,
    },

    /// Export the filtered events to a file
    Export {
        #[command(flatten)]
        filter: EventFilterArgs,

        /// Export format
        #[arg(long, short = 'f', default_value = "csv")]
        format: ExportFormatArg,

        /// Output file ("-" for stdout; default: events.<format>)
        #[arg(long = "out", short = 'O')]
        out: Option<PathBuf>,
    },
}

/// Time bounds shared by metrics history and event queries.
#[derive(Debug, Clone, Args)]
pub struct TimeArgs {
    /// Only include data after this point (RFC 3339, e.g. 2024-05-01T00:00:00Z)
    #[arg(long, conflicts_with = "since")]
    pub start: Option<String>,

    /// Only include data before this point (RFC 3339)
    #[arg(long)]
    pub end: Option<String>,

    /// Relative start, e.g. "1h", "30m", "2days"
    #[arg(long)]
    pub since: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct EventFilterArgs {
    #[command(flatten)]
    pub range: TimeArgs,

    /// Event types (repeatable or comma-separated)
    #[arg(long = "type", short = 't', value_delimiter = ',')]
    pub types: Vec<String>,

    /// Stream names (repeatable or comma-separated)
    #[arg(long = "stream", value_delimiter = ',')]
    pub streams: Vec<String>,

    /// Application names (repeatable or comma-separated)
    #[arg(long = "app", value_delimiter = ',')]
    pub apps: Vec<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ExportFormatArg {
    Csv,
    Xlsx,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current resolved configuration
    Show,

    /// Print the config file location
    Path,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
