use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use declarative::Platform;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sous")]
#[command(version)]
#[command(about = "Converge this host onto a declared run list", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file (defaults to config.toml in the sous config directory)
    #[arg(long, global = true, env = "SOUS_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Converge every resource in a run list
    Apply(ApplyArgs),

    /// Show what apply would change (dry run)
    Diff(RunArgs),

    /// Check a run list without probing anything
    Validate(RunArgs),

    /// List resource types, their properties and actions
    Resources(ResourcesArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// Run Arguments
// ============================================================================

#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Run list (TOML file of [[resource]] tables)
    pub run_list: PathBuf,

    /// Number of resources converged concurrently
    #[arg(short, long, value_parser = clap::value_parser!(u16).range(1..))]
    pub jobs: Option<u16>,

    /// Skip remaining resources after the first failure
    #[arg(long)]
    pub stop_on_failure: bool,

    /// Seconds before a package manager call is killed
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Select providers for this platform instead of detecting it
    #[arg(long, value_enum)]
    pub platform: Option<PlatformArg>,

    /// Print the run report as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct ApplyArgs {
    #[command(flatten)]
    pub run: RunArgs,

    /// Dry run - show what would change without changing it
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PlatformArg {
    Arch,
    Solaris,
    Linux,
    Macos,
    Windows,
}

impl From<PlatformArg> for Platform {
    fn from(arg: PlatformArg) -> Self {
        match arg {
            PlatformArg::Arch => Platform::Arch,
            PlatformArg::Solaris => Platform::Solaris,
            PlatformArg::Linux => Platform::Linux,
            PlatformArg::Macos => Platform::Macos,
            PlatformArg::Windows => Platform::Windows,
        }
    }
}

// ============================================================================
// Resources
// ============================================================================

#[derive(Parser, Debug, Clone)]
pub struct ResourcesArgs {
    /// Show properties of a single resource type
    pub resource_type: Option<String>,
}
