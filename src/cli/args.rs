//! CLI argument definitions using clap derive
//!
//! Defines all command-line arguments and subcommands.

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

/// GPU memory usage monitor
///
/// Sample accelerator memory in the background and report free-memory
/// minimum, active/reserved peaks and totals.
#[derive(Parser, Debug)]
#[command(name = "memmon")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "MEMMON_CONFIG")]
    pub config: Option<String>,

    /// Device to monitor (cuda, cuda:N, drm:N)
    #[arg(short, long, global = true)]
    pub device: Option<String>,

    /// Samples per second (0 or less disables sampling)
    #[arg(short, long, global = true, allow_negative_numbers = true)]
    pub poll_rate: Option<f64>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one sampling window and print its statistics
    Sample(SampleArgs),

    /// Print current memory statistics without sampling
    Read,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Arguments for the sample command
#[derive(Parser, Debug)]
pub struct SampleArgs {
    /// Window length in seconds
    #[arg(short = 't', long)]
    pub duration: Option<f64>,

    /// Also print recorded data and raw backend counters in MiB
    #[arg(long)]
    pub debug: bool,
}

/// Output format
#[derive(ValueEnum, Debug, Clone, Copy, Default)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format for machine parsing
    Json,
    /// Compact single-line format
    Compact,
}

/// Generate shell completions and print to stdout
pub fn generate_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
}
