//! CLI argument parsing with clap.

use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

use super::enums::OutputFormat;

/// Eyewear overlay that follows the eyes in a live pose stream
#[derive(Parser, Debug)]
#[command(name = "eyewear-overlay")]
#[command(version, about = "Eyewear AR overlay driven by pose keypoints", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Config file path
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replay a recorded pose stream through the overlay loop
    Run(RunArgs),
    /// List the selectable overlays
    Assets,
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(ClapArgs, Debug)]
pub struct RunArgs {
    /// JSON-lines file with one pose estimate per line
    pub poses: PathBuf,

    /// Restart from the first pose instead of stopping at the end
    #[arg(long = "loop")]
    pub looping: bool,

    /// Simulated inference latency per frame, in milliseconds
    #[arg(long, value_name = "MS")]
    pub latency_ms: Option<u64>,

    /// Display tick period, in milliseconds
    #[arg(long, value_name = "MS")]
    pub interval_ms: Option<u64>,

    /// Overlay selected at startup
    #[arg(long, short)]
    pub asset: Option<String>,

    /// Output format
    #[arg(long, short, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Emit debug keypoint markers
    #[arg(long)]
    pub markers: bool,

    /// Mirror keypoints horizontally
    #[arg(long)]
    pub flip: bool,

    /// Don't read selection commands from stdin
    #[arg(long)]
    pub no_input: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Show current configuration
    Show,
    /// Create default config file
    Init,
}
