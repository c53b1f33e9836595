//! CLI enum types.

use clap::ValueEnum;

/// How placements are written to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// One human-readable line per frame
    #[default]
    Text,
    /// One JSON object per frame
    Json,
}
