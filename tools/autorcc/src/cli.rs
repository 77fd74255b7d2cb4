//! Command-line interface definitions for autorcc.

use std::path::PathBuf;

use clap::Parser;

/// Regenerate an rcc output if its inputs or settings changed.
#[derive(Parser)]
#[command(name = "autorcc", version, about)]
pub struct Cli {
    /// Path to the job's info file.
    pub info_file: PathBuf,

    /// Build configuration name; selects `[config.<NAME>]` overrides.
    pub config: Option<String>,

    /// Suppress rcc output; show only errors.
    #[arg(long, short = 'q', conflicts_with = "verbose")]
    pub quiet: bool,

    /// Print rebuild reasons, commands and file updates.
    #[arg(long, short = 'v')]
    pub verbose: bool,
}
