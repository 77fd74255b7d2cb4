//! autorcc command-line driver.
//!
//! Invoked by the build system once per `.qrc` file (and configuration):
//! `autorcc [-q|-v] <INFO_FILE> [CONFIG]`.

mod cli;

use anyhow::{Context, Result};
use autorcc::{BuildDecision, RccInfo, verbose};
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    verbose::init(cli.quiet, cli.verbose);

    let info = RccInfo::load(&cli.info_file, cli.config.as_deref())
        .with_context(|| format!("failed to load {}", cli.info_file.display()))?;

    let env_verbose = std::env::var_os("VERBOSE").is_some_and(|v| !v.is_empty());
    if info.verbosity > 0 || env_verbose {
        verbose::raise_to_verbose();
    }

    let decision = autorcc::run(&info)
        .with_context(|| format!("AutoRcc: {} failed", info.source.display()))?;

    if verbose::is_verbose() && decision == BuildDecision::UpToDate {
        println!("{} is up to date", info.output_path().display());
    }
    Ok(())
}
