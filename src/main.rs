//! tabprep: tabular data preparation CLI
//!
//! Turns raw customer record tables into numeric feature matrices and target
//! vectors ready for a classifier.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use tabprep::cli::{self, Cli};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    cli::run(cli)
}
