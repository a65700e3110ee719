//! CLI module - argument parsing, interactive prompts and command runners

mod args;
pub mod inspect;
pub mod prepare;
mod prompts;
pub mod transform;

use std::path::Path;

use anyhow::{Context, Result};

use crate::pipeline::PrepConfig;

pub use args::{derived_path, with_suffix, Cli, Commands, PrepareArgs, TransformArgs};
pub use prompts::*;

/// Run the parsed command
pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Prepare(args) => prepare::run_prepare(&args),
        Commands::Transform(args) => transform::run_transform(&args),
        Commands::Inspect {
            input,
            config,
            target,
        } => {
            let config = load_config(config.as_deref(), target.as_deref())?;
            inspect::run_inspect(&input, config)
        }
    }
}

/// Configuration from a JSON file (Telco defaults otherwise), with the target overridden
pub fn load_config(path: Option<&Path>, target: Option<&str>) -> Result<PrepConfig> {
    let mut config = match path {
        Some(path) => PrepConfig::from_json_file(path)
            .with_context(|| format!("Failed to load configuration: {}", path.display()))?,
        None => PrepConfig::default(),
    };

    if let Some(target) = target {
        config.retarget(target);
    }
    config.validate()?;
    Ok(config)
}
