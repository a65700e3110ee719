//! The `transform` command: apply saved parameters to new records

use anyhow::{Context, Result};

use crate::pipeline::{save_prepared, FittedParameters, Pipeline, TracingLogger};
use crate::utils::{
    create_spinner, finish_with_success, print_banner, print_completion, print_config,
    print_info,
};

use super::args::TransformArgs;
use super::prompts::confirm_overwrite;

pub fn run_transform(args: &TransformArgs) -> Result<()> {
    let output_path = args.output_path();
    if !args.no_confirm && !confirm_overwrite(&[output_path.as_path()])? {
        println!("Cancelled by user.");
        return Ok(());
    }

    let params = FittedParameters::load_json(&args.params)
        .with_context(|| format!("Failed to read parameters: {}", args.params.display()))?;

    print_banner(env!("CARGO_PKG_VERSION"));
    print_config(&args.input, &params.config.target_column, &output_path);
    print_info(&format!(
        "Parameters fitted {} ({} features)",
        params.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
        params.feature_columns.len()
    ));

    let logger = TracingLogger::new();
    let pipeline = Pipeline::new(params.config.clone(), &logger)?;

    let spinner = create_spinner("Transforming...");
    let table = pipeline
        .load(&args.input)
        .with_context(|| format!("Failed to load {}", args.input.display()))?;
    let prepared = pipeline.transform(table, &params)?;
    save_prepared(&prepared, &output_path)
        .with_context(|| format!("Failed to write output file: {}", output_path.display()))?;
    finish_with_success(&spinner, &format!("Saved to {}", output_path.display()));

    prepared.summary.display();
    print_completion();
    Ok(())
}
