//! The `prepare` command: fit the pipeline on one or more datasets

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use console::style;
use rayon::prelude::*;

use crate::pipeline::{
    save_prepared, train_test_split, Pipeline, PrepConfig, TracingLogger,
};
use crate::report::PreparationSummary;
use crate::utils::{
    create_progress_bar, create_spinner, finish_with_success, finish_with_warning, print_banner,
    print_completion, print_config, print_info, print_step_header, print_success,
};

use super::args::PrepareArgs;
use super::load_config;
use super::prompts::confirm_overwrite;

/// Summary of one written output
#[derive(Debug)]
pub struct PreparedOutput {
    pub label: String,
    pub path: PathBuf,
    pub summary: PreparationSummary,
}

pub fn run_prepare(args: &PrepareArgs) -> Result<()> {
    let config = load_config(args.config.as_deref(), args.target.as_deref())?;

    if args.input.len() > 1 && (args.output.is_some() || args.save_params.is_some()) {
        anyhow::bail!("--output and --save-params require a single input file");
    }

    let mut planned: Vec<PathBuf> = args
        .input
        .iter()
        .flat_map(|input| args.output_paths(input))
        .collect();
    planned.extend(args.save_params.iter().cloned());
    let planned_refs: Vec<&Path> = planned.iter().map(PathBuf::as_path).collect();
    if !args.no_confirm && !confirm_overwrite(&planned_refs)? {
        println!("Cancelled by user.");
        return Ok(());
    }

    print_banner(env!("CARGO_PKG_VERSION"));

    if let [input] = args.input.as_slice() {
        run_single(input, args, &config)
    } else {
        run_batch(args, &config)
    }
}

fn run_single(input: &Path, args: &PrepareArgs, config: &PrepConfig) -> Result<()> {
    print_config(input, &config.target_column, &args.output_paths(input)[0]);

    print_step_header(1, "Prepare Dataset");
    let spinner = create_spinner("Loading, cleaning, encoding and scaling...");
    let outputs = prepare_file(input, args, config)?;
    finish_with_success(&spinner, "Dataset prepared");

    print_step_header(2, "Results");
    for output in &outputs {
        print_success(&format!(
            "Saved {} set to {}",
            output.label,
            output.path.display()
        ));
    }
    if let Some(params) = &args.save_params {
        print_success(&format!("Saved fitted parameters to {}", params.display()));
    }

    for output in &outputs {
        if outputs.len() > 1 {
            print_info(&format!("{} set", output.label));
        }
        output.summary.display();
    }

    print_completion();
    Ok(())
}

fn run_batch(args: &PrepareArgs, config: &PrepConfig) -> Result<()> {
    print_step_header(1, "Prepare Datasets");
    let pb = create_progress_bar(args.input.len() as u64, "Preparing");

    let results: Vec<(PathBuf, Result<Vec<PreparedOutput>>)> = args
        .input
        .par_iter()
        .map(|input| {
            let result = prepare_file(input, args, config);
            pb.inc(1);
            (input.clone(), result)
        })
        .collect();

    let failures = results.iter().filter(|(_, r)| r.is_err()).count();
    if failures == 0 {
        finish_with_success(&pb, &format!("{} dataset(s) prepared", results.len()));
    } else {
        finish_with_warning(&pb, &format!("{} of {} dataset(s) failed", failures, results.len()));
    }

    print_step_header(2, "Results");
    for (input, result) in &results {
        match result {
            Ok(outputs) => {
                for output in outputs {
                    print_success(&format!(
                        "{} ({}) -> {}  shape ({}, {})",
                        input.display(),
                        output.label,
                        output.path.display(),
                        output.summary.final_rows,
                        output.summary.final_features
                    ));
                }
            }
            Err(e) => println!(
                "    {} {}: {:#}",
                style("✗").red().bold(),
                input.display(),
                e
            ),
        }
    }

    if failures > 0 {
        anyhow::bail!("{} dataset(s) could not be prepared", failures);
    }

    print_completion();
    Ok(())
}

/// Load, fit and write one input. Each file gets its own logger and parameters.
pub fn prepare_file(
    input: &Path,
    args: &PrepareArgs,
    config: &PrepConfig,
) -> Result<Vec<PreparedOutput>> {
    let dataset = input
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("dataset")
        .to_string();
    let logger = TracingLogger::for_dataset(dataset);
    let pipeline = Pipeline::new(config.clone(), &logger)?;

    let table = pipeline
        .load(input)
        .with_context(|| format!("Failed to load {}", input.display()))?;
    let paths = args.output_paths(input);

    let (prepared, params) = match args.test_size {
        None => {
            let (prepared, params) = pipeline.fit(table)?;
            (vec![("full", prepared)], params)
        }
        Some(test_size) => {
            let (train, test) = train_test_split(&table, test_size, args.seed, &logger)?;
            let (train, params) = pipeline.fit(train)?;
            let test = pipeline.transform(test, &params)?;
            (vec![("train", train), ("test", test)], params)
        }
    };

    if let Some(path) = &args.save_params {
        params
            .save_json(path)
            .with_context(|| format!("Failed to write parameters: {}", path.display()))?;
    }

    let mut outputs = Vec::with_capacity(prepared.len());
    for ((label, data), path) in prepared.into_iter().zip(paths) {
        save_prepared(&data, &path)
            .with_context(|| format!("Failed to write output file: {}", path.display()))?;
        outputs.push(PreparedOutput {
            label: label.to_string(),
            path,
            summary: data.summary,
        });
    }

    Ok(outputs)
}
