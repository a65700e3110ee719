//! Command-line argument definitions using clap

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::pipeline::DEFAULT_SEED;

/// tabprep - Turn raw customer tables into numeric feature matrices
#[derive(Parser, Debug)]
#[command(name = "tabprep")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Clean, encode and scale one or more datasets
    Prepare(PrepareArgs),

    /// Apply parameters saved by `prepare --save-params` to new records
    Transform(TransformArgs),

    /// Print every column with its inferred kind and missing count
    Inspect {
        /// Input file path (CSV or Parquet)
        #[arg(short, long)]
        input: PathBuf,

        /// JSON configuration file. Fields it leaves out, or every field when it
        /// is omitted, take the Telco churn layout, including its binary columns.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Target column name. Replaces the configured target along with its
        /// binary mapping and one-hot exclusion.
        #[arg(short, long)]
        target: Option<String>,
    },
}

#[derive(Args, Debug)]
pub struct PrepareArgs {
    /// Input file path(s) (CSV or Parquet). Several files are prepared in parallel.
    #[arg(short, long, required = true, num_args = 1..)]
    pub input: Vec<PathBuf>,

    /// Output file path (CSV or Parquet, determined by extension).
    /// Defaults to the input directory with a '_prepared' suffix (e.g., data.csv -> data_prepared.csv).
    /// Only valid with a single input.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// JSON configuration file. Fields it leaves out, or every field when it
    /// is omitted, take the Telco churn layout, including its binary columns.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Target column name. Replaces the configured target along with its
    /// binary mapping and one-hot exclusion.
    #[arg(short, long)]
    pub target: Option<String>,

    /// Write the fitted parameters to this JSON file. Only valid with a single input.
    #[arg(long)]
    pub save_params: Option<PathBuf>,

    /// Hold out this fraction of rows as a test set (0.0 to 1.0, exclusive).
    /// Parameters are fitted on the train rows only.
    #[arg(long, value_parser = validate_test_size)]
    pub test_size: Option<f64>,

    /// Seed for the train/test split
    #[arg(long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// Skip interactive confirmation prompts
    #[arg(long, default_value = "false")]
    pub no_confirm: bool,
}

#[derive(Args, Debug)]
pub struct TransformArgs {
    /// Input file path (CSV or Parquet)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Fitted parameters JSON written by `prepare --save-params`
    #[arg(short, long)]
    pub params: PathBuf,

    /// Output file path. Defaults to a '_transformed' suffix next to the input.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Skip interactive confirmation prompts
    #[arg(long, default_value = "false")]
    pub no_confirm: bool,
}

impl PrepareArgs {
    /// Output path for one input: explicit `--output` or derived with '_prepared'
    pub fn output_path(&self, input: &Path) -> PathBuf {
        match &self.output {
            Some(output) => output.clone(),
            None => derived_path(input, "prepared"),
        }
    }

    /// Every file `prepare` writes for one input, in (train, test) order when splitting
    pub fn output_paths(&self, input: &Path) -> Vec<PathBuf> {
        if self.test_size.is_none() {
            return vec![self.output_path(input)];
        }
        ["train", "test"]
            .iter()
            .map(|part| match &self.output {
                Some(output) => with_suffix(output, part),
                None => derived_path(input, part),
            })
            .collect()
    }
}

impl TransformArgs {
    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| derived_path(&self.input, "transformed"))
    }
}

/// `<dir>/<stem>_<suffix>.<ext>`, keeping the input's extension (CSV when absent)
pub fn derived_path(input: &Path, suffix: &str) -> PathBuf {
    let parent = input.parent().unwrap_or_else(|| Path::new("."));
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    let extension = match input.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("parquet") => "parquet",
        _ => "csv",
    };
    parent.join(format!("{}_{}.{}", stem, suffix, extension))
}

/// Insert `_<suffix>` before the extension of an output path
pub fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("output");
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => parent.join(format!("{}_{}.{}", stem, suffix, ext)),
        None => parent.join(format!("{}_{}", stem, suffix)),
    }
}

/// Validator for test_size parameter
fn validate_test_size(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;

    if value > 0.0 && value < 1.0 {
        Ok(value)
    } else {
        Err(format!(
            "test_size must be between 0.0 and 1.0 (exclusive), got {}",
            value
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_path_keeps_directory_and_extension() {
        assert_eq!(
            derived_path(Path::new("/data/telco.csv"), "prepared"),
            PathBuf::from("/data/telco_prepared.csv")
        );
        assert_eq!(
            derived_path(Path::new("/data/telco.parquet"), "prepared"),
            PathBuf::from("/data/telco_prepared.parquet")
        );
        assert_eq!(
            derived_path(Path::new("/data/telco.txt"), "transformed"),
            PathBuf::from("/data/telco_transformed.csv")
        );
    }

    #[test]
    fn test_split_outputs_are_train_and_test() {
        let args = PrepareArgs {
            input: vec![PathBuf::from("data/telco.csv")],
            output: None,
            config: None,
            target: None,
            save_params: None,
            test_size: Some(0.2),
            seed: DEFAULT_SEED,
            no_confirm: true,
        };
        assert_eq!(
            args.output_paths(Path::new("data/telco.csv")),
            vec![
                PathBuf::from("data/telco_train.csv"),
                PathBuf::from("data/telco_test.csv")
            ]
        );
    }

    #[test]
    fn test_with_suffix() {
        assert_eq!(
            with_suffix(Path::new("out/prepared.parquet"), "train"),
            PathBuf::from("out/prepared_train.parquet")
        );
    }

    #[test]
    fn test_validate_test_size() {
        assert_eq!(validate_test_size("0.2"), Ok(0.2));
        assert!(validate_test_size("0").is_err());
        assert!(validate_test_size("1.5").is_err());
        assert!(validate_test_size("abc").is_err());
    }
}
