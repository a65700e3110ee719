//! Writing prepared data to CSV or Parquet

use std::fs::File;
use std::path::Path;

use polars::prelude::*;

use crate::error::{PrepError, Result};

use super::prepare::PreparedData;

/// Output formats chosen by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Parquet,
}

impl OutputFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match extension.as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "parquet" => Ok(OutputFormat::Parquet),
            _ => Err(PrepError::Parse(format!(
                "Unsupported output format: '{}'. Supported formats: csv, parquet",
                extension
            ))),
        }
    }
}

/// Write features followed by the target column
pub fn save_prepared(prepared: &PreparedData, path: &Path) -> Result<()> {
    let mut df = prepared.to_dataframe()?;
    save_dataframe(&mut df, path)
}

pub fn save_dataframe(df: &mut DataFrame, path: &Path) -> Result<()> {
    let format = OutputFormat::from_path(path)?;
    let file = File::create(path).map_err(|e| PrepError::io(path, e))?;

    match format {
        OutputFormat::Csv => {
            let mut file = file;
            CsvWriter::new(&mut file).finish(df)?;
        }
        OutputFormat::Parquet => {
            ParquetWriter::new(file).finish(df)?;
        }
    }

    Ok(())
}
