//! Dataset loader for CSV and Parquet files

use std::fs::File;
use std::io::Read;
use std::path::Path;

use polars::prelude::*;

use crate::error::{PrepError, Result};

use super::config::PrepConfig;
use super::logger::{PipelineLogger, Stage};
use super::table::{Column, Table};

/// Load a dataset from a file (CSV or Parquet based on extension) and classify its columns
pub fn load_table(path: &Path, config: &PrepConfig, logger: &dyn PipelineLogger) -> Result<Table> {
    std::fs::metadata(path).map_err(|e| PrepError::io(path, e))?;

    let table = match file_extension(path).as_str() {
        "csv" | "txt" | "tsv" => {
            let file = File::open(path).map_err(|e| PrepError::io(path, e))?;
            read_csv(file, config.delimiter_byte()).map_err(|e| attach_path(e, path))?
        }
        "parquet" => {
            let df = LazyFrame::scan_parquet(path, Default::default())?.collect()?;
            Table::from_dataframe(&df)?
        }
        other => {
            return Err(PrepError::Parse(format!(
                "Unsupported file format: '{}'. Supported formats: csv, parquet",
                other
            )))
        }
    };

    let (rows, cols) = table.shape();
    logger.info(
        Stage::Load,
        &format!("Loaded {} ({} rows, {} columns)", path.display(), rows, cols),
    );

    Ok(table.classify(config))
}

/// Read only the header of a dataset
pub fn column_names(path: &Path, delimiter: u8) -> Result<Vec<String>> {
    std::fs::metadata(path).map_err(|e| PrepError::io(path, e))?;

    match file_extension(path).as_str() {
        "parquet" => {
            let schema = LazyFrame::scan_parquet(path, Default::default())?.collect_schema()?;
            Ok(schema.iter_names().map(|n| n.to_string()).collect())
        }
        _ => {
            let file = File::open(path).map_err(|e| PrepError::io(path, e))?;
            let mut reader = csv::ReaderBuilder::new()
                .delimiter(delimiter)
                .from_reader(file);
            let headers = reader.headers().map_err(|e| csv_error(e, path))?;
            validate_header(headers)
        }
    }
}

/// Parse delimited text with a header row into an unclassified table.
///
/// Empty cells load as missing. A column is numeric when every non-empty
/// cell parses as a finite `f64`, text otherwise; a whitespace-only cell is
/// not empty, so it keeps its column textual.
pub fn read_csv<R: Read>(source: R, delimiter: u8) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(false)
        .from_reader(source);

    let names = {
        let headers = reader
            .headers()
            .map_err(|e| PrepError::Parse(format!("unreadable header: {}", e)))?;
        validate_header(headers)?
    };

    let mut cells: Vec<Vec<Option<String>>> = vec![Vec::new(); names.len()];

    for result in reader.records() {
        let record = result.map_err(|e| match e.kind() {
            csv::ErrorKind::UnequalLengths {
                pos,
                expected_len,
                len,
            } => PrepError::Parse(format!(
                "row at line {} has {} fields, expected {}",
                pos.as_ref().map(|p| p.line()).unwrap_or(0),
                len,
                expected_len
            )),
            _ => PrepError::Parse(e.to_string()),
        })?;

        for (column, field) in cells.iter_mut().zip(record.iter()) {
            column.push(if field.is_empty() {
                None
            } else {
                Some(field.to_string())
            });
        }
    }

    let columns = names
        .into_iter()
        .zip(cells)
        .map(|(name, values)| infer_column(name, values))
        .collect();

    Table::new(columns)
}

fn infer_column(name: String, values: Vec<Option<String>>) -> Column {
    let all_numeric = values
        .iter()
        .flatten()
        .all(|v| parse_number(v).is_some());

    if all_numeric {
        let parsed = values
            .iter()
            .map(|v| v.as_deref().and_then(parse_number))
            .collect();
        Column::numeric(name, parsed)
    } else {
        Column::text(name, values)
    }
}

/// Parse a finite floating-point number; anything else is `None`
pub(crate) fn parse_number(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn validate_header(headers: &csv::StringRecord) -> Result<Vec<String>> {
    if headers.is_empty() || (headers.len() == 1 && headers[0].trim().is_empty()) {
        return Err(PrepError::Parse("missing header row".to_string()));
    }

    let mut names: Vec<String> = Vec::with_capacity(headers.len());
    for (idx, raw) in headers.iter().enumerate() {
        let name = raw.trim();
        if name.is_empty() {
            return Err(PrepError::Parse(format!(
                "header field {} is blank",
                idx + 1
            )));
        }
        if names.iter().any(|n| n == name) {
            return Err(PrepError::Parse(format!(
                "duplicate header name '{}'",
                name
            )));
        }
        names.push(name.to_string());
    }

    Ok(names)
}

fn file_extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

fn csv_error(e: csv::Error, path: &Path) -> PrepError {
    if e.is_io_error() {
        match e.into_kind() {
            csv::ErrorKind::Io(io) => PrepError::io(path, io),
            other => PrepError::Parse(format!("{:?}", other)),
        }
    } else {
        PrepError::Parse(format!("{}: {}", path.display(), e))
    }
}

fn attach_path(e: PrepError, path: &Path) -> PrepError {
    match e {
        PrepError::Parse(msg) => PrepError::Parse(format!("{}: {}", path.display(), msg)),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::table::ColumnData;

    #[test]
    fn test_read_csv_infers_types() {
        let data = "id,tenure,charges,plan\nA,1,29.85,basic\nB,34,,premium\n";
        let table = read_csv(data.as_bytes(), b',').unwrap();

        assert_eq!(table.shape(), (2, 4));
        assert!(table.column("tenure").unwrap().data.is_numeric());
        assert_eq!(
            table.column("charges").unwrap().data,
            ColumnData::Numeric(vec![Some(29.85), None])
        );
        assert!(!table.column("plan").unwrap().data.is_numeric());
    }

    #[test]
    fn test_whitespace_cell_keeps_column_textual() {
        let data = "TotalCharges\n29.85\n \n56.95\n";
        let table = read_csv(data.as_bytes(), b',').unwrap();
        let column = table.column("TotalCharges").unwrap();

        assert_eq!(
            column.data.as_text().unwrap()[1].as_deref(),
            Some(" "),
            "whitespace is a value, not a missing cell"
        );
    }

    #[test]
    fn test_ragged_row_is_parse_error() {
        let data = "a,b,c\n1,2,3\n4,5\n";
        let err = read_csv(data.as_bytes(), b',').unwrap_err();
        assert!(matches!(err, PrepError::Parse(_)));
        assert!(err.to_string().contains("expected 3"));
    }

    #[test]
    fn test_duplicate_header_is_parse_error() {
        let data = "a,b,a\n1,2,3\n";
        let err = read_csv(data.as_bytes(), b',').unwrap_err();
        assert!(err.to_string().contains("duplicate header"));
    }

    #[test]
    fn test_blank_header_field_is_parse_error() {
        let data = "a,,c\n1,2,3\n";
        assert!(matches!(
            read_csv(data.as_bytes(), b','),
            Err(PrepError::Parse(_))
        ));
    }

    #[test]
    fn test_empty_input_is_parse_error() {
        assert!(matches!(read_csv("".as_bytes(), b','), Err(PrepError::Parse(_))));
    }

    #[test]
    fn test_header_only_gives_empty_table() {
        let table = read_csv("a,b\n".as_bytes(), b',').unwrap();
        assert_eq!(table.shape(), (0, 2));
    }

    #[test]
    fn test_semicolon_delimiter() {
        let table = read_csv("a;b\n1;x\n".as_bytes(), b';').unwrap();
        assert_eq!(table.column_names(), vec!["a", "b"]);
    }

    #[test]
    fn test_non_finite_values_are_text() {
        let table = read_csv("a\ninf\n1\n".as_bytes(), b',').unwrap();
        assert!(!table.column("a").unwrap().data.is_numeric());
    }

    #[test]
    fn test_all_empty_column_is_numeric() {
        let table = read_csv("a,b\n,1\n,2\n".as_bytes(), b',').unwrap();
        let a = table.column("a").unwrap();
        assert!(a.data.is_numeric());
        assert!(a.is_fully_missing());
    }
}
