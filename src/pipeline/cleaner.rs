//! String normalization, column pruning and missing-value marking

use crate::error::{PrepError, Result};

use super::config::PrepConfig;
use super::loader::parse_number;
use super::logger::{PipelineLogger, Stage};
use super::table::{ColumnData, Table};

/// What the cleaner changed. Informational only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanReport {
    /// Text cells whose surrounding whitespace was removed
    pub trimmed_cells: usize,
    /// Columns removed (only ever the identifier)
    pub dropped_columns: Vec<String>,
    /// Blank cells in numeric-textual columns turned into missing values
    pub blank_to_missing: usize,
    /// Non-blank cells in numeric-textual columns that failed to parse
    pub unparsable_to_missing: usize,
    /// Empty strings in other columns turned into missing values
    pub empty_to_missing: usize,
    /// Rows in which every cell was missing
    pub dropped_empty_rows: usize,
    /// Rows missing a required column value
    pub dropped_incomplete_rows: usize,
}

impl CleanReport {
    pub fn dropped_rows(&self) -> usize {
        self.dropped_empty_rows + self.dropped_incomplete_rows
    }
}

/// Clean a table. Only the identifier column and rows covered by the
/// documented drop rules are ever removed; no column is added.
pub fn clean(
    mut table: Table,
    config: &PrepConfig,
    logger: &dyn PipelineLogger,
) -> Result<(Table, CleanReport)> {
    let mut report = CleanReport::default();

    for column in &config.required_columns {
        if !table.has_column(column) {
            return Err(PrepError::missing_column(column, "Required"));
        }
    }

    report.trimmed_cells = trim_text(&mut table);
    if report.trimmed_cells > 0 {
        logger.info(
            Stage::Clean,
            &format!("Trimmed whitespace in {} cell(s)", report.trimmed_cells),
        );
    }

    if let Some(id) = config.identifier_column.as_deref() {
        if table.remove_column(id).is_some() {
            logger.info(Stage::Clean, &format!("Dropped identifier column '{}'", id));
            report.dropped_columns.push(id.to_string());
        }
    }

    for name in &config.numeric_textual_columns {
        match table.column_mut(name) {
            Some(column) => {
                let (blank, unparsable) = coerce_numeric(&mut column.data);
                report.blank_to_missing += blank;
                report.unparsable_to_missing += unparsable;
                if blank + unparsable > 0 {
                    logger.warn(
                        Stage::Clean,
                        &format!(
                            "Column '{}': {} blank and {} unparsable value(s) set to missing",
                            name, blank, unparsable
                        ),
                    );
                }
            }
            None => logger.info(
                Stage::Clean,
                &format!("Numeric-textual column '{}' not present, skipped", name),
            ),
        }
    }

    report.empty_to_missing = mark_empty_strings(&mut table);

    let keep: Vec<bool> = (0..table.height())
        .map(|row| !table.is_row_missing(row))
        .collect();
    report.dropped_empty_rows = table.retain_rows(&keep);
    if report.dropped_empty_rows > 0 {
        logger.warn(
            Stage::Clean,
            &format!("Dropped {} fully empty row(s)", report.dropped_empty_rows),
        );
    }

    if !config.required_columns.is_empty() {
        let keep: Vec<bool> = (0..table.height())
            .map(|row| {
                config.required_columns.iter().all(|name| {
                    table
                        .column(name)
                        .map(|c| !c.data.is_missing(row))
                        .unwrap_or(true)
                })
            })
            .collect();
        report.dropped_incomplete_rows = table.retain_rows(&keep);
        if report.dropped_incomplete_rows > 0 {
            logger.warn(
                Stage::Clean,
                &format!(
                    "Dropped {} row(s) missing a required value ({})",
                    report.dropped_incomplete_rows,
                    config.required_columns.join(", ")
                ),
            );
        }
    }

    logger.info(
        Stage::Clean,
        &format!(
            "Cleaned data shape: ({}, {})",
            table.height(),
            table.width()
        ),
    );

    Ok((table, report))
}

fn trim_text(table: &mut Table) -> usize {
    let mut trimmed = 0;
    for column in table.columns_mut() {
        if let ColumnData::Text(values) = &mut column.data {
            for value in values.iter_mut().flatten() {
                let t = value.trim();
                if t.len() != value.len() {
                    *value = t.to_string();
                    trimmed += 1;
                }
            }
        }
    }
    trimmed
}

/// Turn a text column into numbers. Returns (blank, unparsable) counts.
fn coerce_numeric(data: &mut ColumnData) -> (usize, usize) {
    let ColumnData::Text(values) = data else {
        return (0, 0);
    };

    let mut blank = 0;
    let mut unparsable = 0;
    let parsed: Vec<Option<f64>> = values
        .iter()
        .map(|v| match v.as_deref().map(str::trim) {
            None => None,
            Some("") => {
                blank += 1;
                None
            }
            Some(s) => {
                let n = parse_number(s);
                if n.is_none() {
                    unparsable += 1;
                }
                n
            }
        })
        .collect();

    *data = ColumnData::Numeric(parsed);
    (blank, unparsable)
}

fn mark_empty_strings(table: &mut Table) -> usize {
    let mut count = 0;
    for column in table.columns_mut() {
        if let ColumnData::Text(values) = &mut column.data {
            for value in values.iter_mut() {
                if value.as_deref() == Some("") {
                    *value = None;
                    count += 1;
                }
            }
        }
    }
    count
}
