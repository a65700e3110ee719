//! Categorical encoding
//!
//! Two-valued columns are mapped to 1/0 through a configured value pair.
//! Every other text column that is not excluded is replaced by one 0/1
//! indicator column per distinct value. Indicator names must not clash with
//! another indicator or a retained column; a clash is a schema error naming
//! both sources.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{PrepError, Result};

use super::config::PrepConfig;
use super::logger::{PipelineLogger, Stage};
use super::table::{Column, ColumnData, ColumnKind, Table};

/// Value pair for converting a two-valued column to 1/0
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinaryMapping {
    pub column: String,
    /// Value that maps to 1
    pub true_value: String,
    /// Value that maps to 0
    pub false_value: String,
}

impl BinaryMapping {
    pub fn new(
        column: impl Into<String>,
        true_value: impl Into<String>,
        false_value: impl Into<String>,
    ) -> Self {
        Self {
            column: column.into(),
            true_value: true_value.into(),
            false_value: false_value.into(),
        }
    }

    /// Map a column to 1/0.
    ///
    /// Returns the mapped values and how many present cells matched neither
    /// side of the pair (they become missing). A column that is already
    /// numeric keeps its 0/1 cells, so encoding twice changes nothing.
    pub fn encode(&self, data: &ColumnData) -> (Vec<Option<f64>>, usize) {
        let mut unmapped = 0;
        let values = match data {
            ColumnData::Text(values) => values
                .iter()
                .map(|v| match v.as_deref() {
                    None => None,
                    Some(s) if s == self.true_value => Some(1.0),
                    Some(s) if s == self.false_value => Some(0.0),
                    Some(_) => {
                        unmapped += 1;
                        None
                    }
                })
                .collect(),
            ColumnData::Numeric(values) => values
                .iter()
                .map(|v| match v {
                    None => None,
                    Some(x) if *x == 1.0 || *x == 0.0 => Some(*x),
                    Some(_) => {
                        unmapped += 1;
                        None
                    }
                })
                .collect(),
        };
        (values, unmapped)
    }
}

/// Distinct values of a one-hot encoded column, in first-seen order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryLevels {
    pub column: String,
    pub levels: Vec<String>,
    /// The first level was dropped as reference level
    pub drop_first: bool,
}

impl CategoryLevels {
    /// Learn levels from a text column
    pub fn observe(column: &str, values: &[Option<String>], drop_first: bool) -> Self {
        let mut levels: Vec<String> = Vec::new();
        for value in values.iter().flatten() {
            if !levels.contains(value) {
                levels.push(value.clone());
            }
        }
        Self {
            column: column.to_string(),
            levels,
            drop_first,
        }
    }

    /// Levels that get an indicator column
    pub fn encoded_levels(&self) -> &[String] {
        if self.drop_first && !self.levels.is_empty() {
            &self.levels[1..]
        } else {
            &self.levels
        }
    }

    /// Indicator column names, `{column}_{value}`
    pub fn indicator_names(&self) -> Vec<String> {
        self.encoded_levels()
            .iter()
            .map(|level| indicator_name(&self.column, level))
            .collect()
    }
}

pub fn indicator_name(column: &str, level: &str) -> String {
    format!("{}_{}", column, level)
}

/// What the encoder changed. Informational only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodeReport {
    pub binary_encoded: Vec<String>,
    /// Present cells outside the configured pair, now missing
    pub unmapped_values: usize,
    /// Source columns replaced by indicators
    pub onehot_encoded: Vec<String>,
    pub indicator_columns: Vec<String>,
    /// Cells whose category was not among the fitted levels
    pub unseen_values: usize,
    /// Categorical columns removed because no levels were fitted for them
    pub dropped_columns: Vec<String>,
}

/// Map a binary-configured target column to 1/0 ahead of the other columns,
/// so unlabeled rows can be dropped before any one-hot level is learned.
///
/// Returns how many labels matched neither side of the pair. Later encoding
/// of the already numeric column is a no-op.
pub fn encode_target(
    table: &mut Table,
    config: &PrepConfig,
    logger: &dyn PipelineLogger,
) -> usize {
    let Some(mapping) = config.binary_mapping(&config.target_column) else {
        return 0;
    };
    let Some(column) = table.column_mut(&config.target_column) else {
        return 0;
    };

    let (values, unmapped) = mapping.encode(&column.data);
    if unmapped > 0 {
        warn_unmapped(logger, &column.name, mapping, unmapped);
    }
    column.data = ColumnData::Numeric(values);
    unmapped
}

fn warn_unmapped(
    logger: &dyn PipelineLogger,
    column: &str,
    mapping: &BinaryMapping,
    unmapped: usize,
) {
    logger.warn(
        Stage::Encode,
        &format!(
            "Column '{}': {} value(s) outside ('{}', '{}') set to missing",
            column, unmapped, mapping.true_value, mapping.false_value
        ),
    );
}

/// Encode a cleaned table, learning one-hot levels from its own values
pub fn encode(
    table: Table,
    config: &PrepConfig,
    logger: &dyn PipelineLogger,
) -> Result<(Table, EncodeReport, Vec<CategoryLevels>)> {
    encode_impl(table, config, None, logger)
}

/// Encode a cleaned table with previously fitted one-hot levels.
///
/// Unseen categories produce all-zero indicator rows. A fitted column absent
/// from the input is a schema error.
pub fn encode_with_levels(
    table: Table,
    config: &PrepConfig,
    levels: &[CategoryLevels],
    logger: &dyn PipelineLogger,
) -> Result<(Table, EncodeReport)> {
    let (table, report, _) = encode_impl(table, config, Some(levels), logger)?;
    Ok((table, report))
}

fn encode_impl(
    table: Table,
    config: &PrepConfig,
    fitted: Option<&[CategoryLevels]>,
    logger: &dyn PipelineLogger,
) -> Result<(Table, EncodeReport, Vec<CategoryLevels>)> {
    for mapping in &config.binary_columns {
        // New records at transform time may come without a label
        let optional = fitted.is_some() && mapping.column == config.target_column;
        if !optional && !table.has_column(&mapping.column) {
            return Err(PrepError::missing_column(&mapping.column, "Binary"));
        }
    }
    if let Some(fitted) = fitted {
        for levels in fitted {
            if !table.has_column(&levels.column) {
                return Err(PrepError::missing_column(&levels.column, "Categorical"));
            }
        }
    }

    let mut report = EncodeReport::default();
    let mut learned: Vec<CategoryLevels> = Vec::new();
    let mut retained: Vec<Column> = Vec::with_capacity(table.width());
    // (source column, indicator)
    let mut indicators: Vec<(String, Column)> = Vec::new();

    for mut column in table.into_columns() {
        if let Some(mapping) = config.binary_mapping(&column.name) {
            let (values, unmapped) = mapping.encode(&column.data);
            if unmapped > 0 {
                warn_unmapped(logger, &column.name, mapping, unmapped);
            }
            report.unmapped_values += unmapped;
            report.binary_encoded.push(column.name.clone());
            column.data = ColumnData::Numeric(values);
            retained.push(column);
            continue;
        }

        if column.kind == ColumnKind::Categorical {
            if let ColumnData::Text(values) = &column.data {
                let levels = match fitted {
                    None => CategoryLevels::observe(&column.name, values, config.drop_first),
                    Some(fitted) => match fitted.iter().find(|l| l.column == column.name) {
                        Some(levels) => levels.clone(),
                        None => {
                            logger.warn(
                                Stage::Encode,
                                &format!(
                                    "Categorical column '{}' was not present at fit time, dropped",
                                    column.name
                                ),
                            );
                            report.dropped_columns.push(column.name.clone());
                            continue;
                        }
                    },
                };

                let (columns, unseen) = one_hot(values, &levels);
                if unseen > 0 {
                    logger.warn(
                        Stage::Encode,
                        &format!(
                            "Column '{}': {} value(s) not among fitted levels, encoded as all zeros",
                            column.name, unseen
                        ),
                    );
                }
                report.unseen_values += unseen;
                report.onehot_encoded.push(column.name.clone());
                report
                    .indicator_columns
                    .extend(columns.iter().map(|c| c.name.clone()));
                indicators.extend(columns.into_iter().map(|c| (column.name.clone(), c)));
                learned.push(levels);
                continue;
            }
        }

        if column.kind.is_scalable() && !column.data.is_numeric() {
            return Err(PrepError::Schema(format!(
                "column '{}' is classified numeric but still holds text",
                column.name
            )));
        }
        retained.push(column);
    }

    if !report.binary_encoded.is_empty() {
        logger.info(
            Stage::Encode,
            &format!("Binary encoded: {}", report.binary_encoded.join(", ")),
        );
    }
    logger.info(
        Stage::Encode,
        &format!(
            "One-hot encoded {} column(s) into {} indicator(s)",
            report.onehot_encoded.len(),
            report.indicator_columns.len()
        ),
    );

    check_indicator_names(&retained, &indicators)?;

    let mut encoded = Table::new(retained)?;
    for (_, column) in indicators {
        encoded.push_column(column)?;
    }

    Ok((encoded, report, learned))
}

fn check_indicator_names(retained: &[Column], indicators: &[(String, Column)]) -> Result<()> {
    // Indicator or column name -> column it came from
    let mut owners: HashMap<&str, &str> = retained
        .iter()
        .map(|c| (c.name.as_str(), c.name.as_str()))
        .collect();

    for (source, indicator) in indicators {
        if let Some(owner) = owners.insert(indicator.name.as_str(), source.as_str()) {
            let clash = if owner == indicator.name {
                format!("the existing column '{}'", owner)
            } else {
                format!("an indicator of column '{}'", owner)
            };
            return Err(PrepError::Schema(format!(
                "one-hot indicator '{}' of column '{}' collides with {}",
                indicator.name, source, clash
            )));
        }
    }
    Ok(())
}

/// Build indicator columns; returns them and the count of unseen present cells
fn one_hot(values: &[Option<String>], levels: &CategoryLevels) -> (Vec<Column>, usize) {
    let unseen = values
        .iter()
        .flatten()
        .filter(|v| !levels.levels.contains(v))
        .count();

    let columns = levels
        .encoded_levels()
        .iter()
        .map(|level| {
            let indicator: Vec<Option<f64>> = values
                .iter()
                .map(|v| Some(if v.as_deref() == Some(level.as_str()) { 1.0 } else { 0.0 }))
                .collect();
            Column::numeric(indicator_name(&levels.column, level), indicator)
        })
        .collect();

    (columns, unseen)
}
