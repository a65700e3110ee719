//! Missing value analysis, median imputation and standardization

use serde::{Deserialize, Serialize};

use crate::error::{PrepError, Result};

use super::config::{ConstantColumnPolicy, PrepConfig};
use super::logger::{PipelineLogger, Stage};
use super::table::{ColumnData, Table};

/// Relative tolerance below which a standard deviation counts as zero
const ZERO_VARIANCE_TOLERANCE: f64 = 1e-12;

/// Median of one numeric column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMedian {
    pub column: String,
    pub median: f64,
}

/// Per-column medians used to fill missing cells
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImputationParameters {
    pub medians: Vec<ColumnMedian>,
}

impl ImputationParameters {
    pub fn median(&self, column: &str) -> Option<f64> {
        self.medians
            .iter()
            .find(|m| m.column == column)
            .map(|m| m.median)
    }
}

/// Mean and population standard deviation of one numeric column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnScale {
    pub column: String,
    pub mean: f64,
    pub std: f64,
}

/// Per-column standardization parameters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScalingParameters {
    pub columns: Vec<ColumnScale>,
}

impl ScalingParameters {
    pub fn get(&self, column: &str) -> Option<&ColumnScale> {
        self.columns.iter().find(|c| c.column == column)
    }
}

/// Everything the scaler learned from its input
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScalerParameters {
    /// Columns removed at fit time (fully missing or constant)
    pub dropped_columns: Vec<String>,
    pub imputation: ImputationParameters,
    pub scaling: ScalingParameters,
}

/// What the scaler changed. Informational only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScaleReport {
    pub dropped_missing_columns: Vec<String>,
    pub dropped_constant_columns: Vec<String>,
    pub imputed_cells: usize,
    pub scaled_columns: usize,
}

/// Analyze missing values: fraction of missing cells per column, sorted descending
pub fn analyze_missing_values(table: &Table) -> Vec<(String, f64)> {
    if table.height() == 0 {
        return Vec::new();
    }

    let rows = table.height() as f64;
    let mut ratios: Vec<(String, f64)> = table
        .columns()
        .iter()
        .map(|c| (c.name.clone(), c.data.null_count() as f64 / rows))
        .collect();

    ratios.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    ratios
}

/// Names of scalable columns in which every cell is missing, in table order
pub fn fully_missing_columns(table: &Table) -> Vec<String> {
    table
        .columns()
        .iter()
        .filter(|c| c.kind.is_scalable() && c.is_fully_missing())
        .map(|c| c.name.clone())
        .collect()
}

/// Median of the present values; the midpoint of the two middle values for even counts
pub fn median(values: &[Option<f64>]) -> Option<f64> {
    let mut present: Vec<f64> = values.iter().flatten().copied().collect();
    if present.is_empty() {
        return None;
    }
    present.sort_by(|a, b| a.total_cmp(b));

    let mid = present.len() / 2;
    if present.len() % 2 == 0 {
        Some((present[mid - 1] + present[mid]) / 2.0)
    } else {
        Some(present[mid])
    }
}

/// Mean and population standard deviation of complete values
pub fn mean_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

fn is_zero_variance(mean: f64, std: f64) -> bool {
    std <= ZERO_VARIANCE_TOLERANCE * mean.abs().max(1.0)
}

/// Drop fully missing columns, median-impute, then standardize every numeric feature column.
///
/// The target and passthrough columns are left untouched.
pub fn scale(
    mut table: Table,
    config: &PrepConfig,
    logger: &dyn PipelineLogger,
) -> Result<(Table, ScaleReport, ScalerParameters)> {
    ensure_numeric(&table)?;

    let mut report = ScaleReport::default();
    let mut params = ScalerParameters::default();

    let fully_missing = fully_missing_columns(&table);
    if !fully_missing.is_empty() {
        logger.warn(
            Stage::Scale,
            &format!(
                "These numeric columns are fully missing and will be dropped: {}",
                fully_missing.join(", ")
            ),
        );
        for name in &fully_missing {
            table.remove_column(name);
        }
        report.dropped_missing_columns = fully_missing.clone();
        params.dropped_columns.extend(fully_missing);
    }

    let mut constant: Vec<String> = Vec::new();

    for column in table.columns_mut() {
        if !column.kind.is_scalable() {
            continue;
        }
        let ColumnData::Numeric(values) = &mut column.data else {
            continue;
        };

        // Non-empty: fully missing columns were removed above
        let fill = median(values).unwrap_or(0.0);
        let missing = values.iter().filter(|v| v.is_none()).count();
        report.imputed_cells += missing;
        params.imputation.medians.push(ColumnMedian {
            column: column.name.clone(),
            median: fill,
        });

        let complete: Vec<f64> = values.iter().map(|v| v.unwrap_or(fill)).collect();
        let (mean, std) = mean_std(&complete);

        if is_zero_variance(mean, std) {
            match config.constant_columns {
                ConstantColumnPolicy::Error => {
                    return Err(PrepError::DegenerateColumn {
                        column: column.name.clone(),
                        value: mean,
                    })
                }
                ConstantColumnPolicy::Drop => {
                    constant.push(column.name.clone());
                    continue;
                }
            }
        }

        *values = complete.iter().map(|v| Some((v - mean) / std)).collect();
        params.scaling.columns.push(ColumnScale {
            column: column.name.clone(),
            mean,
            std,
        });
        report.scaled_columns += 1;
    }

    if report.imputed_cells > 0 {
        logger.warn(
            Stage::Scale,
            &format!(
                "{} missing value(s) found in numeric columns before scaling. Applied median imputation.",
                report.imputed_cells
            ),
        );
    }

    if !constant.is_empty() {
        logger.warn(
            Stage::Scale,
            &format!(
                "These numeric columns have zero variance and will be dropped: {}",
                constant.join(", ")
            ),
        );
        for name in &constant {
            table.remove_column(name);
        }
        params
            .imputation
            .medians
            .retain(|m| !constant.contains(&m.column));
        report.dropped_constant_columns = constant.clone();
        params.dropped_columns.extend(constant);
    }

    logger.info(
        Stage::Scale,
        &format!("Feature scaling completed ({} column(s))", report.scaled_columns),
    );

    Ok((table, report, params))
}

/// Apply fitted scaler parameters to new data.
///
/// Columns dropped at fit time are removed; every fitted column must be
/// present. Scalable columns unknown to the parameters are dropped.
pub fn apply_scaling(
    mut table: Table,
    params: &ScalerParameters,
    logger: &dyn PipelineLogger,
) -> Result<(Table, ScaleReport)> {
    ensure_numeric(&table)?;
    let mut report = ScaleReport::default();

    for name in &params.dropped_columns {
        table.remove_column(name);
    }

    let unknown: Vec<String> = table
        .columns()
        .iter()
        .filter(|c| c.kind.is_scalable() && params.scaling.get(&c.name).is_none())
        .map(|c| c.name.clone())
        .collect();
    if !unknown.is_empty() {
        logger.warn(
            Stage::Scale,
            &format!(
                "Columns without fitted parameters dropped: {}",
                unknown.join(", ")
            ),
        );
        for name in &unknown {
            table.remove_column(name);
        }
    }

    for stat in &params.scaling.columns {
        let fill = params
            .imputation
            .median(&stat.column)
            .unwrap_or(stat.mean);
        let column = table
            .column_mut(&stat.column)
            .ok_or_else(|| PrepError::missing_column(&stat.column, "Fitted"))?;

        if let ColumnData::Numeric(values) = &mut column.data {
            for value in values.iter_mut() {
                if value.is_none() {
                    report.imputed_cells += 1;
                }
                let v = value.unwrap_or(fill);
                *value = Some((v - stat.mean) / stat.std);
            }
        }
        report.scaled_columns += 1;
    }

    if report.imputed_cells > 0 {
        logger.warn(
            Stage::Scale,
            &format!(
                "{} missing value(s) filled with fitted medians",
                report.imputed_cells
            ),
        );
    }

    Ok((table, report))
}

fn ensure_numeric(table: &Table) -> Result<()> {
    match table
        .columns()
        .iter()
        .find(|c| c.kind.is_scalable() && !c.data.is_numeric())
    {
        Some(column) => Err(PrepError::Schema(format!(
            "column '{}' must be numeric before scaling",
            column.name
        ))),
        None => Ok(()),
    }
}
