//! Pipeline orchestration: load, clean, encode, scale, split off the target
//!
//! Stages run strictly in that order, each consuming the previous stage's
//! complete output. The first error aborts the run.

use std::path::Path;

use chrono::{DateTime, Utc};
use polars::prelude::{Column as PlColumn, DataFrame};
use serde::{Deserialize, Serialize};

use crate::error::{PrepError, Result};
use crate::report::PreparationSummary;

use super::cleaner::clean;
use super::config::PrepConfig;
use super::encoder::{encode, encode_target, encode_with_levels, CategoryLevels};
use super::loader::load_table;
use super::logger::{PipelineLogger, Stage};
use super::scaler::{apply_scaling, scale, ScalerParameters};
use super::table::{ColumnData, ColumnKind, Table};

/// Numeric feature columns, one row per surviving record
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureMatrix {
    names: Vec<String>,
    columns: Vec<Vec<f64>>,
    rows: usize,
}

impl FeatureMatrix {
    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.names.len())
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        let idx = self.names.iter().position(|n| n == name)?;
        Some(&self.columns[idx])
    }

    pub fn row(&self, row: usize) -> Option<Vec<f64>> {
        if row >= self.rows {
            return None;
        }
        Some(self.columns.iter().map(|c| c[row]).collect())
    }

    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let columns: Vec<PlColumn> = self
            .names
            .iter()
            .zip(&self.columns)
            .map(|(name, values)| PlColumn::new(name.as_str().into(), values.as_slice()))
            .collect();
        Ok(DataFrame::new(columns)?)
    }
}

/// Label column aligned row-for-row with the feature matrix
#[derive(Debug, Clone, PartialEq)]
pub enum TargetVector {
    Numeric(Vec<f64>),
    Text(Vec<String>),
}

impl TargetVector {
    pub fn len(&self) -> usize {
        match self {
            TargetVector::Numeric(v) => v.len(),
            TargetVector::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn to_column(&self, name: &str) -> PlColumn {
        match self {
            TargetVector::Numeric(v) => PlColumn::new(name.into(), v.as_slice()),
            TargetVector::Text(v) => PlColumn::new(name.into(), v.as_slice()),
        }
    }
}

/// Pipeline output
#[derive(Debug, Clone)]
pub struct PreparedData {
    pub features: FeatureMatrix,
    /// Absent only when transforming unlabeled records
    pub target: Option<TargetVector>,
    pub target_column: String,
    pub summary: PreparationSummary,
}

impl PreparedData {
    /// Feature columns followed by the target column, for export
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let mut df = self.features.to_dataframe()?;
        if let Some(target) = &self.target {
            df.with_column(target.to_column(&self.target_column))?;
        }
        Ok(df)
    }
}

/// Parameters learned by [`Pipeline::fit`] and reused by [`Pipeline::transform`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedParameters {
    pub created_at: DateTime<Utc>,
    pub tabprep_version: String,
    /// Configuration the parameters were fitted with
    pub config: PrepConfig,
    pub categories: Vec<CategoryLevels>,
    pub scaler: ScalerParameters,
    /// Feature matrix column order
    pub feature_columns: Vec<String>,
}

impl FittedParameters {
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|e| PrepError::io(path, e))
    }

    pub fn load_json(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| PrepError::io(path, e))?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// One consolidated preparation pipeline driven by a [`PrepConfig`]
pub struct Pipeline<'a> {
    config: PrepConfig,
    logger: &'a dyn PipelineLogger,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: PrepConfig, logger: &'a dyn PipelineLogger) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, logger })
    }

    pub fn config(&self) -> &PrepConfig {
        &self.config
    }

    /// Load and classify a dataset
    pub fn load(&self, path: &Path) -> Result<Table> {
        load_table(path, &self.config, self.logger)
    }

    /// Load a file and prepare it, fitting every parameter on that same data.
    ///
    /// Parameters are recomputed on every call. Use [`Pipeline::fit`] and
    /// [`Pipeline::transform`] to reuse training parameters on new records.
    pub fn run(&self, path: &Path) -> Result<PreparedData> {
        let table = self.load(path)?;
        let (prepared, _) = self.fit(table)?;
        Ok(prepared)
    }

    /// Prepare a labeled table and return the parameters learned from it
    pub fn fit(&self, table: Table) -> Result<(PreparedData, FittedParameters)> {
        let config = &self.config;
        let table = table.classify(config);
        if !table.has_column(&config.target_column) {
            return Err(PrepError::missing_column(&config.target_column, "Target"));
        }
        let mut summary = PreparationSummary::new(table.height(), table.width());

        let (mut table, clean_report) = clean(table, config, self.logger)?;
        summary.record_clean(&clean_report);

        // Unlabeled rows go before one-hot levels are learned
        encode_target(&mut table, config, self.logger);
        summary.dropped_missing_target_rows = drop_missing_target(&mut table, config, self.logger);

        let (table, encode_report, categories) = encode(table, config, self.logger)?;
        summary.record_encode(&encode_report);

        let (table, scale_report, scaler) = scale(table, config, self.logger)?;
        summary.record_scale(&scale_report);

        let (features, target) = split_target(table, &config.target_column)?;
        summary.finish(features.shape());
        self.logger.info(
            Stage::Pipeline,
            &format!(
                "Final processed shape: ({}, {})",
                features.shape().0,
                features.shape().1
            ),
        );

        let params = FittedParameters {
            created_at: Utc::now(),
            tabprep_version: env!("CARGO_PKG_VERSION").to_string(),
            config: config.clone(),
            categories,
            scaler,
            feature_columns: features.names().to_vec(),
        };

        let prepared = PreparedData {
            features,
            target,
            target_column: config.target_column.clone(),
            summary,
        };

        Ok((prepared, params))
    }

    /// Prepare new records with parameters from an earlier fit.
    ///
    /// Cleaning and encoding follow the fitted configuration. Columns that were
    /// one-hot encoded at fit time stay categorical whatever the new file's
    /// cells look like. The target column is optional here.
    pub fn transform(&self, table: Table, params: &FittedParameters) -> Result<PreparedData> {
        let config = &params.config;
        let table = restore_categorical(table.classify(config), &params.categories);
        let mut summary = PreparationSummary::new(table.height(), table.width());

        let (mut table, clean_report) = clean(table, config, self.logger)?;
        summary.record_clean(&clean_report);

        encode_target(&mut table, config, self.logger);
        summary.dropped_missing_target_rows = drop_missing_target(&mut table, config, self.logger);

        let (table, encode_report) =
            encode_with_levels(table, config, &params.categories, self.logger)?;
        summary.record_encode(&encode_report);

        let (table, scale_report) = apply_scaling(table, &params.scaler, self.logger)?;
        summary.record_scale(&scale_report);

        let (features, target) = split_target(table, &config.target_column)?;
        let features = reorder(features, &params.feature_columns)?;
        summary.finish(features.shape());

        Ok(PreparedData {
            features,
            target,
            target_column: config.target_column.clone(),
            summary,
        })
    }
}

/// Give every fitted one-hot column back its categorical kind.
///
/// A column with no present cells, or only digits, loads as numeric; its
/// cells are turned back into text so the fitted levels apply.
fn restore_categorical(mut table: Table, categories: &[CategoryLevels]) -> Table {
    for levels in categories {
        let Some(column) = table.column_mut(&levels.column) else {
            continue;
        };
        column.kind = ColumnKind::Categorical;
        if let ColumnData::Numeric(values) = &column.data {
            let text = values.iter().map(|v| v.map(|x| x.to_string())).collect();
            column.data = ColumnData::Text(text);
        }
    }
    table
}

/// Drop rows whose target value is missing; returns how many were removed
fn drop_missing_target(
    table: &mut Table,
    config: &PrepConfig,
    logger: &dyn PipelineLogger,
) -> usize {
    let keep: Vec<bool> = match table.column(&config.target_column) {
        Some(target) => (0..table.height())
            .map(|row| !target.data.is_missing(row))
            .collect(),
        None => return 0,
    };

    let removed = table.retain_rows(&keep);
    if removed > 0 {
        logger.warn(
            Stage::Pipeline,
            &format!(
                "Dropped {} row(s) with a missing '{}' value",
                removed, config.target_column
            ),
        );
    }
    removed
}

/// Separate the target column from the features.
///
/// Every remaining column must be a fully populated numeric feature.
fn split_target(table: Table, target: &str) -> Result<(FeatureMatrix, Option<TargetVector>)> {
    let rows = table.height();
    let mut names = Vec::with_capacity(table.width());
    let mut columns = Vec::with_capacity(table.width());
    let mut target_vector = None;

    for column in table.into_columns() {
        if column.name == target {
            target_vector = Some(match column.data {
                ColumnData::Numeric(values) => {
                    TargetVector::Numeric(values.into_iter().flatten().collect())
                }
                ColumnData::Text(values) => {
                    TargetVector::Text(values.into_iter().flatten().collect())
                }
            });
            continue;
        }

        if column.kind == ColumnKind::Passthrough {
            return Err(PrepError::Schema(format!(
                "column '{}' is excluded from encoding but is not the target; \
                 the feature matrix must be numeric",
                column.name
            )));
        }

        let ColumnData::Numeric(values) = column.data else {
            return Err(PrepError::Schema(format!(
                "column '{}' is not numeric after encoding",
                column.name
            )));
        };
        let complete: Vec<f64> = values.iter().flatten().copied().collect();
        if complete.len() != rows {
            return Err(PrepError::Schema(format!(
                "column '{}' still has missing values after scaling",
                column.name
            )));
        }

        names.push(column.name);
        columns.push(complete);
    }

    Ok((
        FeatureMatrix {
            names,
            columns,
            rows,
        },
        target_vector,
    ))
}

/// Put feature columns in the fitted order
fn reorder(features: FeatureMatrix, order: &[String]) -> Result<FeatureMatrix> {
    let FeatureMatrix {
        names,
        mut columns,
        rows,
    } = features;

    let mut ordered = Vec::with_capacity(order.len());
    for name in order {
        let idx = names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| PrepError::missing_column(name, "Fitted feature"))?;
        ordered.push(std::mem::take(&mut columns[idx]));
    }

    Ok(FeatureMatrix {
        names: order.to_vec(),
        columns: ordered,
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::encoder::BinaryMapping;
    use crate::pipeline::logger::RecordingLogger;
    use crate::pipeline::table::Column;

    fn text(values: &[&str]) -> Vec<Option<String>> {
        values.iter().map(|v| Some(v.to_string())).collect()
    }

    fn small_config() -> PrepConfig {
        let mut config = PrepConfig::with_target("Churn");
        config.identifier_column = Some("id".to_string());
        config.binary_columns = vec![
            BinaryMapping::new("gender", "Male", "Female"),
            BinaryMapping::new("Churn", "Yes", "No"),
        ];
        config.excluded_from_onehot = vec!["Churn".to_string()];
        config
    }

    fn small_table(config: &PrepConfig) -> Table {
        Table::new(vec![
            Column::text("id", text(&["1", "2", "3", "4"])),
            Column::text("gender", text(&["Male", "Female", "Male", "Female"])),
            Column::text("plan", text(&["a", "b", "a", "c"])),
            Column::numeric("tenure", vec![Some(1.0), Some(10.0), None, Some(4.0)]),
            Column::text("Churn", text(&["Yes", "No", "No", "Yes"])),
        ])
        .unwrap()
        .classify(config)
    }

    #[test]
    fn test_fit_produces_ordered_features_and_target() {
        let config = small_config();
        let logger = RecordingLogger::new();
        let pipeline = Pipeline::new(config.clone(), &logger).unwrap();

        let (prepared, params) = pipeline.fit(small_table(&config)).unwrap();

        assert_eq!(
            prepared.features.names(),
            &["gender", "tenure", "plan_a", "plan_b", "plan_c"]
        );
        assert_eq!(prepared.features.shape(), (4, 5));
        assert_eq!(
            prepared.target,
            Some(TargetVector::Numeric(vec![1.0, 0.0, 0.0, 1.0]))
        );
        assert_eq!(params.feature_columns, prepared.features.names());
        assert_eq!(prepared.summary.final_features, 5);
    }

    #[test]
    fn test_fit_without_target_is_schema_error() {
        let config = PrepConfig::with_target("label");
        let logger = RecordingLogger::new();
        let pipeline = Pipeline::new(config.clone(), &logger).unwrap();
        let table = Table::new(vec![Column::numeric("x", vec![Some(1.0), Some(2.0)])])
            .unwrap()
            .classify(&config);

        let err = pipeline.fit(table).unwrap_err();
        assert!(matches!(err, PrepError::Schema(_)));
        assert!(err.to_string().contains("label"));
    }

    #[test]
    fn test_rows_with_unmapped_target_are_dropped() {
        let config = small_config();
        let logger = RecordingLogger::new();
        let pipeline = Pipeline::new(config.clone(), &logger).unwrap();
        let table = Table::new(vec![
            Column::numeric("tenure", vec![Some(1.0), Some(2.0), Some(3.0)]),
            Column::text("gender", text(&["Male", "Female", "Female"])),
            Column::text("Churn", text(&["Yes", "Unknown", "No"])),
        ])
        .unwrap()
        .classify(&config);

        let (prepared, _) = pipeline.fit(table).unwrap();

        assert_eq!(prepared.features.shape().0, 2);
        assert_eq!(prepared.summary.dropped_missing_target_rows, 1);
        assert!(logger.contains("missing 'Churn'"));
    }

    #[test]
    fn test_passthrough_feature_is_rejected() {
        let mut config = PrepConfig::with_target("y");
        config.excluded_from_onehot = vec!["note".to_string()];
        let logger = RecordingLogger::new();
        let pipeline = Pipeline::new(config.clone(), &logger).unwrap();
        let table = Table::new(vec![
            Column::text("note", text(&["a", "b"])),
            Column::numeric("y", vec![Some(0.0), Some(1.0)]),
        ])
        .unwrap()
        .classify(&config);

        let err = pipeline.fit(table).unwrap_err();
        assert!(err.to_string().contains("'note'"));
    }

    #[test]
    fn test_transform_reuses_training_parameters() {
        let config = small_config();
        let logger = RecordingLogger::new();
        let pipeline = Pipeline::new(config.clone(), &logger).unwrap();
        let (_, params) = pipeline.fit(small_table(&config)).unwrap();

        let new = Table::new(vec![
            Column::text("plan", text(&["c", "z"])),
            Column::numeric("tenure", vec![Some(5.0), None]),
            Column::text("gender", text(&["Female", "Male"])),
        ])
        .unwrap();

        let prepared = pipeline.transform(new, &params).unwrap();

        assert_eq!(prepared.features.names(), params.feature_columns.as_slice());
        assert!(prepared.target.is_none());

        let plan_a = prepared.features.column("plan_a").unwrap();
        let plan_c = prepared.features.column("plan_c").unwrap();
        let a_stat = params.scaler.scaling.get("plan_a").unwrap();
        let expected_zero = (0.0 - a_stat.mean) / a_stat.std;
        assert!((plan_a[1] - expected_zero).abs() < 1e-9, "unseen category encodes as zeros");
        assert!(plan_c[0] > 0.0);
        assert!(logger.contains("not among fitted levels"));
    }

    #[test]
    fn test_fitted_parameters_json_roundtrip() {
        let config = small_config();
        let logger = RecordingLogger::new();
        let pipeline = Pipeline::new(config.clone(), &logger).unwrap();
        let (_, params) = pipeline.fit(small_table(&config)).unwrap();

        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("params.json");
        params.save_json(&path).unwrap();
        let loaded = FittedParameters::load_json(&path).unwrap();

        assert_eq!(loaded, params);
    }

    #[test]
    fn test_prepared_dataframe_appends_target() {
        let config = small_config();
        let logger = RecordingLogger::new();
        let pipeline = Pipeline::new(config.clone(), &logger).unwrap();
        let (prepared, _) = pipeline.fit(small_table(&config)).unwrap();

        let df = prepared.to_dataframe().unwrap();
        let names: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
        assert_eq!(names.last().map(String::as_str), Some("Churn"));
        assert_eq!(df.shape(), (4, 6));
    }

    #[test]
    fn test_feature_matrix_row_access() {
        let config = small_config();
        let logger = RecordingLogger::new();
        let pipeline = Pipeline::new(config.clone(), &logger).unwrap();
        let (prepared, _) = pipeline.fit(small_table(&config)).unwrap();

        let row = prepared.features.row(0).unwrap();
        assert_eq!(row.len(), 5);
        assert!(prepared.features.row(4).is_none());
    }
}
