//! In-memory table with classified columns
//!
//! Every stage consumes a `Table` and produces a new one. Column kinds are
//! assigned once by [`Table::classify`] and travel with the table, so later
//! stages never re-derive types from values.

use polars::prelude::{Column as PlColumn, DataFrame, DataType};
use serde::{Deserialize, Serialize};

use crate::error::{PrepError, Result};

use super::config::PrepConfig;
use super::encoder::BinaryMapping;

/// Semantic role of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Identifier,
    Numeric,
    Binary,
    Categorical,
    Target,
    /// Text column excluded from one-hot encoding that is not the target
    Passthrough,
}

impl ColumnKind {
    /// Kinds that the scaler imputes and standardizes
    pub fn is_scalable(self) -> bool {
        matches!(self, ColumnKind::Numeric | ColumnKind::Binary)
    }

    pub fn label(self) -> &'static str {
        match self {
            ColumnKind::Identifier => "identifier",
            ColumnKind::Numeric => "numeric",
            ColumnKind::Binary => "binary",
            ColumnKind::Categorical => "categorical",
            ColumnKind::Target => "target",
            ColumnKind::Passthrough => "passthrough",
        }
    }
}

/// How a categorical column is turned into numbers
#[derive(Debug, Clone, PartialEq)]
pub enum EncodingRule {
    Binary(BinaryMapping),
    OneHot { drop_first: bool },
}

/// Name, role and encoding rule of one column
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDescriptor {
    pub name: String,
    pub kind: ColumnKind,
    pub encoding: Option<EncodingRule>,
}

/// Cell storage. `None` marks a missing value.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Numeric(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Numeric(v) => v.len(),
            ColumnData::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnData::Numeric(_))
    }

    pub fn is_missing(&self, row: usize) -> bool {
        match self {
            ColumnData::Numeric(v) => v[row].is_none(),
            ColumnData::Text(v) => v[row].is_none(),
        }
    }

    pub fn null_count(&self) -> usize {
        match self {
            ColumnData::Numeric(v) => v.iter().filter(|x| x.is_none()).count(),
            ColumnData::Text(v) => v.iter().filter(|x| x.is_none()).count(),
        }
    }

    pub fn as_numeric(&self) -> Option<&[Option<f64>]> {
        match self {
            ColumnData::Numeric(v) => Some(v),
            ColumnData::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&[Option<String>]> {
        match self {
            ColumnData::Text(v) => Some(v),
            ColumnData::Numeric(_) => None,
        }
    }

    fn retain(&mut self, keep: &[bool]) {
        fn retain_vec<T>(values: &mut Vec<T>, keep: &[bool]) {
            let mut flags = keep.iter();
            values.retain(|_| *flags.next().unwrap_or(&true));
        }
        match self {
            ColumnData::Numeric(v) => retain_vec(v, keep),
            ColumnData::Text(v) => retain_vec(v, keep),
        }
    }

    fn select(&self, rows: &[usize]) -> ColumnData {
        match self {
            ColumnData::Numeric(v) => ColumnData::Numeric(rows.iter().map(|&i| v[i]).collect()),
            ColumnData::Text(v) => {
                ColumnData::Text(rows.iter().map(|&i| v[i].clone()).collect())
            }
        }
    }
}

/// A named, classified column
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
    pub data: ColumnData,
}

impl Column {
    pub fn numeric(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            kind: ColumnKind::Numeric,
            data: ColumnData::Numeric(values),
        }
    }

    pub fn text(name: impl Into<String>, values: Vec<Option<String>>) -> Self {
        Self {
            name: name.into(),
            kind: ColumnKind::Categorical,
            data: ColumnData::Text(values),
        }
    }

    pub fn with_kind(mut self, kind: ColumnKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// True when every cell is missing. An empty column counts as fully missing.
    pub fn is_fully_missing(&self) -> bool {
        self.data.null_count() == self.data.len()
    }
}

/// Ordered collection of equally long columns
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<Column>,
    height: usize,
}

impl Table {
    /// Build a table, rejecting duplicate names and ragged columns
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let height = columns.first().map(Column::len).unwrap_or(0);

        for (i, column) in columns.iter().enumerate() {
            if column.len() != height {
                return Err(PrepError::Parse(format!(
                    "column '{}' has {} rows, expected {}",
                    column.name,
                    column.len(),
                    height
                )));
            }
            if columns[..i].iter().any(|c| c.name == column.name) {
                return Err(PrepError::Parse(format!(
                    "duplicate column name '{}'",
                    column.name
                )));
            }
        }

        Ok(Self { columns, height })
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.columns.len())
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub(crate) fn columns_mut(&mut self) -> &mut [Column] {
        &mut self.columns
    }

    pub(crate) fn into_columns(self) -> Vec<Column> {
        self.columns
    }

    /// Remove a column by name, returning it if it was present
    pub fn remove_column(&mut self, name: &str) -> Option<Column> {
        let idx = self.columns.iter().position(|c| c.name == name)?;
        let column = self.columns.remove(idx);
        if self.columns.is_empty() {
            self.height = 0;
        }
        Some(column)
    }

    /// Append a column at the end
    pub fn push_column(&mut self, column: Column) -> Result<()> {
        if self.has_column(&column.name) {
            return Err(PrepError::Schema(format!(
                "column '{}' already exists",
                column.name
            )));
        }
        if self.columns.is_empty() {
            self.height = column.len();
        } else if column.len() != self.height {
            return Err(PrepError::Parse(format!(
                "column '{}' has {} rows, expected {}",
                column.name,
                column.len(),
                self.height
            )));
        }
        self.columns.push(column);
        Ok(())
    }

    /// True when every cell of `row` is missing
    pub fn is_row_missing(&self, row: usize) -> bool {
        self.columns.iter().all(|c| c.data.is_missing(row))
    }

    /// Keep the rows whose flag is `true`; returns how many rows were removed
    pub fn retain_rows(&mut self, keep: &[bool]) -> usize {
        debug_assert_eq!(keep.len(), self.height);
        let kept = keep.iter().filter(|k| **k).count();
        let removed = self.height - kept;
        if removed > 0 {
            for column in &mut self.columns {
                column.data.retain(keep);
            }
            self.height = kept;
        }
        removed
    }

    /// New table made of the given row indices, in that order
    pub fn select_rows(&self, rows: &[usize]) -> Table {
        Table {
            columns: self
                .columns
                .iter()
                .map(|c| Column {
                    name: c.name.clone(),
                    kind: c.kind,
                    data: c.data.select(rows),
                })
                .collect(),
            height: rows.len(),
        }
    }

    /// Assign each column its semantic kind from the configuration.
    ///
    /// Order of precedence: identifier, target, binary, numeric-textual,
    /// stored numeric, excluded text, other text.
    pub fn classify(mut self, config: &PrepConfig) -> Table {
        for column in &mut self.columns {
            column.kind = classify_column(column, config);
        }
        self
    }

    /// Descriptors for every column, including its encoding rule
    pub fn descriptors(&self, config: &PrepConfig) -> Vec<ColumnDescriptor> {
        self.columns
            .iter()
            .map(|c| {
                let encoding = match c.kind {
                    ColumnKind::Binary | ColumnKind::Target => config
                        .binary_mapping(&c.name)
                        .cloned()
                        .map(EncodingRule::Binary),
                    ColumnKind::Categorical => Some(EncodingRule::OneHot {
                        drop_first: config.drop_first,
                    }),
                    _ => None,
                };
                ColumnDescriptor {
                    name: c.name.clone(),
                    kind: c.kind,
                    encoding,
                }
            })
            .collect()
    }

    /// Convert to a polars frame for export
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let columns: Vec<PlColumn> = self
            .columns
            .iter()
            .map(|c| match &c.data {
                ColumnData::Numeric(v) => PlColumn::new(c.name.as_str().into(), v.as_slice()),
                ColumnData::Text(v) => PlColumn::new(c.name.as_str().into(), v.as_slice()),
            })
            .collect();

        Ok(DataFrame::new(columns)?)
    }

    /// Build an unclassified table from a polars frame.
    ///
    /// Numeric and boolean columns become `f64`; everything else is cast to text.
    pub fn from_dataframe(df: &DataFrame) -> Result<Table> {
        let mut columns = Vec::with_capacity(df.width());

        for col in df.get_columns() {
            let name = col.name().to_string();
            let dtype = col.dtype();

            let column = if dtype.is_primitive_numeric() || matches!(dtype, DataType::Boolean) {
                let cast = col.cast(&DataType::Float64)?;
                let values: Vec<Option<f64>> = cast.f64()?.into_iter().collect();
                Column::numeric(name, values)
            } else {
                let cast = col.cast(&DataType::String)?;
                let values: Vec<Option<String>> = cast
                    .str()?
                    .into_iter()
                    .map(|v| v.map(|s| s.to_string()))
                    .collect();
                Column::text(name, values)
            };
            columns.push(column);
        }

        Table::new(columns)
    }
}

fn classify_column(column: &Column, config: &PrepConfig) -> ColumnKind {
    let name = column.name.as_str();

    if config.identifier_column.as_deref() == Some(name) {
        ColumnKind::Identifier
    } else if config.target_column == name {
        ColumnKind::Target
    } else if config.binary_mapping(name).is_some() {
        ColumnKind::Binary
    } else if config.is_numeric_textual(name) || column.data.is_numeric() {
        ColumnKind::Numeric
    } else if config.is_excluded_from_onehot(name) {
        ColumnKind::Passthrough
    } else {
        ColumnKind::Categorical
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(values: &[&str]) -> Vec<Option<String>> {
        values.iter().map(|v| Some(v.to_string())).collect()
    }

    fn sample_table() -> Table {
        Table::new(vec![
            Column::text("customerID", text(&["a", "b", "c"])),
            Column::text("gender", text(&["Male", "Female", "Male"])),
            Column::numeric("tenure", vec![Some(1.0), Some(2.0), None]),
            Column::text("TotalCharges", text(&["29.85", " ", "56.95"])),
            Column::text("Contract", text(&["Month", "One year", "Month"])),
            Column::text("Churn", text(&["Yes", "No", "No"])),
        ])
        .unwrap()
    }

    #[test]
    fn test_new_rejects_ragged_columns() {
        let result = Table::new(vec![
            Column::numeric("a", vec![Some(1.0), Some(2.0)]),
            Column::numeric("b", vec![Some(1.0)]),
        ]);
        assert!(matches!(result, Err(PrepError::Parse(_))));
    }

    #[test]
    fn test_new_rejects_duplicate_names() {
        let result = Table::new(vec![
            Column::numeric("a", vec![Some(1.0)]),
            Column::numeric("a", vec![Some(2.0)]),
        ]);
        assert!(result.unwrap_err().to_string().contains("duplicate"));
    }

    #[test]
    fn test_classify_telco_columns() {
        let table = sample_table().classify(&PrepConfig::telco());
        let kinds: Vec<ColumnKind> = table.columns().iter().map(|c| c.kind).collect();

        assert_eq!(
            kinds,
            vec![
                ColumnKind::Identifier,
                ColumnKind::Binary,
                ColumnKind::Numeric,
                ColumnKind::Numeric,
                ColumnKind::Categorical,
                ColumnKind::Target,
            ]
        );
    }

    #[test]
    fn test_classify_excluded_text_is_passthrough() {
        let mut config = PrepConfig::with_target("Churn");
        config.excluded_from_onehot = vec!["Contract".to_string()];
        let table = sample_table().classify(&config);
        assert_eq!(table.column("Contract").unwrap().kind, ColumnKind::Passthrough);
    }

    #[test]
    fn test_retain_rows_keeps_alignment() {
        let mut table = sample_table();
        let removed = table.retain_rows(&[true, false, true]);

        assert_eq!(removed, 1);
        assert_eq!(table.height(), 2);
        let tenure = table.column("tenure").unwrap().data.as_numeric().unwrap();
        assert_eq!(tenure, &[Some(1.0), None]);
        let ids = table.column("customerID").unwrap().data.as_text().unwrap();
        assert_eq!(ids, &[Some("a".to_string()), Some("c".to_string())]);
    }

    #[test]
    fn test_select_rows_reorders() {
        let table = sample_table();
        let picked = table.select_rows(&[2, 0]);
        let tenure = picked.column("tenure").unwrap().data.as_numeric().unwrap();
        assert_eq!(tenure, &[None, Some(1.0)]);
    }

    #[test]
    fn test_push_column_checks_height() {
        let mut table = sample_table();
        let result = table.push_column(Column::numeric("extra", vec![Some(1.0)]));
        assert!(result.is_err());
    }

    #[test]
    fn test_descriptors_carry_encoding_rule() {
        let config = PrepConfig::telco();
        let table = sample_table().classify(&config);
        let descriptors = table.descriptors(&config);

        let gender = descriptors.iter().find(|d| d.name == "gender").unwrap();
        assert!(matches!(gender.encoding, Some(EncodingRule::Binary(_))));

        let contract = descriptors.iter().find(|d| d.name == "Contract").unwrap();
        assert_eq!(
            contract.encoding,
            Some(EncodingRule::OneHot { drop_first: false })
        );

        let tenure = descriptors.iter().find(|d| d.name == "tenure").unwrap();
        assert!(tenure.encoding.is_none());
    }

    #[test]
    fn test_dataframe_conversion_preserves_nulls() {
        let table = sample_table();
        let df = table.to_dataframe().unwrap();
        assert_eq!(df.shape(), (3, 6));
        assert_eq!(df.column("tenure").unwrap().null_count(), 1);

        let back = Table::from_dataframe(&df).unwrap();
        assert_eq!(back.column_names(), table.column_names());
        assert_eq!(
            back.column("tenure").unwrap().data,
            table.column("tenure").unwrap().data
        );
        assert_eq!(
            back.column("gender").unwrap().data,
            table.column("gender").unwrap().data
        );
    }
}
