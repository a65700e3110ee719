//! Pipeline configuration
//!
//! One configuration object covers every column-name difference between
//! datasets, so a single pipeline serves them all. Defaults reproduce the
//! Telco customer churn layout.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PrepError, Result};

use super::encoder::BinaryMapping;

/// What to do with a zero-variance column when it reaches standardization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConstantColumnPolicy {
    /// Fail with `PrepError::DegenerateColumn`
    #[default]
    Error,
    /// Drop the column and log a warning
    Drop,
}

/// Recognized configuration options for one dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrepConfig {
    /// Identifier column dropped by the cleaner (absence is not an error)
    pub identifier_column: Option<String>,
    /// Columns whose values are numbers stored as text, possibly blank
    pub numeric_textual_columns: Vec<String>,
    /// Two-valued categorical columns and their 1/0 values
    pub binary_columns: Vec<BinaryMapping>,
    /// Text columns left out of one-hot encoding
    pub excluded_from_onehot: Vec<String>,
    /// Label column split off into the target vector
    pub target_column: String,
    /// Rows missing any of these columns after cleaning are dropped
    pub required_columns: Vec<String>,
    /// Drop the first-seen level of every one-hot encoded column
    pub drop_first: bool,
    pub constant_columns: ConstantColumnPolicy,
    /// Field delimiter for CSV input
    pub delimiter: char,
}

impl Default for PrepConfig {
    fn default() -> Self {
        Self::telco()
    }
}

impl PrepConfig {
    /// Configuration for the Telco customer churn dataset
    pub fn telco() -> Self {
        let yes_no = |column: &str| BinaryMapping::new(column, "Yes", "No");

        Self {
            identifier_column: Some("customerID".to_string()),
            numeric_textual_columns: vec!["TotalCharges".to_string()],
            binary_columns: vec![
                BinaryMapping::new("gender", "Male", "Female"),
                yes_no("Partner"),
                yes_no("Dependents"),
                yes_no("PhoneService"),
                yes_no("PaperlessBilling"),
                yes_no("Churn"),
            ],
            excluded_from_onehot: vec!["Churn".to_string()],
            target_column: "Churn".to_string(),
            required_columns: Vec::new(),
            drop_first: false,
            constant_columns: ConstantColumnPolicy::Error,
            delimiter: ',',
        }
    }

    /// Minimal configuration: only a target column, nothing else configured
    pub fn with_target(target: impl Into<String>) -> Self {
        Self {
            identifier_column: None,
            numeric_textual_columns: Vec::new(),
            binary_columns: Vec::new(),
            excluded_from_onehot: Vec::new(),
            target_column: target.into(),
            required_columns: Vec::new(),
            drop_first: false,
            constant_columns: ConstantColumnPolicy::Error,
            delimiter: ',',
        }
    }

    /// Point the configuration at another target column.
    ///
    /// The old target's binary mapping and one-hot exclusion belong to that
    /// column's labels and are removed with it.
    pub fn retarget(&mut self, target: impl Into<String>) {
        let target = target.into();
        if target == self.target_column {
            return;
        }
        let old = std::mem::replace(&mut self.target_column, target);
        self.binary_columns.retain(|m| m.column != old);
        self.excluded_from_onehot.retain(|c| *c != old);
    }

    /// Load a configuration from a JSON file. Missing fields take Telco defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| PrepError::io(path, e))?;
        let config: PrepConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration for contradictions that no input could satisfy
    pub fn validate(&self) -> Result<()> {
        if self.target_column.trim().is_empty() {
            return Err(PrepError::InvalidConfig(
                "target column name is empty".to_string(),
            ));
        }

        if !self.delimiter.is_ascii() {
            return Err(PrepError::InvalidConfig(format!(
                "delimiter '{}' is not a single-byte character",
                self.delimiter
            )));
        }

        if self.identifier_column.as_deref() == Some(self.target_column.as_str()) {
            return Err(PrepError::InvalidConfig(format!(
                "column '{}' cannot be both identifier and target",
                self.target_column
            )));
        }

        for mapping in &self.binary_columns {
            if mapping.true_value == mapping.false_value {
                return Err(PrepError::InvalidConfig(format!(
                    "binary column '{}' maps '{}' to both 1 and 0",
                    mapping.column, mapping.true_value
                )));
            }
        }

        Ok(())
    }

    /// Delimiter as the byte the CSV reader expects
    pub fn delimiter_byte(&self) -> u8 {
        // validate() guarantees ASCII; anything else falls back to a comma
        u8::try_from(self.delimiter).unwrap_or(b',')
    }

    pub fn binary_mapping(&self, column: &str) -> Option<&BinaryMapping> {
        self.binary_columns.iter().find(|m| m.column == column)
    }

    pub fn is_excluded_from_onehot(&self, column: &str) -> bool {
        self.excluded_from_onehot.iter().any(|c| c == column)
    }

    pub fn is_numeric_textual(&self, column: &str) -> bool {
        self.numeric_textual_columns.iter().any(|c| c == column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_telco_defaults() {
        let config = PrepConfig::default();
        assert_eq!(config.target_column, "Churn");
        assert_eq!(config.identifier_column.as_deref(), Some("customerID"));
        assert!(config.is_numeric_textual("TotalCharges"));
        assert!(config.is_excluded_from_onehot("Churn"));

        let gender = config.binary_mapping("gender").unwrap();
        assert_eq!(gender.true_value, "Male");
        assert_eq!(gender.false_value, "Female");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_retarget_drops_old_target_rules() {
        let mut config = PrepConfig::telco();
        config.retarget("Exited");

        assert_eq!(config.target_column, "Exited");
        assert!(config.binary_mapping("Churn").is_none());
        assert!(!config.is_excluded_from_onehot("Churn"));
        assert!(config.binary_mapping("gender").is_some());
    }

    #[test]
    fn test_retarget_same_column_keeps_mapping() {
        let mut config = PrepConfig::telco();
        config.retarget("Churn");
        assert!(config.binary_mapping("Churn").is_some());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let json = r#"{ "target_column": "Exited", "identifier_column": "RowNumber" }"#;
        let config: PrepConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.target_column, "Exited");
        assert_eq!(config.identifier_column.as_deref(), Some("RowNumber"));
        assert_eq!(config.delimiter, ',');
        assert_eq!(config.constant_columns, ConstantColumnPolicy::Error);
    }

    #[test]
    fn test_constant_policy_lowercase_json() {
        let json = r#"{ "constant_columns": "drop" }"#;
        let config: PrepConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.constant_columns, ConstantColumnPolicy::Drop);
    }

    #[test]
    fn test_validate_rejects_identical_binary_values() {
        let mut config = PrepConfig::with_target("y");
        config.binary_columns = vec![BinaryMapping::new("flag", "Y", "Y")];
        assert!(matches!(config.validate(), Err(PrepError::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_rejects_identifier_as_target() {
        let mut config = PrepConfig::with_target("id");
        config.identifier_column = Some("id".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_multibyte_delimiter() {
        let mut config = PrepConfig::with_target("y");
        config.delimiter = '§';
        assert!(matches!(config.validate(), Err(PrepError::InvalidConfig(_))));
    }

    #[test]
    fn test_delimiter_byte() {
        let mut config = PrepConfig::with_target("y");
        config.delimiter = ';';
        assert_eq!(config.delimiter_byte(), b';');
    }
}
