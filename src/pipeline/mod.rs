//! Pipeline module - orchestrates the preparation stages

pub mod cleaner;
pub mod config;
pub mod encoder;
pub mod export;
pub mod loader;
pub mod logger;
pub mod prepare;
pub mod scaler;
pub mod split;
pub mod table;

pub use cleaner::{clean, CleanReport};
pub use config::{ConstantColumnPolicy, PrepConfig};
pub use encoder::{encode, encode_with_levels, BinaryMapping, CategoryLevels, EncodeReport};
pub use export::{save_dataframe, save_prepared, OutputFormat};
pub use loader::{column_names, load_table, read_csv};
pub use logger::{Level, LogRecord, NullLogger, PipelineLogger, RecordingLogger, Stage, TracingLogger};
pub use prepare::{FeatureMatrix, FittedParameters, Pipeline, PreparedData, TargetVector};
pub use scaler::{apply_scaling, scale, ScaleReport, ScalerParameters};
pub use split::{train_test_split, DEFAULT_SEED};
pub use table::{Column, ColumnData, ColumnDescriptor, ColumnKind, EncodingRule, Table};
