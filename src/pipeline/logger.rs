//! Stage logging
//!
//! Stages never touch a global logger. The caller creates a
//! [`PipelineLogger`] and passes it into every stage, so it owns the
//! logger's lifetime and can swap the sink (tracing, in-memory capture).

use std::fmt;
use std::sync::Mutex;

/// Pipeline stage that emitted a log record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Load,
    Clean,
    Encode,
    Scale,
    Split,
    Pipeline,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Load => "load",
            Stage::Clean => "clean",
            Stage::Encode => "encode",
            Stage::Scale => "scale",
            Stage::Split => "split",
            Stage::Pipeline => "pipeline",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warn,
}

/// Sink for stage observations. Drops and substitutions are reported here.
pub trait PipelineLogger: Send + Sync {
    fn log(&self, level: Level, stage: Stage, message: &str);

    fn info(&self, stage: Stage, message: &str) {
        self.log(Level::Info, stage, message);
    }

    fn warn(&self, stage: Stage, message: &str) {
        self.log(Level::Warn, stage, message);
    }
}

/// Forwards records to `tracing`, tagged with the stage and an optional dataset label
#[derive(Debug, Clone, Default)]
pub struct TracingLogger {
    dataset: Option<String>,
}

impl TracingLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tag every record with a dataset label (used in batch mode)
    pub fn for_dataset(dataset: impl Into<String>) -> Self {
        Self {
            dataset: Some(dataset.into()),
        }
    }
}

impl PipelineLogger for TracingLogger {
    fn log(&self, level: Level, stage: Stage, message: &str) {
        let dataset = self.dataset.as_deref().unwrap_or("-");
        match level {
            Level::Info => tracing::info!(%stage, dataset, "{}", message),
            Level::Warn => tracing::warn!(%stage, dataset, "{}", message),
        }
    }
}

/// One captured log record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub level: Level,
    pub stage: Stage,
    pub message: String,
}

/// Keeps every record in memory
#[derive(Debug, Default)]
pub struct RecordingLogger {
    records: Mutex<Vec<LogRecord>>,
}

impl RecordingLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<LogRecord> {
        self.records
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    /// Warnings emitted by one stage
    pub fn warnings(&self, stage: Stage) -> Vec<String> {
        self.records()
            .into_iter()
            .filter(|r| r.level == Level::Warn && r.stage == stage)
            .map(|r| r.message)
            .collect()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.records().iter().any(|r| r.message.contains(needle))
    }
}

impl PipelineLogger for RecordingLogger {
    fn log(&self, level: Level, stage: Stage, message: &str) {
        if let Ok(mut records) = self.records.lock() {
            records.push(LogRecord {
                level,
                stage,
                message: message.to_string(),
            });
        }
    }
}

/// Discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLogger;

impl PipelineLogger for NullLogger {
    fn log(&self, _level: Level, _stage: Stage, _message: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_logger_captures_levels() {
        let logger = RecordingLogger::new();
        logger.info(Stage::Clean, "trimmed");
        logger.warn(Stage::Scale, "dropped 'x'");

        let records = logger.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].level, Level::Info);
        assert_eq!(logger.warnings(Stage::Scale), vec!["dropped 'x'".to_string()]);
        assert!(logger.warnings(Stage::Clean).is_empty());
        assert!(logger.contains("trimmed"));
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::Encode.to_string(), "encode");
        assert_eq!(Stage::Pipeline.to_string(), "pipeline");
    }

    #[test]
    fn test_logger_usable_as_trait_object() {
        let logger: Box<dyn PipelineLogger> = Box::new(NullLogger);
        logger.warn(Stage::Load, "ignored");
    }
}
