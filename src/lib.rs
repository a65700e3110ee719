//! tabprep: Tabular Data Preparation Library
//!
//! Cleans, encodes and standardizes a raw customer table into a numeric
//! feature matrix and a target vector. Parameters learned on training data
//! can be saved and applied to new records.

pub mod cli;
pub mod error;
pub mod pipeline;
pub mod report;
pub mod utils;

pub use error::{PrepError, Result};
