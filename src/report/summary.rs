//! Preparation summary report generation

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, Color, Table};
use console::style;

use crate::pipeline::cleaner::CleanReport;
use crate::pipeline::encoder::EncodeReport;
use crate::pipeline::scaler::ScaleReport;

/// Summary of one preparation run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreparationSummary {
    pub input_rows: usize,
    pub input_columns: usize,
    pub dropped_identifier: Vec<String>,
    pub dropped_empty_rows: usize,
    pub dropped_incomplete_rows: usize,
    pub dropped_missing_target_rows: usize,
    pub blank_to_missing: usize,
    pub binary_encoded: Vec<String>,
    pub onehot_encoded: Vec<String>,
    pub indicator_columns: usize,
    pub unseen_categories: usize,
    pub dropped_missing_columns: Vec<String>,
    pub dropped_constant_columns: Vec<String>,
    pub imputed_cells: usize,
    pub final_rows: usize,
    pub final_features: usize,
}

impl PreparationSummary {
    pub fn new(input_rows: usize, input_columns: usize) -> Self {
        Self {
            input_rows,
            input_columns,
            ..Default::default()
        }
    }

    pub fn record_clean(&mut self, report: &CleanReport) {
        self.dropped_identifier = report.dropped_columns.clone();
        self.dropped_empty_rows = report.dropped_empty_rows;
        self.dropped_incomplete_rows = report.dropped_incomplete_rows;
        self.blank_to_missing = report.blank_to_missing + report.unparsable_to_missing;
    }

    pub fn record_encode(&mut self, report: &EncodeReport) {
        self.binary_encoded = report.binary_encoded.clone();
        self.onehot_encoded = report.onehot_encoded.clone();
        self.indicator_columns = report.indicator_columns.len();
        self.unseen_categories = report.unseen_values;
    }

    pub fn record_scale(&mut self, report: &ScaleReport) {
        self.dropped_missing_columns = report.dropped_missing_columns.clone();
        self.dropped_constant_columns = report.dropped_constant_columns.clone();
        self.imputed_cells = report.imputed_cells;
    }

    /// Record the final feature matrix shape
    pub fn finish(&mut self, shape: (usize, usize)) {
        self.final_rows = shape.0;
        self.final_features = shape.1;
    }

    pub fn dropped_rows(&self) -> usize {
        self.dropped_empty_rows + self.dropped_incomplete_rows + self.dropped_missing_target_rows
    }

    fn dropped_columns(&self) -> usize {
        self.dropped_missing_columns.len() + self.dropped_constant_columns.len()
    }

    /// The metrics table as plain text
    pub fn render_table(&self) -> String {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(vec![
            Cell::new("Metric").add_attribute(Attribute::Bold),
            Cell::new("Value").add_attribute(Attribute::Bold),
        ]);

        let warn_if = |count: usize| if count == 0 { Color::White } else { Color::Yellow };

        table.add_row(vec![
            Cell::new("Input Shape"),
            Cell::new(format!("({}, {})", self.input_rows, self.input_columns)),
        ]);
        table.add_row(vec![
            Cell::new("Dropped Rows"),
            Cell::new(self.dropped_rows()).fg(warn_if(self.dropped_rows())),
        ]);
        table.add_row(vec![
            Cell::new("Binary Encoded"),
            Cell::new(self.binary_encoded.len()),
        ]);
        table.add_row(vec![
            Cell::new("One-Hot Encoded"),
            Cell::new(format!(
                "{} -> {} indicators",
                self.onehot_encoded.len(),
                self.indicator_columns
            )),
        ]);
        table.add_row(vec![
            Cell::new("Imputed Cells"),
            Cell::new(self.imputed_cells).fg(warn_if(self.imputed_cells)),
        ]);
        table.add_row(vec![
            Cell::new("Dropped Columns"),
            Cell::new(self.dropped_columns()).fg(warn_if(self.dropped_columns())),
        ]);
        table.add_row(vec![
            Cell::new("Final Shape"),
            Cell::new(format!("({}, {})", self.final_rows, self.final_features))
                .fg(Color::Green)
                .add_attribute(Attribute::Bold),
        ]);

        table.to_string()
    }

    pub fn display(&self) {
        println!();
        println!("    {}", style("PREPARATION SUMMARY").white().bold());
        println!("    {}", style("─".repeat(50)).dim());
        println!();

        // Indent the table
        for line in self.render_table().lines() {
            println!("    {}", line);
        }

        if self.dropped_columns() > 0 || !self.dropped_identifier.is_empty() {
            println!();
            println!("    {}", style("DROPPED COLUMNS").white().bold());
            println!("    {}", style("─".repeat(50)).dim());

            let groups = [
                ("Identifier", &self.dropped_identifier),
                ("Fully Missing", &self.dropped_missing_columns),
                ("Zero Variance", &self.dropped_constant_columns),
            ];
            for (label, columns) in groups {
                if columns.is_empty() {
                    continue;
                }
                println!();
                println!(
                    "      {} {}:",
                    style(label).yellow(),
                    style(format!("({})", columns.len())).dim()
                );
                for column in columns {
                    println!("        {} {}", style("•").dim(), column);
                }
            }
        }
    }
}
