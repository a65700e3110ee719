//! The `inspect` command: show how each column would be treated

use std::path::Path;

use anyhow::{Context, Result};
use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, Color, Table as DisplayTable};

use crate::pipeline::{EncodingRule, NullLogger, Pipeline, PrepConfig, Table};

pub fn run_inspect(input: &Path, config: PrepConfig) -> Result<()> {
    let pipeline = Pipeline::new(config, &NullLogger)?;
    let table = pipeline
        .load(input)
        .with_context(|| format!("Failed to load {}", input.display()))?;

    println!();
    println!("    {} rows x {} columns", table.height(), table.width());
    for line in render_columns(&table, pipeline.config()).lines() {
        println!("    {}", line);
    }
    println!();
    Ok(())
}

/// Column name, kind, encoding and missing count as a text table
pub fn render_columns(table: &Table, config: &PrepConfig) -> String {
    let mut display = DisplayTable::new();
    display.load_preset(UTF8_FULL_CONDENSED);
    display.set_header(vec![
        Cell::new("Column").add_attribute(Attribute::Bold),
        Cell::new("Kind").add_attribute(Attribute::Bold),
        Cell::new("Encoding").add_attribute(Attribute::Bold),
        Cell::new("Missing").add_attribute(Attribute::Bold),
    ]);

    for (descriptor, column) in table.descriptors(config).iter().zip(table.columns()) {
        let encoding = match &descriptor.encoding {
            Some(EncodingRule::Binary(m)) => format!("{} = 1, {} = 0", m.true_value, m.false_value),
            Some(EncodingRule::OneHot { drop_first: true }) => "one-hot (drop first)".to_string(),
            Some(EncodingRule::OneHot { drop_first: false }) => "one-hot".to_string(),
            None => "-".to_string(),
        };
        let missing = column.data.null_count();
        display.add_row(vec![
            Cell::new(&descriptor.name),
            Cell::new(descriptor.kind.label()),
            Cell::new(encoding),
            Cell::new(missing).fg(if missing == 0 { Color::White } else { Color::Yellow }),
        ]);
    }

    display.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{Column, ColumnKind};

    #[test]
    fn test_render_columns_lists_kinds() {
        let config = PrepConfig::default();
        let table = Table::new(vec![
            Column::text("customerID", vec![Some("a".to_string())]),
            Column::text("Contract", vec![Some("Month-to-month".to_string())]),
            Column::numeric("tenure", vec![None]),
        ])
        .unwrap()
        .classify(&config);

        let rendered = render_columns(&table, &config);
        assert!(rendered.contains("customerID"));
        assert!(rendered.contains(ColumnKind::Identifier.label()));
        assert!(rendered.contains("one-hot"));
    }
}
