//! Seeded train/test row split

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::{PrepError, Result};

use super::logger::{PipelineLogger, Stage};
use super::table::Table;

/// Seed used when the caller does not pick one
pub const DEFAULT_SEED: u64 = 42;

/// Split rows into (train, test) partitions.
///
/// The test partition holds `ceil(rows * test_size)` randomly chosen rows;
/// both partitions keep the original relative row order. The same seed
/// always yields the same partition.
pub fn train_test_split(
    table: &Table,
    test_size: f64,
    seed: u64,
    logger: &dyn PipelineLogger,
) -> Result<(Table, Table)> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(PrepError::InvalidConfig(format!(
            "test size must be between 0 and 1 (exclusive), got {}",
            test_size
        )));
    }

    let rows = table.height();
    let n_test = (rows as f64 * test_size).ceil() as usize;
    if rows < 2 || n_test >= rows {
        return Err(PrepError::InvalidConfig(format!(
            "cannot split {} row(s) with test size {}",
            rows, test_size
        )));
    }

    let mut indices: Vec<usize> = (0..rows).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let mut test_rows = indices[..n_test].to_vec();
    let mut train_rows = indices[n_test..].to_vec();
    test_rows.sort_unstable();
    train_rows.sort_unstable();

    logger.info(
        Stage::Split,
        &format!(
            "Split dataset: train={} rows, test={} rows (seed {})",
            train_rows.len(),
            test_rows.len(),
            seed
        ),
    );

    Ok((table.select_rows(&train_rows), table.select_rows(&test_rows)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::logger::NullLogger;
    use crate::pipeline::table::Column;

    fn numbered(rows: usize) -> Table {
        Table::new(vec![Column::numeric(
            "row",
            (0..rows).map(|i| Some(i as f64)).collect(),
        )])
        .unwrap()
    }

    fn row_ids(table: &Table) -> Vec<f64> {
        table
            .column("row")
            .unwrap()
            .data
            .as_numeric()
            .unwrap()
            .iter()
            .map(|v| v.unwrap())
            .collect()
    }

    #[test]
    fn test_split_sizes() {
        let (train, test) = train_test_split(&numbered(10), 0.2, DEFAULT_SEED, &NullLogger).unwrap();
        assert_eq!(train.height(), 8);
        assert_eq!(test.height(), 2);
    }

    #[test]
    fn test_split_rounds_test_size_up() {
        let (train, test) = train_test_split(&numbered(7), 0.2, 1, &NullLogger).unwrap();
        assert_eq!(test.height(), 2);
        assert_eq!(train.height(), 5);
    }

    #[test]
    fn test_split_partitions_rows_in_order() {
        let (train, test) = train_test_split(&numbered(20), 0.25, 7, &NullLogger).unwrap();
        let mut all: Vec<f64> = row_ids(&train);
        all.extend(row_ids(&test));
        all.sort_by(|a, b| a.total_cmp(b));
        assert_eq!(all, (0..20).map(|i| i as f64).collect::<Vec<_>>());

        let train_ids = row_ids(&train);
        assert!(train_ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_split_is_deterministic_per_seed() {
        let table = numbered(50);
        let (_, a) = train_test_split(&table, 0.3, 42, &NullLogger).unwrap();
        let (_, b) = train_test_split(&table, 0.3, 42, &NullLogger).unwrap();
        assert_eq!(row_ids(&a), row_ids(&b));
    }

    #[test]
    fn test_split_rejects_bad_test_size() {
        assert!(train_test_split(&numbered(10), 0.0, 1, &NullLogger).is_err());
        assert!(train_test_split(&numbered(10), 1.0, 1, &NullLogger).is_err());
        assert!(train_test_split(&numbered(10), f64::NAN, 1, &NullLogger).is_err());
    }

    #[test]
    fn test_split_rejects_tiny_tables() {
        assert!(train_test_split(&numbered(1), 0.5, 1, &NullLogger).is_err());
    }
}
