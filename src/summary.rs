//! Pivot-style summarization of report rows.

use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Label of the synthetic total row and column.
pub const TOTAL_KEY: &str = "Total";

/// Dense row by column sum grid with a trailing total column and row.
///
/// Built from (row key, column key, value) observations: values sharing a
/// cell are summed, every observed row key is paired with every observed
/// column key (pairs without observations count zero), and the totals close
/// over both axes. Keys iterate in ascending order; date keys are rendered
/// as `YYYY-MM-DD` strings by the caller, where that order is calendar
/// order too.
#[derive(Debug, Clone)]
pub struct SummaryGrid {
    rows: BTreeMap<String, BTreeMap<String, f64>>,
    row_totals: BTreeMap<String, f64>,
    col_totals: BTreeMap<String, f64>,
    grand_total: f64,
}

impl SummaryGrid {
    pub fn build(observations: impl IntoIterator<Item = (String, String, f64)>) -> SummaryGrid {
        let mut sums: HashMap<String, HashMap<String, f64>> = HashMap::new();
        let mut row_keys: BTreeSet<String> = BTreeSet::new();
        let mut col_keys: BTreeSet<String> = BTreeSet::new();
        for (row, col, value) in observations {
            row_keys.insert(row.clone());
            col_keys.insert(col.clone());
            *sums.entry(row).or_default().entry(col).or_insert(0.0) += value;
        }

        let mut rows: BTreeMap<String, BTreeMap<String, f64>> = BTreeMap::new();
        let mut row_totals: BTreeMap<String, f64> = BTreeMap::new();
        let mut col_totals: BTreeMap<String, f64> = BTreeMap::new();
        let mut grand_total = 0.0;
        for row in &row_keys {
            let observed = sums.get(row.as_str());
            let mut cells: BTreeMap<String, f64> = BTreeMap::new();
            let mut row_total = 0.0;
            for col in &col_keys {
                let value = observed
                    .and_then(|cols| cols.get(col.as_str()))
                    .copied()
                    .unwrap_or(0.0);
                row_total += value;
                *col_totals.entry(col.clone()).or_insert(0.0) += value;
                cells.insert(col.clone(), value);
            }
            grand_total += row_total;
            row_totals.insert(row.clone(), row_total);
            rows.insert(row.clone(), cells);
        }

        SummaryGrid {
            rows,
            row_totals,
            col_totals,
            grand_total,
        }
    }

    /// Cell lookup. [`TOTAL_KEY`] addresses the synthetic row and column,
    /// so `value(TOTAL_KEY, TOTAL_KEY)` is the grand total.
    pub fn value(&self, row: &str, col: &str) -> f64 {
        match (row == TOTAL_KEY, col == TOTAL_KEY) {
            (true, true) => self.grand_total,
            (true, false) => self.col_totals.get(col).copied().unwrap_or(0.0),
            (false, true) => self.row_totals.get(row).copied().unwrap_or(0.0),
            (false, false) => self
                .rows
                .get(row)
                .and_then(|cells| cells.get(col))
                .copied()
                .unwrap_or(0.0),
        }
    }

    pub fn grand_total(&self) -> f64 {
        self.grand_total
    }

    /// Data row keys in ascending order, total row excluded.
    pub fn row_keys(&self) -> impl Iterator<Item = &str> {
        self.rows.keys().map(String::as_str)
    }

    /// Data column keys in ascending order, total column excluded.
    pub fn col_keys(&self) -> impl Iterator<Item = &str> {
        self.col_totals.keys().map(String::as_str)
    }

    pub fn data_row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn data_col_count(&self) -> usize {
        self.col_totals.len()
    }
}
