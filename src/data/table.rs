//! Normalized Table Module
//! Cleaned, metric-augmented results held in a Polars DataFrame.

use crate::data::RawTable;
use polars::prelude::*;
use std::collections::BTreeSet;

/// Output of normalization: unique column names, numeric signal columns as
/// `Float64`, and the division flag that says whether derived metrics exist.
#[derive(Debug, Clone)]
pub struct NormalizedTable {
    df: DataFrame,
    has_divisions: bool,
}

impl NormalizedTable {
    pub fn new(df: DataFrame, has_divisions: bool) -> Self {
        Self { df, has_divisions }
    }

    pub fn dataframe(&self) -> &DataFrame {
        &self.df
    }

    /// Whether the division schema was detected and derived columns added.
    pub fn has_divisions(&self) -> bool {
        self.has_divisions
    }

    pub fn height(&self) -> usize {
        self.df.height()
    }

    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }

    pub fn column_names(&self) -> Vec<String> {
        self.df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.df.column(name).is_ok()
    }

    /// Numeric values of a column; absent columns and nulls read as zero.
    pub fn numeric_column(&self, name: &str) -> Vec<f64> {
        let height = self.df.height();
        let Ok(column) = self.df.column(name) else {
            return vec![0.0; height];
        };
        let Ok(as_f64) = column.cast(&DataType::Float64) else {
            return vec![0.0; height];
        };

        match as_f64.f64() {
            Ok(ca) => ca.into_iter().map(|v| v.unwrap_or(0.0)).collect(),
            Err(_) => vec![0.0; height],
        }
    }

    /// Element-wise sum of several columns, absent ones contributing zero.
    pub fn sum_columns<S: AsRef<str>>(&self, names: &[S]) -> Vec<f64> {
        let mut total = vec![0.0; self.df.height()];
        for name in names {
            for (acc, v) in total.iter_mut().zip(self.numeric_column(name.as_ref())) {
                *acc += v;
            }
        }
        total
    }

    /// Sum of one column over all rows.
    pub fn column_total(&self, name: &str) -> f64 {
        self.numeric_column(name).iter().sum()
    }

    /// Text values of a column; absent columns read as all-missing.
    pub fn text_column(&self, name: &str) -> Vec<Option<String>> {
        let height = self.df.height();
        let Ok(column) = self.df.column(name) else {
            return vec![None; height];
        };
        let Ok(as_text) = column.cast(&DataType::String) else {
            return vec![None; height];
        };

        match as_text.as_materialized_series().str() {
            Ok(ca) => ca.into_iter().map(|v| v.map(str::to_string)).collect(),
            Err(_) => vec![None; height],
        }
    }

    /// Sorted distinct non-empty values of a text column.
    pub fn unique_values(&self, name: &str) -> Vec<String> {
        self.text_column(name)
            .into_iter()
            .flatten()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Keep the rows whose mask entry is true.
    pub fn filter_rows(&self, mask: &[bool]) -> PolarsResult<NormalizedTable> {
        let mask = BooleanChunked::from_slice("mask".into(), mask);
        let df = self.df.filter(&mask)?;
        Ok(Self::new(df, self.has_divisions))
    }

    /// Same rows with a replaced frame, keeping the schema flag.
    pub fn with_dataframe(&self, df: DataFrame) -> NormalizedTable {
        Self::new(df, self.has_divisions)
    }

    /// Render back to an untyped grid, e.g. to feed it through normalization again.
    ///
    /// Floats use Rust's shortest round-trip formatting so re-parsing is exact.
    pub fn to_raw(&self) -> RawTable {
        let headers = self.column_names();
        let columns: Vec<Vec<Option<String>>> = self
            .df
            .get_columns()
            .iter()
            .map(|column| {
                let name = column.name().as_str();
                if matches!(column.dtype(), DataType::Float64) {
                    self.numeric_column(name)
                        .into_iter()
                        .map(|v| Some(v.to_string()))
                        .collect()
                } else {
                    self.text_column(name)
                }
            })
            .collect();

        let rows = (0..self.df.height())
            .map(|i| columns.iter().map(|col| col[i].clone()).collect())
            .collect();

        RawTable::new(headers, rows)
    }
}
