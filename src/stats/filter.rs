//! Row Filter Module
//! Year, region and district selections applied before any aggregate.

use super::AnalysisError;
use crate::data::schema::{self, Division, Part};
use crate::data::NormalizedTable;
use polars::prelude::*;
use serde::Serialize;
use tracing::debug;

/// Which head-counts the dashboard views report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum GenderMode {
    #[default]
    All,
    BoysOnly,
    GirlsOnly,
}

impl GenderMode {
    pub fn part(self) -> Part {
        match self {
            GenderMode::All => Part::Total,
            GenderMode::BoysOnly => Part::Boys,
            GenderMode::GirlsOnly => Part::Girls,
        }
    }

    pub fn pass_rate_column(self) -> &'static str {
        match self {
            GenderMode::All => schema::PASS_RATE,
            GenderMode::BoysOnly => schema::BOYS_PASS_RATE,
            GenderMode::GirlsOnly => schema::GIRLS_PASS_RATE,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            GenderMode::All => "All",
            GenderMode::BoysOnly => "Boys Only",
            GenderMode::GirlsOnly => "Girls Only",
        }
    }
}

/// User selections; `None`/empty means "All".
#[derive(Debug, Clone, PartialEq)]
pub struct FilterSelection {
    pub years: Vec<i64>,
    pub gender: GenderMode,
    pub sub_region: Option<String>,
    pub zone: Option<String>,
    pub district: Option<String>,
    /// Divisions counted in the "selected grades" total.
    pub divisions: Vec<Division>,
}

impl Default for FilterSelection {
    fn default() -> Self {
        Self {
            years: Vec::new(),
            gender: GenderMode::All,
            sub_region: None,
            zone: None,
            district: None,
            divisions: Division::PASSING.to_vec(),
        }
    }
}

/// Year cell as an integer; accepts `2024` and `2024.0`.
pub fn parse_year(text: &str) -> Option<i64> {
    let value: f64 = text.trim().parse().ok()?;
    (value.is_finite() && value.fract() == 0.0).then_some(value as i64)
}

impl FilterSelection {
    /// Keep the rows matching every active filter.
    ///
    /// A filter on a column the table does not have is ignored.
    pub fn apply(&self, table: &NormalizedTable) -> Result<NormalizedTable, AnalysisError> {
        let mut filtered = if !self.years.is_empty() && table.has_column(schema::YEAR) {
            let mask: Vec<bool> = table
                .text_column(schema::YEAR)
                .iter()
                .map(|cell| {
                    cell.as_deref()
                        .and_then(parse_year)
                        .is_some_and(|year| self.years.contains(&year))
                })
                .collect();
            table.filter_rows(&mask)?
        } else {
            table.clone()
        };

        let exact_matches = [
            (schema::SUB_REGION, &self.sub_region),
            (schema::ZONE, &self.zone),
            (schema::DISTRICT, &self.district),
        ];
        for (column, wanted) in exact_matches {
            let Some(wanted) = wanted else {
                continue;
            };
            if !filtered.has_column(column) {
                continue;
            }

            let df = filtered
                .dataframe()
                .clone()
                .lazy()
                .filter(col(column).eq(lit(wanted.as_str())))
                .collect()?;
            filtered = filtered.with_dataframe(df);
        }

        debug!(
            before = table.height(),
            after = filtered.height(),
            "filters applied"
        );
        Ok(filtered)
    }
}
