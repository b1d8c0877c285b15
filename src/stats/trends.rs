//! Year-over-year trends grouped on the `Year` column.

use super::calculator::DivisionCount;
use super::filter::parse_year;
use crate::data::schema::{self, Division, Part};
use crate::data::NormalizedTable;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Divisions shown in the per-year distribution.
const TREND_DIVISIONS: [Division; 5] = [
    Division::One,
    Division::Two,
    Division::Three,
    Division::Four,
    Division::U,
];

/// Aggregates for one examination year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearlyTrend {
    pub year: i64,
    pub registered_total: f64,
    pub registered_boys: f64,
    pub registered_girls: f64,
    pub pass_rate: f64,
    pub boys_pass_rate: f64,
    pub girls_pass_rate: f64,
    pub excellence_rate: f64,
    pub divisions: Vec<DivisionCount>,
    /// Change in registrations vs the previous year, in percent.
    pub registration_growth_pct: Option<f64>,
    /// Pass-rate difference vs the previous year, in percentage points.
    pub pass_rate_change: Option<f64>,
    pub excellence_change: Option<f64>,
}

#[derive(Default)]
struct YearAccumulator {
    rows: usize,
    registered: [f64; 3],
    rates: [f64; 4],
    divisions: [f64; 5],
}

/// Sums and means per year, ascending, with changes against the prior year.
///
/// Returns nothing when the table has no `Year` column; rows whose year
/// does not parse are skipped.
pub fn yearly_trends(table: &NormalizedTable) -> Vec<YearlyTrend> {
    if !table.has_column(schema::YEAR) {
        debug!("no Year column; trends unavailable");
        return Vec::new();
    }

    let years = table.text_column(schema::YEAR);
    let registered: Vec<Vec<f64>> = [Part::Total, Part::Boys, Part::Girls]
        .iter()
        .map(|part| table.numeric_column(part.registered_column()))
        .collect();
    let rates: Vec<Vec<f64>> = [
        schema::PASS_RATE,
        schema::BOYS_PASS_RATE,
        schema::GIRLS_PASS_RATE,
        schema::EXCELLENCE_RATE,
    ]
    .iter()
    .map(|name| table.numeric_column(name))
    .collect();
    let divisions: Vec<Vec<f64>> = TREND_DIVISIONS
        .iter()
        .map(|d| table.numeric_column(&d.column(Part::Total)))
        .collect();

    let mut by_year: BTreeMap<i64, YearAccumulator> = BTreeMap::new();
    for (row, cell) in years.iter().enumerate() {
        let Some(year) = cell.as_deref().and_then(parse_year) else {
            continue;
        };
        let acc = by_year.entry(year).or_default();
        acc.rows += 1;
        for (slot, column) in acc.registered.iter_mut().zip(&registered) {
            *slot += column[row];
        }
        for (slot, column) in acc.rates.iter_mut().zip(&rates) {
            *slot += column[row];
        }
        for (slot, column) in acc.divisions.iter_mut().zip(&divisions) {
            *slot += column[row];
        }
    }

    let mut trends: Vec<YearlyTrend> = Vec::with_capacity(by_year.len());
    for (year, acc) in by_year {
        let n = acc.rows as f64;
        let [registered_total, registered_boys, registered_girls] = acc.registered;
        let [pass_rate, boys_pass_rate, girls_pass_rate, excellence_rate] = acc.rates.map(|s| s / n);

        let (registration_growth_pct, pass_rate_change, excellence_change) = match trends.last() {
            Some(prev) => (
                (prev.registered_total != 0.0).then(|| {
                    (registered_total - prev.registered_total) / prev.registered_total * 100.0
                }),
                Some(pass_rate - prev.pass_rate),
                Some(excellence_rate - prev.excellence_rate),
            ),
            None => (None, None, None),
        };

        trends.push(YearlyTrend {
            year,
            registered_total,
            registered_boys,
            registered_girls,
            pass_rate,
            boys_pass_rate,
            girls_pass_rate,
            excellence_rate,
            divisions: TREND_DIVISIONS
                .iter()
                .zip(acc.divisions)
                .map(|(&division, count)| DivisionCount {
                    division,
                    label: division.name().to_string(),
                    count,
                })
                .collect(),
            registration_growth_pct,
            pass_rate_change,
            excellence_change,
        });
    }

    trends
}
