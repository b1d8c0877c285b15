//! Data Processor Module
//! Cleans a raw sheet export and derives totals and rates (normalization).

use crate::data::schema::{self, Division, Part};
use crate::data::{NormalizedTable, RawTable};
use polars::prelude::*;
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tracing::{debug, error, info, warn};

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
}

/// Cell storage for one column while the pipeline runs.
#[derive(Debug, Clone, PartialEq)]
enum Cells {
    Text(Vec<Option<String>>),
    Numeric(Vec<f64>),
}

#[derive(Debug, Clone)]
struct Field {
    name: String,
    cells: Cells,
}

/// Working set of columns; all columns have `height` cells.
struct Frame {
    fields: Vec<Field>,
    height: usize,
}

impl Frame {
    fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    fn numeric(&self, name: &str) -> Vec<f64> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .and_then(|f| match &f.cells {
                Cells::Numeric(values) => Some(values.clone()),
                Cells::Text(_) => None,
            })
            .unwrap_or_else(|| vec![0.0; self.height])
    }

    /// Sum of the named columns; absent columns contribute zero.
    fn sum(&self, names: &[String]) -> Vec<f64> {
        let mut total = vec![0.0; self.height];
        for name in names {
            for (acc, v) in total.iter_mut().zip(self.numeric(name)) {
                *acc += v;
            }
        }
        total
    }

    /// Replace a column's values in place, or append it.
    fn upsert(&mut self, name: &str, values: Vec<f64>) {
        match self.fields.iter_mut().find(|f| f.name == name) {
            Some(field) => field.cells = Cells::Numeric(values),
            None => self.fields.push(Field {
                name: name.to_string(),
                cells: Cells::Numeric(values),
            }),
        }
    }

    fn insert_if_absent(&mut self, name: &str, values: impl FnOnce(&Frame) -> Vec<f64>) {
        if !self.contains(name) {
            let values = values(&*self);
            debug!(column = name, "derived column added");
            self.upsert(name, values);
        }
    }

    fn into_dataframe(self) -> PolarsResult<DataFrame> {
        let columns = self
            .fields
            .into_iter()
            .map(|field| match field.cells {
                Cells::Text(values) => Column::new(field.name.into(), values),
                Cells::Numeric(values) => Column::new(field.name.into(), values),
            })
            .collect();
        DataFrame::new(columns)
    }
}

/// Suffix later occurrences of a repeated header with `_1`, `_2`, ...
///
/// The first occurrence keeps its name; a suffix already used by another
/// header is skipped so the result is always unique.
pub fn dedup_names(names: &[String]) -> Vec<String> {
    let mut taken: HashSet<String> = names.iter().cloned().collect();
    let mut seen: HashMap<&str, usize> = HashMap::new();

    names
        .iter()
        .map(|name| {
            let count = seen.entry(name.as_str()).or_insert(0);
            *count += 1;
            if *count == 1 {
                return name.clone();
            }

            let mut n = *count - 1;
            let mut candidate = format!("{name}_{n}");
            while taken.contains(&candidate) {
                n += 1;
                candidate = format!("{name}_{n}");
            }
            *count = n + 1;
            taken.insert(candidate.clone());
            candidate
        })
        .collect()
}

/// Lossy number parse: blanks, text and non-finite values become zero.
pub fn parse_number(cell: Option<&str>) -> f64 {
    cell.and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Round to two decimal places; never returns negative zero.
pub fn round2(value: f64) -> f64 {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// `numerator / denominator * 100` clamped to [0, 100] and rounded, or zero
/// when the denominator is not positive.
///
/// Sheets may carry a registered total smaller than the division sum, or
/// negative counts.
fn percentage(numerator: &[f64], denominator: &[f64]) -> Vec<f64> {
    numerator
        .iter()
        .zip(denominator)
        .map(|(&n, &d)| {
            if d > 0.0 {
                round2((n / d * 100.0).clamp(0.0, 100.0))
            } else {
                0.0
            }
        })
        .collect()
}

fn division_columns(divisions: &[Division], part: Part) -> Vec<String> {
    divisions.iter().map(|d| d.column(part)).collect()
}

/// Turns raw sheet exports into normalized tables.
pub struct Normalizer;

impl Normalizer {
    /// Normalize a raw table; no input means no output.
    ///
    /// A failure while assembling the frame is logged and reported as "no data".
    pub fn normalize(raw: Option<&RawTable>) -> Option<NormalizedTable> {
        let raw = raw?;
        match Self::try_normalize(raw) {
            Ok(table) => Some(table),
            Err(e) => {
                error!(error = %e, "normalization failed");
                None
            }
        }
    }

    /// Run the full pipeline on one raw table.
    pub fn try_normalize(raw: &RawTable) -> Result<NormalizedTable, ProcessorError> {
        let mut frame = Self::prune_and_coerce(raw);

        let has_divisions =
            schema::has_division_schema(frame.fields.iter().map(|f| f.name.as_str()));

        if has_divisions {
            Self::rename_columns(&mut frame);
            Self::complete_divisions(&mut frame);
            Self::derive_totals(&mut frame);
            Self::derive_rates(&mut frame);
        } else {
            info!("no division columns detected; passing table through");
        }

        info!(
            rows = frame.height,
            columns = frame.fields.len(),
            has_divisions,
            "table normalized"
        );
        let df = frame.into_dataframe()?;
        Ok(NormalizedTable::new(df, has_divisions))
    }

    /// Drop blank rows, dedup headers and coerce numeric signal columns.
    fn prune_and_coerce(raw: &RawTable) -> Frame {
        let kept: Vec<usize> = raw
            .rows()
            .iter()
            .enumerate()
            .filter(|(_, row)| row.iter().any(Option::is_some))
            .map(|(i, _)| i)
            .collect();

        let pruned = raw.row_count() - kept.len();
        if pruned > 0 {
            debug!(pruned, "removed blank rows");
        }

        let names = dedup_names(raw.headers());
        let rows = raw.rows();

        let fields: Vec<Field> = names
            .into_par_iter()
            .enumerate()
            .map(|(col_idx, name)| {
                let cells = kept.iter().map(|&row_idx| rows[row_idx][col_idx].as_deref());
                let cells = if schema::is_numeric_column(&name) {
                    Cells::Numeric(cells.map(parse_number).collect())
                } else {
                    Cells::Text(cells.map(|c| c.map(str::to_string)).collect())
                };
                Field { name, cells }
            })
            .collect();

        Frame {
            fields,
            height: kept.len(),
        }
    }

    /// Apply the canonical rename rules without ever creating a duplicate name.
    ///
    /// A header whose canonical target is already taken keeps its raw name.
    fn rename_columns(frame: &mut Frame) {
        let mut taken: HashSet<String> = frame.fields.iter().map(|f| f.name.clone()).collect();

        for field in frame.fields.iter_mut() {
            let Some(target) = schema::canonical_name(&field.name) else {
                continue;
            };
            if target == field.name {
                continue;
            }
            if taken.contains(&target) {
                warn!(
                    column = %field.name,
                    target = %target,
                    "canonical column already present; keeping raw header"
                );
                continue;
            }

            debug!(from = %field.name, to = %target, "renamed column");
            taken.remove(&field.name);
            taken.insert(target.clone());
            field.name = target;
        }
    }

    /// Materialize every `Division {d} - {part}` column.
    ///
    /// Missing gender columns are zero; a missing total is boys plus girls.
    fn complete_divisions(frame: &mut Frame) {
        for division in Division::ALL {
            for part in [Part::Boys, Part::Girls] {
                let height = frame.height;
                frame.insert_if_absent(&division.column(part), |_| vec![0.0; height]);
            }
            frame.insert_if_absent(&division.column(Part::Total), |f| {
                f.sum(&[division.column(Part::Boys), division.column(Part::Girls)])
            });
        }
    }

    fn derive_totals(frame: &mut Frame) {
        for part in Part::ALL {
            frame.insert_if_absent(part.registered_column(), |f| {
                f.sum(&division_columns(&Division::ALL, part))
            });
        }
        frame.insert_if_absent(schema::PASSED_TOTAL, |f| {
            f.sum(&division_columns(&Division::PASSING, Part::Total))
        });
        frame.insert_if_absent(schema::FAILED_TOTAL, |f| {
            f.sum(&division_columns(&Division::FAILING, Part::Total))
        });
    }

    /// Rates are recomputed even when the sheet already carries them.
    fn derive_rates(frame: &mut Frame) {
        let registered = frame.numeric(schema::REGISTERED_TOTAL);
        let passed = frame.numeric(schema::PASSED_TOTAL);
        let first = frame.numeric(&Division::One.column(Part::Total));
        let strong = frame.sum(&division_columns(
            &[Division::One, Division::Two, Division::Three],
            Part::Total,
        ));

        let boys_rate = percentage(
            &frame.sum(&division_columns(&Division::PASSING, Part::Boys)),
            &frame.numeric(schema::REGISTERED_BOYS),
        );
        let girls_rate = percentage(
            &frame.sum(&division_columns(&Division::PASSING, Part::Girls)),
            &frame.numeric(schema::REGISTERED_GIRLS),
        );
        let gap = boys_rate
            .iter()
            .zip(&girls_rate)
            .map(|(b, g)| round2(b - g))
            .collect();

        frame.upsert(schema::PASS_RATE, percentage(&passed, &registered));
        frame.upsert(schema::EXCELLENCE_RATE, percentage(&first, &registered));
        frame.upsert(
            schema::STRONG_PERFORMANCE_RATE,
            percentage(&strong, &registered),
        );
        frame.upsert(schema::BOYS_PASS_RATE, boys_rate);
        frame.upsert(schema::GIRLS_PASS_RATE, girls_rate);
        frame.upsert(schema::GENDER_GAP, gap);
    }
}
