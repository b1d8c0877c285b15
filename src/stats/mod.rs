//! Stats module - filtering and dashboard aggregates over normalized tables

mod calculator;
mod filter;
mod trends;

use polars::prelude::PolarsError;
use thiserror::Error;

pub use calculator::{
    AbsenteeDistrict, CategoryCount, DistrictRates, DivisionCount, GenderComparison,
    GenderParticipation, GeographyReport, HeadlineMetrics, Participation, PerformanceCategory,
    RankedDistrict, RankingMetric, Rankings, RateSummary, RegionSummary, SummaryCalculator,
    GEOGRAPHY_DISTRICTS, TOP_ABSENTEES,
};
pub use filter::{parse_year, FilterSelection, GenderMode};
pub use trends::{yearly_trends, YearlyTrend};

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
}
