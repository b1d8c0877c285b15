//! Statistics Calculator Module
//! Headline metrics, division distributions, participation, rankings and rate summaries.

use super::filter::{FilterSelection, GenderMode};
use crate::data::schema::{self, Division, Part};
use crate::data::{round2, NormalizedTable};
use rayon::prelude::*;
use serde::Serialize;
use statrs::statistics::{Data, Distribution, Max, Median, Min, OrderStatistics};
use std::collections::{BTreeMap, BTreeSet};

/// Number of districts listed in the absentee table.
pub const TOP_ABSENTEES: usize = 10;

/// Districts listed at each end of the geography view.
pub const GEOGRAPHY_DISTRICTS: usize = 20;

/// Key figures shown above every dashboard view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeadlineMetrics {
    pub gender: GenderMode,
    pub rows: usize,
    pub districts: usize,
    pub total_students: f64,
    pub pass_rate: Option<f64>,
    pub excellence_rate: Option<f64>,
    pub selected_divisions_total: f64,
    pub gender_gap: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DivisionCount {
    pub division: Division,
    pub label: String,
    pub count: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenderParticipation {
    pub registered: f64,
    pub absent: f64,
    pub sat: f64,
    pub participation_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AbsenteeDistrict {
    pub district: Option<String>,
    pub did_not_sit: f64,
    pub registered: f64,
    pub absentee_rate: f64,
}

/// Registered vs sat analysis; Division X counts candidates who did not sit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Participation {
    pub registered: f64,
    pub did_not_sit: f64,
    pub sat: f64,
    pub participation_rate: f64,
    pub absentee_rate: f64,
    pub boys: GenderParticipation,
    pub girls: GenderParticipation,
    pub top_absentees: Vec<AbsenteeDistrict>,
}

/// Pass-rate band of a reporting unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum PerformanceCategory {
    NeedsImprovement,
    Average,
    Good,
    VeryGood,
    Excellent,
}

impl PerformanceCategory {
    pub const ALL: [PerformanceCategory; 5] = [
        PerformanceCategory::NeedsImprovement,
        PerformanceCategory::Average,
        PerformanceCategory::Good,
        PerformanceCategory::VeryGood,
        PerformanceCategory::Excellent,
    ];

    /// Right-closed bands over (0, 100]; anything outside is uncategorized.
    pub fn from_pass_rate(rate: f64) -> Option<Self> {
        match rate {
            r if r <= 0.0 || r > 100.0 || r.is_nan() => None,
            r if r <= 65.0 => Some(PerformanceCategory::NeedsImprovement),
            r if r <= 75.0 => Some(PerformanceCategory::Average),
            r if r <= 85.0 => Some(PerformanceCategory::Good),
            r if r <= 95.0 => Some(PerformanceCategory::VeryGood),
            _ => Some(PerformanceCategory::Excellent),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PerformanceCategory::NeedsImprovement => "Needs Improvement",
            PerformanceCategory::Average => "Average",
            PerformanceCategory::Good => "Good",
            PerformanceCategory::VeryGood => "Very Good",
            PerformanceCategory::Excellent => "Excellent",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCount {
    pub category: PerformanceCategory,
    pub label: &'static str,
    pub districts: usize,
}

/// Descriptive statistics of a rate column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateSummary {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub lower_quartile: f64,
    pub upper_quartile: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenderComparison {
    pub registered_boys: f64,
    pub registered_girls: f64,
    pub boys_pass_rate: Option<f64>,
    pub girls_pass_rate: Option<f64>,
    pub gender_gap: Option<f64>,
}

/// Metrics a ranking can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RankingMetric {
    PassRate,
    ExcellenceRate,
    DivisionOneTotal,
    StrongPerformanceRate,
}

impl RankingMetric {
    pub const ALL: [RankingMetric; 4] = [
        RankingMetric::PassRate,
        RankingMetric::ExcellenceRate,
        RankingMetric::DivisionOneTotal,
        RankingMetric::StrongPerformanceRate,
    ];

    pub fn column(self) -> String {
        match self {
            RankingMetric::PassRate => schema::PASS_RATE.to_string(),
            RankingMetric::ExcellenceRate => schema::EXCELLENCE_RATE.to_string(),
            RankingMetric::DivisionOneTotal => Division::One.column(Part::Total),
            RankingMetric::StrongPerformanceRate => schema::STRONG_PERFORMANCE_RATE.to_string(),
        }
    }

    /// Whether values are percentages (displayed with a `%`).
    pub fn is_rate(self) -> bool {
        !matches!(self, RankingMetric::DivisionOneTotal)
    }
}

/// Aggregates for one `Sub Region` or `Zone` value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionSummary {
    pub region: String,
    pub rows: usize,
    pub registered: f64,
    pub pass_rate: f64,
    pub excellence_rate: f64,
    /// Mean of `100 - Pass_Rate`.
    pub failure_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistrictRates {
    pub district: Option<String>,
    pub pass_rate: f64,
    pub failure_rate: f64,
}

/// Regional breakdowns plus best and worst districts by pass rate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeographyReport {
    pub by_sub_region: Option<Vec<RegionSummary>>,
    pub by_zone: Option<Vec<RegionSummary>>,
    pub top_districts: Vec<DistrictRates>,
    pub bottom_districts: Vec<DistrictRates>,
}

#[derive(Default)]
struct RegionAccumulator {
    rows: usize,
    registered: f64,
    pass_rate: f64,
    excellence_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedDistrict {
    pub district: Option<String>,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rankings {
    pub metric: RankingMetric,
    pub column: String,
    pub top: Vec<RankedDistrict>,
    pub bottom: Vec<RankedDistrict>,
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Mean of a column, or `None` when the table lacks it or has no rows.
fn column_mean(table: &NormalizedTable, name: &str) -> Option<f64> {
    if table.has_column(name) {
        mean(&table.numeric_column(name))
    } else {
        None
    }
}

fn ratio_percent(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        round2(part / whole * 100.0)
    } else {
        0.0
    }
}

/// Row indices ordered by value, descending or ascending; ties keep table order.
fn ordered_indices(values: &[f64], descending: bool) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..values.len()).collect();
    indices.sort_by(|&a, &b| {
        let ord = values[a]
            .partial_cmp(&values[b])
            .unwrap_or(std::cmp::Ordering::Equal);
        if descending {
            ord.reverse()
        } else {
            ord
        }
    });
    indices
}

/// Computes the dashboard aggregates over an already-filtered table.
pub struct SummaryCalculator;

impl SummaryCalculator {
    pub fn headline_metrics(table: &NormalizedTable, selection: &FilterSelection) -> HeadlineMetrics {
        let gender = selection.gender;
        let selected_columns: Vec<String> = selection
            .divisions
            .iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(|d| d.column(Part::Total))
            .collect();

        let districts = if table.has_column(schema::DISTRICT) {
            table.unique_values(schema::DISTRICT).len()
        } else {
            0
        };

        HeadlineMetrics {
            gender,
            rows: table.height(),
            districts,
            total_students: table.column_total(gender.part().registered_column()),
            pass_rate: column_mean(table, gender.pass_rate_column()),
            excellence_rate: column_mean(table, schema::EXCELLENCE_RATE),
            selected_divisions_total: table.sum_columns(&selected_columns).iter().sum(),
            gender_gap: column_mean(table, schema::GENDER_GAP),
        }
    }

    /// Candidates per division for the chosen gender.
    pub fn division_distribution(table: &NormalizedTable, gender: GenderMode) -> Vec<DivisionCount> {
        Division::ALL
            .into_iter()
            .map(|division| DivisionCount {
                division,
                label: format!("Div {}", division.label()),
                count: table.column_total(&division.column(gender.part())),
            })
            .collect()
    }

    pub fn participation(table: &NormalizedTable) -> Participation {
        let registered = table.column_total(schema::REGISTERED_TOTAL);
        let did_not_sit = table.column_total(&Division::X.column(Part::Total));
        let sat = registered - did_not_sit;

        let by_gender = |part: Part| {
            let registered = table.column_total(part.registered_column());
            let absent = table.column_total(&Division::X.column(part));
            let sat = registered - absent;
            GenderParticipation {
                registered,
                absent,
                sat,
                participation_rate: ratio_percent(sat, registered),
            }
        };

        let absent_per_row = table.numeric_column(&Division::X.column(Part::Total));
        let registered_per_row = table.numeric_column(schema::REGISTERED_TOTAL);
        let districts = table.text_column(schema::DISTRICT);
        let top_absentees = ordered_indices(&absent_per_row, true)
            .into_iter()
            .take(TOP_ABSENTEES)
            .map(|i| AbsenteeDistrict {
                district: districts[i].clone(),
                did_not_sit: absent_per_row[i],
                registered: registered_per_row[i],
                absentee_rate: ratio_percent(absent_per_row[i], registered_per_row[i]),
            })
            .collect();

        Participation {
            registered,
            did_not_sit,
            sat,
            participation_rate: ratio_percent(sat, registered),
            absentee_rate: ratio_percent(did_not_sit, registered),
            boys: by_gender(Part::Boys),
            girls: by_gender(Part::Girls),
            top_absentees,
        }
    }

    /// Districts per pass-rate band, in band order.
    pub fn performance_categories(table: &NormalizedTable) -> Vec<CategoryCount> {
        let rates = table.numeric_column(schema::PASS_RATE);
        PerformanceCategory::ALL
            .into_iter()
            .map(|category| CategoryCount {
                category,
                label: category.label(),
                districts: rates
                    .iter()
                    .filter(|&&r| PerformanceCategory::from_pass_rate(r) == Some(category))
                    .count(),
            })
            .collect()
    }

    /// Box-plot style summary of a column; `None` for an absent column or an empty table.
    pub fn rate_summary(table: &NormalizedTable, column: &str) -> Option<RateSummary> {
        if !table.has_column(column) {
            return None;
        }
        let values = table.numeric_column(column);
        let count = values.len();
        if count == 0 {
            return None;
        }

        let mut data = Data::new(values);
        let std_dev = if count > 1 {
            data.std_dev().unwrap_or(0.0)
        } else {
            0.0
        };

        Some(RateSummary {
            column: column.to_string(),
            count,
            mean: data.mean().unwrap_or(0.0),
            median: data.median(),
            std_dev,
            lower_quartile: data.lower_quartile(),
            upper_quartile: data.upper_quartile(),
            min: data.min(),
            max: data.max(),
        })
    }

    pub fn gender_comparison(table: &NormalizedTable) -> GenderComparison {
        GenderComparison {
            registered_boys: table.column_total(schema::REGISTERED_BOYS),
            registered_girls: table.column_total(schema::REGISTERED_GIRLS),
            boys_pass_rate: column_mean(table, schema::BOYS_PASS_RATE),
            girls_pass_rate: column_mean(table, schema::GIRLS_PASS_RATE),
            gender_gap: column_mean(table, schema::GENDER_GAP),
        }
    }

    /// Top and bottom `limit` districts by a metric.
    pub fn rankings(table: &NormalizedTable, metric: RankingMetric, limit: usize) -> Rankings {
        let column = metric.column();
        let values = table.numeric_column(&column);
        let districts = table.text_column(schema::DISTRICT);

        let pick = |descending: bool| -> Vec<RankedDistrict> {
            ordered_indices(&values, descending)
                .into_iter()
                .take(limit)
                .map(|i| RankedDistrict {
                    district: districts[i].clone(),
                    value: values[i],
                })
                .collect()
        };

        Rankings {
            metric,
            top: pick(true),
            bottom: pick(false),
            column,
        }
    }

    /// Group rows by a region column (`Sub Region`, `Zone`), best pass rate first.
    ///
    /// `None` when the table lacks the column. Rows without a region value are
    /// left out; equal pass rates keep region name order.
    pub fn regional_breakdown(table: &NormalizedTable, column: &str) -> Option<Vec<RegionSummary>> {
        if !table.has_column(column) {
            return None;
        }

        let regions = table.text_column(column);
        let registered = table.numeric_column(schema::REGISTERED_TOTAL);
        let pass = table.numeric_column(schema::PASS_RATE);
        let excellence = table.numeric_column(schema::EXCELLENCE_RATE);

        let mut groups: BTreeMap<&str, RegionAccumulator> = BTreeMap::new();
        for (row, region) in regions.iter().enumerate() {
            let Some(region) = region.as_deref() else {
                continue;
            };
            let acc = groups.entry(region).or_default();
            acc.rows += 1;
            acc.registered += registered[row];
            acc.pass_rate += pass[row];
            acc.excellence_rate += excellence[row];
        }

        let mut summaries: Vec<RegionSummary> = groups
            .into_iter()
            .map(|(region, acc)| {
                let n = acc.rows as f64;
                let pass_rate = acc.pass_rate / n;
                RegionSummary {
                    region: region.to_string(),
                    rows: acc.rows,
                    registered: acc.registered,
                    pass_rate,
                    excellence_rate: acc.excellence_rate / n,
                    failure_rate: 100.0 - pass_rate,
                }
            })
            .collect();
        summaries.sort_by(|a, b| {
            b.pass_rate
                .partial_cmp(&a.pass_rate)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Some(summaries)
    }

    /// Sub Region and Zone breakdowns plus the `limit` best and worst districts.
    ///
    /// District lists are empty when the table has no `District` column.
    pub fn geography(table: &NormalizedTable, limit: usize) -> GeographyReport {
        let (top_districts, bottom_districts) = if table.has_column(schema::DISTRICT) {
            let pass = table.numeric_column(schema::PASS_RATE);
            let districts = table.text_column(schema::DISTRICT);
            let pick = |descending: bool| -> Vec<DistrictRates> {
                ordered_indices(&pass, descending)
                    .into_iter()
                    .take(limit)
                    .map(|i| DistrictRates {
                        district: districts[i].clone(),
                        pass_rate: pass[i],
                        failure_rate: round2(100.0 - pass[i]),
                    })
                    .collect()
            };
            (pick(true), pick(false))
        } else {
            (Vec::new(), Vec::new())
        };

        GeographyReport {
            by_sub_region: Self::regional_breakdown(table, schema::SUB_REGION),
            by_zone: Self::regional_breakdown(table, schema::ZONE),
            top_districts,
            bottom_districts,
        }
    }

    /// Rankings for every metric, computed in parallel.
    pub fn all_rankings(table: &NormalizedTable, limit: usize) -> Vec<Rankings> {
        RankingMetric::ALL
            .par_iter()
            .map(|&metric| Self::rankings(table, metric, limit))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Normalizer, RawTable};
    use anyhow::{anyhow, Result};

    fn table() -> Result<NormalizedTable> {
        let csv = "\
District,Div1_M,Div1_F,Div2_M,Div2_F,DivU_M,DivU_F,DivX_M,DivX_F
Gulu,5,5,10,10,5,5,0,0
Arua,1,1,2,2,4,4,1,1
Kampala,10,10,5,5,0,0,0,0
Mbale,0,0,0,0,0,0,0,0
";
        let raw = RawTable::from_csv_reader(csv.as_bytes())?;
        Normalizer::normalize(Some(&raw)).ok_or_else(|| anyhow!("no data"))
    }

    #[test]
    fn headline_follows_gender_mode() -> Result<()> {
        let table = table()?;

        let all = SummaryCalculator::headline_metrics(&table, &FilterSelection::default());
        assert_eq!(all.rows, 4);
        assert_eq!(all.districts, 4);
        assert_eq!(all.total_students, 40.0 + 16.0 + 30.0);
        // Divisions 1-4 by default: 30 + 6 + 30.
        assert_eq!(all.selected_divisions_total, 66.0);

        let boys = SummaryCalculator::headline_metrics(
            &table,
            &FilterSelection {
                gender: GenderMode::BoysOnly,
                divisions: vec![Division::One, Division::One],
                ..FilterSelection::default()
            },
        );
        assert_eq!(boys.total_students, 20.0 + 8.0 + 15.0);
        assert_eq!(boys.selected_divisions_total, 32.0);
        Ok(())
    }

    #[test]
    fn headline_on_empty_table_has_no_means() -> Result<()> {
        let table = table()?.filter_rows(&[false; 4])?;
        let metrics = SummaryCalculator::headline_metrics(&table, &FilterSelection::default());
        assert_eq!(metrics.total_students, 0.0);
        assert_eq!(metrics.pass_rate, None);
        assert_eq!(metrics.gender_gap, None);
        Ok(())
    }

    #[test]
    fn distribution_by_gender() -> Result<()> {
        let table = table()?;
        let girls = SummaryCalculator::division_distribution(&table, GenderMode::GirlsOnly);

        assert_eq!(girls.len(), 6);
        assert_eq!(girls[0].label, "Div 1");
        assert_eq!(girls[0].count, 16.0);
        assert_eq!(girls[4].count, 9.0);
        assert_eq!(girls[5].count, 1.0);
        Ok(())
    }

    #[test]
    fn participation_counts_division_x_as_absent() -> Result<()> {
        let table = table()?;
        let p = SummaryCalculator::participation(&table);

        assert_eq!(p.registered, 86.0);
        assert_eq!(p.did_not_sit, 2.0);
        assert_eq!(p.sat, 84.0);
        assert_eq!(p.absentee_rate, 2.33);
        assert_eq!(p.boys.absent, 1.0);
        assert_eq!(p.girls.registered, 43.0);
        assert_eq!(p.top_absentees[0].district.as_deref(), Some("Arua"));
        assert_eq!(p.top_absentees[0].absentee_rate, 12.5);
        assert_eq!(p.top_absentees.len(), 4);
        Ok(())
    }

    #[test]
    fn categories_are_right_closed() -> Result<()> {
        assert_eq!(PerformanceCategory::from_pass_rate(0.0), None);
        assert_eq!(
            PerformanceCategory::from_pass_rate(65.0),
            Some(PerformanceCategory::NeedsImprovement)
        );
        assert_eq!(
            PerformanceCategory::from_pass_rate(65.01),
            Some(PerformanceCategory::Average)
        );
        assert_eq!(
            PerformanceCategory::from_pass_rate(100.0),
            Some(PerformanceCategory::Excellent)
        );

        let table = table()?;
        let counts = SummaryCalculator::performance_categories(&table);
        // Gulu 75%, Arua 37.5%, Kampala 100%, Mbale 0% (uncategorized).
        let by_label: Vec<(&str, usize)> = counts.iter().map(|c| (c.label, c.districts)).collect();
        assert_eq!(
            by_label,
            vec![
                ("Needs Improvement", 1),
                ("Average", 1),
                ("Good", 0),
                ("Very Good", 0),
                ("Excellent", 1),
            ]
        );
        Ok(())
    }

    #[test]
    fn rate_summary_statistics() -> Result<()> {
        let table = table()?;
        let summary = SummaryCalculator::rate_summary(&table, schema::PASS_RATE)
            .ok_or_else(|| anyhow!("empty summary"))?;

        assert_eq!(summary.count, 4);
        assert_eq!(summary.min, 0.0);
        assert_eq!(summary.max, 100.0);
        assert!((summary.mean - 53.125).abs() < 1e-9);
        assert!((summary.median - 56.25).abs() < 1e-9);

        let empty = table.filter_rows(&[false; 4])?;
        assert!(SummaryCalculator::rate_summary(&empty, schema::PASS_RATE).is_none());
        Ok(())
    }

    #[test]
    fn rankings_order_and_ties() -> Result<()> {
        let table = table()?;
        let ranking = SummaryCalculator::rankings(&table, RankingMetric::PassRate, 2);

        let top: Vec<_> = ranking.top.iter().map(|r| r.district.as_deref()).collect();
        let bottom: Vec<_> = ranking.bottom.iter().map(|r| r.district.as_deref()).collect();
        assert_eq!(top, vec![Some("Kampala"), Some("Gulu")]);
        assert_eq!(bottom, vec![Some("Mbale"), Some("Arua")]);
        assert_eq!(ranking.column, schema::PASS_RATE);

        let by_div1 = SummaryCalculator::rankings(&table, RankingMetric::DivisionOneTotal, 10);
        assert_eq!(by_div1.top.len(), 4);
        assert_eq!(by_div1.top[0].value, 20.0);
        Ok(())
    }

    #[test]
    fn all_rankings_cover_every_metric() -> Result<()> {
        let table = table()?;
        let rankings = SummaryCalculator::all_rankings(&table, 3);
        let metrics: Vec<_> = rankings.iter().map(|r| r.metric).collect();
        assert_eq!(metrics, RankingMetric::ALL.to_vec());
        Ok(())
    }

    #[test]
    fn absent_rate_columns_give_no_means() -> Result<()> {
        let raw = RawTable::from_csv_reader("District,Notes\nGulu,ok\n".as_bytes())?;
        let table = Normalizer::normalize(Some(&raw)).ok_or_else(|| anyhow!("no data"))?;
        assert!(!table.has_divisions());

        let metrics = SummaryCalculator::headline_metrics(&table, &FilterSelection::default());
        assert_eq!(metrics.pass_rate, None);
        assert_eq!(metrics.excellence_rate, None);
        assert_eq!(metrics.gender_gap, None);
        assert!(SummaryCalculator::rate_summary(&table, schema::PASS_RATE).is_none());

        let comparison = SummaryCalculator::gender_comparison(&table);
        assert_eq!(comparison.boys_pass_rate, None);
        Ok(())
    }

    fn regional_table() -> Result<NormalizedTable> {
        let csv = "\
District,Sub Region,Zone,Div1 Total,Div2 Total,DivU Total
Gulu,Acholi,North,3,3,4
Kitgum,Acholi,North,1,0,9
Arua,West Nile,North,8,0,2
Kampala,Buganda,Central,10,0,0
Wakiso,,Central,0,0,5
";
        let raw = RawTable::from_csv_reader(csv.as_bytes())?;
        Normalizer::normalize(Some(&raw)).ok_or_else(|| anyhow!("no data"))
    }

    #[test]
    fn sub_regions_sorted_by_pass_rate() -> Result<()> {
        let table = regional_table()?;
        let regions = SummaryCalculator::regional_breakdown(&table, schema::SUB_REGION)
            .ok_or_else(|| anyhow!("no sub regions"))?;

        let names: Vec<&str> = regions.iter().map(|r| r.region.as_str()).collect();
        assert_eq!(names, vec!["Buganda", "West Nile", "Acholi"]);

        let acholi = &regions[2];
        assert_eq!(acholi.rows, 2);
        assert_eq!(acholi.registered, 20.0);
        assert_eq!(acholi.pass_rate, 35.0);
        assert_eq!(acholi.excellence_rate, 20.0);
        assert_eq!(acholi.failure_rate, 65.0);
        Ok(())
    }

    #[test]
    fn zone_ties_keep_name_order() -> Result<()> {
        let table = regional_table()?;
        let zones = SummaryCalculator::regional_breakdown(&table, schema::ZONE)
            .ok_or_else(|| anyhow!("no zones"))?;

        let names: Vec<&str> = zones.iter().map(|r| r.region.as_str()).collect();
        assert_eq!(names, vec!["Central", "North"]);
        assert_eq!(zones[0].pass_rate, 50.0);
        assert_eq!(zones[1].pass_rate, 50.0);
        assert_eq!(zones[1].registered, 30.0);
        Ok(())
    }

    #[test]
    fn geography_lists_best_and_worst_districts() -> Result<()> {
        let table = regional_table()?;
        let report = SummaryCalculator::geography(&table, 2);

        let top: Vec<_> = report.top_districts.iter().map(|d| d.district.as_deref()).collect();
        assert_eq!(top, vec![Some("Kampala"), Some("Arua")]);

        let worst = &report.bottom_districts;
        assert_eq!(worst[0].district.as_deref(), Some("Wakiso"));
        assert_eq!(worst[0].failure_rate, 100.0);
        assert_eq!(worst[1].district.as_deref(), Some("Kitgum"));
        assert_eq!(worst[1].failure_rate, 90.0);
        assert!(report.by_zone.is_some());
        Ok(())
    }

    #[test]
    fn geography_without_region_columns() -> Result<()> {
        let report = SummaryCalculator::geography(&table()?, GEOGRAPHY_DISTRICTS);
        assert!(report.by_sub_region.is_none());
        assert!(report.by_zone.is_none());
        assert_eq!(report.top_districts.len(), 4);
        Ok(())
    }

    #[test]
    fn gender_comparison_means() -> Result<()> {
        let table = table()?;
        let comparison = SummaryCalculator::gender_comparison(&table);
        assert_eq!(comparison.registered_boys, 43.0);
        assert_eq!(comparison.registered_girls, 43.0);
        assert_eq!(comparison.gender_gap, Some(0.0));
        Ok(())
    }
}
