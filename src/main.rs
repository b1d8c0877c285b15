//! PLE Dashboard CLI
//!
//! Fetches the results sheet and prints dashboard aggregates as text or JSON.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use ple_dashboard::config::DashboardConfig;
use ple_dashboard::data::schema::Division;
use ple_dashboard::data::{CsvFileSource, NormalizedTable, SheetLoader, SheetSource, TableCache};
use ple_dashboard::stats::{
    yearly_trends, CategoryCount, DistrictRates, DivisionCount, FilterSelection,
    GenderComparison, GenderMode, HeadlineMetrics, Participation, RankingMetric, Rankings,
    RateSummary, RegionSummary, SummaryCalculator, GEOGRAPHY_DISTRICTS,
};
use serde::Serialize;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "ple-dashboard", version, about = "PLE results dashboard")]
struct Cli {
    #[command(flatten)]
    source: SourceArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct SourceArgs {
    /// JSON config file
    #[arg(long, global = true, env = "PLE_DASHBOARD_CONFIG")]
    config: Option<PathBuf>,

    /// Spreadsheet identifier (overrides config)
    #[arg(long, global = true)]
    sheet_id: Option<String>,

    /// Sheet tab name (overrides config)
    #[arg(long, global = true)]
    sheet_name: Option<String>,

    /// Read a local CSV export instead of fetching over HTTP
    #[arg(long, global = true)]
    csv: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Args, Debug, Clone)]
struct FilterArgs {
    /// Examination years to keep (comma separated)
    #[arg(long, value_delimiter = ',')]
    year: Vec<i64>,

    #[arg(long, value_enum, default_value_t = GenderArg::All)]
    gender: GenderArg,

    #[arg(long)]
    sub_region: Option<String>,

    #[arg(long)]
    zone: Option<String>,

    #[arg(long)]
    district: Option<String>,

    /// Divisions counted as "selected" (1, 2, 3, 4, U, X; comma separated)
    #[arg(long, value_delimiter = ',', value_parser = parse_division)]
    division: Vec<Division>,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Headline metrics, division distribution, participation and categories
    Summary {
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Top and bottom districts by a metric
    Rankings {
        #[command(flatten)]
        filters: FilterArgs,

        /// Metric to rank by; all metrics when omitted
        #[arg(long, value_enum)]
        metric: Option<MetricArg>,

        #[arg(long, default_value_t = 15)]
        limit: usize,
    },
    /// Year-over-year aggregates
    Trends {
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Sub Region and Zone breakdowns with best and worst districts
    Geography {
        #[command(flatten)]
        filters: FilterArgs,

        /// Districts listed at each end
        #[arg(long, default_value_t = GEOGRAPHY_DISTRICTS)]
        limit: usize,
    },
    /// Column names of the normalized table
    Columns,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum GenderArg {
    All,
    Boys,
    Girls,
}

impl From<GenderArg> for GenderMode {
    fn from(arg: GenderArg) -> Self {
        match arg {
            GenderArg::All => GenderMode::All,
            GenderArg::Boys => GenderMode::BoysOnly,
            GenderArg::Girls => GenderMode::GirlsOnly,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum MetricArg {
    PassRate,
    ExcellenceRate,
    Division1,
    StrongPerformance,
}

impl From<MetricArg> for RankingMetric {
    fn from(arg: MetricArg) -> Self {
        match arg {
            MetricArg::PassRate => RankingMetric::PassRate,
            MetricArg::ExcellenceRate => RankingMetric::ExcellenceRate,
            MetricArg::Division1 => RankingMetric::DivisionOneTotal,
            MetricArg::StrongPerformance => RankingMetric::StrongPerformanceRate,
        }
    }
}

fn parse_division(text: &str) -> Result<Division, String> {
    Division::parse(text).ok_or_else(|| format!("unknown division '{text}'"))
}

impl FilterArgs {
    fn selection(&self) -> FilterSelection {
        let defaults = FilterSelection::default();
        FilterSelection {
            years: self.year.clone(),
            gender: self.gender.into(),
            sub_region: self.sub_region.clone(),
            zone: self.zone.clone(),
            district: self.district.clone(),
            divisions: if self.division.is_empty() {
                defaults.divisions
            } else {
                self.division.clone()
            },
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn load_table(args: &SourceArgs, cache: &TableCache) -> Result<Arc<NormalizedTable>> {
    let mut config = DashboardConfig::load(args.config.as_deref())?;
    if let Some(sheet_id) = &args.sheet_id {
        config.sheet_id = sheet_id.clone();
    }
    if let Some(sheet_name) = &args.sheet_name {
        config.sheet_name = sheet_name.clone();
    }

    let source: Box<dyn SheetSource> = match &args.csv {
        Some(path) => Box::new(CsvFileSource::new(path.clone())),
        None => Box::new(SheetLoader::new(&config)?),
    };

    let table = cache
        .get_or_load(&config.sheet_key(), source.as_ref())
        .context("no data available")?;
    if !table.has_divisions() {
        warn!("no division columns found; totals and rates were not derived");
    }
    info!(rows = table.height(), "table ready");
    Ok(table)
}

fn percent(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.1}%"))
}

/// Percentage-point difference, signed.
fn points(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:+.1} pp"))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[derive(Serialize)]
struct SummaryReport<'a> {
    headline: &'a HeadlineMetrics,
    divisions: &'a [DivisionCount],
    participation: &'a Participation,
    categories: &'a [CategoryCount],
    gender: &'a GenderComparison,
    pass_rate_summary: Option<&'a RateSummary>,
}

fn run_summary(table: &NormalizedTable, filters: &FilterArgs) -> Result<()> {
    let selection = filters.selection();
    let filtered = selection.apply(table)?;

    let headline = SummaryCalculator::headline_metrics(&filtered, &selection);
    let distribution = SummaryCalculator::division_distribution(&filtered, selection.gender);
    let participation = SummaryCalculator::participation(&filtered);
    let categories = SummaryCalculator::performance_categories(&filtered);
    let gender = SummaryCalculator::gender_comparison(&filtered);
    let pass_rates = SummaryCalculator::rate_summary(&filtered, selection.gender.pass_rate_column());

    if filters.json {
        return print_json(&SummaryReport {
            headline: &headline,
            divisions: &distribution,
            participation: &participation,
            categories: &categories,
            gender: &gender,
            pass_rate_summary: pass_rates.as_ref(),
        });
    }

    println!("PLE summary ({})", selection.gender.label());
    println!("  Rows:               {}", headline.rows);
    println!("  Districts:          {}", headline.districts);
    println!("  Total students:     {:.0}", headline.total_students);
    println!("  Pass rate:          {}", percent(headline.pass_rate));
    println!("  Excellence rate:    {}", percent(headline.excellence_rate));
    println!("  Selected divisions: {:.0}", headline.selected_divisions_total);
    println!("  Gender gap:         {}", points(headline.gender_gap));

    println!("\nDivision distribution");
    for entry in &distribution {
        println!("  {:<8} {:>10.0}", entry.label, entry.count);
    }

    println!("\nParticipation");
    println!("  Registered:    {:.0}", participation.registered);
    println!("  Did not sit:   {:.0}", participation.did_not_sit);
    println!("  Sat:           {:.0}", participation.sat);
    println!("  Participation: {}", percent(Some(participation.participation_rate)));
    println!("  Absentee:      {}", percent(Some(participation.absentee_rate)));
    for district in participation.top_absentees.iter().filter(|d| d.did_not_sit > 0.0) {
        println!(
            "    {:<20} {:>6.0} of {:>6.0} ({})",
            district.district.as_deref().unwrap_or("-"),
            district.did_not_sit,
            district.registered,
            percent(Some(district.absentee_rate)),
        );
    }

    println!("\nPerformance categories");
    for entry in &categories {
        println!("  {:<18} {}", entry.label, entry.districts);
    }

    println!("\nGender");
    println!("  Boys registered:  {:.0}", gender.registered_boys);
    println!("  Girls registered: {:.0}", gender.registered_girls);
    println!("  Boys pass rate:   {}", percent(gender.boys_pass_rate));
    println!("  Girls pass rate:  {}", percent(gender.girls_pass_rate));

    if let Some(summary) = pass_rates {
        println!("\n{} across {} rows", summary.column, summary.count);
        println!(
            "  mean {}  median {}  sd {:.2}",
            percent(Some(summary.mean)),
            percent(Some(summary.median)),
            summary.std_dev
        );
        println!(
            "  min {}  q1 {}  q3 {}  max {}",
            percent(Some(summary.min)),
            percent(Some(summary.lower_quartile)),
            percent(Some(summary.upper_quartile)),
            percent(Some(summary.max)),
        );
    }
    Ok(())
}

fn print_rankings(rankings: &Rankings) {
    let render = |value: f64| {
        if rankings.metric.is_rate() {
            percent(Some(value))
        } else {
            format!("{value:.0}")
        }
    };
    for (title, entries) in [("Top", &rankings.top), ("Bottom", &rankings.bottom)] {
        println!("{title} {} by {}", entries.len(), rankings.column);
        for (rank, entry) in entries.iter().enumerate() {
            println!(
                "  {:>3}. {:<20} {:>10}",
                rank + 1,
                entry.district.as_deref().unwrap_or("-"),
                render(entry.value)
            );
        }
    }
}

fn run_rankings(
    table: &NormalizedTable,
    filters: &FilterArgs,
    metric: Option<MetricArg>,
    limit: usize,
) -> Result<()> {
    let filtered = filters.selection().apply(table)?;
    let rankings = match metric {
        Some(metric) => vec![SummaryCalculator::rankings(&filtered, metric.into(), limit)],
        None => SummaryCalculator::all_rankings(&filtered, limit),
    };

    if filters.json {
        return print_json(&rankings);
    }
    for (i, ranking) in rankings.iter().enumerate() {
        if i > 0 {
            println!();
        }
        print_rankings(ranking);
    }
    Ok(())
}

fn run_trends(table: &NormalizedTable, filters: &FilterArgs) -> Result<()> {
    let filtered = filters.selection().apply(table)?;
    let trends = yearly_trends(&filtered);

    if filters.json {
        return print_json(&trends);
    }
    if trends.is_empty() {
        println!("No yearly data available");
        return Ok(());
    }

    println!(
        "{:>6} {:>10} {:>9} {:>10} {:>10} {:>10}",
        "Year", "Registered", "Growth", "Pass rate", "Change", "Excellence"
    );
    for trend in &trends {
        println!(
            "{:>6} {:>10.0} {:>9} {:>10} {:>10} {:>10}",
            trend.year,
            trend.registered_total,
            percent(trend.registration_growth_pct),
            percent(Some(trend.pass_rate)),
            points(trend.pass_rate_change),
            percent(Some(trend.excellence_rate)),
        );
    }
    Ok(())
}

fn print_regions(title: &str, regions: &[RegionSummary]) {
    println!("{title}");
    println!(
        "  {:<20} {:>10} {:>10} {:>10} {:>10}",
        "", "Students", "Pass", "Failure", "Div 1"
    );
    for region in regions {
        println!(
            "  {:<20} {:>10.0} {:>10} {:>10} {:>10}",
            region.region,
            region.registered,
            percent(Some(region.pass_rate)),
            percent(Some(region.failure_rate)),
            percent(Some(region.excellence_rate)),
        );
    }
}

fn print_districts(title: &str, districts: &[DistrictRates]) {
    println!("{title}");
    for (rank, entry) in districts.iter().enumerate() {
        println!(
            "  {:>3}. {:<20} pass {:>7}  failure {:>7}",
            rank + 1,
            entry.district.as_deref().unwrap_or("-"),
            percent(Some(entry.pass_rate)),
            percent(Some(entry.failure_rate)),
        );
    }
}

fn run_geography(table: &NormalizedTable, filters: &FilterArgs, limit: usize) -> Result<()> {
    let filtered = filters.selection().apply(table)?;
    let report = SummaryCalculator::geography(&filtered, limit);

    if filters.json {
        return print_json(&report);
    }

    let mut printed = false;
    for (title, regions) in [
        ("Performance by Sub Region", &report.by_sub_region),
        ("Performance by Zone", &report.by_zone),
    ] {
        if let Some(regions) = regions {
            if printed {
                println!();
            }
            print_regions(title, regions);
            printed = true;
        }
    }
    if !report.top_districts.is_empty() {
        if printed {
            println!();
        }
        print_districts(
            &format!("Top {} districts by pass rate", report.top_districts.len()),
            &report.top_districts,
        );
        println!();
        print_districts(
            &format!("Bottom {} districts by pass rate", report.bottom_districts.len()),
            &report.bottom_districts,
        );
        printed = true;
    }
    if !printed {
        println!("No geographical columns available");
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.source.verbose);

    let cache = TableCache::new();
    let table = load_table(&cli.source, &cache)?;

    match &cli.command {
        Command::Summary { filters } => run_summary(&table, filters),
        Command::Rankings {
            filters,
            metric,
            limit,
        } => run_rankings(&table, filters, *metric, *limit),
        Command::Trends { filters } => run_trends(&table, filters),
        Command::Geography { filters, limit } => run_geography(&table, filters, *limit),
        Command::Columns => {
            for name in table.column_names() {
                println!("{name}");
            }
            Ok(())
        }
    }
}
