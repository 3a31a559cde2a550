//! SPX Explorer - loads a price CSV, keys it by date and prints exploratory statistics.

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use spx_explorer::stats::{ColumnStats, CorrelationMatrix, YearlySummary};
use spx_explorer::{AnalysisConfig, DataProcessor, Dataset, StatsCalculator};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "spx-explorer")]
#[command(about = "Explore SPX / gold / silver price series", long_about = None)]
struct Cli {
    /// CSV file with a Date column and numeric price columns
    #[arg(default_value = "gold_data_2015_25.csv")]
    path: PathBuf,

    /// JSON analysis config (separator, date column/format, policies)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Also show the rows of one calendar year
    #[arg(long)]
    year: Option<i32>,

    /// Print the report as JSON instead of tables
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Serialize)]
struct Report {
    rows: usize,
    columns: Vec<String>,
    first_date: Option<String>,
    last_date: Option<String>,
    describe: Vec<ColumnStats>,
    yearly: Vec<YearlySummary>,
    correlation: CorrelationMatrix,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => AnalysisConfig::from_file(path)?,
        None => AnalysisConfig::default(),
    };

    let raw = config
        .loader()
        .load_csv(&cli.path)
        .with_context(|| format!("load '{}'", cli.path.display()))?;
    let df = DataProcessor::normalize_dates(&raw, &config.normalize)
        .context("normalize dates")?;

    let report = build_report(&df)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&df, &report, config.head_rows)?;
    }

    if let Some(year) = cli.year {
        let slice = DataProcessor::select_year(&df, year)?;
        println!("\nRows in {year}: {}", slice.height());
        println!("{}", slice.to_dataframe()?);
    }

    Ok(())
}

fn build_report(df: &Dataset) -> Result<Report> {
    let keys = df.keys().unwrap_or_default();
    Ok(Report {
        rows: df.height(),
        columns: df.column_names(),
        first_date: keys.iter().min().map(|d| d.to_string()),
        last_date: keys.iter().max().map(|d| d.to_string()),
        describe: StatsCalculator::describe(df),
        yearly: StatsCalculator::yearly_summary(df)?,
        correlation: StatsCalculator::correlation_matrix(df),
    })
}

fn print_report(df: &Dataset, report: &Report, head_rows: usize) -> Result<()> {
    println!("{}", df.head(head_rows).to_dataframe()?);
    println!(
        "\n{} rows x {} columns, {} .. {}",
        report.rows,
        report.columns.len(),
        report.first_date.as_deref().unwrap_or("-"),
        report.last_date.as_deref().unwrap_or("-"),
    );

    println!(
        "\n{:<8} {:>6} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12}",
        "column", "count", "mean", "std", "min", "25%", "50%", "75%", "max"
    );
    for s in &report.describe {
        println!(
            "{:<8} {:>6} {:>12.4} {:>12.4} {:>12.4} {:>12.4} {:>12.4} {:>12.4} {:>12.4}",
            s.column, s.count, s.mean, s.std, s.min, s.p25, s.median, s.p75, s.max
        );
    }

    println!("\nYearly mean (count)");
    for year in &report.yearly {
        let cells: Vec<String> = year
            .columns
            .iter()
            .map(|c| format!("{}={:.4} ({})", c.column, c.mean, c.count))
            .collect();
        println!("{}  {}", year.year, cells.join("  "));
    }

    let corr = &report.correlation;
    println!("\nCorrelation");
    print!("{:<8}", "");
    for name in &corr.columns {
        print!(" {name:>8}");
    }
    println!();
    for (i, name) in corr.columns.iter().enumerate() {
        print!("{name:<8}");
        for r in &corr.coefficients[i] {
            print!(" {r:>8.4}");
        }
        println!();
    }

    Ok(())
}
