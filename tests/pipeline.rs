// End-to-end: CSV on disk -> load -> normalize_dates -> statistics.

use chrono::NaiveDate;
use spx_explorer::data::{RowIndex, Value};
use spx_explorer::{load, normalize_dates, DataProcessor, LoaderError, ProcessorError, StatsCalculator};
use std::fs;
use std::path::PathBuf;

const PRICES: &str = "\
Date,SPX,GLD,SLV
2024-01-01,100,200,300
2024-01-02,110,210,310
2024-01-03,120,220,320
2024-01-04,130,230,330
2024-01-05,140,240,340
";

fn write_csv(dir: &tempfile::TempDir, body: &str) -> PathBuf {
    let path = dir.path().join("prices.csv");
    fs::write(&path, body).unwrap();
    path
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn spx_sum(ds: &spx_explorer::Dataset) -> f64 {
    ds.numeric_column("SPX").unwrap().into_iter().flatten().sum()
}

#[test]
fn load_returns_every_row_and_declared_columns() {
    let dir = tempfile::tempdir().unwrap();
    let ds = load(write_csv(&dir, PRICES)).unwrap();

    assert_eq!(ds.height(), 5);
    assert_eq!(ds.column_names(), vec!["Date", "SPX", "GLD", "SLV"]);
    assert!(!ds.is_date_keyed());
}

#[test]
fn load_missing_path_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let err = load(dir.path().join("gold_data_2015_25.csv")).unwrap_err();
    assert!(matches!(err, LoaderError::NotFound(_)));
}

#[test]
fn two_row_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(
        &dir,
        "Date,SPX,GLD,SLV\n2020-01-01,3200.0,150.5,18.2\n2020-01-02,3250.5,152.1,18.5\n",
    );

    let out = normalize_dates(load(path).unwrap()).unwrap();

    assert_eq!(out.column_names(), vec!["SPX", "GLD", "SLV"]);
    assert_eq!(out.keys().unwrap(), &[date(2020, 1, 1), date(2020, 1, 2)]);
    assert_eq!(
        out.row(0).unwrap(),
        &[Value::Number(3200.0), Value::Number(150.5), Value::Number(18.2)]
    );
    assert_eq!(
        out.row(1).unwrap(),
        &[Value::Number(3250.5), Value::Number(152.1), Value::Number(18.5)]
    );
    assert!(matches!(out.index(), RowIndex::Date { name, .. } if name == "Date"));
}

#[test]
fn header_only_file_yields_zero_rows_through_both_steps() {
    let dir = tempfile::tempdir().unwrap();
    let raw = load(write_csv(&dir, "Date,SPX,GLD,SLV\n")).unwrap();
    assert_eq!(raw.height(), 0);
    assert_eq!(raw.column_names(), vec!["Date", "SPX", "GLD", "SLV"]);

    let out = normalize_dates(raw).unwrap();
    assert_eq!(out.height(), 0);
    assert_eq!(out.column_names(), vec!["SPX", "GLD", "SLV"]);
    assert_eq!(out.keys().unwrap().len(), 0);
}

#[test]
fn normalization_preserves_values_exactly() {
    let dir = tempfile::tempdir().unwrap();
    let raw = load(write_csv(&dir, PRICES)).unwrap();
    let before = spx_sum(&raw);

    let out = normalize_dates(raw.clone()).unwrap();
    assert_eq!(spx_sum(&out), before);
    assert!(out.column("Date").is_none());
    for col in ["SPX", "GLD", "SLV"] {
        assert_eq!(out.numeric_column(col), raw.numeric_column(col));
    }
    assert!(out.is_sorted_by_key());
}

#[test]
fn renormalizing_canonical_dates_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let out = normalize_dates(load(write_csv(&dir, PRICES)).unwrap()).unwrap();

    // Write the keys back out in canonical form and run the pipeline again.
    let mut body = String::from("Date,SPX\n");
    let spx = out.numeric_column("SPX").unwrap();
    for (key, v) in out.keys().unwrap().iter().zip(spx) {
        body.push_str(&format!("{},{}\n", key.format("%Y-%m-%d"), v.unwrap()));
    }
    let again = normalize_dates(load(write_csv(&dir, &body)).unwrap()).unwrap();

    assert_eq!(again.keys(), out.keys());
}

#[test]
fn invalid_date_fails_the_whole_operation() {
    let dir = tempfile::tempdir().unwrap();
    let body = PRICES.replace("2024-01-03", "invalid-date");
    let raw = load(write_csv(&dir, &body)).unwrap();

    let err = normalize_dates(raw).unwrap_err();
    match err {
        ProcessorError::DateParse { row, value, .. } => {
            assert_eq!(row, 2);
            assert_eq!(value, "invalid-date");
        }
        other => panic!("expected DateParse, got {other}"),
    }
}

#[test]
fn missing_date_column_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let raw = load(write_csv(&dir, "Day,SPX\n2024-01-01,1\n")).unwrap();
    assert!(matches!(
        normalize_dates(raw),
        Err(ProcessorError::MissingColumn(c)) if c == "Date"
    ));
}

#[test]
fn statistics_over_normalized_prices() {
    let dir = tempfile::tempdir().unwrap();
    let body = format!("{PRICES}2025-01-02,150,250,350\n");
    let out = normalize_dates(load(write_csv(&dir, &body)).unwrap()).unwrap();

    let yearly = StatsCalculator::yearly_summary(&out).unwrap();
    assert_eq!(yearly.iter().map(|y| y.year).collect::<Vec<_>>(), vec![2024, 2025]);
    assert_eq!(yearly[0].column("SPX").unwrap().mean, 120.0);
    assert_eq!(yearly[0].column("GLD").unwrap().count, 5);

    let corr = StatsCalculator::correlation_matrix(&out);
    assert!((corr.get("SPX", "GLD").unwrap() - 1.0).abs() < 1e-12);

    let describe = StatsCalculator::describe(&out);
    assert_eq!(describe.len(), 3);
    assert_eq!(describe[0].max, 150.0);

    let only_2025 = DataProcessor::select_year(&out, 2025).unwrap();
    assert_eq!(only_2025.height(), 1);
    assert_eq!(only_2025.to_dataframe().unwrap().width(), 4);
}
