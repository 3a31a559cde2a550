//! Data Processor Module
//! Handles date normalization (re-keying rows by calendar date) and date slicing.

use crate::data::dataset::{Dataset, DatasetError, Value};
use crate::data::dates::DateFormat;
use crate::stats::StatsCalculator;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, info, warn, Level};

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("Missing required column: {0}")]
    MissingColumn(String),
    #[error("Row {row}: cannot parse date '{value}' with format {format}")]
    DateParse {
        row: usize,
        value: String,
        format: String,
    },
    #[error("Duplicate date {date} at rows {first_row} and {row}")]
    DuplicateDate {
        date: NaiveDate,
        first_row: usize,
        row: usize,
    },
    #[error("Row {row}: missing value in column {column}")]
    MissingValue { row: usize, column: String },
    #[error("Dataset is not keyed by date")]
    NotDateKeyed,
    #[error("Dataset error: {0}")]
    Dataset(#[from] DatasetError),
}

/// What to do when two rows carry the same date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateDates {
    #[default]
    Reject,
    Keep,
}

/// What to do with missing cells in value columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingValues {
    #[default]
    Keep,
    Reject,
}

/// Options for [`DataProcessor::normalize_dates`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeOptions {
    pub date_column: String,
    /// Explicit strftime pattern; inferred from the first row when absent.
    pub date_format: Option<String>,
    pub duplicates: DuplicateDates,
    pub missing_values: MissingValues,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            date_column: "Date".to_string(),
            date_format: None,
            duplicates: DuplicateDates::default(),
            missing_values: MissingValues::default(),
        }
    }
}

/// A date cell before the column's format is settled.
enum DateCell {
    Parsed(NaiveDate),
    Raw(String),
}

/// Handles dataset transformations.
pub struct DataProcessor;

impl DataProcessor {
    /// Parse the date column and make it the row key.
    ///
    /// Every row is parsed with the same format; the first failure aborts the
    /// whole operation. Remaining columns and row order are kept as they are.
    pub fn normalize_dates(
        dataset: &Dataset,
        options: &NormalizeOptions,
    ) -> Result<Dataset, ProcessorError> {
        let date_col = options.date_column.as_str();
        let date_pos = dataset
            .column_position(date_col)
            .ok_or_else(|| ProcessorError::MissingColumn(date_col.to_string()))?;

        let keys = Self::parse_date_cells(dataset, date_pos, options.date_format.as_deref())?;

        if options.duplicates == DuplicateDates::Reject {
            Self::check_duplicates(&keys)?;
        }

        let columns = dataset
            .columns()
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != date_pos)
            .map(|(_, spec)| spec.clone())
            .collect::<Vec<_>>();

        let mut rows = Vec::with_capacity(dataset.height());
        for (row_num, row) in dataset.rows().iter().enumerate() {
            let mut values = Vec::with_capacity(columns.len());
            for (i, cell) in row.iter().enumerate() {
                if i == date_pos {
                    continue;
                }
                if options.missing_values == MissingValues::Reject && cell.is_missing() {
                    return Err(ProcessorError::MissingValue {
                        row: row_num,
                        column: dataset.columns()[i].name.clone(),
                    });
                }
                values.push(cell.clone());
            }
            rows.push(values);
        }

        let normalized = Dataset::new(columns, rows)?.with_date_index(date_col, keys)?;

        if !normalized.is_sorted_by_key() {
            warn!(column = date_col, "dates are not in ascending order");
        }
        if tracing::enabled!(Level::DEBUG) {
            Self::log_yearly_diagnostics(&normalized);
        }
        info!(
            rows = normalized.height(),
            columns = normalized.width(),
            "normalized dates"
        );

        Ok(normalized)
    }

    fn parse_date_cells(
        dataset: &Dataset,
        date_pos: usize,
        explicit_format: Option<&str>,
    ) -> Result<Vec<NaiveDate>, ProcessorError> {
        let unresolved = |row: usize, value: String| ProcessorError::DateParse {
            row,
            value,
            format: explicit_format.unwrap_or("<none>").to_string(),
        };

        let mut cells = Vec::with_capacity(dataset.height());
        for (row_num, row) in dataset.rows().iter().enumerate() {
            let cell = match &row[date_pos] {
                Value::Date(d) => DateCell::Parsed(*d),
                Value::Text(s) => DateCell::Raw(s.trim().to_string()),
                Value::Number(v) if v.fract() == 0.0 => DateCell::Raw(format!("{v:.0}")),
                other => return Err(unresolved(row_num, other.to_string())),
            };
            cells.push(cell);
        }

        let format = match explicit_format {
            Some(pattern) => DateFormat::new(pattern),
            None => match cells.iter().enumerate().find_map(|(i, c)| match c {
                DateCell::Raw(text) => Some((i, text)),
                DateCell::Parsed(_) => None,
            }) {
                Some((row, sample)) => {
                    let inferred = DateFormat::infer(sample)
                        .ok_or_else(|| unresolved(row, sample.clone()))?;
                    debug!(format = inferred.as_str(), sample = %sample, "inferred date format");
                    inferred
                }
                None => DateFormat::iso(),
            },
        };

        cells
            .into_iter()
            .enumerate()
            .map(|(row, cell)| match cell {
                DateCell::Parsed(d) => Ok(d),
                DateCell::Raw(text) => {
                    format.parse(&text).ok_or_else(|| ProcessorError::DateParse {
                        row,
                        value: text,
                        format: format.as_str().to_string(),
                    })
                }
            })
            .collect()
    }

    fn check_duplicates(keys: &[NaiveDate]) -> Result<(), ProcessorError> {
        let mut seen: HashMap<NaiveDate, usize> = HashMap::with_capacity(keys.len());
        for (row, date) in keys.iter().enumerate() {
            if let Some(&first_row) = seen.get(date) {
                return Err(ProcessorError::DuplicateDate {
                    date: *date,
                    first_row,
                    row,
                });
            }
            seen.insert(*date, row);
        }
        Ok(())
    }

    fn log_yearly_diagnostics(dataset: &Dataset) {
        let Ok(summary) = StatsCalculator::yearly_summary(dataset) else {
            return;
        };
        for year in &summary {
            for col in &year.columns {
                debug!(
                    year = year.year,
                    column = %col.column,
                    mean = col.mean,
                    count = col.count,
                    "yearly aggregate"
                );
            }
        }
    }

    /// Rows whose date key falls in `year`.
    pub fn select_year(dataset: &Dataset, year: i32) -> Result<Dataset, ProcessorError> {
        let keys = dataset.keys().ok_or(ProcessorError::NotDateKeyed)?;
        let positions = keys
            .iter()
            .enumerate()
            .filter(|(_, d)| d.year() == year)
            .map(|(i, _)| i)
            .collect();
        Ok(dataset.take_rows(positions))
    }

    /// Stable sort of rows by date key.
    pub fn sort_by_date(dataset: &Dataset) -> Result<Dataset, ProcessorError> {
        let keys = dataset.keys().ok_or(ProcessorError::NotDateKeyed)?;
        let mut positions: Vec<usize> = (0..keys.len()).collect();
        positions.sort_by_key(|&i| keys[i]);
        Ok(dataset.take_rows(positions))
    }
}

/// Normalize the `Date` column with default options.
pub fn normalize_dates(dataset: Dataset) -> Result<Dataset, ProcessorError> {
    DataProcessor::normalize_dates(&dataset, &NormalizeOptions::default())
}
