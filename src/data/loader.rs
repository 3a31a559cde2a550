//! CSV Data Loader Module
//! Reads a delimited file with Polars and converts it into a [`Dataset`].

use crate::data::dataset::{ColumnSpec, ColumnType, Dataset, DatasetError, Value};
use chrono::NaiveDate;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Failed to parse CSV: {0}")]
    Parse(#[from] PolarsError),
    #[error("Failed to build dataset: {0}")]
    Dataset(#[from] DatasetError),
}

/// Loads CSV files into datasets. Holds reader options only; every call is independent.
#[derive(Debug, Clone)]
pub struct DataLoader {
    separator: u8,
    infer_schema_length: Option<usize>,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    pub fn new() -> Self {
        Self {
            separator: b',',
            infer_schema_length: Some(10000),
        }
    }

    pub fn with_separator(mut self, separator: u8) -> Self {
        self.separator = separator;
        self
    }

    /// `None` scans the whole file before settling column types.
    pub fn with_infer_schema_length(mut self, rows: Option<usize>) -> Self {
        self.infer_schema_length = rows;
        self
    }

    /// Load a CSV file with a header row.
    pub fn load_csv(&self, file_path: impl AsRef<Path>) -> Result<Dataset, LoaderError> {
        let path = file_path.as_ref();
        if !path.exists() {
            return Err(LoaderError::NotFound(path.to_path_buf()));
        }

        let df = LazyCsvReader::new(path)
            .with_has_header(true)
            .with_separator(self.separator)
            .with_infer_schema_length(self.infer_schema_length)
            .with_ignore_errors(false)
            .finish()?
            .collect()?;

        let dataset = Self::from_dataframe(&df)?;
        info!(
            path = %path.display(),
            rows = dataset.height(),
            columns = dataset.width(),
            "loaded csv"
        );
        for spec in dataset.columns() {
            debug!(column = %spec.name, dtype = %spec.dtype, "column");
        }

        Ok(dataset)
    }

    /// Convert a Polars frame into a dataset, column by column.
    ///
    /// Integer columns are read as `f64`, which is exact up to 2^53. `Datetime`
    /// columns are truncated to their calendar date.
    pub fn from_dataframe(df: &DataFrame) -> Result<Dataset, LoaderError> {
        let mut specs = Vec::with_capacity(df.width());
        let mut cells: Vec<Vec<Value>> = Vec::with_capacity(df.width());

        for col in df.get_columns() {
            let name = col.name().to_string();
            match col.dtype() {
                dtype if is_numeric(dtype) => {
                    let values = col.cast(&DataType::Float64)?;
                    let ca = values.f64()?;
                    cells.push(
                        ca.into_iter()
                            .map(|v| v.map_or(Value::Missing, Value::Number))
                            .collect(),
                    );
                    specs.push(ColumnSpec::new(name, ColumnType::Number));
                }
                DataType::Date | DataType::Datetime(_, _) => {
                    // Days since the Unix epoch.
                    let days = col.cast(&DataType::Date)?.cast(&DataType::Int32)?;
                    let ca = days.i32()?;
                    cells.push(
                        ca.into_iter()
                            .map(|v| {
                                v.and_then(|d| {
                                    NaiveDate::from_num_days_from_ce_opt(d + UNIX_EPOCH_DAYS_FROM_CE)
                                })
                                .map_or(Value::Missing, Value::Date)
                            })
                            .collect(),
                    );
                    specs.push(ColumnSpec::new(name, ColumnType::Date));
                }
                _ => {
                    let values = col.cast(&DataType::String)?;
                    let ca = values.str()?;
                    cells.push(
                        ca.into_iter()
                            .map(|v| v.map_or(Value::Missing, |s| Value::Text(s.to_string())))
                            .collect(),
                    );
                    specs.push(ColumnSpec::new(name, ColumnType::Text));
                }
            }
        }

        let rows = (0..df.height())
            .map(|i| cells.iter().map(|column| column[i].clone()).collect())
            .collect();

        Ok(Dataset::new(specs, rows)?)
    }
}

/// 1970-01-01 counted from 0001-01-01 (day 1).
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

fn is_numeric(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Float32
            | DataType::Float64
            | DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
    )
}

/// Load a comma-separated file with default options.
pub fn load(path: impl AsRef<Path>) -> Result<Dataset, LoaderError> {
    DataLoader::new().load_csv(path)
}
