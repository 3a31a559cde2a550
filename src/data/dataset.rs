//! Dataset Module
//! In-memory table: ordered rows over a fixed, typed column schema.

use chrono::NaiveDate;
use polars::prelude::*;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Row {row} has {found} cells, schema has {expected} columns")]
    RowWidth {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("Duplicate column name: {0}")]
    DuplicateColumn(String),
    #[error("Index has {keys} keys for {rows} rows")]
    KeyCount { keys: usize, rows: usize },
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
}

/// Declared type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ColumnType {
    Number,
    Text,
    Date,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::Number => "number",
            ColumnType::Text => "text",
            ColumnType::Date => "date",
        };
        f.write_str(name)
    }
}

/// A single cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Value {
    Number(f64),
    Text(String),
    Date(NaiveDate),
    Missing,
}

impl Value {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(v) => write!(f, "{v}"),
            Value::Text(s) => f.write_str(s),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::Missing => f.write_str("null"),
        }
    }
}

/// Column name plus declared type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnSpec {
    pub name: String,
    pub dtype: ColumnType,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, dtype: ColumnType) -> Self {
        Self {
            name: name.into(),
            dtype,
        }
    }
}

/// How rows are keyed.
#[derive(Debug, Clone, PartialEq)]
pub enum RowIndex {
    /// Keyed by row position.
    Positional,
    /// Keyed by calendar date; `name` is the column the keys came from.
    Date { name: String, keys: Vec<NaiveDate> },
}

/// Ordered sequence of rows over a fixed column schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    columns: Vec<ColumnSpec>,
    rows: Vec<Vec<Value>>,
    index: RowIndex,
}

impl Dataset {
    /// Build a positionally indexed dataset, checking row widths and column names.
    pub fn new(columns: Vec<ColumnSpec>, rows: Vec<Vec<Value>>) -> Result<Self, DatasetError> {
        for (i, col) in columns.iter().enumerate() {
            if columns[..i].iter().any(|c| c.name == col.name) {
                return Err(DatasetError::DuplicateColumn(col.name.clone()));
            }
        }

        for (row, cells) in rows.iter().enumerate() {
            if cells.len() != columns.len() {
                return Err(DatasetError::RowWidth {
                    row,
                    expected: columns.len(),
                    found: cells.len(),
                });
            }
        }

        Ok(Self {
            columns,
            rows,
            index: RowIndex::Positional,
        })
    }

    /// Replace the row index with date keys, one per row.
    pub fn with_date_index(
        mut self,
        name: impl Into<String>,
        keys: Vec<NaiveDate>,
    ) -> Result<Self, DatasetError> {
        if keys.len() != self.rows.len() {
            return Err(DatasetError::KeyCount {
                keys: keys.len(),
                rows: self.rows.len(),
            });
        }
        self.index = RowIndex::Date {
            name: name.into(),
            keys,
        };
        Ok(self)
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn column_position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn column_type(&self, name: &str) -> Option<ColumnType> {
        self.columns.iter().find(|c| c.name == name).map(|c| c.dtype)
    }

    /// Cells of one column, top to bottom.
    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        let pos = self.column_position(name)?;
        Some(self.rows.iter().map(|row| &row[pos]).collect())
    }

    /// Numeric view of a column; `None` for missing or non-numeric cells.
    pub fn numeric_column(&self, name: &str) -> Option<Vec<Option<f64>>> {
        let pos = self.column_position(name)?;
        Some(self.rows.iter().map(|row| row[pos].as_number()).collect())
    }

    pub fn numeric_column_names(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| c.dtype == ColumnType::Number)
            .map(|c| c.name.clone())
            .collect()
    }

    pub fn row(&self, i: usize) -> Option<&[Value]> {
        self.rows.get(i).map(Vec::as_slice)
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn index(&self) -> &RowIndex {
        &self.index
    }

    /// Date keys, if the dataset has been normalized.
    pub fn keys(&self) -> Option<&[NaiveDate]> {
        match &self.index {
            RowIndex::Date { keys, .. } => Some(keys),
            RowIndex::Positional => None,
        }
    }

    pub fn is_date_keyed(&self) -> bool {
        matches!(self.index, RowIndex::Date { .. })
    }

    /// True when date keys are non-decreasing. Positional datasets are trivially sorted.
    pub fn is_sorted_by_key(&self) -> bool {
        self.keys()
            .map(|keys| keys.windows(2).all(|w| w[0] <= w[1]))
            .unwrap_or(true)
    }

    /// First `n` rows, keeping the schema and the matching keys.
    pub fn head(&self, n: usize) -> Dataset {
        self.take_rows((0..self.height().min(n)).collect())
    }

    /// Rows at the given positions, in the given order.
    pub(crate) fn take_rows(&self, positions: Vec<usize>) -> Dataset {
        let rows = positions.iter().map(|&i| self.rows[i].clone()).collect();
        let index = match &self.index {
            RowIndex::Positional => RowIndex::Positional,
            RowIndex::Date { name, keys } => RowIndex::Date {
                name: name.clone(),
                keys: positions.iter().map(|&i| keys[i]).collect(),
            },
        };

        Dataset {
            columns: self.columns.clone(),
            rows,
            index,
        }
    }

    /// Convert to a polars `DataFrame`. Date keys become a leading date column.
    pub fn to_dataframe(&self) -> Result<DataFrame, DatasetError> {
        let mut out: Vec<Column> = Vec::with_capacity(self.width() + 1);

        if let RowIndex::Date { name, keys } = &self.index {
            out.push(Column::new(name.as_str().into(), keys.clone()));
        }

        for (pos, spec) in self.columns.iter().enumerate() {
            let name: PlSmallStr = spec.name.as_str().into();
            let column = match spec.dtype {
                ColumnType::Number => {
                    let values: Vec<Option<f64>> =
                        self.rows.iter().map(|row| row[pos].as_number()).collect();
                    Column::new(name, values)
                }
                ColumnType::Date => {
                    let values: Vec<Option<NaiveDate>> = self
                        .rows
                        .iter()
                        .map(|row| match &row[pos] {
                            Value::Date(d) => Some(*d),
                            _ => None,
                        })
                        .collect();
                    Column::new(name, values)
                }
                ColumnType::Text => {
                    let values: Vec<Option<String>> = self
                        .rows
                        .iter()
                        .map(|row| match &row[pos] {
                            Value::Missing => None,
                            other => Some(other.to_string()),
                        })
                        .collect();
                    Column::new(name, values)
                }
            };
            out.push(column);
        }

        Ok(DataFrame::new(out)?)
    }
}
