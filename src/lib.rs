//! SPX Explorer - price-series loading, date normalization and exploratory statistics
//!
//! Reads a CSV of index/commodity prices (`Date`, `SPX`, `GLD`, `SLV`), re-keys
//! the rows by calendar date and summarizes them.

pub mod config;
pub mod data;
pub mod stats;

pub use config::AnalysisConfig;
pub use data::{
    load, normalize_dates, ColumnSpec, ColumnType, DataLoader, DataProcessor, Dataset,
    LoaderError, NormalizeOptions, ProcessorError, Value,
};
pub use stats::StatsCalculator;
