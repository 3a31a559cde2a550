//! Data module - CSV loading, date normalization and the dataset type

mod dataset;
mod dates;
mod loader;
mod processor;

pub use dataset::{ColumnSpec, ColumnType, Dataset, DatasetError, RowIndex, Value};
pub use dates::DateFormat;
pub use loader::{load, DataLoader, LoaderError};
pub use processor::{
    normalize_dates, DataProcessor, DuplicateDates, MissingValues, NormalizeOptions,
    ProcessorError,
};
