//! Stats module - Descriptive statistics, yearly summaries and correlation

mod calculator;

pub use calculator::{
    ColumnStats, CorrelationMatrix, StatsCalculator, StatsError, YearlyColumnStats,
    YearlySummary, SIGNIFICANCE_THRESHOLD,
};
