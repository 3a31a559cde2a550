//! Statistics Calculator Module
//! Descriptive statistics, per-year aggregates and Pearson correlation.

use crate::data::Dataset;
use chrono::Datelike;
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, StudentsT};
use std::collections::BTreeMap;
use thiserror::Error;

/// Significance threshold for correlation p-values
pub const SIGNIFICANCE_THRESHOLD: f64 = 0.05;

#[derive(Error, Debug)]
pub enum StatsError {
    #[error("Yearly summary needs a date-keyed dataset")]
    NotDateKeyed,
}

/// Describe-style statistics for one numeric column.
#[derive(Debug, Clone, Serialize)]
pub struct ColumnStats {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub p25: f64,
    pub median: f64,
    pub p75: f64,
    pub max: f64,
}

impl Default for ColumnStats {
    fn default() -> Self {
        Self {
            column: String::new(),
            count: 0,
            mean: f64::NAN,
            std: f64::NAN,
            min: f64::NAN,
            p25: f64::NAN,
            median: f64::NAN,
            p75: f64::NAN,
            max: f64::NAN,
        }
    }
}

/// Mean and non-missing count of one column within one year.
#[derive(Debug, Clone, Serialize)]
pub struct YearlyColumnStats {
    pub column: String,
    pub mean: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct YearlySummary {
    pub year: i32,
    pub rows: usize,
    pub columns: Vec<YearlyColumnStats>,
}

impl YearlySummary {
    pub fn column(&self, name: &str) -> Option<&YearlyColumnStats> {
        self.columns.iter().find(|c| c.column == name)
    }
}

/// Pairwise Pearson correlation over the numeric columns of a dataset.
#[derive(Debug, Clone, Serialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub coefficients: Vec<Vec<f64>>,
    /// Two-tailed p-values (Student's t, n - 2 degrees of freedom).
    pub p_values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        Some(self.coefficients[self.position(a)?][self.position(b)?])
    }

    pub fn p_value(&self, a: &str, b: &str) -> Option<f64> {
        Some(self.p_values[self.position(a)?][self.position(b)?])
    }

    pub fn is_significant(&self, a: &str, b: &str) -> bool {
        self.p_value(a, b)
            .map(|p| p <= SIGNIFICANCE_THRESHOLD)
            .unwrap_or(false)
    }
}

/// Handles statistical calculations.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Compute descriptive statistics for an array of values.
    pub fn compute_descriptive_stats(values: &[f64]) -> ColumnStats {
        let n = values.len();
        if n == 0 {
            return ColumnStats::default();
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let mean = values.iter().sum::<f64>() / n as f64;
        let variance = if n > 1 {
            values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64
        } else {
            f64::NAN
        };

        ColumnStats {
            column: String::new(),
            count: n,
            mean,
            std: variance.sqrt(),
            min: sorted[0],
            p25: Self::percentile(&sorted, 25.0),
            median: Self::percentile(&sorted, 50.0),
            p75: Self::percentile(&sorted, 75.0),
            max: sorted[n - 1],
        }
    }

    /// Calculate percentile using linear interpolation (NumPy compatible).
    fn percentile(sorted_values: &[f64], p: f64) -> f64 {
        let n = sorted_values.len();
        if n == 0 {
            return f64::NAN;
        }
        if n == 1 {
            return sorted_values[0];
        }

        let rank = (p / 100.0) * (n - 1) as f64;
        let lower = rank.floor() as usize;
        let upper = (rank.ceil() as usize).min(n - 1);
        let frac = rank - lower as f64;

        if lower == upper {
            sorted_values[lower]
        } else {
            sorted_values[lower] * (1.0 - frac) + sorted_values[upper] * frac
        }
    }

    /// One entry per numeric column; missing cells are skipped.
    pub fn describe(dataset: &Dataset) -> Vec<ColumnStats> {
        dataset
            .numeric_column_names()
            .into_iter()
            .map(|name| {
                let values: Vec<f64> = dataset
                    .numeric_column(&name)
                    .unwrap_or_default()
                    .into_iter()
                    .flatten()
                    .collect();
                let mut stats = Self::compute_descriptive_stats(&values);
                stats.column = name;
                stats
            })
            .collect()
    }

    /// Mean and count of every numeric column, grouped by calendar year of the row key.
    pub fn yearly_summary(dataset: &Dataset) -> Result<Vec<YearlySummary>, StatsError> {
        let keys = dataset.keys().ok_or(StatsError::NotDateKeyed)?;

        let mut by_year: BTreeMap<i32, Vec<usize>> = BTreeMap::new();
        for (row, date) in keys.iter().enumerate() {
            by_year.entry(date.year()).or_default().push(row);
        }

        let numeric: Vec<(String, Vec<Option<f64>>)> = dataset
            .numeric_column_names()
            .into_iter()
            .map(|name| {
                let values = dataset.numeric_column(&name).unwrap_or_default();
                (name, values)
            })
            .collect();

        let summary = by_year
            .into_iter()
            .map(|(year, rows)| {
                let columns = numeric
                    .iter()
                    .map(|(name, values)| {
                        let present: Vec<f64> = rows.iter().filter_map(|&r| values[r]).collect();
                        let count = present.len();
                        let mean = if count == 0 {
                            f64::NAN
                        } else {
                            present.iter().sum::<f64>() / count as f64
                        };
                        YearlyColumnStats {
                            column: name.clone(),
                            mean,
                            count,
                        }
                    })
                    .collect();
                YearlySummary {
                    year,
                    rows: rows.len(),
                    columns,
                }
            })
            .collect();

        Ok(summary)
    }

    /// Pearson correlation between two series, using only rows where both are present.
    ///
    /// Returns `(coefficient, p_value, paired_count)`.
    pub fn pearson(x: &[Option<f64>], y: &[Option<f64>]) -> (f64, f64, usize) {
        let pairs: Vec<(f64, f64)> = x
            .iter()
            .zip(y.iter())
            .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
            .collect();
        let n = pairs.len();
        if n < 2 {
            return (f64::NAN, f64::NAN, n);
        }

        let nf = n as f64;
        let mean_x = pairs.iter().map(|(a, _)| a).sum::<f64>() / nf;
        let mean_y = pairs.iter().map(|(_, b)| b).sum::<f64>() / nf;

        let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
        for (a, b) in &pairs {
            let dx = a - mean_x;
            let dy = b - mean_y;
            sxy += dx * dy;
            sxx += dx * dx;
            syy += dy * dy;
        }
        if sxx == 0.0 || syy == 0.0 {
            return (f64::NAN, f64::NAN, n);
        }

        let r = (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0);
        (r, Self::correlation_p_value(r, n), n)
    }

    /// Two-tailed p-value for a correlation coefficient under H0: rho = 0.
    fn correlation_p_value(r: f64, n: usize) -> f64 {
        if n < 3 || r.is_nan() {
            return f64::NAN;
        }
        if r.abs() == 1.0 {
            return 0.0;
        }

        let df = (n - 2) as f64;
        let t = r * (df / (1.0 - r * r)).sqrt();

        match StudentsT::new(0.0, 1.0, df) {
            Ok(dist) => 2.0 * (1.0 - dist.cdf(t.abs())),
            Err(_) => f64::NAN,
        }
    }

    /// Correlation matrix over all numeric columns.
    pub fn correlation_matrix(dataset: &Dataset) -> CorrelationMatrix {
        let columns = dataset.numeric_column_names();
        let series: Vec<Vec<Option<f64>>> = columns
            .iter()
            .map(|name| dataset.numeric_column(name).unwrap_or_default())
            .collect();

        let k = columns.len();
        let mut coefficients = vec![vec![f64::NAN; k]; k];
        let mut p_values = vec![vec![f64::NAN; k]; k];

        for i in 0..k {
            for j in i..k {
                let (mut r, p, _) = Self::pearson(&series[i], &series[j]);
                if i == j && !r.is_nan() {
                    r = 1.0;
                }
                coefficients[i][j] = r;
                coefficients[j][i] = r;
                p_values[i][j] = p;
                p_values[j][i] = p;
            }
        }

        CorrelationMatrix {
            columns,
            coefficients,
            p_values,
        }
    }
}
