//! Date format inference and parsing.
//!
//! A single format is chosen per column and applied to every row, so a
//! column that mixes `2020-01-02` with `01/02/2020` fails instead of being
//! read two different ways.

use chrono::{NaiveDate, NaiveDateTime};

/// Candidate formats, tried in order. Month-first wins over day-first for
/// slash-separated dates.
const CANDIDATE_FORMATS: [&str; 10] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%Y%m%d",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
];

/// A strftime pattern used to read one date column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateFormat(String);

impl DateFormat {
    /// The canonical format dates are rendered in.
    pub fn iso() -> Self {
        DateFormat("%Y-%m-%d".to_string())
    }

    pub fn new(pattern: impl Into<String>) -> Self {
        DateFormat(pattern.into())
    }

    /// Pick the first candidate format that reads `sample`.
    pub fn infer(sample: &str) -> Option<Self> {
        let sample = sample.trim();
        CANDIDATE_FORMATS
            .iter()
            .find(|fmt| parse_with(sample, fmt).is_some())
            .map(|fmt| DateFormat::new(*fmt))
    }

    pub fn parse(&self, text: &str) -> Option<NaiveDate> {
        parse_with(text.trim(), &self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn parse_with(text: &str, fmt: &str) -> Option<NaiveDate> {
    if fmt.contains("%H") {
        return NaiveDateTime::parse_from_str(text, fmt)
            .ok()
            .map(|dt| dt.date());
    }
    // Compact form must be exactly eight digits.
    if fmt == "%Y%m%d" && !(text.len() == 8 && text.bytes().all(|b| b.is_ascii_digit())) {
        return None;
    }
    NaiveDate::parse_from_str(text, fmt).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn infers_iso_dates() {
        let fmt = DateFormat::infer("2020-01-02").unwrap();
        assert_eq!(fmt, DateFormat::iso());
        assert_eq!(fmt.parse("2020-01-02"), Some(date(2020, 1, 2)));
    }

    #[test]
    fn slash_dates_are_month_first_when_ambiguous() {
        let fmt = DateFormat::infer("01/02/2020").unwrap();
        assert_eq!(fmt.as_str(), "%m/%d/%Y");
        assert_eq!(fmt.parse("01/02/2020"), Some(date(2020, 1, 2)));
    }

    #[test]
    fn slash_dates_fall_back_to_day_first() {
        let fmt = DateFormat::infer("13/02/2020").unwrap();
        assert_eq!(fmt.as_str(), "%d/%m/%Y");
        assert_eq!(fmt.parse("13/02/2020"), Some(date(2020, 2, 13)));
    }

    #[test]
    fn compact_and_timestamped_forms() {
        assert_eq!(DateFormat::infer("20200102").unwrap().as_str(), "%Y%m%d");

        let fmt = DateFormat::infer("2020-01-02 15:30:00").unwrap();
        assert_eq!(fmt.parse("2020-01-02 15:30:00"), Some(date(2020, 1, 2)));
    }

    #[test]
    fn fractional_seconds_are_read() {
        let fmt = DateFormat::infer("2020-01-02 00:00:00.000").unwrap();
        assert_eq!(fmt.as_str(), "%Y-%m-%d %H:%M:%S%.f");
        assert_eq!(fmt.parse("2020-01-03 09:15:00.250"), Some(date(2020, 1, 3)));
    }

    #[test]
    fn one_format_per_column() {
        let fmt = DateFormat::infer("2020-01-02").unwrap();
        assert_eq!(fmt.parse("01/02/2020"), None);
    }

    #[test]
    fn garbage_is_not_inferred() {
        assert!(DateFormat::infer("invalid-date").is_none());
        assert!(DateFormat::infer("").is_none());
        assert!(DateFormat::infer("2020-02-30").is_none());
    }

    #[test]
    fn canonical_rendering_reparses_to_same_date() {
        let d = date(2024, 2, 29);
        let rendered = d.format(DateFormat::iso().as_str()).to_string();
        assert_eq!(DateFormat::infer(&rendered).unwrap().parse(&rendered), Some(d));
    }
}
