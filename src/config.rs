//! Analysis configuration, read from an optional JSON file.

use crate::data::{DataLoader, NormalizeOptions};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Field separator; must be a single ASCII character.
    pub separator: char,
    /// Rows scanned to settle column types; `null` scans the whole file.
    pub infer_schema_length: Option<usize>,
    pub normalize: NormalizeOptions,
    /// Rows shown in the preview table.
    pub head_rows: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            separator: ',',
            infer_schema_length: Some(10000),
            normalize: NormalizeOptions::default(),
            head_rows: 5,
        }
    }
}

impl AnalysisConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("parse config '{}'", path.display()))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let config: AnalysisConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.separator.is_ascii() {
            bail!("separator must be an ASCII character, got '{}'", self.separator);
        }
        if self.normalize.date_column.trim().is_empty() {
            bail!("normalize.date_column must not be empty");
        }
        Ok(())
    }

    pub fn loader(&self) -> DataLoader {
        DataLoader::new()
            .with_separator(self.separator as u8)
            .with_infer_schema_length(self.infer_schema_length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DuplicateDates;

    #[test]
    fn empty_object_is_default() {
        assert_eq!(AnalysisConfig::from_json("{}").unwrap(), AnalysisConfig::default());
    }

    #[test]
    fn nested_normalize_options() {
        let config = AnalysisConfig::from_json(
            r#"{"separator": ";", "head_rows": 10, "normalize": {"date_column": "day", "duplicates": "keep"}}"#,
        )
        .unwrap();
        assert_eq!(config.separator, ';');
        assert_eq!(config.head_rows, 10);
        assert_eq!(config.normalize.date_column, "day");
        assert_eq!(config.normalize.duplicates, DuplicateDates::Keep);
    }

    #[test]
    fn rejects_non_ascii_separator() {
        assert!(AnalysisConfig::from_json(r#"{"separator": "§"}"#).is_err());
    }

    #[test]
    fn rejects_unknown_policy() {
        assert!(AnalysisConfig::from_json(r#"{"normalize": {"duplicates": "merge"}}"#).is_err());
    }

    #[test]
    fn missing_file_reports_path() {
        let err = AnalysisConfig::from_file("no/such/config.json").unwrap_err();
        assert!(format!("{err:#}").contains("no/such/config.json"));
    }
}
