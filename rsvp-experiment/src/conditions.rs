use crate::levels::LevelScale;
use rsvp_core::ConfigError;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

pub const SIZE_FILE: &str = "conditions.csv";
pub const SIZE_COLUMN: &str = "logmar";
pub const CONTRAST_FILE: &str = "contrast_conditions.csv";
pub const CONTRAST_COLUMN: &str = "contrastPct";

#[derive(Debug, Error)]
pub enum ConditionError {
    #[error("cannot read {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },
    #[error("{path} has no `{column}` column")]
    MissingColumn { path: String, column: String },
    #[error("{path} row {row}: `{value}` is not a number")]
    BadValue { path: String, row: usize, value: String },
    #[error(transparent)]
    Scale(#[from] ConfigError),
}

/// Where the size (LogMAR) and contrast (percent) levels come from.
pub trait ConditionSource {
    fn size_levels(&self) -> Result<LevelScale, ConditionError>;
    fn contrast_levels(&self) -> Result<LevelScale, ConditionError>;
}

/// LogMAR 1.0 down to -0.3 in 0.1 steps.
pub fn default_logmar() -> Vec<f64> {
    (0..=13).map(|i| (10 - i) as f64 / 10.0).collect()
}

pub fn default_contrast_pct() -> Vec<f64> {
    vec![
        100.0, 90.0, 80.0, 70.0, 60.0, 50.0, 40.0, 30.0, 20.0, 10.0, 5.0, 2.5, 1.25,
    ]
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinConditions;

impl ConditionSource for BuiltinConditions {
    fn size_levels(&self) -> Result<LevelScale, ConditionError> {
        Ok(LevelScale::new(default_logmar())?)
    }

    fn contrast_levels(&self) -> Result<LevelScale, ConditionError> {
        Ok(LevelScale::new(default_contrast_pct())?)
    }
}

/// Condition tables in a directory. A missing file falls back to the
/// built-in levels; a malformed one is an error.
#[derive(Debug, Clone)]
pub struct CsvConditions {
    dir: PathBuf,
}

impl CsvConditions {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn load(&self, file: &str, column: &str, fallback: Vec<f64>) -> Result<LevelScale, ConditionError> {
        let path = self.dir.join(file);
        if !path.exists() {
            warn!(path = %path.display(), "condition file not found, using defaults");
            return Ok(LevelScale::new(fallback)?);
        }
        let values = read_column(&path, column)?;
        info!(path = %path.display(), levels = values.len(), "loaded conditions");
        Ok(LevelScale::new(values)?)
    }
}

impl ConditionSource for CsvConditions {
    fn size_levels(&self) -> Result<LevelScale, ConditionError> {
        self.load(SIZE_FILE, SIZE_COLUMN, default_logmar())
    }

    fn contrast_levels(&self) -> Result<LevelScale, ConditionError> {
        self.load(CONTRAST_FILE, CONTRAST_COLUMN, default_contrast_pct())
    }
}

/// Reads one numeric column by header name.
pub fn read_column(path: &Path, column: &str) -> Result<Vec<f64>, ConditionError> {
    let display = path.display().to_string();
    let csv_error = |source| ConditionError::Csv {
        path: display.clone(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(csv_error)?;
    let index = reader
        .headers()
        .map_err(csv_error)?
        .iter()
        .position(|h| h == column)
        .ok_or_else(|| ConditionError::MissingColumn {
            path: display.clone(),
            column: column.to_string(),
        })?;

    let mut values = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(csv_error)?;
        let raw = record.get(index).unwrap_or_default();
        let value = raw.parse::<f64>().map_err(|_| ConditionError::BadValue {
            path: display.clone(),
            row: row + 1,
            value: raw.to_string(),
        })?;
        values.push(value);
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn builtin_levels_match_legacy_tables() {
        let sizes = BuiltinConditions.size_levels().unwrap();
        assert_eq!(sizes.len(), 14);
        assert_eq!(sizes.get(0), 1.0);
        assert_eq!(sizes.get(13), -0.3);
        let contrast = BuiltinConditions.contrast_levels().unwrap();
        assert_eq!(contrast.values().last(), Some(&1.25));
    }

    #[test]
    fn missing_files_fall_back() {
        let dir = tempfile::tempdir().unwrap();
        let source = CsvConditions::new(dir.path());
        assert_eq!(source.size_levels().unwrap().len(), 14);
        assert_eq!(source.contrast_levels().unwrap().len(), 13);
    }

    #[test]
    fn reads_named_column_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(SIZE_FILE), "label,logmar\na, 0.2\nb,0.8\nc,0.5\n").unwrap();
        let scale = CsvConditions::new(dir.path()).size_levels().unwrap();
        assert_eq!(scale.values(), &[0.8, 0.5, 0.2]);
    }

    #[test]
    fn malformed_tables_are_errors() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONTRAST_FILE), "pct\n100\n").unwrap();
        assert!(matches!(
            CsvConditions::new(dir.path()).contrast_levels(),
            Err(ConditionError::MissingColumn { .. })
        ));

        fs::write(dir.path().join(SIZE_FILE), "logmar\n0.3\nbig\n").unwrap();
        let err = CsvConditions::new(dir.path()).size_levels().unwrap_err();
        assert!(matches!(err, ConditionError::BadValue { row: 2, .. }), "{err}");

        fs::write(dir.path().join(SIZE_FILE), "logmar\n").unwrap();
        assert!(matches!(
            CsvConditions::new(dir.path()).size_levels(),
            Err(ConditionError::Scale(ConfigError::EmptyLevelScale))
        ));
    }
}
