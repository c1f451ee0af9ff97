use rsvp_core::{SessionError, ThresholdRecord, TrialRecord};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Sink for per-trial rows and per-staircase thresholds.
pub trait TrialLog {
    fn record_trial(&mut self, record: &TrialRecord) -> Result<(), SessionError>;
    fn record_threshold(&mut self, record: &ThresholdRecord) -> Result<(), SessionError>;
}

impl<L: TrialLog + ?Sized> TrialLog for &mut L {
    fn record_trial(&mut self, record: &TrialRecord) -> Result<(), SessionError> {
        (**self).record_trial(record)
    }

    fn record_threshold(&mut self, record: &ThresholdRecord) -> Result<(), SessionError> {
        (**self).record_threshold(record)
    }
}

#[derive(Debug, Default, Clone)]
pub struct MemoryLog {
    pub trials: Vec<TrialRecord>,
    pub thresholds: Vec<ThresholdRecord>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TrialLog for MemoryLog {
    fn record_trial(&mut self, record: &TrialRecord) -> Result<(), SessionError> {
        self.trials.push(record.clone());
        Ok(())
    }

    fn record_threshold(&mut self, record: &ThresholdRecord) -> Result<(), SessionError> {
        self.thresholds.push(record.clone());
        Ok(())
    }
}

/// `<base>.csv` for trials and `<base>_thresholds.csv` for staircase
/// estimates. Every row is flushed so an aborted session keeps its data.
pub struct CsvTrialLog {
    trials: csv::Writer<File>,
    thresholds: csv::Writer<File>,
    trials_path: PathBuf,
    thresholds_path: PathBuf,
}

impl CsvTrialLog {
    pub fn create(base: &Path) -> Result<Self, SessionError> {
        let trials_path = suffixed(base, ".csv");
        let thresholds_path = suffixed(base, "_thresholds.csv");
        Ok(Self {
            trials: csv::Writer::from_path(&trials_path).map_err(log_error)?,
            thresholds: csv::Writer::from_path(&thresholds_path).map_err(log_error)?,
            trials_path,
            thresholds_path,
        })
    }

    pub fn trials_path(&self) -> &Path {
        &self.trials_path
    }

    pub fn thresholds_path(&self) -> &Path {
        &self.thresholds_path
    }
}

impl TrialLog for CsvTrialLog {
    fn record_trial(&mut self, record: &TrialRecord) -> Result<(), SessionError> {
        self.trials.serialize(record).map_err(log_error)?;
        self.trials.flush()?;
        debug!(trial = record.global_trial, "trial row written");
        Ok(())
    }

    fn record_threshold(&mut self, record: &ThresholdRecord) -> Result<(), SessionError> {
        self.thresholds.serialize(record).map_err(log_error)?;
        self.thresholds.flush()?;
        Ok(())
    }
}

/// `base` with `suffix` appended to its file name.
pub fn suffixed(base: &Path, suffix: &str) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

fn log_error(err: csv::Error) -> SessionError {
    SessionError::Log(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsvp_core::{Dimension, Eye};

    fn trial(n: usize) -> TrialRecord {
        TrialRecord {
            eye: Some(Eye::Left),
            phase: "left_eye_size".to_string(),
            trial: n,
            global_trial: n + 2,
            level: Some(0.7),
            size_deg: 0.4176,
            contrast_pct: 100.0,
            target: "K".to_string(),
            target_position: Some(4),
            stream: "1 2 3 4 K 5".to_string(),
            response: Some("K".to_string()),
            correct: Some(true),
            direction: Some("decreasing".to_string()),
            reversal: Some(false),
            reversal_count: Some(0),
        }
    }

    #[test]
    fn suffix_extends_file_name() {
        assert_eq!(
            suffixed(Path::new("data/participant_7"), "_summary.csv"),
            PathBuf::from("data/participant_7_summary.csv")
        );
    }

    #[test]
    fn csv_rows_are_visible_before_drop() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = CsvTrialLog::create(&dir.path().join("p01")).unwrap();
        log.record_trial(&trial(1)).unwrap();
        log.record_trial(&trial(2)).unwrap();

        let text = std::fs::read_to_string(log.trials_path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("eye,phase,trial,global_trial,level"));
        assert!(lines[1].starts_with("left,left_eye_size,1,3,0.7"));
    }

    #[test]
    fn thresholds_go_to_their_own_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = CsvTrialLog::create(&dir.path().join("p01")).unwrap();
        log.record_threshold(&ThresholdRecord {
            eye: Eye::Right,
            dimension: Dimension::Contrast,
            threshold: 7.5,
            trials: 14,
            reversals: 2,
            converged: true,
        })
        .unwrap();
        let text = std::fs::read_to_string(dir.path().join("p01_thresholds.csv")).unwrap();
        assert_eq!(
            text,
            "eye,dimension,threshold,trials,reversals,converged\nright,contrast,7.5,14,2,true\n"
        );
    }

    #[test]
    fn memory_log_keeps_everything() {
        let mut log = MemoryLog::new();
        (&mut log).record_trial(&trial(1)).unwrap();
        assert_eq!(log.trials.len(), 1);
        assert!(log.thresholds.is_empty());
    }
}
