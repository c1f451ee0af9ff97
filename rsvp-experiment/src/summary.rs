use crate::record::suffixed;
use rsvp_core::{Dimension, Eye, SessionError, ThresholdRecord};
use std::fmt;
use std::path::{Path, PathBuf};

/// Per-session aggregate: one threshold per (eye, dimension) for adaptive
/// sessions, none for sweeps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSummary {
    pub participant: String,
    pub thresholds: Vec<ThresholdRecord>,
    pub trials: usize,
}

impl SessionSummary {
    pub fn new(participant: impl Into<String>) -> Self {
        Self {
            participant: participant.into(),
            ..Self::default()
        }
    }

    pub fn threshold(&self, eye: Eye, dimension: Dimension) -> Option<&ThresholdRecord> {
        self.thresholds
            .iter()
            .find(|t| t.eye == eye && t.dimension == dimension)
    }

    /// `(measure, value)` rows, e.g. `left_size_threshold`.
    pub fn measures(&self) -> Vec<(String, String)> {
        let mut rows = Vec::new();
        for t in &self.thresholds {
            let prefix = format!("{}_{}", t.eye, t.dimension);
            rows.push((format!("{prefix}_threshold"), t.threshold.to_string()));
            rows.push((format!("{prefix}_trials"), t.trials.to_string()));
            rows.push((format!("{prefix}_converged"), t.converged.to_string()));
        }
        rows.push(("total_trials".to_string(), self.trials.to_string()));
        rows
    }

    /// Writes `<base>_summary.csv` with a `measure,value` header.
    pub fn write_csv(&self, base: &Path) -> Result<PathBuf, SessionError> {
        let path = suffixed(base, "_summary.csv");
        let mut writer =
            csv::Writer::from_path(&path).map_err(|e| SessionError::Log(e.to_string()))?;
        let log = |e: csv::Error| SessionError::Log(e.to_string());
        writer.write_record(["measure", "value"]).map_err(log)?;
        for (measure, value) in self.measures() {
            writer.write_record([measure, value]).map_err(log)?;
        }
        writer.flush()?;
        Ok(path)
    }
}

impl fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Results summary for {}", self.participant)?;
        for eye in [Eye::Left, Eye::Right] {
            let size = self.threshold(eye, Dimension::Size);
            let contrast = self.threshold(eye, Dimension::Contrast);
            if size.is_none() && contrast.is_none() {
                continue;
            }
            writeln!(f, "{eye} eye:")?;
            if let Some(t) = size {
                writeln!(f, "  size threshold (LogMAR): {:.2}{}", t.threshold, marker(t))?;
            }
            if let Some(t) = contrast {
                writeln!(f, "  contrast threshold: {:.2}%{}", t.threshold, marker(t))?;
            }
        }
        write!(f, "{} trials", self.trials)
    }
}

fn marker(t: &ThresholdRecord) -> &'static str {
    if t.converged { "" } else { " (not converged)" }
}
