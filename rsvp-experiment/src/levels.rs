use rsvp_core::ConfigError;

/// Candidate stimulus levels, sorted descending (easiest first).
#[derive(Debug, Clone, PartialEq)]
pub struct LevelScale {
    values: Vec<f64>,
}

impl LevelScale {
    pub fn new(values: impl IntoIterator<Item = f64>) -> Result<Self, ConfigError> {
        let mut values: Vec<f64> = values.into_iter().collect();
        if values.is_empty() {
            return Err(ConfigError::EmptyLevelScale);
        }
        if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
            return Err(ConfigError::NonFiniteLevel(*bad));
        }
        values.sort_by(|a, b| b.total_cmp(a));
        Ok(Self { values })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn last_index(&self) -> usize {
        self.values.len() - 1
    }

    pub fn get(&self, index: usize) -> f64 {
        self.values[index.min(self.last_index())]
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// First index whose value is at or below `start`; 0 when none is.
    pub fn start_index(&self, start: f64) -> usize {
        self.values.iter().position(|v| *v <= start).unwrap_or(0)
    }
}
