use crate::seed::SeedMode;
use crate::staircase::StaircaseRule;
use rsvp_core::{ConfigError, Dimension};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("cannot parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Invalid(#[from] ConfigError),
}

/// Which judgement the participant makes after each stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// Name the embedded target letter.
    #[default]
    Identification,
    /// Report whether a target was present (yes/no).
    Detection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    pub length: usize,
    pub target_position_min: usize,
    pub target_position_max: usize,
    pub targets: Vec<String>,
    pub distractors: Vec<String>,
    /// Only consulted by detection tasks.
    pub target_present_probability: f64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            length: 16,
            target_position_min: 3,
            target_position_max: 8,
            targets: ["C", "D", "H", "K", "N", "F", "R", "S", "V", "Z"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            distractors: (1..=9).map(|d| d.to_string()).collect(),
            target_present_probability: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub item_duration_ms: f64,
    /// Practice items last `item_duration_ms / practice_speed_factor`.
    pub practice_speed_factor: f64,
    pub pre_stream_fixation_ms: u64,
    pub post_stream_response_ms: u64,
    pub post_stream_passive_ms: u64,
    pub fallback_refresh_hz: f64,
    pub calibration_frames: usize,
    pub fixation_symbol: String,
    pub end_symbol: String,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            item_duration_ms: 100.0,
            practice_speed_factor: 1.0,
            pre_stream_fixation_ms: 700,
            post_stream_response_ms: 500,
            post_stream_passive_ms: 1000,
            fallback_refresh_hz: 60.0,
            calibration_frames: 120,
            fixation_symbol: "+".to_string(),
            end_symbol: "+".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaircaseConfig {
    pub size_reversals: usize,
    pub contrast_reversals: usize,
    pub max_consecutive_errors: usize,
    pub min_trials: usize,
    /// Hard cap per staircase, independent of convergence.
    pub max_trials: usize,
    pub size_start_logmar: f64,
    pub contrast_start_pct: f64,
}

impl StaircaseConfig {
    pub fn rule(&self, dimension: Dimension) -> StaircaseRule {
        StaircaseRule {
            required_reversals: match dimension {
                Dimension::Size => self.size_reversals,
                Dimension::Contrast => self.contrast_reversals,
            },
            min_trials: self.min_trials,
            max_consecutive_errors: self.max_consecutive_errors,
        }
    }
}

impl Default for StaircaseConfig {
    fn default() -> Self {
        Self {
            size_reversals: 2,
            contrast_reversals: 2,
            max_consecutive_errors: 2,
            min_trials: 10,
            max_trials: 100,
            size_start_logmar: 1.0,
            contrast_start_pct: 100.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PracticeConfig {
    pub trials: usize,
    /// Index into the size scale (clamped to the last level). Adaptive
    /// sessions only; sweep practice uses the largest size.
    pub level_index: usize,
    pub contrast_pct: f64,
}

impl Default for PracticeConfig {
    fn default() -> Self {
        Self {
            trials: 2,
            level_index: 3,
            contrast_pct: 100.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    pub dimension: Dimension,
    pub trials_per_level: usize,
    pub passive_block: bool,
    /// Fixed size used while sweeping contrast.
    pub fixed_size_logmar: f64,
    /// Fixed contrast used while sweeping size.
    pub fixed_contrast_pct: f64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            dimension: Dimension::Size,
            trials_per_level: 16,
            passive_block: true,
            fixed_size_logmar: 1.0,
            fixed_contrast_pct: 100.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerConfig {
    pub stream_start: u8,
    pub target_onset: u8,
    pub stream_end: u8,
    /// Per-item onset codes, keyed by item label.
    pub items: BTreeMap<String, u8>,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        let mut items: BTreeMap<String, u8> = (1..=9u8).map(|d| (d.to_string(), d)).collect();
        for (i, letter) in ["C", "D", "H", "K", "N", "F", "R", "S", "V", "Z"].iter().enumerate() {
            items.insert(letter.to_string(), 10 + i as u8);
        }
        Self {
            stream_start: 101,
            target_onset: 102,
            stream_end: 103,
            items,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub task: TaskKind,
    pub stream: StreamConfig,
    pub timing: TimingConfig,
    pub staircase: StaircaseConfig,
    pub practice: PracticeConfig,
    pub sweep: SweepConfig,
    pub triggers: TriggerConfig,
    pub seed: SeedMode,
    /// Background gray on the -1..1 scale.
    pub background: f64,
    /// Wait for SPACE between trials.
    pub pause_between_trials: bool,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            task: TaskKind::default(),
            stream: StreamConfig::default(),
            timing: TimingConfig::default(),
            staircase: StaircaseConfig::default(),
            practice: PracticeConfig::default(),
            sweep: SweepConfig::default(),
            triggers: TriggerConfig::default(),
            seed: SeedMode::default(),
            background: 0.0,
            pause_between_trials: true,
        }
    }
}

impl ExperimentConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigLoadError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ConfigLoadError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigLoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let stream = &self.stream;
        if stream.length == 0 {
            return Err(ConfigError::EmptyStream);
        }
        if stream.targets.is_empty() {
            return Err(ConfigError::EmptyTargetSet);
        }
        let distinct: BTreeSet<&String> = stream.distractors.iter().collect();
        if distinct.len() < 2 {
            return Err(ConfigError::DistractorSetTooSmall(distinct.len()));
        }
        if stream.target_position_min > stream.target_position_max
            || stream.target_position_max >= stream.length
        {
            return Err(ConfigError::TargetRangeOutOfBounds {
                min: stream.target_position_min,
                max: stream.target_position_max,
                len: stream.length,
            });
        }
        if !(0.0..=1.0).contains(&stream.target_present_probability) {
            return Err(ConfigError::InvalidProbability(
                stream.target_present_probability,
            ));
        }
        positive("timing.item_duration_ms", self.timing.item_duration_ms)?;
        positive("timing.practice_speed_factor", self.timing.practice_speed_factor)?;
        positive("timing.fallback_refresh_hz", self.timing.fallback_refresh_hz)?;
        positive("staircase.size_reversals", self.staircase.size_reversals as f64)?;
        positive(
            "staircase.contrast_reversals",
            self.staircase.contrast_reversals as f64,
        )?;
        positive(
            "staircase.max_consecutive_errors",
            self.staircase.max_consecutive_errors as f64,
        )?;
        positive("staircase.max_trials", self.staircase.max_trials as f64)?;
        Ok(())
    }
}

fn positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { name, value })
    }
}
