use crate::phase::{Dimension, Eye};
use crate::stimulus::Target;
use serde::{Deserialize, Serialize};

/// Trial presentation states
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrialState {
    Fixation,
    Stream,
    PostStream,
    Response,
    Complete,
}

/// One RSVP stream: item labels in presentation order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stream {
    pub items: Vec<String>,
    pub target_position: Option<usize>,
    pub target: Target,
}

impl Stream {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_target(&self, position: usize) -> bool {
        self.target_position == Some(position)
    }
}

/// Result of running one stream.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialOutcome {
    pub stream: Stream,
    pub response: Option<String>,
    /// `None` on passive trials.
    pub correct: Option<bool>,
}

impl TrialOutcome {
    pub fn is_correct(&self) -> bool {
        self.correct.unwrap_or(false)
    }
}

/// Per-trial row of the session log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialRecord {
    pub eye: Option<Eye>,
    pub phase: String,
    pub trial: usize,
    pub global_trial: usize,
    pub level: Option<f64>,
    pub size_deg: f64,
    pub contrast_pct: f64,
    pub target: String,
    pub target_position: Option<usize>,
    pub stream: String,
    pub response: Option<String>,
    pub correct: Option<bool>,
    pub direction: Option<String>,
    pub reversal: Option<bool>,
    pub reversal_count: Option<usize>,
}

impl TrialRecord {
    pub fn from_outcome(
        outcome: &TrialOutcome,
        phase: String,
        eye: Option<Eye>,
        trial: usize,
        global_trial: usize,
        size_deg: f64,
        contrast_pct: f64,
    ) -> Self {
        let target = match &outcome.stream.target {
            Target::Identity(label) => label.clone(),
            Target::Presence(present) => present.to_string(),
        };
        Self {
            eye,
            phase,
            trial,
            global_trial,
            level: None,
            size_deg,
            contrast_pct,
            target,
            target_position: outcome.stream.target_position,
            stream: outcome.stream.items.join(" "),
            response: outcome.response.clone(),
            correct: outcome.correct,
            direction: None,
            reversal: None,
            reversal_count: None,
        }
    }
}

/// Final estimate of one staircase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdRecord {
    pub eye: Eye,
    pub dimension: Dimension,
    pub threshold: f64,
    pub trials: usize,
    pub reversals: usize,
    pub converged: bool,
}
