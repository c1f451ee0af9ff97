//! Adaptive staircase over a descending [`LevelScale`].
//!
//! Index 0 is the easiest level. A correct response steps one level harder
//! (index + 1); `max_consecutive_errors` errors in a row step one level
//! easier. A single error never moves the level. Direction is named after
//! the level *value*: `Decreasing` after a harder step, `Increasing` after an
//! easier one. A flip between the two is a reversal, recorded with the level
//! value held before the step.

use crate::levels::LevelScale;
use rsvp_core::Dimension;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;

/// Compile-time tag for what a staircase adapts.
pub trait LevelKind: Copy + fmt::Debug {
    const DIMENSION: Dimension;
}

#[derive(Debug, Clone, Copy)]
pub struct Size;

#[derive(Debug, Clone, Copy)]
pub struct Contrast;

impl LevelKind for Size {
    const DIMENSION: Dimension = Dimension::Size;
}

impl LevelKind for Contrast {
    const DIMENSION: Dimension = Dimension::Contrast;
}

pub type SizeStaircase = Staircase<Size>;
pub type ContrastStaircase = Staircase<Contrast>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Unset,
    Increasing,
    Decreasing,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Unset => "unset",
            Direction::Increasing => "increasing",
            Direction::Decreasing => "decreasing",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaircaseRule {
    pub required_reversals: usize,
    pub min_trials: usize,
    pub max_consecutive_errors: usize,
}

impl Default for StaircaseRule {
    fn default() -> Self {
        Self {
            required_reversals: 2,
            min_trials: 10,
            max_consecutive_errors: 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReversalPoint {
    /// 1-based trial number at which the reversal happened.
    pub trial: usize,
    pub level: f64,
}

/// What one `record_response` call changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateInfo {
    pub old_index: usize,
    pub new_index: usize,
    pub old_direction: Direction,
    pub new_direction: Direction,
    pub reversal: bool,
    pub reversal_count: usize,
}

#[derive(Debug, Clone)]
pub struct Staircase<D: LevelKind> {
    scale: LevelScale,
    rule: StaircaseRule,
    current_index: usize,
    direction: Direction,
    consecutive_errors: usize,
    reversal_count: usize,
    reversal_points: Vec<ReversalPoint>,
    trials_completed: usize,
    responses: Vec<bool>,
    _kind: PhantomData<D>,
}

impl<D: LevelKind> Staircase<D> {
    pub fn new(scale: LevelScale, start: f64, rule: StaircaseRule) -> Self {
        let current_index = scale.start_index(start);
        Self {
            scale,
            rule,
            current_index,
            direction: Direction::Unset,
            consecutive_errors: 0,
            reversal_count: 0,
            reversal_points: Vec::new(),
            trials_completed: 0,
            responses: Vec::new(),
            _kind: PhantomData,
        }
    }

    pub fn dimension(&self) -> Dimension {
        D::DIMENSION
    }

    pub fn current_level(&self) -> f64 {
        self.scale.get(self.current_index)
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn consecutive_errors(&self) -> usize {
        self.consecutive_errors
    }

    pub fn reversal_count(&self) -> usize {
        self.reversal_count
    }

    pub fn reversal_points(&self) -> &[ReversalPoint] {
        &self.reversal_points
    }

    pub fn trials_completed(&self) -> usize {
        self.trials_completed
    }

    pub fn responses(&self) -> &[bool] {
        &self.responses
    }

    pub fn scale(&self) -> &LevelScale {
        &self.scale
    }

    pub fn rule(&self) -> &StaircaseRule {
        &self.rule
    }

    pub fn record_response(&mut self, correct: bool) -> UpdateInfo {
        self.trials_completed += 1;
        self.responses.push(correct);

        let old_index = self.current_index;
        let old_direction = self.direction;
        let mut reversal = false;

        if correct {
            self.consecutive_errors = 0;
            if self.current_index < self.scale.last_index() {
                if self.direction == Direction::Increasing {
                    self.record_reversal();
                    reversal = true;
                }
                self.direction = Direction::Decreasing;
                self.current_index += 1;
            }
        } else {
            self.consecutive_errors += 1;
            if self.consecutive_errors >= self.rule.max_consecutive_errors {
                if self.current_index > 0 {
                    if self.direction == Direction::Decreasing {
                        self.record_reversal();
                        reversal = true;
                    }
                    self.direction = Direction::Increasing;
                    self.current_index -= 1;
                }
                self.consecutive_errors = 0;
            }
        }

        UpdateInfo {
            old_index,
            new_index: self.current_index,
            old_direction,
            new_direction: self.direction,
            reversal,
            reversal_count: self.reversal_count,
        }
    }

    fn record_reversal(&mut self) {
        self.reversal_count += 1;
        self.reversal_points.push(ReversalPoint {
            trial: self.trials_completed,
            level: self.current_level(),
        });
    }

    /// Enough reversals *and* enough trials.
    pub fn is_complete(&self) -> bool {
        self.reversal_count >= self.rule.required_reversals
            && self.trials_completed >= self.rule.min_trials
    }

    /// Whether `threshold` is a reversal mean rather than the fallback.
    pub fn has_converged(&self) -> bool {
        self.rule.required_reversals > 0
            && self.reversal_points.len() >= self.rule.required_reversals
    }

    /// Mean level of the last `required_reversals` reversals, or the
    /// current level when there are not enough of them.
    pub fn threshold(&self) -> f64 {
        if !self.has_converged() {
            return self.current_level();
        }
        let last = &self.reversal_points[self.reversal_points.len() - self.rule.required_reversals..];
        last.iter().map(|p| p.level).sum::<f64>() / last.len() as f64
    }
}
