use thiserror::Error;

/// Setup problems. Raised before the first trial, never mid-session.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("level scale is empty")]
    EmptyLevelScale,

    #[error("level scale contains a non-finite value: {0}")]
    NonFiniteLevel(f64),

    #[error("distractor set needs at least 2 distinct items, got {0}")]
    DistractorSetTooSmall(usize),

    #[error("target set is empty")]
    EmptyTargetSet,

    #[error("stream length must be at least 1")]
    EmptyStream,

    #[error("target position range {min}..={max} does not fit a stream of {len} items")]
    TargetRangeOutOfBounds { min: usize, max: usize, len: usize },

    #[error("target presence probability {0} is outside [0, 1]")]
    InvalidProbability(f64),

    #[error("{name} must be positive, got {value}")]
    NonPositive { name: &'static str, value: f64 },
}

/// Anything that ends a running session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session aborted by participant")]
    Aborted,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("input closed before a response was completed")]
    InputClosed,

    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("trial log failure: {0}")]
    Log(String),
}

impl SessionError {
    pub fn is_abort(&self) -> bool {
        matches!(self, SessionError::Aborted)
    }
}
