pub mod display;
pub mod error;
pub mod input;
pub mod phase;
pub mod stimulus;
pub mod trial;
pub mod trigger;

pub use display::StimulusRenderer;
pub use error::{ConfigError, SessionError};
pub use input::{KeyEvent, KeyMap, KeySource, KeyedCollector, ResponseAlphabet, ResponseCollector};
pub use phase::{AdaptivePhase, Dimension, Eye, Phase, SweepPhase};
pub use stimulus::{StimulusParams, Target, contrast_to_color, logmar_to_degrees, michelson_contrast};
pub use trial::{Stream, ThresholdRecord, TrialOutcome, TrialRecord, TrialState};
pub use trigger::{LoggingTrigger, TriggerSink};
