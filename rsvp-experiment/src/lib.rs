pub mod conditions;
pub mod config;
pub mod levels;
pub mod messages;
pub mod observer;
pub mod record;
pub mod runner;
pub mod seed;
pub mod sequencer;
pub mod session;
pub mod staircase;
pub mod stream;
pub mod summary;
pub mod sweep;

pub use conditions::{BuiltinConditions, ConditionError, ConditionSource, CsvConditions};
pub use config::{ConfigLoadError, ExperimentConfig, TaskKind};
pub use levels::LevelScale;
pub use observer::{ObserverDisplay, ObserverResponder, Psychometric, SimulatedObserver};
pub use record::{CsvTrialLog, MemoryLog, TrialLog};
pub use runner::{FrameBudget, PresentationTiming, TrialRunner};
pub use seed::{SeedMode, TrialSeeder};
pub use sequencer::ExperimentSequencer;
pub use session::Session;
pub use staircase::{
    ContrastStaircase, Direction, ReversalPoint, SizeStaircase, Staircase, StaircaseRule,
    UpdateInfo,
};
pub use stream::StreamGenerator;
pub use summary::SessionSummary;
pub use sweep::SweepSequencer;
