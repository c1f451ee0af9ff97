pub mod frames;
pub mod timer;

pub use frames::{item_duration_frames, FrameRate};
pub use timer::{CalibrationStats, FrameLog, HighPrecisionTimer, SimulatedTimer, Timer};
