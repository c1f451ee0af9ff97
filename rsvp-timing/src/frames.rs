use crate::timer::CalibrationStats;
use tracing::warn;

/// Display refresh rate used to convert millisecond durations into frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameRate {
    pub hz: f64,
    pub measured: bool,
}

impl FrameRate {
    pub fn assumed(hz: f64) -> Self {
        Self { hz, measured: false }
    }

    /// Rounds the measured rate to whole hertz. Falls back to `fallback_hz`
    /// when fewer than `min_samples` frames were recorded.
    pub fn from_calibration(stats: &CalibrationStats, min_samples: usize, fallback_hz: f64) -> Self {
        if stats.samples >= min_samples && stats.effective_fps >= 1.0 {
            Self {
                hz: stats.effective_fps.round(),
                measured: true,
            }
        } else {
            warn!(
                samples = stats.samples,
                fallback_hz, "could not measure refresh rate, assuming fallback"
            );
            Self::assumed(fallback_hz)
        }
    }

    pub fn frame_ms(&self) -> f64 {
        1000.0 / self.hz
    }
}

/// Number of whole frames closest to `duration_ms`, never less than one.
pub fn item_duration_frames(duration_ms: f64, rate: FrameRate) -> u32 {
    let frames = (duration_ms / rate.frame_ms()).round();
    if frames.is_finite() && frames >= 1.0 {
        frames as u32
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn hundred_ms_at_60hz_is_six_frames() {
        assert_eq!(item_duration_frames(100.0, FrameRate::assumed(60.0)), 6);
        assert_eq!(item_duration_frames(120.0, FrameRate::assumed(60.0)), 7);
        assert_eq!(item_duration_frames(130.0, FrameRate::assumed(144.0)), 19);
    }

    #[test]
    fn tiny_durations_still_show_one_frame() {
        assert_eq!(item_duration_frames(1.0, FrameRate::assumed(60.0)), 1);
        assert_eq!(item_duration_frames(0.0, FrameRate::assumed(60.0)), 1);
    }

    #[test]
    fn calibration_rounds_measured_rate() {
        let frames = vec![Duration::from_micros(8_340); 20];
        let stats = CalibrationStats::from_frames(&frames);
        let rate = FrameRate::from_calibration(&stats, 10, 60.0);
        assert!(rate.measured);
        assert_eq!(rate.hz, 120.0);
    }

    #[test]
    fn too_few_samples_fall_back() {
        let stats = CalibrationStats::from_frames(&[Duration::from_millis(10)]);
        let rate = FrameRate::from_calibration(&stats, 10, 60.0);
        assert_eq!(rate, FrameRate::assumed(60.0));
    }
}
