use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Clock used to pace frames and fixations.
pub trait Timer: Clone + Send + Sync {
    type Timestamp: Copy + Clone + Send + Sync;
    fn now(&self) -> Self::Timestamp;
    fn elapsed(&self, ts: Self::Timestamp) -> Duration;
    fn sleep(&self, d: Duration);
    fn record_frame(&mut self, d: Duration);
    fn calibration_stats(&self) -> CalibrationStats;
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CalibrationStats {
    pub samples: usize,
    pub average_frame_time_ns: f64,
    pub jitter_ns: f64,
    pub min_frame_time_ns: f64,
    pub max_frame_time_ns: f64,
    pub effective_fps: f64,
}

impl CalibrationStats {
    pub fn from_frames<'a>(frames: impl IntoIterator<Item = &'a Duration>) -> Self {
        let times: Vec<f64> = frames.into_iter().map(|d| d.as_nanos() as f64).collect();
        if times.is_empty() {
            return Self::default();
        }
        let n = times.len() as f64;
        let avg = times.iter().sum::<f64>() / n;
        let var = times.iter().map(|x| (x - avg).powi(2)).sum::<f64>() / n;
        CalibrationStats {
            samples: times.len(),
            average_frame_time_ns: avg,
            jitter_ns: var.sqrt(),
            min_frame_time_ns: times.iter().copied().fold(f64::INFINITY, f64::min),
            max_frame_time_ns: times.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            effective_fps: if avg > 0.0 { 1e9 / avg } else { 0.0 },
        }
    }
}

/// Most recent frame durations, oldest dropped first.
#[derive(Debug, Clone)]
pub struct FrameLog {
    frames: VecDeque<Duration>,
    capacity: usize,
}

impl FrameLog {
    pub const DEFAULT_CAPACITY: usize = 1000;

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            frames: VecDeque::with_capacity(capacity.min(Self::DEFAULT_CAPACITY)),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, d: Duration) {
        if self.frames.len() == self.capacity {
            self.frames.pop_front();
        }
        self.frames.push_back(d);
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn stats(&self) -> CalibrationStats {
        CalibrationStats::from_frames(&self.frames)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Duration> {
        self.frames.iter()
    }
}

impl Default for FrameLog {
    fn default() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }
}

/// Wall clock with a two-stage sleep: the OS sleeps through most of the
/// wait and the final `spin_margin` is busy-waited.
#[derive(Debug, Clone)]
pub struct HighPrecisionTimer {
    origin: Instant,
    spin_margin: Duration,
    frames: FrameLog,
}

impl HighPrecisionTimer {
    pub fn new() -> Self {
        Self::with_spin_margin(Duration::from_millis(1))
    }

    pub fn with_spin_margin(spin_margin: Duration) -> Self {
        Self {
            origin: Instant::now(),
            spin_margin,
            frames: FrameLog::default(),
        }
    }

    pub fn frames(&self) -> &FrameLog {
        &self.frames
    }

    fn sleep_until(&self, deadline: Instant) {
        let now = Instant::now();
        if deadline <= now {
            return;
        }
        let remaining = deadline - now;
        if remaining > self.spin_margin {
            os_sleep(remaining - self.spin_margin);
        }
        while Instant::now() < deadline {
            std::hint::spin_loop();
        }
    }
}

impl Default for HighPrecisionTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer for HighPrecisionTimer {
    type Timestamp = u64;

    fn now(&self) -> u64 {
        self.origin.elapsed().as_nanos() as u64
    }

    fn elapsed(&self, ts: u64) -> Duration {
        Duration::from_nanos(self.now().saturating_sub(ts))
    }

    fn sleep(&self, d: Duration) {
        self.sleep_until(Instant::now() + d);
    }

    fn record_frame(&mut self, d: Duration) {
        self.frames.push(d);
    }

    fn calibration_stats(&self) -> CalibrationStats {
        self.frames.stats()
    }
}

#[cfg(target_os = "linux")]
fn os_sleep(d: Duration) {
    use libc::{clock_nanosleep, timespec, CLOCK_MONOTONIC};

    let req = timespec {
        tv_sec: d.as_secs() as libc::time_t,
        tv_nsec: d.subsec_nanos() as libc::c_long,
    };
    // SAFETY: `req` is a valid timespec and a null remainder pointer is allowed.
    unsafe {
        clock_nanosleep(CLOCK_MONOTONIC, 0, &req, std::ptr::null_mut());
    }
}

#[cfg(target_os = "macos")]
fn os_sleep(d: Duration) {
    use mach2::mach_time::{
        mach_absolute_time, mach_timebase_info, mach_timebase_info_data_t, mach_wait_until,
    };

    // SAFETY: timebase is written by the kernel before use.
    unsafe {
        let mut timebase = mach_timebase_info_data_t { numer: 0, denom: 0 };
        mach_timebase_info(&mut timebase);
        let ticks = d.as_nanos() as u64 * timebase.denom as u64 / timebase.numer as u64;
        mach_wait_until(mach_absolute_time() + ticks);
    }
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
fn os_sleep(d: Duration) {
    std::thread::sleep(d);
}

/// Virtual clock: `sleep` advances time instantly. Clones share the clock.
#[derive(Debug, Clone)]
pub struct SimulatedTimer {
    clock_ns: Arc<AtomicU64>,
    frames: FrameLog,
}

impl SimulatedTimer {
    pub fn new() -> Self {
        Self {
            clock_ns: Arc::new(AtomicU64::new(0)),
            frames: FrameLog::default(),
        }
    }

    /// A timer whose calibration reports a steady refresh rate. A rate that
    /// is not a positive finite number records no frames.
    pub fn with_refresh_rate(hz: f64, samples: usize) -> Self {
        let mut timer = Self::new();
        if !(hz > 0.0 && hz.is_finite()) {
            return timer;
        }
        let Ok(frame) = Duration::try_from_secs_f64(1.0 / hz) else {
            return timer;
        };
        for _ in 0..samples {
            timer.record_frame(frame);
        }
        timer
    }

    pub fn with_frame_capacity(mut self, capacity: usize) -> Self {
        self.frames = FrameLog::with_capacity(capacity);
        self
    }

    pub fn elapsed_total(&self) -> Duration {
        Duration::from_nanos(self.clock_ns.load(Ordering::Relaxed))
    }

    pub fn frames(&self) -> &FrameLog {
        &self.frames
    }
}

impl Default for SimulatedTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer for SimulatedTimer {
    type Timestamp = u64;

    fn now(&self) -> u64 {
        self.clock_ns.load(Ordering::Relaxed)
    }

    fn elapsed(&self, ts: u64) -> Duration {
        Duration::from_nanos(self.now().saturating_sub(ts))
    }

    fn sleep(&self, d: Duration) {
        self.clock_ns.fetch_add(d.as_nanos() as u64, Ordering::Relaxed);
    }

    fn record_frame(&mut self, d: Duration) {
        self.frames.push(d);
    }

    fn calibration_stats(&self) -> CalibrationStats {
        self.frames.stats()
    }
}
