use anyhow::{Context, Result};
use chrono::Local;
use clap::ValueEnum;
use rsvp_core::{
    Dimension, KeyMap, KeyedCollector, LoggingTrigger, ResponseCollector, SessionError,
    StimulusRenderer, TriggerSink,
};
use rsvp_experiment::record::suffixed;
use rsvp_experiment::{
    ConditionSource, CsvConditions, CsvTrialLog, ExperimentConfig, ExperimentSequencer,
    FrameBudget, LevelScale, PresentationTiming, Psychometric, SeedMode, Session, SessionSummary,
    SimulatedObserver, StreamGenerator, SweepSequencer, TrialRunner, TrialSeeder,
};
use rsvp_timing::{FrameRate, HighPrecisionTimer, SimulatedTimer, Timer};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::console::{ConsoleRenderer, LineKeys};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Practice, then size and contrast staircases per eye.
    Adaptive,
    /// Fixed levels with response and passive blocks per eye.
    Sweep,
}

pub struct RunOptions {
    pub config: ExperimentConfig,
    pub participant: String,
    pub conditions_dir: PathBuf,
    pub output_dir: PathBuf,
    pub mode: Mode,
    pub simulate: bool,
    pub refresh_hz: f64,
}

struct Levels {
    sizes: LevelScale,
    contrasts: LevelScale,
}

pub fn run(options: RunOptions) -> Result<()> {
    let RunOptions {
        config,
        participant,
        conditions_dir,
        output_dir,
        mode,
        simulate,
        refresh_hz,
    } = options;
    config.validate().context("invalid experiment configuration")?;
    crate::console::frame_interval(refresh_hz).context("invalid --display-hz")?;

    let conditions = CsvConditions::new(&conditions_dir);
    let levels = Levels {
        sizes: conditions.size_levels().context("loading size conditions")?,
        contrasts: conditions
            .contrast_levels()
            .context("loading contrast conditions")?,
    };

    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("creating {}", output_dir.display()))?;
    let stamp = Local::now().format("%Y-%m-%d_%Hh%M.%S");
    let base = output_dir.join(format!("participant_{participant}_{stamp}"));
    let snapshot = suffixed(&base, "_config.json");
    std::fs::write(&snapshot, serde_json::to_string_pretty(&config)?)
        .with_context(|| format!("writing {}", snapshot.display()))?;

    let log = CsvTrialLog::create(&base).context("creating trial log")?;
    let generator = StreamGenerator::from_config(&config.stream, config.task)?;
    let seeder = TrialSeeder::new(config.seed, participant.as_str());

    println!("=== RSVP STAIRCASE ===");
    println!("Participant: {participant}");
    println!("Mode: {mode:?}{}", if simulate { " (simulated observer)" } else { "" });
    println!("Data: {}", base.display());

    let result = if simulate {
        let timer = SimulatedTimer::with_refresh_rate(refresh_hz, config.timing.calibration_frames);
        let rate = measured_rate(&timer, &config);
        let observer_seed = match config.seed {
            SeedMode::Session { seed } => seed,
            _ => rand::random(),
        };
        let (display, responder) = SimulatedObserver::new(
            Psychometric::default(),
            config.stream.targets.clone(),
            observer_seed,
        )
        .with_clock(timer.clone(), rate)
        .split();
        let runner = build_runner(&config, display, responder, timer);
        drive(&config, runner, generator, seeder, log, &levels, rate, mode, &participant)
    } else {
        let mut renderer =
            ConsoleRenderer::new(std::io::stdout(), HighPrecisionTimer::new(), refresh_hz)?;
        println!("Calibrating frame timing...");
        renderer.calibrate(config.timing.calibration_frames)?;
        let rate = measured_rate(renderer.timer(), &config);
        let timer = renderer.timer().clone();
        let keys = LineKeys::new(std::io::stdin().lock(), std::io::stdout());
        let collector = KeyedCollector::new(keys, KeyMap::standard());
        let runner = build_runner(&config, renderer, collector, timer);
        drive(&config, runner, generator, seeder, log, &levels, rate, mode, &participant)
    };

    match result {
        Ok(summary) => {
            let path = summary.write_csv(&base)?;
            println!("\n{summary}");
            println!("Summary written to {}", path.display());
            Ok(())
        }
        Err(err) if err.is_abort() => {
            warn!("session aborted by participant");
            println!("\nSession aborted. Trials so far are saved in {}", base.display());
            Ok(())
        }
        Err(err) => Err(err).context("session failed"),
    }
}

fn measured_rate<Tm: Timer>(timer: &Tm, config: &ExperimentConfig) -> FrameRate {
    let stats = timer.calibration_stats();
    let rate = FrameRate::from_calibration(
        &stats,
        config.timing.calibration_frames / 2,
        config.timing.fallback_refresh_hz,
    );
    println!(
        "Calibration: {:.3} ms/frame, {:.1} Hz, jitter {:.3} ms",
        stats.average_frame_time_ns / 1_000_000.0,
        rate.hz,
        stats.jitter_ns / 1_000_000.0,
    );
    rate
}

fn build_runner<R, C, Tm>(
    config: &ExperimentConfig,
    renderer: R,
    collector: C,
    timer: Tm,
) -> TrialRunner<R, C, LoggingTrigger, Tm>
where
    R: StimulusRenderer,
    C: ResponseCollector,
    Tm: Timer,
{
    warn!("no trigger device attached, trigger codes are logged only");
    TrialRunner::new(
        renderer,
        collector,
        LoggingTrigger::new(),
        timer,
        config.task,
        PresentationTiming::from_config(&config.timing),
        config.triggers.clone(),
    )
}

#[allow(clippy::too_many_arguments)]
fn drive<R, C, T, Tm>(
    config: &ExperimentConfig,
    runner: TrialRunner<R, C, T, Tm>,
    generator: StreamGenerator,
    seeder: TrialSeeder,
    log: CsvTrialLog,
    levels: &Levels,
    rate: FrameRate,
    mode: Mode,
    participant: &str,
) -> Result<SessionSummary, SessionError>
where
    R: StimulusRenderer,
    C: ResponseCollector,
    T: TriggerSink,
    Tm: Timer,
{
    let frames = FrameBudget::from_timing(&config.timing, rate);
    info!(item = frames.item, practice = frames.practice, hz = rate.hz, "item durations in frames");
    let mut session = Session::new(runner, generator, seeder, log)
        .with_background(config.background)
        .with_pause_between_trials(config.pause_between_trials);

    match mode {
        Mode::Adaptive => ExperimentSequencer::new(
            levels.sizes.clone(),
            levels.contrasts.clone(),
            config.staircase.clone(),
            config.practice.clone(),
            frames,
        )
        .run(&mut session, participant),
        Mode::Sweep => {
            let swept = match config.sweep.dimension {
                Dimension::Size => levels.sizes.clone(),
                Dimension::Contrast => levels.contrasts.clone(),
            };
            SweepSequencer::new(
                swept,
                levels.sizes.clone(),
                config.sweep.clone(),
                config.practice.clone(),
                frames,
                config.task,
            )
            .run(&mut session, participant)
        }
    }
}

/// Prints every size level in degrees and every contrast level with its
/// renderer color.
pub fn print_levels(conditions_dir: &Path, background: f64) -> Result<()> {
    let conditions = CsvConditions::new(conditions_dir);
    let sizes = conditions.size_levels()?;
    let contrasts = conditions.contrast_levels()?;

    println!("{:>8}  {:>10}  {:>8}", "LogMAR", "degrees", "arcmin");
    for logmar in sizes.values() {
        let deg = rsvp_core::logmar_to_degrees(*logmar);
        println!("{logmar:>8.2}  {deg:>10.4}  {:>8.2}", deg * 60.0);
    }
    println!();
    println!("{:>8}  {:>8}", "contrast", "color");
    for pct in contrasts.values() {
        let color = rsvp_core::contrast_to_color(*pct, background);
        println!("{:>7.2}%  {color:>8.3}", pct);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(dir: &Path, refresh_hz: f64) -> RunOptions {
        RunOptions {
            config: ExperimentConfig::default(),
            participant: "p01".to_string(),
            conditions_dir: dir.to_path_buf(),
            output_dir: dir.join("data"),
            mode: Mode::Adaptive,
            simulate: true,
            refresh_hz,
        }
    }

    #[test]
    fn bad_display_rate_fails_before_any_output() {
        let dir = tempfile::tempdir().unwrap();
        for hz in [0.0, -1.0, f64::NAN] {
            let err = run(options(dir.path(), hz)).unwrap_err();
            assert!(err.to_string().contains("display-hz"), "{err}");
        }
        assert!(!dir.path().join("data").exists());
    }
}
