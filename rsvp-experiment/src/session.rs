use crate::messages;
use crate::record::TrialLog;
use crate::runner::TrialRunner;
use crate::seed::{TrialKey, TrialSeeder};
use crate::stream::StreamGenerator;
use rsvp_core::{
    ResponseCollector, SessionError, StimulusParams, StimulusRenderer, ThresholdRecord,
    TrialOutcome, TrialRecord, TriggerSink,
};
use rsvp_timing::Timer;
use tracing::debug;

/// Everything a sequencer needs to run trials: presentation, stream
/// generation, seeding and the trial log.
pub struct Session<R, C, T, Tm, L> {
    runner: TrialRunner<R, C, T, Tm>,
    generator: StreamGenerator,
    seeder: TrialSeeder,
    log: L,
    background: f64,
    pause_between_trials: bool,
    global_trial: usize,
}

impl<R, C, T, Tm, L> Session<R, C, T, Tm, L>
where
    R: StimulusRenderer,
    C: ResponseCollector,
    T: TriggerSink,
    Tm: Timer,
    L: TrialLog,
{
    pub fn new(
        runner: TrialRunner<R, C, T, Tm>,
        generator: StreamGenerator,
        seeder: TrialSeeder,
        log: L,
    ) -> Self {
        Self {
            runner,
            generator,
            seeder,
            log,
            background: 0.0,
            pause_between_trials: true,
            global_trial: 0,
        }
    }

    pub fn with_background(mut self, background: f64) -> Self {
        self.background = background;
        self
    }

    pub fn with_pause_between_trials(mut self, pause: bool) -> Self {
        self.pause_between_trials = pause;
        self
    }

    pub fn stimulus(&self, size_deg: f64, contrast_pct: f64) -> StimulusParams {
        StimulusParams::new(size_deg, contrast_pct, self.background)
    }

    /// Generates a stream with the next trial's generator and presents it.
    pub fn present(
        &mut self,
        stimulus: &StimulusParams,
        item_frames: u32,
        require_response: bool,
    ) -> Result<TrialOutcome, SessionError> {
        let mut rng = self.seeder.next_rng(&TrialKey {
            size_deg: stimulus.size_deg,
            require_response,
        });
        let present = self.generator.draw_target_present(&mut rng);
        let stream = self.generator.generate(&mut rng, present);
        self.global_trial += 1;
        debug!(
            global_trial = self.global_trial,
            size_deg = stimulus.size_deg,
            contrast_pct = stimulus.contrast_pct,
            item_frames,
            "presenting stream"
        );
        self.runner.run(stream, item_frames, stimulus, require_response)
    }

    /// 1-based number of the most recently presented trial.
    pub fn global_trial(&self) -> usize {
        self.global_trial
    }

    pub fn log_trial(&mut self, record: &TrialRecord) -> Result<(), SessionError> {
        self.log.record_trial(record)
    }

    pub fn log_threshold(&mut self, record: &ThresholdRecord) -> Result<(), SessionError> {
        self.log.record_threshold(record)
    }

    pub fn instruct(&mut self, message: &str) -> Result<(), SessionError> {
        self.runner.acknowledge(message)
    }

    pub fn between_trials(&mut self) -> Result<(), SessionError> {
        if self.pause_between_trials {
            self.runner.acknowledge(messages::NEXT_TRIAL)?;
        }
        Ok(())
    }

    pub fn runner(&self) -> &TrialRunner<R, C, T, Tm> {
        &self.runner
    }

    pub fn log(&self) -> &L {
        &self.log
    }

    pub fn into_log(self) -> L {
        self.log
    }
}
