use crate::config::{PracticeConfig, SweepConfig, TaskKind};
use crate::levels::LevelScale;
use crate::messages;
use crate::record::TrialLog;
use crate::runner::FrameBudget;
use crate::session::Session;
use crate::summary::SessionSummary;
use rsvp_core::{
    Dimension, Phase, ResponseCollector, SessionError, StimulusRenderer, SweepPhase, TrialRecord,
    TriggerSink, logmar_to_degrees,
};
use rsvp_timing::Timer;
use tracing::info;

/// Fixed-level blocks: every level of one dimension, easiest first,
/// `trials_per_level` times, once with responses and optionally once
/// passively, for each eye.
#[derive(Debug, Clone)]
pub struct SweepSequencer {
    phase: SweepPhase,
    scale: LevelScale,
    size_scale: LevelScale,
    sweep: SweepConfig,
    practice: PracticeConfig,
    frames: FrameBudget,
    task: TaskKind,
}

impl SweepSequencer {
    /// `scale` holds the swept levels (LogMAR or percent, per
    /// `sweep.dimension`). Practice runs at the largest size of
    /// `size_scale`.
    pub fn new(
        scale: LevelScale,
        size_scale: LevelScale,
        sweep: SweepConfig,
        practice: PracticeConfig,
        frames: FrameBudget,
        task: TaskKind,
    ) -> Self {
        Self {
            phase: SweepPhase::default(),
            scale,
            size_scale,
            sweep,
            practice,
            frames,
            task,
        }
    }

    pub fn phase(&self) -> SweepPhase {
        self.phase
    }

    /// `(size_deg, contrast_pct)` for one swept level.
    pub fn stimulus_at(&self, level: f64) -> (f64, f64) {
        match self.sweep.dimension {
            Dimension::Size => (logmar_to_degrees(level), self.sweep.fixed_contrast_pct),
            Dimension::Contrast => (logmar_to_degrees(self.sweep.fixed_size_logmar), level),
        }
    }

    pub fn trials_per_block(&self) -> usize {
        self.scale.len() * self.sweep.trials_per_level
    }

    pub fn run<R, C, T, Tm, L>(
        &mut self,
        session: &mut Session<R, C, T, Tm, L>,
        participant: &str,
    ) -> Result<SessionSummary, SessionError>
    where
        R: StimulusRenderer,
        C: ResponseCollector,
        T: TriggerSink,
        Tm: Timer,
        L: TrialLog,
    {
        self.phase = SweepPhase::default();
        session.instruct(messages::WELCOME)?;
        session.instruct(messages::sweep_instructions(self.task == TaskKind::Detection))?;

        loop {
            match self.phase {
                SweepPhase::Practice => self.run_practice(session)?,
                SweepPhase::Passive(_) if !self.sweep.passive_block => {}
                phase => {
                    if let Some(eye) = phase.eye() {
                        session.instruct(&messages::sweep_block(eye, !phase.requires_response()))?;
                    }
                    self.run_block(session)?;
                }
            }
            match self.phase.next() {
                Some(next) => self.phase = next,
                None => break,
            }
        }

        session.instruct(messages::GOODBYE)?;
        let mut summary = SessionSummary::new(participant);
        summary.trials = session.global_trial();
        info!(trials = summary.trials, "sweep finished");
        Ok(summary)
    }

    fn run_practice<R, C, T, Tm, L>(
        &self,
        session: &mut Session<R, C, T, Tm, L>,
    ) -> Result<(), SessionError>
    where
        R: StimulusRenderer,
        C: ResponseCollector,
        T: TriggerSink,
        Tm: Timer,
        L: TrialLog,
    {
        if self.practice.trials == 0 {
            return Ok(());
        }
        session.instruct(messages::PRACTICE)?;
        let logmar = self.size_scale.get(0);
        let stimulus = session.stimulus(logmar_to_degrees(logmar), self.practice.contrast_pct);
        for trial in 1..=self.practice.trials {
            let outcome = session.present(&stimulus, self.frames.practice, true)?;
            let mut record = TrialRecord::from_outcome(
                &outcome,
                self.phase.label(),
                None,
                trial,
                session.global_trial(),
                stimulus.size_deg,
                stimulus.contrast_pct,
            );
            record.level = Some(logmar);
            session.log_trial(&record)?;
            if trial < self.practice.trials {
                session.between_trials()?;
            }
        }
        Ok(())
    }

    fn run_block<R, C, T, Tm, L>(
        &self,
        session: &mut Session<R, C, T, Tm, L>,
    ) -> Result<(), SessionError>
    where
        R: StimulusRenderer,
        C: ResponseCollector,
        T: TriggerSink,
        Tm: Timer,
        L: TrialLog,
    {
        let require_response = self.phase.requires_response();
        let total = self.trials_per_block();
        info!(phase = %self.phase.label(), total, "block start");

        let levels = self
            .scale
            .values()
            .iter()
            .flat_map(|level| std::iter::repeat_n(*level, self.sweep.trials_per_level));
        for (index, level) in levels.enumerate() {
            let trial = index + 1;
            let (size_deg, contrast_pct) = self.stimulus_at(level);
            let stimulus = session.stimulus(size_deg, contrast_pct);
            let outcome = session.present(&stimulus, self.frames.item, require_response)?;
            let mut record = TrialRecord::from_outcome(
                &outcome,
                self.phase.label(),
                self.phase.eye(),
                trial,
                session.global_trial(),
                size_deg,
                contrast_pct,
            );
            record.level = Some(level);
            session.log_trial(&record)?;
            if require_response && trial < total {
                session.between_trials()?;
            }
        }
        Ok(())
    }
}
