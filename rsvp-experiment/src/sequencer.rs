use crate::config::{PracticeConfig, StaircaseConfig};
use crate::levels::LevelScale;
use crate::messages;
use crate::record::TrialLog;
use crate::runner::FrameBudget;
use crate::session::Session;
use crate::staircase::{Contrast, LevelKind, Size, Staircase};
use crate::summary::SessionSummary;
use rsvp_core::{
    AdaptivePhase, Dimension, Eye, Phase, ResponseCollector, SessionError, StimulusParams,
    StimulusRenderer, ThresholdRecord, TrialRecord, TriggerSink, logmar_to_degrees,
};
use rsvp_timing::Timer;
use tracing::{debug, info};

/// Practice, then a size and a contrast staircase for each eye.
#[derive(Debug, Clone)]
pub struct ExperimentSequencer {
    phase: AdaptivePhase,
    size_scale: LevelScale,
    contrast_scale: LevelScale,
    staircase: StaircaseConfig,
    practice: PracticeConfig,
    frames: FrameBudget,
}

impl ExperimentSequencer {
    pub fn new(
        size_scale: LevelScale,
        contrast_scale: LevelScale,
        staircase: StaircaseConfig,
        practice: PracticeConfig,
        frames: FrameBudget,
    ) -> Self {
        Self {
            phase: AdaptivePhase::default(),
            size_scale,
            contrast_scale,
            staircase,
            practice,
            frames,
        }
    }

    pub fn phase(&self) -> AdaptivePhase {
        self.phase
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
        let mut summary = SessionSummary::new(participant);
        self.phase = AdaptivePhase::default();

        session.instruct(messages::WELCOME)?;
        session.instruct(messages::adaptive_instructions())?;

        loop {
            info!(phase = %self.phase.label(), "phase start");
            match self.phase {
                AdaptivePhase::Practice => self.run_practice(session)?,
                AdaptivePhase::Staircase(eye, Dimension::Size) => {
                    session.instruct(&messages::staircase_phase(eye, Dimension::Size))?;
                    let staircase = Staircase::<Size>::new(
                        self.size_scale.clone(),
                        self.staircase.size_start_logmar,
                        self.staircase.rule(Dimension::Size),
                    );
                    let record = self.run_staircase(session, eye, staircase, |logmar| {
                        (logmar_to_degrees(logmar), 100.0)
                    })?;
                    summary.thresholds.push(record);
                }
                AdaptivePhase::Staircase(eye, Dimension::Contrast) => {
                    session.instruct(&messages::staircase_phase(eye, Dimension::Contrast))?;
                    let size_logmar = summary
                        .threshold(eye, Dimension::Size)
                        .map(|t| t.threshold)
                        .unwrap_or(self.staircase.size_start_logmar);
                    let size_deg = logmar_to_degrees(size_logmar);
                    info!(%eye, size_logmar, size_deg, "contrast staircase at size threshold");
                    let staircase = Staircase::<Contrast>::new(
                        self.contrast_scale.clone(),
                        self.staircase.contrast_start_pct,
                        self.staircase.rule(Dimension::Contrast),
                    );
                    let record =
                        self.run_staircase(session, eye, staircase, |pct| (size_deg, pct))?;
                    summary.thresholds.push(record);
                    if self.phase.next().is_some() {
                        session.instruct(&messages::switch_eye(eye))?;
                    }
                }
            }
            match self.phase.next() {
                Some(next) => self.phase = next,
                None => break,
            }
        }

        session.instruct(messages::GOODBYE)?;
        summary.trials = session.global_trial();
        info!("{summary}");
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
        let logmar = self.size_scale.get(self.practice.level_index);
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

    /// Runs one staircase until it completes or hits the trial cap.
    /// `stimulus_for` maps the current level to `(size_deg, contrast_pct)`.
    fn run_staircase<D, R, C, T, Tm, L>(
        &self,
        session: &mut Session<R, C, T, Tm, L>,
        eye: Eye,
        mut staircase: Staircase<D>,
        stimulus_for: impl Fn(f64) -> (f64, f64),
    ) -> Result<ThresholdRecord, SessionError>
    where
        D: LevelKind,
        R: StimulusRenderer,
        C: ResponseCollector,
        T: TriggerSink,
        Tm: Timer,
        L: TrialLog,
    {
        let dimension = staircase.dimension();
        let max_trials = self.staircase.max_trials;
        let mut trial = 0;

        while !staircase.is_complete() && trial < max_trials {
            trial += 1;
            let level = staircase.current_level();
            let (size_deg, contrast_pct) = stimulus_for(level);
            let stimulus: StimulusParams = session.stimulus(size_deg, contrast_pct);
            debug!(%eye, %dimension, trial, level, "staircase trial");

            let outcome = session.present(&stimulus, self.frames.item, true)?;
            let update = staircase.record_response(outcome.is_correct());

            let mut record = TrialRecord::from_outcome(
                &outcome,
                self.phase.label(),
                Some(eye),
                trial,
                session.global_trial(),
                size_deg,
                contrast_pct,
            );
            record.level = Some(level);
            record.direction = Some(update.new_direction.to_string());
            record.reversal = Some(update.reversal);
            record.reversal_count = Some(update.reversal_count);
            session.log_trial(&record)?;

            if update.reversal {
                info!(
                    count = update.reversal_count,
                    old = %update.old_direction,
                    new = %update.new_direction,
                    "reversal"
                );
            }
            if staircase.is_complete() {
                break;
            }
            if trial < max_trials {
                session.between_trials()?;
            }
        }

        let record = ThresholdRecord {
            eye,
            dimension,
            threshold: staircase.threshold(),
            trials: staircase.trials_completed(),
            reversals: staircase.reversal_count(),
            converged: staircase.is_complete(),
        };
        info!(
            %eye,
            %dimension,
            threshold = record.threshold,
            trials = record.trials,
            reversals = record.reversals,
            converged = record.converged,
            "staircase finished"
        );
        session.log_threshold(&record)?;
        Ok(record)
    }
}
