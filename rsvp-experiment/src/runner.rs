use crate::config::{TaskKind, TimingConfig, TriggerConfig};
use rsvp_core::{
    ConfigError, ResponseAlphabet, ResponseCollector, SessionError, StimulusParams,
    StimulusRenderer, Stream, Target, TrialOutcome, TrialState, TriggerSink,
};
use rsvp_timing::{FrameRate, Timer, item_duration_frames};
use std::time::Duration;
use tracing::debug;

/// Fixation periods around each stream.
#[derive(Debug, Clone, PartialEq)]
pub struct PresentationTiming {
    pub pre_stream: Duration,
    pub post_stream_response: Duration,
    pub post_stream_passive: Duration,
    pub fixation_symbol: String,
    pub end_symbol: String,
}

impl PresentationTiming {
    pub fn from_config(timing: &TimingConfig) -> Self {
        Self {
            pre_stream: Duration::from_millis(timing.pre_stream_fixation_ms),
            post_stream_response: Duration::from_millis(timing.post_stream_response_ms),
            post_stream_passive: Duration::from_millis(timing.post_stream_passive_ms),
            fixation_symbol: timing.fixation_symbol.clone(),
            end_symbol: timing.end_symbol.clone(),
        }
    }

    pub fn post_stream(&self, require_response: bool) -> Duration {
        if require_response {
            self.post_stream_response
        } else {
            self.post_stream_passive
        }
    }
}

impl Default for PresentationTiming {
    fn default() -> Self {
        Self::from_config(&TimingConfig::default())
    }
}

/// Per-item durations in whole frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameBudget {
    pub item: u32,
    pub practice: u32,
}

impl FrameBudget {
    pub fn from_timing(timing: &TimingConfig, rate: FrameRate) -> Self {
        Self {
            item: item_duration_frames(timing.item_duration_ms, rate),
            practice: item_duration_frames(
                timing.item_duration_ms / timing.practice_speed_factor,
                rate,
            ),
        }
    }
}

/// Presents one stream at a time through the display, trigger and input
/// collaborators, and scores the response.
pub struct TrialRunner<R, C, T, Tm> {
    renderer: R,
    collector: C,
    triggers: T,
    timer: Tm,
    task: TaskKind,
    timing: PresentationTiming,
    codes: TriggerConfig,
    state: TrialState,
}

impl<R, C, T, Tm> TrialRunner<R, C, T, Tm>
where
    R: StimulusRenderer,
    C: ResponseCollector,
    T: TriggerSink,
    Tm: Timer,
{
    pub fn new(
        renderer: R,
        collector: C,
        triggers: T,
        timer: Tm,
        task: TaskKind,
        timing: PresentationTiming,
        codes: TriggerConfig,
    ) -> Self {
        Self {
            renderer,
            collector,
            triggers,
            timer,
            task,
            timing,
            codes,
            state: TrialState::Complete,
        }
    }

    pub fn alphabet(&self) -> ResponseAlphabet {
        match self.task {
            TaskKind::Identification => ResponseAlphabet::Letters,
            TaskKind::Detection => ResponseAlphabet::YesNo,
        }
    }

    pub fn state(&self) -> TrialState {
        self.state
    }

    pub fn task(&self) -> TaskKind {
        self.task
    }

    pub fn timer(&self) -> &Tm {
        &self.timer
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn collector(&self) -> &C {
        &self.collector
    }

    pub fn triggers(&self) -> &T {
        &self.triggers
    }

    pub fn run(
        &mut self,
        stream: Stream,
        item_frames: u32,
        stimulus: &StimulusParams,
        require_response: bool,
    ) -> Result<TrialOutcome, SessionError> {
        if item_frames == 0 {
            return Err(ConfigError::NonPositive {
                name: "item_frames",
                value: 0.0,
            }
            .into());
        }

        self.state = TrialState::Fixation;
        self.renderer.show_fixation(&self.timing.fixation_symbol)?;
        self.timer.sleep(self.timing.pre_stream);

        self.state = TrialState::Stream;
        for (position, item) in stream.items.iter().enumerate() {
            self.renderer.set_item(item, stimulus);
            for frame in 0..item_frames {
                if frame == 0 {
                    self.fire_onsets(&stream, position, item);
                }
                self.renderer.draw_frame()?;
            }
        }

        self.state = TrialState::PostStream;
        self.renderer.show_fixation(&self.timing.end_symbol)?;
        self.triggers.fire(self.codes.stream_end);
        debug!("stream end");
        self.timer.sleep(self.timing.post_stream(require_response));
        self.renderer.clear()?;

        let (response, correct) = if require_response {
            self.state = TrialState::Response;
            let response = self.collector.collect(&self.alphabet())?;
            let correct = score(&stream.target, &response);
            (Some(response), Some(correct))
        } else {
            (None, None)
        };

        self.state = TrialState::Complete;
        debug!(
            target = ?stream.target,
            position = ?stream.target_position,
            response = ?response,
            correct = ?correct,
            "trial complete"
        );
        Ok(TrialOutcome {
            stream,
            response,
            correct,
        })
    }

    fn fire_onsets(&mut self, stream: &Stream, position: usize, item: &str) {
        if position == 0 {
            self.triggers.fire(self.codes.stream_start);
            debug!(item, "stream start");
        }
        if stream.is_target(position) {
            self.triggers.fire(self.codes.target_onset);
            debug!(item, position, "target onset");
        }
        if let Some(code) = self.codes.items.get(item) {
            self.triggers.fire(*code);
        }
    }

    /// Between-block instruction screen.
    pub fn acknowledge(&mut self, message: &str) -> Result<(), SessionError> {
        self.collector.acknowledge(message)
    }
}

/// Identification compares labels; detection compares reported presence.
pub fn score(target: &Target, response: &str) -> bool {
    match target {
        Target::Identity(label) => response == label,
        Target::Presence(present) => (response == "Y") == *present,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsvp_core::LoggingTrigger;
    use rsvp_timing::SimulatedTimer;
    use std::collections::VecDeque;

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
        frames: usize,
    }

    impl StimulusRenderer for Recorder {
        fn show_fixation(&mut self, symbol: &str) -> Result<(), SessionError> {
            self.events.push(format!("fix {symbol}"));
            Ok(())
        }

        fn set_item(&mut self, label: &str, _stimulus: &StimulusParams) {
            self.events.push(format!("item {label}"));
        }

        fn draw_frame(&mut self) -> Result<(), SessionError> {
            self.frames += 1;
            Ok(())
        }

        fn clear(&mut self) -> Result<(), SessionError> {
            self.events.push("clear".to_string());
            Ok(())
        }
    }

    struct Answers(VecDeque<Result<String, SessionError>>);

    impl ResponseCollector for Answers {
        fn collect(&mut self, _alphabet: &ResponseAlphabet) -> Result<String, SessionError> {
            self.0.pop_front().unwrap_or(Err(SessionError::InputClosed))
        }

        fn acknowledge(&mut self, _message: &str) -> Result<(), SessionError> {
            Ok(())
        }
    }

    type TestRunner = TrialRunner<Recorder, Answers, LoggingTrigger, SimulatedTimer>;

    fn runner(task: TaskKind, answers: Vec<Result<String, SessionError>>) -> TestRunner {
        TrialRunner::new(
            Recorder::default(),
            Answers(answers.into()),
            LoggingTrigger::new(),
            SimulatedTimer::new(),
            task,
            PresentationTiming::default(),
            TriggerConfig::default(),
        )
    }

    fn stream() -> Stream {
        Stream {
            items: ["1", "2", "K", "3"].iter().map(|s| s.to_string()).collect(),
            target_position: Some(2),
            target: Target::Identity("K".to_string()),
        }
    }

    fn params() -> StimulusParams {
        StimulusParams::new(0.8, 100.0, 0.0)
    }

    #[test]
    fn correct_identification() {
        let mut r = runner(TaskKind::Identification, vec![Ok("K".to_string())]);
        let outcome = r.run(stream(), 6, &params(), true).unwrap();
        assert_eq!(outcome.correct, Some(true));
        assert_eq!(outcome.response.as_deref(), Some("K"));
        assert_eq!(r.state(), TrialState::Complete);
    }

    #[test]
    fn every_item_gets_its_frames() {
        let mut r = runner(TaskKind::Identification, vec![Ok("C".to_string())]);
        let outcome = r.run(stream(), 6, &params(), true).unwrap();
        assert_eq!(outcome.correct, Some(false));
        assert_eq!(r.renderer().frames, 24);
        assert_eq!(
            r.renderer().events,
            ["fix +", "item 1", "item 2", "item K", "item 3", "fix +", "clear"]
        );
    }

    #[test]
    fn triggers_in_presentation_order() {
        let mut r = runner(TaskKind::Identification, vec![Ok("K".to_string())]);
        r.run(stream(), 2, &params(), true).unwrap();
        // start, item 1, item 2, target onset, item K (13), item 3, end
        assert_eq!(r.triggers().fired, [101, 1, 2, 102, 13, 3, 103]);
    }

    #[test]
    fn passive_trials_wait_longer_and_skip_response() {
        let mut r = runner(TaskKind::Identification, Vec::new());
        let outcome = r.run(stream(), 1, &params(), false).unwrap();
        assert_eq!(outcome.correct, None);
        assert_eq!(outcome.response, None);
        assert_eq!(r.timer().elapsed_total(), Duration::from_millis(1700));
    }

    #[test]
    fn response_trials_use_short_post_fixation() {
        let mut r = runner(TaskKind::Identification, vec![Ok("K".to_string())]);
        r.run(stream(), 1, &params(), true).unwrap();
        assert_eq!(r.timer().elapsed_total(), Duration::from_millis(1200));
    }

    #[test]
    fn detection_scores_presence() {
        assert!(score(&Target::Presence(true), "Y"));
        assert!(score(&Target::Presence(false), "N"));
        assert!(!score(&Target::Presence(false), "Y"));
        assert_eq!(runner(TaskKind::Detection, Vec::new()).alphabet(), ResponseAlphabet::YesNo);
    }

    #[test]
    fn abort_propagates() {
        let mut r = runner(TaskKind::Identification, vec![Err(SessionError::Aborted)]);
        let err = r.run(stream(), 1, &params(), true).unwrap_err();
        assert!(err.is_abort());
    }

    #[test]
    fn practice_frames_follow_speed_factor() {
        let timing = TimingConfig {
            practice_speed_factor: 0.5,
            ..TimingConfig::default()
        };
        let budget = FrameBudget::from_timing(&timing, FrameRate::assumed(60.0));
        assert_eq!(budget, FrameBudget { item: 6, practice: 12 });
    }

    #[test]
    fn zero_frames_is_rejected() {
        let mut r = runner(TaskKind::Identification, Vec::new());
        assert!(matches!(
            r.run(stream(), 0, &params(), true),
            Err(SessionError::Config(ConfigError::NonPositive { .. }))
        ));
    }
}
