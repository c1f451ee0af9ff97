//! A model participant for dry runs.
//!
//! [`SimulatedObserver::split`] yields a display and a responder that share
//! what was "seen" during the last stream. The display notes the target item
//! and its rendering; the responder reports it with a probability given by a
//! [`Psychometric`] function of size and contrast, and guesses otherwise.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rsvp_core::{
    ResponseAlphabet, ResponseCollector, SessionError, StimulusParams, StimulusRenderer,
};
use rsvp_timing::{FrameRate, SimulatedTimer, Timer};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;
use tracing::trace;

/// Probability of seeing a target, as the product of two logistic curves:
/// one over LogMAR size, one over log10 contrast.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Psychometric {
    pub size_threshold_logmar: f64,
    pub contrast_threshold_pct: f64,
    /// Steepness per LogMAR unit.
    pub size_slope: f64,
    /// Steepness per log10 contrast unit.
    pub contrast_slope: f64,
    pub lapse_rate: f64,
}

impl Default for Psychometric {
    fn default() -> Self {
        Self {
            size_threshold_logmar: 0.3,
            contrast_threshold_pct: 8.0,
            size_slope: 20.0,
            contrast_slope: 8.0,
            lapse_rate: 0.02,
        }
    }
}

impl Psychometric {
    pub fn p_seen(&self, stimulus: &StimulusParams) -> f64 {
        let logmar = degrees_to_logmar(stimulus.size_deg);
        let size = logistic(self.size_slope * (logmar - self.size_threshold_logmar));
        let contrast = logistic(
            self.contrast_slope
                * (stimulus.contrast_pct.max(1e-6).log10() - self.contrast_threshold_pct.log10()),
        );
        ((1.0 - self.lapse_rate) * size * contrast).clamp(0.0, 1.0)
    }
}

/// Inverse of `logmar_to_degrees`.
pub fn degrees_to_logmar(size_deg: f64) -> f64 {
    (size_deg.max(1e-9) * 60.0 / 5.0).log10()
}

fn logistic(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

#[derive(Debug, Default)]
struct Percept {
    target: Option<(String, StimulusParams)>,
    closed: bool,
}

pub struct SimulatedObserver {
    model: Psychometric,
    targets: Vec<String>,
    rng: StdRng,
    timer: SimulatedTimer,
    frame: Duration,
}

impl SimulatedObserver {
    pub fn new(model: Psychometric, targets: Vec<String>, seed: u64) -> Self {
        Self {
            model,
            targets,
            rng: StdRng::seed_from_u64(seed),
            timer: SimulatedTimer::new(),
            frame: Duration::from_secs_f64(1.0 / 60.0),
        }
    }

    /// Frames advance `timer` by one refresh interval of `rate`.
    pub fn with_clock(mut self, timer: SimulatedTimer, rate: FrameRate) -> Self {
        self.timer = timer;
        self.frame = Duration::from_secs_f64(1.0 / rate.hz);
        self
    }

    pub fn split(self) -> (ObserverDisplay, ObserverResponder) {
        let percept = Rc::new(RefCell::new(Percept::default()));
        let display = ObserverDisplay {
            percept: Rc::clone(&percept),
            targets: self.targets.clone(),
            timer: self.timer,
            frame: self.frame,
            frames_drawn: 0,
        };
        let responder = ObserverResponder {
            percept,
            model: self.model,
            targets: self.targets,
            rng: self.rng,
        };
        (display, responder)
    }
}

pub struct ObserverDisplay {
    percept: Rc<RefCell<Percept>>,
    targets: Vec<String>,
    timer: SimulatedTimer,
    frame: Duration,
    frames_drawn: u64,
}

impl ObserverDisplay {
    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }
}

impl StimulusRenderer for ObserverDisplay {
    fn show_fixation(&mut self, _symbol: &str) -> Result<(), SessionError> {
        Ok(())
    }

    fn set_item(&mut self, label: &str, stimulus: &StimulusParams) {
        let mut percept = self.percept.borrow_mut();
        if percept.closed {
            *percept = Percept::default();
        }
        if self.targets.iter().any(|t| t == label) {
            percept.target = Some((label.to_string(), *stimulus));
        }
    }

    fn draw_frame(&mut self) -> Result<(), SessionError> {
        self.timer.sleep(self.frame);
        self.frames_drawn += 1;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), SessionError> {
        self.percept.borrow_mut().closed = true;
        Ok(())
    }
}

pub struct ObserverResponder {
    percept: Rc<RefCell<Percept>>,
    model: Psychometric,
    targets: Vec<String>,
    rng: StdRng,
}

impl ResponseCollector for ObserverResponder {
    fn collect(&mut self, alphabet: &ResponseAlphabet) -> Result<String, SessionError> {
        let target = self.percept.borrow_mut().target.take();
        let seen = match &target {
            Some((_, stimulus)) => self.rng.random_bool(self.model.p_seen(stimulus)),
            None => false,
        };
        let response = match alphabet {
            ResponseAlphabet::YesNo => String::from(if seen { "Y" } else { "N" }),
            _ => match target {
                Some((label, _)) if seen => label,
                _ if self.targets.is_empty() => return Err(SessionError::InputClosed),
                _ => self.targets[self.rng.random_range(0..self.targets.len())].clone(),
            },
        };
        trace!(seen, response = %response, "observer response");
        Ok(response)
    }

    fn acknowledge(&mut self, _message: &str) -> Result<(), SessionError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsvp_core::logmar_to_degrees;

    fn steep() -> Psychometric {
        Psychometric {
            size_slope: 1e4,
            contrast_slope: 1e4,
            lapse_rate: 0.0,
            ..Psychometric::default()
        }
    }

    fn params(logmar: f64, contrast_pct: f64) -> StimulusParams {
        StimulusParams::new(logmar_to_degrees(logmar), contrast_pct, 0.0)
    }

    #[test]
    fn logmar_round_trips_through_degrees() {
        assert!((degrees_to_logmar(logmar_to_degrees(0.4)) - 0.4).abs() < 1e-12);
    }

    #[test]
    fn seen_probability_rises_with_size_and_contrast() {
        let model = Psychometric::default();
        assert!(model.p_seen(&params(1.0, 100.0)) > 0.95);
        assert!(model.p_seen(&params(0.0, 100.0)) < 0.05);
        assert!(model.p_seen(&params(1.0, 2.0)) < model.p_seen(&params(1.0, 50.0)));
    }

    #[test]
    fn reports_visible_target() {
        let (mut display, mut responder) =
            SimulatedObserver::new(steep(), vec!["K".into(), "C".into()], 1).split();
        display.set_item("3", &params(1.0, 100.0));
        display.set_item("K", &params(1.0, 100.0));
        display.clear().unwrap();
        assert_eq!(responder.collect(&ResponseAlphabet::Letters).unwrap(), "K");
    }

    #[test]
    fn invisible_target_is_missed_in_detection() {
        let (mut display, mut responder) =
            SimulatedObserver::new(steep(), vec!["K".into()], 1).split();
        display.set_item("K", &params(-0.3, 100.0));
        display.clear().unwrap();
        assert_eq!(responder.collect(&ResponseAlphabet::YesNo).unwrap(), "N");
    }

    #[test]
    fn new_stream_forgets_previous_target() {
        let (mut display, mut responder) =
            SimulatedObserver::new(steep(), vec!["K".into()], 1).split();
        display.set_item("K", &params(1.0, 100.0));
        display.clear().unwrap();
        display.set_item("1", &params(1.0, 100.0));
        display.clear().unwrap();
        assert_eq!(responder.collect(&ResponseAlphabet::YesNo).unwrap(), "N");
    }

    #[test]
    fn frames_advance_the_shared_clock() {
        let timer = SimulatedTimer::new();
        let (mut display, _) = SimulatedObserver::new(steep(), Vec::new(), 1)
            .with_clock(timer.clone(), FrameRate::assumed(100.0))
            .split();
        for _ in 0..5 {
            display.draw_frame().unwrap();
        }
        assert_eq!(display.frames_drawn(), 5);
        assert_eq!(timer.elapsed_total(), Duration::from_millis(50));
    }
}
