use crate::config::{StreamConfig, TaskKind};
use rand::Rng;
use rsvp_core::{ConfigError, Stream, Target};
use std::collections::BTreeSet;
use std::ops::RangeInclusive;

/// Builds RSVP item sequences. Holds no state between calls; all
/// randomness comes from the generator passed to `generate`.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamGenerator {
    targets: Vec<String>,
    distractors: Vec<String>,
    length: usize,
    target_range: RangeInclusive<usize>,
    task: TaskKind,
    target_present_probability: f64,
}

impl StreamGenerator {
    pub fn new(
        targets: Vec<String>,
        distractors: Vec<String>,
        length: usize,
        target_range: RangeInclusive<usize>,
        task: TaskKind,
    ) -> Result<Self, ConfigError> {
        if length == 0 {
            return Err(ConfigError::EmptyStream);
        }
        if targets.is_empty() {
            return Err(ConfigError::EmptyTargetSet);
        }
        let distinct = distractors.iter().collect::<BTreeSet<_>>().len();
        if distinct < 2 {
            return Err(ConfigError::DistractorSetTooSmall(distinct));
        }
        let (min, max) = (*target_range.start(), *target_range.end());
        if min > max || max >= length {
            return Err(ConfigError::TargetRangeOutOfBounds { min, max, len: length });
        }
        Ok(Self {
            targets,
            distractors,
            length,
            target_range,
            task,
            target_present_probability: 1.0,
        })
    }

    pub fn from_config(config: &StreamConfig, task: TaskKind) -> Result<Self, ConfigError> {
        if !(0.0..=1.0).contains(&config.target_present_probability) {
            return Err(ConfigError::InvalidProbability(config.target_present_probability));
        }
        let mut generator = Self::new(
            config.targets.clone(),
            config.distractors.clone(),
            config.length,
            config.target_position_min..=config.target_position_max,
            task,
        )?;
        generator.target_present_probability = config.target_present_probability;
        Ok(generator)
    }

    pub fn task(&self) -> TaskKind {
        self.task
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn target_range(&self) -> &RangeInclusive<usize> {
        &self.target_range
    }

    /// Identification streams always carry a target.
    pub fn draw_target_present<R: Rng + ?Sized>(&self, rng: &mut R) -> bool {
        match self.task {
            TaskKind::Identification => true,
            TaskKind::Detection => rng.random_bool(self.target_present_probability),
        }
    }

    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R, target_present: bool) -> Stream {
        let placed = if target_present {
            let position = rng.random_range(self.target_range.clone());
            let label = self.targets[rng.random_range(0..self.targets.len())].clone();
            Some((position, label))
        } else {
            None
        };

        let mut items: Vec<String> = Vec::with_capacity(self.length);
        for position in 0..self.length {
            match &placed {
                Some((target_position, label)) if *target_position == position => {
                    items.push(label.clone());
                }
                _ => {
                    let item = self.distractor_after(rng, items.last());
                    items.push(item);
                }
            }
        }

        let target = match self.task {
            TaskKind::Identification => match &placed {
                Some((_, label)) => Target::Identity(label.clone()),
                None => Target::Identity(String::new()),
            },
            TaskKind::Detection => Target::Presence(placed.is_some()),
        };

        Stream {
            items,
            target_position: placed.map(|(position, _)| position),
            target,
        }
    }

    fn distractor_after<R: Rng + ?Sized>(&self, rng: &mut R, previous: Option<&String>) -> String {
        loop {
            let candidate = &self.distractors[rng.random_range(0..self.distractors.len())];
            if previous != Some(candidate) {
                return candidate.clone();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn labels(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn generator(distractors: &[&str], task: TaskKind) -> StreamGenerator {
        StreamGenerator::new(labels(&["C", "D", "H"]), labels(distractors), 16, 3..=8, task)
            .unwrap()
    }

    #[test]
    fn one_target_inside_range() {
        let g = generator(&["1", "2", "3"], TaskKind::Identification);
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..200 {
            let stream = g.generate(&mut rng, true);
            assert_eq!(stream.len(), 16);
            let position = stream.target_position.unwrap();
            assert!((3..=8).contains(&position));
            let Target::Identity(label) = &stream.target else {
                panic!("identification stream without identity");
            };
            assert_eq!(&stream.items[position], label);
            let targets = stream.items.iter().filter(|i| ["C", "D", "H"].contains(&i.as_str()));
            assert_eq!(targets.count(), 1);
        }
    }

    #[test]
    fn two_distractors_never_repeat_back_to_back() {
        let g = generator(&["1", "2"], TaskKind::Identification);
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..200 {
            let stream = g.generate(&mut rng, true);
            for pair in stream.items.windows(2) {
                assert_ne!(pair[0], pair[1], "{:?}", stream.items);
            }
        }
    }

    #[test]
    fn same_seed_same_stream() {
        let g = generator(&["1", "2", "3", "4"], TaskKind::Identification);
        let a = g.generate(&mut StdRng::seed_from_u64(5), true);
        let b = g.generate(&mut StdRng::seed_from_u64(5), true);
        assert_eq!(a, b);
    }

    #[test]
    fn absent_detection_stream_is_all_distractors() {
        let g = generator(&["1", "2", "3"], TaskKind::Detection);
        let stream = g.generate(&mut StdRng::seed_from_u64(3), false);
        assert_eq!(stream.target, Target::Presence(false));
        assert_eq!(stream.target_position, None);
        assert!(stream.items.iter().all(|i| ["1", "2", "3"].contains(&i.as_str())));
    }

    #[test]
    fn identification_always_has_a_target() {
        let g = generator(&["1", "2"], TaskKind::Identification);
        let mut rng = StdRng::seed_from_u64(0);
        assert!((0..50).all(|_| g.draw_target_present(&mut rng)));
    }

    #[test]
    fn detection_presence_follows_probability() {
        let config = StreamConfig {
            target_present_probability: 0.0,
            ..StreamConfig::default()
        };
        let g = StreamGenerator::from_config(&config, TaskKind::Detection).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        assert!((0..50).all(|_| !g.draw_target_present(&mut rng)));
    }

    #[test]
    fn rejects_bad_configuration() {
        let err = StreamGenerator::new(
            labels(&["C"]),
            labels(&["1", "1"]),
            16,
            3..=8,
            TaskKind::Identification,
        );
        assert_eq!(err, Err(ConfigError::DistractorSetTooSmall(1)));

        let err = StreamGenerator::new(
            labels(&["C"]),
            labels(&["1", "2"]),
            5,
            3..=8,
            TaskKind::Identification,
        );
        assert!(matches!(err, Err(ConfigError::TargetRangeOutOfBounds { .. })));

        let err = StreamGenerator::new(
            Vec::new(),
            labels(&["1", "2"]),
            16,
            3..=8,
            TaskKind::Identification,
        );
        assert_eq!(err, Err(ConfigError::EmptyTargetSet));
    }
}
