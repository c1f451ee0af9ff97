//! Property tests for staircase and stream invariants.
//!
//! 1. The level index never leaves the scale.
//! 2. N correct responses from the start land on index min(N, last).
//! 3. Error pairs step back one level; single errors never move it.
//! 4. Completion needs both the reversal count and the trial minimum.
//! 5. The threshold is the mean of the last reversals, or the current level.
//! 6. Streams never repeat an item back to back and hold one target.
//! 7. A reversal is counted exactly when the direction flips between
//!    increasing and decreasing, never on the first move.

use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rsvp_experiment::config::TaskKind;
use rsvp_experiment::{Direction, LevelScale, SizeStaircase, StaircaseRule, StreamGenerator};

// ── Strategies ───────────────────────────────────────────────────────

fn arb_scale() -> impl Strategy<Value = LevelScale> {
    prop::collection::vec(-1.0..2.0_f64, 1..16)
        .prop_map(|values| LevelScale::new(values).expect("finite, non-empty"))
}

fn arb_rule() -> impl Strategy<Value = StaircaseRule> {
    (0..5usize, 0..20usize).prop_map(|(required_reversals, min_trials)| StaircaseRule {
        required_reversals,
        min_trials,
        max_consecutive_errors: 2,
    })
}

fn staircase(scale: LevelScale, rule: StaircaseRule) -> SizeStaircase {
    let start = scale.get(0);
    SizeStaircase::new(scale, start, rule)
}

// ── 1-3. Level movement ──────────────────────────────────────────────

proptest! {
    #[test]
    fn index_stays_in_bounds(
        scale in arb_scale(),
        responses in prop::collection::vec(any::<bool>(), 0..200),
    ) {
        let last = scale.last_index();
        let mut s = staircase(scale, StaircaseRule::default());
        for correct in responses {
            let info = s.record_response(correct);
            prop_assert!(info.new_index <= last);
            prop_assert!(info.old_index.abs_diff(info.new_index) <= 1);
        }
    }

    #[test]
    fn correct_run_descends_to_hardest(scale in arb_scale(), n in 0..40usize) {
        let last = scale.last_index();
        let mut s = staircase(scale, StaircaseRule::default());
        for _ in 0..n {
            s.record_response(true);
        }
        prop_assert_eq!(s.current_index(), n.min(last));
        prop_assert_eq!(s.reversal_count(), 0);
    }

    #[test]
    fn error_pairs_step_back_one_level(scale in arb_scale(), down in 0..10usize) {
        let mut s = staircase(scale, StaircaseRule::default());
        for _ in 0..down {
            s.record_response(true);
        }
        let before = s.current_index();
        let single = s.record_response(false);
        prop_assert_eq!(single.new_index, before);
        let pair = s.record_response(false);
        prop_assert_eq!(pair.new_index, before.saturating_sub(1));
        prop_assert_eq!(s.consecutive_errors(), 0);
    }
}

// ── 4-5. Completion and threshold ────────────────────────────────────

proptest! {
    #[test]
    fn completion_requires_both_criteria(
        scale in arb_scale(),
        rule in arb_rule(),
        responses in prop::collection::vec(any::<bool>(), 0..120),
    ) {
        let mut s = staircase(scale, rule);
        for correct in responses {
            s.record_response(correct);
            prop_assert_eq!(
                s.is_complete(),
                s.reversal_count() >= rule.required_reversals
                    && s.trials_completed() >= rule.min_trials
            );
            prop_assert_eq!(s.reversal_count(), s.reversal_points().len());
        }
    }

    #[test]
    fn threshold_is_mean_of_last_reversals(
        scale in arb_scale(),
        rule in arb_rule(),
        responses in prop::collection::vec(any::<bool>(), 0..120),
    ) {
        let mut s = staircase(scale, rule);
        for correct in responses {
            s.record_response(correct);
        }
        let points = s.reversal_points();
        let n = rule.required_reversals;
        if n > 0 && points.len() >= n {
            let expected = points[points.len() - n..].iter().map(|p| p.level).sum::<f64>() / n as f64;
            prop_assert!((s.threshold() - expected).abs() < 1e-9);
        } else {
            prop_assert_eq!(s.threshold(), s.current_level());
        }
    }
}

// ── 6. Streams ───────────────────────────────────────────────────────

proptest! {
    #[test]
    fn streams_are_well_formed(seed in any::<u64>(), length in 4..24usize, distractors in 2..9usize) {
        let targets: Vec<String> = ["C", "D", "H", "K"].iter().map(|s| s.to_string()).collect();
        let pool: Vec<String> = (1..=distractors).map(|d| d.to_string()).collect();
        let generator = StreamGenerator::new(
            targets.clone(),
            pool,
            length,
            1..=length - 2,
            TaskKind::Identification,
        )
        .expect("valid generator");
        let stream = generator.generate(&mut StdRng::seed_from_u64(seed), true);

        prop_assert_eq!(stream.len(), length);
        for pair in stream.items.windows(2) {
            prop_assert_ne!(&pair[0], &pair[1]);
        }
        let position = stream.target_position.expect("target placed");
        prop_assert!((1..=length - 2).contains(&position));
        prop_assert_eq!(stream.items.iter().filter(|i| targets.contains(i)).count(), 1);
    }
}

// ── 7. Reversals ─────────────────────────────────────────────────────

proptest! {
    #[test]
    fn reversal_iff_direction_flips(
        scale in arb_scale(),
        responses in prop::collection::vec(any::<bool>(), 0..200),
    ) {
        let mut s = staircase(scale, StaircaseRule::default());
        for correct in responses {
            let before = s.reversal_count();
            let info = s.record_response(correct);
            let flipped = info.old_direction != Direction::Unset
                && info.old_direction != info.new_direction;
            prop_assert_eq!(info.reversal, flipped);
            prop_assert_eq!(info.reversal_count, before + usize::from(flipped));

            match info.new_index.cmp(&info.old_index) {
                std::cmp::Ordering::Greater => {
                    prop_assert_eq!(info.new_direction, Direction::Decreasing)
                }
                std::cmp::Ordering::Less => {
                    prop_assert_eq!(info.new_direction, Direction::Increasing)
                }
                std::cmp::Ordering::Equal => {
                    prop_assert_eq!(info.new_direction, info.old_direction)
                }
            }
        }
    }
}
