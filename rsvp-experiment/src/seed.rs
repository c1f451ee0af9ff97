//! Per-trial random sources.
//!
//! Every trial draws its stream from a fresh `StdRng`. How that generator is
//! seeded decides what a rerun reproduces:
//!
//! - `Entropy`: nothing, each trial is seeded from the OS.
//! - `Session`: the whole session, trial by trial. Sub-seeds are BLAKE3
//!   hashes of the master seed and the trial counter.
//! - `TrialConfig`: the seed is a hash of participant id, stimulus size and
//!   whether a response is collected. It is recomputed identically on every
//!   trial, so trials that share those parameters get the *same* stream
//!   (same target, same position). This reproduces one of the legacy
//!   scripts; keep it only when that repetition is wanted.

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SeedMode {
    #[default]
    Entropy,
    Session {
        seed: u64,
    },
    TrialConfig,
}

/// Parameters a `TrialConfig` seed is derived from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrialKey {
    pub size_deg: f64,
    pub require_response: bool,
}

#[derive(Debug, Clone)]
pub struct TrialSeeder {
    mode: SeedMode,
    participant: String,
    trials: u64,
}

impl TrialSeeder {
    pub fn new(mode: SeedMode, participant: impl Into<String>) -> Self {
        Self {
            mode,
            participant: participant.into(),
            trials: 0,
        }
    }

    pub fn mode(&self) -> SeedMode {
        self.mode
    }

    /// Generator for the next trial. Advances the trial counter.
    pub fn next_rng(&mut self, key: &TrialKey) -> StdRng {
        let trial = self.trials;
        self.trials += 1;
        match self.mode {
            SeedMode::Entropy => StdRng::from_os_rng(),
            SeedMode::Session { seed } => StdRng::seed_from_u64(session_sub_seed(seed, trial)),
            SeedMode::TrialConfig => {
                StdRng::seed_from_u64(trial_config_seed(&self.participant, key))
            }
        }
    }
}

pub fn session_sub_seed(master: u64, trial: u64) -> u64 {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&master.to_le_bytes());
    hasher.update(&trial.to_le_bytes());
    first_u64(hasher.finalize())
}

pub fn trial_config_seed(participant: &str, key: &TrialKey) -> u64 {
    let mut hasher = blake3::Hasher::new();
    hasher.update(participant.as_bytes());
    hasher.update(&key.size_deg.to_bits().to_le_bytes());
    hasher.update(&[key.require_response as u8]);
    first_u64(hasher.finalize())
}

fn first_u64(hash: blake3::Hash) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[..8]);
    u64::from_le_bytes(bytes)
}
