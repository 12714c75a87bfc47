//! Explicitly owned computation context shared by the trainer and the policy

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::debug;

/// Computation context handed to every policy call.
///
/// The trainer creates one session when it is constructed and releases it
/// when it is torn down. Policies draw their sampling randomness from here
/// so a seeded run is reproducible.
pub struct Session {
    rng: StdRng,
    seed: Option<u64>,
    evaluations: u64,
    updates: u64,
}

/// What a session did over its lifetime, returned by [`Session::release`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub seed: Option<u64>,
    pub evaluations: u64,
    pub updates: u64,
}

impl Session {
    /// Create a session, seeded for reproducibility or from OS entropy
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        debug!(?seed, "Session created");
        Self {
            rng,
            seed,
            evaluations: 0,
            updates: 0,
        }
    }

    /// Random number generator for policy sampling
    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Record one policy evaluation
    pub fn record_evaluation(&mut self) {
        self.evaluations += 1;
    }

    /// Record one parameter update
    pub fn record_update(&mut self) {
        self.updates += 1;
    }

    pub fn evaluations(&self) -> u64 {
        self.evaluations
    }

    pub fn updates(&self) -> u64 {
        self.updates
    }

    /// Release the session and report its counters
    pub fn release(self) -> SessionSummary {
        let summary = SessionSummary {
            seed: self.seed,
            evaluations: self.evaluations,
            updates: self.updates,
        };
        debug!(
            evaluations = summary.evaluations,
            updates = summary.updates,
            "Session released"
        );
        summary
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("seed", &self.seed)
            .field("evaluations", &self.evaluations)
            .field("updates", &self.updates)
            .finish_non_exhaustive()
    }
}
