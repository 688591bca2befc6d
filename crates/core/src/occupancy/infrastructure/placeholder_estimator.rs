use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

use crate::detection::domain::detection::Detection;
use crate::occupancy::domain::wait_estimator::{QueueWait, WaitEstimator};

/// Seconds per queued person in the linear queue model.
const SECS_PER_QUEUED_PERSON: f64 = 15.0;
/// Ratio of max to average wait.
const MAX_WAIT_FACTOR: f64 = 1.5;
/// Per-entity wait is drawn uniformly from this range (seconds).
const ENTITY_WAIT_RANGE: std::ops::Range<u32> = 10..120;

/// Stand-in estimator used until detections carry identity.
///
/// Entity waits are random; queue waits follow a fixed linear model.
pub struct PlaceholderEstimator {
    rng: Box<dyn RngCore + Send>,
}

impl PlaceholderEstimator {
    pub fn new() -> Self {
        Self {
            rng: Box::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic sequence, for tests and reproducible runs.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Box::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for PlaceholderEstimator {
    fn default() -> Self {
        Self::new()
    }
}

impl WaitEstimator for PlaceholderEstimator {
    fn entity_wait(&mut self, _position: usize, _detection: &Detection) -> f64 {
        self.rng.gen_range(ENTITY_WAIT_RANGE) as f64
    }

    fn queue_wait(&self, in_queue: u32) -> QueueWait {
        let avg = if in_queue > 0 {
            in_queue as f64 * SECS_PER_QUEUED_PERSON
        } else {
            0.0
        };
        let max = if avg > 0.0 { avg * MAX_WAIT_FACTOR } else { 0.0 };
        QueueWait { avg, max }
    }
}
