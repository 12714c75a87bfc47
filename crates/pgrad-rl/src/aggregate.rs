//! Advantage-weighted gradient averaging over a batch

use pgrad_core::{GradientSet, PgError, Result};

use crate::episode::Batch;

/// Running sum of `weight * gradient` over (episode, step) pairs
#[derive(Debug, Default)]
pub struct GradientAccumulator {
    sum: Option<GradientSet>,
    count: usize,
}

impl GradientAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one weighted gradient set. The first set fixes the expected shapes.
    pub fn add(&mut self, weight: f64, gradients: &GradientSet) -> Result<()> {
        match self.sum.as_mut() {
            Some(sum) => sum.scaled_add(weight, gradients)?,
            None => {
                let mut sum = gradients.zeros_like();
                sum.scaled_add(weight, gradients)?;
                self.sum = Some(sum);
            }
        }
        self.count += 1;
        Ok(())
    }

    /// Number of weighted gradient sets added so far
    pub fn count(&self) -> usize {
        self.count
    }

    /// Mean of everything added
    pub fn finish(self) -> Result<GradientSet> {
        let mut sum = self
            .sum
            .ok_or_else(|| PgError::EmptyBatch("no steps to aggregate".to_string()))?;
        sum.divide(self.count as f64);
        Ok(sum)
    }
}

/// Mean of `advantage[e][t] * gradient[e][t][p]` over every (episode, step) pair.
///
/// Episodes contribute in proportion to their length.
pub fn aggregate_gradients<O, A>(batch: &Batch<O, A>, advantages: &[Vec<f64>]) -> Result<GradientSet> {
    if advantages.len() != batch.len() {
        return Err(PgError::AdvantageMismatch(format!(
            "{} advantage traces for {} episodes",
            advantages.len(),
            batch.len()
        )));
    }

    let mut accumulator = GradientAccumulator::new();
    for (index, (episode, trace)) in batch.episodes().iter().zip(advantages).enumerate() {
        if trace.len() != episode.len() {
            return Err(PgError::AdvantageMismatch(format!(
                "episode {index}: {} advantages for {} steps",
                trace.len(),
                episode.len()
            )));
        }
        for (&advantage, gradients) in trace.iter().zip(episode.gradients()) {
            accumulator.add(advantage, gradients)?;
        }
    }

    accumulator.finish()
}
