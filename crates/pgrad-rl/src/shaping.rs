//! Discounted reward shaping and batch normalization

use ndarray::Array1;
use serde::{Deserialize, Serialize};
use tracing::warn;

use pgrad_core::{PgError, Result, Reward};

/// What to do when every discounted reward in a batch is the same
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroVariancePolicy {
    /// Reject the batch with [`PgError::DegenerateBatch`]
    #[default]
    Fail,
    /// Keep the discounted rewards as they are
    Skip,
    /// Subtract the mean only
    Center,
}

/// Mean and population standard deviation of a pooled batch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PooledStats {
    pub mean: f64,
    pub std: f64,
    pub count: usize,
}

/// Check that a discount factor lies in (0, 1]
pub fn validate_discount(discount: f64) -> Result<()> {
    if discount > 0.0 && discount <= 1.0 {
        Ok(())
    } else {
        Err(PgError::Config(format!(
            "discount factor must be in (0, 1], got {discount}"
        )))
    }
}

/// `g[t] = r[t] + discount * g[t + 1]`, computed backward with `g[T] = 0`
pub fn discount_rewards(rewards: &[Reward], discount: f64) -> Vec<f64> {
    let mut discounted = vec![0.0; rewards.len()];
    let mut cumulative = 0.0;
    for step in (0..rewards.len()).rev() {
        cumulative = rewards[step] + cumulative * discount;
        discounted[step] = cumulative;
    }
    discounted
}

/// Pooled statistics over every value of every trace, `None` if there are no values
pub fn pooled_stats(traces: &[Vec<f64>]) -> Option<PooledStats> {
    let pool: Array1<f64> = traces.iter().flatten().copied().collect();
    let mean = pool.mean()?;
    Some(PooledStats {
        mean,
        std: pool.std(0.0),
        count: pool.len(),
    })
}

/// True when every pooled value equals the first one
fn all_identical(traces: &[Vec<f64>]) -> bool {
    let mut values = traces.iter().flatten();
    match values.next() {
        Some(first) => values.all(|v| v == first),
        None => true,
    }
}

/// Discount every episode, then normalize all of them with shared statistics.
///
/// Fails on an empty batch and on a batch with zero variance.
pub fn discount_and_normalize(traces: &[Vec<Reward>], discount: f64) -> Result<Vec<Vec<f64>>> {
    RewardShaper::new(discount, ZeroVariancePolicy::Fail)?.shape(traces)
}

/// Turns raw reward traces into batch-normalized advantages
#[derive(Debug, Clone, Copy)]
pub struct RewardShaper {
    discount: f64,
    zero_variance: ZeroVariancePolicy,
}

impl RewardShaper {
    pub fn new(discount: f64, zero_variance: ZeroVariancePolicy) -> Result<Self> {
        validate_discount(discount)?;
        Ok(Self {
            discount,
            zero_variance,
        })
    }

    /// Discount one episode
    pub fn discount(&self, rewards: &[Reward]) -> Vec<f64> {
        discount_rewards(rewards, self.discount)
    }

    /// Discount each trace independently and normalize them jointly
    pub fn shape(&self, traces: &[Vec<Reward>]) -> Result<Vec<Vec<f64>>> {
        if traces.is_empty() {
            return Err(PgError::EmptyBatch("no episodes to shape".to_string()));
        }

        let mut discounted: Vec<Vec<f64>> = traces.iter().map(|r| self.discount(r)).collect();

        let stats = pooled_stats(&discounted)
            .ok_or_else(|| PgError::EmptyBatch("every episode has zero steps".to_string()))?;

        // Exact identity, not `std == 0`: the pooled mean of identical values
        // can carry rounding error.
        let degenerate = all_identical(&discounted);

        if degenerate {
            match self.zero_variance {
                ZeroVariancePolicy::Fail => {
                    return Err(PgError::DegenerateBatch { mean: stats.mean });
                }
                ZeroVariancePolicy::Skip => {
                    warn!(mean = stats.mean, "Zero reward variance, skipping normalization");
                    return Ok(discounted);
                }
                ZeroVariancePolicy::Center => {
                    warn!(mean = stats.mean, "Zero reward variance, centering only");
                    for value in discounted.iter_mut().flatten() {
                        *value = 0.0;
                    }
                    return Ok(discounted);
                }
            }
        }

        for value in discounted.iter_mut().flatten() {
            *value = (*value - stats.mean) / stats.std;
        }
        Ok(discounted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    #[test]
    fn test_discount_rewards_backward() {
        assert_eq!(discount_rewards(&[1.0, 1.0, 1.0], 0.5), vec![1.75, 1.5, 1.0]);
    }

    #[test]
    fn test_single_step_ignores_discount() {
        for discount in [0.01, 0.5, 0.95, 1.0] {
            assert_eq!(discount_rewards(&[3.5], discount), vec![3.5]);
        }
    }

    #[test]
    fn test_empty_trace() {
        assert!(discount_rewards(&[], 0.9).is_empty());
    }

    #[test]
    fn test_undiscounted_is_suffix_sum() {
        assert_eq!(discount_rewards(&[1.0, 2.0, 3.0], 1.0), vec![6.0, 5.0, 3.0]);
    }

    #[test]
    fn test_validate_discount() {
        assert!(validate_discount(0.95).is_ok());
        assert!(validate_discount(1.0).is_ok());
        assert!(validate_discount(0.0).is_err());
        assert!(validate_discount(1.01).is_err());
        assert!(validate_discount(-0.5).is_err());
        assert!(validate_discount(f64::NAN).is_err());
    }

    #[test]
    fn test_normalized_batch_has_zero_mean_unit_std() {
        let traces = vec![vec![1.0, 0.0, 2.0], vec![0.5], vec![-1.0, 3.0]];
        let shaped = discount_and_normalize(&traces, 0.9).unwrap();

        assert_eq!(shaped.len(), 3);
        assert_eq!(shaped[0].len(), 3);
        assert_eq!(shaped[1].len(), 1);
        assert_eq!(shaped[2].len(), 2);

        let stats = pooled_stats(&shaped).unwrap();
        assert_close(stats.mean, 0.0);
        assert_close(stats.std, 1.0);
        assert_eq!(stats.count, 6);
    }

    #[test]
    fn test_normalization_is_joint_not_per_episode() {
        // Two single-step episodes: per-episode normalization would be undefined,
        // joint normalization maps them to -1 and 1.
        let shaped = discount_and_normalize(&[vec![1.0], vec![3.0]], 0.9).unwrap();
        assert_close(shaped[0][0], -1.0);
        assert_close(shaped[1][0], 1.0);
    }

    #[test]
    fn test_empty_batch_is_rejected() {
        let err = discount_and_normalize(&[], 0.9).unwrap_err();
        assert!(matches!(err, PgError::EmptyBatch(_)));

        let err = discount_and_normalize(&[vec![], vec![]], 0.9).unwrap_err();
        assert!(matches!(err, PgError::EmptyBatch(_)));
    }

    #[test]
    fn test_zero_variance_fails_by_default() {
        let err = discount_and_normalize(&[vec![1.0], vec![1.0]], 0.9).unwrap_err();
        match err {
            PgError::DegenerateBatch { mean } => assert_close(mean, 1.0),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_identical_large_values_are_degenerate() {
        let traces = vec![vec![(0.1 + 0.2) * 1e9]; 7];
        assert!(matches!(
            discount_and_normalize(&traces, 0.9),
            Err(PgError::DegenerateBatch { .. })
        ));
    }

    #[test]
    fn test_distinct_large_values_are_normalized() {
        let a = 1e6;
        let b = 1e6 + 2e-10;
        assert_ne!(a, b);

        let shaped = discount_and_normalize(&[vec![a], vec![b]], 0.9).unwrap();
        assert!(shaped[0][0] < shaped[1][0]);
        assert!(shaped.iter().flatten().all(|v| v.is_finite()));
    }

    #[test]
    fn test_zero_variance_skip() {
        let shaper = RewardShaper::new(0.5, ZeroVariancePolicy::Skip).unwrap();
        let shaped = shaper.shape(&[vec![2.0], vec![2.0]]).unwrap();
        assert_eq!(shaped, vec![vec![2.0], vec![2.0]]);
    }

    #[test]
    fn test_zero_variance_center() {
        let shaper = RewardShaper::new(0.5, ZeroVariancePolicy::Center).unwrap();
        let shaped = shaper.shape(&[vec![2.0], vec![2.0]]).unwrap();
        assert_eq!(shaped, vec![vec![0.0], vec![0.0]]);
    }

    #[test]
    fn test_shaper_rejects_bad_discount() {
        assert!(RewardShaper::new(0.0, ZeroVariancePolicy::Fail).is_err());
    }

    #[test]
    fn test_policy_deserialization() {
        let policy: ZeroVariancePolicy = serde_json::from_str("\"skip\"").unwrap();
        assert_eq!(policy, ZeroVariancePolicy::Skip);
        assert_eq!(ZeroVariancePolicy::default(), ZeroVariancePolicy::Fail);
    }
}
