//! Integration tests for the policy-gradient trainer
//!
//! These tests drive the trainer end to end with the reference policy and
//! environments.

#![allow(clippy::float_cmp)]
#![allow(clippy::cast_precision_loss)]

use anyhow::Result;
use ndarray::{arr1, arr2, ArrayView1};
use rand::rngs::StdRng;
use rand::SeedableRng;

use pgrad_core::GradientSet;
use pgrad_rl::envs::{CartPole, CartPoleConfig};
use pgrad_rl::shaping::pooled_stats;
use pgrad_rl::{
    aggregate_gradients, discount_and_normalize, discount_rewards, run_episode, Batch, Environment,
    LinearSoftmaxPolicy, Phase, Policy, PolicyConfig, Session, Trainer, TrainerConfig, Transition,
    ZeroVariancePolicy,
};

/// Three-step bandit: action 1 pays 1, action 0 pays nothing
struct Bandit {
    position: usize,
}

impl Environment for Bandit {
    type Observation = Vec<f64>;
    type Action = usize;

    fn reset(&mut self) -> Result<Vec<f64>> {
        self.position = 0;
        Ok(vec![1.0])
    }

    fn step(&mut self, action: &usize) -> Result<Transition<Vec<f64>>> {
        self.position += 1;
        let reward = if *action == 1 { 1.0 } else { 0.0 };
        Ok(Transition::new(vec![1.0], reward, self.position >= 3))
    }
}

fn cartpole(seed: u64) -> CartPole {
    CartPole::new(CartPoleConfig {
        seed: Some(seed),
        ..Default::default()
    })
}

fn cartpole_policy(seed: u64) -> LinearSoftmaxPolicy {
    let mut rng = StdRng::seed_from_u64(seed);
    LinearSoftmaxPolicy::new(
        CartPole::OBSERVATION_SIZE,
        CartPole::ACTION_COUNT,
        &PolicyConfig::default(),
        &mut rng,
    )
    .unwrap()
}

/// Discounting matches the worked example
#[test]
fn test_discount_worked_example() {
    assert_eq!(discount_rewards(&[1.0, 1.0, 1.0], 0.5), vec![1.75, 1.5, 1.0]);
}

/// Replays the same reward trace every episode; observation is the step index
struct Scripted {
    rewards: Vec<f64>,
    position: usize,
}

impl Environment for Scripted {
    type Observation = usize;
    type Action = usize;

    fn reset(&mut self) -> Result<usize> {
        self.position = 0;
        Ok(0)
    }

    fn step(&mut self, _: &usize) -> Result<Transition<usize>> {
        let reward = self.rewards[self.position];
        self.position += 1;
        Ok(Transition::new(self.position, reward, self.position == self.rewards.len()))
    }
}

/// Emits a one-hot gradient at the step index and keeps every applied update
struct StepIndicator {
    width: usize,
    applied: Vec<Vec<f64>>,
}

impl Policy<usize, usize> for StepIndicator {
    fn act(&mut self, _: &mut Session, step: &usize) -> Result<(usize, GradientSet)> {
        let mut grad = vec![0.0; self.width];
        grad[*step] = 1.0;
        Ok((0, GradientSet::new(vec![arr1(&grad).into_dyn()])))
    }

    fn apply(&mut self, _: &mut Session, gradients: &GradientSet) -> Result<()> {
        let update = gradients.get(0).unwrap().iter().copied().collect();
        self.applied.push(update);
        Ok(())
    }
}

/// A fixed trace shapes the same way whatever the iteration and episode counts
#[test]
fn test_discount_independent_of_batch_settings() {
    let trace = vec![0.5, -1.0, 2.0, 0.0];
    let steps = trace.len() as f64;
    let expected = discount_and_normalize(&[trace.clone()], 0.9).unwrap().remove(0);

    for (iterations, episodes) in [(1, 1), (3, 4), (5, 10)] {
        let env = Scripted {
            rewards: trace.clone(),
            position: 0,
        };
        let policy = StepIndicator {
            width: trace.len(),
            applied: Vec::new(),
        };
        let config = TrainerConfig {
            iterations,
            episodes_per_update: episodes,
            max_steps: 10,
            discount: 0.9,
            seed: Some(0),
            ..Default::default()
        };

        let mut trainer = Trainer::new(env, policy, config).unwrap();
        trainer.train().unwrap();
        let (policy, _, _) = trainer.finish();

        assert_eq!(policy.applied.len(), iterations);
        for update in &policy.applied {
            // Flattened mean over `episodes * steps` pairs of advantage times one-hot
            for (got, want) in update.iter().zip(&expected) {
                assert!(
                    (got * steps - want).abs() < 1e-9,
                    "iterations={iterations} episodes={episodes}: {got} * {steps} != {want}"
                );
            }
        }
    }
}

/// Normalized advantages over a real cart-pole batch have mean 0 and std 1
#[test]
fn test_cartpole_batch_normalization() {
    let mut env = cartpole(1);
    let mut policy = cartpole_policy(1);
    let mut session = Session::new(Some(1));

    let batch: Batch<_, _> = (0..5)
        .map(|_| run_episode(&mut env, &mut policy, &mut session, 200).unwrap())
        .collect();

    let shaped = discount_and_normalize(&batch.reward_traces(), 0.95).unwrap();
    let stats = pooled_stats(&shaped).unwrap();

    assert!(stats.mean.abs() < 1e-9);
    assert!((stats.std - 1.0).abs() < 1e-9);
    assert_eq!(stats.count, batch.total_steps());

    let gradients = aggregate_gradients(&batch, &shaped).unwrap();
    assert_eq!(gradients.shapes(), vec![vec![2, 4], vec![2]]);
}

/// A truncated cart-pole episode is exactly `max_steps` long
#[test]
fn test_truncated_episode_length() {
    let mut env = cartpole(2);
    let mut policy = cartpole_policy(2);
    let mut session = Session::new(Some(2));

    let episode = run_episode(&mut env, &mut policy, &mut session, 3).unwrap();
    assert_eq!(episode.len(), 3);
    assert!(episode.is_truncated());
}

/// One episode of one step aggregates to reward * gradient exactly
#[test]
fn test_single_step_batch_aggregation() {
    let mut env = Bandit { position: 0 };
    let mut session = Session::new(Some(3));
    let mut policy = LinearSoftmaxPolicy::from_parameters(
        arr2(&[[0.0], [0.0]]),
        arr1(&[0.0, 0.0]),
        &PolicyConfig::default(),
    )
    .unwrap();

    let episode = run_episode(&mut env, &mut policy, &mut session, 1).unwrap();
    let step_gradients: GradientSet = episode.steps()[0].gradients.clone();
    let batch: Batch<_, _> = std::iter::once(episode).collect();

    let aggregated = aggregate_gradients(&batch, &[vec![-0.75]]).unwrap();
    let mut expected = step_gradients.zeros_like();
    expected.scaled_add(-0.75, &step_gradients).unwrap();
    assert_eq!(aggregated, expected);
}

/// Full cart-pole run: one update per iteration, seeded runs repeat
#[test]
fn test_cartpole_training_run() {
    let run = || {
        let config = TrainerConfig {
            iterations: 5,
            episodes_per_update: 4,
            max_steps: 200,
            seed: Some(9),
            ..Default::default()
        };
        let mut trainer = Trainer::new(cartpole(9), cartpole_policy(9), config).unwrap();
        let before = trainer.policy().parameters().to_vec();

        let report = trainer.train().unwrap();
        assert_eq!(trainer.phase(), Phase::Done);

        let (policy, _, summary) = trainer.finish();
        assert_eq!(summary.updates, 5);
        assert_ne!(policy.parameters(), before.as_slice());

        for stats in &report.iterations {
            assert_eq!(stats.episodes, 4);
            assert!(stats.max_episode_length <= 200);
            // Cart-pole pays 1 per step
            assert_eq!(stats.mean_episode_return, stats.mean_episode_length);
        }

        report
            .iterations
            .iter()
            .map(|s| s.total_steps)
            .collect::<Vec<_>>()
    };

    assert_eq!(run(), run());
}

/// The trainer learns to prefer the paying arm
#[test]
fn test_bandit_learning() {
    let config = TrainerConfig {
        iterations: 100,
        episodes_per_update: 10,
        max_steps: 10,
        discount: 0.95,
        zero_variance: ZeroVariancePolicy::Skip,
        seed: Some(4),
    };
    let policy = LinearSoftmaxPolicy::from_parameters(
        arr2(&[[0.0], [0.0]]),
        arr1(&[0.0, 0.0]),
        &PolicyConfig {
            learning_rate: 0.05,
            ..Default::default()
        },
    )
    .unwrap();

    let mut trainer = Trainer::new(Bandit { position: 0 }, policy, config).unwrap();
    let report = trainer.train().unwrap();

    let (policy, _, _) = trainer.finish();
    let probs = policy.probabilities(ArrayView1::from(&[1.0][..])).unwrap();
    assert!(probs[1] > 0.6, "paying arm probability {}", probs[1]);
    assert_eq!(report.iterations.len(), 100);
}
