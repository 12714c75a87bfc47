//! Trainer - drives collect, shape, aggregate and apply for every batch

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use pgrad_core::RunId;

use crate::aggregate::aggregate_gradients;
use crate::config::TrainerConfig;
use crate::env::{Environment, Render};
use crate::episode::Batch;
use crate::policy::Policy;
use crate::runner::{play, run_episode};
use crate::session::{Session, SessionSummary};
use crate::shaping::RewardShaper;

/// Where the trainer is in its per-run state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Init,
    CollectBatch,
    ShapeRewards,
    AggregateGradients,
    ApplyUpdate,
    Done,
}

/// Per-iteration statistics
#[derive(Debug, Clone, Serialize)]
pub struct IterationStats {
    pub iteration: usize,
    pub episodes: usize,
    pub total_steps: usize,
    pub truncated_episodes: usize,
    pub mean_episode_length: f64,
    pub min_episode_length: usize,
    pub max_episode_length: usize,
    /// Mean undiscounted return
    pub mean_episode_return: f64,
}

impl IterationStats {
    fn from_batch<O, A>(iteration: usize, batch: &Batch<O, A>) -> Self {
        let episodes = batch.len();
        let lengths = batch.episodes().iter().map(|e| e.len());
        let total_return: f64 = batch.episodes().iter().map(|e| e.total_reward()).sum();
        let total_steps = batch.total_steps();

        Self {
            iteration,
            episodes,
            total_steps,
            truncated_episodes: batch.episodes().iter().filter(|e| e.is_truncated()).count(),
            mean_episode_length: if episodes > 0 {
                total_steps as f64 / episodes as f64
            } else {
                0.0
            },
            min_episode_length: lengths.clone().min().unwrap_or(0),
            max_episode_length: lengths.max().unwrap_or(0),
            mean_episode_return: if episodes > 0 {
                total_return / episodes as f64
            } else {
                0.0
            },
        }
    }
}

/// Result of a full training run
#[derive(Debug, Clone, Serialize)]
pub struct TrainingReport {
    pub run_id: RunId,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub iterations: Vec<IterationStats>,
}

impl TrainingReport {
    /// Stats of the last iteration
    pub fn last(&self) -> Option<&IterationStats> {
        self.iterations.last()
    }

    /// Highest mean episode return over all iterations
    pub fn best_mean_return(&self) -> Option<f64> {
        self.iterations
            .iter()
            .map(|s| s.mean_episode_return)
            .reduce(f64::max)
    }
}

/// Episodic policy-gradient trainer
pub struct Trainer<E, P> {
    env: E,
    policy: P,
    session: Session,
    config: TrainerConfig,
    shaper: RewardShaper,
    phase: Phase,
    completed_iterations: usize,
    run_id: RunId,
}

impl<E, P> Trainer<E, P>
where
    E: Environment,
    P: Policy<E::Observation, E::Action>,
{
    /// Create a trainer; the session is created here and lives until [`Trainer::finish`]
    pub fn new(env: E, policy: P, config: TrainerConfig) -> Result<Self> {
        config.validate()?;
        let shaper = RewardShaper::new(config.discount, config.zero_variance)?;
        let session = Session::new(config.seed);

        Ok(Self {
            env,
            policy,
            session,
            config,
            shaper,
            phase: Phase::Init,
            completed_iterations: 0,
            run_id: RunId::new(),
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Number of updates applied so far
    pub fn completed_iterations(&self) -> usize {
        self.completed_iterations
    }

    /// Collect `episodes_per_update` episodes under the current policy
    pub fn collect_batch(&mut self) -> Result<Batch<E::Observation, E::Action>> {
        self.phase = Phase::CollectBatch;

        let mut batch = Batch::with_capacity(self.config.episodes_per_update);
        for game in 0..self.config.episodes_per_update {
            let episode = run_episode(
                &mut self.env,
                &mut self.policy,
                &mut self.session,
                self.config.max_steps,
            )?;
            debug!(game, steps = episode.len(), truncated = episode.is_truncated(), "Episode finished");
            batch.push(episode);
        }
        Ok(batch)
    }

    /// One full batch: collect, shape, aggregate, apply
    pub fn train_iteration(&mut self) -> Result<IterationStats> {
        if self.phase == Phase::Done {
            bail!("training run already finished");
        }
        let iteration = self.completed_iterations;

        let batch = self.collect_batch()?;
        let stats = IterationStats::from_batch(iteration, &batch);

        self.phase = Phase::ShapeRewards;
        let advantages = self.shaper.shape(&batch.reward_traces())?;

        self.phase = Phase::AggregateGradients;
        let gradients = aggregate_gradients(&batch, &advantages)?;
        drop(batch);

        self.phase = Phase::ApplyUpdate;
        self.policy.apply(&mut self.session, &gradients)?;
        self.session.record_update();
        self.completed_iterations += 1;

        info!(
            iteration,
            episodes = stats.episodes,
            mean_length = stats.mean_episode_length,
            mean_return = stats.mean_episode_return,
            "Iteration complete"
        );

        Ok(stats)
    }

    /// Run the configured number of iterations
    pub fn train(&mut self) -> Result<TrainingReport> {
        if self.phase == Phase::Done {
            bail!("training run already finished");
        }
        let started_at = Utc::now();
        info!(
            run_id = %self.run_id,
            iterations = self.config.iterations,
            episodes_per_update = self.config.episodes_per_update,
            max_steps = self.config.max_steps,
            discount = self.config.discount,
            "Training started"
        );

        let mut iterations = Vec::with_capacity(self.config.iterations);
        for _ in 0..self.config.iterations {
            iterations.push(self.train_iteration()?);
        }

        self.phase = Phase::Done;
        let report = TrainingReport {
            run_id: self.run_id,
            started_at,
            finished_at: Utc::now(),
            iterations,
        };
        info!(
            run_id = %self.run_id,
            updates = self.session.updates(),
            "Training finished"
        );
        Ok(report)
    }

    /// Play one rendered episode with the current policy; no learning happens
    pub fn play(&mut self, max_steps: Option<usize>) -> Result<usize>
    where
        E: Render,
    {
        play(&mut self.env, &mut self.policy, &mut self.session, max_steps)
    }

    /// Tear down the trainer, releasing its session
    pub fn finish(self) -> (P, E, SessionSummary) {
        let summary = self.session.release();
        (self.policy, self.env, summary)
    }
}
