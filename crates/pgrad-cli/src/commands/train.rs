//! Train the linear softmax policy on cart-pole

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

use pgrad_core::PgError;
use pgrad_rl::envs::CartPole;
use pgrad_rl::{LinearSoftmaxPolicy, Trainer};

use crate::config::Config;

/// Offsets that keep the environment and weight-init streams apart from the session's
const ENV_SEED_OFFSET: u64 = 1;
const INIT_SEED_OFFSET: u64 = 2;

#[derive(Args, Debug, Default)]
pub struct TrainArgs {
    /// Number of parameter updates
    #[arg(long)]
    pub iterations: Option<usize>,

    /// Episodes collected per update
    #[arg(long)]
    pub episodes: Option<usize>,

    /// Step cap per episode
    #[arg(long)]
    pub max_steps: Option<usize>,

    /// Discount factor in (0, 1]
    #[arg(long)]
    pub discount: Option<f64>,

    /// Adam learning rate
    #[arg(long)]
    pub learning_rate: Option<f64>,

    /// Seed for the session, environment and weight initialization
    #[arg(long)]
    pub seed: Option<u64>,

    /// Write the training report as JSON
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Play one rendered episode after training
    #[arg(long)]
    pub play: bool,
}

impl TrainArgs {
    /// Command-line flags win over file and environment settings
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(iterations) = self.iterations {
            config.trainer.iterations = iterations;
        }
        if let Some(episodes) = self.episodes {
            config.trainer.episodes_per_update = episodes;
        }
        if let Some(max_steps) = self.max_steps {
            config.trainer.max_steps = max_steps;
        }
        if let Some(discount) = self.discount {
            config.trainer.discount = discount;
        }
        if let Some(learning_rate) = self.learning_rate {
            config.policy.learning_rate = learning_rate;
        }
        if let Some(seed) = self.seed {
            config.trainer.seed = Some(seed);
            config.cartpole.seed = Some(seed.wrapping_add(ENV_SEED_OFFSET));
        }
    }
}

/// RNG for weight initialization, derived from the session seed
fn init_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(INIT_SEED_OFFSET)),
        None => StdRng::from_entropy(),
    }
}

pub fn run(args: TrainArgs, mut config: Config) -> Result<()> {
    args.apply_to(&mut config);
    config.validate()?;

    let mut init_rng = init_rng(config.trainer.seed);
    let policy = LinearSoftmaxPolicy::new(
        CartPole::OBSERVATION_SIZE,
        CartPole::ACTION_COUNT,
        &config.policy,
        &mut init_rng,
    )?;
    let env = CartPole::new(config.cartpole.clone());

    let max_steps = config.trainer.max_steps;
    let mut trainer = Trainer::new(env, policy, config.trainer)?;
    let report = trainer.train().map_err(|err| {
        if matches!(err.downcast_ref::<PgError>(), Some(PgError::DegenerateBatch { .. })) {
            err.context(
                "every discounted reward in a batch was equal; set trainer.zero_variance \
                 to \"skip\" or \"center\" to continue past such batches",
            )
        } else {
            err
        }
    })?;

    if let Some(last) = report.last() {
        println!(
            "Run {}: {} iterations, final mean episode length {:.1}",
            report.run_id,
            report.iterations.len(),
            last.mean_episode_length
        );
    }

    if let Some(path) = &args.report {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        info!("Report written to {}", path.display());
    }

    if args.play {
        let steps = trainer.play(Some(max_steps))?;
        println!("{steps}");
    }

    let (_, _, summary) = trainer.finish();
    info!(
        evaluations = summary.evaluations,
        updates = summary.updates,
        "Session closed"
    );

    Ok(())
}
