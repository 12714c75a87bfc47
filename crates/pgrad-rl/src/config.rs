//! Trainer and reference-policy settings

use serde::{Deserialize, Serialize};

use pgrad_core::{PgError, Result};

use crate::shaping::{validate_discount, ZeroVariancePolicy};

/// Settings for the training loop
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    /// Number of batches (parameter updates)
    pub iterations: usize,
    /// Episodes collected per update
    pub episodes_per_update: usize,
    /// Step cap per episode
    pub max_steps: usize,
    /// Discount factor, in (0, 1]
    pub discount: f64,
    /// Behaviour when a batch has zero reward variance
    pub zero_variance: ZeroVariancePolicy,
    /// Seed for the session RNG; entropy when unset
    pub seed: Option<u64>,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            iterations: 250,
            episodes_per_update: 10,
            max_steps: 1000,
            discount: 0.95,
            zero_variance: ZeroVariancePolicy::Fail,
            seed: None,
        }
    }
}

impl TrainerConfig {
    /// Reject settings the trainer cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.iterations == 0 {
            return Err(PgError::Config("iterations must be at least 1".to_string()));
        }
        if self.episodes_per_update == 0 {
            return Err(PgError::Config(
                "episodes_per_update must be at least 1".to_string(),
            ));
        }
        if self.max_steps == 0 {
            return Err(PgError::Config("max_steps must be at least 1".to_string()));
        }
        validate_discount(self.discount)
    }
}

/// Settings for the linear softmax policy and its Adam optimizer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    pub learning_rate: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub epsilon: f64,
    /// Half-width of the uniform weight initialization
    pub init_scale: f64,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.01,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
            init_scale: 0.1,
        }
    }
}

impl PolicyConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(PgError::Config(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if !(0.0..1.0).contains(&self.beta1) || !(0.0..1.0).contains(&self.beta2) {
            return Err(PgError::Config("beta1 and beta2 must be in [0, 1)".to_string()));
        }
        if !(self.epsilon > 0.0 && self.epsilon.is_finite()) {
            return Err(PgError::Config(format!(
                "epsilon must be positive and finite, got {}",
                self.epsilon
            )));
        }
        if !(self.init_scale >= 0.0 && self.init_scale.is_finite()) {
            return Err(PgError::Config(format!(
                "init_scale must be finite and not negative, got {}",
                self.init_scale
            )));
        }
        Ok(())
    }
}
