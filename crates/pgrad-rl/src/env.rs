//! Environment capability

use anyhow::Result;

use pgrad_core::Reward;

/// Outcome of a single environment step
#[derive(Debug, Clone)]
pub struct Transition<O> {
    pub observation: O,
    pub reward: Reward,
    pub done: bool,
    /// Free-form diagnostics from the environment
    pub info: serde_json::Value,
}

impl<O> Transition<O> {
    pub fn new(observation: O, reward: Reward, done: bool) -> Self {
        Self {
            observation,
            reward,
            done,
            info: serde_json::Value::Null,
        }
    }

    pub fn with_info(mut self, info: serde_json::Value) -> Self {
        self.info = info;
        self
    }
}

/// Trait for simulated environments
pub trait Environment {
    type Observation;
    type Action;

    /// Start a new episode and return the first observation
    fn reset(&mut self) -> Result<Self::Observation>;

    /// Advance by one action
    fn step(&mut self, action: &Self::Action) -> Result<Transition<Self::Observation>>;
}

/// Visual playback, used only for inspection
pub trait Render {
    fn render(&mut self) -> Result<()>;
}
