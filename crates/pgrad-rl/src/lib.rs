//! pgrad RL - Episodic policy-gradient training
//!
//! This crate collects batches of episodes under a policy, turns their
//! rewards into discounted, batch-normalized advantages, and averages the
//! advantage-weighted per-step gradients into one parameter update.
//!
//! Policies and environments are reached only through the [`Policy`] and
//! [`Environment`] traits. A linear softmax policy and a cart-pole
//! environment are included as reference implementations.

// Clippy pedantic allows - these are intentional design choices
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::float_cmp)]
#![allow(clippy::ptr_arg)]

pub mod aggregate;
pub mod config;
pub mod env;
pub mod envs;
pub mod episode;
pub mod linear;
pub mod optim;
pub mod policy;
pub mod runner;
pub mod session;
pub mod shaping;
pub mod trainer;

pub use aggregate::{aggregate_gradients, GradientAccumulator};
pub use config::{PolicyConfig, TrainerConfig};
pub use env::{Environment, Render, Transition};
pub use episode::{Batch, Episode, Step};
pub use linear::LinearSoftmaxPolicy;
pub use policy::Policy;
pub use runner::{play, run_episode};
pub use session::{Session, SessionSummary};
pub use shaping::{discount_and_normalize, discount_rewards, RewardShaper, ZeroVariancePolicy};
pub use trainer::{IterationStats, Phase, Trainer, TrainingReport};
