//! Reference environments

pub mod cartpole;

pub use cartpole::{CartPole, CartPoleConfig};
