//! Policy capability

use anyhow::Result;

use pgrad_core::GradientSet;

use crate::session::Session;

/// Trait for trainable policies.
///
/// `act` samples an action for an observation and returns the gradient of
/// the negative log-likelihood of that action with respect to every
/// trainable parameter. `apply` hands an aggregated gradient set to the
/// policy's optimizer.
pub trait Policy<O, A> {
    fn act(&mut self, session: &mut Session, observation: &O) -> Result<(A, GradientSet)>;

    fn apply(&mut self, session: &mut Session, gradients: &GradientSet) -> Result<()>;
}
