//! Linear softmax policy with closed-form cross-entropy gradients

use anyhow::{anyhow, Context, Result};
use ndarray::{Array1, Array2, ArrayD, ArrayView1, ArrayView2, Axis, Ix1, Ix2};
use rand::distributions::{Distribution, Uniform, WeightedIndex};
use rand::Rng;

use pgrad_core::GradientSet;

use crate::config::PolicyConfig;
use crate::optim::Adam;
use crate::policy::Policy;
use crate::session::Session;

/// `logits = W x + b`, actions sampled from `softmax(logits)`.
///
/// Parameters are kept as `[W (n_actions x n_inputs), b (n_actions)]`,
/// which is also the order of every gradient set it produces.
pub struct LinearSoftmaxPolicy {
    params: Vec<ArrayD<f64>>,
    optimizer: Adam,
    n_inputs: usize,
    n_actions: usize,
}

impl LinearSoftmaxPolicy {
    /// Uniform weights in `±init_scale`, zero biases
    pub fn new<R: Rng + ?Sized>(
        n_inputs: usize,
        n_actions: usize,
        config: &PolicyConfig,
        rng: &mut R,
    ) -> Result<Self> {
        let scale = config.init_scale;
        let weights = if scale > 0.0 {
            let dist = Uniform::new_inclusive(-scale, scale);
            Array2::from_shape_fn((n_actions, n_inputs), |_| dist.sample(rng))
        } else {
            Array2::zeros((n_actions, n_inputs))
        };
        Self::from_parameters(weights, Array1::zeros(n_actions), config)
    }

    /// Build from explicit weights and biases
    pub fn from_parameters(
        weights: Array2<f64>,
        bias: Array1<f64>,
        config: &PolicyConfig,
    ) -> Result<Self> {
        config.validate()?;
        let (n_actions, n_inputs) = weights.dim();
        if n_actions < 2 {
            return Err(anyhow!("policy needs at least 2 actions, got {n_actions}"));
        }
        if bias.len() != n_actions {
            return Err(anyhow!(
                "bias has {} entries for {n_actions} actions",
                bias.len()
            ));
        }

        let params = vec![weights.into_dyn(), bias.into_dyn()];
        let optimizer = Adam::new(&params, config);
        Ok(Self {
            params,
            optimizer,
            n_inputs,
            n_actions,
        })
    }

    pub fn n_inputs(&self) -> usize {
        self.n_inputs
    }

    pub fn n_actions(&self) -> usize {
        self.n_actions
    }

    /// Current parameters, `[W, b]`
    pub fn parameters(&self) -> &[ArrayD<f64>] {
        &self.params
    }

    fn weights(&self) -> Result<ArrayView2<'_, f64>> {
        Ok(self.params[0].view().into_dimensionality::<Ix2>()?)
    }

    fn bias(&self) -> Result<ArrayView1<'_, f64>> {
        Ok(self.params[1].view().into_dimensionality::<Ix1>()?)
    }

    /// Unnormalized action scores
    pub fn logits(&self, observation: ArrayView1<'_, f64>) -> Result<Array1<f64>> {
        if observation.len() != self.n_inputs {
            return Err(anyhow!(
                "observation has {} features, policy expects {}",
                observation.len(),
                self.n_inputs
            ));
        }
        Ok(self.weights()?.dot(&observation) + self.bias()?)
    }

    /// Action probabilities
    pub fn probabilities(&self, observation: ArrayView1<'_, f64>) -> Result<Array1<f64>> {
        Ok(softmax(&self.logits(observation)?))
    }
}

/// Numerically stable softmax
pub fn softmax(logits: &Array1<f64>) -> Array1<f64> {
    let max = logits.fold(f64::NEG_INFINITY, |acc, &x| acc.max(x));
    let exp = logits.mapv(|x| (x - max).exp());
    let total = exp.sum();
    exp / total
}

impl Policy<Vec<f64>, usize> for LinearSoftmaxPolicy {
    fn act(&mut self, session: &mut Session, observation: &Vec<f64>) -> Result<(usize, GradientSet)> {
        let x = ArrayView1::from(observation.as_slice());
        let probs = self.probabilities(x)?;

        let dist = WeightedIndex::new(probs.iter().copied())
            .with_context(|| format!("invalid action probabilities {probs}"))?;
        let action = dist.sample(session.rng());

        // d/dlogits of cross_entropy(one_hot(action), logits) = probs - one_hot
        let mut dlogits = probs;
        dlogits[action] -= 1.0;

        let dweights = dlogits
            .view()
            .insert_axis(Axis(1))
            .dot(&x.insert_axis(Axis(0)));

        Ok((
            action,
            GradientSet::new(vec![dweights.into_dyn(), dlogits.into_dyn()]),
        ))
    }

    fn apply(&mut self, _session: &mut Session, gradients: &GradientSet) -> Result<()> {
        self.optimizer.step(&mut self.params, gradients)?;
        Ok(())
    }
}
