//! Adam optimizer over per-parameter tensors

use ndarray::{ArrayD, Zip};

use pgrad_core::{GradientSet, PgError, Result};

use crate::config::PolicyConfig;

pub struct Adam {
    lr: f64,
    beta1: f64,
    beta2: f64,
    eps: f64,
    t: i32,
    m: Vec<ArrayD<f64>>,
    v: Vec<ArrayD<f64>>,
}

impl Adam {
    pub fn new(params: &[ArrayD<f64>], config: &PolicyConfig) -> Self {
        Self {
            lr: config.learning_rate,
            beta1: config.beta1,
            beta2: config.beta2,
            eps: config.epsilon,
            t: 0,
            m: params.iter().map(|p| ArrayD::zeros(p.raw_dim())).collect(),
            v: params.iter().map(|p| ArrayD::zeros(p.raw_dim())).collect(),
        }
    }

    /// Number of steps taken
    pub fn steps(&self) -> i32 {
        self.t
    }

    /// Descend along `grads`
    pub fn step(&mut self, params: &mut [ArrayD<f64>], grads: &GradientSet) -> Result<()> {
        if params.len() != grads.len() || params.len() != self.m.len() {
            return Err(PgError::GradientShape(format!(
                "optimizer tracks {} parameters, got {} parameters and {} gradients",
                self.m.len(),
                params.len(),
                grads.len()
            )));
        }
        for (index, (p, g)) in params.iter().zip(grads.iter()).enumerate() {
            if p.shape() != g.shape() || p.shape() != self.m[index].shape() {
                return Err(PgError::GradientShape(format!(
                    "parameter {index}: shape {:?}, gradient shape {:?}",
                    p.shape(),
                    g.shape()
                )));
            }
        }

        self.t += 1;
        let (beta1, beta2, eps) = (self.beta1, self.beta2, self.eps);
        let lr_t = self.lr * (1.0 - beta2.powi(self.t)).sqrt() / (1.0 - beta1.powi(self.t));

        for ((p, g), (m, v)) in params
            .iter_mut()
            .zip(grads.iter())
            .zip(self.m.iter_mut().zip(self.v.iter_mut()))
        {
            Zip::from(p)
                .and(g)
                .and(m)
                .and(v)
                .for_each(|p, &g, m, v| {
                    *m = beta1 * *m + (1.0 - beta1) * g;
                    *v = beta2 * *v + (1.0 - beta2) * g * g;
                    *p -= lr_t * *m / (v.sqrt() + eps);
                });
        }
        Ok(())
    }
}
