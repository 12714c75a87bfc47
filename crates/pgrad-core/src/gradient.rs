//! Per-parameter gradient container

use ndarray::ArrayD;

use crate::error::{PgError, Result};

/// One gradient tensor per trainable parameter, in parameter order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GradientSet {
    tensors: Vec<ArrayD<f64>>,
}

impl GradientSet {
    /// Create a gradient set from per-parameter tensors
    pub fn new(tensors: Vec<ArrayD<f64>>) -> Self {
        Self { tensors }
    }

    /// A gradient set of zeros with the same parameter shapes as `self`
    pub fn zeros_like(&self) -> Self {
        Self {
            tensors: self
                .tensors
                .iter()
                .map(|t| ArrayD::zeros(t.raw_dim()))
                .collect(),
        }
    }

    /// Number of parameter tensors
    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }

    /// Tensor for parameter `index`
    pub fn get(&self, index: usize) -> Option<&ArrayD<f64>> {
        self.tensors.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ArrayD<f64>> {
        self.tensors.iter()
    }

    /// Shapes of every parameter tensor
    pub fn shapes(&self) -> Vec<Vec<usize>> {
        self.tensors.iter().map(|t| t.shape().to_vec()).collect()
    }

    /// Fails unless `other` has the same parameter count and tensor shapes
    pub fn check_compatible(&self, other: &GradientSet) -> Result<()> {
        if self.tensors.len() != other.tensors.len() {
            return Err(PgError::GradientShape(format!(
                "expected {} parameter tensors, got {}",
                self.tensors.len(),
                other.tensors.len()
            )));
        }

        for (index, (ours, theirs)) in self.tensors.iter().zip(&other.tensors).enumerate() {
            if ours.shape() != theirs.shape() {
                return Err(PgError::GradientShape(format!(
                    "parameter {index}: expected shape {:?}, got {:?}",
                    ours.shape(),
                    theirs.shape()
                )));
            }
        }

        Ok(())
    }

    /// `self += alpha * other`, parameter by parameter
    pub fn scaled_add(&mut self, alpha: f64, other: &GradientSet) -> Result<()> {
        self.check_compatible(other)?;
        for (ours, theirs) in self.tensors.iter_mut().zip(&other.tensors) {
            ours.scaled_add(alpha, theirs);
        }
        Ok(())
    }

    /// Divide every element by `divisor`
    pub fn divide(&mut self, divisor: f64) {
        for tensor in &mut self.tensors {
            tensor.mapv_inplace(|v| v / divisor);
        }
    }
}
