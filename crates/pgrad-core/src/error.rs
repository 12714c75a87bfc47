//! Error types for pgrad

use thiserror::Error;

/// Main error type for pgrad
#[derive(Error, Debug)]
pub enum PgError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Empty batch: {0}")]
    EmptyBatch(String),

    #[error("Degenerate batch: all discounted rewards equal {mean}, standard deviation is zero")]
    DegenerateBatch { mean: f64 },

    #[error("Advantage mismatch: {0}")]
    AdvantageMismatch(String),

    #[error("Gradient shape error: {0}")]
    GradientShape(String),
}

/// Result type alias for pgrad operations
pub type Result<T> = std::result::Result<T, PgError>;
