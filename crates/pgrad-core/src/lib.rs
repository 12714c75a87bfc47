//! pgrad Core - Shared types for the policy-gradient trainer
//!
//! This crate provides the error type, the gradient-set container and the
//! identifiers used across all pgrad components.

// Clippy pedantic allows - these are intentional design choices
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod gradient;
pub mod types;

pub use error::{PgError, Result};
pub use gradient::GradientSet;
pub use types::*;
