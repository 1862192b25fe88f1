//! Error types shared by both solvers.

use thiserror::Error;

/// Errors raised while configuring or stepping a simulation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimulationError {
    /// Invalid grid, time or physical parameters. Raised before any step runs.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// A logarithm or power was about to be evaluated outside its domain.
    #[error("Numeric domain error at node {node}: {detail}")]
    NumericDomain { node: usize, detail: String },

    /// A step produced NaN or Inf, usually from violating the stability bound.
    #[error("Numeric instability at step {step}, cell {cell:?}: value {value}")]
    NumericInstability {
        step: usize,
        cell: (usize, usize),
        value: f64,
    },
}

impl SimulationError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn numeric_domain(node: usize, detail: impl Into<String>) -> Self {
        Self::NumericDomain {
            node,
            detail: detail.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SimulationError>;
