//! Error types for the estimation engine.

use thiserror::Error;

/// Errors raised by the kriging engine.
///
/// `Configuration` is fatal and surfaces before any target is processed. The remaining kinds are
/// per-target failures: the driver records them in the target's result instead of aborting.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("insufficient neighborhood: found {found} samples, {required} required")]
    InsufficientNeighborhood { found: usize, required: usize },

    #[error("singular kriging system of size {size} (smallest pivot {pivot:e})")]
    SingularSystem { size: usize, pivot: f64 },

    #[error("estimation cancelled")]
    Cancelled,
}

impl Error {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Error::Configuration(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
