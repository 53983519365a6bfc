//! Defines the error type shared by every fallible operation of this crate.
use polars::prelude::PolarsError;

use std::io;


/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, BoostError>;


/// The errors that training, classification, and (de)serialization
/// can raise.
///
/// The variants form a closed taxonomy:
/// caller misuse ([`BoostError::InvalidArgument`], [`BoostError::Logic`])
/// is never recoverable by retrying,
/// while [`BoostError::Capacity`] can be fixed by the caller
/// by enlarging the cache budget or sampling fewer features per round.
#[derive(Debug, thiserror::Error)]
pub enum BoostError {
    /// A precondition on the arguments does not hold.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The feature cache cannot hold what a boosting round requires.
    #[error(
        "the cache is too small to accommodate even one boosting round \
        ({required} elements required, {available} available)"
    )]
    Capacity {
        /// Number of scalar elements required.
        required: usize,
        /// Number of scalar elements the budget allows.
        available: usize,
    },

    /// The object was used in a state that does not allow the operation.
    #[error("logic error: {0}")]
    Logic(String),

    /// A serialized document or dataset file has an unexpected layout.
    #[error("format error: {0}")]
    Format(String),

    /// The data source failed to produce feature values.
    #[error("feature computation failed: {0}")]
    FeatureComputation(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Polars error.
    #[error("polars error: {0}")]
    Polars(#[from] PolarsError),
}


impl BoostError {
    /// Returns `true` if this error signals an exhausted cache budget.
    pub fn is_capacity(&self) -> bool {
        matches!(self, Self::Capacity { .. })
    }


    /// Returns `true` if this error signals a misuse by the caller.
    pub fn is_misuse(&self) -> bool {
        matches!(self, Self::InvalidArgument(_) | Self::Logic(_))
    }


    pub(crate) fn invalid<S: Into<String>>(message: S) -> Self {
        Self::InvalidArgument(message.into())
    }


    pub(crate) fn logic<S: Into<String>>(message: S) -> Self {
        Self::Logic(message.into())
    }


    pub(crate) fn format<S: Into<String>>(message: S) -> Self {
        Self::Format(message.into())
    }
}
