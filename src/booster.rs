//! Provides the boosting algorithm.

mod core;
mod adaboost;


/// Booster trait
pub(crate) use self::core::Booster;

pub use self::adaboost::{AdaBoost, RoundReport};
