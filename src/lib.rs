#![warn(missing_docs)]

//!
//! A crate that trains multiclass AdaBoost ensembles of shallow
//! decision trees over large heuristic feature datasets.
//!
//! The features of a dataset are produced by heuristics
//! (feature extractors); each heuristic owns a contiguous range
//! of the flattened feature indices.
//! Training proceeds in rounds:
//!
//! - a few features of each heuristic are sampled,
//!     and their values are cached within a fixed memory budget
//!     (see [`CachePlan`](dataset::CachePlan)),
//! - a [`WeakTree`] is trained on the current cost matrix,
//! - its weight is found by a golden-section line search
//!     on the multiclass exponential loss.
//!
//! A trained model only keeps the features it uses,
//! can be saved to and loaded from a JSON document,
//! and can be adapted when new heuristics become available.
//!
//! ```no_run
//! use boostfarm::prelude::*;
//!
//! let data = FileDataSet::open("/path/to/dataset.bin").unwrap();
//! let mut booster = AdaBoost::new()
//!     .nb_rounds(100)
//!     .nb_features_per_heuristic(10);
//! booster.train(&data).unwrap();
//! let predictions = booster.predict_all(&data).unwrap();
//! ```

pub mod error;
pub mod constants;
pub mod dataset;
pub mod common;
pub mod weak_learner;
pub mod booster;
pub mod document;
pub mod logging;

pub mod prelude;


pub use error::{BoostError, Result};

pub use booster::{AdaBoost, RoundReport};

pub use dataset::{
    DataSet,
    DenseDataSet,
    SampleSubSet,
    FeatureSubSet,
    Relabel,
    DataSetCache,
    CachePlan,
    FileDataSet,
};

pub use weak_learner::WeakTree;
pub use logging::RoundLogger;
