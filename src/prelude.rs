//! Exports the boosting algorithm, the datasets, and the dataset trait.
//!
pub use crate::booster::{
    AdaBoost,
    RoundReport,
};


pub use crate::weak_learner::{
    WeakTree,
    Node,
    Branch,
};


pub use crate::dataset::{
    // Dataset trait
    DataSet,

    // Sources
    DenseDataSet,
    FileDataSet,

    // Views
    SampleSubSet,
    FeatureSubSet,
    Relabel,

    // Caching
    DataSetCache,
    CachePlan,
};


pub use crate::error::BoostError;
