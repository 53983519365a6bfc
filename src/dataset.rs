//! Feature datasets.
//!
//! A dataset is a rectangular matrix of scalar features
//! (`n_samples x n_features`) whose columns are partitioned
//! into contiguous ranges, one per heuristic (feature extractor).
//! Views ([`SampleSubSet`], [`FeatureSubSet`], [`Relabel`]) wrap any
//! [`DataSet`] and compose freely;
//! [`DataSetCache`] materializes a (view of a) dataset in memory.

mod dataset_trait;
mod dense;
mod subset;
mod relabel;
mod cache;
mod file;


pub use dataset_trait::DataSet;
pub use dense::DenseDataSet;
pub use subset::{SampleSubSet, FeatureSubSet};
pub use relabel::Relabel;
pub use cache::{DataSetCache, CachePlan};
pub use file::{FileDataSet, write_file_dataset};
