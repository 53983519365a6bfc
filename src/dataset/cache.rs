use crate::{BoostError, Result};
use super::dataset_trait::{DataSet, check_request};

use std::fmt;


/// A dataset materialized in one contiguous buffer,
/// so that repeated reads avoid recomputing the features.
///
/// The cache copies the labels and heuristics of its source
/// and does not borrow it afterwards.
#[derive(Debug, Clone)]
pub struct DataSetCache {
    values: Vec<f32>,
    labels: Vec<usize>,
    heuristics: Vec<usize>,
    n_labels: usize,
    n_heuristics: usize,
    by_column: bool,
}


impl DataSetCache {
    /// Computes every feature of every sample of `dataset`.
    /// If `by_column` is `true` the values of one feature are stored
    /// contiguously, which is the layout the weak learners read.
    pub fn new<D>(dataset: &D, by_column: bool) -> Result<Self>
        where D: DataSet + ?Sized,
    {
        let n_sample = dataset.n_samples();
        let n_feature = dataset.n_features();
        let size = n_sample.checked_mul(n_feature)
            .ok_or(BoostError::Capacity {
                required: usize::MAX,
                available: usize::MAX,
            })?;

        let mut values = Vec::new();
        values.try_reserve_exact(size)
            .map_err(|_| BoostError::Capacity {
                required: size,
                available: values.capacity(),
            })?;
        values.resize(size, 0f32);

        let samples = (0..n_sample).collect::<Vec<_>>();
        let features = (0..n_feature).collect::<Vec<_>>();
        dataset.compute_features(&samples, &features, &mut values, by_column)?;

        let labels = samples.iter()
            .map(|&s| dataset.label(s))
            .collect::<Vec<_>>();
        let heuristics = features.iter()
            .map(|&f| dataset.heuristic(f))
            .collect::<Vec<_>>();

        Ok(Self {
            values,
            labels,
            heuristics,
            n_labels: dataset.n_labels(),
            n_heuristics: dataset.n_heuristics(),
            by_column,
        })
    }


    /// Returns the number of cached scalar values.
    pub fn len(&self) -> usize {
        self.values.len()
    }


    /// Returns `true` if the cache holds no value.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }


    #[inline]
    fn offset(&self, sample: usize, feature: usize) -> usize {
        if self.by_column {
            feature * self.labels.len() + sample
        } else {
            sample * self.heuristics.len() + feature
        }
    }
}


impl DataSet for DataSetCache {
    fn n_samples(&self) -> usize {
        self.labels.len()
    }


    fn n_features(&self) -> usize {
        self.heuristics.len()
    }


    fn n_labels(&self) -> usize {
        self.n_labels
    }


    fn n_heuristics(&self) -> usize {
        self.n_heuristics
    }


    fn label(&self, sample: usize) -> usize {
        self.labels[sample]
    }


    fn heuristic(&self, feature: usize) -> usize {
        self.heuristics[feature]
    }


    fn compute_features(
        &self,
        samples: &[usize],
        features: &[usize],
        values: &mut [f32],
        by_column: bool,
    ) -> Result<()>
    {
        check_request(samples, features, values)?;

        let n_sample = samples.len();
        let n_feature = features.len();
        if by_column {
            for (j, &f) in features.iter().enumerate() {
                let out = &mut values[j * n_sample..(j + 1) * n_sample];
                for (v, &s) in out.iter_mut().zip(samples) {
                    *v = self.values[self.offset(s, f)];
                }
            }
        } else {
            for (i, &s) in samples.iter().enumerate() {
                let out = &mut values[i * n_feature..(i + 1) * n_feature];
                for (v, &f) in out.iter_mut().zip(features) {
                    *v = self.values[self.offset(s, f)];
                }
            }
        }
        Ok(())
    }


    #[inline]
    fn feature_value(&self, sample: usize, feature: usize) -> Result<f32> {
        Ok(self.values[self.offset(sample, feature)])
    }
}


/// How the boosting trainer caches feature values.
///
/// The plan is decided once per training call
/// from the shape of the dataset and the cache budget,
/// before any feature is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePlan {
    /// No per-round sampling:
    /// the whole dataset is cached and every round sees every feature.
    Full,

    /// Per-round sampling, but the whole dataset fits in the budget
    /// and would be touched within the round budget anyway:
    /// it is cached once and each round reads a slice of it.
    Sliced {
        /// Number of features each round trains on.
        n_features_per_round: usize,
    },

    /// Per-round sampling with a sliding window:
    /// the freshly sampled features of `n_cached_rounds` rounds are
    /// cached at a time and refilled when exhausted.
    Window {
        /// Number of features each round trains on.
        n_features_per_round: usize,
        /// Number of rounds whose features fit in the cache.
        n_cached_rounds: usize,
    },
}


impl CachePlan {
    /// Decides the caching strategy.
    ///
    /// - `heuristic_sizes[h]` is the number of features of heuristic `h`,
    /// - `n_features_per_heuristic` is the per-round sample size
    ///   (`0` disables sampling),
    /// - `budget` is the cache size in scalar elements.
    ///
    /// Fails with [`BoostError::Capacity`] when not even one round fits.
    pub fn new(
        n_samples: usize,
        heuristic_sizes: &[usize],
        n_features_per_heuristic: usize,
        n_rounds: usize,
        budget: usize,
    ) -> Result<Self>
    {
        let n_features = heuristic_sizes.iter().sum::<usize>();
        let whole = n_samples.checked_mul(n_features);

        if n_features_per_heuristic == 0 {
            return match whole {
                Some(required) if required <= budget => Ok(Self::Full),
                required => Err(BoostError::Capacity {
                    required: required.unwrap_or(usize::MAX),
                    available: budget,
                }),
            };
        }

        let n_features_per_round = heuristic_sizes.iter()
            .map(|&size| size.min(n_features_per_heuristic))
            .sum::<usize>();
        if n_features_per_round == 0 {
            return Err(BoostError::invalid("there is no feature to sample"));
        }

        let per_round = n_samples.checked_mul(n_features_per_round)
            .filter(|&required| required <= budget)
            .ok_or(BoostError::Capacity {
                required: n_samples.saturating_mul(n_features_per_round),
                available: budget,
            })?;

        let fits = whole.is_some_and(|size| size <= budget);
        let touched = n_features_per_round.saturating_mul(n_rounds);
        if fits && n_features <= touched {
            Ok(Self::Sliced { n_features_per_round })
        } else {
            let n_cached_rounds = (budget / per_round).min(n_rounds);
            Ok(Self::Window { n_features_per_round, n_cached_rounds })
        }
    }


    /// Returns the number of features a round trains on,
    /// or `None` if every round sees every feature.
    pub fn n_features_per_round(&self) -> Option<usize> {
        match self {
            Self::Full => None,
            Self::Sliced { n_features_per_round }
            | Self::Window { n_features_per_round, .. }
                => Some(*n_features_per_round),
        }
    }
}


impl fmt::Display for CachePlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full => write!(f, "whole dataset"),
            Self::Sliced { n_features_per_round } => write!(
                f, "whole dataset, {n_features_per_round} features/round"
            ),
            Self::Window { n_features_per_round, n_cached_rounds } => write!(
                f,
                "{n_features_per_round} features/round, \
                {n_cached_rounds} rounds/cache"
            ),
        }
    }
}
