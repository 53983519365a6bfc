//! Budgets, tolerances, and default parameters.

/// Memory budget of the feature cache, in scalar (`f32`) elements.
pub const MAX_CACHE_SIZE: usize = (1 << 30) / std::mem::size_of::<f32>();

/// Default number of boosting rounds.
pub const DEFAULT_NB_ROUNDS:                 usize = 100;
/// Default number of features sampled per heuristic and round.
pub const DEFAULT_NB_FEATURES_PER_HEURISTIC: usize = 10;
/// `0` means `ceil(log2(#labels))`.
pub const DEFAULT_MAX_DEPTH:                 usize = 0;
/// Default seed of the feature sampler.
pub const DEFAULT_SEED:                        u64 = 0x5eed_b005;
/// Default interval of the console progress table.
pub const DEFAULT_PRINT_EVERY:               usize = 1;

/// A round whose edge is below this value is discarded.
pub const EDGE_TOLERANCE:     f64 = 1e-6;
/// Weight given to a (nearly) perfect weak learner.
pub const SATURATED_ALPHA:    f64 = 10.0;
/// Bracket searched for the weight of a weak learner.
pub const ALPHA_LOWER_BOUND:  f64 = 0.0;
/// See [`ALPHA_LOWER_BOUND`].
pub const ALPHA_UPPER_BOUND:  f64 = 10.0;

/// Relative tolerance of the line search.
pub const LINE_SEARCH_TOLERANCE: f64 = 1e-6;
/// Iteration cap of the line search.
pub const LINE_SEARCH_MAX_ITER:  usize = 200;

/// Version tag of the binary dataset file format.
pub const FILE_DATASET_VERSION: u32 = 0x0001_0002;
/// Size of the header of a dataset file.
pub const FILE_DATASET_HEADER_BYTES: u64 = 20;

/// Name tag of a saved `AdaBoost` model.
pub const ADABOOST_NAME:  &str = "AdaBoost";
/// Name tag of a saved `WeakTree`.
pub const WEAK_TREE_NAME: &str = "WeakTree";
