//! Defines `AdaBoost`, the multiclass boosting algorithm
//! of "A Theory of Multiclass Boosting" by Mukherjee and Schapire,
//! with decision trees as weak learners.
use fixedbitset::FixedBitSet;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::{BoostError, Result};
use crate::booster::Booster;
use crate::constants::*;
use crate::dataset::{DataSet, DataSetCache, FeatureSubSet, SampleSubSet};
use crate::document::{self, AdaBoostDocument, WeakTreeDocument};
use crate::weak_learner::WeakTree;

use std::fmt;
use std::io::{Read, Write};
use std::ops::ControlFlow;
use std::path::PathBuf;

mod adaboost_algorithm;
mod loss;
mod sampler;

use adaboost_algorithm::{AdaBoostTrainer, argmax};
pub use adaboost_algorithm::RoundReport;


/// Training parameters.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Settings {
    pub(crate) nb_rounds: usize,
    pub(crate) nb_features_per_heuristic: usize,
    pub(crate) max_depth: usize,
    pub(crate) cache_size: usize,
    pub(crate) print_every: usize,
    pub(crate) log_path: Option<PathBuf>,
}


impl Default for Settings {
    fn default() -> Self {
        Self {
            nb_rounds: DEFAULT_NB_ROUNDS,
            nb_features_per_heuristic: DEFAULT_NB_FEATURES_PER_HEURISTIC,
            max_depth: DEFAULT_MAX_DEPTH,
            cache_size: MAX_CACHE_SIZE,
            print_every: DEFAULT_PRINT_EVERY,
            log_path: None,
        }
    }
}


/// The trained state of an [`AdaBoost`] model.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Ensemble {
    pub(crate) weak_learners: Vec<WeakTree>,
    pub(crate) alphas: Vec<f64>,
    // Sorted dataset features used by the weak learners,
    // whose nodes index into this list.
    pub(crate) reported: Vec<usize>,
    pub(crate) hypotheses: Vec<Vec<f64>>,
    pub(crate) heuristics: Vec<usize>,
    pub(crate) loss: f64,
    pub(crate) train_error: f64,
}


/// Defines `AdaBoost`.
///
/// Each round trains a [`WeakTree`] on the current cost matrix,
/// over a random subset of the features of each heuristic,
/// and weights it by the minimizer of the multiclass exponential loss.
/// The feature values are cached within a memory budget;
/// see [`CachePlan`](crate::dataset::CachePlan).
///
/// A model is built by [`AdaBoost::new`] and configured by
/// builder-style setters.
/// It is only modified when a training call succeeds.
///
/// # Example
/// ```no_run
/// use boostfarm::prelude::*;
///
/// let data = FileDataSet::open("/path/to/dataset.bin").unwrap();
///
/// let mut booster = AdaBoost::new()
///     .nb_rounds(200)
///     .nb_features_per_heuristic(50)
///     .seed(1234);
/// booster.train(&data).unwrap();
///
/// let label = booster.classify(&data, 0).unwrap();
/// println!("{label}");
///
/// // Save the model.
/// let file = std::fs::File::create("/path/to/model.json").unwrap();
/// booster.to_writer(file).unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct AdaBoost {
    settings: Settings,
    seed: u64,
    rng: StdRng,
    ensemble: Ensemble,
}


impl Default for AdaBoost {
    fn default() -> Self {
        Self::new()
    }
}


impl AdaBoost {
    /// Returns an untrained model with the default parameters.
    pub fn new() -> Self {
        Self {
            settings: Settings::default(),
            seed: DEFAULT_SEED,
            rng: StdRng::seed_from_u64(DEFAULT_SEED),
            ensemble: Ensemble::default(),
        }
    }


    /// Set the number of boosting rounds.
    /// Default is `100`.
    pub fn nb_rounds(mut self, nb_rounds: usize) -> Self {
        self.settings.nb_rounds = nb_rounds;
        self
    }


    /// Set the number of features sampled per heuristic in each round.
    /// `0` disables the sampling: every round sees every feature.
    /// Default is `10`.
    pub fn nb_features_per_heuristic(mut self, k: usize) -> Self {
        self.settings.nb_features_per_heuristic = k;
        self
    }


    /// Set the maximal depth of the weak learners.
    /// `0` means `ceil(log2(#labels))`.
    /// Default is `0`.
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.settings.max_depth = max_depth;
        self
    }


    /// Set the budget of the feature cache, in scalar elements.
    /// Default is `2^30 / 4`.
    pub fn cache_size(mut self, elements: usize) -> Self {
        self.settings.cache_size = elements;
        self
    }


    /// Reseeds the random generator used to sample the features.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self.rng = StdRng::seed_from_u64(seed);
        self
    }


    /// Set the interval (in rounds) of the console progress table.
    /// `usize::MAX` silences the console.
    /// Default is `1`.
    pub fn print_every(mut self, rounds: usize) -> Self {
        self.settings.print_every = rounds;
        self
    }


    /// Also write the rounds to the CSV file at `path`.
    pub fn log_to<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.settings.log_path = Some(path.into());
        self
    }


    /// Returns the name of the algorithm.
    pub fn name(&self) -> &str {
        ADABOOST_NAME
    }


    /// Returns the parameters of the model.
    pub fn info(&self) -> Option<Vec<(&str, String)>> {
        let info = Vec::from([
            ("# of rounds", format!("{}", self.settings.nb_rounds)),
            (
                "Features/heuristic",
                format!("{}", self.settings.nb_features_per_heuristic)
            ),
            ("Max. depth", format!("{}", self.settings.max_depth)),
            ("Cache size", format!("{}", self.settings.cache_size)),
            ("Seed", format!("{}", self.seed)),
        ]);
        Some(info)
    }


    /// Trains the model on `dataset`.
    ///
    /// If the model was already trained on the same samples,
    /// the new rounds are appended to the existing ones.
    pub fn train<D>(&mut self, dataset: &D) -> Result<()>
        where D: DataSet + ?Sized,
    {
        self.train_with(dataset, |_| ControlFlow::Continue(()))
    }


    /// Trains the model on `dataset`, calling `callback`
    /// after every committed round.
    /// Returning `ControlFlow::Break(())` stops the training
    /// after that round.
    pub fn train_with<D, C>(&mut self, dataset: &D, callback: C) -> Result<()>
        where D: DataSet + ?Sized,
              C: FnMut(&RoundReport) -> ControlFlow<()>,
    {
        let start = self.ensemble.clone();
        self.ensemble = self.fit_from(dataset, start, callback)?;
        Ok(())
    }


    /// Continues the training on the heuristics of `dataset`
    /// the model has not used yet, plus the `additional` ones.
    ///
    /// The features of the heuristics used so far must keep
    /// their indices in `dataset`.
    /// Fails with [`BoostError::InvalidArgument`] if there is no
    /// new heuristic to train on.
    pub fn adapt<D>(&mut self, dataset: &D, additional: &[usize]) -> Result<()>
        where D: DataSet + ?Sized,
    {
        self.adapt_with(dataset, additional, |_| ControlFlow::Continue(()))
    }


    /// [`AdaBoost::adapt`] with a per-round callback,
    /// see [`AdaBoost::train_with`].
    pub fn adapt_with<D, C>(
        &mut self,
        dataset: &D,
        additional: &[usize],
        callback: C,
    ) -> Result<()>
        where D: DataSet + ?Sized,
              C: FnMut(&RoundReport) -> ControlFlow<()>,
    {
        let n_feature = dataset.n_features();
        let n_heuristic = dataset.n_heuristics();

        let mut consumed = FixedBitSet::with_capacity(n_heuristic);
        let heuristics = self.ensemble.heuristics.iter().copied()
            .chain(
                self.ensemble.reported.iter()
                    .filter(|&&f| f < n_feature)
                    .map(|&f| dataset.heuristic(f))
            );
        for h in heuristics.filter(|&h| h < n_heuristic) {
            consumed.insert(h);
        }

        let mut fresh = FixedBitSet::with_capacity(n_heuristic);
        for h in (0..n_heuristic).filter(|&h| !consumed.contains(h)) {
            fresh.insert(h);
        }
        for &h in additional {
            if h >= n_heuristic {
                return Err(BoostError::invalid(format!(
                    "heuristic {h} is out of range ({n_heuristic} heuristics)"
                )));
            }
            fresh.insert(h);
        }

        let features = (0..n_feature)
            .filter(|&f| fresh.contains(dataset.heuristic(f)))
            .collect::<Vec<_>>();
        if features.is_empty() {
            return Err(BoostError::invalid("no new heuristic to train on"));
        }

        let subset = FeatureSubSet::new(dataset, features)?;
        let staging = Ensemble {
            hypotheses: self.ensemble.hypotheses.clone(),
            ..Ensemble::default()
        };
        let new = self.fit_from(&subset, staging, callback)?;

        // Merge: the new learners index the end of the reported list.
        let offset = self.ensemble.reported.len();
        let shift = (0..new.reported.len())
            .map(|f| f + offset)
            .collect::<Vec<_>>();

        let mut merged = self.ensemble.clone();
        for mut tree in new.weak_learners {
            tree.remap(&shift);
            merged.weak_learners.push(tree);
        }
        merged.alphas.extend(new.alphas);
        merged.reported.extend(
            new.reported.iter().map(|&f| subset.indices()[f])
        );
        merged.hypotheses = new.hypotheses;
        merged.heuristics.extend(new.heuristics);
        merged.heuristics.sort_unstable();
        merged.heuristics.dedup();
        merged.loss = new.loss;
        merged.train_error = new.train_error;

        self.ensemble = merged;
        Ok(())
    }


    fn fit_from<D, C>(&mut self, dataset: &D, start: Ensemble, callback: C)
        -> Result<Ensemble>
        where D: DataSet + ?Sized,
              C: FnMut(&RoundReport) -> ControlFlow<()>,
    {
        let mut trainer = AdaBoostTrainer::new(
            dataset, &self.settings, &mut self.rng, start, callback,
        )?;
        trainer.run()
    }


    /// Returns the (unnormalized) score of each label for `sample`:
    /// the sum of the weights of the weak learners predicting it.
    pub fn distribution<D>(&self, dataset: &D, sample: usize)
        -> Result<Vec<f64>>
        where D: DataSet + ?Sized,
    {
        let mut distr = vec![0f64; dataset.n_labels()];
        let ensemble = &self.ensemble;
        if ensemble.weak_learners.is_empty() {
            return Ok(distr);
        }

        if ensemble.reported.iter().any(|&f| f >= dataset.n_features()) {
            return Err(BoostError::invalid(
                "the dataset lacks features the classifier uses"
            ));
        }

        let one = SampleSubSet::new(dataset, vec![sample])?;
        let used = FeatureSubSet::new(&one, ensemble.reported.clone())?;
        let cache = DataSetCache::new(&used, true)?;

        for (tree, alpha) in ensemble.weak_learners.iter().zip(&ensemble.alphas) {
            let label = tree.classify(&cache, 0)?;
            let score = distr.get_mut(label)
                .ok_or_else(|| BoostError::logic(format!(
                    "a weak learner predicted label {label}, \
                    but the dataset has {} labels",
                    dataset.n_labels(),
                )))?;
            *score += alpha;
        }
        Ok(distr)
    }


    /// Predicts the label of `sample`,
    /// the first label of maximal score.
    pub fn classify<D>(&self, dataset: &D, sample: usize) -> Result<usize>
        where D: DataSet + ?Sized,
    {
        let distr = self.distribution(dataset, sample)?;
        Ok(argmax(&distr))
    }


    /// Predicts the label of every sample of `dataset`.
    pub fn predict_all<D>(&self, dataset: &D) -> Result<Vec<usize>>
        where D: DataSet + ?Sized,
    {
        (0..dataset.n_samples())
            .map(|s| self.classify(dataset, s))
            .collect()
    }


    /// Appends the features used by the model to `features`.
    pub fn report(&self, features: &mut Vec<usize>) {
        features.extend_from_slice(&self.ensemble.reported);
    }


    /// Returns the features used by the model.
    pub fn reported(&self) -> &[usize] {
        &self.ensemble.reported
    }


    /// Returns the weak learners.
    /// Their nodes index into [`AdaBoost::reported`].
    pub fn weak_learners(&self) -> &[WeakTree] {
        &self.ensemble.weak_learners
    }


    /// Returns the weights of the weak learners.
    pub fn alphas(&self) -> &[f64] {
        &self.ensemble.alphas
    }


    /// Returns the `n_samples x n_labels` scores of the training samples.
    pub fn hypotheses(&self) -> &[Vec<f64>] {
        &self.ensemble.hypotheses
    }


    /// Returns the heuristics the reported features belong to.
    pub fn heuristics(&self) -> &[usize] {
        &self.ensemble.heuristics
    }


    /// Returns the exponential loss after the last committed round.
    pub fn loss(&self) -> f64 {
        self.ensemble.loss
    }


    /// Returns the training error after the last committed round.
    pub fn train_error(&self) -> f64 {
        self.ensemble.train_error
    }


    /// Returns the model as a JSON document.
    pub fn save(&self) -> Result<serde_json::Value> {
        let ensemble = &self.ensemble;
        let weak_learners = ensemble.weak_learners.iter()
            .map(|tree| WeakTreeDocument {
                name: tree.name().to_string(),
                max_depth: tree.max_depth(),
                nodes: tree.records(),
            })
            .collect();

        let doc = AdaBoostDocument {
            name: ADABOOST_NAME.to_string(),
            nb_rounds: self.settings.nb_rounds,
            nb_features_per_heuristic: self.settings.nb_features_per_heuristic,
            max_depth: self.settings.max_depth,
            loss: ensemble.loss,
            train_error: ensemble.train_error,
            heuristics: ensemble.heuristics.clone(),
            weak_learners,
            alphas: ensemble.alphas.clone(),
            reported: ensemble.reported.clone(),
            hypotheses: ensemble.hypotheses.clone(),
        };
        Ok(serde_json::to_value(doc)?)
    }


    /// Replaces the parameters and the state of the model
    /// by those of the document `value`.
    pub fn load(&mut self, value: &serde_json::Value) -> Result<()> {
        let name = value.get("name").and_then(|name| name.as_str());
        if name != Some(ADABOOST_NAME) {
            return Err(BoostError::format("the input classifier is not AdaBoost"));
        }
        let doc = serde_json::from_value::<AdaBoostDocument>(value.clone())
            .map_err(|e| BoostError::format(e.to_string()))?;

        if doc.alphas.len() != doc.weak_learners.len() {
            return Err(BoostError::format(format!(
                "{} alphas for {} weak learners",
                doc.alphas.len(), doc.weak_learners.len(),
            )));
        }

        let weak_learners = doc.weak_learners.iter()
            .map(|tree| {
                if tree.name != WEAK_TREE_NAME {
                    return Err(BoostError::format(
                        "the input weak learner is not a WeakTree"
                    ));
                }
                WeakTree::from_records(tree.max_depth, &tree.nodes)
            })
            .collect::<Result<Vec<_>>>()?;

        let n_reported = doc.reported.len();
        let dangling = weak_learners.iter()
            .flat_map(|tree| tree.nodes())
            .any(|node| node.feature >= n_reported);
        if dangling {
            return Err(BoostError::format(
                "a weak learner uses a feature that is not reported"
            ));
        }

        if !weak_learners.is_empty() && doc.hypotheses.is_empty() {
            return Err(BoostError::format(
                "a trained classifier must carry its hypotheses"
            ));
        }
        let n_label = doc.hypotheses.first().map_or(0, Vec::len);
        if doc.hypotheses.iter().any(|row| row.len() != n_label) {
            return Err(BoostError::format(
                "every row of the hypotheses must hold the same number of labels"
            ));
        }

        self.settings.nb_rounds = doc.nb_rounds;
        self.settings.nb_features_per_heuristic = doc.nb_features_per_heuristic;
        self.settings.max_depth = doc.max_depth;
        self.ensemble = Ensemble {
            weak_learners,
            alphas: doc.alphas,
            reported: doc.reported,
            hypotheses: doc.hypotheses,
            heuristics: doc.heuristics,
            loss: doc.loss,
            train_error: doc.train_error,
        };
        Ok(())
    }


    /// Writes the model as a pretty-printed JSON document.
    pub fn to_writer<W: Write>(&self, writer: W) -> Result<()> {
        let value = self.save()?;
        document::write_pretty(&value, writer)
    }


    /// Loads the model from a JSON document.
    pub fn from_reader<R: Read>(&mut self, reader: R) -> Result<()> {
        let value = document::read(reader)?;
        self.load(&value)
    }
}


impl fmt::Display for AdaBoost {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let ensemble = &self.ensemble;
        writeln!(
            f,
            "{} classifier (#weak learners: {})",
            ADABOOST_NAME, ensemble.weak_learners.len(),
        )?;
        for (tree, alpha) in ensemble.weak_learners.iter().zip(&ensemble.alphas) {
            writeln!(f, "Alpha: {alpha}, {}", tree.display_mapped(&ensemble.reported))?;
        }
        Ok(())
    }
}
