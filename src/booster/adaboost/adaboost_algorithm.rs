//! One training run of `AdaBoost`.
use rand::rngs::StdRng;
use rayon::prelude::*;

use crate::{BoostError, Result};
use crate::booster::Booster;
use crate::common::golden_section;
use crate::constants::*;
use crate::dataset::{DataSet, DataSetCache, FeatureSubSet, CachePlan};
use crate::logging::RoundLogger;
use crate::weak_learner::WeakTree;
use super::{Ensemble, Settings};
use super::loss::{AdaBoostLoss, update_costs};
use super::sampler::FeatureSampler;

use std::ops::ControlFlow;
use std::time::{Duration, Instant};


/// Statistics of a committed boosting round.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoundReport {
    /// Round number, starting at `1`.
    pub round: usize,
    /// Number of rounds of the run.
    pub n_rounds: usize,
    /// `tanh(alpha)`.
    pub edge: f64,
    /// Weight of the weak learner of this round.
    pub alpha: f64,
    /// Exponential loss of the ensemble after this round.
    pub loss: f64,
    /// Training error of the ensemble after this round.
    pub train_error: f64,
    /// Time elapsed since the first round started.
    pub elapsed: Duration,
}


/// Runs the boosting rounds over `dataset`,
/// starting from the ensemble `ensemble`.
///
/// The trainer owns every buffer of the run
/// (cost matrix, feature caches, predictions),
/// so they are released whenever the run ends.
pub(crate) struct AdaBoostTrainer<'a, D: ?Sized, C> {
    dataset: &'a D,
    settings: &'a Settings,
    rng: &'a mut StdRng,
    callback: C,
    logger: RoundLogger,

    ensemble: Ensemble,

    labels: Vec<usize>,
    costs: Vec<Vec<f64>>,

    plan: CachePlan,
    sampler: FeatureSampler,
    cache: Option<DataSetCache>,
    // Raw indices of the features of the cached rounds, round after round.
    window: Vec<usize>,

    elapsed: Duration,
    last: Option<RoundReport>,
}


impl<'a, D, C> AdaBoostTrainer<'a, D, C>
    where D: DataSet + ?Sized,
          C: FnMut(&RoundReport) -> ControlFlow<()>,
{
    /// Checks the preconditions of the run.
    /// No buffer is allocated and no feature is computed here.
    pub(crate) fn new(
        dataset: &'a D,
        settings: &'a Settings,
        rng: &'a mut StdRng,
        mut ensemble: Ensemble,
        callback: C,
    ) -> Result<Self>
    {
        let n_sample = dataset.n_samples();
        let n_feature = dataset.n_features();
        let n_label = dataset.n_labels();
        let n_heuristic = dataset.n_heuristics();

        if settings.nb_rounds == 0 {
            return Err(BoostError::invalid(
                "the number of rounds must be strictly positive"
            ));
        }
        if n_sample < 2 || n_feature == 0 || n_label < 2 || n_heuristic == 0 {
            return Err(BoostError::invalid(
                "there must be at least 2 training samples, 1 feature, \
                2 labels, and 1 heuristic"
            ));
        }

        if ensemble.hypotheses.is_empty() {
            if !ensemble.weak_learners.is_empty() {
                return Err(BoostError::logic(
                    "the classifier has weak learners but no hypotheses"
                ));
            }
            ensemble.hypotheses = vec![vec![0f64; n_label]; n_sample];
        } else {
            if ensemble.hypotheses.len() != n_sample {
                return Err(BoostError::logic(
                    "the classifier was already trained \
                    with a different number of samples"
                ));
            }
            if ensemble.hypotheses.iter().any(|row| row.len() != n_label) {
                return Err(BoostError::logic(
                    "the classifier was already trained \
                    with a different number of labels"
                ));
            }
            if ensemble.reported.iter().any(|&f| f >= n_feature) {
                return Err(BoostError::logic(
                    "the classifier uses features the dataset does not have"
                ));
            }

            // Back to raw dataset features.
            ensemble.weak_learners.iter_mut()
                .for_each(|tree| tree.remap(&ensemble.reported));
        }

        let labels = dataset.labels();
        if let Some(&label) = labels.iter().find(|&&y| y >= n_label) {
            return Err(BoostError::invalid(format!(
                "label {label} is out of range ({n_label} labels)"
            )));
        }

        let heuristics = dataset.features_by_heuristic();
        let sizes = heuristics.iter().map(Vec::len).collect::<Vec<_>>();
        let plan = CachePlan::new(
            n_sample,
            &sizes,
            settings.nb_features_per_heuristic,
            settings.nb_rounds,
            settings.cache_size,
        )?;
        let sampler = FeatureSampler::new(
            heuristics, settings.nb_features_per_heuristic
        );

        let mut logger = RoundLogger::new(settings.print_every);
        if let Some(path) = settings.log_path.as_ref() {
            logger = logger.log_to(path)?;
        }

        Ok(Self {
            dataset,
            settings,
            rng,
            callback,
            logger,

            ensemble,

            labels,
            costs: Vec::new(),

            plan,
            sampler,
            cache: None,
            window: Vec::new(),

            elapsed: Duration::ZERO,
            last: None,
        })
    }


    /// Caches the features of the next rounds when the window is exhausted,
    /// then trains a weak learner on the features of round `round`
    /// (starting at `0`).
    /// Returns the learner, in raw feature indices,
    /// and its predictions on the training samples.
    fn fit_round(&mut self, round: usize) -> Result<(WeakTree, Vec<usize>)> {
        let max_depth = self.settings.max_depth;
        match self.plan {
            CachePlan::Full => {
                let cache = self.cache.as_ref()
                    .ok_or_else(|| BoostError::logic("the cache is empty"))?;
                fit(cache, &self.costs, max_depth)
            },
            CachePlan::Sliced { .. } => {
                self.window.clear();
                self.sampler.sample_into(&mut *self.rng, &mut self.window);

                let cache = self.cache.as_ref()
                    .ok_or_else(|| BoostError::logic("the cache is empty"))?;
                let view = FeatureSubSet::new(cache, self.window.clone())?;
                let (mut tree, predictions) = fit(&view, &self.costs, max_depth)?;
                tree.remap(&self.window);
                Ok((tree, predictions))
            },
            CachePlan::Window { n_features_per_round: p, n_cached_rounds } => {
                let i = round % n_cached_rounds;
                if i == 0 {
                    let n_round = n_cached_rounds
                        .min(self.settings.nb_rounds - round);

                    // Release the previous window before computing the next.
                    self.cache = None;
                    self.window.clear();
                    for _ in 0..n_round {
                        self.sampler.sample_into(&mut *self.rng, &mut self.window);
                    }
                    let cached = FeatureSubSet::new(
                        self.dataset, self.window.clone()
                    )?;
                    self.cache = Some(DataSetCache::new(&cached, true)?);
                }

                let cache = self.cache.as_ref()
                    .ok_or_else(|| BoostError::logic("the cache is empty"))?;
                let local = (i * p..(i + 1) * p).collect::<Vec<_>>();
                let view = FeatureSubSet::new(cache, local)?;
                let (mut tree, predictions) = fit(&view, &self.costs, max_depth)?;
                tree.remap(&self.window[i * p..(i + 1) * p]);
                Ok((tree, predictions))
            },
        }
    }


    /// Adds `alpha` to the hypotheses of the predicted labels
    /// and returns the training error of the updated ensemble.
    fn update_hypotheses(&mut self, predictions: &[usize], alpha: f64) -> f64 {
        self.ensemble.hypotheses.par_iter_mut()
            .zip(predictions)
            .for_each(|(hyp, &p)| { hyp[p] += alpha; });

        let n_error = self.ensemble.hypotheses.iter()
            .zip(&self.labels)
            .filter(|&(hyp, &y)| argmax(hyp) != y)
            .count();
        n_error as f64 / self.labels.len() as f64
    }


    /// Commits a weak learner and reports the round.
    fn commit(
        &mut self,
        round: usize,
        tree: WeakTree,
        predictions: &[usize],
        edge: f64,
        alpha: f64,
    ) -> Result<ControlFlow<()>>
    {
        let loss = AdaBoostLoss::new(&self.labels, predictions, &self.costs)
            .eval(alpha);

        self.ensemble.weak_learners.push(tree);
        self.ensemble.alphas.push(alpha);
        let train_error = self.update_hypotheses(predictions, alpha);
        self.ensemble.loss = loss;
        self.ensemble.train_error = train_error;

        let report = RoundReport {
            round,
            n_rounds: self.settings.nb_rounds,
            edge,
            alpha,
            loss,
            train_error,
            elapsed: self.elapsed,
        };
        self.logger.record(&report)?;
        self.last = Some(report);
        Ok((self.callback)(&report))
    }
}


impl<D, C> Booster for AdaBoostTrainer<'_, D, C>
    where D: DataSet + ?Sized,
          C: FnMut(&RoundReport) -> ControlFlow<()>,
{
    type Output = Ensemble;


    fn name(&self) -> &str {
        ADABOOST_NAME
    }


    fn info(&self) -> Option<Vec<(&str, String)>> {
        let n_sample = self.dataset.n_samples();
        let n_feature = self.dataset.n_features();
        let info = Vec::from([
            ("# of examples", format!("{n_sample}")),
            ("# of features", format!("{n_feature}")),
            ("# of labels", format!("{}", self.dataset.n_labels())),
            ("# of heuristics", format!("{}", self.dataset.n_heuristics())),
            ("Max. # of rounds", format!("{}", self.settings.nb_rounds)),
            (
                "Features/heuristic",
                format!("{}", self.settings.nb_features_per_heuristic)
            ),
            ("Warm start", format!("{}", !self.ensemble.alphas.is_empty())),
        ]);
        Some(info)
    }


    fn preprocess(&mut self) -> Result<()> {
        let n_sample = self.dataset.n_samples();
        let n_label = self.dataset.n_labels();
        self.costs = vec![vec![0f64; n_label]; n_sample];

        if matches!(self.plan, CachePlan::Full | CachePlan::Sliced { .. }) {
            self.cache = Some(DataSetCache::new(self.dataset, true)?);
        }

        let depth = WeakTree::new(self.settings.max_depth).depth_for(n_label);
        let weak_learner = format!("{WEAK_TREE_NAME} (depth {depth})");
        self.logger.print_stats(
            self.name(), self.info(), &weak_learner, &self.plan,
        );
        self.logger.print_header();
        Ok(())
    }


    /// Runs one round.
    ///
    /// A (nearly) perfect weak learner is committed with weight
    /// `SATURATED_ALPHA` and ends the run.
    /// Its weight is added to the hypotheses like that of any other round,
    /// so the costs of a later warm start or adaptation account for it.
    fn boost(&mut self, iteration: usize) -> Result<ControlFlow<usize>> {
        let nb_rounds = self.settings.nb_rounds;
        if iteration > nb_rounds {
            return Ok(ControlFlow::Break(nb_rounds));
        }
        let now = Instant::now();

        update_costs(&self.ensemble.hypotheses, &self.labels, &mut self.costs);

        let (tree, predictions) = self.fit_round(iteration - 1)?;

        let loss = AdaBoostLoss::new(&self.labels, &predictions, &self.costs);
        let alpha = golden_section(
            ALPHA_LOWER_BOUND,
            ALPHA_UPPER_BOUND,
            |alpha| loss.eval(alpha),
            LINE_SEARCH_TOLERANCE,
        );
        let edge = alpha.tanh();
        self.elapsed += now.elapsed();

        if edge < EDGE_TOLERANCE {
            self.logger.warn("could not find a weak learner");
            return Ok(ControlFlow::Break(iteration - 1));
        }

        let saturated = edge > 1.0 - EDGE_TOLERANCE;
        let alpha = if saturated {
            self.logger.notice("(nearly) perfect weak learner found");
            SATURATED_ALPHA
        } else {
            alpha
        };

        let flow = self.commit(iteration, tree, &predictions, edge, alpha)?;
        if saturated || flow.is_break() {
            return Ok(ControlFlow::Break(iteration));
        }
        Ok(ControlFlow::Continue(()))
    }


    fn postprocess(&mut self) -> Result<Ensemble> {
        self.logger.finish(self.last.as_ref())?;
        self.costs = Vec::new();
        self.cache = None;

        let mut ensemble = std::mem::take(&mut self.ensemble);

        let mut reported = Vec::new();
        ensemble.weak_learners.iter()
            .for_each(|tree| tree.report(&mut reported));
        reported.sort_unstable();
        reported.dedup();

        let mut mapping = vec![0; self.dataset.n_features()];
        for (compact, &f) in reported.iter().enumerate() {
            mapping[f] = compact;
        }
        ensemble.weak_learners.iter_mut()
            .for_each(|tree| tree.remap(&mapping));

        let mut heuristics = reported.iter()
            .map(|&f| self.dataset.heuristic(f))
            .collect::<Vec<_>>();
        heuristics.sort_unstable();
        heuristics.dedup();

        ensemble.reported = reported;
        ensemble.heuristics = heuristics;
        Ok(ensemble)
    }
}


/// Trains a weak learner on `view` and predicts every sample of `view`.
fn fit<V>(view: &V, costs: &[Vec<f64>], max_depth: usize)
    -> Result<(WeakTree, Vec<usize>)>
    where V: DataSet + Sync + ?Sized,
{
    let mut tree = WeakTree::new(max_depth);
    tree.train(view, costs)?;

    let predictions = (0..view.n_samples()).into_par_iter()
        .map(|s| tree.classify(view, s))
        .collect::<Result<Vec<_>>>()?;

    let n_label = view.n_labels();
    if predictions.iter().any(|&p| p >= n_label) {
        return Err(BoostError::logic("the weak learner predicted no label"));
    }
    Ok((tree, predictions))
}


/// Index of the first maximum of `values`.
#[inline]
pub(crate) fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate().skip(1) {
        if *v > values[best] {
            best = i;
        }
    }
    best
}
