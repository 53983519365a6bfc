use std::cell::Cell;
use std::ops::ControlFlow;

use approx::assert_relative_eq;
use boostfarm::prelude::*;
use boostfarm::constants::SATURATED_ALPHA;
use rand::prelude::*;
use rand_distr::Normal;


/// Samples of `n_label` labels described by two heuristics:
/// heuristic `0` holds pure noise features,
/// heuristic `1` holds features centered on the label.
fn blobs(seed: u64, n_per_label: usize, n_label: usize, spread: f32)
    -> DenseDataSet
{
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0, 1.0).unwrap();
    let jitter = Normal::new(0.0, spread).unwrap();

    let labels = (0..n_label)
        .flat_map(|y| std::iter::repeat(y).take(n_per_label))
        .collect::<Vec<usize>>();

    let mut columns = Vec::new();
    for _ in 0..3 {
        columns.push(
            labels.iter().map(|_| noise.sample(&mut rng)).collect::<Vec<f32>>()
        );
    }
    for _ in 0..3 {
        columns.push(
            labels.iter()
                .map(|&y| y as f32 + jitter.sample(&mut rng))
                .collect::<Vec<f32>>()
        );
    }
    DenseDataSet::from_columns(columns, labels, vec![0, 0, 0, 1, 1, 1])
        .unwrap()
}


fn quiet() -> AdaBoost {
    AdaBoost::new()
        .print_every(usize::MAX)
        .seed(1234)
}


/// Counts the calls to `compute_features`.
struct Counting<'a> {
    inner: &'a DenseDataSet,
    calls: Cell<usize>,
}


impl DataSet for Counting<'_> {
    fn n_samples(&self) -> usize { self.inner.n_samples() }
    fn n_features(&self) -> usize { self.inner.n_features() }
    fn n_labels(&self) -> usize { self.inner.n_labels() }
    fn n_heuristics(&self) -> usize { self.inner.n_heuristics() }
    fn label(&self, sample: usize) -> usize { self.inner.label(sample) }
    fn heuristic(&self, feature: usize) -> usize {
        self.inner.heuristic(feature)
    }


    fn compute_features(
        &self,
        samples: &[usize],
        features: &[usize],
        values: &mut [f32],
        by_column: bool,
    ) -> boostfarm::Result<()>
    {
        self.calls.set(self.calls.get() + 1);
        self.inner.compute_features(samples, features, values, by_column)
    }
}


fn assert_compact(model: &AdaBoost) {
    let reported = model.reported();
    assert!(reported.windows(2).all(|w| w[0] < w[1]));
    for tree in model.weak_learners() {
        for node in tree.nodes() {
            assert!(node.feature < reported.len());
        }
    }
}


/// Tests for `AdaBoost`.
#[cfg(test)]
pub mod adaboost_tests {
    use super::*;


    #[test]
    fn separable_problem_is_learned() {
        let feature = (0..20).map(|x| x as f32).collect::<Vec<_>>();
        let labels = (0..20).map(|x| (x >= 10) as usize).collect::<Vec<_>>();
        let data = DenseDataSet::from_columns(
            vec![feature], labels.clone(), vec![0],
        ).unwrap();

        let mut model = quiet()
            .nb_rounds(20)
            .nb_features_per_heuristic(0);
        model.train(&data).unwrap();

        assert!(!model.alphas().is_empty());
        assert!(model.alphas().iter().all(|&alpha| alpha > 0.0));
        assert_eq!(model.train_error(), 0.0);
        assert_eq!(model.predict_all(&data).unwrap(), labels);

        // A perfect learner saturates its weight, ends the run,
        // and still counts in the hypotheses.
        assert_eq!(model.alphas(), &[SATURATED_ALPHA]);
        assert_eq!(model.hypotheses()[0], vec![SATURATED_ALPHA, 0.0]);
        assert_eq!(model.hypotheses()[19], vec![0.0, SATURATED_ALPHA]);
    }


    #[test]
    fn noisy_problem_improves() {
        let data = blobs(7, 30, 3, 0.6);
        let mut errors = Vec::new();
        let mut model = quiet().nb_rounds(15);
        model.train_with(&data, |report| {
            assert!(report.alpha > 0.0);
            assert!(report.edge > 0.0 && report.edge < 1.0);
            errors.push(report.train_error);
            ControlFlow::Continue(())
        }).unwrap();

        assert_eq!(errors.len(), model.alphas().len());
        assert!(*errors.last().unwrap() < 0.5);
        assert_eq!(model.train_error(), *errors.last().unwrap());
        assert_compact(&model);
    }


    #[test]
    fn training_is_reproducible() {
        let data = blobs(3, 20, 3, 1.0);
        let mut a = quiet().nb_rounds(8).nb_features_per_heuristic(2);
        let mut b = quiet().nb_rounds(8).nb_features_per_heuristic(2);
        a.train(&data).unwrap();
        b.train(&data).unwrap();

        assert_eq!(a.alphas(), b.alphas());
        assert_eq!(a.weak_learners(), b.weak_learners());
        assert_eq!(a.reported(), b.reported());
    }


    #[test]
    fn saved_model_predicts_the_same() {
        let data = blobs(5, 25, 3, 0.8);
        let mut model = quiet().nb_rounds(10).max_depth(2);
        model.train(&data).unwrap();

        let mut loaded = AdaBoost::new();
        loaded.load(&model.save().unwrap()).unwrap();

        let mut bytes = Vec::new();
        model.to_writer(&mut bytes).unwrap();
        let mut read = AdaBoost::new();
        read.from_reader(&bytes[..]).unwrap();

        for s in 0..data.n_samples() {
            let expected = model.distribution(&data, s).unwrap();
            assert_eq!(loaded.distribution(&data, s).unwrap(), expected);
            assert_eq!(read.distribution(&data, s).unwrap(), expected);
        }
        assert_eq!(read.alphas(), model.alphas());
        assert_eq!(read.hypotheses(), model.hypotheses());
        assert_eq!(read.reported(), model.reported());
        assert_relative_eq!(read.loss(), model.loss());
    }


    #[test]
    fn load_rejects_other_models() {
        let mut model = AdaBoost::new();
        let value = serde_json::json!({ "name": "LPBoost" });
        let err = model.load(&value).unwrap_err();
        assert!(matches!(err, BoostError::Format(_)));

        let data = blobs(2, 10, 2, 0.5);
        let mut trained = quiet().nb_rounds(3);
        trained.train(&data).unwrap();
        let mut value = trained.save().unwrap();
        value["reported"] = serde_json::json!([]);
        assert!(matches!(model.load(&value), Err(BoostError::Format(_))));
        assert!(model.weak_learners().is_empty());
    }


    #[test]
    fn load_rejects_malformed_hypotheses() {
        let data = blobs(2, 5, 2, 0.5);
        let mut trained = quiet().nb_rounds(2);
        trained.train(&data).unwrap();
        let saved = trained.save().unwrap();

        let mut ragged = saved.clone();
        ragged["hypotheses"][7] = serde_json::json!([0.0]);
        let mut model = quiet();
        let err = model.load(&ragged).unwrap_err();
        assert!(matches!(err, BoostError::Format(_)));
        assert!(model.weak_learners().is_empty());

        let mut missing = saved.clone();
        missing["hypotheses"] = serde_json::json!([]);
        let err = model.load(&missing).unwrap_err();
        assert!(matches!(err, BoostError::Format(_)));

        // The intact document still loads and keeps training.
        model.load(&saved).unwrap();
        model.train(&data).unwrap();
        assert!(model.alphas().len() >= trained.alphas().len());
    }


    #[test]
    fn callback_stops_training() {
        let data = blobs(9, 20, 3, 1.5);
        let mut model = quiet().nb_rounds(50);
        model.train_with(&data, |report| {
            if report.round == 3 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        }).unwrap();
        assert_eq!(model.alphas().len(), 3);
    }


    #[test]
    fn warm_start_appends_rounds() {
        let data = blobs(4, 20, 3, 1.5);
        let mut model = quiet().nb_rounds(3);
        model.train(&data).unwrap();
        let first = model.alphas().to_vec();

        model.train(&data).unwrap();
        assert!(model.alphas().len() > first.len());
        assert_eq!(&model.alphas()[..first.len()], &first[..]);
        assert_compact(&model);

        // Another number of samples is refused and keeps the model.
        let other = blobs(4, 10, 3, 1.5);
        let before = model.alphas().to_vec();
        let err = model.train(&other).unwrap_err();
        assert!(err.is_misuse());
        assert_eq!(model.alphas(), &before[..]);
    }


    #[test]
    fn adapt_trains_on_new_heuristics() {
        let data = blobs(6, 20, 3, 0.7);
        let first = FeatureSubSet::new(&data, vec![0, 1, 2]).unwrap();

        let mut model = quiet().nb_rounds(4);
        model.train(&first).unwrap();
        assert_eq!(model.heuristics(), &[0]);
        let n_old = model.alphas().len();
        let old_hypotheses = model.hypotheses().to_vec();
        let old_reported = model.reported().to_vec();

        // Continue from the saved model, on the whole dataset.
        let mut model = {
            let mut loaded = quiet().nb_rounds(4);
            loaded.load(&model.save().unwrap()).unwrap();
            loaded
        };
        let mut n_new = 0;
        model.adapt_with(&data, &[], |_| {
            n_new += 1;
            ControlFlow::Continue(())
        }).unwrap();

        assert_eq!(model.alphas().len(), n_old + n_new);
        assert_eq!(model.weak_learners().len(), n_old + n_new);
        assert_eq!(model.heuristics(), &[0, 1]);
        assert_eq!(&model.reported()[..old_reported.len()], &old_reported[..]);
        assert!(model.reported()[old_reported.len()..].iter().all(|&f| f >= 3));

        // Every round adds its weight to exactly one label.
        let added = model.alphas()[n_old..].iter().sum::<f64>();
        let hypotheses = model.hypotheses();
        assert_eq!(hypotheses.len(), old_hypotheses.len());
        for (new, old) in hypotheses.iter().zip(&old_hypotheses) {
            assert_eq!(new.len(), old.len());
            let diff = new.iter().sum::<f64>() - old.iter().sum::<f64>();
            assert_relative_eq!(diff, added, epsilon = 1e-9);
        }

        // Nothing left to train on.
        let before = model.alphas().to_vec();
        let err = model.adapt(&data, &[]).unwrap_err();
        assert!(matches!(err, BoostError::InvalidArgument(_)));
        assert_eq!(model.alphas(), &before[..]);

        // Unless a heuristic is explicitly requested again.
        model.adapt(&data, &[1]).unwrap();
        assert!(model.alphas().len() >= before.len());
    }


    #[test]
    fn cache_budget_is_checked_before_computing() {
        let data = blobs(8, 10, 2, 1.0);
        let whole = data.n_samples() * data.n_features();

        let mut model = quiet()
            .nb_rounds(2)
            .nb_features_per_heuristic(0)
            .cache_size(whole);
        model.train(&data).unwrap();

        let counting = Counting { inner: &data, calls: Cell::new(0) };
        let mut model = quiet()
            .nb_rounds(2)
            .nb_features_per_heuristic(0)
            .cache_size(whole - 1);
        let err = model.train(&counting).unwrap_err();
        assert!(err.is_capacity());
        assert_eq!(counting.calls.get(), 0);
        assert!(model.weak_learners().is_empty());
    }


    #[test]
    fn window_cache_trains() {
        let data = blobs(10, 10, 2, 0.5);
        // One sampled feature per heuristic and round,
        // with room for two rounds.
        let mut model = quiet()
            .nb_rounds(6)
            .nb_features_per_heuristic(1)
            .cache_size(data.n_samples() * 2 * 2);
        model.train(&data).unwrap();

        assert!(!model.alphas().is_empty());
        assert!(model.reported().iter().all(|&f| f < data.n_features()));
        assert_compact(&model);
    }


    #[test]
    fn untrained_model() {
        let data = blobs(1, 5, 2, 1.0);
        let model = AdaBoost::new();
        assert_eq!(model.distribution(&data, 0).unwrap(), vec![0.0, 0.0]);
        assert_eq!(model.classify(&data, 0).unwrap(), 0);

        let mut model = quiet().nb_rounds(0);
        let err = model.train(&data).unwrap_err();
        assert!(matches!(err, BoostError::InvalidArgument(_)));

        let one = SampleSubSet::new(&data, vec![0]).unwrap();
        let mut model = quiet();
        assert!(model.train(&one).is_err());
    }


    #[test]
    fn rounds_are_logged() {
        let data = blobs(12, 10, 2, 1.5);
        let path = std::env::temp_dir()
            .join(format!("boostfarm-log-{}.csv", std::process::id()));

        let mut model = quiet().nb_rounds(4).log_to(&path);
        model.train(&data).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("Round,Edge,Alpha,Loss,TrainError,Time"));
        assert_eq!(lines.count(), model.alphas().len());

        let shown = model.to_string();
        assert!(shown.starts_with(&format!(
            "AdaBoost classifier (#weak learners: {})",
            model.alphas().len(),
        )));
    }
}
