use crate::{BoostError, Result};


/// The interface every feature source implements.
///
/// Samples are indexed by `0..n_samples()` and features by
/// `0..n_features()`.
/// Indices outside of these ranges are a caller error;
/// implementors are free to panic on them.
pub trait DataSet {
    /// Returns the number of samples.
    fn n_samples(&self) -> usize;


    /// Returns the number of (flattened) features.
    fn n_features(&self) -> usize;


    /// Returns an upper bound on the number of distinct labels.
    fn n_labels(&self) -> usize;


    /// Returns an upper bound on the number of heuristics.
    fn n_heuristics(&self) -> usize;


    /// Returns the label of `sample`, a value in `0..n_labels()`.
    fn label(&self, sample: usize) -> usize;


    /// Returns the heuristic `feature` belongs to,
    /// a value in `0..n_heuristics()`.
    fn heuristic(&self, feature: usize) -> usize;


    /// Computes the values of `features` for `samples` into `values`.
    ///
    /// If `by_column` is `true`, the values of one feature are contiguous:
    /// `values[f * samples.len() + s]`.
    /// Otherwise the values of one sample are contiguous:
    /// `values[s * features.len() + f]`.
    fn compute_features(
        &self,
        samples: &[usize],
        features: &[usize],
        values: &mut [f32],
        by_column: bool,
    ) -> Result<()>;


    /// Returns the value of a single `feature` of a single `sample`.
    #[inline]
    fn feature_value(&self, sample: usize, feature: usize) -> Result<f32> {
        let mut value = [0f32];
        self.compute_features(&[sample], &[feature], &mut value, true)?;
        Ok(value[0])
    }


    /// Returns the labels of all samples.
    fn labels(&self) -> Vec<usize> {
        (0..self.n_samples()).map(|s| self.label(s)).collect()
    }


    /// Returns the features grouped by heuristic.
    /// The `h`-th entry lists the features of heuristic `h`
    /// in increasing order.
    fn features_by_heuristic(&self) -> Vec<Vec<usize>> {
        let mut heuristics = vec![Vec::new(); self.n_heuristics()];
        for f in 0..self.n_features() {
            let h = self.heuristic(f);
            if h >= heuristics.len() {
                heuristics.resize(h + 1, Vec::new());
            }
            heuristics[h].push(f);
        }
        heuristics
    }
}


/// Checks the arguments of [`DataSet::compute_features`].
#[inline]
pub(crate) fn check_request(
    samples: &[usize],
    features: &[usize],
    values: &[f32],
) -> Result<()>
{
    if samples.is_empty() || features.is_empty() {
        return Err(BoostError::invalid(
            "no sample or feature indices provided"
        ));
    }

    let expected = samples.len() * features.len();
    if values.len() != expected {
        return Err(BoostError::invalid(format!(
            "the output buffer holds {} values, {expected} expected",
            values.len(),
        )));
    }
    Ok(())
}
