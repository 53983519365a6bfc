use crate::{BoostError, Result};
use super::dataset_trait::DataSet;


/// A view on some samples of a parent dataset.
/// The `i`-th sample of the view is the `indices[i]`-th sample
/// of the parent.
#[derive(Debug, Clone)]
pub struct SampleSubSet<'a, D: ?Sized> {
    dataset: &'a D,
    indices: Vec<usize>,
}


impl<'a, D> SampleSubSet<'a, D>
    where D: DataSet + ?Sized,
{
    /// Constructs a view on the samples `indices` of `dataset`.
    pub fn new(dataset: &'a D, indices: Vec<usize>) -> Result<Self> {
        if indices.is_empty() {
            return Err(BoostError::invalid("no sample indices provided"));
        }
        Ok(Self { dataset, indices })
    }


    /// Returns the parent indices of the samples of this view.
    pub fn indices(&self) -> &[usize] {
        &self.indices[..]
    }
}


impl<D> DataSet for SampleSubSet<'_, D>
    where D: DataSet + ?Sized,
{
    fn n_samples(&self) -> usize {
        self.indices.len()
    }


    fn n_features(&self) -> usize {
        self.dataset.n_features()
    }


    fn n_labels(&self) -> usize {
        self.dataset.n_labels()
    }


    fn n_heuristics(&self) -> usize {
        self.dataset.n_heuristics()
    }


    fn label(&self, sample: usize) -> usize {
        self.dataset.label(self.indices[sample])
    }


    fn heuristic(&self, feature: usize) -> usize {
        self.dataset.heuristic(feature)
    }


    fn compute_features(
        &self,
        samples: &[usize],
        features: &[usize],
        values: &mut [f32],
        by_column: bool,
    ) -> Result<()>
    {
        let samples = samples.iter()
            .map(|&s| self.indices[s])
            .collect::<Vec<_>>();
        self.dataset.compute_features(&samples, features, values, by_column)
    }


    #[inline]
    fn feature_value(&self, sample: usize, feature: usize) -> Result<f32> {
        self.dataset.feature_value(self.indices[sample], feature)
    }
}


/// A view on some features of a parent dataset.
/// The `j`-th feature of the view is the `indices[j]`-th feature
/// of the parent.
#[derive(Debug, Clone)]
pub struct FeatureSubSet<'a, D: ?Sized> {
    dataset: &'a D,
    indices: Vec<usize>,
}


impl<'a, D> FeatureSubSet<'a, D>
    where D: DataSet + ?Sized,
{
    /// Constructs a view on the features `indices` of `dataset`.
    pub fn new(dataset: &'a D, indices: Vec<usize>) -> Result<Self> {
        if indices.is_empty() {
            return Err(BoostError::invalid("no feature indices provided"));
        }
        Ok(Self { dataset, indices })
    }


    /// Returns the parent indices of the features of this view.
    pub fn indices(&self) -> &[usize] {
        &self.indices[..]
    }
}


impl<D> DataSet for FeatureSubSet<'_, D>
    where D: DataSet + ?Sized,
{
    fn n_samples(&self) -> usize {
        self.dataset.n_samples()
    }


    fn n_features(&self) -> usize {
        self.indices.len()
    }


    fn n_labels(&self) -> usize {
        self.dataset.n_labels()
    }


    fn n_heuristics(&self) -> usize {
        self.dataset.n_heuristics()
    }


    fn label(&self, sample: usize) -> usize {
        self.dataset.label(sample)
    }


    fn heuristic(&self, feature: usize) -> usize {
        self.dataset.heuristic(self.indices[feature])
    }


    fn compute_features(
        &self,
        samples: &[usize],
        features: &[usize],
        values: &mut [f32],
        by_column: bool,
    ) -> Result<()>
    {
        let features = features.iter()
            .map(|&f| self.indices[f])
            .collect::<Vec<_>>();
        self.dataset.compute_features(samples, &features, values, by_column)
    }


    #[inline]
    fn feature_value(&self, sample: usize, feature: usize) -> Result<f32> {
        self.dataset.feature_value(sample, self.indices[feature])
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::DenseDataSet;

    fn toy() -> DenseDataSet {
        let rows = (0..4).map(|s| {
                (0..3).map(|f| (10 * s + f) as f32).collect::<Vec<_>>()
            })
            .collect::<Vec<_>>();
        DenseDataSet::from_rows(rows, vec![0, 1, 2, 1], vec![0, 1, 1])
            .unwrap()
    }

    #[test]
    fn sample_subset_translates_indices() {
        let data = toy();
        let view = SampleSubSet::new(&data, vec![3, 1]).unwrap();
        assert_eq!(view.n_samples(), 2);
        assert_eq!(view.label(0), 1);
        assert_eq!(view.feature_value(0, 2).unwrap(), 32.0);
    }

    #[test]
    fn views_compose() {
        let data = toy();
        let samples = SampleSubSet::new(&data, vec![2, 0]).unwrap();
        let features = FeatureSubSet::new(&samples, vec![2, 1]).unwrap();

        assert_eq!(features.n_samples(), 2);
        assert_eq!(features.n_features(), 2);
        assert_eq!(features.heuristic(0), 1);

        let mut values = vec![0f32; 4];
        features.compute_features(&[0, 1], &[0, 1], &mut values, false)
            .unwrap();
        assert_eq!(values, vec![22.0, 21.0, 2.0, 1.0]);
    }

    #[test]
    fn empty_subsets_are_rejected() {
        let data = toy();
        assert!(SampleSubSet::new(&data, Vec::new()).is_err());
        assert!(FeatureSubSet::new(&data, Vec::new()).is_err());
    }
}
