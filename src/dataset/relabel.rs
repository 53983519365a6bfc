use crate::{BoostError, Result};
use super::dataset_trait::DataSet;


/// A view that maps the labels of a parent dataset through a table.
/// The label of sample `s` is `map[parent.label(s)]`.
#[derive(Debug, Clone)]
pub struct Relabel<'a, D: ?Sized> {
    dataset: &'a D,
    map: Vec<usize>,
}


impl<'a, D> Relabel<'a, D>
    where D: DataSet + ?Sized,
{
    /// Constructs the view.
    /// `map` must have one entry per label of `dataset`.
    pub fn new(dataset: &'a D, map: Vec<usize>) -> Result<Self> {
        if map.len() != dataset.n_labels() {
            return Err(BoostError::invalid(format!(
                "the label map has {} entries, {} expected",
                map.len(), dataset.n_labels(),
            )));
        }
        Ok(Self { dataset, map })
    }
}


impl<D> DataSet for Relabel<'_, D>
    where D: DataSet + ?Sized,
{
    fn n_samples(&self) -> usize {
        self.dataset.n_samples()
    }


    fn n_features(&self) -> usize {
        self.dataset.n_features()
    }


    fn n_labels(&self) -> usize {
        self.map.iter().max().map_or(0, |&y| y + 1)
    }


    fn n_heuristics(&self) -> usize {
        self.dataset.n_heuristics()
    }


    fn label(&self, sample: usize) -> usize {
        self.map[self.dataset.label(sample)]
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
        self.dataset.compute_features(samples, features, values, by_column)
    }


    #[inline]
    fn feature_value(&self, sample: usize, feature: usize) -> Result<f32> {
        self.dataset.feature_value(sample, feature)
    }
}
