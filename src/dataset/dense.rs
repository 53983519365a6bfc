use polars::prelude::*;
use rayon::prelude::*;

use crate::{BoostError, Result};
use super::dataset_trait::{DataSet, check_request};


/// A dataset whose features are fully stored in memory.
///
/// The values are stored feature by feature,
/// so that the values of one feature are contiguous.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseDataSet {
    values: Vec<f32>,
    labels: Vec<usize>,
    heuristics: Vec<usize>,
    n_labels: usize,
    n_heuristics: usize,
}


impl DenseDataSet {
    /// Builds a dataset from the columns (one `Vec` per feature) of the
    /// feature matrix, the labels of the samples, and
    /// the heuristic of each feature.
    ///
    /// The number of labels (resp. heuristics) is set to
    /// the largest label (resp. heuristic) plus one.
    pub fn from_columns(
        columns: Vec<Vec<f32>>,
        labels: Vec<usize>,
        heuristics: Vec<usize>,
    ) -> Result<Self>
    {
        let n_sample = labels.len();
        if columns.len() != heuristics.len() {
            return Err(BoostError::invalid(format!(
                "{} columns but {} heuristic assignments",
                columns.len(), heuristics.len(),
            )));
        }
        if let Some(col) = columns.iter().find(|col| col.len() != n_sample) {
            return Err(BoostError::invalid(format!(
                "a column has {} values but there are {n_sample} labels",
                col.len(),
            )));
        }

        let values = columns.into_iter().flatten().collect::<Vec<_>>();
        Ok(Self::from_raw(values, labels, heuristics))
    }


    /// Builds a dataset from the rows (one `Vec` per sample) of the
    /// feature matrix, the labels of the samples, and
    /// the heuristic of each feature.
    pub fn from_rows(
        rows: Vec<Vec<f32>>,
        labels: Vec<usize>,
        heuristics: Vec<usize>,
    ) -> Result<Self>
    {
        if rows.len() != labels.len() {
            return Err(BoostError::invalid(format!(
                "{} rows but {} labels", rows.len(), labels.len(),
            )));
        }
        let n_feature = heuristics.len();
        if let Some(row) = rows.iter().find(|row| row.len() != n_feature) {
            return Err(BoostError::invalid(format!(
                "a row has {} values but there are {n_feature} features",
                row.len(),
            )));
        }

        let columns = (0..n_feature).map(|f| {
                rows.iter().map(|row| row[f]).collect::<Vec<_>>()
            })
            .collect::<Vec<_>>();
        Self::from_columns(columns, labels, heuristics)
    }


    /// Converts a `polars::DataFrame` of numeric features and
    /// a `polars::Series` of labels into a `DenseDataSet`.
    /// `heuristics[f]` is the heuristic of the `f`-th column of `data`.
    pub fn from_dataframe(
        data: &DataFrame,
        target: &Series,
        heuristics: Vec<usize>,
    ) -> Result<Self>
    {
        let labels = target.cast(&DataType::UInt32)?
            .u32()?
            .into_iter()
            .map(|y| y.map(|y| y as usize))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| BoostError::invalid("the target has null values"))?;

        let columns = data.get_columns()
            .par_iter()
            .map(|series| -> Result<Vec<f32>> {
                let series = series.cast(&DataType::Float32)?;
                let column = series.f32()?
                    .into_iter()
                    .collect::<Option<Vec<_>>>()
                    .ok_or_else(|| BoostError::invalid(format!(
                        "the feature `{}` has null values", series.name(),
                    )))?;
                Ok(column)
            })
            .collect::<Result<Vec<_>>>()?;

        Self::from_columns(columns, labels, heuristics)
    }


    /// Overrides the number of labels.
    /// Useful when some labels do not occur in the samples.
    pub fn with_n_labels(mut self, n_labels: usize) -> Self {
        self.n_labels = self.n_labels.max(n_labels);
        self
    }


    /// Overrides the number of heuristics.
    pub fn with_n_heuristics(mut self, n_heuristics: usize) -> Self {
        self.n_heuristics = self.n_heuristics.max(n_heuristics);
        self
    }


    #[inline]
    fn from_raw(
        values: Vec<f32>,
        labels: Vec<usize>,
        heuristics: Vec<usize>,
    ) -> Self
    {
        let n_labels = labels.iter().max().map_or(0, |&y| y + 1);
        let n_heuristics = heuristics.iter().max().map_or(0, |&h| h + 1);

        Self { values, labels, heuristics, n_labels, n_heuristics, }
    }


    /// Returns the values of `feature` for all the samples.
    #[inline]
    pub fn column(&self, feature: usize) -> &[f32] {
        let n_sample = self.labels.len();
        &self.values[feature * n_sample..(feature + 1) * n_sample]
    }
}


impl DataSet for DenseDataSet {
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
        for (j, &f) in features.iter().enumerate() {
            let column = self.column(f);
            for (i, &s) in samples.iter().enumerate() {
                let k = if by_column { j * n_sample + i } else { i * n_feature + j };
                values[k] = column[s];
            }
        }
        Ok(())
    }


    #[inline]
    fn feature_value(&self, sample: usize, feature: usize) -> Result<f32> {
        Ok(self.column(feature)[sample])
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn toy() -> DenseDataSet {
        DenseDataSet::from_rows(
            vec![
                vec![0.0, 1.0, 2.0],
                vec![3.0, 4.0, 5.0],
            ],
            vec![1, 0],
            vec![0, 0, 1],
        ).unwrap()
    }

    #[test]
    fn shape() {
        let data = toy();
        assert_eq!(data.n_samples(), 2);
        assert_eq!(data.n_features(), 3);
        assert_eq!(data.n_labels(), 2);
        assert_eq!(data.n_heuristics(), 2);
        assert_eq!(data.features_by_heuristic(), vec![vec![0, 1], vec![2]]);
    }

    #[test]
    fn row_and_column_layouts() {
        let data = toy();
        let mut by_row = vec![0f32; 4];
        data.compute_features(&[1, 0], &[2, 0], &mut by_row, false).unwrap();
        assert_eq!(by_row, vec![5.0, 3.0, 2.0, 0.0]);

        let mut by_col = vec![0f32; 4];
        data.compute_features(&[1, 0], &[2, 0], &mut by_col, true).unwrap();
        assert_eq!(by_col, vec![5.0, 2.0, 3.0, 0.0]);
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let err = DenseDataSet::from_rows(
            vec![vec![0.0], vec![1.0, 2.0]], vec![0, 1], vec![0],
        ).unwrap_err();
        assert!(err.is_misuse());
    }

    #[test]
    fn empty_request_is_rejected() {
        let data = toy();
        let err = data.compute_features(&[], &[0], &mut [], true)
            .unwrap_err();
        assert!(matches!(err, BoostError::InvalidArgument(_)));
    }
}
