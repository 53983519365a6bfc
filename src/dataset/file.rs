use crate::{BoostError, Result};
use crate::constants::{
    FILE_DATASET_HEADER_BYTES,
    FILE_DATASET_VERSION,
    MAX_CACHE_SIZE,
};
use super::dataset_trait::{DataSet, check_request};

use std::cell::RefCell;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom, Write};
use std::path::Path;


const SCALAR_BYTES: u64 = std::mem::size_of::<f32>() as u64;


/// A dataset stored in a binary file and read on demand.
///
/// The file layout (all values little-endian) is:
/// ```text
/// u32 version (0x00010002)
/// u32 #samples, u32 #features, u32 #labels, u32 #heuristics
/// f32 values[#features][#samples]   feature-major
/// u32 labels[#samples]
/// u32 heuristics[#features]
/// ```
/// Only the labels and heuristics are kept in memory;
/// the values of a feature are read each time they are requested,
/// so this dataset is usually wrapped in a [`DataSetCache`].
///
/// [`DataSetCache`]: crate::dataset::DataSetCache
#[derive(Debug)]
pub struct FileDataSet<R> {
    reader: RefCell<R>,
    labels: Vec<usize>,
    heuristics: Vec<usize>,
    n_labels: usize,
    n_heuristics: usize,
}


impl FileDataSet<BufReader<File>> {
    /// Opens the dataset file at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }


    /// Writes `dataset` to `writer` in the format [`FileDataSet`] reads.
    /// See [`write_file_dataset`].
    pub fn save<D, W>(dataset: &D, writer: &mut W) -> Result<()>
        where D: DataSet + ?Sized,
              W: Write,
    {
        write_file_dataset(dataset, writer)
    }
}


impl<R> FileDataSet<R>
    where R: Read + Seek,
{
    /// Reads the header, the labels, and the heuristics from `reader`.
    pub fn from_reader(mut reader: R) -> Result<Self> {
        reader.seek(SeekFrom::Start(0))?;
        let header = read_u32s(&mut reader, 5)?;

        if header[0] != FILE_DATASET_VERSION as usize {
            return Err(BoostError::format("invalid dataset file version"));
        }

        let (n_sample, n_feature) = (header[1], header[2]);
        let (n_labels, n_heuristics) = (header[3], header[4]);
        if n_sample < 2 || n_feature == 0 || n_labels < 2 || n_heuristics == 0 {
            return Err(BoostError::format(
                "a valid dataset must contain at least 2 samples, \
                1 feature, 2 labels, and 1 heuristic"
            ));
        }

        let data = n_sample as u64 * n_feature as u64 * SCALAR_BYTES;
        let expected = FILE_DATASET_HEADER_BYTES
            + data
            + (n_sample + n_feature) as u64 * 4;
        let size = reader.seek(SeekFrom::End(0))?;
        if size < expected {
            return Err(BoostError::format(format!(
                "incomplete dataset file ({size} bytes, {expected} expected)"
            )));
        }

        reader.seek(SeekFrom::Start(FILE_DATASET_HEADER_BYTES + data))?;
        let labels = read_u32s(&mut reader, n_sample)?;
        let heuristics = read_u32s(&mut reader, n_feature)?;

        Ok(Self {
            reader: RefCell::new(reader),
            labels,
            heuristics,
            n_labels,
            n_heuristics,
        })
    }


    #[inline]
    fn read_feature(&self, feature: usize, buffer: &mut [u8]) -> Result<()> {
        let stride = self.labels.len() as u64 * SCALAR_BYTES;
        let offset = FILE_DATASET_HEADER_BYTES + feature as u64 * stride;

        let mut reader = self.reader.borrow_mut();
        reader.seek(SeekFrom::Start(offset))
            .and_then(|_| reader.read_exact(buffer))
            .map_err(|e| BoostError::FeatureComputation(format!(
                "cannot read feature {feature}: {e}"
            )))
    }
}


impl<R> DataSet for FileDataSet<R>
    where R: Read + Seek,
{
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
        let mut buffer = vec![0u8; self.labels.len() * SCALAR_BYTES as usize];

        for (j, &f) in features.iter().enumerate() {
            self.read_feature(f, &mut buffer)?;
            for (i, &s) in samples.iter().enumerate() {
                let k = if by_column { j * n_sample + i } else { i * n_feature + j };
                values[k] = scalar_at(&buffer, s);
            }
        }
        Ok(())
    }
}


/// Writes `dataset` to `writer` in the [`FileDataSet`] format.
///
/// The features are computed by batches that fit in the default
/// cache budget.
pub fn write_file_dataset<D, W>(dataset: &D, writer: &mut W) -> Result<()>
    where D: DataSet + ?Sized,
          W: Write,
{
    let n_sample = dataset.n_samples();
    let n_feature = dataset.n_features();
    if n_sample == 0 || n_feature == 0 {
        return Err(BoostError::invalid("cannot save an empty dataset"));
    }

    let header = [
        FILE_DATASET_VERSION as usize,
        n_sample,
        n_feature,
        dataset.n_labels(),
        dataset.n_heuristics(),
    ];
    write_u32s(writer, &header)?;

    let batch = (MAX_CACHE_SIZE / n_sample).clamp(1, n_feature);
    let samples = (0..n_sample).collect::<Vec<_>>();
    let mut values = vec![0f32; n_sample * batch];

    for start in (0..n_feature).step_by(batch) {
        let end = (start + batch).min(n_feature);
        let features = (start..end).collect::<Vec<_>>();
        let values = &mut values[..n_sample * features.len()];

        dataset.compute_features(&samples, &features, values, true)?;

        let bytes = values.iter()
            .flat_map(|v| v.to_le_bytes())
            .collect::<Vec<u8>>();
        writer.write_all(&bytes)?;
    }

    write_u32s(writer, &dataset.labels())?;
    let heuristics = (0..n_feature)
        .map(|f| dataset.heuristic(f))
        .collect::<Vec<_>>();
    write_u32s(writer, &heuristics)?;
    writer.flush()?;
    Ok(())
}


#[inline]
fn scalar_at(buffer: &[u8], index: usize) -> f32 {
    let k = index * SCALAR_BYTES as usize;
    f32::from_le_bytes([buffer[k], buffer[k + 1], buffer[k + 2], buffer[k + 3]])
}


fn read_u32s<R: Read>(reader: &mut R, count: usize) -> Result<Vec<usize>> {
    let mut bytes = vec![0u8; count * 4];
    reader.read_exact(&mut bytes)?;
    let values = bytes.chunks_exact(4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]) as usize)
        .collect();
    Ok(values)
}


fn write_u32s<W: Write>(writer: &mut W, values: &[usize]) -> Result<()> {
    let mut bytes = Vec::with_capacity(values.len() * 4);
    for &v in values {
        let v = u32::try_from(v)
            .map_err(|_| BoostError::invalid(format!(
                "{v} does not fit in the dataset file format"
            )))?;
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    writer.write_all(&bytes)?;
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::DenseDataSet;
    use std::io::Cursor;


    fn toy() -> DenseDataSet {
        DenseDataSet::from_columns(
            vec![
                vec![0.5, 1.5, -2.0],
                vec![3.0, 4.0, 5.0],
                vec![-1.0, 0.0, 1.0],
            ],
            vec![0, 1, 1],
            vec![0, 0, 1],
        ).unwrap()
    }


    #[test]
    fn file_round_trip() {
        let dense = toy();
        let mut bytes = Vec::new();
        write_file_dataset(&dense, &mut bytes).unwrap();

        let mut saved = Vec::new();
        FileDataSet::save(&dense, &mut saved).unwrap();
        assert_eq!(bytes, saved);

        let file = FileDataSet::from_reader(Cursor::new(bytes)).unwrap();
        assert_eq!(file.n_samples(), 3);
        assert_eq!(file.n_features(), 3);
        assert_eq!(file.labels(), vec![0, 1, 1]);
        assert_eq!(file.heuristic(2), 1);

        let mut values = vec![0f32; 4];
        file.compute_features(&[2, 0], &[1, 0], &mut values, false).unwrap();
        assert_eq!(values, vec![5.0, -2.0, 3.0, 0.5]);
    }


    #[test]
    fn truncated_file_is_rejected() {
        let mut bytes = Vec::new();
        write_file_dataset(&toy(), &mut bytes).unwrap();
        bytes.truncate(bytes.len() - 4);

        let err = FileDataSet::from_reader(Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, BoostError::Format(_)));
    }


    #[test]
    fn wrong_version_is_rejected() {
        let mut bytes = Vec::new();
        write_file_dataset(&toy(), &mut bytes).unwrap();
        bytes[0] ^= 0xff;

        let err = FileDataSet::from_reader(Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, BoostError::Format(_)));
    }
}
