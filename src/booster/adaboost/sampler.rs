//! Per-round feature sampling.
use rand::Rng;
use rand::seq::SliceRandom;


/// Draws, for each heuristic,
/// a sorted random subset of at most `k` of its features.
#[derive(Debug, Clone)]
pub(crate) struct FeatureSampler {
    heuristics: Vec<Vec<usize>>,
    k: usize,
}


impl FeatureSampler {
    /// `heuristics[h]` lists the features of heuristic `h`.
    pub(crate) fn new(heuristics: Vec<Vec<usize>>, k: usize) -> Self {
        Self { heuristics, k }
    }


    /// Appends the features of one round to `indices`.
    /// A heuristic with at most `k` features contributes all of them.
    pub(crate) fn sample_into<R>(&mut self, rng: &mut R, indices: &mut Vec<usize>)
        where R: Rng + ?Sized,
    {
        let k = self.k;
        for features in self.heuristics.iter_mut() {
            if features.len() > k {
                features.shuffle(rng);
                features[..k].sort_unstable();
                indices.extend_from_slice(&features[..k]);
            } else {
                indices.extend_from_slice(features);
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;


    #[test]
    fn samples_sorted_features_within_each_heuristic() {
        let heuristics = vec![(0..10).collect(), vec![10, 11], (12..20).collect()];
        let mut sampler = FeatureSampler::new(heuristics, 3);
        let mut rng = StdRng::seed_from_u64(7);

        let mut indices = Vec::new();
        sampler.sample_into(&mut rng, &mut indices);
        assert_eq!(indices.len(), 3 + 2 + 3);

        let (first, rest) = indices.split_at(3);
        assert!(first.windows(2).all(|w| w[0] < w[1]));
        assert!(first.iter().all(|&f| f < 10));
        assert_eq!(&rest[..2], &[10, 11]);
        assert!(rest[2..].iter().all(|&f| (12..20).contains(&f)));
    }


    #[test]
    fn same_seed_same_features() {
        let heuristics: Vec<Vec<usize>> = vec![(0..50).collect()];
        let draw = |seed| {
            let mut sampler = FeatureSampler::new(heuristics.clone(), 5);
            let mut rng = StdRng::seed_from_u64(seed);
            let mut indices = Vec::new();
            sampler.sample_into(&mut rng, &mut indices);
            sampler.sample_into(&mut rng, &mut indices);
            indices
        };
        assert_eq!(draw(42), draw(42));
    }
}
