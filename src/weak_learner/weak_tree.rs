//! Defines the `WeakTree` weak learner.
use rayon::prelude::*;

use crate::{BoostError, Result};
use crate::dataset::DataSet;
use crate::constants::WEAK_TREE_NAME;
use super::node::{Branch, Node, NodeRecord};

use std::cmp::Ordering;
use std::fmt;


/// A shallow decision tree minimizing a per-sample, per-label cost.
///
/// Given a `n_samples x n_labels` cost matrix,
/// each node predicts the label with the least total cost
/// and splits on the single feature threshold
/// that minimizes the cost of the two resulting predictions.
/// The nodes are stored in a flat array whose first element is the root.
///
/// # Example
/// ```no_run
/// use boostfarm::prelude::*;
///
/// let data = DenseDataSet::from_columns(
///     vec![vec![0.0, 1.0, 2.0, 3.0]],
///     vec![0, 0, 1, 1],
///     vec![0],
/// ).unwrap();
///
/// // Uniform costs: predicting the wrong label costs 1.
/// let costs = data.labels()
///     .into_iter()
///     .map(|y| if y == 0 { vec![-1.0, 1.0] } else { vec![1.0, -1.0] })
///     .collect::<Vec<_>>();
///
/// let mut tree = WeakTree::new(1);
/// tree.train(&data, &costs).unwrap();
/// assert_eq!(tree.classify(&data, 3).unwrap(), 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct WeakTree {
    max_depth: usize,
    nodes: Vec<Node>,
}


/// Best split found over one feature.
#[derive(Clone, Copy)]
struct Candidate {
    weight: f64,
    split: f32,
    labels: [usize; 2],
}


impl WeakTree {
    /// Returns an untrained tree.
    /// A `max_depth` of `0` means `ceil(log2(#labels))`.
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth, nodes: Vec::new() }
    }


    /// Rebuilds a tree from its serialized nodes.
    pub(crate) fn from_records(
        max_depth: usize,
        records: &[NodeRecord],
    ) -> Result<Self>
    {
        let n_nodes = records.len();
        let nodes = records.iter()
            .enumerate()
            .map(|(i, record)| Node::from_record(record, i, n_nodes))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { max_depth, nodes })
    }


    /// Returns the serialized nodes.
    pub(crate) fn records(&self) -> Vec<NodeRecord> {
        self.nodes.iter().map(NodeRecord::from).collect()
    }


    /// Returns the name of this weak learner.
    pub fn name(&self) -> &str {
        WEAK_TREE_NAME
    }


    /// Returns the configured maximal depth.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }


    /// Returns the nodes, root first.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes[..]
    }


    /// Returns `true` if the tree has been trained (or loaded).
    pub fn is_trained(&self) -> bool {
        !self.nodes.is_empty()
    }


    /// Returns the depth used for a problem with `n_labels` labels.
    pub fn depth_for(&self, n_labels: usize) -> usize {
        if self.max_depth > 0 {
            return self.max_depth;
        }
        let depth = (n_labels.max(1) as f64).log2().ceil() as usize;
        depth.max(1)
    }


    /// Grows the tree on `dataset` so as to minimize the costs `weights`,
    /// where `weights[s][l]` is the cost of predicting `l` for sample `s`.
    /// A previously trained tree is discarded.
    pub fn train<D>(&mut self, dataset: &D, weights: &[Vec<f64>])
        -> Result<()>
        where D: DataSet + ?Sized,
    {
        let n_sample = dataset.n_samples();
        let n_feature = dataset.n_features();
        let n_label = dataset.n_labels();

        if weights.len() != n_sample {
            return Err(BoostError::logic(format!(
                "{} rows of weights for {n_sample} samples",
                weights.len(),
            )));
        }
        if weights.iter().any(|row| row.len() != n_label) {
            return Err(BoostError::invalid(format!(
                "every row of weights must hold {n_label} labels"
            )));
        }

        // Feature-contiguous copy of the whole view.
        let samples = (0..n_sample).collect::<Vec<_>>();
        let features = (0..n_feature).collect::<Vec<_>>();
        let mut columns = vec![0f32; n_sample * n_feature];
        dataset.compute_features(&samples, &features, &mut columns, true)?;

        let trainer = TreeTrainer {
            columns: &columns[..],
            weights,
            n_sample,
            n_feature,
            n_label,
        };

        self.nodes.clear();
        let mut indices = samples;
        let depth = self.depth_for(n_label);
        trainer.grow(&mut self.nodes, &mut indices[..], depth);
        Ok(())
    }


    /// Predicts the label of `sample`.
    ///
    /// Calling this method on an untrained tree is a logic error.
    pub fn classify<D>(&self, dataset: &D, sample: usize) -> Result<usize>
        where D: DataSet + ?Sized,
    {
        if self.nodes.is_empty() {
            return Err(BoostError::logic("the weak learner was not trained"));
        }

        let mut current = 0;
        loop {
            let node = self.nodes.get(current)
                .ok_or_else(|| BoostError::logic(format!(
                    "node {current} is not part of the tree"
                )))?;
            let value = dataset.feature_value(sample, node.feature)?;
            match node.branch(value) {
                Branch::Leaf(label) => return Ok(label),
                Branch::Child(child) => current = child,
            }
        }
    }


    /// Rewrites the feature index of every node through `mapping`.
    pub fn remap(&mut self, mapping: &[usize]) {
        self.nodes.iter_mut()
            .for_each(|node| {
                node.feature = mapping[node.feature];
            });
    }


    /// Appends the feature index of every node to `features`.
    pub fn report(&self, features: &mut Vec<usize>) {
        features.extend(self.nodes.iter().map(|node| node.feature));
    }


    /// Returns a displayable view of this tree
    /// whose feature indices are translated through `mapping`.
    pub fn display_mapped<'a>(&'a self, mapping: &'a [usize])
        -> impl fmt::Display + 'a
    {
        MappedTree { tree: self, mapping: Some(mapping) }
    }
}


struct TreeTrainer<'a> {
    columns: &'a [f32],
    weights: &'a [Vec<f64>],
    n_sample: usize,
    n_feature: usize,
    n_label: usize,
}


impl TreeTrainer<'_> {
    #[inline]
    fn column(&self, feature: usize) -> &[f32] {
        let start = feature * self.n_sample;
        &self.columns[start..start + self.n_sample]
    }


    /// Grows the subtree over the samples in `indices`.
    /// Returns `false` if no node was added.
    fn grow(&self, nodes: &mut Vec<Node>, indices: &mut [usize], depth: usize)
        -> bool
    {
        let mut sums = vec![0f64; self.n_label];
        for &s in indices.iter() {
            sums.iter_mut()
                .zip(&self.weights[s])
                .for_each(|(sum, w)| { *sum += w; });
        }

        let label = argmin(&sums);
        let constant = sums[label];

        let view: &[usize] = indices;
        let best = (0..self.n_feature).into_par_iter()
            .map(|f| self.best_split(f, view, &sums))
            .collect::<Vec<_>>()
            .into_iter()
            .enumerate()
            .filter_map(|(f, candidate)| candidate.map(|c| (f, c)))
            .fold(None, |best: Option<(usize, Candidate)>, (f, c)| {
                match best {
                    Some((_, b)) if b.weight <= c.weight => best,
                    _ => Some((f, c)),
                }
            })
            .filter(|(_, c)| c.weight < constant);

        let node = match best {
            Some((feature, c)) => Node {
                feature,
                split: c.split,
                branches: [Branch::Leaf(c.labels[0]), Branch::Leaf(c.labels[1])],
            },
            None if !nodes.is_empty() => return false,
            None => Node::constant(label),
        };

        let index = nodes.len();
        nodes.push(node);

        if depth <= 1 {
            return true;
        }

        let column = self.column(node.feature);
        let mut n_left = 0;
        for i in 0..indices.len() {
            if column[indices[i]] < node.split {
                indices.swap(n_left, i);
                n_left += 1;
            }
        }

        let (left, right) = indices.split_at_mut(n_left);
        for (side, part) in [left, right].into_iter().enumerate() {
            let child = nodes.len();
            if self.grow(nodes, part, depth - 1) {
                nodes[index].branches[side] = Branch::Child(child);
            }
        }
        true
    }


    /// Sweeps the samples sorted by `feature` and returns the split
    /// of least cost, if the feature takes two distinct values.
    fn best_split(&self, feature: usize, indices: &[usize], sums: &[f64])
        -> Option<Candidate>
    {
        let column = self.column(feature);
        let mut sorted = indices.to_vec();
        sorted.sort_by(|&a, &b| column[a].total_cmp(&column[b]));

        let mut partial = vec![0f64; self.n_label];
        let mut right = vec![0f64; self.n_label];
        let mut best: Option<Candidate> = None;

        for pair in sorted.windows(2) {
            let (index, next) = (pair[0], pair[1]);
            partial.iter_mut()
                .zip(&self.weights[index])
                .for_each(|(p, w)| { *p += w; });

            // Split only between two distinct values.
            let (value, next_value) = (column[index], column[next]);
            if value.partial_cmp(&next_value) != Some(Ordering::Less) {
                continue;
            }

            right.iter_mut()
                .zip(sums.iter().zip(&partial))
                .for_each(|(r, (s, p))| { *r = s - p; });

            let l = argmin(&partial);
            let r = argmin(&right);
            let weight = partial[l] + right[r];

            if best.map_or(true, |b| weight < b.weight) {
                best = Some(Candidate {
                    weight,
                    split: (value + next_value) * 0.5,
                    labels: [l, r],
                });
            }
        }
        best
    }
}


/// Index of the first minimum of `values`.
#[inline]
fn argmin(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate().skip(1) {
        if *v < values[best] {
            best = i;
        }
    }
    best
}


struct MappedTree<'a> {
    tree: &'a WeakTree,
    mapping: Option<&'a [usize]>,
}


impl MappedTree<'_> {
    fn fmt_node(&self, f: &mut fmt::Formatter, index: usize, depth: usize)
        -> fmt::Result
    {
        let node = &self.tree.nodes[index];
        let feature = self.mapping.map_or(node.feature, |m| m[node.feature]);

        for (side, op) in [" <", ">="].into_iter().enumerate() {
            writeln!(f)?;
            for _ in 0..depth {
                write!(f, "|\t")?;
            }
            write!(f, "feature {feature} {op} {}:", node.split)?;
            match node.branches[side] {
                Branch::Leaf(label) => write!(f, " {label}")?,
                Branch::Child(child) => self.fmt_node(f, child, depth + 1)?,
            }
        }
        Ok(())
    }
}


impl fmt::Display for MappedTree<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} classifier (#nodes: {}, max depth: {})",
            WEAK_TREE_NAME, self.tree.nodes.len(), self.tree.max_depth,
        )?;
        if !self.tree.nodes.is_empty() {
            self.fmt_node(f, 0, 0)?;
        }
        Ok(())
    }
}


impl fmt::Display for WeakTree {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        MappedTree { tree: self, mapping: None }.fmt(f)
    }
}
