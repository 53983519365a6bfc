//! Defines the inner representation of a [`WeakTree`](super::WeakTree).
use serde::{Serialize, Deserialize};

use crate::{BoostError, Result};


/// One side of a tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    /// A terminal prediction.
    Leaf(usize),


    /// Index of a child node in the flat node array.
    Child(usize),
}


/// A split `value < split` (left) / `value >= split` (right)
/// over a single feature.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node {
    /// Index of the tested feature.
    pub feature: usize,
    /// Threshold of the split.
    pub split: f32,
    /// The left (`value < split`) and right (`value >= split`) branches.
    pub branches: [Branch; 2],
}


impl Node {
    /// A node predicting `label` on both sides.
    #[inline]
    pub(crate) fn constant(label: usize) -> Self {
        Self {
            feature: 0,
            split: 0.0,
            branches: [Branch::Leaf(label); 2],
        }
    }


    /// Returns the branch followed by a sample whose feature value is `value`.
    #[inline]
    pub fn branch(&self, value: f32) -> Branch {
        self.branches[(value >= self.split) as usize]
    }


    /// Converts a serialized node back.
    /// `index` is the position of the node in a tree of `n_nodes` nodes.
    /// Children must come after their parent so that
    /// descending the tree always terminates.
    pub(crate) fn from_record(
        record: &NodeRecord,
        index: usize,
        n_nodes: usize,
    ) -> Result<Self>
    {
        let mut branches = [Branch::Leaf(0); 2];
        for (branch, &label) in branches.iter_mut().zip(&record.labels) {
            *branch = if label >= 0 {
                Branch::Leaf(label as usize)
            } else {
                let child = label.unsigned_abs() as usize;
                if child <= index || child >= n_nodes {
                    return Err(BoostError::format(format!(
                        "node {index} links to an invalid child {child}"
                    )));
                }
                Branch::Child(child)
            };
        }

        Ok(Self { feature: record.feature, split: record.split, branches })
    }
}


/// The serialized form of a [`Node`].
///
/// A non-negative entry of `labels` is a terminal label,
/// a negative one is the opposite of the index of a child node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Index of the tested feature.
    pub feature: usize,
    /// Threshold of the split.
    pub split: f32,
    /// Left and right links.
    pub labels: [i64; 2],
}


impl From<&Node> for NodeRecord {
    #[inline]
    fn from(node: &Node) -> Self {
        let labels = node.branches.map(|branch| match branch {
            Branch::Leaf(label) => label as i64,
            Branch::Child(child) => -(child as i64),
        });
        Self { feature: node.feature, split: node.split, labels }
    }
}


#[cfg(test)]
mod tests {
    use super::*;


    #[test]
    fn records_encode_children_as_negative_indices() {
        let node = Node {
            feature: 3,
            split: 0.5,
            branches: [Branch::Child(1), Branch::Leaf(2)],
        };
        let record = NodeRecord::from(&node);
        assert_eq!(record.labels, [-1, 2]);
        assert_eq!(Node::from_record(&record, 0, 2).unwrap(), node);
    }


    #[test]
    fn backward_links_are_rejected() {
        let record = NodeRecord { feature: 0, split: 0.0, labels: [-1, 0] };
        assert!(Node::from_record(&record, 1, 3).is_err());
        assert!(Node::from_record(&record, 0, 1).is_err());
    }


    #[test]
    fn inclusive_boundary_goes_right() {
        let node = Node {
            feature: 0,
            split: 1.0,
            branches: [Branch::Leaf(0), Branch::Leaf(1)],
        };
        assert_eq!(node.branch(0.999), Branch::Leaf(0));
        assert_eq!(node.branch(1.0), Branch::Leaf(1));
    }
}
