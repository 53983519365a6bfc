//! The files in `weak_learner/` directory define
//! the weak learner used by the boosting algorithm.

/// Defines the nodes of a `WeakTree`.
pub mod node;

/// Defines the `WeakTree` weak learner.
pub mod weak_tree;


pub use self::node::{Branch, Node, NodeRecord};
pub use self::weak_tree::WeakTree;
