//! Additive decision-tree ensembles
//!
//! Loaders produce a [`NaiveAdditiveDecisionTree`]: an ordered list of root
//! [`Node`]s, one weight per tree, and the width of the feature vector the
//! trees index into. The structure is immutable once built and can be shared
//! across threads for scoring.
//!
//! # Usage
//!
//! ```rust
//! use ltr_ranker::dectree::{NaiveAdditiveDecisionTree, Node};
//!
//! // if f0 < 0.5 then 1.0 else -1.0
//! let tree = Node::split(0, 0.5, Node::leaf(1.0), Node::leaf(-1.0));
//! let forest = NaiveAdditiveDecisionTree::with_unit_weights(vec![tree], 1).unwrap();
//!
//! assert_eq!(forest.score(&[0.2]).unwrap(), 1.0);
//! assert_eq!(forest.score(&[0.9]).unwrap(), -1.0);
//! ```

pub mod model;
pub mod tree;

pub use model::NaiveAdditiveDecisionTree;
pub use tree::{Leaf, Node, Split};
