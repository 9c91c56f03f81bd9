//! Additive forest of decision trees
//!
//! The score of a feature vector is the weighted sum of the leaf outputs each
//! tree routes it to.

use super::tree::Node;
use crate::errors::ModelError;

/// Weighted forest with a fixed feature-vector width
#[derive(Debug, Clone, PartialEq)]
pub struct NaiveAdditiveDecisionTree {
    trees: Vec<Node>,
    weights: Vec<f32>,
    num_features: usize,
}

impl NaiveAdditiveDecisionTree {
    /// Assemble a forest, checking that weights pair up with trees and that
    /// every split addresses a slot of the feature vector
    pub fn new(
        trees: Vec<Node>,
        weights: Vec<f32>,
        num_features: usize,
    ) -> Result<Self, ModelError> {
        let forest = Self {
            trees,
            weights,
            num_features,
        };
        forest.validate()?;
        Ok(forest)
    }

    /// Assemble a forest whose trees all weigh 1.0
    pub fn with_unit_weights(trees: Vec<Node>, num_features: usize) -> Result<Self, ModelError> {
        let weights = vec![1.0; trees.len()];
        Self::new(trees, weights, num_features)
    }

    fn validate(&self) -> Result<(), ModelError> {
        if self.trees.len() != self.weights.len() {
            return Err(ModelError::WeightCountMismatch {
                trees: self.trees.len(),
                weights: self.weights.len(),
            });
        }

        for (i, tree) in self.trees.iter().enumerate() {
            if let Some(ordinal) = tree.max_feature() {
                if ordinal >= self.num_features {
                    return Err(ModelError::FeatureOutOfRange {
                        tree: i,
                        ordinal,
                        num_features: self.num_features,
                    });
                }
            }
        }

        Ok(())
    }

    /// Score one feature vector
    pub fn score(&self, features: &[f32]) -> Result<f32, ModelError> {
        if features.len() != self.num_features {
            return Err(ModelError::FeatureCountMismatch {
                expected: self.num_features,
                actual: features.len(),
            });
        }

        Ok(self
            .trees
            .iter()
            .zip(&self.weights)
            .map(|(tree, weight)| weight * tree.eval(features))
            .sum())
    }

    pub fn trees(&self) -> &[Node] {
        &self.trees
    }

    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    pub fn num_features(&self) -> usize {
        self.num_features
    }

    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn num_nodes(&self) -> usize {
        self.trees.iter().map(Node::num_nodes).sum()
    }

    pub fn max_depth(&self) -> usize {
        self.trees.iter().map(Node::max_depth).max().unwrap_or(0)
    }

    /// Split into trees, weights and feature-vector width
    pub fn into_parts(self) -> (Vec<Node>, Vec<f32>, usize) {
        (self.trees, self.weights, self.num_features)
    }
}
