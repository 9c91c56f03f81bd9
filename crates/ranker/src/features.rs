//! Feature registry consulted while resolving split features
//!
//! Models refer to features by name; the scoring engine addresses them by
//! ordinal within a fixed-width vector. A registry maps one onto the other.

use crate::errors::FeatureSetError;
use std::collections::HashMap;

/// Feature vector handed to the scoring engine, indexed by ordinal
pub type FeatureVector = Vec<f32>;

/// Name-to-ordinal lookup used by model parsers
pub trait FeatureRegistry {
    /// Ordinal of `name` within the feature vector
    fn feature_ordinal(&self, name: &str) -> Option<usize>;

    /// Width of the feature vector
    fn size(&self) -> usize;

    fn has_feature(&self, name: &str) -> bool {
        self.feature_ordinal(name).is_some()
    }
}

/// Ordered set of uniquely named features
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureSet {
    names: Vec<String>,
    ordinals: HashMap<String, usize>,
}

impl FeatureSet {
    /// Build a set where each name's ordinal is its position
    pub fn new<I, S>(names: I) -> Result<Self, FeatureSetError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = FeatureSet::default();
        for name in names {
            let name = name.into();
            if name.is_empty() {
                return Err(FeatureSetError::EmptyName(set.names.len()));
            }
            if set.ordinals.contains_key(&name) {
                return Err(FeatureSetError::Duplicate(name));
            }
            set.ordinals.insert(name.clone(), set.names.len());
            set.names.push(name);
        }
        Ok(set)
    }

    /// Parse one feature name per line, skipping blank lines and `#` comments
    pub fn from_lines(text: &str) -> Result<Self, FeatureSetError> {
        Self::new(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#')),
        )
    }

    pub fn name(&self, ordinal: usize) -> Option<&str> {
        self.names.get(ordinal).map(String::as_str)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl FeatureRegistry for FeatureSet {
    fn feature_ordinal(&self, name: &str) -> Option<usize> {
        self.ordinals.get(name).copied()
    }

    fn size(&self) -> usize {
        self.names.len()
    }
}
