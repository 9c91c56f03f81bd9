//! Error types for the ranker crate

use std::fmt;
use thiserror::Error;

/// Position in the model text where a failure was detected (1-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Broad category of a load failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Not well-formed JSON, wrong member types, unknown members or I/O failure
    Syntax,
    /// Top-level value is not an array
    Shape,
    /// A split or leaf lacks fields required for its kind
    MissingFields,
    /// Declared `yes`/`no` ids do not match the children, in order
    Linkage,
    /// A split names a feature the registry does not know
    UnknownFeature,
    /// The assembled forest violates the ensemble invariants
    Model,
}

/// Validation failures raised while building a single node
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NodeError {
    /// Split lacks required members
    #[error("This split does not have all the required fields, missing {missing:?}")]
    MissingSplitFields { missing: Vec<&'static str> },

    /// Leaf lacks its `nodeid`
    #[error("This leaf does not have all the required fields, missing {missing:?}")]
    MissingLeafFields { missing: Vec<&'static str> },

    /// `yes`/`no` ids disagree with the children's ids
    #[error(
        "Split structure is invalid, yes [{yes}] and no [{no}] do not point to the children [{left}, {right}]"
    )]
    ChildLinkage { yes: i32, no: i32, left: i32, right: i32 },

    /// Split names a feature the registry does not resolve
    #[error("Unknown feature [{0}]")]
    UnknownFeature(String),
}

impl NodeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            NodeError::MissingSplitFields { .. } | NodeError::MissingLeafFields { .. } => {
                ErrorKind::MissingFields
            }
            NodeError::ChildLinkage { .. } => ErrorKind::Linkage,
            NodeError::UnknownFeature(_) => ErrorKind::UnknownFeature,
        }
    }
}

/// Ensemble-level invariant violations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    /// Tree and weight lists differ in length
    #[error("Model has {trees} trees but {weights} weights")]
    WeightCountMismatch { trees: usize, weights: usize },

    /// A split reads past the feature vector
    #[error("Tree {tree} splits on feature ordinal {ordinal} but the model has {num_features} features")]
    FeatureOutOfRange {
        tree: usize,
        ordinal: usize,
        num_features: usize,
    },

    /// Score input has the wrong width
    #[error("Expected {expected} feature values, got {actual}")]
    FeatureCountMismatch { expected: usize, actual: usize },
}

/// Errors raised while loading a forest
#[derive(Error, Debug)]
pub enum ParseError {
    /// Malformed JSON or a mistyped member
    #[error("Cannot parse model: {0}")]
    Json(#[source] serde_json::Error),

    /// Reading the model source failed
    #[error("Cannot read model: {0}")]
    Io(#[from] std::io::Error),

    /// Top-level value is not an array
    #[error("[{location}] Expected [START_ARRAY] but got [{found}]")]
    NotAnArray {
        found: &'static str,
        location: Location,
    },

    /// A node failed validation
    #[error("[{location}] {source}")]
    InvalidNode {
        #[source]
        source: NodeError,
        location: Location,
    },

    /// Assembled forest is inconsistent
    #[error(transparent)]
    Model(#[from] ModelError),
}

impl ParseError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ParseError::Json(_) | ParseError::Io(_) => ErrorKind::Syntax,
            ParseError::NotAnArray { .. } => ErrorKind::Shape,
            ParseError::InvalidNode { source, .. } => source.kind(),
            ParseError::Model(_) => ErrorKind::Model,
        }
    }

    /// Where in the text the failure was detected, when the decoder knows
    pub fn location(&self) -> Option<Location> {
        match self {
            ParseError::Json(err) if err.line() > 0 => Some(Location {
                line: err.line(),
                column: err.column(),
            }),
            ParseError::NotAnArray { location, .. } | ParseError::InvalidNode { location, .. } => {
                Some(*location)
            }
            _ => None,
        }
    }

    /// The node-level cause, for validation failures
    pub fn node_error(&self) -> Option<&NodeError> {
        match self {
            ParseError::InvalidNode { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Feature registry construction errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeatureSetError {
    /// Name appears more than once
    #[error("Duplicate feature [{0}]")]
    Duplicate(String),

    /// Blank feature name
    #[error("Feature at ordinal {0} has an empty name")]
    EmptyName(usize),
}

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid TOML
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Config values failed validation
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Result type for forest loading
pub type Result<T> = std::result::Result<T, ParseError>;
