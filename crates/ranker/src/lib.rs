//! Learning-to-rank model loading
//!
//! Loads tree ensembles exported by third-party trainers into an immutable
//! forest that a scoring engine can evaluate against a feature vector.
//! Malformed models are rejected with a located, typed error rather than
//! turned into trees that silently score wrong.
//!
//! Modules:
//! - `parser`: Model parsers (XGBoost JSON) and the media-type registry
//! - `dectree`: Split/leaf nodes and the additive forest they form
//! - `features`: Feature-name registry consulted while parsing
//! - `config`: Loader and logging configuration
//! - `errors`: Error types and their categories

pub mod config;
pub mod dectree;
pub mod errors;
pub mod features;
pub mod parser;

pub use config::{AppConfig, LoaderConfig, LogFormat, LoggingConfig};
pub use dectree::{Leaf, NaiveAdditiveDecisionTree, Node, Split};
pub use errors::{
    ConfigError, ErrorKind, FeatureSetError, Location, ModelError, NodeError, ParseError,
};
pub use features::{FeatureRegistry, FeatureSet, FeatureVector};
pub use parser::{ParserFactory, RankerParser, XGBoostJsonParser};

/// Crate version string
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Parse an XGBoost JSON model with the default loader settings
pub fn parse_xgboost_json(
    registry: &dyn FeatureRegistry,
    model: &str,
) -> errors::Result<NaiveAdditiveDecisionTree> {
    XGBoostJsonParser::default().parse(registry, model)
}
