//! Model parsers and the media-type registry that selects them

pub mod xgboost;

pub use xgboost::XGBoostJsonParser;

use crate::dectree::NaiveAdditiveDecisionTree;
use crate::errors::Result;
use crate::features::FeatureRegistry;
use std::collections::BTreeMap;
use std::fmt;

/// Turns a serialized model into a scorable forest
pub trait RankerParser: Send + Sync {
    /// Media type of the models this parser accepts
    fn media_type(&self) -> &'static str;

    fn parse(&self, registry: &dyn FeatureRegistry, model: &str)
        -> Result<NaiveAdditiveDecisionTree>;
}

/// Parsers keyed by media type
pub struct ParserFactory {
    parsers: BTreeMap<&'static str, Box<dyn RankerParser>>,
}

impl ParserFactory {
    /// A factory with no parsers registered
    pub fn empty() -> Self {
        Self {
            parsers: BTreeMap::new(),
        }
    }

    /// Register a parser, replacing any previous one for the same media type
    pub fn register(&mut self, parser: Box<dyn RankerParser>) -> Option<Box<dyn RankerParser>> {
        self.parsers.insert(parser.media_type(), parser)
    }

    pub fn get(&self, media_type: &str) -> Option<&dyn RankerParser> {
        self.parsers.get(media_type).map(|parser| &**parser)
    }

    pub fn media_types(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.parsers.keys().copied()
    }
}

impl Default for ParserFactory {
    fn default() -> Self {
        let mut factory = Self::empty();
        factory.register(Box::new(XGBoostJsonParser::default()));
        factory
    }
}

impl fmt::Debug for ParserFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.media_types()).finish()
    }
}
