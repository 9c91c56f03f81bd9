//! XGBoost JSON model parser
//!
//! Reads the tree dump produced by `xgboost.Booster.get_dump(dump_format="json")`
//! (as emitted by the mjolnir training pipeline): a JSON array whose elements
//! are recursive node objects.
//!
//! ```json
//! [
//!   {"nodeid": 0, "depth": 0, "split": "f0", "split_condition": 0.5,
//!    "yes": 1, "no": 2, "missing": 1,
//!    "children": [
//!      {"nodeid": 1, "leaf": 1.0},
//!      {"nodeid": 2, "leaf": -1.0}
//!    ]}
//! ]
//! ```
//!
//! Per-tree scaling is already baked into leaf outputs by the trainer, so
//! every tree is given a weight of 1.0. The `missing` branch is read but not
//! used when scoring.

mod node;

use self::node::{DecodeContext, Failure, NodeSeed};
use super::RankerParser;
use crate::config::LoaderConfig;
use crate::dectree::{NaiveAdditiveDecisionTree, Node};
use crate::errors::{Location, ParseError, Result};
use crate::features::FeatureRegistry;
use serde::de::{self, DeserializeSeed, MapAccess, SeqAccess, Visitor};
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use tracing::debug;

/// Parser for `model/xgboost+json` models
#[derive(Debug, Clone, Default)]
pub struct XGBoostJsonParser {
    config: LoaderConfig,
}

impl XGBoostJsonParser {
    pub const TYPE: &'static str = "model/xgboost+json";

    pub fn new(config: LoaderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Parse a model from its JSON text
    pub fn parse(
        &self,
        registry: &dyn FeatureRegistry,
        model: &str,
    ) -> Result<NaiveAdditiveDecisionTree> {
        let mut de = serde_json::Deserializer::from_str(model);
        self.decode(registry, &mut de)
    }

    /// Parse a model from a byte stream
    pub fn parse_reader<R: io::Read>(
        &self,
        registry: &dyn FeatureRegistry,
        reader: R,
    ) -> Result<NaiveAdditiveDecisionTree> {
        let mut de = serde_json::Deserializer::from_reader(reader);
        self.decode(registry, &mut de)
    }

    /// Parse a model stored in a file
    pub fn load_file<P: AsRef<Path>>(
        &self,
        registry: &dyn FeatureRegistry,
        path: P,
    ) -> Result<NaiveAdditiveDecisionTree> {
        let model = fs::read_to_string(path)?;
        self.parse(registry, &model)
    }

    fn decode<'de, R>(
        &self,
        registry: &dyn FeatureRegistry,
        de: &mut serde_json::Deserializer<R>,
    ) -> Result<NaiveAdditiveDecisionTree>
    where
        R: serde_json::de::Read<'de>,
    {
        let ctx = DecodeContext::new(registry, self.config.ignore_unknown_fields);

        let trees = ForestSeed { ctx: &ctx }
            .deserialize(&mut *de)
            .map_err(|err| classify(&ctx, err))?;
        de.end().map_err(ParseError::Json)?;

        // Tree weights are already encoded in leaf outputs
        let forest = NaiveAdditiveDecisionTree::with_unit_weights(trees, registry.size())?;
        debug!(
            trees = forest.num_trees(),
            nodes = forest.num_nodes(),
            num_features = forest.num_features(),
            "parsed xgboost forest"
        );
        Ok(forest)
    }
}

impl RankerParser for XGBoostJsonParser {
    fn media_type(&self) -> &'static str {
        Self::TYPE
    }

    fn parse(
        &self,
        registry: &dyn FeatureRegistry,
        model: &str,
    ) -> Result<NaiveAdditiveDecisionTree> {
        XGBoostJsonParser::parse(self, registry, model)
    }
}

/// Attach the captured validation failure, if any, to a decoder error
fn classify(ctx: &DecodeContext<'_>, err: serde_json::Error) -> ParseError {
    let location = Location {
        line: err.line(),
        column: err.column(),
    };
    match ctx.take_failure() {
        Some(Failure::Node(source)) => ParseError::InvalidNode { source, location },
        Some(Failure::NotAnArray(found)) => ParseError::NotAnArray { found, location },
        None => ParseError::Json(err),
    }
}

/// Decodes the top-level array of trees
struct ForestSeed<'c, 'a> {
    ctx: &'c DecodeContext<'a>,
}

impl<'c, 'a> ForestSeed<'c, 'a> {
    fn not_an_array<T, E: de::Error>(self, found: &'static str) -> std::result::Result<T, E> {
        Err(self.ctx.fail(Failure::NotAnArray(found)))
    }
}

impl<'de, 'c, 'a> DeserializeSeed<'de> for ForestSeed<'c, 'a> {
    type Value = Vec<Node>;

    fn deserialize<D>(self, deserializer: D) -> std::result::Result<Self::Value, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        deserializer.deserialize_any(self)
    }
}

impl<'de, 'c, 'a> Visitor<'de> for ForestSeed<'c, 'a> {
    type Value = Vec<Node>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an array of trees")
    }

    fn visit_seq<S>(self, mut seq: S) -> std::result::Result<Self::Value, S::Error>
    where
        S: SeqAccess<'de>,
    {
        let mut trees = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(tree) = seq.next_element_seed(NodeSeed { ctx: self.ctx })? {
            trees.push(tree.node);
        }
        Ok(trees)
    }

    fn visit_map<A>(self, _map: A) -> std::result::Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        self.not_an_array("START_OBJECT")
    }

    fn visit_bool<E: de::Error>(self, _v: bool) -> std::result::Result<Self::Value, E> {
        self.not_an_array("VALUE_BOOLEAN")
    }

    fn visit_i64<E: de::Error>(self, _v: i64) -> std::result::Result<Self::Value, E> {
        self.not_an_array("VALUE_NUMBER")
    }

    fn visit_u64<E: de::Error>(self, _v: u64) -> std::result::Result<Self::Value, E> {
        self.not_an_array("VALUE_NUMBER")
    }

    fn visit_f64<E: de::Error>(self, _v: f64) -> std::result::Result<Self::Value, E> {
        self.not_an_array("VALUE_NUMBER")
    }

    fn visit_str<E: de::Error>(self, _v: &str) -> std::result::Result<Self::Value, E> {
        self.not_an_array("VALUE_STRING")
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<Self::Value, E> {
        self.not_an_array("VALUE_NULL")
    }
}
