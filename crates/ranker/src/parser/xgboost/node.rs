//! Node decoding for XGBoost JSON dumps
//!
//! Each JSON object is staged into a [`RawNode`] by a visitor that accepts
//! members in any order, then validated and turned into a typed [`Node`].
//! Children are decoded (and fully built) while their parent's members are
//! being read, so a parent is only finalized once both subtrees exist.

use crate::dectree::Node;
use crate::errors::NodeError;
use crate::features::FeatureRegistry;
use serde::de::{self, DeserializeSeed, IgnoredAny, MapAccess, SeqAccess, Unexpected, Visitor};
use std::cell::RefCell;
use std::fmt;
use tracing::trace;

/// Member names of a node object
const FIELDS: &[&str] = &[
    "nodeid",
    "depth",
    "split",
    "split_condition",
    "no",
    "yes",
    "missing",
    "leaf",
    "children",
];

/// Validation failure captured while the decoder unwinds
#[derive(Debug)]
pub(super) enum Failure {
    NotAnArray(&'static str),
    Node(NodeError),
}

/// Shared state for one load
pub(super) struct DecodeContext<'a> {
    registry: &'a dyn FeatureRegistry,
    ignore_unknown_fields: bool,
    failure: RefCell<Option<Failure>>,
}

impl<'a> DecodeContext<'a> {
    pub(super) fn new(registry: &'a dyn FeatureRegistry, ignore_unknown_fields: bool) -> Self {
        Self {
            registry,
            ignore_unknown_fields,
            failure: RefCell::new(None),
        }
    }

    /// Record `failure` and hand the decoder an error to unwind with
    pub(super) fn fail<E: de::Error>(&self, failure: Failure) -> E {
        let err = match &failure {
            Failure::NotAnArray(found) => {
                E::custom(format_args!("Expected [START_ARRAY] but got [{found}]"))
            }
            Failure::Node(source) => E::custom(source),
        };
        *self.failure.borrow_mut() = Some(failure);
        err
    }

    pub(super) fn take_failure(&self) -> Option<Failure> {
        self.failure.take()
    }
}

/// A built node together with the id it was declared with
#[derive(Debug)]
pub(super) struct ParsedNode {
    pub(super) id: i32,
    pub(super) node: Node,
}

/// Staging record for one node object
#[derive(Debug, Default)]
struct RawNode {
    node_id: Option<i32>,
    depth: Option<i32>,
    split: Option<String>,
    threshold: Option<f32>,
    right_id: Option<i32>,
    left_id: Option<i32>,
    missing_id: Option<i32>,
    leaf: Option<f32>,
    children: Option<Vec<ParsedNode>>,
}

impl RawNode {
    fn missing_split_fields(&self) -> Vec<&'static str> {
        let checks = [
            ("nodeid", self.node_id.is_some()),
            ("depth", self.depth.is_some()),
            ("split", self.split.is_some()),
            ("split_condition", self.threshold.is_some()),
            ("yes", self.left_id.is_some()),
            ("no", self.right_id.is_some()),
            (
                "children",
                self.children.as_ref().is_some_and(|c| c.len() == 2),
            ),
        ];
        checks
            .into_iter()
            .filter_map(|(name, present)| (!present).then_some(name))
            .collect()
    }

    /// Validate the staged fields and build the node
    fn build(self, registry: &dyn FeatureRegistry) -> Result<ParsedNode, NodeError> {
        // Presence of `leaf` alone makes this a leaf
        if let Some(output) = self.leaf {
            let Some(id) = self.node_id else {
                return Err(NodeError::MissingLeafFields {
                    missing: vec!["nodeid"],
                });
            };
            return Ok(ParsedNode {
                id,
                node: Node::leaf(output),
            });
        }

        let missing = self.missing_split_fields();
        let (Some(id), Some(_depth), Some(feature), Some(threshold), Some(yes), Some(no), Some(children)) = (
            self.node_id,
            self.depth,
            self.split,
            self.threshold,
            self.left_id,
            self.right_id,
            self.children,
        ) else {
            return Err(NodeError::MissingSplitFields { missing });
        };
        let Ok([left, right]) = <[ParsedNode; 2]>::try_from(children) else {
            return Err(NodeError::MissingSplitFields { missing });
        };

        if left.id != yes || right.id != no {
            return Err(NodeError::ChildLinkage {
                yes,
                no,
                left: left.id,
                right: right.id,
            });
        }

        if !registry.has_feature(&feature) {
            return Err(NodeError::UnknownFeature(feature));
        }
        let ordinal = registry
            .feature_ordinal(&feature)
            .filter(|&ordinal| ordinal < registry.size())
            .ok_or(NodeError::UnknownFeature(feature))?;

        trace!(
            nodeid = id,
            missing = ?self.missing_id,
            "missing-value branch is not used for routing"
        );
        Ok(ParsedNode {
            id,
            node: Node::split(ordinal, threshold, left.node, right.node),
        })
    }
}

/// Decodes one node object
pub(super) struct NodeSeed<'c, 'a> {
    pub(super) ctx: &'c DecodeContext<'a>,
}

impl<'de, 'c, 'a> DeserializeSeed<'de> for NodeSeed<'c, 'a> {
    type Value = ParsedNode;

    fn deserialize<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        deserializer.deserialize_map(self)
    }
}

impl<'de, 'c, 'a> Visitor<'de> for NodeSeed<'c, 'a> {
    type Value = ParsedNode;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a tree node object")
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut raw = RawNode::default();

        while let Some(key) = map.next_key::<String>()? {
            match key.as_str() {
                "nodeid" => raw.node_id = Some(map.next_value_seed(IntSeed)?),
                "depth" => raw.depth = Some(map.next_value_seed(IntSeed)?),
                "split" => raw.split = Some(map.next_value()?),
                "split_condition" => raw.threshold = Some(map.next_value_seed(FloatSeed)?),
                "no" => raw.right_id = Some(map.next_value_seed(IntSeed)?),
                "yes" => raw.left_id = Some(map.next_value_seed(IntSeed)?),
                "missing" => raw.missing_id = Some(map.next_value_seed(IntSeed)?),
                "leaf" => raw.leaf = Some(map.next_value_seed(FloatSeed)?),
                "children" => {
                    raw.children = Some(map.next_value_seed(ChildrenSeed { ctx: self.ctx })?)
                }
                _ if self.ctx.ignore_unknown_fields => {
                    map.next_value::<IgnoredAny>()?;
                }
                other => return Err(de::Error::unknown_field(other, FIELDS)),
            }
        }

        raw.build(self.ctx.registry)
            .map_err(|source| self.ctx.fail(Failure::Node(source)))
    }
}

/// Decodes the `children` array of a node
struct ChildrenSeed<'c, 'a> {
    ctx: &'c DecodeContext<'a>,
}

impl<'de, 'c, 'a> DeserializeSeed<'de> for ChildrenSeed<'c, 'a> {
    type Value = Vec<ParsedNode>;

    fn deserialize<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        deserializer.deserialize_seq(self)
    }
}

impl<'de, 'c, 'a> Visitor<'de> for ChildrenSeed<'c, 'a> {
    type Value = Vec<ParsedNode>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an array of child nodes")
    }

    fn visit_seq<S>(self, mut seq: S) -> Result<Self::Value, S::Error>
    where
        S: SeqAccess<'de>,
    {
        let mut children = Vec::with_capacity(2);
        while let Some(child) = seq.next_element_seed(NodeSeed { ctx: self.ctx })? {
            children.push(child);
        }
        Ok(children)
    }
}

/// Integer member. Numeric strings are accepted and fractions truncated.
struct IntSeed;

fn truncate_to_i32(value: f64) -> Option<i32> {
    let value = value.trunc();
    (value >= f64::from(i32::MIN) && value <= f64::from(i32::MAX)).then_some(value as i32)
}

impl<'de> DeserializeSeed<'de> for IntSeed {
    type Value = i32;

    fn deserialize<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        deserializer.deserialize_any(self)
    }
}

impl<'de> Visitor<'de> for IntSeed {
    type Value = i32;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an i32 or a numeric string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        i32::try_from(v).map_err(|_| E::invalid_value(Unexpected::Signed(v), &self))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        i32::try_from(v).map_err(|_| E::invalid_value(Unexpected::Unsigned(v), &self))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        truncate_to_i32(v).ok_or_else(|| E::invalid_value(Unexpected::Float(v), &self))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        v.trim()
            .parse::<f64>()
            .ok()
            .and_then(truncate_to_i32)
            .ok_or_else(|| E::invalid_value(Unexpected::Str(v), &self))
    }
}

/// Float member. Numeric strings are accepted.
struct FloatSeed;

impl<'de> DeserializeSeed<'de> for FloatSeed {
    type Value = f32;

    fn deserialize<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        deserializer.deserialize_any(self)
    }
}

impl<'de> Visitor<'de> for FloatSeed {
    type Value = f32;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an f32 or a numeric string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(v as f32)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(v as f32)
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Ok(v as f32)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        v.trim()
            .parse::<f32>()
            .map_err(|_| E::invalid_value(Unexpected::Str(v), &self))
    }
}
