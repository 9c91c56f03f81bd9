//! Integration tests for loading XGBoost JSON models
//!
//! Tests cover:
//! - Leaf and split decoding
//! - Child linkage and feature resolution failures
//! - Field completeness for both node kinds
//! - Forest assembly (tree count, unit weights, width)
//! - Scoring a parsed model
//! - Loading from files

use ltr_ranker::{
    ErrorKind, FeatureSet, LoaderConfig, Node, NodeError, ParseError, XGBoostJsonParser,
};
use proptest::prelude::*;
use std::fs;
use tempfile::TempDir;

fn features() -> FeatureSet {
    FeatureSet::new(["f0", "f1", "f2", "f3"]).unwrap()
}

fn parse(model: &str) -> Result<ltr_ranker::NaiveAdditiveDecisionTree, ParseError> {
    XGBoostJsonParser::default().parse(&features(), model)
}

/// Root split on f0 < 0.5; yes -> node 2 (1.0), no -> node 1 (-1.0)
const TWO_LEVEL: &str = r#"[
  {
    "nodeid": 0, "depth": 0, "split": "f0", "split_condition": 0.5,
    "yes": 2, "no": 1, "missing": 2,
    "children": [
      {"nodeid": 2, "leaf": 1.0},
      {"nodeid": 1, "leaf": -1.0}
    ]
  }
]"#;

/// A two-tree dump in the shape the trainer writes it
const FOREST: &str = r#"[
  { "nodeid": 0, "depth": 0, "split": "f1", "split_condition": 0.25, "yes": 1, "no": 2, "missing": 1, "children": [
    { "nodeid": 1, "depth": 1, "split": "f2", "split_condition": 3.0, "yes": 3, "no": 4, "missing": 3, "children": [
      { "nodeid": 3, "leaf": 0.125 },
      { "nodeid": 4, "leaf": -0.5 }
    ]},
    { "nodeid": 2, "leaf": 0.75 }
  ]},
  { "nodeid": 0, "depth": 0, "split": "f3", "split_condition": -1.0, "yes": 1, "no": 2, "missing": 2, "children": [
    { "nodeid": 1, "leaf": -0.25 },
    { "nodeid": 2, "depth": 1, "split": "f0", "split_condition": 10.0, "yes": 5, "no": 6, "missing": 6, "children": [
      { "nodeid": 5, "leaf": 0.5 },
      { "nodeid": 6, "leaf": 1.5 }
    ]}
  ]}
]"#;

#[test]
fn test_two_level_round_trip() {
    let forest = parse(TWO_LEVEL).unwrap();

    assert_eq!(
        forest.trees(),
        [Node::split(0, 0.5, Node::leaf(1.0), Node::leaf(-1.0))]
    );
    assert_eq!(forest.score(&[0.2, 0.0, 0.0, 0.0]).unwrap(), 1.0);
    assert_eq!(forest.score(&[0.5, 0.0, 0.0, 0.0]).unwrap(), -1.0);
    assert_eq!(forest.score(&[0.9, 0.0, 0.0, 0.0]).unwrap(), -1.0);
}

#[test]
fn test_children_keep_declared_order() {
    let forest = parse(FOREST).unwrap();
    assert_eq!(forest.num_trees(), 2);
    assert_eq!(forest.weights(), [1.0, 1.0]);
    assert_eq!(forest.num_features(), 4);
    assert_eq!(forest.num_nodes(), 10);
    assert_eq!(forest.max_depth(), 2);

    assert_eq!(
        forest.trees()[0],
        Node::split(
            1,
            0.25,
            Node::split(2, 3.0, Node::leaf(0.125), Node::leaf(-0.5)),
            Node::leaf(0.75),
        )
    );
    assert_eq!(
        forest.trees()[1],
        Node::split(
            3,
            -1.0,
            Node::leaf(-0.25),
            Node::split(0, 10.0, Node::leaf(0.5), Node::leaf(1.5)),
        )
    );
}

#[test]
fn test_forest_scores_sum_trees() {
    let forest = parse(FOREST).unwrap();
    // tree 0: f1 < 0.25, f2 < 3 -> 0.125; tree 1: f3 >= -1, f0 < 10 -> 0.5
    assert_eq!(forest.score(&[1.0, 0.0, 1.0, 0.0]).unwrap(), 0.625);
    // tree 0: f1 >= 0.25 -> 0.75; tree 1: f3 < -1 -> -0.25
    assert_eq!(forest.score(&[1.0, 1.0, 1.0, -2.0]).unwrap(), 0.5);
}

#[test]
fn test_swapped_children_fail_linkage() {
    let swapped = r#"[
      {"nodeid": 0, "depth": 0, "split": "f0", "split_condition": 0.5,
       "yes": 2, "no": 1,
       "children": [
         {"nodeid": 1, "leaf": -1.0},
         {"nodeid": 2, "leaf": 1.0}
       ]}
    ]"#;
    let err = parse(swapped).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Linkage);
    assert_eq!(
        err.node_error(),
        Some(&NodeError::ChildLinkage {
            yes: 2,
            no: 1,
            left: 1,
            right: 2
        })
    );
}

#[test]
fn test_wrong_child_id_fails_linkage() {
    let model = r#"[
      {"nodeid": 0, "depth": 0, "split": "f0", "split_condition": 0.5,
       "yes": 1, "no": 2,
       "children": [{"nodeid": 1, "leaf": 1.0}, {"nodeid": 7, "leaf": -1.0}]}
    ]"#;
    assert_eq!(parse(model).unwrap_err().kind(), ErrorKind::Linkage);
}

#[test]
fn test_unknown_feature() {
    let model = TWO_LEVEL.replace("\"f0\"", "\"ctr_7d\"");
    let err = parse(&model).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownFeature);
    assert_eq!(
        err.node_error(),
        Some(&NodeError::UnknownFeature("ctr_7d".into()))
    );
    assert!(err.to_string().contains("Unknown feature [ctr_7d]"));
}

#[test]
fn test_split_missing_each_required_field() {
    for field in ["nodeid", "depth", "split", "split_condition", "yes", "no"] {
        let mut node: serde_json::Value = serde_json::from_str(TWO_LEVEL).unwrap();
        node[0].as_object_mut().unwrap().remove(field);
        let err = parse(&node.to_string()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingFields, "without {field}");
        assert_eq!(
            err.node_error(),
            Some(&NodeError::MissingSplitFields {
                missing: vec![field]
            }),
            "without {field}"
        );
    }
}

#[test]
fn test_split_without_two_children() {
    for children in ["[]", r#"[{"nodeid": 2, "leaf": 1.0}]"#] {
        let model = format!(
            r#"[{{"nodeid": 0, "depth": 0, "split": "f0", "split_condition": 0.5,
                 "yes": 2, "no": 1, "children": {children}}}]"#
        );
        assert_eq!(
            parse(&model).unwrap_err().kind(),
            ErrorKind::MissingFields,
            "{children}"
        );
    }

    let three = r#"[{"nodeid": 0, "depth": 0, "split": "f0", "split_condition": 0.5,
                    "yes": 2, "no": 1, "children": [
                      {"nodeid": 2, "leaf": 1.0},
                      {"nodeid": 1, "leaf": -1.0},
                      {"nodeid": 3, "leaf": 0.0}]}]"#;
    assert_eq!(parse(three).unwrap_err().kind(), ErrorKind::MissingFields);
}

#[test]
fn test_leaf_missing_fields() {
    // without `leaf` the object is read as an incomplete split
    let err = parse(r#"[{"nodeid": 3}]"#).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingFields);

    let err = parse(r#"[{"leaf": 0.5}]"#).unwrap_err();
    assert_eq!(
        err.node_error(),
        Some(&NodeError::MissingLeafFields {
            missing: vec!["nodeid"]
        })
    );
}

#[test]
fn test_leaf_wins_over_split_fields() {
    let model = r#"[{"nodeid": 0, "depth": 0, "split": "unknown", "split_condition": 0.5,
                     "yes": 9, "no": 8, "leaf": 2.5}]"#;
    let forest = parse(model).unwrap();
    assert_eq!(forest.trees(), [Node::leaf(2.5)]);
}

#[test]
fn test_top_level_object_is_shape_error() {
    let err = parse("{}").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Shape);
    assert!(matches!(err, ParseError::NotAnArray { found: "START_OBJECT", .. }));
}

#[test]
fn test_empty_array_is_empty_forest() {
    let forest = parse("[]").unwrap();
    assert_eq!(forest.num_trees(), 0);
    assert!(forest.weights().is_empty());
    assert_eq!(forest.num_features(), 4);
}

#[test]
fn test_malformed_json_is_syntax_error() {
    let err = parse(r#"[{"nodeid": 0, "leaf": 1.0},"#).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Syntax);
    assert!(err.location().is_some());
}

#[test]
fn test_failure_in_later_tree_discards_everything() {
    let model = r#"[
      {"nodeid": 0, "leaf": 1.0},
      {"nodeid": 0, "leaf": 2.0},
      {"nodeid": 0, "depth": 0, "split": "f9", "split_condition": 0.5,
       "yes": 1, "no": 2,
       "children": [{"nodeid": 1, "leaf": 1.0}, {"nodeid": 2, "leaf": -1.0}]}
    ]"#;
    let err = parse(model).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownFeature);
    assert_eq!(err.location().map(|l| l.line), Some(6));
}

#[test]
fn test_extra_statistics_need_lenient_loader() {
    let model = r#"[{"nodeid": 0, "depth": 0, "split": "f0", "split_condition": 0.5,
                     "yes": 1, "no": 2, "missing": 1, "gain": 12.5, "cover": 100,
                     "children": [
                       {"nodeid": 1, "leaf": 0.1, "cover": 60},
                       {"nodeid": 2, "leaf": 0.2, "cover": 40}]}]"#;
    assert_eq!(parse(model).unwrap_err().kind(), ErrorKind::Syntax);

    let lenient = XGBoostJsonParser::new(LoaderConfig {
        ignore_unknown_fields: true,
    });
    let forest = lenient.parse(&features(), model).unwrap();
    assert_eq!(forest.num_nodes(), 3);
}

#[test]
fn test_load_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("model.json");
    fs::write(&path, FOREST).unwrap();

    let parser = XGBoostJsonParser::default();
    let forest = parser.load_file(&features(), &path).unwrap();
    assert_eq!(forest.num_trees(), 2);

    let reread = parser
        .parse_reader(&features(), fs::File::open(&path).unwrap())
        .unwrap();
    assert_eq!(forest, reread);

    let err = parser
        .load_file(&features(), dir.path().join("absent.json"))
        .unwrap_err();
    assert!(matches!(err, ParseError::Io(_)));
    assert_eq!(err.kind(), ErrorKind::Syntax);
}

fn leaf_forest(outputs: &[f32]) -> String {
    let trees: Vec<String> = outputs
        .iter()
        .enumerate()
        .map(|(i, &output)| format!(r#"{{"nodeid": {i}, "leaf": {}}}"#, f64::from(output)))
        .collect();
    format!("[{}]", trees.join(","))
}

proptest! {
    #[test]
    fn prop_single_leaf_tree_keeps_value(id in any::<i32>(), output in -1.0e6f32..1.0e6f32) {
        let model = format!(r#"[{{"nodeid": {id}, "leaf": {}}}]"#, f64::from(output));
        let forest = parse(&model).unwrap();
        prop_assert_eq!(forest.trees(), [Node::leaf(output)]);
        prop_assert!(forest.trees()[0].is_leaf());
    }

    #[test]
    fn prop_forest_size_matches_input(outputs in prop::collection::vec(-10.0f32..10.0, 0..32)) {
        let forest = parse(&leaf_forest(&outputs)).unwrap();
        prop_assert_eq!(forest.num_trees(), outputs.len());
        prop_assert_eq!(forest.weights().len(), outputs.len());
        prop_assert!(forest.weights().iter().all(|&w| w == 1.0));
    }
}
