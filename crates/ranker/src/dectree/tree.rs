//! Decision tree nodes for additive forest scoring
//!
//! A tree is its root [`Node`]. Splits own both children, so every tree is a
//! strict hierarchy with no sharing.

/// A decision tree node (split or leaf)
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Split(Split),
    Leaf(Leaf),
}

/// Internal node comparing one feature against a threshold
///
/// Feature values strictly below `threshold` take the left branch, all
/// others (including NaN) take the right branch.
#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    feature: usize,
    threshold: f32,
    left: Box<Node>,
    right: Box<Node>,
}

/// Terminal node carrying the tree's output
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Leaf {
    output: f32,
}

impl Split {
    pub fn feature(&self) -> usize {
        self.feature
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn left(&self) -> &Node {
        &self.left
    }

    pub fn right(&self) -> &Node {
        &self.right
    }

    /// Pick the branch for the given feature vector
    fn branch(&self, features: &[f32]) -> &Node {
        // Absent values compare like NaN and go right
        let value = features.get(self.feature).copied().unwrap_or(f32::NAN);
        if value < self.threshold {
            &self.left
        } else {
            &self.right
        }
    }
}

impl Leaf {
    pub fn output(&self) -> f32 {
        self.output
    }
}

impl Node {
    /// Create a split node; `left` is the "yes" branch
    pub fn split(feature: usize, threshold: f32, left: Node, right: Node) -> Self {
        Node::Split(Split {
            feature,
            threshold,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    /// Create a leaf node
    pub fn leaf(output: f32) -> Self {
        Node::Leaf(Leaf { output })
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf(_))
    }

    /// Walk from this node to a leaf and return its output
    pub fn eval(&self, features: &[f32]) -> f32 {
        let mut node = self;
        loop {
            match node {
                Node::Split(split) => node = split.branch(features),
                Node::Leaf(leaf) => return leaf.output,
            }
        }
    }

    /// Total number of nodes in this subtree
    pub fn num_nodes(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            if let Node::Split(split) = node {
                stack.push(&split.left);
                stack.push(&split.right);
            }
        }
        count
    }

    /// Number of edges on the longest root-to-leaf path
    pub fn max_depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self, 0usize)];
        while let Some((node, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            if let Node::Split(split) = node {
                stack.push((&split.left, depth + 1));
                stack.push((&split.right, depth + 1));
            }
        }
        deepest
    }

    /// Largest feature ordinal referenced by any split in this subtree
    pub fn max_feature(&self) -> Option<usize> {
        let mut max = None;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if let Node::Split(split) = node {
                max = max.max(Some(split.feature));
                stack.push(&split.left);
                stack.push(&split.right);
            }
        }
        max
    }
}
