//! Stress classifier
//!
//! The prediction pipeline treats the classifier as a black box behind the
//! [`Classifier`] trait. The bundled implementation is a decision-tree
//! ensemble with majority voting, persisted inside the model artifact.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::StressError;
use crate::types::FEATURE_COUNT;

/// Encoded classifier input, columns in [`crate::types::FEATURE_ORDER`]
pub type ModelInput = [f64; FEATURE_COUNT];

/// A trained model mapping an encoded feature vector to a stress-level code.
///
/// Implementations must be immutable after construction so one instance can
/// serve concurrent requests.
pub trait Classifier: Send + Sync {
    fn predict(&self, input: &ModelInput) -> Result<u32, StressError>;
}

/// Internal split node: `input[feature_idx] <= threshold` goes left
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitNode {
    pub feature_idx: usize,
    pub threshold: f64,
    pub left: Box<TreeNode>,
    pub right: Box<TreeNode>,
}

/// Terminal node carrying a stress-level code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeafNode {
    pub class_label: u32,
    /// Number of training samples that reached this leaf
    #[serde(default)]
    pub n_samples: usize,
}

/// A node in a decision tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeNode {
    Split(SplitNode),
    Leaf(LeafNode),
}

impl TreeNode {
    /// Leaves have depth 0
    pub fn depth(&self) -> usize {
        match self {
            TreeNode::Leaf(_) => 0,
            TreeNode::Split(split) => 1 + split.left.depth().max(split.right.depth()),
        }
    }

    /// Walk the tree for one input
    pub fn predict(&self, input: &ModelInput) -> Result<u32, StressError> {
        let mut node = self;
        loop {
            match node {
                TreeNode::Leaf(leaf) => return Ok(leaf.class_label),
                TreeNode::Split(split) => {
                    let value = input.get(split.feature_idx).ok_or_else(|| {
                        StressError::ComputeError(format!(
                            "split on feature {} but input has {} features",
                            split.feature_idx,
                            input.len()
                        ))
                    })?;
                    node = if *value <= split.threshold {
                        &split.left
                    } else {
                        &split.right
                    };
                }
            }
        }
    }

    fn check(&self, n_features: usize, n_classes: usize) -> Result<(), String> {
        match self {
            TreeNode::Leaf(leaf) if (leaf.class_label as usize) < n_classes => Ok(()),
            TreeNode::Leaf(leaf) => Err(format!(
                "leaf class {} outside {} stress levels",
                leaf.class_label, n_classes
            )),
            TreeNode::Split(split) => {
                if split.feature_idx >= n_features {
                    return Err(format!(
                        "split on feature {} but model has {} features",
                        split.feature_idx, n_features
                    ));
                }
                if !split.threshold.is_finite() {
                    return Err("split threshold is not finite".to_string());
                }
                split.left.check(n_features, n_classes)?;
                split.right.check(n_features, n_classes)
            }
        }
    }
}

/// Ensemble of decision trees combined by majority vote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestClassifier {
    pub n_features: usize,
    pub trees: Vec<TreeNode>,
}

impl ForestClassifier {
    pub fn new(trees: Vec<TreeNode>) -> Self {
        Self {
            n_features: FEATURE_COUNT,
            trees,
        }
    }

    /// Structural checks against the artifact's stress-level vocabulary size
    pub fn validate(&self, n_classes: usize) -> Result<(), StressError> {
        if self.n_features != FEATURE_COUNT {
            return Err(StressError::InvalidArtifact(format!(
                "classifier expects {} features, pipeline produces {}",
                self.n_features, FEATURE_COUNT
            )));
        }
        if self.trees.is_empty() {
            return Err(StressError::InvalidArtifact(
                "classifier has no trees".to_string(),
            ));
        }
        for (index, tree) in self.trees.iter().enumerate() {
            tree.check(self.n_features, n_classes)
                .map_err(|msg| StressError::InvalidArtifact(format!("tree {index}: {msg}")))?;
        }
        Ok(())
    }
}

impl Classifier for ForestClassifier {
    fn predict(&self, input: &ModelInput) -> Result<u32, StressError> {
        let mut votes: BTreeMap<u32, usize> = BTreeMap::new();
        for tree in &self.trees {
            *votes.entry(tree.predict(input)?).or_insert(0) += 1;
        }

        // Ties go to the lowest code: BTreeMap iterates in ascending order and
        // only a strictly larger count replaces the current winner.
        let mut winner: Option<(u32, usize)> = None;
        for (class, count) in votes {
            if winner.map_or(true, |(_, best)| count > best) {
                winner = Some((class, count));
            }
        }

        winner
            .map(|(class, _)| class)
            .ok_or_else(|| StressError::ComputeError("classifier has no trees".to_string()))
    }
}
