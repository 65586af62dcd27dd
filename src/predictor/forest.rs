//! Tree-ensemble classifier in the flattened node-array layout exported
//! by scikit-learn (`tree_.children_left`, `children_right`, `feature`,
//! `threshold`, `value`).
//!
//! Each tree votes with its leaf's class distribution; votes are averaged
//! and the larger class wins, ties going to `LowRisk`.

use serde::Deserialize;

use super::{check_feature_names, ArtifactError, Predictor, PredictorError};
use crate::models::features::{FeatureVector, FEATURE_COUNT};
use crate::models::prediction::Label;

/// Marks a leaf in `children_left` / `children_right`.
const LEAF: i64 = -1;

#[derive(Debug, Deserialize)]
pub struct TreeArtifact {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    /// Per-node class weights `[low_risk, early_stage]`.
    pub value: Vec<[f64; 2]>,
}

#[derive(Debug, Deserialize)]
pub struct ForestArtifact {
    pub feature_names: Vec<String>,
    pub trees: Vec<TreeArtifact>,
}

#[derive(Debug, Clone)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        /// Probability of the positive class at this leaf.
        positive: f64,
    },
}

#[derive(Debug, Clone)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn positive_probability(&self, x: &[f64; FEATURE_COUNT]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { positive } => return *positive,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if x[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }
}

impl TryFrom<(usize, TreeArtifact)> for Tree {
    type Error = ArtifactError;

    fn try_from((tree_idx, t): (usize, TreeArtifact)) -> Result<Self, Self::Error> {
        let n = t.children_left.len();
        if n == 0 {
            return Err(ArtifactError::Invalid(format!("tree {tree_idx} has no nodes")));
        }
        if [t.children_right.len(), t.feature.len(), t.threshold.len(), t.value.len()]
            .iter()
            .any(|len| *len != n)
        {
            return Err(ArtifactError::Invalid(format!(
                "tree {tree_idx} node arrays differ in length"
            )));
        }

        let invalid = |node: usize, what: &str| {
            ArtifactError::Invalid(format!("tree {tree_idx} node {node}: {what}"))
        };

        // Children always come after their parent, so every walk ends at a leaf.
        let child = |node: usize, raw: i64| -> Result<usize, ArtifactError> {
            usize::try_from(raw)
                .ok()
                .filter(|c| *c > node && *c < n)
                .ok_or_else(|| invalid(node, "child index out of order"))
        };

        let mut nodes = Vec::with_capacity(n);
        for i in 0..n {
            let (l, r) = (t.children_left[i], t.children_right[i]);
            if l == LEAF && r == LEAF {
                let [neg, pos] = t.value[i];
                let total = neg + pos;
                if !(neg >= 0.0 && pos >= 0.0 && total > 0.0 && total.is_finite()) {
                    return Err(invalid(i, "leaf value must be non-negative with positive total"));
                }
                nodes.push(Node::Leaf {
                    positive: pos / total,
                });
            } else {
                let feature = usize::try_from(t.feature[i])
                    .ok()
                    .filter(|f| *f < FEATURE_COUNT)
                    .ok_or_else(|| invalid(i, "feature index out of range"))?;
                if !t.threshold[i].is_finite() {
                    return Err(invalid(i, "threshold is not finite"));
                }
                nodes.push(Node::Split {
                    feature,
                    threshold: t.threshold[i],
                    left: child(i, l)?,
                    right: child(i, r)?,
                });
            }
        }
        Ok(Self { nodes })
    }
}

/// Validated tree-ensemble classifier.
#[derive(Debug, Clone)]
pub struct ForestModel {
    trees: Vec<Tree>,
}

impl TryFrom<ForestArtifact> for ForestModel {
    type Error = ArtifactError;

    fn try_from(artifact: ForestArtifact) -> Result<Self, Self::Error> {
        check_feature_names(&artifact.feature_names)?;
        if artifact.trees.is_empty() {
            return Err(ArtifactError::Invalid("forest has no trees".into()));
        }
        let trees = artifact
            .trees
            .into_iter()
            .enumerate()
            .map(Tree::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { trees })
    }
}

impl ForestModel {
    /// Mean positive-class probability across trees.
    pub fn probability(&self, features: &FeatureVector) -> f64 {
        let x = features.values();
        let sum: f64 = self.trees.iter().map(|t| t.positive_probability(x)).sum();
        sum / self.trees.len() as f64
    }
}

impl Predictor for ForestModel {
    fn predict(&self, features: &FeatureVector) -> Result<Label, PredictorError> {
        let p = self.probability(features);
        if !p.is_finite() {
            return Err(PredictorError::NonFiniteScore);
        }
        Ok(if p > 0.5 {
            Label::EarlyStage
        } else {
            Label::LowRisk
        })
    }

    fn describe(&self) -> String {
        format!("random_forest(trees={})", self.trees.len())
    }
}
