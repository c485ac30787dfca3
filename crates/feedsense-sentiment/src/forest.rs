//! Random-forest classifier evaluated over sparse feature vectors.

use serde::Deserialize;

use crate::error::InferenceError;
use crate::features::FeatureVector;

/// Maps a feature vector to a raw class index.
pub trait Classifier: Send + Sync + std::fmt::Debug {
    /// Width of the feature vectors this classifier accepts.
    fn n_features(&self) -> usize;

    /// Raw class indices this classifier can emit, in output order.
    fn classes(&self) -> &[i64];

    /// # Errors
    ///
    /// Returns [`InferenceError`] when the input has the wrong width or the
    /// model's internal state is unusable.
    fn predict(&self, features: &FeatureVector) -> Result<i64, InferenceError>;
}

/// `children_left` / `children_right` value marking a leaf.
const LEAF: i64 = -1;

/// On-disk form of a fitted classifier.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifierArtifact {
    RandomForest(ForestArtifact),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForestArtifact {
    pub classes: Vec<i64>,
    pub n_features: usize,
    pub trees: Vec<TreeArtifact>,
}

/// One decision tree in flat parallel-array form.
#[derive(Debug, Clone, Deserialize)]
pub struct TreeArtifact {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub value: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, Copy)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    /// Index into the tree's leaf probability table.
    Leaf(usize),
}

#[derive(Debug)]
struct DecisionTree {
    nodes: Vec<Node>,
    leaf_proba: Vec<Vec<f64>>,
}

impl DecisionTree {
    fn from_artifact(tree: TreeArtifact, n_classes: usize, n_features: usize) -> Result<Self, String> {
        let n_nodes = tree.children_left.len();
        if n_nodes == 0 {
            return Err("tree has no nodes".to_string());
        }
        if tree.children_right.len() != n_nodes
            || tree.feature.len() != n_nodes
            || tree.threshold.len() != n_nodes
            || tree.value.len() != n_nodes
        {
            return Err(format!(
                "node arrays disagree in length (left={}, right={}, feature={}, threshold={}, value={})",
                n_nodes,
                tree.children_right.len(),
                tree.feature.len(),
                tree.threshold.len(),
                tree.value.len()
            ));
        }

        let child = |raw: i64, node: usize| -> Result<usize, String> {
            usize::try_from(raw)
                .ok()
                .filter(|&c| c < n_nodes)
                .ok_or_else(|| format!("node {node} points to child {raw}, outside {n_nodes} nodes"))
        };

        let mut nodes = Vec::with_capacity(n_nodes);
        let mut leaf_proba = Vec::new();
        for node in 0..n_nodes {
            let (left, right) = (tree.children_left[node], tree.children_right[node]);
            if left == LEAF || right == LEAF {
                if left != right {
                    return Err(format!("node {node} has exactly one child"));
                }
                let weights = &tree.value[node];
                if weights.len() != n_classes {
                    return Err(format!(
                        "leaf {node} has {} class weights, expected {n_classes}",
                        weights.len()
                    ));
                }
                let total: f64 = weights.iter().sum();
                if !total.is_finite() || total <= 0.0 || weights.iter().any(|w| *w < 0.0) {
                    return Err(format!("leaf {node} has unusable class weights"));
                }
                nodes.push(Node::Leaf(leaf_proba.len()));
                leaf_proba.push(weights.iter().map(|w| w / total).collect());
            } else {
                let feature = usize::try_from(tree.feature[node])
                    .ok()
                    .filter(|&f| f < n_features)
                    .ok_or_else(|| {
                        format!(
                            "node {node} splits on feature {}, outside {n_features} features",
                            tree.feature[node]
                        )
                    })?;
                let threshold = tree.threshold[node];
                if threshold.is_nan() {
                    return Err(format!("node {node} has a NaN threshold"));
                }
                nodes.push(Node::Split {
                    feature,
                    threshold,
                    left: child(left, node)?,
                    right: child(right, node)?,
                });
            }
        }

        Ok(Self { nodes, leaf_proba })
    }

    /// Walk from the root to a leaf and return its class probabilities.
    fn leaf_for(&self, features: &FeatureVector) -> Option<&[f64]> {
        let mut node = 0;
        // A well-formed tree reaches a leaf in fewer steps than it has nodes.
        for _ in 0..=self.nodes.len() {
            match *self.nodes.get(node)? {
                Node::Leaf(leaf) => return self.leaf_proba.get(leaf).map(Vec::as_slice),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if features.get(feature) <= threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
        None
    }
}

/// Averages per-tree leaf probabilities and picks the most likely class.
#[derive(Debug)]
pub struct RandomForest {
    classes: Vec<i64>,
    n_features: usize,
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    /// Validate a forest artifact and build the evaluable tree set.
    ///
    /// # Errors
    ///
    /// Returns a human-readable reason when the artifact is internally
    /// inconsistent; the caller attaches the artifact path.
    pub fn from_artifact(artifact: ForestArtifact) -> Result<Self, String> {
        if artifact.classes.is_empty() {
            return Err("classifier declares no classes".to_string());
        }
        if artifact.trees.is_empty() {
            return Err("forest has no trees".to_string());
        }
        let n_classes = artifact.classes.len();
        let trees = artifact
            .trees
            .into_iter()
            .enumerate()
            .map(|(i, tree)| {
                DecisionTree::from_artifact(tree, n_classes, artifact.n_features)
                    .map_err(|reason| format!("tree {i}: {reason}"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            classes: artifact.classes,
            n_features: artifact.n_features,
            trees,
        })
    }

    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Mean class probabilities across all trees, in [`Classifier::classes`] order.
    ///
    /// # Errors
    ///
    /// Returns [`InferenceError`] on a width mismatch or a tree that never
    /// reaches a leaf.
    pub fn predict_proba(&self, features: &FeatureVector) -> Result<Vec<f64>, InferenceError> {
        if features.dim() != self.n_features {
            return Err(InferenceError::DimensionMismatch {
                expected: self.n_features,
                actual: features.dim(),
            });
        }

        let mut proba = vec![0.0; self.classes.len()];
        for (i, tree) in self.trees.iter().enumerate() {
            let leaf = tree
                .leaf_for(features)
                .ok_or_else(|| InferenceError::MalformedTree {
                    tree: i,
                    reason: "walk did not terminate at a leaf".to_string(),
                })?;
            for (acc, p) in proba.iter_mut().zip(leaf) {
                *acc += p;
            }
        }

        #[allow(clippy::cast_precision_loss)]
        let n_trees = self.trees.len() as f64;
        for p in &mut proba {
            *p /= n_trees;
        }
        Ok(proba)
    }
}

impl Classifier for RandomForest {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn classes(&self) -> &[i64] {
        &self.classes
    }

    fn predict(&self, features: &FeatureVector) -> Result<i64, InferenceError> {
        let proba = self.predict_proba(features)?;
        // First maximum wins on ties.
        let best = proba
            .iter()
            .enumerate()
            .fold(0, |best, (i, p)| if *p > proba[best] { i } else { best });
        Ok(self.classes[best])
    }
}
