//! Exported risk models.
//!
//! Two families are supported, distinguished by the `"kind"` tag of
//! `model.json`:
//!
//! - `logistic_regression`: linear margin over the scaled features.
//! - `tree_ensemble`: gradient-boosted binary trees stored as flat node arrays.
//!
//! Both turn a margin into a probability with the logistic function.

use serde::{Deserialize, Serialize};

use super::ArtifactError;
use crate::ports::{RiskModel, ScoringError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExportedModel {
    LogisticRegression(LogisticRegression),
    TreeEnsemble(TreeEnsemble),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    #[serde(default)]
    pub feature_names: Vec<String>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeEnsemble {
    pub n_features: usize,
    #[serde(default)]
    pub feature_names: Vec<String>,
    /// Initial margin added before the tree outputs.
    #[serde(default)]
    pub base_score: f64,
    pub trees: Vec<Tree>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

/// One node of a flattened tree. Node 0 is the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
        /// Branch taken when the feature value is NaN.
        #[serde(default)]
        default_left: bool,
    },
    Leaf {
        leaf: f64,
    },
}

impl ExportedModel {
    /// Parse and validate `model.json`.
    ///
    /// # Errors
    /// Returns `ArtifactError` if the JSON is malformed or the model is
    /// structurally invalid.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, ArtifactError> {
        let model: Self = serde_json::from_slice(bytes)
            .map_err(|e| ArtifactError::Format(format!("model: {e}")))?;
        model.validate()?;
        Ok(model)
    }

    /// Column names recorded at export time, if any.
    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        match self {
            Self::LogisticRegression(m) => &m.feature_names,
            Self::TreeEnsemble(m) => &m.feature_names,
        }
    }

    /// Structural checks run once at load time.
    ///
    /// # Errors
    /// Returns `ArtifactError::Invalid` describing the first problem found.
    pub fn validate(&self) -> Result<(), ArtifactError> {
        match self {
            Self::LogisticRegression(m) => m.validate(),
            Self::TreeEnsemble(m) => m.validate(),
        }
    }

    fn margin(&self, x: &[f64]) -> Result<f64, ScoringError> {
        match self {
            Self::LogisticRegression(m) => Ok(m.margin(x)),
            Self::TreeEnsemble(m) => m.margin(x),
        }
    }
}

impl LogisticRegression {
    fn validate(&self) -> Result<(), ArtifactError> {
        if self.coefficients.is_empty() {
            return Err(ArtifactError::Invalid("model has no coefficients".into()));
        }
        if !self.feature_names.is_empty() && self.feature_names.len() != self.coefficients.len() {
            return Err(ArtifactError::Invalid(format!(
                "model has {} coefficients but {} feature names",
                self.coefficients.len(),
                self.feature_names.len()
            )));
        }
        if !self.intercept.is_finite() || self.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(ArtifactError::Invalid(
                "model parameters must be finite".into(),
            ));
        }
        Ok(())
    }

    fn margin(&self, x: &[f64]) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(x)
                .map(|(c, v)| c * v)
                .sum::<f64>()
    }
}

impl TreeEnsemble {
    fn validate(&self) -> Result<(), ArtifactError> {
        if self.n_features == 0 {
            return Err(ArtifactError::Invalid("n_features must be > 0".into()));
        }
        if !self.feature_names.is_empty() && self.feature_names.len() != self.n_features {
            return Err(ArtifactError::Invalid(format!(
                "n_features is {} but {} feature names given",
                self.n_features,
                self.feature_names.len()
            )));
        }
        if !self.base_score.is_finite() {
            return Err(ArtifactError::Invalid("base_score must be finite".into()));
        }
        if self.trees.is_empty() {
            return Err(ArtifactError::Invalid("ensemble has no trees".into()));
        }

        for (t, tree) in self.trees.iter().enumerate() {
            if tree.nodes.is_empty() {
                return Err(ArtifactError::Invalid(format!("tree {t} is empty")));
            }
            let len = tree.nodes.len();
            for (i, node) in tree.nodes.iter().enumerate() {
                match *node {
                    Node::Leaf { leaf } if !leaf.is_finite() => {
                        return Err(ArtifactError::Invalid(format!(
                            "tree {t} node {i}: leaf value must be finite"
                        )));
                    }
                    Node::Leaf { .. } => {}
                    Node::Split {
                        feature,
                        threshold,
                        left,
                        right,
                        ..
                    } => {
                        if feature >= self.n_features {
                            return Err(ArtifactError::Invalid(format!(
                                "tree {t} node {i}: feature {feature} out of range"
                            )));
                        }
                        if threshold.is_nan() {
                            return Err(ArtifactError::Invalid(format!(
                                "tree {t} node {i}: threshold is NaN"
                            )));
                        }
                        // Children must point forward, which rules out cycles.
                        for child in [left, right] {
                            if child <= i || child >= len {
                                return Err(ArtifactError::Invalid(format!(
                                    "tree {t} node {i}: child index {child} invalid"
                                )));
                            }
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn margin(&self, x: &[f64]) -> Result<f64, ScoringError> {
        let mut total = self.base_score;
        for tree in &self.trees {
            total += tree.evaluate(x)?;
        }
        Ok(total)
    }
}

impl Tree {
    fn evaluate(&self, x: &[f64]) -> Result<f64, ScoringError> {
        let mut idx = 0;
        loop {
            match self.nodes.get(idx) {
                Some(Node::Leaf { leaf }) => return Ok(*leaf),
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    default_left,
                }) => {
                    let value = x.get(*feature).copied().ok_or_else(|| {
                        ScoringError::Model(format!("feature index {feature} out of range"))
                    })?;
                    let go_left = if value.is_nan() {
                        *default_left
                    } else {
                        value < *threshold
                    };
                    idx = if go_left { *left } else { *right };
                }
                None => {
                    return Err(ScoringError::Model(format!(
                        "node index {idx} out of range"
                    )))
                }
            }
        }
    }
}

/// Logistic function, written to avoid overflow for large |z|.
fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

impl RiskModel for ExportedModel {
    fn n_features(&self) -> usize {
        match self {
            Self::LogisticRegression(m) => m.coefficients.len(),
            Self::TreeEnsemble(m) => m.n_features,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::LogisticRegression(_) => "logistic_regression",
            Self::TreeEnsemble(_) => "tree_ensemble",
        }
    }

    fn predict_proba(&self, scaled: &[f64]) -> Result<[f64; 2], ScoringError> {
        let expected = self.n_features();
        if scaled.len() != expected {
            return Err(ScoringError::DimensionMismatch {
                expected,
                got: scaled.len(),
            });
        }

        let p = sigmoid(self.margin(scaled)?);
        Ok([1.0 - p, p])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn logistic(coefficients: Vec<f64>, intercept: f64) -> ExportedModel {
        ExportedModel::LogisticRegression(LogisticRegression {
            feature_names: vec![],
            coefficients,
            intercept,
        })
    }

    fn stump(feature: usize, threshold: f64, default_left: bool) -> Tree {
        Tree {
            nodes: vec![
                Node::Split {
                    feature,
                    threshold,
                    left: 1,
                    right: 2,
                    default_left,
                },
                Node::Leaf { leaf: -1.0 },
                Node::Leaf { leaf: 1.0 },
            ],
        }
    }

    #[test]
    fn test_logistic_zero_margin() {
        let model = logistic(vec![1.0, -1.0], 0.0);
        let [p0, p1] = model.predict_proba(&[2.0, 2.0]).unwrap();
        assert!((p1 - 0.5).abs() < 1e-12);
        assert!((p0 + p1 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_logistic_margin() {
        let model = logistic(vec![2.0], -1.0);
        let [_, p] = model.predict_proba(&[1.0]).unwrap();
        assert!((p - 1.0 / (1.0 + (-1.0f64).exp())).abs() < 1e-12);
    }

    #[test]
    fn test_sigmoid_extremes_stay_in_range() {
        assert_eq!(sigmoid(1000.0), 1.0);
        assert_eq!(sigmoid(-1000.0), 0.0);
        assert!(sigmoid(-30.0) > 0.0);
    }

    #[test]
    fn test_dimension_mismatch() {
        let model = logistic(vec![1.0; 14], 0.0);
        assert_eq!(
            model.predict_proba(&[0.0; 13]),
            Err(ScoringError::DimensionMismatch {
                expected: 14,
                got: 13
            })
        );
    }

    #[test]
    fn test_tree_ensemble_routing() {
        let model = ExportedModel::TreeEnsemble(TreeEnsemble {
            n_features: 2,
            feature_names: vec![],
            base_score: 0.0,
            trees: vec![stump(0, 0.5, true), stump(1, 0.0, false)],
        });
        model.validate().expect("Should be valid");

        // left (-1) + right (+1)
        let [_, p] = model.predict_proba(&[0.0, 1.0]).unwrap();
        assert!((p - 0.5).abs() < 1e-12);

        // Equal to threshold goes right on both trees: margin 2
        let [_, p] = model.predict_proba(&[0.5, 0.0]).unwrap();
        assert!((p - sigmoid(2.0)).abs() < 1e-12);

        // NaN follows default_left: tree 0 left, tree 1 right
        let [_, p] = model.predict_proba(&[f64::NAN, f64::NAN]).unwrap();
        assert!((p - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_tree_validation_rejects_backward_child() {
        let model = ExportedModel::TreeEnsemble(TreeEnsemble {
            n_features: 1,
            feature_names: vec![],
            base_score: 0.0,
            trees: vec![Tree {
                nodes: vec![
                    Node::Split {
                        feature: 0,
                        threshold: 0.0,
                        left: 0,
                        right: 1,
                        default_left: false,
                    },
                    Node::Leaf { leaf: 0.0 },
                ],
            }],
        });
        assert!(model.validate().is_err());
    }

    #[test]
    fn test_tree_validation_rejects_feature_out_of_range() {
        let model = ExportedModel::TreeEnsemble(TreeEnsemble {
            n_features: 1,
            feature_names: vec![],
            base_score: 0.0,
            trees: vec![stump(3, 0.0, false)],
        });
        assert!(model.validate().is_err());
    }

    #[test]
    fn test_parse_tagged_json() {
        let json = br#"{
            "kind": "tree_ensemble",
            "n_features": 1,
            "base_score": 0.25,
            "trees": [ { "nodes": [
                { "feature": 0, "threshold": 1.5, "left": 1, "right": 2, "default_left": true },
                { "leaf": -0.5 },
                { "leaf": 0.5 }
            ] } ]
        }"#;
        let model = ExportedModel::from_json_slice(json).expect("Should parse");
        assert_eq!(model.kind(), "tree_ensemble");
        assert_eq!(model.n_features(), 1);

        let json = br#"{ "kind": "logistic_regression", "coefficients": [0.1, 0.2], "intercept": -0.3 }"#;
        let model = ExportedModel::from_json_slice(json).expect("Should parse");
        assert_eq!(model.kind(), "logistic_regression");
        assert_eq!(model.n_features(), 2);
    }

    #[test]
    fn test_parse_rejects_unknown_kind_and_bad_values() {
        assert!(ExportedModel::from_json_slice(br#"{ "kind": "svm" }"#).is_err());
        assert!(ExportedModel::from_json_slice(
            br#"{ "kind": "logistic_regression", "coefficients": [], "intercept": 0.0 }"#
        )
        .is_err());
    }
}
