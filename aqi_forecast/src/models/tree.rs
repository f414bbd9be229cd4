//! Gradient-boosted regression tree ensembles
//!
//! Each tree is a flat node array rooted at index 0. Split nodes send a row
//! to `yes` when `row[feature] < threshold`, otherwise to `no`; a NaN
//! feature value goes to `missing`, defaulting to `yes`.

use super::Regressor;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        yes: usize,
        no: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        missing: Option<usize>,
    },
    Leaf {
        leaf: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    pub nodes: Vec<TreeNode>,
}

impl RegressionTree {
    /// Check that every split points forward to an existing node and reads a
    /// feature inside the row
    pub fn validate(&self, n_features: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            if let TreeNode::Split {
                feature,
                yes,
                no,
                missing,
                ..
            } = node
            {
                if *feature >= n_features {
                    return Err(format!(
                        "node {} reads feature {} but the schema has {} fields",
                        idx, feature, n_features
                    ));
                }
                for child in [Some(*yes), Some(*no), *missing].into_iter().flatten() {
                    if child <= idx || child >= self.nodes.len() {
                        return Err(format!("node {} has invalid child index {}", idx, child));
                    }
                }
            }
        }
        Ok(())
    }

    /// Leaf value reached by `row`
    ///
    /// An unvalidated tree that points outside its nodes or never reaches a
    /// leaf scores NaN.
    pub fn leaf_value(&self, row: &[f64]) -> f64 {
        let mut idx = 0;
        for _ in 0..self.nodes.len() {
            let Some(node) = self.nodes.get(idx) else {
                break;
            };
            match node {
                TreeNode::Leaf { leaf } => return *leaf,
                TreeNode::Split {
                    feature,
                    threshold,
                    yes,
                    no,
                    missing,
                } => {
                    let x = row.get(*feature).copied().unwrap_or(f64::NAN);
                    idx = if x.is_nan() {
                        missing.unwrap_or(*yes)
                    } else if x < *threshold {
                        *yes
                    } else {
                        *no
                    };
                }
            }
        }
        f64::NAN
    }
}

/// Sum of tree leaves on top of a constant base score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeEnsemble {
    #[serde(default)]
    pub base_score: f64,
    pub trees: Vec<RegressionTree>,
}

impl Regressor for TreeEnsemble {
    fn predict(&self, row: &[f64]) -> f64 {
        self.base_score
            + self
                .trees
                .iter()
                .map(|tree| tree.leaf_value(row))
                .sum::<f64>()
    }

    fn validate(&self, n_features: usize) -> Result<(), String> {
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(n_features)
                .map_err(|reason| format!("tree {}: {}", i, reason))?;
        }
        Ok(())
    }
}
