//! Oracle artifact schema (JSON).
//!
//! Two model families are understood:
//!
//! ```json
//! {"kind": "linear", "weights": [0.1, -0.2], "bias": 0.0}
//! {"kind": "forest", "task": "classification", "n_features": 2,
//!  "trees": [{"nodes": [{"feature": 0, "threshold": 0.5, "left": 1, "right": 2},
//!                       {"value": 0}, {"value": 1}]}]}
//! ```
//!
//! Structural checks run once at load so inference never has to bounds-check
//! or detect cycles.
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ModelArtifact {
    Linear(LinearArtifact),
    Forest(ForestArtifact),
}

#[derive(Debug, Deserialize, Clone)]
pub struct LinearArtifact {
    pub weights: Vec<f64>,
    #[serde(default)]
    pub bias: f64,
    /// When set to `[negative, positive]`, the sign of the score selects a class id.
    #[serde(default)]
    pub classes: Option<[i64; 2]>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ForestTask {
    Regression,
    Classification,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ForestArtifact {
    pub task: ForestTask,
    pub n_features: usize,
    pub trees: Vec<TreeArtifact>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TreeArtifact {
    pub nodes: Vec<NodeArtifact>,
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(untagged)]
pub enum NodeArtifact {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

impl ModelArtifact {
    /// Number of input features the model expects.
    pub fn input_width(&self) -> usize {
        match self {
            ModelArtifact::Linear(l) => l.weights.len(),
            ModelArtifact::Forest(f) => f.n_features,
        }
    }

    pub fn validate(&self) -> eyre::Result<()> {
        match self {
            ModelArtifact::Linear(l) => l.validate(),
            ModelArtifact::Forest(f) => f.validate(),
        }
    }
}

impl LinearArtifact {
    pub fn validate(&self) -> eyre::Result<()> {
        if self.weights.is_empty() {
            eyre::bail!("linear artifact has no weights");
        }
        if self.weights.iter().any(|w| !w.is_finite()) || !self.bias.is_finite() {
            eyre::bail!("linear artifact has non-finite coefficients");
        }
        Ok(())
    }
}

impl ForestArtifact {
    /// Structural checks every walk relies on: features in range and
    /// children strictly after their parent.
    pub fn validate(&self) -> eyre::Result<()> {
        if self.n_features == 0 {
            eyre::bail!("forest artifact n_features must be >= 1");
        }
        if self.trees.is_empty() {
            eyre::bail!("forest artifact has no trees");
        }
        for (t, tree) in self.trees.iter().enumerate() {
            validate_tree(t, tree, self.n_features, self.task)?;
        }
        Ok(())
    }
}

fn validate_tree(t: usize, tree: &TreeArtifact, width: usize, task: ForestTask) -> eyre::Result<()> {
    let n = tree.nodes.len();
    if n == 0 {
        eyre::bail!("tree {t} has no nodes");
    }
    for (i, node) in tree.nodes.iter().enumerate() {
        match *node {
            NodeArtifact::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if feature >= width {
                    eyre::bail!("tree {t} node {i}: feature {feature} out of range (n_features = {width})");
                }
                if !threshold.is_finite() {
                    eyre::bail!("tree {t} node {i}: threshold is not finite");
                }
                // Children strictly after their parent: the tree is acyclic and every walk terminates.
                for child in [left, right] {
                    if child <= i || child >= n {
                        eyre::bail!("tree {t} node {i}: child index {child} invalid");
                    }
                }
            }
            NodeArtifact::Leaf { value } => {
                if !value.is_finite() {
                    eyre::bail!("tree {t} node {i}: leaf value is not finite");
                }
                if task == ForestTask::Classification && value.fract() != 0.0 {
                    eyre::bail!("tree {t} node {i}: classification leaf {value} is not a class id");
                }
            }
        }
    }
    Ok(())
}

pub fn artifact_from_reader<R: std::io::Read>(reader: R) -> eyre::Result<ModelArtifact> {
    let artifact: ModelArtifact =
        serde_json::from_reader(reader).map_err(|e| eyre::eyre!("parse model artifact: {}", e))?;
    artifact.validate()?;
    Ok(artifact)
}

pub fn load_artifact_json(path: &Path) -> eyre::Result<ModelArtifact> {
    let file = std::fs::File::open(path)
        .map_err(|e| eyre::eyre!("open model artifact {:?}: {}", path, e))?;
    artifact_from_reader(std::io::BufReader::new(file)).map_err(|e| eyre::eyre!("{:?}: {}", path, e))
}
