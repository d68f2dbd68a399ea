//! Concrete inference backends behind `damper_traits::Oracle`.
//!
//! Both backends are only built through the validating `TryFrom`
//! conversions in `conversions`, so evaluation never re-checks structure.

use std::sync::Arc;

use damper_config::ModelArtifact;
use damper_traits::{Oracle, Prediction};

use crate::error::Result;

/// Validate `artifact` and instantiate the matching backend.
pub fn oracle_from_artifact(artifact: &ModelArtifact) -> Result<Arc<dyn Oracle>> {
    let oracle: Arc<dyn Oracle> = match artifact {
        ModelArtifact::Linear(l) => Arc::new(LinearOracle::try_from(l)?),
        ModelArtifact::Forest(f) => Arc::new(ForestOracle::try_from(f)?),
    };
    tracing::debug!(width = artifact.input_width(), "oracle loaded");
    Ok(oracle)
}

/// Affine scorer `bias + w·f`, optionally thresholded at zero into two classes.
#[derive(Debug, Clone)]
pub struct LinearOracle {
    pub(crate) weights: Vec<f64>,
    pub(crate) bias: f64,
    pub(crate) classes: Option<[i64; 2]>,
}

impl LinearOracle {
    pub fn new(weights: Vec<f64>, bias: f64) -> Self {
        Self {
            weights,
            bias,
            classes: None,
        }
    }

    /// Emit `negative` when the score is below zero and `positive` otherwise.
    pub fn with_classes(mut self, negative: i64, positive: i64) -> Self {
        self.classes = Some([negative, positive]);
        self
    }

    fn score(&self, features: &[f64]) -> f64 {
        self.bias
            + self
                .weights
                .iter()
                .zip(features)
                .map(|(w, f)| w * f)
                .sum::<f64>()
    }
}

impl Oracle for LinearOracle {
    fn predict(&self, features: &[f64]) -> Prediction {
        let s = self.score(features);
        match self.classes {
            Some([neg, pos]) => Prediction::Class(if s >= 0.0 { pos } else { neg }),
            None => Prediction::Value(s),
        }
    }

    fn input_width(&self) -> Option<usize> {
        Some(self.weights.len())
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf(f64),
}

/// One binary decision tree stored as a flat node array, root at index 0.
#[derive(Debug, Clone)]
pub(crate) struct Tree {
    pub(crate) nodes: Vec<Node>,
}

impl Tree {
    /// Walk from the root: `feature <= threshold` goes left.
    fn eval(&self, features: &[f64]) -> f64 {
        let mut i = 0;
        loop {
            match self.nodes.get(i) {
                Some(Node::Leaf(v)) => return *v,
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    // A missing feature compares as NaN and falls right.
                    let f = features.get(*feature).copied().unwrap_or(f64::NAN);
                    i = if f <= *threshold { *left } else { *right };
                }
                None => return f64::NAN,
            }
        }
    }
}

/// What a forest's leaves mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForestMode {
    /// Leaves hold values; output is their mean.
    Regression,
    /// Leaves hold class ids; output is the majority vote, lowest id on ties.
    Classification,
}

/// Ensemble of decision trees, e.g. an exported random forest.
#[derive(Debug, Clone)]
pub struct ForestOracle {
    pub(crate) mode: ForestMode,
    pub(crate) n_features: usize,
    pub(crate) trees: Vec<Tree>,
}

impl ForestOracle {
    pub fn mode(&self) -> ForestMode {
        self.mode
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }

    fn vote(&self, features: &[f64]) -> i64 {
        let mut votes: Vec<(i64, u32)> = Vec::with_capacity(4);
        for t in &self.trees {
            let class = t.eval(features) as i64;
            match votes.iter_mut().find(|(c, _)| *c == class) {
                Some((_, n)) => *n += 1,
                None => votes.push((class, 1)),
            }
        }
        votes
            .into_iter()
            .max_by(|(ca, na), (cb, nb)| na.cmp(nb).then(cb.cmp(ca)))
            .map_or(0, |(c, _)| c)
    }
}

impl Oracle for ForestOracle {
    fn predict(&self, features: &[f64]) -> Prediction {
        match self.mode {
            ForestMode::Regression => {
                let n = self.trees.len().max(1) as f64;
                Prediction::Value(self.trees.iter().map(|t| t.eval(features)).sum::<f64>() / n)
            }
            ForestMode::Classification => Prediction::Class(self.vote(features)),
        }
    }

    fn input_width(&self) -> Option<usize> {
        Some(self.n_features)
    }
}
