//! `From` implementations bridging `damper_config` types to `damper_core` types.

use damper_config::artifact::{ForestArtifact, ForestTask, LinearArtifact, NodeArtifact};

use crate::channel::OverflowPolicy;
use crate::config::{ChannelCfg, LogCfg, TimingCfg, WindowCfg};
use crate::error::DamperError;
use crate::frame::Axis;
use crate::normalize::NormalizationProfile;
use crate::oracle::{ForestMode, ForestOracle, LinearOracle, Node, Tree};
use crate::util::{idle_us, period_ms};

// ── Timing ───────────────────────────────────────────────────────────────────

impl From<&damper_config::Timing> for TimingCfg {
    fn from(c: &damper_config::Timing) -> Self {
        Self {
            sample_period: period_ms(c.sample_period_ms),
            actuation_period: period_ms(c.actuation_period_ms),
            idle: idle_us(c.idle_us),
        }
    }
}

// ── Window ───────────────────────────────────────────────────────────────────

impl From<damper_config::Axis> for Axis {
    fn from(a: damper_config::Axis) -> Self {
        match a {
            damper_config::Axis::X => Axis::X,
            damper_config::Axis::Y => Axis::Y,
            damper_config::Axis::Z => Axis::Z,
        }
    }
}

impl From<&damper_config::WindowCfg> for WindowCfg {
    fn from(c: &damper_config::WindowCfg) -> Self {
        Self {
            capacity: c.capacity,
            stride: c.stride,
            axis: c.axis.into(),
        }
    }
}

// ── Channel ──────────────────────────────────────────────────────────────────

impl From<damper_config::Overflow> for OverflowPolicy {
    fn from(o: damper_config::Overflow) -> Self {
        match o {
            damper_config::Overflow::DropNewest => OverflowPolicy::DropNewest,
            damper_config::Overflow::DropOldest => OverflowPolicy::DropOldest,
        }
    }
}

impl From<&damper_config::ChannelCfg> for ChannelCfg {
    fn from(c: &damper_config::ChannelCfg) -> Self {
        Self {
            capacity: c.capacity,
            overflow: c.overflow.into(),
        }
    }
}

// ── Sample log ───────────────────────────────────────────────────────────────

impl From<&damper_config::SampleLogCfg> for LogCfg {
    fn from(c: &damper_config::SampleLogCfg) -> Self {
        Self {
            flush_every: c.flush_every,
        }
    }
}

// ── Model ────────────────────────────────────────────────────────────────────

impl TryFrom<&damper_config::Profile> for NormalizationProfile {
    type Error = DamperError;

    fn try_from(p: &damper_config::Profile) -> Result<Self, Self::Error> {
        NormalizationProfile::new(p.mean.clone(), p.scale.clone())
    }
}

fn invalid_artifact(e: eyre::Report) -> DamperError {
    DamperError::Config(format!("model artifact: {e}"))
}

impl TryFrom<&LinearArtifact> for LinearOracle {
    type Error = DamperError;

    fn try_from(a: &LinearArtifact) -> Result<Self, Self::Error> {
        a.validate().map_err(invalid_artifact)?;
        Ok(Self {
            weights: a.weights.clone(),
            bias: a.bias,
            classes: a.classes,
        })
    }
}

impl TryFrom<&ForestArtifact> for ForestOracle {
    type Error = DamperError;

    fn try_from(a: &ForestArtifact) -> Result<Self, Self::Error> {
        a.validate().map_err(invalid_artifact)?;
        let trees = a
            .trees
            .iter()
            .map(|t| Tree {
                nodes: t
                    .nodes
                    .iter()
                    .map(|n| match *n {
                        NodeArtifact::Split {
                            feature,
                            threshold,
                            left,
                            right,
                        } => Node::Split {
                            feature,
                            threshold,
                            left,
                            right,
                        },
                        NodeArtifact::Leaf { value } => Node::Leaf(value),
                    })
                    .collect(),
            })
            .collect();
        Ok(Self {
            mode: match a.task {
                ForestTask::Regression => ForestMode::Regression,
                ForestTask::Classification => ForestMode::Classification,
            },
            n_features: a.n_features,
            trees,
        })
    }
}
