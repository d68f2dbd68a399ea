#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core control loop (hardware-agnostic).
//!
//! All device I/O goes through `damper_traits::SensorPort` and
//! `damper_traits::ActuatorPort`; the model is any `damper_traits::Oracle`.
//!
//! ## Architecture
//!
//! - **Frames**: line parsing and command encoding (`frame`)
//! - **Features**: rolling window and per-position normalization (`window`, `normalize`)
//! - **Models**: linear and decision-forest backends (`oracle`)
//! - **Tasks**: paced acquisition and actuation loops (`acquisition`, `actuation`)
//! - **Handoff**: bounded lossy prediction channel (`channel`)
//! - **Pipeline**: validation, threads and ordered shutdown (`builder`, `runner`)
//!
//! Acquisition infers once the window is full and then every `stride`
//! insertions; the first inference happens `stride` samples after the fill.

pub mod acquisition;
pub mod actuation;
pub mod builder;
pub mod channel;
pub mod config;
pub mod conversions;
pub mod error;
pub mod frame;
pub mod hw_error;
pub mod mocks;
pub mod normalize;
pub mod oracle;
pub mod runner;
pub mod sample_log;
pub mod stats;
pub mod util;
pub mod window;

pub use acquisition::{AcquisitionStep, AcquisitionTask, Inference};
pub use actuation::{ActuationStep, ActuationTask};
pub use builder::{Pipeline, PipelineBuilder};
pub use channel::{OverflowPolicy, PredictionRx, PredictionTx, PushOutcome, prediction_channel};
pub use config::{ChannelCfg, LogCfg, TimingCfg, WindowCfg};
pub use error::{BuildError, DamperError, Result};
pub use frame::{Axis, Frame, Sample, encode_command, parse_frame};
pub use normalize::{FeatureNormalizer, NormalizationProfile};
pub use oracle::{ForestMode, ForestOracle, LinearOracle, oracle_from_artifact};
pub use sample_log::SampleLogger;
pub use stats::{AcquisitionStats, ActuationStats, RunSummary};
pub use window::WindowBuffer;
