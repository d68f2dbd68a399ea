//! Builder that validates every part of the pipeline before any thread starts.
//!
//! `try_build()` reports the first missing part or inconsistent setting as a
//! typed `BuildError` / `DamperError` inside an `eyre::Report`.

use std::io::Write;
use std::sync::Arc;

use damper_traits::{ActuatorPort, Oracle, SensorPort};

use crate::acquisition::AcquisitionTask;
use crate::actuation::ActuationTask;
use crate::channel::prediction_channel;
use crate::config::{ChannelCfg, TimingCfg, WindowCfg};
use crate::error::{BuildError, DamperError, Result};
use crate::normalize::{FeatureNormalizer, NormalizationProfile};
use crate::sample_log::SampleLogger;

/// Both tasks, wired together and ready to run.
pub struct Pipeline<S, A, W: Write> {
    pub(crate) acquisition: AcquisitionTask<S, W>,
    pub(crate) actuation: ActuationTask<A>,
}

impl<S, A, W: Write> core::fmt::Debug for Pipeline<S, A, W> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Pipeline").finish_non_exhaustive()
    }
}

impl<S: SensorPort, A: ActuatorPort, W: Write> Pipeline<S, A, W> {
    pub fn builder() -> PipelineBuilder<S, A, W> {
        PipelineBuilder::default()
    }

    /// Split into the two tasks, for driving them step by step.
    pub fn into_tasks(self) -> (AcquisitionTask<S, W>, ActuationTask<A>) {
        (self.acquisition, self.actuation)
    }
}

pub struct PipelineBuilder<S, A, W: Write> {
    sensor: Option<S>,
    actuator: Option<A>,
    log: Option<SampleLogger<W>>,
    oracle: Option<Arc<dyn Oracle>>,
    profile: Option<Arc<NormalizationProfile>>,
    timing: Option<TimingCfg>,
    window: Option<WindowCfg>,
    channel: Option<ChannelCfg>,
}

impl<S, A, W: Write> Default for PipelineBuilder<S, A, W> {
    fn default() -> Self {
        Self {
            sensor: None,
            actuator: None,
            log: None,
            oracle: None,
            profile: None,
            timing: None,
            window: None,
            channel: None,
        }
    }
}

fn invalid(msg: &'static str) -> eyre::Report {
    eyre::Report::new(BuildError::InvalidConfig(msg))
}

impl<S: SensorPort, A: ActuatorPort, W: Write> PipelineBuilder<S, A, W> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sensor(mut self, sensor: S) -> Self {
        self.sensor = Some(sensor);
        self
    }
    pub fn with_actuator(mut self, actuator: A) -> Self {
        self.actuator = Some(actuator);
        self
    }
    pub fn with_sample_log(mut self, log: SampleLogger<W>) -> Self {
        self.log = Some(log);
        self
    }
    pub fn with_oracle(mut self, oracle: Arc<dyn Oracle>) -> Self {
        self.oracle = Some(oracle);
        self
    }
    pub fn with_profile(mut self, profile: Arc<NormalizationProfile>) -> Self {
        self.profile = Some(profile);
        self
    }
    pub fn with_timing(mut self, timing: TimingCfg) -> Self {
        self.timing = Some(timing);
        self
    }
    pub fn with_window(mut self, window: WindowCfg) -> Self {
        self.window = Some(window);
        self
    }
    pub fn with_channel(mut self, channel: ChannelCfg) -> Self {
        self.channel = Some(channel);
        self
    }

    pub fn try_build(self) -> Result<Pipeline<S, A, W>> {
        let sensor = self
            .sensor
            .ok_or_else(|| eyre::Report::new(BuildError::MissingSensor))?;
        let actuator = self
            .actuator
            .ok_or_else(|| eyre::Report::new(BuildError::MissingActuator))?;
        let log = self
            .log
            .ok_or_else(|| eyre::Report::new(BuildError::MissingLog))?;
        let oracle = self
            .oracle
            .ok_or_else(|| eyre::Report::new(BuildError::MissingOracle))?;
        let profile = self
            .profile
            .ok_or_else(|| eyre::Report::new(BuildError::MissingProfile))?;
        let timing = self.timing.unwrap_or_default();
        let window = self.window.unwrap_or_default();
        let channel = self.channel.unwrap_or_default();

        if timing.sample_period.is_zero() {
            return Err(invalid("sample period must be > 0"));
        }
        if timing.actuation_period.is_zero() {
            return Err(invalid("actuation period must be > 0"));
        }
        if timing.idle.is_zero() {
            return Err(invalid("idle interval must be > 0"));
        }
        if timing.idle >= timing.sample_period {
            return Err(invalid("idle interval must be shorter than the sample period"));
        }
        if window.capacity == 0 {
            return Err(invalid("window capacity must be >= 1"));
        }
        if window.stride == 0 {
            return Err(invalid("window stride must be >= 1"));
        }
        if channel.capacity == 0 {
            return Err(invalid("channel capacity must be >= 1"));
        }

        let normalizer =
            FeatureNormalizer::new(profile, window.capacity).map_err(eyre::Report::new)?;
        match oracle.input_width() {
            Some(n) if n != window.capacity => {
                return Err(eyre::Report::new(DamperError::Config(format!(
                    "model expects {n} features but the window holds {}",
                    window.capacity
                ))));
            }
            _ => {}
        }

        let (tx, rx) = prediction_channel(channel.capacity, channel.overflow);
        tracing::debug!(
            window = window.capacity,
            stride = window.stride,
            queue = channel.capacity,
            overflow = ?channel.overflow,
            "pipeline built"
        );
        Ok(Pipeline {
            acquisition: AcquisitionTask::new(sensor, log, normalizer, oracle, tx, &window, &timing),
            actuation: ActuationTask::new(actuator, rx, &timing),
        })
    }
}
