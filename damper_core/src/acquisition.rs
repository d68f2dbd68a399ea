//! Paced sensor loop: read, parse, log, window, infer, publish.
use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use damper_traits::clock::Clock;
use damper_traits::{Oracle, Prediction, SensorPort};

use crate::channel::{OverflowPolicy, PredictionTx, PushOutcome};
use crate::error::DamperError;
use crate::frame::{Axis, Sample, parse_frame};
use crate::hw_error::map_device_error;
use crate::normalize::FeatureNormalizer;
use crate::sample_log::SampleLogger;
use crate::stats::AcquisitionStats;
use crate::util::tick_due;
use crate::window::WindowBuffer;

/// Outcome of one acquisition iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AcquisitionStep {
    /// Sample period not yet elapsed; nothing was read.
    Idle,
    /// The sensor had no complete line.
    Empty,
    /// A line arrived but was not a frame.
    Discarded,
    /// A frame was accepted and logged.
    Accepted(Inference),
}

/// What happened on the prediction path for an accepted sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Inference {
    /// Window not full, or not on a stride boundary.
    NotDue,
    /// Due, but the channel was full under drop-newest; the model was not run.
    Skipped,
    Ran(Prediction, PushOutcome),
}

/// Everything the acquisition thread owned, handed back on exit.
pub struct AcquisitionExit<S, W: Write> {
    pub sensor: S,
    pub logger: SampleLogger<W>,
    pub stats: AcquisitionStats,
    pub fault: Option<DamperError>,
}

pub struct AcquisitionTask<S, W: Write> {
    sensor: S,
    logger: SampleLogger<W>,
    window: WindowBuffer,
    normalizer: FeatureNormalizer,
    oracle: Arc<dyn Oracle>,
    tx: PredictionTx,
    axis: Axis,
    stride: u64,
    period: Duration,
    idle: Duration,
    epoch: Option<Instant>,
    last_tick: Option<Instant>,
    snapshot: Vec<f64>,
    features: Vec<f64>,
    stats: AcquisitionStats,
}

impl<S: SensorPort, W: Write> AcquisitionTask<S, W> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        sensor: S,
        logger: SampleLogger<W>,
        normalizer: FeatureNormalizer,
        oracle: Arc<dyn Oracle>,
        tx: PredictionTx,
        window: &crate::config::WindowCfg,
        timing: &crate::config::TimingCfg,
    ) -> Self {
        let w = window.capacity;
        Self {
            sensor,
            logger,
            window: WindowBuffer::new(w),
            normalizer,
            oracle,
            tx,
            axis: window.axis,
            stride: window.stride.max(1) as u64,
            period: timing.sample_period,
            idle: timing.idle,
            epoch: None,
            last_tick: None,
            snapshot: Vec::with_capacity(w),
            features: Vec::with_capacity(w),
            stats: AcquisitionStats::default(),
        }
    }

    pub fn stats(&self) -> AcquisitionStats {
        self.stats
    }

    pub fn window(&self) -> &WindowBuffer {
        &self.window
    }

    /// One iteration at time `now`.
    pub fn step(&mut self, now: Instant) -> Result<AcquisitionStep, DamperError> {
        if !tick_due(self.last_tick, now, self.period) {
            return Ok(AcquisitionStep::Idle);
        }
        let epoch = *self.epoch.get_or_insert(now);

        let line = match self.sensor.read_line() {
            Ok(Some(line)) => line,
            Ok(None) => {
                self.stats.empty_reads += 1;
                return Ok(AcquisitionStep::Empty);
            }
            Err(e) => return Err(map_device_error("sensor", &*e)),
        };
        let Some(frame) = parse_frame(&line) else {
            self.stats.discarded += 1;
            tracing::trace!(line = %line, "discarded non-frame line");
            return Ok(AcquisitionStep::Discarded);
        };

        let sample = Sample::from_frame(&frame, now.saturating_duration_since(epoch));
        let inference = self.accept(&sample)?;
        self.last_tick = Some(now);
        Ok(AcquisitionStep::Accepted(inference))
    }

    /// Log a sample, push its axis into the window, and infer when due.
    pub fn accept(&mut self, sample: &Sample) -> Result<Inference, DamperError> {
        self.logger.append(sample)?;
        self.stats.frames += 1;
        self.window.insert(sample.axis(self.axis));

        let due = matches!(
            self.window.insertions_past_fill(),
            Some(n) if n > 0 && n % self.stride == 0
        );
        if !due {
            return Ok(Inference::NotDue);
        }
        if self.tx.policy() == OverflowPolicy::DropNewest && self.tx.is_full() {
            self.stats.dropped += 1;
            tracing::trace!("channel full, inference skipped");
            return Ok(Inference::Skipped);
        }

        self.window.snapshot_into(&mut self.snapshot);
        self.normalizer
            .normalize_into(&self.snapshot, &mut self.features);
        let prediction = self.oracle.predict(&self.features);
        self.stats.inferences += 1;

        let outcome = self.tx.try_push(prediction);
        match outcome {
            PushOutcome::Dropped => self.stats.dropped += 1,
            PushOutcome::Evicted => self.stats.evicted += 1,
            PushOutcome::Queued | PushOutcome::Closed => {}
        }
        tracing::trace!(%prediction, ?outcome, "inference");
        Ok(Inference::Ran(prediction, outcome))
    }

    /// Loop until `stop` is raised, the consumer disappears, or a fault occurs.
    pub fn run<C: Clock>(mut self, clock: &C, stop: &AtomicBool) -> AcquisitionExit<S, W> {
        tracing::debug!(
            window = self.window.capacity(),
            stride = self.stride,
            "acquisition started"
        );
        let mut fault = None;
        while !stop.load(Ordering::Relaxed) {
            match self.step(clock.now()) {
                Ok(AcquisitionStep::Idle | AcquisitionStep::Empty) => clock.sleep(self.idle),
                Ok(AcquisitionStep::Accepted(Inference::Ran(_, PushOutcome::Closed))) => {
                    tracing::debug!("prediction consumer gone");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::error!(error = %e, "acquisition fault");
                    stop.store(true, Ordering::Relaxed);
                    fault = Some(e);
                    break;
                }
            }
        }
        let s = self.stats;
        tracing::info!(
            frames = s.frames,
            discarded = s.discarded,
            inferences = s.inferences,
            dropped = s.dropped,
            evicted = s.evicted,
            "acquisition stopped"
        );
        AcquisitionExit {
            sensor: self.sensor,
            logger: self.logger,
            stats: self.stats,
            fault,
        }
    }
}
