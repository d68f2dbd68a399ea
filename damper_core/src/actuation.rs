//! Paced output loop: hold the latest prediction and resend it every period.
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use damper_traits::clock::Clock;
use damper_traits::{ActuatorPort, Prediction};

use crate::channel::PredictionRx;
use crate::error::DamperError;
use crate::frame::encode_command;
use crate::hw_error::map_device_error;
use crate::stats::ActuationStats;
use crate::util::tick_due;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActuationStep {
    Idle,
    Sent(Prediction),
}

pub struct ActuationExit<A> {
    pub actuator: A,
    pub stats: ActuationStats,
    pub fault: Option<DamperError>,
}

pub struct ActuationTask<A> {
    actuator: A,
    rx: PredictionRx,
    period: Duration,
    idle: Duration,
    state: Prediction,
    last_sent: Option<Instant>,
    stats: ActuationStats,
}

impl<A: ActuatorPort> ActuationTask<A> {
    pub(crate) fn new(actuator: A, rx: PredictionRx, timing: &crate::config::TimingCfg) -> Self {
        Self {
            actuator,
            rx,
            period: timing.actuation_period,
            idle: timing.idle,
            state: Prediction::default(),
            last_sent: None,
            stats: ActuationStats::default(),
        }
    }

    /// The value that will go out on the next send.
    pub fn current(&self) -> Prediction {
        self.state
    }

    pub fn stats(&self) -> ActuationStats {
        self.stats
    }

    /// Take at most one pending prediction, then send if the period has elapsed.
    pub fn step(&mut self, now: Instant) -> Result<ActuationStep, DamperError> {
        if let Some(p) = self.rx.try_pop() {
            self.state = p;
            self.stats.consumed += 1;
        }
        if !tick_due(self.last_sent, now, self.period) {
            return Ok(ActuationStep::Idle);
        }
        self.actuator
            .write_line(&encode_command(&self.state))
            .map_err(|e| map_device_error("actuator", &*e))?;
        self.last_sent = Some(now);
        self.stats.transmissions += 1;
        Ok(ActuationStep::Sent(self.state))
    }

    pub fn run<C: Clock>(mut self, clock: &C, stop: &AtomicBool) -> ActuationExit<A> {
        tracing::debug!(period_ms = self.period.as_millis() as u64, "actuation started");
        let mut fault = None;
        while !stop.load(Ordering::Relaxed) {
            if let Err(e) = self.step(clock.now()) {
                tracing::error!(error = %e, "actuation fault");
                stop.store(true, Ordering::Relaxed);
                fault = Some(e);
                break;
            }
            clock.sleep(self.idle);
        }
        tracing::info!(
            transmissions = self.stats.transmissions,
            consumed = self.stats.consumed,
            "actuation stopped"
        );
        ActuationExit {
            actuator: self.actuator,
            stats: self.stats,
            fault,
        }
    }
}
