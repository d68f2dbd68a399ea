//! Thread orchestration and ordered shutdown.
use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use damper_traits::clock::Clock;
use damper_traits::{ActuatorPort, SensorPort};

use crate::acquisition::AcquisitionExit;
use crate::actuation::ActuationExit;
use crate::builder::Pipeline;
use crate::error::{DamperError, Result};
use crate::stats::{AcquisitionStats, ActuationStats, RunSummary};

/// Raises the stop flag when a task thread ends, including by unwinding,
/// so the peer task never outlives it.
struct RaiseOnExit(Arc<AtomicBool>);

impl Drop for RaiseOnExit {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

impl<S, A, W> Pipeline<S, A, W>
where
    S: SensorPort + Send + 'static,
    A: ActuatorPort + Send + 'static,
    W: Write + Send + 'static,
{
    /// Run both tasks until `stop` is raised or one of them faults.
    ///
    /// After both threads are joined the sensor, the actuator and the sample
    /// log are closed in that order, once each. The first runtime fault, if
    /// any, is returned after shutdown completes.
    pub fn run<C>(self, clock: C, stop: Arc<AtomicBool>) -> Result<RunSummary>
    where
        C: Clock + Clone + Send + 'static,
    {
        let started = clock.now();
        let Pipeline {
            acquisition,
            actuation,
        } = self;

        let acq = thread::Builder::new()
            .name("damper-acquisition".into())
            .spawn({
                let clock = clock.clone();
                let stop = stop.clone();
                move || {
                    let _raise = RaiseOnExit(stop.clone());
                    acquisition.run(&clock, &stop)
                }
            })
            .map_err(|e| {
                eyre::Report::new(DamperError::Spawn {
                    task: "acquisition",
                    reason: e.to_string(),
                })
            })?;

        let act = thread::Builder::new()
            .name("damper-actuation".into())
            .spawn({
                let clock = clock.clone();
                let stop = stop.clone();
                move || {
                    let _raise = RaiseOnExit(stop.clone());
                    actuation.run(&clock, &stop)
                }
            });
        let act = match act {
            Ok(h) => Some(h),
            Err(e) => {
                stop.store(true, Ordering::Relaxed);
                tracing::error!(error = %e, "failed to spawn actuation thread");
                None
            }
        };
        tracing::info!("pipeline running");

        let acq_exit = acq.join().ok();
        let act_exit = act.map(|h| h.join().ok());

        let mut fault: Option<DamperError> = None;
        let mut note = |e: DamperError| {
            if fault.is_none() {
                fault = Some(e);
            }
        };

        let (sensor, logger, acq_stats) = match acq_exit {
            Some(AcquisitionExit {
                sensor,
                logger,
                stats,
                fault: task_fault,
            }) => {
                if let Some(e) = task_fault {
                    note(e);
                }
                (Some(sensor), Some(logger), stats)
            }
            None => {
                tracing::error!("acquisition thread panicked");
                note(DamperError::TaskPanicked("acquisition"));
                (None, None, AcquisitionStats::default())
            }
        };
        let (actuator, act_stats) = match act_exit {
            Some(Some(ActuationExit {
                actuator,
                stats,
                fault: task_fault,
            })) => {
                if let Some(e) = task_fault {
                    note(e);
                }
                (Some(actuator), stats)
            }
            Some(None) => {
                tracing::error!("actuation thread panicked");
                note(DamperError::TaskPanicked("actuation"));
                (None, ActuationStats::default())
            }
            None => {
                note(DamperError::Spawn {
                    task: "actuation",
                    reason: "thread spawn failed".into(),
                });
                (None, ActuationStats::default())
            }
        };

        if let Some(mut s) = sensor {
            if let Err(e) = s.close() {
                tracing::warn!(error = %e, "sensor close failed");
            }
        }
        if let Some(mut a) = actuator {
            if let Err(e) = a.close() {
                tracing::warn!(error = %e, "actuator close failed");
            }
        }
        if let Some(log) = logger {
            let records = log.records();
            match log.close() {
                Ok(inner) => {
                    drop(inner);
                    tracing::debug!(records, "sample log closed");
                }
                Err(e) => note(e),
            }
        }

        let summary = RunSummary {
            acquisition: acq_stats,
            actuation: act_stats,
            elapsed: clock.elapsed_since(started),
        };
        match fault {
            Some(e) => Err(eyre::Report::new(e)),
            None => {
                tracing::info!(
                    frames = summary.acquisition.frames,
                    transmissions = summary.actuation.transmissions,
                    "pipeline stopped"
                );
                Ok(summary)
            }
        }
    }
}
