//! Config loading, device assembly and the `run` / `self-check` commands.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use damper_config::{Config, ModelArtifact};
use damper_core::error::DamperError;
use damper_core::stats::RunSummary;
use damper_core::{
    ChannelCfg, FeatureNormalizer, LogCfg, NormalizationProfile, Pipeline, SampleLogger,
    TimingCfg, WindowCfg, oracle_from_artifact,
};
use damper_hardware::{SIM_PORT, SimulatedActuator, SimulatedSensor};
use damper_traits::clock::MonotonicClock;
use damper_traits::{ActuatorPort, Oracle, SensorPort};
use eyre::WrapErr;

pub type DynSensor = Box<dyn SensorPort + Send>;
pub type DynActuator = Box<dyn ActuatorPort + Send>;

fn parse_error(path: &Path, text: &str, e: &toml::de::Error) -> DamperError {
    match e.span() {
        Some(span) => {
            let upto = span.start.min(text.len());
            let line = text.as_bytes()[..upto].iter().filter(|b| **b == b'\n').count() + 1;
            DamperError::Config(format!(
                "parse {} (line {line}): {}",
                path.display(),
                e.message()
            ))
        }
        None => DamperError::Config(format!("parse {}: {}", path.display(), e.message())),
    }
}

/// Read, parse and validate the TOML config; every failure is a config error.
pub fn load_config(path: &Path) -> eyre::Result<Config> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| DamperError::Config(format!("read {}: {e}", path.display())))?;
    let cfg = damper_config::load_toml(&text).map_err(|e| parse_error(path, &text, &e))?;
    cfg.validate()
        .map_err(|e| DamperError::Config(e.to_string()))?;
    Ok(cfg)
}

/// Model inputs resolved from the `[model]` section.
pub struct Assets {
    pub profile: Arc<NormalizationProfile>,
    pub oracle: Arc<dyn Oracle>,
    pub model_kind: &'static str,
    pub model_width: usize,
}

pub fn model_kind(artifact: &ModelArtifact) -> &'static str {
    match artifact {
        ModelArtifact::Linear(_) => "linear",
        ModelArtifact::Forest(_) => "forest",
    }
}

pub fn load_assets(cfg: &Config) -> eyre::Result<Assets> {
    let raw = damper_config::load_profile_csv(&cfg.model.profile)
        .map_err(|e| DamperError::Config(e.to_string()))?;
    let profile = NormalizationProfile::try_from(&raw)?;
    let artifact = damper_config::load_artifact_json(&cfg.model.artifact)
        .map_err(|e| DamperError::Config(e.to_string()))?;
    let oracle = oracle_from_artifact(&artifact)?;
    Ok(Assets {
        profile: Arc::new(profile),
        oracle,
        model_kind: model_kind(&artifact),
        model_width: artifact.input_width(),
    })
}

/// Check that profile and model agree with the window before any device is touched.
pub fn check_dimensions(assets: &Assets, window: &WindowCfg) -> eyre::Result<()> {
    FeatureNormalizer::new(assets.profile.clone(), window.capacity)?;
    if assets.model_width != window.capacity {
        return Err(DamperError::Config(format!(
            "model expects {} features but the window holds {}",
            assets.model_width, window.capacity
        ))
        .into());
    }
    Ok(())
}

#[cfg(feature = "hardware")]
fn open_serial_sensor(cfg: &Config) -> eyre::Result<DynSensor> {
    let d = &cfg.devices;
    let s = damper_hardware::serial::SerialSensor::open(
        &d.sensor_port,
        d.baud_rate,
        Duration::from_millis(d.read_timeout_ms),
    )
    .wrap_err_with(|| format!("open sensor {}", d.sensor_port))?;
    Ok(Box::new(s))
}

#[cfg(not(feature = "hardware"))]
fn open_serial_sensor(cfg: &Config) -> eyre::Result<DynSensor> {
    Err(DamperError::Config(format!(
        "devices.sensor_port = {:?} needs a build with the `hardware` feature; use \"{SIM_PORT}\" for the simulator",
        cfg.devices.sensor_port
    ))
    .into())
}

#[cfg(feature = "hardware")]
fn open_serial_actuator(cfg: &Config) -> eyre::Result<DynActuator> {
    let d = &cfg.devices;
    let a = damper_hardware::serial::SerialActuator::open(
        &d.actuator_port,
        d.baud_rate,
        Duration::from_millis(d.read_timeout_ms),
    )
    .wrap_err_with(|| format!("open actuator {}", d.actuator_port))?;
    Ok(Box::new(a))
}

#[cfg(not(feature = "hardware"))]
fn open_serial_actuator(cfg: &Config) -> eyre::Result<DynActuator> {
    Err(DamperError::Config(format!(
        "devices.actuator_port = {:?} needs a build with the `hardware` feature; use \"{SIM_PORT}\" for the simulator",
        cfg.devices.actuator_port
    ))
    .into())
}

/// Open both devices; "sim" selects the simulated backends.
pub fn open_devices(cfg: &Config, timing: &TimingCfg) -> eyre::Result<(DynSensor, DynActuator)> {
    let mut serial = false;
    let sensor: DynSensor = if cfg.devices.sensor_port == SIM_PORT {
        Box::new(SimulatedSensor::new(timing.sample_period))
    } else {
        serial = true;
        open_serial_sensor(cfg)?
    };
    let actuator: DynActuator = if cfg.devices.actuator_port == SIM_PORT {
        Box::new(SimulatedActuator::new())
    } else {
        serial = true;
        open_serial_actuator(cfg)?
    };
    if serial && cfg.devices.settle_ms > 0 {
        tracing::info!(settle_ms = cfg.devices.settle_ms, "waiting for boards to settle");
        std::thread::sleep(Duration::from_millis(cfg.devices.settle_ms));
    }
    Ok((sensor, actuator))
}

fn run_duration(secs: f64) -> Result<Duration, DamperError> {
    if !secs.is_finite() || secs <= 0.0 {
        return Err(DamperError::Config(format!(
            "--duration-s must be a positive number of seconds, got {secs}"
        )));
    }
    Ok(Duration::from_secs_f64(secs))
}

fn spawn_deadline(d: Duration, stop: Arc<AtomicBool>) -> eyre::Result<()> {
    std::thread::Builder::new()
        .name("damper-deadline".into())
        .spawn(move || {
            std::thread::sleep(d);
            tracing::debug!("run duration reached");
            stop.store(true, Ordering::Relaxed);
        })
        .wrap_err("spawn deadline thread")?;
    Ok(())
}

/// Build the pipeline from `cfg` and run it until `stop` is raised.
pub fn run_loop(
    cfg: &Config,
    duration_s: Option<f64>,
    stop: Arc<AtomicBool>,
) -> eyre::Result<(RunSummary, &'static str)> {
    let timing: TimingCfg = (&cfg.timing).into();
    let window: WindowCfg = (&cfg.window).into();
    let channel: ChannelCfg = (&cfg.channel).into();
    let log: LogCfg = (&cfg.sample_log).into();
    let deadline = duration_s.map(run_duration).transpose()?;

    let assets = load_assets(cfg)?;
    check_dimensions(&assets, &window)?;

    let logger = SampleLogger::create(&cfg.sample_log.path, log.flush_every)?;
    let (sensor, actuator) = open_devices(cfg, &timing)?;

    let pipeline = Pipeline::builder()
        .with_sensor(sensor)
        .with_actuator(actuator)
        .with_sample_log(logger)
        .with_oracle(assets.oracle.clone())
        .with_profile(assets.profile.clone())
        .with_timing(timing)
        .with_window(window.clone())
        .with_channel(channel)
        .try_build()?;

    if let Some(d) = deadline {
        spawn_deadline(d, stop.clone())?;
    }

    tracing::info!(
        sensor = %cfg.devices.sensor_port,
        actuator = %cfg.devices.actuator_port,
        model = assets.model_kind,
        window = window.capacity,
        stride = window.stride,
        "run start"
    );
    let summary = pipeline.run(MonotonicClock::new(), stop)?;
    tracing::info!(
        frames = summary.acquisition.frames,
        inferences = summary.acquisition.inferences,
        transmissions = summary.actuation.transmissions,
        "run complete"
    );
    Ok((summary, assets.model_kind))
}

pub fn summary_json(summary: &RunSummary, model: &str) -> serde_json::Value {
    let ts = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0);
    let a = &summary.acquisition;
    let t = &summary.actuation;
    serde_json::json!({
        "timestamp": ts,
        "model": model,
        "duration_ms": summary.elapsed.as_millis() as u64,
        "frames": a.frames,
        "discarded": a.discarded,
        "empty_reads": a.empty_reads,
        "inferences": a.inferences,
        "dropped": a.dropped,
        "evicted": a.evicted,
        "transmissions": t.transmissions,
        "consumed": t.consumed,
        "sample_rate_hz": summary.sample_rate_hz(),
    })
}

/// Print per-task counters to stderr.
pub fn print_stats(summary: &RunSummary, timing: &TimingCfg) {
    let a = &summary.acquisition;
    let t = &summary.actuation;
    eprintln!("\n--- Damper Stats ---");
    eprintln!("Elapsed (s): {:.3}", summary.elapsed.as_secs_f64());
    eprintln!(
        "Frames: {} (discarded {}, empty reads {})",
        a.frames, a.discarded, a.empty_reads
    );
    eprintln!(
        "Sample rate (Hz): {:.1} (target {:.1})",
        summary.sample_rate_hz(),
        1.0 / timing.sample_period.as_secs_f64()
    );
    eprintln!(
        "Inferences: {} (dropped {}, evicted {})",
        a.inferences, a.dropped, a.evicted
    );
    eprintln!(
        "Commands sent: {} (new predictions {})",
        t.transmissions, t.consumed
    );
    eprintln!("--------------------\n");
}
