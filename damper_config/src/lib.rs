#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schemas and artifact loaders for the vibration damper.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - The normalization profile CSV loader enforces headers and rejects
//!   non-finite means and zero scales.
//! - Model artifacts are JSON documents tagged by `kind`; see [`artifact`].
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub mod artifact;

pub use artifact::{ForestTask, ModelArtifact, load_artifact_json};

#[derive(Debug, Deserialize)]
pub struct Devices {
    /// Serial path of the IMU board, or "sim".
    pub sensor_port: String,
    /// Serial path of the motor controller, or "sim".
    pub actuator_port: String,
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    /// Per-read wait on the sensor line (ms).
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
    /// Pause after opening serial devices; boards reset on connect.
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
}

const fn default_baud_rate() -> u32 {
    115_200
}

const fn default_read_timeout_ms() -> u64 {
    10
}

const fn default_settle_ms() -> u64 {
    2_000
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Timing {
    pub sample_period_ms: u64,
    pub actuation_period_ms: u64,
    /// Back-off between polls while waiting for the next tick (µs).
    pub idle_us: u64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            sample_period_ms: 10,
            actuation_period_ms: 20,
            idle_us: 1_000,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    #[default]
    Z,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct WindowCfg {
    /// Number of most recent samples fed to the model.
    pub capacity: usize,
    /// Run inference every `stride` samples once the window is full.
    pub stride: usize,
    pub axis: Axis,
}

impl Default for WindowCfg {
    fn default() -> Self {
        Self {
            capacity: 50,
            stride: 10,
            axis: Axis::Z,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Overflow {
    #[default]
    DropNewest,
    DropOldest,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ChannelCfg {
    pub capacity: usize,
    pub overflow: Overflow,
}

impl Default for ChannelCfg {
    fn default() -> Self {
        Self {
            capacity: 5,
            overflow: Overflow::DropNewest,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ModelCfg {
    /// CSV with headers `mean,scale`, one row per window position.
    pub profile: PathBuf,
    /// JSON oracle artifact.
    pub artifact: PathBuf,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SampleLogCfg {
    pub path: PathBuf,
    /// Flush to disk every N records.
    pub flush_every: usize,
}

impl Default for SampleLogCfg {
    fn default() -> Self {
        Self {
            path: PathBuf::from("imu_log.csv"),
            flush_every: 20,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub devices: Devices,
    #[serde(default)]
    pub timing: Timing,
    #[serde(default)]
    pub window: WindowCfg,
    #[serde(default)]
    pub channel: ChannelCfg,
    pub model: ModelCfg,
    #[serde(default)]
    pub sample_log: SampleLogCfg,
    #[serde(default)]
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Devices
        if self.devices.sensor_port.trim().is_empty() {
            eyre::bail!("devices.sensor_port must not be empty");
        }
        if self.devices.actuator_port.trim().is_empty() {
            eyre::bail!("devices.actuator_port must not be empty");
        }
        if self.devices.baud_rate == 0 {
            eyre::bail!("devices.baud_rate must be > 0");
        }
        if self.devices.read_timeout_ms == 0 {
            eyre::bail!("devices.read_timeout_ms must be >= 1");
        }
        if self.devices.settle_ms > 60_000 {
            eyre::bail!("devices.settle_ms is unreasonably large (>60s)");
        }

        // Timing
        if self.timing.sample_period_ms == 0 {
            eyre::bail!("timing.sample_period_ms must be > 0");
        }
        if self.timing.actuation_period_ms == 0 {
            eyre::bail!("timing.actuation_period_ms must be > 0");
        }
        if self.timing.idle_us == 0 {
            eyre::bail!("timing.idle_us must be > 0");
        }
        if self.timing.idle_us >= self.timing.sample_period_ms.saturating_mul(1_000) {
            eyre::bail!("timing.idle_us must be shorter than timing.sample_period_ms");
        }

        // Window
        if self.window.capacity == 0 {
            eyre::bail!("window.capacity must be >= 1");
        }
        if self.window.stride == 0 {
            eyre::bail!("window.stride must be >= 1");
        }

        // Channel
        if self.channel.capacity == 0 {
            eyre::bail!("channel.capacity must be >= 1");
        }

        // Sample log
        if self.sample_log.flush_every == 0 {
            eyre::bail!("sample_log.flush_every must be >= 1");
        }
        if self.sample_log.path.as_os_str().is_empty() {
            eyre::bail!("sample_log.path must not be empty");
        }

        Ok(())
    }
}

/// Normalization profile CSV schema.
///
/// Expected headers:
/// mean,scale
///
/// Example:
/// mean,scale
/// 0.998,0.041
/// 1.002,0.039
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct ProfileRow {
    pub mean: f64,
    pub scale: f64,
}

/// Per-position standardization parameters, one entry per window slot.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl Profile {
    pub fn from_rows(rows: &[ProfileRow]) -> eyre::Result<Self> {
        if rows.is_empty() {
            eyre::bail!("normalization profile has no rows");
        }
        for (i, r) in rows.iter().enumerate() {
            if !r.mean.is_finite() {
                eyre::bail!("normalization profile row {}: mean is not finite", i + 2);
            }
            if !r.scale.is_finite() || r.scale == 0.0 {
                eyre::bail!(
                    "normalization profile row {}: scale must be finite and non-zero",
                    i + 2
                );
            }
        }
        Ok(Self {
            mean: rows.iter().map(|r| r.mean).collect(),
            scale: rows.iter().map(|r| r.scale).collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.mean.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mean.is_empty()
    }
}

/// Parse a profile from any CSV reader, enforcing the `mean,scale` header.
pub fn profile_from_reader<R: std::io::Read>(reader: R) -> eyre::Result<Profile> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read profile CSV headers: {}", e))?
        .clone();
    let expected = ["mean", "scale"];
    let actual: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
    if actual != expected {
        eyre::bail!(
            "profile CSV must have headers 'mean,scale', got: {}",
            actual.join(",")
        );
    }

    let mut rows = Vec::new();
    for (idx, rec) in rdr.deserialize::<ProfileRow>().enumerate() {
        match rec {
            Ok(row) => rows.push(row),
            Err(e) => {
                eyre::bail!("invalid profile CSV row {}: {}", idx + 2, e);
            }
        }
    }

    Profile::from_rows(&rows)
}

pub fn load_profile_csv(path: &Path) -> eyre::Result<Profile> {
    let file = std::fs::File::open(path)
        .map_err(|e| eyre::eyre!("open profile CSV {:?}: {}", path, e))?;
    profile_from_reader(file).map_err(|e| eyre::eyre!("{:?}: {}", path, e))
}
