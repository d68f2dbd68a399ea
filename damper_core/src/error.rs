use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DamperError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("{device} connection lost: {reason}")]
    DeviceLost { device: &'static str, reason: String },
    #[error("{device} write timed out")]
    Timeout { device: &'static str },
    #[error("sample log error: {0}")]
    Log(String),
    #[error("{0} task panicked")]
    TaskPanicked(&'static str),
    #[error("failed to spawn {task} task: {reason}")]
    Spawn { task: &'static str, reason: String },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("missing sensor")]
    MissingSensor,
    #[error("missing actuator")]
    MissingActuator,
    #[error("missing sample log writer")]
    MissingLog,
    #[error("missing oracle")]
    MissingOracle,
    #[error("missing normalization profile")]
    MissingProfile,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
