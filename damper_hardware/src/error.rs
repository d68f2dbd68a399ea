use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("serial error: {0}")]
    Serial(String),
    #[error("{0} device disconnected: {1}")]
    Disconnected(&'static str, String),
    #[error("{0} write timeout")]
    WriteTimeout(&'static str),
    #[error("{0} device already closed")]
    Closed(&'static str),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HwError>;
