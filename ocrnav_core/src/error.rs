use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum NavError {
    #[error("key input error: {0}")]
    Input(String),
    #[error("backend fault: {0}")]
    Fault(String),
    #[error("no OCR region configured")]
    MissingRegion,
    #[error("configuration error: {0}")]
    Config(String),
    #[error("cancelled by operator")]
    Cancelled,
    #[error("calibration of key {key:?} not verified after {attempts} attempts")]
    CalibrationExhausted { key: String, attempts: u32 },
    #[error("destination not reached within {0} ticks")]
    TickBudgetExhausted(u64),
}

/// Why a position sample produced no update. Always transient.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Unreadable {
    #[error("no OCR region configured")]
    NoRegion,
    #[error("screen capture failed: {0}")]
    Capture(String),
    #[error("text recognition failed: {0}")]
    Recognition(String),
    #[error("no coordinate triplet in {0:?}")]
    NoCoordinates(String),
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing screen capture")]
    MissingCapture,
    #[error("missing text recognizer")]
    MissingRecognizer,
    #[error("missing key input")]
    MissingInput,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
