use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SimError {
    #[error("unknown key {0:?}")]
    UnknownKey(String),
    #[error("capture region is empty")]
    EmptyRegion,
    #[error("OCR engine produced no text")]
    NoText,
}

pub type Result<T> = std::result::Result<T, SimError>;
