use thiserror::Error;

/// Input-contract violations found while reading an engine tensor.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("Tensor too short: need {needed} values, got {actual}")]
    TensorTooShort { needed: usize, actual: usize },

    #[error("Invalid stride {stride}: {reason}")]
    InvalidStride { stride: usize, reason: String },

    #[error("Tensor is not in standard layout")]
    NonContiguous,
}

#[derive(Error, Debug)]
pub enum CascadeError {
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Engine error: {0}")]
    Engine(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, CascadeError>;
