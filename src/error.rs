use std::io;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Unsupported module format: {0}")]
    UnsupportedFormat(String),

    #[error("Module parse error: {0}")]
    ModParse(String),

    #[error("Payload of {actual} bytes exceeds the {budget} byte budget")]
    CapacityExceeded { actual: usize, budget: usize },

    #[error("Config error: {0}")]
    Config(String),

    #[error("Format error: {0}")]
    Fmt(#[from] std::fmt::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
