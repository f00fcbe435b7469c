use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChaosError {
    #[error("Unknown block type: {0}")]
    UnknownBlockType(String),

    #[error("Invalid layout: {0}")]
    InvalidLayout(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Provider timed out after {0} seconds")]
    ProviderTimeout(u64),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ChaosError>;
