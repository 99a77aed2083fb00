use thiserror::Error;
use wqi_core::ModelError;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("invalid parameter set: {0}")]
    Model(#[from] ModelError),

    #[error("unknown parameter set: {0}")]
    UnknownSet(String),
}
