//! Persistence errors.

use crate::config::ConfigError;

/// Errors raised while dumping or loading a tree.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    /// The sink or source failed.
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),
    /// The payload could not be encoded or decoded (unknown tag, truncated
    /// stream, malformed data).
    #[error("malformed payload: {0}")]
    Codec(#[from] postcard::Error),
    /// The payload decoded but its contents are inconsistent.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
    /// A split condition names a predictor the model does not have.
    #[error("predictor {name:?} is not part of the model")]
    UnknownPredictor { name: String },
    /// The supplied configuration does not fit the loaded model.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
