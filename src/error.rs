//! Error types and result alias for the Titan crate.
//!
//! All public APIs that can fail return [`Result<T>`]. Tool failures are not
//! errors in this sense: lookups degrade to explanatory strings that are fed
//! back to the model, so only gateway and serialization failures surface here.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TitanError {
    #[error("Ollama gateway error: {0}")]
    GatewayError(String),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TitanError>;
