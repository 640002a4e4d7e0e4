//! Engine error types

use std::io;
use thiserror::Error;

/// Errors that prevent an editing or export operation from producing output
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to decode {what}: {source}")]
    Decode {
        what: &'static str,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to encode {format}: {source}")]
    Encode {
        format: &'static str,
        #[source]
        source: image::ImageError,
    },

    #[error("Image resource is empty")]
    EmptyResource,

    #[error("Invalid image resource: {0}")]
    InvalidResource(String),

    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Image load was cancelled: {0}")]
    LoadCancelled(String),
}

impl From<EngineError> for String {
    fn from(err: EngineError) -> Self {
        err.to_string()
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
