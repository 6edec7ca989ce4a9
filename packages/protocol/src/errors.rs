//! Error types for the command protocol

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Unknown command path: {0}")]
    UnknownPath(String),

    #[error("Invalid uuid in path: {0}")]
    InvalidUuid(String),

    #[error("Invalid placement: {0} (expected \"before\" or \"after\")")]
    InvalidPlacement(String),

    #[error("Failed to encode payload value {key}: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Malformed payload value {key}: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}
