//! Tool error types

use repertoire_core::RepertoireError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No variant named '{0}'")]
    UnknownVariant(String),

    #[error(transparent)]
    Repertoire(#[from] RepertoireError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
