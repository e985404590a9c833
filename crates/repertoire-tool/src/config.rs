//! Tool configuration from environment variables

use std::env;
use std::path::PathBuf;

use repertoire_core::Side;

use crate::error::ToolError;

#[derive(Clone, Debug)]
pub struct ToolConfig {
    /// Repertoire name used in the PGN header when exporting a whole tree
    pub name: String,

    /// Board orientation: the repertoire name goes on this side's tag
    pub orientation: Side,

    /// PGN Annotator tag
    pub annotator: String,

    /// PGN Site tag
    pub site: String,

    /// JSON file with FEN -> comment text
    pub comments_path: Option<PathBuf>,
}

impl ToolConfig {
    pub fn from_env() -> Result<Self, ToolError> {
        let orientation = match env::var("REPERTOIRE_ORIENTATION") {
            Ok(value) => parse_side(&value)?,
            Err(_) => Side::White,
        };

        Ok(Self {
            name: env::var("REPERTOIRE_NAME").unwrap_or_else(|_| "Repertoire".to_string()),
            orientation,
            annotator: env::var("REPERTOIRE_ANNOTATOR").unwrap_or_else(|_| "?".to_string()),
            site: env::var("REPERTOIRE_SITE").unwrap_or_else(|_| "?".to_string()),
            comments_path: env::var("REPERTOIRE_COMMENTS_PATH").ok().map(PathBuf::from),
        })
    }
}

pub fn parse_side(value: &str) -> Result<Side, ToolError> {
    match value.trim().to_lowercase().as_str() {
        "white" | "w" => Ok(Side::White),
        "black" | "b" => Ok(Side::Black),
        other => Err(ToolError::Config(format!(
            "orientation must be 'white' or 'black', got '{other}'"
        ))),
    }
}
