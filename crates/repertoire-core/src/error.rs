//! Repertoire error types

use thiserror::Error;

use crate::engine::Side;

#[derive(Error, Debug)]
pub enum RepertoireError {
    #[error("Persisted node '{0}' has no move")]
    MissingMove(String),

    #[error("Persisted node '{id}' should be a {expected:?} move")]
    MisplacedMove { id: String, expected: Side },

    #[error("Illegal move {lan} in position {fen}")]
    IllegalMove { lan: String, fen: String },

    #[error("Illegal SAN '{san}' in position {fen}")]
    IllegalSan { san: String, fen: String },

    #[error("Invalid FEN: {0}")]
    InvalidFen(String),

    #[error("Comment lookup error: {0}")]
    Comments(String),

    #[error("PGN error: {0}")]
    Pgn(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
