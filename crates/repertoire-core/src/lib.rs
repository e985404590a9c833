//! Opening repertoire model: move tree, named variants, PGN export/import.

pub mod comments;
pub mod engine;
pub mod error;
pub mod fen_index;
pub mod import;
pub mod matcher;
pub mod pgn;
pub mod tree;
pub mod variants;

pub use comments::{CommentMap, CommentSource, InMemoryComments, NoComments};
pub use engine::{Board, ChessBoard, MoveDescriptor, Side, STARTING_FEN};
pub use error::RepertoireError;
pub use fen_index::{normalize_fen, FenIndex};
pub use import::{import_pgn, ImportedRepertoire};
pub use matcher::{default_variant, select_variant, DeepLink};
pub use pgn::{tree_to_pgn, variant_to_pgn, PgnHeader};
pub use tree::{MoveNode, MoveTree, NewNode, NodeId, PlainNode};
pub use variants::{enumerate_variants, Variant};
