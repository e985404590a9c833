//! Normalized FEN -> node lookup for deep links.

use std::collections::HashMap;

use crate::engine::{Board, ChessBoard};
use crate::error::RepertoireError;
use crate::tree::{MoveTree, NodeId};
use crate::variants::Variant;

/// Position key shared by comments and deep links: placement, side to move,
/// castling rights and en passant, without the move counters.
///
/// Parseable FENs are re-emitted through [`ChessBoard`], so an en passant
/// square only survives when a capture is possible there (`e3` after 1. e4
/// becomes `-`). Anything else is just cut to its first four fields.
pub fn normalize_fen(fen: &str) -> String {
    let canonical = ChessBoard::from_fen(fen).map(|board| board.fen()).ok();
    canonical
        .as_deref()
        .unwrap_or(fen)
        .split_whitespace()
        .take(4)
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Clone, Default)]
pub struct FenIndex {
    nodes: HashMap<String, NodeId>,
}

impl FenIndex {
    /// Index every position reached by the variants whose `name` or
    /// `full_name` equals `filter` (all variants when `filter` is `None`).
    /// The first node to reach a position keeps it.
    pub fn build<B: Board>(
        tree: &MoveTree,
        variants: &[Variant],
        filter: Option<&str>,
        start: &B,
    ) -> Result<Self, RepertoireError> {
        let mut nodes = HashMap::new();
        nodes.insert(normalize_fen(&start.fen()), tree.root());

        let selected = variants.iter().filter(|v| match filter {
            Some(name) => v.name == name || v.full_name == name,
            None => true,
        });
        for variant in selected {
            let mut board = start.clone();
            for &node in &variant.moves {
                board.play(tree.move_of(node))?;
                nodes.entry(normalize_fen(&board.fen())).or_insert(node);
            }
        }

        tracing::debug!(positions = nodes.len(), "built FEN index");
        Ok(Self { nodes })
    }

    pub fn lookup(&self, fen: &str) -> Option<NodeId> {
        self.nodes.get(&normalize_fen(fen)).copied()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
