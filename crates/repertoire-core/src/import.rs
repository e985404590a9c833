//! Build a repertoire tree from PGN, following nested variations.

use std::ops::ControlFlow;

use pgn_reader::{RawComment, RawTag, Reader, SanPlus, Skip, Visitor};

use crate::comments::CommentMap;
use crate::engine::{Board, ChessBoard, STARTING_FEN};
use crate::error::RepertoireError;
use crate::fen_index::normalize_fen;
use crate::pgn::board_at;
use crate::tree::{MoveTree, NewNode, NodeId};

/// Result of an import: the merged tree, the comments found in the movetext
/// (normalized FEN -> text) and the repertoire name taken from the tags.
#[derive(Debug, Clone, Default)]
pub struct ImportedRepertoire {
    pub tree: MoveTree,
    pub comments: CommentMap,
    pub name: Option<String>,
}

/// Tags collected during header parsing.
#[derive(Default)]
struct GameTags {
    opening: Option<String>,
    event: Option<String>,
    fen: Option<String>,
}

/// Where the next move attaches.
struct Line {
    node: NodeId,
    board: ChessBoard,
}

/// State during movetext parsing.
struct GameState {
    current: Line,
    stack: Vec<Line>,
}

/// Visitor that merges every game into one tree.
struct Importer {
    tree: MoveTree,
    comments: CommentMap,
    name: Option<String>,
    games: usize,
}

impl Importer {
    fn new() -> Self {
        Self {
            tree: MoveTree::new(),
            comments: CommentMap::new(),
            name: None,
            games: 0,
        }
    }
}

fn known(value: RawTag<'_>) -> Option<String> {
    let value = value.decode_utf8_lossy().trim().to_string();
    if value.is_empty() || value == "?" {
        None
    } else {
        Some(value)
    }
}

impl Visitor for Importer {
    type Tags = GameTags;
    type Movetext = GameState;
    type Output = Result<(), RepertoireError>;

    fn begin_tags(&mut self) -> ControlFlow<Self::Output, GameTags> {
        ControlFlow::Continue(GameTags::default())
    }

    fn tag(
        &mut self,
        tags: &mut GameTags,
        name: &[u8],
        value: RawTag<'_>,
    ) -> ControlFlow<Self::Output> {
        match name {
            b"Opening" => tags.opening = known(value),
            b"Event" => tags.event = known(value),
            b"FEN" => tags.fen = known(value),
            _ => {}
        }
        ControlFlow::Continue(())
    }

    fn begin_movetext(&mut self, tags: GameTags) -> ControlFlow<Self::Output, GameState> {
        // Repertoires always start from the initial position
        if let Some(fen) = tags.fen {
            if normalize_fen(&fen) != normalize_fen(STARTING_FEN) {
                return ControlFlow::Break(Err(RepertoireError::Pgn(format!(
                    "non-standard starting position: {fen}"
                ))));
            }
        }

        if self.name.is_none() {
            self.name = tags.opening.or(tags.event);
        }
        self.games += 1;

        ControlFlow::Continue(GameState {
            current: Line {
                node: self.tree.root(),
                board: ChessBoard::default(),
            },
            stack: Vec::new(),
        })
    }

    fn san(&mut self, state: &mut GameState, san_plus: SanPlus) -> ControlFlow<Self::Output> {
        let line = &mut state.current;
        let mv = match line.board.play_san(&san_plus.to_string()) {
            Ok(mv) => mv,
            Err(e) => return ControlFlow::Break(Err(e)),
        };
        line.node = self.tree.add_move(line.node, mv, NewNode::default());
        ControlFlow::Continue(())
    }

    fn comment(
        &mut self,
        state: &mut GameState,
        comment: RawComment<'_>,
    ) -> ControlFlow<Self::Output> {
        let text = String::from_utf8_lossy(comment.as_bytes()).trim().to_string();
        if text.is_empty() || state.current.node == self.tree.root() {
            return ControlFlow::Continue(());
        }
        let fen = normalize_fen(&state.current.board.fen());
        self.comments
            .entry(fen)
            .and_modify(|existing| {
                existing.push(' ');
                existing.push_str(&text);
            })
            .or_insert(text);
        ControlFlow::Continue(())
    }

    fn begin_variation(&mut self, state: &mut GameState) -> ControlFlow<Self::Output, Skip> {
        // A variation replaces the last move played on the current line
        let Some(parent) = self.tree.parent(state.current.node) else {
            return ControlFlow::Continue(Skip(true));
        };
        let board = match board_at(&self.tree, parent, &ChessBoard::default()) {
            Ok(board) => board,
            Err(e) => return ControlFlow::Break(Err(e)),
        };
        let resumed = std::mem::replace(&mut state.current, Line { node: parent, board });
        state.stack.push(resumed);
        ControlFlow::Continue(Skip(false))
    }

    fn end_variation(&mut self, state: &mut GameState) -> ControlFlow<Self::Output> {
        if let Some(line) = state.stack.pop() {
            state.current = line;
        }
        ControlFlow::Continue(())
    }

    fn end_game(&mut self, _state: GameState) -> Self::Output {
        Ok(())
    }
}

/// Import every game in `pgn` into a single tree.
pub fn import_pgn(pgn: &str) -> Result<ImportedRepertoire, RepertoireError> {
    let mut importer = Importer::new();
    let mut reader = Reader::new(pgn.as_bytes());

    while let Some(result) = reader.read_game(&mut importer)? {
        result?;
    }

    if importer.games == 0 {
        return Err(RepertoireError::Pgn("no game found".to_string()));
    }

    tracing::debug!(
        games = importer.games,
        nodes = importer.tree.len(),
        comments = importer.comments.len(),
        "imported PGN"
    );

    Ok(ImportedRepertoire {
        tree: importer.tree,
        comments: importer.comments,
        name: importer.name,
    })
}
