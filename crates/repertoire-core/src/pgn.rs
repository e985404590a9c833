//! PGN export for repertoire trees and single variants.
//!
//! Rendering happens in two passes: every FEN the movetext will reach is
//! collected first and sent to the [`CommentSource`] in one request, then the
//! tree is walked again to emit text with the returned comments spliced in.

use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::comments::{CommentMap, CommentSource};
use crate::engine::{Board, Side};
use crate::error::RepertoireError;
use crate::fen_index::normalize_fen;
use crate::tree::{MoveNode, MoveTree, NodeId};
use crate::variants::Variant;

/// Tag pairs written above the movetext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PgnHeader {
    pub event: String,
    pub site: String,
    pub date: NaiveDate,
    pub round: String,
    /// Repertoire or variant name, written on the side of `orientation`.
    pub name: String,
    pub orientation: Side,
    pub result: String,
    pub variant: String,
    pub annotator: String,
}

impl PgnHeader {
    pub fn new(name: impl Into<String>, orientation: Side, date: NaiveDate) -> Self {
        Self {
            event: "?".to_string(),
            site: "?".to_string(),
            date,
            round: "?".to_string(),
            name: name.into(),
            orientation,
            result: "*".to_string(),
            variant: "Standard".to_string(),
            annotator: "?".to_string(),
        }
    }

    pub fn render(&self) -> String {
        let (white, black) = match self.orientation {
            Side::White => (self.name.as_str(), "?"),
            Side::Black => ("?", self.name.as_str()),
        };
        let date = self.date.format("%Y.%m.%d").to_string();
        let tags = [
            ("Event", self.event.as_str()),
            ("Site", self.site.as_str()),
            ("Date", date.as_str()),
            ("Round", self.round.as_str()),
            ("White", white),
            ("Black", black),
            ("Result", self.result.as_str()),
            ("Variant", self.variant.as_str()),
            ("Opening", self.name.as_str()),
            ("Annotator", self.annotator.as_str()),
        ];

        let mut header = String::new();
        for (key, value) in tags {
            header.push_str(&format!("[{} \"{}\"]\n", key, escape_tag(value)));
        }
        header
    }
}

fn escape_tag(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Assemble the final document.
pub fn document(header: &PgnHeader, movetext: &str) -> String {
    if movetext.is_empty() {
        format!("{}\n*", header.render())
    } else {
        format!("{}\n{} *", header.render(), movetext)
    }
}

/// Replay the path to `node` on a copy of `start`.
pub fn board_at<B: Board>(tree: &MoveTree, node: NodeId, start: &B) -> Result<B, RepertoireError> {
    let mut board = start.clone();
    for id in tree.path_to(node) {
        board.play(tree.move_of(id))?;
    }
    Ok(board)
}

/// Normalized FENs reached by every move below `node`.
pub fn collect_tree_fens<B: Board>(
    tree: &MoveTree,
    node: NodeId,
    board: &B,
) -> Result<BTreeSet<String>, RepertoireError> {
    let mut fens = BTreeSet::new();
    collect_below(tree, node, board, &mut fens)?;
    Ok(fens)
}

fn collect_below<B: Board>(
    tree: &MoveTree,
    node: NodeId,
    board: &B,
    fens: &mut BTreeSet<String>,
) -> Result<(), RepertoireError> {
    for &child in tree.children(node) {
        let mut next = board.clone();
        next.play(tree.move_of(child))?;
        fens.insert(normalize_fen(&next.fen()));
        collect_below(tree, child, &next, fens)?;
    }
    Ok(())
}

/// Normalized FENs reached along one variant.
pub fn collect_variant_fens<B: Board>(
    tree: &MoveTree,
    variant: &Variant,
    start: &B,
) -> Result<BTreeSet<String>, RepertoireError> {
    let mut board = start.clone();
    let mut fens = BTreeSet::new();
    for &node in &variant.moves {
        board.play(tree.move_of(node))?;
        fens.insert(normalize_fen(&board.fen()));
    }
    Ok(fens)
}

/// One batched lookup. A failing source yields no comments instead of an error.
pub async fn fetch_comments<C>(source: &C, fens: &BTreeSet<String>) -> CommentMap
where
    C: CommentSource + ?Sized,
{
    if fens.is_empty() {
        return CommentMap::new();
    }
    match source.get_comments(fens).await {
        Ok(comments) => {
            tracing::debug!(requested = fens.len(), found = comments.len(), "fetched comments");
            comments
        }
        Err(e) => {
            tracing::warn!("Comment lookup failed, exporting without comments: {}", e);
            CommentMap::new()
        }
    }
}

/// Comment for the position after `node`'s move: the external map first, then
/// the node's legacy inline comment.
fn comment_for<'a>(node: &'a MoveNode, fen: &str, comments: &'a CommentMap) -> Option<String> {
    comments
        .get(&normalize_fen(fen))
        .or(node.comment.as_ref())
        .map(|text| text.replace('}', "").trim().to_string())
        .filter(|text| !text.is_empty())
}

/// `continuous` means the previous token was the preceding ply of the same
/// line, so a black move may drop its number.
fn move_token(node: &MoveNode, continuous: bool, comment: Option<&str>) -> String {
    let mv = node.mv();
    let token = match (mv.color, continuous) {
        (Side::White, _) => format!("{}. {}", node.turn, mv.san),
        (Side::Black, true) => mv.san.clone(),
        (Side::Black, false) => format!("{}... {}", node.turn, mv.san),
    };
    match comment {
        Some(text) => format!("{} {{{}}}", token, text),
        None => token,
    }
}

/// Movetext for everything below `node`; `board` is the position at `node`.
pub fn render_tree<B: Board>(
    tree: &MoveTree,
    node: NodeId,
    board: &B,
    comments: &CommentMap,
) -> Result<String, RepertoireError> {
    render_line(tree, tree.children(node), false, board, comments)
}

fn render_line<B: Board>(
    tree: &MoveTree,
    candidates: &[NodeId],
    continuous: bool,
    board: &B,
    comments: &CommentMap,
) -> Result<String, RepertoireError> {
    let Some((&first, side_lines)) = candidates.split_first() else {
        return Ok(String::new());
    };

    let first_node = tree.node(first);
    let mut after = board.clone();
    after.play(first_node.mv())?;
    let comment = comment_for(first_node, &after.fen(), comments);

    let mut pieces = vec![move_token(first_node, continuous, comment.as_deref())];

    // each side line starts again from the position before `first`
    for side in side_lines {
        let line = render_line(tree, std::slice::from_ref(side), false, board, comments)?;
        pieces.push(format!("({})", line));
    }

    let keep_numbering = side_lines.is_empty() && comment.is_none();
    pieces.push(render_line(tree, tree.children(first), keep_numbering, &after, comments)?);

    Ok(pieces
        .into_iter()
        .filter(|piece| !piece.is_empty())
        .collect::<Vec<_>>()
        .join(" "))
}

/// Movetext for a single variant, same token rules as [`render_tree`].
pub fn render_variant<B: Board>(
    tree: &MoveTree,
    variant: &Variant,
    start: &B,
    comments: &CommentMap,
) -> Result<String, RepertoireError> {
    let mut board = start.clone();
    let mut continuous = false;
    let mut tokens = Vec::with_capacity(variant.moves.len());

    for &id in &variant.moves {
        let node = tree.node(id);
        board.play(node.mv())?;
        let comment = comment_for(node, &board.fen(), comments);
        tokens.push(move_token(node, continuous, comment.as_deref()));
        continuous = comment.is_none();
    }

    Ok(tokens.join(" "))
}

/// Export the subtree below `node` (the whole repertoire for the root).
pub async fn tree_to_pgn<B, C>(
    tree: &MoveTree,
    node: NodeId,
    start: &B,
    header: &PgnHeader,
    source: &C,
) -> Result<String, RepertoireError>
where
    B: Board,
    C: CommentSource + ?Sized,
{
    let board = board_at(tree, node, start)?;
    let fens = collect_tree_fens(tree, node, &board)?;
    let comments = fetch_comments(source, &fens).await;
    let movetext = render_tree(tree, node, &board, &comments)?;
    Ok(document(header, &movetext))
}

/// Export one variant as a linear game.
pub async fn variant_to_pgn<B, C>(
    tree: &MoveTree,
    variant: &Variant,
    start: &B,
    header: &PgnHeader,
    source: &C,
) -> Result<String, RepertoireError>
where
    B: Board,
    C: CommentSource + ?Sized,
{
    let fens = collect_variant_fens(tree, variant, start)?;
    let comments = fetch_comments(source, &fens).await;
    let movetext = render_variant(tree, variant, start, &comments)?;
    Ok(document(header, &movetext))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ChessBoard;
    use crate::tree::NewNode;
    use crate::variants::enumerate_variants;

    fn add_line(tree: &mut MoveTree, sans: &[&str]) -> NodeId {
        let mut board = ChessBoard::default();
        let mut node = tree.root();
        for san in sans {
            let mv = board.play_san(san).unwrap();
            node = tree.add_move(node, mv, NewNode::default());
        }
        node
    }

    fn fen_after(sans: &[&str]) -> String {
        let mut board = ChessBoard::default();
        for san in sans {
            board.play_san(san).unwrap();
        }
        normalize_fen(&board.fen())
    }

    fn movetext(tree: &MoveTree, comments: &CommentMap) -> String {
        render_tree(tree, tree.root(), &ChessBoard::default(), comments).unwrap()
    }

    #[test]
    fn test_mainline_numbering() {
        let mut tree = MoveTree::new();
        add_line(&mut tree, &["e4", "e5", "Nf3", "Nc6"]);
        assert_eq!(movetext(&tree, &CommentMap::new()), "1. e4 e5 2. Nf3 Nc6");
    }

    #[test]
    fn test_black_side_line() {
        let mut tree = MoveTree::new();
        add_line(&mut tree, &["e4", "e5", "Nf3"]);
        add_line(&mut tree, &["e4", "c5"]);
        assert_eq!(movetext(&tree, &CommentMap::new()), "1. e4 e5 (1... c5) 2. Nf3");
    }

    #[test]
    fn test_white_side_line_renumbers_continuation() {
        let mut tree = MoveTree::new();
        add_line(&mut tree, &["e4", "e5"]);
        add_line(&mut tree, &["d4", "d5", "c4"]);
        assert_eq!(
            movetext(&tree, &CommentMap::new()),
            "1. e4 (1. d4 d5 2. c4) 1... e5"
        );
    }

    #[test]
    fn test_nested_side_lines() {
        let mut tree = MoveTree::new();
        add_line(&mut tree, &["e4", "e5", "Nf3", "Nc6"]);
        add_line(&mut tree, &["e4", "e5", "Nf3", "d6"]);
        add_line(&mut tree, &["e4", "c5", "Nf3"]);
        add_line(&mut tree, &["e4", "c5", "Nc3"]);
        assert_eq!(
            movetext(&tree, &CommentMap::new()),
            "1. e4 e5 (1... c5 2. Nf3 (2. Nc3)) 2. Nf3 Nc6 (2... d6)"
        );
    }

    #[test]
    fn test_comments_are_spliced() {
        let mut tree = MoveTree::new();
        add_line(&mut tree, &["e4", "e5"]);
        let mut comments = CommentMap::new();
        comments.insert(fen_after(&["e4"]), "Best by test".to_string());
        assert_eq!(movetext(&tree, &comments), "1. e4 {Best by test} 1... e5");
        assert_eq!(movetext(&tree, &CommentMap::new()), "1. e4 e5");
    }

    #[test]
    fn test_legacy_comment_is_default() {
        let mut tree = MoveTree::new();
        let mut board = ChessBoard::default();
        let mv = board.play_san("d4").unwrap();
        let new = NewNode {
            comment: Some("old".into()),
            ..NewNode::default()
        };
        tree.add_move(tree.root(), mv, new);
        assert_eq!(movetext(&tree, &CommentMap::new()), "1. d4 {old}");

        let mut comments = CommentMap::new();
        comments.insert(fen_after(&["d4"]), "new".to_string());
        assert_eq!(movetext(&tree, &comments), "1. d4 {new}");
    }

    #[test]
    fn test_variant_rendering_matches_tree_tokens() {
        let mut tree = MoveTree::new();
        add_line(&mut tree, &["e4", "e5", "Nf3"]);
        add_line(&mut tree, &["e4", "c5", "Nf3", "d6"]);
        let variants = enumerate_variants(&tree);
        let board = ChessBoard::default();
        let comments = CommentMap::new();
        assert_eq!(
            render_variant(&tree, &variants[1], &board, &comments).unwrap(),
            "1. e4 c5 2. Nf3 d6"
        );
    }

    #[test]
    fn test_subtree_starting_with_black() {
        let mut tree = MoveTree::new();
        add_line(&mut tree, &["e4", "e5", "Nf3"]);
        let e4 = tree.find_path(&["e2e4"]).unwrap();
        let board = board_at(&tree, e4, &ChessBoard::default()).unwrap();
        let text = render_tree(&tree, e4, &board, &CommentMap::new()).unwrap();
        assert_eq!(text, "1... e5 2. Nf3");
    }

    #[test]
    fn test_collect_tree_fens() {
        let mut tree = MoveTree::new();
        add_line(&mut tree, &["e4", "e5"]);
        add_line(&mut tree, &["d4"]);
        let fens = collect_tree_fens(&tree, tree.root(), &ChessBoard::default()).unwrap();
        let expected = BTreeSet::from([
            fen_after(&["e4"]),
            fen_after(&["e4", "e5"]),
            fen_after(&["d4"]),
        ]);
        assert_eq!(fens, expected);
    }

    #[test]
    fn test_header_orientation_and_date() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        let header = PgnHeader::new("My \"Najdorf\"", Side::Black, date);
        let text = header.render();
        assert!(text.contains("[Date \"2024.03.05\"]\n"));
        assert!(text.contains("[White \"?\"]\n"));
        assert!(text.contains("[Black \"My \\\"Najdorf\\\"\"]\n"));
        assert!(text.starts_with("[Event \"?\"]\n[Site \"?\"]\n"));
        assert!(text.ends_with("[Annotator \"?\"]\n"));
    }

    #[test]
    fn test_document_layout() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let header = PgnHeader::new("Rep", Side::White, date);
        let doc = document(&header, "1. e4");
        assert!(doc.ends_with("[Annotator \"?\"]\n\n1. e4 *"));
        assert!(document(&header, "").ends_with("\n\n*"));
    }
}
