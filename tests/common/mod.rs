#![allow(dead_code)]

use std::collections::BTreeSet;
use std::sync::Mutex;

use async_trait::async_trait;
use repertoire_core::{
    normalize_fen, Board, ChessBoard, CommentMap, CommentSource, MoveTree, NewNode, NodeId,
    RepertoireError,
};

/// Add a line of SAN moves from the root; returns the last node.
pub fn add_line(tree: &mut MoveTree, sans: &[&str]) -> NodeId {
    let mut board = ChessBoard::default();
    let mut node = tree.root();
    for san in sans {
        let mv = board.play_san(san).unwrap();
        node = tree.add_move(node, mv, NewNode::default());
    }
    node
}

/// Name the node reached by `sans` (which must already be in the tree).
pub fn name_at(tree: &mut MoveTree, sans: &[&str], name: &str) -> NodeId {
    let node = add_line(tree, sans);
    tree.rename(node, Some(name.to_string()));
    node
}

/// Build a tree from SAN lines; later lines share prefixes with earlier ones.
pub fn tree_from_lines(lines: &[&[&str]]) -> MoveTree {
    let mut tree = MoveTree::new();
    for line in lines {
        add_line(&mut tree, line);
    }
    tree
}

/// Normalized FEN after playing `sans` from the start position.
pub fn fen_after(sans: &[&str]) -> String {
    let mut board = ChessBoard::default();
    for san in sans {
        board.play_san(san).unwrap();
    }
    normalize_fen(&board.fen())
}

pub fn fixed_date() -> chrono::NaiveDate {
    chrono::NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()
}

/// Comment source that records every request it receives.
#[derive(Default)]
pub struct RecordingComments {
    pub comments: CommentMap,
    pub fail: bool,
    pub requests: Mutex<Vec<BTreeSet<String>>>,
}

impl RecordingComments {
    pub fn with(comments: &[(String, &str)]) -> Self {
        Self {
            comments: comments
                .iter()
                .map(|(fen, text)| (fen.clone(), text.to_string()))
                .collect(),
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<BTreeSet<String>> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl CommentSource for RecordingComments {
    async fn get_comments(&self, fens: &BTreeSet<String>) -> Result<CommentMap, RepertoireError> {
        self.requests.lock().unwrap().push(fens.clone());
        if self.fail {
            return Err(RepertoireError::Comments("backend unavailable".to_string()));
        }
        Ok(fens
            .iter()
            .filter_map(|fen| self.comments.get(fen).map(|text| (fen.clone(), text.clone())))
            .collect())
    }
}
