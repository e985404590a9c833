//! JSON files backing the tool: persisted trees and the comment store.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use repertoire_core::{
    normalize_fen, CommentMap, CommentSource, MoveTree, PlainNode, RepertoireError,
};

use crate::error::ToolError;

pub async fn load_tree(path: &Path) -> Result<MoveTree, ToolError> {
    let text = tokio::fs::read_to_string(path).await?;
    let plain: PlainNode = serde_json::from_str(&text)?;
    Ok(MoveTree::from_plain(&plain)?)
}

pub async fn save_tree(path: &Path, tree: &MoveTree) -> Result<(), ToolError> {
    let plain = tree.to_plain_subtree(tree.root());
    tokio::fs::write(path, serde_json::to_string_pretty(&plain)?).await?;
    Ok(())
}

pub async fn save_comments(path: &Path, comments: &CommentMap) -> Result<(), ToolError> {
    let sorted: std::collections::BTreeMap<_, _> = comments.iter().collect();
    tokio::fs::write(path, serde_json::to_string_pretty(&sorted)?).await?;
    Ok(())
}

/// Comments kept in a JSON object of FEN -> text, read on every request.
#[derive(Debug, Clone)]
pub struct FileCommentStore {
    path: PathBuf,
}

impl FileCommentStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn load(&self) -> Result<CommentMap, RepertoireError> {
        let text = tokio::fs::read_to_string(&self.path).await?;
        let raw: CommentMap = serde_json::from_str(&text)?;
        Ok(raw
            .into_iter()
            .map(|(fen, text)| (normalize_fen(&fen), text))
            .collect())
    }
}

#[async_trait]
impl CommentSource for FileCommentStore {
    async fn get_comments(&self, fens: &BTreeSet<String>) -> Result<CommentMap, RepertoireError> {
        if fens.is_empty() {
            return Ok(CommentMap::new());
        }
        let mut all = self
            .load()
            .await
            .map_err(|e| RepertoireError::Comments(format!("{}: {}", self.path.display(), e)))?;
        Ok(fens
            .iter()
            .filter_map(|fen| all.remove_entry(&normalize_fen(fen)))
            .collect())
    }
}
