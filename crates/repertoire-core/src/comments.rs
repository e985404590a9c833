//! Positional comments, stored outside the tree and keyed by FEN.

use std::collections::{BTreeSet, HashMap};
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::RepertoireError;
use crate::fen_index::normalize_fen;

/// Normalized FEN -> comment text.
pub type CommentMap = HashMap<String, String>;

/// Bulk comment lookup. Implementations receive normalized FENs and must
/// answer an empty request with an empty map.
#[async_trait]
pub trait CommentSource: Send + Sync {
    async fn get_comments(&self, fens: &BTreeSet<String>) -> Result<CommentMap, RepertoireError>;
}

/// Source with no comments at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoComments;

#[async_trait]
impl CommentSource for NoComments {
    async fn get_comments(&self, _fens: &BTreeSet<String>) -> Result<CommentMap, RepertoireError> {
        Ok(CommentMap::new())
    }
}

/// Process-local comment store.
#[derive(Debug, Default)]
pub struct InMemoryComments {
    comments: RwLock<CommentMap>,
}

impl InMemoryComments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(map: CommentMap) -> Self {
        let store = Self::new();
        for (fen, text) in map {
            store.set(&fen, &text);
        }
        store
    }

    /// Store `text` for a position; blank text removes the comment.
    pub fn set(&self, fen: &str, text: &str) {
        let key = normalize_fen(fen);
        let mut comments = self.comments.write().unwrap_or_else(|e| e.into_inner());
        if text.trim().is_empty() {
            comments.remove(&key);
        } else {
            comments.insert(key, text.to_string());
        }
    }

    pub fn remove(&self, fen: &str) -> Option<String> {
        let mut comments = self.comments.write().unwrap_or_else(|e| e.into_inner());
        comments.remove(&normalize_fen(fen))
    }

    pub fn get(&self, fen: &str) -> Option<String> {
        let comments = self.comments.read().unwrap_or_else(|e| e.into_inner());
        comments.get(&normalize_fen(fen)).cloned()
    }

    pub fn snapshot(&self) -> CommentMap {
        self.comments.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl CommentSource for InMemoryComments {
    async fn get_comments(&self, fens: &BTreeSet<String>) -> Result<CommentMap, RepertoireError> {
        let comments = self.comments.read().unwrap_or_else(|e| e.into_inner());
        Ok(fens
            .iter()
            .filter_map(|fen| {
                let key = normalize_fen(fen);
                comments.get(&key).map(|text| (key, text.clone()))
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AFTER_E4: &str = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1";

    #[tokio::test]
    async fn test_lookup_uses_normalized_keys() {
        let store = InMemoryComments::new();
        store.set(AFTER_E4, "King's pawn");
        let fens = BTreeSet::from([normalize_fen(AFTER_E4)]);
        let map = store.get_comments(&fens).await.unwrap();
        assert_eq!(map.get(&normalize_fen(AFTER_E4)).map(String::as_str), Some("King's pawn"));
    }

    #[tokio::test]
    async fn test_empty_request_returns_empty_map() {
        let store = InMemoryComments::new();
        store.set(AFTER_E4, "note");
        assert!(store.get_comments(&BTreeSet::new()).await.unwrap().is_empty());
        assert!(NoComments.get_comments(&BTreeSet::new()).await.unwrap().is_empty());
    }

    #[test]
    fn test_blank_text_removes_comment() {
        let store = InMemoryComments::new();
        store.set(AFTER_E4, "note");
        store.set(AFTER_E4, "   ");
        assert_eq!(store.get(AFTER_E4), None);
        assert!(store.snapshot().is_empty());
    }
}
