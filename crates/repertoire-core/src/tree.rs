//! Move tree for an opening repertoire.
//!
//! Nodes live in an arena owned by [`MoveTree`]; children are owned through
//! index lists and the parent link is a plain index, so no insertion path can
//! create a cycle. New nodes are only ever appended as leaves.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::engine::{MoveDescriptor, Side};
use crate::error::RepertoireError;

pub const ROOT_ID: &str = "initial";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
pub struct MoveNode {
    pub id: String,
    mv: Option<MoveDescriptor>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    pub name: Option<String>,
    /// Inline comment from older persisted shapes, only a default.
    pub comment: Option<String>,
    pub turn: u32,
    pub position: usize,
    pub circles: Vec<JsonValue>,
    pub arrows: Vec<JsonValue>,
}

impl MoveNode {
    fn root() -> Self {
        Self {
            id: ROOT_ID.to_string(),
            mv: None,
            parent: None,
            children: Vec::new(),
            name: None,
            comment: None,
            turn: 0,
            position: 0,
            circles: Vec::new(),
            arrows: Vec::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.mv.is_none()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Move descriptor of a non-root node.
    ///
    /// # Panics
    /// When called on the root, which has no move.
    pub fn mv(&self) -> &MoveDescriptor {
        match &self.mv {
            Some(mv) => mv,
            None => panic!("move requested on the root node"),
        }
    }

    pub fn try_mv(&self) -> Option<&MoveDescriptor> {
        self.mv.as_ref()
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// "4. Nf3" for white, "4. ...Nf6" for black.
    pub fn label(&self) -> String {
        let mv = self.mv();
        match mv.color {
            Side::White => format!("{}. {}", self.turn, mv.san),
            Side::Black => format!("{}. ...{}", self.turn, mv.san),
        }
    }
}

/// Optional data for a node created by [`MoveTree::add_move`].
#[derive(Debug, Clone, Default)]
pub struct NewNode {
    pub name: Option<String>,
    pub comment: Option<String>,
    pub circles: Vec<JsonValue>,
    pub arrows: Vec<JsonValue>,
}

impl NewNode {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }
}

/// Parent-free persisted shape of a (sub)tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlainNode {
    pub id: String,
    #[serde(default)]
    pub r#move: Option<MoveDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Accepted from older documents, never written back.
    #[serde(default, skip_serializing)]
    pub comment: Option<String>,
    #[serde(default)]
    pub children: Vec<PlainNode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub circles: Vec<JsonValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arrows: Vec<JsonValue>,
}

#[derive(Debug, Clone)]
pub struct MoveTree {
    nodes: Vec<MoveNode>,
}

impl Default for MoveTree {
    fn default() -> Self {
        Self::new()
    }
}

impl MoveTree {
    pub fn new() -> Self {
        Self {
            nodes: vec![MoveNode::root()],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> &MoveNode {
        &self.nodes[id.0]
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// Shorthand for `node(id).mv()`; panics on the root.
    pub fn move_of(&self, id: NodeId) -> &MoveDescriptor {
        self.node(id).mv()
    }

    /// Number of arena slots, including detached nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes[0].children.is_empty()
    }

    pub fn add_move(&mut self, parent: NodeId, mv: MoveDescriptor, new: NewNode) -> NodeId {
        self.add_move_with(parent, mv, new, |_| {})
    }

    /// Insert `mv` under `parent`, or return the existing child with the same
    /// LAN untouched. `on_created` only runs for a fresh node.
    pub fn add_move_with(
        &mut self,
        parent: NodeId,
        mv: MoveDescriptor,
        new: NewNode,
        on_created: impl FnOnce(NodeId),
    ) -> NodeId {
        if let Some(existing) = self.child_by_lan(parent, &mv.lan) {
            return existing;
        }

        let parent_node = &self.nodes[parent.0];
        let turn = match &parent_node.mv {
            None => parent_node.turn + 1,
            Some(pm) if pm.color == Side::Black => parent_node.turn + 1,
            Some(_) => parent_node.turn,
        };
        let position = parent_node.position + 1;

        let id = NodeId(self.nodes.len());
        self.nodes.push(MoveNode {
            id: mv.lan.clone(),
            mv: Some(mv),
            parent: Some(parent),
            children: Vec::new(),
            name: clean_name(new.name),
            comment: new.comment,
            turn,
            position,
            circles: new.circles,
            arrows: new.arrows,
        });
        self.nodes[parent.0].children.push(id);

        on_created(id);
        id
    }

    pub fn child_by_lan(&self, parent: NodeId, lan: &str) -> Option<NodeId> {
        self.nodes[parent.0]
            .children
            .iter()
            .copied()
            .find(|c| self.nodes[c.0].id == lan)
    }

    pub fn rename(&mut self, id: NodeId, name: Option<String>) {
        self.nodes[id.0].name = clean_name(name);
    }

    pub fn set_annotations(&mut self, id: NodeId, circles: Vec<JsonValue>, arrows: Vec<JsonValue>) {
        let node = &mut self.nodes[id.0];
        node.circles = circles;
        node.arrows = arrows;
    }

    /// Detach `id` and its descendants. Returns the pruned subtree re-rooted
    /// in persisted shape, or `None` for the root or an already detached node.
    pub fn delete_move(&mut self, id: NodeId) -> Option<PlainNode> {
        let parent = self.nodes[id.0].parent?;
        let siblings = &mut self.nodes[parent.0].children;
        let idx = siblings.iter().position(|c| *c == id)?;
        siblings.remove(idx);

        let pruned = self.to_plain_subtree(id);
        self.nodes[id.0].parent = None;
        Some(pruned)
    }

    /// True when `id` is still reachable from the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            if current == self.root() {
                return true;
            }
            match self.nodes[current.0].parent {
                Some(p) => current = p,
                None => return false,
            }
        }
    }

    /// Nodes from the first move down to `id` (root excluded). Empty for the
    /// root and for nodes cut off by [`MoveTree::delete_move`].
    pub fn path_to(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = Vec::with_capacity(self.nodes[id.0].position);
        let mut current = id;
        while let Some(parent) = self.nodes[current.0].parent {
            path.push(current);
            current = parent;
        }
        if current != self.root() {
            return Vec::new();
        }
        path.reverse();
        path
    }

    pub fn lan_path(&self, id: NodeId) -> Vec<String> {
        self.path_to(id)
            .into_iter()
            .map(|n| self.nodes[n.0].id.clone())
            .collect()
    }

    /// Follow a LAN path from the root.
    pub fn find_path<S: AsRef<str>>(&self, lans: &[S]) -> Option<NodeId> {
        lans.iter()
            .try_fold(self.root(), |node, lan| self.child_by_lan(node, lan.as_ref()))
    }

    pub fn to_plain_subtree(&self, id: NodeId) -> PlainNode {
        let node = &self.nodes[id.0];
        PlainNode {
            id: node.id.clone(),
            r#move: node.mv.clone(),
            name: node.name.clone(),
            comment: None,
            children: node
                .children
                .iter()
                .map(|c| self.to_plain_subtree(*c))
                .collect(),
            circles: node.circles.clone(),
            arrows: node.arrows.clone(),
        }
    }

    /// Rebuild live nodes from a persisted document. Every node below the
    /// document root must carry a move.
    ///
    /// A document whose top node has a move (a subtree pruned by
    /// [`MoveTree::delete_move`]) is re-rooted: that move becomes the first
    /// move of the rebuilt tree, so it must be a white move.
    pub fn from_plain(plain: &PlainNode) -> Result<Self, RepertoireError> {
        let mut tree = Self::new();
        let root = tree.root();

        if plain.r#move.is_some() {
            tree.attach_plain(root, plain)?;
            return Ok(tree);
        }

        {
            let root_node = &mut tree.nodes[0];
            root_node.name = clean_name(plain.name.clone());
            root_node.comment = plain.comment.clone();
            root_node.circles = plain.circles.clone();
            root_node.arrows = plain.arrows.clone();
        }
        for child in &plain.children {
            tree.attach_plain(root, child)?;
        }
        Ok(tree)
    }

    fn attach_plain(&mut self, parent: NodeId, plain: &PlainNode) -> Result<(), RepertoireError> {
        let mv = plain
            .r#move
            .clone()
            .ok_or_else(|| RepertoireError::MissingMove(plain.id.clone()))?;

        let expected = match &self.nodes[parent.0].mv {
            None => Side::White,
            Some(pm) if pm.color == Side::White => Side::Black,
            Some(_) => Side::White,
        };
        if mv.color != expected {
            return Err(RepertoireError::MisplacedMove {
                id: plain.id.clone(),
                expected,
            });
        }

        if plain.id != mv.lan {
            tracing::warn!(
                id = %plain.id,
                lan = %mv.lan,
                "persisted id differs from its move, keying by move"
            );
        }
        if self.child_by_lan(parent, &mv.lan).is_some() {
            tracing::warn!(lan = %mv.lan, "duplicate sibling in persisted tree, merging");
        }

        let new = NewNode {
            name: plain.name.clone(),
            comment: plain.comment.clone(),
            circles: plain.circles.clone(),
            arrows: plain.arrows.clone(),
        };
        let id = self.add_move(parent, mv, new);
        for child in &plain.children {
            self.attach_plain(id, child)?;
        }
        Ok(())
    }
}

fn clean_name(name: Option<String>) -> Option<String> {
    name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())
}
