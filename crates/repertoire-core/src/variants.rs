//! Flatten a move tree into named root-to-leaf variants.

use serde::Serialize;

use crate::tree::{MoveTree, NodeId};

/// One complete line of the repertoire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    #[serde(skip)]
    pub moves: Vec<NodeId>,
    pub name: String,
    pub full_name: String,
    pub different_moves: String,
}

impl Variant {
    pub fn leaf(&self) -> Option<NodeId> {
        self.moves.last().copied()
    }

    pub fn lans(&self, tree: &MoveTree) -> Vec<String> {
        self.moves.iter().map(|n| tree.node(*n).id.clone()).collect()
    }

    pub fn sans(&self, tree: &MoveTree) -> Vec<String> {
        self.moves.iter().map(|n| tree.move_of(*n).san.clone()).collect()
    }
}

/// Traversal state handed down to each child.
struct Branch<'a> {
    path: Vec<NodeId>,
    inherited: Option<&'a str>,
    different: Vec<NodeId>,
}

/// Enumerate every leaf of the tree, depth first, in child order.
pub fn enumerate_variants(tree: &MoveTree) -> Vec<Variant> {
    let mut variants = Vec::new();
    let mut counter = 0u32;
    let root = Branch {
        path: Vec::new(),
        inherited: None,
        different: Vec::new(),
    };
    descend(tree, tree.root(), &root, &mut counter, &mut variants);
    tracing::debug!(count = variants.len(), "enumerated variants");
    variants
}

fn descend<'a>(
    tree: &'a MoveTree,
    node: NodeId,
    state: &Branch<'a>,
    counter: &mut u32,
    out: &mut Vec<Variant>,
) {
    let children = tree.children(node);
    let branching = children.len() > 1;

    for &child in children {
        let own = tree.node(child).name.as_deref();
        let mut path = state.path.clone();
        path.push(child);

        let different = match own {
            Some(_) => Vec::new(),
            None => {
                let mut list = state.different.clone();
                if branching {
                    list.push(child);
                }
                list
            }
        };
        let next = Branch {
            path,
            inherited: own.or(state.inherited),
            different,
        };

        if tree.node(child).is_leaf() {
            out.push(name_leaf(tree, child, next, counter));
        } else {
            descend(tree, child, &next, counter, out);
        }
    }
}

fn name_leaf(tree: &MoveTree, leaf: NodeId, state: Branch<'_>, counter: &mut u32) -> Variant {
    if let Some(own) = tree.node(leaf).name.as_deref() {
        return Variant {
            moves: state.path,
            name: own.to_string(),
            full_name: own.to_string(),
            different_moves: String::new(),
        };
    }

    match state.inherited {
        Some(inherited) => {
            let different_moves = state
                .different
                .iter()
                .map(|n| tree.node(*n).label())
                .collect::<Vec<_>>()
                .join(" ");
            let full_name = if different_moves.is_empty() {
                inherited.to_string()
            } else {
                format!("{inherited} ({different_moves})")
            };
            Variant {
                moves: state.path,
                name: inherited.to_string(),
                full_name,
                different_moves,
            }
        }
        None => {
            *counter += 1;
            let name = format!("Variant {counter}");
            Variant {
                moves: state.path,
                name: name.clone(),
                full_name: name,
                different_moves: String::new(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ChessBoard;
    use crate::tree::NewNode;

    fn add_line(tree: &mut MoveTree, sans: &[(&str, Option<&str>)]) {
        let mut board = ChessBoard::default();
        let mut node = tree.root();
        for (san, name) in sans {
            let mv = board.play_san(san).unwrap();
            let new = NewNode {
                name: name.map(str::to_string),
                ..NewNode::default()
            };
            node = tree.add_move(node, mv, new);
        }
    }

    fn names(variants: &[Variant]) -> Vec<&str> {
        variants.iter().map(|v| v.full_name.as_str()).collect()
    }

    #[test]
    fn test_empty_tree_has_no_variants() {
        assert!(enumerate_variants(&MoveTree::new()).is_empty());
    }

    #[test]
    fn test_anonymous_variants_are_numbered_in_order() {
        let mut tree = MoveTree::new();
        add_line(&mut tree, &[("e4", None), ("e5", None)]);
        add_line(&mut tree, &[("e4", None), ("c5", None)]);
        add_line(&mut tree, &[("d4", None)]);
        let variants = enumerate_variants(&tree);
        assert_eq!(names(&variants), vec!["Variant 1", "Variant 2", "Variant 3"]);
        assert!(variants.iter().all(|v| v.different_moves.is_empty()));
    }

    #[test]
    fn test_inherited_name_is_disambiguated() {
        let mut tree = MoveTree::new();
        add_line(&mut tree, &[("e4", None), ("c5", Some("Sicilian")), ("Nf3", None), ("d6", None)]);
        add_line(&mut tree, &[("e4", None), ("c5", None), ("Nf3", None), ("Nc6", None)]);
        add_line(&mut tree, &[("e4", None), ("c5", None), ("Nc3", None)]);
        let variants = enumerate_variants(&tree);
        assert_eq!(
            names(&variants),
            vec![
                "Sicilian (2. Nf3 2. ...d6)",
                "Sicilian (2. Nf3 2. ...Nc6)",
                "Sicilian (2. Nc3)",
            ]
        );
        assert_eq!(variants[0].name, "Sicilian");
        assert_eq!(variants[2].different_moves, "2. Nc3");
    }

    #[test]
    fn test_single_child_never_disambiguates() {
        let mut tree = MoveTree::new();
        add_line(&mut tree, &[("d4", Some("Queen's Pawn")), ("d5", None), ("c4", None)]);
        let variants = enumerate_variants(&tree);
        assert_eq!(variants[0].full_name, "Queen's Pawn");
        assert_eq!(variants[0].different_moves, "");
    }

    #[test]
    fn test_named_child_resets_divergence() {
        let mut tree = MoveTree::new();
        add_line(&mut tree, &[("e4", Some("King's Pawn")), ("e5", None), ("Nf3", None)]);
        add_line(&mut tree, &[("e4", None), ("c5", Some("Sicilian")), ("Nf3", None)]);
        add_line(&mut tree, &[("e4", None), ("e6", None)]);
        let variants = enumerate_variants(&tree);
        assert_eq!(
            names(&variants),
            vec!["King's Pawn (1. ...e5)", "Sicilian", "King's Pawn (1. ...e6)"]
        );
    }

    #[test]
    fn test_leaf_name_wins() {
        let mut tree = MoveTree::new();
        add_line(&mut tree, &[("e4", Some("Open")), ("e5", Some("Double King Pawn"))]);
        add_line(&mut tree, &[("d4", None)]);
        let variants = enumerate_variants(&tree);
        assert_eq!(names(&variants), vec!["Double King Pawn", "Variant 1"]);
    }

    #[test]
    fn test_moves_length_matches_leaf_depth() {
        let mut tree = MoveTree::new();
        add_line(&mut tree, &[("e4", None), ("e5", None), ("Nf3", None)]);
        add_line(&mut tree, &[("c4", None)]);
        for variant in enumerate_variants(&tree) {
            let leaf = variant.leaf().unwrap();
            assert_eq!(variant.moves.len(), tree.node(leaf).position);
        }
    }

    #[test]
    fn test_enumeration_is_deterministic() {
        let mut tree = MoveTree::new();
        add_line(&mut tree, &[("e4", Some("Open")), ("e5", None)]);
        add_line(&mut tree, &[("e4", None), ("c5", None)]);
        add_line(&mut tree, &[("d4", None), ("d5", None)]);
        assert_eq!(enumerate_variants(&tree), enumerate_variants(&tree));
    }
}
