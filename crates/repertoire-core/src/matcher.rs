//! Keep the user on the same line after the tree changes.

use serde::{Deserialize, Serialize};

use crate::tree::{MoveTree, NodeId};
use crate::variants::Variant;

/// Query parameters that can preselect a variant or a position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeepLink {
    pub variant: Option<String>,
    pub fen: Option<String>,
}

/// True when both LAN paths agree up to the shorter length.
pub fn paths_match<A: AsRef<str>, B: AsRef<str>>(a: &[A], b: &[B]) -> bool {
    a.iter().zip(b).all(|(x, y)| x.as_ref() == y.as_ref())
}

/// Variant chosen by the deep link, or the first one.
pub fn default_variant(variants: &[Variant], link: &DeepLink) -> Option<usize> {
    if variants.is_empty() {
        return None;
    }
    let requested = link.variant.as_deref().and_then(|wanted| {
        variants
            .iter()
            .position(|v| v.full_name == wanted)
            .or_else(|| variants.iter().position(|v| v.name == wanted))
    });
    Some(requested.unwrap_or(0))
}

/// Pick the index of the variant that best continues the line through
/// `target`. Returns `None` only when `variants` is empty.
pub fn select_variant(
    variants: &[Variant],
    tree: &MoveTree,
    target: NodeId,
    previous: Option<&str>,
    link: &DeepLink,
) -> Option<usize> {
    // a node cut off by a delete continues no variant
    if !tree.is_attached(target) {
        return default_variant(variants, link);
    }

    let target_path = tree.lan_path(target);
    let matches = |v: &Variant| paths_match(&v.lans(tree), &target_path);

    if let Some(previous) = previous {
        if let Some(idx) = variants.iter().position(|v| v.full_name == previous) {
            if matches(&variants[idx]) {
                return Some(idx);
            }
        }
    }

    if let Some(idx) = variants.iter().position(|v| matches(v)) {
        return Some(idx);
    }

    default_variant(variants, link)
}
