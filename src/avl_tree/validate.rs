use core::cmp::max;

use thiserror::Error;

use crate::raw::{NodeId, RawAvlTree};

/// A broken structural invariant, reported by [`AvlTree::validate`](crate::AvlTree::validate).
///
/// Depths count edges from the root, which is at depth 0.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
pub enum InvariantViolation {
    /// A node's cached height disagrees with its children's.
    #[error("node at depth {depth} caches height {cached} but has height {actual}")]
    StaleHeight { depth: usize, cached: usize, actual: usize },
    /// A node's subtree heights differ by more than one.
    #[error("node at depth {depth} has balance factor {balance_factor}")]
    Unbalanced { depth: usize, balance_factor: i32 },
    /// A key sits on the wrong side of one of its ancestors.
    #[error("key at depth {depth} violates search-tree ordering")]
    OutOfOrder { depth: usize },
    /// The number of reachable nodes differs from the recorded length.
    #[error("tree records {len} keys but {reachable} nodes are reachable")]
    LenMismatch { len: usize, reachable: usize },
}

/// Height and node count of a checked subtree.
struct Subtree {
    height: usize,
    count: usize,
}

pub(crate) fn validate<K: Ord>(tree: &RawAvlTree<K>) -> Result<(), InvariantViolation> {
    let Subtree { count, .. } = check(tree, tree.root(), 0, None, None)?;

    if count != tree.len() || count != tree.node_count() {
        return Err(InvariantViolation::LenMismatch {
            len: tree.len(),
            reachable: count,
        });
    }
    Ok(())
}

/// Checks the subtree at `link`, whose keys must lie strictly between `lower` and `upper`.
fn check<K: Ord>(
    tree: &RawAvlTree<K>,
    link: Option<NodeId>,
    depth: usize,
    lower: Option<&K>,
    upper: Option<&K>,
) -> Result<Subtree, InvariantViolation> {
    let Some(id) = link else {
        return Ok(Subtree { height: 0, count: 0 });
    };
    let node = tree.node(id);
    let key = node.key();

    if lower.is_some_and(|lower| key <= lower) || upper.is_some_and(|upper| key >= upper) {
        return Err(InvariantViolation::OutOfOrder { depth });
    }

    let left = check(tree, node.left(), depth + 1, lower, Some(key))?;
    let right = check(tree, node.right(), depth + 1, Some(key), upper)?;

    let actual = 1 + max(left.height, right.height);
    let cached = usize::from(node.height());
    if cached != actual {
        return Err(InvariantViolation::StaleHeight { depth, cached, actual });
    }

    #[allow(clippy::cast_possible_wrap, clippy::cast_possible_truncation)]
    let balance_factor = left.height as i32 - right.height as i32;
    if !(-1..=1).contains(&balance_factor) {
        return Err(InvariantViolation::Unbalanced { depth, balance_factor });
    }

    Ok(Subtree {
        height: actual,
        count: left.count + right.count + 1,
    })
}
