use core::num::NonZero;

#[cfg(test)]
type RawId = u16;
#[cfg(not(test))]
type RawId = u32;

/// Tallest AVL tree any [`NodePool`](super::pool::NodePool) can hold.
///
/// Every stack and height field sized against tree depth is sized against this.
pub(crate) const MAX_HEIGHT: usize = max_avl_height(NodeId::MAX_NODES);

/// Height of the tallest AVL tree that fits in `nodes` nodes (`nodes >= 1`).
///
/// The sparsest AVL tree of height `h` has `N(h) = N(h - 1) + N(h - 2) + 1`
/// nodes, with `N(0) = 0` and `N(1) = 1`; climb that recurrence until the next
/// step no longer fits.
pub(crate) const fn max_avl_height(nodes: usize) -> usize {
    let (mut height, mut shorter, mut sparsest) = (1, 0_usize, 1_usize);
    loop {
        let next = sparsest.saturating_add(shorter).saturating_add(1);
        if next > nodes {
            return height;
        }
        shorter = sparsest;
        sparsest = next;
        height += 1;
    }
}

/// Identifies a node in the tree's pool; `Option<NodeId>` is a child link.
///
/// Stored off-by-one so an empty link costs nothing over the id itself.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(transparent)]
pub(crate) struct NodeId(NonZero<RawId>);

impl NodeId {
    /// Number of distinct nodes an id can name.
    pub(crate) const MAX_NODES: usize = RawId::MAX as usize;

    #[inline]
    pub(crate) const fn from_index(index: usize) -> Self {
        assert!(index < Self::MAX_NODES, "`NodeId::from_index()` - `index` out of range!");
        #[allow(clippy::cast_possible_truncation)]
        match NonZero::new((index + 1) as RawId) {
            Some(raw) => Self(raw),
            None => unreachable!(),
        }
    }

    #[inline]
    pub(crate) const fn to_index(self) -> usize {
        (self.0.get() - 1) as usize
    }
}

/// A single tree node.
///
/// Children are owned through the pool: a node's id appears in exactly one
/// parent link (or the tree root), never in two.
#[derive(Clone)]
pub(crate) struct Node<K> {
    key: K,
    // Cached subtree height; a leaf is 1. Bounded by `MAX_HEIGHT`.
    height: u8,
    left: Option<NodeId>,
    right: Option<NodeId>,
}

const _: () = assert!(MAX_HEIGHT <= u8::MAX as usize);

impl<K> Node<K> {
    /// Creates a detached leaf holding `key`.
    pub(crate) const fn leaf(key: K) -> Self {
        Self {
            key,
            height: 1,
            left: None,
            right: None,
        }
    }

    #[inline]
    pub(crate) const fn key(&self) -> &K {
        &self.key
    }

    /// Replaces the key, returning the previous one.
    ///
    /// Only used when a two-child node takes over its in-order successor's key.
    pub(crate) fn replace_key(&mut self, key: K) -> K {
        core::mem::replace(&mut self.key, key)
    }

    pub(crate) fn into_key(self) -> K {
        self.key
    }

    #[inline]
    pub(crate) const fn height(&self) -> u8 {
        self.height
    }

    pub(crate) fn set_height(&mut self, height: u8) {
        self.height = height;
    }

    #[inline]
    pub(crate) const fn left(&self) -> Option<NodeId> {
        self.left
    }

    #[inline]
    pub(crate) const fn right(&self) -> Option<NodeId> {
        self.right
    }

    pub(crate) fn set_left(&mut self, left: Option<NodeId>) {
        self.left = left;
    }

    pub(crate) fn set_right(&mut self, right: Option<NodeId>) {
        self.right = right;
    }

    /// Detaches and returns the left child.
    pub(crate) fn take_left(&mut self) -> Option<NodeId> {
        self.left.take()
    }

    /// Detaches and returns the right child.
    pub(crate) fn take_right(&mut self) -> Option<NodeId> {
        self.right.take()
    }
}
