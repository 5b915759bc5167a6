use core::borrow::Borrow;
use core::cmp::Ordering::{Equal, Greater, Less};
use core::cmp::max;
use core::iter::FusedIterator;

use log::{debug, trace};
use smallvec::SmallVec;

use super::node::{MAX_HEIGHT, Node, NodeId};
use super::pool::NodePool;

/// Inline depth of the traversal stack; a walk holds at most one id per level.
const WALK_DEPTH: usize = 64;

const _: () = assert!(MAX_HEIGHT <= WALK_DEPTH);

/// The AVL tree backing [`AvlTree`](crate::AvlTree).
///
/// Every recursive mutation takes the id of a subtree root and hands back
/// the id of whatever node roots that subtree afterwards; the caller is
/// responsible for reattaching it.
#[derive(Clone)]
pub(crate) struct RawAvlTree<K> {
    /// Pool owning every node.
    nodes: NodePool<K>,
    /// Root of the tree, if non-empty.
    root: Option<NodeId>,
    /// Number of keys stored.
    len: usize,
    #[cfg(test)]
    rotations: Rotations,
}

/// Rotation counters, kept so tests can assert which rebalancing case fired.
#[cfg(test)]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub(crate) struct Rotations {
    pub(crate) left: usize,
    pub(crate) right: usize,
}

impl<K> RawAvlTree<K> {
    pub(crate) const fn new() -> Self {
        Self {
            nodes: NodePool::new(),
            root: None,
            len: 0,
            #[cfg(test)]
            rotations: Rotations { left: 0, right: 0 },
        }
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: NodePool::with_capacity(capacity),
            ..Self::new()
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.nodes.capacity()
    }

    pub(crate) const fn len(&self) -> usize {
        self.len
    }

    pub(crate) const fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
        self.len = 0;
    }

    pub(crate) const fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub(crate) fn node(&self, id: NodeId) -> &Node<K> {
        self.nodes.get(id)
    }

    /// Number of live nodes in the pool; equals `len` unless the tree is corrupt.
    pub(crate) const fn node_count(&self) -> usize {
        self.nodes.live()
    }

    #[cfg(test)]
    pub(crate) const fn rotations(&self) -> Rotations {
        self.rotations
    }

    #[inline]
    fn key_of(&self, id: NodeId) -> &K {
        self.nodes.get(id).key()
    }

    // ─── Height & balance primitives ────────────────────────────────────────

    /// Cached height of a subtree; 0 when absent.
    #[inline]
    pub(crate) fn height(&self, link: Option<NodeId>) -> u8 {
        link.map_or(0, |id| self.nodes.get(id).height())
    }

    /// Recomputes a node's height from its children's cached heights.
    fn recompute_height(&mut self, id: NodeId) {
        let node = self.nodes.get(id);
        let height = 1 + max(self.height(node.left()), self.height(node.right()));
        self.nodes.get_mut(id).set_height(height);
    }

    /// `height(left) - height(right)`; 0 for an absent subtree.
    pub(crate) fn balance_factor(&self, link: Option<NodeId>) -> i32 {
        link.map_or(0, |id| {
            let node = self.nodes.get(id);
            i32::from(self.height(node.left())) - i32::from(self.height(node.right()))
        })
    }

    // ─── Rotations ──────────────────────────────────────────────────────────

    /// Re-roots the subtree at `y`'s left child `x`. `x`'s right subtree moves
    /// under `y`. Returns `x`.
    fn rotate_right(&mut self, y: NodeId) -> NodeId {
        let x = self.nodes.get_mut(y).take_left().expect("`RawAvlTree::rotate_right()` - pivot has no left child!");
        let inner = self.nodes.get_mut(x).take_right();
        self.nodes.get_mut(y).set_left(inner);
        self.nodes.get_mut(x).set_right(Some(y));
        self.recompute_height(y);
        self.recompute_height(x);

        #[cfg(test)]
        {
            self.rotations.right += 1;
        }
        trace!("rotate_right: {y:?} -> {x:?}");
        x
    }

    /// Mirror of [`rotate_right`](Self::rotate_right). Returns `x`'s former right child.
    fn rotate_left(&mut self, x: NodeId) -> NodeId {
        let y = self.nodes.get_mut(x).take_right().expect("`RawAvlTree::rotate_left()` - pivot has no right child!");
        let inner = self.nodes.get_mut(y).take_left();
        self.nodes.get_mut(x).set_right(inner);
        self.nodes.get_mut(y).set_left(Some(x));
        self.recompute_height(x);
        self.recompute_height(y);

        #[cfg(test)]
        {
            self.rotations.left += 1;
        }
        trace!("rotate_left: {x:?} -> {y:?}");
        y
    }

    // ─── Deletion ───────────────────────────────────────────────────────────

    /// Restores balance at `node` after a deletion below it.
    ///
    /// The single-vs-double rotation choice follows the sign of the heavy
    /// child's own balance factor. A child with balance 0 takes the single
    /// rotation.
    fn rebalance_after_delete(&mut self, node: NodeId) -> NodeId {
        self.recompute_height(node);
        let balance = self.balance_factor(Some(node));

        if balance > 1 {
            if self.balance_factor(self.nodes.get(node).left()) < 0 {
                let left = self.nodes.get_mut(node).take_left().expect("left-heavy node has a left child");
                let left = self.rotate_left(left);
                self.nodes.get_mut(node).set_left(Some(left));
            }
            return self.rotate_right(node);
        }

        if balance < -1 {
            if self.balance_factor(self.nodes.get(node).right()) > 0 {
                let right = self.nodes.get_mut(node).take_right().expect("right-heavy node has a right child");
                let right = self.rotate_right(right);
                self.nodes.get_mut(node).set_right(Some(right));
            }
            return self.rotate_left(node);
        }

        node
    }

    /// Unlinks the leftmost node of the subtree at `node`, returning the new
    /// subtree root and the detached key.
    fn detach_min(&mut self, node: NodeId) -> (Option<NodeId>, K) {
        match self.nodes.get_mut(node).take_left() {
            None => {
                let right = self.nodes.get_mut(node).take_right();
                (right, self.nodes.release(node))
            }
            Some(left) => {
                let (left, key) = self.detach_min(left);
                self.nodes.get_mut(node).set_left(left);
                (Some(self.rebalance_after_delete(node)), key)
            }
        }
    }
}

impl<K: Ord> RawAvlTree<K> {
    /// Finds the node holding `key` along with its depth (root = 0).
    pub(crate) fn find<Q>(&self, key: &Q) -> Option<(NodeId, usize)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let mut link = self.root;
        let mut depth = 0;
        while let Some(id) = link {
            let node = self.nodes.get(id);
            link = match key.cmp(node.key().borrow()) {
                Less => node.left(),
                Greater => node.right(),
                Equal => return Some((id, depth)),
            };
            depth += 1;
        }
        None
    }

    /// `true` when every node's balance factor lies in `[-1, 1]`.
    pub(crate) fn is_balanced(&self) -> bool {
        self.is_balanced_at(self.root)
    }

    fn is_balanced_at(&self, link: Option<NodeId>) -> bool {
        let Some(id) = link else {
            return true;
        };
        let node = self.nodes.get(id);
        (-1..=1).contains(&self.balance_factor(link)) && self.is_balanced_at(node.left()) && self.is_balanced_at(node.right())
    }

    // ─── Insertion ──────────────────────────────────────────────────────────

    /// Inserts `key`, returning `false` if an equal key was already present.
    pub(crate) fn insert(&mut self, key: K) -> bool {
        let (root, leaf) = self.insert_at(self.root, key);
        self.root = Some(root);
        if leaf.is_some() {
            self.len += 1;
        }
        leaf.is_some()
    }

    /// Inserts below `link`. Returns the subtree's new root and the new leaf,
    /// or `None` for the leaf when `key` was a duplicate.
    fn insert_at(&mut self, link: Option<NodeId>, key: K) -> (NodeId, Option<NodeId>) {
        let Some(node) = link else {
            let leaf = self.nodes.create_leaf(key);
            trace!("insert: new leaf {leaf:?}");
            return (leaf, Some(leaf));
        };

        let leaf = match key.cmp(self.key_of(node)) {
            Less => {
                let (left, leaf) = self.insert_at(self.nodes.get(node).left(), key);
                self.nodes.get_mut(node).set_left(Some(left));
                leaf
            }
            Greater => {
                let (right, leaf) = self.insert_at(self.nodes.get(node).right(), key);
                self.nodes.get_mut(node).set_right(Some(right));
                leaf
            }
            Equal => return (node, None),
        };

        match leaf {
            Some(leaf) => (self.rebalance_after_insert(node, leaf), Some(leaf)),
            None => (node, None),
        }
    }

    /// Restores balance at `node` after `leaf` was added below it.
    ///
    /// The single-vs-double rotation choice follows which side of the heavy
    /// child the new key landed on.
    fn rebalance_after_insert(&mut self, node: NodeId, leaf: NodeId) -> NodeId {
        self.recompute_height(node);
        let balance = self.balance_factor(Some(node));

        if balance > 1 {
            let left = self.nodes.get_mut(node).take_left().expect("left-heavy node has a left child");
            let left = if self.key_of(leaf) < self.key_of(left) { left } else { self.rotate_left(left) };
            self.nodes.get_mut(node).set_left(Some(left));
            return self.rotate_right(node);
        }

        if balance < -1 {
            let right = self.nodes.get_mut(node).take_right().expect("right-heavy node has a right child");
            let right = if self.key_of(leaf) > self.key_of(right) { right } else { self.rotate_right(right) };
            self.nodes.get_mut(node).set_right(Some(right));
            return self.rotate_left(node);
        }

        node
    }

    /// Removes `key`, returning `false` if it was absent.
    pub(crate) fn delete<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let (root, removed) = self.delete_at(self.root, key);
        self.root = root;
        if removed {
            self.len -= 1;
        }
        removed
    }

    fn delete_at<Q>(&mut self, link: Option<NodeId>, key: &Q) -> (Option<NodeId>, bool)
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let Some(node) = link else {
            return (None, false);
        };

        let removed = match key.cmp(self.key_of(node).borrow()) {
            Less => {
                let (left, removed) = self.delete_at(self.nodes.get(node).left(), key);
                self.nodes.get_mut(node).set_left(left);
                removed
            }
            Greater => {
                let (right, removed) = self.delete_at(self.nodes.get(node).right(), key);
                self.nodes.get_mut(node).set_right(right);
                removed
            }
            Equal => {
                let target = self.nodes.get(node);
                match (target.left(), target.right()) {
                    (None, replacement) | (replacement, None) => {
                        self.nodes.release(node);
                        debug!("delete: unlinked {node:?}, replaced by {replacement:?}");
                        return (replacement, true);
                    }
                    (Some(_), Some(right)) => {
                        // The in-order successor has no left child, so unlinking it
                        // is one of the cases above.
                        let (right, successor) = self.detach_min(right);
                        self.nodes.get_mut(node).replace_key(successor);
                        self.nodes.get_mut(node).set_right(right);
                        debug!("delete: {node:?} took its successor's key");
                        true
                    }
                }
            }
        };

        (Some(self.rebalance_after_delete(node)), removed)
    }
}

/// In-order walk over the keys, ascending or descending.
pub(crate) struct Walk<'a, K> {
    tree: &'a RawAvlTree<K>,
    stack: SmallVec<[NodeId; WALK_DEPTH]>,
    descending: bool,
    remaining: usize,
}

impl<'a, K> Walk<'a, K> {
    pub(crate) fn new(tree: &'a RawAvlTree<K>, descending: bool) -> Self {
        let mut walk = Self {
            tree,
            stack: SmallVec::new(),
            descending,
            remaining: tree.len(),
        };
        walk.push_spine(tree.root());
        walk
    }

    /// Pushes `link` and its chain of near-side children.
    fn push_spine(&mut self, mut link: Option<NodeId>) {
        while let Some(id) = link {
            self.stack.push(id);
            let node = self.tree.node(id);
            link = if self.descending { node.right() } else { node.left() };
        }
    }
}

impl<'a, K> Iterator for Walk<'a, K> {
    type Item = &'a K;

    fn next(&mut self) -> Option<&'a K> {
        let tree = self.tree;
        let node = tree.node(self.stack.pop()?);
        self.push_spine(if self.descending { node.left() } else { node.right() });
        self.remaining -= 1;
        Some(node.key())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K> ExactSizeIterator for Walk<'_, K> {}

impl<K> FusedIterator for Walk<'_, K> {}

impl<K> Clone for Walk<'_, K> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree,
            stack: self.stack.clone(),
            descending: self.descending,
            remaining: self.remaining,
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
mod tests {
    use super::*;
    use crate::avl_tree::validate::validate;
    use alloc::collections::BTreeSet;
    use alloc::format;
    use alloc::string::String;
    use alloc::vec::Vec;
    use proptest::prelude::*;
    use static_assertions::const_assert;

    fn build(keys: &[i32]) -> RawAvlTree<i32> {
        let mut tree = RawAvlTree::new();
        for &key in keys {
            tree.insert(key);
        }
        tree
    }

    /// Renders the tree as `key(left,right)`, with `.` for an empty side.
    fn render(tree: &RawAvlTree<i32>) -> String {
        fn at(tree: &RawAvlTree<i32>, link: Option<NodeId>) -> String {
            let Some(id) = link else {
                return String::from(".");
            };
            let node = tree.node(id);
            if node.left().is_none() && node.right().is_none() {
                format!("{}", node.key())
            } else {
                format!("{}({},{})", node.key(), at(tree, node.left()), at(tree, node.right()))
            }
        }
        at(tree, tree.root())
    }

    fn rotations(left: usize, right: usize) -> Rotations {
        Rotations { left, right }
    }

    #[test]
    fn increasing_keys_rotate_left_once() {
        let tree = build(&[1, 2, 3]);
        assert_eq!(render(&tree), "2(1,3)");
        assert_eq!(tree.rotations(), rotations(1, 0));
    }

    #[test]
    fn decreasing_keys_rotate_right_once() {
        let tree = build(&[3, 2, 1]);
        assert_eq!(render(&tree), "2(1,3)");
        assert_eq!(tree.rotations(), rotations(0, 1));
    }

    #[test]
    fn left_right_insert_rotates_twice() {
        let tree = build(&[3, 1, 2]);
        assert_eq!(render(&tree), "2(1,3)");
        assert_eq!(tree.rotations(), rotations(1, 1));
    }

    #[test]
    fn right_left_insert_rotates_twice() {
        let tree = build(&[1, 3, 2]);
        assert_eq!(render(&tree), "2(1,3)");
        assert_eq!(tree.rotations(), rotations(1, 1));
    }

    #[test]
    fn duplicate_insert_leaves_tree_untouched() {
        let mut tree = build(&[10, 20, 5]);
        assert!(!tree.insert(20));
        assert_eq!(tree.len(), 3);
        assert_eq!(render(&tree), "10(5,20)");
    }

    #[test]
    fn rotation_recomputes_heights_child_first() {
        let tree = build(&[1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(render(&tree), "4(2(1,3),6(5,7))");
        assert_eq!(tree.height(tree.root()), 3);
        assert_eq!(validate(&tree), Ok(()));
    }

    #[test]
    fn delete_with_balanced_left_child_rotates_once() {
        // 10 has balance 0 once 30 is gone; the single rotation must be chosen.
        let mut tree = build(&[20, 10, 30, 5, 15]);
        let before = tree.rotations();
        assert!(tree.delete(&30));
        assert_eq!(render(&tree), "10(5,20(15,.))");
        assert_eq!(tree.rotations(), rotations(before.left, before.right + 1));
        assert_eq!(validate(&tree), Ok(()));
    }

    #[test]
    fn delete_with_balanced_right_child_rotates_once() {
        // 20 has balance 0 once 5 is gone; a single left rotation, not right-left.
        let mut tree = build(&[10, 5, 20, 15, 25]);
        let before = tree.rotations();
        assert!(tree.delete(&5));
        assert_eq!(render(&tree), "20(10(.,15),25)");
        assert_eq!(tree.rotations(), rotations(before.left + 1, before.right));
        assert_eq!(validate(&tree), Ok(()));
    }

    #[test]
    fn delete_left_right_case() {
        let mut tree = build(&[20, 10, 30, 15]);
        assert!(tree.delete(&30));
        assert_eq!(render(&tree), "15(10,20)");
    }

    #[test]
    fn delete_right_right_case() {
        let mut tree = build(&[10, 5, 20, 25]);
        assert!(tree.delete(&5));
        assert_eq!(render(&tree), "20(10,25)");
    }

    #[test]
    fn delete_right_left_case() {
        let mut tree = build(&[10, 5, 20, 15]);
        assert!(tree.delete(&5));
        assert_eq!(render(&tree), "15(10,20)");
    }

    #[test]
    fn delete_two_child_node_takes_successor_key() {
        let mut tree = build(&[10, 20, 5, 4, 15, 25]);
        assert_eq!(render(&tree), "10(5(4,.),20(15,25))");
        assert!(tree.delete(&10));
        assert_eq!(render(&tree), "15(5(4,.),20(.,25))");
        assert_eq!(tree.len(), 5);
        assert_eq!(tree.node_count(), 5);
    }

    #[test]
    fn delete_absent_key_is_a_no_op() {
        let mut tree = build(&[2, 1, 3]);
        assert!(!tree.delete(&7));
        assert_eq!(render(&tree), "2(1,3)");
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn deleting_everything_empties_the_pool() {
        let mut tree = build(&[4, 2, 6, 1, 3, 5, 7]);
        for key in [4, 1, 7, 2, 6, 3, 5] {
            assert!(tree.delete(&key));
            assert_eq!(validate(&tree), Ok(()));
        }
        assert!(tree.is_empty());
        assert!(tree.root().is_none());
        assert_eq!(tree.node_count(), 0);
    }

    #[test]
    fn find_reports_depth() {
        let tree = build(&[10, 20, 5, 4, 15, 25]);
        assert_eq!(tree.find(&10).map(|(_, depth)| depth), Some(0));
        assert_eq!(tree.find(&20).map(|(_, depth)| depth), Some(1));
        assert_eq!(tree.find(&15).map(|(_, depth)| depth), Some(2));
        assert!(tree.find(&11).is_none());
    }

    #[test]
    fn walks_in_both_directions() {
        let tree = build(&[5, 3, 8, 1, 4, 9]);
        let up: Vec<i32> = Walk::new(&tree, false).copied().collect();
        let down: Vec<i32> = Walk::new(&tree, true).copied().collect();
        assert_eq!(up, [1, 3, 4, 5, 8, 9]);
        assert_eq!(down, [9, 8, 5, 4, 3, 1]);
        assert_eq!(Walk::new(&tree, false).len(), 6);
    }

    const_assert!(MAX_HEIGHT <= WALK_DEPTH);

    #[test]
    fn walk_over_a_large_tree_never_spills() {
        let keys: Vec<i32> = (0..20_000).collect();
        let tree = build(&keys);
        let mut walk = Walk::new(&tree, false);
        let mut expected = 0;
        while let Some(&key) = walk.next() {
            assert!(!walk.stack.spilled());
            assert_eq!(key, expected);
            expected += 1;
        }
        assert_eq!(expected, 20_000);
    }

    #[test]
    #[should_panic(expected = "`RawAvlTree::rotate_right()` - pivot has no left child!")]
    fn rotating_without_a_child_panics() {
        let mut tree = build(&[1]);
        let root = tree.root().expect("tree has a root");
        let _ = tree.rotate_right(root);
    }

    #[derive(Clone, Debug)]
    enum Op {
        Insert(i32),
        Delete(i32),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            3 => (-64..64).prop_map(Op::Insert),
            2 => (-64..64).prop_map(Op::Delete),
        ]
    }

    proptest! {
        #[test]
        fn stays_valid_and_matches_btreeset(ops in prop::collection::vec(op(), 0..400)) {
            let mut tree = RawAvlTree::new();
            let mut model = BTreeSet::new();

            for op in &ops {
                match *op {
                    Op::Insert(key) => {
                        prop_assert_eq!(tree.insert(key), model.insert(key));
                    }
                    Op::Delete(key) => {
                        prop_assert_eq!(tree.delete(&key), model.remove(&key));
                    }
                }
                prop_assert_eq!(validate(&tree), Ok(()), "after {:?}", op);
                prop_assert!(tree.is_balanced());
                prop_assert_eq!(tree.len(), model.len());
            }

            let keys: Vec<i32> = Walk::new(&tree, false).copied().collect();
            let expected: Vec<i32> = model.iter().copied().collect();
            prop_assert_eq!(keys, expected);
        }
    }
}
