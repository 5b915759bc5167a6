use core::borrow::Borrow;
use core::fmt;
use core::iter::FusedIterator;

use crate::raw::{RawAvlTree, Walk};

pub(crate) mod validate;

pub use validate::InvariantViolation;

/// An ordered set of keys stored in a height-balanced (AVL) binary search tree.
///
/// After every insertion or deletion, each node's two subtrees differ in height
/// by at most one, so lookups, insertions and deletions all take O(log n).
/// Equal keys are never stored twice: inserting a key that is already present
/// leaves the tree unchanged.
///
/// It is a logic error for a key to be modified in such a way that its ordering
/// relative to any other key, as determined by the [`Ord`] trait, changes while
/// it is in the tree.
///
/// # Examples
///
/// ```
/// use avl_tree::AvlTree;
///
/// let mut tree = AvlTree::new();
/// for key in [10, 20, 5, 4, 15, 25] {
///     tree.insert(key);
/// }
///
/// assert!(tree.search(&15));
/// assert_eq!(tree.height_of(&10), Some(3));
/// assert_eq!(tree.depth_of(&20), Some(1));
/// assert!(tree.is_valid_avl());
///
/// tree.delete(&10);
/// let keys: Vec<_> = tree.ascending().copied().collect();
/// assert_eq!(keys, [4, 5, 15, 20, 25]);
/// ```
#[derive(Clone)]
pub struct AvlTree<K> {
    raw: RawAvlTree<K>,
}

/// An iterator over the keys of an [`AvlTree`], in ascending or descending order.
///
/// This `struct` is created by the [`ascending`] and [`descending`] methods on
/// [`AvlTree`].
///
/// [`ascending`]: AvlTree::ascending
/// [`descending`]: AvlTree::descending
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Iter<'a, K> {
    walk: Walk<'a, K>,
}

/// Space-separated key listing produced by [`AvlTree::listing`].
#[must_use]
pub struct Listing<'a, K> {
    tree: &'a AvlTree<K>,
    descending: bool,
}

impl<K> AvlTree<K> {
    /// Makes a new, empty `AvlTree`.
    ///
    /// Does not allocate anything on its own.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_tree::AvlTree;
    ///
    /// let mut tree = AvlTree::new();
    /// tree.insert(1);
    /// ```
    #[must_use]
    pub const fn new() -> Self {
        Self { raw: RawAvlTree::new() }
    }

    /// Makes a new, empty `AvlTree` with room for at least `capacity` keys.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_tree::AvlTree;
    ///
    /// let tree: AvlTree<u32> = AvlTree::with_capacity(64);
    /// assert!(tree.capacity() >= 64);
    /// assert!(tree.is_empty());
    /// ```
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            raw: RawAvlTree::with_capacity(capacity),
        }
    }

    /// Returns the number of keys the tree can hold without reallocating.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.raw.capacity()
    }

    /// Returns the number of keys in the tree.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_tree::AvlTree;
    ///
    /// let mut tree = AvlTree::new();
    /// assert_eq!(tree.len(), 0);
    /// tree.insert(1);
    /// tree.insert(1);
    /// assert_eq!(tree.len(), 1);
    /// ```
    #[must_use]
    pub const fn len(&self) -> usize {
        self.raw.len()
    }

    /// Returns `true` if the tree contains no keys.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Removes every key.
    pub fn clear(&mut self) {
        self.raw.clear();
    }

    /// Height of the whole tree: 0 when empty, 1 for a single key.
    ///
    /// # Complexity
    ///
    /// O(1)
    #[must_use]
    pub fn height(&self) -> usize {
        usize::from(self.raw.height(self.raw.root()))
    }

    /// Returns an iterator over the keys in increasing order.
    ///
    /// Each call starts a fresh traversal.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_tree::AvlTree;
    ///
    /// let tree = AvlTree::from([3, 1, 2]);
    /// let mut iter = tree.ascending();
    /// assert_eq!(iter.next(), Some(&1));
    /// assert_eq!(iter.next(), Some(&2));
    /// assert_eq!(iter.next(), Some(&3));
    /// assert_eq!(iter.next(), None);
    /// ```
    pub fn ascending(&self) -> Iter<'_, K> {
        Iter {
            walk: Walk::new(&self.raw, false),
        }
    }

    /// Returns an iterator over the keys in decreasing order.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_tree::AvlTree;
    ///
    /// let tree = AvlTree::from([3, 1, 2]);
    /// let keys: Vec<_> = tree.descending().copied().collect();
    /// assert_eq!(keys, [3, 2, 1]);
    /// ```
    pub fn descending(&self) -> Iter<'_, K> {
        Iter {
            walk: Walk::new(&self.raw, true),
        }
    }

    /// Returns the smallest key, if any.
    ///
    /// # Complexity
    ///
    /// O(log n)
    #[must_use]
    pub fn first(&self) -> Option<&K> {
        self.ascending().next()
    }

    /// Returns the largest key, if any.
    ///
    /// # Complexity
    ///
    /// O(log n)
    #[must_use]
    pub fn last(&self) -> Option<&K> {
        self.descending().next()
    }

    /// Formats the keys separated by single spaces, smallest first when
    /// `descending` is `false`.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_tree::AvlTree;
    ///
    /// let tree = AvlTree::from([20, 10, 30]);
    /// assert_eq!(tree.listing(false).to_string(), "10 20 30");
    /// assert_eq!(tree.listing(true).to_string(), "30 20 10");
    /// ```
    pub const fn listing(&self, descending: bool) -> Listing<'_, K> {
        Listing { tree: self, descending }
    }

    /// Writes the keys in increasing order, space separated, followed by a newline.
    ///
    /// # Errors
    ///
    /// Propagates any error reported by `out`.
    pub fn write_ascending<W: fmt::Write>(&self, out: &mut W) -> fmt::Result
    where
        K: fmt::Display,
    {
        writeln!(out, "{}", self.listing(false))
    }

    /// Writes the keys in decreasing order, space separated, followed by a newline.
    ///
    /// # Errors
    ///
    /// Propagates any error reported by `out`.
    pub fn write_descending<W: fmt::Write>(&self, out: &mut W) -> fmt::Result
    where
        K: fmt::Display,
    {
        writeln!(out, "{}", self.listing(true))
    }

    /// Prints the keys in increasing order to standard output.
    #[cfg(feature = "std")]
    pub fn print_ascending(&self)
    where
        K: fmt::Display,
    {
        std::println!("{}", self.listing(false));
    }

    /// Prints the keys in decreasing order to standard output.
    #[cfg(feature = "std")]
    pub fn print_descending(&self)
    where
        K: fmt::Display,
    {
        std::println!("{}", self.listing(true));
    }
}

impl<K: Ord> AvlTree<K> {
    /// Adds a key to the tree, rebalancing on the way back up.
    ///
    /// Returns whether the key was newly inserted. If an equal key is already
    /// present, the tree is left untouched and `false` is returned.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_tree::AvlTree;
    ///
    /// let mut tree = AvlTree::new();
    /// assert_eq!(tree.insert(2), true);
    /// assert_eq!(tree.insert(2), false);
    /// assert_eq!(tree.len(), 1);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn insert(&mut self, key: K) -> bool {
        self.raw.insert(key)
    }

    /// Removes a key from the tree, rebalancing on the way back up.
    ///
    /// Returns whether the key was present. Deleting an absent key is a no-op.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_tree::AvlTree;
    ///
    /// let mut tree = AvlTree::from([1, 2, 3]);
    /// assert_eq!(tree.delete(&2), true);
    /// assert_eq!(tree.delete(&2), false);
    /// assert!(tree.is_valid_avl());
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn delete<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.delete(key)
    }

    /// Returns `true` if the tree contains `key`.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_tree::AvlTree;
    ///
    /// let tree = AvlTree::from(["b", "a"]);
    /// assert!(tree.search("a"));
    /// assert!(!tree.search("c"));
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn search<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.find(key).is_some()
    }

    /// Height of the subtree rooted at the node holding `key` (a leaf is 1),
    /// or `None` if `key` is absent.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_tree::AvlTree;
    ///
    /// let tree = AvlTree::from([2, 1, 3]);
    /// assert_eq!(tree.height_of(&2), Some(2));
    /// assert_eq!(tree.height_of(&3), Some(1));
    /// assert_eq!(tree.height_of(&9), None);
    /// ```
    #[must_use]
    pub fn height_of<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw
            .find(key)
            .map(|(id, _)| usize::from(self.raw.node(id).height()))
    }

    /// Number of edges between the root and the node holding `key` (the root
    /// is at depth 0), or `None` if `key` is absent.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_tree::AvlTree;
    ///
    /// let tree = AvlTree::from([2, 1, 3]);
    /// assert_eq!(tree.depth_of(&2), Some(0));
    /// assert_eq!(tree.depth_of(&1), Some(1));
    /// assert_eq!(tree.depth_of(&4), None);
    /// ```
    #[must_use]
    pub fn depth_of<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.find(key).map(|(_, depth)| depth)
    }

    /// Level of the node holding `key`. Same as [`depth_of`](Self::depth_of).
    #[must_use]
    pub fn level_of<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.depth_of(key)
    }

    /// Returns `true` if every node's subtree heights differ by at most one.
    ///
    /// An empty tree is valid. For a check that also covers cached heights and
    /// key ordering, see [`validate`](Self::validate).
    ///
    /// # Complexity
    ///
    /// O(n)
    #[must_use]
    pub fn is_valid_avl(&self) -> bool {
        self.raw.is_balanced()
    }

    /// Checks every structural invariant of the tree.
    ///
    /// # Errors
    ///
    /// Returns the first [`InvariantViolation`] found.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_tree::AvlTree;
    ///
    /// let tree: AvlTree<i32> = (0..100).collect();
    /// assert_eq!(tree.validate(), Ok(()));
    /// ```
    pub fn validate(&self) -> Result<(), InvariantViolation> {
        validate::validate(&self.raw)
    }
}

impl<K: fmt::Display> fmt::Display for Listing<'_, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys = if self.descending {
            self.tree.descending()
        } else {
            self.tree.ascending()
        };
        if let Some(key) = keys.next() {
            write!(f, "{key}")?;
        }
        for key in keys {
            write!(f, " {key}")?;
        }
        Ok(())
    }
}

impl<K> Default for AvlTree<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug> fmt::Debug for AvlTree<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.ascending()).finish()
    }
}

impl<K: PartialEq> PartialEq for AvlTree<K> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.ascending().eq(other.ascending())
    }
}

impl<K: Eq> Eq for AvlTree<K> {}

impl<K: Ord> FromIterator<K> for AvlTree<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut tree = Self::new();
        tree.extend(iter);
        tree
    }
}

impl<K: Ord> Extend<K> for AvlTree<K> {
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        for key in iter {
            self.insert(key);
        }
    }
}

impl<K: Ord, const N: usize> From<[K; N]> for AvlTree<K> {
    fn from(keys: [K; N]) -> Self {
        keys.into_iter().collect()
    }
}

impl<'a, K> IntoIterator for &'a AvlTree<K> {
    type Item = &'a K;
    type IntoIter = Iter<'a, K>;

    fn into_iter(self) -> Iter<'a, K> {
        self.ascending()
    }
}

impl<'a, K> Iterator for Iter<'a, K> {
    type Item = &'a K;

    fn next(&mut self) -> Option<&'a K> {
        self.walk.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.walk.size_hint()
    }
}

impl<K> ExactSizeIterator for Iter<'_, K> {}

impl<K> FusedIterator for Iter<'_, K> {}

impl<K> Clone for Iter<'_, K> {
    fn clone(&self) -> Self {
        Self { walk: self.walk.clone() }
    }
}

impl<K: fmt::Debug> fmt::Debug for Iter<'_, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}
