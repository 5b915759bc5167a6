use alloc::vec::Vec;

use super::node::{Node, NodeId};

/// A pool slot. Released slots chain into a free list through their own storage.
#[derive(Clone)]
enum Slot<K> {
    Live(Node<K>),
    Released { next: Option<NodeId> },
}

/// Owns every node of one tree; the only place nodes are created or destroyed.
///
/// Released slots are recycled most-recent-first before the backing vector
/// grows, so a long insert/delete workload stays compact.
#[derive(Clone)]
pub(crate) struct NodePool<K> {
    slots: Vec<Slot<K>>,
    /// Head of the released-slot chain.
    free: Option<NodeId>,
    live: usize,
}

impl<K> NodePool<K> {
    pub(crate) const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: None,
            live: 0,
        }
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            ..Self::new()
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// Number of nodes not yet released.
    pub(crate) const fn live(&self) -> usize {
        self.live
    }

    /// Allocates a detached leaf holding `key`.
    pub(crate) fn create_leaf(&mut self, key: K) -> NodeId {
        let leaf = Slot::Live(Node::leaf(key));
        let id = match self.free {
            Some(id) => {
                let slot = &mut self.slots[id.to_index()];
                let Slot::Released { next } = *slot else {
                    unreachable!("`NodePool::create_leaf()` - free list reaches a live node!");
                };
                self.free = next;
                *slot = leaf;
                id
            }
            None => {
                assert!(
                    self.slots.len() < NodeId::MAX_NODES,
                    "`NodePool::create_leaf()` - pool is full ({} nodes)",
                    NodeId::MAX_NODES
                );
                self.slots.push(leaf);
                NodeId::from_index(self.slots.len() - 1)
            }
        };
        self.live += 1;
        id
    }

    #[inline]
    pub(crate) fn get(&self, id: NodeId) -> &Node<K> {
        match &self.slots[id.to_index()] {
            Slot::Live(node) => node,
            Slot::Released { .. } => panic!("`NodePool::get()` - {id:?} was released!"),
        }
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, id: NodeId) -> &mut Node<K> {
        match &mut self.slots[id.to_index()] {
            Slot::Live(node) => node,
            Slot::Released { .. } => panic!("`NodePool::get_mut()` - {id:?} was released!"),
        }
    }

    /// Destroys the node and hands back its key. Its children are not touched.
    pub(crate) fn release(&mut self, id: NodeId) -> K {
        let slot = &mut self.slots[id.to_index()];
        if let Slot::Released { .. } = slot {
            panic!("`NodePool::release()` - {id:?} was already released!");
        }
        let Slot::Live(node) = core::mem::replace(slot, Slot::Released { next: self.free }) else {
            unreachable!();
        };
        self.free = Some(id);
        self.live -= 1;
        node.into_key()
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free = None;
        self.live = 0;
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use alloc::collections::BTreeMap;
    use proptest::prelude::*;

    #[test]
    fn released_ids_are_reused_most_recent_first() {
        let mut pool = NodePool::new();
        let a = pool.create_leaf('a');
        let b = pool.create_leaf('b');
        let c = pool.create_leaf('c');

        assert_eq!(pool.release(a), 'a');
        assert_eq!(pool.release(c), 'c');
        assert_eq!(pool.live(), 1);

        assert_eq!(pool.create_leaf('d'), c);
        assert_eq!(pool.create_leaf('e'), a);
        assert_eq!(pool.create_leaf('f').to_index(), 3);
        assert_eq!(*pool.get(b).key(), 'b');
        assert_eq!(pool.live(), 4);
    }

    #[test]
    fn recycled_node_starts_as_a_fresh_leaf() {
        let mut pool = NodePool::new();
        let parent = pool.create_leaf(1);
        let child = pool.create_leaf(2);
        pool.get_mut(parent).set_left(Some(child));
        pool.get_mut(parent).set_height(2);

        pool.release(parent);
        let reused = pool.create_leaf(3);
        assert_eq!(reused, parent);
        assert_eq!(pool.get(reused).height(), 1);
        assert!(pool.get(reused).left().is_none());
    }

    #[test]
    #[should_panic(expected = "was released!")]
    fn reading_a_released_node_panics() {
        let mut pool = NodePool::new();
        let id = pool.create_leaf(7);
        pool.release(id);
        let _ = pool.get(id);
    }

    #[test]
    #[should_panic(expected = "was already released!")]
    fn double_release_panics() {
        let mut pool = NodePool::new();
        let id = pool.create_leaf(7);
        pool.release(id);
        pool.release(id);
    }

    #[test]
    fn clear_forgets_released_slots() {
        let mut pool = NodePool::with_capacity(8);
        assert!(pool.capacity() >= 8);
        let id = pool.create_leaf(1);
        pool.release(id);
        pool.clear();
        assert_eq!(pool.live(), 0);
        assert_eq!(pool.create_leaf(2).to_index(), 0);
        assert_eq!(pool.live(), 1);
    }

    #[derive(Clone, Debug)]
    enum Step {
        Create(u32),
        Release(usize),
    }

    fn step_strategy() -> impl Strategy<Value = Step> {
        prop_oneof![
            3 => any::<u32>().prop_map(Step::Create),
            2 => any::<usize>().prop_map(Step::Release),
        ]
    }

    proptest! {
        /// Live ids always resolve to the key they were created with, and
        /// releasing returns that key.
        #[test]
        fn pool_matches_model(steps in proptest::collection::vec(step_strategy(), 0..400)) {
            let mut pool = NodePool::new();
            let mut model: BTreeMap<usize, u32> = BTreeMap::new();

            for step in steps {
                match step {
                    Step::Create(key) => {
                        let id = pool.create_leaf(key);
                        prop_assert!(model.insert(id.to_index(), key).is_none());
                    }
                    Step::Release(pick) => {
                        if model.is_empty() {
                            continue;
                        }
                        let index = *model.keys().nth(pick % model.len()).unwrap();
                        let key = model.remove(&index).unwrap();
                        prop_assert_eq!(pool.release(NodeId::from_index(index)), key);
                    }
                }
                prop_assert_eq!(pool.live(), model.len());
                for (&index, key) in &model {
                    prop_assert_eq!(pool.get(NodeId::from_index(index)).key(), key);
                }
            }
        }
    }
}
