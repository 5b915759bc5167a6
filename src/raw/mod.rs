mod node;
mod pool;
mod raw_avl_tree;

pub(crate) use node::NodeId;
pub(crate) use raw_avl_tree::{RawAvlTree, Walk};
