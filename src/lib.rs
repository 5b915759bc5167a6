//! A height-balanced (AVL) binary search tree for Rust.
//!
//! This crate provides [`AvlTree`], an ordered set of keys that keeps, for
//! every node, the heights of its two subtrees within one of each other. Any
//! insertion or deletion that would break that rule is repaired on the way back
//! up with one or two rotations, so every operation stays O(log n).
//!
//! # Example
//!
//! ```
//! use avl_tree::AvlTree;
//!
//! let mut tree = AvlTree::new();
//! for key in [10, 20, 5, 4, 15, 25] {
//!     tree.insert(key);
//! }
//!
//! assert_eq!(tree.listing(false).to_string(), "4 5 10 15 20 25");
//! assert_eq!(tree.listing(true).to_string(), "25 20 15 10 5 4");
//!
//! // Structural introspection
//! assert_eq!(tree.height_of(&10), Some(3)); // 10 is the root
//! assert_eq!(tree.depth_of(&20), Some(1));
//! assert_eq!(tree.level_of(&20), Some(1));
//! assert_eq!(tree.depth_of(&99), None);
//! assert!(tree.is_valid_avl());
//!
//! // Deleting a node with two children promotes its in-order successor
//! tree.delete(&10);
//! assert_eq!(tree.depth_of(&15), Some(0));
//! assert!(tree.is_valid_avl());
//! ```
//!
//! # Features
//!
//! - **`std`** (default) - Enables [`AvlTree::print_ascending`] and
//!   [`AvlTree::print_descending`]. Without it the crate is `no_std` and only needs `alloc`.
//! - **`demo`** (default) - Builds the `avl_demo` binary.
//!
//! # Implementation
//!
//! Nodes live in a pool and refer to their children by index. Insertion and
//! deletion recurse down to the affected node and return the (possibly rotated)
//! subtree root to their caller, which reattaches it. Rotations only rewire
//! indices; the only allocation is the new leaf made by insertion.
//!
//! Rotations and node removals are reported through the [`log`] facade at
//! `trace`/`debug` level.

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]
#![forbid(keyword_idents)]
#![forbid(non_ascii_idents)]
#![forbid(unreachable_pub)]
#![warn(clippy::all)]
#![warn(clippy::cargo)]
#![warn(clippy::pedantic)]
// Enable coverage attributes for nightly builds.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

extern crate alloc;

mod raw;

pub mod avl_tree;

pub use avl_tree::{AvlTree, InvariantViolation};
