//! Ordered maps built on binary search trees.
//!
//! This crate provides two maps with an API modelled on the standard library's `BTreeMap`:
//!
//! - [`AvlTreeMap`] - a self-balancing AVL tree. Every insert and remove is followed by a
//!   fix-up pass that keeps the heights of sibling subtrees within one of each other, so
//!   lookups, inserts and removes are O(log n) in the worst case.
//! - [`BstMap`] - the same tree without rebalancing. Operations are O(height), which degrades
//!   to O(n) for sorted input.
//!
//! Both maps expose [`Cursor`](avl_tree_map::Cursor)s for stepping through entries in key order
//! in either direction, plus [`is_balanced`](AvlTreeMap::is_balanced) and
//! [`height`](AvlTreeMap::height) for inspecting the tree shape.
//!
//! # Example
//!
//! ```
//! use avl_tree::{AvlTreeMap, BstMap};
//!
//! let mut balanced = AvlTreeMap::new();
//! let mut plain = BstMap::new();
//! for i in 0..1000 {
//!     balanced.insert(i, i * 2);
//!     plain.insert(i, i * 2);
//! }
//!
//! // Same contents, very different shapes.
//! assert_eq!(balanced.get(&500), plain.get(&500));
//! assert!(balanced.is_balanced());
//! assert!(balanced.height() <= 14);
//! assert!(!plain.is_balanced());
//! assert_eq!(plain.height(), 1000);
//!
//! // Walk from a key towards smaller keys.
//! let mut cursor = balanced.find(&3);
//! cursor.move_prev();
//! assert_eq!(cursor.key_value(), Some((&2, &4)));
//! ```
//!
//! # Features
//!
//! - **`no_std` compatible** - Only requires `alloc`, no standard library dependency
//! - **No unsafe code** - Nodes live in an arena and link to each other through handles
//! - **Logging** - Rotations and fix-ups are reported through the [`log`] facade at `trace`
//!   level
//!
//! # Implementation
//!
//! Each node stores its key, its value, handles to its parent and children, and a balance
//! factor (height of the right subtree minus height of the left one). Removing a node with
//! two children first exchanges its position in the tree with its in-order predecessor; the
//! payloads never move between nodes.

#![no_std]
// These forbid rules and lint groups are meant to be very restrictive.
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

mod error;
mod raw;

pub mod avl_tree_map;
pub mod bst_map;

pub use avl_tree_map::AvlTreeMap;
pub use bst_map::BstMap;
pub use error::KeyNotFound;
