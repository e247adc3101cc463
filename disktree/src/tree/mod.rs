//! Persistent binary search tree.
//!
//! This module provides an unbalanced BST whose nodes live in a flat file of
//! fixed 20-byte records and reference their children by byte offset.
//!
//! # Structure
//!
//! - `node`: the record codec (value, left offset, right offset)
//! - `engine`: insert, seek, delete and free-slot reuse over a `Storage`
//! - `shared`: a reader/writer-locked handle for use across threads
//!
//! # Usage
//!
//! ```
//! use disktree::storage::MemoryStorage;
//! use disktree::tree::DiskTree;
//!
//! let mut tree = DiskTree::open_storage(MemoryStorage::new(0)).unwrap();
//! for value in [10, 30, 1, 11, 100, 5, 9] {
//!     tree.insert(value).unwrap();
//! }
//!
//! assert!(tree.contains(11).unwrap());
//! assert!(!tree.contains(50).unwrap());
//! assert_eq!(tree.in_order().unwrap(), vec![1, 5, 9, 10, 11, 30, 100]);
//! ```

mod engine;
mod node;
mod shared;

pub use engine::{DiskTree, TreeError};
pub use node::{
    FREE_MARKER, NO_CHILD, NODE_SIZE, NODE_SIZE_U64, Node, NodeError, Offset, ROOT_OFFSET, Record,
    encode_free,
};
pub use shared::SharedTree;
