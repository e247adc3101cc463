// Test code is allowed to use unwrap() and expect() for convenience.
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

// A minimal persistent binary search tree.
//
// Node records live in one flat file and reference their children by byte
// offset. Nothing is cached: every operation walks from the root record and
// re-reads what it needs.
//
// Layers:
//  - storage: byte-addressed backends (real file, in-memory with faults)
//  - tree: record codec, tree engine, shared handle
//  - config: environment settings for the demo binary

pub mod config;
pub mod storage;
pub mod tree;

pub use storage::{FileStorage, MemoryStorage, Storage, StorageError};
pub use tree::{DiskTree, Node, Offset, Record, SharedTree, TreeError};

mod e2e_tests;
