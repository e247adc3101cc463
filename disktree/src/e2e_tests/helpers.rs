//! Common helpers for end-to-end tests.

use std::path::PathBuf;

use tempfile::TempDir;

use crate::storage::FileStorage;
use crate::tree::{DiskTree, NODE_SIZE_U64, Record};

/// A record file in its own temporary directory, removed on drop.
pub struct TestFile {
    _dir: TempDir,
    pub path: PathBuf,
}

impl TestFile {
    #[must_use]
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("binaryTree.dat");
        Self { _dir: dir, path }
    }

    pub fn open(&self) -> DiskTree<FileStorage> {
        DiskTree::open(&self.path).expect("open tree")
    }

    /// Open, insert `values` in order, and return the open tree.
    pub fn with_values(&self, values: &[i32]) -> DiskTree<FileStorage> {
        let mut tree = self.open();
        for &value in values {
            tree.insert(value).expect("insert");
        }
        tree
    }

    pub fn file_len(&self) -> u64 {
        std::fs::metadata(&self.path).expect("metadata").len()
    }
}

/// Offset of the `index`-th record slot.
pub const fn slot(index: u64) -> u64 {
    index * NODE_SIZE_U64
}

/// Values of the live records in physical order.
pub fn live_values(tree: &DiskTree<FileStorage>) -> Vec<i32> {
    tree.dump()
        .expect("dump")
        .into_iter()
        .filter_map(|record| match record {
            Record::Live(node) => Some(node.value),
            Record::Free { .. } => None,
        })
        .collect()
}
