//! Thread-safe handle to a tree.
//!
//! One writer or many readers at a time, arbitrated around the whole engine.
//! Lookups share the read lock and go through positional reads, so they never
//! contend on a file cursor. Every mutation holds the write lock for its full
//! walk, including slot allocation and the parent rewrite.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::storage::Storage;
use crate::tree::engine::{DiskTree, TreeError};
use crate::tree::node::{Offset, Record};

/// A cloneable, lock-protected [`DiskTree`].
pub struct SharedTree<S: Storage> {
    inner: Arc<RwLock<DiskTree<S>>>,
}

impl<S: Storage> Clone for SharedTree<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: Storage> SharedTree<S> {
    #[must_use]
    pub fn new(tree: DiskTree<S>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(tree)),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, DiskTree<S>>, TreeError> {
        self.inner.read().map_err(|_| TreeError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, DiskTree<S>>, TreeError> {
        self.inner.write().map_err(|_| TreeError::Poisoned)
    }

    pub fn insert(&self, value: i32) -> Result<Offset, TreeError> {
        self.write()?.insert(value)
    }

    pub fn delete(&self, value: i32) -> Result<bool, TreeError> {
        self.write()?.delete(value)
    }

    pub fn remove(&self, value: i32) -> Result<bool, TreeError> {
        self.write()?.remove(value)
    }

    pub fn seek(&self, value: i32) -> Result<Offset, TreeError> {
        self.read()?.seek(value)
    }

    pub fn contains(&self, value: i32) -> Result<bool, TreeError> {
        self.read()?.contains(value)
    }

    pub fn len(&self) -> Result<u64, TreeError> {
        self.read()?.len()
    }

    pub fn is_empty(&self) -> Result<bool, TreeError> {
        self.read()?.is_empty()
    }

    pub fn in_order(&self) -> Result<Vec<i32>, TreeError> {
        self.read()?.in_order()
    }

    pub fn dump(&self) -> Result<Vec<Record>, TreeError> {
        self.read()?.dump()
    }

    pub fn verify(&self) -> Result<(), TreeError> {
        self.read()?.verify()
    }

    /// Close the tree if this is the last handle.
    ///
    /// Returns `Ok(false)` without closing when other handles are still alive;
    /// the last of them to be dropped flushes the tree.
    pub fn close(self) -> Result<bool, TreeError> {
        match Arc::try_unwrap(self.inner) {
            Ok(lock) => {
                let tree = lock.into_inner().map_err(|_| TreeError::Poisoned)?;
                tree.close()?;
                Ok(true)
            }
            Err(_) => {
                tracing::debug!("tree still shared; close deferred to last handle");
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn shared() -> SharedTree<MemoryStorage> {
        SharedTree::new(DiskTree::open_storage(MemoryStorage::new(0)).expect("open tree"))
    }

    #[test]
    fn test_concurrent_writers_keep_tree_consistent() {
        let tree = shared();
        tree.insert(0).expect("insert root");

        std::thread::scope(|scope| {
            for worker in 0..4 {
                let tree = tree.clone();
                scope.spawn(move || {
                    for i in 1..=50 {
                        tree.insert(worker * 1000 + i).expect("insert");
                    }
                });
            }
        });

        let values = tree.in_order().expect("in_order");
        assert_eq!(values.len(), 201);
        assert!(values.windows(2).all(|w| w[0] <= w[1]));
        tree.verify().expect("verify");
    }

    #[test]
    fn test_readers_and_writers_interleave() {
        let tree = shared();
        for value in [50, 25, 75] {
            tree.insert(value).expect("insert");
        }

        std::thread::scope(|scope| {
            let writer = tree.clone();
            scope.spawn(move || {
                for value in 100..200 {
                    writer.insert(value).expect("insert");
                }
                assert!(writer.delete(199).expect("delete leaf"));
            });

            for _ in 0..3 {
                let reader = tree.clone();
                scope.spawn(move || {
                    for _ in 0..50 {
                        assert!(reader.contains(50).expect("contains"));
                        assert!(reader.contains(25).expect("contains"));
                    }
                });
            }
        });

        assert!(!tree.contains(199).expect("contains"));
        assert_eq!(tree.len().expect("len"), 102);
        tree.verify().expect("verify");
    }

    #[test]
    fn test_close_only_on_last_handle() {
        let tree = shared();
        tree.insert(1).expect("insert");
        let other = tree.clone();

        assert!(!tree.close().expect("close shared"));
        assert!(other.contains(1).expect("contains"));
        assert!(other.close().expect("close last"));
    }

    #[test]
    fn test_remove_through_handle() {
        let tree = shared();
        for value in [10, 30, 1, 11] {
            tree.insert(value).expect("insert");
        }
        assert!(!tree.delete(10).expect("delete internal"));
        assert!(tree.remove(10).expect("remove internal"));
        assert_eq!(tree.in_order().expect("in_order"), vec![1, 11, 30]);
        assert_eq!(tree.seek(11).expect("seek"), 0);
        assert!(!tree.is_empty().expect("is_empty"));
        assert_eq!(tree.dump().expect("dump").len(), 4);
    }
}
