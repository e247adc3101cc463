//! Offset-based binary search tree over a flat record file.
//!
//! No in-memory tree is ever built. Every operation starts at the root record
//! (offset 0) and re-reads nodes from storage as it walks, comparing keys to
//! pick a child link. Walks are loops with explicit stacks; the tree is never
//! rebalanced, so its height is unbounded.
//!
//! # Ordering
//!
//! Values strictly less than a node live under its left link; values greater
//! than or equal to it live under its right link. Duplicates therefore always
//! land to the right of an existing equal value.
//!
//! # Free slots
//!
//! Deleted slots are overwritten with a tombstone and queued for reuse (FIFO).
//! Because tombstones are on disk, the queue is rebuilt on open by scanning the
//! file in physical order.

use std::collections::{HashSet, VecDeque};
use std::io::Write;
use std::path::Path;

use crate::storage::{FileStorage, Storage, StorageError};
use crate::tree::node::{
    NODE_SIZE, NODE_SIZE_U64, Node, Offset, ROOT_OFFSET, Record, encode_free,
};

/// Which child link of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

impl Side {
    const fn link(self, node: &Node) -> Option<Offset> {
        match self {
            Self::Left => node.left,
            Self::Right => node.right,
        }
    }

    const fn set_link(self, node: &mut Node, link: Option<Offset>) {
        match self {
            Self::Left => node.left = link,
            Self::Right => node.right = link,
        }
    }
}

/// A node found by a guided search, with the link that led to it.
#[derive(Debug, Clone, Copy)]
struct Located {
    node: Node,
    parent: Option<(Node, Side)>,
}

/// Node budget for one walk over the links.
///
/// An acyclic walk visits each slot at most once, so visiting more nodes than
/// the file has slots means a link loops back into the walk.
struct Steps {
    taken: u64,
    limit: u64,
}

impl Steps {
    const fn new(limit: u64) -> Self {
        Self { taken: 0, limit }
    }

    fn take(&mut self, offset: Offset) -> Result<(), TreeError> {
        self.taken += 1;
        if self.taken > self.limit {
            tracing::warn!("cycle detected at offset {offset} after {} nodes", self.limit);
            return Err(TreeError::Corruption(format!(
                "cycle detected at offset {offset}"
            )));
        }
        Ok(())
    }
}

/// A binary search tree stored in a single record file.
///
/// Owns its storage for its whole lifetime. Call [`DiskTree::close`] to flush
/// and observe errors; dropping the tree performs a best-effort flush instead.
pub struct DiskTree<S: Storage> {
    storage: S,
    free: VecDeque<Offset>,
    closed: bool,
}

impl DiskTree<FileStorage> {
    /// Open (or create) the record file at `path`.
    pub fn open(path: &Path) -> Result<Self, TreeError> {
        tracing::debug!("opening tree file {}", path.display());
        Self::open_storage(FileStorage::open(path)?)
    }
}

impl<S: Storage> DiskTree<S> {
    /// Take ownership of `storage` and rebuild the free-slot queue from it.
    ///
    /// Fails with `Corruption` if the storage length is not a whole number of
    /// records.
    pub fn open_storage(storage: S) -> Result<Self, TreeError> {
        let mut tree = Self {
            storage,
            free: VecDeque::new(),
            closed: false,
        };

        let slots = tree.slot_count()?;
        for record in tree.dump()? {
            if matches!(record, Record::Free { .. }) {
                tree.free.push_back(record.offset());
            }
        }

        tracing::debug!(
            "opened tree: {slots} slots, {} free",
            tree.free.len()
        );
        Ok(tree)
    }

    /// The underlying storage.
    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Number of record slots in the file, live or free.
    pub fn slot_count(&self) -> Result<u64, TreeError> {
        let len = self.storage.len()?;
        if len % NODE_SIZE_U64 != 0 {
            tracing::warn!("record file length {len} is not a multiple of {NODE_SIZE}");
            return Err(TreeError::Corruption(format!(
                "file length {len} is not a multiple of {NODE_SIZE}"
            )));
        }
        Ok(len / NODE_SIZE_U64)
    }

    /// Number of live nodes.
    pub fn len(&self) -> Result<u64, TreeError> {
        Ok(self.slot_count()? - self.free.len() as u64)
    }

    /// Whether the tree has no root.
    pub fn is_empty(&self) -> Result<bool, TreeError> {
        if self.storage.is_empty()? {
            return Ok(true);
        }
        Ok(matches!(
            self.read_record(ROOT_OFFSET)?,
            Record::Free { .. }
        ))
    }

    /// Reclaimed slots in the order they will be reused.
    #[must_use]
    pub fn free_offsets(&self) -> Vec<Offset> {
        self.free.iter().copied().collect()
    }

    /// Decode whatever slot sits at `offset`.
    ///
    /// Reading past the end surfaces as `StorageError::OutOfRange`; a
    /// misaligned offset or an invalid child link is `Corruption`.
    pub fn read_record(&self, offset: Offset) -> Result<Record, TreeError> {
        let mut buf = [0u8; NODE_SIZE];
        self.storage.read_at(offset, &mut buf)?;
        Record::decode(&buf, offset).map_err(|e| {
            tracing::warn!("undecodable record: {e}");
            TreeError::Corruption(e.to_string())
        })
    }

    /// Load the live node a child link points at.
    ///
    /// Used by guided walks, where every followed link must address a live
    /// record. Anything else is corruption.
    fn read_node(&self, offset: Offset) -> Result<Node, TreeError> {
        match self.read_record(offset) {
            Ok(Record::Live(node)) => Ok(node),
            Ok(Record::Free { .. }) => {
                tracing::warn!("link to freed slot at offset {offset}");
                Err(TreeError::Corruption(format!(
                    "link to freed slot at offset {offset}"
                )))
            }
            Err(TreeError::Storage(StorageError::OutOfRange { len, .. })) => {
                tracing::warn!("link to offset {offset} past end of file ({len} bytes)");
                Err(TreeError::Corruption(format!(
                    "link to offset {offset} past end of file ({len} bytes)"
                )))
            }
            Err(e) => Err(e),
        }
    }

    /// Allocate a slot for `node`, encode it there, and return its offset.
    ///
    /// Reuses the oldest reclaimed slot if there is one, otherwise appends.
    pub fn write(&mut self, mut node: Node) -> Result<Offset, TreeError> {
        let reused = self.free.pop_front();
        let offset = match reused {
            Some(offset) => {
                tracing::trace!("reusing free slot at offset {offset}");
                offset
            }
            None => {
                let offset = self.storage.len()?;
                tracing::trace!("appending slot at offset {offset}");
                offset
            }
        };

        node.offset = offset;
        if let Err(e) = self.storage.write_at(offset, &node.encode()) {
            // The slot was not consumed; keep it first in line.
            if let Some(offset) = reused {
                self.free.push_front(offset);
            }
            return Err(e.into());
        }
        Ok(offset)
    }

    /// Rewrite `node` in place at its own offset.
    pub fn update(&mut self, node: &Node) -> Result<(), TreeError> {
        self.storage.write_at(node.offset, &node.encode())?;
        Ok(())
    }

    /// Insert `value`, returning the offset of its new record.
    ///
    /// When the new value falls between a node and its existing child, the new
    /// node is spliced in between instead of descending further.
    pub fn insert(&mut self, value: i32) -> Result<Offset, TreeError> {
        if self.is_empty()? {
            return self.place_root(value);
        }

        let mut steps = Steps::new(self.slot_count()?);
        steps.take(ROOT_OFFSET)?;
        let mut current = self.read_node(ROOT_OFFSET)?;
        loop {
            let side = if current.value > value {
                Side::Left
            } else {
                Side::Right
            };

            let Some(child_offset) = side.link(&current) else {
                let offset = self.write(Node::new(value))?;
                side.set_link(&mut current, Some(offset));
                self.update(&current)?;
                tracing::debug!(
                    "inserted {value} at offset {offset} as {side:?} child of {}",
                    current.offset
                );
                return Ok(offset);
            };

            steps.take(child_offset)?;
            let child = self.read_node(child_offset)?;
            // An equal left child is descended into so the duplicate ends up on
            // its right side.
            let descend = match side {
                Side::Left => child.value >= value,
                Side::Right => child.value < value,
            };
            if descend {
                current = child;
                continue;
            }

            let mut spliced = Node::new(value);
            side.set_link(&mut spliced, Some(child_offset));
            let offset = self.write(spliced)?;
            side.set_link(&mut current, Some(offset));
            self.update(&current)?;
            tracing::debug!(
                "spliced {value} at offset {offset} between {} and {child_offset}",
                current.offset
            );
            return Ok(offset);
        }
    }

    fn place_root(&mut self, value: i32) -> Result<Offset, TreeError> {
        let root = Node::new(value);
        self.storage.write_at(ROOT_OFFSET, &root.encode())?;
        self.free.retain(|&offset| offset != ROOT_OFFSET);
        tracing::debug!("inserted {value} as root");
        Ok(ROOT_OFFSET)
    }

    /// Offset of the first node holding `value` on the search path.
    pub fn seek(&self, value: i32) -> Result<Offset, TreeError> {
        Ok(self.locate(value)?.node.offset)
    }

    /// Whether `value` is in the tree.
    ///
    /// Absence is `Ok(false)`; corruption and I/O failures still propagate.
    pub fn contains(&self, value: i32) -> Result<bool, TreeError> {
        match self.seek(value) {
            Ok(_) => Ok(true),
            Err(TreeError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn locate(&self, value: i32) -> Result<Located, TreeError> {
        if self.is_empty()? {
            return Err(TreeError::NotFound(value));
        }

        let mut steps = Steps::new(self.slot_count()?);
        steps.take(ROOT_OFFSET)?;
        let mut parent = None;
        let mut current = self.read_node(ROOT_OFFSET)?;
        loop {
            if current.value == value {
                return Ok(Located {
                    node: current,
                    parent,
                });
            }

            let side = if value < current.value {
                Side::Left
            } else {
                Side::Right
            };
            let Some(next) = side.link(&current) else {
                return Err(TreeError::NotFound(value));
            };
            parent = Some((current, side));
            steps.take(next)?;
            current = self.read_node(next)?;
        }
    }

    /// Delete `value` if it is stored in a leaf.
    ///
    /// Returns `Ok(false)` if the value is absent or its node has children;
    /// the tree is left untouched in both cases. See [`DiskTree::remove`] for
    /// deleting internal nodes.
    pub fn delete(&mut self, value: i32) -> Result<bool, TreeError> {
        match self.delete_leaf(value) {
            Ok(()) => Ok(true),
            Err(TreeError::NotFound(_) | TreeError::Unsupported { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn delete_leaf(&mut self, value: i32) -> Result<(), TreeError> {
        let found = self.locate(value)?;
        if !found.node.is_leaf() {
            return Err(TreeError::Unsupported {
                value,
                offset: found.node.offset,
            });
        }
        self.unlink_leaf(found)?;
        tracing::debug!("deleted leaf {value} at offset {}", found.node.offset);
        Ok(())
    }

    /// Delete `value` wherever it sits in the tree.
    ///
    /// - leaf: unlinked from its parent and freed
    /// - one child: the child's record is pulled up into this slot
    /// - two children: the in-order successor's value is copied here and the
    ///   successor is unlinked
    ///
    /// Parent links and the root offset never move. Returns `Ok(false)` if the
    /// value is absent.
    pub fn remove(&mut self, value: i32) -> Result<bool, TreeError> {
        let found = match self.locate(value) {
            Ok(found) => found,
            Err(TreeError::NotFound(_)) => return Ok(false),
            Err(e) => return Err(e),
        };
        let mut target = found.node;

        match (target.left, target.right) {
            (None, None) => self.unlink_leaf(found)?,
            (Some(only), None) | (None, Some(only)) => {
                let child = self.read_node(only)?;
                let pulled_up = Node {
                    offset: target.offset,
                    ..child
                };
                self.update(&pulled_up)?;
                self.free_slot(child.offset)?;
            }
            (Some(_), Some(right)) => {
                let mut steps = Steps::new(self.slot_count()?);
                steps.take(right)?;
                let mut successor_parent = target;
                let mut successor = self.read_node(right)?;
                while let Some(left) = successor.left {
                    steps.take(left)?;
                    successor_parent = successor;
                    successor = self.read_node(left)?;
                }

                target.value = successor.value;
                if successor_parent.offset == target.offset {
                    target.right = successor.right;
                    self.update(&target)?;
                } else {
                    self.update(&target)?;
                    successor_parent.left = successor.right;
                    self.update(&successor_parent)?;
                }
                self.free_slot(successor.offset)?;
            }
        }

        tracing::debug!("removed {value} from offset {}", found.node.offset);
        Ok(true)
    }

    /// Clear the parent's link to a leaf, then free the leaf's slot.
    ///
    /// A crash between the two writes leaks the slot rather than leaving a
    /// link to a tombstone.
    fn unlink_leaf(&mut self, found: Located) -> Result<(), TreeError> {
        if let Some((mut parent, side)) = found.parent {
            side.set_link(&mut parent, None);
            self.update(&parent)?;
        }
        self.free_slot(found.node.offset)
    }

    fn free_slot(&mut self, offset: Offset) -> Result<(), TreeError> {
        self.storage.write_at(offset, &encode_free())?;
        self.free.push_back(offset);
        tracing::trace!("freed slot at offset {offset}");
        Ok(())
    }

    /// All values in ascending order, following links from the root.
    pub fn in_order(&self) -> Result<Vec<i32>, TreeError> {
        let mut values = Vec::new();
        if self.is_empty()? {
            return Ok(values);
        }

        let mut steps = Steps::new(self.slot_count()?);
        let mut stack: Vec<Node> = Vec::new();
        let mut next = Some(ROOT_OFFSET);
        loop {
            while let Some(offset) = next {
                steps.take(offset)?;
                let node = self.read_node(offset)?;
                next = node.left;
                stack.push(node);
            }
            let Some(node) = stack.pop() else {
                break;
            };
            values.push(node.value);
            next = node.right;
        }
        Ok(values)
    }

    /// Every slot in physical order, live and free.
    pub fn dump(&self) -> Result<Vec<Record>, TreeError> {
        let mut records = Vec::with_capacity(usize::try_from(self.slot_count()?).unwrap_or(0));
        let mut offset = 0;
        loop {
            match self.read_record(offset) {
                Ok(record) => records.push(record),
                // Running off the last record ends the scan.
                Err(TreeError::Storage(StorageError::OutOfRange { .. })) => break,
                Err(e) => return Err(e),
            }
            offset += NODE_SIZE_U64;
        }
        Ok(records)
    }

    /// Write one line per physical slot to `out`, followed by a separator.
    pub fn print<W: Write>(&self, out: &mut W) -> Result<(), TreeError> {
        for record in self.dump()? {
            let line = match record {
                Record::Live(node) if node.is_root() => writeln!(out, "{node} {{ROOT}}"),
                Record::Live(node) => writeln!(out, "{node}"),
                Record::Free { offset } => writeln!(out, "<free> offset: {offset}"),
            };
            line.map_err(StorageError::Io)?;
        }
        writeln!(out, "-----------").map_err(StorageError::Io)?;
        Ok(())
    }

    /// Check the structural invariants of the file.
    ///
    /// - every link addresses a live record and no record is reached twice
    /// - left subtrees hold smaller values, right subtrees equal or larger ones
    /// - every live record is reachable from the root
    /// - the free queue matches the tombstones on disk
    pub fn verify(&self) -> Result<(), TreeError> {
        let mut live = HashSet::new();
        let mut on_disk_free = HashSet::new();
        for record in self.dump()? {
            match record {
                Record::Live(node) => live.insert(node.offset),
                Record::Free { offset } => on_disk_free.insert(offset),
            };
        }

        let queued: HashSet<Offset> = self.free.iter().copied().collect();
        if queued != on_disk_free || queued.len() != self.free.len() {
            return Err(TreeError::Corruption(
                "free queue does not match tombstones on disk".to_string(),
            ));
        }

        let mut reached = HashSet::new();
        if !self.is_empty()? {
            // (offset, inclusive lower bound, exclusive upper bound)
            let mut stack: Vec<(Offset, Option<i32>, Option<i32>)> =
                vec![(ROOT_OFFSET, None, None)];
            while let Some((offset, low, high)) = stack.pop() {
                if !reached.insert(offset) {
                    return Err(TreeError::Corruption(format!(
                        "offset {offset} is linked more than once"
                    )));
                }
                let node = self.read_node(offset)?;
                let in_bounds = low.is_none_or(|low| node.value >= low)
                    && high.is_none_or(|high| node.value < high);
                if !in_bounds {
                    return Err(TreeError::Corruption(format!(
                        "value {} at offset {offset} breaks ordering",
                        node.value
                    )));
                }
                if let Some(left) = node.left {
                    stack.push((left, low, Some(node.value)));
                }
                if let Some(right) = node.right {
                    stack.push((right, Some(node.value), high));
                }
            }
        }

        if reached != live {
            return Err(TreeError::Corruption(format!(
                "{} live records are unreachable from the root",
                live.difference(&reached).count()
            )));
        }
        Ok(())
    }

    /// Flush and release the storage.
    pub fn close(mut self) -> Result<(), TreeError> {
        self.closed = true;
        self.storage.sync()?;
        tracing::debug!("closed tree");
        Ok(())
    }
}

impl<S: Storage> Drop for DiskTree<S> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Err(e) = self.storage.sync() {
            tracing::warn!("failed to sync tree on drop: {e}");
        }
    }
}

/// Errors that can occur during tree operations.
#[derive(Debug)]
pub enum TreeError {
    /// Storage error.
    Storage(StorageError),
    /// The value is not in the tree.
    NotFound(i32),
    /// Deleting a node that has children.
    Unsupported { value: i32, offset: Offset },
    /// The file does not describe a valid tree.
    Corruption(String),
    /// A thread panicked while holding the tree lock.
    Poisoned,
}

impl std::fmt::Display for TreeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Storage(e) => write!(f, "storage error: {e}"),
            Self::NotFound(value) => write!(f, "value {value} not found"),
            Self::Unsupported { value, offset } => write!(
                f,
                "cannot delete {value} at offset {offset}: node has children"
            ),
            Self::Corruption(msg) => write!(f, "corruption: {msg}"),
            Self::Poisoned => write!(f, "tree lock poisoned"),
        }
    }
}

impl std::error::Error for TreeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Storage(e) => Some(e),
            Self::NotFound(_) | Self::Unsupported { .. } | Self::Corruption(_) | Self::Poisoned => {
                None
            }
        }
    }
}

impl From<StorageError> for TreeError {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}
