//! Byte-addressed storage backends.
//!
//! The tree engine sees its backing store as a flat run of bytes starting at
//! offset 0. Two backends implement that view:
//!
//! - `FileStorage`: the real record file, accessed with positional I/O
//! - `MemoryStorage`: a `Vec<u8>` with seeded fault injection, for tests
//!
//! # Usage
//!
//! ```
//! use disktree::storage::{MemoryStorage, Storage};
//!
//! let mut storage = MemoryStorage::new(0);
//! storage.write_at(0, b"hello").unwrap();
//!
//! let mut buf = [0u8; 5];
//! storage.read_at(0, &mut buf).unwrap();
//! assert_eq!(&buf, b"hello");
//! ```

mod file;
mod io;
mod memory;

pub use file::FileStorage;
pub use io::{Storage, StorageError};
pub use memory::{FaultConfig, MemoryStorage, MemoryStorageStats};
