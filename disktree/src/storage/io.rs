//! Storage abstraction for the record file.
//!
//! The tree engine never touches a `File` directly. It goes through the
//! `Storage` trait, which is a flat byte-addressed region with positional
//! reads and writes. This allows the engine to run against a real file in
//! production and against in-memory storage with injected faults in tests.
//!
//! # Design
//!
//! The trait is kept to the operations the engine actually needs:
//! - Length query (the record area always starts at byte 0)
//! - Positional read that does not disturb other readers
//! - Positional write (appending is a write at `len()`)
//! - Synchronization

/// Errors that can occur during storage operations.
#[derive(Debug)]
pub enum StorageError {
    /// I/O error.
    Io(std::io::Error),
    /// A read ran past the end of the stored bytes.
    OutOfRange { offset: u64, len: u64 },
    /// Injected fault for simulation.
    InjectedFault(String),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::OutOfRange { offset, len } => {
                write!(f, "read at offset {offset} out of range (length: {len})")
            }
            Self::InjectedFault(msg) => write!(f, "injected fault: {msg}"),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::OutOfRange { .. } | Self::InjectedFault(_) => None,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

/// Abstraction over byte-addressed storage.
///
/// # Implementation Notes
///
/// Implementations must ensure:
/// - `read_at` returns the last written content for a range
/// - `read_at` fails with `OutOfRange` if any requested byte lies past `len()`
/// - `write_at` at `len()` extends the storage
/// - `sync` makes all previous writes durable
pub trait Storage {
    /// Current length of the storage in bytes.
    fn len(&self) -> Result<u64, StorageError>;

    /// Whether the storage holds no bytes at all.
    fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.len()? == 0)
    }

    /// Fill `buf` with the bytes starting at `offset`.
    ///
    /// Takes `&self` so that concurrent readers can share one handle.
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<(), StorageError>;

    /// Write `buf` starting at `offset`.
    ///
    /// The write may be buffered until `sync` is called.
    fn write_at(&mut self, offset: u64, buf: &[u8]) -> Result<(), StorageError>;

    /// Sync all pending writes to durable storage.
    fn sync(&mut self) -> Result<(), StorageError>;
}
