//! In-memory storage for deterministic testing.
//!
//! This module provides an in-memory implementation of the `Storage` trait
//! with support for fault injection:
//! - Read errors
//! - Write errors
//! - Sync failures
//!
//! Faults are drawn from a seeded RNG, so the same seed and the same sequence
//! of operations always fail at the same points.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::storage::io::{Storage, StorageError};

/// Configuration for fault injection.
#[derive(Debug, Clone, Default)]
pub struct FaultConfig {
    /// Probability of a read error (0.0 - 1.0).
    pub read_error_rate: f64,
    /// Probability of a write error (0.0 - 1.0).
    pub write_error_rate: f64,
    /// Probability of a sync error (0.0 - 1.0).
    pub sync_error_rate: f64,
}

impl FaultConfig {
    /// Create a fault config with no faults (for baseline testing).
    #[must_use]
    pub fn no_faults() -> Self {
        Self::default()
    }

    /// Create a fault config where every write fails.
    #[must_use]
    pub const fn failing_writes() -> Self {
        Self {
            read_error_rate: 0.0,
            write_error_rate: 1.0,
            sync_error_rate: 0.0,
        }
    }

    /// Create a fault config with high fault rates (for stress testing).
    #[must_use]
    pub const fn high_faults() -> Self {
        Self {
            read_error_rate: 0.05,
            write_error_rate: 0.05,
            sync_error_rate: 0.05,
        }
    }
}

/// Statistics about memory storage operations.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MemoryStorageStats {
    /// Number of reads.
    pub reads: u64,
    /// Number of writes.
    pub writes: u64,
    /// Number of syncs.
    pub syncs: u64,
    /// Number of injected faults of any kind.
    pub injected_faults: u64,
}

/// In-memory byte storage.
///
/// Reads take `&self` like the file backend, so the RNG and the read counter
/// sit behind interior mutability.
#[derive(Debug)]
pub struct MemoryStorage {
    bytes: Vec<u8>,
    fault_config: FaultConfig,
    rng: Mutex<StdRng>,
    reads: AtomicU64,
    writes: u64,
    syncs: u64,
    injected_faults: AtomicU64,
}

impl MemoryStorage {
    /// Create empty storage with the given seed and no faults.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self::with_config(seed, FaultConfig::default())
    }

    /// Create empty storage with custom fault configuration.
    #[must_use]
    pub fn with_config(seed: u64, fault_config: FaultConfig) -> Self {
        Self::from_bytes(seed, fault_config, Vec::new())
    }

    /// Create storage pre-filled with `bytes`.
    #[must_use]
    pub fn from_bytes(seed: u64, fault_config: FaultConfig, bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            fault_config,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            reads: AtomicU64::new(0),
            writes: 0,
            syncs: 0,
            injected_faults: AtomicU64::new(0),
        }
    }

    /// Raw contents.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Mutable raw contents, for corrupting records in tests.
    pub fn as_bytes_mut(&mut self) -> &mut Vec<u8> {
        &mut self.bytes
    }

    /// Update the fault configuration.
    pub fn set_fault_config(&mut self, config: FaultConfig) {
        self.fault_config = config;
    }

    /// Get the current statistics.
    #[must_use]
    pub fn stats(&self) -> MemoryStorageStats {
        MemoryStorageStats {
            reads: self.reads.load(Ordering::Relaxed),
            writes: self.writes,
            syncs: self.syncs,
            injected_faults: self.injected_faults.load(Ordering::Relaxed),
        }
    }

    /// Check if a fault should be injected based on the given rate.
    fn should_inject_fault(&self, rate: f64) -> bool {
        if rate <= 0.0 {
            return false;
        }
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        let hit = rng.random::<f64>() < rate;
        if hit {
            self.injected_faults.fetch_add(1, Ordering::Relaxed);
        }
        hit
    }
}

impl Storage for MemoryStorage {
    fn len(&self) -> Result<u64, StorageError> {
        Ok(self.bytes.len() as u64)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<(), StorageError> {
        self.reads.fetch_add(1, Ordering::Relaxed);

        if self.should_inject_fault(self.fault_config.read_error_rate) {
            return Err(StorageError::InjectedFault(
                "simulated read error".to_string(),
            ));
        }

        let len = self.bytes.len() as u64;
        let end = offset.saturating_add(buf.len() as u64);
        if end > len {
            return Err(StorageError::OutOfRange { offset, len });
        }

        let start = offset as usize;
        buf.copy_from_slice(&self.bytes[start..start + buf.len()]);
        Ok(())
    }

    #[allow(clippy::cast_possible_truncation)]
    fn write_at(&mut self, offset: u64, buf: &[u8]) -> Result<(), StorageError> {
        self.writes += 1;

        if self.should_inject_fault(self.fault_config.write_error_rate) {
            return Err(StorageError::InjectedFault(
                "simulated write error".to_string(),
            ));
        }

        let start = offset as usize;
        let end = start + buf.len();
        if end > self.bytes.len() {
            self.bytes.resize(end, 0);
        }
        self.bytes[start..end].copy_from_slice(buf);
        Ok(())
    }

    fn sync(&mut self) -> Result<(), StorageError> {
        self.syncs += 1;

        if self.should_inject_fault(self.fault_config.sync_error_rate) {
            return Err(StorageError::InjectedFault(
                "simulated sync error".to_string(),
            ));
        }

        Ok(())
    }
}
