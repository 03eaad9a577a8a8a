//! Key-value storage capability.
//!
//! # Data Flow
//! ```text
//! Prober / Router
//!     → health store wrapper (typed keys)
//!     → KvStore trait (get/put/delete/list)
//!     → memory.rs (DashMap + per-entry TTL)
//! ```
//!
//! # Design Decisions
//! - Trait object at the seam so tests can inject fakes (including
//!   failing ones)
//! - TTL is per-entry and owned by the store, not by callers
//! - No cross-key transactions; each key is independent

pub mod memory;

use std::time::Duration;
use thiserror::Error;

/// Error type for store operations.
///
/// The in-memory store never fails; remote backends (and test fakes)
/// surface their failures through this type.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store backend unavailable: {0}")]
    Unavailable(String),
}

/// A shared key-value store with per-entry TTL.
///
/// All operations must be safe under unlimited concurrent callers;
/// synchronization is the implementation's responsibility.
pub trait KvStore: Send + Sync {
    /// Read a value. Returns `None` on miss or TTL expiry.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Overwrite a value, resetting its TTL. `None` means no expiry.
    fn put(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), StoreError>;

    /// Remove a key. Removing an absent key is not an error.
    fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// List live keys starting with `prefix`.
    fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError>;
}

pub use memory::MemoryKvStore;
