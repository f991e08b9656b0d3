//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Storage (LocalStorage on web, in-memory elsewhere)
//! - Scheduling of deferred work (microtasks on web, manual drain natively)

pub mod memory;
pub mod storage;

pub use memory::MemoryStore;
pub use storage::LocalStorage;

use crate::error::StoreError;

/// A string key-value store that cells persist into.
///
/// Methods take `&self`: browser storage is shared process-wide state, and
/// in-memory stores use interior mutability to match.
pub trait KeyValueStore {
    /// Read the entry for `key`, `Ok(None)` if there is none
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write `value` under `key`, replacing any previous entry
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Delete the entry for `key` (no-op if absent)
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}
