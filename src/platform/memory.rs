//! In-process store
//!
//! Used by native builds and tests. Clones share the same entries, so a
//! test can hand one clone to a cell and inspect another.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use super::KeyValueStore;
use crate::error::StoreError;

#[derive(Debug, Default)]
struct Inner {
    entries: RefCell<HashMap<String, String>>,
    /// Max total size (key + value UTF-16 units), None = unlimited
    quota: Option<usize>,
    unavailable: Cell<bool>,
}

/// Shared in-memory [`KeyValueStore`]
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Rc<Inner>,
}

impl MemoryStore {
    /// Empty store with no size limit
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty store that rejects writes once entries exceed `quota`.
    ///
    /// Sizes are counted like browsers do: key plus value, in UTF-16 units.
    pub fn with_quota(quota: usize) -> Self {
        Self {
            inner: Rc::new(Inner {
                quota: Some(quota),
                ..Inner::default()
            }),
        }
    }

    /// Store that fails every operation, as if there were no backing storage
    pub fn unavailable() -> Self {
        let store = Self::new();
        store.set_available(false);
        store
    }

    /// Toggle availability (simulates storage being disabled mid-session)
    pub fn set_available(&self, available: bool) {
        self.inner.unavailable.set(!available);
    }

    pub fn len(&self) -> usize {
        self.inner.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.borrow().is_empty()
    }

    /// Total size in UTF-16 units of all keys and values
    pub fn used(&self) -> usize {
        self.inner
            .entries
            .borrow()
            .iter()
            .map(|(k, v)| entry_size(k, v))
            .sum()
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.inner.unavailable.get() {
            Err(StoreError::Unavailable("memory store disabled".into()))
        } else {
            Ok(())
        }
    }
}

fn entry_size(key: &str, value: &str) -> usize {
    key.encode_utf16().count() + value.encode_utf16().count()
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.check_available()?;
        Ok(self.inner.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.check_available()?;

        if let Some(quota) = self.inner.quota {
            let replaced = self
                .inner
                .entries
                .borrow()
                .get(key)
                .map(|old| entry_size(key, old))
                .unwrap_or(0);
            let after = self.used() - replaced + entry_size(key, value);
            if after > quota {
                return Err(StoreError::QuotaExceeded {
                    key: key.to_string(),
                });
            }
        }

        self.inner
            .entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.check_available()?;
        self.inner.entries.borrow_mut().remove(key);
        Ok(())
    }
}
