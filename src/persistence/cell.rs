//! A value bound to one key of a persistent store
//!
//! The in-memory value is authoritative: reads never go back to the store,
//! and writes update it immediately. Every write also schedules a write-back
//! of an encoded snapshot on the [`EffectQueue`]. Write-back failures go to
//! the cell's [`WriteErrors`] channel and never roll the value back.

use std::marker::PhantomData;
use std::rc::Rc;

use super::channel::WriteErrors;
use super::codec::{Codec, Json, Text};
use super::effect::EffectQueue;
use crate::error::{CellError, WriteError, WriteFailure};
use crate::platform::{KeyValueStore, LocalStorage};

/// Reactive value persisted under `key`, encoded with codec `C`
pub struct PersistedCell<T, C = Json> {
    key: Rc<str>,
    value: T,
    default: T,
    store: Rc<dyn KeyValueStore>,
    queue: EffectQueue,
    errors: WriteErrors,
    _codec: PhantomData<C>,
}

impl<T, C> std::fmt::Debug for PersistedCell<T, C>
where
    T: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistedCell")
            .field("key", &self.key)
            .field("value", &self.value)
            .field("default", &self.default)
            .finish_non_exhaustive()
    }
}

impl<T, C> PersistedCell<T, C>
where
    T: Clone,
    C: Codec<T>,
{
    /// Bind `key` in `store`, seeding the value from what is stored there.
    ///
    /// An absent or empty entry means "use `default`", as does an entry the
    /// codec cannot decode. The seeded value is written back once, so a
    /// fresh key ends up holding the default.
    pub fn with_codec(
        store: Rc<dyn KeyValueStore>,
        queue: EffectQueue,
        key: impl Into<String>,
        default: T,
    ) -> Result<Self, CellError> {
        let key: String = key.into();
        if key.is_empty() {
            return Err(CellError::EmptyKey);
        }

        let value = match store.get(&key)? {
            // Empty strings count as missing, same as an absent entry
            Some(raw) if !raw.is_empty() => match C::decode(&raw) {
                Ok(value) => {
                    log::info!("Loaded '{}' from storage", key);
                    value
                }
                Err(e) => {
                    log::warn!("Stored '{}' is unreadable ({}), using default", key, e);
                    default.clone()
                }
            },
            _ => {
                log::info!("No stored '{}', using default", key);
                default.clone()
            }
        };

        let cell = Self {
            key: Rc::from(key),
            value,
            default,
            store,
            queue,
            errors: WriteErrors::new(),
            _codec: PhantomData,
        };
        cell.write_back();
        Ok(cell)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Current value (never re-reads the store)
    pub fn get(&self) -> &T {
        &self.value
    }

    pub fn default_value(&self) -> &T {
        &self.default
    }

    /// Replace the value and schedule a write-back
    pub fn set(&mut self, value: T) {
        self.value = value;
        self.write_back();
    }

    /// Like [`set`](Self::set), returning the previous value
    pub fn replace(&mut self, value: T) -> T {
        let old = std::mem::replace(&mut self.value, value);
        self.write_back();
        old
    }

    /// Mutate the value in place, then schedule one write-back
    pub fn update<R>(&mut self, f: impl FnOnce(&mut T) -> R) -> R {
        let result = f(&mut self.value);
        self.write_back();
        result
    }

    /// Go back to the default value (and persist it)
    pub fn reset(&mut self) {
        self.value = self.default.clone();
        self.write_back();
    }

    /// Channel receiving this cell's failed write-backs
    pub fn errors(&self) -> &WriteErrors {
        &self.errors
    }

    /// Queue a write of the current value.
    ///
    /// The value is encoded now, so mutations made before the effect runs
    /// don't leak into this write.
    fn write_back(&self) {
        let snapshot = match C::encode(&self.value) {
            Ok(raw) => raw,
            Err(e) => {
                self.errors.report(WriteError {
                    key: self.key.to_string(),
                    failure: WriteFailure::Codec(e),
                });
                return;
            }
        };

        let key = Rc::clone(&self.key);
        let store = Rc::clone(&self.store);
        let errors = self.errors.clone();
        log::debug!("Scheduling write-back of '{}'", key);
        self.queue.schedule(move || {
            if let Err(e) = store.set(&key, &snapshot) {
                errors.report(WriteError {
                    key: key.to_string(),
                    failure: WriteFailure::Store(e),
                });
            }
        });
    }

    /// Bind `key` in the browser's LocalStorage, using this thread's effect
    /// queue. Fails with [`CellError::StoreUnavailable`] outside a browser.
    pub fn local(key: impl Into<String>, default: T) -> Result<Self, CellError> {
        let store = LocalStorage::open()?;
        Self::with_codec(Rc::new(store), EffectQueue::current(), key, default)
    }
}

impl<T> PersistedCell<T, Json>
where
    T: Clone + serde::Serialize + serde::de::DeserializeOwned,
{
    /// Cell storing its value as JSON
    pub fn new(
        store: Rc<dyn KeyValueStore>,
        queue: EffectQueue,
        key: impl Into<String>,
        default: T,
    ) -> Result<Self, CellError> {
        Self::with_codec(store, queue, key, default)
    }
}

impl<T> PersistedCell<T, Text>
where
    T: Clone + std::fmt::Display + std::str::FromStr,
    T::Err: std::fmt::Display,
{
    /// Cell storing its value as plain text
    pub fn text(
        store: Rc<dyn KeyValueStore>,
        queue: EffectQueue,
        key: impl Into<String>,
        default: T,
    ) -> Result<Self, CellError> {
        Self::with_codec(store, queue, key, default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::platform::MemoryStore;
    use proptest::prelude::*;
    use serde::{Deserialize, Serialize};

    fn setup() -> (MemoryStore, EffectQueue) {
        (MemoryStore::new(), EffectQueue::manual())
    }

    fn theme_cell(store: &MemoryStore, queue: &EffectQueue) -> PersistedCell<String, Text> {
        PersistedCell::text(
            Rc::new(store.clone()),
            queue.clone(),
            "theme",
            "light".to_string(),
        )
        .unwrap()
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Wallet {
        label: String,
        accounts: Vec<u32>,
    }

    #[test]
    fn test_empty_store_uses_default_and_persists_it() {
        let (store, queue) = setup();
        let cell = theme_cell(&store, &queue);
        assert_eq!(cell.get(), "light");

        // Write-back is deferred
        assert_eq!(store.get("theme").unwrap(), None);
        queue.settle();
        assert_eq!(store.get("theme").unwrap().as_deref(), Some("light"));
    }

    #[test]
    fn test_existing_entry_wins_over_default() {
        let (store, queue) = setup();
        store.set("theme", "dark").unwrap();

        let cell = theme_cell(&store, &queue);
        assert_eq!(cell.get(), "dark");
        assert_eq!(cell.default_value(), "light");
    }

    #[test]
    fn test_last_write_wins() {
        let (store, queue) = setup();
        let mut cell = theme_cell(&store, &queue);

        cell.set("dark".to_string());
        cell.set("light".to_string());
        assert_eq!(cell.get(), "light");

        queue.settle();
        assert_eq!(store.get("theme").unwrap().as_deref(), Some("light"));
    }

    #[test]
    fn test_unavailable_store_fails_construction() {
        let store = MemoryStore::unavailable();
        let result = PersistedCell::text(
            Rc::new(store),
            EffectQueue::manual(),
            "theme",
            "light".to_string(),
        );
        assert!(matches!(result, Err(CellError::StoreUnavailable(_))));
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn test_local_storage_unavailable_natively() {
        let result = PersistedCell::<String, Text>::local("theme", "light".to_string());
        assert!(matches!(result, Err(CellError::StoreUnavailable(_))));
    }

    #[test]
    fn test_empty_key_rejected() {
        let (store, queue) = setup();
        let result = PersistedCell::text(Rc::new(store), queue, "", 0u32);
        assert!(matches!(result, Err(CellError::EmptyKey)));
    }

    #[test]
    fn test_json_cell_reads_plain_string_entry() {
        let (store, queue) = setup();
        store.set("theme", "dark").unwrap();

        let cell: PersistedCell<String> =
            PersistedCell::new(Rc::new(store.clone()), queue.clone(), "theme", "light".into())
                .unwrap();
        assert_eq!(cell.get(), "dark");

        // The write-back keeps the value, only the encoding changes
        queue.settle();
        let raw = store.get("theme").unwrap().unwrap();
        assert_eq!(<Json as Codec<String>>::decode(&raw).unwrap(), "dark");
    }

    #[test]
    fn test_empty_entry_counts_as_missing() {
        let (store, queue) = setup();
        store.set("theme", "").unwrap();
        let cell = theme_cell(&store, &queue);
        assert_eq!(cell.get(), "light");
    }

    #[test]
    fn test_zero_string_is_a_real_value() {
        let (store, queue) = setup();
        store.set("count", "0").unwrap();
        let cell = PersistedCell::text(Rc::new(store), queue, "count", 7u32).unwrap();
        assert_eq!(*cell.get(), 0);
    }

    #[test]
    fn test_malformed_entry_falls_back_to_default() {
        let (store, queue) = setup();
        store.set("wallet", "{broken").unwrap();

        let default = Wallet {
            label: "main".into(),
            accounts: vec![0],
        };
        let cell = PersistedCell::new(
            Rc::new(store.clone()),
            queue.clone(),
            "wallet",
            default.clone(),
        )
        .unwrap();
        assert_eq!(*cell.get(), default);

        // The default then replaces the broken entry
        queue.settle();
        let raw = store.get("wallet").unwrap().unwrap();
        assert_eq!(serde_json::from_str::<Wallet>(&raw).unwrap(), default);
    }

    #[test]
    fn test_value_survives_reconstruction() {
        let (store, queue) = setup();
        {
            let mut cell = PersistedCell::new(
                Rc::new(store.clone()),
                queue.clone(),
                "wallet",
                Wallet {
                    label: "main".into(),
                    accounts: vec![],
                },
            )
            .unwrap();
            cell.update(|w| w.accounts.push(3));
        }
        // Dropping the cell doesn't cancel its write-backs
        queue.settle();

        let cell: PersistedCell<Wallet> = PersistedCell::new(
            Rc::new(store),
            queue,
            "wallet",
            Wallet {
                label: "other".into(),
                accounts: vec![],
            },
        )
        .unwrap();
        assert_eq!(cell.get().label, "main");
        assert_eq!(cell.get().accounts, vec![3]);
    }

    #[test]
    fn test_write_back_uses_snapshot() {
        let (store, queue) = setup();
        let mut cell = PersistedCell::new(
            Rc::new(store.clone()),
            queue.clone(),
            "wallet",
            Wallet {
                label: "main".into(),
                accounts: vec![],
            },
        )
        .unwrap();
        queue.settle();

        cell.update(|w| w.accounts.push(1));
        // Run only the write-back scheduled for [1], after a later mutation
        let log = Rc::new(std::cell::RefCell::new(Vec::new()));
        let (s, l) = (store.clone(), log.clone());
        queue.schedule(move || l.borrow_mut().push(s.get("wallet").unwrap().unwrap()));
        cell.update(|w| w.accounts.push(2));
        queue.settle();

        let seen = log.borrow();
        let first: Wallet = serde_json::from_str(&seen[0]).unwrap();
        assert_eq!(first.accounts, vec![1]);

        let last: Wallet = serde_json::from_str(&store.get("wallet").unwrap().unwrap()).unwrap();
        assert_eq!(last.accounts, vec![1, 2]);
    }

    #[test]
    fn test_quota_failure_keeps_value() {
        let store = MemoryStore::with_quota(16);
        let queue = EffectQueue::manual();
        let mut cell = PersistedCell::text(
            Rc::new(store.clone()),
            queue.clone(),
            "theme",
            "light".to_string(),
        )
        .unwrap();
        queue.settle();
        assert!(cell.errors().is_empty());

        cell.set("a-very-long-theme-name".to_string());
        queue.settle();

        assert_eq!(cell.get(), "a-very-long-theme-name");
        assert_eq!(store.get("theme").unwrap().as_deref(), Some("light"));

        let errors = cell.errors().take();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].is_quota_exceeded());
        assert_eq!(errors[0].key, "theme");
    }

    #[test]
    fn test_repeated_quota_failures_stay_bounded() {
        use crate::persistence::channel::MAX_BACKLOG;
        let store = MemoryStore::with_quota(8);
        let queue = EffectQueue::manual();
        let mut cell =
            PersistedCell::text(Rc::new(store), queue.clone(), "theme", "x".to_string())
                .unwrap();
        let seen = Rc::new(std::cell::Cell::new(0));
        let s = seen.clone();
        cell.errors().on_error(move |_| s.set(s.get() + 1));

        for i in 0..1_000 {
            cell.set(format!("too-long-{}", i));
        }
        queue.settle();

        assert_eq!(seen.get(), 1_000);
        assert_eq!(cell.errors().len(), MAX_BACKLOG);
    }

    #[test]
    fn test_store_lost_after_construction_reports_error() {
        let (store, queue) = setup();
        let mut cell = theme_cell(&store, &queue);
        queue.settle();

        store.set_available(false);
        cell.set("dark".to_string());
        queue.settle();

        let errors = cell.errors().take();
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            errors[0].failure,
            WriteFailure::Store(StoreError::Unavailable(_))
        ));
        assert_eq!(cell.get(), "dark");
    }

    #[test]
    fn test_encode_failure_reported() {
        use std::collections::HashMap;
        let (store, queue) = setup();
        let mut cell: PersistedCell<HashMap<(u8, u8), u8>> =
            PersistedCell::new(Rc::new(store.clone()), queue.clone(), "grid", HashMap::new())
                .unwrap();
        assert!(cell.errors().is_empty());

        cell.update(|m| m.insert((0, 0), 1));
        assert_eq!(queue.pending(), 1); // only the initial write-back
        let errors = cell.errors().take();
        assert!(matches!(errors[0].failure, WriteFailure::Codec(_)));
        assert_eq!(cell.get().len(), 1);
    }

    #[test]
    fn test_reset_and_replace() {
        let (store, queue) = setup();
        let mut cell = theme_cell(&store, &queue);

        let old = cell.replace("dark".to_string());
        assert_eq!(old, "light");
        queue.settle();
        assert_eq!(store.get("theme").unwrap().as_deref(), Some("dark"));

        cell.reset();
        assert_eq!(cell.get(), "light");
        queue.settle();
        assert_eq!(store.get("theme").unwrap().as_deref(), Some("light"));
    }

    #[test]
    fn test_two_cells_same_key_last_write_wins() {
        let (store, queue) = setup();
        let mut a = theme_cell(&store, &queue);
        let mut b = theme_cell(&store, &queue);

        a.set("dark".to_string());
        b.set("sepia".to_string());
        queue.settle();

        assert_eq!(store.get("theme").unwrap().as_deref(), Some("sepia"));
        // No sync between cells
        assert_eq!(a.get(), "dark");
    }

    proptest! {
        #[test]
        fn prop_store_holds_last_written(values in proptest::collection::vec(".+", 1..10)) {
            let (store, queue) = setup();
            let mut cell = theme_cell(&store, &queue);
            for v in &values {
                cell.set(v.clone());
            }
            queue.settle();
            let last = values.last().unwrap();
            let stored = store.get("theme").unwrap();
            prop_assert_eq!(stored.as_ref(), Some(last));

            // A fresh cell sees what the old one wrote
            let again = theme_cell(&store, &queue);
            prop_assert_eq!(again.get(), last);
        }

        #[test]
        fn prop_repeated_write_is_idempotent(n in any::<i64>()) {
            let (store, queue) = setup();
            let mut cell = PersistedCell::text(Rc::new(store.clone()), queue.clone(), "n", 0i64)
                .unwrap();
            cell.set(n);
            cell.set(n);
            queue.settle();
            let expected = n.to_string();
            prop_assert_eq!(store.get("n").unwrap(), Some(expected));
            prop_assert_eq!(*cell.get(), n);
        }
    }
}
