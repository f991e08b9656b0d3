//! Stowcell - reactive values persisted to LocalStorage
//!
//! Core modules:
//! - `persistence`: Persisted cells, codecs, deferred write-backs
//! - `platform`: Storage backends (LocalStorage on web, in-memory elsewhere)
//! - `settings`: Wallet preferences stored through a cell
//! - `error`: Error types

pub mod error;
pub mod persistence;
pub mod platform;
pub mod settings;

pub use error::{CellError, CodecError, StoreError, WriteError, WriteFailure};
pub use persistence::{Codec, EffectQueue, Json, PersistedCell, Text, WriteErrors};
pub use platform::{KeyValueStore, LocalStorage, MemoryStore};
pub use settings::{Preferences, Theme};
