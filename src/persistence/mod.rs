//! Reactive values persisted to a key-value store
//!
//! Features:
//! - Cells seeded from the store, falling back to a default
//! - Deferred write-backs on every mutation, run in mutation order
//! - JSON or plain-text encoding
//! - Error channel for failed write-backs (quota, storage lost)

pub mod cell;
pub mod channel;
pub mod codec;
pub mod effect;

pub use cell::PersistedCell;
pub use channel::WriteErrors;
pub use codec::{Codec, Json, Text};
pub use effect::{DrainMode, EffectQueue};
