//! Wallet preferences
//!
//! Persisted as one JSON record in LocalStorage.

use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CellError;
use crate::persistence::{EffectQueue, PersistedCell};
use crate::platform::KeyValueStore;

/// Color scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Theme {
    Light,
    Dark,
    /// Follow the OS setting
    #[default]
    System,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::System => "system",
        }
    }

    /// Concrete theme once the OS preference is known
    pub fn resolve(&self, system_prefers_dark: bool) -> Theme {
        match self {
            Theme::System if system_prefers_dark => Theme::Dark,
            Theme::System => Theme::Light,
            other => *other,
        }
    }

    /// Light <-> dark (System resolves to Light first)
    pub fn toggled(&self) -> Theme {
        match self {
            Theme::Dark => Theme::Light,
            _ => Theme::Dark,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            "system" | "auto" => Ok(Theme::System),
            other => Err(format!("unknown theme '{}'", other)),
        }
    }
}

/// User preferences for the wallet UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub theme: Theme,

    // === Display ===
    /// ISO 4217 code for fiat conversions
    pub fiat_currency: String,
    /// Mask balances until revealed
    pub hide_balances: bool,

    // === Security ===
    /// Lock the wallet after this many idle minutes (0 = never)
    pub auto_lock_minutes: u32,

    // === Network ===
    /// Remote daemon URL, None = built-in default node
    pub remote_node: Option<String>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            theme: Theme::System,
            fiat_currency: "USD".to_string(),
            hide_balances: false,
            auto_lock_minutes: 15,
            remote_node: None,
        }
    }
}

impl Preferences {
    /// LocalStorage key
    pub const STORAGE_KEY: &'static str = "wallet_preferences";

    /// Longest accepted auto-lock timeout (one day)
    pub const MAX_AUTO_LOCK_MINUTES: u32 = 24 * 60;

    /// Bind preferences to `store`
    pub fn cell(
        store: Rc<dyn KeyValueStore>,
        queue: EffectQueue,
    ) -> Result<PersistedCell<Preferences>, CellError> {
        PersistedCell::new(store, queue, Self::STORAGE_KEY, Self::default())
    }

    /// Bind preferences to the browser's LocalStorage
    pub fn local() -> Result<PersistedCell<Preferences>, CellError> {
        PersistedCell::local(Self::STORAGE_KEY, Self::default())
    }

    /// Drop the stored record so the next load starts from defaults
    pub fn forget(store: &dyn KeyValueStore) {
        match store.remove(Self::STORAGE_KEY) {
            Ok(()) => log::info!("Preferences cleared"),
            Err(e) => log::warn!("Failed to clear preferences: {}", e),
        }
    }

    /// Set the auto-lock timeout, clamped to a day
    pub fn set_auto_lock(&mut self, minutes: u32) {
        self.auto_lock_minutes = minutes.min(Self::MAX_AUTO_LOCK_MINUTES);
    }

    /// Whether the wallet should lock after `idle_minutes` without input
    pub fn should_lock(&self, idle_minutes: u32) -> bool {
        self.auto_lock_minutes != 0 && idle_minutes >= self.auto_lock_minutes
    }

    /// Set the fiat currency; anything other than three ASCII letters is
    /// rejected and leaves the current code unchanged
    pub fn set_fiat_currency(&mut self, code: &str) -> bool {
        let code = code.trim();
        if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
            self.fiat_currency = code.to_ascii_uppercase();
            true
        } else {
            false
        }
    }
}
