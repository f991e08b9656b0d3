//! Browser LocalStorage backend
//!
//! Only exists on wasm32; opening it anywhere else reports the store as
//! unavailable so callers fail at construction rather than silently.

use super::KeyValueStore;
use crate::error::StoreError;

/// `window.localStorage`
#[derive(Debug, Clone)]
pub struct LocalStorage {
    #[cfg(target_arch = "wasm32")]
    storage: web_sys::Storage,
}

#[cfg(target_arch = "wasm32")]
impl LocalStorage {
    /// Open the page's LocalStorage (WASM only)
    pub fn open() -> Result<Self, StoreError> {
        let window = web_sys::window()
            .ok_or_else(|| StoreError::Unavailable("no window".into()))?;

        // Throws in some privacy modes, returns null when disabled
        let storage = window
            .local_storage()
            .map_err(|e| StoreError::Unavailable(js_error_name(&e)))?
            .ok_or_else(|| StoreError::Unavailable("localStorage disabled".into()))?;

        Ok(Self { storage })
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl LocalStorage {
    /// Native stub: there is no browser storage outside wasm
    pub fn open() -> Result<Self, StoreError> {
        Err(StoreError::Unavailable(
            "LocalStorage requires a browser context".into(),
        ))
    }
}

#[cfg(target_arch = "wasm32")]
fn js_error_name(err: &wasm_bindgen::JsValue) -> String {
    js_sys::Reflect::get(err, &wasm_bindgen::JsValue::from_str("name"))
        .ok()
        .and_then(|name| name.as_string())
        .unwrap_or_else(|| format!("{:?}", err))
}

#[cfg(target_arch = "wasm32")]
impl KeyValueStore for LocalStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.storage
            .get_item(key)
            .map_err(|e| StoreError::Unavailable(js_error_name(&e)))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.storage.set_item(key, value).map_err(|e| {
            let name = js_error_name(&e);
            // Firefox used to report NS_ERROR_DOM_QUOTA_REACHED
            if name == "QuotaExceededError" || name == "NS_ERROR_DOM_QUOTA_REACHED" {
                StoreError::QuotaExceeded {
                    key: key.to_string(),
                }
            } else {
                StoreError::Unavailable(name)
            }
        })
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.storage
            .remove_item(key)
            .map_err(|e| StoreError::Unavailable(js_error_name(&e)))
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl KeyValueStore for LocalStorage {
    fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Err(StoreError::Unavailable("no browser storage".into()))
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("no browser storage".into()))
    }

    fn remove(&self, _key: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("no browser storage".into()))
    }
}
