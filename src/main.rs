//! Stowcell entry point
//!
//! On the web, loads the wallet preferences from LocalStorage and applies the
//! theme to the page. Natively there is no LocalStorage, so it reports that
//! and walks through the same flow against an in-memory store.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_app {
    use stowcell::{Preferences, Theme};

    /// Set `data-theme` on <html>
    fn apply_theme(theme: Theme) {
        let root = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.document_element());
        if let Some(root) = root {
            let _ = root.set_attribute("data-theme", theme.as_str());
        }
    }

    fn system_prefers_dark() -> bool {
        web_sys::window()
            .and_then(|w| w.match_media("(prefers-color-scheme: dark)").ok().flatten())
            .map(|m| m.matches())
            .unwrap_or(false)
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Stowcell starting...");

        let prefs = match Preferences::local() {
            Ok(prefs) => prefs,
            Err(e) => {
                log::error!("Preferences not persisted: {}", e);
                apply_theme(Theme::System.resolve(system_prefers_dark()));
                return;
            }
        };

        prefs.errors().on_error(|err| {
            if err.is_quota_exceeded() {
                log::error!("Storage is full, preferences will not be saved");
            }
        });

        apply_theme(prefs.get().theme.resolve(system_prefers_dark()));
        log::info!("Theme: {}", prefs.get().theme);

        // Keep the cell (and its error listener) alive for the page lifetime
        std::mem::forget(prefs);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_app::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use std::rc::Rc;
    use stowcell::{EffectQueue, KeyValueStore, MemoryStore, Preferences, Theme};

    env_logger::init();
    log::info!("Stowcell (native) starting...");

    if let Err(e) = Preferences::local() {
        log::warn!("{} - using an in-memory store", e);
    }

    let store = MemoryStore::new();
    let queue = EffectQueue::manual();

    let mut prefs = match Preferences::cell(Rc::new(store.clone()), queue.clone()) {
        Ok(prefs) => prefs,
        Err(e) => {
            log::error!("{}", e);
            return;
        }
    };
    prefs.update(|p| p.theme = Theme::Dark);
    let ran = queue.settle();
    log::info!("{} write-back(s) settled", ran);

    match store.get(Preferences::STORAGE_KEY) {
        Ok(Some(json)) => println!("{} = {}", Preferences::STORAGE_KEY, json),
        Ok(None) => println!("{} not stored", Preferences::STORAGE_KEY),
        Err(e) => log::error!("{}", e),
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
