// Application state module
// Everything a handler needs, built once at startup and shared behind an Arc

use super::types::Config;
use crate::storage::ImageStore;

/// Application state
pub struct AppState {
    pub config: Config,
    pub store: ImageStore,
}

impl AppState {
    /// Build state around an already bootstrapped storage directory
    pub fn new(config: Config) -> Self {
        let store = ImageStore::new(&config.storage.dir);
        Self { config, store }
    }
}
