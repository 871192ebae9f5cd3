//! Form configuration
//!
//! Loadable from TOML or JSON; every field has a default.

use crate::error::FormError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uiform_options::StoreConfig;

/// Form session configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormConfig {
    /// Quiet period before a typed search is dispatched
    pub search_debounce_ms: u64,
    /// Shortest non-empty search term that reaches the loader
    pub min_search_len: usize,
    /// Options store settings
    pub store: StoreConfig,
}

impl FormConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With search debounce
    #[inline]
    #[must_use]
    pub fn with_search_debounce(mut self, delay: Duration) -> Self {
        self.search_debounce_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// With minimum search length
    #[inline]
    #[must_use]
    pub fn with_min_search_len(mut self, len: usize) -> Self {
        self.min_search_len = len;
        self
    }

    /// With store configuration
    #[inline]
    #[must_use]
    pub fn with_store(mut self, store: StoreConfig) -> Self {
        self.store = store;
        self
    }

    /// Search debounce as a duration
    #[inline]
    #[must_use]
    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    /// Parse from TOML
    ///
    /// # Errors
    /// - `FormError::Config` if the document is malformed
    pub fn from_toml_str(raw: &str) -> Result<Self, FormError> {
        toml::from_str(raw).map_err(|e| FormError::Config(e.to_string()))
    }

    /// Parse from JSON
    ///
    /// # Errors
    /// - `FormError::Config` if the document is malformed
    pub fn from_json_str(raw: &str) -> Result<Self, FormError> {
        serde_json::from_str(raw).map_err(|e| FormError::Config(e.to_string()))
    }

    /// Render as TOML
    ///
    /// # Errors
    /// - `FormError::Config` if serialization fails
    pub fn to_toml_string(&self) -> Result<String, FormError> {
        toml::to_string_pretty(self).map_err(|e| FormError::Config(e.to_string()))
    }
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            search_debounce_ms: 300,
            min_search_len: 0,
            store: StoreConfig::default(),
        }
    }
}
