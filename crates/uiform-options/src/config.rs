//! Store configuration

use serde::{Deserialize, Serialize};

/// Message recorded when a dependency-driven load fails without a message
pub const DEFAULT_LOAD_FALLBACK: &str = "Failed to load options";

/// Message recorded when a search fails without a message
pub const DEFAULT_SEARCH_FALLBACK: &str = "Failed to search options";

/// Options store configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Error message for failed loads that carry no message
    pub load_fallback_message: String,
    /// Error message for failed searches that carry no message
    pub search_fallback_message: String,
    /// Abort the tokio task of a superseded request
    ///
    /// Superseded responses are discarded either way; aborting only saves
    /// the remaining work of the loader.
    pub abort_superseded: bool,
}

impl StoreConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With load fallback message
    #[inline]
    #[must_use]
    pub fn with_load_fallback(mut self, message: impl Into<String>) -> Self {
        self.load_fallback_message = message.into();
        self
    }

    /// With search fallback message
    #[inline]
    #[must_use]
    pub fn with_search_fallback(mut self, message: impl Into<String>) -> Self {
        self.search_fallback_message = message.into();
        self
    }

    /// With abort of superseded tasks
    #[inline]
    #[must_use]
    pub fn with_abort_superseded(mut self, abort: bool) -> Self {
        self.abort_superseded = abort;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            load_fallback_message: DEFAULT_LOAD_FALLBACK.to_string(),
            search_fallback_message: DEFAULT_SEARCH_FALLBACK.to_string(),
            abort_superseded: false,
        }
    }
}
