//! Search debouncing
//!
//! Keystrokes on an autocomplete field are coalesced: a call waits out the
//! quiet period and reports whether it is still the latest for its key.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;

/// Per-key debouncer
#[derive(Debug, Clone, Default)]
pub struct SearchDebouncer {
    generations: Arc<DashMap<String, u64>>,
}

impl SearchDebouncer {
    /// Create debouncer
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait `delay`; true if no newer call for `key` arrived meanwhile
    pub async fn debounce(&self, key: &str, delay: Duration) -> bool {
        let generation = self.bump(key);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let latest = self.generations.get(key).map(|g| *g) == Some(generation);
        if !latest {
            tracing::trace!("Debounced input for {} (generation {})", key, generation);
        }
        latest
    }

    /// Invalidate pending calls for `key`
    pub fn cancel(&self, key: &str) {
        self.bump(key);
    }

    /// Invalidate every pending call
    pub fn clear(&self) {
        for mut generation in self.generations.iter_mut() {
            *generation += 1;
        }
    }

    fn bump(&self, key: &str) -> u64 {
        let mut generation = self.generations.entry(key.to_string()).or_insert(0);
        *generation += 1;
        *generation
    }
}
