//! uiform Options - async option sets for select and autocomplete fields
//!
//! Loads, memoizes and invalidates the option lists of dynamic form fields:
//! - Calls user-supplied loaders with a snapshot of the form values
//! - Caches results per loader id
//! - Skips reloads while declared dependency values are unchanged
//! - Discards stale responses when a newer request was dispatched
//!
//! # Architecture
//!
//! ```text
//! field driver ──ensure_loaded/search──▶ AsyncOptionsStore ──spawn──▶ OptionsLoader
//!      ▲                                      │   ▲                        │
//!      └────get_options/is_loading/get_error──┘   └──settle (seq check)────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use uiform_options::prelude::*;
//!
//! # async fn example() {
//! let store = AsyncOptionsStore::new();
//! let loader = loader_fn(|_ctx| async move {
//!     Ok::<_, LoaderError>(LoaderResponse::new(vec![OptionItem::new("US", "United States")]))
//! });
//!
//! let values = FormSnapshot::empty();
//! let dispatch = store.ensure_loaded("countries", &loader, &[] as &[&str], &values)?;
//! dispatch.wait().await;
//!
//! assert_eq!(store.get_options("countries").unwrap().len(), 1);
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod config;
pub mod error;
pub mod loader;
pub mod snapshot;
pub mod store;
pub mod types;

// Re-exports for convenience
pub use config::StoreConfig;
pub use error::OptionsError;
pub use loader::{
    loader_fn, FnLoader, LoaderContext, LoaderError, LoaderResponse, OptionsLoader, SharedLoader,
};
pub use snapshot::{DependencySnapshot, FormSnapshot};
pub use store::{AsyncOptionsStore, Dispatch, LoadOutcome, LoadTask, StoreStats};
pub use types::{
    value_to_string, CacheEntry, LoadStatus, LoaderId, OptionItem, OptionLabels, RequestKind,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the options store
    pub use crate::loader::{
        loader_fn, LoaderContext, LoaderError, LoaderResponse, OptionsLoader, SharedLoader,
    };
    pub use crate::snapshot::FormSnapshot;
    pub use crate::store::{AsyncOptionsStore, Dispatch, LoadOutcome};
    pub use crate::types::{LoadStatus, OptionItem};
}
