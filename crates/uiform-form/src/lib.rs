//! uiform Form - form session wiring around the async options store
//!
//! Connects form values to async option fields:
//! - Registers loaders by id and binds fields to them
//! - Reloads dependent fields when a value they depend on changes
//! - Debounces autocomplete searches
//! - Converts flat values into nested JSON payloads
//!
//! # Example
//!
//! ```rust,ignore
//! use uiform_form::prelude::*;
//!
//! let session = FormSession::new(FormConfig::default())
//!     .with_loader("cities", cities_loader);
//! session.bind("city", AsyncOptionsConfig::new("cities").with_dependencies(["country"]))?;
//!
//! for dispatch in session.update_value("country", json!("PE"))? {
//!     dispatch.wait().await;
//! }
//! let view = session.view("city")?;
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod config;
pub mod debounce;
pub mod error;
pub mod field;
pub mod paths;
pub mod session;
pub mod values;

// Re-exports for convenience
pub use config::FormConfig;
pub use debounce::SearchDebouncer;
pub use error::FormError;
pub use field::{AsyncField, AsyncOptionsConfig, FieldOptionsView};
pub use paths::{default_values, set_deep, to_json_values, FieldDescriptor};
pub use session::FormSession;
pub use values::FormValueStore;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for driving a form session
    pub use crate::config::FormConfig;
    pub use crate::error::FormError;
    pub use crate::field::{AsyncOptionsConfig, FieldOptionsView};
    pub use crate::session::FormSession;
    pub use uiform_options::prelude::*;
}
