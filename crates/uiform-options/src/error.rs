//! Error types for the options store
//!
//! Loader failures never surface here: they are absorbed by the store and
//! exposed through `AsyncOptionsStore::get_error`. These errors describe
//! invocation faults on the caller's side.

/// Invocation errors raised synchronously by store commands
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OptionsError {
    /// Loader id was empty
    #[error("loader id must not be empty")]
    EmptyLoaderId,

    /// Command issued outside a tokio runtime
    #[error("no async runtime available to dispatch loader `{0}`")]
    NoRuntime(String),
}
