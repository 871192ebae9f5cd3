//! Error types for the form layer
//!
//! Loader failures are not errors here either; they live in the options
//! store. These errors are caller faults (binding a field to something that
//! does not exist) and configuration problems.

use uiform_options::OptionsError;

/// Form layer error type
#[derive(Debug, thiserror::Error)]
pub enum FormError {
    /// Store rejected a command
    #[error("options error: {0}")]
    Options(#[from] OptionsError),

    /// Field refers to a loader id nobody registered
    #[error("no loader registered for `{0}`")]
    UnknownLoader(String),

    /// Field declares an empty dependency name
    #[error("field `{field}` declares a blank dependency name")]
    BlankDependency {
        /// Field being bound
        field: String,
    },

    /// Field was never bound to async options
    #[error("field `{0}` is not bound to async options")]
    UnboundField(String),

    /// Configuration could not be parsed or written
    #[error("configuration error: {0}")]
    Config(String),
}

impl FormError {
    /// Check if error is a programming mistake at the call site
    #[inline]
    #[must_use]
    pub fn is_invocation_error(&self) -> bool {
        !matches!(self, Self::Config(_))
    }
}
