//! Loader contract
//!
//! A loader receives the form values and the current search term and
//! produces a list of options. Loaders are user code; the store only calls
//! them and records what they return.

use crate::snapshot::FormSnapshot;
use crate::types::OptionItem;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::future::Future;
use std::sync::Arc;

/// Input passed to a loader
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoaderContext {
    /// Form values at dispatch time
    pub form_values: FormSnapshot,
    /// Search term; empty for dependency-driven loads
    pub search: String,
}

impl LoaderContext {
    /// Create context
    #[inline]
    #[must_use]
    pub fn new(form_values: FormSnapshot, search: impl Into<String>) -> Self {
        Self {
            form_values,
            search: search.into(),
        }
    }
}

/// Options produced by a loader
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoaderResponse {
    /// Ordered options
    #[serde(default)]
    pub options: Vec<OptionItem>,
}

impl LoaderResponse {
    /// Create response
    #[inline]
    #[must_use]
    pub fn new(options: Vec<OptionItem>) -> Self {
        Self { options }
    }

    /// Build a response from loosely shaped JSON options
    #[must_use]
    pub fn from_json_options(raw: Vec<serde_json::Value>) -> Self {
        Self::new(raw.into_iter().map(OptionItem::from_json).collect())
    }
}

impl From<Vec<OptionItem>> for LoaderResponse {
    fn from(options: Vec<OptionItem>) -> Self {
        Self::new(options)
    }
}

/// Loader failure
///
/// The message may be empty; the store then records its configured
/// fallback message instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct LoaderError {
    message: String,
}

impl LoaderError {
    /// Failure with message
    #[inline]
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Failure without message
    #[inline]
    #[must_use]
    pub fn empty() -> Self {
        Self::new(String::new())
    }

    /// Failure from any error value
    #[must_use]
    pub fn from_error<E: std::error::Error + ?Sized>(error: &E) -> Self {
        Self::new(error.to_string())
    }

    /// Failure from a caught panic payload
    #[must_use]
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        if let Some(message) = payload.downcast_ref::<&str>() {
            Self::new(*message)
        } else if let Some(message) = payload.downcast_ref::<String>() {
            Self::new(message.clone())
        } else {
            Self::empty()
        }
    }

    /// Message, if non-blank
    #[inline]
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        let trimmed = self.message.trim();
        (!trimmed.is_empty()).then_some(self.message.as_str())
    }
}

impl From<String> for LoaderError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for LoaderError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// Async options source
#[async_trait]
pub trait OptionsLoader: Send + Sync {
    /// Load options for `ctx`
    async fn load(&self, ctx: LoaderContext) -> Result<LoaderResponse, LoaderError>;
}

/// Shared loader handle
pub type SharedLoader = Arc<dyn OptionsLoader>;

/// Loader backed by a closure returning a future
pub struct FnLoader<F> {
    f: F,
}

#[async_trait]
impl<F, Fut> OptionsLoader for FnLoader<F>
where
    F: Fn(LoaderContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<LoaderResponse, LoaderError>> + Send + 'static,
{
    async fn load(&self, ctx: LoaderContext) -> Result<LoaderResponse, LoaderError> {
        (self.f)(ctx).await
    }
}

/// Wrap a closure as a shared loader
///
/// ```rust,ignore
/// let loader = loader_fn(|ctx| async move {
///     Ok::<_, LoaderError>(LoaderResponse::new(vec![OptionItem::new("US", "United States")]))
/// });
/// ```
pub fn loader_fn<F, Fut>(f: F) -> SharedLoader
where
    F: Fn(LoaderContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<LoaderResponse, LoaderError>> + Send + 'static,
{
    Arc::new(FnLoader { f })
}
