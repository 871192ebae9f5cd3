//! Form session
//!
//! Owns everything one rendered form needs:
//! - Field values
//! - The options store and the loader registry
//! - Bound async fields and the search debouncer
//!
//! Dropping the session drops the cache; responses still in flight are
//! discarded when they arrive.

use crate::config::FormConfig;
use crate::debounce::SearchDebouncer;
use crate::error::FormError;
use crate::field::{AsyncField, AsyncOptionsConfig, FieldOptionsView};
use crate::paths::{default_values, to_json_values, FieldDescriptor};
use crate::values::FormValueStore;
use dashmap::DashMap;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use uiform_options::{AsyncOptionsStore, Dispatch, FormSnapshot, LoaderId, SharedLoader};

/// One form instance
pub struct FormSession {
    config: FormConfig,
    values: FormValueStore,
    store: AsyncOptionsStore,
    loaders: DashMap<String, SharedLoader>,
    fields: RwLock<BTreeMap<String, AsyncField>>,
    debouncer: SearchDebouncer,
}

impl fmt::Debug for FormSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut loaders: Vec<String> = self.loaders.iter().map(|e| e.key().clone()).collect();
        loaders.sort();
        f.debug_struct("FormSession")
            .field("config", &self.config)
            .field("values", &self.values)
            .field("loaders", &loaders)
            .field("fields", &self.field_names())
            .finish_non_exhaustive()
    }
}

impl FormSession {
    /// Create empty session
    #[must_use]
    pub fn new(config: FormConfig) -> Self {
        let store = AsyncOptionsStore::with_config(config.store.clone());
        Self {
            config,
            values: FormValueStore::default(),
            store,
            loaders: DashMap::new(),
            fields: RwLock::new(BTreeMap::new()),
            debouncer: SearchDebouncer::new(),
        }
    }

    /// With initial values
    #[must_use]
    pub fn with_initial_values(self, initial: Map<String, Value>) -> Self {
        self.values.replace_initial(initial);
        self
    }

    /// With initial values derived from field descriptors
    #[must_use]
    pub fn with_fields(self, fields: &[FieldDescriptor], initial: &Map<String, Value>) -> Self {
        self.with_initial_values(default_values(fields, initial))
    }

    /// With a registered loader
    #[must_use]
    pub fn with_loader(self, id: impl Into<String>, loader: SharedLoader) -> Self {
        self.register_loader(id, loader);
        self
    }

    /// Register `loader` under `id`, replacing any previous one
    pub fn register_loader(&self, id: impl Into<String>, loader: SharedLoader) {
        self.loaders.insert(id.into(), loader);
    }

    /// Bind `field` to the loader named by `options.id`
    ///
    /// # Errors
    /// - `FormError::Options` if the loader id is blank
    /// - `FormError::UnknownLoader` if no loader is registered under the id
    /// - `FormError::BlankDependency` if a dependency name is blank
    pub fn bind(&self, field: &str, options: AsyncOptionsConfig) -> Result<AsyncField, FormError> {
        let id = LoaderId::new(options.id.as_str())?;
        let loader = self
            .loaders
            .get(id.as_str())
            .map(|loader| Arc::clone(loader.value()))
            .ok_or_else(|| FormError::UnknownLoader(id.to_string()))?;

        let bound = AsyncField::new(field, options, loader, self.store.clone())?
            .with_min_search_len(self.config.min_search_len);
        tracing::info!(
            "Bound field {} to loader {} (deps: {:?})",
            field,
            id,
            bound.config().dependencies
        );
        self.fields.write().insert(field.to_string(), bound.clone());
        Ok(bound)
    }

    /// Bound field by name
    #[must_use]
    pub fn field(&self, name: &str) -> Option<AsyncField> {
        self.fields.read().get(name).cloned()
    }

    /// Names of bound fields, sorted
    #[must_use]
    pub fn field_names(&self) -> Vec<String> {
        self.fields.read().keys().cloned().collect()
    }

    /// Mount one field
    ///
    /// # Errors
    /// - `FormError::UnboundField` if `name` was never bound
    /// - `FormError::Options` if the store rejects the command
    pub fn mount(&self, name: &str) -> Result<Dispatch, FormError> {
        self.bound(name)?.on_mount(&self.values.snapshot())
    }

    /// Mount every bound field
    ///
    /// # Errors
    /// - `FormError::Options` if the store rejects a command
    pub fn mount_all(&self) -> Result<Vec<Dispatch>, FormError> {
        let values = self.values.snapshot();
        self.bound_fields()
            .iter()
            .map(|field| field.on_mount(&values))
            .collect()
    }

    /// Set one value and refresh the fields depending on it
    ///
    /// # Errors
    /// - `FormError::Options` if the store rejects a command
    pub fn update_value(&self, name: &str, value: Value) -> Result<Vec<Dispatch>, FormError> {
        if !self.values.update_value(name, value) {
            return Ok(Vec::new());
        }
        let values = self.values.snapshot();
        let mut dispatched = Vec::new();
        for field in self.bound_fields() {
            if let Some(dispatch) = field.on_values_changed(name, &values)? {
                dispatched.push(dispatch);
            }
        }
        Ok(dispatched)
    }

    /// Replace all values and refresh the affected fields
    ///
    /// Fields depending on a changed value refresh as with
    /// [`update_value`](Self::update_value), searchable ones included. The
    /// rest are mounted, so fields whose dependency values did not change
    /// stay cached.
    ///
    /// # Errors
    /// - `FormError::Options` if the store rejects a command
    pub fn set_values(&self, values: Map<String, Value>) -> Result<Vec<Dispatch>, FormError> {
        let before = self.values.snapshot();
        self.values.set_values(values);
        let after = self.values.snapshot();
        let changed: Vec<&String> = before
            .values()
            .keys()
            .chain(after.values().keys())
            .filter(|key| before.get(key) != after.get(key))
            .collect();

        let mut dispatched = Vec::new();
        'fields: for field in self.bound_fields() {
            for key in &changed {
                if let Some(dispatch) = field.on_values_changed(key, &after)? {
                    dispatched.push(dispatch);
                    continue 'fields;
                }
            }
            dispatched.push(field.on_mount(&after)?);
        }
        Ok(dispatched)
    }

    /// User typed `term` into `name`
    ///
    /// # Errors
    /// - `FormError::UnboundField` if `name` was never bound
    /// - `FormError::Options` if the store rejects the command
    pub fn input(&self, name: &str, term: &str) -> Result<Dispatch, FormError> {
        self.bound(name)?.on_input(term, &self.values.snapshot())
    }

    /// User typed `term` into `name`, debounced by the configured delay
    ///
    /// # Errors
    /// - `FormError::UnboundField` if `name` was never bound
    /// - `FormError::Options` if the store rejects the command
    pub async fn input_debounced(&self, name: &str, term: &str) -> Result<Dispatch, FormError> {
        let field = self.bound(name)?;
        field
            .on_input_debounced(
                &self.debouncer,
                self.config.search_debounce(),
                term,
                &self.values,
            )
            .await
    }

    /// Options state of a bound field
    ///
    /// # Errors
    /// - `FormError::UnboundField` if `name` was never bound
    pub fn view(&self, name: &str) -> Result<FieldOptionsView, FormError> {
        Ok(self.bound(name)?.view())
    }

    /// Restore initial values and clear the options cache
    pub fn reset(&self) {
        self.values.reset();
        self.debouncer.clear();
        self.store.reset(None);
        tracing::info!("Form session reset");
    }

    /// Current values as a nested JSON payload
    #[must_use]
    pub fn json_values(&self, fields: &[FieldDescriptor]) -> Value {
        to_json_values(self.values.snapshot().values(), fields)
    }

    /// Snapshot of the current values
    #[inline]
    #[must_use]
    pub fn snapshot(&self) -> FormSnapshot {
        self.values.snapshot()
    }

    /// Value store
    #[inline]
    #[must_use]
    pub fn values(&self) -> &FormValueStore {
        &self.values
    }

    /// Options store
    #[inline]
    #[must_use]
    pub fn options(&self) -> &AsyncOptionsStore {
        &self.store
    }

    /// Session configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &FormConfig {
        &self.config
    }

    fn bound(&self, name: &str) -> Result<AsyncField, FormError> {
        self.field(name)
            .ok_or_else(|| FormError::UnboundField(name.to_string()))
    }

    fn bound_fields(&self) -> Vec<AsyncField> {
        self.fields.read().values().cloned().collect()
    }
}

impl Default for FormSession {
    fn default() -> Self {
        Self::new(FormConfig::default())
    }
}
