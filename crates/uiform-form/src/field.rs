//! Async option fields
//!
//! Drives the options store for one select or autocomplete field:
//! - Mount loads once for non-searchable fields
//! - Changes of a declared dependency trigger a reload
//! - Typing dispatches searches for searchable fields

use crate::debounce::SearchDebouncer;
use crate::error::FormError;
use crate::values::FormValueStore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use uiform_options::{
    AsyncOptionsStore, Dispatch, FormSnapshot, LoadStatus, OptionItem, OptionLabels, SharedLoader,
};

/// Async options settings of a field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AsyncOptionsConfig {
    /// Loader id; shared ids share one cache entry
    pub id: String,
    /// Form fields whose values drive reloads
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Whether typing triggers searches
    #[serde(default)]
    pub searchable: bool,
}

impl AsyncOptionsConfig {
    /// Create configuration for loader `id`
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            dependencies: Vec::new(),
            searchable: false,
        }
    }

    /// With dependencies
    #[must_use]
    pub fn with_dependencies<I, S>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = dependencies.into_iter().map(Into::into).collect();
        self
    }

    /// Make searchable
    #[inline]
    #[must_use]
    pub fn searchable(mut self) -> Self {
        self.searchable = true;
        self
    }

    /// Whether `field` is a declared dependency
    #[inline]
    #[must_use]
    pub fn depends_on(&self, field: &str) -> bool {
        self.dependencies.iter().any(|dep| dep == field)
    }
}

/// What a field renders
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldOptionsView {
    /// Options, `None` before the first response
    pub options: Option<Arc<[OptionItem]>>,
    /// Request in flight
    pub loading: bool,
    /// Failure message of the last response
    pub error: Option<String>,
}

impl FieldOptionsView {
    /// Options, empty before the first response
    #[must_use]
    pub fn options_or_empty(&self) -> &[OptionItem] {
        self.options.as_deref().unwrap_or(&[])
    }

    /// Label lookup over the current options
    #[must_use]
    pub fn labels(&self) -> OptionLabels {
        OptionLabels::from_options(self.options_or_empty())
    }
}

/// Field bound to an async loader
#[derive(Clone)]
pub struct AsyncField {
    name: String,
    config: AsyncOptionsConfig,
    loader: SharedLoader,
    store: AsyncOptionsStore,
    min_search_len: usize,
}

impl fmt::Debug for AsyncField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncField")
            .field("name", &self.name)
            .field("config", &self.config)
            .field("min_search_len", &self.min_search_len)
            .finish_non_exhaustive()
    }
}

impl AsyncField {
    /// Bind field `name` to `loader`
    ///
    /// # Errors
    /// - `FormError::BlankDependency` if a dependency name is blank
    pub fn new(
        name: impl Into<String>,
        config: AsyncOptionsConfig,
        loader: SharedLoader,
        store: AsyncOptionsStore,
    ) -> Result<Self, FormError> {
        let name = name.into();
        if config.dependencies.iter().any(|dep| dep.trim().is_empty()) {
            return Err(FormError::BlankDependency { field: name });
        }
        Ok(Self {
            name,
            config,
            loader,
            store,
            min_search_len: 0,
        })
    }

    /// With minimum search length
    #[inline]
    #[must_use]
    pub fn with_min_search_len(mut self, len: usize) -> Self {
        self.min_search_len = len;
        self
    }

    /// Field name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Async options settings
    #[inline]
    #[must_use]
    pub fn config(&self) -> &AsyncOptionsConfig {
        &self.config
    }

    /// Field became visible
    ///
    /// Non-searchable fields load their options; searchable fields wait for
    /// input.
    ///
    /// # Errors
    /// - `FormError::Options` if the store rejects the command
    pub fn on_mount(&self, values: &FormSnapshot) -> Result<Dispatch, FormError> {
        if self.config.searchable {
            return Ok(Dispatch::Fresh);
        }
        self.refresh(values)
    }

    /// Form value `changed` was updated
    ///
    /// Returns `None` when the field does not depend on it.
    ///
    /// # Errors
    /// - `FormError::Options` if the store rejects the command
    pub fn on_values_changed(
        &self,
        changed: &str,
        values: &FormSnapshot,
    ) -> Result<Option<Dispatch>, FormError> {
        if !self.config.depends_on(changed) {
            return Ok(None);
        }
        tracing::debug!("Field {} depends on {}, refreshing", self.name, changed);
        self.refresh(values).map(Some)
    }

    /// Load options unless current for the dependency values
    ///
    /// # Errors
    /// - `FormError::Options` if the store rejects the command
    pub fn refresh(&self, values: &FormSnapshot) -> Result<Dispatch, FormError> {
        Ok(self.store.ensure_loaded(
            &self.config.id,
            &self.loader,
            self.config.dependencies.as_slice(),
            values,
        )?)
    }

    /// User typed `term`
    ///
    /// Ignored for non-searchable fields and for non-empty terms shorter
    /// than the minimum search length.
    ///
    /// # Errors
    /// - `FormError::Options` if the store rejects the command
    pub fn on_input(&self, term: &str, values: &FormSnapshot) -> Result<Dispatch, FormError> {
        if !self.accepts_search(term) {
            return Ok(Dispatch::Fresh);
        }
        Ok(self.store.search(&self.config.id, &self.loader, term, values)?)
    }

    /// User typed `term`, dispatched after a quiet period
    ///
    /// Returns `Fresh` if a newer keystroke arrived during `delay`. Values
    /// are read when the term is let through.
    ///
    /// # Errors
    /// - `FormError::Options` if the store rejects the command
    pub async fn on_input_debounced(
        &self,
        debouncer: &SearchDebouncer,
        delay: Duration,
        term: &str,
        values: &FormValueStore,
    ) -> Result<Dispatch, FormError> {
        if !self.accepts_search(term) || !debouncer.debounce(&self.name, delay).await {
            return Ok(Dispatch::Fresh);
        }
        self.on_input(term, &values.snapshot())
    }

    /// Whether typing `term` would reach the loader
    #[must_use]
    pub fn accepts_search(&self, term: &str) -> bool {
        self.config.searchable
            && (term.is_empty() || term.chars().count() >= self.min_search_len)
    }

    /// Current options state
    #[must_use]
    pub fn view(&self) -> FieldOptionsView {
        let entry = self.store.entry(&self.config.id);
        FieldOptionsView {
            options: entry.options,
            loading: entry.status == LoadStatus::Loading,
            error: entry.error,
        }
    }

    /// Display label for a selected value
    #[must_use]
    pub fn label_for(&self, value: &serde_json::Value) -> String {
        self.view().labels().display(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uiform_options::{loader_fn, LoadOutcome, LoaderContext, LoaderError, LoaderResponse};

    fn cities() -> SharedLoader {
        loader_fn(|ctx: LoaderContext| async move {
            let country = ctx
                .form_values
                .get("country")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();
            Ok::<_, LoaderError>(LoaderResponse::new(vec![OptionItem::new(
                format!("{country}-1"),
                format!("City of {country}"),
            )]))
        })
    }

    fn snapshot(raw: serde_json::Value) -> FormSnapshot {
        match raw {
            serde_json::Value::Object(map) => FormSnapshot::new(map),
            _ => FormSnapshot::empty(),
        }
    }

    #[test]
    fn config_deserializes_camel_case() {
        let config: AsyncOptionsConfig = serde_json::from_value(json!({
            "id": "cities",
            "dependencies": ["country"],
            "searchable": true
        }))
        .unwrap();
        assert!(config.depends_on("country"));
        assert!(!config.depends_on("name"));
        assert!(config.searchable);
    }

    #[test]
    fn blank_dependency_rejected() {
        let config = AsyncOptionsConfig::new("cities").with_dependencies([" "]);
        let result = AsyncField::new("city", config, cities(), AsyncOptionsStore::new());
        assert!(matches!(result, Err(FormError::BlankDependency { field }) if field == "city"));
    }

    #[tokio::test]
    async fn mount_loads_and_labels_resolve() {
        let store = AsyncOptionsStore::new();
        let field = AsyncField::new(
            "city",
            AsyncOptionsConfig::new("cities").with_dependencies(["country"]),
            cities(),
            store,
        )
        .unwrap();
        let values = snapshot(json!({"country": "PE"}));

        assert_eq!(field.view(), FieldOptionsView::default());
        let outcome = field.on_mount(&values).unwrap().wait().await;

        assert_eq!(outcome, LoadOutcome::Applied(LoadStatus::Loaded));
        assert_eq!(field.label_for(&json!("PE-1")), "City of PE");
        assert_eq!(field.label_for(&json!("XX")), "XX");
    }

    #[tokio::test]
    async fn unrelated_change_is_ignored() {
        let field = AsyncField::new(
            "city",
            AsyncOptionsConfig::new("cities").with_dependencies(["country"]),
            cities(),
            AsyncOptionsStore::new(),
        )
        .unwrap();
        let values = snapshot(json!({"country": "PE", "name": "Ada"}));

        assert!(field.on_values_changed("name", &values).unwrap().is_none());
        assert!(field.on_values_changed("country", &values).unwrap().is_some());
    }

    #[tokio::test]
    async fn searchable_field_waits_for_input() {
        let field = AsyncField::new(
            "product",
            AsyncOptionsConfig::new("products").searchable(),
            cities(),
            AsyncOptionsStore::new(),
        )
        .unwrap()
        .with_min_search_len(2);

        assert!(!field.on_mount(&FormSnapshot::empty()).unwrap().is_started());
        assert!(!field.on_input("a", &FormSnapshot::empty()).unwrap().is_started());
        assert!(field.on_input("ab", &FormSnapshot::empty()).unwrap().is_started());
        assert!(field.on_input("", &FormSnapshot::empty()).unwrap().is_started());
    }

    #[tokio::test(start_paused = true)]
    async fn debounced_input_keeps_last_term() {
        let field = AsyncField::new(
            "product",
            AsyncOptionsConfig::new("products").searchable(),
            cities(),
            AsyncOptionsStore::new(),
        )
        .unwrap();
        let debouncer = SearchDebouncer::new();
        let values = FormValueStore::default();
        let delay = Duration::from_millis(300);

        let (first, second) = tokio::join!(
            field.on_input_debounced(&debouncer, delay, "ch", &values),
            field.on_input_debounced(&debouncer, delay, "cha", &values)
        );

        assert!(!first.unwrap().is_started());
        let outcome = second.unwrap().wait().await;
        assert_eq!(outcome, LoadOutcome::Applied(LoadStatus::Loaded));
    }

    #[tokio::test]
    async fn input_on_plain_select_is_ignored() {
        let field = AsyncField::new(
            "city",
            AsyncOptionsConfig::new("cities"),
            cities(),
            AsyncOptionsStore::new(),
        )
        .unwrap();
        assert!(!field.accepts_search("lima"));
        assert!(!field.on_input("lima", &FormSnapshot::empty()).unwrap().is_started());
    }
}
