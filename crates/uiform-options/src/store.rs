//! Async options store
//!
//! Single source of truth for async-loaded option sets. Per loader id the
//! store keeps:
//! - The options of the last applied response
//! - The load status and failure message
//! - The dependency fingerprint behind the options
//!
//! # Supersession
//!
//! Every dispatched request gets a store-wide sequence number and becomes
//! the entry's in-flight request. A response is applied only while its
//! sequence is still the in-flight one; a newer request or a reset makes it
//! stale and it is dropped when it arrives.

use crate::config::StoreConfig;
use crate::error::OptionsError;
use crate::loader::{LoaderContext, LoaderError, LoaderResponse, SharedLoader};
use crate::snapshot::{DependencySnapshot, FormSnapshot};
use crate::types::{CacheEntry, LoadStatus, LoaderId, OptionItem, RequestKind};
use dashmap::DashMap;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::{AbortHandle, JoinHandle};

/// What happened to a dispatched request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Nothing dispatched; cached options are current
    Fresh,
    /// Response applied; entry settled with this status
    Applied(LoadStatus),
    /// Replaced by a newer request or a reset before it resolved
    Superseded,
}

/// Handle to a dispatched loader call
///
/// Dropping the handle does not cancel the call.
#[derive(Debug)]
pub struct LoadTask {
    id: LoaderId,
    seq: u64,
    kind: RequestKind,
    handle: JoinHandle<LoadOutcome>,
}

impl LoadTask {
    /// Loader id
    #[inline]
    #[must_use]
    pub fn id(&self) -> &LoaderId {
        &self.id
    }

    /// Request sequence number
    #[inline]
    #[must_use]
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Request kind
    #[inline]
    #[must_use]
    pub fn kind(&self) -> RequestKind {
        self.kind
    }

    /// Wait until the response is applied or discarded
    pub async fn wait(self) -> LoadOutcome {
        // An aborted task was superseded by definition.
        self.handle.await.unwrap_or(LoadOutcome::Superseded)
    }
}

/// Result of a dispatching command
#[derive(Debug)]
pub enum Dispatch {
    /// Cached options are current; loader not called
    Fresh,
    /// Loader call started
    Started(LoadTask),
}

impl Dispatch {
    /// Whether a loader call was started
    #[inline]
    #[must_use]
    pub fn is_started(&self) -> bool {
        matches!(self, Self::Started(_))
    }

    /// Started task, if any
    #[inline]
    #[must_use]
    pub fn task(&self) -> Option<&LoadTask> {
        match self {
            Self::Fresh => None,
            Self::Started(task) => Some(task),
        }
    }

    /// Wait for completion
    pub async fn wait(self) -> LoadOutcome {
        match self {
            Self::Fresh => LoadOutcome::Fresh,
            Self::Started(task) => task.wait().await,
        }
    }
}

/// Store statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Number of entries
    pub entries: usize,
    /// Entries currently loading
    pub loading: usize,
    /// Entries holding a successful response
    pub loaded: usize,
    /// Entries holding a failure
    pub errored: usize,
    /// Loader calls dispatched since creation
    pub dispatched: u64,
    /// Requests replaced while in flight
    pub superseded: u64,
}

#[derive(Debug)]
struct InFlight {
    seq: u64,
    kind: RequestKind,
    snapshot: Option<DependencySnapshot>,
    search: String,
    abort: Option<AbortHandle>,
}

#[derive(Debug, Default)]
struct Slot {
    entry: CacheEntry,
    in_flight: Option<InFlight>,
}

impl Slot {
    /// Whether a dependency-driven load for `snapshot` would be redundant
    fn is_fresh(&self, snapshot: &DependencySnapshot) -> bool {
        let last = self.entry.last_dependency_snapshot.as_ref();
        match (self.entry.status, &self.in_flight) {
            (LoadStatus::Loaded, _) => last == Some(snapshot),
            (LoadStatus::Loading, Some(flight)) => match flight.kind {
                RequestKind::Dependency => flight.snapshot.as_ref() == Some(snapshot),
                // A running search keeps its place if the baseline still holds.
                RequestKind::Search => last == Some(snapshot),
            },
            _ => false,
        }
    }
}

#[derive(Debug)]
struct StoreInner {
    entries: DashMap<LoaderId, Slot>,
    next_seq: AtomicU64,
    dispatched: AtomicU64,
    superseded: AtomicU64,
    config: StoreConfig,
}

impl StoreInner {
    /// Make `slot` loading under a fresh sequence number
    fn begin(
        &self,
        slot: &mut Slot,
        kind: RequestKind,
        snapshot: Option<DependencySnapshot>,
        search: String,
    ) -> u64 {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed) + 1;
        self.discard(slot);
        slot.in_flight = Some(InFlight {
            seq,
            kind,
            snapshot,
            search,
            abort: None,
        });
        slot.entry.status = LoadStatus::Loading;
        slot.entry.error = None;
        self.dispatched.fetch_add(1, Ordering::Relaxed);
        seq
    }

    /// Drop the in-flight request of `slot`, if any
    fn discard(&self, slot: &mut Slot) {
        if let Some(flight) = slot.in_flight.take() {
            self.superseded.fetch_add(1, Ordering::Relaxed);
            if self.config.abort_superseded {
                if let Some(abort) = flight.abort {
                    abort.abort();
                }
            }
        }
    }

    /// Apply a response if it is still the live one
    fn settle(
        &self,
        id: &LoaderId,
        seq: u64,
        result: Result<LoaderResponse, LoaderError>,
    ) -> LoadOutcome {
        let Some(mut slot) = self.entries.get_mut(id) else {
            tracing::debug!("Discarding response #{} for reset loader {}", seq, id);
            return LoadOutcome::Superseded;
        };
        if slot.in_flight.as_ref().map(|flight| flight.seq) != Some(seq) {
            tracing::debug!("Discarding superseded response #{} for {}", seq, id);
            return LoadOutcome::Superseded;
        }
        let Some(flight) = slot.in_flight.take() else {
            return LoadOutcome::Superseded;
        };

        let entry = &mut slot.entry;
        match result {
            Ok(response) => {
                tracing::debug!(
                    "Loader {} resolved #{} with {} options",
                    id,
                    seq,
                    response.options.len()
                );
                entry.options = Some(response.options.into());
                entry.status = LoadStatus::Loaded;
                entry.error = None;
                match flight.kind {
                    RequestKind::Dependency => {
                        entry.last_dependency_snapshot = flight.snapshot;
                        entry.search_term = None;
                    }
                    RequestKind::Search => {
                        entry.search_term = Some(flight.search);
                    }
                }
            }
            Err(error) => {
                let fallback = match flight.kind {
                    RequestKind::Dependency => &self.config.load_fallback_message,
                    RequestKind::Search => &self.config.search_fallback_message,
                };
                let message = error.message().unwrap_or(fallback.as_str()).to_string();
                tracing::warn!("Loader {} failed (#{}): {}", id, seq, message);
                entry.options = Some(Vec::<OptionItem>::new().into());
                entry.status = LoadStatus::Error;
                entry.error = Some(message);
                entry.search_term = None;
            }
        }
        LoadOutcome::Applied(entry.status)
    }
}

/// Async options store
///
/// Cheap to clone; clones share the same cache. Loader calls run as tokio
/// tasks, so commands must be issued from within a runtime. Responses that
/// arrive after every handle is dropped are discarded.
#[derive(Debug, Clone)]
pub struct AsyncOptionsStore {
    inner: Arc<StoreInner>,
}

impl AsyncOptionsStore {
    /// Create store with default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    /// Create store with configuration
    #[must_use]
    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                entries: DashMap::new(),
                next_seq: AtomicU64::new(0),
                dispatched: AtomicU64::new(0),
                superseded: AtomicU64::new(0),
                config,
            }),
        }
    }

    /// Store configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    /// Cached options, `None` if no response was ever applied
    #[must_use]
    pub fn get_options(&self, id: &str) -> Option<Arc<[OptionItem]>> {
        self.inner
            .entries
            .get(id)
            .and_then(|slot| slot.entry.options.clone())
    }

    /// Whether a request for `id` is in flight
    #[inline]
    #[must_use]
    pub fn is_loading(&self, id: &str) -> bool {
        self.status(id) == LoadStatus::Loading
    }

    /// Failure message of the last applied response
    #[must_use]
    pub fn get_error(&self, id: &str) -> Option<String> {
        self.inner
            .entries
            .get(id)
            .and_then(|slot| slot.entry.error.clone())
    }

    /// Current status (`NotLoaded` for unknown ids)
    #[must_use]
    pub fn status(&self, id: &str) -> LoadStatus {
        self.inner
            .entries
            .get(id)
            .map_or(LoadStatus::NotLoaded, |slot| slot.entry.status)
    }

    /// Copy of the whole entry (default for unknown ids)
    #[must_use]
    pub fn entry(&self, id: &str) -> CacheEntry {
        self.inner
            .entries
            .get(id)
            .map(|slot| slot.entry.clone())
            .unwrap_or_default()
    }

    /// Known loader ids, sorted
    #[must_use]
    pub fn loader_ids(&self) -> Vec<LoaderId> {
        let mut ids: Vec<LoaderId> = self
            .inner
            .entries
            .iter()
            .map(|slot| slot.key().clone())
            .collect();
        ids.sort();
        ids
    }

    /// Store statistics
    #[must_use]
    pub fn stats(&self) -> StoreStats {
        let mut stats = StoreStats {
            dispatched: self.inner.dispatched.load(Ordering::Relaxed),
            superseded: self.inner.superseded.load(Ordering::Relaxed),
            ..StoreStats::default()
        };
        for slot in self.inner.entries.iter() {
            stats.entries += 1;
            match slot.entry.status {
                LoadStatus::Loading => stats.loading += 1,
                LoadStatus::Loaded => stats.loaded += 1,
                LoadStatus::Error => stats.errored += 1,
                LoadStatus::NotLoaded => {}
            }
        }
        stats
    }

    /// Load options for `id` unless they are current for `dependencies`
    ///
    /// The dependency values are projected from `values` and compared with
    /// the fingerprint of the last successful dependency-driven load (or of
    /// the one in flight). When they match nothing is dispatched.
    ///
    /// # Errors
    /// - `OptionsError::EmptyLoaderId` if `id` is blank
    /// - `OptionsError::NoRuntime` if called outside a tokio runtime
    pub fn ensure_loaded<S: AsRef<str>>(
        &self,
        id: &str,
        loader: &SharedLoader,
        dependencies: &[S],
        values: &FormSnapshot,
    ) -> Result<Dispatch, OptionsError> {
        let id = LoaderId::new(id)?;
        let runtime = Self::runtime(&id)?;
        let snapshot = values.project(dependencies);

        let seq = {
            let mut slot = self.inner.entries.entry(id.clone()).or_default();
            if slot.is_fresh(&snapshot) {
                tracing::debug!("Options for {} are current ({})", id, snapshot);
                return Ok(Dispatch::Fresh);
            }
            self.inner
                .begin(
                    &mut slot,
                    RequestKind::Dependency,
                    Some(snapshot),
                    String::new(),
                )
        };
        tracing::debug!("Loading options for {} (#{}, deps {})", id, seq, snapshot);

        let ctx = LoaderContext::new(values.clone(), "");
        Ok(Dispatch::Started(self.spawn(
            &runtime,
            id,
            seq,
            RequestKind::Dependency,
            Arc::clone(loader),
            ctx,
        )))
    }

    /// Search options for `id` with `term`
    ///
    /// Always calls the loader. Does not move the dependency baseline.
    ///
    /// # Errors
    /// - `OptionsError::EmptyLoaderId` if `id` is blank
    /// - `OptionsError::NoRuntime` if called outside a tokio runtime
    pub fn search(
        &self,
        id: &str,
        loader: &SharedLoader,
        term: &str,
        values: &FormSnapshot,
    ) -> Result<Dispatch, OptionsError> {
        let id = LoaderId::new(id)?;
        let runtime = Self::runtime(&id)?;

        let seq = {
            let mut slot = self.inner.entries.entry(id.clone()).or_default();
            self.inner
                .begin(&mut slot, RequestKind::Search, None, term.to_string())
        };
        tracing::debug!("Searching options for {} (#{}): {:?}", id, seq, term);

        let ctx = LoaderContext::new(values.clone(), term);
        Ok(Dispatch::Started(self.spawn(
            &runtime,
            id,
            seq,
            RequestKind::Search,
            Arc::clone(loader),
            ctx,
        )))
    }

    /// Clear one entry, or every entry when `id` is `None`
    ///
    /// Responses still in flight for cleared entries are discarded.
    pub fn reset(&self, id: Option<&str>) {
        match id {
            Some(id) => {
                if let Some((_, mut slot)) = self.inner.entries.remove(id) {
                    self.inner.discard(&mut slot);
                    tracing::debug!("Reset options for {}", id);
                }
            }
            None => {
                self.inner.entries.retain(|_, slot| {
                    self.inner.discard(slot);
                    false
                });
                tracing::debug!("Reset all options");
            }
        }
    }

    fn runtime(id: &LoaderId) -> Result<Handle, OptionsError> {
        Handle::try_current().map_err(|_| OptionsError::NoRuntime(id.to_string()))
    }

    fn spawn(
        &self,
        runtime: &Handle,
        id: LoaderId,
        seq: u64,
        kind: RequestKind,
        loader: SharedLoader,
        ctx: LoaderContext,
    ) -> LoadTask {
        let inner = Arc::downgrade(&self.inner);
        let task_id = id.clone();
        let handle = runtime.spawn(async move {
            let result = AssertUnwindSafe(loader.load(ctx))
                .catch_unwind()
                .await
                .unwrap_or_else(|payload| Err(LoaderError::from_panic(payload)));
            match inner.upgrade() {
                Some(inner) => inner.settle(&task_id, seq, result),
                None => LoadOutcome::Superseded,
            }
        });

        if self.inner.config.abort_superseded {
            if let Some(mut slot) = self.inner.entries.get_mut(&id) {
                if let Some(flight) = slot.in_flight.as_mut().filter(|flight| flight.seq == seq) {
                    flight.abort = Some(handle.abort_handle());
                }
            }
        }

        LoadTask {
            id,
            seq,
            kind,
            handle,
        }
    }
}

impl Default for AsyncOptionsStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::loader_fn;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    const NO_DEPS: [&str; 0] = [];

    fn values(raw: serde_json::Value) -> FormSnapshot {
        match raw {
            serde_json::Value::Object(map) => FormSnapshot::new(map),
            _ => FormSnapshot::empty(),
        }
    }

    fn counting(calls: &Arc<AtomicUsize>, delay_ms: u64) -> SharedLoader {
        let calls = Arc::clone(calls);
        loader_fn(move |ctx: LoaderContext| {
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                if delay_ms > 0 {
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                }
                Ok::<_, LoaderError>(LoaderResponse::new(vec![OptionItem::new(
                    ctx.search.clone(),
                    format!("result {}", ctx.search),
                )]))
            }
        })
    }

    fn failing(message: &'static str) -> SharedLoader {
        loader_fn(move |_ctx: LoaderContext| async move {
            Err::<LoaderResponse, _>(LoaderError::new(message))
        })
    }

    #[tokio::test]
    async fn unknown_id_reads_as_not_loaded() {
        let store = AsyncOptionsStore::new();

        assert_eq!(store.get_options("nothing"), None);
        assert!(!store.is_loading("nothing"));
        assert_eq!(store.get_error("nothing"), None);
        assert_eq!(store.status("nothing"), LoadStatus::NotLoaded);
        assert_eq!(store.stats().entries, 0);
    }

    #[tokio::test]
    async fn load_then_fresh() {
        let store = AsyncOptionsStore::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let loader = counting(&calls, 0);
        let form = values(json!({}));

        let first = store
            .ensure_loaded("colors", &loader, &NO_DEPS, &form)
            .unwrap();
        assert!(first.is_started());
        assert_eq!(first.wait().await, LoadOutcome::Applied(LoadStatus::Loaded));

        let second = store
            .ensure_loaded("colors", &loader, &NO_DEPS, &form)
            .unwrap();
        assert!(!second.is_started());
        assert_eq!(second.wait().await, LoadOutcome::Fresh);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.get_options("colors").unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_calls_collapse_into_one_request() {
        let store = AsyncOptionsStore::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let loader = counting(&calls, 500);
        let form = values(json!({}));

        let first = store
            .ensure_loaded("countries", &loader, &NO_DEPS, &form)
            .unwrap();
        let second = store
            .ensure_loaded("countries", &loader, &NO_DEPS, &form)
            .unwrap();
        let third = store
            .ensure_loaded("countries", &loader, &NO_DEPS, &form)
            .unwrap();

        assert!(first.is_started());
        assert!(!second.is_started());
        assert!(!third.is_started());
        assert!(store.is_loading("countries"));
        assert_eq!(store.get_options("countries"), None);

        first.wait().await;
        assert!(!store.is_loading("countries"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failure_sets_error_and_empties_options() {
        let store = AsyncOptionsStore::new();
        let form = values(json!({}));

        let outcome = store
            .ensure_loaded("broken", &failing("boom"), &NO_DEPS, &form)
            .unwrap()
            .wait()
            .await;

        assert_eq!(outcome, LoadOutcome::Applied(LoadStatus::Error));
        assert_eq!(store.get_error("broken").as_deref(), Some("boom"));
        assert_eq!(store.get_options("broken").unwrap().len(), 0);
        assert_eq!(store.entry("broken").last_dependency_snapshot, None);
    }

    #[tokio::test]
    async fn blank_failure_uses_fallback_messages() {
        let store = AsyncOptionsStore::new();
        let form = values(json!({}));
        let loader = failing("");

        store
            .ensure_loaded("a", &loader, &NO_DEPS, &form)
            .unwrap()
            .wait()
            .await;
        store.search("b", &loader, "x", &form).unwrap().wait().await;

        assert_eq!(store.get_error("a").as_deref(), Some("Failed to load options"));
        assert_eq!(store.get_error("b").as_deref(), Some("Failed to search options"));
    }

    #[tokio::test]
    async fn configured_fallback_message() {
        let store = AsyncOptionsStore::with_config(
            StoreConfig::new().with_load_fallback("No se pudieron cargar"),
        );
        store
            .ensure_loaded("a", &failing(""), &NO_DEPS, &FormSnapshot::empty())
            .unwrap()
            .wait()
            .await;
        assert_eq!(store.get_error("a").as_deref(), Some("No se pudieron cargar"));
    }

    #[tokio::test]
    async fn panicking_loader_is_recorded_as_error() {
        let store = AsyncOptionsStore::new();
        let loader = loader_fn(|_ctx: LoaderContext| async move {
            if true {
                panic!("loader exploded");
            }
            Ok::<_, LoaderError>(LoaderResponse::default())
        });

        let outcome = store
            .ensure_loaded("panics", &loader, &NO_DEPS, &FormSnapshot::empty())
            .unwrap()
            .wait()
            .await;

        assert_eq!(outcome, LoadOutcome::Applied(LoadStatus::Error));
        assert_eq!(store.get_error("panics").as_deref(), Some("loader exploded"));
    }

    #[tokio::test]
    async fn blank_id_fails_fast() {
        let store = AsyncOptionsStore::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let loader = counting(&calls, 0);

        let result = store.ensure_loaded("", &loader, &NO_DEPS, &FormSnapshot::empty());
        assert!(matches!(result, Err(OptionsError::EmptyLoaderId)));

        let result = store.search(" ", &loader, "q", &FormSnapshot::empty());
        assert!(matches!(result, Err(OptionsError::EmptyLoaderId)));
        assert_eq!(store.stats().entries, 0);
    }

    #[test]
    fn outside_runtime_fails_fast() {
        let store = AsyncOptionsStore::new();
        let loader = failing("unused");

        let result = store.ensure_loaded("ids", &loader, &NO_DEPS, &FormSnapshot::empty());
        assert!(matches!(result, Err(OptionsError::NoRuntime(id)) if id == "ids"));
        assert_eq!(store.status("ids"), LoadStatus::NotLoaded);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_discards_in_flight_response() {
        let store = AsyncOptionsStore::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let loader = counting(&calls, 100);

        let dispatch = store
            .ensure_loaded("slow", &loader, &NO_DEPS, &FormSnapshot::empty())
            .unwrap();
        store.reset(Some("slow"));

        assert_eq!(dispatch.wait().await, LoadOutcome::Superseded);
        assert_eq!(store.status("slow"), LoadStatus::NotLoaded);
        assert_eq!(store.get_options("slow"), None);
    }

    #[tokio::test]
    async fn reset_all_clears_every_entry() {
        let store = AsyncOptionsStore::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let loader = counting(&calls, 0);
        let form = FormSnapshot::empty();

        store
            .ensure_loaded("a", &loader, &NO_DEPS, &form)
            .unwrap()
            .wait()
            .await;
        store
            .ensure_loaded("b", &loader, &NO_DEPS, &form)
            .unwrap()
            .wait()
            .await;
        assert_eq!(store.loader_ids().len(), 2);

        store.reset(None);
        assert!(store.loader_ids().is_empty());
        assert_eq!(store.get_options("a"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_store_discards_response() {
        let store = AsyncOptionsStore::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let loader = counting(&calls, 50);

        let dispatch = store
            .ensure_loaded("gone", &loader, &NO_DEPS, &FormSnapshot::empty())
            .unwrap();
        drop(store);

        assert_eq!(dispatch.wait().await, LoadOutcome::Superseded);
    }

    #[tokio::test(start_paused = true)]
    async fn abort_superseded_cancels_older_task() {
        let store =
            AsyncOptionsStore::with_config(StoreConfig::new().with_abort_superseded(true));
        let calls = Arc::new(AtomicUsize::new(0));
        let loader = counting(&calls, 100);
        let form = FormSnapshot::empty();

        let older = store.search("q", &loader, "a", &form).unwrap();
        let newer = store.search("q", &loader, "ab", &form).unwrap();

        assert_eq!(older.wait().await, LoadOutcome::Superseded);
        assert_eq!(newer.wait().await, LoadOutcome::Applied(LoadStatus::Loaded));
        assert_eq!(store.entry("q").search_term.as_deref(), Some("ab"));
        assert_eq!(store.stats().superseded, 1);
    }

    #[tokio::test]
    async fn stats_count_statuses() {
        let store = AsyncOptionsStore::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let ok = counting(&calls, 0);
        let form = FormSnapshot::empty();

        store
            .ensure_loaded("ok", &ok, &NO_DEPS, &form)
            .unwrap()
            .wait()
            .await;
        store
            .ensure_loaded("bad", &failing("nope"), &NO_DEPS, &form)
            .unwrap()
            .wait()
            .await;

        let stats = store.stats();
        assert_eq!(stats.entries, 2);
        assert_eq!(stats.loaded, 1);
        assert_eq!(stats.errored, 1);
        assert_eq!(stats.loading, 0);
        assert_eq!(stats.dispatched, 2);
    }
}
