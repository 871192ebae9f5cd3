//! Testing utilities for the uiform workspace
//!
//! Shared loaders, fixtures and helpers.

#![allow(missing_docs)]

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use uiform_options::{
    FormSnapshot, LoaderContext, LoaderError, LoaderResponse, OptionItem, OptionsLoader,
    SharedLoader,
};

pub type LoadResult = Result<LoaderResponse, LoaderError>;

/// Build a snapshot from a JSON object literal
pub fn snapshot(raw: Value) -> FormSnapshot {
    match raw {
        Value::Object(map) => FormSnapshot::new(map),
        other => panic!("snapshot expects a JSON object, got {other}"),
    }
}

/// Build options from `(value, label)` pairs
pub fn options(pairs: &[(&str, &str)]) -> Vec<OptionItem> {
    pairs
        .iter()
        .map(|(value, label)| OptionItem::new(*value, *label))
        .collect()
}

pub fn ok(pairs: &[(&str, &str)]) -> LoadResult {
    Ok(LoaderResponse::new(options(pairs)))
}

/// Loader returning fixed options, counting calls and recording contexts
#[derive(Debug, Default)]
pub struct CountingLoader {
    options: Vec<OptionItem>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    contexts: Mutex<Vec<LoaderContext>>,
}

impl CountingLoader {
    pub fn new(pairs: &[(&str, &str)]) -> Arc<Self> {
        Arc::new(Self {
            options: options(pairs),
            ..Self::default()
        })
    }

    pub fn with_delay(pairs: &[(&str, &str)], delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            options: options(pairs),
            delay: Some(delay),
            ..Self::default()
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn contexts(&self) -> Vec<LoaderContext> {
        self.contexts.lock().clone()
    }

    pub fn last_context(&self) -> Option<LoaderContext> {
        self.contexts.lock().last().cloned()
    }
}

#[async_trait]
impl OptionsLoader for CountingLoader {
    async fn load(&self, ctx: LoaderContext) -> LoadResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.contexts.lock().push(ctx);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(LoaderResponse::new(self.options.clone()))
    }
}

/// Loader that always fails with a fixed message
#[derive(Debug, Default)]
pub struct FailingLoader {
    message: String,
    calls: AtomicUsize,
}

impl FailingLoader {
    pub fn new(message: &str) -> Arc<Self> {
        Arc::new(Self {
            message: message.to_string(),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OptionsLoader for FailingLoader {
    async fn load(&self, _ctx: LoaderContext) -> LoadResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(LoaderError::new(self.message.clone()))
    }
}

#[derive(Default)]
struct Gate {
    tx: Option<oneshot::Sender<LoadResult>>,
    rx: Option<oneshot::Receiver<LoadResult>>,
}

type KeyFn = Box<dyn Fn(&LoaderContext) -> String + Send + Sync>;

/// Loader whose calls block until the test resolves them
///
/// Each call is identified by a key derived from its context (the search
/// term by default). A call waits until `resolve(key, ..)` is issued; the
/// resolution may also come first.
pub struct GatedLoader {
    key: KeyFn,
    gates: Mutex<HashMap<String, Gate>>,
    calls: AtomicUsize,
    contexts: Mutex<Vec<LoaderContext>>,
}

impl GatedLoader {
    /// Gate calls by search term
    pub fn by_search() -> Arc<Self> {
        Self::keyed(|ctx| ctx.search.clone())
    }

    /// Gate calls by the stringified value of a form field
    pub fn by_field(field: &'static str) -> Arc<Self> {
        Self::keyed(move |ctx| {
            ctx.form_values
                .get(field)
                .map(uiform_options::value_to_string)
                .unwrap_or_default()
        })
    }

    pub fn keyed(key: impl Fn(&LoaderContext) -> String + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            key: Box::new(key),
            gates: Mutex::new(HashMap::new()),
            calls: AtomicUsize::new(0),
            contexts: Mutex::new(Vec::new()),
        })
    }

    /// Resolve the call identified by `key`
    pub fn resolve(&self, key: &str, result: LoadResult) {
        let tx = {
            let mut gates = self.gates.lock();
            Self::gate(&mut gates, key).tx.take()
        };
        if let Some(tx) = tx {
            let _ = tx.send(result);
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn contexts(&self) -> Vec<LoaderContext> {
        self.contexts.lock().clone()
    }

    /// Yield until at least `n` calls reached the loader
    pub async fn wait_for_calls(&self, n: usize) {
        while self.calls() < n {
            tokio::task::yield_now().await;
        }
    }

    fn gate<'a>(gates: &'a mut HashMap<String, Gate>, key: &str) -> &'a mut Gate {
        gates.entry(key.to_string()).or_insert_with(|| {
            let (tx, rx) = oneshot::channel();
            Gate {
                tx: Some(tx),
                rx: Some(rx),
            }
        })
    }
}

#[async_trait]
impl OptionsLoader for GatedLoader {
    async fn load(&self, ctx: LoaderContext) -> LoadResult {
        let key = (self.key)(&ctx);
        let rx = {
            let mut gates = self.gates.lock();
            Self::gate(&mut gates, &key).rx.take()
        };
        self.contexts.lock().push(ctx);
        self.calls.fetch_add(1, Ordering::SeqCst);

        match rx {
            Some(rx) => rx
                .await
                .unwrap_or_else(|_| Err(LoaderError::new(format!("gate `{key}` dropped")))),
            None => Err(LoaderError::new(format!("gate `{key}` already used"))),
        }
    }
}

/// Upcast a concrete test loader
pub fn shared<L: OptionsLoader + 'static>(loader: &Arc<L>) -> SharedLoader {
    Arc::clone(loader) as SharedLoader
}
