//! Immutable form value snapshots and dependency fingerprints

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Immutable copy of the form values at a point in time
///
/// Cloning is cheap; the map is shared and never mutated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormSnapshot(Arc<Map<String, Value>>);

impl FormSnapshot {
    /// Wrap a value map
    #[inline]
    #[must_use]
    pub fn new(values: Map<String, Value>) -> Self {
        Self(Arc::new(values))
    }

    /// Empty snapshot
    #[inline]
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Value of one field
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// All values
    #[inline]
    #[must_use]
    pub fn values(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Number of fields
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether snapshot holds no fields
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Project the snapshot over `dependencies`, in the given order
    ///
    /// Missing fields project as `null`.
    #[must_use]
    pub fn project<S: AsRef<str>>(&self, dependencies: &[S]) -> DependencySnapshot {
        DependencySnapshot::compute(
            dependencies
                .iter()
                .map(|name| (name.as_ref(), self.get(name.as_ref()).unwrap_or(&Value::Null))),
        )
    }
}

impl From<Map<String, Value>> for FormSnapshot {
    fn from(values: Map<String, Value>) -> Self {
        Self::new(values)
    }
}

impl FromIterator<(String, Value)> for FormSnapshot {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Fingerprint of the dependency values behind a load
///
/// Two snapshots are equal when the same dependency names carry the same
/// values in the same order.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct DependencySnapshot {
    digest: blake3::Hash,
    arity: usize,
}

impl DependencySnapshot {
    /// Hash an ordered `(name, value)` projection
    pub fn compute<'a, I>(projection: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a Value)>,
    {
        let mut hasher = blake3::Hasher::new();
        let mut arity = 0usize;
        for (name, value) in projection {
            let encoded = value.to_string();
            hasher.update(&(name.len() as u64).to_le_bytes());
            hasher.update(name.as_bytes());
            hasher.update(&(encoded.len() as u64).to_le_bytes());
            hasher.update(encoded.as_bytes());
            arity += 1;
        }
        Self {
            digest: hasher.finalize(),
            arity,
        }
    }

    /// Number of dependency fields in the projection
    #[inline]
    #[must_use]
    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Hex digest
    #[must_use]
    pub fn to_hex(&self) -> String {
        self.digest.to_hex().to_string()
    }
}

impl fmt::Debug for DependencySnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DependencySnapshot({}, {})", self.arity, self)
    }
}

impl fmt::Display for DependencySnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = self.digest.to_hex();
        f.write_str(&hex.as_str()[..12])
    }
}
