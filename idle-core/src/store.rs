//! Keyed storage with per-entry version stamps.
//!
//! Every record the backend keeps (users, characters, game states) lives
//! behind [`Store`], so the in-process [`MemoryStore`] can be swapped for a
//! database without touching game logic. Writers that must not lose updates
//! use [`Store::compare_and_swap`] with the version they read.

use async_trait::async_trait;
use std::collections::HashMap;
use std::hash::Hash;
use thiserror::Error;
use tokio::sync::RwLock;

/// Monotonic per-key version. The first write of a key is version 1, and a
/// key written again after removal continues from its last version.
pub type Version = u64;

/// Errors from storage operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Version conflict: expected {expected:?}, found {found:?}")]
    Conflict {
        expected: Option<Version>,
        found: Option<Version>,
    },
}

/// A value together with the version it was read at.
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<V> {
    pub value: V,
    pub version: Version,
}

#[async_trait]
pub trait Store<K, V>: Send + Sync
where
    K: Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    /// Read the current value and its version.
    async fn get(&self, key: &K) -> Result<Option<Versioned<V>>, StoreError>;

    /// Write `value` only if the stored version equals `expected`.
    ///
    /// `expected = None` means "only if absent".
    async fn compare_and_swap(
        &self,
        key: &K,
        expected: Option<Version>,
        value: V,
    ) -> Result<Version, StoreError>;

    /// Write only if the key is absent.
    async fn insert(&self, key: &K, value: V) -> Result<Version, StoreError> {
        self.compare_and_swap(key, None, value).await
    }

    /// Write unconditionally.
    async fn put(&self, key: &K, value: V) -> Result<Version, StoreError>;

    /// Delete a key, returning the removed value.
    async fn remove(&self, key: &K) -> Result<Option<V>, StoreError>;

    /// Snapshot of every stored value.
    async fn values(&self) -> Result<Vec<V>, StoreError>;
}

/// Process-local [`Store`] over a `HashMap`.
#[derive(Debug)]
pub struct MemoryStore<K, V> {
    inner: RwLock<Entries<K, V>>,
}

#[derive(Debug)]
struct Entries<K, V> {
    live: HashMap<K, Versioned<V>>,
    /// Last version of each removed key.
    retired: HashMap<K, Version>,
}

impl<K: Eq + Hash, V> Entries<K, V> {
    fn current(&self, key: &K) -> Option<Version> {
        self.live.get(key).map(|e| e.version)
    }

    fn record(&mut self, key: &K, value: V) -> Version
    where
        K: Clone,
    {
        let last = self
            .current(key)
            .or_else(|| self.retired.remove(key))
            .unwrap_or(0);
        let version = last + 1;
        self.live.insert(key.clone(), Versioned { value, version });
        version
    }
}

impl<K, V> MemoryStore<K, V> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Entries {
                live: HashMap::new(),
                retired: HashMap::new(),
            }),
        }
    }
}

impl<K, V> Default for MemoryStore<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<K, V> Store<K, V> for MemoryStore<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &K) -> Result<Option<Versioned<V>>, StoreError> {
        Ok(self.inner.read().await.live.get(key).cloned())
    }

    async fn compare_and_swap(
        &self,
        key: &K,
        expected: Option<Version>,
        value: V,
    ) -> Result<Version, StoreError> {
        let mut inner = self.inner.write().await;
        let found = inner.current(key);
        if found != expected {
            return Err(StoreError::Conflict { expected, found });
        }
        Ok(inner.record(key, value))
    }

    async fn put(&self, key: &K, value: V) -> Result<Version, StoreError> {
        Ok(self.inner.write().await.record(key, value))
    }

    async fn remove(&self, key: &K) -> Result<Option<V>, StoreError> {
        let mut inner = self.inner.write().await;
        let Some(removed) = inner.live.remove(key) else {
            return Ok(None);
        };
        inner.retired.insert(key.clone(), removed.version);
        Ok(Some(removed.value))
    }

    async fn values(&self) -> Result<Vec<V>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .live
            .values()
            .map(|e| e.value.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_if_absent() {
        let store: MemoryStore<&'static str, u32> = MemoryStore::new();
        assert_eq!(store.insert(&"a", 1).await, Ok(1));
        assert_eq!(
            store.compare_and_swap(&"a", None, 2).await,
            Err(StoreError::Conflict {
                expected: None,
                found: Some(1)
            })
        );
        assert_eq!(store.get(&"a").await.unwrap().unwrap().value, 1);
    }

    #[tokio::test]
    async fn test_stale_write_rejected() {
        let store: MemoryStore<&'static str, u32> = MemoryStore::new();
        store.put(&"a", 10).await.unwrap();
        let read = store.get(&"a").await.unwrap().unwrap();

        store
            .compare_and_swap(&"a", Some(read.version), 11)
            .await
            .unwrap();
        let stale = store.compare_and_swap(&"a", Some(read.version), 12).await;
        assert!(matches!(stale, Err(StoreError::Conflict { .. })));

        let current = store.get(&"a").await.unwrap().unwrap();
        assert_eq!(current.value, 11);
        assert_eq!(current.version, 2);
    }

    #[tokio::test]
    async fn test_versions_survive_removal() {
        let store: MemoryStore<&'static str, u32> = MemoryStore::new();
        let first = store.insert(&"a", 1).await.unwrap();
        store.remove(&"a").await.unwrap();

        let second = store.insert(&"a", 2).await.unwrap();
        assert!(second > first);
        assert_eq!(
            store.compare_and_swap(&"a", Some(first), 3).await,
            Err(StoreError::Conflict {
                expected: Some(first),
                found: Some(second)
            })
        );

        store.remove(&"a").await.unwrap();
        assert_eq!(store.put(&"a", 4).await, Ok(second + 1));
    }

    #[tokio::test]
    async fn test_remove_and_values() {
        let store: MemoryStore<u8, &'static str> = MemoryStore::new();
        store.put(&1, "one").await.unwrap();
        store.put(&2, "two").await.unwrap();
        assert_eq!(store.remove(&1).await.unwrap(), Some("one"));
        assert_eq!(store.remove(&1).await.unwrap(), None);
        assert_eq!(store.values().await.unwrap(), vec!["two"]);
    }
}
