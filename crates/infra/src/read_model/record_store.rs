use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, RwLock};

use meridian_core::DomainResult;

/// Keyed record store that remembers insertion order.
///
/// Listing returns records in the order they were first inserted, which is the
/// order clients see from `GET /users` and `GET /products`.
pub trait RecordStore<K, V>: Send + Sync {
    fn get(&self, key: &K) -> Option<V>;
    fn upsert(&self, key: K, value: V);
    /// Mutate a record in place under the write lock.
    ///
    /// Returns `Ok(None)` when the key is absent; an error from `f` is passed
    /// through and the record is left as `f` left it.
    fn modify(&self, key: &K, f: &mut dyn FnMut(&mut V) -> DomainResult<()>) -> DomainResult<Option<V>>;
    fn remove(&self, key: &K) -> Option<V>;
    fn list(&self) -> Vec<V>;
}

impl<K, V, S> RecordStore<K, V> for Arc<S>
where
    S: RecordStore<K, V> + ?Sized,
{
    fn get(&self, key: &K) -> Option<V> {
        (**self).get(key)
    }

    fn upsert(&self, key: K, value: V) {
        (**self).upsert(key, value)
    }

    fn modify(&self, key: &K, f: &mut dyn FnMut(&mut V) -> DomainResult<()>) -> DomainResult<Option<V>> {
        (**self).modify(key, f)
    }

    fn remove(&self, key: &K) -> Option<V> {
        (**self).remove(key)
    }

    fn list(&self) -> Vec<V> {
        (**self).list()
    }
}

#[derive(Debug)]
struct Records<K, V> {
    values: HashMap<K, V>,
    order: Vec<K>,
}

/// In-memory store for dev and the example services.
#[derive(Debug)]
pub struct InMemoryRecordStore<K, V> {
    inner: RwLock<Records<K, V>>,
}

impl<K, V> InMemoryRecordStore<K, V> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Records {
                values: HashMap::new(),
                order: Vec::new(),
            }),
        }
    }
}

impl<K, V> InMemoryRecordStore<K, V>
where
    K: Clone + Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Build a store pre-populated with `records`, keeping their order.
    pub fn seeded(records: impl IntoIterator<Item = (K, V)>) -> Self {
        let store = Self::new();
        for (k, v) in records {
            store.upsert(k, v);
        }
        store
    }
}

impl<K, V> Default for InMemoryRecordStore<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> RecordStore<K, V> for InMemoryRecordStore<K, V>
where
    K: Clone + Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn get(&self, key: &K) -> Option<V> {
        let records = self.inner.read().ok()?;
        records.values.get(key).cloned()
    }

    fn upsert(&self, key: K, value: V) {
        if let Ok(mut records) = self.inner.write() {
            if records.values.insert(key.clone(), value).is_none() {
                records.order.push(key);
            }
        }
    }

    fn modify(&self, key: &K, f: &mut dyn FnMut(&mut V) -> DomainResult<()>) -> DomainResult<Option<V>> {
        let mut records = match self.inner.write() {
            Ok(r) => r,
            Err(_) => return Ok(None),
        };
        match records.values.get_mut(key) {
            Some(value) => {
                f(value)?;
                Ok(Some(value.clone()))
            }
            None => Ok(None),
        }
    }

    fn remove(&self, key: &K) -> Option<V> {
        let mut records = self.inner.write().ok()?;
        let removed = records.values.remove(key)?;
        records.order.retain(|k| k != key);
        Some(removed)
    }

    fn list(&self) -> Vec<V> {
        let records = match self.inner.read() {
            Ok(r) => r,
            Err(_) => return vec![],
        };

        records
            .order
            .iter()
            .filter_map(|k| records.values.get(k).cloned())
            .collect()
    }
}
