//! Keyed in-memory storage with one lock per entity.
//!
//! The outer map lock is only held long enough to find or insert an entity handle; every
//! mutation then runs under that entity's own mutex against a copy that is written back only
//! when the mutation succeeds.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, RwLock};

/// Error enumeration for repository failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

fn poisoned(what: &str) -> RepositoryError {
    RepositoryError::Unavailable(format!("{what} lock poisoned"))
}

pub struct EntityStore<K, V> {
    entries: RwLock<HashMap<K, Arc<Mutex<V>>>>,
}

impl<K, V> Default for EntityStore<K, V> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<K, V> EntityStore<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn insert(&self, key: K, value: V) -> Result<(), RepositoryError> {
        let mut entries = self.entries.write().map_err(|_| poisoned("store"))?;
        if entries.contains_key(&key) {
            return Err(RepositoryError::Conflict);
        }
        entries.insert(key, Arc::new(Mutex::new(value)));
        Ok(())
    }

    pub fn fetch(&self, key: &K) -> Result<Option<V>, RepositoryError> {
        match self.handle(key)? {
            Some(handle) => {
                let entity = handle.lock().map_err(|_| poisoned("entity"))?;
                Ok(Some(entity.clone()))
            }
            None => Ok(None),
        }
    }

    /// Apply `apply` to a copy of the entity under its lock; the copy replaces the stored value
    /// only when `apply` succeeds. Returns `Ok(None)` when the key is absent.
    pub fn modify<T, E, F>(&self, key: &K, apply: F) -> Result<Option<(V, T)>, E>
    where
        F: FnOnce(&mut V) -> Result<T, E>,
        E: From<RepositoryError>,
    {
        let Some(handle) = self.handle(key)? else {
            return Ok(None);
        };
        let mut entity = handle.lock().map_err(|_| poisoned("entity"))?;
        let mut draft = entity.clone();
        let output = apply(&mut draft)?;
        *entity = draft.clone();
        Ok(Some((draft, output)))
    }

    pub fn remove(&self, key: &K) -> Result<Option<V>, RepositoryError> {
        let removed = {
            let mut entries = self.entries.write().map_err(|_| poisoned("store"))?;
            entries.remove(key)
        };
        match removed {
            Some(handle) => {
                let entity = handle.lock().map_err(|_| poisoned("entity"))?;
                Ok(Some(entity.clone()))
            }
            None => Ok(None),
        }
    }

    /// Copies of every entity matching `predicate`, each read under its own lock in turn.
    pub fn select<P>(&self, mut predicate: P) -> Result<Vec<V>, RepositoryError>
    where
        P: FnMut(&V) -> bool,
    {
        let mut matches = Vec::new();
        for handle in self.handles()? {
            let entity = handle.lock().map_err(|_| poisoned("entity"))?;
            if predicate(&entity) {
                matches.push(entity.clone());
            }
        }
        Ok(matches)
    }

    pub fn len(&self) -> Result<usize, RepositoryError> {
        Ok(self.entries.read().map_err(|_| poisoned("store"))?.len())
    }

    pub fn is_empty(&self) -> Result<bool, RepositoryError> {
        Ok(self.len()? == 0)
    }

    fn handle(&self, key: &K) -> Result<Option<Arc<Mutex<V>>>, RepositoryError> {
        let entries = self.entries.read().map_err(|_| poisoned("store"))?;
        Ok(entries.get(key).cloned())
    }

    fn handles(&self) -> Result<Vec<Arc<Mutex<V>>>, RepositoryError> {
        let entries = self.entries.read().map_err(|_| poisoned("store"))?;
        Ok(entries.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    enum TestError {
        Rejected,
        Repository(RepositoryError),
    }

    impl From<RepositoryError> for TestError {
        fn from(value: RepositoryError) -> Self {
            Self::Repository(value)
        }
    }

    #[test]
    fn insert_rejects_duplicate_keys() {
        let store = EntityStore::default();
        store.insert("a", 1).expect("first insert");
        assert_eq!(store.insert("a", 2), Err(RepositoryError::Conflict));
        assert_eq!(store.fetch(&"a").expect("fetch"), Some(1));
    }

    #[test]
    fn failed_modification_leaves_entity_untouched() {
        let store = EntityStore::default();
        store.insert("a", vec![1]).expect("insert");

        let result: Result<_, TestError> = store.modify(&"a", |value| {
            value.push(2);
            Err::<(), _>(TestError::Rejected)
        });

        assert!(matches!(result, Err(TestError::Rejected)));
        assert_eq!(store.fetch(&"a").expect("fetch"), Some(vec![1]));
    }

    #[test]
    fn successful_modification_is_committed() {
        let store = EntityStore::default();
        store.insert("a", 10).expect("insert");

        let result: Result<_, TestError> = store.modify(&"a", |value| {
            *value += 5;
            Ok(*value * 2)
        });

        match result {
            Ok(Some((value, doubled))) => {
                assert_eq!(value, 15);
                assert_eq!(doubled, 30);
            }
            other => panic!("expected committed modification, got {other:?}"),
        }
        assert_eq!(store.fetch(&"a").expect("fetch"), Some(15));
    }

    #[test]
    fn modify_reports_missing_keys() {
        let store: EntityStore<&str, i32> = EntityStore::default();
        let result: Result<Option<(i32, ())>, TestError> = store.modify(&"missing", |_| Ok(()));
        assert!(matches!(result, Ok(None)));
    }

    #[test]
    fn poisoned_entity_surfaces_as_unavailable() {
        let store = EntityStore::default();
        store.insert("a", vec![1]).expect("insert");
        let handle = store.handle(&"a").expect("lookup").expect("present");
        let _ = std::thread::spawn(move || {
            let _guard = handle.lock().expect("lock");
            panic!("poison the entity lock");
        })
        .join();

        let result: Result<Option<(Vec<i32>, ())>, TestError> = store.modify(&"a", |_| Ok(()));
        match result {
            Err(TestError::Repository(RepositoryError::Unavailable(message))) => {
                assert!(message.contains("entity"));
            }
            other => panic!("expected unavailable repository, got {other:?}"),
        }
    }

    #[test]
    fn select_filters_and_remove_detaches() {
        let store = EntityStore::default();
        for (key, value) in [("a", 1), ("b", 2), ("c", 3)] {
            store.insert(key, value).expect("insert");
        }

        let mut odd = store.select(|value| value % 2 == 1).expect("select");
        odd.sort();
        assert_eq!(odd, vec![1, 3]);

        assert_eq!(store.remove(&"b").expect("remove"), Some(2));
        assert_eq!(store.len().expect("len"), 2);
        assert_eq!(store.fetch(&"b").expect("fetch"), None);
    }
}
