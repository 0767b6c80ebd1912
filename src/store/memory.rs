//! In-process store with Redis semantics
//!
//! Strings and sets share one keyspace, as in Redis: a set command on a
//! string key (or the reverse) fails with [`StoreError::WrongType`].

use super::{KeyValueStore, StoreError, StoreResult};
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
enum Entry {
    Str(String),
    Set(BTreeSet<String>),
}

/// Thread-safe in-memory key-value store
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<HashMap<String, Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently held
    pub async fn len(&self) -> usize {
        self.data.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.data.read().await.is_empty()
    }

    /// All keys, sorted
    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.data.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }
}

fn read_str(key: &str, entry: Option<&Entry>) -> StoreResult<Option<String>> {
    match entry {
        None => Ok(None),
        Some(Entry::Str(s)) => Ok(Some(s.clone())),
        Some(Entry::Set(_)) => Err(StoreError::WrongType(key.to_string())),
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn incr(&self, key: &str, amount: i64) -> StoreResult<i64> {
        let mut data = self.data.write().await;

        let current = match data.get(key) {
            None => 0,
            Some(Entry::Str(s)) => s.parse::<i64>().map_err(|_| {
                StoreError::Command(format!("value at {} is not an integer", key))
            })?,
            Some(Entry::Set(_)) => return Err(StoreError::WrongType(key.to_string())),
        };

        let next = current.checked_add(amount).ok_or_else(|| {
            StoreError::Command(format!("increment of {} would overflow", key))
        })?;

        data.insert(key.to_string(), Entry::Str(next.to_string()));
        Ok(next)
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let data = self.data.read().await;
        read_str(key, data.get(key))
    }

    async fn mget(&self, keys: &[String]) -> StoreResult<Vec<Option<String>>> {
        let data = self.data.read().await;
        // MGET reports non-string keys as missing rather than failing
        Ok(keys
            .iter()
            .map(|k| match data.get(k) {
                Some(Entry::Str(s)) => Some(s.clone()),
                _ => None,
            })
            .collect())
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut data = self.data.write().await;
        data.insert(key.to_string(), Entry::Str(value.to_string()));
        Ok(())
    }

    async fn sadd(&self, set_key: &str, members: &[String]) -> StoreResult<usize> {
        let mut data = self.data.write().await;

        let entry = data
            .entry(set_key.to_string())
            .or_insert_with(|| Entry::Set(BTreeSet::new()));

        match entry {
            Entry::Set(set) => Ok(members.iter().filter(|m| set.insert((*m).clone())).count()),
            Entry::Str(_) => Err(StoreError::WrongType(set_key.to_string())),
        }
    }

    async fn smembers(&self, set_key: &str) -> StoreResult<BTreeSet<String>> {
        let data = self.data.read().await;
        match data.get(set_key) {
            None => Ok(BTreeSet::new()),
            Some(Entry::Set(set)) => Ok(set.clone()),
            Some(Entry::Str(_)) => Err(StoreError::WrongType(set_key.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_incr_creates_and_accumulates() {
        let store = MemoryStore::new();

        assert_eq!(store.incr("hits", 1).await.unwrap(), 1);
        assert_eq!(store.incr("hits", 5).await.unwrap(), 6);
        assert_eq!(store.incr("hits", -2).await.unwrap(), 4);
        assert_eq!(store.get("hits").await.unwrap().as_deref(), Some("4"));
    }

    #[tokio::test]
    async fn test_incr_rejects_non_integer() {
        let store = MemoryStore::new();
        store.set("name", "abc").await.unwrap();

        let err = store.incr("name", 1).await.unwrap_err();
        assert!(matches!(err, StoreError::Command(_)));

        store.set("big", &i64::MAX.to_string()).await.unwrap();
        assert!(store.incr("big", 1).await.is_err());
    }

    #[tokio::test]
    async fn test_mget_preserves_order_and_missing() {
        let store = MemoryStore::new();
        store.set("a", "1").await.unwrap();
        store.set("c", "3").await.unwrap();
        store.sadd("s", &["x".to_string()]).await.unwrap();

        let keys: Vec<String> = ["c", "b", "a", "s"].iter().map(|s| s.to_string()).collect();
        let values = store.mget(&keys).await.unwrap();

        assert_eq!(
            values,
            vec![Some("3".to_string()), None, Some("1".to_string()), None]
        );
        assert!(store.mget(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sadd_is_idempotent() {
        let store = MemoryStore::new();
        let members = vec!["a".to_string(), "b".to_string()];

        assert_eq!(store.sadd("set", &members).await.unwrap(), 2);
        assert_eq!(store.sadd("set", &members).await.unwrap(), 0);
        assert_eq!(store.sadd("set", &["c".to_string()]).await.unwrap(), 1);

        let all = store.smembers("set").await.unwrap();
        assert_eq!(all.into_iter().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert!(store.smembers("missing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_wrong_type() {
        let store = MemoryStore::new();
        store.set("str", "1").await.unwrap();
        store.sadd("set", &["x".to_string()]).await.unwrap();

        assert!(matches!(
            store.sadd("str", &["y".to_string()]).await,
            Err(StoreError::WrongType(_))
        ));
        assert!(matches!(store.smembers("str").await, Err(StoreError::WrongType(_))));
        assert!(matches!(store.get("set").await, Err(StoreError::WrongType(_))));
        assert!(matches!(store.incr("set", 1).await, Err(StoreError::WrongType(_))));

        assert_eq!(store.len().await, 2);
        assert_eq!(store.keys().await, vec!["set", "str"]);
    }
}
