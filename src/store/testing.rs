//! Store doubles for unit tests

use super::{KeyValueStore, MemoryStore, StoreError, StoreResult};
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::Mutex;

/// One recorded store call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Incr(String, i64),
    Get(String),
    Mget(Vec<String>),
    Set(String, String),
    Sadd(String, Vec<String>),
    Smembers(String),
}

/// MemoryStore that logs every call in order
#[derive(Debug, Default)]
pub struct RecordingStore {
    inner: MemoryStore,
    calls: Mutex<Vec<Call>>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    /// Calls made so far
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Forget recorded calls, keeping the data
    pub fn reset(&self) {
        self.calls.lock().unwrap().clear();
    }
}

#[async_trait]
impl KeyValueStore for RecordingStore {
    async fn incr(&self, key: &str, amount: i64) -> StoreResult<i64> {
        self.record(Call::Incr(key.to_string(), amount));
        self.inner.incr(key, amount).await
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.record(Call::Get(key.to_string()));
        self.inner.get(key).await
    }

    async fn mget(&self, keys: &[String]) -> StoreResult<Vec<Option<String>>> {
        self.record(Call::Mget(keys.to_vec()));
        self.inner.mget(keys).await
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.record(Call::Set(key.to_string(), value.to_string()));
        self.inner.set(key, value).await
    }

    async fn sadd(&self, set_key: &str, members: &[String]) -> StoreResult<usize> {
        self.record(Call::Sadd(set_key.to_string(), members.to_vec()));
        self.inner.sadd(set_key, members).await
    }

    async fn smembers(&self, set_key: &str) -> StoreResult<BTreeSet<String>> {
        self.record(Call::Smembers(set_key.to_string()));
        self.inner.smembers(set_key).await
    }
}

/// Store whose every call fails as if the server were down
#[derive(Debug, Default)]
pub struct UnavailableStore;

fn down<T>() -> StoreResult<T> {
    Err(StoreError::Unavailable("connection refused".to_string()))
}

#[async_trait]
impl KeyValueStore for UnavailableStore {
    async fn incr(&self, _key: &str, _amount: i64) -> StoreResult<i64> {
        down()
    }

    async fn get(&self, _key: &str) -> StoreResult<Option<String>> {
        down()
    }

    async fn mget(&self, _keys: &[String]) -> StoreResult<Vec<Option<String>>> {
        down()
    }

    async fn set(&self, _key: &str, _value: &str) -> StoreResult<()> {
        down()
    }

    async fn sadd(&self, _set_key: &str, _members: &[String]) -> StoreResult<usize> {
        down()
    }

    async fn smembers(&self, _set_key: &str) -> StoreResult<BTreeSet<String>> {
        down()
    }
}

/// MemoryStore whose `mget` drops the last value, like a misbehaving proxy
#[derive(Debug, Default)]
pub struct TruncatingStore {
    inner: MemoryStore,
}

impl TruncatingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for TruncatingStore {
    async fn incr(&self, key: &str, amount: i64) -> StoreResult<i64> {
        self.inner.incr(key, amount).await
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.inner.get(key).await
    }

    async fn mget(&self, keys: &[String]) -> StoreResult<Vec<Option<String>>> {
        let mut values = self.inner.mget(keys).await?;
        values.pop();
        Ok(values)
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.inner.set(key, value).await
    }

    async fn sadd(&self, set_key: &str, members: &[String]) -> StoreResult<usize> {
        self.inner.sadd(set_key, members).await
    }

    async fn smembers(&self, set_key: &str) -> StoreResult<BTreeSet<String>> {
        self.inner.smembers(set_key).await
    }
}
