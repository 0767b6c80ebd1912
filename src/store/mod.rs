//! Key-Value Store Abstraction
//!
//! The metrics layer needs six primitives from its backing store:
//!
//! - `incr`: atomic integer increment, creating the key at 0
//! - `get` / `mget`: string reads, missing keys read as `None`
//! - `set`: string overwrite
//! - `sadd` / `smembers`: set membership
//!
//! Implementations:
//! - `MemoryStore`: in-process, Redis-compatible semantics (tests, embedding)
//! - `RedisStore`: a Redis server via the `redis` crate
//!
//! Retries, timeouts and connection management belong to the
//! implementation; callers see every failure as a [`StoreError`].

mod memory;
mod redis_store;

#[cfg(test)]
pub(crate) mod testing;

pub use memory::MemoryStore;
pub use redis_store::RedisStore;

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised by a store implementation
#[derive(Error, Debug)]
pub enum StoreError {
    /// Connection or transport failure
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Key holds a value of a different type than the command expects
    #[error("Wrong type for key {0}")]
    WrongType(String),

    /// Any other command failure reported by the store
    #[error("Store command failed: {0}")]
    Command(String),
}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// The store operations the metrics layer is built on
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Add `amount` to the integer at `key` (0 if absent); returns the new value
    async fn incr(&self, key: &str, amount: i64) -> StoreResult<i64>;

    /// String value at `key`
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// String values for `keys`, in the same order
    async fn mget(&self, keys: &[String]) -> StoreResult<Vec<Option<String>>>;

    /// Overwrite the string at `key`
    async fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Add `members` to the set at `set_key`; returns how many were new
    async fn sadd(&self, set_key: &str, members: &[String]) -> StoreResult<usize>;

    /// All members of the set at `set_key` (empty if absent)
    async fn smembers(&self, set_key: &str) -> StoreResult<BTreeSet<String>>;
}

#[async_trait]
impl<S: KeyValueStore + ?Sized> KeyValueStore for Arc<S> {
    async fn incr(&self, key: &str, amount: i64) -> StoreResult<i64> {
        (**self).incr(key, amount).await
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        (**self).get(key).await
    }

    async fn mget(&self, keys: &[String]) -> StoreResult<Vec<Option<String>>> {
        (**self).mget(keys).await
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        (**self).set(key, value).await
    }

    async fn sadd(&self, set_key: &str, members: &[String]) -> StoreResult<usize> {
        (**self).sadd(set_key, members).await
    }

    async fn smembers(&self, set_key: &str) -> StoreResult<BTreeSet<String>> {
        (**self).smembers(set_key).await
    }
}
