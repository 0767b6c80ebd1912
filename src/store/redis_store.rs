//! Redis-backed store
//!
//! Wraps a multiplexed async connection; clones of the connection share one
//! socket, so every operation clones it rather than locking.

use super::{KeyValueStore, StoreError, StoreResult};
use crate::config::StoreConfig;
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::RedisError;
use std::collections::BTreeSet;

impl From<RedisError> for StoreError {
    fn from(err: RedisError) -> Self {
        if err.is_connection_refusal()
            || err.is_connection_dropped()
            || err.is_io_error()
            || err.is_timeout()
        {
            StoreError::Unavailable(err.to_string())
        } else if err.code() == Some("WRONGTYPE") {
            StoreError::WrongType(err.to_string())
        } else {
            StoreError::Command(err.to_string())
        }
    }
}

/// [`KeyValueStore`] over a Redis server
#[derive(Clone)]
pub struct RedisStore {
    conn: MultiplexedConnection,
}

impl RedisStore {
    /// Connect to the server described by `config`
    pub async fn connect(config: &StoreConfig) -> StoreResult<Self> {
        let client = redis::Client::open(config.url())?;
        let conn = client.get_multiplexed_async_connection().await?;

        tracing::info!(
            host = %config.host,
            port = config.port,
            db = config.db,
            "Connected to Redis"
        );

        Ok(Self { conn })
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn incr(&self, key: &str, amount: i64) -> StoreResult<i64> {
        let mut conn = self.conn.clone();
        let value: i64 = redis::cmd("INCRBY")
            .arg(key)
            .arg(amount)
            .query_async(&mut conn)
            .await?;
        Ok(value)
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = redis::cmd("GET").arg(key).query_async(&mut conn).await?;
        Ok(value)
    }

    async fn mget(&self, keys: &[String]) -> StoreResult<Vec<Option<String>>> {
        // MGET with no keys is a syntax error on the server
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = self.conn.clone();
        let values: Vec<Option<String>> =
            redis::cmd("MGET").arg(keys).query_async(&mut conn).await?;
        Ok(values)
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        let _: () = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn sadd(&self, set_key: &str, members: &[String]) -> StoreResult<usize> {
        if members.is_empty() {
            return Ok(0);
        }

        let mut conn = self.conn.clone();
        let added: usize = redis::cmd("SADD")
            .arg(set_key)
            .arg(members)
            .query_async(&mut conn)
            .await?;
        Ok(added)
    }

    async fn smembers(&self, set_key: &str) -> StoreResult<BTreeSet<String>> {
        let mut conn = self.conn.clone();
        let members: BTreeSet<String> = redis::cmd("SMEMBERS")
            .arg(set_key)
            .query_async(&mut conn)
            .await?;
        Ok(members)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_connection_errors_are_unavailable() {
        for kind in [
            io::ErrorKind::ConnectionRefused,
            io::ErrorKind::ConnectionReset,
            io::ErrorKind::BrokenPipe,
        ] {
            let err = RedisError::from(io::Error::new(kind, "x"));
            assert!(
                matches!(StoreError::from(err), StoreError::Unavailable(_)),
                "{:?}",
                kind
            );
        }
    }

    #[test]
    fn test_other_errors_are_command_failures() {
        let err = match redis::Client::open("not a redis url") {
            Ok(_) => panic!("url should be rejected"),
            Err(err) => err,
        };
        assert!(matches!(StoreError::from(err), StoreError::Command(_)));
    }

    #[tokio::test]
    async fn test_connect_refused_is_unavailable() {
        let config = StoreConfig {
            host: "127.0.0.1".to_string(),
            port: 1,
            db: 0,
        };

        let err = match RedisStore::connect(&config).await {
            Ok(_) => panic!("nothing listens on port 1"),
            Err(err) => err,
        };
        assert!(matches!(err, StoreError::Unavailable(_)));
    }
}
