//! # redis-metrics
//!
//! Time-bucketed metric counters and gauges stored in Redis.
//!
//! ## Features
//!
//! - **Rollups**: every event increments a daily, weekly, monthly and yearly counter
//! - **History**: any window of rollups fetched with a single `MGET`, as rows or pivoted columns
//! - **Categories**: named groups of metrics persisted as JSON slug lists
//! - **Gauges**: last-write-wins point values
//! - **Pluggable store**: a six-command trait with Redis and in-memory implementations
//!
//! ## Modules
//!
//! - [`keys`]: Storage key layout and its inverse
//! - [`dates`]: Calendar windows for history queries
//! - [`store`]: Key-value store trait and implementations
//! - [`metrics`]: The metrics API
//! - [`config`]: TOML and environment configuration
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use redis_metrics::{Config, MetricsStore, RedisStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_default();
//!     let store = RedisStore::connect(&config.store).await?;
//!     let metrics = MetricsStore::new(store, config.registry);
//!
//!     metrics.record_metric("logins", 1, Some("Accounts")).await?;
//!
//!     for (slug, counts) in metrics.get_category_metrics("Accounts").await? {
//!         println!("{}: {} today, {} this year", slug, counts.day, counts.year);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod dates;
pub mod keys;
pub mod metrics;
pub mod store;

// Re-export top-level types for convenience
pub use config::{Config, ConfigError, LoggingConfig, RegistryConfig, StoreConfig};
pub use dates::{date_range, DateRange};
pub use keys::{
    build_keys, category_key, gauge_key, gauge_slug, metric_slug, strip_metric_prefix, Granularity,
};
pub use metrics::{Categorizer, MetricCounts, MetricsError, MetricsResult, MetricsStore};
pub use store::{KeyValueStore, MemoryStore, RedisStore, StoreError, StoreResult};
