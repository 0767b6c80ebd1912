//! Metrics Layer
//!
//! Counters and gauges on top of a [`KeyValueStore`](crate::store::KeyValueStore):
//!
//! - **engine**: `MetricsStore`, the read/write API
//! - **category**: category slug lists
//! - **types**: `MetricCounts` and the history pivot
//! - **error**: Error types
//!
//! # Architecture
//!
//! ```text
//! Write Path:
//!   record_metric(slug) → sadd registry → incr day/week/month/year keys → categorize
//!
//! Read Path:
//!   slugs × dates → build_keys → dedup → mget → counts | (key, value) rows | columns
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use redis_metrics::metrics::MetricsStore;
//! use redis_metrics::keys::Granularity;
//! use redis_metrics::store::MemoryStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let metrics = MetricsStore::with_defaults(MemoryStore::new());
//!
//!     metrics.record_metric("signups", 1, Some("Growth")).await?;
//!     metrics.set_gauge("queue-depth", "42").await?;
//!
//!     let today = metrics.get_metric("signups").await?;
//!     println!("{} signups this week", today.week);
//!
//!     let table = metrics
//!         .get_metric_history_as_columns(&["signups".to_string()], None, Granularity::Monthly)
//!         .await?;
//!     for row in table {
//!         println!("{}", row.join("\t"));
//!     }
//!
//!     Ok(())
//! }
//! ```

mod category;
mod engine;
mod error;
mod types;

pub use category::Categorizer;
pub use engine::MetricsStore;
pub use error::{MetricsError, MetricsResult};
pub use types::{history_to_columns, parse_count, MetricCounts, PERIOD_HEADER};
