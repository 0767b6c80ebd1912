//! Metrics Store
//!
//! Orchestrates metric and gauge writes and reads over a [`KeyValueStore`]:
//! - Write path: slug → four rollup keys → `sadd` the keys to the registry → `incr` each key
//! - Read path: slugs × dates → deduplicated keys → one `mget` → counts/table
//!
//! Writes are several independent store commands, not a transaction.
//! Each counter uses the store's atomic increment, so concurrent writers
//! never lose counts; a failure part-way through can leave the rollups of
//! a single event out of step with each other.

use super::category::Categorizer;
use super::error::{MetricsError, MetricsResult};
use super::types::{history_to_columns, parse_count, MetricCounts};
use crate::config::RegistryConfig;
use crate::dates::{date_range, today, DateRange};
use crate::keys::{build_keys, gauge_key, gauge_slug, metric_slug, Granularity};
use crate::store::{KeyValueStore, StoreError};
use chrono::NaiveDate;
use std::collections::BTreeSet;

/// Time-bucketed metric counters and gauges on top of a key-value store
pub struct MetricsStore<S> {
    store: S,
    registry: RegistryConfig,
}

impl<S: KeyValueStore> MetricsStore<S> {
    pub fn new(store: S, registry: RegistryConfig) -> Self {
        Self { store, registry }
    }

    /// Store with the default registry key names
    pub fn with_defaults(store: S) -> Self {
        Self::new(store, RegistryConfig::default())
    }

    /// The underlying key-value store
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn registry(&self) -> &RegistryConfig {
        &self.registry
    }

    /// Category operations against the same store
    pub fn categorizer(&self) -> Categorizer<'_, S> {
        Categorizer::new(&self.store, &self.registry.categories_key)
    }

    // ---- writes ----

    /// Count `amount` occurrences of `slug` today, optionally filing it under `category`
    pub async fn record_metric(
        &self,
        slug: &str,
        amount: i64,
        category: Option<&str>,
    ) -> MetricsResult<()> {
        self.record_metric_on(slug, amount, today(), category).await
    }

    /// Count `amount` occurrences of `slug` on `date`
    ///
    /// Adds the four keys to the metric registry, then increments the daily,
    /// weekly, monthly and yearly keys for `date`.
    pub async fn record_metric_on(
        &self,
        slug: &str,
        amount: i64,
        date: NaiveDate,
        category: Option<&str>,
    ) -> MetricsResult<()> {
        if slug.is_empty() {
            return Err(MetricsError::EmptySlug);
        }

        let keys = build_keys(slug, date, None);
        tracing::debug!(slug = %slug, amount, date = %date, "Recording metric");

        self.store.sadd(&self.registry.metric_slugs_key, &keys).await?;
        for key in &keys {
            self.store.incr(key, amount).await?;
        }

        if let Some(category) = category {
            self.categorizer().categorize(slug, category).await?;
        }

        Ok(())
    }

    /// Overwrite today's rollups of `slug` with `value`
    ///
    /// For seeding or correcting counters; later increments continue from
    /// `value`.
    pub async fn set_metric(
        &self,
        slug: &str,
        value: i64,
        category: Option<&str>,
    ) -> MetricsResult<()> {
        if slug.is_empty() {
            return Err(MetricsError::EmptySlug);
        }

        tracing::debug!(slug = %slug, value, "Setting metric");

        let keys = build_keys(slug, today(), None);
        self.store.sadd(&self.registry.metric_slugs_key, &keys).await?;
        let value = value.to_string();
        for key in &keys {
            self.store.set(key, &value).await?;
        }

        if let Some(category) = category {
            self.categorizer().categorize(slug, category).await?;
        }

        Ok(())
    }

    /// Replace the current value of gauge `slug`
    pub async fn set_gauge(&self, slug: &str, value: &str) -> MetricsResult<()> {
        if slug.is_empty() {
            return Err(MetricsError::EmptySlug);
        }

        tracing::debug!(slug = %slug, value = %value, "Setting gauge");

        let key = gauge_key(slug);
        self.store
            .sadd(&self.registry.gauge_slugs_key, &[key.clone()])
            .await?;
        self.store.set(&key, value).await?;
        Ok(())
    }

    /// Append `slug` to `category` (see [`Categorizer::categorize`])
    pub async fn categorize(&self, slug: &str, category: &str) -> MetricsResult<()> {
        self.categorizer().categorize(slug, category).await
    }

    /// Replace the members of `category`
    pub async fn reset_category(&self, category: &str, slugs: &[String]) -> MetricsResult<()> {
        self.categorizer().reset_category(category, slugs).await
    }

    // ---- reads ----

    /// Today's daily, weekly, monthly and yearly totals of `slug`
    pub async fn get_metric(&self, slug: &str) -> MetricsResult<MetricCounts> {
        let keys = build_keys(slug, today(), None);

        let mut values = Vec::with_capacity(keys.len());
        for key in &keys {
            values.push(self.store.get(key).await?);
        }

        MetricCounts::from_values(&keys, &values)
    }

    /// Current totals for several slugs, fetched with one `mget`
    ///
    /// Results follow the order of `slugs`.
    pub async fn get_metrics(
        &self,
        slugs: &[String],
    ) -> MetricsResult<Vec<(String, MetricCounts)>> {
        if slugs.is_empty() {
            return Ok(Vec::new());
        }

        let date = today();
        let keys: Vec<String> = slugs
            .iter()
            .flat_map(|slug| build_keys(slug, date, None))
            .collect();

        tracing::debug!(slugs = slugs.len(), keys = keys.len(), "Fetching metrics");
        let values = self.store.mget(&keys).await?;
        if values.len() != keys.len() {
            return Err(short_mget(keys.len(), values.len()));
        }

        let per_slug = Granularity::all().len();
        slugs
            .iter()
            .zip(keys.chunks(per_slug).zip(values.chunks(per_slug)))
            .map(|(slug, (keys, values))| {
                Ok((slug.clone(), MetricCounts::from_values(keys, values)?))
            })
            .collect()
    }

    /// Slugs in `category`
    pub async fn category_slugs(&self, category: &str) -> MetricsResult<Vec<String>> {
        self.categorizer().category_slugs(category).await
    }

    /// Current totals of every metric in `category`
    pub async fn get_category_metrics(
        &self,
        category: &str,
    ) -> MetricsResult<Vec<(String, MetricCounts)>> {
        let slugs = self.category_slugs(category).await?;
        self.get_metrics(&slugs).await
    }

    /// Every category name
    pub async fn categories(&self) -> MetricsResult<BTreeSet<String>> {
        self.categorizer().categories().await
    }

    /// Raw `(key, value)` history of `slugs` from `since` through today
    ///
    /// Without `since` the window is the last year. Keys are deduplicated
    /// (a week spans seven days, a year 365) and sorted, then fetched with
    /// a single `mget`.
    pub async fn get_metric_history(
        &self,
        slugs: &[String],
        since: Option<NaiveDate>,
        granularity: Granularity,
    ) -> MetricsResult<Vec<(String, Option<String>)>> {
        self.get_metric_history_in(slugs, date_range(since), granularity)
            .await
    }

    /// Raw history over an explicit window
    pub async fn get_metric_history_in(
        &self,
        slugs: &[String],
        dates: DateRange,
        granularity: Granularity,
    ) -> MetricsResult<Vec<(String, Option<String>)>> {
        let mut keys = BTreeSet::new();
        for slug in slugs {
            for date in dates.clone() {
                keys.extend(build_keys(slug, date, Some(granularity)));
            }
        }

        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let keys: Vec<String> = keys.into_iter().collect();
        tracing::debug!(
            slugs = slugs.len(),
            keys = keys.len(),
            granularity = %granularity,
            "Fetching metric history"
        );

        let values = self.store.mget(&keys).await?;
        if values.len() != keys.len() {
            return Err(short_mget(keys.len(), values.len()));
        }
        Ok(keys.into_iter().zip(values).collect())
    }

    /// History pivoted into a `Period, slug_1, .., slug_n` table
    ///
    /// See [`history_to_columns`] for the layout.
    pub async fn get_metric_history_as_columns(
        &self,
        slugs: &[String],
        since: Option<NaiveDate>,
        granularity: Granularity,
    ) -> MetricsResult<Vec<Vec<String>>> {
        let history = self.get_metric_history(slugs, since, granularity).await?;
        Ok(history_to_columns(slugs, &history))
    }

    /// Pivoted history over an explicit window
    pub async fn get_metric_history_as_columns_in(
        &self,
        slugs: &[String],
        dates: DateRange,
        granularity: Granularity,
    ) -> MetricsResult<Vec<Vec<String>>> {
        let history = self.get_metric_history_in(slugs, dates, granularity).await?;
        Ok(history_to_columns(slugs, &history))
    }

    /// Current value of gauge `slug`
    pub async fn get_gauge(&self, slug: &str) -> MetricsResult<Option<String>> {
        Ok(self.store.get(&gauge_key(slug)).await?)
    }

    /// Members of the metric registry: every counter key ever written
    pub async fn metric_slugs(&self) -> MetricsResult<BTreeSet<String>> {
        Ok(self.store.smembers(&self.registry.metric_slugs_key).await?)
    }

    /// Members of the gauge registry: the `g:{slug}` key of every gauge set
    pub async fn gauge_slugs(&self) -> MetricsResult<BTreeSet<String>> {
        Ok(self.store.smembers(&self.registry.gauge_slugs_key).await?)
    }

    /// Distinct slugs behind [`metric_slugs`](Self::metric_slugs)
    ///
    /// Members that are not counter keys are taken as bare slugs.
    pub async fn registered_metrics(&self) -> MetricsResult<BTreeSet<String>> {
        let members = self.metric_slugs().await?;
        Ok(members
            .iter()
            .map(|m| metric_slug(m).unwrap_or(m.as_str()).to_string())
            .collect())
    }

    /// Distinct slugs behind [`gauge_slugs`](Self::gauge_slugs)
    pub async fn registered_gauges(&self) -> MetricsResult<BTreeSet<String>> {
        let members = self.gauge_slugs().await?;
        Ok(members
            .iter()
            .map(|m| gauge_slug(m).unwrap_or(m.as_str()).to_string())
            .collect())
    }

    /// One counter value, for callers holding a key from the history
    pub async fn get_count(&self, key: &str) -> MetricsResult<i64> {
        let value = self.store.get(key).await?;
        parse_count(key, value.as_deref())
    }
}

fn short_mget(expected: usize, got: usize) -> MetricsError {
    StoreError::Command(format!("MGET returned {} values for {} keys", got, expected)).into()
}
