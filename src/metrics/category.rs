//! Category membership
//!
//! A category is a JSON array of metric slugs stored at `c:{category}`,
//! newest first and without duplicates. Every category name is also added
//! to the category registry set so categories can be listed.
//!
//! Updates are a plain read-modify-write with no compare-and-swap: two
//! writers categorizing into the same category at the same moment can
//! overwrite each other's list, and one of the slugs is lost. Counters are
//! unaffected; only the grouping is best-effort under contention.

use super::error::{MetricsError, MetricsResult};
use crate::keys::category_key;
use crate::store::KeyValueStore;
use std::collections::{BTreeSet, HashSet};

/// Reads and updates category slug lists in a store
pub struct Categorizer<'a, S: ?Sized> {
    store: &'a S,
    registry_key: &'a str,
}

impl<'a, S: KeyValueStore + ?Sized> Categorizer<'a, S> {
    /// `registry_key` names the set that lists every category
    pub fn new(store: &'a S, registry_key: &'a str) -> Self {
        Self {
            store,
            registry_key,
        }
    }

    /// Slugs in `category`, newest first; empty if the category was never written
    pub async fn category_slugs(&self, category: &str) -> MetricsResult<Vec<String>> {
        let raw = match self.store.get(&category_key(category)).await? {
            Some(raw) => raw,
            None => return Ok(Vec::new()),
        };

        // A stored JSON `null` is as good as absent
        let slugs: Option<Vec<String>> =
            serde_json::from_str(&raw).map_err(|source| MetricsError::Decode {
                category: category.to_string(),
                source,
            })?;

        Ok(slugs.unwrap_or_default())
    }

    /// Put `slug` at the front of `category` unless it is already a member
    pub async fn categorize(&self, slug: &str, category: &str) -> MetricsResult<()> {
        if slug.is_empty() {
            return Err(MetricsError::EmptySlug);
        }

        let mut slugs = self.category_slugs(category).await?;
        if !slugs.iter().any(|s| s == slug) {
            slugs.insert(0, slug.to_string());
        }

        tracing::debug!(
            slug = %slug,
            category = %category,
            members = slugs.len(),
            "Categorizing metric"
        );
        self.write(category, &slugs).await
    }

    /// Replace the members of `category` with `slugs`
    ///
    /// Duplicates are dropped; the first occurrence keeps its position.
    pub async fn reset_category(&self, category: &str, slugs: &[String]) -> MetricsResult<()> {
        let mut seen = HashSet::new();
        let slugs: Vec<String> = slugs
            .iter()
            .filter(|s| seen.insert(s.as_str()))
            .cloned()
            .collect();

        tracing::debug!(category = %category, members = slugs.len(), "Resetting category");
        self.write(category, &slugs).await
    }

    /// Every category name that has been written
    pub async fn categories(&self) -> MetricsResult<BTreeSet<String>> {
        Ok(self.store.smembers(self.registry_key).await?)
    }

    async fn write(&self, category: &str, slugs: &[String]) -> MetricsResult<()> {
        let json =
            serde_json::to_string(slugs).map_err(|e| MetricsError::Serialization(e.to_string()))?;

        self.store.set(&category_key(category), &json).await?;
        self.store
            .sadd(self.registry_key, &[category.to_string()])
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::testing::{Call, RecordingStore, UnavailableStore};
    use crate::store::{MemoryStore, StoreError};

    const CAT: &str = "Sample Category";
    const CAT_KEY: &str = "c:Sample Category";
    const REGISTRY: &str = "categories";

    #[tokio::test]
    async fn test_category_slugs_absent_is_empty() {
        let store = MemoryStore::new();
        let categorizer = Categorizer::new(&store, REGISTRY);

        assert!(categorizer.category_slugs(CAT).await.unwrap().is_empty());

        store.set(CAT_KEY, "null").await.unwrap();
        assert!(categorizer.category_slugs(CAT).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_category_slugs_decodes_list() {
        let store = MemoryStore::new();
        store.set(CAT_KEY, r#"["slug-a", "slug-b"]"#).await.unwrap();

        let slugs = Categorizer::new(&store, REGISTRY)
            .category_slugs(CAT)
            .await
            .unwrap();
        assert_eq!(slugs, vec!["slug-a", "slug-b"]);
    }

    #[tokio::test]
    async fn test_category_slugs_rejects_malformed_json() {
        let store = MemoryStore::new();
        store.set(CAT_KEY, "[\"slug-a\",").await.unwrap();

        let err = Categorizer::new(&store, REGISTRY)
            .category_slugs(CAT)
            .await
            .unwrap_err();
        assert!(matches!(err, MetricsError::Decode { ref category, .. } if category == CAT));

        // Malformed data is not silently replaced either
        let err = Categorizer::new(&store, REGISTRY)
            .categorize("sample-slug", CAT)
            .await
            .unwrap_err();
        assert!(matches!(err, MetricsError::Decode { .. }));
        assert_eq!(store.get(CAT_KEY).await.unwrap().as_deref(), Some("[\"slug-a\","));
    }

    #[tokio::test]
    async fn test_categorize_into_empty_category() {
        let store = RecordingStore::new();
        let categorizer = Categorizer::new(&store, REGISTRY);

        categorizer.categorize("sample-slug", CAT).await.unwrap();

        assert_eq!(
            store.calls(),
            vec![
                Call::Get(CAT_KEY.to_string()),
                Call::Set(CAT_KEY.to_string(), r#"["sample-slug"]"#.to_string()),
                Call::Sadd(REGISTRY.to_string(), vec![CAT.to_string()]),
            ]
        );
    }

    #[tokio::test]
    async fn test_categorize_prepends_new_slug() {
        let store = MemoryStore::new();
        store.set(CAT_KEY, r#"["existing-slug"]"#).await.unwrap();

        Categorizer::new(&store, REGISTRY)
            .categorize("sample-slug", CAT)
            .await
            .unwrap();

        assert_eq!(
            store.get(CAT_KEY).await.unwrap().as_deref(),
            Some(r#"["sample-slug","existing-slug"]"#)
        );
    }

    #[tokio::test]
    async fn test_categorize_existing_slug_is_noop_on_membership() {
        let store = MemoryStore::new();
        let categorizer = Categorizer::new(&store, REGISTRY);

        categorizer.categorize("sample-slug", CAT).await.unwrap();
        categorizer.categorize("sample-slug", CAT).await.unwrap();

        assert_eq!(
            store.get(CAT_KEY).await.unwrap().as_deref(),
            Some(r#"["sample-slug"]"#)
        );
    }

    #[tokio::test]
    async fn test_reset_category_and_registry() {
        let store = MemoryStore::new();
        let categorizer = Categorizer::new(&store, REGISTRY);

        categorizer.categorize("old", "Sales").await.unwrap();
        let slugs: Vec<String> = ["b", "a", "b", "c"].iter().map(|s| s.to_string()).collect();
        categorizer.reset_category("Sales", &slugs).await.unwrap();
        categorizer.categorize("x", "Ops").await.unwrap();

        assert_eq!(
            categorizer.category_slugs("Sales").await.unwrap(),
            vec!["b", "a", "c"]
        );
        assert_eq!(
            categorizer.categories().await.unwrap().into_iter().collect::<Vec<_>>(),
            vec!["Ops", "Sales"]
        );
    }

    #[tokio::test]
    async fn test_categorize_rejects_empty_slug() {
        let store = RecordingStore::new();
        let err = Categorizer::new(&store, REGISTRY)
            .categorize("", CAT)
            .await
            .unwrap_err();

        assert!(matches!(err, MetricsError::EmptySlug));
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let store = UnavailableStore;
        let err = Categorizer::new(&store, REGISTRY)
            .category_slugs(CAT)
            .await
            .unwrap_err();

        assert!(matches!(err, MetricsError::Store(StoreError::Unavailable(_))));
    }
}
