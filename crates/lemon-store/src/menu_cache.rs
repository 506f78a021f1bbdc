//! Local, queryable copy of the remote menu.
//!
//! ## Load policy
//!
//! Rows are inserted one at a time, each in its own implicit transaction.
//! A row whose `id` is already cached is rejected (`DuplicateKey`) and the
//! cached row is kept; the rest of the batch still loads. Every row outcome
//! ends up in the returned [`LoadReport`].
//!
//! ## Query
//!
//! Category membership is evaluated by SQLite
//! (`unicode_lower(category) IN (..)`, folded like `str::to_lowercase`),
//! the name substring match in Rust over the category-matched rows. An
//! empty category set matches nothing.

use std::collections::BTreeSet;

use lemon_db::queries::menu;
use lemon_db::{migrations, DbError, Layout};
use lemon_types::events::StoreEvent;
use lemon_types::{MenuItem, MenuItemId};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::storage::{CallError, Storage};
use crate::{EventBus, Result, StoreError};

/// Why a single row of a bulk load was not stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum RowFailure {
    #[error("an item with this id is already cached")]
    DuplicateKey,

    #[error("invalid row: {0}")]
    InvalidRow(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl From<DbError> for RowFailure {
    fn from(e: DbError) -> Self {
        match e {
            DbError::Constraint(_) => Self::DuplicateKey,
            DbError::InvalidRow(msg) => Self::InvalidRow(msg),
            other => Self::Storage(other.to_string()),
        }
    }
}

/// A row-level write failure, collected rather than raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowWriteFailed {
    pub id: MenuItemId,
    pub reason: RowFailure,
}

/// Outcome of one bulk load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    /// Ids stored by this load, in input order.
    pub stored: Vec<MenuItemId>,
    pub failed: Vec<RowWriteFailed>,
}

impl LoadReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// The menu cache table and its query engine.
pub struct MenuCache {
    storage: Storage,
    events: EventBus,
    /// Serializes writes to the table so a drop never lands between the
    /// rows of an in-flight load.
    write_gate: Mutex<()>,
}

impl MenuCache {
    pub fn new(storage: Storage, events: EventBus) -> Self {
        Self {
            storage,
            events,
            write_gate: Mutex::new(()),
        }
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Create the menu table if it does not exist. Idempotent.
    pub async fn ensure_schema(&self) -> Result<()> {
        let _gate = self.write_gate.lock().await;
        self.storage
            .call(|conn| migrations::ensure(conn, Layout::Menu))
            .await
            .map_err(|e| e.or_unavailable(StoreError::StorageUnavailable))
    }

    /// Insert every item, collecting per-row outcomes.
    ///
    /// Only a dead storage worker aborts the batch.
    pub async fn bulk_load(&self, items: Vec<MenuItem>) -> Result<LoadReport> {
        let _gate = self.write_gate.lock().await;
        let mut report = LoadReport::default();

        for item in items {
            let id = item.id;
            match self.storage.call(move |conn| menu::insert(conn, &item)).await {
                Ok(()) => report.stored.push(id),
                Err(CallError::Closed) => {
                    return Err(StoreError::StorageUnavailable(format!(
                        "bulk load stopped at item {id} after {} rows",
                        report.stored.len()
                    )));
                }
                Err(CallError::Db(e)) => {
                    let reason = RowFailure::from(e);
                    tracing::warn!(id, %reason, "menu row not stored");
                    self.events.emit(StoreEvent::RowWriteFailed {
                        id,
                        reason: reason.to_string(),
                    });
                    report.failed.push(RowWriteFailed { id, reason });
                }
            }
        }

        tracing::info!(
            stored = report.stored.len(),
            failed = report.failed.len(),
            "menu bulk load finished"
        );
        self.events.emit(StoreEvent::MenuLoaded {
            stored: report.stored.len(),
            failed: report.failed.len(),
        });
        Ok(report)
    }

    /// Every cached row in storage order.
    pub async fn get_all(&self) -> Result<Vec<MenuItem>> {
        self.storage
            .call(|conn| menu::list(conn))
            .await
            .map_err(|e| e.or_unavailable(StoreError::QueryFailed))
    }

    /// Rows in one of `categories` whose name contains `text`, both
    /// compared case-insensitively.
    pub async fn query<I, S>(&self, text: &str, categories: I) -> Result<Vec<MenuItem>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let categories: BTreeSet<String> = categories
            .into_iter()
            .map(|c| c.as_ref().to_lowercase())
            .collect();
        if categories.is_empty() {
            return Ok(Vec::new());
        }

        let rows = self
            .storage
            .call(move |conn| menu::list_by_categories(conn, &categories))
            .await
            .map_err(|e| e.or_unavailable(StoreError::QueryFailed))?;

        let needle = text.to_lowercase();
        Ok(rows
            .into_iter()
            .filter(|item| item.name_contains(&needle))
            .collect())
    }

    /// Distinct categories present in the cache, as stored.
    pub async fn categories(&self) -> Result<Vec<String>> {
        self.storage
            .call(|conn| menu::categories(conn))
            .await
            .map_err(|e| e.or_unavailable(StoreError::QueryFailed))
    }

    /// Number of cached rows.
    pub async fn count(&self) -> Result<u64> {
        self.storage
            .call(|conn| menu::count(conn))
            .await
            .map_err(|e| e.or_unavailable(StoreError::QueryFailed))
    }

    /// Drop the table. [`ensure_schema`](Self::ensure_schema) recreates it
    /// empty.
    pub async fn drop_all(&self) -> Result<()> {
        let _gate = self.write_gate.lock().await;
        self.storage
            .call(|conn| menu::drop_table(conn))
            .await
            .map_err(|e| e.or_unavailable(StoreError::PersistenceWriteFailed))?;
        tracing::info!("menu cache dropped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn item(id: MenuItemId, name: &str, category: &str) -> MenuItem {
        MenuItem {
            id,
            name: name.to_string(),
            description: String::new(),
            price: "10".to_string(),
            image: format!("{id}.jpg"),
            category: category.to_string(),
        }
    }

    fn sample() -> Vec<MenuItem> {
        vec![
            item(1, "Greek Salad", "starters"),
            item(2, "Bruschetta", "starters"),
            item(3, "Lemon Cake", "desserts"),
        ]
    }

    async fn cache() -> MenuCache {
        let storage = Storage::open_memory().await.expect("open");
        let cache = MenuCache::new(storage, EventBus::new(64));
        cache.ensure_schema().await.expect("ensure schema");
        cache
    }

    fn sorted_ids(items: &[MenuItem]) -> Vec<MenuItemId> {
        let mut ids: Vec<_> = items.iter().map(|i| i.id).collect();
        ids.sort();
        ids
    }

    #[tokio::test]
    async fn test_ensure_schema_twice() {
        let cache = cache().await;
        cache.bulk_load(sample()).await.expect("load");
        cache.ensure_schema().await.expect("second ensure");
        assert_eq!(cache.count().await.expect("count"), 3);
    }

    #[tokio::test]
    async fn test_sample_queries() {
        let cache = cache().await;
        let report = cache.bulk_load(sample()).await.expect("load");
        assert!(report.is_complete());
        assert_eq!(report.stored, vec![1, 2, 3]);

        let starters = cache.query("", ["starters"]).await.expect("query");
        assert_eq!(sorted_ids(&starters), vec![1, 2]);

        let greek = cache.query("greek", ["starters", "desserts"]).await.expect("query");
        assert_eq!(sorted_ids(&greek), vec![1]);

        let cake = cache.query("cake", ["starters"]).await.expect("query");
        assert!(cake.is_empty());
    }

    #[tokio::test]
    async fn test_empty_category_set_matches_nothing() {
        let cache = cache().await;
        cache.bulk_load(sample()).await.expect("load");

        let none: [&str; 0] = [];
        assert!(cache.query("", none).await.expect("query").is_empty());
        assert!(cache.query("salad", none).await.expect("query").is_empty());
    }

    #[tokio::test]
    async fn test_empty_text_covering_all_categories_is_get_all() {
        let cache = cache().await;
        cache.bulk_load(sample()).await.expect("load");

        let all = cache.get_all().await.expect("get all");
        let queried = cache.query("", ["STARTERS", "Desserts"]).await.expect("query");
        assert_eq!(sorted_ids(&all), sorted_ids(&queried));
    }

    #[tokio::test]
    async fn test_category_match_folds_non_ascii() {
        let cache = cache().await;
        cache
            .bulk_load(vec![
                item(1, "Soupe à l'oignon", "ENTRÉES"),
                item(2, "Pâté", "Entrées"),
                item(3, "Crème brûlée", "desserts"),
            ])
            .await
            .expect("load");

        for spelling in ["ENTRÉES", "Entrées", "entrées"] {
            let rows = cache.query("", [spelling]).await.expect("query");
            assert_eq!(sorted_ids(&rows), vec![1, 2], "spelling {spelling}");
        }

        let rows = cache.query("PÂTÉ", ["entrées"]).await.expect("query");
        assert_eq!(sorted_ids(&rows), vec![2]);
    }

    #[tokio::test]
    async fn test_categories_lists_stored_values() {
        let cache = cache().await;
        let mut items = sample();
        items.push(item(4, "Chef's Pick", "Specials"));
        cache.bulk_load(items).await.expect("load");

        assert_eq!(
            cache.categories().await.expect("categories"),
            ["starters", "desserts", "Specials"]
        );
    }

    #[tokio::test]
    async fn test_query_results_satisfy_both_predicates() {
        let cache = cache().await;
        let mut items = sample();
        items.push(item(4, "Grilled Fish", "Mains"));
        items.push(item(5, "Lemonade", "drinks"));
        items.push(item(6, "Lemon Sole", "mains"));
        cache.bulk_load(items).await.expect("load");

        let categories = ["mains", "drinks"];
        let rows = cache.query("LEMON", categories).await.expect("query");
        assert_eq!(sorted_ids(&rows), vec![5, 6]);
        for row in &rows {
            assert!(categories.contains(&row.category.to_lowercase().as_str()));
            assert!(row.name.to_lowercase().contains("lemon"));
        }
    }

    #[tokio::test]
    async fn test_duplicate_ids_rejected_per_row() {
        let cache = cache().await;
        cache.bulk_load(sample()).await.expect("first load");

        let mut events = cache.events().subscribe();
        let report = cache
            .bulk_load(vec![item(2, "Impostor", "mains"), item(7, "Pasta", "mains")])
            .await
            .expect("second load");

        assert_eq!(report.stored, vec![7]);
        assert_eq!(
            report.failed,
            vec![RowWriteFailed {
                id: 2,
                reason: RowFailure::DuplicateKey,
            }]
        );

        let all = cache.get_all().await.expect("get all");
        assert_eq!(sorted_ids(&all), vec![1, 2, 3, 7]);
        let kept = all.iter().find(|i| i.id == 2).expect("row 2");
        assert_eq!(kept.name, "Bruschetta");

        let first = events.try_recv().expect("row failure event");
        assert!(matches!(first.kind, StoreEvent::RowWriteFailed { id: 2, .. }));
    }

    #[tokio::test]
    async fn test_reloading_same_batch_keeps_ids_unique() {
        let cache = cache().await;
        cache.bulk_load(sample()).await.expect("first");
        let report = cache.bulk_load(sample()).await.expect("second");
        assert!(report.stored.is_empty());
        assert_eq!(report.failed.len(), 3);
        assert_eq!(sorted_ids(&cache.get_all().await.expect("all")), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_duplicate_within_one_batch() {
        let cache = cache().await;
        let report = cache
            .bulk_load(vec![item(1, "Greek Salad", "starters"), item(1, "Again", "starters")])
            .await
            .expect("load");
        assert_eq!(report.stored, vec![1]);
        assert_eq!(report.failed.len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_row_does_not_stop_batch() {
        let cache = cache().await;
        let report = cache
            .bulk_load(vec![item(1, "", "starters"), item(2, "Bruschetta", "starters")])
            .await
            .expect("load");
        assert_eq!(report.stored, vec![2]);
        assert!(matches!(
            report.failed.first().map(|f| &f.reason),
            Some(RowFailure::InvalidRow(_))
        ));
    }

    #[tokio::test]
    async fn test_storage_row_failures_are_collected() {
        let storage = Storage::open_memory().await.expect("open");
        let cache = MenuCache::new(storage.clone(), EventBus::new(16));
        cache.ensure_schema().await.expect("ensure");
        storage
            .call(|conn| Ok(conn.pragma_update(None, "query_only", true)?))
            .await
            .expect("read-only");

        let report = cache.bulk_load(sample()).await.expect("load");
        assert!(report.stored.is_empty());
        assert_eq!(report.failed.len(), 3);
        assert!(report
            .failed
            .iter()
            .all(|f| matches!(f.reason, RowFailure::Storage(_))));
    }

    #[tokio::test]
    async fn test_concurrent_loads_never_duplicate() {
        let cache = Arc::new(cache().await);
        let batch_a: Vec<_> = (1..=20).map(|id| item(id, "Dish A", "mains")).collect();
        let batch_b: Vec<_> = (10..=30).map(|id| item(id, "Dish B", "mains")).collect();

        let a = tokio::spawn({
            let cache = Arc::clone(&cache);
            async move { cache.bulk_load(batch_a).await }
        });
        let b = tokio::spawn({
            let cache = Arc::clone(&cache);
            async move { cache.bulk_load(batch_b).await }
        });
        let report_a = a.await.expect("join").expect("load a");
        let report_b = b.await.expect("join").expect("load b");

        let mut stored: Vec<_> = report_a.stored.iter().chain(&report_b.stored).copied().collect();
        stored.sort();
        assert_eq!(stored, (1..=30).collect::<Vec<_>>());
        assert_eq!(report_a.failed.len() + report_b.failed.len(), 11);

        let all = cache.get_all().await.expect("all");
        assert_eq!(sorted_ids(&all), (1..=30).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_get_all_is_stable() {
        let cache = cache().await;
        cache.bulk_load(sample()).await.expect("load");
        let first = cache.get_all().await.expect("first read");
        let second = cache.get_all().await.expect("second read");
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_drop_all_then_reseed() {
        let cache = cache().await;
        cache.bulk_load(sample()).await.expect("load");
        cache.drop_all().await.expect("drop");

        assert!(matches!(
            cache.get_all().await,
            Err(StoreError::QueryFailed(_))
        ));

        cache.ensure_schema().await.expect("recreate");
        assert!(cache.get_all().await.expect("all").is_empty());

        let report = cache.bulk_load(sample()).await.expect("reseed");
        assert!(report.is_complete());
        assert_eq!(cache.count().await.expect("count"), 3);
    }

    #[tokio::test]
    async fn test_closed_storage_is_unavailable() {
        let storage = Storage::open_memory().await.expect("open");
        let cache = MenuCache::new(storage.clone(), EventBus::default());
        storage.close().await;

        assert!(matches!(
            cache.ensure_schema().await,
            Err(StoreError::StorageUnavailable(_))
        ));
        assert!(matches!(
            cache.bulk_load(sample()).await,
            Err(StoreError::StorageUnavailable(_))
        ));
        assert!(matches!(
            cache.query("", ["starters"]).await,
            Err(StoreError::StorageUnavailable(_))
        ));
    }
}
