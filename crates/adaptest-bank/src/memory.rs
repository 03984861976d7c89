//! In-memory item bank with atomic exposure counters.
//!
//! Exposure counters are shared, globally-mutated state across concurrent
//! sessions; each counter is an `AtomicU32` so concurrent administrations
//! cannot lose updates. Everything else about an item is immutable after
//! insertion.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;

use adaptest_core::error::BankError;
use adaptest_core::model::{Category, Item};
use adaptest_core::traits::ItemBank;

struct BankEntry {
    item: Item,
    exposure: AtomicU32,
}

/// An `ItemBank` holding its pool in process memory.
pub struct MemoryBank {
    entries: RwLock<HashMap<String, BankEntry>>,
}

impl MemoryBank {
    /// Empty bank.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Bank seeded from a pool of items. Initial exposure comes from each
    /// item's `times_administered`.
    pub fn from_items(items: impl IntoIterator<Item = Item>) -> Self {
        let bank = Self::new();
        for item in items {
            bank.insert(item);
        }
        bank
    }

    /// Insert or replace an item. The exposure counter restarts from the
    /// item's `times_administered`.
    pub fn insert(&self, item: Item) {
        let mut entries = self.entries.write().unwrap();
        entries.insert(
            item.id.clone(),
            BankEntry {
                exposure: AtomicU32::new(item.times_administered),
                item,
            },
        );
    }

    /// Number of items in the bank, active or not.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    /// Whether the bank holds no items.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn snapshot(entry: &BankEntry) -> Item {
        let mut item = entry.item.clone();
        item.times_administered = entry.exposure.load(Ordering::Relaxed);
        item
    }
}

impl Default for MemoryBank {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ItemBank for MemoryBank {
    fn name(&self) -> &str {
        "memory"
    }

    async fn eligible_items(
        &self,
        exclude: &[String],
        categories: Option<&[Category]>,
    ) -> Result<Vec<Item>, BankError> {
        let entries = self.entries.read().unwrap();
        let mut items: Vec<Item> = entries
            .values()
            .filter(|entry| entry.item.active)
            .filter(|entry| !exclude.contains(&entry.item.id))
            .filter(|entry| {
                categories
                    .map(|wanted| wanted.contains(&entry.item.category))
                    .unwrap_or(true)
            })
            .map(Self::snapshot)
            .collect();
        // Stable order so selection depends only on the injected RNG.
        items.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(items)
    }

    async fn item(&self, item_id: &str) -> Result<Item, BankError> {
        let entries = self.entries.read().unwrap();
        entries
            .get(item_id)
            .map(Self::snapshot)
            .ok_or_else(|| BankError::UnknownItem(item_id.to_string()))
    }

    async fn record_administration(&self, item_id: &str) -> Result<u32, BankError> {
        let entries = self.entries.read().unwrap();
        let entry = entries
            .get(item_id)
            .ok_or_else(|| BankError::UnknownItem(item_id.to_string()))?;
        Ok(entry.exposure.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn item(id: &str, category: Category, active: bool) -> Item {
        Item {
            id: id.into(),
            category,
            discrimination: 1.0,
            difficulty: 0.0,
            guessing: 0.2,
            times_administered: 0,
            active,
            key: "a".into(),
            stem: None,
        }
    }

    #[tokio::test]
    async fn filters_inactive_excluded_and_off_category_items() {
        let bank = MemoryBank::from_items([
            item("a", Category::ManagementOfCare, true),
            item("b", Category::ManagementOfCare, false),
            item("c", Category::BasicCareAndComfort, true),
            item("d", Category::ManagementOfCare, true),
        ]);

        let exclude = vec!["d".to_string()];
        let wanted = [Category::ManagementOfCare];
        let items = bank
            .eligible_items(&exclude, Some(&wanted))
            .await
            .unwrap();
        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["a"]);

        let all = bank.eligible_items(&[], None).await.unwrap();
        assert_eq!(all.len(), 3, "inactive item stays hidden");
    }

    #[tokio::test]
    async fn item_lookup_ignores_exclusions() {
        let bank = MemoryBank::from_items([item("a", Category::ManagementOfCare, true)]);
        assert_eq!(bank.item("a").await.unwrap().id, "a");
        assert!(matches!(
            bank.item("ghost").await,
            Err(BankError::UnknownItem(_))
        ));
    }

    #[tokio::test]
    async fn exposure_counts_survive_snapshotting() {
        let bank = MemoryBank::from_items([item("a", Category::ManagementOfCare, true)]);
        assert_eq!(bank.record_administration("a").await.unwrap(), 1);
        assert_eq!(bank.record_administration("a").await.unwrap(), 2);
        assert_eq!(bank.item("a").await.unwrap().times_administered, 2);
    }

    #[tokio::test]
    async fn concurrent_administrations_lose_no_updates() {
        let bank = Arc::new(MemoryBank::from_items([item(
            "hot",
            Category::ManagementOfCare,
            true,
        )]));

        let tasks: Vec<_> = (0..100)
            .map(|_| {
                let bank = Arc::clone(&bank);
                tokio::spawn(async move { bank.record_administration("hot").await.unwrap() })
            })
            .collect();
        futures::future::join_all(tasks).await;

        assert_eq!(bank.item("hot").await.unwrap().times_administered, 100);
    }
}
