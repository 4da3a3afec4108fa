use chrono::Utc;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;

use super::DecisionStore;
use crate::{
    error::StoreError,
    models::{Bucket, Category, Decision, DecisionMetadata, ItemId, UserId},
};

/// In-process decision store for local runs and tests
///
/// Records are keyed by bucket and `{userId}_{category}_{itemId}` so the
/// one-record-per-bucket rule holds by construction.
#[derive(Default)]
pub struct MemoryDecisionStore {
    records: RwLock<HashMap<(Bucket, String), Decision>>,
}

impl MemoryDecisionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records held for an item across all buckets
    pub async fn record_count(&self, user_id: &UserId, category: Category, item_id: ItemId) -> usize {
        let key = Decision::record_key(user_id, category, item_id);
        let records = self.records.read().await;
        Bucket::ALL
            .iter()
            .filter(|bucket| records.contains_key(&(**bucket, key.clone())))
            .count()
    }
}

#[async_trait::async_trait]
impl DecisionStore for MemoryDecisionStore {
    async fn read_bucket_ids(
        &self,
        user_id: &UserId,
        category: Category,
        bucket: Bucket,
    ) -> Result<HashSet<ItemId>, StoreError> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|((b, _), d)| *b == bucket && &d.user_id == user_id && d.category == category)
            .map(|(_, d)| d.item_id)
            .collect())
    }

    async fn write_decision(
        &self,
        user_id: &UserId,
        category: Category,
        item_id: ItemId,
        bucket: Bucket,
        metadata: &DecisionMetadata,
    ) -> Result<(), StoreError> {
        let decision = Decision {
            user_id: user_id.clone(),
            category,
            item_id,
            bucket,
            metadata: metadata.clone(),
            decided_at: Utc::now(),
        };

        self.records
            .write()
            .await
            .insert((bucket, decision.key()), decision);
        Ok(())
    }

    async fn delete_decision(
        &self,
        user_id: &UserId,
        category: Category,
        item_id: ItemId,
        bucket: Bucket,
    ) -> Result<(), StoreError> {
        let key = Decision::record_key(user_id, category, item_id);
        self.records.write().await.remove(&(bucket, key));
        Ok(())
    }

    async fn list_bucket(
        &self,
        user_id: &UserId,
        category: Category,
        bucket: Bucket,
    ) -> Result<Vec<Decision>, StoreError> {
        let records = self.records.read().await;
        let mut decisions: Vec<Decision> = records
            .iter()
            .filter(|((b, _), d)| *b == bucket && &d.user_id == user_id && d.category == category)
            .map(|(_, d)| d.clone())
            .collect();

        decisions.sort_by(|a, b| b.decided_at.cmp(&a.decided_at));
        Ok(decisions)
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
