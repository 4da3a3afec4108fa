//! Durable per-user record of classified items
//!
//! Each item may hold at most one record per bucket, keyed
//! `{userId}_{category}_{itemId}`. The feed engine only depends on the
//! [`DecisionStore`] trait; the backends here are interchangeable.

use std::collections::HashSet;

use crate::{
    error::StoreError,
    models::{Bucket, Category, Decision, DecisionMetadata, ItemId, UserId},
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryDecisionStore;
pub use postgres::PgDecisionStore;

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait DecisionStore: Send + Sync {
    /// IDs of every item the user placed in `bucket` for this category
    async fn read_bucket_ids(
        &self,
        user_id: &UserId,
        category: Category,
        bucket: Bucket,
    ) -> Result<HashSet<ItemId>, StoreError>;

    /// Records a decision, replacing any existing record for the same bucket
    async fn write_decision(
        &self,
        user_id: &UserId,
        category: Category,
        item_id: ItemId,
        bucket: Bucket,
        metadata: &DecisionMetadata,
    ) -> Result<(), StoreError>;

    /// Removes a decision; deleting a missing record succeeds
    async fn delete_decision(
        &self,
        user_id: &UserId,
        category: Category,
        item_id: ItemId,
        bucket: Bucket,
    ) -> Result<(), StoreError>;

    /// Full records of a bucket, most recent first
    async fn list_bucket(
        &self,
        user_id: &UserId,
        category: Category,
        bucket: Bucket,
    ) -> Result<Vec<Decision>, StoreError>;

    /// Moves a decision between buckets as one logical step
    ///
    /// Writes into `to` first, then deletes from `from`. If the delete fails
    /// the new record is removed again, so callers never see the item in both
    /// buckets because of this call.
    async fn move_decision(
        &self,
        user_id: &UserId,
        category: Category,
        item_id: ItemId,
        from: Bucket,
        to: Bucket,
        metadata: &DecisionMetadata,
    ) -> Result<(), StoreError> {
        if from == to {
            return self
                .write_decision(user_id, category, item_id, to, metadata)
                .await;
        }

        self.write_decision(user_id, category, item_id, to, metadata)
            .await?;

        if let Err(e) = self.delete_decision(user_id, category, item_id, from).await {
            tracing::warn!(
                user_id = %user_id,
                category = %category,
                item_id,
                from = %from,
                to = %to,
                error = %e,
                "Move failed after write, compensating"
            );
            if let Err(undo) = self.delete_decision(user_id, category, item_id, to).await {
                tracing::error!(
                    user_id = %user_id,
                    item_id,
                    error = %undo,
                    "Compensating delete failed; item is in both buckets"
                );
            }
            return Err(e);
        }

        Ok(())
    }

    /// Backend name for logging
    fn name(&self) -> &'static str;
}
